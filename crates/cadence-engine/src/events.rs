//! Playback lifecycle events.
//!
//! An [`AnimationState`](crate::AnimationState) queues an event whenever its
//! status changes or a loop rolls over. Callers poll them after driving the
//! state:
//!
//! ```
//! use cadence_engine::{AnimationState, Keyframe, PlaybackEvent, Timeline, TimelineOptions};
//!
//! let timeline = Timeline::construct(
//!     TimelineOptions::new(100)
//!         .keyframe(Keyframe::new(0.0).set("x", 0.0))
//!         .keyframe(Keyframe::new(1.0).set("x", 1.0)),
//! )
//! .unwrap();
//! let mut state = AnimationState::new(timeline);
//! state.start(0);
//! state.update(100);
//!
//! let events: Vec<_> = state.drain_events().collect();
//! assert_eq!(events, vec![PlaybackEvent::Started { at: 0 }, PlaybackEvent::Completed { at: 100 }]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Event emitted when a playback instance changes state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// Playback started from idle. `at` is the caller time of the call,
    /// before any delay.
    Started { at: u64 },
    Paused { at: u64 },
    Resumed { at: u64 },
    /// Playback was reset to idle.
    Stopped,
    /// One or more loops finished during a single update.
    LoopCompleted {
        /// The last loop that finished (0-indexed).
        loop_index: u32,
        /// Loops finished since the previous update, at least 1.
        count: u32,
    },
    /// All loops finished.
    Completed { at: u64 },
}

impl PlaybackEvent {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }

    /// True for the events after which the instance no longer advances.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Stopped)
    }
}

/// Events kept per queue before the oldest are dropped.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Queue for collecting events during update cycles.
///
/// Bounded: once `capacity` events are waiting, each push drops the oldest.
#[derive(Debug, Clone)]
pub struct EventQueue<E = PlaybackEvent> {
    events: VecDeque<E>,
    capacity: usize,
    dropped: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::with_capacity_limit(DEFAULT_EVENT_CAPACITY)
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue holding at most `capacity` events (minimum 1).
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn push(&mut self, event: E) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped += 1;
        }
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Pop the oldest event.
    pub fn pop(&mut self) -> Option<E> {
        self.events.pop_front()
    }

    pub fn peek(&self) -> Option<&E> {
        self.events.front()
    }

    /// Drain all events in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = E> + '_ {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
