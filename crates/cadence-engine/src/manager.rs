//! Manager for many concurrent playback instances.
//!
//! The `PlaybackManager` owns a set of [`AnimationState`]s, each identified
//! by a [`PlaybackId`]. It handles:
//! - Starting instances of shared timelines
//! - Pausing, resuming and stopping instances by id
//! - Advancing every instance to the same timestamp
//! - Collecting lifecycle events from all instances
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use cadence_engine::{Keyframe, PlaybackManager, Timeline, TimelineOptions};
//!
//! let fade = Arc::new(
//!     Timeline::construct(
//!         TimelineOptions::new(300)
//!             .keyframe(Keyframe::new(0.0).set("opacity", 0.0))
//!             .keyframe(Keyframe::new(1.0).set("opacity", 1.0)),
//!     )
//!     .unwrap(),
//! );
//!
//! let mut manager = PlaybackManager::new();
//! let id = manager.play(Arc::clone(&fade), 0);
//!
//! for (playing, values) in manager.update_all(150) {
//!     assert_eq!(playing, id);
//!     assert_eq!(values["opacity"].as_number(), Some(0.5));
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::events::{EventQueue, PlaybackEvent};
use crate::playback::{AnimationState, Status};
use crate::timeline::Timeline;
use crate::value::PropertyMap;

/// Unique identifier for a playback instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlaybackId(pub u64);

impl PlaybackId {
    /// Generate a new unique id.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PlaybackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playback#{}", self.0)
    }
}

/// A lifecycle event together with the instance that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedEvent {
    pub id: PlaybackId,
    #[serde(flatten)]
    pub event: PlaybackEvent,
}

/// Values produced for one instance by [`PlaybackManager::update_all`].
pub type Frame = (PlaybackId, PropertyMap);

/// Owner of many playback instances.
///
/// Single-threaded: wrap it in a lock if several threads drive it.
#[derive(Debug, Default)]
pub struct PlaybackManager {
    /// Instances in creation order.
    instances: BTreeMap<PlaybackId, AnimationState>,
    event_queue: EventQueue<TaggedEvent>,
}

impl PlaybackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instance of `timeline` and start it at `now`.
    pub fn play(&mut self, timeline: impl Into<Arc<Timeline>>, now: u64) -> PlaybackId {
        let mut state = AnimationState::new(timeline);
        state.start(now);
        self.insert(state)
    }

    /// Take ownership of an existing state, in whatever status it is.
    pub fn insert(&mut self, mut state: AnimationState) -> PlaybackId {
        let id = PlaybackId::new();
        self.collect_events(id, &mut state);
        self.instances.insert(id, state);
        id
    }

    /// Pause an instance. Returns `false` for unknown ids.
    pub fn pause(&mut self, id: PlaybackId, now: u64) -> bool {
        self.with_state(id, |state| state.pause(now))
    }

    /// Resume a paused instance.
    pub fn resume(&mut self, id: PlaybackId, now: u64) -> bool {
        self.with_state(id, |state| {
            if state.status() == Status::Paused {
                state.start(now);
            }
        })
    }

    /// Reset an instance to idle. The instance stays registered.
    pub fn stop(&mut self, id: PlaybackId) -> bool {
        self.with_state(id, AnimationState::stop)
    }

    /// Remove an instance, returning its final state.
    pub fn remove(&mut self, id: PlaybackId) -> Option<AnimationState> {
        self.instances.remove(&id)
    }

    pub fn get(&self, id: PlaybackId) -> Option<&AnimationState> {
        self.instances.get(&id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of instances currently playing.
    pub fn playing_count(&self) -> usize {
        self.instances.values().filter(|s| s.is_playing()).count()
    }

    /// Advance every playing instance to `now`.
    ///
    /// Returns the values of each instance that was playing, including those
    /// that completed on this update.
    pub fn update_all(&mut self, now: u64) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut events = Vec::new();

        for (id, state) in self.instances.iter_mut() {
            if !state.is_playing() {
                continue;
            }
            frames.push((*id, state.update(now).clone()));
            events.extend(state.drain_events().map(|event| TaggedEvent { id: *id, event }));
        }

        for event in events {
            self.event_queue.push(event);
        }
        frames
    }

    /// Drop completed instances and return their ids.
    pub fn prune_completed(&mut self) -> Vec<PlaybackId> {
        let done: Vec<PlaybackId> = self
            .instances
            .iter()
            .filter(|(_, state)| state.is_completed())
            .map(|(id, _)| *id)
            .collect();

        for id in &done {
            self.instances.remove(id);
        }
        if !done.is_empty() {
            tracing::debug!(count = done.len(), "pruned completed playbacks");
        }
        done
    }

    /// Drain events from all instances in arrival order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = TaggedEvent> + '_ {
        self.event_queue.drain()
    }

    /// Remove every instance and pending event.
    pub fn clear(&mut self) {
        self.instances.clear();
        self.event_queue.clear();
    }

    fn with_state(&mut self, id: PlaybackId, f: impl FnOnce(&mut AnimationState)) -> bool {
        let Some(mut state) = self.instances.remove(&id) else {
            return false;
        };
        f(&mut state);
        self.collect_events(id, &mut state);
        self.instances.insert(id, state);
        true
    }

    fn collect_events(&mut self, id: PlaybackId, state: &mut AnimationState) {
        for event in state.drain_events() {
            self.event_queue.push(TaggedEvent { id, event });
        }
    }
}
