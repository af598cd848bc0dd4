//! Playback state machine.
//!
//! An [`AnimationState`] turns caller-supplied timestamps into property values
//! for one shared [`Timeline`]. It never reads a clock: every transition takes
//! the current time as an argument, so playback is deterministic.
//!
//! ```text
//! idle --start--> playing --pause--> paused --start--> playing
//!                    |
//!                    +--update (all loops done)--> completed
//! any --stop--> idle
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::events::{EventQueue, PlaybackEvent};
use crate::timeline::{LoopCount, LoopMode, Timeline};
use crate::value::PropertyMap;

/// Lifecycle status of a playback instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Playing,
    Paused,
    Completed,
}

/// Direction of travel through the current loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Mutable playback state for one instance of a timeline.
///
/// The timeline is shared and immutable; many states may point at the same
/// one. A single state must be driven by one caller at a time.
#[derive(Debug, Clone)]
pub struct AnimationState {
    timeline: Arc<Timeline>,
    status: Status,
    /// Loop-adjusted elapsed time of the last update.
    elapsed_time: u64,
    start_time: Option<u64>,
    pause_time: Option<u64>,
    current_loop: u32,
    direction: Direction,
    last_frame_time: Option<u64>,
    current_values: PropertyMap,
    events: EventQueue,
}

impl AnimationState {
    pub fn new(timeline: impl Into<Arc<Timeline>>) -> Self {
        Self {
            timeline: timeline.into(),
            status: Status::Idle,
            elapsed_time: 0,
            start_time: None,
            pause_time: None,
            current_loop: 0,
            direction: Direction::Forward,
            last_frame_time: None,
            current_values: PropertyMap::new(),
            events: EventQueue::new(),
        }
    }

    /// Start from idle, or resume from paused.
    ///
    /// From idle, playback begins `timeline.delay()` units after `now`. From
    /// paused, the start time shifts by the length of the pause so progress
    /// is preserved. Other states are left alone.
    pub fn start(&mut self, now: u64) {
        match self.status {
            Status::Idle => {
                self.start_time = Some(now.saturating_add(self.timeline.delay()));
                self.status = Status::Playing;
                self.events.push(PlaybackEvent::Started { at: now });
                tracing::debug!(
                    timeline = self.timeline_name(),
                    now,
                    delay = self.timeline.delay(),
                    "playback started"
                );
            }
            Status::Paused => {
                let paused_for = self
                    .pause_time
                    .take()
                    .map_or(0, |at| now.saturating_sub(at));
                self.start_time = self.start_time.map(|s| s.saturating_add(paused_for));
                self.status = Status::Playing;
                self.events.push(PlaybackEvent::Resumed { at: now });
                tracing::debug!(
                    timeline = self.timeline_name(),
                    now,
                    paused_for,
                    "playback resumed"
                );
            }
            Status::Playing | Status::Completed => {}
        }
    }

    /// Pause a playing instance.
    pub fn pause(&mut self, now: u64) {
        if self.status != Status::Playing {
            return;
        }
        self.pause_time = Some(now);
        self.status = Status::Paused;
        self.events.push(PlaybackEvent::Paused { at: now });
        tracing::debug!(timeline = self.timeline_name(), now, "playback paused");
    }

    /// Reset to idle from any state.
    pub fn stop(&mut self) {
        let was_idle = self.status == Status::Idle;

        self.status = Status::Idle;
        self.elapsed_time = 0;
        self.start_time = None;
        self.pause_time = None;
        self.current_loop = 0;
        self.direction = Direction::Forward;
        self.last_frame_time = None;
        self.current_values.clear();

        if !was_idle {
            self.events.push(PlaybackEvent::Stopped);
            tracing::debug!(timeline = self.timeline_name(), "playback stopped");
        }
    }

    /// Advance to `now` and return the property values there.
    ///
    /// Only a playing instance advances; otherwise the last computed values
    /// are returned unchanged. Never fails: timelines without keyframes
    /// produce an empty map.
    pub fn update(&mut self, now: u64) -> &PropertyMap {
        if self.status != Status::Playing {
            return &self.current_values;
        }

        let duration = self.timeline.duration().max(1);
        let elapsed = self.start_time.map_or(0, |start| now.saturating_sub(start));
        let loops = elapsed / duration;
        let previous_loop = self.current_loop;

        let loop_elapsed = match (self.timeline.loop_mode(), self.timeline.loop_count()) {
            (LoopMode::None, _) if elapsed >= duration => {
                self.status = Status::Completed;
                self.direction = Direction::Forward;
                duration
            }
            (_, LoopCount::Times(count)) if loops >= u64::from(count) => {
                self.status = Status::Completed;
                self.current_loop = count.saturating_sub(1);
                duration
            }
            (mode, _) => {
                self.current_loop = u32::try_from(loops).unwrap_or(u32::MAX);
                self.direction = match mode {
                    LoopMode::Reverse | LoopMode::Alternate if loops % 2 == 1 => {
                        Direction::Backward
                    }
                    _ => Direction::Forward,
                };
                elapsed % duration
            }
        };

        if self.current_loop > previous_loop {
            let loop_index = self.current_loop - 1;
            let count = self.current_loop - previous_loop;
            self.events.push(PlaybackEvent::LoopCompleted { loop_index, count });
            tracing::debug!(timeline = self.timeline_name(), loop_index, count, "loop completed");
        }

        let mut progress = (loop_elapsed as f64 / duration as f64).min(1.0);
        if self.direction == Direction::Backward {
            progress = 1.0 - progress;
        }

        self.current_values = self.timeline.value_at(progress);
        self.elapsed_time = loop_elapsed;
        self.last_frame_time = Some(now);

        if self.status == Status::Completed {
            self.events.push(PlaybackEvent::Completed { at: now });
            tracing::debug!(
                timeline = self.timeline_name(),
                now,
                loops = self.current_loop + 1,
                "playback completed"
            );
        }
        tracing::trace!(now, elapsed, progress, "playback frame");

        &self.current_values
    }

    /// Position within the current loop, `min(1, elapsed / duration)`.
    pub fn progress(&self) -> f64 {
        let duration = self.timeline.duration().max(1) as f64;
        (self.elapsed_time as f64 / duration).min(1.0)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    pub fn is_playing(&self) -> bool {
        self.status == Status::Playing
    }

    /// Loop-adjusted elapsed time of the last update.
    pub fn elapsed_time(&self) -> u64 {
        self.elapsed_time
    }

    /// Time at which playback began, delay included.
    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    pub fn pause_time(&self) -> Option<u64> {
        self.pause_time
    }

    /// Current loop, 0-indexed.
    pub fn current_loop(&self) -> u32 {
        self.current_loop
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_frame_time(&self) -> Option<u64> {
        self.last_frame_time
    }

    pub fn current_values(&self) -> &PropertyMap {
        &self.current_values
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    /// Drain queued lifecycle events in the order they happened.
    pub fn drain_events(&mut self) -> impl Iterator<Item = PlaybackEvent> + '_ {
        self.events.drain()
    }

    fn timeline_name(&self) -> &str {
        self.timeline.id().unwrap_or("<anonymous>")
    }
}
