//! Timelines: validated, immutable descriptions of one animation.
//!
//! Construction goes through [`Timeline::construct`], which performs the
//! cheap field-level checks only. Cross-keyframe checks (ordering, duplicate
//! times, interpolatability) live in [`crate::validator`] and run when a
//! caller asks for them via [`Timeline::verify`], so composition can rebuild
//! timelines without paying for the deep pass on every step.
//!
//! # Example
//!
//! ```
//! use cadence_engine::{Keyframe, LoopCount, LoopMode, Timeline, TimelineOptions};
//!
//! let timeline = Timeline::construct(
//!     TimelineOptions::new(1000)
//!         .keyframe(Keyframe::new(0.0).set("x", 0.0))
//!         .keyframe(Keyframe::new(1.0).set("x", 100.0))
//!         .loop_mode(LoopMode::Alternate)
//!         .loop_count(LoopCount::Times(3)),
//! )
//! .unwrap();
//! assert_eq!(timeline.duration(), 1000);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::keyframe::Keyframe;
use crate::options::{Metadata, TimelineOptions};
use crate::validator::{self, Verification, VerifyOptions};
use crate::value::PropertyMap;

/// What happens when elapsed time runs past one full duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Play once and complete.
    #[default]
    None,
    /// Jump back to the start each loop.
    Restart,
    /// Play backward on odd loops.
    Reverse,
    /// Alternate forward and backward.
    Alternate,
}

impl LoopMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Restart => "restart",
            Self::Reverse => "reverse",
            Self::Alternate => "alternate",
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoopMode {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "none" => Ok(Self::None),
            "restart" => Ok(Self::Restart),
            "reverse" => Ok(Self::Reverse),
            "alternate" => Ok(Self::Alternate),
            other => Err(AnimationError::InvalidLoopMode(format!(
                "unknown loop mode `{other}`"
            ))),
        }
    }
}

/// How many loops a timeline plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "count", rename_all = "snake_case")]
pub enum LoopCount {
    /// A fixed number of loops.
    Times(u32),
    /// Loop forever.
    Infinite,
}

impl Default for LoopCount {
    fn default() -> Self {
        Self::Times(1)
    }
}

impl LoopCount {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Self::Infinite)
    }

    /// The finite count, if any.
    pub fn finite(&self) -> Option<u32> {
        match self {
            Self::Times(count) => Some(*count),
            Self::Infinite => None,
        }
    }
}

/// An immutable, validated animation description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimelineOptions", into = "TimelineOptions")]
pub struct Timeline {
    id: Option<String>,
    duration: u64,
    keyframes: Vec<Keyframe>,
    easing: Easing,
    loop_mode: LoopMode,
    loop_count: LoopCount,
    delay: u64,
    metadata: Metadata,
}

impl Timeline {
    /// Build a timeline, checking each field.
    ///
    /// Keyframes are accepted as given; run [`Timeline::verify`] for the
    /// cross-keyframe checks.
    pub fn construct(options: TimelineOptions) -> Result<Self> {
        let duration = check_duration(options.duration)?;

        options.easing.validate()?;

        if options.delay < 0 {
            return Err(AnimationError::InvalidDelay(format!(
                "{} is negative",
                options.delay
            )));
        }

        Ok(Self {
            id: options.id,
            duration,
            keyframes: options.keyframes,
            easing: options.easing,
            loop_mode: options.loop_mode,
            loop_count: options.loop_count,
            delay: options.delay as u64,
            metadata: options.metadata,
        })
    }

    /// Panicking variant of [`Timeline::construct`].
    pub fn construct_or_panic(options: TimelineOptions) -> Self {
        match Self::construct(options) {
            Ok(timeline) => timeline,
            Err(err) => panic!("invalid timeline: {err}"),
        }
    }

    /// Decode loose constructor arguments and build a timeline.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        Self::construct(TimelineOptions::from_value(value)?)
    }

    /// Run the deep cross-keyframe validation pass.
    pub fn verify(&self, options: &VerifyOptions) -> Result<Verification> {
        validator::verify(self, options)
    }

    /// Options that rebuild this timeline; the starting point for derived
    /// timelines.
    pub fn to_options(&self) -> TimelineOptions {
        TimelineOptions {
            id: self.id.clone(),
            duration: Some(self.duration as f64),
            keyframes: self.keyframes.clone(),
            easing: self.easing.clone(),
            loop_mode: self.loop_mode,
            loop_count: self.loop_count,
            delay: self.delay as i64,
            metadata: self.metadata.clone(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Length of one loop in time units.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn easing(&self) -> &Easing {
        &self.easing
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn loop_count(&self) -> LoopCount {
        self.loop_count
    }

    /// Time units before playback begins.
    pub fn delay(&self) -> u64 {
        self.delay
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Union of property names across all keyframes, sorted.
    pub fn property_keys(&self) -> Vec<&str> {
        let keys: BTreeSet<&str> = self
            .keyframes
            .iter()
            .flat_map(|kf| kf.properties.keys().map(String::as_str))
            .collect();
        keys.into_iter().collect()
    }

    /// Find the keyframes surrounding `progress`.
    ///
    /// Returns (from, to, segment_progress). The first segment whose bounds
    /// contain `progress` wins; progress before the first keyframe clamps to
    /// the first segment, after the last keyframe to the last segment. A
    /// zero-width segment yields 0.0. `None` when there are fewer than two
    /// keyframes.
    pub fn find_segment(&self, progress: f64) -> Option<(&Keyframe, &Keyframe, f64)> {
        if self.keyframes.len() < 2 {
            return None;
        }

        let last = self.keyframes.len() - 2;
        let index = self
            .keyframes
            .windows(2)
            .position(|pair| pair[0].time <= progress && progress <= pair[1].time)
            .unwrap_or(if progress < self.keyframes[0].time { 0 } else { last });

        let from = &self.keyframes[index];
        let to = &self.keyframes[index + 1];
        let width = to.time - from.time;
        let segment_progress = if width > 0.0 {
            (progress - from.time) / width
        } else {
            0.0
        };

        tracing::trace!(progress, index, segment_progress, "resolved keyframe segment");
        Some((from, to, segment_progress))
    }

    /// Property values at `progress` within one loop.
    ///
    /// No keyframes yields an empty map; a single keyframe yields its
    /// properties unchanged.
    pub fn value_at(&self, progress: f64) -> PropertyMap {
        match self.keyframes.as_slice() {
            [] => PropertyMap::new(),
            [only] => only.properties.clone(),
            _ => match self.find_segment(progress) {
                Some((from, to, t)) => from.interpolate(to, t, &self.easing),
                None => PropertyMap::new(),
            },
        }
    }
}

impl TryFrom<TimelineOptions> for Timeline {
    type Error = AnimationError;

    fn try_from(options: TimelineOptions) -> Result<Self> {
        Self::construct(options)
    }
}

impl From<Timeline> for TimelineOptions {
    fn from(timeline: Timeline) -> Self {
        timeline.to_options()
    }
}

fn check_duration(duration: Option<f64>) -> Result<u64> {
    let duration = duration.ok_or(AnimationError::DurationRequired)?;
    if !duration.is_finite() || duration.fract() != 0.0 {
        return Err(AnimationError::InvalidDuration(format!(
            "{duration} is not a whole number"
        )));
    }
    if duration <= 0.0 {
        return Err(AnimationError::InvalidDuration(format!(
            "{duration} must be greater than zero"
        )));
    }
    if duration > u64::MAX as f64 {
        return Err(AnimationError::InvalidDuration(format!("{duration} is too large")));
    }
    Ok(duration as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn fade() -> Timeline {
        Timeline::construct(
            TimelineOptions::new(1000)
                .keyframe(Keyframe::new(0.0).set("x", 0.0))
                .keyframe(Keyframe::new(0.5).set("x", 80.0))
                .keyframe(Keyframe::new(1.0).set("x", 100.0)),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let timeline = Timeline::construct(TimelineOptions::new(250)).unwrap();
        assert_eq!(timeline.duration(), 250);
        assert!(timeline.keyframes().is_empty());
        assert_eq!(timeline.easing(), &Easing::Linear);
        assert_eq!(timeline.loop_mode(), LoopMode::None);
        assert_eq!(timeline.loop_count(), LoopCount::Times(1));
        assert_eq!(timeline.delay(), 0);
        assert!(timeline.metadata().is_empty());
        assert_eq!(timeline.id(), None);
    }

    #[test]
    fn test_duration_errors() {
        let err = Timeline::construct(TimelineOptions::default()).unwrap_err();
        assert_eq!(err, AnimationError::DurationRequired);

        for bad in [0.0, -100.0, 12.5, f64::NAN, f64::INFINITY] {
            let options = TimelineOptions {
                duration: Some(bad),
                ..Default::default()
            };
            let err = Timeline::construct(options).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidDuration, "duration {bad}");
        }
    }

    #[test]
    fn test_delay_and_easing_errors() {
        let err = Timeline::construct(TimelineOptions::new(100).delay(-5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDelay);

        let bezier = Easing::CubicBezier { x1: 2.0, y1: 0.0, x2: 0.5, y2: 1.0 };
        let err = Timeline::construct(TimelineOptions::new(100).easing(bezier)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidEasing);
    }

    #[test]
    #[should_panic(expected = "invalid timeline")]
    fn test_construct_or_panic() {
        Timeline::construct_or_panic(TimelineOptions::new(0));
    }

    #[test]
    fn test_construction_accepts_unordered_keyframes() {
        // ordering is the validator's job
        let timeline = Timeline::construct(
            TimelineOptions::new(100)
                .keyframe(Keyframe::new(1.0).set("x", 1.0))
                .keyframe(Keyframe::new(0.0).set("x", 0.0)),
        );
        assert!(timeline.is_ok());
    }

    #[test]
    fn test_find_segment() {
        let timeline = fade();

        let (from, to, t) = timeline.find_segment(0.25).unwrap();
        assert_eq!((from.time, to.time), (0.0, 0.5));
        assert!((t - 0.5).abs() < 1e-9);

        // boundary belongs to the first matching segment
        let (from, to, t) = timeline.find_segment(0.5).unwrap();
        assert_eq!((from.time, to.time), (0.0, 0.5));
        assert_eq!(t, 1.0);

        let (from, to, _) = timeline.find_segment(0.75).unwrap();
        assert_eq!((from.time, to.time), (0.5, 1.0));
    }

    #[test]
    fn test_find_segment_clamps_outside_keyframes() {
        let timeline = Timeline::construct(
            TimelineOptions::new(100)
                .keyframe(Keyframe::new(0.2).set("x", 0.0))
                .keyframe(Keyframe::new(0.8).set("x", 60.0)),
        )
        .unwrap();

        let values = timeline.value_at(0.0);
        assert_eq!(values.get("x").and_then(|v| v.as_number()), Some(0.0));
        let values = timeline.value_at(1.0);
        assert_eq!(values.get("x").and_then(|v| v.as_number()), Some(60.0));
    }

    #[test]
    fn test_value_at_degenerate_keyframes() {
        let empty = Timeline::construct(TimelineOptions::new(100)).unwrap();
        assert!(empty.value_at(0.5).is_empty());

        let single = Timeline::construct(
            TimelineOptions::new(100).keyframe(Keyframe::new(0.3).set("x", 7.0)),
        )
        .unwrap();
        assert_eq!(single.value_at(0.9), single.keyframes()[0].properties);
    }

    #[test]
    fn test_property_keys_union() {
        let timeline = Timeline::construct(
            TimelineOptions::new(100)
                .keyframe(Keyframe::new(0.0).set("x", 0.0))
                .keyframe(Keyframe::new(1.0).set("y", 1.0).set("x", 2.0)),
        )
        .unwrap();
        assert_eq!(timeline.property_keys(), vec!["x", "y"]);
    }

    #[test]
    fn test_loop_mode_parse() {
        assert_eq!("alternate".parse::<LoopMode>().unwrap(), LoopMode::Alternate);
        assert_eq!(
            "pingpong".parse::<LoopMode>().unwrap_err().kind(),
            ErrorKind::InvalidLoopMode
        );
    }

    #[test]
    fn test_serde_round_trip_goes_through_construct() {
        let timeline = fade();
        let json = serde_json::to_value(&timeline).unwrap();
        assert_eq!(json["duration"], 1000.0);

        let parsed: Timeline = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, timeline);

        let bad = serde_json::json!({ "duration": 0 });
        assert!(serde_json::from_value::<Timeline>(bad).is_err());
    }
}
