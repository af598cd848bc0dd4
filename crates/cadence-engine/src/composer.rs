//! Timeline composition.
//!
//! Every operation builds a fresh [`Timeline`] through
//! [`Timeline::construct`] and leaves its inputs untouched.
//!
//! Derived timelines take their playback settings (easing, loop mode, loop
//! count, delay, metadata) from the first input unless [`CompositionOptions`]
//! overrides them. Keyframes that relied on their source timeline's easing
//! get it pinned on the keyframe when the result would use a different one.
//!
//! ```
//! use cadence_engine::{composer, CompositionOptions, Keyframe, Timeline, TimelineOptions};
//!
//! let fade = Timeline::construct(
//!     TimelineOptions::new(300)
//!         .keyframe(Keyframe::new(0.0).set("opacity", 0.0))
//!         .keyframe(Keyframe::new(1.0).set("opacity", 1.0)),
//! )
//! .unwrap();
//! let slide = Timeline::construct(
//!     TimelineOptions::new(700)
//!         .keyframe(Keyframe::new(0.0).set("x", 0.0))
//!         .keyframe(Keyframe::new(1.0).set("x", 120.0)),
//! )
//! .unwrap();
//!
//! let both = composer::sequence(&[fade, slide], &CompositionOptions::default()).unwrap();
//! assert_eq!(both.duration(), 1000);
//! ```

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::keyframe::Keyframe;
use crate::options::{Metadata, TimelineOptions};
use crate::timeline::{LoopCount, LoopMode, Timeline};
use crate::validator::{self, CompositionMode};

/// Keyframe times closer than this are treated as the same time.
const TIME_EPSILON: f64 = 1e-9;

/// How [`merge`] treats the first timeline's keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Keep both keyframe sets; keyframes at the same time merge their
    /// properties, later input winning.
    #[default]
    Combine,
    /// Drop the first timeline's keyframes in favour of the second's.
    Override,
}

/// Overrides applied to a derived timeline.
#[derive(Debug, Clone, Default)]
pub struct CompositionOptions {
    pub id: Option<String>,
    pub easing: Option<Easing>,
    pub loop_mode: Option<LoopMode>,
    pub loop_count: Option<LoopCount>,
    pub delay: Option<u64>,
    /// Entries layered over the first input's metadata.
    pub metadata: Metadata,
    pub merge_strategy: MergeStrategy,
}

impl CompositionOptions {
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.merge_strategy = strategy;
        self
    }
}

/// Merge two timelines into one spanning the longer duration.
pub fn merge(a: &Timeline, b: &Timeline, options: &CompositionOptions) -> Result<Timeline> {
    validator::validate_composition(a, b, CompositionMode::Merge)?;

    let duration = a.duration().max(b.duration());
    let easing = result_easing(a, options);

    let first = rescaled(a, duration, &easing);
    let second = rescaled(b, duration, &easing);

    let keyframes = match options.merge_strategy {
        MergeStrategy::Combine => combine(first.into_iter().chain(second)),
        MergeStrategy::Override => second,
    };

    let timeline = derive(a, duration, keyframes, easing, options)?;
    tracing::debug!(
        duration,
        keyframes = timeline.keyframes().len(),
        strategy = ?options.merge_strategy,
        "merged timelines"
    );
    Ok(timeline)
}

/// Play timelines one after another.
///
/// A single timeline is returned unchanged.
pub fn sequence(timelines: &[Timeline], options: &CompositionOptions) -> Result<Timeline> {
    let (first, rest) = timelines
        .split_first()
        .ok_or(AnimationError::EmptyTimelineList)?;
    if rest.is_empty() {
        return Ok(first.clone());
    }
    for other in rest {
        validator::validate_composition(first, other, CompositionMode::Sequence)?;
    }

    let total = timelines
        .iter()
        .try_fold(0u64, |sum, t| sum.checked_add(t.duration()))
        .ok_or_else(|| {
            AnimationError::InvalidTimelineDuration("total duration overflows".to_string())
        })?;
    let easing = result_easing(first, options);

    let mut offset = 0u64;
    let mut placed = Vec::new();
    for timeline in timelines {
        let own = timeline.duration() as f64;
        let base = offset as f64;
        placed.extend(timeline.keyframes().iter().map(|kf| {
            let mut kf = kf.at_time((kf.time * own + base) / total as f64);
            pin_easing(&mut kf, timeline, &easing);
            kf
        }));
        offset += timeline.duration();
    }

    let timeline = derive(first, total, combine(placed), easing, options)?;
    tracing::debug!(
        inputs = timelines.len(),
        duration = total,
        keyframes = timeline.keyframes().len(),
        "sequenced timelines"
    );
    Ok(timeline)
}

/// Play timelines simultaneously over the longest duration.
///
/// Equivalent to folding [`merge`] with [`MergeStrategy::Combine`] from left
/// to right.
pub fn parallel(timelines: &[Timeline], options: &CompositionOptions) -> Result<Timeline> {
    let (first, rest) = timelines
        .split_first()
        .ok_or(AnimationError::EmptyTimelineList)?;
    for other in rest {
        validator::validate_composition(first, other, CompositionMode::Parallel)?;
    }

    let duration = timelines.iter().map(Timeline::duration).max().unwrap_or(0);
    let easing = result_easing(first, options);

    let keyframes = combine(timelines.iter().flat_map(|t| rescaled(t, duration, &easing)));

    let timeline = derive(first, duration, keyframes, easing, options)?;
    tracing::debug!(
        inputs = timelines.len(),
        duration,
        keyframes = timeline.keyframes().len(),
        "composed timelines in parallel"
    );
    Ok(timeline)
}

/// Play a timeline backwards.
///
/// Keyframe times are mirrored and their order reversed. Segment settings
/// (easing, interpolation mode) move with their segment, and `ease_in` and
/// `ease_out` swap.
pub fn reverse(timeline: &Timeline) -> Result<Timeline> {
    let source = timeline.keyframes();
    let n = source.len();

    let keyframes = (0..n)
        .map(|i| {
            let mut kf = source[n - 1 - i].at_time(1.0 - source[n - 1 - i].time);
            // The segment leaving keyframe i was old segment n - 2 - i.
            let owner = if i + 1 < n { &source[n - 2 - i] } else { &source[n - 1] };
            kf.easing = owner.easing.as_ref().map(Easing::reversed);
            kf.interpolation = owner.interpolation;
            kf
        })
        .collect();

    let options = TimelineOptions {
        keyframes,
        easing: timeline.easing().reversed(),
        ..timeline.to_options()
    };
    Timeline::construct(options)
}

/// Stretch a timeline's duration by `factor`.
///
/// The new duration is rounded to a whole number of time units.
pub fn scale(timeline: &Timeline, factor: f64) -> Result<Timeline> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(AnimationError::InvalidScaleFactor(factor));
    }

    let duration = (timeline.duration() as f64 * factor).round();
    tracing::debug!(from = timeline.duration(), to = duration, factor, "scaled timeline");
    Timeline::construct(TimelineOptions {
        duration: Some(duration),
        ..timeline.to_options()
    })
}

/// Loop a timeline `count` times from the start.
pub fn repeat(timeline: &Timeline, count: LoopCount) -> Result<Timeline> {
    if count == LoopCount::Times(0) {
        return Err(AnimationError::InvalidRepeatCount(
            "repeat count must be positive".to_string(),
        ));
    }

    Timeline::construct(
        timeline
            .to_options()
            .loop_mode(LoopMode::Restart)
            .loop_count(count),
    )
}

fn result_easing(first: &Timeline, options: &CompositionOptions) -> Easing {
    options
        .easing
        .clone()
        .unwrap_or_else(|| first.easing().clone())
}

/// Keep a keyframe's effective easing when it moves to a timeline with a
/// different default.
fn pin_easing(kf: &mut Keyframe, source: &Timeline, target: &Easing) {
    if kf.easing.is_none() && source.easing() != target {
        kf.easing = Some(source.easing().clone());
    }
}

/// Keyframes of `timeline` re-expressed as fractions of `duration`.
fn rescaled(timeline: &Timeline, duration: u64, easing: &Easing) -> Vec<Keyframe> {
    let ratio = timeline.duration() as f64 / duration as f64;
    timeline
        .keyframes()
        .iter()
        .map(|kf| {
            let mut kf = kf.at_time(kf.time * ratio);
            pin_easing(&mut kf, timeline, easing);
            kf
        })
        .collect()
}

/// Sort keyframes by time and fold those sharing a time.
///
/// Later keyframes win property collisions and supply the segment settings.
fn combine(keyframes: impl IntoIterator<Item = Keyframe>) -> Vec<Keyframe> {
    let mut sorted: Vec<Keyframe> = keyframes.into_iter().collect();
    sorted.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut out: Vec<Keyframe> = Vec::with_capacity(sorted.len());
    for kf in sorted {
        match out.last_mut() {
            Some(prev) if (prev.time - kf.time).abs() < TIME_EPSILON => {
                prev.properties.extend(kf.properties);
                prev.easing = kf.easing;
                prev.interpolation = kf.interpolation;
            }
            _ => out.push(kf),
        }
    }
    out
}

fn derive(
    first: &Timeline,
    duration: u64,
    keyframes: Vec<Keyframe>,
    easing: Easing,
    options: &CompositionOptions,
) -> Result<Timeline> {
    let mut metadata = first.metadata().clone();
    metadata.extend(options.metadata.clone());

    Timeline::construct(TimelineOptions {
        id: options.id.clone(),
        duration: Some(duration as f64),
        keyframes,
        easing,
        loop_mode: options.loop_mode.unwrap_or(first.loop_mode()),
        loop_count: options.loop_count.unwrap_or(first.loop_count()),
        delay: options.delay.unwrap_or(first.delay()) as i64,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn ramp(duration: u64, key: &str, to: f64) -> Timeline {
        Timeline::construct(
            TimelineOptions::new(duration)
                .keyframe(Keyframe::new(0.0).set(key, 0.0))
                .keyframe(Keyframe::new(1.0).set(key, to)),
        )
        .unwrap()
    }

    fn times(t: &Timeline) -> Vec<f64> {
        t.keyframes().iter().map(|kf| kf.time).collect()
    }

    #[test]
    fn test_merge_rescales_and_combines() {
        let short = ramp(500, "x", 100.0);
        let long = ramp(1000, "y", 50.0);

        let merged = merge(&short, &long, &CompositionOptions::default()).unwrap();
        assert_eq!(merged.duration(), 1000);
        assert_eq!(times(&merged), vec![0.0, 0.5, 1.0]);

        let start = &merged.keyframes()[0];
        assert_eq!(start.property_keys(), vec!["x", "y"]);
        assert_eq!(merged.keyframes()[1].get("x").and_then(|v| v.as_number()), Some(100.0));
    }

    #[test]
    fn test_merge_later_value_wins() {
        let a = ramp(1000, "x", 100.0);
        let b = Timeline::construct(
            TimelineOptions::new(1000)
                .keyframe(
                    Keyframe::new(0.0)
                        .set("x", 7.0)
                        .with_easing(Easing::EaseIn),
                )
                .keyframe(Keyframe::new(1.0).set("x", 8.0)),
        )
        .unwrap();

        let merged = merge(&a, &b, &CompositionOptions::default()).unwrap();
        assert_eq!(merged.keyframes().len(), 2);
        assert_eq!(merged.keyframes()[0].get("x").and_then(|v| v.as_number()), Some(7.0));
        assert_eq!(merged.keyframes()[0].easing, Some(Easing::EaseIn));
    }

    #[test]
    fn test_merge_override_strategy() {
        let a = ramp(1000, "x", 100.0);
        let b = ramp(250, "y", 1.0);

        let options = CompositionOptions::default().with_strategy(MergeStrategy::Override);
        let merged = merge(&a, &b, &options).unwrap();
        assert_eq!(merged.duration(), 1000);
        assert_eq!(times(&merged), vec![0.0, 0.25]);
        assert_eq!(merged.property_keys(), vec!["y"]);
    }

    #[test]
    fn test_sequence_offsets() {
        let a = ramp(300, "x", 1.0);
        let b = ramp(700, "x", 2.0);

        let seq = sequence(&[a, b], &CompositionOptions::default()).unwrap();
        assert_eq!(seq.duration(), 1000);
        // the shared boundary is folded into one keyframe
        let t = times(&seq);
        assert_eq!(t.len(), 3);
        assert!(approx_eq(t[1], 0.3));
        assert_eq!(seq.keyframes()[1].get("x").and_then(|v| v.as_number()), Some(0.0));
        assert!(seq.verify(&Default::default()).is_ok());
    }

    #[test]
    fn test_sequence_edge_cases() {
        let err = sequence(&[], &CompositionOptions::default()).unwrap_err();
        assert_eq!(err, AnimationError::EmptyTimelineList);

        let t = ramp(400, "x", 1.0);
        let single = sequence(std::slice::from_ref(&t), &CompositionOptions::default()).unwrap();
        assert_eq!(single, t);
    }

    #[test]
    fn test_sequence_pins_source_easing() {
        let a = ramp(100, "x", 1.0);
        let b = Timeline::construct(ramp(100, "x", 2.0).to_options().easing(Easing::EaseOut))
            .unwrap();

        let seq = sequence(&[a, b], &CompositionOptions::default()).unwrap();
        assert_eq!(seq.easing(), &Easing::Linear);
        assert_eq!(seq.keyframes().last().and_then(|kf| kf.easing.clone()), Some(Easing::EaseOut));
    }

    #[test]
    fn test_parallel() {
        let err = parallel(&[], &CompositionOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyTimelineList);

        let all = parallel(
            &[ramp(200, "x", 1.0), ramp(400, "y", 1.0), ramp(800, "z", 1.0)],
            &CompositionOptions::default().with_id("all"),
        )
        .unwrap();
        assert_eq!(all.id(), Some("all"));
        assert_eq!(all.duration(), 800);
        assert_eq!(times(&all), vec![0.0, 0.25, 0.5, 1.0]);
        assert_eq!(all.keyframes()[0].property_keys(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_reverse() {
        let t = Timeline::construct(
            TimelineOptions::new(1000)
                .keyframe(Keyframe::new(0.0).set("x", 0.0).with_easing(Easing::EaseIn))
                .keyframe(Keyframe::new(0.25).set("x", 80.0))
                .keyframe(Keyframe::new(1.0).set("x", 100.0))
                .easing(Easing::EaseIn)
                .loop_mode(LoopMode::Alternate),
        )
        .unwrap();

        let r = reverse(&t).unwrap();
        assert_eq!(times(&r), vec![0.0, 0.75, 1.0]);
        assert_eq!(r.easing(), &Easing::EaseOut);
        assert_eq!(r.loop_mode(), LoopMode::Alternate);
        assert_eq!(r.duration(), 1000);
        // the eased segment now ends the timeline
        assert_eq!(r.keyframes()[1].easing, Some(Easing::EaseOut));
        assert_eq!(r.keyframes()[0].easing, None);

        let back = reverse(&r).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_scale() {
        let t = ramp(1000, "x", 1.0);
        assert_eq!(scale(&t, 1.5).unwrap().duration(), 1500);
        assert_eq!(scale(&t, 0.3333).unwrap().duration(), 333);
        assert_eq!(times(&scale(&t, 2.0).unwrap()), times(&t));

        for factor in [0.0, -1.0, f64::NAN] {
            let err = scale(&t, factor).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidScaleFactor);
        }

        let err = scale(&t, 0.0001).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDuration);
    }

    #[test]
    fn test_repeat() {
        let t = ramp(1000, "x", 1.0);
        let r = repeat(&t, LoopCount::Times(3)).unwrap();
        assert_eq!(r.loop_mode(), LoopMode::Restart);
        assert_eq!(r.loop_count(), LoopCount::Times(3));

        let r = repeat(&t, LoopCount::Infinite).unwrap();
        assert!(r.loop_count().is_infinite());

        let err = repeat(&t, LoopCount::Times(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRepeatCount);
    }

    #[test]
    fn test_inputs_untouched() {
        let a = ramp(500, "x", 1.0);
        let b = ramp(1000, "y", 1.0);
        let before = (a.clone(), b.clone());
        merge(&a, &b, &CompositionOptions::default()).unwrap();
        assert_eq!((a, b), before);
    }
}
