//! Cross-keyframe validation.
//!
//! Pure functions over keyframe lists and timelines. None of them run during
//! [`Timeline::construct`]; callers invoke them explicitly, usually through
//! [`verify`], after authoring input has been turned into timelines.
//!
//! Batched checks collect every offending item before failing so that all
//! problems can be reported at once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{AnimationError, Result};
use crate::keyframe::Keyframe;
use crate::timeline::Timeline;
use crate::value::ValueKind;

/// A keyframe lacking properties that other keyframes in the same timeline
/// define.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingProperties {
    /// Position of the keyframe in the list.
    pub index: usize,
    pub time: f64,
    /// Missing property names, sorted.
    pub missing: Vec<String>,
}

/// Adjacent keyframes holding values of different shapes under one name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationIssue {
    pub property: String,
    pub from_index: usize,
    pub from_time: f64,
    pub from_kind: ValueKind,
    pub to_time: f64,
    pub to_kind: ValueKind,
}

impl fmt::Display for InterpolationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` cannot blend {:?} at {} into {:?} at {}",
            self.property, self.from_kind, self.from_time, self.to_kind, self.to_time
        )
    }
}

/// Knobs for [`verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Treat keyframes with missing properties as an error instead of an
    /// advisory finding.
    pub strict_properties: bool,
}

/// Outcome of a successful [`verify`] run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Verification {
    /// Advisory property-consistency findings.
    pub warnings: Vec<MissingProperties>,
}

impl Verification {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// The ways timelines can be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionMode {
    Merge,
    Sequence,
    Parallel,
    Reverse,
    Scale,
    Repeat,
}

impl CompositionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Sequence => "sequence",
            Self::Parallel => "parallel",
            Self::Reverse => "reverse",
            Self::Scale => "scale",
            Self::Repeat => "repeat",
        }
    }

    /// Modes that combine two or more timelines.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Merge | Self::Sequence | Self::Parallel)
    }
}

impl FromStr for CompositionMode {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "merge" => Ok(Self::Merge),
            "sequence" => Ok(Self::Sequence),
            "parallel" => Ok(Self::Parallel),
            "reverse" => Ok(Self::Reverse),
            "scale" => Ok(Self::Scale),
            "repeat" => Ok(Self::Repeat),
            other => Err(AnimationError::InvalidCompositionMode(format!(
                "unknown composition mode `{other}`"
            ))),
        }
    }
}

/// Every keyframe time must lie in [0, 1]. Reports all offending times.
pub fn validate_keyframe_times(keyframes: &[Keyframe]) -> Result<()> {
    let invalid: Vec<f64> = keyframes
        .iter()
        .map(|kf| kf.time)
        .filter(|t| !(0.0..=1.0).contains(t))
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(AnimationError::InvalidKeyframeTimes(invalid))
    }
}

/// Keyframes must already be in ascending time order, with no two sharing
/// a time.
pub fn validate_keyframe_ordering(keyframes: &[Keyframe]) -> Result<()> {
    let ordered = keyframes.windows(2).all(|pair| pair[0].time <= pair[1].time);
    if !ordered {
        return Err(AnimationError::KeyframesNotOrdered);
    }

    let mut duplicates: Vec<f64> = keyframes
        .windows(2)
        .filter(|pair| pair[0].time == pair[1].time)
        .map(|pair| pair[0].time)
        .collect();
    duplicates.dedup();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(AnimationError::DuplicateKeyframeTimes(duplicates))
    }
}

/// Find keyframes missing properties that appear elsewhere.
///
/// Advisory: an empty result means every keyframe defines every property.
pub fn validate_property_consistency(keyframes: &[Keyframe]) -> Vec<MissingProperties> {
    let all: BTreeSet<&str> = keyframes
        .iter()
        .flat_map(|kf| kf.properties.keys().map(String::as_str))
        .collect();

    keyframes
        .iter()
        .enumerate()
        .filter_map(|(index, kf)| {
            let missing: Vec<String> = all
                .iter()
                .filter(|key| !kf.properties.contains_key(**key))
                .map(|key| key.to_string())
                .collect();
            (!missing.is_empty()).then(|| MissingProperties {
                index,
                time: kf.time,
                missing,
            })
        })
        .collect()
}

/// Every property present in two adjacent keyframes must be blendable.
/// Collects all incompatible pairs.
pub fn validate_property_interpolation(keyframes: &[Keyframe]) -> Result<()> {
    let mut issues = Vec::new();

    for (from_index, pair) in keyframes.windows(2).enumerate() {
        let (from, to) = (&pair[0], &pair[1]);
        let mut keys: Vec<&String> = from.properties.keys().collect();
        keys.sort_unstable();

        for key in keys {
            let (Some(a), Some(b)) = (from.properties.get(key), to.properties.get(key)) else {
                continue;
            };
            if !a.is_interpolatable_with(b) {
                issues.push(InterpolationIssue {
                    property: key.clone(),
                    from_index,
                    from_time: from.time,
                    from_kind: a.kind(),
                    to_time: to.time,
                    to_kind: b.kind(),
                });
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AnimationError::InterpolationErrors(issues))
    }
}

/// Check that two timelines can be combined with `mode`.
///
/// Only the binary modes apply; zero-duration inputs are rejected.
pub fn validate_composition(a: &Timeline, b: &Timeline, mode: CompositionMode) -> Result<()> {
    if !mode.is_binary() {
        return Err(AnimationError::InvalidCompositionMode(format!(
            "`{}` does not combine timelines",
            mode.as_str()
        )));
    }

    for timeline in [a, b] {
        if timeline.duration() == 0 {
            return Err(AnimationError::InvalidTimelineDuration(format!(
                "timeline {} has zero duration",
                timeline.id().unwrap_or("<anonymous>")
            )));
        }
    }

    Ok(())
}

/// Run the deep validation pass over a timeline.
///
/// Times, ordering and interpolatability fail the pass. Property
/// consistency is reported as warnings, or as
/// [`AnimationError::InconsistentProperties`] when `strict_properties` is set.
pub fn verify(timeline: &Timeline, options: &VerifyOptions) -> Result<Verification> {
    let keyframes = timeline.keyframes();

    validate_keyframe_times(keyframes)?;
    validate_keyframe_ordering(keyframes)?;
    validate_property_interpolation(keyframes)?;

    let warnings = validate_property_consistency(keyframes);
    for warning in &warnings {
        tracing::warn!(
            timeline = timeline.id().unwrap_or("<anonymous>"),
            index = warning.index,
            time = warning.time,
            missing = ?warning.missing,
            "keyframe is missing properties defined elsewhere"
        );
    }

    if options.strict_properties && !warnings.is_empty() {
        return Err(AnimationError::InconsistentProperties(warnings));
    }

    Ok(Verification { warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::options::TimelineOptions;
    use crate::value::PropertyValue;

    fn kf(time: f64) -> Keyframe {
        Keyframe::new(time).set("x", time * 100.0)
    }

    #[test]
    fn test_times_in_bounds() {
        assert!(validate_keyframe_times(&[kf(0.0), kf(0.5), kf(1.0)]).is_ok());

        let err = validate_keyframe_times(&[kf(-0.1), kf(0.5), kf(1.1)]).unwrap_err();
        assert_eq!(err, AnimationError::InvalidKeyframeTimes(vec![-0.1, 1.1]));
    }

    #[test]
    fn test_nan_time_is_out_of_bounds() {
        let err = validate_keyframe_times(&[kf(f64::NAN)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKeyframeTimes);
    }

    #[test]
    fn test_ordering() {
        assert!(validate_keyframe_ordering(&[]).is_ok());
        assert!(validate_keyframe_ordering(&[kf(0.0), kf(0.3), kf(1.0)]).is_ok());

        let err = validate_keyframe_ordering(&[kf(0.5), kf(0.2)]).unwrap_err();
        assert_eq!(err, AnimationError::KeyframesNotOrdered);

        let err = validate_keyframe_ordering(&[kf(0.0), kf(0.5), kf(0.5), kf(1.0)]).unwrap_err();
        assert_eq!(err, AnimationError::DuplicateKeyframeTimes(vec![0.5]));
    }

    #[test]
    fn test_property_consistency_is_advisory() {
        let frames = [
            Keyframe::new(0.0).set("x", 0.0).set("y", 0.0),
            Keyframe::new(0.5).set("x", 5.0),
            Keyframe::new(1.0).set("y", 1.0).set("z", 2.0),
        ];
        let findings = validate_property_consistency(&frames);

        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].missing, vec!["z"]);
        assert_eq!(findings[1].missing, vec!["y", "z"]);
        assert_eq!(findings[2].index, 2);
        assert_eq!(findings[2].missing, vec!["x"]);
    }

    #[test]
    fn test_interpolation_collects_every_issue() {
        let frames = [
            Keyframe::new(0.0).set("x", 0.0).set("pos", [0.0, 0.0]),
            Keyframe::new(0.5).set("x", "far").set("pos", [1.0, 1.0, 1.0]),
            Keyframe::new(1.0).set("x", "near").set("pos", [2.0, 2.0, 2.0]),
        ];

        let err = validate_property_interpolation(&frames).unwrap_err();
        let AnimationError::InterpolationErrors(issues) = err else {
            panic!("expected interpolation errors");
        };
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].property, "pos");
        assert_eq!(issues[0].from_kind, ValueKind::Vec2);
        assert_eq!(issues[0].to_kind, ValueKind::Vec3);
        assert_eq!(issues[1].property, "x");
        assert_eq!(issues[1].from_kind, ValueKind::Number);
        assert_eq!(issues[1].to_kind, ValueKind::Text);
    }

    #[test]
    fn test_interpolation_ignores_one_sided_properties() {
        let frames = [
            Keyframe::new(0.0).set("x", 0.0),
            Keyframe::new(1.0).set("label", PropertyValue::Text("end".into())),
        ];
        assert!(validate_property_interpolation(&frames).is_ok());
    }

    #[test]
    fn test_composition_modes() {
        let t = Timeline::construct(TimelineOptions::new(100)).unwrap();
        assert!(validate_composition(&t, &t, CompositionMode::Merge).is_ok());
        assert!(validate_composition(&t, &t, CompositionMode::Parallel).is_ok());

        let err = validate_composition(&t, &t, CompositionMode::Scale).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCompositionMode);

        let err = "zip".parse::<CompositionMode>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCompositionMode);
    }

    #[test]
    fn test_verify_reports_warnings_or_fails_when_strict() {
        let timeline = Timeline::construct(
            TimelineOptions::new(100)
                .keyframe(Keyframe::new(0.0).set("x", 0.0).set("y", 0.0))
                .keyframe(Keyframe::new(1.0).set("x", 1.0)),
        )
        .unwrap();

        let report = timeline.verify(&VerifyOptions::default()).unwrap();
        assert!(!report.is_clean());
        assert_eq!(report.warnings[0].index, 1);

        let err = timeline
            .verify(&VerifyOptions { strict_properties: true })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InconsistentProperties);
    }

    #[test]
    fn test_verify_fails_on_structure() {
        let timeline = Timeline::construct(
            TimelineOptions::new(100)
                .keyframe(kf(0.6))
                .keyframe(kf(0.4)),
        )
        .unwrap();
        let err = timeline.verify(&VerifyOptions::default()).unwrap_err();
        assert_eq!(err, AnimationError::KeyframesNotOrdered);
    }
}
