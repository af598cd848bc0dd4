//! Keyframes: property snapshots pinned to a fractional time.
//!
//! A keyframe is an immutable value. Builders return new keyframes and
//! composition produces fresh ones rather than editing existing ones.
//!
//! # Example
//!
//! ```
//! use cadence_engine::{Easing, InterpolationMode, Keyframe};
//!
//! let kf = Keyframe::new(0.5)
//!     .set("opacity", 0.8)
//!     .set("color", [1.0, 0.0, 0.0, 1.0])
//!     .with_easing(Easing::EaseOut)
//!     .with_interpolation(InterpolationMode::Linear);
//! assert_eq!(kf.get("opacity").and_then(|v| v.as_number()), Some(0.8));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::options::KeyframeOptions;
use crate::value::{PropertyMap, PropertyValue};

/// How a keyframe's outgoing segment morphs into the next keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Numeric blend.
    #[default]
    Linear,
    /// Jump to the next value halfway through the segment.
    Discrete,
    /// Smooth curve. Blends linearly for now; a spline needs neighbouring
    /// keyframes, which the two-keyframe interpolator does not see.
    Spline,
    /// Keep the current value until the next keyframe.
    Hold,
}

impl InterpolationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Discrete => "discrete",
            Self::Spline => "spline",
            Self::Hold => "hold",
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationMode {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "linear" => Ok(Self::Linear),
            "discrete" => Ok(Self::Discrete),
            "spline" => Ok(Self::Spline),
            "hold" => Ok(Self::Hold),
            other => Err(AnimationError::InvalidInterpolationMode(format!(
                "unknown interpolation mode `{other}`"
            ))),
        }
    }
}

/// A single keyframe in a timeline.
///
/// `time` is a fraction of the owning timeline's duration. Uniqueness of
/// times is the timeline's concern, checked by the validator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Keyframe {
    /// Position in the timeline (0.0 to 1.0).
    pub time: f64,
    /// Property values at this keyframe.
    pub properties: PropertyMap,
    /// Easing for the segment starting at this keyframe. Falls back to the
    /// timeline easing when `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<Easing>,
    /// How the segment starting at this keyframe is interpolated.
    #[serde(default)]
    pub interpolation: InterpolationMode,
}

impl Keyframe {
    /// Start building a keyframe at `time`.
    ///
    /// No checks are made here; use [`Keyframe::construct`] for validated
    /// input or run the validator over the finished keyframe list.
    pub fn new(time: f64) -> Self {
        Self {
            time,
            properties: PropertyMap::new(),
            easing: None,
            interpolation: InterpolationMode::Linear,
        }
    }

    /// Build a keyframe from loose options, checking each field.
    pub fn construct(options: KeyframeOptions) -> Result<Self> {
        let time = options.time.ok_or(AnimationError::TimeRequired)?;
        if !time.is_finite() || !(0.0..=1.0).contains(&time) {
            return Err(AnimationError::InvalidTime(format!(
                "{time} is not within [0, 1]"
            )));
        }

        let properties = options.properties.ok_or(AnimationError::PropertiesRequired)?;
        for (key, value) in &properties {
            if key.is_empty() {
                return Err(AnimationError::InvalidProperties(
                    "property names must not be empty".to_string(),
                ));
            }
            if !value.is_finite() {
                return Err(AnimationError::InvalidProperties(format!(
                    "property `{key}` has a non-finite component"
                )));
            }
        }

        if let Some(easing) = &options.easing {
            easing.validate()?;
        }

        Ok(Self {
            time,
            properties,
            easing: options.easing,
            interpolation: options.interpolation.unwrap_or_default(),
        })
    }

    /// Panicking variant of [`Keyframe::construct`] for call sites that treat
    /// bad input as a programming error.
    pub fn construct_or_panic(options: KeyframeOptions) -> Self {
        match Self::construct(options) {
            Ok(kf) => kf,
            Err(err) => panic!("invalid keyframe: {err}"),
        }
    }

    /// Set a property value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set the easing for the segment starting at this keyframe.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn with_interpolation(mut self, mode: InterpolationMode) -> Self {
        self.interpolation = mode;
        self
    }

    /// Copy of this keyframe moved to another time.
    pub fn at_time(&self, time: f64) -> Self {
        Self {
            time,
            ..self.clone()
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Property names in sorted order.
    pub fn property_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, f64)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::Number(*v)))
            .collect()
    }

    #[test]
    fn test_keyframe_builder() {
        let kf = Keyframe::new(0.5)
            .set("opacity", 0.5)
            .with_easing(Easing::EaseOut)
            .with_interpolation(InterpolationMode::Hold);

        assert_eq!(kf.time, 0.5);
        assert_eq!(kf.get("opacity").and_then(|v| v.as_number()), Some(0.5));
        assert_eq!(kf.easing, Some(Easing::EaseOut));
        assert_eq!(kf.interpolation, InterpolationMode::Hold);
    }

    #[test]
    fn test_construct_defaults() {
        let kf = Keyframe::construct(KeyframeOptions {
            time: Some(0.25),
            properties: Some(props(&[("x", 10.0)])),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(kf.time, 0.25);
        assert_eq!(kf.easing, None);
        assert_eq!(kf.interpolation, InterpolationMode::Linear);
    }

    #[test]
    fn test_construct_errors() {
        let err = Keyframe::construct(KeyframeOptions {
            properties: Some(props(&[("x", 0.0)])),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, AnimationError::TimeRequired);

        let err = Keyframe::construct(KeyframeOptions {
            time: Some(1.5),
            properties: Some(props(&[("x", 0.0)])),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AnimationError::InvalidTime(_)));

        let err = Keyframe::construct(KeyframeOptions {
            time: Some(0.0),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, AnimationError::PropertiesRequired);

        let err = Keyframe::construct(KeyframeOptions {
            time: Some(0.0),
            properties: Some(props(&[("", 1.0)])),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AnimationError::InvalidProperties(_)));

        let err = Keyframe::construct(KeyframeOptions {
            time: Some(0.0),
            properties: Some(props(&[("x", f64::NAN)])),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, AnimationError::InvalidProperties(_)));
    }

    #[test]
    #[should_panic(expected = "invalid keyframe")]
    fn test_construct_or_panic() {
        Keyframe::construct_or_panic(KeyframeOptions::default());
    }

    #[test]
    fn test_interpolation_mode_parse() {
        assert_eq!("hold".parse::<InterpolationMode>().unwrap(), InterpolationMode::Hold);
        assert_eq!(
            "bouncy".parse::<InterpolationMode>().unwrap_err().kind(),
            crate::ErrorKind::InvalidInterpolationMode
        );
    }

    #[test]
    fn test_property_keys_sorted() {
        let kf = Keyframe::new(0.0).set("y", 1.0).set("x", 2.0).set("alpha", 3.0);
        assert_eq!(kf.property_keys(), vec!["alpha", "x", "y"]);
    }

    #[test]
    fn test_serialization() {
        let kf = Keyframe::new(1.0).set("x", 100.0);
        let json = serde_json::to_value(&kf).unwrap();
        assert_eq!(json["time"], 1.0);
        assert_eq!(json["properties"]["x"], 100.0);
        assert_eq!(json["interpolation"], "linear");

        let parsed: Keyframe = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, kf);
    }
}
