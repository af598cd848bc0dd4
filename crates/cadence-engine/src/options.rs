//! Constructor arguments for timelines and keyframes.
//!
//! The option structs are the typed input to [`Timeline::construct`] and
//! [`Keyframe::construct`]. They can be filled in directly, through the
//! builder methods, or decoded from loose JSON handed over by an authoring
//! layer with `from_value`, which maps every malformed field to its
//! construction error.
//!
//! # Loose JSON shape
//!
//! ```json
//! {
//!   "id": "fade-in",
//!   "duration": 1000,
//!   "keyframes": [
//!     { "time": 0.0, "properties": { "opacity": 0, "color": [1, 0, 0, 1] } },
//!     { "time": 1.0, "properties": { "opacity": 1 }, "interpolation": "hold" }
//!   ],
//!   "easing": "ease_in_out",
//!   "loop_mode": "alternate",
//!   "loop_count": "infinite",
//!   "delay": 200,
//!   "metadata": { "element": "#hero" }
//! }
//! ```
//!
//! `easing` may also be a four-number array (cubic bezier) or a tagged object
//! such as `{ "type": "cubic_bezier", "x1": 0.4, "y1": 0, "x2": 0.2, "y2": 1 }`.
//! Multi-word keys are accepted in snake_case or camelCase.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::keyframe::{InterpolationMode, Keyframe};
use crate::timeline::{LoopCount, LoopMode};
use crate::value::{PropertyMap, PropertyValue};

#[cfg(doc)]
use crate::timeline::Timeline;

/// Auxiliary data carried by a timeline, opaque to the engine.
pub type Metadata = Map<String, Value>;

/// Arguments for [`Keyframe::construct`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyframeOptions {
    pub time: Option<f64>,
    pub properties: Option<PropertyMap>,
    pub easing: Option<Easing>,
    #[serde(alias = "interpolationMode", alias = "interpolation_mode")]
    pub interpolation: Option<InterpolationMode>,
}

impl KeyframeOptions {
    /// Decode a loose JSON keyframe.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            AnimationError::InvalidKeyframes(format!("keyframe must be an object, got {value}"))
        })?;

        let time = match field(obj, &["time"]) {
            None => None,
            Some(v) => Some(v.as_f64().ok_or_else(|| {
                AnimationError::InvalidTime(format!("{v} is not a number"))
            })?),
        };

        let properties = match field(obj, &["properties"]) {
            None => None,
            Some(v) => Some(decode_properties(v)?),
        };

        let easing = field(obj, &["easing"]).map(decode_easing).transpose()?;

        let interpolation = match field(
            obj,
            &["interpolation", "interpolation_mode", "interpolationMode"],
        ) {
            None => None,
            Some(Value::String(s)) => Some(s.parse()?),
            Some(other) => {
                return Err(AnimationError::InvalidInterpolationMode(format!(
                    "{other} is not a mode name"
                )));
            }
        };

        Ok(Self {
            time,
            properties,
            easing,
            interpolation,
        })
    }
}

/// Arguments for [`Timeline::construct`].
///
/// `duration` is optional here so that a missing duration can be reported;
/// `delay` is signed so that a negative delay can be.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub duration: Option<f64>,
    pub keyframes: Vec<Keyframe>,
    pub easing: Easing,
    #[serde(alias = "loopMode")]
    pub loop_mode: LoopMode,
    #[serde(alias = "loopCount")]
    pub loop_count: LoopCount,
    pub delay: i64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub metadata: Metadata,
}

impl TimelineOptions {
    /// Options for a timeline of the given duration with all defaults.
    pub fn new(duration: u64) -> Self {
        Self {
            duration: Some(duration as f64),
            ..Default::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Append a keyframe.
    pub fn keyframe(mut self, keyframe: Keyframe) -> Self {
        self.keyframes.push(keyframe);
        self
    }

    pub fn keyframes(mut self, keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        self.keyframes.extend(keyframes);
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn loop_mode(mut self, mode: LoopMode) -> Self {
        self.loop_mode = mode;
        self
    }

    pub fn loop_count(mut self, count: LoopCount) -> Self {
        self.loop_count = count;
        self
    }

    pub fn delay(mut self, delay: i64) -> Self {
        self.delay = delay;
        self
    }

    /// Attach one metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Decode loose JSON constructor arguments.
    ///
    /// Keyframes are built with [`Keyframe::construct`]; their errors are
    /// returned unchanged. Field-level duration checks happen later in
    /// [`Timeline::construct`]. A document that is not an object has no
    /// usable duration and fails with `InvalidDuration`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            AnimationError::InvalidDuration(format!("timeline must be an object, got {value}"))
        })?;

        let duration = match field(obj, &["duration"]) {
            None => None,
            Some(v) => Some(v.as_f64().ok_or_else(|| {
                AnimationError::InvalidDuration(format!("{v} is not a number"))
            })?),
        };

        let keyframes = match field(obj, &["keyframes"]) {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| Keyframe::construct(KeyframeOptions::from_value(item)?))
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(AnimationError::InvalidKeyframes(format!(
                    "expected a list of keyframes, got {other}"
                )));
            }
        };

        let easing = field(obj, &["easing"])
            .map(decode_easing)
            .transpose()?
            .unwrap_or_default();

        let loop_mode = match field(obj, &["loop_mode", "loopMode"]) {
            None => LoopMode::default(),
            Some(Value::String(s)) => s.parse()?,
            Some(other) => {
                return Err(AnimationError::InvalidLoopMode(format!(
                    "{other} is not a loop mode name"
                )));
            }
        };

        let loop_count = field(obj, &["loop_count", "loopCount"])
            .map(decode_loop_count)
            .transpose()?
            .unwrap_or_default();

        let delay = match field(obj, &["delay"]) {
            None => 0,
            Some(v) => whole_number(v)
                .filter(|d| *d >= 0)
                .ok_or_else(|| {
                    AnimationError::InvalidDelay(format!("{v} is not a non-negative whole number"))
                })?,
        };

        let metadata = match field(obj, &["metadata"]) {
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                tracing::warn!(metadata = %other, "ignoring non-object timeline metadata");
                Metadata::new()
            }
            None => Metadata::new(),
        };

        let id = match field(obj, &["id"]) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        };

        Ok(Self {
            id,
            duration,
            keyframes,
            easing,
            loop_mode,
            loop_count,
            delay,
            metadata,
        })
    }
}

/// First present, non-null field among `names`.
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

/// Integral value of a JSON number, accepting `2` and `2.0` alike.
fn whole_number(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn decode_properties(value: &Value) -> Result<PropertyMap> {
    let obj = value.as_object().ok_or_else(|| {
        AnimationError::InvalidProperties(format!("expected an object, got {value}"))
    })?;

    obj.iter()
        .map(|(key, v)| {
            let parsed = serde_json::from_value::<PropertyValue>(v.clone()).map_err(|_| {
                AnimationError::InvalidProperties(format!(
                    "property `{key}` must be a number, a string or 2-4 numbers, got {v}"
                ))
            })?;
            Ok((key.clone(), parsed))
        })
        .collect()
}

/// Named curve, four-number cubic bezier, or tagged object.
pub(crate) fn decode_easing(value: &Value) -> Result<Easing> {
    let easing = match value {
        Value::String(name) => name.parse()?,
        Value::Array(items) => {
            let params: Option<Vec<f64>> = items.iter().map(Value::as_f64).collect();
            match params.as_deref() {
                Some(&[x1, y1, x2, y2]) => Easing::CubicBezier { x1, y1, x2, y2 },
                _ => {
                    return Err(AnimationError::InvalidEasing(format!(
                        "cubic bezier needs four numbers, got {value}"
                    )));
                }
            }
        }
        Value::Object(_) => serde_json::from_value(value.clone())
            .map_err(|e| AnimationError::InvalidEasing(format!("{value}: {e}")))?,
        other => {
            return Err(AnimationError::InvalidEasing(format!(
                "{other} is not an easing"
            )));
        }
    };
    easing.validate()?;
    Ok(easing)
}

fn decode_loop_count(value: &Value) -> Result<LoopCount> {
    match value {
        Value::String(s) if matches!(s.trim(), "infinite" | "infinity") => Ok(LoopCount::Infinite),
        _ => whole_number(value)
            .and_then(|n| u32::try_from(n).ok())
            .map(LoopCount::Times)
            .ok_or_else(|| {
                AnimationError::InvalidLoopCount(format!(
                    "{value} is neither a non-negative whole number nor \"infinite\""
                ))
            }),
    }
}
