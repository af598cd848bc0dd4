//! Property values carried by keyframes.
//!
//! A property value is one of:
//! - `Number`: a single scalar (opacity, width, rotation, ...)
//! - `Text`: a string, switched rather than blended
//! - `Vec2` / `Vec3` / `Vec4`: fixed-arity numeric tuples; `Vec4` is usually
//!   an RGBA color

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping from property name to value, as stored on keyframes and returned
/// by the interpolator.
pub type PropertyMap = HashMap<String, PropertyValue>;

/// A single animatable value.
///
/// Serializes untagged: a number, a string or an array of 2-4 numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Text(String),
    Vec2([f64; 2]),
    Vec3([f64; 3]),
    Vec4([f64; 4]),
}

/// Shape of a [`PropertyValue`], used for compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Number,
    Text,
    Vec2,
    Vec3,
    Vec4,
}

impl PropertyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Text(_) => ValueKind::Text,
            Self::Vec2(_) => ValueKind::Vec2,
            Self::Vec3(_) => ValueKind::Vec3,
            Self::Vec4(_) => ValueKind::Vec4,
        }
    }

    /// Two values can be interpolated when they share a shape.
    ///
    /// Text pairs are compatible; they switch at the midpoint instead of
    /// blending.
    pub fn is_interpolatable_with(&self, other: &PropertyValue) -> bool {
        self.kind() == other.kind()
    }

    /// True when every numeric component is finite. Text is always finite.
    pub fn is_finite(&self) -> bool {
        self.components().iter().all(|c| c.is_finite())
    }

    /// Numeric components of this value; empty for text.
    pub fn components(&self) -> &[f64] {
        match self {
            Self::Number(v) => std::slice::from_ref(v),
            Self::Text(_) => &[],
            Self::Vec2(v) => v,
            Self::Vec3(v) => v,
            Self::Vec4(v) => v,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vec2(&self) -> Option<[f64; 2]> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<[f64; 3]> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract a 4-tuple (typically RGBA).
    pub fn as_vec4(&self) -> Option<[f64; 4]> {
        match self {
            Self::Vec4(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<[f64; 2]> for PropertyValue {
    fn from(v: [f64; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f64; 3]> for PropertyValue {
    fn from(v: [f64; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl From<[f64; 4]> for PropertyValue {
    fn from(v: [f64; 4]) -> Self {
        Self::Vec4(v)
    }
}

impl From<(f64, f64)> for PropertyValue {
    fn from((a, b): (f64, f64)) -> Self {
        Self::Vec2([a, b])
    }
}

impl From<(f64, f64, f64)> for PropertyValue {
    fn from((a, b, c): (f64, f64, f64)) -> Self {
        Self::Vec3([a, b, c])
    }
}

impl From<(f64, f64, f64, f64)> for PropertyValue {
    fn from((a, b, c, d): (f64, f64, f64, f64)) -> Self {
        Self::Vec4([a, b, c, d])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        let v: PropertyValue = 42.0.into();
        assert_eq!(v.as_number(), Some(42.0));
        assert_eq!(v.as_text(), None);

        let v: PropertyValue = "visible".into();
        assert_eq!(v.as_text(), Some("visible"));
        assert_eq!(v.kind(), ValueKind::Text);

        let v: PropertyValue = (1.0, 0.5, 0.0, 1.0).into();
        assert_eq!(v.as_vec4(), Some([1.0, 0.5, 0.0, 1.0]));
        assert_eq!(v.as_vec3(), None);
    }

    #[test]
    fn test_compatibility_by_shape() {
        let n = PropertyValue::Number(1.0);
        let t = PropertyValue::Text("a".into());
        let v2 = PropertyValue::Vec2([0.0, 1.0]);
        let v3 = PropertyValue::Vec3([0.0, 1.0, 2.0]);

        assert!(n.is_interpolatable_with(&PropertyValue::Number(5.0)));
        assert!(t.is_interpolatable_with(&PropertyValue::Text("b".into())));
        assert!(!n.is_interpolatable_with(&t));
        assert!(!v2.is_interpolatable_with(&v3));
    }

    #[test]
    fn test_untagged_serialization() {
        let json = serde_json::to_string(&PropertyValue::Vec2([1.0, 2.0])).unwrap();
        assert_eq!(json, "[1.0,2.0]");

        let parsed: PropertyValue = serde_json::from_str("[0.1, 0.2, 0.3, 1.0]").unwrap();
        assert_eq!(parsed, PropertyValue::Vec4([0.1, 0.2, 0.3, 1.0]));

        let parsed: PropertyValue = serde_json::from_str("\"hidden\"").unwrap();
        assert_eq!(parsed.as_text(), Some("hidden"));
    }

    #[test]
    fn test_finiteness() {
        assert!(PropertyValue::Vec3([1.0, 2.0, 3.0]).is_finite());
        assert!(!PropertyValue::Number(f64::NAN).is_finite());
        assert!(PropertyValue::Text("x".into()).is_finite());
    }
}
