//! Interpolation between keyframes.
//!
//! The `Interpolate` trait blends two values of the same shape. On top of it,
//! [`interpolate`] computes the property map for a pair of keyframes:
//!
//! 1. resolve the easing (`from.easing`, else the timeline easing)
//! 2. ease the segment progress
//! 3. for every property in either keyframe, blend according to
//!    `from.interpolation`
//!
//! Values present on only one side pass through unchanged. Shape mismatches
//! are caught by the validator ahead of time; here they degrade to the source
//! value.

use std::collections::BTreeSet;

use crate::easing::Easing;
use crate::keyframe::{InterpolationMode, Keyframe};
use crate::value::{PropertyMap, PropertyValue};

/// Trait for types that can be interpolated between two values.
pub trait Interpolate: Sized {
    /// Interpolate between self and another value.
    ///
    /// When t = 0.0, returns self.
    /// When t = 1.0, returns to.
    fn interpolate(&self, to: &Self, t: f64) -> Self;
}

/// Linear interpolation helper, exact at both ends.
#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    if t == 1.0 {
        return to;
    }
    from + (to - from) * t
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp(*self, *to, t)
    }
}

impl<const N: usize> Interpolate for [f64; N] {
    /// Component-wise blend.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        std::array::from_fn(|i| lerp(self[i], to[i], t))
    }
}

impl Interpolate for PropertyValue {
    /// Blend two values of the same shape.
    ///
    /// Text switches at the midpoint. Mismatched shapes return self unchanged.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        match (self, to) {
            (Self::Number(a), Self::Number(b)) => Self::Number(a.interpolate(b, t)),
            (Self::Vec2(a), Self::Vec2(b)) => Self::Vec2(a.interpolate(b, t)),
            (Self::Vec3(a), Self::Vec3(b)) => Self::Vec3(a.interpolate(b, t)),
            (Self::Vec4(a), Self::Vec4(b)) => Self::Vec4(a.interpolate(b, t)),
            (Self::Text(_), Self::Text(_)) => discrete(self, to, t),
            _ => self.clone(),
        }
    }
}

#[inline]
fn discrete(from: &PropertyValue, to: &PropertyValue, t: f64) -> PropertyValue {
    if t < 0.5 { from.clone() } else { to.clone() }
}

/// Compute property values between two keyframes.
///
/// `progress` is the position within the segment (0.0 at `from`, 1.0 at
/// `to`); `fallback_easing` is used when `from` carries no easing.
pub fn interpolate(
    from: &Keyframe,
    to: &Keyframe,
    progress: f64,
    fallback_easing: &Easing,
) -> PropertyMap {
    let easing = from.easing.as_ref().unwrap_or(fallback_easing);
    let eased = easing.apply(progress);

    let keys: BTreeSet<&String> = from.properties.keys().chain(to.properties.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let value = match (from.properties.get(key), to.properties.get(key)) {
                (Some(a), Some(b)) => blend(from.interpolation, a, b, eased),
                (Some(a), None) => a.clone(),
                (None, Some(b)) => b.clone(),
                (None, None) => return None,
            };
            Some((key.clone(), value))
        })
        .collect()
}

fn blend(
    mode: InterpolationMode,
    from: &PropertyValue,
    to: &PropertyValue,
    eased: f64,
) -> PropertyValue {
    match mode {
        InterpolationMode::Discrete => discrete(from, to, eased),
        InterpolationMode::Hold => from.clone(),
        InterpolationMode::Linear | InterpolationMode::Spline => from.interpolate(to, eased),
    }
}

impl Keyframe {
    /// Interpolate from this keyframe towards `to`. See [`interpolate`].
    pub fn interpolate(
        &self,
        to: &Keyframe,
        progress: f64,
        fallback_easing: &Easing,
    ) -> PropertyMap {
        interpolate(self, to, progress, fallback_easing)
    }
}
