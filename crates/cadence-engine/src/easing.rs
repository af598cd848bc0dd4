//! Easing functions for animation timing.
//!
//! Named curves use the closed-form polynomials below, cubic-bezier curves are
//! solved numerically, and callers can plug in their own function.
//!
//! | Curve         | f(p)                                      |
//! |---------------|-------------------------------------------|
//! | `linear`      | `p`                                       |
//! | `ease_in`     | `p²`                                      |
//! | `ease_out`    | `p(2 − p)`                                |
//! | `ease_in_out` | `p < 0.5 ? 2p² : −1 + (4 − 2p)p`          |
//!
//! # Usage
//!
//! ```
//! use cadence_engine::easing::Easing;
//!
//! let progress = Easing::EaseIn.apply(0.5); // 0.25
//!
//! let custom = Easing::cubic_bezier(0.4, 0.0, 0.2, 1.0).unwrap();
//! let progress = custom.apply(0.5);
//!
//! let stepped = Easing::custom(|p| (p * 4.0).floor() / 4.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{AnimationError, Result};

/// Caller-supplied easing callback.
#[derive(Clone)]
pub struct CustomEasing(Arc<dyn Fn(f64) -> f64 + Send + Sync>);

impl CustomEasing {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, progress: f64) -> f64 {
        (self.0)(progress)
    }
}

impl fmt::Debug for CustomEasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomEasing(..)")
    }
}

/// Two custom easings are equal only when they share the same callback.
impl PartialEq for CustomEasing {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Easing function for animation timing.
///
/// Maps linear progress in [0, 1] to eased progress. Input outside that range
/// is clamped before evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Easing {
    /// No easing.
    #[default]
    Linear,

    /// Slow start, accelerating.
    EaseIn,

    /// Fast start, decelerating.
    EaseOut,

    /// Slow start and end, fast middle.
    EaseInOut,

    /// Cubic bezier curve through (0,0), (x1,y1), (x2,y2), (1,1).
    /// x values must lie in [0, 1]; y values may overshoot.
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },

    /// Arbitrary one-argument function. Not serializable.
    #[serde(skip)]
    Custom(CustomEasing),
}

impl Easing {
    /// Evaluate the easing function at the given progress.
    pub fn apply(&self, progress: f64) -> f64 {
        let p = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };

        match self {
            Self::Linear => p,
            Self::EaseIn => p * p,
            Self::EaseOut => p * (2.0 - p),
            Self::EaseInOut => {
                if p < 0.5 {
                    2.0 * p * p
                } else {
                    -1.0 + (4.0 - 2.0 * p) * p
                }
            }
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, p),
            Self::Custom(f) => f.call(p),
        }
    }

    /// Create a cubic bezier easing, rejecting non-finite parameters and
    /// x control points outside [0, 1].
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        let easing = Self::CubicBezier { x1, y1, x2, y2 };
        easing.validate()?;
        Ok(easing)
    }

    /// Wrap a caller-supplied function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self::Custom(CustomEasing::new(f))
    }

    /// Field-level check used by timeline and keyframe construction.
    pub fn validate(&self) -> Result<()> {
        if let Self::CubicBezier { x1, y1, x2, y2 } = *self {
            if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
                return Err(AnimationError::InvalidEasing(format!(
                    "cubic_bezier({x1}, {y1}, {x2}, {y2}) has non-finite parameters"
                )));
            }
            if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
                return Err(AnimationError::InvalidEasing(format!(
                    "cubic_bezier x values must be in [0, 1], got {x1} and {x2}"
                )));
            }
        }
        Ok(())
    }

    /// The easing a reversed timeline should use: `ease_in` and `ease_out`
    /// trade places, everything else is unchanged.
    pub fn reversed(&self) -> Self {
        match self {
            Self::EaseIn => Self::EaseOut,
            Self::EaseOut => Self::EaseIn,
            other => other.clone(),
        }
    }

    /// Name of a named curve.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Self::Linear => Some("linear"),
            Self::EaseIn => Some("ease_in"),
            Self::EaseOut => Some("ease_out"),
            Self::EaseInOut => Some("ease_in_out"),
            Self::CubicBezier { .. } | Self::Custom(_) => None,
        }
    }
}

impl FromStr for Easing {
    type Err = AnimationError;

    /// Parse a named curve. Accepts snake_case and kebab-case.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().replace('-', "_").as_str() {
            "linear" => Ok(Self::Linear),
            "ease_in" => Ok(Self::EaseIn),
            "ease_out" => Ok(Self::EaseOut),
            "ease_in_out" => Ok(Self::EaseInOut),
            _ => Err(AnimationError::InvalidEasing(format!("unknown easing `{s}`"))),
        }
    }
}

/// Evaluate a cubic bezier easing at `progress`.
///
/// Finds the curve parameter whose x equals `progress`, then returns y there.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_component(y1, y2, t)
}

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 40;
const SOLVE_EPSILON: f64 = 1e-7;

/// Solve x(t) = target for t. Newton-Raphson first, bisection if Newton
/// stalls on a flat derivative or fails to converge.
fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;
    for _ in 0..NEWTON_ITERATIONS {
        let x = bezier_component(x1, x2, t) - target_x;
        if x.abs() < SOLVE_EPSILON {
            return t;
        }
        let dx = bezier_derivative(x1, x2, t);
        if dx.abs() < 1e-6 {
            break;
        }
        t = (t - x / dx).clamp(0.0, 1.0);
    }

    // x(t) is monotonic for x1, x2 in [0, 1]
    let (mut lo, mut hi) = (0.0, 1.0);
    t = target_x;
    for _ in 0..BISECTION_ITERATIONS {
        let x = bezier_component(x1, x2, t);
        if (x - target_x).abs() < SOLVE_EPSILON {
            break;
        }
        if x < target_x {
            lo = t;
        } else {
            hi = t;
        }
        t = (lo + hi) * 0.5;
    }
    t
}

/// One coordinate of the curve at parameter t:
/// 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³
#[inline]
fn bezier_component(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

/// d/dt of [`bezier_component`].
#[inline]
fn bezier_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}
