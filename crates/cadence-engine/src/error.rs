//! Error types for timeline construction, validation and composition.

use thiserror::Error;

use crate::validator::{InterpolationIssue, MissingProperties};

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, AnimationError>;

/// Errors produced while building, validating or composing timelines.
///
/// Playback never fails; these are all local validation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// No duration was supplied.
    #[error("duration is required")]
    DurationRequired,

    /// Duration is zero, negative, fractional or not a number.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    /// Keyframes were not a sequence of keyframes.
    #[error("invalid keyframes: {0}")]
    InvalidKeyframes(String),

    /// Easing is neither a named curve, a cubic-bezier descriptor nor a function.
    #[error("invalid easing: {0}")]
    InvalidEasing(String),

    /// Unknown loop mode.
    #[error("invalid loop mode: {0}")]
    InvalidLoopMode(String),

    /// Loop count is not a non-negative whole number or `infinite`.
    #[error("invalid loop count: {0}")]
    InvalidLoopCount(String),

    /// Delay is negative or fractional.
    #[error("invalid delay: {0}")]
    InvalidDelay(String),

    /// Keyframe built without a time.
    #[error("keyframe time is required")]
    TimeRequired,

    /// Keyframe time is not a finite number in [0, 1].
    #[error("invalid keyframe time: {0}")]
    InvalidTime(String),

    /// Keyframe built without properties.
    #[error("keyframe properties are required")]
    PropertiesRequired,

    /// Keyframe properties are malformed.
    #[error("invalid keyframe properties: {0}")]
    InvalidProperties(String),

    /// Unknown interpolation mode.
    #[error("invalid interpolation mode: {0}")]
    InvalidInterpolationMode(String),

    /// Keyframe times outside [0, 1], all of them.
    #[error("keyframe times out of range [0, 1]: {0:?}")]
    InvalidKeyframeTimes(Vec<f64>),

    /// Keyframes are not in ascending time order.
    #[error("keyframes are not ordered by time")]
    KeyframesNotOrdered,

    /// Two or more keyframes share a time.
    #[error("duplicate keyframe times: {0:?}")]
    DuplicateKeyframeTimes(Vec<f64>),

    /// Keyframes missing properties that other keyframes define.
    #[error("{} keyframe(s) missing properties defined elsewhere", .0.len())]
    InconsistentProperties(Vec<MissingProperties>),

    /// Adjacent keyframes hold values that cannot be blended.
    #[error("{} non-interpolatable property pair(s)", .0.len())]
    InterpolationErrors(Vec<InterpolationIssue>),

    /// Composition needs at least one timeline.
    #[error("timeline list is empty")]
    EmptyTimelineList,

    /// A timeline taking part in a composition has no duration.
    #[error("invalid timeline duration: {0}")]
    InvalidTimelineDuration(String),

    /// Composition mode unknown or not applicable.
    #[error("invalid composition mode: {0}")]
    InvalidCompositionMode(String),

    /// Scale factor not finite or not positive.
    #[error("invalid scale factor: {0}")]
    InvalidScaleFactor(f64),

    /// Repeat count is zero or malformed.
    #[error("invalid repeat count: {0}")]
    InvalidRepeatCount(String),
}

/// Fieldless discriminant of [`AnimationError`], handy for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DurationRequired,
    InvalidDuration,
    InvalidKeyframes,
    InvalidEasing,
    InvalidLoopMode,
    InvalidLoopCount,
    InvalidDelay,
    TimeRequired,
    InvalidTime,
    PropertiesRequired,
    InvalidProperties,
    InvalidInterpolationMode,
    InvalidKeyframeTimes,
    KeyframesNotOrdered,
    DuplicateKeyframeTimes,
    InconsistentProperties,
    InterpolationErrors,
    EmptyTimelineList,
    InvalidTimelineDuration,
    InvalidCompositionMode,
    InvalidScaleFactor,
    InvalidRepeatCount,
}

impl AnimationError {
    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DurationRequired => ErrorKind::DurationRequired,
            Self::InvalidDuration(_) => ErrorKind::InvalidDuration,
            Self::InvalidKeyframes(_) => ErrorKind::InvalidKeyframes,
            Self::InvalidEasing(_) => ErrorKind::InvalidEasing,
            Self::InvalidLoopMode(_) => ErrorKind::InvalidLoopMode,
            Self::InvalidLoopCount(_) => ErrorKind::InvalidLoopCount,
            Self::InvalidDelay(_) => ErrorKind::InvalidDelay,
            Self::TimeRequired => ErrorKind::TimeRequired,
            Self::InvalidTime(_) => ErrorKind::InvalidTime,
            Self::PropertiesRequired => ErrorKind::PropertiesRequired,
            Self::InvalidProperties(_) => ErrorKind::InvalidProperties,
            Self::InvalidInterpolationMode(_) => ErrorKind::InvalidInterpolationMode,
            Self::InvalidKeyframeTimes(_) => ErrorKind::InvalidKeyframeTimes,
            Self::KeyframesNotOrdered => ErrorKind::KeyframesNotOrdered,
            Self::DuplicateKeyframeTimes(_) => ErrorKind::DuplicateKeyframeTimes,
            Self::InconsistentProperties(_) => ErrorKind::InconsistentProperties,
            Self::InterpolationErrors(_) => ErrorKind::InterpolationErrors,
            Self::EmptyTimelineList => ErrorKind::EmptyTimelineList,
            Self::InvalidTimelineDuration(_) => ErrorKind::InvalidTimelineDuration,
            Self::InvalidCompositionMode(_) => ErrorKind::InvalidCompositionMode,
            Self::InvalidScaleFactor(_) => ErrorKind::InvalidScaleFactor,
            Self::InvalidRepeatCount(_) => ErrorKind::InvalidRepeatCount,
        }
    }

    /// True for the batched cross-keyframe validation errors.
    pub fn is_validation_batch(&self) -> bool {
        matches!(
            self,
            Self::InvalidKeyframeTimes(_)
                | Self::DuplicateKeyframeTimes(_)
                | Self::InconsistentProperties(_)
                | Self::InterpolationErrors(_)
        )
    }
}
