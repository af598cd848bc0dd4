//! Keyframe animation engine.
//!
//! This crate provides:
//! - **Timelines**: immutable animation descriptions built from keyframes
//! - **Interpolation**: eased blending of numeric, tuple and text properties
//! - **Validation**: an explicit deep pass over keyframe lists
//! - **Composition**: merge, sequence, parallel, reverse, scale and repeat
//! - **Playback**: a time-injected state machine plus a multi-instance manager
//!
//! # Architecture
//!
//! ```text
//! TimelineOptions / serde_json::Value
//!   └── Timeline::construct (field checks)
//!         ├── validator::verify (cross-keyframe checks, on demand)
//!         ├── composer::* (derived timelines)
//!         └── Arc<Timeline>
//!               └── AnimationState (per instance, mutable)
//!                     └── PlaybackManager (many instances)
//! ```

pub mod composer;
pub mod easing;
pub mod error;
pub mod events;
pub mod interpolate;
pub mod keyframe;
pub mod manager;
pub mod options;
pub mod playback;
pub mod timeline;
pub mod validator;
pub mod value;

pub use composer::{CompositionOptions, MergeStrategy};
pub use easing::{CustomEasing, Easing};
pub use error::{AnimationError, ErrorKind, Result};
pub use events::{DEFAULT_EVENT_CAPACITY, EventQueue, PlaybackEvent};
pub use interpolate::{Interpolate, interpolate};
pub use keyframe::{InterpolationMode, Keyframe};
pub use manager::{Frame, PlaybackId, PlaybackManager, TaggedEvent};
pub use options::{KeyframeOptions, Metadata, TimelineOptions};
pub use playback::{AnimationState, Direction, Status};
pub use timeline::{LoopCount, LoopMode, Timeline};
pub use validator::{
    CompositionMode, InterpolationIssue, MissingProperties, Verification, VerifyOptions,
};
pub use value::{PropertyMap, PropertyValue, ValueKind};
