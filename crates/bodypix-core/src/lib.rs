//! # BodyPix Core
//!
//! Core types and utilities shared by the BodyPix segmentation decoders.
//!
//! - **Pose types**: [`Pose`], [`Keypoint`], [`KeypointType`] as delivered by an
//!   upstream pose estimator.
//! - **Geometry**: [`Dimensions`] and [`Padding`] replace positional
//!   `(height, width)` and `(top, bottom, left, right)` tuples.
//! - **Results**: [`PersonSegmentation`] and [`PartSegmentation`] carry one
//!   full-resolution mask per detected person.
//! - **Utilities**: [`utils::clamp`], [`utils::squared_distance`],
//!   [`utils::fill_array`] and [`utils::flip_pose_horizontal`].
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialization/deserialization via serde
//!
//! ## Example
//!
//! ```rust
//! use bodypix_core::{Dimensions, Padding};
//!
//! let padded = Dimensions::new(100, 100);
//! let inner = Padding::new(25, 25, 0, 0).inner(padded).unwrap();
//! assert_eq!(inner, Dimensions::new(50, 100));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod parts;
pub mod types;
pub mod utils;

pub use error::{CoreError, CoreResult};
pub use parts::{BodyPart, NO_PART, NUM_PART_CHANNELS, PART_CHANNELS};
pub use types::{
    Dimensions, Keypoint, KeypointType, Padding, PartSegmentation, PersonSegmentation, Pose,
    Vector2D,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::parts::{BodyPart, NO_PART, PART_CHANNELS};
    pub use crate::types::{
        Dimensions, Keypoint, KeypointType, Padding, PartSegmentation, PersonSegmentation, Pose,
        Vector2D,
    };
    pub use crate::utils::{clamp, fill_array, flip_pose_horizontal, squared_distance};
}
