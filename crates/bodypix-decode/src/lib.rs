//! # BodyPix Decode
//!
//! Multi-person mask decoding for BodyPix segmentation outputs.
//!
//! The network produces a foreground field, a long-range offset field and a
//! part field at a stride-reduced grid, plus a list of detected poses. This
//! crate turns them into one original-resolution mask per person.
//!
//! ## Features
//!
//! - **Transform**: resize/pad planning, padding removal and the grid to
//!   image coordinate mapping
//! - **Assignment engines**: a sequential host engine and a rayon-backed
//!   parallel engine with identical results
//! - **Materialization**: disjoint per-person binary and part-label masks
//! - **Part maps**: single-person segmentation and part decoding
//!
//! ## Example
//!
//! ```rust
//! use bodypix_decode::prelude::*;
//! use bodypix_core::{Dimensions, Keypoint, KeypointType, Padding, Pose};
//! use ndarray::Array2;
//!
//! let grid = Dimensions::new(4, 4);
//! let segmentation = SegmentationField::new(Array2::ones((4, 4)));
//! let offsets = OffsetField::zeros(grid, 1);
//! let poses = vec![
//!     Pose::new(0.9, vec![Keypoint::new(KeypointType::Nose, 0.0, 0.0, 0.9)]),
//!     Pose::new(0.9, vec![Keypoint::new(KeypointType::Nose, 3.0, 3.0, 0.9)]),
//! ];
//! let inputs = DecodeInputs {
//!     segmentation: &segmentation,
//!     offsets: &offsets,
//!     parts: None,
//!     poses: &poses,
//!     input: grid,
//!     original: grid,
//!     padding: Padding::zero(),
//!     stride: 1,
//! };
//!
//! let masks = decode_person_segmentation_masks_for_poses(&inputs, &DecodeConfig::default())?;
//! assert_eq!(masks.len(), 2);
//! assert_eq!(masks[0].data[0], 1);
//! # Ok::<(), bodypix_decode::DecodeError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod fields;
pub mod materialize;
pub mod part_map;
pub mod scratch;
pub mod transform;

// Re-exports for convenience
pub use config::{DecodeConfig, EnginePreference};
pub use decode::{
    decode_part_masks_for_poses, decode_part_masks_for_poses_async,
    decode_person_and_part_masks_for_poses, decode_person_segmentation_masks_for_poses,
    decode_person_segmentation_masks_for_poses_async, filter_poses, DecodeInputs, DecodeJob,
};
pub use engine::{
    select_engine, AssignmentEngine, AssignmentRequest, HostEngine, InstanceLabels,
    ParallelEngine, UNASSIGNED,
};
pub use error::{DecodeError, DecodeResult};
pub use fields::{OffsetField, PartField, SegmentationField};
pub use materialize::{
    materialize_part_masks, materialize_person_masks, to_person_k_part_segmentation,
    to_person_k_segmentation, MaskGeometry,
};
pub use part_map::{decode_only_part_segmentation, decode_part_segmentation, to_mask};
pub use scratch::{ScratchArena, ScratchBuffer};
pub use transform::{
    output_resolution, pad_and_resize_to, remove_padding_and_resize_back, resize_and_pad_to,
    scale_and_crop_to_input_tensor_shape, GridGeometry, Interpolation,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{DecodeConfig, EnginePreference};
    pub use crate::decode::{
        decode_part_masks_for_poses, decode_person_and_part_masks_for_poses,
        decode_person_segmentation_masks_for_poses, DecodeInputs, DecodeJob,
    };
    pub use crate::engine::{select_engine, AssignmentEngine, HostEngine, ParallelEngine};
    pub use crate::error::{DecodeError, DecodeResult};
    pub use crate::fields::{OffsetField, PartField, SegmentationField};
    pub use crate::transform::{GridGeometry, Interpolation};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default output stride of the BodyPix networks
pub const DEFAULT_OUTPUT_STRIDE: usize = 16;
