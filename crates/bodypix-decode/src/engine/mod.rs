//! Per-pixel-to-person assignment.
//!
//! Every foreground cell of the output grid walks the long-offset field from
//! its own position toward the instance keypoints it belongs to, then joins the
//! pose whose keypoints are nearest to where the walk ended.
//!
//! For one foreground cell and one matching keypoint `k`:
//!
//! 1. Start at the cell's original-image position.
//! 2. `refine_steps` times: look up the offsets at the grid cell nearest the
//!    current estimate (clamped to the grid) and add the displacement for `k`.
//!    The walk always runs exactly `refine_steps` times.
//! 3. Compare the final estimate with keypoint `k` of every pose.
//!
//! The distance to a pose is the mean squared distance over the matching
//! keypoints whose pose score is at least `min_keypoint_score`. A pose with no
//! such keypoint is not a target. The strictly smallest distance wins, so ties
//! go to the earlier pose. Cells with no eligible pose stay unassigned.
//!
//! Two engines implement this contract: [`HostEngine`] walks the grid in plain
//! nested loops, [`ParallelEngine`] expresses the same arithmetic as batched
//! array operations spread over a rayon pool. They produce identical labels.

mod host;
mod parallel;

pub use host::HostEngine;
pub use parallel::ParallelEngine;

use crate::config::{DecodeConfig, EnginePreference};
use crate::error::{DecodeError, DecodeResult};
use crate::fields::{ensure_same_grid, OffsetField, SegmentationField};
use crate::transform::GridGeometry;
use bodypix_core::utils::squared_distance;
use bodypix_core::{Dimensions, Keypoint, Pose, Vector2D};
use ndarray::{Array2, ArrayView2};
use tracing::debug;

/// Label of a grid cell that belongs to no pose.
pub const UNASSIGNED: i32 = -1;

/// Everything an engine needs for one assignment pass.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentRequest<'a> {
    /// Foreground indicator per cell
    pub segmentation: &'a SegmentationField,
    /// Long-range offsets per cell
    pub offsets: &'a OffsetField,
    /// Score-filtered poses; labels index into this slice
    pub poses: &'a [Pose],
    /// Cell to image mapping
    pub geometry: GridGeometry,
    /// Offset-walk iterations
    pub refine_steps: usize,
    /// Minimum keypoint score for a keypoint to count in the distance
    pub min_keypoint_score: f32,
    /// Keypoint indices compared between embedding and pose
    pub matching_keypoints: &'a [usize],
    /// Pose batch size of the parallel engine
    pub max_num_people: usize,
}

impl<'a> AssignmentRequest<'a> {
    /// Assemble a request from fields and a decode configuration.
    pub fn new(
        segmentation: &'a SegmentationField,
        offsets: &'a OffsetField,
        poses: &'a [Pose],
        geometry: GridGeometry,
        config: &'a DecodeConfig,
    ) -> Self {
        Self {
            segmentation,
            offsets,
            poses,
            geometry,
            refine_steps: config.refine_steps,
            min_keypoint_score: config.min_keypoint_score,
            matching_keypoints: &config.matching_keypoints,
            max_num_people: config.max_num_people,
        }
    }

    /// Grid dimensions shared by every field.
    pub fn grid(&self) -> Dimensions {
        self.segmentation.grid()
    }

    /// Check field shapes agree with each other and with the geometry.
    pub fn validate(&self) -> DecodeResult<()> {
        let grid = self.segmentation.grid();
        ensure_same_grid(grid, self.offsets.grid())?;
        ensure_same_grid(grid, self.geometry.grid())?;
        if self.matching_keypoints.is_empty() {
            return Err(DecodeError::config("matching_keypoints must not be empty"));
        }
        if self.max_num_people == 0 {
            return Err(DecodeError::config("max_num_people must be positive"));
        }
        let channels = self.offsets.num_keypoints();
        if let Some(&k) = self.matching_keypoints.iter().find(|&&k| k >= channels) {
            return Err(DecodeError::shape_mismatch(
                vec![grid.height, grid.width, 2 * (k + 1)],
                vec![grid.height, grid.width, 2 * channels],
            ));
        }
        Ok(())
    }

    /// Walk the offset field from `start` toward keypoint `k`.
    #[inline]
    pub(crate) fn refine(&self, start: Vector2D, k: usize) -> Vector2D {
        let mut estimate = start;
        for _ in 0..self.refine_steps {
            let (row, col) = self.geometry.image_to_cell(estimate);
            let step = self
                .geometry
                .offset_to_image(self.offsets.offset(row, col, k));
            estimate = Vector2D::new(estimate.y + step.y, estimate.x + step.x);
        }
        estimate
    }
}

/// Keypoint `k` of `pose`, or a shape error when the pose is too short.
pub(crate) fn matching_keypoint(pose: &Pose, index: usize, k: usize) -> DecodeResult<&Keypoint> {
    pose.keypoint(k).ok_or_else(|| {
        DecodeError::invalid_input(format!(
            "pose {index} has {} keypoints, matching keypoint {k} is missing",
            pose.keypoints.len()
        ))
    })
}

/// Mean squared distance from an embedding to a pose over its eligible
/// keypoints, or `None` when no keypoint is eligible.
pub(crate) fn pose_distance(
    embedding: &[Vector2D],
    pose: &Pose,
    pose_index: usize,
    matching_keypoints: &[usize],
    min_keypoint_score: f32,
) -> DecodeResult<Option<f32>> {
    let mut sum = 0.0_f32;
    let mut count = 0_usize;
    for (e, &k) in embedding.iter().zip(matching_keypoints) {
        let keypoint = matching_keypoint(pose, pose_index, k)?;
        if keypoint.is_confident(min_keypoint_score) {
            sum += squared_distance(e.y, e.x, keypoint.position.y, keypoint.position.x);
            count += 1;
        }
    }
    #[allow(clippy::cast_precision_loss)]
    Ok((count > 0).then(|| sum / count as f32))
}

/// Per-cell pose index for one decode call, [`UNASSIGNED`] for background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceLabels(Array2<i32>);

impl InstanceLabels {
    /// Wrap a label plane.
    pub fn new(labels: Array2<i32>) -> Self {
        Self(labels)
    }

    /// A plane with every cell unassigned.
    pub fn unassigned(grid: Dimensions) -> Self {
        Self(Array2::from_elem((grid.height, grid.width), UNASSIGNED))
    }

    /// Grid dimensions.
    pub fn grid(&self) -> Dimensions {
        let (h, w) = self.0.dim();
        Dimensions::new(h, w)
    }

    /// Label of cell `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> i32 {
        self.0[[row, col]]
    }

    /// Number of cells assigned to pose `k`.
    pub fn count(&self, k: usize) -> usize {
        i32::try_from(k)
            .map(|k| self.0.iter().filter(|&&l| l == k).count())
            .unwrap_or(0)
    }

    /// Underlying plane.
    pub fn view(&self) -> ArrayView2<'_, i32> {
        self.0.view()
    }

    /// Mutable access for engines filling in labels.
    pub(crate) fn array_mut(&mut self) -> &mut Array2<i32> {
        &mut self.0
    }

    /// Take the plane.
    pub fn into_array(self) -> Array2<i32> {
        self.0
    }
}

/// An implementation of the assignment contract.
pub trait AssignmentEngine: Send + Sync {
    /// Engine name, for logs.
    fn name(&self) -> &str;

    /// Whether the engine can run in the current process.
    fn is_available(&self) -> bool;

    /// Label every grid cell with the index of the pose it belongs to.
    fn assign(&self, request: &AssignmentRequest<'_>) -> DecodeResult<InstanceLabels>;
}

/// Pick an engine for `preference`.
///
/// `Auto` runs the parallel engine when the rayon pool has more than one
/// worker and falls back to the host engine otherwise.
pub fn select_engine(preference: EnginePreference) -> Box<dyn AssignmentEngine> {
    match preference {
        EnginePreference::Host => Box::new(HostEngine::new()),
        EnginePreference::Parallel => Box::new(ParallelEngine::new()),
        EnginePreference::Auto => {
            let parallel = ParallelEngine::new();
            if parallel.is_available() {
                debug!(threads = rayon::current_num_threads(), "Selected parallel engine");
                Box::new(parallel)
            } else {
                debug!("Selected host engine");
                Box::new(HostEngine::new())
            }
        }
    }
}
