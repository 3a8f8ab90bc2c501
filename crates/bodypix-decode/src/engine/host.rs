//! Sequential assignment over the grid.

use super::{pose_distance, AssignmentEngine, AssignmentRequest, InstanceLabels};
use crate::error::DecodeResult;
use bodypix_core::Vector2D;
use tracing::{debug, instrument};

/// Walks every foreground cell in row-major order on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostEngine;

impl HostEngine {
    /// Create a host engine.
    pub fn new() -> Self {
        Self
    }
}

impl AssignmentEngine for HostEngine {
    fn name(&self) -> &str {
        "host"
    }

    fn is_available(&self) -> bool {
        true
    }

    #[instrument(skip(self, request), fields(poses = request.poses.len()))]
    fn assign(&self, request: &AssignmentRequest<'_>) -> DecodeResult<InstanceLabels> {
        request.validate()?;
        let grid = request.grid();
        let mut labels = InstanceLabels::unassigned(grid);
        if request.poses.is_empty() {
            return Ok(labels);
        }

        let mut embedding = vec![Vector2D::default(); request.matching_keypoints.len()];
        let mut assigned = 0_usize;
        for row in 0..grid.height {
            for col in 0..grid.width {
                if !request.segmentation.is_foreground(row, col) {
                    continue;
                }
                let start = request.geometry.cell_to_image(row, col);
                for (e, &k) in embedding.iter_mut().zip(request.matching_keypoints) {
                    *e = request.refine(start, k);
                }

                let mut best_distance = f32::INFINITY;
                let mut best_pose = None;
                for (index, pose) in request.poses.iter().enumerate() {
                    let distance = pose_distance(
                        &embedding,
                        pose,
                        index,
                        request.matching_keypoints,
                        request.min_keypoint_score,
                    )?;
                    if let Some(d) = distance {
                        if d < best_distance {
                            best_distance = d;
                            best_pose = Some(index);
                        }
                    }
                }

                if let Some(index) = best_pose {
                    labels.array_mut()[[row, col]] = i32::try_from(index).unwrap_or(i32::MAX);
                    assigned += 1;
                }
            }
        }

        debug!(assigned, "Host assignment complete");
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeConfig;
    use crate::engine::UNASSIGNED;
    use crate::fields::{OffsetField, SegmentationField};
    use crate::transform::GridGeometry;
    use bodypix_core::{Dimensions, Keypoint, KeypointType, Padding, Pose};
    use ndarray::Array2;

    fn root_pose(y: f32, x: f32, score: f32) -> Pose {
        Pose::new(0.9, vec![Keypoint::new(KeypointType::Nose, y, x, score)])
    }

    fn identity(grid: Dimensions) -> GridGeometry {
        GridGeometry::new(grid, grid, grid, Padding::zero(), 1).unwrap()
    }

    #[test]
    fn test_nearest_root_wins() {
        let grid = Dimensions::new(1, 4);
        let seg = SegmentationField::new(Array2::ones((1, 4)));
        let offsets = OffsetField::zeros(grid, 1);
        let poses = vec![root_pose(0.0, 0.0, 0.9), root_pose(0.0, 3.0, 0.9)];
        let config = DecodeConfig::default();
        let request = AssignmentRequest::new(&seg, &offsets, &poses, identity(grid), &config);

        let labels = HostEngine::new().assign(&request).unwrap();
        let row: Vec<i32> = labels.view().iter().copied().collect();
        assert_eq!(row, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_tie_goes_to_first_pose() {
        let grid = Dimensions::new(1, 3);
        let seg = SegmentationField::new(Array2::ones((1, 3)));
        let offsets = OffsetField::zeros(grid, 1);
        let poses = vec![root_pose(0.0, 0.0, 0.9), root_pose(0.0, 2.0, 0.9)];
        let config = DecodeConfig::default();
        let request = AssignmentRequest::new(&seg, &offsets, &poses, identity(grid), &config);

        let labels = HostEngine::new().assign(&request).unwrap();
        assert_eq!(labels.get(0, 1), 0);
    }

    #[test]
    fn test_weak_root_is_never_a_target() {
        let grid = Dimensions::new(2, 2);
        let seg = SegmentationField::new(Array2::ones((2, 2)));
        let offsets = OffsetField::zeros(grid, 1);
        let poses = vec![root_pose(0.0, 0.0, 0.1)];
        let config = DecodeConfig::default();
        let request = AssignmentRequest::new(&seg, &offsets, &poses, identity(grid), &config);

        let labels = HostEngine::new().assign(&request).unwrap();
        assert!(labels.view().iter().all(|&l| l == UNASSIGNED));
    }

    #[test]
    fn test_background_stays_unassigned() {
        let grid = Dimensions::new(2, 2);
        let seg = SegmentationField::from_shape_vec(grid, vec![1, 0, 0, 0]).unwrap();
        let offsets = OffsetField::zeros(grid, 1);
        let poses = vec![root_pose(1.0, 1.0, 0.9)];
        let config = DecodeConfig::default();
        let request = AssignmentRequest::new(&seg, &offsets, &poses, identity(grid), &config);

        let labels = HostEngine::new().assign(&request).unwrap();
        assert_eq!(labels.get(0, 0), 0);
        assert_eq!(labels.count(0), 1);
    }
}
