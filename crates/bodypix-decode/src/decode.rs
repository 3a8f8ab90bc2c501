//! Public decode entry points.
//!
//! A decode call filters the poses by score, labels every grid cell with an
//! assignment engine, then materializes one original-resolution mask per
//! surviving pose. Results are returned in filtered-pose order and each carries
//! its pose.

use crate::config::DecodeConfig;
use crate::engine::{select_engine, AssignmentRequest, InstanceLabels};
use crate::error::{DecodeError, DecodeResult};
use crate::fields::{ensure_same_grid, OffsetField, PartField, SegmentationField};
use crate::materialize::{part_masks_from_owners, pixel_owners, split_owners, MaskGeometry};
use crate::transform::{output_resolution, GridGeometry};
use bodypix_core::{Dimensions, Padding, PartSegmentation, PersonSegmentation, Pose};
use std::time::Instant;
use tracing::{debug, instrument};

/// Borrowed inputs of one decode call.
#[derive(Debug, Clone, Copy)]
pub struct DecodeInputs<'a> {
    /// Foreground field
    pub segmentation: &'a SegmentationField,
    /// Long-range offset field
    pub offsets: &'a OffsetField,
    /// Part-id field, required for part masks
    pub parts: Option<&'a PartField>,
    /// Detected poses, in original-image coordinates
    pub poses: &'a [Pose],
    /// Resized-and-padded network input size
    pub input: Dimensions,
    /// Original image size
    pub original: Dimensions,
    /// Padding applied while preparing the input
    pub padding: Padding,
    /// Output stride of the network
    pub stride: usize,
}

impl<'a> DecodeInputs<'a> {
    fn mask_geometry(&self) -> MaskGeometry {
        MaskGeometry::new(self.input, self.original, self.padding)
    }

    fn grid_geometry(&self) -> DecodeResult<GridGeometry> {
        let grid = self.segmentation.grid();
        let expected = output_resolution(self.input, self.stride)?;
        if expected != grid {
            return Err(DecodeError::shape_mismatch(
                vec![expected.height, expected.width],
                vec![grid.height, grid.width],
            ));
        }
        GridGeometry::new(grid, self.input, self.original, self.padding, self.stride)
    }

    fn parts(&self) -> DecodeResult<&'a PartField> {
        let parts = self
            .parts
            .ok_or_else(|| DecodeError::invalid_input("part masks need a part field"))?;
        ensure_same_grid(self.segmentation.grid(), parts.grid())?;
        Ok(parts)
    }
}

/// Owned inputs for the asynchronous entry points.
#[derive(Debug, Clone)]
pub struct DecodeJob {
    /// Foreground field
    pub segmentation: SegmentationField,
    /// Long-range offset field
    pub offsets: OffsetField,
    /// Part-id field, required for part masks
    pub parts: Option<PartField>,
    /// Detected poses
    pub poses: Vec<Pose>,
    /// Resized-and-padded network input size
    pub input: Dimensions,
    /// Original image size
    pub original: Dimensions,
    /// Padding applied while preparing the input
    pub padding: Padding,
    /// Output stride of the network
    pub stride: usize,
}

impl DecodeJob {
    /// Borrow the job as decode inputs.
    pub fn inputs(&self) -> DecodeInputs<'_> {
        DecodeInputs {
            segmentation: &self.segmentation,
            offsets: &self.offsets,
            parts: self.parts.as_ref(),
            poses: &self.poses,
            input: self.input,
            original: self.original,
            padding: self.padding,
            stride: self.stride,
        }
    }
}

/// Poses scoring at least `min_pose_score`, in their original order.
pub fn filter_poses(poses: &[Pose], min_pose_score: f32) -> Vec<Pose> {
    poses
        .iter()
        .filter(|pose| pose.score >= min_pose_score)
        .cloned()
        .collect()
}

/// Filter poses and label the grid.
fn assign(
    inputs: &DecodeInputs<'_>,
    config: &DecodeConfig,
) -> DecodeResult<(Vec<Pose>, InstanceLabels)> {
    config.validate()?;
    let poses = filter_poses(inputs.poses, config.min_pose_score);
    debug!(
        total = inputs.poses.len(),
        kept = poses.len(),
        "Filtered poses by score"
    );

    let geometry = inputs.grid_geometry()?;
    let request = AssignmentRequest::new(
        inputs.segmentation,
        inputs.offsets,
        &poses,
        geometry,
        config,
    );
    let engine = select_engine(config.engine);
    let start = Instant::now();
    let labels = engine.assign(&request)?;
    debug!(
        engine = engine.name(),
        grid = ?request.grid(),
        elapsed = ?start.elapsed(),
        "Assignment pass finished"
    );
    Ok((poses, labels))
}

fn person_results(
    masks: Vec<ndarray::Array2<u8>>,
    poses: Vec<Pose>,
    original: Dimensions,
) -> DecodeResult<Vec<PersonSegmentation>> {
    masks
        .into_iter()
        .zip(poses)
        .map(|(mask, pose)| {
            PersonSegmentation::new(mask.into_raw_vec(), original, Some(pose))
                .map_err(DecodeError::from)
        })
        .collect()
}

/// One binary mask per pose scoring at least `min_pose_score`.
#[instrument(skip(inputs, config), fields(poses = inputs.poses.len()))]
pub fn decode_person_segmentation_masks_for_poses(
    inputs: &DecodeInputs<'_>,
    config: &DecodeConfig,
) -> DecodeResult<Vec<PersonSegmentation>> {
    let (poses, labels) = assign(inputs, config)?;
    let owners = pixel_owners(&labels, poses.len(), &inputs.mask_geometry())?;
    person_results(split_owners(&owners, poses.len()), poses, inputs.original)
}

/// One part-label mask per pose scoring at least `min_pose_score`.
#[instrument(skip(inputs, config), fields(poses = inputs.poses.len()))]
pub fn decode_part_masks_for_poses(
    inputs: &DecodeInputs<'_>,
    config: &DecodeConfig,
) -> DecodeResult<Vec<PartSegmentation>> {
    let parts = inputs.parts()?;
    let (poses, labels) = assign(inputs, config)?;
    let geometry = inputs.mask_geometry();
    let owners = pixel_owners(&labels, poses.len(), &geometry)?;
    let masks = part_masks_from_owners(&labels, parts, &owners, poses.len(), &geometry)?;
    masks
        .into_iter()
        .zip(poses)
        .map(|(mask, pose)| {
            PartSegmentation::new(mask.into_raw_vec(), inputs.original, Some(pose))
                .map_err(DecodeError::from)
        })
        .collect()
}

/// Binary masks with their part labels attached.
#[instrument(skip(inputs, config), fields(poses = inputs.poses.len()))]
pub fn decode_person_and_part_masks_for_poses(
    inputs: &DecodeInputs<'_>,
    config: &DecodeConfig,
) -> DecodeResult<Vec<PersonSegmentation>> {
    let parts = inputs.parts()?;
    let (poses, labels) = assign(inputs, config)?;
    let geometry = inputs.mask_geometry();
    let owners = pixel_owners(&labels, poses.len(), &geometry)?;
    let part_masks = part_masks_from_owners(&labels, parts, &owners, poses.len(), &geometry)?;
    let people = person_results(split_owners(&owners, poses.len()), poses, inputs.original)?;
    people
        .into_iter()
        .zip(part_masks)
        .map(|(person, part)| {
            person
                .with_part_data(part.into_raw_vec())
                .map_err(DecodeError::from)
        })
        .collect()
}

async fn run_blocking<T, F>(job: DecodeJob, config: DecodeConfig, decode: F) -> DecodeResult<T>
where
    T: Send + 'static,
    F: FnOnce(&DecodeInputs<'_>, &DecodeConfig) -> DecodeResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || decode(&job.inputs(), &config))
        .await
        .map_err(|e| DecodeError::engine(format!("decode task failed: {e}")))?
}

/// [`decode_person_segmentation_masks_for_poses`] on a blocking worker.
///
/// Dropping the returned future abandons the result; the running decode still
/// finishes and releases its buffers.
pub async fn decode_person_segmentation_masks_for_poses_async(
    job: DecodeJob,
    config: DecodeConfig,
) -> DecodeResult<Vec<PersonSegmentation>> {
    run_blocking(job, config, |inputs, config| {
        decode_person_segmentation_masks_for_poses(inputs, config)
    })
    .await
}

/// [`decode_part_masks_for_poses`] on a blocking worker.
pub async fn decode_part_masks_for_poses_async(
    job: DecodeJob,
    config: DecodeConfig,
) -> DecodeResult<Vec<PartSegmentation>> {
    run_blocking(job, config, |inputs, config| {
        decode_part_masks_for_poses(inputs, config)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodypix_core::{Keypoint, KeypointType};
    use ndarray::Array2;

    fn pose(score: f32) -> Pose {
        Pose::new(score, vec![Keypoint::new(KeypointType::Nose, 0.0, 0.0, 0.9)])
    }

    #[test]
    fn test_filter_poses_keeps_order() {
        let poses = vec![pose(0.5), pose(0.1), pose(0.2), pose(0.9)];
        let kept = filter_poses(&poses, 0.2);
        let scores: Vec<f32> = kept.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![0.5, 0.2, 0.9]);
    }

    #[test]
    fn test_part_masks_need_part_field() {
        let grid = Dimensions::new(2, 2);
        let seg = SegmentationField::new(Array2::ones((2, 2)));
        let offsets = OffsetField::zeros(grid, 1);
        let poses = vec![pose(0.9)];
        let inputs = DecodeInputs {
            segmentation: &seg,
            offsets: &offsets,
            parts: None,
            poses: &poses,
            input: grid,
            original: grid,
            padding: Padding::zero(),
            stride: 1,
        };
        assert!(matches!(
            decode_part_masks_for_poses(&inputs, &DecodeConfig::default()),
            Err(DecodeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_grid_must_match_input_and_stride() {
        // 33x33 at stride 8 is a 5x5 grid
        let grid = Dimensions::new(4, 4);
        let seg = SegmentationField::new(Array2::ones((4, 4)));
        let offsets = OffsetField::zeros(grid, 1);
        let poses = vec![pose(0.9)];
        let inputs = DecodeInputs {
            segmentation: &seg,
            offsets: &offsets,
            parts: None,
            poses: &poses,
            input: Dimensions::new(33, 33),
            original: Dimensions::new(33, 33),
            padding: Padding::zero(),
            stride: 8,
        };
        match decode_person_segmentation_masks_for_poses(&inputs, &DecodeConfig::default()) {
            Err(DecodeError::ShapeMismatch { expected, actual }) => {
                assert_eq!(expected, vec![5, 5]);
                assert_eq!(actual, vec![4, 4]);
            }
            other => panic!("expected a shape mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let grid = Dimensions::new(2, 2);
        let seg = SegmentationField::new(Array2::ones((2, 2)));
        let offsets = OffsetField::zeros(grid, 1);
        let inputs = DecodeInputs {
            segmentation: &seg,
            offsets: &offsets,
            parts: None,
            poses: &[],
            input: grid,
            original: grid,
            padding: Padding::zero(),
            stride: 1,
        };
        let config = DecodeConfig::default().with_max_num_people(0);
        assert!(matches!(
            decode_person_segmentation_masks_for_poses(&inputs, &config),
            Err(DecodeError::Config(_))
        ));
    }
}
