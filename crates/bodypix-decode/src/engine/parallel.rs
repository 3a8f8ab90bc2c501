//! Batched assignment on the rayon pool.
//!
//! The pass is split into array stages:
//!
//! 1. gather foreground cells into flat index vectors of length `n`
//! 2. refine all cells at once into `(n, m)` embedding planes, one column per
//!    matching keypoint
//! 3. for each batch of `max_num_people` poses, lay the pose keypoints out as
//!    static `(m, P)` tensors with an eligibility mask, reduce to an `(n, P)`
//!    distance plane, and fold it into a running argmin
//! 4. scatter the winners back onto the grid
//!
//! The per-element arithmetic and its order match [`HostEngine`], so both
//! engines produce identical labels. Every intermediate is held through the
//! engine's [`ScratchArena`] and released when the pass ends, including when it
//! fails part-way.
//!
//! [`HostEngine`]: super::HostEngine

use super::{matching_keypoint, AssignmentEngine, AssignmentRequest, InstanceLabels};
use crate::error::DecodeResult;
use crate::scratch::ScratchArena;
use bodypix_core::utils::squared_distance;
use ndarray::{Array1, Array2, Zip};
use tracing::{debug, instrument};

/// Assignment expressed as data-parallel array operations.
#[derive(Debug, Clone, Default)]
pub struct ParallelEngine {
    arena: ScratchArena,
}

impl ParallelEngine {
    /// Create an engine with its own scratch arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine that accounts its buffers in `arena`.
    pub fn with_arena(arena: ScratchArena) -> Self {
        Self { arena }
    }

    /// Scratch accounting for this engine.
    pub fn arena(&self) -> &ScratchArena {
        &self.arena
    }
}

impl AssignmentEngine for ParallelEngine {
    fn name(&self) -> &str {
        "parallel"
    }

    fn is_available(&self) -> bool {
        rayon::current_num_threads() > 1
    }

    #[instrument(skip(self, request), fields(poses = request.poses.len()))]
    #[allow(clippy::cast_precision_loss)]
    fn assign(&self, request: &AssignmentRequest<'_>) -> DecodeResult<InstanceLabels> {
        request.validate()?;
        let grid = request.grid();
        let mut labels = InstanceLabels::unassigned(grid);
        if request.poses.is_empty() {
            return Ok(labels);
        }

        // Stage 1: foreground cells
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        for ((row, col), &v) in request.segmentation.view().indexed_iter() {
            if v == 1 {
                rows.push(row);
                cols.push(col);
            }
        }
        let n = rows.len();
        if n == 0 {
            return Ok(labels);
        }
        let rows = self.arena.alloc(Array1::from(rows));
        let cols = self.arena.alloc(Array1::from(cols));

        // Stage 2: embeddings
        let matching = request.matching_keypoints;
        let m = matching.len();
        let mut embed_y = self.arena.alloc(Array2::<f32>::zeros((n, m)));
        let mut embed_x = self.arena.alloc(Array2::<f32>::zeros((n, m)));
        Zip::from(embed_y.rows_mut())
            .and(embed_x.rows_mut())
            .and(&*rows)
            .and(&*cols)
            .par_for_each(|mut ey, mut ex, &row, &col| {
                let start = request.geometry.cell_to_image(row, col);
                for (j, &k) in matching.iter().enumerate() {
                    let e = request.refine(start, k);
                    ey[j] = e.y;
                    ex[j] = e.x;
                }
            });

        // Stage 3: batched distances with a running argmin
        let batch = request.max_num_people;
        let mut best_distance = self.arena.alloc(Array1::from_elem(n, f32::INFINITY));
        let mut best_pose = self.arena.alloc(Array1::from_elem(n, -1_i32));
        let mut pose_y = self.arena.alloc(Array2::<f32>::zeros((m, batch)));
        let mut pose_x = self.arena.alloc(Array2::<f32>::zeros((m, batch)));
        let mut eligible = self.arena.alloc(Array2::from_elem((m, batch), false));
        let mut counts = self.arena.alloc(Array1::<u32>::zeros(batch));
        let mut distances = self.arena.alloc(Array2::<f32>::zeros((n, batch)));

        for (chunk_index, chunk) in request.poses.chunks(batch).enumerate() {
            let first = chunk_index * batch;
            pose_y.fill(0.0);
            pose_x.fill(0.0);
            eligible.fill(false);
            counts.fill(0);
            for (p, pose) in chunk.iter().enumerate() {
                for (j, &k) in matching.iter().enumerate() {
                    let keypoint = matching_keypoint(pose, first + p, k)?;
                    pose_y[[j, p]] = keypoint.position.y;
                    pose_x[[j, p]] = keypoint.position.x;
                    if keypoint.is_confident(request.min_keypoint_score) {
                        eligible[[j, p]] = true;
                        counts[p] += 1;
                    }
                }
            }

            let (pose_y, pose_x, eligible, counts) = (&*pose_y, &*pose_x, &*eligible, &*counts);
            let (embed_y, embed_x) = (&*embed_y, &*embed_x);
            Zip::indexed(&mut *distances).par_for_each(|(i, p), d| {
                if counts[p] == 0 {
                    *d = f32::INFINITY;
                    return;
                }
                let mut sum = 0.0_f32;
                for j in 0..m {
                    if eligible[[j, p]] {
                        sum += squared_distance(
                            embed_y[[i, j]],
                            embed_x[[i, j]],
                            pose_y[[j, p]],
                            pose_x[[j, p]],
                        );
                    }
                }
                *d = sum / counts[p] as f32;
            });

            let live = chunk.len();
            Zip::from(&mut *best_distance)
                .and(&mut *best_pose)
                .and(distances.rows())
                .par_for_each(|best_d, best_p, row| {
                    for p in 0..live {
                        if row[p] < *best_d {
                            *best_d = row[p];
                            *best_p = i32::try_from(first + p).unwrap_or(i32::MAX);
                        }
                    }
                });
        }

        // Stage 4: scatter
        let plane = labels.array_mut();
        let mut assigned = 0_usize;
        for ((&row, &col), &label) in rows.iter().zip(cols.iter()).zip(best_pose.iter()) {
            plane[[row, col]] = label;
            if label >= 0 {
                assigned += 1;
            }
        }

        debug!(
            assigned,
            foreground = n,
            peak_scratch_bytes = self.arena.peak_bytes(),
            "Parallel assignment complete"
        );
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeConfig;
    use crate::engine::{HostEngine, UNASSIGNED};
    use crate::error::DecodeError;
    use crate::fields::{OffsetField, SegmentationField};
    use crate::transform::GridGeometry;
    use bodypix_core::{Dimensions, Keypoint, KeypointType, Padding, Pose};
    use ndarray::Array3;

    fn root_pose(y: f32, x: f32, score: f32) -> Pose {
        Pose::new(0.9, vec![Keypoint::new(KeypointType::Nose, y, x, score)])
    }

    fn identity(grid: Dimensions) -> GridGeometry {
        GridGeometry::new(grid, grid, grid, Padding::zero(), 1).unwrap()
    }

    #[test]
    fn test_matches_host_across_batches() {
        let grid = Dimensions::new(5, 6);
        let seg = SegmentationField::new(Array2::from_shape_fn((5, 6), |(r, c)| {
            u8::from((r + c) % 3 != 0)
        }));
        let offsets = OffsetField::new(Array3::from_shape_fn((5, 6, 2), |(r, c, ch)| {
            if ch == 0 {
                0.25 * (r as f32 - 2.0)
            } else {
                -0.5 * (c as f32 - 3.0)
            }
        }))
        .unwrap();
        let poses: Vec<Pose> = (0..7)
            .map(|i| root_pose(i as f32 * 0.7, 5.0 - i as f32 * 0.8, if i == 3 { 0.1 } else { 0.8 }))
            .collect();
        let config = DecodeConfig::default().with_max_num_people(3).with_refine_steps(2);
        let request = AssignmentRequest::new(&seg, &offsets, &poses, identity(grid), &config);

        let host = HostEngine::new().assign(&request).unwrap();
        let engine = ParallelEngine::new();
        let parallel = engine.assign(&request).unwrap();
        assert_eq!(host, parallel);
        assert_eq!(engine.arena().live_bytes(), 0);
        assert!(engine.arena().peak_bytes() > 0);
    }

    #[test]
    fn test_no_foreground_is_all_unassigned() {
        let grid = Dimensions::new(3, 3);
        let seg = SegmentationField::new(Array2::zeros((3, 3)));
        let offsets = OffsetField::zeros(grid, 1);
        let poses = vec![root_pose(1.0, 1.0, 0.9)];
        let config = DecodeConfig::default();
        let request = AssignmentRequest::new(&seg, &offsets, &poses, identity(grid), &config);

        let labels = ParallelEngine::new().assign(&request).unwrap();
        assert!(labels.view().iter().all(|&l| l == UNASSIGNED));
    }

    #[test]
    fn test_missing_keypoint_releases_scratch() {
        let grid = Dimensions::new(3, 3);
        let seg = SegmentationField::new(Array2::ones((3, 3)));
        let offsets = OffsetField::zeros(grid, 2);
        let poses = vec![root_pose(1.0, 1.0, 0.9)];
        let config = DecodeConfig::default().with_matching_keypoints(vec![0, 1]);
        let request = AssignmentRequest::new(&seg, &offsets, &poses, identity(grid), &config);

        let engine = ParallelEngine::new();
        assert!(matches!(
            engine.assign(&request),
            Err(DecodeError::InvalidInput(_))
        ));
        assert_eq!(engine.arena().live_bytes(), 0);
        assert_eq!(engine.arena().live_buffers(), 0);
        assert!(engine.arena().peak_bytes() > 0);
    }
}
