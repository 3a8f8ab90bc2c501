//! Single-person segmentation and part maps from raw scores.

use crate::error::{DecodeError, DecodeResult};
use bodypix_core::NO_PART;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayView3, Axis, Zip};

/// Threshold segmentation scores into a `0`/`1` mask.
pub fn to_mask(segmentation_scores: ArrayView2<'_, f32>, threshold: f32) -> Array2<u8> {
    segmentation_scores.mapv(|s| u8::from(s > threshold))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn argmax(scores: ArrayView1<'_, f32>) -> i32 {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;
    for (i, &s) in scores.iter().enumerate() {
        if s > best_score {
            best_score = s;
            best = i;
        }
    }
    best as i32
}

/// Highest-scoring part per cell where `mask` is set, [`NO_PART`] elsewhere.
///
/// `part_heatmap_scores` has shape `(rows, cols, parts)`.
pub fn decode_part_segmentation(
    mask: ArrayView2<'_, u8>,
    part_heatmap_scores: ArrayView3<'_, f32>,
) -> DecodeResult<Array2<i32>> {
    let (h, w, parts) = part_heatmap_scores.dim();
    if mask.dim() != (h, w) {
        return Err(DecodeError::shape_mismatch(
            vec![h, w],
            vec![mask.nrows(), mask.ncols()],
        ));
    }
    if parts == 0 {
        return Err(DecodeError::invalid_input("part heatmap has no channels"));
    }
    Ok(Zip::from(&mask)
        .and(part_heatmap_scores.lanes(Axis(2)))
        .map_collect(|&m, scores| if m == 1 { argmax(scores) } else { NO_PART }))
}

/// Highest-scoring part per cell, ignoring segmentation.
pub fn decode_only_part_segmentation(
    part_heatmap_scores: ArrayView3<'_, f32>,
) -> DecodeResult<Array2<i32>> {
    if part_heatmap_scores.dim().2 == 0 {
        return Err(DecodeError::invalid_input("part heatmap has no channels"));
    }
    Ok(part_heatmap_scores.map_axis(Axis(2), argmax))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_to_mask() {
        let scores = array![[0.2_f32, 0.8], [0.5, 0.51]];
        assert_eq!(to_mask(scores.view(), 0.5), array![[0_u8, 1], [0, 1]]);
    }

    #[test]
    fn test_part_segmentation_uses_mask() {
        let mut heatmap = Array3::<f32>::zeros((2, 2, 3));
        heatmap[[0, 0, 2]] = 1.0;
        heatmap[[0, 1, 1]] = 1.0;
        heatmap[[1, 0, 0]] = 1.0;
        heatmap[[1, 1, 2]] = 1.0;
        let mask = array![[1_u8, 1], [0, 1]];

        let parts = decode_part_segmentation(mask.view(), heatmap.view()).unwrap();
        assert_eq!(parts, array![[2, 1], [-1, 2]]);

        let all = decode_only_part_segmentation(heatmap.view()).unwrap();
        assert_eq!(all, array![[2, 1], [0, 2]]);
    }

    #[test]
    fn test_first_maximum_wins() {
        let heatmap = Array3::<f32>::from_elem((1, 1, 4), 0.5);
        assert_eq!(decode_only_part_segmentation(heatmap.view()).unwrap()[[0, 0]], 0);
    }

    #[test]
    fn test_shape_mismatch() {
        let heatmap = Array3::<f32>::zeros((2, 2, 3));
        let mask = Array2::<u8>::zeros((2, 3));
        assert!(matches!(
            decode_part_segmentation(mask.view(), heatmap.view()),
            Err(DecodeError::ShapeMismatch { .. })
        ));
    }
}
