//! Dense network output fields at output-grid resolution.
//!
//! Each wrapper owns an `ndarray` array and validates its shape once at
//! construction, so the engines can index without re-checking.

use crate::error::{DecodeError, DecodeResult};
use bodypix_core::{Dimensions, Vector2D, NO_PART, NUM_PART_CHANNELS};
use ndarray::{Array2, Array3, ArrayView2};

/// Foreground indicator per grid cell, `1` for person pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationField(Array2<u8>);

impl SegmentationField {
    /// Wrap an existing array.
    pub fn new(array: Array2<u8>) -> Self {
        Self(array)
    }

    /// Build from row-major data.
    pub fn from_shape_vec(grid: Dimensions, data: Vec<u8>) -> DecodeResult<Self> {
        let actual = data.len();
        Array2::from_shape_vec((grid.height, grid.width), data)
            .map(Self)
            .map_err(|_| DecodeError::shape_mismatch(vec![grid.height, grid.width], vec![actual]))
    }

    /// Threshold a probability plane into a foreground field.
    pub fn from_probabilities(probabilities: ArrayView2<'_, f32>, threshold: f32) -> Self {
        Self(probabilities.mapv(|p| u8::from(p > threshold)))
    }

    /// Grid dimensions.
    pub fn grid(&self) -> Dimensions {
        let (h, w) = self.0.dim();
        Dimensions::new(h, w)
    }

    /// Whether the cell at `(row, col)` is foreground.
    #[inline]
    pub fn is_foreground(&self, row: usize, col: usize) -> bool {
        self.0[[row, col]] == 1
    }

    /// Number of foreground cells.
    pub fn foreground_count(&self) -> usize {
        self.0.iter().filter(|&&v| v == 1).count()
    }

    /// Underlying array.
    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.0.view()
    }
}

/// Long-range offsets from each cell toward its instance keypoints.
///
/// Shape `(rows, cols, 2 * K)`: channel `k` is the y-displacement and channel
/// `K + k` the x-displacement toward keypoint `k`, in network-input pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetField(Array3<f32>);

impl OffsetField {
    /// Wrap an existing array, checking the channel count is even and non-zero.
    pub fn new(array: Array3<f32>) -> DecodeResult<Self> {
        let (h, w, c) = array.dim();
        if c == 0 || c % 2 != 0 {
            return Err(DecodeError::shape_mismatch(vec![h, w, 2], vec![h, w, c]));
        }
        Ok(Self(array))
    }

    /// Build from row-major `(rows, cols, channels)` data.
    pub fn from_shape_vec(grid: Dimensions, channels: usize, data: Vec<f32>) -> DecodeResult<Self> {
        let actual = data.len();
        let array = Array3::from_shape_vec((grid.height, grid.width, channels), data).map_err(
            |_| DecodeError::shape_mismatch(vec![grid.height, grid.width, channels], vec![actual]),
        )?;
        Self::new(array)
    }

    /// A field of zero displacement with one keypoint channel pair.
    pub fn zeros(grid: Dimensions, num_keypoints: usize) -> Self {
        Self(Array3::zeros((grid.height, grid.width, 2 * num_keypoints.max(1))))
    }

    /// Grid dimensions.
    pub fn grid(&self) -> Dimensions {
        let (h, w, _) = self.0.dim();
        Dimensions::new(h, w)
    }

    /// Number of keypoints the field carries offsets for.
    pub fn num_keypoints(&self) -> usize {
        self.0.dim().2 / 2
    }

    /// Displacement toward keypoint `k` at cell `(row, col)`.
    #[inline]
    pub fn offset(&self, row: usize, col: usize, k: usize) -> Vector2D {
        let n = self.num_keypoints();
        Vector2D::new(self.0[[row, col, k]], self.0[[row, col, n + k]])
    }

    /// Underlying array.
    pub fn array(&self) -> &Array3<f32> {
        &self.0
    }
}

/// Body-part id per grid cell, [`NO_PART`] where no part applies.
///
/// Every id is either [`NO_PART`] or a part channel in `0..24`.
#[derive(Debug, Clone, PartialEq)]
pub struct PartField(Array2<i32>);

impl PartField {
    /// Wrap an existing array.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::InvalidInput`] if any id is outside
    /// `-1..24`.
    pub fn new(array: Array2<i32>) -> DecodeResult<Self> {
        let max = NUM_PART_CHANNELS as i32;
        if let Some(&bad) = array.iter().find(|&&p| p < NO_PART || p >= max) {
            return Err(DecodeError::invalid_input(format!(
                "part id {bad} is outside {NO_PART}..{max}"
            )));
        }
        Ok(Self(array))
    }

    /// Build from row-major data.
    pub fn from_shape_vec(grid: Dimensions, data: Vec<i32>) -> DecodeResult<Self> {
        let actual = data.len();
        let array = Array2::from_shape_vec((grid.height, grid.width), data)
            .map_err(|_| DecodeError::shape_mismatch(vec![grid.height, grid.width], vec![actual]))?;
        Self::new(array)
    }

    /// A field with no parts anywhere.
    pub fn empty(grid: Dimensions) -> Self {
        Self(Array2::from_elem((grid.height, grid.width), NO_PART))
    }

    /// Grid dimensions.
    pub fn grid(&self) -> Dimensions {
        let (h, w) = self.0.dim();
        Dimensions::new(h, w)
    }

    /// Underlying array.
    pub fn view(&self) -> ArrayView2<'_, i32> {
        self.0.view()
    }
}

/// Fail with a shape mismatch unless both grids agree.
pub(crate) fn ensure_same_grid(expected: Dimensions, actual: Dimensions) -> DecodeResult<()> {
    if expected != actual {
        return Err(DecodeError::shape_mismatch(
            vec![expected.height, expected.width],
            vec![actual.height, actual.width],
        ));
    }
    Ok(())
}
