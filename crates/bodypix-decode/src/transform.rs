//! Padding and resize transforms between image, network-input and output-grid
//! coordinates.
//!
//! Images and tensor planes are `(height, width, channels)` arrays. Two
//! preprocessing orders are supported and kept distinct because they round
//! their padding differently:
//!
//! - [`resize_and_pad_to`]: resize so the image fits, then pad. Padding is split
//!   as `floor` / remainder around the center.
//! - [`pad_and_resize_to`]: pad to the target aspect ratio, then resize. Both
//!   halves are rounded independently, so the total can be off by one pixel.
//!
//! [`remove_padding_and_resize_back`] inverts either of them, and
//! [`GridGeometry`] maps individual output-grid cells to original-image
//! coordinates for the assignment engines.

use crate::error::{DecodeError, DecodeResult};
use bodypix_core::utils::clamp;
use bodypix_core::{Dimensions, Padding, Vector2D};
use ndarray::{s, Array2, Array3, ArrayView2, ArrayView3, Axis};

/// Sampling used when resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Bilinear interpolation between the four nearest samples
    #[default]
    Bilinear,
    /// Nearest sample
    Nearest,
}

/// Result of planning a resize-then-pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePadPlan {
    /// Size of the image after resizing, before padding
    pub resized: Dimensions,
    /// Padding that brings `resized` to the target size
    pub padding: Padding,
}

fn ensure_non_empty(dims: Dimensions, what: &str) -> DecodeResult<()> {
    if dims.is_empty() {
        return Err(DecodeError::invalid_input(format!(
            "{what} must be non-empty, got {}x{}",
            dims.height, dims.width
        )));
    }
    Ok(())
}

/// Plan a resize that fits `source` inside `target` preserving aspect ratio,
/// followed by symmetric padding.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn resize_and_pad_plan(source: Dimensions, target: Dimensions) -> DecodeResult<ResizePadPlan> {
    ensure_non_empty(source, "source")?;
    ensure_non_empty(target, "target")?;

    let target_aspect = target.aspect();
    let aspect = source.aspect();

    let plan = if aspect > target_aspect {
        // width is the limiting side
        let resize_w = target.width;
        let resize_h = ((resize_w as f64 / aspect).ceil() as usize).min(target.height);
        let pad_height = target.height - resize_h;
        let top = pad_height / 2;
        ResizePadPlan {
            resized: Dimensions::new(resize_h, resize_w),
            padding: Padding::new(top, target.height - (resize_h + top), 0, 0),
        }
    } else {
        let resize_h = target.height;
        let resize_w = ((target.height as f64 * aspect).ceil() as usize).min(target.width);
        let pad_width = target.width - resize_w;
        let left = pad_width / 2;
        ResizePadPlan {
            resized: Dimensions::new(resize_h, resize_w),
            padding: Padding::new(0, 0, left, target.width - (resize_w + left)),
        }
    };
    Ok(plan)
}

/// Plan the padding that brings `source` to the aspect ratio of `target`.
///
/// Each half is rounded on its own, so an odd difference pads one pixel more
/// in total than needed. Callers relying on exact sizes should use
/// [`resize_and_pad_plan`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn pad_and_resize_plan(source: Dimensions, target: Dimensions) -> DecodeResult<Padding> {
    ensure_non_empty(source, "source")?;
    ensure_non_empty(target, "target")?;

    let target_aspect = target.aspect();
    let aspect = source.aspect();
    let (h, w) = (source.height as f64, source.width as f64);

    let padding = if aspect < target_aspect {
        let half = (0.5 * (target_aspect * h - w)).max(0.0).round() as usize;
        Padding::new(0, 0, half, half)
    } else {
        let half = (0.5 * ((1.0 / target_aspect) * w - h)).max(0.0).round() as usize;
        Padding::new(half, half, 0, 0)
    };
    Ok(padding)
}

/// Number of output-grid cells along each axis for a network input of size
/// `input` and output stride `stride`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn output_resolution(input: Dimensions, stride: usize) -> DecodeResult<Dimensions> {
    if stride == 0 {
        return Err(DecodeError::invalid_input("stride must be positive"));
    }
    ensure_non_empty(input, "input")?;
    let axis = |d: usize| ((d as f64 - 1.0) / stride as f64 + 1.0).round() as usize;
    Ok(Dimensions::new(axis(input.height), axis(input.width)))
}

/// Zero-pad an image.
pub fn pad3d(image: ArrayView3<'_, f32>, padding: Padding) -> Array3<f32> {
    let (h, w, c) = image.dim();
    let mut out = Array3::zeros((h + padding.vertical(), w + padding.horizontal(), c));
    out.slice_mut(s![
        padding.top..padding.top + h,
        padding.left..padding.left + w,
        ..
    ])
    .assign(&image);
    out
}

/// Mirror an image left to right.
pub fn flip_horizontal(image: ArrayView3<'_, f32>) -> Array3<f32> {
    image.slice(s![.., ..;-1, ..]).to_owned()
}

#[allow(clippy::cast_precision_loss)]
fn resize_scale(input: usize, output: usize, align_corners: bool) -> f32 {
    if align_corners && output > 1 {
        (input as f32 - 1.0) / (output as f32 - 1.0)
    } else {
        input as f32 / output as f32
    }
}

/// Bilinear resize.
///
/// With `align_corners` the corner samples of input and output coincide;
/// otherwise source coordinates are `dst * input / output`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn resize_bilinear(
    image: ArrayView3<'_, f32>,
    target: Dimensions,
    align_corners: bool,
) -> Array3<f32> {
    let (in_h, in_w, channels) = image.dim();
    let mut out = Array3::zeros((target.height, target.width, channels));
    if in_h == 0 || in_w == 0 {
        return out;
    }
    let scale_y = resize_scale(in_h, target.height, align_corners);
    let scale_x = resize_scale(in_w, target.width, align_corners);

    for y in 0..target.height {
        let src_y = y as f32 * scale_y;
        let y0 = (src_y.floor() as usize).min(in_h - 1);
        let y1 = (y0 + 1).min(in_h - 1);
        let dy = src_y - y0 as f32;
        for x in 0..target.width {
            let src_x = x as f32 * scale_x;
            let x0 = (src_x.floor() as usize).min(in_w - 1);
            let x1 = (x0 + 1).min(in_w - 1);
            let dx = src_x - x0 as f32;
            for c in 0..channels {
                let top = image[[y0, x0, c]] + (image[[y0, x1, c]] - image[[y0, x0, c]]) * dx;
                let bottom = image[[y1, x0, c]] + (image[[y1, x1, c]] - image[[y1, x0, c]]) * dx;
                out[[y, x, c]] = top + (bottom - top) * dy;
            }
        }
    }
    out
}

/// Nearest-neighbour resize.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn resize_nearest(
    image: ArrayView3<'_, f32>,
    target: Dimensions,
    align_corners: bool,
) -> Array3<f32> {
    let (in_h, in_w, channels) = image.dim();
    let mut out = Array3::zeros((target.height, target.width, channels));
    if in_h == 0 || in_w == 0 {
        return out;
    }
    let scale_y = resize_scale(in_h, target.height, align_corners);
    let scale_x = resize_scale(in_w, target.width, align_corners);
    let pick = |dst: usize, scale: f32, len: usize| {
        let src = dst as f32 * scale;
        let src = if align_corners { src.round() } else { src.floor() };
        (src as usize).min(len - 1)
    };

    for y in 0..target.height {
        let sy = pick(y, scale_y, in_h);
        for x in 0..target.width {
            let sx = pick(x, scale_x, in_w);
            out.slice_mut(s![y, x, ..]).assign(&image.slice(s![sy, sx, ..]));
        }
    }
    out
}

/// Resize a single-channel plane.
pub fn resize_2d(plane: ArrayView2<'_, f32>, target: Dimensions, nearest: bool) -> Array2<f32> {
    let image = plane.insert_axis(Axis(2));
    let resized = if nearest {
        resize_nearest(image, target, false)
    } else {
        resize_bilinear(image, target, false)
    };
    resized.index_axis_move(Axis(2), 0)
}

/// Resize-then-pad an image into `target`, optionally mirroring it first.
pub fn resize_and_pad_to(
    image: ArrayView3<'_, f32>,
    target: Dimensions,
    flip: bool,
) -> DecodeResult<(Array3<f32>, Padding)> {
    let (h, w, _) = image.dim();
    let plan = resize_and_pad_plan(Dimensions::new(h, w), target)?;

    let resized = if flip {
        resize_bilinear(flip_horizontal(image).view(), plan.resized, false)
    } else {
        resize_bilinear(image, plan.resized, false)
    };
    Ok((pad3d(resized.view(), plan.padding), plan.padding))
}

/// Pad-then-resize an image into `target`.
pub fn pad_and_resize_to(
    image: ArrayView3<'_, f32>,
    target: Dimensions,
) -> DecodeResult<(Array3<f32>, Padding)> {
    let (h, w, _) = image.dim();
    let padding = pad_and_resize_plan(Dimensions::new(h, w), target)?;
    let padded = pad3d(image, padding);
    Ok((resize_bilinear(padded.view(), target, false), padding))
}

/// Normalized crop box `[y1, x1, y2, x2]`.
type CropBox = [f32; 4];

const EDGE_TOLERANCE: f32 = 1e-3;

/// Crop a normalized box out of `image` and resample it to `crop`.
///
/// Samples falling outside the image read as zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn crop_and_resize(
    image: ArrayView3<'_, f32>,
    [y1, x1, y2, x2]: CropBox,
    crop: Dimensions,
    method: Interpolation,
) -> Array3<f32> {
    let (in_h, in_w, channels) = image.dim();
    let mut out = Array3::zeros((crop.height, crop.width, channels));
    let max_y = (in_h - 1) as f32;
    let max_x = (in_w - 1) as f32;

    let source = |i: usize, len: usize, lo: f32, hi: f32, max: f32| {
        if len > 1 {
            lo * max + i as f32 * (hi - lo) * max / (len - 1) as f32
        } else {
            0.5 * (lo + hi) * max
        }
    };

    // Box edges computed in floating point can land a hair outside the image.
    let inside = |v: f32, max: f32| (-EDGE_TOLERANCE..=max + EDGE_TOLERANCE).contains(&v);

    for y in 0..crop.height {
        let in_y = source(y, crop.height, y1, y2, max_y);
        if !inside(in_y, max_y) {
            continue;
        }
        let in_y = clamp(in_y, 0.0, max_y);
        for x in 0..crop.width {
            let in_x = source(x, crop.width, x1, x2, max_x);
            if !inside(in_x, max_x) {
                continue;
            }
            let in_x = clamp(in_x, 0.0, max_x);
            match method {
                Interpolation::Nearest => {
                    let sy = in_y.round() as usize;
                    let sx = in_x.round() as usize;
                    out.slice_mut(s![y, x, ..]).assign(&image.slice(s![sy, sx, ..]));
                }
                Interpolation::Bilinear => {
                    let top = in_y.floor() as usize;
                    let bottom = in_y.ceil() as usize;
                    let left = in_x.floor() as usize;
                    let right = in_x.ceil() as usize;
                    let dy = in_y - top as f32;
                    let dx = in_x - left as f32;
                    for c in 0..channels {
                        let t = image[[top, left, c]]
                            + (image[[top, right, c]] - image[[top, left, c]]) * dx;
                        let b = image[[bottom, left, c]]
                            + (image[[bottom, right, c]] - image[[bottom, left, c]]) * dx;
                        out[[y, x, c]] = t + (b - t) * dy;
                    }
                }
            }
        }
    }
    out
}

/// Crop the padded border off `resized_and_padded` and resample the content
/// back to `original` size.
///
/// The crop box is normalized against the padded field's own resolution, so
/// the field may be at network-input or any proportional resolution. With zero
/// padding this is a plain align-corners resize.
///
/// # Errors
///
/// Both `original` sides and both sides of the padded field must be at least
/// 2, otherwise the normalization would divide by zero.
pub fn remove_padding_and_resize_back(
    resized_and_padded: ArrayView3<'_, f32>,
    original: Dimensions,
    padding: Padding,
) -> DecodeResult<Array3<f32>> {
    remove_padding_and_resize_back_with(
        resized_and_padded,
        original,
        padding,
        Interpolation::Bilinear,
    )
}

/// [`remove_padding_and_resize_back`] with an explicit sampling method.
/// Label planes use [`Interpolation::Nearest`] so ids are never blended.
#[allow(clippy::cast_precision_loss)]
pub fn remove_padding_and_resize_back_with(
    resized_and_padded: ArrayView3<'_, f32>,
    original: Dimensions,
    padding: Padding,
    method: Interpolation,
) -> DecodeResult<Array3<f32>> {
    let (h, w, _) = resized_and_padded.dim();
    if original.height < 2 || original.width < 2 {
        return Err(DecodeError::invalid_input(format!(
            "original dimensions must be at least 2x2, got {}x{}",
            original.height, original.width
        )));
    }
    if h < 2 || w < 2 {
        return Err(DecodeError::invalid_input(format!(
            "padded field must be at least 2x2, got {h}x{w}"
        )));
    }
    let padded = Dimensions::new(h, w);
    padding.inner(padded)?;

    let denom_y = (h - 1) as f32;
    let denom_x = (w - 1) as f32;
    let crop_box = [
        padding.top as f32 / denom_y,
        padding.left as f32 / denom_x,
        (h - 1 - padding.bottom) as f32 / denom_y,
        (w - 1 - padding.right) as f32 / denom_x,
    ];
    Ok(crop_and_resize(resized_and_padded, crop_box, original, method))
}

/// Upsample a network output to the resized-and-padded input resolution,
/// optionally apply a sigmoid, then crop the padding and resize back to the
/// original image size.
pub fn scale_and_crop_to_input_tensor_shape(
    tensor: ArrayView3<'_, f32>,
    input: Dimensions,
    resized_and_padded: Dimensions,
    padding: Padding,
    apply_sigmoid: bool,
) -> DecodeResult<Array3<f32>> {
    let mut in_resized_and_padded = resize_bilinear(tensor, resized_and_padded, true);
    if apply_sigmoid {
        in_resized_and_padded.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp()));
    }
    remove_padding_and_resize_back(in_resized_and_padded.view(), input, padding)
}

/// Maps output-grid cells to original-image coordinates and back.
///
/// A grid cell `(r, c)` sits at network-input pixel `(r * stride, c * stride)`.
/// Removing the padding and scaling by `original / unpadded_input` gives its
/// original-image position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    grid: Dimensions,
    original: Dimensions,
    padding: Padding,
    stride: f32,
    scale_y: f32,
    scale_x: f32,
}

impl GridGeometry {
    /// Build the mapping for a `grid` produced from a resized-and-padded
    /// `input` of an image of size `original`.
    #[allow(clippy::cast_precision_loss)]
    pub fn new(
        grid: Dimensions,
        input: Dimensions,
        original: Dimensions,
        padding: Padding,
        stride: usize,
    ) -> DecodeResult<Self> {
        if stride == 0 {
            return Err(DecodeError::invalid_input("stride must be positive"));
        }
        ensure_non_empty(grid, "grid")?;
        ensure_non_empty(original, "original")?;
        let inner = padding.inner(input)?;
        Ok(Self {
            grid,
            original,
            padding,
            stride: stride as f32,
            scale_y: original.height as f32 / inner.height as f32,
            scale_x: original.width as f32 / inner.width as f32,
        })
    }

    /// Grid dimensions.
    pub fn grid(&self) -> Dimensions {
        self.grid
    }

    /// Original image dimensions.
    pub fn original(&self) -> Dimensions {
        self.original
    }

    /// Original-image pixels per network-input pixel, as `(y, x)`.
    pub fn scale(&self) -> Vector2D {
        Vector2D::new(self.scale_y, self.scale_x)
    }

    /// Original-image position of grid cell `(row, col)`.
    #[inline]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_to_image(&self, row: usize, col: usize) -> Vector2D {
        Vector2D::new(
            (row as f32 * self.stride - self.padding.top as f32) * self.scale_y,
            (col as f32 * self.stride - self.padding.left as f32) * self.scale_x,
        )
    }

    /// Grid cell nearest to an original-image position, clamped to the grid.
    #[inline]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn image_to_cell(&self, position: Vector2D) -> (usize, usize) {
        let row = ((position.y / self.scale_y + self.padding.top as f32) / self.stride).round();
        let col = ((position.x / self.scale_x + self.padding.left as f32) / self.stride).round();
        (
            clamp(row, 0.0, (self.grid.height - 1) as f32) as usize,
            clamp(col, 0.0, (self.grid.width - 1) as f32) as usize,
        )
    }

    /// Convert a displacement in network-input pixels to original-image pixels.
    #[inline]
    pub fn offset_to_image(&self, offset: Vector2D) -> Vector2D {
        Vector2D::new(offset.y * self.scale_y, offset.x * self.scale_x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array3};

    #[test]
    fn test_resize_and_pad_plan_wide_image() {
        // 50 rows x 100 cols into 100x100
        let plan = resize_and_pad_plan(Dimensions::new(50, 100), Dimensions::new(100, 100)).unwrap();
        assert_eq!(plan.resized, Dimensions::new(50, 100));
        assert_eq!(plan.padding, Padding::new(25, 25, 0, 0));
    }

    #[test]
    fn test_resize_and_pad_plan_tall_image() {
        let plan = resize_and_pad_plan(Dimensions::new(100, 33), Dimensions::new(64, 64)).unwrap();
        assert_eq!(plan.resized, Dimensions::new(64, 22));
        assert_eq!(plan.padding, Padding::new(0, 0, 21, 21));

        let plan = resize_and_pad_plan(Dimensions::new(10, 3), Dimensions::new(10, 10)).unwrap();
        assert_eq!(plan.resized, Dimensions::new(10, 3));
        // floor on the left, remainder on the right
        assert_eq!(plan.padding, Padding::new(0, 0, 3, 4));
    }

    #[test]
    fn test_resize_and_pad_plan_fills_target() {
        for (h, w) in [(480, 640), (640, 480), (1, 300), (300, 1), (37, 37)] {
            let target = Dimensions::new(257, 353);
            let plan = resize_and_pad_plan(Dimensions::new(h, w), target).unwrap();
            assert_eq!(plan.resized.height + plan.padding.vertical(), target.height);
            assert_eq!(plan.resized.width + plan.padding.horizontal(), target.width);
        }
    }

    #[test]
    fn test_pad_and_resize_plan_rounds_each_half() {
        let padding = pad_and_resize_plan(Dimensions::new(50, 100), Dimensions::new(100, 100)).unwrap();
        assert_eq!(padding, Padding::new(25, 25, 0, 0));

        // difference of 3 columns: each half rounds 1.5 up to 2
        let padding = pad_and_resize_plan(Dimensions::new(10, 7), Dimensions::new(10, 10)).unwrap();
        assert_eq!(padding, Padding::new(0, 0, 2, 2));
    }

    #[test]
    fn test_plan_rejects_empty_dimensions() {
        assert!(resize_and_pad_plan(Dimensions::new(0, 10), Dimensions::new(10, 10)).is_err());
        assert!(pad_and_resize_plan(Dimensions::new(10, 10), Dimensions::new(10, 0)).is_err());
    }

    #[test]
    fn test_output_resolution() {
        assert_eq!(
            output_resolution(Dimensions::new(513, 513), 16).unwrap(),
            Dimensions::new(33, 33)
        );
        assert_eq!(
            output_resolution(Dimensions::new(4, 4), 1).unwrap(),
            Dimensions::new(4, 4)
        );
        assert!(output_resolution(Dimensions::new(4, 4), 0).is_err());
    }

    #[test]
    fn test_pad3d_places_content() {
        let image = Array3::from_elem((2, 2, 1), 1.0_f32);
        let padded = pad3d(image.view(), Padding::new(1, 0, 0, 2));
        assert_eq!(padded.dim(), (3, 4, 1));
        assert_eq!(padded[[0, 0, 0]], 0.0);
        assert_eq!(padded[[1, 0, 0]], 1.0);
        assert_eq!(padded[[2, 1, 0]], 1.0);
        assert_eq!(padded[[2, 2, 0]], 0.0);
    }

    #[test]
    fn test_resize_bilinear_align_corners() {
        let plane = array![[0.0_f32, 2.0], [4.0, 6.0]];
        let image = plane.insert_axis(Axis(2));
        let out = resize_bilinear(image.view(), Dimensions::new(3, 3), true);
        assert_abs_diff_eq!(out[[0, 0, 0]], 0.0);
        assert_abs_diff_eq!(out[[1, 1, 0]], 3.0);
        assert_abs_diff_eq!(out[[2, 2, 0]], 6.0);
        assert_abs_diff_eq!(out[[0, 1, 0]], 1.0);
    }

    #[test]
    fn test_resize_2d_nearest_keeps_values() {
        let plane = array![[1.0_f32, 2.0], [3.0, 4.0]];
        let out = resize_2d(plane.view(), Dimensions::new(4, 4), true);
        assert_eq!(out[[0, 0]], 1.0);
        assert_eq!(out[[0, 3]], 2.0);
        assert_eq!(out[[3, 0]], 3.0);
        assert_eq!(out[[3, 3]], 4.0);
    }

    #[test]
    fn test_remove_padding_without_padding_is_resize() {
        let plane = array![[0.0_f32, 2.0], [4.0, 6.0]];
        let image = plane.insert_axis(Axis(2));
        let cropped =
            remove_padding_and_resize_back(image.view(), Dimensions::new(3, 3), Padding::zero())
                .unwrap();
        let resized = resize_bilinear(image.view(), Dimensions::new(3, 3), true);
        for (a, b) in cropped.iter().zip(resized.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_remove_padding_inverts_pad() {
        let mut image = Array3::zeros((4, 6, 1));
        for y in 0..4 {
            for x in 0..6 {
                image[[y, x, 0]] = (y * 10 + x) as f32;
            }
        }
        let padding = Padding::new(2, 1, 3, 0);
        let padded = pad3d(image.view(), padding);
        let restored =
            remove_padding_and_resize_back(padded.view(), Dimensions::new(4, 6), padding).unwrap();
        for (a, b) in restored.iter().zip(image.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_remove_padding_guards_degenerate_dimensions() {
        let image = Array3::zeros((4, 4, 1));
        assert!(matches!(
            remove_padding_and_resize_back(image.view(), Dimensions::new(1, 4), Padding::zero()),
            Err(DecodeError::InvalidInput(_))
        ));
        let tiny = Array3::zeros((1, 4, 1));
        assert!(matches!(
            remove_padding_and_resize_back(tiny.view(), Dimensions::new(4, 4), Padding::zero()),
            Err(DecodeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_resize_and_pad_then_remove_roundtrip_shape() {
        let image = Array3::from_elem((50, 100, 3), 0.5_f32);
        let (padded, padding) =
            resize_and_pad_to(image.view(), Dimensions::new(100, 100), false).unwrap();
        assert_eq!(padded.dim(), (100, 100, 3));
        assert_eq!(padding, Padding::new(25, 25, 0, 0));
        assert_eq!(padded[[0, 50, 0]], 0.0);
        assert_abs_diff_eq!(padded[[50, 50, 0]], 0.5);

        let restored =
            remove_padding_and_resize_back(padded.view(), Dimensions::new(50, 100), padding)
                .unwrap();
        assert_eq!(restored.dim(), (50, 100, 3));
        assert_abs_diff_eq!(restored[[0, 0, 0]], 0.5, epsilon = 1e-5);
    }

    #[test]
    fn test_resize_and_pad_flip() {
        let mut image = Array3::zeros((2, 2, 1));
        image[[0, 0, 0]] = 1.0;
        let (out, _) = resize_and_pad_to(image.view(), Dimensions::new(2, 2), true).unwrap();
        assert_eq!(out[[0, 1, 0]], 1.0);
        assert_eq!(out[[0, 0, 0]], 0.0);
    }

    #[test]
    fn test_pad_and_resize_to_output_shape() {
        let image = Array3::from_elem((10, 7, 3), 1.0_f32);
        let (out, padding) = pad_and_resize_to(image.view(), Dimensions::new(20, 20)).unwrap();
        assert_eq!(out.dim(), (20, 20, 3));
        assert_eq!(padding, Padding::new(0, 0, 2, 2));
    }

    #[test]
    fn test_scale_and_crop_applies_sigmoid() {
        let tensor = Array3::zeros((3, 3, 1));
        let out = scale_and_crop_to_input_tensor_shape(
            tensor.view(),
            Dimensions::new(4, 4),
            Dimensions::new(5, 5),
            Padding::new(1, 0, 0, 1),
            true,
        )
        .unwrap();
        assert_eq!(out.dim(), (4, 4, 1));
        for v in out.iter() {
            assert_abs_diff_eq!(*v, 0.5, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_grid_geometry_identity() {
        let dims = Dimensions::new(4, 4);
        let geometry = GridGeometry::new(dims, dims, dims, Padding::zero(), 1).unwrap();
        assert_eq!(geometry.cell_to_image(1, 3), Vector2D::new(1.0, 3.0));
        assert_eq!(geometry.image_to_cell(Vector2D::new(1.2, 2.6)), (1, 3));
        assert_eq!(geometry.image_to_cell(Vector2D::new(-5.0, 40.0)), (0, 3));
    }

    #[test]
    fn test_grid_geometry_with_padding_and_stride() {
        // 50x100 image resized into a 100x100 input padded 25/25, stride 10
        let input = Dimensions::new(100, 100);
        let grid = output_resolution(input, 10).unwrap();
        let geometry = GridGeometry::new(
            grid,
            input,
            Dimensions::new(50, 100),
            Padding::new(25, 25, 0, 0),
            10,
        )
        .unwrap();
        let p = geometry.cell_to_image(5, 5);
        assert_abs_diff_eq!(p.y, 25.0);
        assert_abs_diff_eq!(p.x, 50.0);
        assert_eq!(geometry.image_to_cell(p), (5, 5));
        // the top padding row maps above the image
        assert!(geometry.cell_to_image(0, 0).y < 0.0);
    }
}
