//! Compositing masks and segmentations onto images.
//!
//! Every function returns a new image and leaves its inputs untouched. Blur
//! amounts are Gaussian standard deviations in pixels, `0` meaning no blur.

use crate::error::{RenderError, RenderResult};
use crate::mask::image_size;
use bodypix_core::{Dimensions, PersonSegmentation};
use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgba, RgbaImage};
use tracing::trace;

/// Largest accepted blur amount.
pub const MAX_BLUR_AMOUNT: u32 = 20;

/// Default opacity of [`draw_mask`].
pub const DEFAULT_MASK_OPACITY: f32 = 0.7;

/// Default cell size of [`draw_pixelated_mask`].
pub const DEFAULT_PIXEL_CELL_WIDTH: u32 = 10;

/// Default blur amounts of [`draw_bokeh_effect`].
pub const DEFAULT_BACKGROUND_BLUR_AMOUNT: u32 = 3;
/// See [`DEFAULT_BACKGROUND_BLUR_AMOUNT`].
pub const DEFAULT_EDGE_BLUR_AMOUNT: u32 = 3;

fn check_blur(amount: u32, what: &str) -> RenderResult<()> {
    if amount > MAX_BLUR_AMOUNT {
        return Err(RenderError::invalid_argument(format!(
            "{what} must be at most {MAX_BLUR_AMOUNT}, got {amount}"
        )));
    }
    Ok(())
}

fn check_same_size(expected: (u32, u32), actual: (u32, u32)) -> RenderResult<()> {
    if expected != actual {
        return Err(RenderError::dimension_mismatch(expected, actual));
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn blurred<P>(image: &ImageBuffer<P, Vec<u8>>, amount: u32) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    if amount == 0 {
        image.clone()
    } else {
        imageops::blur(image, amount as f32)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Mirror an image left to right.
pub fn flip_image_horizontal(image: &RgbaImage) -> RgbaImage {
    imageops::flip_horizontal(image)
}

/// Draw `mask_image` over `image` at `opacity`, source-over.
///
/// The mask is blurred by `mask_blur_amount` first. With `flip_horizontal`
/// both image and mask are mirrored, matching a mirrored camera preview.
pub fn draw_mask(
    image: &RgbaImage,
    mask_image: &RgbaImage,
    opacity: f32,
    mask_blur_amount: u32,
    flip_horizontal: bool,
) -> RenderResult<RgbaImage> {
    check_same_size(image.dimensions(), mask_image.dimensions())?;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(RenderError::invalid_argument(format!(
            "opacity must be in [0, 1], got {opacity}"
        )));
    }
    check_blur(mask_blur_amount, "mask_blur_amount")?;
    trace!(opacity, mask_blur_amount, flip_horizontal, "Drawing mask");

    let mut mask = blurred(mask_image, mask_blur_amount);
    let mut out = image.clone();
    if flip_horizontal {
        mask = flip_image_horizontal(&mask);
        out = flip_image_horizontal(&out);
    }

    for (dst, src) in out.pixels_mut().zip(mask.pixels()) {
        let a = f32::from(src[3]) / 255.0 * opacity;
        for c in 0..3 {
            dst[c] = to_u8(f32::from(src[c]) * a + f32::from(dst[c]) * (1.0 - a));
        }
        dst[3] = to_u8(255.0 * a + f32::from(dst[3]) * (1.0 - a));
    }
    Ok(out)
}

/// [`draw_mask`] with the mask reduced to square cells of
/// `pixel_cell_width` pixels.
pub fn draw_pixelated_mask(
    image: &RgbaImage,
    mask_image: &RgbaImage,
    opacity: f32,
    mask_blur_amount: u32,
    flip_horizontal: bool,
    pixel_cell_width: u32,
) -> RenderResult<RgbaImage> {
    if pixel_cell_width == 0 {
        return Err(RenderError::invalid_argument(
            "pixel_cell_width must be positive",
        ));
    }
    let (w, h) = mask_image.dimensions();
    let small = imageops::resize(
        mask_image,
        w.div_ceil(pixel_cell_width).max(1),
        h.div_ceil(pixel_cell_width).max(1),
        FilterType::Nearest,
    );
    let pixelated = imageops::resize(&small, w, h, FilterType::Nearest);
    draw_mask(image, &pixelated, opacity, mask_blur_amount, flip_horizontal)
}

fn person_mask<'a, I>(dims: Dimensions, segmentations: I) -> RenderResult<GrayImage>
where
    I: IntoIterator<Item = &'a PersonSegmentation>,
{
    let (w, h) = image_size(dims)?;
    let mut mask = GrayImage::new(w, h);
    for segmentation in segmentations {
        check_same_size((w, h), image_size(segmentation.dimensions())?)?;
        for (p, &v) in mask.pixels_mut().zip(&segmentation.data) {
            if v == 1 {
                *p = Luma([255]);
            }
        }
    }
    Ok(mask)
}

fn bokeh(
    image: &RgbaImage,
    mask: &GrayImage,
    background_blur_amount: u32,
    edge_blur_amount: u32,
    flip_horizontal: bool,
) -> RenderResult<RgbaImage> {
    check_blur(background_blur_amount, "background_blur_amount")?;
    check_blur(edge_blur_amount, "edge_blur_amount")?;
    trace!(
        background_blur_amount,
        edge_blur_amount,
        flip_horizontal,
        "Drawing bokeh effect"
    );

    let background = blurred(image, background_blur_amount);
    let mask = blurred(mask, edge_blur_amount);
    let mut out = image.clone();
    for ((dst, bg), m) in out.pixels_mut().zip(background.pixels()).zip(mask.pixels()) {
        let m = f32::from(m[0]) / 255.0;
        let Rgba(fg) = *dst;
        for c in 0..4 {
            dst[c] = to_u8(f32::from(fg[c]) * m + f32::from(bg[c]) * (1.0 - m));
        }
    }
    if flip_horizontal {
        out = flip_image_horizontal(&out);
    }
    Ok(out)
}

/// Keep the person sharp and blur everything else.
///
/// The background is blurred by `background_blur_amount`; the person mask is
/// blurred by `edge_blur_amount` so the cut-out edge blends in.
pub fn draw_bokeh_effect(
    image: &RgbaImage,
    segmentation: &PersonSegmentation,
    background_blur_amount: u32,
    edge_blur_amount: u32,
    flip_horizontal: bool,
) -> RenderResult<RgbaImage> {
    let dims = segmentation.dimensions();
    check_same_size(image.dimensions(), image_size(dims)?)?;
    let mask = person_mask(dims, [segmentation])?;
    bokeh(
        image,
        &mask,
        background_blur_amount,
        edge_blur_amount,
        flip_horizontal,
    )
}

/// [`draw_bokeh_effect`] keeping every person sharp.
pub fn draw_multi_person_bokeh_effect(
    image: &RgbaImage,
    segmentations: &[PersonSegmentation],
    background_blur_amount: u32,
    edge_blur_amount: u32,
    flip_horizontal: bool,
) -> RenderResult<RgbaImage> {
    let (w, h) = image.dimensions();
    let dims = Dimensions::new(h as usize, w as usize);
    let mask = person_mask(dims, segmentations)?;
    bokeh(
        image,
        &mask,
        background_blur_amount,
        edge_blur_amount,
        flip_horizontal,
    )
}
