//! Segmentation results to RGBA images.
//!
//! Mask images are black with alpha carrying the mask; colored part images
//! paint each part id with its palette entry and leave non-part pixels
//! transparent white.

use crate::error::{RenderError, RenderResult};
use bodypix_core::{Dimensions, PartSegmentation, PersonSegmentation};
use image::{Rgba, RgbaImage};

/// An RGB palette entry.
pub type Rgb = [u8; 3];

/// Pixel written where no part applies.
pub const TRANSPARENT_WHITE: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Default palette, one entry per body-part channel.
pub const RAINBOW_PART_COLORS: [Rgb; 24] = [
    [110, 64, 170],
    [143, 61, 178],
    [178, 60, 178],
    [210, 62, 167],
    [238, 67, 149],
    [255, 78, 125],
    [255, 94, 99],
    [255, 115, 75],
    [255, 140, 56],
    [239, 167, 47],
    [217, 194, 49],
    [194, 219, 64],
    [175, 240, 91],
    [135, 245, 87],
    [96, 247, 96],
    [64, 243, 115],
    [40, 234, 141],
    [28, 219, 169],
    [26, 199, 194],
    [33, 176, 213],
    [47, 150, 224],
    [65, 125, 224],
    [84, 101, 214],
    [99, 81, 195],
];

pub(crate) fn image_size(dims: Dimensions) -> RenderResult<(u32, u32)> {
    let w = u32::try_from(dims.width)
        .map_err(|_| RenderError::invalid_argument("width does not fit in u32"))?;
    let h = u32::try_from(dims.height)
        .map_err(|_| RenderError::invalid_argument("height does not fit in u32"))?;
    Ok((w, h))
}

fn mask_pixels(mask_background: bool) -> (Rgba<u8>, Rgba<u8>) {
    // (person, background)
    if mask_background {
        (Rgba([0, 0, 0, 0]), Rgba([0, 0, 0, 255]))
    } else {
        (Rgba([0, 0, 0, 255]), Rgba([0, 0, 0, 0]))
    }
}

fn from_fn<F>(dims: Dimensions, f: F) -> RenderResult<RgbaImage>
where
    F: Fn(usize) -> Rgba<u8>,
{
    let (w, h) = image_size(dims)?;
    Ok(RgbaImage::from_fn(w, h, |x, y| {
        f(y as usize * dims.width + x as usize)
    }))
}

/// Black mask over the background (or over the person when
/// `mask_background` is false).
pub fn to_mask_image(
    segmentation: &PersonSegmentation,
    mask_background: bool,
) -> RenderResult<RgbaImage> {
    let (person, background) = mask_pixels(mask_background);
    from_fn(segmentation.dimensions(), |i| {
        if segmentation.data[i] == 1 {
            person
        } else {
            background
        }
    })
}

fn common_dimensions<I>(mut dims: I) -> RenderResult<Dimensions>
where
    I: Iterator<Item = Dimensions>,
{
    let first = dims
        .next()
        .ok_or_else(|| RenderError::invalid_argument("no segmentations given"))?;
    for d in dims {
        if d != first {
            return Err(RenderError::dimension_mismatch(
                image_size(first)?,
                image_size(d)?,
            ));
        }
    }
    Ok(first)
}

/// Like [`to_mask_image`] with a pixel counting as person when any
/// segmentation covers it.
pub fn to_multi_person_mask_image(
    segmentations: &[PersonSegmentation],
    mask_background: bool,
) -> RenderResult<RgbaImage> {
    let dims = common_dimensions(segmentations.iter().map(PersonSegmentation::dimensions))?;
    let (person, background) = mask_pixels(mask_background);
    from_fn(dims, |i| {
        if segmentations.iter().any(|s| s.data[i] == 1) {
            person
        } else {
            background
        }
    })
}

fn part_pixel(part: i32, colors: &[Rgb]) -> Rgba<u8> {
    usize::try_from(part)
        .ok()
        .and_then(|p| colors.get(p))
        .map_or(TRANSPARENT_WHITE, |&[r, g, b]| Rgba([r, g, b, 255]))
}

/// Paint each part id with `colors[id]`.
pub fn to_colored_part_image(
    segmentation: &PartSegmentation,
    colors: &[Rgb],
) -> RenderResult<RgbaImage> {
    from_fn(segmentation.dimensions(), |i| {
        part_pixel(segmentation.data[i], colors)
    })
}

/// Paint every person's parts into one image. Where part masks overlap the
/// first segmentation with a part wins.
pub fn to_multi_person_colored_part_image(
    segmentations: &[PartSegmentation],
    colors: &[Rgb],
) -> RenderResult<RgbaImage> {
    let dims = common_dimensions(segmentations.iter().map(PartSegmentation::dimensions))?;
    from_fn(dims, |i| {
        segmentations
            .iter()
            .map(|s| s.data[i])
            .find(|&p| p >= 0)
            .map_or(TRANSPARENT_WHITE, |p| part_pixel(p, colors))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(data: Vec<u8>) -> PersonSegmentation {
        PersonSegmentation::new(data, Dimensions::new(2, 2), None).unwrap()
    }

    #[test]
    fn test_mask_image_background() {
        let seg = person(vec![1, 0, 0, 1]);
        let img = to_mask_image(&seg, true).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([0, 0, 0, 255]));

        let img = to_mask_image(&seg, false).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        assert_eq!(img.get_pixel(0, 1), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_multi_person_union() {
        let segs = [person(vec![1, 0, 0, 0]), person(vec![0, 0, 0, 1])];
        let img = to_multi_person_mask_image(&segs, true).unwrap();
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(img.get_pixel(1, 1)[3], 0);
        assert_eq!(img.get_pixel(1, 0)[3], 255);

        assert!(matches!(
            to_multi_person_mask_image(&[], true),
            Err(RenderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_multi_person_size_mismatch() {
        let wide = PersonSegmentation::new(vec![0; 6], Dimensions::new(2, 3), None).unwrap();
        assert!(matches!(
            to_multi_person_mask_image(&[person(vec![0; 4]), wide], false),
            Err(RenderError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_colored_parts() {
        let seg = PartSegmentation::new(vec![0, -1, 23, 5], Dimensions::new(2, 2), None).unwrap();
        let img = to_colored_part_image(&seg, &RAINBOW_PART_COLORS).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgba([110, 64, 170, 255]));
        assert_eq!(img.get_pixel(1, 0), &TRANSPARENT_WHITE);
        assert_eq!(img.get_pixel(0, 1), &Rgba([99, 81, 195, 255]));

        // ids beyond the palette stay transparent
        let img = to_colored_part_image(&seg, &RAINBOW_PART_COLORS[..3]).unwrap();
        assert_eq!(img.get_pixel(0, 1), &TRANSPARENT_WHITE);
    }

    #[test]
    fn test_multi_person_colored_parts() {
        let dims = Dimensions::new(1, 3);
        let a = PartSegmentation::new(vec![2, -1, -1], dims, None).unwrap();
        let b = PartSegmentation::new(vec![4, 7, -1], dims, None).unwrap();
        let img = to_multi_person_colored_part_image(&[a, b], &RAINBOW_PART_COLORS).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgba([178, 60, 178, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([255, 115, 75, 255]));
        assert_eq!(img.get_pixel(2, 0), &TRANSPARENT_WHITE);
    }
}
