//! Grid labels to full-resolution per-person masks.
//!
//! Each person's grid plane is upsampled to the resized-and-padded input
//! resolution, cropped out of its padding and resampled to the original image.
//! Interpolation blurs neighbouring people into each other at their borders,
//! so every pixel is then given to the single person with the highest weight
//! above one half. The resulting masks never overlap.

use crate::engine::InstanceLabels;
use crate::error::{DecodeError, DecodeResult};
use crate::fields::{ensure_same_grid, PartField};
use crate::transform::{
    remove_padding_and_resize_back, remove_padding_and_resize_back_with, resize_bilinear,
    resize_nearest, Interpolation,
};
use bodypix_core::{Dimensions, Padding, NO_PART};
use ndarray::{Array2, Axis, Zip};
use rayon::prelude::*;
use tracing::trace;

/// Weight a pixel must exceed to belong to a person.
pub const MASK_THRESHOLD: f32 = 0.5;

/// Where the output grid came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskGeometry {
    /// Resized-and-padded network input size
    pub input: Dimensions,
    /// Original image size; every mask has these dimensions
    pub original: Dimensions,
    /// Padding applied while preparing the input
    pub padding: Padding,
}

impl MaskGeometry {
    /// Bundle the preprocessing geometry.
    pub fn new(input: Dimensions, original: Dimensions, padding: Padding) -> Self {
        Self {
            input,
            original,
            padding,
        }
    }
}

/// Binary grid plane of the cells labelled `k`.
pub fn to_person_k_segmentation(labels: &InstanceLabels, k: usize) -> Array2<f32> {
    let k = i32::try_from(k).unwrap_or(i32::MAX);
    labels.view().mapv(|l| if l == k { 1.0 } else { 0.0 })
}

/// Part ids of the cells labelled `k`, [`NO_PART`] elsewhere.
///
/// Computed as `(label == k) * part + ((label == k) - 1)`, which equals
/// `(label == k) * (part + 1) - 1`, so a cell of person `k` whose part is
/// already `-1` stays `-1`.
pub fn to_person_k_part_segmentation(
    labels: &InstanceLabels,
    parts: &PartField,
    k: usize,
) -> DecodeResult<Array2<i32>> {
    ensure_same_grid(labels.grid(), parts.grid())?;
    let k = i32::try_from(k).unwrap_or(i32::MAX);
    Ok(Zip::from(labels.view())
        .and(parts.view())
        .map_collect(|&l, &p| {
            let owned = i32::from(l == k);
            owned * p + (owned - 1)
        }))
}

fn check_geometry(labels: &InstanceLabels, geometry: &MaskGeometry) -> DecodeResult<()> {
    let grid = labels.grid();
    if grid.is_empty() {
        return Err(DecodeError::invalid_input("label grid is empty"));
    }
    geometry.padding.inner(geometry.input)?;
    Ok(())
}

/// Upsample one grid plane and bring it back to the original image.
fn plane_to_original(
    plane: Array2<f32>,
    geometry: &MaskGeometry,
    method: Interpolation,
) -> DecodeResult<Array2<f32>> {
    let plane = plane.insert_axis(Axis(2));
    let upsampled = match method {
        Interpolation::Bilinear => resize_bilinear(plane.view(), geometry.input, true),
        Interpolation::Nearest => resize_nearest(plane.view(), geometry.input, true),
    };
    let restored = match method {
        Interpolation::Bilinear => {
            remove_padding_and_resize_back(upsampled.view(), geometry.original, geometry.padding)?
        }
        Interpolation::Nearest => remove_padding_and_resize_back_with(
            upsampled.view(),
            geometry.original,
            geometry.padding,
            Interpolation::Nearest,
        )?,
    };
    Ok(restored.index_axis_move(Axis(2), 0))
}

/// Owner of every original-resolution pixel, `-1` where nobody exceeds
/// [`MASK_THRESHOLD`]. Ties go to the lower index.
pub(crate) fn pixel_owners(
    labels: &InstanceLabels,
    num_people: usize,
    geometry: &MaskGeometry,
) -> DecodeResult<Array2<i32>> {
    check_geometry(labels, geometry)?;
    let planes = (0..num_people)
        .into_par_iter()
        .map(|k| {
            plane_to_original(
                to_person_k_segmentation(labels, k),
                geometry,
                Interpolation::Bilinear,
            )
        })
        .collect::<DecodeResult<Vec<_>>>()?;

    let original = geometry.original;
    let mut best = Array2::from_elem((original.height, original.width), MASK_THRESHOLD);
    let mut owners = Array2::from_elem((original.height, original.width), -1_i32);
    for (k, plane) in planes.iter().enumerate() {
        let k = i32::try_from(k).unwrap_or(i32::MAX);
        Zip::from(&mut best)
            .and(&mut owners)
            .and(plane)
            .for_each(|b, o, &v| {
                if v > *b {
                    *b = v;
                    *o = k;
                }
            });
    }
    trace!(num_people, "Resolved pixel owners");
    Ok(owners)
}

/// Split an owner plane into one binary mask per person.
pub(crate) fn split_owners(owners: &Array2<i32>, num_people: usize) -> Vec<Array2<u8>> {
    (0..num_people)
        .map(|k| {
            let k = i32::try_from(k).unwrap_or(i32::MAX);
            owners.mapv(|o| u8::from(o == k))
        })
        .collect()
}

/// One original-resolution binary mask per person, in label order.
pub fn materialize_person_masks(
    labels: &InstanceLabels,
    num_people: usize,
    geometry: &MaskGeometry,
) -> DecodeResult<Vec<Array2<u8>>> {
    let owners = pixel_owners(labels, num_people, geometry)?;
    Ok(split_owners(&owners, num_people))
}

/// Part labels of each person's own pixels given an owner plane.
pub(crate) fn part_masks_from_owners(
    labels: &InstanceLabels,
    parts: &PartField,
    owners: &Array2<i32>,
    num_people: usize,
    geometry: &MaskGeometry,
) -> DecodeResult<Vec<Array2<i32>>> {
    (0..num_people)
        .into_par_iter()
        .map(|k| {
            #[allow(clippy::cast_precision_loss)]
            let plane = to_person_k_part_segmentation(labels, parts, k)?.mapv(|p| p as f32);
            let restored = plane_to_original(plane, geometry, Interpolation::Nearest)?;
            let owner = i32::try_from(k).unwrap_or(i32::MAX);
            #[allow(clippy::cast_possible_truncation)]
            let mask = Zip::from(owners).and(&restored).map_collect(|&o, &p| {
                let part = p.round() as i32;
                if o == owner && part >= 0 {
                    part
                } else {
                    NO_PART
                }
            });
            Ok(mask)
        })
        .collect()
}

/// One original-resolution part-label mask per person, in label order.
///
/// A pixel carries a part id only when it belongs to that person and the part
/// field has a part there. Everything else is [`NO_PART`].
pub fn materialize_part_masks(
    labels: &InstanceLabels,
    parts: &PartField,
    num_people: usize,
    geometry: &MaskGeometry,
) -> DecodeResult<Vec<Array2<i32>>> {
    ensure_same_grid(labels.grid(), parts.grid())?;
    let owners = pixel_owners(labels, num_people, geometry)?;
    part_masks_from_owners(labels, parts, &owners, num_people, geometry)
}
