//! # BodyPix Render
//!
//! RGBA composition of decoded segmentations: mask images, colored part maps,
//! mask overlays, pixelation and background bokeh. Inputs and outputs are
//! [`image::RgbaImage`] buffers; putting them on screen is left to the caller.
//!
//! ## Example
//!
//! ```rust
//! use bodypix_core::{Dimensions, PersonSegmentation};
//! use bodypix_render::{draw_mask, to_mask_image};
//! use image::{Rgba, RgbaImage};
//!
//! let segmentation =
//!     PersonSegmentation::new(vec![1, 0, 0, 1], Dimensions::new(2, 2), None)?;
//! let mask = to_mask_image(&segmentation, true)?;
//! let frame = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
//! let out = draw_mask(&frame, &mask, 0.7, 0, false)?;
//! assert_eq!(out.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod composite;
pub mod error;
pub mod mask;

// Re-exports for convenience
pub use composite::{
    draw_bokeh_effect, draw_mask, draw_multi_person_bokeh_effect, draw_pixelated_mask,
    flip_image_horizontal, DEFAULT_BACKGROUND_BLUR_AMOUNT, DEFAULT_EDGE_BLUR_AMOUNT,
    DEFAULT_MASK_OPACITY, DEFAULT_PIXEL_CELL_WIDTH, MAX_BLUR_AMOUNT,
};
pub use error::{RenderError, RenderResult};
pub use mask::{
    to_colored_part_image, to_mask_image, to_multi_person_colored_part_image,
    to_multi_person_mask_image, Rgb, RAINBOW_PART_COLORS, TRANSPARENT_WHITE,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
