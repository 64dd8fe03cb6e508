//! Tattoo preview pipeline.
//!
//! Turns an uploaded photo, a crop selection, and an optional scar location
//! into the canvas-sized image/mask pair a generation call needs:
//!
//! 1. Validate the crop against the source image
//! 2. Cut the cropped region out of the source
//! 3. Translate the scar box into crop space and intersect it with the crop
//! 4. Synthesize the edit mask for the cropped region
//! 5. Fit image and mask onto the generation canvas with one shared
//!    scale/offset, and project the scar box with the same fit

mod canvas;
mod mask;

pub use canvas::{CanvasFit, NormalizedPair};
pub use mask::{EDITABLE, EditMask, PRESERVED, synthesize_mask};

use crate::geometry::{CropSelection, Dimensions, Rect};
use image::{ImageReader, RgbaImage, imageops};
use std::io::Cursor;

/// Canvas size of the generation model.
pub const DEFAULT_CANVAS: Dimensions = Dimensions::new(1024, 1024);

/// Options for preview preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Target canvas the generation model expects.
    pub canvas: Dimensions,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            canvas: DEFAULT_CANVAS,
        }
    }
}

/// Errors raised while preparing a preview.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// A surface (crop or canvas) has a zero extent.
    #[error("unsupported surface dimensions {width}x{height}")]
    UnsupportedDimensions { width: u32, height: u32 },

    /// The crop rectangle reaches outside the source image.
    #[error("crop {crop:?} does not fit inside the {src:?} source image")]
    CropOutOfBounds { crop: Rect, src: Dimensions },

    /// Image and mask grids differ; the pair must never be processed.
    #[error("image dimensions {image:?} and mask dimensions {mask:?} differ")]
    BufferMismatch { image: Dimensions, mask: Dimensions },

    /// A buffer does not match the surface its fit was computed for.
    #[error("buffer is {actual:?} but the fit was computed for {expected:?}")]
    SurfaceMismatch {
        expected: Dimensions,
        actual: Dimensions,
    },
}

/// Everything a generation call needs, fully prepared and validated.
#[derive(Debug, Clone)]
pub struct PreparedEdit {
    /// Canvas-sized image (aspect-preserved, transparent padding).
    pub image: RgbaImage,
    /// Canvas-sized edit mask, pixel-aligned with `image`.
    pub mask: EditMask,
    /// Scar box in crop space, if one overlaps the crop.
    pub scar_in_crop: Option<Rect>,
    /// The same box projected onto the canvas.
    pub scar_in_canvas: Option<Rect>,
    /// The fit used for both buffers and the projection.
    pub fit: CanvasFit,
}

/// Prepare the canvas-sized image/mask pair for a generation call.
///
/// `scar` is the scar's bounding box in original-image coordinates, if one
/// was recorded for this upload. A scar that does not overlap the crop is
/// treated the same as no scar at all.
pub fn prepare_preview(
    source: &RgbaImage,
    crop: &CropSelection,
    scar: Option<Rect>,
    options: &PreviewOptions,
) -> Result<PreparedEdit, PreviewError> {
    if crop.rect.width <= 0 || crop.rect.height <= 0 {
        return Err(PreviewError::UnsupportedDimensions {
            width: crop.rect.width.max(0) as u32,
            height: crop.rect.height.max(0) as u32,
        });
    }

    let (source_width, source_height) = source.dimensions();
    let actual = Dimensions::new(source_width, source_height);
    if crop.source != actual {
        log::warn!(
            "crop selection declares a {}x{} source but the decoded image is {}x{}",
            crop.source.width,
            crop.source.height,
            actual.width,
            actual.height
        );
    }
    if !crop.rect.fits_within(actual) {
        return Err(PreviewError::CropOutOfBounds {
            crop: crop.rect,
            src: actual,
        });
    }

    let cropped = imageops::crop_imm(
        source,
        crop.rect.x as u32,
        crop.rect.y as u32,
        crop.rect.width as u32,
        crop.rect.height as u32,
    )
    .to_image();
    let crop_dims = Dimensions::new(crop.rect.width as u32, crop.rect.height as u32);

    let scar_in_crop =
        scar.and_then(|s| s.to_crop_space(crop.rect).intersect(crop_dims.surface()));
    if scar.is_some() {
        log::debug!(
            "scar {} the cropped region",
            if scar_in_crop.is_some() {
                "overlaps"
            } else {
                "does not overlap"
            }
        );
    }

    let mask = synthesize_mask(crop_dims, scar_in_crop);
    let fit = CanvasFit::compute(crop_dims, options.canvas)?;
    let pair = fit.apply(&cropped, &mask)?;
    let scar_in_canvas = scar_in_crop.map(|r| fit.project(r));

    log::debug!(
        "fitted {}x{} crop onto {}x{} canvas (scale {:.4}, offset {},{})",
        crop_dims.width,
        crop_dims.height,
        options.canvas.width,
        options.canvas.height,
        fit.scale,
        fit.offset_x,
        fit.offset_y
    );

    Ok(PreparedEdit {
        image: pair.image,
        mask: pair.mask,
        scar_in_crop,
        scar_in_canvas,
        fit,
    })
}

/// Prepare a preview from encoded image bytes.
pub fn prepare_preview_from_bytes(
    image_bytes: &[u8],
    crop: &CropSelection,
    scar: Option<Rect>,
    options: &PreviewOptions,
) -> Result<PreparedEdit, PreviewError> {
    if image_bytes.is_empty() {
        return Err(PreviewError::EmptyInput);
    }

    let decoded = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;

    prepare_preview(&decoded.to_rgba8(), crop, scar, options)
}
