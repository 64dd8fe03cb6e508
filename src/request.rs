//! Generation-request assembly.
//!
//! The last stop before the external image-generation call: re-checks the
//! buffer/canvas invariants, encodes the PNG payloads, and carries the
//! serializable records handed to the prompt-generation and persistence
//! collaborators. Nothing here performs network I/O; callers dispatch the
//! assembled values themselves.

use crate::geometry::{Dimensions, Rect};
use crate::preview::EditMask;
use image::{ImageFormat, Rgba, RgbaImage};
use serde::Serialize;
use std::io::Cursor;

/// Errors raised by the final consistency checks before dispatch.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("prompt text is empty")]
    EmptyPrompt,

    /// A buffer does not match the canvas. The request is never repaired by
    /// truncating or padding; the pipeline that produced it is at fault.
    #[error("{buffer} buffer is {actual:?} but the canvas is {expected:?}")]
    DimensionMismatch {
        buffer: &'static str,
        expected: Dimensions,
        actual: Dimensions,
    },

    #[error("failed to encode {buffer} PNG: {source}")]
    Encode {
        buffer: &'static str,
        source: image::ImageError,
    },
}

/// The payload handed to the image-generation collaborator.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Canvas-sized RGBA PNG.
    pub image_png: Vec<u8>,
    /// Canvas-sized RGBA PNG; transparent pixels mark the editable region.
    pub mask_png: Vec<u8>,
    pub canvas: Dimensions,
}

/// Metadata handed to the prompt-generation collaborator.
///
/// `scar_in_crop` is relative to the cropped section the model will edit,
/// so the prompt can reference the scar's position inside the edited area.
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    pub style: String,
    pub skin_tone: String,
    /// The user's crop selection in original-image coordinates.
    pub crop: Rect,
    pub scar_in_crop: Option<Rect>,
}

impl PromptContext {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// The record handed to the persistence collaborator after generation.
#[derive(Debug, Clone, Serialize)]
pub struct PersistenceRecord {
    pub prompt: String,
    pub image_url: String,
    pub crop: Rect,
    pub original_filename: String,
}

impl PersistenceRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Assemble and validate a generation request.
///
/// Both buffers must already be canvas-sized; this re-asserts the
/// image/mask alignment invariant at the boundary instead of trusting the
/// pipeline, and names the offending buffer when it fails.
pub fn assemble_request(
    prompt: &str,
    image: &RgbaImage,
    mask: &EditMask,
    canvas: Dimensions,
) -> Result<GenerationRequest, RequestError> {
    if prompt.trim().is_empty() {
        return Err(RequestError::EmptyPrompt);
    }
    check_canvas_sized("image", image.dimensions(), canvas)?;
    check_canvas_sized("mask", mask.dimensions(), canvas)?;

    let image_png = encode_png("image", image)?;
    let mask_png = encode_png("mask", &mask_to_alpha(mask))?;

    Ok(GenerationRequest {
        prompt: prompt.to_string(),
        image_png,
        mask_png,
        canvas,
    })
}

/// Convert a grayscale edit mask to the wire convention: editable pixels
/// become fully transparent, preserved pixels fully opaque.
pub fn mask_to_alpha(mask: &EditMask) -> RgbaImage {
    let mut out = RgbaImage::new(mask.width(), mask.height());
    for (x, y, pixel) in mask.enumerate_pixels() {
        out.put_pixel(x, y, Rgba([0, 0, 0, 255 - pixel.0[0]]));
    }
    out
}

fn check_canvas_sized(
    buffer: &'static str,
    dims: (u32, u32),
    canvas: Dimensions,
) -> Result<(), RequestError> {
    if dims != (canvas.width, canvas.height) {
        return Err(RequestError::DimensionMismatch {
            buffer,
            expected: canvas,
            actual: Dimensions::new(dims.0, dims.1),
        });
    }
    Ok(())
}

fn encode_png(buffer: &'static str, image: &RgbaImage) -> Result<Vec<u8>, RequestError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|source| RequestError::Encode { buffer, source })?;
    Ok(bytes)
}
