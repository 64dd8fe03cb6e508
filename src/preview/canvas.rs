//! Canvas normalization.
//!
//! The generation model works on a fixed-size canvas, while crops arrive at
//! whatever size the user selected. [`CanvasFit`] captures the uniform scale
//! and centered padding that map one onto the other, computed once per
//! request and then shared by every consumer: the image resize, the mask
//! resize, and the projection of scar boxes into canvas coordinates. Reusing
//! the one fit value is what keeps image and mask pixel-aligned.

use super::PreviewError;
use super::mask::{EditMask, PRESERVED};
use crate::geometry::{Dimensions, Rect};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, Rgba, RgbaImage};

/// Uniform scale and centered padding fitting a source surface onto the
/// generation canvas without distorting its aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasFit {
    /// Surface the fit was computed for.
    pub source: Dimensions,
    /// Target canvas.
    pub canvas: Dimensions,
    /// Size of the scaled content inside the canvas.
    pub scaled: Dimensions,
    /// Uniform scale factor applied to both axes.
    pub scale: f64,
    /// Left padding of the scaled content.
    pub offset_x: u32,
    /// Top padding of the scaled content.
    pub offset_y: u32,
}

/// A canvas-sized image with its pixel-aligned edit mask.
#[derive(Debug, Clone)]
pub struct NormalizedPair {
    pub image: RgbaImage,
    pub mask: EditMask,
}

impl CanvasFit {
    /// Compute the fit of a source surface onto a canvas.
    ///
    /// The scale factor is `min(canvas.w / source.w, canvas.h / source.h)`:
    /// the content fills the canvas along one axis and is centered with
    /// padding along the other. Degenerate source or canvas extents are
    /// rejected.
    pub fn compute(source: Dimensions, canvas: Dimensions) -> Result<CanvasFit, PreviewError> {
        if source.width == 0 || source.height == 0 {
            return Err(PreviewError::UnsupportedDimensions {
                width: source.width,
                height: source.height,
            });
        }
        if canvas.width == 0 || canvas.height == 0 {
            return Err(PreviewError::UnsupportedDimensions {
                width: canvas.width,
                height: canvas.height,
            });
        }

        let scale = (f64::from(canvas.width) / f64::from(source.width))
            .min(f64::from(canvas.height) / f64::from(source.height));

        // Round the scaled size once; every later consumer works from these
        // shared values rather than rescaling on its own.
        let scaled_width =
            ((f64::from(source.width) * scale).round() as u32).clamp(1, canvas.width);
        let scaled_height =
            ((f64::from(source.height) * scale).round() as u32).clamp(1, canvas.height);

        Ok(CanvasFit {
            source,
            canvas,
            scaled: Dimensions::new(scaled_width, scaled_height),
            scale,
            offset_x: (canvas.width - scaled_width) / 2,
            offset_y: (canvas.height - scaled_height) / 2,
        })
    }

    /// Map a crop-space rectangle onto the canvas with this fit.
    pub fn project(&self, rect: Rect) -> Rect {
        let scale = |v: i32| (f64::from(v) * self.scale).round() as i32;
        Rect::from_corners(
            scale(rect.x) + self.offset_x as i32,
            scale(rect.y) + self.offset_y as i32,
            scale(rect.xmax()) + self.offset_x as i32,
            scale(rect.ymax()) + self.offset_y as i32,
        )
    }

    /// Resize an image and its edit mask onto the canvas together.
    ///
    /// Both buffers are resized to the same pre-computed size and pasted at
    /// the same pre-computed offsets. Image padding is fully transparent;
    /// mask padding is preserved (non-editable), since padding is not part
    /// of the user's image content. The image is resampled with Lanczos,
    /// the mask with nearest-neighbour so it stays binary.
    pub fn apply(
        &self,
        image: &RgbaImage,
        mask: &EditMask,
    ) -> Result<NormalizedPair, PreviewError> {
        if image.dimensions() != mask.dimensions() {
            let (iw, ih) = image.dimensions();
            let (mw, mh) = mask.dimensions();
            return Err(PreviewError::BufferMismatch {
                image: Dimensions::new(iw, ih),
                mask: Dimensions::new(mw, mh),
            });
        }
        let (width, height) = image.dimensions();
        if (width, height) != (self.source.width, self.source.height) {
            return Err(PreviewError::SurfaceMismatch {
                expected: self.source,
                actual: Dimensions::new(width, height),
            });
        }

        let scaled_image = imageops::resize(
            image,
            self.scaled.width,
            self.scaled.height,
            FilterType::Lanczos3,
        );
        let scaled_mask = imageops::resize(
            mask,
            self.scaled.width,
            self.scaled.height,
            FilterType::Nearest,
        );

        let mut canvas_image =
            RgbaImage::from_pixel(self.canvas.width, self.canvas.height, Rgba([0, 0, 0, 0]));
        let mut canvas_mask =
            GrayImage::from_pixel(self.canvas.width, self.canvas.height, Luma([PRESERVED]));

        imageops::replace(
            &mut canvas_image,
            &scaled_image,
            i64::from(self.offset_x),
            i64::from(self.offset_y),
        );
        imageops::replace(
            &mut canvas_mask,
            &scaled_mask,
            i64::from(self.offset_x),
            i64::from(self.offset_y),
        );

        Ok(NormalizedPair {
            image: canvas_image,
            mask: canvas_mask,
        })
    }
}
