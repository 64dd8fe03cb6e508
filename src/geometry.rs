//! Pixel-space geometry shared by every pipeline stage.
//!
//! Rectangles travel through three reference frames on their way to the
//! generation canvas: the uploaded image (original space), the user's crop
//! selection (crop space, origin at the crop's top-left corner), and the
//! fixed-size generation canvas. All values here are immutable; a transform
//! always produces a new rectangle.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in integer pixel coordinates.
///
/// The frame a rectangle lives in (original, crop, canvas) is carried by the
/// function signatures that produce and consume it, not by the type itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from corner coordinates (max edges exclusive).
    pub fn from_corners(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            x: xmin,
            y: ymin,
            width: xmax - xmin,
            height: ymax - ymin,
        }
    }

    /// Right edge (exclusive).
    pub fn xmax(&self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    pub fn ymax(&self) -> i32 {
        self.y + self.height
    }

    /// Area in square pixels. Degenerate extents yield 0.
    pub fn area(&self) -> i64 {
        if self.width <= 0 || self.height <= 0 {
            0
        } else {
            i64::from(self.width) * i64::from(self.height)
        }
    }

    /// Translate into the frame whose origin is `crop`'s top-left corner.
    ///
    /// No clamping: the result may carry negative coordinates or extend past
    /// the crop. Intersect with the crop surface before using it as a pixel
    /// region.
    pub fn to_crop_space(&self, crop: Rect) -> Rect {
        Rect {
            x: self.x - crop.x,
            y: self.y - crop.y,
            ..*self
        }
    }

    /// Intersection with another rectangle.
    ///
    /// Overlaps of zero width or zero height count as no overlap, so a box
    /// that merely touches an edge returns `None`.
    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let xmin = self.x.max(other.x);
        let ymin = self.y.max(other.y);
        let xmax = self.xmax().min(other.xmax());
        let ymax = self.ymax().min(other.ymax());

        if xmin >= xmax || ymin >= ymax {
            return None;
        }
        Some(Rect::from_corners(xmin, ymin, xmax, ymax))
    }

    /// Whether the rectangle is well-formed and lies entirely inside a
    /// surface of the given size anchored at the origin.
    pub fn fits_within(&self, dims: Dimensions) -> bool {
        self.width > 0
            && self.height > 0
            && self.x >= 0
            && self.y >= 0
            && self.xmax() <= dims.width as i32
            && self.ymax() <= dims.height as i32
    }
}

/// Width and height of a raster surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The full surface as a rectangle anchored at the origin.
    pub fn surface(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }
}

/// The crop the user selected on the uploaded image, as handed over by the
/// crop widget: the selected rectangle plus the source image's pixel size,
/// both in original-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropSelection {
    pub rect: Rect,
    pub source: Dimensions,
}
