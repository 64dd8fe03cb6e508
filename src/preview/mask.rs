//! Edit-mask synthesis.
//!
//! The mask tells the generation model which pixels of the cropped region it
//! may repaint. With no scar in the crop the whole region is fair game; with
//! a scar present, editing is confined to the scar's box so the surrounding
//! skin survives untouched.

use crate::geometry::{Dimensions, Rect};
use image::{GrayImage, Luma};

/// A raster marking which pixels the generation model may alter.
/// Its pixel grid always matches the image buffer it is paired with.
pub type EditMask = GrayImage;

/// Mask value for pixels the model may repaint.
pub const EDITABLE: u8 = 255;

/// Mask value for pixels that must survive generation unchanged.
pub const PRESERVED: u8 = 0;

/// Build the edit mask for a cropped region.
///
/// `scar_in_crop` is the scar's bounding box translated into crop space, or
/// `None` when no scar was recorded or the scar lies outside the crop. The
/// part of the box that overlaps the crop surface becomes editable and
/// everything else is preserved; a box with no positive-area overlap falls
/// back to the fully-editable mask, since a zero-area edit region would make
/// the generation call a no-op.
///
/// The output grid is exactly `crop`-sized; resizing to the generation
/// canvas happens later, together with the image, in [`super::CanvasFit`].
pub fn synthesize_mask(crop: Dimensions, scar_in_crop: Option<Rect>) -> EditMask {
    let editable_region = scar_in_crop.and_then(|scar| scar.intersect(crop.surface()));

    match editable_region {
        None => GrayImage::from_pixel(crop.width, crop.height, Luma([EDITABLE])),
        Some(region) => {
            let mut mask = GrayImage::from_pixel(crop.width, crop.height, Luma([PRESERVED]));
            for y in region.y..region.ymax() {
                for x in region.x..region.xmax() {
                    mask.put_pixel(x as u32, y as u32, Luma([EDITABLE]));
                }
            }
            mask
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_editable(mask: &EditMask) -> usize {
        mask.pixels().filter(|p| p.0[0] == EDITABLE).count()
    }

    #[test]
    fn test_no_scar_is_fully_editable() {
        let mask = synthesize_mask(Dimensions::new(8, 6), None);
        assert_eq!(mask.dimensions(), (8, 6));
        assert_eq!(count_editable(&mask), 48);
    }

    #[test]
    fn test_scar_confines_editable_region() {
        let mask = synthesize_mask(Dimensions::new(10, 10), Some(Rect::new(2, 3, 4, 2)));
        assert_eq!(mask.dimensions(), (10, 10));
        assert_eq!(count_editable(&mask), 8);

        // Inside the scar box
        assert_eq!(mask.get_pixel(2, 3).0[0], EDITABLE);
        assert_eq!(mask.get_pixel(5, 4).0[0], EDITABLE);
        // Just outside it
        assert_eq!(mask.get_pixel(1, 3).0[0], PRESERVED);
        assert_eq!(mask.get_pixel(6, 4).0[0], PRESERVED);
        assert_eq!(mask.get_pixel(2, 5).0[0], PRESERVED);
    }

    #[test]
    fn test_scar_clamped_to_crop_surface() {
        // Box hangs past the right edge; only the overlapping part is editable
        let mask = synthesize_mask(Dimensions::new(10, 10), Some(Rect::new(8, 0, 5, 5)));
        assert_eq!(count_editable(&mask), 10);
        assert_eq!(mask.get_pixel(9, 0).0[0], EDITABLE);
        assert_eq!(mask.get_pixel(7, 0).0[0], PRESERVED);
    }

    #[test]
    fn test_disjoint_scar_falls_back_to_fully_editable() {
        let mask = synthesize_mask(Dimensions::new(10, 10), Some(Rect::new(50, 50, 5, 5)));
        assert_eq!(count_editable(&mask), 100);
    }

    #[test]
    fn test_zero_area_scar_falls_back_to_fully_editable() {
        let mask = synthesize_mask(Dimensions::new(10, 10), Some(Rect::new(4, 4, 0, 6)));
        assert_eq!(count_editable(&mask), 100);
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let a = synthesize_mask(Dimensions::new(32, 24), Some(Rect::new(5, 5, 10, 8)));
        let b = synthesize_mask(Dimensions::new(32, 24), Some(Rect::new(5, 5, 10, 8)));
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
