//! Integration tests for the tattoo preview pipeline
//!
//! These tests build deterministic synthetic photos and drive the
//! crop → mask → normalize → assemble chain end to end.

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use tattoo_preview::{
    CropSelection, Dimensions, EDITABLE, PRESERVED, PreviewError, PreviewOptions, Rect,
    RequestError, assemble_request, prepare_preview, prepare_preview_from_bytes,
};

// Helper to create a test image with specific dimensions filled with a color
fn create_solid_image(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    for pixel in img.pixels_mut() {
        *pixel = color;
    }
    img
}

fn selection(rect: Rect, source: &RgbaImage) -> CropSelection {
    CropSelection {
        rect,
        source: Dimensions::new(source.width(), source.height()),
    }
}

fn options(width: u32, height: u32) -> PreviewOptions {
    PreviewOptions {
        canvas: Dimensions::new(width, height),
    }
}

fn count_editable(mask: &tattoo_preview::EditMask) -> usize {
    mask.pixels().filter(|p| p.0[0] == EDITABLE).count()
}

// Color constants
const SKIN: Rgba<u8> = Rgba([222, 184, 162, 255]);

// ============================================================================
// Scar-in-crop scenarios
// ============================================================================

#[test]
fn test_scar_inside_crop_confines_the_mask() {
    let source = create_solid_image(800, 600, SKIN);
    let crop = selection(Rect::new(100, 100, 200, 200), &source);
    let scar = Rect::from_corners(150, 150, 180, 180);

    let prepared = prepare_preview(&source, &crop, Some(scar), &options(512, 512)).unwrap();

    // Image and mask share the canvas grid
    assert_eq!(prepared.image.dimensions(), (512, 512));
    assert_eq!(prepared.mask.dimensions(), (512, 512));

    // Scar lands at crop-relative (50, 50), 30x30
    assert_eq!(prepared.scar_in_crop, Some(Rect::new(50, 50, 30, 30)));

    // A square crop on a square canvas has no padding; scale is 2.56
    assert_eq!(
        prepared.scar_in_canvas,
        Some(Rect::from_corners(128, 128, 205, 205))
    );

    // Editable region exists and does not cover the whole canvas
    let editable = count_editable(&prepared.mask);
    assert!(editable > 0, "mask has no editable pixels");
    assert!(
        editable < 512 * 512,
        "mask is fully editable despite a scar"
    );

    // The canvas-space scar center is editable, a far corner is not
    assert_eq!(prepared.mask.get_pixel(166, 166).0[0], EDITABLE);
    assert_eq!(prepared.mask.get_pixel(500, 500).0[0], PRESERVED);
}

#[test]
fn test_no_scar_makes_the_whole_canvas_editable() {
    let source = create_solid_image(800, 600, SKIN);
    let crop = selection(Rect::new(100, 100, 200, 200), &source);

    let prepared = prepare_preview(&source, &crop, None, &options(512, 512)).unwrap();

    // Square crop fills the square canvas, so every pixel is editable
    assert_eq!(count_editable(&prepared.mask), 512 * 512);
}

#[test]
fn test_disjoint_scar_matches_the_no_scar_mask() {
    let source = create_solid_image(800, 800, SKIN);
    let crop = selection(Rect::new(500, 500, 200, 200), &source);
    let scar = Rect::from_corners(0, 0, 10, 10);

    let with_scar = prepare_preview(&source, &crop, Some(scar), &options(512, 512)).unwrap();
    let without = prepare_preview(&source, &crop, None, &options(512, 512)).unwrap();

    assert_eq!(with_scar.scar_in_crop, None);
    assert_eq!(with_scar.scar_in_canvas, None);
    assert_eq!(with_scar.mask.as_raw(), without.mask.as_raw());
}

#[test]
fn test_scar_touching_the_crop_edge_counts_as_outside() {
    let source = create_solid_image(800, 600, SKIN);
    let crop = selection(Rect::new(100, 100, 200, 200), &source);
    // Scar's xmax is exactly the crop's left edge: zero-width overlap
    let scar = Rect::from_corners(50, 150, 100, 200);

    let prepared = prepare_preview(&source, &crop, Some(scar), &options(512, 512)).unwrap();
    assert_eq!(prepared.scar_in_crop, None);
    assert_eq!(count_editable(&prepared.mask), 512 * 512);
}

#[test]
fn test_preparation_is_deterministic() {
    let source = create_solid_image(800, 600, SKIN);
    let crop = selection(Rect::new(100, 100, 200, 200), &source);
    let scar = Rect::from_corners(150, 150, 180, 180);

    let a = prepare_preview(&source, &crop, Some(scar), &options(512, 512)).unwrap();
    let b = prepare_preview(&source, &crop, Some(scar), &options(512, 512)).unwrap();
    assert_eq!(a.mask.as_raw(), b.mask.as_raw());
    assert_eq!(a.image.as_raw(), b.image.as_raw());
}

// ============================================================================
// Normalization invariants
// ============================================================================

#[test]
fn test_nonsquare_crop_is_padded_not_distorted() {
    let source = create_solid_image(800, 600, SKIN);
    let crop = selection(Rect::new(0, 0, 400, 200), &source);

    let prepared = prepare_preview(&source, &crop, None, &options(512, 512)).unwrap();

    assert_eq!(prepared.image.dimensions(), prepared.mask.dimensions());
    assert_eq!(prepared.fit.scaled, Dimensions::new(512, 256));
    assert_eq!(prepared.fit.offset_y, 128);

    // Top padding row: transparent image, preserved mask
    assert_eq!(prepared.image.get_pixel(256, 10).0[3], 0);
    assert_eq!(prepared.mask.get_pixel(256, 10).0[0], PRESERVED);

    // Content row: opaque image, editable mask (no scar)
    assert_eq!(prepared.image.get_pixel(256, 256).0[3], 255);
    assert_eq!(prepared.mask.get_pixel(256, 256).0[0], EDITABLE);
}

#[test]
fn test_zero_width_crop_is_rejected() {
    let source = create_solid_image(800, 600, SKIN);
    let crop = selection(Rect::new(100, 100, 0, 200), &source);

    assert!(matches!(
        prepare_preview(&source, &crop, None, &options(512, 512)),
        Err(PreviewError::UnsupportedDimensions { .. })
    ));
}

#[test]
fn test_crop_outside_the_source_is_rejected() {
    let source = create_solid_image(800, 600, SKIN);
    let crop = selection(Rect::new(700, 500, 200, 200), &source);

    assert!(matches!(
        prepare_preview(&source, &crop, None, &options(512, 512)),
        Err(PreviewError::CropOutOfBounds { .. })
    ));
}

// ============================================================================
// Decoding entry point
// ============================================================================

#[test]
fn test_prepare_from_encoded_bytes() {
    let source = create_solid_image(320, 240, SKIN);
    let mut bytes = Vec::new();
    source
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();

    let crop = CropSelection {
        rect: Rect::new(40, 40, 100, 100),
        source: Dimensions::new(320, 240),
    };
    let prepared =
        prepare_preview_from_bytes(&bytes, &crop, None, &options(256, 256)).unwrap();
    assert_eq!(prepared.image.dimensions(), (256, 256));
    assert_eq!(prepared.mask.dimensions(), (256, 256));
}

#[test]
fn test_empty_bytes_are_rejected() {
    let crop = CropSelection {
        rect: Rect::new(0, 0, 10, 10),
        source: Dimensions::new(10, 10),
    };
    assert!(matches!(
        prepare_preview_from_bytes(&[], &crop, None, &PreviewOptions::default()),
        Err(PreviewError::EmptyInput)
    ));
}

// ============================================================================
// Request assembly against pipeline output
// ============================================================================

#[test]
fn test_prepared_pair_assembles_into_a_request() {
    let source = create_solid_image(800, 600, SKIN);
    let crop = selection(Rect::new(100, 100, 200, 200), &source);
    let scar = Rect::from_corners(150, 150, 180, 180);
    let canvas = Dimensions::new(512, 512);

    let prepared = prepare_preview(&source, &crop, Some(scar), &options(512, 512)).unwrap();
    let request = assemble_request(
        "a traditional serpent coiling around the scar",
        &prepared.image,
        &prepared.mask,
        canvas,
    )
    .unwrap();

    assert_eq!(request.canvas, canvas);
    assert!(!request.image_png.is_empty());
    assert!(!request.mask_png.is_empty());
}

#[test]
fn test_blank_prompt_never_dispatches() {
    let source = create_solid_image(800, 600, SKIN);
    let crop = selection(Rect::new(100, 100, 200, 200), &source);
    let canvas = Dimensions::new(512, 512);

    let prepared = prepare_preview(&source, &crop, None, &options(512, 512)).unwrap();
    assert!(matches!(
        assemble_request("", &prepared.image, &prepared.mask, canvas),
        Err(RequestError::EmptyPrompt)
    ));
}

#[test]
fn test_wrong_canvas_is_caught_at_the_boundary() {
    let source = create_solid_image(800, 600, SKIN);
    let crop = selection(Rect::new(100, 100, 200, 200), &source);

    let prepared = prepare_preview(&source, &crop, None, &options(512, 512)).unwrap();
    // Claiming a different canvas than the one the pair was built for fails
    assert!(matches!(
        assemble_request(
            "prompt",
            &prepared.image,
            &prepared.mask,
            Dimensions::new(1024, 1024)
        ),
        Err(RequestError::DimensionMismatch { .. })
    ));
}
