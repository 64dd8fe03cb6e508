//! # tattoo-preview
//!
//! A Rust library for scar-aware tattoo preview generation: turns an
//! uploaded photo, a user's crop selection, and optional scar label data
//! into the canvas-sized image and edit-mask pair an AI image-editing model
//! consumes.
//!
//! ## Features
//!
//! - **Scar lookup**: read VOC-style XML annotations recorded against the
//!   original upload, distinguishing "no scar" from broken label data
//! - **Coordinate transforms**: map boxes between original, crop, and
//!   canvas space with one shared scale/offset
//! - **Mask synthesis**: confine edits to the scar region, or open the
//!   whole crop when no scar is present
//! - **Canvas normalization**: aspect-preserving fit of image and mask onto
//!   the fixed generation canvas, pixel-aligned
//! - **Request assembly**: validated, PNG-encoded generation payloads
//!
//! ## Example
//!
//! ```rust,ignore
//! use tattoo_preview::{
//!     CropSelection, Dimensions, PreviewOptions, Rect, ScarStore,
//!     assemble_request, prepare_preview,
//! };
//!
//! let source = image::open("upload.jpg").unwrap().to_rgba8();
//! let crop = CropSelection {
//!     rect: Rect::new(100, 100, 200, 200),
//!     source: Dimensions::new(800, 600),
//! };
//!
//! let store = ScarStore::new("labels");
//! let scar = store.lookup_or_none("upload.jpg");
//!
//! let prepared = prepare_preview(
//!     &source,
//!     &crop,
//!     scar.map(|s| s.bounding_box),
//!     &PreviewOptions::default(),
//! )
//! .unwrap();
//!
//! let request = assemble_request(
//!     "a fine-line rose winding along the forearm",
//!     &prepared.image,
//!     &prepared.mask,
//!     PreviewOptions::default().canvas,
//! )
//! .unwrap();
//! ```

pub mod geometry;
pub mod labels;
pub mod preview;
pub mod request;

// Re-export commonly used items
pub use geometry::{CropSelection, Dimensions, Rect};
pub use labels::{Annotation, LabelError, ScarRecord, ScarStore, parse_annotation, select_scar};
pub use preview::{
    CanvasFit, DEFAULT_CANVAS, EDITABLE, EditMask, NormalizedPair, PRESERVED, PreparedEdit,
    PreviewError, PreviewOptions, prepare_preview, prepare_preview_from_bytes, synthesize_mask,
};
pub use request::{
    GenerationRequest, PersistenceRecord, PromptContext, RequestError, assemble_request,
    mask_to_alpha,
};
