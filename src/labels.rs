//! Scar annotation store.
//!
//! Scar locations are recorded offline against the original upload as
//! VOC-style XML annotation files, one per image, named after the image
//! file's stem:
//!
//! ```xml
//! <annotation>
//!     <filename>arm.jpg</filename>
//!     <size><width>800</width><height>600</height></size>
//!     <object>
//!         <name>scar</name>
//!         <bndbox>
//!             <xmin>150</xmin><ymin>150</ymin>
//!             <xmax>180</xmax><ymax>180</ymax>
//!         </bndbox>
//!     </object>
//! </annotation>
//! ```
//!
//! A missing annotation file means "no scar recorded" and is not an error.
//! An annotation that exists but cannot be read or parsed is an error, so
//! callers can tell a label-data problem apart from the expected no-scar
//! state. [`ScarStore::lookup_or_none`] degrades the error case to the
//! no-scar path after logging it.

use crate::geometry::{Dimensions, Rect};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Object label that marks a scar in the annotation data.
pub const SCAR_LABEL: &str = "scar";

/// Errors raised by annotation parsing and lookup.
///
/// None of these cover a *missing* annotation file; that is the expected
/// no-scar state and surfaces as `Ok(None)` from [`ScarStore::lookup`].
#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("failed to read annotation file: {0}")]
    Read(#[from] io::Error),
    #[error("malformed annotation XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid annotation data: {0}")]
    InvalidBox(String),
}

/// One labeled object inside an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledObject {
    pub name: String,
    /// Bounding box in original-image pixel coordinates.
    pub bounding_box: Rect,
}

/// A parsed annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub filename: String,
    /// Pixel size of the annotated image, when the file declares it.
    pub size: Option<Dimensions>,
    pub objects: Vec<LabeledObject>,
}

/// A scar looked up for one image, in original-image coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScarRecord {
    pub image_id: String,
    pub bounding_box: Rect,
}

/// Parse an annotation XML string.
pub fn parse_annotation(xml: &str) -> Result<Annotation, LabelError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut annotation = Annotation {
        filename: String::new(),
        size: None,
        objects: Vec::new(),
    };

    let mut buf = Vec::new();
    let mut current_tag = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name();
                let name = std::str::from_utf8(name_bytes.as_ref()).unwrap_or("");
                match name {
                    "size" => annotation.size = Some(parse_size_inner(&mut reader)?),
                    "object" => annotation.objects.push(parse_object_inner(&mut reader)?),
                    _ => current_tag = name.to_string(),
                }
            }
            Ok(Event::Text(ref e)) => {
                if current_tag == "filename" {
                    annotation.filename = String::from_utf8_lossy(e.as_ref()).to_string();
                }
            }
            Ok(Event::End(_)) => {
                current_tag.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(LabelError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    validate_annotation(&annotation)?;
    Ok(annotation)
}

/// Parse the contents of a `<size>` element.
fn parse_size_inner(reader: &mut Reader<&[u8]>) -> Result<Dimensions, LabelError> {
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;

    let mut buf = Vec::new();
    let mut depth = 1;
    let mut current_tag = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let tag_bytes = e.name();
                current_tag = std::str::from_utf8(tag_bytes.as_ref())
                    .unwrap_or("")
                    .to_string();
            }
            Ok(Event::Text(ref e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                match current_tag.as_str() {
                    "width" => width = Some(parse_pixel_value("size width", &text)?),
                    "height" => height = Some(parse_pixel_value("size height", &text)?),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                depth -= 1;
                current_tag.clear();
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(LabelError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    match (width, height) {
        (Some(width), Some(height)) => Ok(Dimensions::new(width, height)),
        _ => Err(LabelError::InvalidBox(
            "size element is missing width or height".to_string(),
        )),
    }
}

/// Parse the contents of an `<object>` element.
fn parse_object_inner(reader: &mut Reader<&[u8]>) -> Result<LabeledObject, LabelError> {
    let mut name = String::new();
    let mut bounding_box: Option<Rect> = None;

    let mut buf = Vec::new();
    let mut depth = 1;
    let mut current_tag = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let tag_bytes = e.name();
                let tag = std::str::from_utf8(tag_bytes.as_ref()).unwrap_or("");
                if tag == "bndbox" {
                    bounding_box = Some(parse_bndbox_inner(reader)?);
                } else {
                    depth += 1;
                    current_tag = tag.to_string();
                }
            }
            Ok(Event::Text(ref e)) => {
                if current_tag == "name" {
                    name = String::from_utf8_lossy(e.as_ref()).to_string();
                }
            }
            Ok(Event::End(_)) => {
                depth -= 1;
                current_tag.clear();
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(LabelError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    let bounding_box = bounding_box.ok_or_else(|| {
        LabelError::InvalidBox(format!("object '{}' has no bndbox element", name))
    })?;

    Ok(LabeledObject { name, bounding_box })
}

/// Parse the contents of a `<bndbox>` element into a rectangle.
fn parse_bndbox_inner(reader: &mut Reader<&[u8]>) -> Result<Rect, LabelError> {
    let mut xmin: Option<i32> = None;
    let mut ymin: Option<i32> = None;
    let mut xmax: Option<i32> = None;
    let mut ymax: Option<i32> = None;

    let mut buf = Vec::new();
    let mut depth = 1;
    let mut current_tag = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let tag_bytes = e.name();
                current_tag = std::str::from_utf8(tag_bytes.as_ref())
                    .unwrap_or("")
                    .to_string();
            }
            Ok(Event::Text(ref e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).to_string();
                match current_tag.as_str() {
                    "xmin" => xmin = Some(parse_pixel_value("bndbox xmin", &text)?),
                    "ymin" => ymin = Some(parse_pixel_value("bndbox ymin", &text)?),
                    "xmax" => xmax = Some(parse_pixel_value("bndbox xmax", &text)?),
                    "ymax" => ymax = Some(parse_pixel_value("bndbox ymax", &text)?),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                depth -= 1;
                current_tag.clear();
                if depth == 0 {
                    break;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(LabelError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    match (xmin, ymin, xmax, ymax) {
        (Some(xmin), Some(ymin), Some(xmax), Some(ymax)) => {
            Ok(Rect::from_corners(xmin, ymin, xmax, ymax))
        }
        _ => Err(LabelError::InvalidBox(
            "bndbox is missing one of xmin/ymin/xmax/ymax".to_string(),
        )),
    }
}

fn parse_pixel_value<T: std::str::FromStr>(field: &str, text: &str) -> Result<T, LabelError> {
    text.trim()
        .parse()
        .map_err(|_| LabelError::InvalidBox(format!("{} is not a pixel value: '{}'", field, text)))
}

/// Reject annotations whose boxes cannot describe a region of the image.
fn validate_annotation(annotation: &Annotation) -> Result<(), LabelError> {
    for obj in &annotation.objects {
        let bb = obj.bounding_box;
        if bb.width <= 0 || bb.height <= 0 {
            return Err(LabelError::InvalidBox(format!(
                "object '{}' has a degenerate box ({}x{})",
                obj.name, bb.width, bb.height
            )));
        }
        if bb.x < 0 || bb.y < 0 {
            return Err(LabelError::InvalidBox(format!(
                "object '{}' box has a negative origin ({}, {})",
                obj.name, bb.x, bb.y
            )));
        }
        if let Some(size) = annotation.size
            && !bb.fits_within(size)
        {
            return Err(LabelError::InvalidBox(format!(
                "object '{}' box exceeds the declared {}x{} image size",
                obj.name, size.width, size.height
            )));
        }
    }
    Ok(())
}

/// Pick the scar object an annotation describes.
///
/// When several objects are labeled `"scar"`, the largest box wins; equal
/// areas fall back to document order. The result never depends on how the
/// labeling tool happened to order its output.
pub fn select_scar(annotation: &Annotation) -> Option<&LabeledObject> {
    annotation
        .objects
        .iter()
        .filter(|obj| obj.name == SCAR_LABEL)
        .fold(None, |best: Option<&LabeledObject>, obj| match best {
            Some(b) if b.bounding_box.area() >= obj.bounding_box.area() => Some(b),
            _ => Some(obj),
        })
}

/// Directory of per-image annotation files.
#[derive(Debug, Clone)]
pub struct ScarStore {
    root: PathBuf,
}

impl ScarStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Expected annotation path for an image id (doesn't check existence).
    pub fn annotation_path(&self, image_id: &str) -> PathBuf {
        let stem = Path::new(image_id)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| image_id.to_string());
        self.root.join(format!("{}.xml", stem))
    }

    /// Look up the scar recorded for an image.
    ///
    /// Returns `Ok(None)` when no annotation file exists or the annotation
    /// contains no scar object. Unreadable or malformed label data is an
    /// error, distinct from the no-scar state.
    pub fn lookup(&self, image_id: &str) -> Result<Option<ScarRecord>, LabelError> {
        let path = self.annotation_path(image_id);
        let xml = match fs::read_to_string(&path) {
            Ok(xml) => xml,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(LabelError::Read(err)),
        };

        let annotation = parse_annotation(&xml)?;
        Ok(select_scar(&annotation).map(|obj| ScarRecord {
            image_id: image_id.to_string(),
            bounding_box: obj.bounding_box,
        }))
    }

    /// Look up a scar, degrading label-data errors to the no-scar state.
    ///
    /// A broken annotation must never block preview generation, but it is
    /// logged so the label data can be fixed.
    pub fn lookup_or_none(&self, image_id: &str) -> Option<ScarRecord> {
        match self.lookup(image_id) {
            Ok(record) => record,
            Err(err) => {
                log::warn!(
                    "scar annotation for '{}' is unreadable, continuing without scar: {}",
                    image_id,
                    err
                );
                None
            }
        }
    }
}
