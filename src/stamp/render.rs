//! Draws the stamp overlay into an existing PDF
//!
//! Existing page content is wrapped in `q`/`Q` so whatever graphics state
//! it leaves behind cannot leak into the overlay, then a new content
//! stream is appended. Page resources are resolved through the page tree
//! and written back onto the page directly.

use std::path::Path;

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, instrument};

use crate::config::StampConfig;
use crate::error::{Error, Result};
use crate::identity::StampData;

use super::deflate;
use super::font::StampFont;
use super::geometry::{compute_info_box_geometry, compute_stamp_geometry, info_font_size, Rect, StampSizing};
use super::layout::{Rgb, StampLayout};

const BUNDLED_STAMP: &[u8] = include_bytes!("../../assets/stamp.png");

const STAMP_IMAGE_NAME: &str = "DocsignStamp";
const STAMP_FONT_NAME: &str = "DocsignFont";
const INFO_FONT_NAME: &str = "DocsignInfoFont";
const INFO_STATE_NAME: &str = "DocsignInfoState";

// US Letter, used when a page declares no usable MediaBox
const DEFAULT_PAGE_BOX: PageBox = PageBox { llx: 0.0, lly: 0.0, width: 612.0, height: 792.0 };

// Page tree depth guard
const MAX_TREE_DEPTH: usize = 64;

const INFO_FILL: Rgb = Rgb::new(240, 248, 255);
const INFO_FRAME: Rgb = Rgb::new(0, 0, 255);
const INFO_FILL_OPACITY: f32 = 200.0 / 255.0;

// Rough Helvetica advance, as a share of the font size
const INFO_CHAR_WIDTH: f32 = 0.5;

/// Decoded stamp raster, split into RGB samples and an optional alpha mask
#[derive(Clone)]
pub struct StampImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl std::fmt::Debug for StampImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StampImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("alpha", &self.alpha.is_some())
            .finish()
    }
}

impl StampImage {
    pub fn bundled() -> Result<Self> {
        Self::decode(BUNDLED_STAMP)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| Error::Config(format!("Failed to read stamp image {}: {}", path.display(), e)))?;
        Self::decode(&bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| Error::Config(format!("Failed to decode stamp image: {}", e)))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Config("Stamp image is empty".into()));
        }

        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        for pixel in decoded.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }
        let alpha = if alpha.iter().all(|&a| a == u8::MAX) { None } else { Some(alpha) };

        Ok(Self { width, height, rgb, alpha })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Height over width
    pub fn aspect_ratio(&self) -> f32 {
        self.height as f32 / self.width as f32
    }

    fn add_to_document(&self, doc: &mut Document) -> Result<ObjectId> {
        let mut image = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        if let Some(alpha) = &self.alpha {
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => self.width as i64,
                    "Height" => self.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                deflate(alpha)?,
            );
            image.set("SMask", doc.add_object(mask));
        }
        Ok(doc.add_object(Stream::new(image, deflate(&self.rgb)?)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PageBox {
    llx: f32,
    lly: f32,
    width: f32,
    height: f32,
}

/// Stamp resources loaded once and reused for every document
#[derive(Debug, Clone)]
pub struct StampRenderer {
    image: StampImage,
    font: StampFont,
    layout: StampLayout,
    sizing: StampSizing,
    info_box: bool,
    algorithm_label: String,
}

impl StampRenderer {
    /// Loads the stamp image and font named by `config`.
    ///
    /// `algorithm_label` is shown in the information box.
    pub fn new(config: &StampConfig, algorithm_label: impl Into<String>) -> Result<Self> {
        let image = match &config.image_path {
            Some(path) => StampImage::from_path(path)?,
            None => StampImage::bundled()?,
        };
        let color = Rgb::from_hex(&config.text_color)
            .ok_or_else(|| Error::Config(format!("Invalid stamp text color: {}", config.text_color)))?;

        Ok(Self {
            image,
            font: StampFont::load(&config.font)?,
            layout: StampLayout::new(color),
            sizing: config.sizing,
            info_box: config.info_box,
            algorithm_label: algorithm_label.into(),
        })
    }

    pub fn image(&self) -> &StampImage {
        &self.image
    }

    pub fn apply(&self, pdf: &[u8], data: &StampData) -> Result<Vec<u8>> {
        self.apply_at(pdf, data, Utc::now())
    }

    /// Stamps every page; `signed_at` is the date shown in the info box.
    #[instrument(skip_all, fields(input_len = pdf.len()))]
    pub fn apply_at(&self, pdf: &[u8], data: &StampData, signed_at: DateTime<Utc>) -> Result<Vec<u8>> {
        let mut doc = Document::load_mem(pdf).map_err(|e| Error::Stamp(format!("Failed to parse PDF: {}", e)))?;
        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if pages.is_empty() {
            return Err(Error::Stamp("Document has no pages".into()));
        }

        let texts: Vec<&str> = self
            .layout
            .fields()
            .iter()
            .filter_map(|field| field.kind.value(data))
            .filter(|text| !text.is_empty())
            .collect();

        let image_id = self.image.add_to_document(&mut doc)?;
        let font_id = self.font.add_to_document(&mut doc, &texts)?;
        let save_id = doc.add_object(Stream::new(Dictionary::new(), encode(vec![Operation::new("q", vec![])])?));
        let info = if self.info_box {
            let font = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            });
            let state = doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => Object::Real(INFO_FILL_OPACITY.into()),
            });
            Some((font, state))
        } else {
            None
        };

        for (index, &page_id) in pages.iter().enumerate() {
            let page_box = media_box(&doc, page_id);
            let mut operations = vec![Operation::new("Q", vec![])];
            operations.extend(self.stamp_operations(page_box, data));

            let mut resources = effective_resources(&doc, page_id);
            insert_named(&doc, &mut resources, "XObject", STAMP_IMAGE_NAME, image_id);
            insert_named(&doc, &mut resources, "Font", STAMP_FONT_NAME, font_id);
            if let (0, Some((info_font, info_state))) = (index, info) {
                insert_named(&doc, &mut resources, "Font", INFO_FONT_NAME, info_font);
                insert_named(&doc, &mut resources, "ExtGState", INFO_STATE_NAME, info_state);
                operations.extend(self.info_box_operations(page_box, signed_at));
            }

            let overlay_id = doc.add_object(Stream::new(Dictionary::new(), encode(operations)?));
            let existing = existing_contents(&doc, page_id);
            let page = doc
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| Error::Stamp(format!("Malformed page object: {}", e)))?;
            let mut contents = vec![Object::Reference(save_id)];
            contents.extend(existing);
            contents.push(Object::Reference(overlay_id));
            page.set("Contents", contents);
            page.set("Resources", resources);
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| Error::Stamp(format!("Failed to write stamped PDF: {}", e)))?;
        debug!(pages = pages.len(), output_len = output.len(), "Stamp applied");
        Ok(output)
    }

    fn stamp_operations(&self, page_box: PageBox, data: &StampData) -> Vec<Operation> {
        let local = compute_stamp_geometry(self.sizing, page_box.width, page_box.height, self.image.aspect_ratio());
        let stamp = Rect { x: local.x + page_box.llx, y: local.y + page_box.lly, ..local };

        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![real(stamp.width), real(0.0), real(0.0), real(stamp.height), real(stamp.x), real(stamp.y)],
            ),
            Operation::new("Do", vec![STAMP_IMAGE_NAME.into()]),
            Operation::new("Q", vec![]),
        ];

        for placement in self.layout.placements(&stamp, data) {
            let [r, g, b] = placement.color.components();
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("rg", vec![real(r), real(g), real(b)]),
                Operation::new("Tf", vec![STAMP_FONT_NAME.into(), real(placement.font_size)]),
                Operation::new("Td", vec![real(placement.x), real(placement.y)]),
                Operation::new("Tj", vec![self.font.encode(&placement.text)]),
                Operation::new("ET", vec![]),
            ]);
        }
        operations
    }

    fn info_box_operations(&self, page_box: PageBox, signed_at: DateTime<Utc>) -> Vec<Operation> {
        let local = compute_info_box_geometry(page_box.width, page_box.height);
        let area = Rect { x: local.x + page_box.llx, y: local.y + page_box.lly, ..local };
        let rect = || vec![real(area.x), real(area.y), real(area.width), real(area.height)];
        let [fr, fg, fb] = INFO_FILL.components();
        let [sr, sg, sb] = INFO_FRAME.components();

        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new("gs", vec![INFO_STATE_NAME.into()]),
            Operation::new("rg", vec![real(fr), real(fg), real(fb)]),
            Operation::new("re", rect()),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("RG", vec![real(sr), real(sg), real(sb)]),
            Operation::new("w", vec![real(2.0)]),
            Operation::new("re", rect()),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ];

        let size = info_font_size(page_box.width, page_box.height);
        let top = area.y + area.height;
        let lines = [
            ("ELECTRONIC SIGNATURE".to_owned(), size),
            (self.algorithm_label.clone(), size * 0.8),
            (format!("Date: {}", signed_at.format("%d.%m.%Y %H:%M:%S UTC")), size * 0.8),
            ("Status: VALID".to_owned(), size * 0.8),
        ];
        for (row, (text, line_size)) in lines.into_iter().enumerate() {
            let y = top - size * (row as f32 + 1.0) - 5.0;
            let text_width = text.chars().count() as f32 * line_size * INFO_CHAR_WIDTH;
            let x = area.x + (area.width - text_width) / 2.0;
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("rg", vec![real(0.0), real(0.0), real(0.0)]),
                Operation::new("Tf", vec![INFO_FONT_NAME.into(), real(line_size)]),
                Operation::new("Td", vec![real(x), real(y)]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ]);
        }
        operations
    }
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn encode(operations: Vec<Operation>) -> Result<Vec<u8>> {
    Content { operations }
        .encode()
        .map_err(|e| Error::Stamp(format!("Failed to encode content stream: {}", e)))
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// Looks `key` up on the page, then on its ancestors.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn media_box(doc: &Document, page_id: ObjectId) -> PageBox {
    let values: Option<Vec<f32>> = inherited(doc, page_id, b"MediaBox")
        .and_then(|object| object.as_array().ok())
        .map(|array| array.iter().filter_map(|v| number(resolve(doc, v))).collect());

    match values.as_deref() {
        Some(&[x0, y0, x1, y1]) if (x1 - x0).abs() > 0.0 && (y1 - y0).abs() > 0.0 => PageBox {
            llx: x0.min(x1),
            lly: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        },
        _ => DEFAULT_PAGE_BOX,
    }
}

fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    inherited(doc, page_id, b"Resources")
        .and_then(|object| object.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new)
}

/// Adds `name -> id` to a resource category, keeping existing entries.
fn insert_named(doc: &Document, resources: &mut Dictionary, category: &str, name: &str, id: ObjectId) {
    let mut entries = resources
        .get(category.as_bytes())
        .ok()
        .and_then(|object| resolve(doc, object).as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    entries.set(name, Object::Reference(id));
    resources.set(category, entries);
}

/// Content stream references of a page, with an indirect array flattened
/// so the rebuilt `Contents` holds streams only.
fn existing_contents(doc: &Document, page_id: ObjectId) -> Vec<Object> {
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}
