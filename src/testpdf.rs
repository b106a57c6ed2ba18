//! Sample PDF generation for exercising the signing flow
//! Author: kartik4091
//! Created: 2025-06-04

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};

/// A4 in points
pub const A4: (f32, f32) = (595.0, 842.0);

const PAGE_MARGIN: f32 = 36.0;
const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 12.0;
const LINE_HEIGHT: f32 = 16.0;

/// One-page A4 document with a title, a short bullet list and the
/// creation timestamp.
pub fn generate_test_pdf() -> Result<Vec<u8>> {
    generate_test_pdf_at(Utc::now())
}

pub fn generate_test_pdf_at(created: DateTime<Utc>) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let title_font = doc.add_object(standard_font("Helvetica-Bold"));
    let body_font = doc.add_object(standard_font("Helvetica"));

    let title = "Test document for signing";
    let body = [
        "This is a test document for checking electronic signature functionality.".to_owned(),
        String::new(),
        "The document contains:".to_owned(),
        "- A title".to_owned(),
        "- Body text".to_owned(),
        "- A list of items".to_owned(),
        "- The creation date".to_owned(),
        String::new(),
        format!("Created: {}", created.format("%Y-%m-%dT%H:%M:%S")),
        "Status: Ready for signing".to_owned(),
    ];

    let (width, height) = A4;
    // Helvetica-Bold averages a little over half an em per glyph
    let title_width = title.len() as f32 * TITLE_SIZE * 0.55;
    let mut operations = text_line("F2", TITLE_SIZE, (width - title_width) / 2.0, height - PAGE_MARGIN - TITLE_SIZE, title);
    let mut y = height - PAGE_MARGIN - TITLE_SIZE - 2.0 * LINE_HEIGHT;
    for line in body.iter() {
        if !line.is_empty() {
            operations.extend(text_line("F1", BODY_SIZE, PAGE_MARGIN, y, line));
        }
        y -= LINE_HEIGHT;
    }

    let page = page_with_content(&mut doc, pages_id, width, height, operations)?;
    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => body_font,
            "F2" => title_font,
        },
    };
    finish(doc, pages_id, vec![page], resources)
}

/// Document whose pages carry no content, one per `(width, height)`.
pub fn blank_pdf(sizes: &[(f32, f32)]) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut pages = Vec::with_capacity(sizes.len());
    for &(width, height) in sizes {
        pages.push(page_with_content(&mut doc, pages_id, width, height, Vec::new())?);
    }
    finish(doc, pages_id, pages, lopdf::Dictionary::new())
}

fn standard_font(name: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => name,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn text_line(font: &str, size: f32, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), Object::Real(size.into())]),
        Operation::new("Td", vec![Object::Real(x.into()), Object::Real(y.into())]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn page_with_content(
    doc: &mut Document,
    pages_id: ObjectId,
    width: f32,
    height: f32,
    operations: Vec<Operation>,
) -> Result<ObjectId> {
    let content = Content { operations }
        .encode()
        .map_err(|e| Error::Stamp(format!("Failed to encode page content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Real(width.into()), Object::Real(height.into())],
        "Contents" => content_id,
    }))
}

fn finish(mut doc: Document, pages_id: ObjectId, pages: Vec<ObjectId>, resources: lopdf::Dictionary) -> Result<Vec<u8>> {
    let count = pages.len() as i64;
    let kids: Vec<Object> = pages.into_iter().map(Object::Reference).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| Error::Stamp(format!("Failed to write PDF: {}", e)))?;
    Ok(output)
}
