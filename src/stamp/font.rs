//! Stamp text fonts
//!
//! A font is resolved once from configuration. Base-14 fonts are referenced
//! by name with WinAnsi encoding; TrueType files are embedded as a Type0
//! composite font so non-Latin text (Cyrillic names, for instance) renders.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lazy_static::lazy_static;
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::{Deserialize, Serialize};
use ttf_parser::{name_id, Face, GlyphId};

use crate::error::{Error, Result};

use super::deflate;

pub const DEFAULT_STANDARD_FONT: &str = "Times-Roman";

lazy_static! {
    static ref STANDARD_FONTS: HashSet<&'static str> = [
        "Times-Roman",
        "Times-Bold",
        "Times-Italic",
        "Times-BoldItalic",
        "Helvetica",
        "Helvetica-Bold",
        "Helvetica-Oblique",
        "Helvetica-BoldOblique",
        "Courier",
        "Courier-Bold",
        "Courier-Oblique",
        "Courier-BoldOblique",
        "Symbol",
        "ZapfDingbats",
    ]
    .into_iter()
    .collect();
}

pub fn is_standard_font(name: &str) -> bool {
    STANDARD_FONTS.contains(name)
}

/// Where stamp text glyphs come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontSource {
    Standard { name: String },
    TrueType { path: PathBuf },
}

impl Default for FontSource {
    fn default() -> Self {
        FontSource::Standard {
            name: DEFAULT_STANDARD_FONT.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StampFont {
    Standard(String),
    TrueType(Arc<TrueTypeFont>),
}

/// Parsed metrics of an embeddable TrueType file
pub struct TrueTypeFont {
    data: Vec<u8>,
    postscript_name: String,
    units_per_em: u16,
    ascent: i16,
    descent: i16,
    cap_height: i16,
    bbox: [i16; 4],
}

impl std::fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("postscript_name", &self.postscript_name)
            .field("size", &self.data.len())
            .finish()
    }
}

impl StampFont {
    pub fn load(source: &FontSource) -> Result<Self> {
        match source {
            FontSource::Standard { name } if is_standard_font(name) => Ok(StampFont::Standard(name.clone())),
            FontSource::Standard { name } => Err(Error::Config(format!("Unknown standard font: {}", name))),
            FontSource::TrueType { path } => Ok(StampFont::TrueType(Arc::new(TrueTypeFont::from_path(path)?))),
        }
    }

    pub fn base_font(&self) -> &str {
        match self {
            StampFont::Standard(name) => name,
            StampFont::TrueType(font) => &font.postscript_name,
        }
    }

    /// Encodes text as a `Tj` operand for this font.
    pub fn encode(&self, text: &str) -> Object {
        match self {
            StampFont::Standard(_) => Object::String(encode_win_ansi(text), StringFormat::Literal),
            StampFont::TrueType(font) => Object::String(font.glyph_bytes(text), StringFormat::Hexadecimal),
        }
    }

    /// Adds the font dictionary (and, for TrueType, the embedded program)
    /// to `doc`. `texts` lists every string that will be shown, so glyph
    /// widths are emitted only for glyphs in use.
    pub fn add_to_document(&self, doc: &mut Document, texts: &[&str]) -> Result<ObjectId> {
        match self {
            StampFont::Standard(name) => Ok(doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => name.as_str(),
                "Encoding" => "WinAnsiEncoding",
            })),
            StampFont::TrueType(font) => font.embed(doc, texts),
        }
    }
}

/// Latin-1 subset of WinAnsi. Characters outside it become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ 0x20..=0x7e | code @ 0xa0..=0xff => code as u8,
            _ => b'?',
        })
        .collect()
}

impl TrueTypeFont {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .map_err(|e| Error::Config(format!("Failed to read font {}: {}", path.display(), e)))?;
        let fallback = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("StampFont")
            .to_owned();
        Self::from_bytes(data, &fallback)
    }

    pub fn from_bytes(data: Vec<u8>, fallback_name: &str) -> Result<Self> {
        let face = Face::parse(&data, 0).map_err(|e| Error::Config(format!("Unusable TrueType font: {}", e)))?;
        let postscript_name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|name| name.to_string())
            .unwrap_or_else(|| fallback_name.to_owned());
        let bbox = face.global_bounding_box();
        let font = Self {
            postscript_name: sanitize_name(&postscript_name),
            units_per_em: face.units_per_em(),
            ascent: face.ascender(),
            descent: face.descender(),
            cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            data,
        };
        Ok(font)
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }

    fn glyph_ids(&self, text: &str) -> Vec<GlyphId> {
        self.glyphs(text).into_iter().map(|(gid, _)| gid).collect()
    }

    /// Glyph id for each character; unmapped characters get glyph 0.
    fn glyphs(&self, text: &str) -> Vec<(GlyphId, char)> {
        match self.face() {
            Some(face) => text
                .chars()
                .map(|c| (face.glyph_index(c).unwrap_or(GlyphId(0)), c))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Identity-H: two big-endian bytes per glyph id.
    fn glyph_bytes(&self, text: &str) -> Vec<u8> {
        self.glyph_ids(text).into_iter().flat_map(|gid| gid.0.to_be_bytes()).collect()
    }

    fn scale(&self, value: i32) -> i64 {
        i64::from(value) * 1000 / i64::from(self.units_per_em.max(1))
    }

    fn embed(&self, doc: &mut Document, texts: &[&str]) -> Result<ObjectId> {
        let program = deflate(&self.data)?;
        let program_id = doc.add_object(Stream::new(
            dictionary! {
                "Length1" => self.data.len() as i64,
                "Filter" => "FlateDecode",
            },
            program,
        ));

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => self.postscript_name.as_str(),
            "Flags" => 32,
            "FontBBox" => self.bbox.iter().map(|&v| Object::Integer(self.scale(i32::from(v)))).collect::<Vec<_>>(),
            "ItalicAngle" => 0,
            "Ascent" => self.scale(i32::from(self.ascent)),
            "Descent" => self.scale(i32::from(self.descent)),
            "CapHeight" => self.scale(i32::from(self.cap_height)),
            "StemV" => 80,
            "FontFile2" => program_id,
        });

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => self.postscript_name.as_str(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "CIDToGIDMap" => "Identity",
            "DW" => 1000,
            "W" => self.width_array(texts),
        });

        let to_unicode_id = doc.add_object(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            deflate(&self.to_unicode_cmap(texts))?,
        ));

        Ok(doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => self.postscript_name.as_str(),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        }))
    }

    /// CMap mapping each glyph the texts use back to its character, so
    /// stamped text can be searched and copied.
    fn to_unicode_cmap(&self, texts: &[&str]) -> Vec<u8> {
        let mapping: BTreeMap<u16, char> = texts
            .iter()
            .flat_map(|text| self.glyphs(text))
            .filter(|(gid, _)| gid.0 != 0)
            .map(|(gid, c)| (gid.0, c))
            .collect();
        let entries: Vec<(u16, char)> = mapping.into_iter().collect();

        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        // bfchar blocks are limited to 100 entries
        for chunk in entries.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for &(gid, c) in chunk {
                let mut units = [0u16; 2];
                let utf16: String = c.encode_utf16(&mut units).iter().map(|u| format!("{:04X}", u)).collect();
                cmap.push_str(&format!("<{:04X}> <{}>\n", gid, utf16));
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap.into_bytes()
    }

    /// `[gid [w] gid [w] ...]` for every glyph the texts use.
    fn width_array(&self, texts: &[&str]) -> Vec<Object> {
        let Some(face) = self.face() else {
            return Vec::new();
        };
        let widths: BTreeMap<u16, i64> = texts
            .iter()
            .flat_map(|text| self.glyph_ids(text))
            .map(|gid| {
                let advance = face.glyph_hor_advance(gid).unwrap_or(self.units_per_em);
                (gid.0, self.scale(i32::from(advance)))
            })
            .collect();
        widths
            .into_iter()
            .flat_map(|(gid, width)| [Object::Integer(i64::from(gid)), Object::Array(vec![Object::Integer(width)])])
            .collect()
    }
}

fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect();
    if cleaned.is_empty() {
        "StampFont".into()
    } else {
        cleaned
    }
}
