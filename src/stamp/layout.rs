//! Stamp text fields and their anchors on the logical canvas

use crate::identity::StampData;

use super::geometry::{overlay_font_size, place_anchor, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#').unwrap_or(text);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Components for the `rg` operator, each in `0.0..=1.0`.
    pub fn components(self) -> [f32; 3] {
        [self.r, self.g, self.b].map(|c| f32::from(c) / 255.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampFieldKind {
    OrganizationName,
    Director,
    TaxId,
    ValidityPeriod,
}

impl StampFieldKind {
    pub fn value(self, data: &StampData) -> Option<&str> {
        let value = match self {
            StampFieldKind::OrganizationName => &data.organization_name,
            StampFieldKind::Director => &data.director,
            StampFieldKind::TaxId => &data.inn,
            StampFieldKind::ValidityPeriod => &data.validity_period,
        };
        value.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StampField {
    pub kind: StampFieldKind,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub font_size: f32,
    pub color: Rgb,
}

/// Text ready to be painted at absolute page coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub kind: StampFieldKind,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub color: Rgb,
}

// (kind, anchor x, anchor y, base font size) on the 300x100 canvas
const FIELD_ANCHORS: [(StampFieldKind, f32, f32, f32); 4] = [
    (StampFieldKind::OrganizationName, 150.0, 48.0, 10.0),
    (StampFieldKind::Director, 150.0, 37.0, 10.0),
    (StampFieldKind::TaxId, 150.0, 24.0, 10.0),
    (StampFieldKind::ValidityPeriod, 150.0, 14.0, 10.0),
];

#[derive(Debug, Clone)]
pub struct StampLayout {
    fields: Vec<StampField>,
}

impl StampLayout {
    pub fn new(color: Rgb) -> Self {
        let fields = FIELD_ANCHORS
            .iter()
            .map(|&(kind, anchor_x, anchor_y, font_size)| StampField { kind, anchor_x, anchor_y, font_size, color })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> &[StampField] {
        &self.fields
    }

    /// Places every non-empty field inside `stamp`. Absent or empty values
    /// produce nothing.
    pub fn placements(&self, stamp: &Rect, data: &StampData) -> Vec<TextPlacement> {
        self.fields
            .iter()
            .filter_map(|field| {
                let text = field.kind.value(data).filter(|v| !v.is_empty())?;
                let (x, y) = place_anchor(stamp, field.anchor_x, field.anchor_y);
                Some(TextPlacement {
                    kind: field.kind,
                    text: text.to_owned(),
                    x,
                    y,
                    font_size: overlay_font_size(field.font_size),
                    color: field.color,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgb = Rgb::new(0x1b, 0x15, 0x64);

    #[test]
    fn test_hex_colors() {
        assert_eq!(Rgb::from_hex("#1b1564"), Some(INK));
        assert_eq!(Rgb::from_hex("000000"), Some(Rgb::new(0, 0, 0)));
        assert_eq!(Rgb::from_hex("#12345"), None);
        assert_eq!(Rgb::from_hex("#zzzzzz"), None);
        assert_eq!(Rgb::new(255, 0, 0).components(), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_placements_skip_missing_fields() {
        let layout = StampLayout::new(INK);
        let stamp = Rect { x: 0.0, y: 0.0, width: 300.0, height: 100.0 };
        let data = StampData {
            organization_name: Some("OOO Romashka".into()),
            director: Some(String::new()),
            inn: None,
            validity_period: Some("2025-2026".into()),
        };
        let placements = layout.placements(&stamp, &data);
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].kind, StampFieldKind::OrganizationName);
        assert_eq!((placements[0].x, placements[0].y), (150.0, 48.0));
        assert_eq!(placements[0].font_size, 8.0);
        assert_eq!(placements[1].kind, StampFieldKind::ValidityPeriod);
        assert_eq!(placements[1].y, 14.0);
    }

    #[test]
    fn test_placements_scale_with_stamp() {
        let layout = StampLayout::new(INK);
        let stamp = Rect { x: 400.0, y: 20.0, width: 150.0, height: 50.0 };
        let data = StampData { director: Some("Ivanov".into()), ..Default::default() };
        let placement = &layout.placements(&stamp, &data)[0];
        assert_eq!(placement.x, 475.0);
        assert_eq!(placement.y, 38.5);
    }

    #[test]
    fn test_empty_data_draws_nothing() {
        let layout = StampLayout::new(INK);
        let stamp = Rect { x: 0.0, y: 0.0, width: 90.0, height: 30.0 };
        assert!(layout.placements(&stamp, &StampData::default()).is_empty());
    }
}
