//! Stamp and info-box geometry
//!
//! Pure functions of the page dimensions, in PDF user-space units with the
//! origin at the lower-left corner of the page.

use serde::{Deserialize, Serialize};

/// Logical canvas the stamp field anchors are defined on
pub const CANVAS_WIDTH: f32 = 300.0;
pub const CANVAS_HEIGHT: f32 = 100.0;

pub const MIN_MARGIN: f32 = 20.0;
pub const MARGIN_RATIO: f32 = 0.02;

/// Stamp width as a share of the page width for [`StampSizing::PageWidthRatio`]
pub const PAGE_WIDTH_RATIO: f32 = 0.30;

/// Overlay text is never rendered below this size
pub const MIN_OVERLAY_FONT_SIZE: f32 = 6.0;

/// How the stamp width follows the page size. The two rules produce
/// different sizes for the same page and are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StampSizing {
    /// 30% of the page width
    PageWidthRatio,
    /// Banded share of the shorter page side, with a cap per band
    Tiered,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Larger of the fixed minimum and 2% of the shorter side.
pub fn page_margin(page_width: f32, page_height: f32) -> f32 {
    MIN_MARGIN.max(page_width.min(page_height) * MARGIN_RATIO)
}

pub fn stamp_width(sizing: StampSizing, page_width: f32, page_height: f32) -> f32 {
    match sizing {
        StampSizing::PageWidthRatio => page_width * PAGE_WIDTH_RATIO,
        StampSizing::Tiered => tiered_stamp_width(page_width.min(page_height)),
    }
}

fn tiered_stamp_width(min_dimension: f32) -> f32 {
    if min_dimension > 800.0 {
        (min_dimension * 0.16).min(400.0)
    } else if min_dimension > 400.0 {
        (min_dimension * 0.20).min(300.0)
    } else {
        (min_dimension * 0.30).min(200.0)
    }
}

/// Stamp image rectangle: bottom-right corner, `height = width * aspect`.
///
/// `image_aspect_ratio` is image height over image width.
pub fn compute_stamp_geometry(
    sizing: StampSizing,
    page_width: f32,
    page_height: f32,
    image_aspect_ratio: f32,
) -> Rect {
    let width = stamp_width(sizing, page_width, page_height);
    let height = width * image_aspect_ratio;
    let margin = page_margin(page_width, page_height);
    Rect {
        x: page_width - width - margin,
        y: margin,
        width,
        height,
    }
}

pub fn info_box_width(page_width: f32) -> f32 {
    if page_width > 800.0 {
        (page_width * 0.25).min(400.0)
    } else if page_width > 400.0 {
        (page_width * 0.30).min(300.0)
    } else {
        (page_width * 0.40).min(250.0)
    }
}

pub fn info_box_height(page_height: f32) -> f32 {
    if page_height > 1000.0 {
        120.0
    } else if page_height > 600.0 {
        100.0
    } else {
        80.0
    }
}

pub fn info_font_size(page_width: f32, page_height: f32) -> f32 {
    let min_dimension = page_width.min(page_height);
    if min_dimension > 800.0 {
        14.0
    } else if min_dimension > 400.0 {
        12.0
    } else {
        10.0
    }
}

/// Info box rectangle: top-right corner, same margin rule as the stamp.
pub fn compute_info_box_geometry(page_width: f32, page_height: f32) -> Rect {
    let width = info_box_width(page_width);
    let height = info_box_height(page_height);
    let margin = page_margin(page_width, page_height);
    Rect {
        x: page_width - width - margin,
        y: page_height - height - margin,
        width,
        height,
    }
}

/// Maps an anchor on the 300x100 canvas into the stamp rectangle.
pub fn place_anchor(stamp: &Rect, anchor_x: f32, anchor_y: f32) -> (f32, f32) {
    (
        stamp.x + anchor_x * stamp.width / CANVAS_WIDTH,
        stamp.y + anchor_y * stamp.height / CANVAS_HEIGHT,
    )
}

pub fn overlay_font_size(base_font_size: f32) -> f32 {
    MIN_OVERLAY_FONT_SIZE.max(base_font_size - 2.0)
}
