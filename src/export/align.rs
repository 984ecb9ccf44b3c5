//! Text alignment decomposition and anchor math.
//!
//! Alignment names are free-form ("TOP_LEFT", "CENTER", "BOTTOM_RIGHT")
//! and decompose independently on each axis: any name containing LEFT
//! or RIGHT fixes the horizontal bucket, TOP or BOTTOM the vertical,
//! and everything else centers.

use crate::models::Widget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

pub fn split_align(align: &str) -> (HAlign, VAlign) {
    let upper = align.to_uppercase();
    let h = if upper.contains("RIGHT") {
        HAlign::Right
    } else if upper.contains("LEFT") {
        HAlign::Left
    } else {
        HAlign::Center
    };
    let v = if upper.contains("BOTTOM") {
        VAlign::Bottom
    } else if upper.contains("TOP") {
        VAlign::Top
    } else {
        VAlign::Center
    };
    (h, v)
}

/// Anchor x for a widget box: left edge, midpoint or right edge.
pub fn anchor_x(widget: &Widget, h: HAlign) -> i32 {
    match h {
        HAlign::Left => widget.x,
        HAlign::Center => widget.x + widget.width / 2,
        HAlign::Right => widget.x + widget.width,
    }
}

/// Anchor y for a widget box: top edge, midpoint or bottom edge.
pub fn anchor_y(widget: &Widget, v: VAlign) -> i32 {
    match v {
        VAlign::Top => widget.y,
        VAlign::Center => widget.y + widget.height / 2,
        VAlign::Bottom => widget.y + widget.height,
    }
}

/// The `TextAlign::` constant name for a decomposed alignment.
pub fn text_align_const(h: HAlign, v: VAlign) -> &'static str {
    match (v, h) {
        (VAlign::Top, HAlign::Left) => "TextAlign::TOP_LEFT",
        (VAlign::Top, HAlign::Center) => "TextAlign::TOP_CENTER",
        (VAlign::Top, HAlign::Right) => "TextAlign::TOP_RIGHT",
        (VAlign::Center, HAlign::Left) => "TextAlign::CENTER_LEFT",
        (VAlign::Center, HAlign::Center) => "TextAlign::CENTER",
        (VAlign::Center, HAlign::Right) => "TextAlign::CENTER_RIGHT",
        (VAlign::Bottom, HAlign::Left) => "TextAlign::BOTTOM_LEFT",
        (VAlign::Bottom, HAlign::Center) => "TextAlign::BOTTOM_CENTER",
        (VAlign::Bottom, HAlign::Right) => "TextAlign::BOTTOM_RIGHT",
    }
}
