//! Extended drawing plugins available only in the payload dialects.

use serde_json::json;

use super::{props, Plugin};
use crate::export::{item, ExportContext, PayloadItem};
use crate::models::{PropValue, Widget};

fn fill_outline(map: &mut PayloadItem, widget: &Widget, ctx: &ExportContext) {
    if widget.prop_bool("fill", false) {
        map.insert(
            "fill".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
    }
    map.insert(
        "outline".into(),
        json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
    );
    map.insert("width".into(), json!(widget.prop_i64("width", 1)));
}

/// Closed polygon from widget-relative points.
pub struct PolygonPlugin;

impl PolygonPlugin {
    /// Points are stored as "dx,dy" strings relative to the box
    /// top-left; the payload wants absolute pairs.
    fn absolute_points(widget: &Widget) -> Vec<[i64; 2]> {
        let Some(points) = widget.prop("points").and_then(PropValue::as_list) else {
            return Vec::new();
        };
        points
            .iter()
            .filter_map(|p| {
                let text = p.to_plain_string();
                let (dx, dy) = text.split_once(',')?;
                let dx: i64 = dx.trim().parse().ok()?;
                let dy: i64 = dy.trim().parse().ok()?;
                Some([widget.x as i64 + dx, widget.y as i64 + dy])
            })
            .collect()
    }
}

impl Plugin for PolygonPlugin {
    fn kind(&self) -> &'static str {
        "odp_polygon"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            (
                "points",
                PropValue::List(vec!["0,40".into(), "25,0".into(), "50,40".into()]),
            ),
            ("fill", false.into()),
            ("color", "theme_auto".into()),
            ("width", 1.into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (60, 50)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let mut map = item("polygon");
        map.insert("points".into(), json!(Self::absolute_points(widget)));
        fill_outline(&mut map, widget, ctx);
        Some(vec![map])
    }
}

/// Ellipse inscribed in the widget box.
pub struct EllipsePlugin;

impl Plugin for EllipsePlugin {
    fn kind(&self) -> &'static str {
        "odp_ellipse"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("fill", false.into()),
            ("color", "theme_auto".into()),
            ("width", 1.into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (100, 60)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let mut map = item("ellipse");
        map.insert("x_start".into(), json!(widget.x));
        map.insert("y_start".into(), json!(widget.y));
        map.insert("x_end".into(), json!(widget.x + widget.width));
        map.insert("y_end".into(), json!(widget.y + widget.height));
        fill_outline(&mut map, widget, ctx);
        Some(vec![map])
    }
}

/// Circular arc centered in the widget box.
pub struct ArcPlugin;

impl Plugin for ArcPlugin {
    fn kind(&self) -> &'static str {
        "odp_arc"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("start_angle", 0.into()),
            ("end_angle", 270.into()),
            ("width", 3.into()),
            ("color", "theme_auto".into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (80, 80)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let mut map = item("arc");
        map.insert("x".into(), json!(widget.x + widget.width / 2));
        map.insert("y".into(), json!(widget.y + widget.height / 2));
        map.insert(
            "radius".into(),
            json!(widget.width.min(widget.height) / 2),
        );
        map.insert("start_angle".into(), json!(widget.prop_i64("start_angle", 0)));
        map.insert("end_angle".into(), json!(widget.prop_i64("end_angle", 270)));
        map.insert("width".into(), json!(widget.prop_i64("width", 3)));
        map.insert(
            "color".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
        Some(vec![map])
    }
}

/// Row or column of icons.
pub struct IconSequencePlugin;

impl Plugin for IconSequencePlugin {
    fn kind(&self) -> &'static str {
        "odp_icon_sequence"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("icons", PropValue::List(vec!["F07D0".into()])),
            ("size", 32.into()),
            ("spacing", 4.into()),
            ("direction", "horizontal".into()),
            ("color", "theme_auto".into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (140, 40)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let icons: Vec<String> = widget
            .prop("icons")
            .and_then(PropValue::as_list)
            .map(|items| items.iter().map(PropValue::to_plain_string).collect())
            .unwrap_or_default();
        let mut map = item("icon_sequence");
        map.insert("icons".into(), json!(icons));
        map.insert("x".into(), json!(widget.x));
        map.insert("y".into(), json!(widget.y));
        map.insert("size".into(), json!(widget.prop_i64("size", 32)));
        map.insert("spacing".into(), json!(widget.prop_i64("spacing", 4)));
        map.insert(
            "direction".into(),
            json!(widget.prop_str("direction", "horizontal")),
        );
        map.insert(
            "color".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
        Some(vec![map])
    }
}

/// Repeated rectangle grid.
pub struct RectanglePatternPlugin;

impl Plugin for RectanglePatternPlugin {
    fn kind(&self) -> &'static str {
        "odp_rectangle_pattern"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("x_size", 20.into()),
            ("y_size", 20.into()),
            ("x_repeat", 3.into()),
            ("y_repeat", 2.into()),
            ("x_offset", 10.into()),
            ("y_offset", 10.into()),
            ("fill", false.into()),
            ("color", "theme_auto".into()),
            ("width", 1.into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (100, 60)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let mut map = item("rectangle_pattern");
        map.insert("x_start".into(), json!(widget.x));
        map.insert("y_start".into(), json!(widget.y));
        for key in ["x_size", "y_size", "x_repeat", "y_repeat", "x_offset", "y_offset"] {
            map.insert(key.into(), json!(widget.prop_i64(key, 0)));
        }
        fill_outline(&mut map, widget, ctx);
        Some(vec![map])
    }
}

/// Alignment grid for layout debugging.
pub struct DebugGridPlugin;

impl Plugin for DebugGridPlugin {
    fn kind(&self) -> &'static str {
        "debug_grid"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([("spacing", 20.into())])
    }

    fn export_payload(&self, widget: &Widget, _ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let mut map = item("debug_grid");
        map.insert("spacing".into(), json!(widget.prop_i64("spacing", 20)));
        Some(vec![map])
    }
}

/// History plot of a numeric entity.
pub struct PlotPlugin;

impl Plugin for PlotPlugin {
    fn kind(&self) -> &'static str {
        "odp_plot"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("duration", 3600.into()),
            ("width", 1.into()),
            ("color", "theme_auto".into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (200, 100)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let mut map = item("plot");
        map.insert("x_start".into(), json!(widget.x));
        map.insert("y_start".into(), json!(widget.y));
        map.insert("x_end".into(), json!(widget.x + widget.width));
        map.insert("y_end".into(), json!(widget.y + widget.height));
        map.insert("duration".into(), json!(widget.prop_i64("duration", 3600)));
        if !widget.entity_id.is_empty() {
            map.insert("data".into(), json!([{ "entity": widget.entity_id }]));
        }
        map.insert(
            "color".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
        Some(vec![map])
    }
}
