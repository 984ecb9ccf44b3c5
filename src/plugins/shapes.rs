//! Shape plugins: rectangles, circles and lines.

use serde_json::json;

use super::{props, Plugin};
use crate::export::{item, DeclarativeNode, ExportContext, PayloadItem};
use crate::models::Widget;

fn shape_defaults() -> crate::models::PropMap {
    props([
        ("fill", false.into()),
        ("color", "theme_auto".into()),
        ("border_width", 1.into()),
        ("border_color", "theme_auto".into()),
    ])
}

/// Shared obj-node body for box-shaped declarative widgets.
fn obj_body(widget: &Widget, ctx: &ExportContext, radius: i64) -> PayloadItem {
    let mut body = PayloadItem::new();
    body.insert("x".into(), json!(widget.x));
    body.insert("y".into(), json!(widget.y));
    body.insert("width".into(), json!(widget.width));
    body.insert("height".into(), json!(widget.height));
    if widget.prop_bool("fill", false) {
        body.insert(
            "bg_color".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
    } else {
        body.insert("bg_opa".into(), json!("TRANSP"));
    }
    body.insert(
        "border_width".into(),
        json!(widget.prop_i64("border_width", 1)),
    );
    body.insert(
        "border_color".into(),
        json!(ctx.resolve_color(widget.prop_str("border_color", "theme_auto"))),
    );
    body.insert("radius".into(), json!(radius));
    body
}

/// Axis-aligned rectangle, filled or outlined.
pub struct RectPlugin;

impl Plugin for RectPlugin {
    fn kind(&self) -> &'static str {
        "shape_rect"
    }

    fn defaults(&self) -> crate::models::PropMap {
        shape_defaults()
    }

    fn default_size(&self) -> (i32, i32) {
        (100, 50)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let mut map = item("rectangle");
        map.insert("x_start".into(), json!(widget.x));
        map.insert("y_start".into(), json!(widget.y));
        map.insert("x_end".into(), json!(widget.x + widget.width));
        map.insert("y_end".into(), json!(widget.y + widget.height));
        if widget.prop_bool("fill", false) {
            map.insert(
                "fill".into(),
                json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
            );
        }
        map.insert(
            "outline".into(),
            json!(ctx.resolve_color(widget.prop_str("border_color", "theme_auto"))),
        );
        map.insert("width".into(), json!(widget.prop_i64("border_width", 1)));
        Some(vec![map])
    }

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        let mut lines = Vec::new();
        if widget.prop_bool("fill", false) {
            lines.push(format!(
                "it.filled_rectangle({}, {}, {}, {}, {});",
                widget.x,
                widget.y,
                widget.width,
                widget.height,
                ctx.color_const(widget.prop_str("color", "theme_auto"))
            ));
        }
        let border = widget.prop_i64("border_width", 1) as i32;
        let border_color = ctx.color_const(widget.prop_str("border_color", "theme_auto"));
        // Thick borders are drawn as nested outlines.
        for i in 0..border.max(if widget.prop_bool("fill", false) { 0 } else { 1 }) {
            lines.push(format!(
                "it.rectangle({}, {}, {}, {}, {});",
                widget.x + i,
                widget.y + i,
                widget.width - 2 * i,
                widget.height - 2 * i,
                border_color
            ));
        }
        Some(lines)
    }

    fn export_declarative(&self, widget: &Widget, ctx: &ExportContext) -> Option<DeclarativeNode> {
        Some(DeclarativeNode {
            tag: "obj".to_string(),
            body: obj_body(widget, ctx, 0),
        })
    }
}

/// Rectangle with rounded corners.
pub struct RoundedRectPlugin;

impl Plugin for RoundedRectPlugin {
    fn kind(&self) -> &'static str {
        "rounded_rect"
    }

    fn defaults(&self) -> crate::models::PropMap {
        let mut p = shape_defaults();
        p.insert("radius".to_string(), 8.into());
        p
    }

    fn default_size(&self) -> (i32, i32) {
        (100, 50)
    }

    // No payload item carries a corner radius, so the payload dialects
    // skip this type.

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        let (x, y, w, h) = (widget.x, widget.y, widget.width, widget.height);
        let r = (widget.prop_i64("radius", 8) as i32).min(w / 2).min(h / 2);
        let mut lines = Vec::new();
        if widget.prop_bool("fill", false) {
            let color = ctx.color_const(widget.prop_str("color", "theme_auto"));
            lines.push(format!(
                "it.filled_rectangle({}, {}, {}, {}, {});",
                x + r,
                y,
                w - 2 * r,
                h,
                color
            ));
            lines.push(format!(
                "it.filled_rectangle({}, {}, {}, {}, {});",
                x,
                y + r,
                r,
                h - 2 * r,
                color
            ));
            lines.push(format!(
                "it.filled_rectangle({}, {}, {}, {}, {});",
                x + w - r,
                y + r,
                r,
                h - 2 * r,
                color
            ));
            for (cx, cy) in [
                (x + r, y + r),
                (x + w - r, y + r),
                (x + r, y + h - r),
                (x + w - r, y + h - r),
            ] {
                lines.push(format!("it.filled_circle({cx}, {cy}, {r}, {color});"));
            }
        } else {
            // Outline falls back to square corners.
            lines.push(format!(
                "it.rectangle({}, {}, {}, {}, {});",
                x,
                y,
                w,
                h,
                ctx.color_const(widget.prop_str("border_color", "theme_auto"))
            ));
        }
        Some(lines)
    }

    fn export_declarative(&self, widget: &Widget, ctx: &ExportContext) -> Option<DeclarativeNode> {
        let radius = widget.prop_i64("radius", 8);
        Some(DeclarativeNode {
            tag: "obj".to_string(),
            body: obj_body(widget, ctx, radius),
        })
    }
}

/// Circle inscribed in the widget box.
pub struct CirclePlugin;

impl CirclePlugin {
    fn center(widget: &Widget) -> (i32, i32, i32) {
        let r = widget.width.min(widget.height) / 2;
        (widget.x + widget.width / 2, widget.y + widget.height / 2, r)
    }
}

impl Plugin for CirclePlugin {
    fn kind(&self) -> &'static str {
        "shape_circle"
    }

    fn defaults(&self) -> crate::models::PropMap {
        shape_defaults()
    }

    fn default_size(&self) -> (i32, i32) {
        (60, 60)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let (cx, cy, r) = Self::center(widget);
        let mut map = item("circle");
        map.insert("x".into(), json!(cx));
        map.insert("y".into(), json!(cy));
        map.insert("radius".into(), json!(r));
        if widget.prop_bool("fill", false) {
            map.insert(
                "fill".into(),
                json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
            );
        }
        map.insert(
            "outline".into(),
            json!(ctx.resolve_color(widget.prop_str("border_color", "theme_auto"))),
        );
        map.insert("width".into(), json!(widget.prop_i64("border_width", 1)));
        Some(vec![map])
    }

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        let (cx, cy, r) = Self::center(widget);
        let mut lines = Vec::new();
        if widget.prop_bool("fill", false) {
            lines.push(format!(
                "it.filled_circle({cx}, {cy}, {r}, {});",
                ctx.color_const(widget.prop_str("color", "theme_auto"))
            ));
        } else {
            lines.push(format!(
                "it.circle({cx}, {cy}, {r}, {});",
                ctx.color_const(widget.prop_str("border_color", "theme_auto"))
            ));
        }
        Some(lines)
    }

    fn export_declarative(&self, widget: &Widget, ctx: &ExportContext) -> Option<DeclarativeNode> {
        let (_, _, r) = Self::center(widget);
        Some(DeclarativeNode {
            tag: "obj".to_string(),
            body: obj_body(widget, ctx, r as i64),
        })
    }
}

/// Straight line across the widget box.
pub struct LinePlugin;

impl LinePlugin {
    fn endpoints(widget: &Widget) -> (i32, i32, i32, i32) {
        if widget.prop_str("orientation", "horizontal") == "vertical" {
            let x = widget.x + widget.width / 2;
            (x, widget.y, x, widget.y + widget.height)
        } else {
            let y = widget.y + widget.height / 2;
            (widget.x, y, widget.x + widget.width, y)
        }
    }
}

impl Plugin for LinePlugin {
    fn kind(&self) -> &'static str {
        "line"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("stroke_width", 3.into()),
            ("color", "theme_auto".into()),
            ("orientation", "horizontal".into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (120, 12)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let (x1, y1, x2, y2) = Self::endpoints(widget);
        let mut map = item("line");
        map.insert("x_start".into(), json!(x1));
        map.insert("y_start".into(), json!(y1));
        map.insert("x_end".into(), json!(x2));
        map.insert("y_end".into(), json!(y2));
        map.insert(
            "fill".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
        map.insert("width".into(), json!(widget.prop_i64("stroke_width", 3)));
        Some(vec![map])
    }

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        let (x1, y1, x2, y2) = Self::endpoints(widget);
        let color = ctx.color_const(widget.prop_str("color", "theme_auto"));
        let stroke = (widget.prop_i64("stroke_width", 3) as i32).max(1);
        let vertical = widget.prop_str("orientation", "horizontal") == "vertical";
        let mut lines = Vec::new();
        // Stroke width is emulated with parallel 1px lines.
        for i in 0..stroke {
            let off = i - stroke / 2;
            if vertical {
                lines.push(format!(
                    "it.line({}, {y1}, {}, {y2}, {color});",
                    x1 + off,
                    x2 + off
                ));
            } else {
                lines.push(format!(
                    "it.line({x1}, {}, {x2}, {}, {color});",
                    y1 + off,
                    y2 + off
                ));
            }
        }
        Some(lines)
    }

    fn export_declarative(&self, widget: &Widget, ctx: &ExportContext) -> Option<DeclarativeNode> {
        let (x1, y1, x2, y2) = Self::endpoints(widget);
        let mut body = PayloadItem::new();
        body.insert("points".into(), json!(format!("{x1},{y1} {x2},{y2}")));
        body.insert(
            "line_width".into(),
            json!(widget.prop_i64("stroke_width", 3)),
        );
        body.insert(
            "line_color".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
        Some(DeclarativeNode {
            tag: "line".to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceSettings, Page};

    fn ctx_parts() -> (DeviceSettings, Page) {
        (DeviceSettings::default(), Page::default())
    }

    fn boxed(kind: &str, x: i32, y: i32, w: i32, h: i32) -> Widget {
        let mut widget = Widget::new("w1", kind);
        widget.x = x;
        widget.y = y;
        widget.width = w;
        widget.height = h;
        widget
    }

    #[test]
    fn test_rect_payload_corners() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let w = boxed("shape_rect", 26, 93, 100, 50);
        let items = RectPlugin.export_payload(&w, &ctx).unwrap();
        assert_eq!(items[0]["x_start"], json!(26));
        assert_eq!(items[0]["y_start"], json!(93));
        assert_eq!(items[0]["x_end"], json!(126));
        assert_eq!(items[0]["y_end"], json!(143));
        assert!(items[0].get("fill").is_none());
        assert_eq!(items[0]["outline"], json!("black"));
    }

    #[test]
    fn test_rect_lambda_thick_border() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let mut w = boxed("shape_rect", 0, 0, 40, 20);
        w.props.insert("border_width".into(), 3.into());
        let lines = RectPlugin.export_lambda(&w, &ctx).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("it.rectangle(2, 2, 36, 16"));
    }

    #[test]
    fn test_circle_payload_center_radius() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let w = boxed("shape_circle", 160, 99, 50, 50);
        let items = CirclePlugin.export_payload(&w, &ctx).unwrap();
        assert_eq!(items[0]["x"], json!(185));
        assert_eq!(items[0]["y"], json!(124));
        assert_eq!(items[0]["radius"], json!(25));
    }

    #[test]
    fn test_line_orientation() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let mut w = boxed("line", 10, 40, 100, 20);
        let items = LinePlugin.export_payload(&w, &ctx).unwrap();
        assert_eq!(items[0]["y_start"], json!(50));
        assert_eq!(items[0]["y_end"], json!(50));
        w.props.insert("orientation".into(), "vertical".into());
        let items = LinePlugin.export_payload(&w, &ctx).unwrap();
        assert_eq!(items[0]["x_start"], json!(60));
        assert_eq!(items[0]["x_end"], json!(60));
    }

    #[test]
    fn test_rounded_rect_has_no_payload_form() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let w = boxed("rounded_rect", 0, 0, 50, 30);
        assert!(RoundedRectPlugin.export_payload(&w, &ctx).is_none());
        assert!(RoundedRectPlugin.export_lambda(&w, &ctx).is_some());
    }
}
