//! Bare payload-array import: drawing items back into widgets.
//!
//! Geometry is normalized to top-left boxes here; per-shape forms
//! (center/radius, module grids, point lists) are inverted. Text items
//! whose value is a state template are reclassified as sensor text.

use regex::Regex;
use std::sync::OnceLock;

use serde_json::Value;

use crate::models::{Layout, Page, PropValue, Warning, Widget};
use crate::plugins::PluginRegistry;

/// Drawing item types recognized in a payload array.
pub const PAYLOAD_TYPES: &[&str] = &[
    "text",
    "rectangle",
    "circle",
    "icon",
    "qrcode",
    "progress_bar",
    "debug_grid",
    "line",
    "multiline",
    "plot",
    "dlimg",
    "image",
    "rectangle_pattern",
    "polygon",
    "ellipse",
    "arc",
    "icon_sequence",
];

fn template_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)^(.*?)\{\{\s*states\(['"]([^'"]+)['"]\)\s*\}\}(.*)$"#).unwrap()
    })
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"states\(['"]([^'"]+)['"]\)"#).unwrap())
}

fn geti(item: &Value, keys: &[&str], default: i64) -> i64 {
    for key in keys {
        if let Some(v) = item.get(key) {
            if let Some(n) = v.as_i64() {
                return n;
            }
            if let Some(f) = v.as_f64() {
                return f.round() as i64;
            }
            if let Some(s) = v.as_str() {
                if let Ok(f) = s.trim().parse::<f64>() {
                    return f.round() as i64;
                }
            }
        }
    }
    default
}

fn gets(item: &Value, keys: &[&str], default: &str) -> String {
    for key in keys {
        if let Some(s) = item.get(key).and_then(Value::as_str) {
            return s.to_string();
        }
    }
    default.to_string()
}

fn getb(item: &Value, key: &str, default: bool) -> bool {
    item.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Box geometry from corner-pair fields.
fn bbox(item: &Value) -> (i32, i32, i32, i32) {
    let x1 = geti(item, &["x_start"], 0);
    let y1 = geti(item, &["y_start"], 0);
    let x2 = geti(item, &["x_end"], x1);
    let y2 = geti(item, &["y_end"], y1);
    (
        x1.min(x2) as i32,
        y1.min(y2) as i32,
        (x2 - x1).unsigned_abs() as i32,
        (y2 - y1).unsigned_abs() as i32,
    )
}

fn align_from_anchor(anchor: &str) -> &'static str {
    let mut chars = anchor.chars();
    let h = chars.next().unwrap_or('l');
    let v = chars.next().unwrap_or('t');
    match (v, h) {
        ('t', 'l') => "TOP_LEFT",
        ('t', 'm') => "TOP_CENTER",
        ('t', 'r') => "TOP_RIGHT",
        ('m', 'l') => "CENTER_LEFT",
        ('m', 'm') => "CENTER",
        ('m', 'r') => "CENTER_RIGHT",
        (_, 'l') => "BOTTOM_LEFT",
        (_, 'm') => "BOTTOM_CENTER",
        (_, 'r') => "BOTTOM_RIGHT",
        _ => "TOP_LEFT",
    }
}

/// Move an anchored point back to a top-left box origin.
fn unanchor(widget: &mut Widget, anchor: &str) {
    let mut chars = anchor.chars();
    match chars.next() {
        Some('m') => widget.x -= widget.width / 2,
        Some('r') => widget.x -= widget.width,
        _ => {}
    }
    match chars.next() {
        Some('m') => widget.y -= widget.height / 2,
        Some('s') | Some('b') => widget.y -= widget.height,
        _ => {}
    }
}

fn widget_id(item: &Value, fallback: String) -> String {
    item.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or(fallback)
}

fn shared_fill_props(widget: &mut Widget, item: &Value) {
    let fill_color = gets(item, &["fill"], "");
    let filled = !fill_color.is_empty() && fill_color != "white" && fill_color != "#ffffff";
    widget.props.insert("fill".into(), filled.into());
    widget.props.insert(
        "border_width".into(),
        geti(item, &["width"], 1).into(),
    );
    widget.props.insert(
        "color".into(),
        if fill_color.is_empty() {
            "white".into()
        } else {
            fill_color.into()
        },
    );
    widget
        .props
        .insert("border_color".into(), gets(item, &["outline"], "black").into());
}

pub(crate) fn convert_item(
    item: &Value,
    index: usize,
    warnings: &mut Vec<Warning>,
) -> Option<Widget> {
    let kind = item.get("type").and_then(Value::as_str)?;
    let mut w = match kind {
        "text" => {
            let value = gets(item, &["value"], "");
            let mut w;
            if let Some(caps) = template_re().captures(&value) {
                w = Widget::new(widget_id(item, format!("sensor_text_{index}")), "sensor_text");
                w.entity_id = caps[2].to_string();
                let prefix = caps[1].to_string();
                let postfix = caps[3].to_string();
                if !prefix.is_empty() {
                    w.props.insert("prefix".into(), prefix.into());
                }
                if !postfix.is_empty() {
                    w.props.insert("postfix".into(), postfix.into());
                }
                w.props.insert("value_format".into(), "value".into());
                w.props
                    .insert("value_font_size".into(), geti(item, &["size"], 20).into());
            } else {
                w = Widget::new(widget_id(item, format!("text_{index}")), "text");
                w.props.insert("text".into(), value.into());
                w.props
                    .insert("font_size".into(), geti(item, &["size"], 20).into());
            }
            w.x = geti(item, &["x"], 0) as i32;
            w.y = geti(item, &["y"], 0) as i32;
            w.props
                .insert("color".into(), gets(item, &["color"], "black").into());
            let anchor = gets(item, &["anchor"], "lt");
            w.props
                .insert("text_align".into(), align_from_anchor(&anchor).into());
            w
        }
        "multiline" => {
            let mut w = Widget::new(widget_id(item, format!("multiline_{index}")), "odp_multiline");
            w.x = geti(item, &["x"], 0) as i32;
            w.y = geti(item, &["start_y", "y"], 0) as i32;
            w.props
                .insert("text".into(), gets(item, &["value"], "").into());
            w.props
                .insert("delimiter".into(), gets(item, &["delimiter"], "|").into());
            w.props
                .insert("offset_y".into(), geti(item, &["offset_y"], 25).into());
            w.props
                .insert("font_size".into(), geti(item, &["size"], 20).into());
            w.props
                .insert("color".into(), gets(item, &["color"], "black").into());
            w
        }
        "rectangle" => {
            let mut w = Widget::new(widget_id(item, format!("rect_{index}")), "shape_rect");
            let (x, y, width, height) = bbox(item);
            (w.x, w.y, w.width, w.height) = (x, y, width, height);
            shared_fill_props(&mut w, item);
            w
        }
        "ellipse" => {
            let mut w = Widget::new(widget_id(item, format!("ellipse_{index}")), "odp_ellipse");
            let (x, y, width, height) = bbox(item);
            (w.x, w.y, w.width, w.height) = (x, y, width, height);
            let fill_color = gets(item, &["fill"], "");
            w.props.insert("fill".into(), (!fill_color.is_empty()).into());
            w.props.insert(
                "color".into(),
                if fill_color.is_empty() {
                    gets(item, &["outline"], "black").into()
                } else {
                    fill_color.into()
                },
            );
            w.props.insert("width".into(), geti(item, &["width"], 1).into());
            w
        }
        "circle" => {
            let mut w = Widget::new(widget_id(item, format!("circle_{index}")), "shape_circle");
            let r = geti(item, &["radius"], 10) as i32;
            w.x = geti(item, &["x"], 0) as i32 - r;
            w.y = geti(item, &["y"], 0) as i32 - r;
            w.width = 2 * r;
            w.height = 2 * r;
            shared_fill_props(&mut w, item);
            w
        }
        "line" => {
            let mut w = Widget::new(widget_id(item, format!("line_{index}")), "line");
            let x1 = geti(item, &["x_start"], 0);
            let y1 = geti(item, &["y_start"], 0);
            let x2 = geti(item, &["x_end"], x1);
            let y2 = geti(item, &["y_end"], y1);
            let horizontal = (x2 - x1).abs() >= (y2 - y1).abs();
            let stroke = geti(item, &["width"], 3).max(1);
            w.x = x1.min(x2) as i32;
            w.y = y1.min(y2) as i32;
            w.width = ((x2 - x1).unsigned_abs() as i32).max(if horizontal { 1 } else { stroke as i32 });
            w.height = ((y2 - y1).unsigned_abs() as i32).max(if horizontal { stroke as i32 } else { 1 });
            w.props.insert(
                "orientation".into(),
                if horizontal { "horizontal" } else { "vertical" }.into(),
            );
            w.props.insert("stroke_width".into(), stroke.into());
            w.props
                .insert("color".into(), gets(item, &["fill", "color"], "black").into());
            w
        }
        "icon" => {
            let mut w = Widget::new(widget_id(item, format!("icon_{index}")), "icon");
            let size = geti(item, &["size"], 48) as i32;
            w.x = geti(item, &["x"], 0) as i32 - size / 2;
            w.y = geti(item, &["y"], 0) as i32 - size / 2;
            w.width = size;
            w.height = size;
            w.props
                .insert("code".into(), gets(item, &["value"], "F07D0").into());
            w.props.insert("size".into(), (size as i64).into());
            w.props
                .insert("color".into(), gets(item, &["color"], "black").into());
            w
        }
        "qrcode" => {
            let mut w = Widget::new(widget_id(item, format!("qrcode_{index}")), "qr_code");
            let boxsize = geti(item, &["boxsize"], 4);
            let border = geti(item, &["border"], 2);
            let side = ((25 + 2 * border) * boxsize) as i32;
            w.x = geti(item, &["x"], 0) as i32;
            w.y = geti(item, &["y"], 0) as i32;
            w.width = side;
            w.height = side;
            w.props
                .insert("value".into(), gets(item, &["data"], "").into());
            w.props
                .insert("dark_color".into(), gets(item, &["color"], "black").into());
            w.props
                .insert("light_color".into(), gets(item, &["bgcolor"], "white").into());
            w
        }
        "progress_bar" => {
            let mut w = Widget::new(widget_id(item, format!("progress_{index}")), "progress_bar");
            let (x, y, width, height) = bbox(item);
            (w.x, w.y, w.width, w.height) = (x, y, width, height);
            w.props.insert("bar_height".into(), (height as i64).into());
            w.props.insert(
                "show_percentage".into(),
                getb(item, "show_percentage", true).into(),
            );
            w.props
                .insert("color".into(), gets(item, &["fill"], "black").into());
            w.props
                .insert("border_width".into(), geti(item, &["width"], 1).into());
            if let Some(progress) = item.get("progress").and_then(Value::as_str) {
                if let Some(caps) = entity_re().captures(progress) {
                    w.entity_id = caps[1].to_string();
                }
            }
            w
        }
        "debug_grid" => {
            let mut w = Widget::new(widget_id(item, format!("grid_{index}")), "debug_grid");
            w.props
                .insert("spacing".into(), geti(item, &["spacing"], 20).into());
            w
        }
        "dlimg" | "image" => {
            let mut w = Widget::new(widget_id(item, format!("image_{index}")), "online_image");
            w.x = geti(item, &["x"], 0) as i32;
            w.y = geti(item, &["y"], 0) as i32;
            w.width = geti(item, &["xsize"], 120) as i32;
            w.height = geti(item, &["ysize"], 120) as i32;
            w.props.insert("url".into(), gets(item, &["url"], "").into());
            w.props
                .insert("rotation".into(), geti(item, &["rotate"], 0).into());
            w
        }
        "polygon" => {
            let mut w = Widget::new(widget_id(item, format!("polygon_{index}")), "odp_polygon");
            let points: Vec<(i64, i64)> = item
                .get("points")
                .and_then(Value::as_array)
                .map(|pts| {
                    pts.iter()
                        .filter_map(|p| {
                            let arr = p.as_array()?;
                            Some((arr.first()?.as_i64()?, arr.get(1)?.as_i64()?))
                        })
                        .collect()
                })
                .unwrap_or_default();
            if points.is_empty() {
                warnings.push(Warning::new(
                    format!("polygon item {index} has no usable points, skipped"),
                    0,
                ));
                return None;
            }
            let min_x = points.iter().map(|p| p.0).min().unwrap_or(0);
            let min_y = points.iter().map(|p| p.1).min().unwrap_or(0);
            let max_x = points.iter().map(|p| p.0).max().unwrap_or(0);
            let max_y = points.iter().map(|p| p.1).max().unwrap_or(0);
            w.x = min_x as i32;
            w.y = min_y as i32;
            w.width = (max_x - min_x) as i32;
            w.height = (max_y - min_y) as i32;
            let rel: Vec<PropValue> = points
                .iter()
                .map(|(px, py)| PropValue::Str(format!("{},{}", px - min_x, py - min_y)))
                .collect();
            w.props.insert("points".into(), PropValue::List(rel));
            let fill_color = gets(item, &["fill"], "");
            w.props.insert("fill".into(), (!fill_color.is_empty()).into());
            w.props.insert(
                "color".into(),
                if fill_color.is_empty() {
                    gets(item, &["outline"], "black").into()
                } else {
                    fill_color.into()
                },
            );
            w.props.insert("width".into(), geti(item, &["width"], 1).into());
            w
        }
        "arc" => {
            let mut w = Widget::new(widget_id(item, format!("arc_{index}")), "odp_arc");
            let r = geti(item, &["radius"], 40) as i32;
            w.x = geti(item, &["x"], 0) as i32 - r;
            w.y = geti(item, &["y"], 0) as i32 - r;
            w.width = 2 * r;
            w.height = 2 * r;
            w.props.insert(
                "start_angle".into(),
                geti(item, &["start_angle", "start"], 0).into(),
            );
            w.props.insert(
                "end_angle".into(),
                geti(item, &["end_angle", "end"], 270).into(),
            );
            w.props.insert("width".into(), geti(item, &["width"], 3).into());
            w.props
                .insert("color".into(), gets(item, &["color", "fill"], "black").into());
            w
        }
        "icon_sequence" => {
            let mut w = Widget::new(
                widget_id(item, format!("icon_seq_{index}")),
                "odp_icon_sequence",
            );
            let icons: Vec<PropValue> = item
                .get("icons")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(Value::as_str)
                        .map(PropValue::from)
                        .collect()
                })
                .unwrap_or_default();
            let count = icons.len().max(1) as i32;
            let size = geti(item, &["size"], 32) as i32;
            let spacing = geti(item, &["spacing"], 4) as i32;
            let horizontal = gets(item, &["direction"], "horizontal") == "horizontal";
            w.x = geti(item, &["x"], 0) as i32;
            w.y = geti(item, &["y"], 0) as i32;
            let run = count * size + (count - 1) * spacing;
            w.width = if horizontal { run } else { size };
            w.height = if horizontal { size } else { run };
            w.props.insert("icons".into(), PropValue::List(icons));
            w.props.insert("size".into(), (size as i64).into());
            w.props.insert("spacing".into(), (spacing as i64).into());
            w.props.insert(
                "direction".into(),
                gets(item, &["direction"], "horizontal").into(),
            );
            w.props
                .insert("color".into(), gets(item, &["color"], "black").into());
            w
        }
        "rectangle_pattern" => {
            let mut w = Widget::new(
                widget_id(item, format!("pattern_{index}")),
                "odp_rectangle_pattern",
            );
            let x_size = geti(item, &["x_size"], 20);
            let y_size = geti(item, &["y_size"], 20);
            let x_repeat = geti(item, &["x_repeat"], 1).max(1);
            let y_repeat = geti(item, &["y_repeat"], 1).max(1);
            let x_offset = geti(item, &["x_offset"], 0);
            let y_offset = geti(item, &["y_offset"], 0);
            w.x = geti(item, &["x_start"], 0) as i32;
            w.y = geti(item, &["y_start"], 0) as i32;
            w.width = (x_size * x_repeat + x_offset * (x_repeat - 1)) as i32;
            w.height = (y_size * y_repeat + y_offset * (y_repeat - 1)) as i32;
            for key in ["x_size", "y_size", "x_repeat", "y_repeat", "x_offset", "y_offset"] {
                w.props.insert(key.into(), geti(item, &[key], 0).into());
            }
            shared_fill_props(&mut w, item);
            w
        }
        "plot" => {
            let mut w = Widget::new(widget_id(item, format!("plot_{index}")), "odp_plot");
            let (x, y, width, height) = bbox(item);
            (w.x, w.y, w.width, w.height) = (x, y, width, height);
            w.props
                .insert("duration".into(), geti(item, &["duration"], 3600).into());
            if let Some(entity) = item
                .get("data")
                .and_then(Value::as_array)
                .and_then(|d| d.first())
                .and_then(|d| d.get("entity"))
                .and_then(Value::as_str)
            {
                w.entity_id = entity.to_string();
            }
            w
        }
        other => {
            warnings.push(Warning::new(
                format!("unknown payload item type '{other}', skipped"),
                0,
            ));
            return None;
        }
    };
    // Text-family anchors shift the stored point away from top-left.
    if kind == "text" {
        let anchor = gets(item, &["anchor"], "lt");
        if anchor != "lt" {
            PluginRegistry::shared().apply_defaults(&mut w);
            unanchor(&mut w, &anchor);
        }
    }
    Some(w)
}

/// Build a single-page layout from a bare payload array.
pub fn payload_to_layout(
    items: &[Value],
    registry: &PluginRegistry,
    warnings: &mut Vec<Warning>,
) -> Layout {
    let mut page = Page::new("page_0", "Imported");
    for (index, item) in items.iter().enumerate() {
        if !item.is_object() {
            warnings.push(Warning::new(
                format!("payload item {index} is not an object, skipped"),
                0,
            ));
            continue;
        }
        if let Some(mut widget) = convert_item(item, index, warnings) {
            registry.apply_defaults(&mut widget);
            page.widgets.push(widget);
        }
    }
    let mut layout = Layout::default();
    layout.pages.push(page);
    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn import(items: serde_json::Value) -> (Layout, Vec<Warning>) {
        let mut warnings = Vec::new();
        let layout = payload_to_layout(
            items.as_array().unwrap(),
            PluginRegistry::shared(),
            &mut warnings,
        );
        (layout, warnings)
    }

    #[test]
    fn test_rectangle_geometry_and_props() {
        let (layout, _) = import(json!([
            {"type": "rectangle", "x_start": 26, "y_start": 93, "x_end": 126, "y_end": 143}
        ]));
        let w = &layout.pages[0].widgets[0];
        assert_eq!(w.kind, "shape_rect");
        assert_eq!((w.x, w.y, w.width, w.height), (26, 93, 100, 50));
        assert_eq!(w.prop_bool("fill", true), false);
        assert_eq!(w.prop_i64("border_width", 0), 1);
        assert_eq!(w.prop_str("color", ""), "white");
        assert_eq!(w.prop_str("border_color", ""), "black");
    }

    #[test]
    fn test_white_fill_means_unfilled() {
        let (layout, _) = import(json!([
            {"type": "rectangle", "x_start": 26, "y_start": 93, "x_end": 126, "y_end": 143,
             "fill": "white", "outline": "black", "width": 1}
        ]));
        let w = &layout.pages[0].widgets[0];
        assert_eq!(w.kind, "shape_rect");
        assert_eq!((w.x, w.y, w.width, w.height), (26, 93, 100, 50));
        assert_eq!(w.prop_bool("fill", true), false);
        assert_eq!(w.prop_str("color", ""), "white");
        assert_eq!(w.prop_i64("border_width", 0), 1);
        assert_eq!(w.prop_str("border_color", ""), "black");
    }

    #[test]
    fn test_circle_center_radius_inversion() {
        let (layout, _) = import(json!([
            {"type": "circle", "x": 185, "y": 124, "radius": 25}
        ]));
        let w = &layout.pages[0].widgets[0];
        assert_eq!((w.x, w.y, w.width, w.height), (160, 99, 50, 50));
    }

    #[test]
    fn test_qrcode_side_from_modules() {
        let (layout, _) = import(json!([
            {"type": "qrcode", "x": 10, "y": 10, "boxsize": 4, "border": 2, "data": "https://x"}
        ]));
        let w = &layout.pages[0].widgets[0];
        assert_eq!(w.width, 116);
        assert_eq!(w.prop_str("value", ""), "https://x");
    }

    #[test]
    fn test_text_template_becomes_sensor_text() {
        let (layout, _) = import(json!([
            {"type": "text", "x": 5, "y": 6, "value": "Temp: {{ states('sensor.kitchen') }} C"}
        ]));
        let w = &layout.pages[0].widgets[0];
        assert_eq!(w.kind, "sensor_text");
        assert_eq!(w.entity_id, "sensor.kitchen");
        assert_eq!(w.prop_str("prefix", ""), "Temp: ");
        assert_eq!(w.prop_str("postfix", ""), " C");
    }

    #[test]
    fn test_plain_text_stays_text() {
        let (layout, _) = import(json!([
            {"type": "text", "x": 5, "y": 6, "value": "Hello", "size": 28}
        ]));
        let w = &layout.pages[0].widgets[0];
        assert_eq!(w.kind, "text");
        assert_eq!(w.prop_i64("font_size", 0), 28);
        // Defaults fill in everything the item omitted.
        assert_eq!(w.prop_str("font_family", ""), "Roboto");
    }

    #[test]
    fn test_polygon_points_renormalized() {
        let (layout, _) = import(json!([
            {"type": "polygon", "points": [[100, 90], [125, 50], [150, 90]]}
        ]));
        let w = &layout.pages[0].widgets[0];
        assert_eq!((w.x, w.y, w.width, w.height), (100, 50, 50, 40));
        let pts = w.prop("points").and_then(PropValue::as_list).unwrap();
        assert_eq!(pts[0].to_plain_string(), "0,40");
        assert_eq!(pts[1].to_plain_string(), "25,0");
    }

    #[test]
    fn test_progress_entity_recovered_from_template() {
        let (layout, _) = import(json!([
            {"type": "progress_bar", "x_start": 0, "y_start": 10, "x_end": 150, "y_end": 25,
             "progress": "{{ states('sensor.battery') | int(0) }}"}
        ]));
        let w = &layout.pages[0].widgets[0];
        assert_eq!(w.entity_id, "sensor.battery");
        assert_eq!(w.prop_i64("bar_height", 0), 15);
    }

    #[test]
    fn test_unknown_item_skipped_with_warning() {
        let (layout, warnings) = import(json!([
            {"type": "hologram", "x": 0},
            {"type": "text", "value": "ok"}
        ]));
        assert_eq!(layout.pages[0].widgets.len(), 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("hologram"));
    }

    #[test]
    fn test_item_id_is_preserved() {
        let (layout, _) = import(json!([
            {"type": "text", "value": "x", "id": "w_greeting"}
        ]));
        assert_eq!(layout.pages[0].widgets[0].id, "w_greeting");
    }

    #[test]
    fn test_line_orientation_detection() {
        let (layout, _) = import(json!([
            {"type": "line", "x_start": 10, "y_start": 50, "x_end": 110, "y_end": 50, "width": 3}
        ]));
        let w = &layout.pages[0].widgets[0];
        assert_eq!(w.kind, "line");
        assert_eq!(w.prop_str("orientation", ""), "horizontal");
        assert_eq!(w.prop_i64("stroke_width", 0), 3);
    }
}
