//! Rebuild widgets from marker lines.
//!
//! Markers written by older exporters used shorter field names for
//! several properties; each widget family resolves its alias chain
//! here. Unrecognized fields are kept, with scalar values coerced to
//! their natural type unless the property is string-typed.

use regex::Regex;
use std::sync::OnceLock;

use crate::marker::Marker;
use crate::models::{PropValue, Widget};
use crate::plugins::PluginRegistry;

/// Properties whose values are always text, never coerced. A text
/// widget containing "42" must stay a string.
const STRING_PROPS: &[&str] = &[
    "text",
    "title",
    "value",
    "prefix",
    "postfix",
    "unit",
    "separator",
    "format",
    "value_format",
    "time_format",
    "date_format",
    "options",
    "points",
    "url",
    "path",
    "code",
    "delimiter",
];

fn unit_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(-?\d+(?:\.\d+)?)(ms|deg|px|%)$").unwrap())
}

/// Coerce a marker field value to a typed property.
pub fn coerce(key: &str, raw: &str) -> PropValue {
    if STRING_PROPS.contains(&key) {
        return PropValue::Str(raw.replace("\\n", "\n"));
    }
    match raw {
        "true" => return PropValue::Bool(true),
        "false" => return PropValue::Bool(false),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return PropValue::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return PropValue::Float(f);
    }
    if let Some(caps) = unit_re().captures(raw) {
        if let Ok(f) = caps[1].parse::<f64>() {
            if f.fract() == 0.0 {
                return PropValue::Int(f as i64);
            }
            return PropValue::Float(f);
        }
    }
    PropValue::Str(raw.replace("\\n", "\n"))
}

/// Canvas size when a marker (or recovered block) has no geometry.
/// Known plugins answer for themselves; a few marker-only types carry
/// historical sizes.
pub fn default_dims(kind: &str, registry: &PluginRegistry) -> (i32, i32) {
    match kind {
        "template_nav_bar" => (200, 50),
        "battery_icon" | "wifi_signal" => (60, 60),
        k if k.starts_with("nav_") => (80, 80),
        _ => registry
            .get(kind)
            .map(|p| p.default_size())
            .unwrap_or((100, 30)),
    }
}

/// First marker field present from an alias chain, as an i64 prop.
fn alias_i64(widget: &mut Widget, marker: &Marker, prop: &str, aliases: &[&str], default: i64) {
    let value = aliases
        .iter()
        .find_map(|k| marker.get(k))
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|v| v.round() as i64)
        .unwrap_or(default);
    widget.props.insert(prop.to_string(), value.into());
}

fn alias_str(widget: &mut Widget, marker: &Marker, prop: &str, aliases: &[&str]) {
    if let Some(value) = aliases.iter().find_map(|k| marker.get(k)) {
        widget
            .props
            .insert(prop.to_string(), coerce(prop, value));
    }
}

/// Fields consumed by the common widget envelope, never props.
const ENVELOPE_FIELDS: &[&str] = &[
    "id", "x", "y", "w", "h", "align", "title", "entity", "ent", "entity_2", "ent2", "cond_ent",
    "cond_op", "cond_state", "cond_min", "cond_max", "locked", "hidden",
];

/// Build a widget from a parsed marker. `fallback_id` is used when the
/// marker has no id field.
pub fn widget_from_marker(
    marker: &Marker,
    fallback_id: &str,
    registry: &PluginRegistry,
) -> Widget {
    let mut w = Widget::new(
        marker.get("id").unwrap_or(fallback_id).to_string(),
        marker.kind.clone(),
    );
    let (dw, dh) = default_dims(&marker.kind, registry);
    w.x = marker.get_i32("x").unwrap_or(0);
    w.y = marker.get_i32("y").unwrap_or(0);
    w.width = marker.get_i32("w").unwrap_or(dw);
    w.height = marker.get_i32("h").unwrap_or(dh);
    if let Some(title) = marker.get("title") {
        w.title = title.to_string();
    }
    if let Some(entity) = marker.get_any(&["entity", "ent"]) {
        w.entity_id = entity.to_string();
    }
    if let Some(entity) = marker.get_any(&["entity_2", "ent2"]) {
        w.entity_id_2 = entity.to_string();
    }
    if let Some(v) = marker.get("cond_ent") {
        w.condition_entity = v.to_string();
    }
    if let Some(v) = marker.get("cond_op") {
        w.condition_operator = v.to_string();
    }
    if let Some(v) = marker.get("cond_state") {
        w.condition_state = v.to_string();
    }
    if let Some(v) = marker.get("cond_min") {
        w.condition_min = v.to_string();
    }
    if let Some(v) = marker.get("cond_max") {
        w.condition_max = v.to_string();
    }
    w.locked = marker.get("locked") == Some("true");
    w.hidden = marker.get("hidden") == Some("true");

    let mut consumed: Vec<&str> = ENVELOPE_FIELDS.to_vec();
    let canonical = registry.canonical(&marker.kind).unwrap_or("");
    match canonical {
        "text" => {
            alias_i64(&mut w, marker, "font_size", &["font_size", "size"], 20);
            alias_str(&mut w, marker, "font_family", &["font_family", "font"]);
            consumed.extend(["font_size", "size", "font_family", "font"]);
        }
        "datetime" => {
            alias_i64(
                &mut w,
                marker,
                "time_font_size",
                &["time_font_size", "time_size", "time_font"],
                28,
            );
            alias_i64(
                &mut w,
                marker,
                "date_font_size",
                &["date_font_size", "date_size", "date_font"],
                16,
            );
            consumed.extend([
                "time_font_size",
                "time_size",
                "time_font",
                "date_font_size",
                "date_size",
                "date_font",
            ]);
        }
        "sensor_text" => {
            alias_i64(
                &mut w,
                marker,
                "label_font_size",
                &["label_font_size", "label_font"],
                14,
            );
            alias_i64(
                &mut w,
                marker,
                "value_font_size",
                &["value_font_size", "value_font"],
                20,
            );
            alias_str(&mut w, marker, "value_format", &["value_format", "format"]);
            if marker.get("font_style") == Some("italic") {
                w.props.insert("italic".to_string(), true.into());
            }
            consumed.extend([
                "label_font_size",
                "label_font",
                "value_font_size",
                "value_font",
                "value_format",
                "format",
                "font_style",
            ]);
        }
        "shape_rect" | "rounded_rect" | "shape_circle" => {
            alias_i64(&mut w, marker, "border_width", &["border_width", "border"], 1);
            consumed.extend(["border_width", "border"]);
        }
        "line" => {
            alias_i64(&mut w, marker, "stroke_width", &["stroke_width", "stroke"], 3);
            consumed.extend(["stroke_width", "stroke"]);
        }
        "progress_bar" => {
            alias_i64(&mut w, marker, "bar_height", &["bar_height", "bar_h"], 15);
            if let Some(v) = marker.get_any(&["show_percentage", "show_pct"]) {
                w.props
                    .insert("show_percentage".to_string(), (v == "true").into());
            }
            consumed.extend(["bar_height", "bar_h", "show_percentage", "show_pct"]);
        }
        _ => {}
    }

    if let Some(align) = marker.get("align") {
        w.props
            .insert("text_align".to_string(), PropValue::Str(align.to_string()));
    }
    for (key, value) in &marker.fields {
        if consumed.contains(&key.as_str()) || w.props.contains_key(key) {
            continue;
        }
        let prop = match key.as_str() {
            "points" => PropValue::List(
                value
                    .split_whitespace()
                    .map(|p| PropValue::Str(p.to_string()))
                    .collect(),
            ),
            "options" => PropValue::List(
                value
                    .split("\\n")
                    .map(|p| PropValue::Str(p.to_string()))
                    .collect(),
            ),
            _ => coerce(key, value),
        };
        w.props.insert(key.clone(), prop);
    }
    registry.apply_defaults(&mut w);
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::parse_marker;

    fn rebuild(line: &str) -> Widget {
        let m = parse_marker(line).unwrap();
        widget_from_marker(&m, "w_fallback", PluginRegistry::shared())
    }

    #[test]
    fn test_datetime_alias_chain() {
        let w = rebuild("// widget:datetime id:w1 x:10 y:20 w:120 h:50 align:CENTER time_size:36");
        assert_eq!(w.kind, "datetime");
        assert_eq!(w.prop_i64("time_font_size", 0), 36);
        // Missing date size falls back through the chain default.
        assert_eq!(w.prop_i64("date_font_size", 0), 16);
        assert_eq!(w.prop_str("color", ""), "black");
        assert_eq!(w.prop_str("text_align", ""), "CENTER");
    }

    #[test]
    fn test_datetime_defaults_without_sizes() {
        let w = rebuild("// widget:datetime id:w1 x:0 y:0 format:time_only");
        assert_eq!(w.prop_i64("time_font_size", 0), 28);
        assert_eq!(w.prop_str("format", ""), "time_only");
        assert_eq!((w.width, w.height), (200, 60));
    }

    #[test]
    fn test_text_numeric_string_not_coerced() {
        let w = rebuild(r#"// widget:text id:t1 x:0 y:0 w:50 h:20 text:"42""#);
        assert_eq!(w.prop("text"), Some(&PropValue::Str("42".to_string())));
    }

    #[test]
    fn test_generic_coercion_and_units() {
        let w = rebuild("// widget:text id:t1 x:0 y:0 w:1 h:1 pad:12px ratio:1.5 on:true");
        assert_eq!(w.prop_i64("pad", 0), 12);
        assert_eq!(w.prop_f64("ratio", 0.0), 1.5);
        assert_eq!(w.prop_bool("on", false), true);
    }

    #[test]
    fn test_envelope_fields() {
        let w = rebuild(
            "// widget:sensor_text id:s1 x:1 y:2 w:3 h:4 ent:sensor.a title:Temp cond_ent:binary_sensor.x cond_op:!= cond_state:on locked:true",
        );
        assert_eq!(w.entity_id, "sensor.a");
        assert_eq!(w.title, "Temp");
        assert_eq!(w.condition_entity, "binary_sensor.x");
        assert_eq!(w.condition_operator, "!=");
        assert!(w.locked);
        assert!(!w.props.contains_key("ent"));
        assert!(!w.props.contains_key("cond_op"));
    }

    #[test]
    fn test_unknown_kind_passes_through() {
        let w = rebuild("// widget:battery_icon id:b1 x:0 y:0 show_pct:true");
        assert_eq!(w.kind, "battery_icon");
        assert_eq!((w.width, w.height), (60, 60));
        assert_eq!(w.prop_bool("show_pct", false), true);
    }

    #[test]
    fn test_progress_bar_aliases() {
        let w = rebuild("// widget:progress_bar id:p1 x:0 y:0 w:150 h:40 bar_h:20 show_pct:false");
        assert_eq!(w.prop_i64("bar_height", 0), 20);
        assert_eq!(w.prop_bool("show_percentage", true), false);
    }

    #[test]
    fn test_options_and_points_lists() {
        let w = rebuild(r#"// widget:lvgl_roller id:r1 x:0 y:0 options:"One\nTwo\nThree""#);
        let options = w.prop("options").and_then(PropValue::as_list).unwrap();
        assert_eq!(options.len(), 3);
        assert_eq!(options[1].to_plain_string(), "Two");
    }
}
