//! Text-family plugins: static text, sensor readouts, clocks and
//! multi-line blocks.

use serde_json::json;

use super::{c_escape, props, sanitize_ident, str_escape, Plugin};
use crate::export::{
    anchor_x, anchor_y, item, split_align, text_align_const, DeclarativeNode, ExportContext,
    FontSpec, HAlign, PayloadItem, Requirements, VAlign,
};
use crate::models::Widget;

/// PIL-style anchor string for payload text items.
fn pil_anchor(h: HAlign, v: VAlign) -> &'static str {
    match (h, v) {
        (HAlign::Left, VAlign::Top) => "lt",
        (HAlign::Left, VAlign::Center) => "lm",
        (HAlign::Left, VAlign::Bottom) => "ls",
        (HAlign::Center, VAlign::Top) => "mt",
        (HAlign::Center, VAlign::Center) => "mm",
        (HAlign::Center, VAlign::Bottom) => "ms",
        (HAlign::Right, VAlign::Top) => "rt",
        (HAlign::Right, VAlign::Center) => "rm",
        (HAlign::Right, VAlign::Bottom) => "rs",
    }
}

fn font_spec(widget: &Widget, size_key: &str, default_size: i64) -> FontSpec {
    FontSpec {
        family: widget.prop_str("font_family", "Roboto").to_string(),
        weight: widget.prop_i64("font_weight", 400) as u16,
        size: widget.prop_i64(size_key, default_size),
        italic: widget.prop_bool("italic", false),
    }
}

/// A positioned payload text item without its value.
fn text_item(widget: &Widget, ctx: &ExportContext, size: i64, color: &str) -> PayloadItem {
    let (h, v) = split_align(widget.prop_str("text_align", "TOP_LEFT"));
    let mut map = item("text");
    map.insert("x".into(), json!(anchor_x(widget, h)));
    map.insert("y".into(), json!(anchor_y(widget, v)));
    map.insert("size".into(), json!(size));
    map.insert("font".into(), json!("ppb.ttf"));
    map.insert("color".into(), json!(ctx.resolve_color(color)));
    map.insert("anchor".into(), json!(pil_anchor(h, v)));
    map
}

/// Static text.
pub struct TextPlugin;

impl Plugin for TextPlugin {
    fn kind(&self) -> &'static str {
        "text"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("text", "Text".into()),
            ("font_size", 20.into()),
            ("font_family", "Roboto".into()),
            ("font_weight", 400.into()),
            ("italic", false.into()),
            ("color", "theme_auto".into()),
            ("text_align", "TOP_LEFT".into()),
            ("bg_color", "transparent".into()),
        ])
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let text = widget.prop_str("text", "");
        let size = widget.prop_i64("font_size", 20);
        // Embedded newlines switch to the multiline item so the device
        // spaces the lines itself.
        if text.contains('\n') {
            let mut map = item("multiline");
            let (h, v) = split_align(widget.prop_str("text_align", "TOP_LEFT"));
            map.insert("value".into(), json!(text.replace('\n', "|")));
            map.insert("delimiter".into(), json!("|"));
            map.insert("offset_y".into(), json!(size + 5));
            map.insert("x".into(), json!(anchor_x(widget, h)));
            map.insert("start_y".into(), json!(anchor_y(widget, v)));
            map.insert("size".into(), json!(size));
            map.insert("font".into(), json!("ppb.ttf"));
            map.insert(
                "color".into(),
                json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
            );
            return Some(vec![map]);
        }
        let mut map = text_item(widget, ctx, size, widget.prop_str("color", "theme_auto"));
        map.insert("value".into(), json!(text));
        Some(vec![map])
    }

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        let (h, v) = split_align(widget.prop_str("text_align", "TOP_LEFT"));
        let font = font_spec(widget, "font_size", 20);
        let color = ctx.color_const(widget.prop_str("color", "theme_auto"));
        let mut lines = Vec::new();
        let bg = widget.prop_str("bg_color", "transparent");
        if bg != "transparent" {
            lines.push(format!(
                "it.filled_rectangle({}, {}, {}, {}, {});",
                widget.x,
                widget.y,
                widget.width,
                widget.height,
                ctx.color_const(bg)
            ));
        }
        lines.push(format!(
            "it.printf({}, {}, id({}), {}, {}, \"{}\");",
            anchor_x(widget, h),
            anchor_y(widget, v),
            font.font_id(),
            color,
            text_align_const(h, v),
            c_escape(widget.prop_str("text", ""))
        ));
        Some(lines)
    }

    fn export_declarative(&self, widget: &Widget, ctx: &ExportContext) -> Option<DeclarativeNode> {
        let mut body = PayloadItem::new();
        body.insert("x".into(), json!(widget.x));
        body.insert("y".into(), json!(widget.y));
        body.insert("width".into(), json!(widget.width));
        body.insert("height".into(), json!(widget.height));
        body.insert("text".into(), json!(widget.prop_str("text", "")));
        body.insert(
            "text_color".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
        Some(DeclarativeNode {
            tag: "label".to_string(),
            body,
        })
    }

    fn collect_requirements(&self, widget: &Widget, reqs: &mut Requirements) {
        reqs.fonts.insert(font_spec(widget, "font_size", 20));
    }
}

/// Entity state readout with optional label line.
pub struct SensorTextPlugin;

impl Plugin for SensorTextPlugin {
    fn kind(&self) -> &'static str {
        "sensor_text"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("value_format", "label_value".into()),
            ("label_font_size", 14.into()),
            ("value_font_size", 20.into()),
            ("font_family", "Roboto".into()),
            ("italic", false.into()),
            ("color", "theme_auto".into()),
            ("text_align", "TOP_LEFT".into()),
            ("precision", 2.into()),
            ("prefix", "".into()),
            ("postfix", "".into()),
            ("unit", "".into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (140, 40)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        if widget.entity_id.is_empty() {
            return Some(Vec::new());
        }
        let color = widget.prop_str("color", "theme_auto");
        let mut items = Vec::new();
        let label_size = widget.prop_i64("label_font_size", 14);
        let value_size = widget.prop_i64("value_font_size", 20);
        let show_label = widget.prop_str("value_format", "label_value") == "label_value"
            && !widget.title.is_empty();
        if show_label {
            let mut label = text_item(widget, ctx, label_size, color);
            label.insert("value".into(), json!(widget.title.clone()));
            items.push(label);
        }
        let value = format!(
            "{}{{{{ states('{}') }}}}{}",
            widget.prop_str("prefix", ""),
            widget.entity_id,
            widget.prop_str("postfix", "")
        );
        let mut map = text_item(widget, ctx, value_size, color);
        if show_label {
            // Drop the value line below the label.
            let y = map.get("y").and_then(|v| v.as_i64()).unwrap_or(0);
            map.insert("y".into(), json!(y + label_size + 2));
        }
        map.insert("value".into(), json!(value));
        items.push(map);
        Some(items)
    }

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        if widget.entity_id.is_empty() {
            return Some(Vec::new());
        }
        let (h, v) = split_align(widget.prop_str("text_align", "TOP_LEFT"));
        let color = ctx.color_const(widget.prop_str("color", "theme_auto"));
        let label_size = widget.prop_i64("label_font_size", 14);
        let sensor = sanitize_ident(&widget.entity_id);
        let mut lines = Vec::new();
        let show_label = widget.prop_str("value_format", "label_value") == "label_value"
            && !widget.title.is_empty();
        let mut value_y = anchor_y(widget, v);
        if show_label {
            let label_font = font_spec(widget, "label_font_size", 14);
            lines.push(format!(
                "it.printf({}, {}, id({}), {}, {}, \"{}\");",
                anchor_x(widget, h),
                value_y,
                label_font.font_id(),
                color,
                text_align_const(h, v),
                c_escape(&widget.title)
            ));
            value_y += label_size as i32 + 2;
        }
        let value_font = font_spec(widget, "value_font_size", 20);
        let precision = widget.prop_i64("precision", 2);
        lines.push(format!(
            "it.printf({}, {}, id({}), {}, {}, \"{}%.{}f{}\", id({}).state);",
            anchor_x(widget, h),
            value_y,
            value_font.font_id(),
            color,
            text_align_const(h, v),
            c_escape(widget.prop_str("prefix", "")),
            precision,
            c_escape(widget.prop_str("unit", "")),
            sensor
        ));
        Some(lines)
    }

    fn export_declarative(&self, widget: &Widget, ctx: &ExportContext) -> Option<DeclarativeNode> {
        let mut body = PayloadItem::new();
        body.insert("x".into(), json!(widget.x));
        body.insert("y".into(), json!(widget.y));
        body.insert("width".into(), json!(widget.width));
        body.insert("height".into(), json!(widget.height));
        let label = if widget.title.is_empty() {
            widget.entity_id.clone()
        } else {
            widget.title.clone()
        };
        body.insert("text".into(), json!(label));
        body.insert(
            "text_color".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
        Some(DeclarativeNode {
            tag: "label".to_string(),
            body,
        })
    }

    fn collect_requirements(&self, widget: &Widget, reqs: &mut Requirements) {
        reqs.fonts.insert(font_spec(widget, "value_font_size", 20));
        if widget.prop_str("value_format", "label_value") == "label_value" {
            reqs.fonts.insert(font_spec(widget, "label_font_size", 14));
        }
    }
}

/// Clock widget: time, date or both.
pub struct DatetimePlugin;

impl DatetimePlugin {
    fn shows_time(widget: &Widget) -> bool {
        widget.prop_str("format", "time_date") != "date_only"
    }

    fn shows_date(widget: &Widget) -> bool {
        widget.prop_str("format", "time_date") != "time_only"
    }
}

impl Plugin for DatetimePlugin {
    fn kind(&self) -> &'static str {
        "datetime"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("format", "time_date".into()),
            ("time_format", "%H:%M".into()),
            ("date_format", "%a %d %b".into()),
            ("time_font_size", 28.into()),
            ("date_font_size", 16.into()),
            ("font_family", "Roboto".into()),
            ("italic", false.into()),
            ("color", "black".into()),
            ("text_align", "CENTER".into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (200, 60)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let color = widget.prop_str("color", "black");
        let time_size = widget.prop_i64("time_font_size", 28);
        let date_size = widget.prop_i64("date_font_size", 16);
        let mut items = Vec::new();
        if Self::shows_time(widget) {
            let mut map = text_item(widget, ctx, time_size, color);
            map.insert(
                "value".into(),
                json!(format!(
                    "{{{{ now().strftime('{}') }}}}",
                    widget.prop_str("time_format", "%H:%M")
                )),
            );
            items.push(map);
        }
        if Self::shows_date(widget) {
            let mut map = text_item(widget, ctx, date_size, color);
            if Self::shows_time(widget) {
                let y = map.get("y").and_then(|v| v.as_i64()).unwrap_or(0);
                map.insert("y".into(), json!(y + time_size + 4));
            }
            map.insert(
                "value".into(),
                json!(format!(
                    "{{{{ now().strftime('{}') }}}}",
                    widget.prop_str("date_format", "%a %d %b")
                )),
            );
            items.push(map);
        }
        Some(items)
    }

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        let (h, v) = split_align(widget.prop_str("text_align", "CENTER"));
        let color = ctx.color_const(widget.prop_str("color", "black"));
        let mut lines = Vec::new();
        let mut y = anchor_y(widget, v);
        if Self::shows_time(widget) {
            let font = font_spec(widget, "time_font_size", 28);
            lines.push(format!(
                "it.strftime({}, {}, id({}), {}, {}, \"{}\", id(ha_time).now());",
                anchor_x(widget, h),
                y,
                font.font_id(),
                color,
                text_align_const(h, v),
                str_escape(widget.prop_str("time_format", "%H:%M"))
            ));
            y += widget.prop_i64("time_font_size", 28) as i32 + 4;
        }
        if Self::shows_date(widget) {
            let font = font_spec(widget, "date_font_size", 16);
            lines.push(format!(
                "it.strftime({}, {}, id({}), {}, {}, \"{}\", id(ha_time).now());",
                anchor_x(widget, h),
                y,
                font.font_id(),
                color,
                text_align_const(h, v),
                str_escape(widget.prop_str("date_format", "%a %d %b"))
            ));
        }
        Some(lines)
    }

    fn export_declarative(&self, widget: &Widget, ctx: &ExportContext) -> Option<DeclarativeNode> {
        let mut body = PayloadItem::new();
        body.insert("x".into(), json!(widget.x));
        body.insert("y".into(), json!(widget.y));
        body.insert("width".into(), json!(widget.width));
        body.insert("height".into(), json!(widget.height));
        body.insert("text".into(), json!(widget.prop_str("time_format", "%H:%M")));
        body.insert(
            "text_color".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "black"))),
        );
        Some(DeclarativeNode {
            tag: "label".to_string(),
            body,
        })
    }

    fn collect_requirements(&self, widget: &Widget, reqs: &mut Requirements) {
        if Self::shows_time(widget) {
            reqs.fonts.insert(font_spec(widget, "time_font_size", 28));
        }
        if Self::shows_date(widget) {
            reqs.fonts.insert(font_spec(widget, "date_font_size", 16));
        }
    }
}

/// Delimiter-split text block.
pub struct MultilinePlugin;

impl Plugin for MultilinePlugin {
    fn kind(&self) -> &'static str {
        "odp_multiline"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("text", "Line 1|Line 2".into()),
            ("delimiter", "|".into()),
            ("offset_y", 25.into()),
            ("font_size", 20.into()),
            ("font_family", "Roboto".into()),
            ("color", "theme_auto".into()),
            ("text_align", "TOP_LEFT".into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (160, 80)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let (h, v) = split_align(widget.prop_str("text_align", "TOP_LEFT"));
        let mut map = item("multiline");
        map.insert("value".into(), json!(widget.prop_str("text", "")));
        map.insert("delimiter".into(), json!(widget.prop_str("delimiter", "|")));
        map.insert("offset_y".into(), json!(widget.prop_i64("offset_y", 25)));
        map.insert("x".into(), json!(anchor_x(widget, h)));
        map.insert("start_y".into(), json!(anchor_y(widget, v)));
        map.insert("size".into(), json!(widget.prop_i64("font_size", 20)));
        map.insert("font".into(), json!("ppb.ttf"));
        map.insert(
            "color".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
        Some(vec![map])
    }

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        let (h, v) = split_align(widget.prop_str("text_align", "TOP_LEFT"));
        let font = font_spec(widget, "font_size", 20);
        let color = ctx.color_const(widget.prop_str("color", "theme_auto"));
        let delimiter = widget.prop_str("delimiter", "|").to_string();
        let offset = widget.prop_i64("offset_y", 25) as i32;
        let mut y = anchor_y(widget, v);
        let mut lines = Vec::new();
        let text = widget.prop_str("text", "").to_string();
        let parts: Vec<&str> = if delimiter.is_empty() {
            vec![text.as_str()]
        } else {
            text.split(delimiter.as_str()).collect()
        };
        for part in parts {
            lines.push(format!(
                "it.printf({}, {}, id({}), {}, {}, \"{}\");",
                anchor_x(widget, h),
                y,
                font.font_id(),
                color,
                text_align_const(h, v),
                c_escape(part)
            ));
            y += offset;
        }
        Some(lines)
    }

    fn collect_requirements(&self, widget: &Widget, reqs: &mut Requirements) {
        reqs.fonts.insert(font_spec(widget, "font_size", 20));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceSettings, Page};

    fn ctx_parts() -> (DeviceSettings, Page) {
        (DeviceSettings::default(), Page::default())
    }

    #[test]
    fn test_text_payload_anchoring() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let mut w = Widget::new("t1", "text");
        w.x = 10;
        w.y = 20;
        w.width = 100;
        w.height = 40;
        w.props.insert("text".into(), "Hi".into());
        w.props.insert("text_align".into(), "BOTTOM_RIGHT".into());
        let items = TextPlugin.export_payload(&w, &ctx).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["x"], json!(110));
        assert_eq!(items[0]["y"], json!(60));
        assert_eq!(items[0]["anchor"], json!("rs"));
        assert_eq!(items[0]["color"], json!("black"));
    }

    #[test]
    fn test_text_with_newlines_becomes_multiline_item() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let mut w = Widget::new("t1", "text");
        w.props.insert("text".into(), "a\nb".into());
        let items = TextPlugin.export_payload(&w, &ctx).unwrap();
        assert_eq!(items[0]["type"], json!("multiline"));
        assert_eq!(items[0]["value"], json!("a|b"));
        assert_eq!(items[0]["delimiter"], json!("|"));
    }

    #[test]
    fn test_sensor_text_template_value() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let mut w = Widget::new("s1", "sensor_text");
        w.entity_id = "sensor.kitchen_temp".to_string();
        w.props.insert("prefix".into(), "Temp: ".into());
        w.props.insert("postfix".into(), " C".into());
        w.props.insert("value_format".into(), "value".into());
        let items = SensorTextPlugin.export_payload(&w, &ctx).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0]["value"],
            json!("Temp: {{ states('sensor.kitchen_temp') }} C")
        );
    }

    #[test]
    fn test_sensor_text_label_line() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let mut w = Widget::new("s1", "sensor_text");
        w.entity_id = "sensor.a".to_string();
        w.title = "Kitchen".to_string();
        let items = SensorTextPlugin.export_payload(&w, &ctx).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["value"], json!("Kitchen"));
        assert_eq!(items[0]["size"], json!(14));
    }

    #[test]
    fn test_datetime_lambda_uses_clock() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let mut w = Widget::new("d1", "datetime");
        w.width = 200;
        w.height = 60;
        w.props.insert("format".into(), "time_only".into());
        let lines = DatetimePlugin.export_lambda(&w, &ctx).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("it.strftime("));
        assert!(lines[0].contains("id(ha_time).now()"));
        assert!(lines[0].contains("\"%H:%M\""));
        assert!(!lines[0].contains("%%"));
    }

    #[test]
    fn test_datetime_requirements_track_both_fonts() {
        let mut w = Widget::new("d1", "datetime");
        crate::plugins::PluginRegistry::builtin().apply_defaults(&mut w);
        let mut reqs = Requirements::default();
        DatetimePlugin.collect_requirements(&w, &mut reqs);
        assert_eq!(reqs.fonts.len(), 2);
        let sizes: Vec<i64> = reqs.fonts.iter().map(|f| f.size).collect();
        assert!(sizes.contains(&28) && sizes.contains(&16));
    }

    #[test]
    fn test_multiline_lambda_spacing() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let mut w = Widget::new("m1", "odp_multiline");
        w.y = 100;
        w.props.insert("text".into(), "a|b|c".into());
        w.props.insert("offset_y".into(), 30.into());
        let lines = MultilinePlugin.export_lambda(&w, &ctx).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains(", 130,"));
        assert!(lines[2].contains(", 160,"));
    }
}
