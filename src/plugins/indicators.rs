//! Indicator plugins: icons, QR codes, progress bars, remote images
//! and touch regions.

use serde_json::json;

use super::{c_escape, props, sanitize_ident, Plugin};
use crate::export::{
    item, DeclarativeNode, ExportContext, FontSpec, PayloadItem, Requirements,
};
use crate::models::Widget;

/// Material icon drawn from its codepoint.
pub struct IconPlugin;

impl IconPlugin {
    fn codepoint(widget: &Widget) -> String {
        widget
            .prop_str("code", "F07D0")
            .trim_start_matches("\\U000")
            .to_uppercase()
    }
}

impl Plugin for IconPlugin {
    fn kind(&self) -> &'static str {
        "icon"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("code", "F07D0".into()),
            ("size", 48.into()),
            ("color", "theme_auto".into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (60, 60)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let mut map = item("icon");
        map.insert("value".into(), json!(Self::codepoint(widget)));
        map.insert("x".into(), json!(widget.x + widget.width / 2));
        map.insert("y".into(), json!(widget.y + widget.height / 2));
        map.insert("size".into(), json!(widget.prop_i64("size", 48)));
        map.insert(
            "color".into(),
            json!(ctx.resolve_color(widget.prop_str("color", "theme_auto"))),
        );
        map.insert("anchor".into(), json!("mm"));
        Some(vec![map])
    }

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        let size = widget.prop_i64("size", 48);
        let font = FontSpec {
            family: "Material Design Icons".to_string(),
            weight: 400,
            size,
            italic: false,
        };
        Some(vec![format!(
            "it.printf({}, {}, id({}), {}, TextAlign::CENTER, \"\\U000{}\");",
            widget.x + widget.width / 2,
            widget.y + widget.height / 2,
            font.font_id(),
            ctx.color_const(widget.prop_str("color", "theme_auto")),
            Self::codepoint(widget)
        )])
    }

    fn export_declarative(&self, widget: &Widget, ctx: &ExportContext) -> Option<DeclarativeNode> {
        let mut body = PayloadItem::new();
        body.insert("x".into(), json!(widget.x));
        body.insert("y".into(), json!(widget.y));
        body.insert("text".into(), json!(format!("\\U000{}", Self::codepoint(widget))));
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
        reqs.fonts.insert(FontSpec {
            family: "Material Design Icons".to_string(),
            weight: 400,
            size: widget.prop_i64("size", 48),
            italic: false,
        });
    }
}

/// QR code sized to its module grid.
pub struct QrCodePlugin;

impl QrCodePlugin {
    const BORDER: i64 = 2;

    /// Pixel size of one module for the widget box.
    fn boxsize(widget: &Widget) -> i64 {
        let modules = 25 + 2 * Self::BORDER;
        (widget.width.min(widget.height) as i64 / modules).max(1)
    }
}

impl Plugin for QrCodePlugin {
    fn kind(&self) -> &'static str {
        "qr_code"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("value", "https://example.com".into()),
            ("ecc", "LOW".into()),
            ("dark_color", "black".into()),
            ("light_color", "white".into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (116, 116)
    }

    fn export_payload(&self, widget: &Widget, _ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let mut map = item("qrcode");
        map.insert("data".into(), json!(widget.prop_str("value", "")));
        map.insert("x".into(), json!(widget.x));
        map.insert("y".into(), json!(widget.y));
        map.insert("boxsize".into(), json!(Self::boxsize(widget)));
        map.insert("border".into(), json!(Self::BORDER));
        map.insert("color".into(), json!(widget.prop_str("dark_color", "black")));
        map.insert(
            "bgcolor".into(),
            json!(widget.prop_str("light_color", "white")),
        );
        Some(vec![map])
    }

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        Some(vec![format!(
            "it.qr_code({}, {}, id(qr_{}), {}, {});",
            widget.x,
            widget.y,
            sanitize_ident(&widget.id),
            ctx.color_const(widget.prop_str("dark_color", "black")),
            Self::boxsize(widget)
        )])
    }

    fn export_declarative(&self, widget: &Widget, _ctx: &ExportContext) -> Option<DeclarativeNode> {
        let mut body = PayloadItem::new();
        body.insert("x".into(), json!(widget.x));
        body.insert("y".into(), json!(widget.y));
        body.insert("size".into(), json!(widget.width.min(widget.height)));
        body.insert("text".into(), json!(widget.prop_str("value", "")));
        Some(DeclarativeNode {
            tag: "qrcode".to_string(),
            body,
        })
    }
}

/// Horizontal progress bar bound to a numeric entity.
pub struct ProgressBarPlugin;

impl Plugin for ProgressBarPlugin {
    fn kind(&self) -> &'static str {
        "progress_bar"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([
            ("show_label", true.into()),
            ("show_percentage", true.into()),
            ("bar_height", 15.into()),
            ("border_width", 1.into()),
            ("color", "theme_auto".into()),
            ("label_font_size", 14.into()),
            ("font_family", "Roboto".into()),
        ])
    }

    fn default_size(&self) -> (i32, i32) {
        (150, 40)
    }

    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let color = ctx.resolve_color(widget.prop_str("color", "theme_auto"));
        let bar_h = widget.prop_i64("bar_height", 15);
        let bar_y = widget.y as i64 + widget.height as i64 - bar_h;
        let mut map = item("progress_bar");
        map.insert("x_start".into(), json!(widget.x));
        map.insert("y_start".into(), json!(bar_y));
        map.insert("x_end".into(), json!(widget.x + widget.width));
        map.insert("y_end".into(), json!(bar_y + bar_h));
        map.insert("fill".into(), json!(color));
        map.insert("outline".into(), json!(color));
        map.insert("width".into(), json!(widget.prop_i64("border_width", 1)));
        let progress = if widget.entity_id.is_empty() {
            json!(50)
        } else {
            json!(format!("{{{{ states('{}') | int(0) }}}}", widget.entity_id))
        };
        map.insert("progress".into(), progress);
        map.insert(
            "show_percentage".into(),
            json!(widget.prop_bool("show_percentage", true)),
        );
        let mut items = Vec::new();
        if widget.prop_bool("show_label", true) && !widget.title.is_empty() {
            let mut label = item("text");
            label.insert("value".into(), json!(widget.title.clone()));
            label.insert("x".into(), json!(widget.x));
            label.insert("y".into(), json!(widget.y));
            label.insert("size".into(), json!(widget.prop_i64("label_font_size", 14)));
            label.insert("font".into(), json!("ppb.ttf"));
            label.insert("color".into(), json!(color));
            label.insert("anchor".into(), json!("lt"));
            items.push(label);
        }
        items.push(map);
        Some(items)
    }

    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        let color = ctx.color_const(widget.prop_str("color", "theme_auto"));
        let bar_h = widget.prop_i64("bar_height", 15) as i32;
        let bar_y = widget.y + widget.height - bar_h;
        let mut lines = Vec::new();
        if widget.prop_bool("show_label", true) && !widget.title.is_empty() {
            let font = FontSpec {
                family: widget.prop_str("font_family", "Roboto").to_string(),
                weight: 400,
                size: widget.prop_i64("label_font_size", 14),
                italic: false,
            };
            lines.push(format!(
                "it.printf({}, {}, id({}), {}, TextAlign::TOP_LEFT, \"{}\");",
                widget.x,
                widget.y,
                font.font_id(),
                color,
                c_escape(&widget.title)
            ));
        }
        lines.push(format!(
            "it.rectangle({}, {bar_y}, {}, {bar_h}, {color});",
            widget.x, widget.width
        ));
        let sensor = if widget.entity_id.is_empty() {
            "50.0f".to_string()
        } else {
            format!("id({}).state", sanitize_ident(&widget.entity_id))
        };
        lines.push(format!(
            "it.filled_rectangle({}, {}, (int)(({}) * ({sensor}) / 100.0f), {}, {color});",
            widget.x + 1,
            bar_y + 1,
            widget.width - 2,
            bar_h - 2
        ));
        Some(lines)
    }

    fn export_declarative(&self, widget: &Widget, _ctx: &ExportContext) -> Option<DeclarativeNode> {
        let mut body = PayloadItem::new();
        body.insert("x".into(), json!(widget.x));
        body.insert("y".into(), json!(widget.y));
        body.insert("width".into(), json!(widget.width));
        body.insert("height".into(), json!(widget.prop_i64("bar_height", 15)));
        body.insert("min_value".into(), json!(0));
        body.insert("max_value".into(), json!(100));
        body.insert("value".into(), json!(50));
        Some(DeclarativeNode {
            tag: "bar".to_string(),
            body,
        })
    }

    fn collect_requirements(&self, widget: &Widget, reqs: &mut Requirements) {
        if widget.prop_bool("show_label", true) && !widget.title.is_empty() {
            reqs.fonts.insert(FontSpec {
                family: widget.prop_str("font_family", "Roboto").to_string(),
                weight: 400,
                size: widget.prop_i64("label_font_size", 14),
                italic: false,
            });
        }
    }
}

/// Image fetched from a URL at render time.
pub struct OnlineImagePlugin;

impl Plugin for OnlineImagePlugin {
    fn kind(&self) -> &'static str {
        "online_image"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([("url", "".into()), ("rotation", 0.into())])
    }

    fn default_size(&self) -> (i32, i32) {
        (120, 120)
    }

    fn export_payload(&self, widget: &Widget, _ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let mut map = item("dlimg");
        map.insert("url".into(), json!(widget.prop_str("url", "")));
        map.insert("x".into(), json!(widget.x));
        map.insert("y".into(), json!(widget.y));
        map.insert("xsize".into(), json!(widget.width));
        map.insert("ysize".into(), json!(widget.height));
        map.insert("rotate".into(), json!(widget.prop_i64("rotation", 0)));
        Some(vec![map])
    }

    fn export_lambda(&self, widget: &Widget, _ctx: &ExportContext) -> Option<Vec<String>> {
        Some(vec![format!(
            "it.image({}, {}, id(img_{}));",
            widget.x,
            widget.y,
            sanitize_ident(&widget.id)
        )])
    }
}

/// Invisible interaction region; pages use it for navigation taps.
/// Nothing is drawn in any dialect.
pub struct TouchAreaPlugin;

impl Plugin for TouchAreaPlugin {
    fn kind(&self) -> &'static str {
        "touch_area"
    }

    fn defaults(&self) -> crate::models::PropMap {
        props([("action", "next_page".into())])
    }

    fn default_size(&self) -> (i32, i32) {
        (100, 100)
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
    fn test_qr_boxsize_from_box() {
        let mut w = Widget::new("q1", "qr_code");
        w.width = 116;
        w.height = 116;
        assert_eq!(QrCodePlugin::boxsize(&w), 4);
        w.width = 20;
        w.height = 20;
        assert_eq!(QrCodePlugin::boxsize(&w), 1);
    }

    #[test]
    fn test_icon_codepoint_escape() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let mut w = Widget::new("i1", "icon");
        w.width = 60;
        w.height = 60;
        w.props.insert("code".into(), "f07d0".into());
        let lines = IconPlugin.export_lambda(&w, &ctx).unwrap();
        assert!(lines[0].contains("\\U000F07D0"));
        assert!(lines[0].contains("id(font_material_design_icons_400_48)"));
    }

    #[test]
    fn test_progress_bar_entity_template() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let mut w = Widget::new("p1", "progress_bar");
        w.width = 150;
        w.height = 40;
        w.entity_id = "sensor.battery".to_string();
        let items = ProgressBarPlugin.export_payload(&w, &ctx).unwrap();
        let bar = items.last().unwrap();
        assert_eq!(
            bar["progress"],
            json!("{{ states('sensor.battery') | int(0) }}")
        );
        assert_eq!(bar["y_start"], json!(25));
    }

    #[test]
    fn test_touch_area_draws_nothing() {
        let (settings, page) = ctx_parts();
        let ctx = ExportContext::new(&settings, &page);
        let w = Widget::new("t1", "touch_area");
        assert!(TouchAreaPlugin.export_payload(&w, &ctx).is_none());
        assert!(TouchAreaPlugin.export_lambda(&w, &ctx).is_none());
        assert!(TouchAreaPlugin.export_declarative(&w, &ctx).is_none());
    }
}
