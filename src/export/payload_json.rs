//! Wrapped JSON service-call payload.

use serde_json::json;

use super::{
    Adapter, Dialect, ExportContext, ExportError, ExportSession, PayloadItem,
};
use crate::models::Layout;

const DEFAULT_ENTITY: &str = "open_epaper_link.0000000000000000";

/// Run every visible widget on the current page through its plugin's
/// payload export. Items stay grouped per widget so each adapter can
/// attach widget ids its own way.
pub(super) fn collect_items(
    layout: &Layout,
    session: &mut ExportSession,
    dialect: Dialect,
) -> Result<Vec<(String, Vec<PayloadItem>)>, ExportError> {
    let page = layout.current_page().ok_or(ExportError::EmptyLayout)?;
    let ctx = ExportContext::new(&layout.settings, page);
    let mut groups = Vec::new();
    for widget in &page.widgets {
        if widget.hidden {
            continue;
        }
        let Some(plugin) = session.registry().get(&widget.kind) else {
            session.warn_unsupported(&widget.kind, dialect);
            continue;
        };
        match plugin.export_payload(widget, &ctx) {
            Some(items) => {
                plugin.collect_requirements(widget, &mut session.requirements);
                if !items.is_empty() {
                    groups.push((widget.id.clone(), items));
                }
            }
            None => session.warn_unsupported(&widget.kind, dialect),
        }
    }
    Ok(groups)
}

/// Rotation the device applies before drawing.
pub(super) fn rotation(layout: &Layout) -> i64 {
    if layout.settings.portrait() {
        90
    } else {
        0
    }
}

pub(super) fn background(layout: &Layout) -> &'static str {
    let page_dark = layout
        .current_page()
        .map(|p| p.dark(layout.settings.dark_mode))
        .unwrap_or(layout.settings.dark_mode);
    if page_dark {
        "black"
    } else {
        "white"
    }
}

pub struct JsonPayloadAdapter;

impl Adapter for JsonPayloadAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::JsonPayload
    }

    fn generate(
        &self,
        layout: &Layout,
        session: &mut ExportSession,
    ) -> Result<String, ExportError> {
        let groups = collect_items(layout, session, Dialect::JsonPayload)?;
        let mut payload = Vec::new();
        for (widget_id, items) in groups {
            for (i, mut item) in items.into_iter().enumerate() {
                // The widget id rides along so a later import can
                // reassociate items with widgets.
                if !item.contains_key("id") {
                    let id = if i == 0 {
                        widget_id.clone()
                    } else {
                        format!("{widget_id}_{i}")
                    };
                    item.insert("id".to_string(), json!(id));
                }
                payload.push(serde_json::Value::Object(item));
            }
        }
        let entity: &str = if layout.settings.oepl_entity_id.is_empty() {
            DEFAULT_ENTITY
        } else {
            layout.settings.oepl_entity_id.as_str()
        };
        let doc = json!({
            "service": "open_epaper_link.drawcustom",
            "target": { "entity_id": [entity] },
            "data": {
                "background": background(layout),
                "rotate": rotation(layout),
                "dither": layout.settings.dither,
                "ttl": layout.settings.ttl,
                "payload": payload,
            }
        });
        Ok(serde_json::to_string_pretty(&doc)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Page, Widget};
    use crate::plugins::PluginRegistry;

    fn layout_with(widgets: Vec<Widget>) -> Layout {
        let mut layout = Layout::default();
        let mut page = Page::new("page_0", "Main");
        page.widgets = widgets;
        layout.pages.push(page);
        layout
    }

    #[test]
    fn test_empty_layout_is_an_error() {
        let registry = PluginRegistry::builtin();
        let mut session = ExportSession::new(&registry);
        let err = JsonPayloadAdapter
            .generate(&Layout::default(), &mut session)
            .unwrap_err();
        assert!(matches!(err, ExportError::EmptyLayout));
    }

    #[test]
    fn test_wrapped_document_shape() {
        let registry = PluginRegistry::builtin();
        let mut session = ExportSession::new(&registry);
        let mut w = Widget::new("r1", "shape_rect");
        w.x = 26;
        w.y = 93;
        w.width = 100;
        w.height = 50;
        registry.apply_defaults(&mut w);
        let layout = layout_with(vec![w]);
        let out = JsonPayloadAdapter.generate(&layout, &mut session).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["service"], json!("open_epaper_link.drawcustom"));
        assert_eq!(
            doc["target"]["entity_id"],
            json!(["open_epaper_link.0000000000000000"])
        );
        assert_eq!(doc["data"]["rotate"], json!(0));
        let payload = doc["data"]["payload"].as_array().unwrap();
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0]["type"], json!("rectangle"));
        assert_eq!(payload[0]["id"], json!("r1"));
        assert_eq!(payload[0]["x_end"], json!(126));
    }

    #[test]
    fn test_portrait_rotation_and_dark_background() {
        let registry = PluginRegistry::builtin();
        let mut session = ExportSession::new(&registry);
        let mut layout = layout_with(vec![]);
        layout.settings.orientation = "portrait".to_string();
        layout.settings.dark_mode = true;
        let out = JsonPayloadAdapter.generate(&layout, &mut session).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["data"]["rotate"], json!(90));
        assert_eq!(doc["data"]["background"], json!("black"));
    }

    #[test]
    fn test_unsupported_widget_skipped_with_single_warning() {
        let registry = PluginRegistry::builtin();
        let mut session = ExportSession::new(&registry);
        let mut widgets = Vec::new();
        for i in 0..3 {
            let mut w = Widget::new(format!("t{i}"), "touch_area");
            w.width = 100;
            w.height = 100;
            widgets.push(w);
        }
        let mut text = Widget::new("t_ok", "text");
        registry.apply_defaults(&mut text);
        widgets.push(text);
        let layout = layout_with(widgets);
        let out = JsonPayloadAdapter.generate(&layout, &mut session).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["data"]["payload"].as_array().unwrap().len(), 1);
        assert_eq!(session.warnings.len(), 1);
    }

    #[test]
    fn test_hidden_widgets_are_not_exported() {
        let registry = PluginRegistry::builtin();
        let mut session = ExportSession::new(&registry);
        let mut w = Widget::new("t1", "text");
        registry.apply_defaults(&mut w);
        w.hidden = true;
        let layout = layout_with(vec![w]);
        let out = JsonPayloadAdapter.generate(&layout, &mut session).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(doc["data"]["payload"].as_array().unwrap().is_empty());
    }
}
