//! Declarative widget-tree export.
//!
//! Pages become `- id: page_N` entries whose widgets are tag nodes.
//! Widget types carrying a native tag prefix pass their properties
//! through untouched; everything else goes through its plugin.

use std::fmt::Write as _;

use super::payload_yaml::yaml_scalar;
use super::{Adapter, DeclarativeNode, Dialect, ExportContext, ExportError, ExportSession};
use crate::marker;
use crate::models::{Layout, Widget};

/// Type-name prefix for pass-through native tree nodes.
pub const NATIVE_PREFIX: &str = "lvgl_";

fn passthrough_node(widget: &Widget) -> Option<DeclarativeNode> {
    let tag = widget.kind.strip_prefix(NATIVE_PREFIX)?;
    let mut body = super::PayloadItem::new();
    body.insert("x".into(), serde_json::json!(widget.x));
    body.insert("y".into(), serde_json::json!(widget.y));
    body.insert("width".into(), serde_json::json!(widget.width));
    body.insert("height".into(), serde_json::json!(widget.height));
    for (key, value) in &widget.props {
        body.insert(key.clone(), value.into());
    }
    Some(DeclarativeNode {
        tag: tag.to_string(),
        body,
    })
}

fn write_node(out: &mut String, widget: &Widget, node: &DeclarativeNode) {
    let _ = writeln!(out, "      {}", marker::emit_marker("# ", widget));
    let _ = writeln!(out, "      - {}:", node.tag);
    for (key, value) in &node.body {
        match value {
            serde_json::Value::Array(items)
                if items.iter().all(|i| i.is_object()) && !items.is_empty() =>
            {
                // Nested node lists (e.g. chart series) as block items.
                let _ = writeln!(out, "          {key}:");
                for item in items {
                    let obj = item.as_object().unwrap();
                    let mut first = true;
                    for (k, v) in obj {
                        let lead = if first { "            - " } else { "              " };
                        first = false;
                        let _ = writeln!(out, "{lead}{k}: {}", yaml_scalar(v));
                    }
                }
            }
            other => {
                let _ = writeln!(out, "          {key}: {}", yaml_scalar(other));
            }
        }
    }
}

pub struct DeclarativeAdapter;

impl Adapter for DeclarativeAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Declarative
    }

    fn generate(
        &self,
        layout: &Layout,
        session: &mut ExportSession,
    ) -> Result<String, ExportError> {
        if layout.pages.is_empty() {
            return Err(ExportError::EmptyLayout);
        }
        let mut out = String::new();
        out.push_str("pages:\n");
        for (index, page) in layout.pages.iter().enumerate() {
            let ctx = ExportContext::new(&layout.settings, page);
            let _ = writeln!(out, "  - id: page_{index}");
            let _ = writeln!(
                out,
                "    name: {}",
                yaml_scalar(&serde_json::json!(page.name))
            );
            let _ = writeln!(out, "    bg_color: {}", ctx.background());
            if let Some(opa) = page.bg_opacity {
                let _ = writeln!(out, "    bg_opa: {opa}");
            }
            if let Some(grid) = &page.layout {
                let _ = writeln!(out, "    # layout: {grid}");
            }
            out.push_str("    widgets:\n");
            for widget in &page.widgets {
                if widget.hidden {
                    continue;
                }
                if let Some(node) = passthrough_node(widget) {
                    write_node(&mut out, widget, &node);
                    continue;
                }
                let Some(plugin) = session.registry().get(&widget.kind) else {
                    session.warn_unsupported(&widget.kind, Dialect::Declarative);
                    continue;
                };
                match plugin.export_declarative(widget, &ctx) {
                    Some(node) => write_node(&mut out, widget, &node),
                    None => session.warn_unsupported(&widget.kind, Dialect::Declarative),
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Page;
    use crate::plugins::PluginRegistry;

    #[test]
    fn test_pages_and_labels() {
        let registry = PluginRegistry::builtin();
        let mut session = ExportSession::new(&registry);
        let mut layout = Layout::default();
        let mut page = Page::new("page_0", "Main");
        let mut text = Widget::new("t1", "text");
        text.x = 10;
        text.y = 20;
        text.width = 100;
        text.height = 30;
        registry.apply_defaults(&mut text);
        page.widgets.push(text);
        layout.pages.push(page);
        let out = DeclarativeAdapter.generate(&layout, &mut session).unwrap();
        assert!(out.starts_with("pages:\n  - id: page_0\n"));
        assert!(out.contains("    name: Main\n"));
        assert!(out.contains("      # widget:text id:t1 x:10 y:20 w:100 h:30"));
        assert!(out.contains("      - label:\n"));
        assert!(out.contains("          text: Text\n"));
    }

    #[test]
    fn test_native_nodes_pass_through() {
        let registry = PluginRegistry::builtin();
        let mut session = ExportSession::new(&registry);
        let mut layout = Layout::default();
        let mut page = Page::new("page_0", "Main");
        let mut slider = Widget::new("s1", "lvgl_slider");
        slider.x = 5;
        slider.y = 6;
        slider.width = 120;
        slider.height = 20;
        slider.props.insert("min_value".into(), 0.into());
        slider.props.insert("max_value".into(), 100.into());
        page.widgets.push(slider);
        layout.pages.push(page);
        let out = DeclarativeAdapter.generate(&layout, &mut session).unwrap();
        assert!(out.contains("      - slider:\n"));
        assert!(out.contains("          min_value: 0\n"));
        assert!(session.warnings.is_empty());
    }

    #[test]
    fn test_unsupported_kind_warns_once() {
        let registry = PluginRegistry::builtin();
        let mut session = ExportSession::new(&registry);
        let mut layout = Layout::default();
        let mut page = Page::new("page_0", "Main");
        for i in 0..2 {
            let mut w = Widget::new(format!("p{i}"), "odp_polygon");
            registry.apply_defaults(&mut w);
            page.widgets.push(w);
        }
        layout.pages.push(page);
        DeclarativeAdapter.generate(&layout, &mut session).unwrap();
        assert_eq!(session.warnings.len(), 1);
    }
}
