//! Wrapped YAML service-call payload.
//!
//! The payload rides in a literal block scalar so users can paste it
//! into an automation unchanged. Widget ids are carried as `# id:`
//! comments ahead of each widget's items.

use super::{payload_json, Adapter, Dialect, ExportError, ExportSession};
use crate::models::Layout;

const DEFAULT_ENTITY: &str = "opendisplay.0000000000000000";

/// Render a JSON scalar/array as a single-line YAML value.
pub(super) fn yaml_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => {
            let needs_quotes = s.is_empty()
                || s.contains(':')
                || s.contains('#')
                || s.contains('\n')
                || s.contains('{')
                || s.starts_with(char::is_whitespace)
                || s.ends_with(char::is_whitespace)
                || s.starts_with('-')
                || s.parse::<f64>().is_ok()
                || s == "true"
                || s == "false"
                || s == "null";
            if needs_quotes {
                // JSON string escaping is valid YAML double-quoting.
                serde_json::Value::String(s.clone()).to_string()
            } else {
                s.clone()
            }
        }
        // Arrays and nested objects stay in flow style.
        other => other.to_string(),
    }
}

pub struct YamlPayloadAdapter;

impl Adapter for YamlPayloadAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::YamlPayload
    }

    fn generate(
        &self,
        layout: &Layout,
        session: &mut ExportSession,
    ) -> Result<String, ExportError> {
        let groups = payload_json::collect_items(layout, session, Dialect::YamlPayload)?;
        let entity: &str = if layout.settings.opendisplay_entity_id.is_empty() {
            DEFAULT_ENTITY
        } else {
            layout.settings.opendisplay_entity_id.as_str()
        };
        let mut out = String::new();
        out.push_str("service: opendisplay.drawcustom\n");
        out.push_str("target:\n");
        out.push_str("  entity_id:\n");
        out.push_str(&format!("    - {entity}\n"));
        out.push_str("data:\n");
        out.push_str(&format!(
            "  background: {}\n",
            payload_json::background(layout)
        ));
        out.push_str(&format!("  rotate: {}\n", payload_json::rotation(layout)));
        out.push_str(&format!("  dither: {}\n", layout.settings.dither));
        out.push_str(&format!("  ttl: {}\n", layout.settings.ttl));
        out.push_str("  payload: |-\n");
        for (widget_id, items) in groups {
            out.push_str(&format!("    # id: {widget_id}\n"));
            for item in items {
                let mut first = true;
                for (key, value) in &item {
                    let lead = if first { "    - " } else { "      " };
                    first = false;
                    out.push_str(&format!("{lead}{key}: {}\n", yaml_scalar(value)));
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Page, Widget};
    use crate::plugins::PluginRegistry;

    #[test]
    fn test_yaml_scalar_quoting() {
        assert_eq!(yaml_scalar(&serde_json::json!("white")), "white");
        assert_eq!(yaml_scalar(&serde_json::json!("a: b")), "\"a: b\"");
        assert_eq!(
            yaml_scalar(&serde_json::json!("{{ states('s.a') }}")),
            "\"{{ states('s.a') }}\""
        );
        assert_eq!(yaml_scalar(&serde_json::json!("42")), "\"42\"");
        assert_eq!(yaml_scalar(&serde_json::json!(42)), "42");
        assert_eq!(yaml_scalar(&serde_json::json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_document_layout() {
        let registry = PluginRegistry::builtin();
        let mut session = ExportSession::new(&registry);
        let mut layout = Layout::default();
        let mut page = Page::new("page_0", "Main");
        let mut w = Widget::new("t1", "text");
        w.width = 100;
        w.height = 30;
        registry.apply_defaults(&mut w);
        page.widgets.push(w);
        layout.pages.push(page);
        let out = YamlPayloadAdapter.generate(&layout, &mut session).unwrap();
        assert!(out.starts_with("service: opendisplay.drawcustom\n"));
        assert!(out.contains("    - opendisplay.0000000000000000\n"));
        assert!(out.contains("  payload: |-\n"));
        assert!(out.contains("    # id: t1\n"));
        assert!(out.contains("    - type: text\n"));
        // The wrapper itself must parse as YAML.
        let doc: serde_yaml::Value = serde_yaml::from_str(&out).unwrap();
        let payload = doc["data"]["payload"].as_str().unwrap();
        assert!(payload.contains("# id: t1"));
    }
}
