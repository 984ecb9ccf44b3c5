//! Widget marker lines.
//!
//! Every generated document carries one marker comment per widget so a
//! later import can recover the full widget rather than guessing from
//! drawing calls:
//!
//! ```text
//! // widget:datetime id:w1 x:10 y:20 w:120 h:50 align:CENTER format:time_only
//! ```
//!
//! Values containing whitespace or a colon are double-quoted. The
//! comment prefix is `//` in drawing-procedure blocks and `#` in
//! YAML-shaped documents.

use indexmap::IndexMap;
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{PropValue, Widget};

/// A parsed marker line.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub kind: String,
    pub fields: IndexMap<String, String>,
}

impl Marker {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// First present key of a list, for legacy field spellings.
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key)?.trim().parse::<f64>().ok().map(|v| v.round() as i32)
    }
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:#\s*|//\s*)widget:(\w+)\s+(.+)$").unwrap())
}

/// Parse a marker line. Returns None when the line is not a marker.
pub fn parse_marker(line: &str) -> Option<Marker> {
    let caps = header_re().captures(line.trim())?;
    let kind = caps[1].to_string();
    let fields = tokenize_fields(&caps[2]);
    Some(Marker { kind, fields })
}

/// Split `key:value key:"quoted value" ...` into ordered pairs.
///
/// Unquoted values run until the next `key:` token, so a value may
/// contain spaces but never a colon.
fn tokenize_fields(rest: &str) -> IndexMap<String, String> {
    let mut fields = IndexMap::new();
    let chars: Vec<char> = rest.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        let key_start = i;
        while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
            i += 1;
        }
        if key_start == i || i >= chars.len() || chars[i] != ':' {
            // Not a key token; skip ahead to the next whitespace.
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            continue;
        }
        let key: String = chars[key_start..i].iter().collect();
        i += 1;
        let value = if i < chars.len() && chars[i] == '"' {
            i += 1;
            let vstart = i;
            while i < chars.len() && chars[i] != '"' {
                i += 1;
            }
            let v: String = chars[vstart..i].iter().collect();
            if i < chars.len() {
                i += 1;
            }
            v
        } else {
            let vstart = i;
            let mut vend = i;
            while i < chars.len() {
                if chars[i].is_whitespace() {
                    // Stop only if a `key:` token follows the gap.
                    let mut j = i;
                    while j < chars.len() && chars[j].is_whitespace() {
                        j += 1;
                    }
                    let kstart = j;
                    while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                        j += 1;
                    }
                    if j > kstart && j < chars.len() && chars[j] == ':' {
                        break;
                    }
                    i += 1;
                    vend = i;
                } else {
                    i += 1;
                    vend = i;
                }
            }
            chars[vstart..vend].iter().collect::<String>().trim_end().to_string()
        };
        fields.insert(key, value);
    }
    fields
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty() || value.contains(char::is_whitespace) || value.contains(':')
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push(':');
    if needs_quoting(value) {
        out.push('"');
        out.push_str(value);
        out.push('"');
    } else {
        out.push_str(value);
    }
}

/// Marker text for a property value. Newlines inside option lists and
/// free text are escaped so the marker stays a single line.
fn prop_text(key: &str, value: &PropValue) -> String {
    let text = match value {
        PropValue::List(items) if key == "points" => items
            .iter()
            .map(|p| p.to_plain_string())
            .collect::<Vec<_>>()
            .join(" "),
        PropValue::List(items) if key == "options" => items
            .iter()
            .map(|p| p.to_plain_string())
            .collect::<Vec<_>>()
            .join("\\n"),
        other => other.to_plain_string(),
    };
    text.replace('\n', "\\n")
}

/// Build the marker line for a widget, without a trailing newline.
///
/// `prefix` is the comment leader including its trailing space,
/// e.g. `"// "` or `"# "`.
pub fn emit_marker(prefix: &str, widget: &Widget) -> String {
    let mut out = format!("{prefix}widget:{}", widget.kind);
    push_field(&mut out, "id", &widget.id);
    push_field(&mut out, "x", &widget.x.to_string());
    push_field(&mut out, "y", &widget.y.to_string());
    push_field(&mut out, "w", &widget.width.to_string());
    push_field(&mut out, "h", &widget.height.to_string());
    if let Some(align) = widget.props.get("text_align") {
        push_field(&mut out, "align", &align.to_plain_string());
    }
    if !widget.title.is_empty() {
        push_field(&mut out, "title", &widget.title);
    }
    if !widget.entity_id.is_empty() {
        push_field(&mut out, "entity", &widget.entity_id);
    }
    if !widget.entity_id_2.is_empty() {
        push_field(&mut out, "entity_2", &widget.entity_id_2);
    }
    if !widget.condition_entity.is_empty() {
        push_field(&mut out, "cond_ent", &widget.condition_entity);
        if !widget.condition_operator.is_empty() {
            push_field(&mut out, "cond_op", &widget.condition_operator);
        }
        if !widget.condition_state.is_empty() {
            push_field(&mut out, "cond_state", &widget.condition_state);
        }
        if !widget.condition_min.is_empty() {
            push_field(&mut out, "cond_min", &widget.condition_min);
        }
        if !widget.condition_max.is_empty() {
            push_field(&mut out, "cond_max", &widget.condition_max);
        }
    }
    if widget.locked {
        push_field(&mut out, "locked", "true");
    }
    for (key, value) in &widget.props {
        // Alignment already went out as the align: envelope field.
        if key == "text_align" {
            continue;
        }
        push_field(&mut out, key, &prop_text(key, value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_marker() {
        let m = parse_marker("// widget:datetime id:w1 x:10 y:20 w:120 h:50 format:time_only")
            .unwrap();
        assert_eq!(m.kind, "datetime");
        assert_eq!(m.get("id"), Some("w1"));
        assert_eq!(m.get_i32("x"), Some(10));
        assert_eq!(m.get("format"), Some("time_only"));
    }

    #[test]
    fn test_parse_hash_prefix() {
        let m = parse_marker("  # widget:text id:t1 x:0 y:0 w:80 h:30").unwrap();
        assert_eq!(m.kind, "text");
        assert_eq!(m.get("id"), Some("t1"));
    }

    #[test]
    fn test_quoted_values_keep_spaces_and_colons() {
        let m = parse_marker(
            r#"// widget:text id:t1 x:0 y:0 w:80 h:30 text:"Hello: world" title:"Lab temp""#,
        )
        .unwrap();
        assert_eq!(m.get("text"), Some("Hello: world"));
        assert_eq!(m.get("title"), Some("Lab temp"));
    }

    #[test]
    fn test_unquoted_value_runs_to_next_key() {
        // Legacy writers skipped quoting on some multi-word values.
        let m = parse_marker("// widget:text id:t1 text:two words x:5").unwrap();
        assert_eq!(m.get("text"), Some("two words"));
        assert_eq!(m.get_i32("x"), Some(5));
    }

    #[test]
    fn test_not_a_marker() {
        assert!(parse_marker("it.line(0, 0, 10, 10);").is_none());
        assert!(parse_marker("# just a comment").is_none());
    }

    #[test]
    fn test_emit_then_parse_roundtrip() {
        let mut w = Widget::new("w1", "sensor_text");
        w.x = 12;
        w.y = 34;
        w.width = 100;
        w.height = 40;
        w.entity_id = "sensor.kitchen_temp".to_string();
        w.props.insert("prefix".into(), "Temp: ".into());
        w.props.insert("precision".into(), 1.into());
        let line = emit_marker("// ", &w);
        let m = parse_marker(&line).unwrap();
        assert_eq!(m.kind, "sensor_text");
        assert_eq!(m.get("entity"), Some("sensor.kitchen_temp"));
        assert_eq!(m.get("prefix"), Some("Temp: "));
        assert_eq!(m.get("precision"), Some("1"));
    }

    #[test]
    fn test_emit_places_align_after_geometry() {
        let mut w = Widget::new("t1", "text");
        w.props.insert("text_align".into(), "TOP_CENTER".into());
        w.props.insert("font_size".into(), 20.into());
        let line = emit_marker("// ", &w);
        assert!(line.contains("h:0 align:TOP_CENTER"));
        assert!(!line.contains("text_align:"));
        let m = parse_marker(&line).unwrap();
        assert_eq!(m.get("align"), Some("TOP_CENTER"));
    }

    #[test]
    fn test_emit_quotes_colon_values() {
        let mut w = Widget::new("w1", "datetime");
        w.props.insert("refresh_time".into(), "07:30".into());
        let line = emit_marker("# ", &w);
        assert!(line.contains(r#"refresh_time:"07:30""#));
    }

    #[test]
    fn test_get_any_aliases() {
        let m = parse_marker("// widget:text id:t x:0 y:0 w:1 h:1 ent:sensor.a").unwrap();
        assert_eq!(m.get_any(&["entity", "ent"]), Some("sensor.a"));
    }
}
