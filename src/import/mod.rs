//! Offline import of display configuration text.
//!
//! Pasted documents arrive in one of four rough shapes: a JSON
//! document (bare payload array or a full service call), a YAML
//! payload sequence, a YAML service call, or free-form mixed text
//! with marker comments. Detection is heuristic and every path
//! degrades to the line-based snippet parser rather than failing.

mod payload;
mod reconstruct;
pub(crate) mod repair;
mod snippet;

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Layout, Warning};
use crate::plugins::PluginRegistry;

pub use payload::payload_to_layout;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("input is empty")]
    Empty,
    #[error("could not parse document: {0}")]
    Parse(String),
}

/// A parsed layout plus everything the parser had to guess about.
#[derive(Debug)]
pub struct ImportResult {
    pub layout: Layout,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Json,
    PayloadSeq,
    Service,
    Mixed,
}

fn item_head_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^-\s*type:\s*["']?(\w+)["']?"#).unwrap())
}

fn mapping_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+:").unwrap())
}

/// Classify a document by its first significant line.
fn detect(text: &str) -> Shape {
    let first = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("//") && !l.starts_with('#'));
    let Some(first) = first else {
        return Shape::Mixed;
    };
    if first.starts_with('{') || first.starts_with('[') {
        return Shape::Json;
    }
    if let Some(caps) = item_head_re().captures(first) {
        if payload::PAYLOAD_TYPES.contains(&&caps[1]) {
            return Shape::PayloadSeq;
        }
    }
    if mapping_key_re().is_match(first) && text.contains("drawcustom") {
        return Shape::Service;
    }
    Shape::Mixed
}

/// Parse arbitrary configuration text into a layout.
///
/// Never fails past detection: malformed fragments turn into warnings
/// and the rest of the document is still imported.
pub fn parse_layout(text: &str, registry: &PluginRegistry) -> Result<ImportResult, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }
    let mut warnings = Vec::new();
    let mut layout = match detect(text) {
        Shape::Json => import_json(text, registry, &mut warnings)?,
        Shape::PayloadSeq => import_payload_seq(text, registry, &mut warnings),
        Shape::Service => import_service(text, registry, &mut warnings),
        Shape::Mixed => snippet::parse_snippet(text, registry, &mut warnings),
    };
    ensure_unique_ids(&mut layout, &mut warnings);
    Ok(ImportResult { layout, warnings })
}

fn import_json(
    text: &str,
    registry: &PluginRegistry,
    warnings: &mut Vec<Warning>,
) -> Result<Layout, ImportError> {
    let value = repair::parse_json_lenient(text, warnings).map_err(ImportError::Parse)?;
    match &value {
        Value::Array(items) => Ok(payload::payload_to_layout(items, registry, warnings)),
        Value::Object(_) => {
            if let Some(items) = value.pointer("/data/payload").and_then(Value::as_array) {
                let mut layout = payload::payload_to_layout(items, registry, warnings);
                apply_wrapper(&mut layout, &value);
                Ok(layout)
            } else {
                warnings.push(Warning::new(
                    "JSON object has no data.payload, treating as snippet",
                    0,
                ));
                Ok(snippet::parse_snippet(text, registry, warnings))
            }
        }
        _ => Err(ImportError::Parse(
            "top-level JSON value is not an array or object".to_string(),
        )),
    }
}

fn import_payload_seq(
    text: &str,
    registry: &PluginRegistry,
    warnings: &mut Vec<Warning>,
) -> Layout {
    match serde_yaml::from_str::<serde_yaml::Value>(text) {
        Ok(doc) => {
            let json = repair::yaml_to_json(doc);
            match json.as_array() {
                Some(items) => payload::payload_to_layout(items, registry, warnings),
                None => snippet::parse_snippet(text, registry, warnings),
            }
        }
        Err(err) => {
            warnings.push(Warning::new(
                format!("payload sequence did not parse as a whole ({err}), recovering item by item"),
                0,
            ));
            snippet::parse_snippet(text, registry, warnings)
        }
    }
}

fn import_service(text: &str, registry: &PluginRegistry, warnings: &mut Vec<Warning>) -> Layout {
    let doc = match serde_yaml::from_str::<serde_yaml::Value>(text) {
        Ok(doc) => repair::yaml_to_json(doc),
        Err(err) => {
            warnings.push(Warning::new(
                format!("service call did not parse as YAML ({err}), recovering line by line"),
                0,
            ));
            return snippet::parse_snippet(text, registry, warnings);
        }
    };
    let payload_value = doc.pointer("/data/payload");
    let mut layout = match payload_value {
        Some(Value::Array(items)) => payload::payload_to_layout(items, registry, warnings),
        // Literal block payloads carry item id comments the snippet
        // parser understands.
        Some(Value::String(block)) => snippet::parse_snippet(block, registry, warnings),
        _ => {
            warnings.push(Warning::new(
                "service call has no data.payload, recovering line by line",
                0,
            ));
            snippet::parse_snippet(text, registry, warnings)
        }
    };
    apply_wrapper(&mut layout, &doc);
    layout
}

/// Pull device-level facts out of a drawcustom service envelope.
fn apply_wrapper(layout: &mut Layout, doc: &Value) {
    let service = doc.get("service").and_then(Value::as_str).unwrap_or("");
    if let Some(entity) = doc
        .pointer("/target/entity_id")
        .and_then(|v| match v {
            Value::Array(items) => items.first().and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        })
    {
        if service.starts_with("opendisplay") {
            layout.settings.opendisplay_entity_id = entity.to_string();
        } else {
            layout.settings.oepl_entity_id = entity.to_string();
        }
    }
    let Some(data) = doc.get("data") else {
        return;
    };
    if let Some(bg) = data.get("background").and_then(Value::as_str) {
        layout.settings.dark_mode = matches!(bg, "black" | "#000000");
        for page in &mut layout.pages {
            page.dark_mode = "inherit".to_string();
        }
    }
    if let Some(rotate) = data.get("rotate").and_then(Value::as_i64) {
        if rotate == 90 || rotate == 270 {
            layout.settings.orientation = "portrait".to_string();
        }
    }
    if let Some(dither) = data.get("dither").and_then(Value::as_i64) {
        layout.settings.dither = dither.clamp(0, u8::MAX as i64) as u8;
    }
    if let Some(ttl) = data.get("ttl").and_then(Value::as_i64) {
        layout.settings.ttl = ttl.max(0) as u32;
    }
}

/// Deduplicate colliding widget ids across all pages.
fn ensure_unique_ids(layout: &mut Layout, warnings: &mut Vec<Warning>) {
    let mut seen: HashSet<String> = HashSet::new();
    for page in &mut layout.pages {
        for widget in &mut page.widgets {
            if seen.insert(widget.id.clone()) {
                continue;
            }
            let mut n = 2;
            let mut candidate = format!("{}_{}", widget.id, n);
            while !seen.insert(candidate.clone()) {
                n += 1;
                candidate = format!("{}_{}", widget.id, n);
            }
            warnings.push(Warning::new(
                format!("duplicate widget id \"{}\" renamed to \"{candidate}\"", widget.id),
                0,
            ));
            widget.id = candidate;
        }
    }
}
