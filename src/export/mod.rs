//! Export adapters: turn a layout into a device-facing document.
//!
//! Four dialects are supported. Two are wrapped drawing payloads
//! (JSON and YAML service calls), one is a raw drawing-procedure
//! block, and one is a declarative widget tree. Adapters share a
//! session that tracks per-run warnings and font requirements.

mod align;
mod context;
mod declarative;
mod lambda;
mod payload_json;
mod payload_yaml;

pub use align::{anchor_x, anchor_y, split_align, text_align_const, HAlign, VAlign};
pub use context::ExportContext;
pub use declarative::DeclarativeAdapter;
pub use lambda::LambdaAdapter;
pub use payload_json::JsonPayloadAdapter;
pub use payload_yaml::YamlPayloadAdapter;

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::{Layout, Warning};
use crate::plugins::PluginRegistry;

/// A single drawing item in a wrapped payload.
pub type PayloadItem = serde_json::Map<String, serde_json::Value>;

/// Start a payload item with its `type` field.
pub fn item(kind: &str) -> PayloadItem {
    let mut map = PayloadItem::new();
    map.insert("type".to_string(), serde_json::Value::String(kind.to_string()));
    map
}

/// A node in the declarative widget tree: a tag plus its body fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarativeNode {
    pub tag: String,
    pub body: PayloadItem,
}

/// Output dialect selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Raw drawing-procedure block.
    Lambda,
    /// Declarative widget tree.
    Declarative,
    /// Wrapped JSON service-call payload.
    JsonPayload,
    /// Wrapped YAML service-call payload.
    YamlPayload,
}

impl Dialect {
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Lambda => "lambda",
            Dialect::Declarative => "declarative",
            Dialect::JsonPayload => "json",
            Dialect::YamlPayload => "yaml",
        }
    }

    pub const ALL: [Dialect; 4] = [
        Dialect::Lambda,
        Dialect::Declarative,
        Dialect::JsonPayload,
        Dialect::YamlPayload,
    ];
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lambda" | "esphome" => Ok(Dialect::Lambda),
            "declarative" | "lvgl" => Ok(Dialect::Declarative),
            "json" | "oepl" => Ok(Dialect::JsonPayload),
            "yaml" | "opendisplay" => Ok(Dialect::YamlPayload),
            other => Err(format!("unknown dialect: {other}")),
        }
    }
}

/// Errors fatal to a whole export run. Per-widget problems are
/// downgraded to warnings on the session instead.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("layout has no pages")]
    EmptyLayout,
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A font a rendered document needs available.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontSpec {
    pub family: String,
    pub weight: u16,
    pub size: i64,
    pub italic: bool,
}

impl FontSpec {
    /// Stable identifier usable as a resource id.
    pub fn font_id(&self) -> String {
        let family = self.family.to_lowercase().replace([' ', '-'], "_");
        let italic = if self.italic { "_italic" } else { "" };
        format!("font_{family}_{}_{}{italic}", self.weight, self.size)
    }
}

/// Resources a generated document expects the device config to carry.
#[derive(Debug, Clone, Default)]
pub struct Requirements {
    pub fonts: BTreeSet<FontSpec>,
}

/// State shared across one export run.
///
/// Unsupported widget kinds are reported once per session, not once
/// per widget, so repeated widgets do not flood the log.
pub struct ExportSession<'r> {
    registry: &'r PluginRegistry,
    warned_kinds: HashSet<String>,
    pub warnings: Vec<Warning>,
    pub requirements: Requirements,
}

impl<'r> ExportSession<'r> {
    pub fn new(registry: &'r PluginRegistry) -> Self {
        ExportSession {
            registry,
            warned_kinds: HashSet::new(),
            warnings: Vec::new(),
            requirements: Requirements::default(),
        }
    }

    pub fn registry(&self) -> &'r PluginRegistry {
        self.registry
    }

    /// Record that `kind` could not be exported to `dialect`. Only the
    /// first occurrence per kind produces a warning.
    pub fn warn_unsupported(&mut self, kind: &str, dialect: Dialect) {
        if self.warned_kinds.insert(kind.to_string()) {
            let message =
                format!("widget type '{kind}' not supported by {dialect} export, skipped");
            log::warn!("{message}");
            self.warnings.push(Warning::new(message, 0));
        }
    }
}

/// The adapter seam all dialects implement.
pub trait Adapter {
    fn dialect(&self) -> Dialect;
    fn generate(&self, layout: &Layout, session: &mut ExportSession)
        -> Result<String, ExportError>;
}

/// Generate `dialect` output for a layout.
pub fn generate(
    layout: &Layout,
    dialect: Dialect,
    session: &mut ExportSession,
) -> Result<String, ExportError> {
    match dialect {
        Dialect::Lambda => LambdaAdapter.generate(layout, session),
        Dialect::Declarative => DeclarativeAdapter.generate(layout, session),
        Dialect::JsonPayload => JsonPayloadAdapter.generate(layout, session),
        Dialect::YamlPayload => YamlPayloadAdapter.generate(layout, session),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_parse_and_display() {
        assert_eq!("lambda".parse::<Dialect>().unwrap(), Dialect::Lambda);
        assert_eq!("oepl".parse::<Dialect>().unwrap(), Dialect::JsonPayload);
        assert_eq!(Dialect::YamlPayload.to_string(), "yaml");
        assert!("svg".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_font_id() {
        let spec = FontSpec {
            family: "Roboto Condensed".to_string(),
            weight: 400,
            size: 20,
            italic: true,
        };
        assert_eq!(spec.font_id(), "font_roboto_condensed_400_20_italic");
    }

    #[test]
    fn test_warn_unsupported_dedupes() {
        let registry = PluginRegistry::builtin();
        let mut session = ExportSession::new(&registry);
        session.warn_unsupported("touch_area", Dialect::JsonPayload);
        session.warn_unsupported("touch_area", Dialect::JsonPayload);
        assert_eq!(session.warnings.len(), 1);
    }
}
