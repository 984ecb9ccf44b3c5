//! Widget and page types.

use serde::{Deserialize, Serialize};

use super::value::{PropMap, PropValue};

fn is_false(v: &bool) -> bool {
    !*v
}

/// A placed widget on a page.
///
/// Geometry is always the canvas bounding box (top-left origin);
/// per-shape representations such as center/radius exist only inside
/// generated documents and are normalized away on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Widget {
    pub id: String,
    /// Widget type name as registered with the plugin registry.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub entity_id_2: String,
    /// Visibility condition: entity whose state gates rendering.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition_entity: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition_operator: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition_state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition_min: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition_max: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "PropMap::is_empty")]
    pub props: PropMap,
}

impl Widget {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Widget {
            id: id.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn prop(&self, key: &str) -> Option<&PropValue> {
        self.props.get(key)
    }

    pub fn prop_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.props
            .get(key)
            .and_then(PropValue::as_str)
            .unwrap_or(default)
    }

    pub fn prop_i64(&self, key: &str, default: i64) -> i64 {
        self.props
            .get(key)
            .and_then(PropValue::as_i64)
            .unwrap_or(default)
    }

    pub fn prop_f64(&self, key: &str, default: f64) -> f64 {
        self.props
            .get(key)
            .and_then(PropValue::as_f64)
            .unwrap_or(default)
    }

    pub fn prop_bool(&self, key: &str, default: bool) -> bool {
        self.props
            .get(key)
            .map(PropValue::truthy)
            .unwrap_or(default)
    }

    /// True when any visibility condition is attached.
    pub fn has_condition(&self) -> bool {
        !self.condition_entity.is_empty()
    }
}

fn default_refresh_type() -> String {
    "interval".to_string()
}

fn default_dark_mode() -> String {
    "inherit".to_string()
}

/// A single page of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    /// Per-page refresh override in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_s: Option<u32>,
    /// "interval", "daily" or "manual".
    #[serde(default = "default_refresh_type")]
    pub refresh_type: String,
    /// Wall-clock time for daily refresh ("HH:MM").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_time: String,
    /// "inherit", "on" or "off"; "inherit" follows device settings.
    #[serde(default = "default_dark_mode")]
    pub dark_mode: String,
    /// Grid hint such as "4x4"; informational for editors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_opacity: Option<u8>,
}

impl Page {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Page {
            id: id.into(),
            name: name.into(),
            widgets: Vec::new(),
            refresh_s: None,
            refresh_type: default_refresh_type(),
            refresh_time: String::new(),
            dark_mode: default_dark_mode(),
            layout: None,
            bg_color: None,
            bg_opacity: None,
        }
    }

    /// Effective dark mode, falling back to the device default.
    pub fn dark(&self, device_dark: bool) -> bool {
        match self.dark_mode.as_str() {
            "on" => true,
            "off" => false,
            _ => device_dark,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new("page_0", "Page 1")
    }
}
