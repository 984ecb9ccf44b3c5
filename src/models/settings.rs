//! Device-level settings and their legacy key aliases.

use serde::{Deserialize, Serialize};

/// Rendering dialect a device layout targets by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Direct,
    /// Declarative widget-tree rendering.
    #[serde(alias = "lvgl")]
    Declarative,
}

fn default_orientation() -> String {
    "landscape".to_string()
}

fn default_shape() -> String {
    "rect".to_string()
}

fn default_sleep_end() -> u8 {
    5
}

fn default_refresh_interval() -> u32 {
    600
}

fn default_deep_sleep_interval() -> u32 {
    600
}

fn default_daily_time() -> String {
    "08:00".to_string()
}

fn default_dither() -> u8 {
    2
}

fn default_ttl() -> u32 {
    60
}

/// Per-device settings carried alongside a layout.
///
/// Saved layouts historically used camelCase for several keys; both
/// spellings are accepted on deserialize and snake_case is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    #[serde(alias = "resWidth")]
    pub width: u32,
    #[serde(alias = "resHeight")]
    pub height: u32,
    pub shape: String,
    pub orientation: String,
    #[serde(alias = "darkMode")]
    pub dark_mode: bool,
    #[serde(alias = "invertedColors")]
    pub inverted_colors: bool,
    #[serde(alias = "renderingMode")]
    pub rendering_mode: RenderMode,
    #[serde(alias = "refreshInterval")]
    pub refresh_interval: u32,
    #[serde(alias = "manualRefreshOnly")]
    pub manual_refresh_only: bool,
    #[serde(alias = "sleepEnabled")]
    pub sleep_enabled: bool,
    #[serde(alias = "sleepStartHour")]
    pub sleep_start_hour: u8,
    #[serde(alias = "sleepEndHour")]
    pub sleep_end_hour: u8,
    #[serde(alias = "deepSleepEnabled")]
    pub deep_sleep_enabled: bool,
    /// Deep sleep wake interval in seconds.
    #[serde(alias = "deepSleepInterval")]
    pub deep_sleep_interval: u32,
    #[serde(alias = "dailyRefreshEnabled")]
    pub daily_refresh_enabled: bool,
    /// "HH:MM" wall-clock time for daily refresh.
    #[serde(alias = "dailyRefreshTime")]
    pub daily_refresh_time: String,
    /// Silent hours during which no refresh is scheduled.
    #[serde(alias = "noRefreshStartHour", skip_serializing_if = "Option::is_none")]
    pub no_refresh_start_hour: Option<u8>,
    #[serde(alias = "noRefreshEndHour", skip_serializing_if = "Option::is_none")]
    pub no_refresh_end_hour: Option<u8>,
    #[serde(alias = "oeplEntityId", skip_serializing_if = "String::is_empty")]
    pub oepl_entity_id: String,
    #[serde(alias = "opendisplayEntityId", skip_serializing_if = "String::is_empty")]
    pub opendisplay_entity_id: String,
    #[serde(alias = "oeplDither")]
    pub dither: u8,
    /// Payload time-to-live in minutes.
    pub ttl: u32,
    #[serde(alias = "deviceName", skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(alias = "deviceModel", skip_serializing_if = "Option::is_none")]
    pub device_model: Option<String>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        DeviceSettings {
            width: 800,
            height: 480,
            shape: default_shape(),
            orientation: default_orientation(),
            dark_mode: false,
            inverted_colors: false,
            rendering_mode: RenderMode::Direct,
            refresh_interval: default_refresh_interval(),
            manual_refresh_only: false,
            sleep_enabled: false,
            sleep_start_hour: 0,
            sleep_end_hour: default_sleep_end(),
            deep_sleep_enabled: false,
            deep_sleep_interval: default_deep_sleep_interval(),
            daily_refresh_enabled: false,
            daily_refresh_time: default_daily_time(),
            no_refresh_start_hour: None,
            no_refresh_end_hour: None,
            oepl_entity_id: String::new(),
            opendisplay_entity_id: String::new(),
            dither: default_dither(),
            ttl: default_ttl(),
            device_name: None,
            device_model: None,
        }
    }
}

impl DeviceSettings {
    pub fn portrait(&self) -> bool {
        self.orientation == "portrait"
    }
}

/// Legacy/camelCase spellings mapped to canonical snake_case keys.
///
/// Used when settings arrive as a raw map (storage dumps flatten them
/// at the layout root) rather than through serde.
pub const SETTING_ALIASES: &[(&str, &str)] = &[
    ("resWidth", "width"),
    ("resHeight", "height"),
    ("darkMode", "dark_mode"),
    ("invertedColors", "inverted_colors"),
    ("renderingMode", "rendering_mode"),
    ("refreshInterval", "refresh_interval"),
    ("manualRefreshOnly", "manual_refresh_only"),
    ("sleepEnabled", "sleep_enabled"),
    ("sleepStartHour", "sleep_start_hour"),
    ("sleepEndHour", "sleep_end_hour"),
    ("deepSleepEnabled", "deep_sleep_enabled"),
    ("deepSleepInterval", "deep_sleep_interval"),
    ("dailyRefreshEnabled", "daily_refresh_enabled"),
    ("dailyRefreshTime", "daily_refresh_time"),
    ("noRefreshStartHour", "no_refresh_start_hour"),
    ("noRefreshEndHour", "no_refresh_end_hour"),
    ("oeplEntityId", "oepl_entity_id"),
    ("opendisplayEntityId", "opendisplay_entity_id"),
    ("oeplDither", "dither"),
    ("deviceName", "device_name"),
    ("deviceModel", "device_model"),
];

/// Canonical keys recognized at a layout root or inside a settings map.
pub const SETTING_KEYS: &[&str] = &[
    "width",
    "height",
    "shape",
    "orientation",
    "dark_mode",
    "inverted_colors",
    "rendering_mode",
    "refresh_interval",
    "manual_refresh_only",
    "sleep_enabled",
    "sleep_start_hour",
    "sleep_end_hour",
    "deep_sleep_enabled",
    "deep_sleep_interval",
    "daily_refresh_enabled",
    "daily_refresh_time",
    "no_refresh_start_hour",
    "no_refresh_end_hour",
    "oepl_entity_id",
    "opendisplay_entity_id",
    "dither",
    "ttl",
    "device_name",
    "device_model",
];

/// Resolve a settings key to canonical form, or None if unknown.
pub fn canonical_setting(key: &str) -> Option<&'static str> {
    if let Some((_, canon)) = SETTING_ALIASES.iter().find(|(alias, _)| *alias == key) {
        return Some(canon);
    }
    SETTING_KEYS.iter().find(|k| **k == key).copied()
}
