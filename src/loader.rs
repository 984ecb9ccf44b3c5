//! Loading saved layout models from disk.
//!
//! A model file is usually a plain layout object, but browser storage
//! dumps wrap the layout under `data.devices.<id>` and older saves
//! flatten settings keys to the layout root. The loader accepts all of
//! those shapes and normalizes to one in-memory form.

use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::import::repair;
use crate::models::{canonical_setting, DeviceSettings, Layout, Page, RenderMode, Warning};
use crate::plugins::PluginRegistry;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse model: {0}")]
    Parse(String),
}

#[derive(Debug)]
pub struct LoadResult {
    pub layout: Layout,
    pub warnings: Vec<Warning>,
}

/// Capability hints for device models seen in the wild.
struct DeviceProfile {
    epaper: bool,
    declarative: bool,
}

const DEVICE_PROFILES: &[(&str, DeviceProfile)] = &[
    ("waveshare_7in5", DeviceProfile { epaper: true, declarative: false }),
    ("waveshare_4in2", DeviceProfile { epaper: true, declarative: false }),
    ("lilygo_t5_47", DeviceProfile { epaper: true, declarative: false }),
    ("reterminal_e10", DeviceProfile { epaper: true, declarative: false }),
    ("sunton_7in", DeviceProfile { epaper: false, declarative: true }),
    ("guition_4848", DeviceProfile { epaper: false, declarative: true }),
    ("m5stack_core2", DeviceProfile { epaper: false, declarative: true }),
];

fn device_profile(model: &str) -> Option<&'static DeviceProfile> {
    DEVICE_PROFILES
        .iter()
        .find(|(name, _)| model.starts_with(name))
        .map(|(_, profile)| profile)
}

pub fn load_model_file(path: &Path, registry: &PluginRegistry) -> Result<LoadResult, LoadError> {
    let text = fs::read_to_string(path)?;
    load_model(&text, registry)
}

/// Parse a saved model document into a normalized layout.
pub fn load_model(text: &str, registry: &PluginRegistry) -> Result<LoadResult, LoadError> {
    let mut warnings = Vec::new();
    let value = repair::parse_json_lenient(text, &mut warnings).map_err(LoadError::Parse)?;
    let (device_id, layout_value) = unwrap_storage_dump(value, &mut warnings);
    let mut layout = layout_from_value(layout_value, &mut warnings)?;
    if layout.device_id.is_none() {
        layout.device_id = device_id;
    }
    normalize(&mut layout, registry, &mut warnings);
    Ok(LoadResult { layout, warnings })
}

/// Peel a `data.devices.<id>` storage envelope, if present.
fn unwrap_storage_dump(value: Value, warnings: &mut Vec<Warning>) -> (Option<String>, Value) {
    let devices = value
        .pointer("/data/devices")
        .or_else(|| value.get("devices"))
        .and_then(Value::as_object);
    let Some(devices) = devices else {
        return (None, value);
    };
    let Some((id, layout)) = devices.iter().next() else {
        return (None, Value::Object(serde_json::Map::new()));
    };
    if devices.len() > 1 {
        warnings.push(Warning::new(
            format!("storage dump holds {} devices, loading \"{id}\"", devices.len()),
            0,
        ));
    }
    (Some(id.clone()), layout.clone())
}

fn layout_from_value(value: Value, warnings: &mut Vec<Warning>) -> Result<Layout, LoadError> {
    let Value::Object(map) = value else {
        return Err(LoadError::Parse("layout is not an object".to_string()));
    };

    // Settings may live in a nested map, at the layout root, or both.
    // Root keys win over nested ones.
    let mut merged = serde_json::Map::new();
    if let Some(Value::Object(nested)) = map.get("settings") {
        for (key, value) in nested {
            match canonical_setting(key) {
                Some(canon) => {
                    merged.insert(canon.to_string(), value.clone());
                }
                None => warnings.push(Warning::new(
                    format!("unknown setting \"{key}\" ignored"),
                    0,
                )),
            }
        }
    }
    for (key, value) in &map {
        if matches!(
            key.as_str(),
            "settings" | "pages" | "currentPageIndex" | "current_page_index" | "device_id"
        ) {
            continue;
        }
        if let Some(canon) = canonical_setting(key) {
            merged.insert(canon.to_string(), value.clone());
        }
    }
    let settings: DeviceSettings = serde_json::from_value(Value::Object(merged))
        .map_err(|err| LoadError::Parse(format!("bad settings: {err}")))?;

    let mut layout = Layout {
        settings,
        ..Default::default()
    };
    layout.device_id = map
        .get("device_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    layout.current_page_index = map
        .get("current_page_index")
        .or_else(|| map.get("currentPageIndex"))
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;

    // Bad pages are skipped individually so one corrupt page does not
    // lose the whole model.
    if let Some(Value::Array(pages)) = map.get("pages") {
        for (index, page) in pages.iter().enumerate() {
            match serde_json::from_value::<Page>(page.clone()) {
                Ok(page) => layout.pages.push(page),
                Err(err) => warnings.push(Warning::new(
                    format!("page {index} skipped: {err}"),
                    0,
                )),
            }
        }
    }
    Ok(layout)
}

fn normalize(layout: &mut Layout, registry: &PluginRegistry, warnings: &mut Vec<Warning>) {
    if layout.pages.is_empty() {
        warnings.push(Warning::new("model has no pages, starting with one", 0));
        layout.pages.push(Page::default());
    }
    for (index, page) in layout.pages.iter_mut().enumerate() {
        if page.id.is_empty() {
            page.id = format!("page_{index}");
        }
        if page.name.is_empty() {
            page.name = format!("Page {}", index + 1);
        }
        for widget in &mut page.widgets {
            registry.apply_defaults(widget);
        }
    }
    if layout.current_page_index >= layout.pages.len() {
        layout.current_page_index = 0;
    }

    // Declarative rendering on an e-paper panel that never held any
    // native nodes is almost always a stale saved setting.
    if layout.settings.rendering_mode == RenderMode::Declarative {
        let profile = layout
            .settings
            .device_model
            .as_deref()
            .and_then(device_profile);
        let has_native = layout
            .pages
            .iter()
            .flat_map(|p| &p.widgets)
            .any(|w| w.kind.starts_with("lvgl_"));
        if let Some(profile) = profile {
            if profile.epaper && !profile.declarative && !has_native {
                warnings.push(Warning::new(
                    "declarative rendering not supported on this device, using direct",
                    0,
                ));
                layout.settings.rendering_mode = RenderMode::Direct;
            }
        }
    }
}
