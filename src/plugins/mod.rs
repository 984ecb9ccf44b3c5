//! Widget plugins.
//!
//! Each widget type is implemented by a plugin that owns its default
//! properties and its per-dialect export. A registry maps type names
//! (including legacy aliases) to plugins; exporters skip widgets whose
//! plugin lacks the requested dialect and report the gap once per run.

mod drawing;
mod indicators;
mod shapes;
mod text;

pub use drawing::{
    ArcPlugin, DebugGridPlugin, EllipsePlugin, IconSequencePlugin, PlotPlugin, PolygonPlugin,
    RectanglePatternPlugin,
};
pub use indicators::{
    IconPlugin, OnlineImagePlugin, ProgressBarPlugin, QrCodePlugin, TouchAreaPlugin,
};
pub use shapes::{CirclePlugin, LinePlugin, RectPlugin, RoundedRectPlugin};
pub use text::{DatetimePlugin, MultilinePlugin, SensorTextPlugin, TextPlugin};

use std::collections::HashMap;
use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::export::{DeclarativeNode, ExportContext, PayloadItem, Requirements};
use crate::models::{PropMap, PropValue, Widget};

/// A widget type implementation.
///
/// Export methods return `None` when the plugin does not speak the
/// dialect; the calling adapter decides how to report the gap.
pub trait Plugin: Send + Sync {
    /// Canonical type name.
    fn kind(&self) -> &'static str;

    /// Properties a fresh widget of this type starts with.
    fn defaults(&self) -> PropMap;

    /// Canvas size used when an imported block carries no geometry.
    fn default_size(&self) -> (i32, i32) {
        (100, 30)
    }

    /// Drawing items for the wrapped payload dialects.
    fn export_payload(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<PayloadItem>> {
        let _ = (widget, ctx);
        None
    }

    /// Statement lines for the drawing-procedure dialect.
    fn export_lambda(&self, widget: &Widget, ctx: &ExportContext) -> Option<Vec<String>> {
        let _ = (widget, ctx);
        None
    }

    /// A node for the declarative-tree dialect.
    fn export_declarative(&self, widget: &Widget, ctx: &ExportContext) -> Option<DeclarativeNode> {
        let _ = (widget, ctx);
        None
    }

    /// Record fonts or other resources this widget needs.
    fn collect_requirements(&self, widget: &Widget, reqs: &mut Requirements) {
        let _ = (widget, reqs);
    }
}

/// Build a property map from literal pairs.
pub(crate) fn props<const N: usize>(entries: [(&str, PropValue); N]) -> PropMap {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Turn an entity id or widget id into a C-style identifier.
pub(crate) fn sanitize_ident(s: &str) -> String {
    let mut out: String = s
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Escape text for inclusion in a printf format string literal.
pub(crate) fn c_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '%' => out.push_str("%%"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for a plain C string literal. Unlike [`c_escape`] this
/// leaves `%` alone, so strftime formats pass through intact.
pub(crate) fn str_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Legacy and shorthand type names accepted on import.
const ALIASES: &[(&str, &str)] = &[
    ("label", "text"),
    ("rect", "shape_rect"),
    ("rectangle", "shape_rect"),
    ("rrect", "rounded_rect"),
    ("circle", "shape_circle"),
    ("qrcode", "qr_code"),
    ("dlimg", "online_image"),
    ("image", "online_image"),
    ("puppet", "online_image"),
    ("multiline", "odp_multiline"),
    ("polygon", "odp_polygon"),
    ("ellipse", "odp_ellipse"),
    ("arc", "odp_arc"),
    ("plot", "odp_plot"),
    ("icon_sequence", "odp_icon_sequence"),
    ("rectangle_pattern", "odp_rectangle_pattern"),
    ("odp_debug_grid", "debug_grid"),
    ("nav_next_page", "touch_area"),
    ("nav_previous_page", "touch_area"),
    ("nav_reload_page", "touch_area"),
];

/// Maps widget type names to their plugins.
pub struct PluginRegistry {
    plugins: IndexMap<&'static str, Box<dyn Plugin>>,
    aliases: HashMap<&'static str, &'static str>,
}

impl PluginRegistry {
    /// Registry with every built-in widget type.
    pub fn builtin() -> Self {
        let mut registry = PluginRegistry {
            plugins: IndexMap::new(),
            aliases: ALIASES.iter().copied().collect(),
        };
        registry.register(Box::new(TextPlugin));
        registry.register(Box::new(SensorTextPlugin));
        registry.register(Box::new(DatetimePlugin));
        registry.register(Box::new(MultilinePlugin));
        registry.register(Box::new(RectPlugin));
        registry.register(Box::new(RoundedRectPlugin));
        registry.register(Box::new(CirclePlugin));
        registry.register(Box::new(LinePlugin));
        registry.register(Box::new(IconPlugin));
        registry.register(Box::new(QrCodePlugin));
        registry.register(Box::new(ProgressBarPlugin));
        registry.register(Box::new(OnlineImagePlugin));
        registry.register(Box::new(TouchAreaPlugin));
        registry.register(Box::new(PolygonPlugin));
        registry.register(Box::new(EllipsePlugin));
        registry.register(Box::new(ArcPlugin));
        registry.register(Box::new(IconSequencePlugin));
        registry.register(Box::new(RectanglePatternPlugin));
        registry.register(Box::new(DebugGridPlugin));
        registry.register(Box::new(PlotPlugin));
        registry
    }

    /// Shared read-only instance.
    pub fn shared() -> &'static PluginRegistry {
        static SHARED: OnceLock<PluginRegistry> = OnceLock::new();
        SHARED.get_or_init(PluginRegistry::builtin)
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.insert(plugin.kind(), plugin);
    }

    /// Resolve a type name through the alias table.
    pub fn canonical(&self, kind: &str) -> Option<&'static str> {
        if let Some(canon) = self.aliases.get(kind) {
            return Some(canon);
        }
        self.plugins.get_key_value(kind).map(|(k, _)| *k)
    }

    pub fn get(&self, kind: &str) -> Option<&dyn Plugin> {
        let canon = self.aliases.get(kind).copied().unwrap_or(kind);
        self.plugins.get(canon).map(|p| p.as_ref())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.get(kind).is_some()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Canonical type names in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.plugins.keys().copied()
    }

    /// Fill in missing props and geometry from plugin defaults.
    pub fn apply_defaults(&self, widget: &mut Widget) {
        let Some(plugin) = self.get(&widget.kind) else {
            return;
        };
        for (key, value) in plugin.defaults() {
            widget.props.entry(key).or_insert(value);
        }
        let (dw, dh) = plugin.default_size();
        if widget.width <= 0 {
            widget.width = dw;
        }
        if widget.height <= 0 {
            widget.height = dh;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_resolves_aliases() {
        let registry = PluginRegistry::builtin();
        assert_eq!(registry.canonical("rectangle"), Some("shape_rect"));
        assert_eq!(registry.canonical("label"), Some("text"));
        assert_eq!(registry.canonical("shape_rect"), Some("shape_rect"));
        assert_eq!(registry.canonical("made_up"), None);
        assert!(registry.contains("nav_next_page"));
        assert!(!registry.contains("lvgl_slider"));
    }

    #[test]
    fn test_apply_defaults_fills_gaps_only() {
        let registry = PluginRegistry::builtin();
        let mut w = Widget::new("t1", "text");
        w.props.insert("font_size".into(), 34.into());
        registry.apply_defaults(&mut w);
        assert_eq!(w.prop_i64("font_size", 0), 34);
        assert_eq!(w.prop_str("font_family", ""), "Roboto");
        assert_eq!((w.width, w.height), (100, 30));
    }

    #[test]
    fn test_sanitize_ident() {
        assert_eq!(sanitize_ident("sensor.kitchen_temp"), "sensor_kitchen_temp");
        assert_eq!(sanitize_ident("2nd"), "_2nd");
    }

    #[test]
    fn test_c_escape() {
        assert_eq!(c_escape("50% \"done\""), "50%% \\\"done\\\"");
    }

    #[test]
    fn test_str_escape_keeps_percent() {
        assert_eq!(str_escape("%H:%M"), "%H:%M");
        assert_eq!(str_escape("say \"hi\""), "say \\\"hi\\\"");
    }
}
