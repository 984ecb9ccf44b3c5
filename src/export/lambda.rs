//! Raw drawing-procedure export.
//!
//! Output is a block of `it.*` statements split into one
//! `if (id(display_page) == N)` branch per page, with one marker
//! comment per widget and a device header describing the settings the
//! layout was built for. The header and markers are what the importer
//! reads back; the drawing calls are for the device.

use std::fmt::Write as _;

use super::{Adapter, Dialect, ExportContext, ExportError, ExportSession};
use crate::marker;
use crate::models::{DeviceSettings, Layout, Widget};
use crate::plugins::sanitize_ident;

pub struct LambdaAdapter;

/// Human-readable power strategy line; the importer matches on the
/// leading keyword.
fn power_strategy(s: &DeviceSettings) -> String {
    if s.manual_refresh_only {
        "manual refresh only".to_string()
    } else if s.deep_sleep_enabled {
        format!("deep sleep every {}s", s.deep_sleep_interval)
    } else if s.daily_refresh_enabled {
        "daily refresh".to_string()
    } else if s.sleep_enabled {
        format!(
            "night sleep from {} to {}",
            s.sleep_start_hour, s.sleep_end_hour
        )
    } else {
        "always on".to_string()
    }
}

/// Visibility condition as a C expression, if the widget has one.
pub(crate) fn condition_expr(widget: &Widget) -> Option<String> {
    if widget.condition_entity.is_empty() {
        return None;
    }
    let var = sanitize_ident(&widget.condition_entity);
    let expr = match widget.condition_operator.as_str() {
        "!=" => format!("id({var}).state != \"{}\"", widget.condition_state),
        ">" => format!("id({var}).state > {}", widget.condition_state),
        ">=" => format!("id({var}).state >= {}", widget.condition_state),
        "<" => format!("id({var}).state < {}", widget.condition_state),
        "<=" => format!("id({var}).state <= {}", widget.condition_state),
        "range" => format!(
            "id({var}).state >= {} && id({var}).state <= {}",
            widget.condition_min, widget.condition_max
        ),
        // "==" and anything unrecognized compare against the state.
        _ => format!("id({var}).state == \"{}\"", widget.condition_state),
    };
    Some(expr)
}

impl Adapter for LambdaAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::Lambda
    }

    fn generate(
        &self,
        layout: &Layout,
        session: &mut ExportSession,
    ) -> Result<String, ExportError> {
        if layout.pages.is_empty() {
            return Err(ExportError::EmptyLayout);
        }
        let s = &layout.settings;
        // Requirements pass first so the font list can sit in the header.
        for page in &layout.pages {
            for widget in &page.widgets {
                if let Some(plugin) = session.registry().get(&widget.kind) {
                    plugin.collect_requirements(widget, &mut session.requirements);
                }
            }
        }
        let mut out = String::new();
        out.push_str("// TARGET DEVICE:\n");
        if let Some(name) = &s.device_name {
            let _ = writeln!(out, "//   Name: {name}");
        }
        let _ = writeln!(out, "//   Resolution: {}x{}", s.width, s.height);
        let _ = writeln!(out, "//   Shape: {}", s.shape);
        let _ = writeln!(out, "//   Inverted: {}", if s.inverted_colors { "yes" } else { "no" });
        let _ = writeln!(out, "//   Orientation: {}", s.orientation);
        let _ = writeln!(
            out,
            "//   Dark Mode: {}",
            if s.dark_mode { "enabled" } else { "disabled" }
        );
        let _ = writeln!(out, "//   Refresh Interval: {}s", s.refresh_interval);
        let _ = writeln!(out, "//   Power Strategy: {}", power_strategy(s));
        if s.daily_refresh_enabled {
            let _ = writeln!(out, "//   Refresh Time: {}", s.daily_refresh_time);
        }
        if let (Some(start), Some(end)) = (s.no_refresh_start_hour, s.no_refresh_end_hour) {
            let _ = writeln!(out, "//   Disable updates from {start} to {end}");
        }
        if !session.requirements.fonts.is_empty() {
            let ids: Vec<String> = session
                .requirements
                .fonts
                .iter()
                .map(|f| f.font_id())
                .collect();
            let _ = writeln!(out, "//   Fonts: {}", ids.join(", "));
        }
        out.push('\n');

        for (index, page) in layout.pages.iter().enumerate() {
            let ctx = ExportContext::new(s, page);
            let _ = writeln!(out, "if (id(display_page) == {index}) {{");
            let _ = writeln!(out, "  // page:name \"{}\"", page.name);
            if page.refresh_type != "interval" {
                let _ = writeln!(out, "  // page:refresh_type {}", page.refresh_type);
            }
            if !page.refresh_time.is_empty() {
                let _ = writeln!(out, "  // page:refresh_time {}", page.refresh_time);
            }
            if page.dark_mode != "inherit" {
                let _ = writeln!(out, "  // page:dark_mode {}", page.dark_mode);
            }
            if let Some(grid) = &page.layout {
                let _ = writeln!(out, "  // layout: {grid}");
            }
            let _ = writeln!(out, "  it.fill({});", ctx.color_const(ctx.background()));
            for widget in &page.widgets {
                if widget.hidden {
                    continue;
                }
                let Some(plugin) = session.registry().get(&widget.kind) else {
                    session.warn_unsupported(&widget.kind, Dialect::Lambda);
                    continue;
                };
                let Some(body) = plugin.export_lambda(widget, &ctx) else {
                    session.warn_unsupported(&widget.kind, Dialect::Lambda);
                    continue;
                };
                out.push('\n');
                let _ = writeln!(out, "  {}", marker::emit_marker("// ", widget));
                if let Some(cond) = condition_expr(widget) {
                    let _ = writeln!(out, "  if ({cond}) {{");
                    for line in &body {
                        let _ = writeln!(out, "    {line}");
                    }
                    out.push_str("  }\n");
                } else {
                    for line in &body {
                        let _ = writeln!(out, "  {line}");
                    }
                }
            }
            out.push_str("}\n");
            if index + 1 < layout.pages.len() {
                out.push('\n');
            }
        }
        Ok(out)
    }
}
