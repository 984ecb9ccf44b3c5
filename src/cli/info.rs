//! Info and plugins command implementations

use std::path::Path;
use std::process::ExitCode;

use serde_json::json;

use super::{report_warnings, EXIT_ERROR, EXIT_SUCCESS};
use crate::export::{ExportContext, Requirements};
use crate::loader;
use crate::models::Widget;
use crate::plugins::PluginRegistry;

/// Execute the info command
pub fn run_info(input: &Path, as_json: bool) -> ExitCode {
    let registry = PluginRegistry::shared();
    let loaded = match loader::load_model_file(input, registry) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    report_warnings(&loaded.warnings);
    let layout = &loaded.layout;
    let settings = &layout.settings;

    // Fonts the generated config would need available.
    let mut reqs = Requirements::default();
    for page in &layout.pages {
        for widget in &page.widgets {
            if let Some(plugin) = registry.get(&widget.kind) {
                plugin.collect_requirements(widget, &mut reqs);
            }
        }
    }
    let fonts: Vec<String> = reqs.fonts.iter().map(|f| f.font_id()).collect();

    if as_json {
        let pages: Vec<_> = layout
            .pages
            .iter()
            .map(|p| {
                json!({
                    "id": p.id,
                    "name": p.name,
                    "widgets": p.widgets.len(),
                    "dark_mode": p.dark_mode,
                })
            })
            .collect();
        let doc = json!({
            "device": {
                "name": settings.device_name,
                "model": settings.device_model,
                "width": settings.width,
                "height": settings.height,
                "orientation": settings.orientation,
                "dark_mode": settings.dark_mode,
                "rendering_mode": settings.rendering_mode,
            },
            "pages": pages,
            "widget_count": layout.widget_count(),
            "fonts": fonts,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    let name = settings.device_name.as_deref().unwrap_or("(unnamed)");
    println!("Device: {} ({}x{}, {})", name, settings.width, settings.height, settings.orientation);
    if let Some(model) = settings.device_model.as_deref() {
        println!("Model: {}", model);
    }
    println!(
        "Pages: {} ({} widgets total)",
        layout.pages.len(),
        layout.widget_count()
    );
    for (index, page) in layout.pages.iter().enumerate() {
        let current = if index == layout.current_page_index { "*" } else { " " };
        println!("  {}{} {} ({} widgets)", current, page.id, page.name, page.widgets.len());
    }
    if !fonts.is_empty() {
        println!("Fonts: {}", fonts.join(", "));
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Execute the plugins command
pub fn run_plugins(as_json: bool) -> ExitCode {
    let registry = PluginRegistry::shared();
    let settings = crate::models::DeviceSettings::default();
    let page = crate::models::Page::default();
    let ctx = ExportContext::new(&settings, &page);

    let mut rows = Vec::new();
    for kind in registry.kinds() {
        let plugin = registry.get(kind).expect("registered kind");
        // Probe dialect support with a defaulted widget.
        let mut probe = Widget::new("probe", kind);
        registry.apply_defaults(&mut probe);
        let payload = plugin.export_payload(&probe, &ctx).is_some();
        let lambda = plugin.export_lambda(&probe, &ctx).is_some();
        let declarative = plugin.export_declarative(&probe, &ctx).is_some();
        rows.push((kind, payload, lambda, declarative));
    }

    if as_json {
        let doc: Vec<_> = rows
            .iter()
            .map(|(kind, payload, lambda, declarative)| {
                json!({
                    "type": kind,
                    "payload": payload,
                    "lambda": lambda,
                    "declarative": declarative,
                })
            })
            .collect();
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    println!("{:<24} {:<8} {:<8} {}", "type", "payload", "lambda", "declarative");
    for (kind, payload, lambda, declarative) in rows {
        let mark = |b: bool| if b { "yes" } else { "-" };
        println!(
            "{:<24} {:<8} {:<8} {}",
            kind,
            mark(payload),
            mark(lambda),
            mark(declarative)
        );
    }
    ExitCode::from(EXIT_SUCCESS)
}
