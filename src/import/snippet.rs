//! Heuristic import of mixed configuration snippets.
//!
//! A pasted document may interleave drawing-procedure blocks,
//! declarative widget trees and payload fragments. The parser walks
//! line by line, preferring marker comments (lossless) and falling
//! back to recovering widgets from native tag nodes, payload items and
//! a small set of drawing calls. Anything it cannot place becomes a
//! warning, never a failure.

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use crate::marker;
use crate::models::{DeviceSettings, Layout, Page, PropValue, Warning, Widget};
use crate::plugins::PluginRegistry;

use super::payload::{self, PAYLOAD_TYPES};
use super::reconstruct::{self, coerce};
use super::repair;

/// Native tree tags recovered as pass-through widgets.
const WIDGET_TAGS: &[&str] = &[
    "label",
    "button",
    "arc",
    "bar",
    "slider",
    "chart",
    "dropdown",
    "roller",
    "spinbox",
    "switch",
    "textarea",
    "obj",
    "img",
    "qrcode",
    "led",
    "spinner",
    "line",
    "meter",
    "tabview",
    "tileview",
    "checkbox",
    "keyboard",
    "buttonmatrix",
    "list",
];

fn page_cond_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:id\(display_page\)|currentPage|\bpage)\s*==\s*(\d+)").unwrap()
    })
}

fn decl_page_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-\s*id:\s*page_(\d+)\s*$").unwrap())
}

fn page_meta_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^page:(\w+)\s*(.*)$").unwrap())
}

fn native_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)-\s*(\w+):\s*$").unwrap())
}

fn payload_item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^(\s*)-\s*type:\s*["']?(\w+)["']?\s*$"#).unwrap())
}

fn filled_rect_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"it\.filled_rectangle\(\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)")
            .unwrap()
    })
}

fn rect_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"it\.rectangle\(\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)").unwrap()
    })
}

fn filled_circle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"it\.filled_circle\(\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)").unwrap()
    })
}

fn circle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"it\.circle\(\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)").unwrap())
}

fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"it\.line\(\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)\s*,\s*(-?\d+)").unwrap()
    })
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

/// Take the list item starting at `start` (its dash line plus every
/// deeper-indented line). Returns the dedented chunk and the index of
/// the first line after it.
fn extract_item_block(lines: &[&str], start: usize) -> (String, usize) {
    let base = indent_of(lines[start]);
    let mut end = start + 1;
    while end < lines.len() {
        let line = lines[end];
        if !line.trim().is_empty() && indent_of(line) <= base {
            break;
        }
        end += 1;
    }
    let chunk: Vec<&str> = lines[start..end]
        .iter()
        .map(|l| if l.len() >= base { &l[base..] } else { l.trim_start() })
        .collect();
    (chunk.join("\n"), end)
}

/// Per-channel brightness for dark-mode detection.
fn color_brightness(color: &str) -> Option<u32> {
    let (r, g, b): (u32, u32, u32) = match color.to_lowercase().as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "gray" | "grey" => (128, 128, 128),
        hex if hex.starts_with('#') && hex.len() == 7 => (
            u32::from_str_radix(&hex[1..3], 16).ok()?,
            u32::from_str_radix(&hex[3..5], 16).ok()?,
            u32::from_str_radix(&hex[5..7], 16).ok()?,
        ),
        _ => return None,
    };
    Some((r * 299 + g * 587 + b * 114) / 1000)
}

fn parse_header_line(rest: &str, settings: &mut DeviceSettings) {
    static RES: OnceLock<Regex> = OnceLock::new();
    static SILENT: OnceLock<Regex> = OnceLock::new();
    static EVERY: OnceLock<Regex> = OnceLock::new();
    static SLEEP: OnceLock<Regex> = OnceLock::new();
    let res_re = RES.get_or_init(|| Regex::new(r"(?i)^resolution:\s*(\d+)\s*x\s*(\d+)").unwrap());
    let silent_re = SILENT
        .get_or_init(|| Regex::new(r"(?i)disable updates from\s*(\d+)\s*to\s*(\d+)").unwrap());
    let every_re = EVERY.get_or_init(|| Regex::new(r"every\s*(\d+)s").unwrap());
    let sleep_re = SLEEP.get_or_init(|| Regex::new(r"from\s*(\d+)\s*to\s*(\d+)").unwrap());

    let lower = rest.to_lowercase();
    if let Some(value) = rest.strip_prefix("Name:").or_else(|| rest.strip_prefix("name:")) {
        let value = value.trim();
        if !value.is_empty() {
            settings.device_name = Some(value.to_string());
        }
    } else if let Some(caps) = res_re.captures(rest) {
        settings.width = caps[1].parse().unwrap_or(settings.width);
        settings.height = caps[2].parse().unwrap_or(settings.height);
    } else if let Some(value) = lower.strip_prefix("shape:") {
        settings.shape = value.trim().to_string();
    } else if let Some(value) = lower.strip_prefix("inverted:") {
        settings.inverted_colors = matches!(value.trim(), "yes" | "true");
    } else if let Some(value) = lower.strip_prefix("orientation:") {
        settings.orientation = value.trim().to_string();
    } else if let Some(value) = lower.strip_prefix("dark mode:") {
        settings.dark_mode = matches!(value.trim(), "enabled" | "on" | "true");
    } else if let Some(value) = lower.strip_prefix("refresh interval:") {
        if let Some(n) = value.trim().trim_end_matches('s').parse::<u32>().ok() {
            settings.refresh_interval = n;
        }
    } else if let Some(value) = lower.strip_prefix("refresh time:") {
        settings.daily_refresh_time = value.trim().to_string();
    } else if let Some(strategy) = lower.strip_prefix("power strategy:") {
        let strategy = strategy.trim();
        if strategy.contains("manual") {
            settings.manual_refresh_only = true;
        } else if strategy.contains("deep") || strategy.contains("ultra") {
            settings.deep_sleep_enabled = true;
            if let Some(caps) = every_re.captures(strategy) {
                settings.deep_sleep_interval =
                    caps[1].parse().unwrap_or(settings.deep_sleep_interval);
            }
        } else if strategy.contains("daily") {
            settings.daily_refresh_enabled = true;
        } else if strategy.contains("night") || strategy.contains("sleep") {
            settings.sleep_enabled = true;
            if let Some(caps) = sleep_re.captures(strategy) {
                settings.sleep_start_hour = caps[1].parse().unwrap_or(0);
                settings.sleep_end_hour = caps[2].parse().unwrap_or(5);
            }
        }
    } else if let Some(caps) = silent_re.captures(rest) {
        settings.no_refresh_start_hour = caps[1].parse().ok();
        settings.no_refresh_end_hour = caps[2].parse().ok();
    }
}

/// Flatten a native tag node body into widget props.
fn absorb_node_body(w: &mut Widget, body: &serde_json::Value) {
    let Some(map) = body.as_object() else {
        return;
    };
    for (key, value) in map {
        match key.as_str() {
            "id" => {
                if let Some(id) = value.as_str() {
                    w.id = id.to_string();
                }
            }
            "x" => w.x = value.as_i64().unwrap_or(0) as i32,
            "y" => w.y = value.as_i64().unwrap_or(0) as i32,
            "width" | "w" => w.width = value.as_i64().unwrap_or(0) as i32,
            "height" | "h" => w.height = value.as_i64().unwrap_or(0) as i32,
            "points" => {
                let points = match value {
                    serde_json::Value::Array(items) => PropValue::List(
                        items
                            .iter()
                            .map(|p| match p {
                                serde_json::Value::Array(pair) if pair.len() == 2 => {
                                    PropValue::Str(format!(
                                        "{},{}",
                                        pair[0].as_i64().unwrap_or(0),
                                        pair[1].as_i64().unwrap_or(0)
                                    ))
                                }
                                other => PropValue::from(other),
                            })
                            .collect(),
                    ),
                    serde_json::Value::String(s) => PropValue::List(
                        s.split_whitespace()
                            .map(|p| PropValue::Str(p.to_string()))
                            .collect(),
                    ),
                    other => PropValue::from(other),
                };
                w.props.insert("points".to_string(), points);
            }
            "options" => {
                let options = match value {
                    serde_json::Value::Array(items) => PropValue::List(
                        items
                            .iter()
                            .map(|o| PropValue::Str(o.as_str().unwrap_or_default().to_string()))
                            .collect(),
                    ),
                    serde_json::Value::String(s) => PropValue::List(
                        s.lines().map(|o| PropValue::Str(o.to_string())).collect(),
                    ),
                    other => PropValue::from(other),
                };
                w.props.insert("options".to_string(), options);
            }
            // Nested style blocks flatten to prefixed keys.
            _ if value.is_object() => {
                for (sub, sv) in value.as_object().unwrap() {
                    let flat = format!("{key}_{sub}");
                    w.props.insert(flat.clone(), json_prop(&flat, sv));
                }
            }
            _ => {
                w.props.insert(key.clone(), json_prop(key, value));
            }
        }
    }
}

/// JSON node value to a typed prop, running strings through the same
/// coercion markers use (units stripped, bools and numbers typed).
fn json_prop(key: &str, value: &serde_json::Value) -> PropValue {
    match value {
        serde_json::Value::String(s) => coerce(key, s),
        other => PropValue::from(other),
    }
}

fn tag_block_to_widget(
    tag: &str,
    chunk: &str,
    fallback_id: String,
    warnings: &mut Vec<Warning>,
    line: usize,
) -> Option<Widget> {
    let parsed: serde_yaml::Value = match serde_yaml::from_str(chunk) {
        Ok(v) => v,
        Err(err) => {
            warnings.push(Warning::new(
                format!("could not parse {tag} block: {err}"),
                line,
            ));
            return None;
        }
    };
    let json = repair::yaml_to_json(parsed);
    let body = json
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| item.get(tag))
        .cloned()
        .unwrap_or(serde_json::Value::Null);
    let mut w = Widget::new(fallback_id, format!("lvgl_{tag}"));
    absorb_node_body(&mut w, &body);
    if w.width <= 0 {
        w.width = 100;
    }
    if w.height <= 0 {
        w.height = 30;
    }
    Some(w)
}

/// Recover a widget from a bare drawing call.
fn procedure_widget(
    line: &str,
    counters: &mut HashMap<&'static str, usize>,
    registry: &PluginRegistry,
) -> Option<Widget> {
    let mut next = |prefix: &'static str| {
        let n = counters.entry(prefix).or_insert(0);
        *n += 1;
        format!("w_{prefix}_{n}")
    };
    let parse = |s: &str| s.parse::<i32>().unwrap_or(0);
    let mut w = if let Some(caps) = filled_rect_re().captures(line) {
        let mut w = Widget::new(next("frect"), "shape_rect");
        (w.x, w.y, w.width, w.height) = (
            parse(&caps[1]),
            parse(&caps[2]),
            parse(&caps[3]),
            parse(&caps[4]),
        );
        w.props.insert("fill".into(), true.into());
        w
    } else if let Some(caps) = rect_re().captures(line) {
        let mut w = Widget::new(next("rect"), "shape_rect");
        (w.x, w.y, w.width, w.height) = (
            parse(&caps[1]),
            parse(&caps[2]),
            parse(&caps[3]),
            parse(&caps[4]),
        );
        w.props.insert("fill".into(), false.into());
        w
    } else if let Some(caps) = filled_circle_re().captures(line) {
        let r = parse(&caps[3]);
        let mut w = Widget::new(next("fcircle"), "shape_circle");
        (w.x, w.y, w.width, w.height) = (parse(&caps[1]) - r, parse(&caps[2]) - r, 2 * r, 2 * r);
        w.props.insert("fill".into(), true.into());
        w
    } else if let Some(caps) = circle_re().captures(line) {
        let r = parse(&caps[3]);
        let mut w = Widget::new(next("circle"), "shape_circle");
        (w.x, w.y, w.width, w.height) = (parse(&caps[1]) - r, parse(&caps[2]) - r, 2 * r, 2 * r);
        w.props.insert("fill".into(), false.into());
        w
    } else if let Some(caps) = line_re().captures(line) {
        let (x1, y1, x2, y2) = (
            parse(&caps[1]),
            parse(&caps[2]),
            parse(&caps[3]),
            parse(&caps[4]),
        );
        let mut w = Widget::new(next("line"), "line");
        w.x = x1.min(x2);
        w.y = y1.min(y2);
        w.width = (x2 - x1).abs().max(1);
        w.height = (y2 - y1).abs().max(1);
        w.props.insert(
            "orientation".into(),
            if (x2 - x1).abs() >= (y2 - y1).abs() {
                "horizontal"
            } else {
                "vertical"
            }
            .into(),
        );
        w
    } else {
        return None;
    };
    registry.apply_defaults(&mut w);
    Some(w)
}

fn page_mut(pages: &mut BTreeMap<usize, Page>, index: usize) -> &mut Page {
    pages
        .entry(index)
        .or_insert_with(|| Page::new(format!("page_{index}"), String::new()))
}

/// Parse a mixed snippet into a layout.
pub fn parse_snippet(
    text: &str,
    registry: &PluginRegistry,
    warnings: &mut Vec<Warning>,
) -> Layout {
    let lines: Vec<&str> = text.lines().collect();
    let mut settings = DeviceSettings::default();
    let mut pages: BTreeMap<usize, Page> = BTreeMap::new();
    let mut current = 0usize;
    // Drawing calls after a marker belong to that marker's widget.
    let mut covered = false;
    // A native node right after a marker is the marker's own export.
    let mut skip_node = false;
    let mut decl_page = false;
    let mut pending_item_id: Option<String> = None;
    let mut counters: HashMap<&'static str, usize> = HashMap::new();
    let mut total = 0usize;

    let mut i = 0;
    while i < lines.len() {
        let raw = lines[i];
        let line = raw.trim();
        if line.is_empty() {
            covered = false;
            i += 1;
            continue;
        }

        if let Some(m) = marker::parse_marker(line) {
            total += 1;
            let fallback = format!("w_{total}");
            let widget = reconstruct::widget_from_marker(&m, &fallback, registry);
            page_mut(&mut pages, current).widgets.push(widget);
            covered = true;
            skip_node = true;
            i += 1;
            continue;
        }

        if let Some(rest) = line.strip_prefix("//").or_else(|| line.strip_prefix('#')) {
            let rest = rest.trim();
            if let Some(caps) = page_meta_re().captures(rest) {
                let page = page_mut(&mut pages, current);
                let value = caps[2].trim().trim_matches('"').to_string();
                match &caps[1] {
                    "name" => page.name = value,
                    "dark_mode" => page.dark_mode = value,
                    "refresh_type" => page.refresh_type = value,
                    "refresh_time" => page.refresh_time = value,
                    _ => {}
                }
            } else if let Some(grid) = rest.strip_prefix("layout:") {
                page_mut(&mut pages, current).layout = Some(grid.trim().to_string());
            } else if let Some(id) = rest.strip_prefix("id:") {
                pending_item_id = Some(id.trim().to_string());
            } else {
                parse_header_line(rest, &mut settings);
            }
            i += 1;
            continue;
        }

        if let Some(caps) = page_cond_re().captures(line) {
            current = caps[1].parse().unwrap_or(0);
            page_mut(&mut pages, current);
            covered = false;
            skip_node = false;
            decl_page = false;
            i += 1;
            continue;
        }

        if let Some(caps) = decl_page_re().captures(line) {
            current = caps[1].parse().unwrap_or(0);
            page_mut(&mut pages, current);
            decl_page = true;
            skip_node = false;
            i += 1;
            continue;
        }

        if let Some(caps) = payload_item_re().captures(raw) {
            let kind = caps[2].to_string();
            if PAYLOAD_TYPES.contains(&kind.as_str()) {
                let (chunk, end) = extract_item_block(&lines, i);
                match serde_yaml::from_str::<serde_yaml::Value>(&chunk) {
                    Ok(value) => {
                        let json = repair::yaml_to_json(value);
                        if let Some(item) = json.as_array().and_then(|a| a.first()) {
                            if let Some(mut widget) =
                                payload::convert_item(item, total, warnings)
                            {
                                if let Some(id) = pending_item_id.take() {
                                    if item.get("id").is_none() {
                                        widget.id = id;
                                    }
                                }
                                registry.apply_defaults(&mut widget);
                                total += 1;
                                page_mut(&mut pages, current).widgets.push(widget);
                            }
                        }
                    }
                    Err(err) => warnings.push(Warning::new(
                        format!("could not parse payload item: {err}"),
                        i + 1,
                    )),
                }
                pending_item_id = None;
                i = end;
                continue;
            }
        }

        if let Some(caps) = native_tag_re().captures(raw) {
            let tag = caps[2].to_string();
            if WIDGET_TAGS.contains(&tag.as_str()) {
                let (chunk, end) = extract_item_block(&lines, i);
                if skip_node {
                    skip_node = false;
                    i = end;
                    continue;
                }
                total += 1;
                if let Some(widget) =
                    tag_block_to_widget(&tag, &chunk, format!("w_{total}"), warnings, i + 1)
                {
                    page_mut(&mut pages, current).widgets.push(widget);
                }
                i = end;
                continue;
            }
        }

        // Page-level declarative keys, only outside widget nodes.
        if decl_page {
            if let Some(value) = line.strip_prefix("name:") {
                page_mut(&mut pages, current).name =
                    value.trim().trim_matches('"').to_string();
                i += 1;
                continue;
            }
            if let Some(value) = line.strip_prefix("bg_color:") {
                let color = value.trim().trim_matches('"').to_string();
                let page = page_mut(&mut pages, current);
                // Dark backgrounds flip the page theme on import.
                if let Some(brightness) = color_brightness(&color) {
                    page.dark_mode = if brightness < 128 { "on" } else { "off" }.to_string();
                }
                page.bg_color = Some(color);
                i += 1;
                continue;
            }
            if let Some(value) = line.strip_prefix("bg_opa:") {
                if let Ok(opa) = value.trim().parse::<u8>() {
                    page_mut(&mut pages, current).bg_opacity = Some(opa);
                }
                i += 1;
                continue;
            }
        }

        if line.starts_with("it.") {
            if !covered {
                if let Some(widget) = procedure_widget(line, &mut counters, registry) {
                    page_mut(&mut pages, current).widgets.push(widget);
                }
            }
            i += 1;
            continue;
        }

        if line == "}" {
            covered = false;
        }
        i += 1;
    }

    if pages.is_empty() {
        pages.insert(0, Page::new("page_0", String::new()));
    }
    let mut layout = Layout {
        settings,
        ..Default::default()
    };
    for (order, (index, mut page)) in pages.into_iter().enumerate() {
        page.id = format!("page_{index}");
        if page.name.is_empty() {
            page.name = format!("Page {}", order + 1);
        }
        layout.pages.push(page);
    }
    layout
}
