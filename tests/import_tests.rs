//! Importer and loader behavior on realistic pasted documents.

use paneldraft::export::{self, Dialect, ExportSession};
use paneldraft::import;
use paneldraft::loader;
use paneldraft::models::Layout;
use paneldraft::plugins::PluginRegistry;

fn parse(text: &str) -> import::ImportResult {
    import::parse_layout(text, PluginRegistry::shared()).unwrap()
}

#[test]
fn test_mixed_document_end_to_end() {
    let text = "\
// TARGET DEVICE:
//   Name: Workshop
//   Resolution: 800x480
//   Power Strategy: deep sleep every 1800s

if (id(display_page) == 0) {
  // page:name \"Status\"
  it.fill(COLOR_WHITE);

  // widget:sensor_text id:humidity x:20 y:30 w:150 h:70 entity:sensor.humidity unit:%
  it.printf(20, 65, id(font_roboto_400_20), COLOR_BLACK, TextAlign::TOP_LEFT, \"%.0f%%\", id(humidity_s).state);

  it.rectangle(10, 10, 300, 200, COLOR_BLACK);
}
";
    let result = parse(text);
    let layout = &result.layout;
    assert_eq!(layout.settings.device_name.as_deref(), Some("Workshop"));
    assert!(layout.settings.deep_sleep_enabled);
    assert_eq!(layout.settings.deep_sleep_interval, 1800);

    let page = &layout.pages[0];
    assert_eq!(page.name, "Status");
    assert_eq!(page.widgets.len(), 2);
    assert_eq!(page.widgets[0].id, "humidity");
    assert_eq!(page.widgets[0].entity_id, "sensor.humidity");
    // The bare rectangle had no marker and is recovered with a
    // generated id.
    assert_eq!(page.widgets[1].id, "w_rect_1");
    assert_eq!(page.widgets[1].kind, "shape_rect");
}

#[test]
fn test_unknown_marker_kind_is_preserved() {
    let result = parse("// widget:weather_panel id:wx x:0 y:0 w:200 h:120 mode:hourly\n");
    let w = &result.layout.pages[0].widgets[0];
    assert_eq!(w.kind, "weather_panel");
    assert_eq!(w.prop_str("mode", ""), "hourly");

    // Exporting it to a payload dialect warns but does not fail.
    let registry = PluginRegistry::shared();
    let mut session = ExportSession::new(registry);
    let text = export::generate(&result.layout, Dialect::JsonPayload, &mut session).unwrap();
    assert!(session.warnings.iter().any(|w| w.message.contains("weather_panel")));
    assert!(text.contains("drawcustom"));
}

#[test]
fn test_template_text_reclassified_as_sensor() {
    let result = parse(
        r#"[{"type": "text", "value": "Temp: {{ states('sensor.outdoor') }} C", "x": 5, "y": 5}]"#,
    );
    let w = &result.layout.pages[0].widgets[0];
    assert_eq!(w.kind, "sensor_text");
    assert_eq!(w.entity_id, "sensor.outdoor");
    assert_eq!(w.prop_str("prefix", ""), "Temp: ");
    assert_eq!(w.prop_str("postfix", ""), " C");
}

#[test]
fn test_truncated_json_still_imports() {
    // Paste cut off mid-document: closers are missing.
    let text = r#"{"service": "open_epaper_link.drawcustom", "data": {"payload": [
        {"type": "text", "value": "Hi", "x": 1, "y": 2}"#;
    let result = parse(text);
    assert_eq!(result.layout.widget_count(), 1);
    assert!(!result.warnings.is_empty());
}

#[test]
fn test_import_is_deterministic() {
    let text = "\
  - id: page_0
  - label:
      x: 10
      y: 10
      text: Hello
  - arc:
      x: 100
      y: 10
      width: 80
      height: 80
";
    let a = parse(text).layout;
    let b = parse(text).layout;
    assert_eq!(a, b);
}

#[test]
fn test_item_failure_does_not_poison_siblings() {
    let text = r#"[
        {"type": "text", "value": "keep me", "x": 1, "y": 2},
        "not an item",
        {"type": "line", "x_start": 0, "y_start": 0, "x_end": 50, "y_end": 0}
    ]"#;
    let result = parse(text);
    assert_eq!(result.layout.widget_count(), 2);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.message.contains("not an object")));
}

#[test]
fn test_loader_reads_file_and_camel_case() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(
        &path,
        r#"{
            "settings": {"darkMode": true, "resWidth": 296, "resHeight": 128},
            "pages": [{"id": "page_0", "name": "Main", "widgets": []}]
        }"#,
    )
    .unwrap();
    let result = loader::load_model_file(&path, PluginRegistry::shared()).unwrap();
    assert!(result.layout.settings.dark_mode);
    assert_eq!(result.layout.settings.width, 296);
}

#[test]
fn test_loader_spellings_agree() {
    let registry = PluginRegistry::shared();
    let camel = loader::load_model(
        r#"{"settings": {"darkMode": true, "refreshInterval": 900}, "pages": []}"#,
        registry,
    )
    .unwrap();
    let snake = loader::load_model(
        r#"{"settings": {"dark_mode": true, "refresh_interval": 900}, "pages": []}"#,
        registry,
    )
    .unwrap();
    assert_eq!(camel.layout.settings, snake.layout.settings);
}

#[test]
fn test_loaded_model_exports_all_dialects() {
    let registry = PluginRegistry::shared();
    let result = loader::load_model(
        r#"{
            "settings": {"width": 400, "height": 300},
            "pages": [{"id": "page_0", "name": "Main", "widgets": [
                {"id": "t1", "type": "text", "x": 10, "y": 10, "width": 100, "height": 30,
                 "props": {"text": "Hello"}}
            ]}]
        }"#,
        registry,
    )
    .unwrap();
    for dialect in Dialect::ALL {
        let mut session = ExportSession::new(registry);
        let text = export::generate(&result.layout, dialect, &mut session).unwrap();
        assert!(!text.is_empty(), "{dialect} produced no output");
    }
}

#[test]
fn test_imported_layout_serializes_to_model_json() {
    let result = parse("// widget:text id:t1 x:0 y:0 w:100 h:30 text:Hi\n");
    let json = serde_json::to_string(&result.layout).unwrap();
    let back: Layout = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result.layout);
}
