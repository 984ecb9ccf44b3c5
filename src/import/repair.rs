//! Lenient JSON parsing for pasted documents.
//!
//! Hand-edited payloads commonly arrive with trailing commas, comments
//! or a missing closing bracket from a partial copy. Strict JSON is
//! tried first, then json5, then a bracket-balancing repair pass.

use crate::models::Warning;

/// Parse with increasing leniency; warnings record which fallback ran.
pub fn parse_json_lenient(
    text: &str,
    warnings: &mut Vec<Warning>,
) -> Result<serde_json::Value, String> {
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    if let Ok(value) = json5::from_str(text) {
        warnings.push(Warning::new("document required json5 parsing", 0));
        return Ok(value);
    }
    let repaired = repair_json(text);
    match json5::from_str(&repaired) {
        Ok(value) => {
            warnings.push(Warning::new("document was repaired before parsing", 0));
            Ok(value)
        }
        Err(err) => Err(format!("unparseable document: {err}")),
    }
}

/// Close unterminated strings, strip trailing commas and append
/// missing closing brackets.
pub fn repair_json(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' => {
                stack.push('}');
                out.push(c);
            }
            '[' => {
                stack.push(']');
                out.push(c);
            }
            '}' | ']' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    if in_string {
        out.push('"');
    }
    // Trailing comma before the closers we are about to add.
    let trimmed_len = out.trim_end().len();
    if out[..trimmed_len].ends_with(',') {
        out.truncate(trimmed_len - 1);
    }
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}

/// Convert a YAML value into JSON for uniform downstream handling.
/// Non-string mapping keys are stringified; tags are unwrapped.
pub fn yaml_to_json(value: serde_yaml::Value) -> serde_json::Value {
    match value {
        serde_yaml::Value::Null => serde_json::Value::Null,
        serde_yaml::Value::Bool(b) => serde_json::Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::from(i)
            } else {
                serde_json::Value::from(n.as_f64().unwrap_or(0.0))
            }
        }
        serde_yaml::Value::String(s) => serde_json::Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            serde_json::Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut out = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s,
                    other => yaml_to_json(other).to_string(),
                };
                out.insert(key, yaml_to_json(v));
            }
            serde_json::Value::Object(out)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_json_passes_through() {
        let mut warnings = Vec::new();
        let v = parse_json_lenient(r#"{"a": 1}"#, &mut warnings).unwrap();
        assert_eq!(v["a"], 1);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_json5_fallback() {
        let mut warnings = Vec::new();
        let v = parse_json_lenient("{a: 1, /* note */ b: 2,}", &mut warnings).unwrap();
        assert_eq!(v["b"], 2);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_repair_unclosed_brackets() {
        let mut warnings = Vec::new();
        let v = parse_json_lenient(
            r#"[{"type": "text", "value": "hi"#,
            &mut warnings,
        )
        .unwrap();
        assert_eq!(v[0]["value"], "hi");
        assert!(!warnings.is_empty());
    }

    #[test]
    fn test_repair_ignores_brackets_in_strings() {
        let repaired = repair_json(r#"{"a": "[{"}"#);
        assert_eq!(repaired, r#"{"a": "[{"}"#);
    }

    #[test]
    fn test_repair_trailing_comma() {
        let repaired = repair_json("[1, 2,");
        assert_eq!(repaired, "[1, 2]");
    }

    #[test]
    fn test_yaml_to_json_nested() {
        let y: serde_yaml::Value = serde_yaml::from_str("a:\n  - 1\n  - two\n").unwrap();
        let j = yaml_to_json(y);
        assert_eq!(j["a"][1], "two");
    }

    #[test]
    fn test_hopeless_input_errors() {
        let mut warnings = Vec::new();
        assert!(parse_json_lenient("not even close {{{", &mut warnings).is_err());
    }
}
