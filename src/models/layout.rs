//! Top-level layout document.

use serde::{Deserialize, Serialize};

use super::settings::DeviceSettings;
use super::widget::Page;

/// A complete device layout: pages plus device settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Layout {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default, alias = "currentPageIndex")]
    pub current_page_index: usize,
    #[serde(default)]
    pub settings: DeviceSettings,
    #[serde(default, alias = "deviceId", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

impl Layout {
    /// The page exports target; clamps a stale index.
    pub fn current_page(&self) -> Option<&Page> {
        if self.pages.is_empty() {
            return None;
        }
        let idx = self.current_page_index.min(self.pages.len() - 1);
        self.pages.get(idx)
    }

    pub fn widget_count(&self) -> usize {
        self.pages.iter().map(|p| p.widgets.len()).sum()
    }
}

/// A warning raised during import or export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    pub message: String,
    pub line: usize,
}

impl Warning {
    pub fn new(message: impl Into<String>, line: usize) -> Self {
        Warning {
            message: message.into(),
            line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Widget;

    #[test]
    fn test_layout_roundtrip() {
        let mut layout = Layout::default();
        let mut page = Page::new("page_0", "Main");
        page.widgets.push(Widget::new("w1", "text"));
        layout.pages.push(page);
        let json = serde_json::to_string(&layout).unwrap();
        let parsed: Layout = serde_json::from_str(&json).unwrap();
        assert_eq!(layout, parsed);
    }

    #[test]
    fn test_current_page_clamps() {
        let mut layout = Layout::default();
        layout.pages.push(Page::new("page_0", "Only"));
        layout.current_page_index = 7;
        assert_eq!(layout.current_page().unwrap().id, "page_0");
        assert!(Layout::default().current_page().is_none());
    }
}
