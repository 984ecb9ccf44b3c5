//! Per-page export context shared with plugins.

use crate::models::{DeviceSettings, Page};

/// What a plugin may know about the page it is rendering into.
pub struct ExportContext<'a> {
    pub settings: &'a DeviceSettings,
    pub page: &'a Page,
    /// Effective dark mode for this page (device + page override).
    pub dark: bool,
}

impl<'a> ExportContext<'a> {
    pub fn new(settings: &'a DeviceSettings, page: &'a Page) -> Self {
        let dark = page.dark(settings.dark_mode);
        ExportContext {
            settings,
            page,
            dark,
        }
    }

    /// Page background color name.
    pub fn background(&self) -> &str {
        if let Some(bg) = self.page.bg_color.as_deref() {
            return bg;
        }
        if self.dark {
            "black"
        } else {
            "white"
        }
    }

    /// Resolve `theme_auto` against the page theme; every other color
    /// name passes through.
    pub fn resolve_color<'c>(&self, color: &'c str) -> &'c str {
        if color == "theme_auto" {
            if self.dark {
                "white"
            } else {
                "black"
            }
        } else {
            color
        }
    }

    /// Color expression for drawing-procedure output. Named colors map
    /// to the device color constants, hex colors to an inline
    /// constructor, anything else falls back to black.
    pub fn color_const(&self, color: &str) -> String {
        let resolved = self.resolve_color(color);
        match resolved {
            "black" => "COLOR_BLACK".to_string(),
            "white" => "COLOR_WHITE".to_string(),
            "red" => "COLOR_RED".to_string(),
            "yellow" => "COLOR_YELLOW".to_string(),
            "blue" => "COLOR_BLUE".to_string(),
            "green" => "COLOR_GREEN".to_string(),
            "gray" | "grey" => "COLOR_GRAY".to_string(),
            "transparent" => "COLOR_OFF".to_string(),
            hex if hex.starts_with('#') && hex.len() == 7 => {
                let r = u8::from_str_radix(&hex[1..3], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[3..5], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[5..7], 16).unwrap_or(0);
                format!("Color(0x{r:02X}, 0x{g:02X}, 0x{b:02X})")
            }
            _ => "COLOR_BLACK".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_parts(dark: bool) -> (DeviceSettings, Page) {
        let settings = DeviceSettings {
            dark_mode: dark,
            ..Default::default()
        };
        (settings, Page::default())
    }

    #[test]
    fn test_theme_auto_resolution() {
        let (settings, page) = ctx_parts(true);
        let ctx = ExportContext::new(&settings, &page);
        assert_eq!(ctx.resolve_color("theme_auto"), "white");
        assert_eq!(ctx.resolve_color("red"), "red");
        assert_eq!(ctx.background(), "black");
    }

    #[test]
    fn test_page_override_wins() {
        let (settings, mut page) = ctx_parts(false);
        page.dark_mode = "on".to_string();
        let ctx = ExportContext::new(&settings, &page);
        assert!(ctx.dark);
        assert_eq!(ctx.resolve_color("theme_auto"), "white");
    }

    #[test]
    fn test_color_const() {
        let (settings, page) = ctx_parts(false);
        let ctx = ExportContext::new(&settings, &page);
        assert_eq!(ctx.color_const("theme_auto"), "COLOR_BLACK");
        assert_eq!(ctx.color_const("#FF8000"), "Color(0xFF, 0x80, 0x00)");
        assert_eq!(ctx.color_const("chartreuse"), "COLOR_BLACK");
    }
}
