//! Data models for layouts, pages, widgets and device settings.

mod layout;
mod settings;
mod value;
mod widget;

pub use layout::{Layout, Warning};
pub use settings::{
    canonical_setting, DeviceSettings, RenderMode, SETTING_ALIASES, SETTING_KEYS,
};
pub use value::{PropMap, PropValue};
pub use widget::{Page, Widget};
