pub mod classifier;
pub mod color;
pub mod display;
pub mod hotkey;
pub mod idle;
pub mod input;
pub mod logging;
pub mod overlay;
pub mod service;
pub mod settings;
pub mod shape;

pub use service::HighlightService;
pub use settings::{Settings, SettingsStore};
