use crate::color::Color;
use crate::shape::Shape;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Snapshot of every user-tunable knob.
///
/// Loaded leniently: a field holding a malformed value (bad hex color,
/// unknown shape name, wrong JSON type) keeps its default instead of failing
/// the whole load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master switch for the highlight overlay.
    pub active: bool,

    // Appearance
    pub shape: Shape,
    pub highlight_size: f32,
    pub border_width: f32,
    pub highlight_color: Color,
    /// Glow strength in [0, 1].
    pub glow_intensity: f32,

    /// Offset applied to the sampled cursor position so the highlight centers
    /// on the cursor's visual body rather than its hot-spot. Positive y moves
    /// the highlight down.
    pub cursor_offset_x: f32,
    pub cursor_offset_y: f32,

    // Cursor-type colors
    pub cursor_color_enabled: bool,
    pub hand_cursor_color: Color,
    pub text_cursor_color: Color,

    // Click animation
    pub click_animation_enabled: bool,
    pub click_border_width: f32,
    pub left_click_color: Color,
    pub right_click_color: Color,
    pub tilt_on_click: bool,

    // Auto-hide
    pub auto_hide_enabled: bool,
    /// Seconds of inactivity before the highlight fades out.
    pub auto_hide_delay: f32,

    /// Toggle hotkey combo, e.g. "Ctrl+Shift+H". `None` disables the hotkey.
    pub toggle_hotkey: Option<String>,

    /// When enabled the application initialises the logger at debug level.
    pub debug_logging: bool,
}

pub mod defaults {
    use crate::color::Color;
    use crate::shape::Shape;

    pub const SHAPE: Shape = Shape::Squircle;
    pub const HIGHLIGHT_SIZE: f32 = 105.0;
    pub const BORDER_WIDTH: f32 = 4.5;
    pub const HIGHLIGHT_COLOR: Color = Color::rgb(0x00, 0xff, 0xff);
    pub const GLOW_INTENSITY: f32 = 0.7;
    pub const CURSOR_OFFSET_X: f32 = 0.0;
    pub const CURSOR_OFFSET_Y: f32 = 4.0;
    pub const HAND_CURSOR_COLOR: Color = Color::rgb(0x39, 0xff, 0x14);
    pub const TEXT_CURSOR_COLOR: Color = Color::rgb(0xbf, 0x00, 0xff);
    pub const CLICK_BORDER_WIDTH: f32 = 3.5;
    pub const LEFT_CLICK_COLOR: Color = Color::rgb(0xff, 0xff, 0x00);
    pub const RIGHT_CLICK_COLOR: Color = Color::rgb(0xff, 0x07, 0x3a);
    pub const AUTO_HIDE_DELAY: f32 = 5.0;
    pub const TOGGLE_HOTKEY: &str = "Ctrl+Shift+H";
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            active: true,
            shape: defaults::SHAPE,
            highlight_size: defaults::HIGHLIGHT_SIZE,
            border_width: defaults::BORDER_WIDTH,
            highlight_color: defaults::HIGHLIGHT_COLOR,
            glow_intensity: defaults::GLOW_INTENSITY,
            cursor_offset_x: defaults::CURSOR_OFFSET_X,
            cursor_offset_y: defaults::CURSOR_OFFSET_Y,
            cursor_color_enabled: true,
            hand_cursor_color: defaults::HAND_CURSOR_COLOR,
            text_cursor_color: defaults::TEXT_CURSOR_COLOR,
            click_animation_enabled: true,
            click_border_width: defaults::CLICK_BORDER_WIDTH,
            left_click_color: defaults::LEFT_CLICK_COLOR,
            right_click_color: defaults::RIGHT_CLICK_COLOR,
            tilt_on_click: false,
            auto_hide_enabled: true,
            auto_hide_delay: defaults::AUTO_HIDE_DELAY,
            toggle_hotkey: Some(defaults::TOGGLE_HOTKEY.to_string()),
            debug_logging: false,
        }
    }
}

impl Settings {
    /// Load from `path`. Missing or unreadable files yield defaults; a
    /// readable file is applied field by field so one corrupt value cannot
    /// poison the rest.
    pub fn load(path: &Path) -> Self {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(value) => Self::from_value(value),
            Err(err) => {
                tracing::warn!(?err, path = %path.display(), "settings file unreadable; using defaults");
                Self::default()
            }
        }
    }

    fn from_value(value: serde_json::Value) -> Self {
        let mut settings = Self::default();
        let serde_json::Value::Object(map) = value else {
            return settings;
        };

        fn field<T: DeserializeOwned>(
            map: &serde_json::Map<String, serde_json::Value>,
            key: &str,
            slot: &mut T,
        ) {
            let Some(value) = map.get(key) else { return };
            match serde_json::from_value(value.clone()) {
                Ok(parsed) => *slot = parsed,
                Err(err) => tracing::warn!(key, ?err, "invalid settings value; keeping default"),
            }
        }

        field(&map, "active", &mut settings.active);
        field(&map, "shape", &mut settings.shape);
        field(&map, "highlight_size", &mut settings.highlight_size);
        field(&map, "border_width", &mut settings.border_width);
        field(&map, "highlight_color", &mut settings.highlight_color);
        field(&map, "glow_intensity", &mut settings.glow_intensity);
        field(&map, "cursor_offset_x", &mut settings.cursor_offset_x);
        field(&map, "cursor_offset_y", &mut settings.cursor_offset_y);
        field(&map, "cursor_color_enabled", &mut settings.cursor_color_enabled);
        field(&map, "hand_cursor_color", &mut settings.hand_cursor_color);
        field(&map, "text_cursor_color", &mut settings.text_cursor_color);
        field(
            &map,
            "click_animation_enabled",
            &mut settings.click_animation_enabled,
        );
        field(&map, "click_border_width", &mut settings.click_border_width);
        field(&map, "left_click_color", &mut settings.left_click_color);
        field(&map, "right_click_color", &mut settings.right_click_color);
        field(&map, "tilt_on_click", &mut settings.tilt_on_click);
        field(&map, "auto_hide_enabled", &mut settings.auto_hide_enabled);
        field(&map, "auto_hide_delay", &mut settings.auto_hide_delay);
        field(&map, "toggle_hotkey", &mut settings.toggle_hotkey);
        field(&map, "debug_logging", &mut settings.debug_logging);

        settings.sanitize();
        settings
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Clamp values to their documented ranges: size > 0, widths >= 0,
    /// glow in [0, 1], delay > 0.
    pub fn sanitize(&mut self) {
        if !self.highlight_size.is_finite() || self.highlight_size <= 0.0 {
            self.highlight_size = defaults::HIGHLIGHT_SIZE;
        }
        if !self.border_width.is_finite() || self.border_width < 0.0 {
            self.border_width = defaults::BORDER_WIDTH;
        }
        if !self.click_border_width.is_finite() || self.click_border_width < 0.0 {
            self.click_border_width = defaults::CLICK_BORDER_WIDTH;
        }
        if !self.glow_intensity.is_finite() {
            self.glow_intensity = defaults::GLOW_INTENSITY;
        }
        self.glow_intensity = self.glow_intensity.clamp(0.0, 1.0);
        if !self.auto_hide_delay.is_finite() || self.auto_hide_delay <= 0.0 {
            self.auto_hide_delay = defaults::AUTO_HIDE_DELAY;
        }
        if !self.cursor_offset_x.is_finite() {
            self.cursor_offset_x = defaults::CURSOR_OFFSET_X;
        }
        if !self.cursor_offset_y.is_finite() {
            self.cursor_offset_y = defaults::CURSOR_OFFSET_Y;
        }
    }

    pub fn restore_defaults(&mut self) {
        let active = self.active;
        *self = Self::default();
        self.active = active;
    }
}

/// Default location of the settings file.
pub fn resolve_settings_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("cursor_halo")
        .join(SETTINGS_FILE_NAME)
}

struct StoreInner {
    current: Mutex<Settings>,
    subscribers: Mutex<Vec<Sender<()>>>,
}

/// Explicitly owned, shareable settings object with an aggregate change
/// notification. Components hold clones and subscribe for "something
/// changed"; they re-read the snapshot on receipt.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<StoreInner>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                current: Mutex::new(settings),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn snapshot(&self) -> Settings {
        self.inner
            .current
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Mutate the settings and notify every subscriber.
    pub fn update<F: FnOnce(&mut Settings)>(&self, f: F) {
        if let Ok(mut guard) = self.inner.current.lock() {
            f(&mut guard);
            guard.sanitize();
        }
        self.notify();
    }

    /// Receiver that gets one message per change (aggregate, not per-field).
    pub fn subscribe(&self) -> Receiver<()> {
        let (tx, rx) = channel();
        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    fn notify(&self) {
        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.retain(|tx| tx.send(()).is_ok());
        }
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
