use crate::classifier::CursorKind;
use crate::color::Color;
use crate::display::DisplayProvider;
use crate::input::ClickKind;
use crate::overlay::animation::Tilt;
use crate::overlay::surface::{OverlaySurface, SurfaceBackendFactory};
use crate::settings::{Settings, SettingsStore};
use std::sync::Arc;
use std::time::Instant;

/// Owns the per-display overlay surfaces: builds and tears down the set on
/// display-configuration changes, routes the cursor to the surface whose
/// display contains it, and fans out appearance, color-override, click and
/// visibility updates.
pub struct OverlayManager {
    settings: SettingsStore,
    displays: Arc<dyn DisplayProvider>,
    factory: Arc<dyn SurfaceBackendFactory>,
    surfaces: Vec<OverlaySurface>,
    active: Option<usize>,
    cursor_kind: CursorKind,
}

impl OverlayManager {
    pub fn new(
        settings: SettingsStore,
        displays: Arc<dyn DisplayProvider>,
        factory: Arc<dyn SurfaceBackendFactory>,
    ) -> Self {
        Self {
            settings,
            displays,
            factory,
            surfaces: Vec::new(),
            active: None,
            cursor_kind: CursorKind::Normal,
        }
    }

    /// Tear down every surface and build one per current display. Called at
    /// startup and on every display-configuration change. A display set that
    /// shrank (or emptied) mid-notification simply yields fewer surfaces.
    pub fn rebuild_surfaces(&mut self) {
        self.surfaces.clear();
        self.active = None;

        let settings = self.settings.snapshot();
        let rects = self.displays.displays();
        for rect in rects {
            self.surfaces
                .push(OverlaySurface::new(rect, self.factory.create(), &settings));
        }
        if let Some(color) = self.override_color(&settings) {
            for surface in &self.surfaces {
                surface.set_color(color);
            }
        }
        tracing::debug!(count = self.surfaces.len(), "rebuilt overlay surfaces");
    }

    pub fn surfaces(&self) -> &[OverlaySurface] {
        &self.surfaces
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Show or hide every surface without destroying them.
    pub fn set_visible(&mut self, visible: bool) {
        for surface in &self.surfaces {
            surface.set_visible(visible);
        }
    }

    /// Route the cursor to the surface containing `point`. Switching
    /// displays is a discrete handoff: the previous surface's layers drop to
    /// zero opacity, the new one's to full, with no cross-fade.
    pub fn on_cursor_moved(&mut self, point: (f64, f64)) {
        let settings = self.settings.snapshot();
        if !settings.active {
            return;
        }

        let target = self
            .surfaces
            .iter()
            .position(|surface| surface.display_rect().contains(point));
        let Some(index) = target else {
            // Transient gap between display-change notification and rebuild.
            return;
        };

        if self.active != Some(index) {
            if let Some(previous) = self.active.and_then(|i| self.surfaces.get(i)) {
                previous.set_active(false);
            }
            self.surfaces[index].set_active(true);
            self.active = Some(index);
        }

        let offset_point = (
            point.0 + settings.cursor_offset_x as f64,
            point.1 + settings.cursor_offset_y as f64,
        );
        let surface = &self.surfaces[index];
        let (x, y) = surface.display_rect().to_local(offset_point);
        surface.set_position(x, y);
    }

    /// Apply the color override for a cursor-type change. Normal resets to
    /// the configured highlight color.
    pub fn on_cursor_type_changed(&mut self, kind: CursorKind) {
        self.cursor_kind = kind;
        let settings = self.settings.snapshot();
        let effective = self
            .override_color(&settings)
            .unwrap_or(settings.highlight_color);
        for surface in &self.surfaces {
            surface.set_color(effective);
        }
    }

    /// Reapply shape/size/border/glow/offset everywhere, then reassert any
    /// cursor-type override. Ordering matters: the appearance refresh resets
    /// the stroke color to the configured default.
    pub fn on_appearance_settings_changed(&mut self) {
        let settings = self.settings.snapshot();
        for surface in &self.surfaces {
            surface.apply_appearance(&settings);
        }
        if let Some(color) = self.override_color(&settings) {
            for surface in &self.surfaces {
                surface.set_color(color);
            }
        }
    }

    /// Forward a click to the active surface only.
    pub fn on_click(&mut self, kind: ClickKind, now: Instant) {
        let settings = self.settings.snapshot();
        if !settings.active || !settings.click_animation_enabled {
            return;
        }
        let color = match kind {
            ClickKind::Left => settings.left_click_color,
            ClickKind::Right => settings.right_click_color,
        };
        let tilt = if settings.tilt_on_click {
            match kind {
                ClickKind::Left => Tilt::Left,
                ClickKind::Right => Tilt::Right,
            }
        } else {
            Tilt::None
        };
        if let Some(surface) = self.active.and_then(|i| self.surfaces.get(i)) {
            surface.trigger_click(color, tilt, now);
        }
    }

    /// Idle fade (animated) or instant show/hide of the highlight layer
    /// across all surfaces.
    pub fn set_highlight_visible(&mut self, visible: bool, animated: bool, now: Instant) {
        for surface in &self.surfaces {
            surface.set_highlight_visible(visible, animated, now);
        }
    }

    fn override_color(&self, settings: &Settings) -> Option<Color> {
        match self.cursor_kind {
            CursorKind::Normal => None,
            CursorKind::Hand => Some(settings.hand_cursor_color),
            CursorKind::Text => Some(settings.text_cursor_color),
        }
    }
}
