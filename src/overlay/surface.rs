use crate::color::Color;
use crate::display::DisplayRect;
use crate::overlay::animation::{Fade, PressPulse, Ripple, Tilt};
use crate::settings::Settings;
use crate::shape::{path_for, Path, Rect};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Visual parameters of the highlight layer, derived purely from settings.
///
/// The two glows follow the *stroked* outline, not the filled shape, so the
/// glow reads as a line rather than a blob; backends must stroke, never fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightStyle {
    pub color: Color,
    pub line_width: f32,
    /// Inner border: inset by `line_width + 1.5`, slightly wider and
    /// translucent, drawn blurred for depth.
    pub inner_line_width: f32,
    pub inner_alpha: f32,
    pub inner_blur_radius: f32,
    /// Tight, bright glow around the stroke.
    pub inner_glow_radius: f32,
    pub inner_glow_opacity: f32,
    /// Wide, diffuse glow at 2.5x the tight radius, half the opacity factor.
    pub outer_glow_radius: f32,
    pub outer_glow_opacity: f32,
    pub click_line_width: f32,
}

impl HighlightStyle {
    pub fn from_settings(settings: &Settings) -> Self {
        let glow = settings.glow_intensity;
        Self {
            color: settings.highlight_color,
            line_width: settings.border_width,
            inner_line_width: settings.border_width * 1.2,
            inner_alpha: 0.35,
            inner_blur_radius: 2.5,
            inner_glow_radius: 8.0 * glow,
            inner_glow_opacity: (glow * 1.2).min(1.0),
            outer_glow_radius: 20.0 * glow,
            outer_glow_opacity: glow * 0.6,
            click_line_width: settings.click_border_width,
        }
    }
}

/// Everything a backend needs to paint one frame of one surface.
#[derive(Debug, Clone)]
pub struct SurfaceState {
    /// Master switch; a hidden surface paints nothing.
    pub visible: bool,
    /// Whether this surface currently owns the highlight.
    pub active: bool,
    /// Highlight center in display-local coordinates.
    pub position: (f32, f32),
    pub style: HighlightStyle,
    /// Outline paths centered on the origin; backends translate to
    /// `position`.
    pub outline: Path,
    pub inner_outline: Path,
    pub click_outline: Path,
    pub fade: Fade,
    pub press: Option<PressPulse>,
    pub ripple: Option<Ripple>,
}

impl SurfaceState {
    fn new(rect: DisplayRect, settings: &Settings) -> Self {
        let mut state = Self {
            visible: settings.active,
            active: false,
            position: (rect.width as f32 / 2.0, rect.height as f32 / 2.0),
            style: HighlightStyle::from_settings(settings),
            outline: Path::default(),
            inner_outline: Path::default(),
            click_outline: Path::default(),
            fade: Fade::shown(Instant::now()),
            press: None,
            ripple: None,
        };
        state.recompute_geometry(settings);
        state
    }

    /// Rebuild the outline paths and style from settings. Resets the stroke
    /// color to the configured default; any cursor-type override must be
    /// reapplied afterwards.
    fn recompute_geometry(&mut self, settings: &Settings) {
        let shape_rect = Rect::centered_square(settings.highlight_size);
        self.style = HighlightStyle::from_settings(settings);
        self.outline = path_for(settings.shape, shape_rect);
        self.inner_outline = path_for(
            settings.shape,
            shape_rect.inset(settings.border_width + 1.5),
        );
        self.click_outline = path_for(settings.shape, shape_rect);
    }

    /// Whether an animation is in flight, i.e. repaints are needed even
    /// without a new version.
    pub fn is_animating(&self, now: Instant) -> bool {
        self.ripple.map_or(false, |r| r.frame_at(now).is_some())
            || self.press.map_or(false, |p| !p.is_finished(now))
            || !self.fade.is_settled(now)
    }
}

/// Mutex-guarded surface state with a version counter, shared between the
/// owning loop (writer) and the backend's paint thread (reader).
pub struct SurfaceBuffer {
    state: Mutex<SurfaceState>,
    version: AtomicU64,
}

impl SurfaceBuffer {
    fn new(state: SurfaceState) -> Self {
        Self {
            state: Mutex::new(state),
            version: AtomicU64::new(0),
        }
    }

    pub fn update<F: FnOnce(&mut SurfaceState)>(&self, f: F) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
            self.version.fetch_add(1, Ordering::Release);
        }
    }

    pub fn snapshot(&self) -> Option<SurfaceState> {
        self.state.lock().ok().map(|state| state.clone())
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

/// Platform presentation for one surface: an always-on-top, input-transparent,
/// borderless render target covering one display.
pub trait SurfaceBackend: Send {
    fn open(&mut self, rect: DisplayRect, buffer: Arc<SurfaceBuffer>) -> anyhow::Result<()>;
    fn close(&mut self);
}

pub trait SurfaceBackendFactory: Send + Sync {
    fn create(&self) -> Box<dyn SurfaceBackend>;
}

/// Backend that presents nothing. Serves tests and platforms without an
/// overlay implementation.
#[derive(Debug, Default)]
pub struct NoopSurfaceBackend;

impl SurfaceBackend for NoopSurfaceBackend {
    fn open(&mut self, _rect: DisplayRect, _buffer: Arc<SurfaceBuffer>) -> anyhow::Result<()> {
        Ok(())
    }

    fn close(&mut self) {}
}

#[derive(Debug, Default)]
pub struct NoopBackendFactory;

impl SurfaceBackendFactory for NoopBackendFactory {
    fn create(&self) -> Box<dyn SurfaceBackend> {
        Box::new(NoopSurfaceBackend)
    }
}

/// Counts opens and closes across every backend it hands out; used to assert
/// surface lifecycle in tests.
#[derive(Default)]
pub struct RecordingBackendFactory {
    counters: Arc<RecordingCounters>,
}

#[derive(Default)]
pub struct RecordingCounters {
    opens: AtomicUsize,
    closes: AtomicUsize,
}

impl RecordingBackendFactory {
    pub fn counters(&self) -> Arc<RecordingCounters> {
        Arc::clone(&self.counters)
    }
}

impl RecordingCounters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl SurfaceBackendFactory for RecordingBackendFactory {
    fn create(&self) -> Box<dyn SurfaceBackend> {
        Box::new(RecordingSurfaceBackend {
            counters: Arc::clone(&self.counters),
            open: false,
        })
    }
}

struct RecordingSurfaceBackend {
    counters: Arc<RecordingCounters>,
    open: bool,
}

impl SurfaceBackend for RecordingSurfaceBackend {
    fn open(&mut self, _rect: DisplayRect, _buffer: Arc<SurfaceBuffer>) -> anyhow::Result<()> {
        self.open = true;
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// One overlay surface bound to a single display: a highlight layer and a
/// transient click-ripple layer presented by a platform backend.
pub struct OverlaySurface {
    rect: DisplayRect,
    buffer: Arc<SurfaceBuffer>,
    backend: Box<dyn SurfaceBackend>,
}

impl OverlaySurface {
    pub fn new(
        rect: DisplayRect,
        mut backend: Box<dyn SurfaceBackend>,
        settings: &Settings,
    ) -> Self {
        let buffer = Arc::new(SurfaceBuffer::new(SurfaceState::new(rect, settings)));
        if let Err(err) = backend.open(rect, Arc::clone(&buffer)) {
            tracing::error!(?err, ?rect, "failed to open overlay surface");
        }
        Self {
            rect,
            buffer,
            backend,
        }
    }

    pub fn display_rect(&self) -> DisplayRect {
        self.rect
    }

    pub fn snapshot(&self) -> SurfaceState {
        self.buffer
            .snapshot()
            .unwrap_or_else(|| SurfaceState::new(self.rect, &Settings::default()))
    }

    /// Discrete activation switch when the cursor crosses display
    /// boundaries; instant by design, unlike the idle fade.
    pub fn set_active(&self, active: bool) {
        self.buffer.update(|state| state.active = active);
    }

    pub fn set_position(&self, x: f32, y: f32) {
        self.buffer.update(|state| state.position = (x, y));
    }

    /// Full appearance refresh. Resets the effective color to the configured
    /// highlight color; the manager reapplies any cursor-type override.
    pub fn apply_appearance(&self, settings: &Settings) {
        self.buffer.update(|state| {
            state.visible = settings.active;
            state.recompute_geometry(settings);
        });
    }

    /// Color-only update: no geometry recompute, no animation.
    pub fn set_color(&self, color: Color) {
        self.buffer.update(|state| state.style.color = color);
    }

    /// Click feedback: ripple plus press pulse. Replaces any in-flight
    /// animation instead of stacking.
    pub fn trigger_click(&self, color: Color, tilt: Tilt, now: Instant) {
        self.buffer.update(|state| {
            state.ripple = Some(Ripple::new(now, color, tilt));
            state.press = Some(PressPulse::new(now));
        });
    }

    /// Idle fade (animated) or instantaneous show/hide (unanimated).
    pub fn set_highlight_visible(&self, visible: bool, animated: bool, now: Instant) {
        self.buffer
            .update(|state| state.fade.set_visible(visible, animated, now));
    }

    /// Master toggle: hides or shows without destroying the surface.
    pub fn set_visible(&self, visible: bool) {
        self.buffer.update(|state| state.visible = visible);
    }
}

impl Drop for OverlaySurface {
    fn drop(&mut self) {
        self.backend.close();
    }
}
