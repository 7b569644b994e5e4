use crate::color::Color;
use std::time::{Duration, Instant};

/// Quadratic ease-out over t in [0, 1].
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

pub const PRESS_DOWN: Duration = Duration::from_millis(80);
pub const PRESS_UP: Duration = Duration::from_millis(150);
pub const RIPPLE_DURATION: Duration = Duration::from_millis(350);
pub const FADE_OUT: Duration = Duration::from_millis(500);
pub const FADE_IN: Duration = Duration::from_millis(200);

const RIPPLE_SCALE_FROM: f32 = 0.7;
const RIPPLE_SCALE_TO: f32 = 2.0;
const RIPPLE_OPACITY_FROM: f32 = 0.8;
const PRESS_SCALE: f32 = 0.8;
const TILT_DEGREES: f32 = 15.0;

/// Rotation applied to the click ripple when tilt-on-click is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tilt {
    #[default]
    None,
    Left,
    Right,
}

impl Tilt {
    pub fn degrees(self) -> f32 {
        match self {
            Tilt::None => 0.0,
            Tilt::Left => -TILT_DEGREES,
            Tilt::Right => TILT_DEGREES,
        }
    }
}

/// Short scale pulse on the highlight layer when a click lands:
/// 1.0 -> 0.8 over 80 ms, then 0.8 -> 1.0 over 150 ms, both eased.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressPulse {
    started: Instant,
}

impl PressPulse {
    pub fn new(started: Instant) -> Self {
        Self { started }
    }

    pub fn scale_at(&self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed < PRESS_DOWN {
            let t = elapsed.as_secs_f32() / PRESS_DOWN.as_secs_f32();
            lerp(1.0, PRESS_SCALE, ease_out(t))
        } else if elapsed < PRESS_DOWN + PRESS_UP {
            let t = (elapsed - PRESS_DOWN).as_secs_f32() / PRESS_UP.as_secs_f32();
            lerp(PRESS_SCALE, 1.0, ease_out(t))
        } else {
            1.0
        }
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= PRESS_DOWN + PRESS_UP
    }
}

/// One sampled frame of the click ripple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleFrame {
    pub scale: f32,
    pub opacity: f32,
    pub rotation_degrees: f32,
    pub color: Color,
}

/// Expanding stroke-only copy of the highlight shape, triggered per click.
/// Non-reversing, auto-removed on completion; re-triggering replaces the
/// in-flight ripple rather than stacking a second one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    started: Instant,
    color: Color,
    tilt: Tilt,
}

impl Ripple {
    pub fn new(started: Instant, color: Color, tilt: Tilt) -> Self {
        Self {
            started,
            color,
            tilt,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// `None` once the 350 ms run has completed.
    pub fn frame_at(&self, now: Instant) -> Option<RippleFrame> {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= RIPPLE_DURATION {
            return None;
        }
        let t = ease_out(elapsed.as_secs_f32() / RIPPLE_DURATION.as_secs_f32());
        Some(RippleFrame {
            scale: lerp(RIPPLE_SCALE_FROM, RIPPLE_SCALE_TO, t),
            opacity: lerp(RIPPLE_OPACITY_FROM, 0.0, t),
            rotation_degrees: lerp(0.0, self.tilt.degrees(), t),
            color: self.color,
        })
    }
}

/// Opacity transition for the idle fade. Asymmetric on purpose: hiding is
/// slower and gentler (500 ms), reappearing is snappier (200 ms).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    from: f32,
    target: f32,
    started: Instant,
    duration: Duration,
}

impl Fade {
    pub fn shown(at: Instant) -> Self {
        Self {
            from: 1.0,
            target: 1.0,
            started: at,
            duration: Duration::ZERO,
        }
    }

    /// Retarget toward visible/hidden, starting from the currently sampled
    /// value so an interrupted fade continues smoothly. Unanimated
    /// transitions jump immediately.
    pub fn set_visible(&mut self, visible: bool, animated: bool, now: Instant) {
        let target = if visible { 1.0 } else { 0.0 };
        if (self.target - target).abs() < f32::EPSILON {
            return;
        }
        self.from = self.value_at(now);
        self.target = target;
        self.started = now;
        self.duration = if animated {
            if visible {
                FADE_IN
            } else {
                FADE_OUT
            }
        } else {
            Duration::ZERO
        };
    }

    pub fn value_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return self.target;
        }
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= self.duration {
            return self.target;
        }
        let t = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        lerp(self.from, self.target, t)
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        self.duration.is_zero()
            || now.saturating_duration_since(self.started) >= self.duration
    }
}
