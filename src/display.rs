use std::sync::mpsc::Sender;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::thread::JoinHandle;
use std::time::Duration;

/// One connected display's rectangle in global screen coordinates
/// (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DisplayRect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: (f64, f64)) -> bool {
        point.0 >= self.x as f64
            && point.0 < (self.x + self.width) as f64
            && point.1 >= self.y as f64
            && point.1 < (self.y + self.height) as f64
    }

    /// Global point converted to this display's local coordinate space.
    pub fn to_local(&self, point: (f64, f64)) -> (f32, f32) {
        ((point.0 - self.x as f64) as f32, (point.1 - self.y as f64) as f32)
    }
}

/// Synchronous query for the current display set.
pub trait DisplayProvider: Send + Sync {
    fn displays(&self) -> Vec<DisplayRect>;
}

/// Platform display enumeration.
#[derive(Debug, Default)]
pub struct SystemDisplayProvider;

impl DisplayProvider for SystemDisplayProvider {
    #[cfg(windows)]
    fn displays(&self) -> Vec<DisplayRect> {
        enumerate_monitors()
    }

    #[cfg(not(windows))]
    fn displays(&self) -> Vec<DisplayRect> {
        Vec::new()
    }
}

#[cfg(windows)]
fn enumerate_monitors() -> Vec<DisplayRect> {
    use std::mem;
    use windows::Win32::Foundation::{BOOL, LPARAM, RECT};
    use windows::Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW,
    };

    unsafe extern "system" fn monitor_enum_proc(
        monitor: HMONITOR,
        _hdc: HDC,
        _rc_clip: *mut RECT,
        data: LPARAM,
    ) -> BOOL {
        let monitors = &mut *(data.0 as *mut Vec<DisplayRect>);
        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = mem::size_of::<MONITORINFOEXW>() as u32;
        if GetMonitorInfoW(monitor, &mut info as *mut _ as *mut _).as_bool() {
            let rc = info.monitorInfo.rcMonitor;
            monitors.push(DisplayRect {
                x: rc.left,
                y: rc.top,
                width: rc.right - rc.left,
                height: rc.bottom - rc.top,
            });
        }
        BOOL(1)
    }

    let mut monitors = Vec::new();
    unsafe {
        let _ = EnumDisplayMonitors(
            HDC::default(),
            None,
            Some(monitor_enum_proc),
            LPARAM(&mut monitors as *mut Vec<DisplayRect> as isize),
        );
    }
    monitors
}

/// Scriptable provider for tests: the returned set can be swapped at runtime
/// to simulate connect/disconnect.
#[derive(Default)]
pub struct MockDisplayProvider {
    displays: Mutex<Vec<DisplayRect>>,
}

impl MockDisplayProvider {
    pub fn new(displays: Vec<DisplayRect>) -> Self {
        Self {
            displays: Mutex::new(displays),
        }
    }

    pub fn set_displays(&self, displays: Vec<DisplayRect>) {
        if let Ok(mut guard) = self.displays.lock() {
            *guard = displays;
        }
    }
}

impl DisplayProvider for MockDisplayProvider {
    fn displays(&self) -> Vec<DisplayRect> {
        self.displays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

const WATCH_INTERVAL: Duration = Duration::from_secs(2);

/// Emits a payload-less notification whenever the display set changes,
/// by polling the provider and comparing against the last seen set.
pub struct DisplayWatcher {
    running: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl DisplayWatcher {
    pub fn spawn(provider: Arc<dyn DisplayProvider>, changed_tx: Sender<()>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let join = std::thread::Builder::new()
            .name("display-watcher".to_string())
            .spawn(move || {
                let mut last = provider.displays();
                'outer: while flag.load(Ordering::Acquire) {
                    // Sleep in short slices so stop() joins promptly.
                    let slices = WATCH_INTERVAL.as_millis() as u64 / 100;
                    for _ in 0..slices {
                        std::thread::sleep(Duration::from_millis(100));
                        if !flag.load(Ordering::Acquire) {
                            break 'outer;
                        }
                    }
                    let current = provider.displays();
                    if current != last {
                        tracing::info!(count = current.len(), "display configuration changed");
                        last = current;
                        if changed_tx.send(()).is_err() {
                            break;
                        }
                    }
                }
            })
            .ok();
        Self { running, join }
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for DisplayWatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_displays_claim_disjoint_points() {
        let a = DisplayRect::new(0, 0, 1000, 800);
        let b = DisplayRect::new(1000, 0, 1000, 800);
        assert!(a.contains((500.0, 400.0)) && !b.contains((500.0, 400.0)));
        assert!(b.contains((1500.0, 400.0)) && !a.contains((1500.0, 400.0)));
        assert!(!a.contains((2500.0, 400.0)) && !b.contains((2500.0, 400.0)));
        // The shared boundary pixel belongs to the right-hand display.
        assert!(!a.contains((1000.0, 0.0)) && b.contains((1000.0, 0.0)));
    }

    #[test]
    fn local_conversion_subtracts_the_display_origin() {
        let rect = DisplayRect::new(1000, 0, 1000, 800);
        assert_eq!(rect.to_local((1500.0, 400.0)), (500.0, 400.0));
    }

    #[test]
    fn negative_origin_displays_contain_their_points() {
        let rect = DisplayRect::new(-1920, 0, 1920, 1080);
        assert!(rect.contains((-10.0, 100.0)));
        assert!(!rect.contains((0.0, 100.0)));
    }
}
