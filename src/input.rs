use anyhow::anyhow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

/// Mouse button for click events. Only presses are reported, never releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Left,
    Right,
}

/// Events produced by the pointer samplers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Global cursor coordinate, emitted on every move or drag.
    Moved { x: f64, y: f64 },
    /// Button-down of the left or right mouse button.
    Pressed(ClickKind),
}

/// System-wide pointer hook. One hook observes both movement and button
/// presses for every process, this one included, so consumers must tolerate
/// duplicate delivery of logically-identical events.
pub trait PointerHookBackend: Send {
    fn install(&mut self, sender: Sender<PointerEvent>) -> anyhow::Result<()>;
    fn uninstall(&mut self) -> anyhow::Result<()>;
    fn is_installed(&self) -> bool;
}

/// Source for the cursor's current global position, used to emit the
/// synthetic initial event so the overlay appears in the right place before
/// the first move arrives.
pub trait CursorPositionProvider: Send + Sync {
    fn cursor_position(&self) -> Option<(f64, f64)>;
}

#[derive(Debug, Default)]
pub struct SystemCursorPositionProvider;

impl CursorPositionProvider for SystemCursorPositionProvider {
    #[cfg(windows)]
    fn cursor_position(&self) -> Option<(f64, f64)> {
        use windows::Win32::Foundation::POINT;
        use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

        let mut point = POINT::default();
        if unsafe { GetCursorPos(&mut point) }.is_ok() {
            Some((point.x as f64, point.y as f64))
        } else {
            None
        }
    }

    #[cfg(not(windows))]
    fn cursor_position(&self) -> Option<(f64, f64)> {
        None
    }
}

#[cfg(windows)]
pub use platform::DefaultPointerBackend;

#[cfg(windows)]
mod platform {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::thread;
    use std::time::Duration;

    /// `rdev`-based global listener. The OS listener cannot be torn down once
    /// started, so `uninstall` gates delivery instead and a later `install`
    /// re-arms the same thread.
    pub struct DefaultPointerBackend {
        enabled: Arc<AtomicBool>,
        sender: Arc<Mutex<Option<Sender<PointerEvent>>>>,
        listener_spawned: bool,
    }

    impl Default for DefaultPointerBackend {
        fn default() -> Self {
            Self {
                enabled: Arc::new(AtomicBool::new(false)),
                sender: Arc::new(Mutex::new(None)),
                listener_spawned: false,
            }
        }
    }

    impl DefaultPointerBackend {
        fn spawn_listener(&mut self) {
            if self.listener_spawned {
                return;
            }
            self.listener_spawned = true;
            let enabled = Arc::clone(&self.enabled);
            let sender = Arc::clone(&self.sender);
            thread::spawn(move || loop {
                let enabled = Arc::clone(&enabled);
                let sender = Arc::clone(&sender);
                let result = rdev::listen(move |event| {
                    if !enabled.load(Ordering::Acquire) {
                        return;
                    }
                    let mapped = match event.event_type {
                        rdev::EventType::MouseMove { x, y } => Some(PointerEvent::Moved { x, y }),
                        rdev::EventType::ButtonPress(rdev::Button::Left) => {
                            Some(PointerEvent::Pressed(ClickKind::Left))
                        }
                        rdev::EventType::ButtonPress(rdev::Button::Right) => {
                            Some(PointerEvent::Pressed(ClickKind::Right))
                        }
                        _ => None,
                    };
                    if let Some(event) = mapped {
                        if let Ok(guard) = sender.lock() {
                            if let Some(tx) = guard.as_ref() {
                                let _ = tx.send(event);
                            }
                        }
                    }
                });
                match result {
                    Ok(()) => {
                        tracing::warn!("pointer listener exited unexpectedly; restarting shortly")
                    }
                    Err(err) => {
                        tracing::warn!(?err, "pointer listener failed; retrying shortly")
                    }
                }
                thread::sleep(Duration::from_millis(500));
            });
        }
    }

    impl PointerHookBackend for DefaultPointerBackend {
        fn install(&mut self, sender: Sender<PointerEvent>) -> anyhow::Result<()> {
            if let Ok(mut guard) = self.sender.lock() {
                *guard = Some(sender);
            }
            self.enabled.store(true, Ordering::Release);
            self.spawn_listener();
            Ok(())
        }

        fn uninstall(&mut self) -> anyhow::Result<()> {
            self.enabled.store(false, Ordering::Release);
            if let Ok(mut guard) = self.sender.lock() {
                *guard = None;
            }
            Ok(())
        }

        fn is_installed(&self) -> bool {
            self.enabled.load(Ordering::Acquire)
        }
    }
}

#[cfg(not(windows))]
#[derive(Default)]
pub struct DefaultPointerBackend;

#[cfg(not(windows))]
impl PointerHookBackend for DefaultPointerBackend {
    fn install(&mut self, _sender: Sender<PointerEvent>) -> anyhow::Result<()> {
        Err(anyhow!("global pointer hooks are not supported on this platform"))
    }

    fn uninstall(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn is_installed(&self) -> bool {
        false
    }
}

/// Scriptable backend for tests. `install` stores the sender; the paired
/// handle injects events and counts installs/uninstalls.
#[derive(Clone)]
pub struct MockPointerBackend {
    state: Arc<MockPointerState>,
}

#[derive(Default)]
struct MockPointerState {
    install_count: AtomicUsize,
    uninstall_count: AtomicUsize,
    sender: Mutex<Option<Sender<PointerEvent>>>,
}

impl MockPointerBackend {
    pub fn new() -> (Self, MockPointerHandle) {
        let state = Arc::new(MockPointerState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            MockPointerHandle { state },
        )
    }
}

impl PointerHookBackend for MockPointerBackend {
    fn install(&mut self, sender: Sender<PointerEvent>) -> anyhow::Result<()> {
        let mut guard = self.state.sender.lock().map_err(|_| anyhow!("lock"))?;
        if guard.is_none() {
            self.state.install_count.fetch_add(1, Ordering::SeqCst);
            *guard = Some(sender);
        }
        Ok(())
    }

    fn uninstall(&mut self) -> anyhow::Result<()> {
        let mut guard = self.state.sender.lock().map_err(|_| anyhow!("lock"))?;
        if guard.is_some() {
            self.state.uninstall_count.fetch_add(1, Ordering::SeqCst);
        }
        *guard = None;
        Ok(())
    }

    fn is_installed(&self) -> bool {
        match self.state.sender.lock() {
            Ok(guard) => guard.is_some(),
            Err(_) => false,
        }
    }
}

pub struct MockPointerHandle {
    state: Arc<MockPointerState>,
}

impl MockPointerHandle {
    pub fn install_count(&self) -> usize {
        self.state.install_count.load(Ordering::SeqCst)
    }

    pub fn uninstall_count(&self) -> usize {
        self.state.uninstall_count.load(Ordering::SeqCst)
    }

    pub fn emit(&self, event: PointerEvent) -> bool {
        match self.state.sender.lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|sender| sender.send(event).is_ok())
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}

/// Fixed-position provider for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedCursorPositionProvider(pub f64, pub f64);

impl CursorPositionProvider for FixedCursorPositionProvider {
    fn cursor_position(&self) -> Option<(f64, f64)> {
        Some((self.0, self.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn mock_backend_counts_installs_and_forwards_events() {
        let (mut backend, handle) = MockPointerBackend::new();
        let (tx, rx) = channel();
        backend.install(tx).expect("install");
        backend.install(channel().0).expect("second install is a no-op");
        assert_eq!(handle.install_count(), 1);
        assert!(backend.is_installed());

        assert!(handle.emit(PointerEvent::Moved { x: 10.0, y: 20.0 }));
        assert_eq!(rx.try_recv(), Ok(PointerEvent::Moved { x: 10.0, y: 20.0 }));

        backend.uninstall().expect("uninstall");
        assert!(!backend.is_installed());
        assert!(!handle.emit(PointerEvent::Pressed(ClickKind::Left)));
    }
}
