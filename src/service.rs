use crate::classifier::{
    CursorClassifier, CursorProbe, CursorProbeFactory, DefaultCursorProbe, CLASSIFIER_TICK,
};
use crate::display::{DisplayProvider, DisplayWatcher, SystemDisplayProvider};
use crate::idle::{IdleEvent, IdleTracker};
use crate::input::{
    CursorPositionProvider, DefaultPointerBackend, PointerEvent, PointerHookBackend,
    SystemCursorPositionProvider,
};
use crate::overlay::surface::SurfaceBackendFactory;
use crate::overlay::window::DefaultSurfaceBackendFactory;
use crate::overlay::OverlayManager;
use crate::settings::SettingsStore;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Wake-up cadence of the worker when no pointer events arrive; bounds the
/// latency of idle polls, classifier ticks and drained notifications.
const LOOP_TICK: Duration = Duration::from_millis(25);

struct WorkerHandle {
    stop_tx: Sender<()>,
    join: JoinHandle<()>,
}

/// Top-level lifecycle for the highlight: installs the pointer hook, spawns
/// the display watcher, and runs one worker thread that owns every piece of
/// mutable overlay state. All sampler callbacks, classifier ticks and
/// settings/display notifications are marshaled onto that single thread.
pub struct HighlightService {
    settings: SettingsStore,
    backend: Box<dyn PointerHookBackend>,
    cursor_provider: Arc<dyn CursorPositionProvider>,
    displays: Arc<dyn DisplayProvider>,
    surface_factory: Arc<dyn SurfaceBackendFactory>,
    probe_factory: Arc<dyn CursorProbeFactory>,
    worker: Option<WorkerHandle>,
    watcher: Option<DisplayWatcher>,
}

impl HighlightService {
    pub fn new(settings: SettingsStore) -> Self {
        Self::with_components(
            settings,
            Box::new(DefaultPointerBackend::default()),
            Arc::new(SystemCursorPositionProvider),
            Arc::new(SystemDisplayProvider),
            Arc::new(DefaultSurfaceBackendFactory),
            Arc::new(|| Box::new(DefaultCursorProbe::default()) as Box<dyn CursorProbe>),
        )
    }

    pub fn with_components(
        settings: SettingsStore,
        backend: Box<dyn PointerHookBackend>,
        cursor_provider: Arc<dyn CursorPositionProvider>,
        displays: Arc<dyn DisplayProvider>,
        surface_factory: Arc<dyn SurfaceBackendFactory>,
        probe_factory: Arc<dyn CursorProbeFactory>,
    ) -> Self {
        Self {
            settings,
            backend,
            cursor_provider,
            displays,
            surface_factory,
            probe_factory,
            worker: None,
            watcher: None,
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Flip the master switch; the worker reacts via the settings
    /// subscription.
    pub fn toggle(&self) {
        self.settings.update(|s| s.active = !s.active);
        tracing::info!(active = self.settings.snapshot().active, "highlight toggled");
    }

    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }

        let (event_tx, event_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel();

        if let Err(err) = self.backend.install(event_tx.clone()) {
            tracing::error!(?err, "failed to install pointer hook");
            return;
        }

        let (display_tx, display_rx) = mpsc::channel();
        self.watcher = Some(DisplayWatcher::spawn(Arc::clone(&self.displays), display_tx));
        let settings_rx = self.settings.subscribe();

        // Synthetic initial event so the overlay appears at the correct
        // position without waiting for the first move.
        if let Some((x, y)) = self.cursor_provider.cursor_position() {
            let _ = event_tx.send(PointerEvent::Moved { x, y });
        }

        let settings = self.settings.clone();
        let displays = Arc::clone(&self.displays);
        let surface_factory = Arc::clone(&self.surface_factory);
        let probe = self.probe_factory.create();
        let join = match thread::Builder::new()
            .name("cursor-halo-worker".to_string())
            .spawn(move || {
                worker_loop(
                    settings,
                    displays,
                    surface_factory,
                    probe,
                    event_rx,
                    stop_rx,
                    settings_rx,
                    display_rx,
                )
            }) {
            Ok(join) => join,
            Err(err) => {
                tracing::error!(?err, "failed to spawn worker thread");
                let _ = self.backend.uninstall();
                if let Some(mut watcher) = self.watcher.take() {
                    watcher.stop();
                }
                return;
            }
        };
        self.worker = Some(WorkerHandle { stop_tx, join });
    }

    pub fn stop(&mut self) {
        if self.worker.is_none() && !self.backend.is_installed() {
            return;
        }

        if let Err(err) = self.backend.uninstall() {
            tracing::error!(?err, "failed to uninstall pointer hook");
        }
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.join();
        }
    }
}

impl Drop for HighlightService {
    fn drop(&mut self) {
        self.stop();
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_loop(
    settings: SettingsStore,
    displays: Arc<dyn DisplayProvider>,
    surface_factory: Arc<dyn SurfaceBackendFactory>,
    probe: Box<dyn CursorProbe>,
    event_rx: Receiver<PointerEvent>,
    stop_rx: Receiver<()>,
    settings_rx: Receiver<()>,
    display_rx: Receiver<()>,
) {
    let mut manager = OverlayManager::new(settings.clone(), displays, surface_factory);
    manager.rebuild_surfaces();

    let snapshot = settings.snapshot();
    manager.set_visible(snapshot.active);

    let mut classifier = CursorClassifier::new(probe);
    let mut idle = IdleTracker::new(
        snapshot.auto_hide_enabled,
        Duration::from_secs_f32(snapshot.auto_hide_delay),
    );
    let mut last_pointer: Option<(f64, f64)> = None;
    let mut last_classifier_tick = Instant::now();

    loop {
        if stop_rx.try_recv().is_ok() {
            break;
        }

        if display_rx.try_recv().is_ok() {
            // Collapse bursts into one rebuild.
            while display_rx.try_recv().is_ok() {}
            manager.rebuild_surfaces();
            let s = settings.snapshot();
            manager.set_visible(s.active);
            if let Some(point) = last_pointer {
                manager.on_cursor_moved(point);
            }
        }

        if settings_rx.try_recv().is_ok() {
            while settings_rx.try_recv().is_ok() {}
            let s = settings.snapshot();
            manager.on_appearance_settings_changed();
            manager.set_visible(s.active);
            idle.configure(
                s.auto_hide_enabled,
                Duration::from_secs_f32(s.auto_hide_delay),
            );
        }

        match event_rx.recv_timeout(LOOP_TICK) {
            Ok(PointerEvent::Moved { x, y }) => {
                last_pointer = Some((x, y));
                manager.on_cursor_moved((x, y));
                let now = Instant::now();
                if idle.reset_activity(now) == Some(IdleEvent::Resume) {
                    manager.set_highlight_visible(true, true, now);
                }
            }
            Ok(PointerEvent::Pressed(kind)) => {
                manager.on_click(kind, Instant::now());
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        if idle.poll(now) == Some(IdleEvent::Idle) {
            manager.set_highlight_visible(false, true, now);
        }

        if now.duration_since(last_classifier_tick) >= CLASSIFIER_TICK {
            last_classifier_tick = now;
            let s = settings.snapshot();
            let enabled = s.active && s.cursor_color_enabled;
            let at = last_pointer.unwrap_or((0.0, 0.0));
            if let Some(kind) = classifier.poll(enabled, at) {
                tracing::debug!(?kind, "cursor type changed");
                manager.on_cursor_type_changed(kind);
            }
        }
    }
}
