use cursor_halo::hotkey::{parse_hotkey, HotkeyTrigger};
use cursor_halo::service::HighlightService;
use cursor_halo::settings::{resolve_settings_path, Settings, SettingsStore};
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    let settings_path = resolve_settings_path();
    let settings = Settings::load(&settings_path);
    cursor_halo::logging::init(settings.debug_logging);
    tracing::info!(path = %settings_path.display(), "loaded settings");

    let store = SettingsStore::new(settings);

    // Persist on every change so external edits and toggles survive restarts.
    let save_store = store.clone();
    let save_path = settings_path.clone();
    let save_rx = store.subscribe();
    std::thread::spawn(move || {
        while save_rx.recv().is_ok() {
            if let Err(err) = save_store.snapshot().save(&save_path) {
                tracing::error!(?err, "failed to save settings");
            }
        }
    });

    let trigger = store
        .snapshot()
        .toggle_hotkey
        .as_deref()
        .and_then(parse_hotkey)
        .map(HotkeyTrigger::new);
    if let Some(trigger) = &trigger {
        trigger.start_listener();
    }

    let mut service = HighlightService::new(store);
    service.start();
    if !service.is_running() {
        tracing::warn!("highlight service failed to start; exiting");
        return Ok(());
    }

    loop {
        if let Some(trigger) = &trigger {
            if trigger.take() {
                service.toggle();
            }
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
