use cursor_halo::display::{DisplayRect, MockDisplayProvider};
use cursor_halo::input::ClickKind;
use cursor_halo::overlay::surface::NoopBackendFactory;
use cursor_halo::overlay::OverlayManager;
use cursor_halo::settings::{defaults, SettingsStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn manager(store: SettingsStore) -> OverlayManager {
    let displays = Arc::new(MockDisplayProvider::new(vec![
        DisplayRect::new(0, 0, 1000, 800),
        DisplayRect::new(1000, 0, 1000, 800),
    ]));
    let mut manager = OverlayManager::new(store, displays, Arc::new(NoopBackendFactory));
    manager.rebuild_surfaces();
    manager
}

#[test]
fn click_reaches_only_the_active_surface() {
    let mut manager = manager(SettingsStore::default());
    manager.on_cursor_moved((1500.0, 400.0));

    manager.on_click(ClickKind::Left, Instant::now());
    assert!(manager.surfaces()[0].snapshot().ripple.is_none());
    let ripple = manager.surfaces()[1].snapshot().ripple.expect("ripple");
    assert_eq!(ripple.color(), defaults::LEFT_CLICK_COLOR);
    assert!(manager.surfaces()[1].snapshot().press.is_some());
}

#[test]
fn right_click_uses_its_own_color() {
    let mut manager = manager(SettingsStore::default());
    manager.on_cursor_moved((10.0, 10.0));

    manager.on_click(ClickKind::Right, Instant::now());
    let ripple = manager.surfaces()[0].snapshot().ripple.expect("ripple");
    assert_eq!(ripple.color(), defaults::RIGHT_CLICK_COLOR);
}

#[test]
fn disabled_click_animation_is_a_no_op() {
    let store = SettingsStore::default();
    store.update(|s| s.click_animation_enabled = false);
    let mut manager = manager(store);
    manager.on_cursor_moved((10.0, 10.0));

    manager.on_click(ClickKind::Left, Instant::now());
    assert!(manager.surfaces()[0].snapshot().ripple.is_none());
    assert!(manager.surfaces()[0].snapshot().press.is_none());
}

#[test]
fn tilt_rotates_the_ripple_only_when_enabled() {
    let now = Instant::now();
    let sample_at = now + Duration::from_millis(300);

    let store = SettingsStore::default();
    store.update(|s| s.tilt_on_click = true);
    let mut tilted = manager(store);
    tilted.on_cursor_moved((10.0, 10.0));
    tilted.on_click(ClickKind::Left, now);
    let frame = tilted.surfaces()[0]
        .snapshot()
        .ripple
        .expect("ripple")
        .frame_at(sample_at)
        .expect("frame");
    assert!(frame.rotation_degrees < 0.0);

    let mut flat = manager(SettingsStore::default());
    flat.on_cursor_moved((10.0, 10.0));
    flat.on_click(ClickKind::Right, now);
    let frame = flat.surfaces()[0]
        .snapshot()
        .ripple
        .expect("ripple")
        .frame_at(sample_at)
        .expect("frame");
    assert_eq!(frame.rotation_degrees, 0.0);
}

#[test]
fn retrigger_before_completion_replaces_the_ripple() {
    let mut manager = manager(SettingsStore::default());
    manager.on_cursor_moved((10.0, 10.0));

    let t0 = Instant::now();
    manager.on_click(ClickKind::Left, t0);
    let t1 = t0 + Duration::from_millis(200);
    manager.on_click(ClickKind::Right, t1);

    let ripple = manager.surfaces()[0].snapshot().ripple.expect("ripple");
    assert_eq!(ripple.color(), defaults::RIGHT_CLICK_COLOR);
    // The first ripple would have finished by t0+350ms; the replacement is
    // still running well past that.
    assert!(ripple.frame_at(t0 + Duration::from_millis(400)).is_some());
    assert!(ripple.frame_at(t1 + Duration::from_millis(350)).is_none());
}

#[test]
fn idle_fade_is_slower_than_resume() {
    let mut manager = manager(SettingsStore::default());
    manager.on_cursor_moved((10.0, 10.0));
    let now = Instant::now();

    manager.set_highlight_visible(false, true, now);
    let state = manager.surfaces()[0].snapshot();
    // Hiding runs 500 ms; half-way through it is still partly visible.
    assert!(state.fade.value_at(now + Duration::from_millis(250)) > 0.0);
    assert_eq!(state.fade.value_at(now + Duration::from_millis(500)), 0.0);

    let later = now + Duration::from_millis(600);
    manager.set_highlight_visible(true, true, later);
    let state = manager.surfaces()[0].snapshot();
    assert_eq!(state.fade.value_at(later + Duration::from_millis(200)), 1.0);
}

#[test]
fn unanimated_visibility_change_is_instant() {
    let mut manager = manager(SettingsStore::default());
    let now = Instant::now();
    manager.set_highlight_visible(false, false, now);
    assert_eq!(manager.surfaces()[0].snapshot().fade.value_at(now), 0.0);
}
