use cursor_halo::display::{DisplayRect, MockDisplayProvider};
use cursor_halo::overlay::surface::{NoopBackendFactory, RecordingBackendFactory};
use cursor_halo::overlay::OverlayManager;
use cursor_halo::settings::SettingsStore;
use std::sync::Arc;

fn two_display_manager(store: SettingsStore) -> (OverlayManager, Arc<MockDisplayProvider>) {
    let displays = Arc::new(MockDisplayProvider::new(vec![
        DisplayRect::new(0, 0, 1000, 800),
        DisplayRect::new(1000, 0, 1000, 800),
    ]));
    let provider: Arc<dyn cursor_halo::display::DisplayProvider> = displays.clone();
    let mut manager = OverlayManager::new(store, provider, Arc::new(NoopBackendFactory));
    manager.rebuild_surfaces();
    (manager, displays)
}

#[test]
fn cursor_routes_to_the_containing_display() {
    let store = SettingsStore::default();
    store.update(|s| {
        s.cursor_offset_x = 0.0;
        s.cursor_offset_y = 0.0;
    });
    let (mut manager, _displays) = two_display_manager(store);

    manager.on_cursor_moved((500.0, 400.0));
    assert_eq!(manager.active_index(), Some(0));
    assert!(manager.surfaces()[0].snapshot().active);
    assert!(!manager.surfaces()[1].snapshot().active);
    assert_eq!(manager.surfaces()[0].snapshot().position, (500.0, 400.0));

    manager.on_cursor_moved((1500.0, 400.0));
    assert_eq!(manager.active_index(), Some(1));
    assert!(!manager.surfaces()[0].snapshot().active);
    assert!(manager.surfaces()[1].snapshot().active);
    // Position is converted into the new surface's local space.
    assert_eq!(manager.surfaces()[1].snapshot().position, (500.0, 400.0));
}

#[test]
fn exactly_one_surface_is_active_while_crossing_back_and_forth() {
    let store = SettingsStore::default();
    let (mut manager, _displays) = two_display_manager(store);

    for point in [
        (10.0, 10.0),
        (1990.0, 10.0),
        (999.0, 799.0),
        (1000.0, 0.0),
    ] {
        manager.on_cursor_moved(point);
        let active_count = manager
            .surfaces()
            .iter()
            .filter(|s| s.snapshot().active)
            .count();
        assert_eq!(active_count, 1, "point {point:?}");
    }
}

#[test]
fn cursor_offset_is_applied_before_local_conversion() {
    let store = SettingsStore::default();
    store.update(|s| {
        s.cursor_offset_x = -3.0;
        s.cursor_offset_y = 4.0;
    });
    let (mut manager, _displays) = two_display_manager(store);

    manager.on_cursor_moved((1500.0, 400.0));
    assert_eq!(manager.surfaces()[1].snapshot().position, (497.0, 404.0));
}

#[test]
fn point_outside_every_display_keeps_the_current_surface() {
    let store = SettingsStore::default();
    let (mut manager, _displays) = two_display_manager(store);

    manager.on_cursor_moved((500.0, 400.0));
    assert_eq!(manager.active_index(), Some(0));

    // Display-set race: the point lands in a gap. Nothing deactivates.
    manager.on_cursor_moved((5000.0, 5000.0));
    assert_eq!(manager.active_index(), Some(0));
    assert!(manager.surfaces()[0].snapshot().active);
}

#[test]
fn rebuild_closes_old_surfaces_and_opens_new_ones() {
    let factory = RecordingBackendFactory::default();
    let counters = factory.counters();
    let displays = Arc::new(MockDisplayProvider::new(vec![
        DisplayRect::new(0, 0, 1000, 800),
        DisplayRect::new(1000, 0, 1000, 800),
    ]));
    let provider: Arc<dyn cursor_halo::display::DisplayProvider> = displays.clone();
    let mut manager = OverlayManager::new(SettingsStore::default(), provider, Arc::new(factory));

    manager.rebuild_surfaces();
    assert_eq!(counters.opens(), 2);
    assert_eq!(counters.closes(), 0);

    // One display unplugged between notification and rebuild.
    displays.set_displays(vec![DisplayRect::new(0, 0, 1000, 800)]);
    manager.rebuild_surfaces();
    assert_eq!(counters.opens(), 3);
    assert_eq!(counters.closes(), 2);
    assert_eq!(manager.surfaces().len(), 1);
    assert_eq!(manager.active_index(), None);

    // Everything gone: zero surfaces, no crash.
    displays.set_displays(Vec::new());
    manager.rebuild_surfaces();
    assert_eq!(manager.surfaces().len(), 0);
    manager.on_cursor_moved((100.0, 100.0));
    assert_eq!(manager.active_index(), None);
}

#[test]
fn set_visible_flips_every_surface_without_destroying_them() {
    let store = SettingsStore::default();
    let (mut manager, _displays) = two_display_manager(store);

    manager.set_visible(false);
    assert!(manager.surfaces().iter().all(|s| !s.snapshot().visible));
    manager.set_visible(true);
    assert!(manager.surfaces().iter().all(|s| s.snapshot().visible));
    assert_eq!(manager.surfaces().len(), 2);
}

#[test]
fn inactive_highlighting_ignores_cursor_moves() {
    let store = SettingsStore::default();
    store.update(|s| s.active = false);
    let (mut manager, _displays) = two_display_manager(store);

    manager.on_cursor_moved((500.0, 400.0));
    assert_eq!(manager.active_index(), None);
}
