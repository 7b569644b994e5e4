use cursor_halo::classifier::{
    CursorClassifier, CursorKind, ElementInfo, ElementRole, ReferenceFingerprints,
    ScriptedCursorProbe,
};
use std::sync::Arc;

const HAND: &[u8] = &[0xaa, 0x01];
const IBEAM: &[u8] = &[0xbb, 0x02];
const IBEAM_VERTICAL: &[u8] = &[0xbb, 0x03];
const ARROW: &[u8] = &[0xcc, 0x04];

fn references() -> ReferenceFingerprints {
    ReferenceFingerprints {
        hand: Some(HAND.to_vec()),
        text_horizontal: Some(IBEAM.to_vec()),
        text_vertical: Some(IBEAM_VERTICAL.to_vec()),
    }
}

struct Script {
    probe: Arc<ScriptedCursorProbe>,
    classifier: CursorClassifier,
}

impl Script {
    fn new() -> Self {
        let probe = Arc::new(ScriptedCursorProbe::with_references(references()));

        struct Shared(Arc<ScriptedCursorProbe>);
        impl cursor_halo::classifier::CursorProbe for Shared {
            fn reference_fingerprints(&self) -> ReferenceFingerprints {
                self.0.reference_fingerprints()
            }
            fn current_fingerprint(&self) -> Option<Vec<u8>> {
                self.0.current_fingerprint()
            }
            fn element_at(&self, x: f64, y: f64) -> Option<ElementInfo> {
                self.0.element_at(x, y)
            }
        }

        let classifier = CursorClassifier::new(Box::new(Shared(Arc::clone(&probe))));
        Self { probe, classifier }
    }

    fn tick(&mut self, fingerprint: &[u8]) -> Option<CursorKind> {
        self.probe.set_fingerprint(Some(fingerprint.to_vec()));
        self.classifier.poll(true, (100.0, 100.0))
    }
}

#[test]
fn change_events_fire_only_on_edges() {
    let mut script = Script::new();

    // Detected sequence: hand hand text text hand arrow arrow
    let detections = [HAND, HAND, IBEAM, IBEAM, HAND, ARROW, ARROW];
    let events: Vec<_> = detections
        .iter()
        .map(|fp| script.tick(fp))
        .collect();

    assert_eq!(
        events,
        vec![
            Some(CursorKind::Hand),
            None,
            Some(CursorKind::Text),
            None,
            Some(CursorKind::Hand),
            Some(CursorKind::Normal),
            None,
        ]
    );
}

#[test]
fn emitted_event_count_equals_transition_count() {
    let mut script = Script::new();
    let detections = [
        ARROW, HAND, HAND, HAND, IBEAM, ARROW, ARROW, IBEAM_VERTICAL, IBEAM, HAND,
    ];

    let mut expected_transitions = 0;
    let mut previous = CursorKind::Normal;
    let mut emitted = 0;
    for fp in detections {
        let detected = match fp {
            f if f == HAND => CursorKind::Hand,
            f if f == IBEAM || f == IBEAM_VERTICAL => CursorKind::Text,
            _ => CursorKind::Normal,
        };
        if detected != previous {
            expected_transitions += 1;
            previous = detected;
        }
        if script.tick(fp).is_some() {
            emitted += 1;
        }
    }
    assert_eq!(emitted, expected_transitions);
}

#[test]
fn vertical_text_cursor_matches_the_text_state() {
    let mut script = Script::new();
    assert_eq!(script.tick(IBEAM_VERTICAL), Some(CursorKind::Text));
    assert_eq!(script.tick(IBEAM), None);
}

#[test]
fn introspection_covers_custom_drawn_cursors() {
    let mut script = Script::new();
    // Custom cursor: fingerprint matches no reference, but the element under
    // the pointer is a link.
    script
        .probe
        .set_element(Some(ElementInfo::with_role(ElementRole::Link)));
    assert_eq!(script.tick(ARROW), Some(CursorKind::Hand));

    // The link disappears; back to normal exactly once.
    script.probe.set_element(None);
    assert_eq!(script.tick(ARROW), Some(CursorKind::Normal));
    assert_eq!(script.tick(ARROW), None);
}
