use std::sync::Mutex;
use std::time::Duration;

/// Cursor semantics inferred from what sits under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorKind {
    #[default]
    Normal,
    /// Pointing-hand target, typically a link.
    Hand,
    /// Text-input target (I-beam).
    Text,
}

/// Interval between classifier polls. Cursor image changes are not
/// observable as events, so the classifier samples on a fixed tick.
pub const CLASSIFIER_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRole {
    Link,
    TextField,
    TextArea,
    ComboBox,
    SearchField,
    Other,
}

/// What the UI-introspection query learned about the element under the
/// cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementInfo {
    pub role: ElementRole,
    /// Element exposes a target-URL-like attribute.
    pub has_target_url: bool,
    pub parent_role: Option<ElementRole>,
}

impl ElementInfo {
    pub fn with_role(role: ElementRole) -> Self {
        Self {
            role,
            has_target_url: false,
            parent_role: None,
        }
    }
}

/// Byte encodings of the reference cursor images, captured once at startup.
/// Any slot may be absent on platforms without that stock cursor.
#[derive(Debug, Clone, Default)]
pub struct ReferenceFingerprints {
    pub hand: Option<Vec<u8>>,
    pub text_horizontal: Option<Vec<u8>>,
    pub text_vertical: Option<Vec<u8>>,
}

/// Platform capability the classifier interrogates. Byte-level fingerprints
/// stand in for object identity (the OS may hand out distinct instances with
/// identical pixel content); `element_at` returning `None` covers every
/// introspection failure: permission not granted, nothing under the cursor,
/// or a disconnected process.
pub trait CursorProbe: Send {
    fn reference_fingerprints(&self) -> ReferenceFingerprints;
    fn current_fingerprint(&self) -> Option<Vec<u8>>;
    fn element_at(&self, x: f64, y: f64) -> Option<ElementInfo>;
}

/// Creates a fresh probe per classifier lifetime; the service restarts the
/// classifier with its worker.
pub trait CursorProbeFactory: Send + Sync {
    fn create(&self) -> Box<dyn CursorProbe>;
}

impl<F> CursorProbeFactory for F
where
    F: Fn() -> Box<dyn CursorProbe> + Send + Sync,
{
    fn create(&self) -> Box<dyn CursorProbe> {
        self()
    }
}

/// Role-based classification used by the introspection fallback.
pub fn classify_element(info: &ElementInfo) -> CursorKind {
    match info.role {
        ElementRole::Link => return CursorKind::Hand,
        ElementRole::TextField
        | ElementRole::TextArea
        | ElementRole::ComboBox
        | ElementRole::SearchField => return CursorKind::Text,
        ElementRole::Other => {}
    }
    if info.has_target_url {
        return CursorKind::Hand;
    }
    // A text node inside a link (or field) carries no role of its own.
    match info.parent_role {
        Some(ElementRole::Link) => CursorKind::Hand,
        Some(ElementRole::TextField) | Some(ElementRole::TextArea) => CursorKind::Text,
        _ => CursorKind::Normal,
    }
}

/// Two-stage cursor-type detector with hysteresis: fingerprint match first,
/// UI introspection as the fallback for custom-drawn cursors. `poll` only
/// reports state *changes* so the render layers are not rewritten at 10 Hz.
pub struct CursorClassifier {
    probe: Box<dyn CursorProbe>,
    refs: ReferenceFingerprints,
    last: CursorKind,
}

impl CursorClassifier {
    pub fn new(probe: Box<dyn CursorProbe>) -> Self {
        let refs = probe.reference_fingerprints();
        Self {
            probe,
            refs,
            last: CursorKind::Normal,
        }
    }

    pub fn current(&self) -> CursorKind {
        self.last
    }

    /// One tick. `enabled` short-circuits to `Normal` when highlighting or
    /// cursor-type coloring is off.
    pub fn poll(&mut self, enabled: bool, at: (f64, f64)) -> Option<CursorKind> {
        let detected = if enabled {
            self.detect(at)
        } else {
            CursorKind::Normal
        };
        if detected != self.last {
            self.last = detected;
            Some(detected)
        } else {
            None
        }
    }

    fn detect(&self, at: (f64, f64)) -> CursorKind {
        if let Some(kind) = self.match_fingerprint() {
            return kind;
        }
        match self.probe.element_at(at.0, at.1) {
            Some(info) => classify_element(&info),
            None => CursorKind::Normal,
        }
    }

    fn match_fingerprint(&self) -> Option<CursorKind> {
        let current = self.probe.current_fingerprint()?;
        if self.refs.hand.as_deref() == Some(current.as_slice()) {
            return Some(CursorKind::Hand);
        }
        if self.refs.text_horizontal.as_deref() == Some(current.as_slice())
            || self.refs.text_vertical.as_deref() == Some(current.as_slice())
        {
            return Some(CursorKind::Text);
        }
        None
    }
}

/// Scriptable probe for tests: fingerprint and element results are set from
/// the outside per tick.
#[derive(Default)]
pub struct ScriptedCursorProbe {
    refs: ReferenceFingerprints,
    current: Mutex<Option<Vec<u8>>>,
    element: Mutex<Option<ElementInfo>>,
}

impl ScriptedCursorProbe {
    pub fn with_references(refs: ReferenceFingerprints) -> Self {
        Self {
            refs,
            ..Default::default()
        }
    }

    pub fn set_fingerprint(&self, bytes: Option<Vec<u8>>) {
        if let Ok(mut guard) = self.current.lock() {
            *guard = bytes;
        }
    }

    pub fn set_element(&self, info: Option<ElementInfo>) {
        if let Ok(mut guard) = self.element.lock() {
            *guard = info;
        }
    }
}

impl CursorProbe for ScriptedCursorProbe {
    fn reference_fingerprints(&self) -> ReferenceFingerprints {
        self.refs.clone()
    }

    fn current_fingerprint(&self) -> Option<Vec<u8>> {
        self.current.lock().ok().and_then(|guard| guard.clone())
    }

    fn element_at(&self, _x: f64, _y: f64) -> Option<ElementInfo> {
        self.element.lock().ok().and_then(|guard| *guard)
    }
}

#[cfg(windows)]
pub use platform::DefaultCursorProbe;

#[cfg(not(windows))]
pub use self::NullCursorProbe as DefaultCursorProbe;

/// Probe for platforms without cursor introspection: everything classifies
/// as normal.
#[derive(Debug, Default)]
pub struct NullCursorProbe;

impl CursorProbe for NullCursorProbe {
    fn reference_fingerprints(&self) -> ReferenceFingerprints {
        ReferenceFingerprints::default()
    }

    fn current_fingerprint(&self) -> Option<Vec<u8>> {
        None
    }

    fn element_at(&self, _x: f64, _y: f64) -> Option<ElementInfo> {
        None
    }
}

#[cfg(windows)]
mod platform {
    use super::{CursorProbe, ElementInfo, ElementRole, ReferenceFingerprints};
    use windows::Win32::Foundation::{HWND, POINT};
    use windows::Win32::Graphics::Gdi::{
        DeleteObject, GetDC, GetDIBits, GetObjectW, ReleaseDC, BITMAP, BITMAPINFO,
        BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBITMAP,
    };
    use windows::Win32::System::Com::{
        CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_ALL, COINIT_APARTMENTTHREADED,
    };
    use windows::Win32::UI::Accessibility::{
        CUIAutomation, IUIAutomation, IUIAutomationElement, UIA_ComboBoxControlTypeId,
        UIA_DocumentControlTypeId, UIA_EditControlTypeId, UIA_HyperlinkControlTypeId,
    };
    use windows::Win32::UI::WindowsAndMessaging::{
        GetCursorInfo, GetIconInfo, LoadCursorW, CURSORINFO, CURSOR_SHOWING, HCURSOR, ICONINFO,
        IDC_HAND, IDC_IBEAM,
    };

    /// Windows probe: cursor-image bits for fingerprints, UI Automation for
    /// element introspection. Windows has no vertical I-beam stock cursor, so
    /// that reference slot stays empty. UI Automation exposes no URL
    /// attribute either; link detection rests on control types.
    #[derive(Debug, Default)]
    pub struct DefaultCursorProbe;

    impl CursorProbe for DefaultCursorProbe {
        fn reference_fingerprints(&self) -> ReferenceFingerprints {
            ReferenceFingerprints {
                hand: encode_stock_cursor(IDC_HAND),
                text_horizontal: encode_stock_cursor(IDC_IBEAM),
                text_vertical: None,
            }
        }

        fn current_fingerprint(&self) -> Option<Vec<u8>> {
            let mut info = CURSORINFO {
                cbSize: std::mem::size_of::<CURSORINFO>() as u32,
                ..Default::default()
            };
            unsafe { GetCursorInfo(&mut info) }.ok()?;
            if info.flags.0 & CURSOR_SHOWING.0 == 0 {
                return None;
            }
            encode_cursor(info.hCursor)
        }

        fn element_at(&self, x: f64, y: f64) -> Option<ElementInfo> {
            element_at_point(x as i32, y as i32)
        }
    }

    fn encode_stock_cursor(
        id: windows::core::PCWSTR,
    ) -> Option<Vec<u8>> {
        let cursor = unsafe { LoadCursorW(None, id) }.ok()?;
        encode_cursor(cursor)
    }

    /// Byte encoding of a cursor's mask + color bitmaps. Handle identity is
    /// not enough: two handles can reference identical pixel content.
    fn encode_cursor(cursor: HCURSOR) -> Option<Vec<u8>> {
        if cursor.is_invalid() {
            return None;
        }
        let mut icon_info = ICONINFO::default();
        unsafe { GetIconInfo(cursor, &mut icon_info) }.ok()?;

        let hdc = unsafe { GetDC(HWND::default()) };
        let mut bytes = Vec::new();
        let mut ok = false;
        if let Some(mask) = bitmap_bits(hdc, icon_info.hbmMask) {
            bytes.extend_from_slice(&mask);
            ok = true;
        }
        if !icon_info.hbmColor.is_invalid() {
            if let Some(color) = bitmap_bits(hdc, icon_info.hbmColor) {
                bytes.extend_from_slice(&color);
            }
        }
        unsafe {
            ReleaseDC(HWND::default(), hdc);
            let _ = DeleteObject(icon_info.hbmMask);
            if !icon_info.hbmColor.is_invalid() {
                let _ = DeleteObject(icon_info.hbmColor);
            }
        }
        ok.then_some(bytes)
    }

    fn bitmap_bits(
        hdc: windows::Win32::Graphics::Gdi::HDC,
        hbm: HBITMAP,
    ) -> Option<Vec<u8>> {
        if hbm.is_invalid() {
            return None;
        }
        let mut bmp = BITMAP::default();
        let copied = unsafe {
            GetObjectW(
                hbm,
                std::mem::size_of::<BITMAP>() as i32,
                Some(&mut bmp as *mut _ as *mut _),
            )
        };
        if copied == 0 || bmp.bmWidth <= 0 || bmp.bmHeight <= 0 {
            return None;
        }

        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: bmp.bmWidth,
                biHeight: -bmp.bmHeight,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut buf = vec![0u8; (bmp.bmWidth * bmp.bmHeight * 4) as usize];
        let rows = unsafe {
            GetDIBits(
                hdc,
                hbm,
                0,
                bmp.bmHeight as u32,
                Some(buf.as_mut_ptr() as *mut _),
                &mut info,
                DIB_RGB_COLORS,
            )
        };
        (rows != 0).then_some(buf)
    }

    fn element_at_point(x: i32, y: i32) -> Option<ElementInfo> {
        unsafe {
            if CoInitializeEx(None, COINIT_APARTMENTTHREADED).is_err() {
                return None;
            }
            let info = query_element(x, y);
            CoUninitialize();
            info
        }
    }

    unsafe fn query_element(x: i32, y: i32) -> Option<ElementInfo> {
        let automation: IUIAutomation =
            CoCreateInstance(&CUIAutomation, None, CLSCTX_ALL).ok()?;
        let element = automation.ElementFromPoint(POINT { x, y }).ok()?;
        let role = element_role(&element);

        let parent_role = automation
            .ControlViewWalker()
            .ok()
            .and_then(|walker| walker.GetParentElement(&element).ok())
            .map(|parent| element_role(&parent));

        Some(ElementInfo {
            role,
            has_target_url: false,
            parent_role,
        })
    }

    unsafe fn element_role(element: &IUIAutomationElement) -> ElementRole {
        match element.CurrentControlType() {
            Ok(control_type) => {
                if control_type == UIA_HyperlinkControlTypeId {
                    ElementRole::Link
                } else if control_type == UIA_EditControlTypeId {
                    ElementRole::TextField
                } else if control_type == UIA_DocumentControlTypeId {
                    ElementRole::TextArea
                } else if control_type == UIA_ComboBoxControlTypeId {
                    ElementRole::ComboBox
                } else {
                    ElementRole::Other
                }
            }
            Err(_) => ElementRole::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_roles_and_url_attributes_read_as_hand() {
        assert_eq!(
            classify_element(&ElementInfo::with_role(ElementRole::Link)),
            CursorKind::Hand
        );
        let url_only = ElementInfo {
            role: ElementRole::Other,
            has_target_url: true,
            parent_role: None,
        };
        assert_eq!(classify_element(&url_only), CursorKind::Hand);
    }

    #[test]
    fn text_input_roles_read_as_text() {
        for role in [
            ElementRole::TextField,
            ElementRole::TextArea,
            ElementRole::ComboBox,
            ElementRole::SearchField,
        ] {
            assert_eq!(
                classify_element(&ElementInfo::with_role(role)),
                CursorKind::Text
            );
        }
    }

    #[test]
    fn parent_roles_cover_anonymous_text_nodes() {
        let in_link = ElementInfo {
            role: ElementRole::Other,
            has_target_url: false,
            parent_role: Some(ElementRole::Link),
        };
        assert_eq!(classify_element(&in_link), CursorKind::Hand);

        let in_field = ElementInfo {
            role: ElementRole::Other,
            has_target_url: false,
            parent_role: Some(ElementRole::TextArea),
        };
        assert_eq!(classify_element(&in_field), CursorKind::Text);

        let plain = ElementInfo::with_role(ElementRole::Other);
        assert_eq!(classify_element(&plain), CursorKind::Normal);
    }

    #[test]
    fn fingerprint_match_takes_precedence_over_introspection() {
        let probe = ScriptedCursorProbe::with_references(ReferenceFingerprints {
            hand: Some(vec![1, 2, 3]),
            text_horizontal: Some(vec![4, 5]),
            text_vertical: None,
        });
        probe.set_fingerprint(Some(vec![1, 2, 3]));
        probe.set_element(Some(ElementInfo::with_role(ElementRole::TextField)));

        let mut classifier = CursorClassifier::new(Box::new(probe));
        assert_eq!(classifier.poll(true, (0.0, 0.0)), Some(CursorKind::Hand));
    }

    #[test]
    fn unmatched_fingerprint_falls_back_to_introspection() {
        let probe = ScriptedCursorProbe::with_references(ReferenceFingerprints {
            hand: Some(vec![1]),
            text_horizontal: Some(vec![2]),
            text_vertical: Some(vec![3]),
        });
        probe.set_fingerprint(Some(vec![9, 9]));
        probe.set_element(Some(ElementInfo::with_role(ElementRole::Link)));

        let mut classifier = CursorClassifier::new(Box::new(probe));
        assert_eq!(classifier.poll(true, (0.0, 0.0)), Some(CursorKind::Hand));
    }

    #[test]
    fn probe_failure_degrades_to_normal() {
        let probe = ScriptedCursorProbe::default();
        let mut classifier = CursorClassifier::new(Box::new(probe));
        // Nothing scripted: no fingerprint, no element. Stays normal, and
        // staying normal is not a change event.
        assert_eq!(classifier.poll(true, (10.0, 10.0)), None);
        assert_eq!(classifier.current(), CursorKind::Normal);
    }

    #[test]
    fn disabled_poll_forces_normal_and_emits_the_edge() {
        let probe = ScriptedCursorProbe::with_references(ReferenceFingerprints {
            hand: Some(vec![7]),
            ..Default::default()
        });
        probe.set_fingerprint(Some(vec![7]));
        let mut classifier = CursorClassifier::new(Box::new(probe));

        assert_eq!(classifier.poll(true, (0.0, 0.0)), Some(CursorKind::Hand));
        assert_eq!(classifier.poll(false, (0.0, 0.0)), Some(CursorKind::Normal));
        assert_eq!(classifier.poll(false, (0.0, 0.0)), None);
    }
}
