use crate::overlay::surface::{SurfaceBackend, SurfaceBackendFactory};

/// Platform surface factory: layered GDI windows on Windows, a noop
/// presentation elsewhere.
#[derive(Debug, Default)]
pub struct DefaultSurfaceBackendFactory;

impl SurfaceBackendFactory for DefaultSurfaceBackendFactory {
    #[cfg(windows)]
    fn create(&self) -> Box<dyn SurfaceBackend> {
        Box::new(platform::GdiSurfaceBackend::default())
    }

    #[cfg(not(windows))]
    fn create(&self) -> Box<dyn SurfaceBackend> {
        Box::new(crate::overlay::surface::NoopSurfaceBackend)
    }
}

#[cfg(windows)]
mod platform {
    use crate::color::Color;
    use crate::display::DisplayRect;
    use crate::overlay::surface::{SurfaceBackend, SurfaceBuffer, SurfaceState};
    use crate::shape::{Path, Point};
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    const REPAINT_TIMER_ID: usize = 1;
    const REPAINT_CADENCE_MS: u32 = 16;
    const CURVE_STEPS: usize = 8;

    struct PaintState {
        buffer: Arc<SurfaceBuffer>,
        last_painted_version: AtomicU64,
    }

    /// One borderless, click-through, always-on-top layered window covering a
    /// single display. A dedicated thread owns the window and repaints on a
    /// 16 ms timer whenever the snapshot version moved or an animation is in
    /// flight. Color-key transparency: the key (black) background is
    /// invisible, and reduced opacity is approximated by dimming stroke
    /// colors toward the key.
    #[derive(Default)]
    pub struct GdiSurfaceBackend {
        state: Option<Arc<PaintState>>,
        hwnd: Arc<Mutex<Option<isize>>>,
        thread: Option<std::thread::JoinHandle<()>>,
    }

    impl SurfaceBackend for GdiSurfaceBackend {
        fn open(&mut self, rect: DisplayRect, buffer: Arc<SurfaceBuffer>) -> anyhow::Result<()> {
            if self.thread.is_some() {
                return Err(anyhow!("surface backend already open"));
            }
            let state = Arc::new(PaintState {
                buffer,
                last_painted_version: AtomicU64::new(u64::MAX),
            });
            self.state = Some(Arc::clone(&state));
            let hwnd_store = Arc::clone(&self.hwnd);
            let handle = std::thread::Builder::new()
                .name("overlay-surface".to_string())
                .spawn(move || window_thread(rect, state, hwnd_store))?;
            self.thread = Some(handle);
            Ok(())
        }

        fn close(&mut self) {
            use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
            use windows::Win32::UI::WindowsAndMessaging::{PostMessageW, WM_CLOSE};

            if let Ok(store) = self.hwnd.lock() {
                if let Some(hwnd) = *store {
                    unsafe {
                        let _ = PostMessageW(
                            HWND(hwnd as *mut _),
                            WM_CLOSE,
                            WPARAM(0),
                            LPARAM(0),
                        );
                    }
                }
            }
            if let Some(handle) = self.thread.take() {
                let _ = handle.join();
            }
            if let Ok(mut store) = self.hwnd.lock() {
                *store = None;
            }
            self.state = None;
        }
    }

    impl Drop for GdiSurfaceBackend {
        fn drop(&mut self) {
            self.close();
        }
    }

    fn window_thread(rect: DisplayRect, state: Arc<PaintState>, hwnd_store: Arc<Mutex<Option<isize>>>) {
        use windows::core::w;
        use windows::Win32::Foundation::{COLORREF, HWND};
        use windows::Win32::System::LibraryLoader::GetModuleHandleW;
        use windows::Win32::UI::WindowsAndMessaging::{
            CreateWindowExW, DispatchMessageW, GetMessageW, RegisterClassW,
            SetLayeredWindowAttributes, SetTimer, SetWindowLongPtrW, SetWindowPos, ShowWindow,
            TranslateMessage, CS_HREDRAW, CS_VREDRAW, GWLP_USERDATA, HMENU, HWND_TOPMOST,
            LWA_COLORKEY, MSG, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SW_SHOW, WNDCLASSW,
            WS_EX_LAYERED, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT,
            WS_POPUP,
        };

        unsafe {
            let class_name = w!("CursorHaloOverlaySurface");
            let hinstance = GetModuleHandleW(None).unwrap_or_default();
            let wc = WNDCLASSW {
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(wndproc),
                hInstance: hinstance.into(),
                lpszClassName: class_name,
                ..Default::default()
            };
            // Registration fails harmlessly after the first surface.
            let _ = RegisterClassW(&wc);

            let hwnd = CreateWindowExW(
                WS_EX_LAYERED
                    | WS_EX_TRANSPARENT
                    | WS_EX_TOPMOST
                    | WS_EX_TOOLWINDOW
                    | WS_EX_NOACTIVATE,
                class_name,
                windows::core::PCWSTR::null(),
                WS_POPUP,
                rect.x,
                rect.y,
                rect.width,
                rect.height,
                None,
                HMENU::default(),
                hinstance,
                None,
            )
            .ok();

            let Some(hwnd) = hwnd else {
                tracing::error!(?rect, "failed to create overlay window");
                return;
            };
            if hwnd.0.is_null() {
                tracing::error!(?rect, "overlay window handle is null");
                return;
            }

            SetWindowLongPtrW(hwnd, GWLP_USERDATA, &*state as *const PaintState as isize);
            let _ = SetLayeredWindowAttributes(hwnd, COLORREF(0), 0, LWA_COLORKEY);
            let _ = ShowWindow(hwnd, SW_SHOW);
            let _ = SetWindowPos(
                hwnd,
                HWND_TOPMOST,
                0,
                0,
                0,
                0,
                SWP_NOACTIVATE | SWP_NOMOVE | SWP_NOSIZE,
            );
            let _ = SetTimer(hwnd, REPAINT_TIMER_ID, REPAINT_CADENCE_MS, None);
            if let Ok(mut store) = hwnd_store.lock() {
                *store = Some(hwnd.0 as isize);
            }

            let mut msg = MSG::default();
            while GetMessageW(&mut msg, HWND(std::ptr::null_mut()), 0, 0).into() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }

    unsafe extern "system" fn wndproc(
        hwnd: windows::Win32::Foundation::HWND,
        msg: u32,
        wparam: windows::Win32::Foundation::WPARAM,
        lparam: windows::Win32::Foundation::LPARAM,
    ) -> windows::Win32::Foundation::LRESULT {
        use windows::Win32::Foundation::LRESULT;
        use windows::Win32::Graphics::Gdi::{RedrawWindow, RDW_INVALIDATE};
        use windows::Win32::UI::WindowsAndMessaging::{
            DefWindowProcW, GetWindowLongPtrW, KillTimer, PostQuitMessage, GWLP_USERDATA,
            WM_DESTROY, WM_PAINT, WM_TIMER,
        };

        let state_ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA);
        if state_ptr != 0 {
            let state = &*(state_ptr as *const PaintState);
            match msg {
                WM_TIMER => {
                    let version = state.buffer.version();
                    let dirty = version != state.last_painted_version.load(Ordering::Relaxed);
                    let animating = state
                        .buffer
                        .snapshot()
                        .map(|s| s.is_animating(Instant::now()))
                        .unwrap_or(false);
                    if dirty || animating {
                        state.last_painted_version.store(version, Ordering::Relaxed);
                        let _ = RedrawWindow(hwnd, None, None, RDW_INVALIDATE);
                    }
                    return LRESULT(0);
                }
                WM_PAINT => {
                    paint(hwnd, state);
                    return LRESULT(0);
                }
                _ => {}
            }
        }
        if msg == WM_DESTROY {
            let _ = KillTimer(hwnd, REPAINT_TIMER_ID);
            PostQuitMessage(0);
        }
        // WM_CLOSE falls through here and destroys the window.
        DefWindowProcW(hwnd, msg, wparam, lparam)
    }

    unsafe fn paint(hwnd: windows::Win32::Foundation::HWND, state: &PaintState) {
        use windows::Win32::Foundation::RECT;
        use windows::Win32::Graphics::Gdi::{
            BeginPaint, EndPaint, FillRect, GetStockObject, BLACK_BRUSH, HBRUSH, PAINTSTRUCT,
        };

        let mut ps = PAINTSTRUCT::default();
        let hdc = BeginPaint(hwnd, &mut ps);
        let mut rect = RECT::default();
        rect.right = ps.rcPaint.right;
        rect.bottom = ps.rcPaint.bottom;
        // Key color background: fully transparent on screen.
        FillRect(hdc, &rect, HBRUSH(GetStockObject(BLACK_BRUSH).0));

        if let Some(snapshot) = state.buffer.snapshot() {
            draw_snapshot(hdc, &snapshot);
        }
        let _ = EndPaint(hwnd, &ps);
    }

    fn draw_snapshot(hdc: windows::Win32::Graphics::Gdi::HDC, snapshot: &SurfaceState) {
        if !snapshot.visible || !snapshot.active {
            return;
        }
        let now = Instant::now();
        let opacity = snapshot.fade.value_at(now);
        let style = snapshot.style;
        let position = snapshot.position;
        let press_scale = snapshot
            .press
            .map(|p| p.scale_at(now))
            .unwrap_or(1.0);

        if opacity > 0.01 {
            // Back to front: wide glow, tight glow, inner border, stroke.
            // Glows stroke the outline with wider pens so they read as a
            // line, never a filled blob.
            draw_outline(
                hdc,
                &snapshot.outline,
                position,
                press_scale,
                0.0,
                style.color.dimmed(style.outer_glow_opacity * opacity * 0.5),
                style.line_width + style.outer_glow_radius,
            );
            draw_outline(
                hdc,
                &snapshot.outline,
                position,
                press_scale,
                0.0,
                style.color.dimmed(style.inner_glow_opacity * opacity * 0.7),
                style.line_width + style.inner_glow_radius,
            );
            draw_outline(
                hdc,
                &snapshot.inner_outline,
                position,
                press_scale,
                0.0,
                style.color.dimmed(style.inner_alpha * opacity),
                style.inner_line_width,
            );
            draw_outline(
                hdc,
                &snapshot.outline,
                position,
                press_scale,
                0.0,
                style.color.dimmed(opacity),
                style.line_width,
            );
        }

        if let Some(frame) = snapshot.ripple.and_then(|r| r.frame_at(now)) {
            draw_outline(
                hdc,
                &snapshot.click_outline,
                position,
                frame.scale,
                frame.rotation_degrees,
                frame.color.dimmed(frame.opacity),
                style.click_line_width,
            );
        }
    }

    fn draw_outline(
        hdc: windows::Win32::Graphics::Gdi::HDC,
        path: &Path,
        position: (f32, f32),
        scale: f32,
        rotation_degrees: f32,
        color: Color,
        width: f32,
    ) {
        use windows::Win32::Foundation::COLORREF;
        use windows::Win32::Graphics::Gdi::{
            CreatePen, DeleteObject, LineTo, MoveToEx, SelectObject, PS_SOLID,
        };

        let points = path.flatten(CURVE_STEPS);
        if points.len() < 2 {
            return;
        }
        let (sin_r, cos_r) = rotation_degrees.to_radians().sin_cos();
        let transform = |p: &Point| -> (i32, i32) {
            let x = p.x * scale;
            let y = p.y * scale;
            let rx = x * cos_r - y * sin_r + position.0;
            let ry = x * sin_r + y * cos_r + position.1;
            (rx.round() as i32, ry.round() as i32)
        };

        let colorref =
            COLORREF((color.b as u32) << 16 | (color.g as u32) << 8 | color.r as u32);
        unsafe {
            let pen = CreatePen(PS_SOLID, (width.round() as i32).max(1), colorref);
            let old = SelectObject(hdc, pen);
            let first = transform(&points[0]);
            let _ = MoveToEx(hdc, first.0, first.1, None);
            for p in points.iter().skip(1) {
                let (x, y) = transform(p);
                let _ = LineTo(hdc, x, y);
            }
            SelectObject(hdc, old);
            let _ = DeleteObject(pen);
        }
    }
}
