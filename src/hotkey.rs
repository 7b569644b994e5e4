use std::sync::{Arc, Mutex};

/// A global key combo, e.g. "Ctrl+Shift+H".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hotkey {
    /// Normalized key token: "A".."Z", "0".."9", "F1".."F12" or a named key.
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl std::fmt::Display for Hotkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        write!(f, "{}", self.key)
    }
}

/// Parse a combo string like "Ctrl+Shift+H" into a [`Hotkey`].
pub fn parse_hotkey(s: &str) -> Option<Hotkey> {
    let mut ctrl = false;
    let mut shift = false;
    let mut alt = false;
    let mut key: Option<String> = None;

    for part in s.split('+') {
        let upper = part.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CTRL" | "CONTROL" | "CMD" | "COMMAND" => ctrl = true,
            "SHIFT" => shift = true,
            "ALT" | "OPTION" => alt = true,
            "" => {}
            _ => {
                if is_valid_key_token(&upper) {
                    key = Some(upper);
                } else {
                    return None;
                }
            }
        }
    }

    key.map(|key| Hotkey {
        key,
        ctrl,
        shift,
        alt,
    })
}

fn is_valid_key_token(upper: &str) -> bool {
    match upper {
        "SPACE" | "TAB" | "ENTER" | "RETURN" | "ESC" | "ESCAPE" | "HOME" | "END" | "PAGEUP"
        | "PAGEDOWN" => true,
        _ if upper.len() == 1 => {
            let c = upper.chars().next().unwrap_or(' ');
            c.is_ascii_alphanumeric()
        }
        _ if upper.starts_with('F') => matches!(upper[1..].parse::<u8>(), Ok(1..=12)),
        _ => false,
    }
}

/// Shared signal raised by the global hotkey listener and polled by the
/// application loop: one toggle per combo press.
pub struct HotkeyTrigger {
    open: Arc<Mutex<bool>>,
    hotkey: Hotkey,
}

impl HotkeyTrigger {
    pub fn new(hotkey: Hotkey) -> Self {
        Self {
            open: Arc::new(Mutex::new(false)),
            hotkey,
        }
    }

    /// Consume a pending trigger, if any.
    pub fn take(&self) -> bool {
        match self.open.lock() {
            Ok(mut open) if *open => {
                *open = false;
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn raise(&self) {
        if let Ok(mut open) = self.open.lock() {
            *open = true;
        }
    }

    #[cfg(windows)]
    pub fn start_listener(&self) {
        use std::time::Duration;

        let open = Arc::clone(&self.open);
        let hotkey = self.hotkey.clone();
        let Some(watch) = key_from_token(&hotkey.key) else {
            tracing::warn!(key = %hotkey.key, "hotkey key is not mappable; listener not started");
            return;
        };
        tracing::debug!(hotkey = %hotkey, "starting hotkey listener");
        std::thread::spawn(move || loop {
            let open = Arc::clone(&open);
            let hotkey = hotkey.clone();
            let mut ctrl_pressed = false;
            let mut shift_pressed = false;
            let mut alt_pressed = false;
            let mut watch_pressed = false;
            let mut triggered = false;

            let result = rdev::listen(move |event| {
                use rdev::{EventType, Key};
                match event.event_type {
                    EventType::KeyPress(k) => {
                        match k {
                            Key::ControlLeft | Key::ControlRight => ctrl_pressed = true,
                            Key::ShiftLeft | Key::ShiftRight => shift_pressed = true,
                            Key::Alt | Key::AltGr => alt_pressed = true,
                            _ => {}
                        }
                        if k == watch {
                            watch_pressed = true;
                        }
                    }
                    EventType::KeyRelease(k) => {
                        match k {
                            Key::ControlLeft | Key::ControlRight => ctrl_pressed = false,
                            Key::ShiftLeft | Key::ShiftRight => shift_pressed = false,
                            Key::Alt | Key::AltGr => alt_pressed = false,
                            _ => {}
                        }
                        if k == watch {
                            watch_pressed = false;
                        }
                    }
                    _ => return,
                }

                let combo = watch_pressed
                    && (!hotkey.ctrl || ctrl_pressed)
                    && (!hotkey.shift || shift_pressed)
                    && (!hotkey.alt || alt_pressed);
                if combo {
                    if !triggered {
                        triggered = true;
                        if let Ok(mut flag) = open.lock() {
                            *flag = true;
                        }
                    }
                } else {
                    triggered = false;
                }
            });

            match result {
                Ok(()) => tracing::warn!("hotkey listener exited unexpectedly; restarting shortly"),
                Err(err) => tracing::warn!(?err, "hotkey listener failed; retrying shortly"),
            }
            std::thread::sleep(Duration::from_millis(500));
        });
    }

    #[cfg(not(windows))]
    pub fn start_listener(&self) {
        tracing::warn!(hotkey = %self.hotkey, "global hotkeys are not supported on this platform");
    }
}

#[cfg(windows)]
fn key_from_token(upper: &str) -> Option<rdev::Key> {
    use rdev::Key;
    match upper {
        "SPACE" => Some(Key::Space),
        "TAB" => Some(Key::Tab),
        "ENTER" | "RETURN" => Some(Key::Return),
        "ESC" | "ESCAPE" => Some(Key::Escape),
        "HOME" => Some(Key::Home),
        "END" => Some(Key::End),
        "PAGEUP" => Some(Key::PageUp),
        "PAGEDOWN" => Some(Key::PageDown),
        "F1" => Some(Key::F1),
        "F2" => Some(Key::F2),
        "F3" => Some(Key::F3),
        "F4" => Some(Key::F4),
        "F5" => Some(Key::F5),
        "F6" => Some(Key::F6),
        "F7" => Some(Key::F7),
        "F8" => Some(Key::F8),
        "F9" => Some(Key::F9),
        "F10" => Some(Key::F10),
        "F11" => Some(Key::F11),
        "F12" => Some(Key::F12),
        _ if upper.len() == 1 => {
            let c = upper.chars().next()?;
            match c {
                '0' => Some(Key::Num0),
                '1' => Some(Key::Num1),
                '2' => Some(Key::Num2),
                '3' => Some(Key::Num3),
                '4' => Some(Key::Num4),
                '5' => Some(Key::Num5),
                '6' => Some(Key::Num6),
                '7' => Some(Key::Num7),
                '8' => Some(Key::Num8),
                '9' => Some(Key::Num9),
                'A' => Some(Key::KeyA),
                'B' => Some(Key::KeyB),
                'C' => Some(Key::KeyC),
                'D' => Some(Key::KeyD),
                'E' => Some(Key::KeyE),
                'F' => Some(Key::KeyF),
                'G' => Some(Key::KeyG),
                'H' => Some(Key::KeyH),
                'I' => Some(Key::KeyI),
                'J' => Some(Key::KeyJ),
                'K' => Some(Key::KeyK),
                'L' => Some(Key::KeyL),
                'M' => Some(Key::KeyM),
                'N' => Some(Key::KeyN),
                'O' => Some(Key::KeyO),
                'P' => Some(Key::KeyP),
                'Q' => Some(Key::KeyQ),
                'R' => Some(Key::KeyR),
                'S' => Some(Key::KeyS),
                'T' => Some(Key::KeyT),
                'U' => Some(Key::KeyU),
                'V' => Some(Key::KeyV),
                'W' => Some(Key::KeyW),
                'X' => Some(Key::KeyX),
                'Y' => Some(Key::KeyY),
                'Z' => Some(Key::KeyZ),
                _ => None,
            }
        }
        _ => None,
    }
}
