use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys a reserved overlay hotkey may be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Tab,
    Space,
    Enter,
    Escape,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl Key {
    /// X11 keysym for this key (`XK_*` constants).
    pub fn x11_keysym(self) -> u32 {
        match self {
            Key::Tab => 0xff09,
            Key::Space => 0x0020,
            Key::Enter => 0xff0d,
            Key::Escape => 0xff1b,
            Key::F1 => 0xffbe,
            Key::F2 => 0xffbf,
            Key::F3 => 0xffc0,
            Key::F4 => 0xffc1,
            Key::F5 => 0xffc2,
            Key::F6 => 0xffc3,
            Key::F7 => 0xffc4,
            Key::F8 => 0xffc5,
            Key::F9 => 0xffc6,
            Key::F10 => 0xffc7,
            Key::F11 => 0xffc8,
            Key::F12 => 0xffc9,
        }
    }

    pub fn from_x11_keysym(sym: u32) -> Option<Key> {
        match sym {
            0xff09 => Some(Key::Tab),
            0x0020 => Some(Key::Space),
            0xff0d => Some(Key::Enter),
            0xff1b => Some(Key::Escape),
            0xffbe => Some(Key::F1),
            0xffbf => Some(Key::F2),
            0xffc0 => Some(Key::F3),
            0xffc1 => Some(Key::F4),
            0xffc2 => Some(Key::F5),
            0xffc3 => Some(Key::F6),
            0xffc4 => Some(Key::F7),
            0xffc5 => Some(Key::F8),
            0xffc6 => Some(Key::F9),
            0xffc7 => Some(Key::F10),
            0xffc8 => Some(Key::F11),
            0xffc9 => Some(Key::F12),
            _ => None,
        }
    }

    /// Windows virtual-key code for this key.
    pub fn virtual_key(self) -> u32 {
        match self {
            Key::Tab => 0x09,
            Key::Space => 0x20,
            Key::Enter => 0x0D,
            Key::Escape => 0x1B,
            Key::F1 => 0x70,
            Key::F2 => 0x71,
            Key::F3 => 0x72,
            Key::F4 => 0x73,
            Key::F5 => 0x74,
            Key::F6 => 0x75,
            Key::F7 => 0x76,
            Key::F8 => 0x77,
            Key::F9 => 0x78,
            Key::F10 => 0x79,
            Key::F11 => 0x7A,
            Key::F12 => 0x7B,
        }
    }

    pub fn from_virtual_key(vk: u32) -> Option<Key> {
        match vk {
            0x09 => Some(Key::Tab),
            0x20 => Some(Key::Space),
            0x0D => Some(Key::Enter),
            0x1B => Some(Key::Escape),
            0x70 => Some(Key::F1),
            0x71 => Some(Key::F2),
            0x72 => Some(Key::F3),
            0x73 => Some(Key::F4),
            0x74 => Some(Key::F5),
            0x75 => Some(Key::F6),
            0x76 => Some(Key::F7),
            0x77 => Some(Key::F8),
            0x78 => Some(Key::F9),
            0x79 => Some(Key::F10),
            0x7A => Some(Key::F11),
            0x7B => Some(Key::F12),
            _ => None,
        }
    }

    /// macOS virtual keycode (kVK_*).
    pub fn mac_keycode(self) -> u16 {
        match self {
            Key::Tab => 0x30,
            Key::Space => 0x31,
            Key::Enter => 0x24,
            Key::Escape => 0x35,
            Key::F1 => 0x7A,
            Key::F2 => 0x78,
            Key::F3 => 0x63,
            Key::F4 => 0x76,
            Key::F5 => 0x60,
            Key::F6 => 0x61,
            Key::F7 => 0x62,
            Key::F8 => 0x64,
            Key::F9 => 0x65,
            Key::F10 => 0x6D,
            Key::F11 => 0x67,
            Key::F12 => 0x6F,
        }
    }

    pub fn from_mac_keycode(code: u16) -> Option<Key> {
        match code {
            0x30 => Some(Key::Tab),
            0x31 => Some(Key::Space),
            0x24 => Some(Key::Enter),
            0x35 => Some(Key::Escape),
            0x7A => Some(Key::F1),
            0x78 => Some(Key::F2),
            0x63 => Some(Key::F3),
            0x76 => Some(Key::F4),
            0x60 => Some(Key::F5),
            0x61 => Some(Key::F6),
            0x62 => Some(Key::F7),
            0x64 => Some(Key::F8),
            0x65 => Some(Key::F9),
            0x6D => Some(Key::F10),
            0x67 => Some(Key::F11),
            0x6F => Some(Key::F12),
            _ => None,
        }
    }
}

/// The one key combination that is never forwarded to the host window.
///
/// It has to land in the mirror window's own focus context so the injected
/// hook's key watcher can see it and open its overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotkey {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Default for Hotkey {
    fn default() -> Self {
        // The injection mechanism's stock overlay binding.
        Self {
            key: Key::Tab,
            ctrl: false,
            shift: true,
            alt: false,
        }
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        write!(f, "{:?}", self.key)
    }
}

impl Hotkey {
    /// Whether a key press with the given modifier state matches this chord.
    pub fn matches(&self, key: Key, ctrl: bool, shift: bool, alt: bool) -> bool {
        key == self.key && ctrl == self.ctrl && shift == self.shift && alt == self.alt
    }
}

/// Parse a hotkey string like "Shift+Tab" or "Ctrl+F10" into a [`Hotkey`].
pub fn parse_hotkey(s: &str) -> Option<Hotkey> {
    let mut ctrl = false;
    let mut shift = false;
    let mut alt = false;
    let mut key: Option<Key> = None;

    for part in s.split('+') {
        let upper = part.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CTRL" | "CONTROL" => ctrl = true,
            "SHIFT" => shift = true,
            "ALT" => alt = true,
            "" => {}
            _ => {
                if let Some(k) = parse_key(&upper) {
                    key = Some(k);
                } else {
                    return None;
                }
            }
        }
    }

    key.map(|k| Hotkey {
        key: k,
        ctrl,
        shift,
        alt,
    })
}

fn parse_key(upper: &str) -> Option<Key> {
    match upper {
        "TAB" => Some(Key::Tab),
        "SPACE" => Some(Key::Space),
        "ENTER" | "RETURN" => Some(Key::Enter),
        "ESC" | "ESCAPE" => Some(Key::Escape),
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
        _ => None,
    }
}
