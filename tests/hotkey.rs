use overlay_mirror::hotkey::{parse_hotkey, Hotkey, Key};

#[test]
fn parse_simple_f_key() {
    let hk = parse_hotkey("F2").expect("should parse F2");
    assert_eq!(hk.key, Key::F2);
    assert!(!hk.ctrl && !hk.shift && !hk.alt);
}

#[test]
fn parse_combo_hotkey() {
    let hk = parse_hotkey("Ctrl+Shift+Space").expect("should parse combination");
    assert_eq!(hk.key, Key::Space);
    assert!(hk.ctrl && hk.shift && !hk.alt);
}

#[test]
fn parse_invalid_hotkey() {
    assert!(parse_hotkey("Ctrl+Foo").is_none());
    assert!(parse_hotkey("Ctrl+Shift").is_none());
}

#[test]
fn parse_is_case_insensitive() {
    let hk = parse_hotkey("shift+tab").expect("should parse lowercase");
    assert_eq!(hk, Hotkey::default());
}

#[test]
fn default_is_shift_tab() {
    let hk = Hotkey::default();
    assert_eq!(hk.key, Key::Tab);
    assert!(hk.shift && !hk.ctrl && !hk.alt);
    assert_eq!(hk.to_string(), "Shift+Tab");
}

#[test]
fn matches_requires_exact_modifiers() {
    let hk = Hotkey::default();
    assert!(hk.matches(Key::Tab, false, true, false));
    assert!(!hk.matches(Key::Tab, false, false, false));
    assert!(!hk.matches(Key::Tab, true, true, false));
    assert!(!hk.matches(Key::Space, false, true, false));
}

#[test]
fn keysym_round_trip() {
    for key in [Key::Tab, Key::Space, Key::Enter, Key::Escape, Key::F1, Key::F12] {
        assert_eq!(Key::from_x11_keysym(key.x11_keysym()), Some(key));
        assert_eq!(Key::from_virtual_key(key.virtual_key()), Some(key));
        assert_eq!(Key::from_mac_keycode(key.mac_keycode()), Some(key));
    }
    assert_eq!(Key::from_x11_keysym(0xdead), None);
    assert_eq!(Key::from_virtual_key(0x41), None);
}
