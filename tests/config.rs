use overlay_mirror::hotkey::Key;
use overlay_mirror::MirrorConfig;
use tempfile::tempdir;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempdir().unwrap();
    let cfg = MirrorConfig::load(dir.path().join("nope.json")).unwrap();
    assert_eq!(cfg.app_id, 0);
    assert_eq!(cfg.warp_suppression_ms, 500);
    assert!(cfg.overlay_hotkey.is_none());
    assert!(!cfg.debug_logging);
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mirror.json");

    let cfg = MirrorConfig {
        app_id: 440,
        overlay_hotkey: Some("Ctrl+F10".into()),
        warp_suppression_ms: 750,
        debug_logging: true,
    };
    cfg.save(&path).unwrap();

    let loaded = MirrorConfig::load(&path).unwrap();
    assert_eq!(loaded.app_id, 440);
    assert_eq!(loaded.overlay_hotkey.as_deref(), Some("Ctrl+F10"));
    assert_eq!(loaded.warp_suppression_ms, 750);
    assert!(loaded.debug_logging);
}

#[test]
fn malformed_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mirror.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(MirrorConfig::load(&path).is_err());
}

#[test]
fn partial_file_fills_in_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mirror.json");
    std::fs::write(&path, r#"{"overlay_hotkey": "F5"}"#).unwrap();

    let cfg = MirrorConfig::load(&path).unwrap();
    assert_eq!(cfg.warp_suppression_ms, 500);
    assert_eq!(cfg.reserved_hotkey().key, Key::F5);
}

#[test]
fn bad_hotkey_falls_back_to_default() {
    let cfg = MirrorConfig {
        overlay_hotkey: Some("Hyper+Q".into()),
        ..MirrorConfig::default()
    };
    assert_eq!(cfg.reserved_hotkey().key, Key::Tab);
    assert!(cfg.reserved_hotkey().shift);
}
