use overlay_mirror::logging;
use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn init_sets_debug_flag() {
    logging::init(true, None);
    assert!(logging::debug_enabled());

    logging::set_debug(false);
    assert!(!logging::debug_enabled());
}

#[test]
#[serial]
fn reinit_does_not_panic() {
    logging::init(false, None);
    logging::init(true, None);
}

#[test]
#[serial]
fn file_logging_init_is_safe() {
    // Only the first init in the process installs a subscriber; this must
    // stay a no-op rather than a panic either way.
    let dir = tempdir().unwrap();
    logging::init(false, Some(dir.path().join("mirror.log")));
    tracing::info!("mirror log smoke test");
}
