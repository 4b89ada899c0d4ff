use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

static DEBUG: AtomicBool = AtomicBool::new(false);
static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Initialise logging. When `debug` is set the default level is `debug` and
/// the `RUST_LOG` environment variable may override it; otherwise the level
/// is pinned to `info` so a stray environment variable cannot make the
/// mirror spam the host's console.
///
/// When `log_file` is given, output additionally goes to that file through a
/// non-blocking appender.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    DEBUG.store(debug, Ordering::Relaxed);

    let level = if debug { "debug" } else { "info" };
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    if let Some(path) = log_file {
        let dir = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "overlay_mirror.log".to_string());
        let appender = tracing_appender::rolling::never(dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}

/// Whether verbose logging was requested at startup.
pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/// Flip the process-wide debug flag without re-initialising the subscriber.
pub fn set_debug(debug: bool) {
    DEBUG.store(debug, Ordering::Relaxed);
}
