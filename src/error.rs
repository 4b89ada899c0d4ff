use thiserror::Error;

/// Errors surfaced by the mirror window.
///
/// Most failure paths deliberately never reach the caller: a destroyed
/// window turns operations into no-ops and a dropped frame only logs. The
/// variants exist so the surface backends and the compositor agree on what
/// went wrong.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// Window, context or surface creation failed. Fatal to that create
    /// call; partially created platform resources are released first.
    #[error("platform initialisation failed: {0}")]
    PlatformInit(String),

    /// The rendering context could not be made current. The frame is
    /// skipped; the next render call retries.
    #[error("could not bind rendering context: {0}")]
    ContextBind(String),

    /// Operation on a window that has already been destroyed.
    #[error("window already destroyed")]
    InvalidState,

    /// Pixel buffer shorter than the declared `width * height * 4`.
    #[error("frame buffer too small: expected {expected} bytes, got {got}")]
    BadFrame { expected: usize, got: usize },
}
