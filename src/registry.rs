//! Opaque handle table for compositor windows.
//!
//! When the mirror is driven across an FFI-ish boundary the far side never
//! holds the window itself, only an integer handle into this table. Stale
//! handles resolve to nothing and every operation through them no-ops, so
//! lifetime mismatches across the boundary cannot dangle.

use crate::compositor::CompositorWindow;
use crate::config::MirrorConfig;
use crate::error::MirrorError;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use slab::Slab;
use std::sync::Arc;

static WINDOWS: Lazy<Mutex<Slab<Arc<CompositorWindow>>>> = Lazy::new(|| Mutex::new(Slab::new()));

/// Opaque handle to a registered [`CompositorWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MirrorHandle(pub u32);

/// Create a mirror window and register it, returning the handle the caller
/// passes back for all further operations.
pub fn create(
    width: u32,
    height: u32,
    title: &str,
    config: &MirrorConfig,
) -> Result<MirrorHandle, MirrorError> {
    let window = CompositorWindow::create(width, height, title, config)?;
    Ok(insert(Arc::new(window)))
}

/// Register an existing window (e.g. one built over a custom surface).
pub fn insert(window: Arc<CompositorWindow>) -> MirrorHandle {
    let key = WINDOWS.lock().insert(window);
    tracing::debug!(handle = key, "mirror window registered");
    MirrorHandle(key as u32)
}

/// Resolve a handle. Returns `None` for stale or never-issued handles.
pub fn get(handle: MirrorHandle) -> Option<Arc<CompositorWindow>> {
    WINDOWS.lock().get(handle.0 as usize).cloned()
}

/// Destroy the window behind `handle` and drop it from the table. Safe to
/// call with a stale handle; returns whether anything was removed.
pub fn remove(handle: MirrorHandle) -> bool {
    let window = {
        let mut table = WINDOWS.lock();
        if !table.contains(handle.0 as usize) {
            return false;
        }
        table.remove(handle.0 as usize)
    };
    window.destroy();
    true
}
