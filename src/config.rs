use crate::hotkey::{parse_hotkey, Hotkey};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_suppression_ms() -> u64 {
    500
}

/// Configuration for the mirror window.
///
/// Usually loaded once at startup by the host launcher and passed to
/// [`crate::compositor::CompositorWindow::create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// External application identifier stamped onto the window so the
    /// injection mechanism can associate it with the right app. `0` leaves
    /// the window untagged.
    #[serde(default)]
    pub app_id: u32,
    /// Reserved overlay-activation hotkey, e.g. "Shift+Tab". Events matching
    /// it are never forwarded to the host window. `None` keeps the default.
    pub overlay_hotkey: Option<String>,
    /// How long pointer motion is swallowed after the overlay closes, in
    /// milliseconds. The hook warps the cursor back to its saved position
    /// when the overlay closes; this window hides that synthetic motion.
    /// Empirically tied to the hook's own timing, so treat it as a tunable
    /// rather than deriving it.
    #[serde(default = "default_suppression_ms")]
    pub warp_suppression_ms: u64,
    /// When enabled the logger is initialised at debug level.
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            app_id: 0,
            overlay_hotkey: None,
            warp_suppression_ms: default_suppression_ms(),
            debug_logging: false,
        }
    }
}

impl MirrorConfig {
    /// Load configuration from a JSON file. A missing file yields defaults;
    /// a malformed one is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg = serde_json::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), data)
            .with_context(|| format!("writing config {}", path.as_ref().display()))?;
        Ok(())
    }

    /// The reserved hotkey, falling back to the default chord when unset or
    /// unparsable.
    pub fn reserved_hotkey(&self) -> Hotkey {
        match &self.overlay_hotkey {
            Some(s) => match parse_hotkey(s) {
                Some(hk) => hk,
                None => {
                    tracing::warn!(hotkey = %s, "invalid overlay hotkey, using default");
                    Hotkey::default()
                }
            },
            None => Hotkey::default(),
        }
    }
}
