//! Filesystem adapters for botgate.
//!
//! Data directory resolution plus the local avatar store.

pub mod asset;

use std::path::PathBuf;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `BOTGATE_DATA_DIR` environment variable
/// 2. `~/.botgate`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BOTGATE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".botgate");
    }

    // Last resort: current directory
    PathBuf::from(".botgate")
}
