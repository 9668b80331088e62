pub mod proxy;

pub use proxy::*;

use std::path::PathBuf;

/// Returns the global config directory path: `~/.config/maskgate/`
pub fn dirs_global() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home).join(".config").join("maskgate")
}

/// Per-user runtime directory for the service socket.
pub fn runtime_dir() -> PathBuf {
    std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
