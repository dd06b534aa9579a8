// Configuration loading

use std::ffi::OsString;
use std::path::PathBuf;

pub mod history;
pub mod settings;

pub use history::{History, HistoryEntry};
pub use settings::Settings;

/// Environment variable that replaces the whole stockcheck config directory.
pub const CONFIG_DIR_ENV: &str = "STOCKCHECK_CONFIG_DIR";

/// Root of all stockcheck state: `$STOCKCHECK_CONFIG_DIR`, or
/// `<platform config dir>/stockcheck`.
pub fn config_dir() -> Option<PathBuf> {
    resolve_config_dir(std::env::var_os(CONFIG_DIR_ENV))
}

fn resolve_config_dir(override_dir: Option<OsString>) -> Option<PathBuf> {
    match override_dir {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|c| c.join("stockcheck")),
    }
}
