use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_SCOPE: &str = "main";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Inventory API
    /// Overrides the base URL saved at login.
    #[serde(rename = "inventory.apiBase")]
    pub api_base: Option<String>,

    /// Store/location used when a command gets no `--scope`.
    #[serde(rename = "inventory.defaultScope")]
    pub default_scope: String,

    // Stock check
    /// Keep every finalized report under `history/`.
    #[serde(rename = "check.keepHistory")]
    pub keep_history: bool,

    /// Where `check` writes report exports given as relative paths.
    #[serde(rename = "check.exportDir")]
    pub export_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: None,
            default_scope: DEFAULT_SCOPE.to_string(),
            keep_history: true,
            export_dir: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        crate::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults.
    /// Writes a commented default file on first run.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("error parsing {}: {}; using default settings", path.display(), e);
                        Self::default()
                    }
                }
            }
            Err(e) => {
                log::warn!("error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Scope to use when none was given on the command line.
    pub fn scope_or_default<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        match explicit.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => &self.default_scope,
        }
    }

    /// Resolve an export path against `check.exportDir`.
    pub fn export_path(&self, file: &Path) -> PathBuf {
        match &self.export_dir {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.to_path_buf(),
        }
    }

    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Inventory API (null = use the base saved by `stockcheck login`)
    "inventory.apiBase": null,
    "inventory.defaultScope": "main",

    // Stock check
    "check.keepHistory": true,
    "check.exportDir": null
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("error writing default settings: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.default_scope, "main");
        assert!(s.keep_history);
        assert!(s.api_base.is_none());
    }

    #[test]
    fn test_dotted_keys_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{
    // shop API
    "inventory.apiBase": "https://shop.test",
    "inventory.defaultScope": "downtown",
    "check.keepHistory": false
}"#).unwrap();

        let s = Settings::load_from(&path);
        assert_eq!(s.api_base.as_deref(), Some("https://shop.test"));
        assert_eq!(s.default_scope, "downtown");
        assert!(!s.keep_history);
        assert!(s.export_dir.is_none());
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ broken").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_export_dir_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "check.exportDir": "/srv/exports" }"#).unwrap();

        let s = Settings::load_from(&path);
        assert_eq!(s.export_dir, Some(PathBuf::from("/srv/exports")));
        assert_eq!(s.export_path(Path::new("missing.csv")), PathBuf::from("/srv/exports/missing.csv"));
    }

    #[test]
    fn test_default_file_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        Settings::default().create_default_file(&path);
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_scope_and_export_resolution() {
        let s = Settings { export_dir: Some(PathBuf::from("/exports")), ..Settings::default() };
        assert_eq!(s.scope_or_default(None), "main");
        assert_eq!(s.scope_or_default(Some("  ")), "main");
        assert_eq!(s.scope_or_default(Some("uptown")), "uptown");
        assert_eq!(s.export_path(Path::new("r.json")), PathBuf::from("/exports/r.json"));
        assert_eq!(s.export_path(Path::new("/tmp/r.json")), PathBuf::from("/tmp/r.json"));
    }
}
