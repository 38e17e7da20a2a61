//! User settings: default launch parameters.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Settings file name inside the config directory.
const SETTINGS_FILE: &str = "terminal.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Parameters passed to the terminal when the command line supplies
    /// none. `%CWD%` inside a parameter expands to the target directory.
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// Config directory: platform config dir + `kterm`, falling back to
/// `~/.kterm` when the platform dir is unavailable.
pub fn config_dir() -> PathBuf {
    dirs::config_dir().map(|d| d.join("kterm")).unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".kterm")
    })
}

/// Load settings, returning defaults when the file is missing. A file that
/// exists but cannot be read or parsed is logged and ignored.
pub fn load_settings() -> Settings {
    load_from(&config_dir().join(SETTINGS_FILE))
}

pub(crate) fn load_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("[settings] could not read {}: {e}", path.display());
            return Settings::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("[settings] corrupt {}: {e}; using defaults", path.display());
            Settings::default()
        }
    }
}
