//! Default paths for oncall-sim
//!
//! The configuration file lives under the XDG config directory:
//! `$XDG_CONFIG_HOME/oncall-sim/config.toml` or `~/.config/oncall-sim/config.toml`.

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const ONCALL_CONFIG_ENV: &str = "ONCALL_CONFIG";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Application subdirectory name
const APP_DIR: &str = "oncall-sim";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$ONCALL_CONFIG` environment variable (if set)
/// 2. `$XDG_CONFIG_HOME/oncall-sim/config.toml` (if XDG_CONFIG_HOME is set)
/// 3. `~/.config/oncall-sim/config.toml` (fallback)
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(ONCALL_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    config_dir_without_env().join(CONFIG_FILENAME)
}

/// Get the config directory without checking the ONCALL_CONFIG env var.
pub fn config_dir_without_env() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_contains_app_name() {
        let path = config_dir_without_env();
        assert!(path.to_string_lossy().contains("oncall-sim"));
    }
}
