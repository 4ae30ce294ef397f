//! XDG config locations.

use std::path::PathBuf;

/// File name of the per-workspace config.
pub const WORKSPACE_CONFIG_FILE: &str = "agentbook.toml";

/// `$XDG_CONFIG_HOME`, falling back to `$HOME/.config`.
pub fn config_home() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(xdg));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
}

/// `$XDG_CONFIG_HOME/agentbook/config.toml`
pub fn global_config_path() -> Option<PathBuf> {
    config_home().map(|home| home.join("agentbook").join("config.toml"))
}
