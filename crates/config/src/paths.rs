//! Path utilities

use std::path::PathBuf;

/// Data directory (~/.pokeagent), or `.pokeagent` when no home is known
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".pokeagent"))
        .unwrap_or_else(|| PathBuf::from(".pokeagent"))
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Saved conversations
pub fn conversations_dir() -> PathBuf {
    data_dir().join("conversations")
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Replace characters that are unsafe in file names
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect()
}
