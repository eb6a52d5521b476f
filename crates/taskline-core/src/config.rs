use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TasklineConfig {
    /// Task data file, relative to the directory holding the config file.
    pub data_file: Option<String>,
    /// Priority applied to new tasks created without an explicit one.
    pub default_priority: Option<String>,
}

pub fn config_filename_candidates() -> [&'static str; 2] {
    [".taskline.toml", ".tasklinerc"]
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(".taskline.toml")
}

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    if let Ok(profile) = std::env::var("USERPROFILE") {
        let trimmed = profile.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    None
}

pub fn resolve_taskline_home_dir() -> Option<PathBuf> {
    if let Ok(value) = std::env::var("TASKLINE_HOME") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    resolve_user_home_dir().map(|home| home.join(".taskline"))
}

pub fn global_config_path() -> Option<PathBuf> {
    resolve_taskline_home_dir().map(|home| home.join("config.toml"))
}

pub fn find_config_root(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    for candidate in start.ancestors() {
        for name in config_filename_candidates() {
            if candidate.join(name).is_file() {
                return Some(candidate.to_path_buf());
            }
        }
    }
    None
}

pub fn load_config(root: &Path) -> Option<TasklineConfig> {
    for name in config_filename_candidates() {
        let path = root.join(name);
        if path.is_file() {
            if let Ok(text) = fs::read_to_string(&path) {
                if let Ok(config) = toml::from_str::<TasklineConfig>(&text) {
                    return Some(config);
                }
            }
        }
    }
    None
}

pub fn load_global_config() -> Option<TasklineConfig> {
    let path = global_config_path()?;
    if !path.is_file() {
        return None;
    }
    let text = fs::read_to_string(path).ok()?;
    toml::from_str::<TasklineConfig>(&text).ok()
}

pub fn write_config(root: &Path, config: &TasklineConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path(root);
    let body = toml::to_string_pretty(config)?;
    fs::write(&path, body)?;
    Ok(path)
}

/// Resolves the task data file: project config, then global config, then
/// `<taskline-home>/tasks.json`, then `tasks.json` beside the start
/// directory.
pub fn resolve_data_file(start: &Path) -> PathBuf {
    if let Some(root) = find_config_root(start) {
        if let Some(data_file) = load_config(&root).and_then(|config| config.data_file) {
            let path = PathBuf::from(&data_file);
            return if path.is_absolute() { path } else { root.join(path) };
        }
    }
    if let Some(data_file) = load_global_config().and_then(|config| config.data_file) {
        return PathBuf::from(data_file);
    }
    resolve_taskline_home_dir()
        .map(|home| home.join("tasks.json"))
        .unwrap_or_else(|| start.join("tasks.json"))
}

pub fn resolve_default_priority_with_source(start: &Path) -> (Option<String>, &'static str) {
    if let Some(root) = find_config_root(start) {
        if let Some(value) = load_config(&root).and_then(|config| config.default_priority) {
            return (Some(value), "project");
        }
    }
    if let Some(value) = load_global_config().and_then(|config| config.default_priority) {
        return (Some(value), "global");
    }
    (None, "default")
}

pub fn resolve_default_priority(start: &Path) -> Option<String> {
    resolve_default_priority_with_source(start).0
}
