//! Settings files for stylepress.
//!
//! Settings live in `stylepress.toml` files under a `[compile]` table. A
//! document is governed by the nearest `stylepress.toml` found walking up from
//! its directory (the workspace file), layered over the global file at
//! `~/.stylepress/stylepress.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StylepressError};
use crate::options::{CompileOptions, OutputPath, SourceMapSetting};

/// Settings file name, both globally and per workspace.
pub const SETTINGS_FILE_NAME: &str = "stylepress.toml";

/// Global config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".stylepress";

// ---------------------------------------------------------------------------
// Settings file schema
// ---------------------------------------------------------------------------

/// Top-level settings file, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    /// The `[compile]` namespace.
    #[serde(default)]
    pub compile: CompileOptions,
}

/// Settings that apply to one document.
#[derive(Debug, Clone, Default)]
pub struct ScopedSettings {
    /// Global options overlaid with the workspace options.
    pub options: CompileOptions,
    /// Directory holding the workspace settings file, if one was found.
    pub workspace_root: Option<PathBuf>,
}

/// Key-value settings lookup scoped by document location.
pub trait SettingsStore: Send + Sync {
    /// Settings for the document at `document`, or `None` when nothing is
    /// configured. Never fails: unreadable settings count as absent.
    fn lookup(&self, document: &Path) -> Option<ScopedSettings>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Reads the global settings file and the nearest workspace settings file.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    global_path: Option<PathBuf>,
}

impl FileSettingsStore {
    /// Store using the default global file location.
    pub fn new() -> Self {
        Self {
            global_path: global_settings_path().ok(),
        }
    }

    /// Store with an explicit global file (or none).
    pub fn with_global_path(global_path: Option<PathBuf>) -> Self {
        Self { global_path }
    }
}

impl Default for FileSettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for FileSettingsStore {
    fn lookup(&self, document: &Path) -> Option<ScopedSettings> {
        let global = self
            .global_path
            .as_deref()
            .filter(|p| p.is_file())
            .and_then(load_or_warn);

        let workspace_file = document.parent().and_then(find_workspace_settings);
        let workspace = workspace_file.as_deref().and_then(load_or_warn);

        if global.is_none() && workspace_file.is_none() {
            return None;
        }

        let options = global
            .map(|s| s.compile)
            .unwrap_or_default()
            .merge(workspace.map(|s| s.compile).unwrap_or_default());

        Some(ScopedSettings {
            options,
            workspace_root: workspace_file
                .as_deref()
                .and_then(Path::parent)
                .map(Path::to_path_buf),
        })
    }
}

fn load_or_warn(path: &Path) -> Option<SettingsFile> {
    match load_settings_from(path) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(?path, error = %e, "ignoring unreadable settings file");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Get the path to the global config directory (`~/.stylepress/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| StylepressError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the global settings file (`~/.stylepress/stylepress.toml`).
pub fn global_settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(SETTINGS_FILE_NAME))
}

/// Find the nearest `stylepress.toml` in `start` or any of its ancestors.
pub fn find_workspace_settings(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(SETTINGS_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Load a settings file from a specific path.
pub fn load_settings_from(path: &Path) -> Result<SettingsFile> {
    let content = std::fs::read_to_string(path).map_err(|e| StylepressError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        StylepressError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Settings written by [`init_config`].
pub fn default_settings() -> SettingsFile {
    SettingsFile {
        compile: CompileOptions {
            output_path: Some(OutputPath::SameDirectory),
            output_extension: Some(".css".into()),
            same_base_with_css_folder: Some(false),
            keep_folder_structure: Some(false),
            source_map: Some(SourceMapSetting::Flag(false)),
            ..Default::default()
        },
    }
}

/// Create the global config directory and write a default settings file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| StylepressError::io(&dir, e))?;

    let path = dir.join(SETTINGS_FILE_NAME);
    let content = toml::to_string_pretty(&default_settings())
        .map_err(|e| StylepressError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| StylepressError::io(&path, e))?;
    tracing::info!(?path, "created default settings file");

    Ok(path)
}
