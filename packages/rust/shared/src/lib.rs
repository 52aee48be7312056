//! Shared types, error model, and configuration for stylepress.
//!
//! This crate is the foundation depended on by all other stylepress crates.
//! It provides:
//! - [`StylepressError`] and [`CompileError`] — the error types
//! - The option model ([`CompileOptions`] and its value types)
//! - Domain types ([`SourceDocument`], [`Diagnostic`], [`Range`])
//! - Settings files and the [`SettingsStore`] lookup

pub mod config;
pub mod error;
pub mod options;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    FileSettingsStore, SETTINGS_FILE_NAME, ScopedSettings, SettingsFile, SettingsStore,
    config_dir, default_settings, find_workspace_settings, global_settings_path, init_config,
    load_settings_from,
};
pub use error::{CompileError, Result, StylepressError, fs_error_code};
pub use options::{
    Autoprefixer, CompileOptions, DEFAULT_EXTENSION, LESS_EXTENSION, OutputPath, RootFileInfo,
    SCSS_EXTENSION, SOURCE_EXTENSIONS,
    SourceMapConfig, SourceMapSetting,
};
pub use types::{Diagnostic, RANGE_EOL, Range, SourceDocument};
