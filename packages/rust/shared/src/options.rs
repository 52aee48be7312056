//! Compile option model.
//!
//! A [`CompileOptions`] value is one configuration *layer*: every field is
//! optional so that layers (built-in defaults, settings files, inline
//! directives) can be merged with [`CompileOptions::merge`]. The result of
//! merging all layers is the effective option set for one compile.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extension given to Less source documents.
pub const LESS_EXTENSION: &str = ".less";

/// Extension given to SCSS source documents.
pub const SCSS_EXTENSION: &str = ".scss";

/// Source extensions a host compiles without being told otherwise.
pub const SOURCE_EXTENSIONS: &[&str] = &[LESS_EXTENSION, SCSS_EXTENSION];

/// Extension used for artifacts when `outputExtension` is unset.
pub const DEFAULT_EXTENSION: &str = ".css";

// ---------------------------------------------------------------------------
// outputPath
// ---------------------------------------------------------------------------

/// The `outputPath` option.
///
/// In configuration this is either a boolean or a string: `false` disables
/// output, `true` writes next to the source, a string is a path template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOutputPath", into = "RawOutputPath")]
pub enum OutputPath {
    /// `false`: compile produces nothing.
    Disabled,
    /// `true`: same directory as the source, default file name.
    SameDirectory,
    /// A literal or templated path.
    Template(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawOutputPath {
    Flag(bool),
    Path(String),
}

impl From<RawOutputPath> for OutputPath {
    fn from(raw: RawOutputPath) -> Self {
        match raw {
            RawOutputPath::Flag(false) => Self::Disabled,
            RawOutputPath::Flag(true) => Self::SameDirectory,
            RawOutputPath::Path(path) => Self::Template(path),
        }
    }
}

impl From<OutputPath> for RawOutputPath {
    fn from(value: OutputPath) -> Self {
        match value {
            OutputPath::Disabled => Self::Flag(false),
            OutputPath::SameDirectory => Self::Flag(true),
            OutputPath::Template(path) => Self::Path(path),
        }
    }
}

// ---------------------------------------------------------------------------
// sourceMap
// ---------------------------------------------------------------------------

/// The `sourceMap` option: a flag or a detailed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceMapSetting {
    Flag(bool),
    Detailed(SourceMapConfig),
}

/// Detailed source map settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapConfig {
    /// Embed the source text in the map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_source_files: Option<bool>,
}

impl SourceMapSetting {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Flag(false))
    }

    /// Whether the map should embed the source text.
    pub fn output_source_files(&self) -> bool {
        match self {
            Self::Detailed(config) => config.output_source_files.unwrap_or(false),
            Self::Flag(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// autoprefixer
// ---------------------------------------------------------------------------

/// The `autoprefixer` option: a browser list as one string or a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Autoprefixer {
    List(Vec<String>),
    Single(String),
}

impl Autoprefixer {
    /// An empty string disables the plugin; any list enables it.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Single(s) => !s.is_empty(),
            Self::List(_) => true,
        }
    }

    /// Normalize to a list of browser targets.
    ///
    /// A single string is split on `,` and `;`. Every entry is trimmed.
    pub fn browsers(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.iter().map(|b| b.trim().to_string()).collect(),
            Self::Single(s) => s.split([',', ';']).map(|b| b.trim().to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// rootFileInfo
// ---------------------------------------------------------------------------

/// Describes the root document to the renderer so it can load it (and resolve
/// relative imports) from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootFileInfo {
    /// File name of the root document.
    pub filename: String,
    /// Directory holding the root document.
    pub current_directory: PathBuf,
    /// Directory with a trailing separator, used as the import base.
    pub entry_path: String,
    pub relative_urls: bool,
}

impl RootFileInfo {
    /// Derive the descriptor from a document path.
    pub fn from_path(path: &Path) -> Self {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            filename,
            entry_path: format!("{}/", dir.display()),
            current_directory: dir,
            relative_urls: false,
        }
    }

    /// Absolute path of the root document.
    pub fn path(&self) -> PathBuf {
        self.current_directory.join(&self.filename)
    }
}

// ---------------------------------------------------------------------------
// CompileOptions
// ---------------------------------------------------------------------------

/// One layer of compile options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<OutputPath>,

    /// Artifact extension; `""` means no extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_extension: Option<String>,

    /// Write into a `css/` folder next to the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_base_with_css_folder: Option<bool>,

    /// Mirror the folders below `less/` under a templated output path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_folder_structure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<SourceMapSetting>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoprefixer: Option<Autoprefixer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_urls: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_file_info: Option<RootFileInfo>,

    /// Everything else is passed through to the renderer untouched.
    #[serde(flatten)]
    pub renderer_options: BTreeMap<String, serde_json::Value>,
}

impl CompileOptions {
    /// Shallow merge: every key set in `higher` replaces the key in `self`.
    ///
    /// Nested values are never merged; a higher layer's table replaces the
    /// lower layer's table as a whole.
    pub fn merge(self, higher: CompileOptions) -> CompileOptions {
        let mut renderer_options = self.renderer_options;
        renderer_options.extend(higher.renderer_options);

        CompileOptions {
            output_path: higher.output_path.or(self.output_path),
            output_extension: higher.output_extension.or(self.output_extension),
            same_base_with_css_folder: higher
                .same_base_with_css_folder
                .or(self.same_base_with_css_folder),
            keep_folder_structure: higher.keep_folder_structure.or(self.keep_folder_structure),
            source_map: higher.source_map.or(self.source_map),
            autoprefixer: higher.autoprefixer.or(self.autoprefixer),
            relative_urls: higher.relative_urls.or(self.relative_urls),
            root_file_info: higher.root_file_info.or(self.root_file_info),
            renderer_options,
        }
    }

    pub fn is_output_disabled(&self) -> bool {
        matches!(self.output_path, Some(OutputPath::Disabled))
    }

    /// Whether `outputPath` is a path template (as opposed to a flag or unset).
    pub fn has_output_template(&self) -> bool {
        matches!(self.output_path, Some(OutputPath::Template(_)))
    }

    pub fn keep_folder_structure(&self) -> bool {
        self.keep_folder_structure.unwrap_or(false)
    }

    pub fn same_base_with_css_folder(&self) -> bool {
        self.same_base_with_css_folder.unwrap_or(false)
    }

    pub fn source_map_enabled(&self) -> bool {
        self.source_map.as_ref().is_some_and(SourceMapSetting::is_enabled)
    }

    /// Configured extension without its leading dot, for display.
    pub fn extension_label(&self) -> String {
        match self.output_extension.as_deref().map(|e| e.trim_start_matches('.')) {
            Some(ext) if !ext.is_empty() => ext.to_string(),
            _ => DEFAULT_EXTENSION.trim_start_matches('.').to_string(),
        }
    }
}
