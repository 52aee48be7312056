//! Effective option resolution.
//!
//! Three layers, lowest precedence first:
//! 1. built-in defaults derived from the document path
//! 2. settings from the [`SettingsStore`] (global, then workspace)
//! 3. inline directives on the document's first line
//!
//! Layers are merged shallowly with [`CompileOptions::merge`]. Resolution
//! never fails; conflicting flags produce [`ConfigWarning`]s.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use stylepress_shared::{CompileOptions, RootFileInfo, SettingsStore, SourceDocument};

use crate::directives;

/// Options resolved for one document.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    /// The effective option set.
    pub options: CompileOptions,
    /// Workspace folder used for `${workspaceFolder}` expansion.
    pub workspace_root: Option<PathBuf>,
    /// Advisory warnings about conflicting options.
    pub warnings: Vec<ConfigWarning>,
}

/// Non-fatal configuration problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Both folder flags set and `outputPath` is not a template.
    BothFoldersKeepStructureIgnored,
    /// Both folder flags set and `outputPath` is a template.
    BothFoldersSameBaseIgnored,
    /// `keepFolderStructure` set without a templated `outputPath`.
    KeepFolderStructureIgnored,
    /// `sameBaseWithCssFolder` set together with a templated `outputPath`.
    SameBaseWithCssFolderIgnored,
}

impl ConfigWarning {
    /// The option that will have no effect.
    pub fn ignored_option(&self) -> &'static str {
        match self {
            Self::BothFoldersKeepStructureIgnored | Self::KeepFolderStructureIgnored => {
                "keepFolderStructure"
            }
            Self::BothFoldersSameBaseIgnored | Self::SameBaseWithCssFolderIgnored => {
                "sameBaseWithCssFolder"
            }
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BothFoldersKeepStructureIgnored => f.write_str(
                "Both 'keepFolderStructure' and 'sameBaseWithCssFolder' are enabled. \
                 'outputPath' is NOT a string so 'keepFolderStructure' will be ignored.",
            ),
            Self::BothFoldersSameBaseIgnored => f.write_str(
                "Both 'keepFolderStructure' and 'sameBaseWithCssFolder' are enabled. \
                 'outputPath' is NOT true/null so 'sameBaseWithCssFolder' will be ignored.",
            ),
            Self::KeepFolderStructureIgnored => f.write_str(
                "'keepFolderStructure' is enabled but 'outputPath' is NOT a string. \
                 'keepFolderStructure' will be ignored.",
            ),
            Self::SameBaseWithCssFolderIgnored => f.write_str(
                "'sameBaseWithCssFolder' is enabled but 'outputPath' is NOT true/null. \
                 'sameBaseWithCssFolder' will be ignored.",
            ),
        }
    }
}

/// Built-in defaults for a document.
pub fn default_options(document_path: &Path) -> CompileOptions {
    CompileOptions {
        root_file_info: Some(RootFileInfo::from_path(document_path)),
        relative_urls: Some(false),
        ..Default::default()
    }
}

/// Defaults overlaid with the settings that apply to the document.
///
/// This is the option set a host hands to the compiler as its defaults.
pub fn global_options(
    document_path: &Path,
    store: &dyn SettingsStore,
) -> (CompileOptions, Option<PathBuf>) {
    let defaults = default_options(document_path);

    match store.lookup(document_path) {
        Some(scoped) => (defaults.merge(scoped.options), scoped.workspace_root),
        None => {
            debug!(path = %document_path.display(), "no settings found, using defaults");
            (defaults, None)
        }
    }
}

/// Apply the document's inline directives on top of `defaults`.
pub fn apply_directives(content: &str, defaults: CompileOptions) -> CompileOptions {
    defaults.merge(directives::parse(content))
}

/// Resolve all three layers for a document and check the result.
pub fn resolve(document: &SourceDocument, store: &dyn SettingsStore) -> ResolvedOptions {
    let (global, workspace_root) = global_options(&document.path, store);
    let options = apply_directives(&document.content, global);
    let warnings = check_options(&options);

    ResolvedOptions {
        options,
        workspace_root,
        warnings,
    }
}

/// Report options that will be ignored.
///
/// Advisory only: each warning is logged and returned, compilation proceeds.
pub fn check_options(options: &CompileOptions) -> Vec<ConfigWarning> {
    let keep = options.keep_folder_structure();
    let same_base = options.same_base_with_css_folder();
    let templated = options.has_output_template();

    let mut warnings = Vec::new();

    if keep && same_base {
        warnings.push(if templated {
            ConfigWarning::BothFoldersSameBaseIgnored
        } else {
            ConfigWarning::BothFoldersKeepStructureIgnored
        });
    } else {
        if keep && !templated {
            warnings.push(ConfigWarning::KeepFolderStructureIgnored);
        }
        if same_base && templated {
            warnings.push(ConfigWarning::SameBaseWithCssFolderIgnored);
        }
    }

    for warning in &warnings {
        warn!(ignored = warning.ignored_option(), "{warning}");
    }

    warnings
}
