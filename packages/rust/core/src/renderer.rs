//! The renderer seam.
//!
//! A [`Renderer`] turns source text into CSS. The compiler builds a fresh
//! [`RendererOptions`] for every compile: the pass-through options from the
//! configuration, a source map configuration, and the plugin list.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use stylepress_shared::{CompileError, RootFileInfo};

/// Output of a successful render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    pub css: String,
    /// Source map JSON, when the renderer produced one.
    pub map: Option<String>,
}

/// Source map settings handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapOptions {
    /// Embed source text in the map.
    pub output_source_files: bool,
    /// Directory of the source document; source paths are made relative to it.
    pub base_path: PathBuf,
    /// Source directory relative to the artifact's directory.
    pub root_path: PathBuf,
    /// Where the compiler writes the map.
    pub map_destination: PathBuf,
}

/// In-memory documents the renderer must prefer over the filesystem.
///
/// The compiler registers the root document under its path so that imports
/// resolve against the (possibly preprocessed) text the compiler holds rather
/// than whatever is on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentResolver {
    documents: HashMap<PathBuf, String>,
    root: Option<PathBuf>,
}

impl DocumentResolver {
    /// Resolver serving `content` for the root document at `path`.
    pub fn for_root(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        let mut documents = HashMap::new();
        documents.insert(path.clone(), content.into());
        Self {
            documents,
            root: Some(path),
        }
    }

    /// Serve `content` for `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.documents.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.documents.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.documents.contains_key(path)
    }

    /// Path of the root document.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Directory imports of the root document resolve against.
    pub fn root_dir(&self) -> Option<&Path> {
        self.root.as_deref().and_then(Path::parent)
    }
}

/// A renderer plugin, in the order the renderer should apply them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererPlugin {
    /// Vendor-prefix injection for the given browser targets.
    Autoprefix { browsers: Vec<String> },
    /// Serve in-memory documents to the renderer's loader.
    DocumentResolver(DocumentResolver),
}

/// Everything a renderer receives besides the source text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RendererOptions {
    /// Present when the renderer may load the root document from disk.
    /// Cleared when preprocessors have rewritten the text.
    pub root_file_info: Option<RootFileInfo>,
    pub relative_urls: bool,
    pub source_map: Option<SourceMapOptions>,
    pub plugins: Vec<RendererPlugin>,
    /// Renderer-specific options passed through from configuration.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RendererOptions {
    /// The document resolver plugin, if registered.
    pub fn document_resolver(&self) -> Option<&DocumentResolver> {
        self.plugins.iter().find_map(|p| match p {
            RendererPlugin::DocumentResolver(resolver) => Some(resolver),
            RendererPlugin::Autoprefix { .. } => None,
        })
    }

    /// Browser targets of the autoprefix plugin, if registered.
    pub fn autoprefix_browsers(&self) -> Option<&[String]> {
        self.plugins.iter().find_map(|p| match p {
            RendererPlugin::Autoprefix { browsers } => Some(browsers.as_slice()),
            RendererPlugin::DocumentResolver(_) => None,
        })
    }

    /// A boolean pass-through option.
    pub fn flag(&self, key: &str) -> bool {
        self.extra
            .get(key)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

/// Turns stylesheet source into CSS.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Human-readable renderer name for tracing.
    fn name(&self) -> &str;

    /// Render `content`. Syntax errors should be reported as
    /// [`CompileError::Render`] with a 1-based line and a column.
    async fn render(
        &self,
        content: &str,
        options: &RendererOptions,
    ) -> Result<RenderOutput, CompileError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_serves_root_document() {
        let resolver = DocumentResolver::for_root("/proj/less/main.less", ".a{}");
        assert_eq!(resolver.get(Path::new("/proj/less/main.less")), Some(".a{}"));
        assert_eq!(resolver.root_dir(), Some(Path::new("/proj/less")));
        assert!(!resolver.contains(Path::new("/proj/less/other.less")));
    }

    #[test]
    fn plugin_lookup() {
        let options = RendererOptions {
            plugins: vec![
                RendererPlugin::Autoprefix {
                    browsers: vec!["ie 11".into()],
                },
                RendererPlugin::DocumentResolver(DocumentResolver::default()),
            ],
            ..Default::default()
        };
        assert_eq!(options.autoprefix_browsers(), Some(&["ie 11".to_string()][..]));
        assert!(options.document_resolver().is_some());
        assert!(!options.flag("compress"));
    }
}
