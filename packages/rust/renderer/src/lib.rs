//! Bundled renderer backed by the pure-Rust `grass` compiler.
//!
//! Imports are resolved through [`OverlayFs`], which serves the documents
//! registered with the document-resolution plugin before touching the disk.
//! That is how unsaved or preprocessed text reaches the compiler.

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use grass::{Options, OutputStyle};
use tracing::{debug, instrument, warn};

use stylepress_core::renderer::{DocumentResolver, RenderOutput, Renderer, RendererOptions};
use stylepress_shared::CompileError;

/// File name `grass` reports for text compiled from memory.
const STDIN_NAME: &str = "stdin";

// ---------------------------------------------------------------------------
// Overlay filesystem
// ---------------------------------------------------------------------------

/// `grass::Fs` serving in-memory documents first, then the local disk.
pub struct OverlayFs<'a> {
    documents: Option<&'a DocumentResolver>,
}

impl<'a> OverlayFs<'a> {
    pub fn new(documents: Option<&'a DocumentResolver>) -> Self {
        Self { documents }
    }

    fn in_memory(&self, path: &Path) -> Option<&'a str> {
        self.documents.and_then(|docs| docs.get(path))
    }
}

impl Debug for OverlayFs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayFs")
            .field("root", &self.documents.and_then(DocumentResolver::root))
            .finish()
    }
}

impl grass::Fs for OverlayFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.in_memory(path).is_some() || path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.in_memory(path) {
            Some(content) => Ok(content.as_bytes().to_vec()),
            None => std::fs::read(path),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// [`Renderer`] compiling with `grass`.
///
/// Recognised pass-through options: `compress` (bool) selects compressed
/// output. Source maps are not produced. Rendering runs on the calling task.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrassRenderer;

impl GrassRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Renderer for GrassRenderer {
    fn name(&self) -> &str {
        "grass"
    }

    #[instrument(skip_all, fields(len = content.len()))]
    async fn render(
        &self,
        content: &str,
        options: &RendererOptions,
    ) -> Result<RenderOutput, CompileError> {
        if let Some(browsers) = options.autoprefix_browsers() {
            warn!(?browsers, "autoprefixing is not supported by grass, skipping");
        }
        if options.source_map.is_some() {
            debug!("grass does not emit source maps");
        }

        let resolver = options.document_resolver();
        let fs = OverlayFs::new(resolver);

        let style = if options.flag("compress") {
            OutputStyle::Compressed
        } else {
            OutputStyle::Expanded
        };

        let load_paths: Vec<PathBuf> = options
            .root_file_info
            .as_ref()
            .map(|info| info.current_directory.clone())
            .or_else(|| resolver.and_then(DocumentResolver::root_dir).map(Path::to_path_buf))
            .into_iter()
            .collect();

        let grass_options = Options::default()
            .fs(&fs)
            .load_paths(&load_paths)
            .style(style);

        let root = options
            .root_file_info
            .as_ref()
            .map(|info| info.path())
            .or_else(|| resolver.and_then(DocumentResolver::root).map(Path::to_path_buf));

        let result = match &options.root_file_info {
            Some(info) => grass::from_path(info.path(), &grass_options),
            None => grass::from_string(content, &grass_options),
        };

        let css = result.map_err(|err| map_error(*err, root.as_deref()))?;
        Ok(RenderOutput { css, map: None })
    }
}

/// Convert a `grass` failure into a [`CompileError`].
///
/// Positions become 1-based lines with 0-based columns. Errors in text
/// compiled from memory are attributed to the root document.
fn map_error(err: grass::Error, root: Option<&Path>) -> CompileError {
    match err.kind() {
        grass::ErrorKind::ParseError { message, loc, .. } => {
            let name = loc.file.name();
            let filename = match (name, root) {
                (STDIN_NAME, Some(root)) => Some(root.display().to_string()),
                (STDIN_NAME, None) => None,
                (name, _) => Some(name.to_string()),
            };

            CompileError::Render {
                message,
                line: Some(loc.begin.line + 1),
                column: Some(loc.begin.column),
                filename,
            }
        }
        grass::ErrorKind::IoError(source) => {
            let source = Arc::try_unwrap(source)
                .unwrap_or_else(|shared| io::Error::new(shared.kind(), shared.to_string()));
            CompileError::filesystem(root.unwrap_or_else(|| Path::new("")), source)
        }
        grass::ErrorKind::FromUtf8Error(message) => CompileError::unknown(message),
        _ => CompileError::unknown("grass failed with an unrecognised error"),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use stylepress_core::renderer::RendererPlugin;
    use stylepress_shared::RootFileInfo;

    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("sp-grass-test-{}", uuid::Uuid::now_v7()))
    }

    fn with_root(path: &Path, content: &str) -> RendererOptions {
        RendererOptions {
            plugins: vec![RendererPlugin::DocumentResolver(DocumentResolver::for_root(
                path, content,
            ))],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn compiles_in_memory_text() {
        let content = "$primary: #007bff;\n.btn { color: $primary; }";
        let options = with_root(Path::new("/proj/less/main.less"), content);

        let output = GrassRenderer.render(content, &options).await.unwrap();
        assert!(output.css.contains(".btn"));
        assert!(output.css.contains("#007bff"));
        assert!(output.map.is_none());
    }

    #[tokio::test]
    async fn compress_flag_selects_compressed_output() {
        let content = ".a {\n  color: red;\n}\n\n.b {\n  color: blue;\n}";
        let mut options = with_root(Path::new("/proj/main.less"), content);
        options
            .extra
            .insert("compress".into(), serde_json::Value::Bool(true));

        let output = GrassRenderer.render(content, &options).await.unwrap();
        assert!(!output.css.contains("\n\n"));
        assert!(output.css.contains(".a{color:red}"));
    }

    #[tokio::test]
    async fn syntax_error_reports_position_in_root_document() {
        let content = ".a { color: red; }\n.b { color: $missing; }";
        let options = with_root(Path::new("/proj/less/main.less"), content);

        let err = GrassRenderer.render(content, &options).await.unwrap_err();
        match err {
            CompileError::Render {
                line, filename, ..
            } => {
                assert_eq!(line, Some(2));
                assert_eq!(filename.as_deref(), Some("/proj/less/main.less"));
            }
            other => panic!("expected render error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn root_is_loaded_through_overlay() {
        let root = temp_dir();
        std::fs::create_dir_all(&root).unwrap();
        let path = root.join("main.scss");
        std::fs::write(&path, ".on-disk { color: red; }").unwrap();
        std::fs::write(root.join("_vars.scss"), "$size: 4px;").unwrap();

        // Unsaved text shadows the file on disk; imports still come from disk.
        let unsaved = "@import 'vars';\n.unsaved { margin: $size; }";
        let mut options = with_root(&path, unsaved);
        options.root_file_info = Some(RootFileInfo::from_path(&path));

        let output = GrassRenderer.render(unsaved, &options).await.unwrap();
        assert!(output.css.contains(".unsaved"));
        assert!(output.css.contains("4px"));
        assert!(!output.css.contains(".on-disk"));

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn missing_root_file_is_filesystem_error() {
        let path = temp_dir().join("missing.scss");
        let options = RendererOptions {
            root_file_info: Some(RootFileInfo::from_path(&path)),
            ..Default::default()
        };

        let err = GrassRenderer.render("", &options).await.unwrap_err();
        assert!(matches!(err, CompileError::Filesystem { .. }));
        assert_eq!(err.code(), Some("ENOENT"));

        let diagnostic = stylepress_core::diagnostics::classify(&err, &path);
        assert!(diagnostic.message.starts_with("cannot open file"));
        assert_eq!(diagnostic.affected_file, path);
    }

    #[test]
    fn overlay_debug_names_root() {
        let resolver = DocumentResolver::for_root("/proj/main.less", "");
        let debug = format!("{:?}", OverlayFs::new(Some(&resolver)));
        assert!(debug.contains("OverlayFs"));
        assert!(debug.contains("/proj/main.less"));
    }
}
