//! End-to-end compile pipeline: options → output path → preprocessors →
//! renderer → artifacts.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use stylepress_shared::{CompileError, CompileOptions, Diagnostic};

use crate::output_path::{self, choose_output_path};
use crate::preprocess::{Preprocessor, PreprocessorRegistry};
use crate::renderer::{
    DocumentResolver, Renderer, RendererOptions, RendererPlugin, SourceMapOptions,
};
use crate::resolver;
use crate::writer::{ArtifactMeta, ArtifactWriter, FsArtifactWriter};

/// Input of one compile.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// Absolute path of the source document.
    pub source_path: PathBuf,
    /// Source text, possibly unsaved.
    pub content: String,
    /// Options from defaults and settings; inline directives are applied on top.
    pub defaults: CompileOptions,
    /// Workspace folder for `${workspaceFolder}` expansion.
    pub workspace_root: Option<PathBuf>,
}

impl CompileRequest {
    /// Apply the document's inline directives over `defaults`.
    pub fn resolve(self) -> ResolvedRequest {
        let options = resolver::apply_directives(&self.content, self.defaults);
        ResolvedRequest {
            source_path: self.source_path,
            content: self.content,
            options,
            workspace_root: self.workspace_root,
        }
    }
}

/// A [`CompileRequest`] whose directives have been applied. The content is
/// not parsed for directives again.
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub source_path: PathBuf,
    pub content: String,
    /// Effective options for this compile.
    pub options: CompileOptions,
    pub workspace_root: Option<PathBuf>,
}

/// Result of a successful compile.
#[derive(Debug, Clone, Default)]
pub struct CompileReport {
    /// Artifacts written, stylesheet first. Empty when output is disabled.
    pub artifacts: Vec<ArtifactMeta>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

impl CompileReport {
    /// Whether the compile was skipped because `outputPath` is `false`.
    pub fn is_noop(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Progress callback for reporting compile status.
pub trait ProgressReporter: Send + Sync {
    /// Called before compiling, with the artifact extension (no dot).
    fn started(&self, extension: &str);
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the compile succeeds.
    fn done(&self, report: &CompileReport);
    /// Called when the compile fails.
    fn failed(&self, diagnostic: &Diagnostic);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn started(&self, _extension: &str) {}
    fn phase(&self, _name: &str) {}
    fn done(&self, _report: &CompileReport) {}
    fn failed(&self, _diagnostic: &Diagnostic) {}
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

/// Long-lived compile engine: owns the preprocessor registry and the
/// renderer/writer collaborators shared by every compile.
#[derive(Clone)]
pub struct Compiler {
    preprocessors: PreprocessorRegistry,
    renderer: Arc<dyn Renderer>,
    writer: Arc<dyn ArtifactWriter>,
}

impl Compiler {
    /// Compiler writing artifacts to the local filesystem.
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            preprocessors: PreprocessorRegistry::new(),
            renderer,
            writer: Arc::new(FsArtifactWriter),
        }
    }

    /// Replace the artifact writer.
    pub fn with_writer(mut self, writer: Arc<dyn ArtifactWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Append a preprocessor. Register before compiling; there is no removal.
    pub fn register_preprocessor(&mut self, preprocessor: impl Preprocessor + 'static) {
        self.preprocessors.register(preprocessor);
    }

    pub fn preprocessors(&self) -> &PreprocessorRegistry {
        &self.preprocessors
    }

    /// Compile one document.
    pub async fn compile(&self, request: CompileRequest) -> Result<CompileReport, CompileError> {
        compile(
            request,
            &self.preprocessors,
            self.renderer.as_ref(),
            self.writer.as_ref(),
            &SilentProgress,
        )
        .await
    }

    /// Compile one document, reporting phases to `progress`.
    pub async fn compile_with_progress(
        &self,
        request: CompileRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<CompileReport, CompileError> {
        compile(
            request,
            &self.preprocessors,
            self.renderer.as_ref(),
            self.writer.as_ref(),
            progress,
        )
        .await
    }

    /// Compile a request whose options are already resolved.
    pub async fn compile_resolved(
        &self,
        request: ResolvedRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<CompileReport, CompileError> {
        compile_resolved(
            request,
            &self.preprocessors,
            self.renderer.as_ref(),
            self.writer.as_ref(),
            progress,
        )
        .await
    }
}

impl std::fmt::Debug for Compiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compiler")
            .field("preprocessors", &self.preprocessors)
            .field("renderer", &self.renderer.name())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Compile
// ---------------------------------------------------------------------------

/// Run the full compile pipeline.
///
/// 1. Apply inline directives over `request.defaults`
/// 2. Return early when `outputPath` is `false`
/// 3. Compute the artifact path
/// 4. Configure the source map
/// 5. Build the plugin list
/// 6. Run preprocessors (disabling the renderer's own root reload)
/// 7. Render
/// 8. Write the stylesheet
/// 9. Write the source map, if one was produced
///
/// Nothing is written if any step up to rendering fails. A failed map write
/// leaves the already written stylesheet in place.
pub async fn compile(
    request: CompileRequest,
    preprocessors: &PreprocessorRegistry,
    renderer: &dyn Renderer,
    writer: &dyn ArtifactWriter,
    progress: &dyn ProgressReporter,
) -> Result<CompileReport, CompileError> {
    compile_resolved(request.resolve(), preprocessors, renderer, writer, progress).await
}

/// Run steps 2 to 9 of [`compile`] with options already resolved.
#[instrument(skip_all, fields(source = %request.source_path.display()))]
pub async fn compile_resolved(
    request: ResolvedRequest,
    preprocessors: &PreprocessorRegistry,
    renderer: &dyn Renderer,
    writer: &dyn ArtifactWriter,
    progress: &dyn ProgressReporter,
) -> Result<CompileReport, CompileError> {
    let start = Instant::now();
    let ResolvedRequest {
        source_path,
        content,
        mut options,
        workspace_root,
    } = request;

    if options.is_output_disabled() {
        debug!("outputPath is false, nothing to do");
        return Ok(CompileReport {
            artifacts: Vec::new(),
            elapsed: start.elapsed(),
        });
    }

    // --- Output path ---
    let source_dir = source_path.parent().unwrap_or_else(|| Path::new(""));
    let css_path = choose_output_path(
        &options,
        &source_path,
        source_dir,
        workspace_root.as_deref(),
    );
    options.output_path = None;
    debug!(output = %css_path.display(), "resolved output path");

    // --- Source map ---
    let source_map = options.source_map.as_ref().filter(|s| s.is_enabled()).map(|s| {
        configure_source_map(&source_path, &css_path, s.output_source_files())
    });

    // --- Plugins ---
    let mut plugins = Vec::new();
    if let Some(autoprefixer) = options.autoprefixer.as_ref().filter(|a| a.is_enabled()) {
        plugins.push(RendererPlugin::Autoprefix {
            browsers: autoprefixer.browsers(),
        });
    }

    // --- Preprocessors ---
    let mut root_file_info = options.root_file_info.take();
    let content = if preprocessors.is_empty() {
        content
    } else {
        progress.phase("Running preprocessors");
        // The renderer must not re-read the root document from disk.
        root_file_info = None;
        preprocessors.run(content).await?
    };

    plugins.push(RendererPlugin::DocumentResolver(DocumentResolver::for_root(
        &source_path,
        content.as_str(),
    )));

    // --- Render ---
    progress.phase("Rendering");
    let renderer_options = RendererOptions {
        root_file_info,
        relative_urls: options.relative_urls.unwrap_or(false),
        source_map,
        plugins,
        extra: options.renderer_options,
    };
    let output = renderer.render(&content, &renderer_options).await?;

    // --- Write ---
    progress.phase("Writing artifacts");
    writer.write(&css_path, &output.css).await?;
    let mut artifacts = vec![ArtifactMeta::new(&css_path, &output.css)];

    if let (Some(map), Some(map_options)) = (&output.map, &renderer_options.source_map) {
        writer.write(&map_options.map_destination, map).await?;
        artifacts.push(ArtifactMeta::new(&map_options.map_destination, map));
    }

    let report = CompileReport {
        artifacts,
        elapsed: start.elapsed(),
    };

    info!(
        renderer = renderer.name(),
        output = %css_path.display(),
        artifacts = report.artifacts.len(),
        elapsed_ms = report.elapsed.as_millis(),
        "compile complete"
    );

    Ok(report)
}

/// Source map settings for an artifact at `css_path` built from
/// `source_path`. The map is written next to the artifact.
pub fn configure_source_map(
    source_path: &Path,
    css_path: &Path,
    output_source_files: bool,
) -> SourceMapOptions {
    let source_dir = source_path.parent().unwrap_or_else(|| Path::new(""));
    let css_dir = css_path.parent().unwrap_or_else(|| Path::new(""));

    SourceMapOptions {
        output_source_files,
        base_path: source_dir.to_path_buf(),
        root_path: output_path::relative_path(css_dir, source_dir),
        map_destination: output_path::source_map_path(css_path),
    }
}
