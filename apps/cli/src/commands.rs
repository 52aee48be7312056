//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use stylepress_core::command::CompileCommand;
use stylepress_core::diagnostics::{self, DiagnosticCollection};
use stylepress_core::pipeline::{CompileReport, Compiler, ProgressReporter};
use stylepress_core::preprocess::BannerPreprocessor;
use stylepress_core::resolver;
use stylepress_renderer::GrassRenderer;
use stylepress_shared::{
    CompileError, Diagnostic, FileSettingsStore, SOURCE_EXTENSIONS, SettingsFile,
    SourceDocument, default_settings, global_settings_path, init_config, load_settings_from,
};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// stylepress: compile stylesheets with per-file directives.
#[derive(Parser)]
#[command(
    name = "stylepress",
    version,
    about = "Compile stylesheets using settings files and first-line directives. \
             Sources are rendered with grass and must use SCSS syntax \
             (plain and nested CSS in .less files works; Less variables and mixins do not).",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Compile one or more stylesheets.
    Compile {
        /// Source files to compile.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Prepend a comment banner to every source before rendering.
        #[arg(long)]
        banner: Option<String>,

        /// Compile files that do not end in `.less` or `.scss`.
        #[arg(long)]
        any_extension: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize the global settings file with defaults.
    Init,
    /// Show the global settings, or the options effective for a file.
    Show {
        /// Source file to resolve options for.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "stylepress=warn",
        1 => "stylepress=info",
        2 => "stylepress=debug",
        _ => "stylepress=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Compile {
            files,
            banner,
            any_extension,
        } => cmd_compile(&files, banner, any_extension).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show { file } => cmd_config_show(file.as_deref()).await,
        },
    }
}

// ---------------------------------------------------------------------------
// compile
// ---------------------------------------------------------------------------

async fn cmd_compile(files: &[PathBuf], banner: Option<String>, any_extension: bool) -> Result<()> {
    let mut compiler = Compiler::new(Arc::new(GrassRenderer::new()));
    if let Some(text) = banner {
        compiler.register_preprocessor(BannerPreprocessor::new(text));
    }

    let store = FileSettingsStore::new();
    let command = CompileCommand::new(&compiler, &store);
    let mut diagnostics = DiagnosticCollection::new();
    let mut failed = 0usize;

    for file in files {
        if !any_extension && !has_source_extension(file) {
            let expected = SOURCE_EXTENSIONS.join(" or ");
            warn!(path = %file.display(), "not a {expected} file, skipping");
            eprintln!("skipping {}: not a {expected} file", file.display());
            continue;
        }

        let path = std::path::absolute(file)
            .map_err(|e| eyre!("cannot resolve path '{}': {e}", file.display()))?;

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                let diagnostic = diagnostics::classify(&CompileError::filesystem(&path, e), &path);
                diagnostics.set(diagnostic.affected_file.clone(), vec![diagnostic]);
                failed += 1;
                continue;
            }
        };

        let document = SourceDocument::new(&path, content);
        let progress = CliProgress::new(source_kind(&path));
        let outcome = command.execute(&document, &mut diagnostics, &progress).await;

        for warning in &outcome.warnings {
            eprintln!("{}: warning: {warning}", path.display());
        }

        match &outcome.result {
            Ok(report) if report.is_noop() => {
                debug!(path = %path.display(), "output disabled");
            }
            Ok(report) => print_report(report),
            Err(_) => failed += 1,
        }
    }

    for diagnostic in diagnostics.iter() {
        eprintln!("{diagnostic}");
    }

    if failed > 0 {
        return Err(eyre!("{failed} of {} file(s) failed to compile", files.len()));
    }

    info!(files = files.len(), "all files compiled");
    Ok(())
}

fn has_source_extension(path: &Path) -> bool {
    let name = path.to_string_lossy().to_ascii_lowercase();
    SOURCE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Dialect label for the spinner, taken from the file extension.
fn source_kind(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_else(|| "source".to_string())
}

fn print_report(report: &CompileReport) {
    for artifact in &report.artifacts {
        println!(
            "  wrote {} ({} bytes, sha256 {})",
            artifact.path.display(),
            artifact.size_bytes,
            &artifact.sha256[..12]
        );
    }
    println!("  compiled in {}ms", report.elapsed.as_millis());
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
    source_kind: String,
}

impl CliProgress {
    fn new(source_kind: String) -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        Self {
            spinner,
            source_kind,
        }
    }
}

impl ProgressReporter for CliProgress {
    fn started(&self, extension: &str) {
        self.spinner
            .set_message(format!("Compiling {} to {extension}", self.source_kind));
        self.spinner
            .enable_steady_tick(std::time::Duration::from_millis(80));
    }

    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _report: &CompileReport) {
        self.spinner.finish_and_clear();
    }

    fn failed(&self, _diagnostic: &Diagnostic) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Settings initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(file: Option<&Path>) -> Result<()> {
    let Some(file) = file else {
        let path = global_settings_path()?;
        let settings: SettingsFile = if path.exists() {
            load_settings_from(&path)?
        } else {
            default_settings()
        };
        println!("# {}", path.display());
        println!("{}", toml::to_string_pretty(&settings)?);
        return Ok(());
    };

    let path = std::path::absolute(file)?;
    let content = tokio::fs::read_to_string(&path).await.unwrap_or_default();
    let document = SourceDocument::new(&path, content);
    let resolved = resolver::resolve(&document, &FileSettingsStore::new());

    if let Some(root) = &resolved.workspace_root {
        println!("# workspace: {}", root.display());
    }
    for warning in &resolved.warnings {
        println!("# warning: {warning}");
    }
    println!("{}", serde_json::to_string_pretty(&resolved.options)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use stylepress_core::pipeline::SilentProgress;

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sp-cli-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn source_extension_check_is_case_insensitive() {
        assert!(has_source_extension(Path::new("/proj/main.less")));
        assert!(has_source_extension(Path::new("/proj/MAIN.LESS")));
        assert!(has_source_extension(Path::new("/proj/main.scss")));
        assert!(!has_source_extension(Path::new("/proj/main.css")));
    }

    #[test]
    fn source_kind_follows_extension() {
        assert_eq!(source_kind(Path::new("/proj/main.less")), "less");
        assert_eq!(source_kind(Path::new("/proj/Main.SCSS")), "scss");
        assert_eq!(source_kind(Path::new("/proj/Makefile")), "source");
    }

    #[tokio::test]
    async fn compiles_files_on_disk_with_grass() {
        let root = temp_dir();
        let less_dir = root.join("less");
        std::fs::create_dir_all(&less_dir).unwrap();

        let nested = less_dir.join("site.less");
        std::fs::write(
            &nested,
            "// out: ../css/\n.nav {\n  .item { padding: 10px; }\n}\n",
        )
        .unwrap();
        let scss = less_dir.join("theme.scss");
        std::fs::write(&scss, "$gap: 4px;\n.card { margin: $gap; }\n").unwrap();
        let less_only = less_dir.join("vars.less");
        std::fs::write(&less_only, ".a { color: red; }\n.btn { color: @primary; }\n").unwrap();

        let compiler = Compiler::new(Arc::new(GrassRenderer::new()));
        let store = FileSettingsStore::with_global_path(None);
        let command = CompileCommand::new(&compiler, &store);
        let mut diagnostics = DiagnosticCollection::new();

        for path in [&nested, &scss] {
            let content = std::fs::read_to_string(path).unwrap();
            let document = SourceDocument::new(path, content);
            let outcome = command
                .execute(&document, &mut diagnostics, &SilentProgress)
                .await;
            assert!(outcome.is_success(), "{:?}", outcome.result);
        }

        let css = std::fs::read_to_string(root.join("css").join("site.css")).unwrap();
        assert!(css.contains(".nav .item"));
        let css = std::fs::read_to_string(less_dir.join("theme.css")).unwrap();
        assert!(css.contains("4px"));

        // Less-only syntax is a positioned render error on the document.
        let content = std::fs::read_to_string(&less_only).unwrap();
        let document = SourceDocument::new(&less_only, content);
        let outcome = command
            .execute(&document, &mut diagnostics, &SilentProgress)
            .await;
        let diagnostic = outcome.result.unwrap_err();
        assert_eq!(diagnostic.affected_file, less_only);
        assert_eq!(diagnostic.range.start_line, 1);
        assert_eq!(diagnostics.get(&less_only).len(), 1);
        assert!(!less_dir.join("vars.css").exists());

        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn cli_parses_compile() {
        let cli = Cli::parse_from([
            "stylepress",
            "-vv",
            "compile",
            "a.less",
            "b.less",
            "--banner",
            "v1",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Compile {
                files,
                banner,
                any_extension,
            } => {
                assert_eq!(files, vec![PathBuf::from("a.less"), PathBuf::from("b.less")]);
                assert_eq!(banner.as_deref(), Some("v1"));
                assert!(!any_extension);
            }
            Command::Config { .. } => panic!("expected compile"),
        }
    }
}
