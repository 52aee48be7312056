//! The host-side compile command.
//!
//! Resolves options for a document, runs the [`Compiler`], and keeps the
//! [`DiagnosticCollection`] in sync with the outcome.

use tracing::{debug, instrument, warn};

use stylepress_shared::{Diagnostic, SettingsStore, SourceDocument};

use crate::diagnostics::{self, DiagnosticCollection};
use crate::pipeline::{CompileReport, CompileRequest, Compiler, ProgressReporter};
use crate::resolver::{self, ConfigWarning};

/// Outcome of compiling one document.
#[derive(Debug)]
pub struct CommandOutcome {
    /// Option conflicts found while resolving; compilation ran regardless.
    pub warnings: Vec<ConfigWarning>,
    /// The report, or the diagnostic the failure was classified as.
    pub result: Result<CompileReport, Diagnostic>,
}

impl CommandOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Compiles documents on behalf of a host.
pub struct CompileCommand<'a> {
    compiler: &'a Compiler,
    store: &'a dyn SettingsStore,
}

impl<'a> CompileCommand<'a> {
    pub fn new(compiler: &'a Compiler, store: &'a dyn SettingsStore) -> Self {
        Self { compiler, store }
    }

    /// Compile `document` and record the result in `diagnostics`.
    ///
    /// On success the document's diagnostics are cleared. On failure exactly
    /// one diagnostic replaces those of the affected file.
    #[instrument(skip_all, fields(path = %document.path.display()))]
    pub async fn execute(
        &self,
        document: &SourceDocument,
        diagnostics: &mut DiagnosticCollection,
        progress: &dyn ProgressReporter,
    ) -> CommandOutcome {
        let (global, workspace_root) = resolver::global_options(&document.path, self.store);

        let request = CompileRequest {
            source_path: document.path.clone(),
            content: document.content.clone(),
            defaults: global,
            workspace_root,
        }
        .resolve();
        let warnings = resolver::check_options(&request.options);

        if document.dirty {
            debug!("compiling unsaved content");
        }

        progress.started(&request.options.extension_label());

        let result = match self.compiler.compile_resolved(request, progress).await {
            Ok(report) => {
                diagnostics.delete(&document.path);
                progress.done(&report);
                Ok(report)
            }
            Err(err) => {
                warn!(error = %err, "compile failed");
                let diagnostic = diagnostics::classify(&err, &document.path);
                diagnostics.set(diagnostic.affected_file.clone(), vec![diagnostic.clone()]);
                progress.failed(&diagnostic);
                Err(diagnostic)
            }
        };

        CommandOutcome { warnings, result }
    }
}
