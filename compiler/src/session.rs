//! @ai:module:intent Compile a stored file and fan the result out to its sections
//! @ai:module:layer application
//! @ai:module:public_api CompileSession, CompileReport
//! @ai:module:depends_on backend, options, sectioner
//! @ai:module:stateless false

use crate::backend::{CompileRequest, CompilerBackend};
use crate::options::CompileOptions;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sectioner::{
    apply_compile_result, compile_status, AnnotationSummary, Diagnostic, DiagnosticMapper,
    ErrorLine, FileId, ListingLine, SectionStatus, SectionStore, SourceLines,
};
use serde::Serialize;

/// @ai:intent Everything one compilation produced, mapped onto source lines
#[derive(Debug, Clone, Serialize)]
pub struct CompileReport {
    pub file_id: FileId,
    pub source_name: String,
    pub timestamp: DateTime<Utc>,
    pub options: CompileOptions,
    pub status: SectionStatus,
    pub annotation: AnnotationSummary,
    pub diagnostics: Vec<Diagnostic>,
    /// Mapped listing; empty when the file did not compile.
    pub listing: Vec<ListingLine>,
    /// Per-line error output; only filled when the file did not compile.
    pub error_lines: Vec<ErrorLine>,
    pub stdout: String,
}

impl CompileReport {
    pub fn compiled(&self) -> bool {
        self.status != SectionStatus::DoesNotCompile
    }
}

/// @ai:intent Drives one backend against one section store
pub struct CompileSession<'a, B: CompilerBackend> {
    backend: B,
    request: CompileRequest,
    store: &'a SectionStore,
}

impl<'a, B: CompilerBackend> CompileSession<'a, B> {
    /// @ai:intent Create a session over a backend, request and store
    /// @ai:effects pure
    pub fn new(backend: B, request: CompileRequest, store: &'a SectionStore) -> Self {
        Self {
            backend,
            request,
            store,
        }
    }

    /// @ai:intent Compile the file, derive its status and replace its section statuses
    /// @ai:pre the file's sections in the store match `lines`
    /// @ai:post every section of the file has a status
    /// @ai:effects io, state:write
    pub fn run(&self, file: FileId, lines: &SourceLines) -> Result<CompileReport> {
        tracing::info!(
            "Compiling file {} as {} ({})",
            file,
            self.request.source_name,
            self.request.options.to_args().join(" ")
        );
        let artifacts = self.backend.compile(&lines.to_text(), &self.request)?;

        let mapper = DiagnosticMapper::new(&self.request.source_name);
        if let Err(e) = mapper.check_delimiter(&artifacts.stderr) {
            tracing::warn!("{}", e);
        }
        let diagnostics = mapper.map_diagnostics(&artifacts.stderr);
        let status = compile_status(artifacts.listing_exists(), &diagnostics);
        let annotation = apply_compile_result(self.store, file, status, &diagnostics);

        let (listing, error_lines) = match &artifacts.listing {
            Some(listing) => (mapper.map_listing(listing), Vec::new()),
            None => (Vec::new(), mapper.map_error_lines(&artifacts.stderr)),
        };

        Ok(CompileReport {
            file_id: file,
            source_name: self.request.source_name.clone(),
            timestamp: Utc::now(),
            options: self.request.options.clone(),
            status,
            annotation,
            diagnostics,
            listing,
            error_lines,
            stdout: artifacts.stdout,
        })
    }
}
