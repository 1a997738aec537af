//! @ai:module:intent Fan compile diagnostics out to stored sections in two passes
//! @ai:module:layer application
//! @ai:module:public_api apply_compile_result, AnnotationSummary
//! @ai:module:depends_on store, diagnostics, section

use crate::diagnostics::Diagnostic;
use crate::section::{FileId, SectionStatus};
use crate::store::SectionStore;
use serde::Serialize;

/// @ai:intent Counts describing one diagnostic fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationSummary {
    pub status: SectionStatus,
    pub residual_status: SectionStatus,
    pub diagnostics_applied: usize,
    pub section_updates: usize,
    pub pending_assigned: usize,
}

/// @ai:intent Status given to sections no diagnostic touched
/// @ai:example (CompiledWithWarnings) -> CompiledWithoutWarnings
/// @ai:effects pure
pub fn residual_status(status: SectionStatus) -> SectionStatus {
    match status {
        SectionStatus::CompiledWithWarnings => SectionStatus::CompiledWithoutWarnings,
        other => other,
    }
}

/// @ai:intent Replace a file's section statuses with the result of one compilation
/// @ai:post sections containing an attributed diagnostic line carry `status`
/// @ai:post every other section carries residual_status(status)
/// @ai:effects state:write
pub fn apply_compile_result(
    store: &SectionStore,
    file: FileId,
    status: SectionStatus,
    diagnostics: &[Diagnostic],
) -> AnnotationSummary {
    store.reset_statuses(file);

    let mut diagnostics_applied = 0;
    let mut section_updates = 0;
    for diagnostic in diagnostics.iter().filter(|d| d.is_attributed()) {
        section_updates +=
            store.append_diagnostic(file, status, diagnostic.source_line, &diagnostic.text);
        diagnostics_applied += 1;
    }

    let residual = residual_status(status);
    let pending_assigned = store.assign_pending_status(file, residual);

    tracing::info!(
        "File {} compiled as '{}': {} diagnostics, {} section updates, {} sections set to '{}'",
        file,
        status,
        diagnostics_applied,
        section_updates,
        pending_assigned,
        residual
    );

    AnnotationSummary {
        status,
        residual_status: residual,
        diagnostics_applied,
        section_updates,
        pending_assigned,
    }
}
