//! @ai:module:intent Sectioner library: classify C source lines into nested sections and overlay compiler diagnostics
//! @ai:module:layer infrastructure
//! @ai:module:public_api annotate, classify, diagnostics, enrich, error, output, scan, section, sectionize, source, store
//! @ai:module:stateless true
//!
//! # Sectioner
//!
//! A best-effort, line-oriented sectionizer for C sources aimed at 8-bit
//! toolchains such as SDCC. It splits a file into directive, variable,
//! procedure, comment and inline-assembly sections, keeps them in a store
//! that only allows disjoint or nested intervals, and maps compiler output
//! back onto those sections for display.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sectioner::{enrich, output, SectionStore, SourceLines};
//! use std::path::Path;
//!
//! let source = SourceLines::read(Path::new("main.c")).unwrap();
//! let store = SectionStore::default();
//! store.reparse(1, &source).unwrap();
//!
//! let decorations = enrich(source.lines(), &store.get(1));
//! println!("{}", output::format_decorations(&decorations, output::OutputFormat::Text));
//! ```

pub mod annotate;
pub mod classify;
pub mod diagnostics;
pub mod enrich;
pub mod error;
pub mod output;
pub mod scan;
pub mod section;
pub mod sectionize;
pub mod source;
pub mod store;

pub use annotate::{apply_compile_result, AnnotationSummary};
pub use classify::{classify, LineCategory};
pub use diagnostics::{compile_status, Diagnostic, DiagnosticMapper, ErrorLine, ListingLine};
pub use enrich::{enrich, LineDecoration, Nesting};
pub use error::{Error, Result};
pub use output::OutputFormat;
pub use scan::{scan_directory, ScanReport};
pub use section::{FileId, KindRegistry, Section, SectionKind, SectionSpan, SectionStatus};
pub use sectionize::{sectionize, sectionize_file, sectionize_nested};
pub use source::SourceLines;
pub use store::{NewSection, SectionStore};
