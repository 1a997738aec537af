//! @ai:module:intent Define error types for the sectioner core
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for all sectioner operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid line range {start}-{end} for a file of {total} lines")]
    RangeInvalid { start: usize, end: usize, total: usize },

    #[error("Section {start}-{end} conflicts with existing section {existing_start}-{existing_end}")]
    RangeConflict {
        start: usize,
        end: usize,
        existing_start: usize,
        existing_end: usize,
    },

    #[error("Unterminated {construct} starting at line {start_line}")]
    UnterminatedConstruct {
        construct: &'static str,
        start_line: usize,
    },

    #[error("Diagnostic text does not contain the delimiter `{delimiter}`")]
    MalformedDiagnosticText { delimiter: String },

    #[error("Unknown section kind: {0}")]
    UnknownKind(String),

    #[error("Unknown section status: {0}")]
    UnknownStatus(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
