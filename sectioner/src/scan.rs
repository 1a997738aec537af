//! @ai:module:intent Sectionize every C source file under a directory
//! @ai:module:layer application
//! @ai:module:public_api scan_directory, is_c_source, ScanReport, FileScan
//! @ai:module:depends_on sectionize, source

use crate::sectionize::sectionize_file;
use crate::source::SourceLines;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const C_EXTENSIONS: [&str; 2] = ["c", "h"];

/// @ai:intent Outcome of sectionizing one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileScan {
    pub path: PathBuf,
    pub lines: usize,
    pub sections: usize,
    pub error: Option<String>,
}

/// @ai:intent Outcome of scanning a directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub files: Vec<FileScan>,
    pub failures: usize,
}

impl ScanReport {
    /// @ai:intent Check if every file sectionized cleanly
    pub fn passed(&self) -> bool {
        self.failures == 0
    }
}

/// @ai:intent Check if a path has a C source or header extension
/// @ai:example ("main.c") -> true
/// @ai:example ("notes.txt") -> false
/// @ai:effects pure
pub fn is_c_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| C_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// @ai:intent Sectionize every .c/.h file under a directory, recording failures per file
/// @ai:effects fs:read
pub fn scan_directory(path: &Path) -> ScanReport {
    let mut report = ScanReport::default();

    for entry in WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_c_source(e.path()))
    {
        let file_path = entry.path();
        let scan = match SourceLines::read(file_path) {
            Ok(lines) => match sectionize_file(lines.lines()) {
                Ok(spans) => FileScan {
                    path: file_path.to_path_buf(),
                    lines: lines.len(),
                    sections: spans.len(),
                    error: None,
                },
                Err(e) => FileScan {
                    path: file_path.to_path_buf(),
                    lines: lines.len(),
                    sections: 0,
                    error: Some(e.to_string()),
                },
            },
            Err(e) => FileScan {
                path: file_path.to_path_buf(),
                lines: 0,
                sections: 0,
                error: Some(e.to_string()),
            },
        };

        if let Some(error) = &scan.error {
            tracing::warn!("Failed to sectionize {}: {}", file_path.display(), error);
            report.failures += 1;
        }
        report.files.push(scan);
    }

    report
}
