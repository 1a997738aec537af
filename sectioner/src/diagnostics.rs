//! @ai:module:intent Map raw compiler output back onto source line numbers
//! @ai:module:layer application
//! @ai:module:public_api DiagnosticMapper, Diagnostic, ErrorLine, ListingLine, ListingMarker, MarkerClass, MarkerPosition, compile_status
//! @ai:module:depends_on section, error
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::section::SectionStatus;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Prefix of the dashed comment lines that open and close listing header blocks.
pub const LISTING_MARKER: &str = ";-----------------";

/// @ai:intent One diagnostic fragment; line 0 means unattributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub source_line: usize,
    pub text: String,
}

impl Diagnostic {
    pub fn is_attributed(&self) -> bool {
        self.source_line > 0
    }
}

/// @ai:intent One physical line of error output, tagged with its source line (0 if none)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLine {
    pub text: String,
    pub source_line: usize,
}

/// @ai:intent Display class of a listing comment block marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerClass {
    #[serde(rename = "asm-header")]
    Header,
    #[serde(rename = "asm-body")]
    Body,
}

/// @ai:intent Whether a marker sits before or after the block it delimits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerPosition {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingMarker {
    pub class: MarkerClass,
    pub position: MarkerPosition,
}

/// @ai:intent One line of an assembly listing with display state and source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingLine {
    pub code: String,
    pub marker: Option<ListingMarker>,
    pub source_line: usize,
}

/// @ai:intent Parses compiler text keyed on the generated source file name
#[derive(Debug, Clone)]
pub struct DiagnosticMapper {
    filename: String,
    delimiter: String,
    error_line: Regex,
    listing_ref: Regex,
}

impl DiagnosticMapper {
    /// @ai:intent Create a mapper for the generated file name (e.g. "source.c")
    /// @ai:effects pure
    pub fn new(filename: &str) -> Self {
        let escaped = regex::escape(filename);
        Self {
            filename: filename.to_string(),
            delimiter: format!("{}:", filename),
            error_line: Regex::new(&format!(r"^{}:(\d+)", escaped)).expect("Invalid regex"),
            listing_ref: Regex::new(&format!(r"^;\s*{}:\s*(\d+)", escaped)).expect("Invalid regex"),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// @ai:intent Split error/warning text on "<filename>:" into per-line diagnostics
    /// @ai:post fragments without a leading line number are kept with source_line 0
    /// @ai:example ("source.c:3: warning: unused variable") -> [Diagnostic { 3, "3: warning: unused variable" }]
    /// @ai:edge_cases text without the delimiter yields a single unattributed entry
    /// @ai:effects pure
    pub fn map_diagnostics(&self, text: &str) -> Vec<Diagnostic> {
        let mut fragments = text.split(self.delimiter.as_str());
        let mut diagnostics = Vec::new();

        if let Some(prefix) = fragments.next() {
            let prefix = prefix.trim();
            if !prefix.is_empty() {
                diagnostics.push(Diagnostic {
                    source_line: 0,
                    text: prefix.to_string(),
                });
            }
        }

        for fragment in fragments {
            let fragment = fragment.trim_end();
            diagnostics.push(Diagnostic {
                source_line: leading_number(fragment).unwrap_or(0),
                text: fragment.to_string(),
            });
        }

        tracing::debug!(
            "Mapped {} diagnostics ({} attributed) for {}",
            diagnostics.len(),
            diagnostics.iter().filter(|d| d.is_attributed()).count(),
            self.filename
        );
        diagnostics
    }

    /// @ai:intent Fail when non-empty text never mentions the generated file name
    /// @ai:effects pure
    pub fn check_delimiter(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() || text.contains(&self.delimiter) {
            Ok(())
        } else {
            Err(Error::MalformedDiagnosticText {
                delimiter: self.delimiter.clone(),
            })
        }
    }

    /// @ai:intent Tag every physical line of error output with its source line
    /// @ai:effects pure
    pub fn map_error_lines(&self, text: &str) -> Vec<ErrorLine> {
        text.split('\n')
            .map(|line| ErrorLine {
                text: line.to_string(),
                source_line: capture_number(&self.error_line, line),
            })
            .collect()
    }

    /// @ai:intent Tag listing lines with header/body markers and referenced source lines
    /// @ai:post source_line is non-zero only for body comment lines naming the file
    /// @ai:effects pure
    pub fn map_listing(&self, text: &str) -> Vec<ListingLine> {
        let mut in_body = true;

        text.split('\n')
            .map(|line| {
                let mut entry = ListingLine {
                    code: line.to_string(),
                    marker: None,
                    source_line: 0,
                };

                if line.starts_with(LISTING_MARKER) {
                    entry.marker = Some(if in_body {
                        ListingMarker {
                            class: MarkerClass::Header,
                            position: MarkerPosition::Before,
                        }
                    } else {
                        ListingMarker {
                            class: MarkerClass::Body,
                            position: MarkerPosition::After,
                        }
                    });
                    in_body = !in_body;
                } else if in_body && line.starts_with(';') {
                    entry.source_line = capture_number(&self.listing_ref, line);
                }

                entry
            })
            .collect()
    }
}

/// @ai:intent Derive the compile result from the produced artifacts
/// @ai:example (false, _) -> DoesNotCompile
/// @ai:example (true, [attributed]) -> CompiledWithWarnings
/// @ai:example (true, []) -> CompiledWithoutWarnings
/// @ai:effects pure
pub fn compile_status(listing_exists: bool, diagnostics: &[Diagnostic]) -> SectionStatus {
    if !listing_exists {
        SectionStatus::DoesNotCompile
    } else if diagnostics.iter().any(Diagnostic::is_attributed) {
        SectionStatus::CompiledWithWarnings
    } else {
        SectionStatus::CompiledWithoutWarnings
    }
}

fn leading_number(text: &str) -> Option<usize> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn capture_number(re: &Regex, line: &str) -> usize {
    re.captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> DiagnosticMapper {
        DiagnosticMapper::new("source.c")
    }

    #[test]
    fn test_single_warning_maps_to_line() {
        let diagnostics = mapper().map_diagnostics("source.c:3: warning: unused variable");
        assert_eq!(
            diagnostics,
            vec![Diagnostic {
                source_line: 3,
                text: "3: warning: unused variable".to_string(),
            }]
        );
    }

    #[test]
    fn test_multiple_diagnostics_and_unattributed_fragments() {
        let text = "at 1: note\nsource.c:12: error 20: undefined\nsource.c:x: odd\nsource.c:7: warning 85\n";
        let diagnostics = mapper().map_diagnostics(text);
        let lines: Vec<usize> = diagnostics.iter().map(|d| d.source_line).collect();
        assert_eq!(lines, vec![0, 12, 0, 7]);
        assert_eq!(diagnostics[3].text, "7: warning 85");
        assert_eq!(diagnostics.iter().filter(|d| d.is_attributed()).count(), 2);
    }

    #[test]
    fn test_text_without_delimiter() {
        let m = mapper();
        let diagnostics = m.map_diagnostics("sdcc: fatal: no input");
        assert_eq!(diagnostics.len(), 1);
        assert!(!diagnostics[0].is_attributed());
        assert!(matches!(
            m.check_delimiter("sdcc: fatal: no input"),
            Err(Error::MalformedDiagnosticText { .. })
        ));
        assert!(m.check_delimiter("").is_ok());
        assert!(m.map_diagnostics("").is_empty());
    }

    #[test]
    fn test_error_lines_are_tagged() {
        let lines = mapper().map_error_lines("source.c:4: syntax error\nmore context\nsource.c:9: error");
        let tags: Vec<usize> = lines.iter().map(|l| l.source_line).collect();
        assert_eq!(tags, vec![4, 0, 9]);
    }

    #[test]
    fn test_listing_markers_and_source_refs() {
        let listing = [
            ";--------------------------------------------------------",
            "; File Created by SDCC",
            "; source.c:99: not in body",
            ";--------------------------------------------------------",
            ";\tsource.c:5: int x = 1;",
            "\tmov\t_x,#0x01",
            ";source.c: 6: x++;",
        ]
        .join("\n");
        let lines = mapper().map_listing(&listing);

        assert_eq!(
            lines[0].marker,
            Some(ListingMarker {
                class: MarkerClass::Header,
                position: MarkerPosition::Before,
            })
        );
        assert_eq!(lines[2].source_line, 0);
        assert_eq!(
            lines[3].marker,
            Some(ListingMarker {
                class: MarkerClass::Body,
                position: MarkerPosition::After,
            })
        );
        assert_eq!(lines[4].source_line, 5);
        assert_eq!(lines[5].source_line, 0);
        assert_eq!(lines[6].source_line, 6);
    }

    #[test]
    fn test_filename_is_matched_literally() {
        let diagnostics = mapper().map_diagnostics("sourceXc:3: nope");
        assert!(diagnostics.iter().all(|d| !d.is_attributed()));
    }

    #[test]
    fn test_compile_status() {
        let attributed = [Diagnostic {
            source_line: 2,
            text: "2: warning".to_string(),
        }];
        let unattributed = [Diagnostic {
            source_line: 0,
            text: "note".to_string(),
        }];
        assert_eq!(compile_status(false, &attributed), SectionStatus::DoesNotCompile);
        assert_eq!(
            compile_status(true, &attributed),
            SectionStatus::CompiledWithWarnings
        );
        assert_eq!(
            compile_status(true, &unattributed),
            SectionStatus::CompiledWithoutWarnings
        );
    }
}
