//! @ai:module:intent Format output for different formats (JSON, text)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_spans, format_sections, format_decorations, format_diagnostics, format_listing, format_scan_report, to_json
//! @ai:module:depends_on section, enrich, diagnostics, scan
//! @ai:module:stateless true

use crate::diagnostics::{Diagnostic, ListingLine, MarkerClass};
use crate::enrich::{LineDecoration, Nesting};
use crate::scan::ScanReport;
use crate::section::{Section, SectionSpan, SectionStatus};
use colored::{ColoredString, Colorize};
use serde::Serialize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format any serializable value as JSON
/// @ai:effects pure
pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_default()
    } else {
        serde_json::to_string(value).unwrap_or_default()
    }
}

fn format_with<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
    text: impl FnOnce(&T) -> String,
) -> String {
    match format {
        OutputFormat::Json => to_json(value, false),
        OutputFormat::JsonPretty => to_json(value, true),
        OutputFormat::Text => text(value),
    }
}

fn status_colored(status: SectionStatus) -> ColoredString {
    match status {
        SectionStatus::DoesNotCompile => status.label().red().bold(),
        SectionStatus::CompiledWithWarnings => status.label().yellow(),
        SectionStatus::CompiledWithoutWarnings => status.label().green(),
    }
}

/// @ai:intent Format sectionizer output, sorted by start line for text
/// @ai:effects pure
pub fn format_spans(spans: &[SectionSpan], format: OutputFormat) -> String {
    format_with(spans, format, |spans| {
        let mut sorted: Vec<&SectionSpan> = spans.iter().collect();
        sorted.sort_by_key(|s| (s.start_line, std::cmp::Reverse(s.end_line)));

        let mut output = String::new();
        for span in &sorted {
            output.push_str(&format!(
                "{:>5}-{:<5} {}\n",
                span.start_line,
                span.end_line,
                span.kind.as_str().cyan()
            ));
        }
        output.push_str(&format!("\n{} sections\n", sorted.len()));
        output
    })
}

/// @ai:intent Format stored sections with their statuses
/// @ai:effects pure
pub fn format_sections(sections: &[Section], format: OutputFormat) -> String {
    format_with(sections, format, |sections| {
        let mut output = String::new();
        for section in sections {
            let status = section
                .status
                .map(|s| status_colored(s).to_string())
                .unwrap_or_else(|| "pending".dimmed().to_string());
            output.push_str(&format!(
                "{:>5}-{:<5} {:<10} {}\n",
                section.start_line,
                section.end_line,
                section.kind.as_str().cyan(),
                status
            ));
            if !section.status_data.is_empty() {
                output.push_str(&format!("  {} {}\n", "data:".dimmed(), section.status_data));
            }
        }
        output
    })
}

/// @ai:intent Render the enriched line stream with begin/end markers
/// @ai:effects pure
pub fn format_decorations(decorations: &[LineDecoration], format: OutputFormat) -> String {
    format_with(decorations, format, |decorations| {
        let mut output = String::new();
        let mut depth = 0usize;

        for line in decorations {
            if let (Some(nesting), Some(kind)) = (line.nesting, &line.kind) {
                let marker = match nesting {
                    Nesting::Outer => "┌",
                    Nesting::Inner => "├",
                };
                let status = line
                    .status
                    .map(|s| format!(" [{}]", status_colored(s)))
                    .unwrap_or_default();
                output.push_str(&format!(
                    "{}{} {} {}-{}{}\n",
                    "  ".repeat(depth),
                    marker.blue(),
                    kind.as_str().cyan().bold(),
                    line.start_line,
                    line.end_line,
                    status
                ));
                depth += 1;
            }

            output.push_str(&format!(
                "{:>5} {}{}\n",
                line.line_number.to_string().dimmed(),
                "  ".repeat(depth),
                line.text
            ));

            // No two stored sections share an end line.
            if line.closes_section {
                depth = depth.saturating_sub(1);
                output.push_str(&format!("{}{}\n", "  ".repeat(depth), "└".blue()));
            }
        }

        output
    })
}

/// @ai:intent Format mapped diagnostics
/// @ai:effects pure
pub fn format_diagnostics(diagnostics: &[Diagnostic], format: OutputFormat) -> String {
    format_with(diagnostics, format, |diagnostics| {
        let mut output = String::new();
        for diagnostic in diagnostics {
            let location = if diagnostic.is_attributed() {
                format!("line {}", diagnostic.source_line).yellow()
            } else {
                "unattributed".dimmed()
            };
            output.push_str(&format!("{} {}\n", location, diagnostic.text));
        }
        output.push_str(&format!(
            "\n{} diagnostics, {} attributed\n",
            diagnostics.len(),
            diagnostics.iter().filter(|d| d.is_attributed()).count()
        ));
        output
    })
}

/// @ai:intent Format an assembly listing, highlighting header blocks and source references
/// @ai:effects pure
pub fn format_listing(listing: &[ListingLine], format: OutputFormat) -> String {
    format_with(listing, format, |listing| {
        let mut output = String::new();
        let mut in_header = false;
        for line in listing {
            if let Some(marker) = line.marker {
                in_header = marker.class == MarkerClass::Header;
                output.push_str(&format!("{}\n", line.code.dimmed()));
            } else if in_header {
                output.push_str(&format!("{}\n", line.code.dimmed()));
            } else if line.source_line > 0 {
                output.push_str(&format!(
                    "{} {}\n",
                    format!("[{}]", line.source_line).yellow(),
                    line.code.green()
                ));
            } else {
                output.push_str(&format!("{}\n", line.code));
            }
        }
        output
    })
}

/// @ai:intent Format a directory scan as a per-file summary
/// @ai:effects pure
pub fn format_scan_report(report: &ScanReport, format: OutputFormat) -> String {
    format_with(report, format, |report| {
        let mut output = String::new();
        for file in &report.files {
            match &file.error {
                Some(error) => output.push_str(&format!(
                    "{} {} - {}\n",
                    "FAIL".red().bold(),
                    file.path.display().to_string().dimmed(),
                    error
                )),
                None => output.push_str(&format!(
                    "{} {} ({} lines, {} sections)\n",
                    "OK".green().bold(),
                    file.path.display(),
                    file.lines,
                    file.sections
                )),
            }
        }

        output.push('\n');
        if report.passed() {
            output.push_str(&format!(
                "{} Scanned {} files\n",
                "OK".green().bold(),
                report.files.len()
            ));
        } else {
            output.push_str(&format!(
                "Scanned {} files, {} failed\n",
                report.files.len(),
                report.failures.to_string().red().bold()
            ));
        }
        output
    })
}
