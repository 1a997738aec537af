//! @ai:module:intent Render compile reports for the terminal and as JSON files
//! @ai:module:layer infrastructure
//! @ai:module:public_api format_report, save_report
//! @ai:module:depends_on session, sectioner::output

use crate::session::CompileReport;
use anyhow::Result;
use colored::Colorize;
use sectioner::output::{self, OutputFormat};
use sectioner::SectionStatus;
use std::path::Path;

/// @ai:intent Format a compile report
/// @ai:effects pure
pub fn format_report(report: &CompileReport, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => output::to_json(report, false),
        OutputFormat::JsonPretty => output::to_json(report, true),
        OutputFormat::Text => format_text(report),
    }
}

fn format_text(report: &CompileReport) -> String {
    let mut text = String::new();

    let status = match report.status {
        SectionStatus::DoesNotCompile => report.status.label().red().bold(),
        SectionStatus::CompiledWithWarnings => report.status.label().yellow().bold(),
        SectionStatus::CompiledWithoutWarnings => report.status.label().green().bold(),
    };
    text.push_str(&format!(
        "{} {} ({})\n",
        status,
        report.source_name,
        report.options.to_args().join(" ").dimmed()
    ));
    text.push_str(&format!(
        "{} {}\n\n",
        "at".dimmed(),
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if report.compiled() {
        text.push_str(&output::format_listing(&report.listing, OutputFormat::Text));
    } else {
        for line in &report.error_lines {
            if line.source_line > 0 {
                text.push_str(&format!(
                    "{} {}\n",
                    format!("[{}]", line.source_line).yellow(),
                    line.text.red()
                ));
            } else {
                text.push_str(&format!("{}\n", line.text));
            }
        }
    }

    let annotation = &report.annotation;
    text.push_str(&format!(
        "\n{} diagnostics applied to {} sections, {} sections marked '{}'\n",
        annotation.diagnostics_applied,
        annotation.section_updates,
        annotation.pending_assigned,
        annotation.residual_status
    ));
    text
}

/// @ai:intent Write a compile report as pretty JSON
/// @ai:effects fs:write
pub fn save_report(report: &CompileReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    tracing::info!("Report saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CompileOptions;
    use chrono::{TimeZone, Utc};
    use sectioner::{AnnotationSummary, Diagnostic, ErrorLine};
    use tempfile::TempDir;

    fn failed_report() -> CompileReport {
        CompileReport {
            file_id: 1,
            source_name: "source.c".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 19, 12, 0, 0).unwrap(),
            options: CompileOptions::default(),
            status: SectionStatus::DoesNotCompile,
            annotation: AnnotationSummary {
                status: SectionStatus::DoesNotCompile,
                residual_status: SectionStatus::DoesNotCompile,
                diagnostics_applied: 1,
                section_updates: 2,
                pending_assigned: 3,
            },
            diagnostics: vec![Diagnostic {
                source_line: 4,
                text: "4: syntax error: token -> '}'".to_string(),
            }],
            listing: vec![],
            error_lines: vec![
                ErrorLine {
                    text: "source.c:4: syntax error: token -> '}'".to_string(),
                    source_line: 4,
                },
                ErrorLine {
                    text: String::new(),
                    source_line: 0,
                },
            ],
            stdout: String::new(),
        }
    }

    #[test]
    fn test_text_report_for_failed_compile() {
        colored::control::set_override(false);
        let text = format_report(&failed_report(), OutputFormat::Text);

        assert!(text.starts_with("Does not compile source.c (--std-c99 -mmcs51)"));
        assert!(text.contains("2026-01-19 12:00:00 UTC"));
        assert!(text.contains("[4] source.c:4: syntax error"));
        assert!(text.contains("1 diagnostics applied to 2 sections, 3 sections marked 'Does not compile'"));
    }

    #[test]
    fn test_json_report_uses_status_labels() {
        let json = format_report(&failed_report(), OutputFormat::Json);
        assert!(json.contains(r#""status":"Does not compile""#));
        assert!(json.contains(r#""timestamp":"2026-01-19T12:00:00Z""#));
    }

    #[test]
    fn test_save_report() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("report.json");

        save_report(&failed_report(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("syntax error"));
    }
}
