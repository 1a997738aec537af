//! @ai:module:intent Segment a sequence of source lines into classified line ranges
//! @ai:module:layer application
//! @ai:module:public_api sectionize, sectionize_nested, sectionize_file, NESTED_DEPTH
//! @ai:module:depends_on classify, section, error
//! @ai:module:stateless true

use crate::classify::{classify, LineCategory};
use crate::error::{Error, Result};
use crate::section::{SectionKind, SectionSpan};

/// How many levels of procedure bodies are re-scanned for nested sections.
pub const NESTED_DEPTH: usize = 1;

/// @ai:intent Sectionize a whole file, including nested sections inside procedure bodies
/// @ai:post every span lies within 1..=lines.len()
/// @ai:effects pure
pub fn sectionize_file<S: AsRef<str>>(lines: &[S]) -> Result<Vec<SectionSpan>> {
    sectionize_nested(lines, 0, NESTED_DEPTH)
}

/// @ai:intent Sectionize lines, then re-scan procedure bodies up to `depth` levels deep
/// @ai:pre lines are numbered starting at line_offset + 1
/// @ai:post output order is unspecified; callers treat it as an unordered batch
/// @ai:effects pure
pub fn sectionize_nested<S: AsRef<str>>(
    lines: &[S],
    line_offset: usize,
    depth: usize,
) -> Result<Vec<SectionSpan>> {
    let mut spans = sectionize(lines, line_offset)?;
    if depth == 0 {
        return Ok(spans);
    }

    let mut nested = Vec::new();
    for span in spans.iter().filter(|s| s.kind.is_procedure()) {
        if span.start_line == span.end_line {
            continue;
        }
        // Body lines are strictly between the signature and the closing line.
        let body_start = span.start_line - line_offset;
        let body_end = span.end_line - line_offset - 1;
        let body = &lines[body_start..body_end];
        let inner = sectionize_nested(body, span.start_line, depth - 1)?;
        tracing::debug!(
            "Procedure {}-{} yielded {} nested sections",
            span.start_line,
            span.end_line,
            inner.len()
        );
        nested.extend(inner);
    }

    spans.extend(nested);
    Ok(spans)
}

/// @ai:intent Run one flat left-to-right pass over the lines
/// @ai:pre lines are numbered starting at line_offset + 1
/// @ai:post unterminated blocks yield Err(UnterminatedConstruct), never a truncated span
/// @ai:edge_cases runs of directives, variables or line comments may end at end of input
/// @ai:effects pure
pub fn sectionize<S: AsRef<str>>(lines: &[S], line_offset: usize) -> Result<Vec<SectionSpan>> {
    let scanner = Scanner {
        lines,
        line_offset,
    };
    let spans = scanner.scan()?;
    tracing::debug!(
        "Sectionized {} lines from offset {} into {} sections",
        lines.len(),
        line_offset,
        spans.len()
    );
    Ok(spans)
}

struct Scanner<'a, S> {
    lines: &'a [S],
    line_offset: usize,
}

impl<S: AsRef<str>> Scanner<'_, S> {
    fn scan(&self) -> Result<Vec<SectionSpan>> {
        let mut spans = Vec::new();
        let mut idx = 0;

        while idx < self.lines.len() {
            let (kind, end) = match classify(self.line(idx)) {
                Some(LineCategory::IfOpen) => (
                    SectionKind::directive(),
                    self.find_closing(idx, LineCategory::IfClose, "conditional directive block")?,
                ),
                Some(LineCategory::Directive) => {
                    (SectionKind::directive(), self.run_end(idx, LineCategory::Directive))
                }
                Some(LineCategory::VariableDecl) => {
                    (SectionKind::variable(), self.run_end(idx, LineCategory::VariableDecl))
                }
                Some(LineCategory::LineComment) => {
                    (SectionKind::comment(), self.run_end(idx, LineCategory::LineComment))
                }
                Some(LineCategory::InlineBlockComment) => (SectionKind::comment(), idx),
                Some(LineCategory::BlockCommentOpen) => (
                    SectionKind::comment(),
                    self.find_closing(idx, LineCategory::BlockCommentClose, "block comment")?,
                ),
                Some(LineCategory::ProcedureSignature) => (
                    SectionKind::procedure(),
                    self.match_brackets(idx, '{', '}', "procedure body")?,
                ),
                Some(LineCategory::AsmBraceOpen) => (
                    SectionKind::assembly(),
                    self.match_brackets(idx, '{', '}', "assembly block")?,
                ),
                Some(LineCategory::AsmParenOpen) => (
                    SectionKind::assembly(),
                    self.match_brackets(idx, '(', ')', "assembly statement")?,
                ),
                Some(LineCategory::AsmFloorOpen) => (
                    SectionKind::assembly(),
                    self.find_closing(idx, LineCategory::AsmFloorClose, "__asm block")?,
                ),
                Some(LineCategory::IfClose)
                | Some(LineCategory::BlockCommentClose)
                | Some(LineCategory::AsmFloorClose)
                | None => {
                    idx += 1;
                    continue;
                }
            };

            spans.push(SectionSpan::new(
                kind,
                self.line_number(idx),
                self.line_number(end),
            ));
            idx = end + 1;
        }

        Ok(spans)
    }

    fn line(&self, idx: usize) -> &str {
        self.lines[idx].as_ref()
    }

    fn line_number(&self, idx: usize) -> usize {
        self.line_offset + idx + 1
    }

    fn unterminated(&self, construct: &'static str, start: usize) -> Error {
        Error::UnterminatedConstruct {
            construct,
            start_line: self.line_number(start),
        }
    }

    /// Index of the last line in the run of `category` starting at `start`.
    fn run_end(&self, start: usize, category: LineCategory) -> usize {
        let mut end = start;
        while end + 1 < self.lines.len() && classify(self.line(end + 1)) == Some(category) {
            end += 1;
        }
        end
    }

    /// Index of the first line after `start` classified as `closing`.
    fn find_closing(
        &self,
        start: usize,
        closing: LineCategory,
        construct: &'static str,
    ) -> Result<usize> {
        (start + 1..self.lines.len())
            .find(|&idx| classify(self.line(idx)) == Some(closing))
            .ok_or_else(|| self.unterminated(construct, start))
    }

    /// Index of the line where the bracket depth opened at or after `start` returns to zero.
    fn match_brackets(
        &self,
        start: usize,
        open: char,
        close: char,
        construct: &'static str,
    ) -> Result<usize> {
        let mut idx = start;
        let mut seen = false;
        let mut depth: i64 = 0;

        loop {
            for ch in self.line(idx).chars() {
                if ch == open {
                    depth += 1;
                    seen = true;
                } else if ch == close {
                    depth -= 1;
                    seen = true;
                }
            }

            if seen && depth <= 0 {
                return Ok(idx);
            }

            idx += 1;
            if idx >= self.lines.len() {
                return Err(self.unterminated(construct, start));
            }
        }
    }
}
