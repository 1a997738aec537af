//! @ai:module:intent Merge stored sections and diagnostics into a flat per-line render stream
//! @ai:module:layer application
//! @ai:module:public_api enrich, LineDecoration, Nesting
//! @ai:module:depends_on section
//! @ai:module:stateless true

use crate::section::{Section, SectionKind, SectionStatus};
use serde::{Deserialize, Serialize};

/// @ai:intent Whether a section opening on a line is contained by another section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nesting {
    Outer,
    Inner,
}

impl Nesting {
    /// @ai:intent Style class used by the display layer
    pub fn css_class(&self) -> &'static str {
        match self {
            Nesting::Outer => "code-section-outer",
            Nesting::Inner => "code-section-inner",
        }
    }
}

/// @ai:intent Render decoration of one physical source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDecoration {
    pub line_number: usize,
    pub text: String,
    /// Interval of the section opening on this line, (0, 0) when none does.
    pub start_line: usize,
    pub end_line: usize,
    pub nesting: Option<Nesting>,
    pub kind: Option<SectionKind>,
    pub status: Option<SectionStatus>,
    pub closes_section: bool,
}

impl LineDecoration {
    /// @ai:intent Check whether the line carries no decoration at all
    pub fn is_plain(&self) -> bool {
        self.nesting.is_none() && !self.closes_section
    }
}

/// @ai:intent Produce one decoration per line from the stored sections
/// @ai:pre sections belong to the file whose lines are given
/// @ai:post result.len() == lines.len()
/// @ai:effects pure
pub fn enrich<S: AsRef<str>>(lines: &[S], sections: &[Section]) -> Vec<LineDecoration> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let number = idx + 1;
            let mut decoration = LineDecoration {
                line_number: number,
                text: line.as_ref().to_string(),
                start_line: 0,
                end_line: 0,
                nesting: None,
                kind: None,
                status: None,
                closes_section: sections.iter().any(|s| s.end_line == number),
            };

            if let Some(opening) = sections.iter().find(|s| s.start_line == number) {
                let contained = sections.iter().any(|other| other.strictly_contains(opening));
                decoration.start_line = opening.start_line;
                decoration.end_line = opening.end_line;
                decoration.kind = Some(opening.kind.clone());
                decoration.status = opening.status;
                decoration.nesting = Some(if contained {
                    Nesting::Inner
                } else {
                    Nesting::Outer
                });
            }

            decoration
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(start: usize, end: usize, kind: SectionKind) -> Section {
        Section {
            file_id: 1,
            start_line: start,
            end_line: end,
            kind,
            status: None,
            status_data: String::new(),
            snapshot: String::new(),
            name: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn test_single_comment_section() {
        let lines = ["line 1", "line 2", "line 3", "line 4", "line 5"];
        let decorations = enrich(&lines, &[section(1, 3, SectionKind::comment())]);

        assert_eq!(decorations.len(), 5);
        assert_eq!(decorations[0].nesting, Some(Nesting::Outer));
        assert_eq!(decorations[0].kind, Some(SectionKind::comment()));
        assert_eq!((decorations[0].start_line, decorations[0].end_line), (1, 3));
        assert!(!decorations[0].closes_section);
        assert!(decorations[2].closes_section);
        assert_eq!(decorations[2].nesting, None);
        for idx in [1, 3, 4] {
            assert!(decorations[idx].is_plain(), "line {}", idx + 1);
        }
        assert_eq!(decorations[4].text, "line 5");
    }

    #[test]
    fn test_nested_section_is_inner() {
        let lines = [""; 8];
        let mut inner = section(3, 4, SectionKind::variable());
        inner.status = Some(SectionStatus::CompiledWithWarnings);
        let sections = [section(2, 6, SectionKind::procedure()), inner];
        let decorations = enrich(&lines, &sections);

        assert_eq!(decorations[1].nesting, Some(Nesting::Outer));
        assert_eq!(decorations[2].nesting, Some(Nesting::Inner));
        assert_eq!(
            decorations[2].status,
            Some(SectionStatus::CompiledWithWarnings)
        );
        assert!(decorations[3].closes_section);
        assert!(decorations[5].closes_section);
        assert_eq!(Nesting::Inner.css_class(), "code-section-inner");
    }

    #[test]
    fn test_single_line_section_opens_and_closes() {
        let decorations = enrich(&["int x;"], &[section(1, 1, SectionKind::variable())]);
        assert_eq!(decorations[0].nesting, Some(Nesting::Outer));
        assert!(decorations[0].closes_section);
    }

    #[test]
    fn test_no_sections() {
        let decorations = enrich(&["a", "b"], &[]);
        assert!(decorations.iter().all(LineDecoration::is_plain));
    }
}
