//! @ai:module:intent Define data structures for classified source sections
//! @ai:module:layer domain
//! @ai:module:public_api FileId, SectionKind, KindRegistry, SectionStatus, SectionSpan, Section
//! @ai:module:stateless true

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// @ai:intent Identity of a stored source file (owned by the file collaborator)
pub type FileId = u64;

pub const DIRECTIVE: &str = "directive";
pub const VARIABLE: &str = "variable";
pub const PROCEDURE: &str = "procedure";
pub const COMMENT: &str = "comment";
pub const ASSEMBLY: &str = "assembly";

/// Kinds every registry starts with.
pub const BUILTIN_KINDS: [&str; 5] = [DIRECTIVE, VARIABLE, PROCEDURE, COMMENT, ASSEMBLY];

/// @ai:intent Named category of a section, open to administrator-defined kinds
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionKind(String);

impl SectionKind {
    /// @ai:intent Create a kind from any name without registry validation
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn directive() -> Self {
        Self::new(DIRECTIVE)
    }

    pub fn variable() -> Self {
        Self::new(VARIABLE)
    }

    pub fn procedure() -> Self {
        Self::new(PROCEDURE)
    }

    pub fn comment() -> Self {
        Self::new(COMMENT)
    }

    pub fn assembly() -> Self {
        Self::new(ASSEMBLY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// @ai:intent Check whether this is the procedure kind (eligible for nested re-scan)
    pub fn is_procedure(&self) -> bool {
        self.0 == PROCEDURE
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// @ai:intent Set of section kind names accepted by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindRegistry {
    names: BTreeSet<String>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self {
            names: BUILTIN_KINDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl KindRegistry {
    /// @ai:intent Register an additional kind name
    /// @ai:post contains(name) is true
    pub fn register(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// @ai:intent Resolve a kind name, failing when it is not registered
    /// @ai:example ("comment") -> Ok(SectionKind("comment"))
    /// @ai:example ("widget") -> Err(UnknownKind)
    pub fn resolve(&self, name: &str) -> Result<SectionKind> {
        if self.contains(name) {
            Ok(SectionKind::new(name))
        } else {
            Err(Error::UnknownKind(name.to_string()))
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// @ai:intent Compile-result label attached to a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionStatus {
    #[serde(rename = "Does not compile")]
    DoesNotCompile,
    #[serde(rename = "Compiled with warnings")]
    CompiledWithWarnings,
    #[serde(rename = "Compiled without warnings")]
    CompiledWithoutWarnings,
}

impl SectionStatus {
    pub const ALL: [SectionStatus; 3] = [
        SectionStatus::DoesNotCompile,
        SectionStatus::CompiledWithWarnings,
        SectionStatus::CompiledWithoutWarnings,
    ];

    /// @ai:intent Human-readable label used for storage and display
    pub fn label(&self) -> &'static str {
        match self {
            SectionStatus::DoesNotCompile => "Does not compile",
            SectionStatus::CompiledWithWarnings => "Compiled with warnings",
            SectionStatus::CompiledWithoutWarnings => "Compiled without warnings",
        }
    }
}

impl fmt::Display for SectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SectionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| Error::UnknownStatus(s.to_string()))
    }
}

/// @ai:intent A classified closed line interval produced by the sectionizer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionSpan {
    pub kind: SectionKind,
    pub start_line: usize,
    pub end_line: usize,
}

impl SectionSpan {
    pub fn new(kind: SectionKind, start_line: usize, end_line: usize) -> Self {
        Self {
            kind,
            start_line,
            end_line,
        }
    }
}

/// @ai:intent A persisted section record over one file's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub file_id: FileId,
    pub start_line: usize,
    pub end_line: usize,
    pub kind: SectionKind,
    pub status: Option<SectionStatus>,
    #[serde(default)]
    pub status_data: String,
    /// Text of the covered lines when the section was created.
    pub snapshot: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Section {
    /// @ai:intent Check if the closed interval contains a line number
    /// @ai:effects pure
    pub fn contains_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    /// @ai:intent Check if this section strictly contains another (both endpoints distinct)
    /// @ai:effects pure
    pub fn strictly_contains(&self, other: &Section) -> bool {
        self.start_line < other.start_line && self.end_line > other.end_line
    }

    pub fn span(&self) -> SectionSpan {
        SectionSpan::new(self.kind.clone(), self.start_line, self.end_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(start: usize, end: usize) -> Section {
        Section {
            file_id: 1,
            start_line: start,
            end_line: end,
            kind: SectionKind::comment(),
            status: None,
            status_data: String::new(),
            snapshot: String::new(),
            name: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn test_status_labels_round_trip_through_from_str() {
        for status in SectionStatus::ALL {
            assert_eq!(status.label().parse::<SectionStatus>().unwrap(), status);
        }
        assert!(matches!(
            "Compiled".parse::<SectionStatus>(),
            Err(Error::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&SectionStatus::DoesNotCompile).unwrap();
        assert_eq!(json, "\"Does not compile\"");
    }

    #[test]
    fn test_registry_accepts_builtin_and_registered_kinds() {
        let mut registry = KindRegistry::default();
        assert!(registry.resolve("assembly").is_ok());
        assert!(matches!(registry.resolve("macro"), Err(Error::UnknownKind(_))));

        registry.register("macro");
        assert_eq!(registry.resolve("macro").unwrap().as_str(), "macro");
    }

    #[test]
    fn test_contains_line_is_inclusive() {
        let s = section(3, 7);
        assert!(s.contains_line(3));
        assert!(s.contains_line(7));
        assert!(!s.contains_line(2));
        assert!(!s.contains_line(8));
    }

    #[test]
    fn test_strict_containment_requires_distinct_endpoints() {
        assert!(section(1, 10).strictly_contains(&section(2, 9)));
        assert!(!section(1, 10).strictly_contains(&section(1, 9)));
        assert!(!section(1, 10).strictly_contains(&section(2, 10)));
    }
}
