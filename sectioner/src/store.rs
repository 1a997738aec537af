//! @ai:module:intent Persist sections per file and enforce the containment-only overlap invariant
//! @ai:module:layer infrastructure
//! @ai:module:public_api SectionStore, NewSection
//! @ai:module:depends_on section, source, sectionize, error
//! @ai:module:stateless false
//! @ai:module:thread_safe true

use crate::error::{Error, Result};
use crate::section::{FileId, KindRegistry, Section, SectionSpan, SectionStatus};
use crate::sectionize::sectionize_file;
use crate::source::SourceLines;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// @ai:intent A section to create, with optional descriptive fields
#[derive(Debug, Clone, Default)]
pub struct NewSection {
    pub kind: String,
    pub start_line: usize,
    pub end_line: usize,
    pub name: String,
    pub description: String,
}

impl From<&SectionSpan> for NewSection {
    fn from(span: &SectionSpan) -> Self {
        Self {
            kind: span.kind.as_str().to_string(),
            start_line: span.start_line,
            end_line: span.end_line,
            ..Default::default()
        }
    }
}

type FileSections = Arc<Mutex<Vec<Section>>>;

/// @ai:intent In-memory section repository with one lock per file
#[derive(Debug, Default)]
pub struct SectionStore {
    kinds: KindRegistry,
    files: Mutex<HashMap<FileId, FileSections>>,
}

/// On-disk layout of a saved store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    kinds: KindRegistry,
    files: BTreeMap<FileId, Vec<Section>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SectionStore {
    /// @ai:intent Create an empty store accepting the given kinds
    pub fn new(kinds: KindRegistry) -> Self {
        Self {
            kinds,
            files: Mutex::new(HashMap::new()),
        }
    }

    pub fn kinds(&self) -> &KindRegistry {
        &self.kinds
    }

    pub fn kinds_mut(&mut self) -> &mut KindRegistry {
        &mut self.kinds
    }

    /// Sections of one file; holding the slot's lock serializes all mutations of that file.
    fn slot(&self, file: FileId) -> FileSections {
        let mut files = lock(&self.files);
        Arc::clone(files.entry(file).or_default())
    }

    /// @ai:intent Get all sections stored for a file, in insertion order
    /// @ai:effects state:read
    pub fn get(&self, file: FileId) -> Vec<Section> {
        let slot = self.slot(file);
        let sections = lock(&slot);
        sections.clone()
    }

    /// @ai:intent Ids of every file that currently has sections
    pub fn file_ids(&self) -> Vec<FileId> {
        let files = lock(&self.files);
        let mut ids: Vec<FileId> = files
            .iter()
            .filter(|(_, sections)| !lock(sections).is_empty())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// @ai:intent Insert a batch, validating each section against everything stored so far
    /// @ai:pre lines is the current content of `file`
    /// @ai:post on error, sections inserted before the failing one remain stored
    /// @ai:effects state:write
    pub fn insert(&self, file: FileId, lines: &SourceLines, batch: &[SectionSpan]) -> Result<usize> {
        let slot = self.slot(file);
        let mut sections = lock(&slot);
        self.insert_locked(&mut sections, file, lines, batch.iter().map(NewSection::from))
    }

    /// @ai:intent Insert a batch all-or-nothing
    /// @ai:post on error, the stored sections are unchanged
    /// @ai:effects state:write
    pub fn insert_atomic(
        &self,
        file: FileId,
        lines: &SourceLines,
        batch: &[SectionSpan],
    ) -> Result<usize> {
        let slot = self.slot(file);
        let mut sections = lock(&slot);
        let mut scratch = sections.clone();
        let inserted =
            self.insert_locked(&mut scratch, file, lines, batch.iter().map(NewSection::from))?;
        *sections = scratch;
        Ok(inserted)
    }

    /// @ai:intent Create a single section with a name and description
    /// @ai:effects state:write
    pub fn create(&self, file: FileId, lines: &SourceLines, section: NewSection) -> Result<Section> {
        let slot = self.slot(file);
        let mut sections = lock(&slot);
        let section = self.build_section(&sections, file, lines, section)?;
        sections.push(section.clone());
        Ok(section)
    }

    fn insert_locked(
        &self,
        sections: &mut Vec<Section>,
        file: FileId,
        lines: &SourceLines,
        batch: impl IntoIterator<Item = NewSection>,
    ) -> Result<usize> {
        let mut inserted = 0;
        for new in batch {
            let section = self.build_section(sections, file, lines, new)?;
            tracing::debug!(
                "Inserted {} section {}-{} for file {}",
                section.kind,
                section.start_line,
                section.end_line,
                file
            );
            sections.push(section);
            inserted += 1;
        }
        Ok(inserted)
    }

    fn build_section(
        &self,
        existing: &[Section],
        file: FileId,
        lines: &SourceLines,
        new: NewSection,
    ) -> Result<Section> {
        let (start, end) = (new.start_line, new.end_line);
        lines.check_range(start, end)?;
        check_conflicts(existing, start, end)?;
        let kind = self.kinds.resolve(&new.kind)?;

        Ok(Section {
            file_id: file,
            start_line: start,
            end_line: end,
            kind,
            status: None,
            status_data: String::new(),
            snapshot: lines.snapshot(start, end)?,
            name: new.name,
            description: new.description,
        })
    }

    /// @ai:intent Delete every section of a file
    /// @ai:effects state:write
    pub fn clear(&self, file: FileId) {
        let slot = self.slot(file);
        lock(&slot).clear();
    }

    /// @ai:intent Delete the section with exactly this interval
    /// @ai:post returns false when no such section existed (not an error)
    /// @ai:effects state:write
    pub fn delete(&self, file: FileId, start_line: usize, end_line: usize) -> bool {
        let slot = self.slot(file);
        let mut sections = lock(&slot);
        let before = sections.len();
        sections.retain(|s| !(s.start_line == start_line && s.end_line == end_line));
        before != sections.len()
    }

    /// @ai:intent Delete the section with exactly this interval together with the lines it covers
    /// @ai:post Ok(false) leaves both the store and `lines` untouched
    /// @ai:post surviving sections keep their old line numbers until the file is reparsed
    /// @ai:effects state:write
    pub fn remove_section(
        &self,
        file: FileId,
        lines: &mut SourceLines,
        start_line: usize,
        end_line: usize,
    ) -> Result<bool> {
        lines.check_range(start_line, end_line)?;
        if !self.delete(file, start_line, end_line) {
            return Ok(false);
        }
        lines.delete_range(start_line, end_line)?;
        Ok(true)
    }

    /// @ai:intent Re-sectionize a file and replace its stored sections in one locked step
    /// @ai:post the store holds exactly the new batch, or the prefix inserted before an error
    /// @ai:effects state:write
    pub fn reparse(&self, file: FileId, lines: &SourceLines) -> Result<usize> {
        let spans = sectionize_file(lines.lines())?;
        let slot = self.slot(file);
        let mut sections = lock(&slot);
        sections.clear();
        let inserted =
            self.insert_locked(&mut sections, file, lines, spans.iter().map(NewSection::from))?;
        tracing::info!("Reparsed file {}: {} sections", file, inserted);
        Ok(inserted)
    }

    /// @ai:intent Set a status on every section that has none yet
    /// @ai:effects state:write
    pub fn assign_pending_status(&self, file: FileId, status: SectionStatus) -> usize {
        let slot = self.slot(file);
        let mut sections = lock(&slot);
        let mut updated = 0;
        for section in sections.iter_mut().filter(|s| s.status.is_none()) {
            section.status = Some(status);
            updated += 1;
        }
        updated
    }

    /// @ai:intent Clear status and status data of every section of a file
    /// @ai:effects state:write
    pub fn reset_statuses(&self, file: FileId) {
        let slot = self.slot(file);
        let mut sections = lock(&slot);
        for section in sections.iter_mut() {
            section.status = None;
            section.status_data.clear();
        }
    }

    /// @ai:intent Attach a diagnostic to every section containing the line
    /// @ai:post each touched section's status_data ends with "<text>,"
    /// @ai:edge_cases a line inside nested sections updates both inner and outer
    /// @ai:effects state:write
    pub fn append_diagnostic(
        &self,
        file: FileId,
        status: SectionStatus,
        source_line: usize,
        text: &str,
    ) -> usize {
        let slot = self.slot(file);
        let mut sections = lock(&slot);
        let mut updated = 0;
        for section in sections.iter_mut().filter(|s| s.contains_line(source_line)) {
            section.status = Some(status);
            section.status_data.push_str(text);
            section.status_data.push(',');
            updated += 1;
        }
        updated
    }

    /// @ai:intent Save every file's sections as JSON
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = StoreSnapshot {
            kinds: self.kinds.clone(),
            files: self
                .file_ids()
                .into_iter()
                .map(|id| (id, self.get(id)))
                .collect(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(())
    }

    /// @ai:intent Load a store saved by `save`; a missing file yields an empty store
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
        let files = snapshot
            .files
            .into_iter()
            .map(|(id, sections)| (id, Arc::new(Mutex::new(sections))))
            .collect();

        Ok(Self {
            kinds: snapshot.kinds,
            files: Mutex::new(files),
        })
    }
}

/// @ai:intent Reject a range that shares an endpoint with, or partially overlaps, a stored one
/// @ai:effects pure
fn check_conflicts(existing: &[Section], start: usize, end: usize) -> Result<()> {
    let conflict = existing.iter().find(|s| {
        let straddles_end = s.start_line > start && s.end_line > end && s.start_line <= end;
        let straddles_start = s.start_line < start && s.end_line < end && s.end_line >= start;
        straddles_end || straddles_start || s.start_line == start || s.end_line == end
    });

    match conflict {
        Some(s) => Err(Error::RangeConflict {
            start,
            end,
            existing_start: s.start_line,
            existing_end: s.end_line,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::SectionKind;
    use std::collections::HashSet;

    const FILE: FileId = 7;
    const OTHER: FileId = 8;

    fn lines(count: usize) -> SourceLines {
        (1..=count).map(|n| format!("line {}", n)).collect()
    }

    fn span(start: usize, end: usize) -> SectionSpan {
        SectionSpan::new(SectionKind::comment(), start, end)
    }

    fn ranges(store: &SectionStore) -> Vec<(usize, usize)> {
        store
            .get(FILE)
            .iter()
            .map(|s| (s.start_line, s.end_line))
            .collect()
    }

    #[test]
    fn test_insert_disjoint_and_nested() {
        let store = SectionStore::default();
        let batch = [span(1, 50), span(5, 10), span(31, 35), span(51, 60)];
        assert_eq!(store.insert(FILE, &lines(60), &batch).unwrap(), 4);
        assert_eq!(ranges(&store), vec![(1, 50), (5, 10), (31, 35), (51, 60)]);
    }

    #[test]
    fn test_insert_records_snapshot_and_empty_status() {
        let store = SectionStore::default();
        store.insert(FILE, &lines(5), &[span(2, 3)]).unwrap();
        let section = &store.get(FILE)[0];
        assert_eq!(section.snapshot, "line 2\nline 3");
        assert_eq!(section.status, None);
        assert_eq!(section.status_data, "");
    }

    #[test]
    fn test_range_out_of_bounds() {
        let store = SectionStore::default();
        for (start, end) in [(0, 2), (3, 2), (4, 6), (6, 6)] {
            let err = store.insert(FILE, &lines(5), &[span(start, end)]).unwrap_err();
            assert!(matches!(err, Error::RangeInvalid { .. }), "{}-{}", start, end);
        }
        assert!(store.get(FILE).is_empty());
    }

    #[test]
    fn test_partial_overlap_conflicts() {
        let store = SectionStore::default();
        store.insert(FILE, &lines(20), &[span(5, 10)]).unwrap();
        for (start, end) in [(3, 7), (8, 12), (10, 15), (1, 5)] {
            let err = store.insert(FILE, &lines(20), &[span(start, end)]).unwrap_err();
            assert!(matches!(err, Error::RangeConflict { .. }), "{}-{}", start, end);
        }
    }

    #[test]
    fn test_shared_endpoint_conflicts_even_when_nested() {
        let store = SectionStore::default();
        store.insert(FILE, &lines(20), &[span(5, 10)]).unwrap();
        assert!(store.insert(FILE, &lines(20), &[span(5, 8)]).is_err());
        assert!(store.insert(FILE, &lines(20), &[span(2, 10)]).is_err());
        assert!(store.insert(FILE, &lines(20), &[span(5, 10)]).is_err());
    }

    #[test]
    fn test_batch_failure_keeps_earlier_inserts() {
        let store = SectionStore::default();
        let batch = [span(1, 4), span(6, 8), span(3, 7), span(9, 9)];
        let err = store.insert(FILE, &lines(10), &batch).unwrap_err();
        assert!(matches!(err, Error::RangeConflict { start: 3, end: 7, .. }));
        assert_eq!(ranges(&store), vec![(1, 4), (6, 8)]);
    }

    #[test]
    fn test_atomic_batch_failure_leaves_store_untouched() {
        let store = SectionStore::default();
        store.insert(FILE, &lines(10), &[span(1, 2)]).unwrap();
        let batch = [span(4, 5), span(5, 6)];
        assert!(store.insert_atomic(FILE, &lines(10), &batch).is_err());
        assert_eq!(ranges(&store), vec![(1, 2)]);

        store.insert_atomic(FILE, &lines(10), &[span(4, 5)]).unwrap();
        assert_eq!(ranges(&store), vec![(1, 2), (4, 5)]);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let store = SectionStore::default();
        let batch = [SectionSpan::new(SectionKind::new("macro"), 1, 2)];
        let err = store.insert(FILE, &lines(3), &batch).unwrap_err();
        assert!(matches!(err, Error::UnknownKind(_)));

        let mut store = SectionStore::default();
        store.kinds_mut().register("macro");
        assert!(store.insert(FILE, &lines(3), &batch).is_ok());
    }

    #[test]
    fn test_create_keeps_name_and_description() {
        let store = SectionStore::default();
        let section = store
            .create(
                FILE,
                &lines(4),
                NewSection {
                    kind: "procedure".to_string(),
                    start_line: 1,
                    end_line: 4,
                    name: "main".to_string(),
                    description: "entry point".to_string(),
                },
            )
            .unwrap();
        assert_eq!(section.name, "main");
        assert_eq!(store.get(FILE)[0].description, "entry point");
    }

    #[test]
    fn test_files_are_independent() {
        let store = SectionStore::default();
        store.insert(1, &lines(5), &[span(1, 3)]).unwrap();
        store.insert(2, &lines(5), &[span(1, 3)]).unwrap();
        store.clear(1);
        assert!(store.get(1).is_empty());
        assert_eq!(store.get(2).len(), 1);
        assert_eq!(store.file_ids(), vec![2]);
    }

    #[test]
    fn test_delete_exact_range_only() {
        let store = SectionStore::default();
        store.insert(FILE, &lines(10), &[span(1, 5), span(2, 3)]).unwrap();
        assert!(!store.delete(FILE, 1, 3));
        assert!(store.delete(FILE, 2, 3));
        assert_eq!(ranges(&store), vec![(1, 5)]);
    }

    #[test]
    fn test_append_diagnostic_updates_nested_sections() {
        let store = SectionStore::default();
        store
            .insert(FILE, &lines(20), &[span(1, 10), span(3, 6), span(12, 15)])
            .unwrap();
        let status = SectionStatus::CompiledWithWarnings;
        assert_eq!(store.append_diagnostic(FILE, status, 4, "Text 1"), 2);
        store.append_diagnostic(FILE, status, 4, "Text 1");

        let sections = store.get(FILE);
        assert_eq!(sections[0].status_data, "Text 1,Text 1,");
        assert_eq!(sections[1].status_data, "Text 1,Text 1,");
        assert_eq!(sections[1].status, Some(status));
        assert_eq!(sections[2].status, None);
        assert_eq!(sections[2].status_data, "");
    }

    #[test]
    fn test_assign_pending_status_skips_annotated() {
        let store = SectionStore::default();
        store.insert(FILE, &lines(10), &[span(1, 2), span(5, 6)]).unwrap();
        store.append_diagnostic(FILE, SectionStatus::CompiledWithWarnings, 1, "w");

        let updated = store.assign_pending_status(FILE, SectionStatus::CompiledWithoutWarnings);
        assert_eq!(updated, 1);
        let sections = store.get(FILE);
        assert_eq!(sections[0].status, Some(SectionStatus::CompiledWithWarnings));
        assert_eq!(sections[1].status, Some(SectionStatus::CompiledWithoutWarnings));
    }

    #[test]
    fn test_reset_statuses() {
        let store = SectionStore::default();
        store.insert(FILE, &lines(3), &[span(1, 2)]).unwrap();
        store.append_diagnostic(FILE, SectionStatus::DoesNotCompile, 2, "error");
        store.reset_statuses(FILE);
        let section = &store.get(FILE)[0];
        assert_eq!(section.status, None);
        assert_eq!(section.status_data, "");
    }

    #[test]
    fn test_reparse_replaces_previous_sections() {
        let store = SectionStore::default();
        let source = SourceLines::from_text("// a\nint main(void) {\n  int x;\n}");
        store.insert(FILE, &source, &[span(1, 4)]).unwrap();

        assert_eq!(store.reparse(FILE, &source).unwrap(), 3);
        let mut found = ranges(&store);
        found.sort();
        assert_eq!(found, vec![(1, 1), (2, 4), (3, 3)]);
    }

    #[test]
    fn test_reparse_surfaces_unterminated_construct() {
        let store = SectionStore::default();
        let source = SourceLines::from_text("/* never closed\nint x;");
        store.insert(FILE, &source, &[span(2, 2)]).unwrap();
        assert!(matches!(
            store.reparse(FILE, &source),
            Err(Error::UnterminatedConstruct { .. })
        ));
        assert_eq!(ranges(&store), vec![(2, 2)]);
    }

    #[test]
    fn test_reparse_and_delete_serialize_per_file() {
        let store = SectionStore::default();
        let first = SourceLines::from_text(
            "// header\nint counter;\nint main(void) {\n  int x;\n}\n/* done */",
        );
        let second = SourceLines::from_text("#include <stdint.h>\nuint8_t flag;");
        let batch = sectionize_file(first.lines()).unwrap();
        store.reparse(OTHER, &second).unwrap();
        let other_before = store.get(OTHER);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        assert_eq!(store.reparse(FILE, &first).unwrap(), batch.len());
                        store.delete(FILE, 2, 2);
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..50 {
                    store.reparse(OTHER, &second).unwrap();
                }
            });
        });

        // Every thread finishes with a delete, so the last write to FILE is one.
        let mut expected: Vec<(usize, usize)> = batch
            .iter()
            .map(|s| (s.start_line, s.end_line))
            .filter(|&range| range != (2, 2))
            .collect();
        expected.sort();
        let mut found = ranges(&store);
        found.sort();
        assert_eq!(found, expected);

        let starts: HashSet<usize> = found.iter().map(|r| r.0).collect();
        let ends: HashSet<usize> = found.iter().map(|r| r.1).collect();
        assert_eq!(starts.len(), found.len());
        assert_eq!(ends.len(), found.len());

        assert_eq!(store.get(OTHER), other_before);
    }

    #[test]
    fn test_remove_section_deletes_lines() {
        let store = SectionStore::default();
        let mut source = lines(5);
        store.insert(FILE, &source, &[span(2, 3), span(5, 5)]).unwrap();

        assert!(store.remove_section(FILE, &mut source, 2, 3).unwrap());
        assert_eq!(source.to_text(), "line 1\nline 4\nline 5");
        assert_eq!(ranges(&store), vec![(5, 5)]);
    }

    #[test]
    fn test_remove_section_without_match_touches_nothing() {
        let store = SectionStore::default();
        let mut source = lines(5);
        store.insert(FILE, &source, &[span(2, 3)]).unwrap();

        assert!(!store.remove_section(FILE, &mut source, 2, 2).unwrap());
        assert_eq!(source.len(), 5);
        assert_eq!(ranges(&store), vec![(2, 3)]);
        assert!(matches!(
            store.remove_section(FILE, &mut source, 4, 9),
            Err(Error::RangeInvalid { .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sections.json");

        let mut store = SectionStore::default();
        store.kinds_mut().register("macro");
        store.insert(FILE, &lines(5), &[span(1, 3)]).unwrap();
        store.append_diagnostic(FILE, SectionStatus::DoesNotCompile, 2, "oops");
        store.save(&path).unwrap();

        let loaded = SectionStore::load(&path).unwrap();
        assert_eq!(loaded.get(FILE), store.get(FILE));
        assert!(loaded.kinds().contains("macro"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SectionStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.file_ids().is_empty());
    }
}
