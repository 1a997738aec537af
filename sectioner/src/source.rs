//! @ai:module:intent Hold the line sequence of one stored source file
//! @ai:module:layer domain
//! @ai:module:public_api SourceLines
//! @ai:module:stateless true

use crate::error::{Error, Result};
use std::path::Path;

/// @ai:intent Ordered text lines of one file, addressed 1-indexed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceLines {
    lines: Vec<String>,
    /// Whether the text this came from ended in a newline that was stripped.
    trailing_newline: bool,
}

impl SourceLines {
    /// @ai:intent Split stored text on '\n' exactly
    /// @ai:example ("a\nb") -> ["a", "b"]
    /// @ai:example ("a\n") -> ["a", ""]
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            trailing_newline: false,
        }
    }

    /// @ai:intent Build lines from uploaded text, dropping one trailing newline
    /// @ai:example ("a\nb\n") -> ["a", "b"]
    pub fn from_upload(text: &str) -> Self {
        match text.strip_suffix('\n') {
            Some(stripped) => Self {
                trailing_newline: true,
                ..Self::from_text(stripped)
            },
            None => Self::from_text(text),
        }
    }

    /// @ai:intent Read a source file from disk
    /// @ai:effects fs:read
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::from_upload(&text))
    }

    /// @ai:intent Write the lines back to disk joined by '\n'
    /// @ai:post a newline stripped by from_upload is restored
    /// @ai:effects fs:write
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut text = self.to_text();
        if self.trailing_newline {
            text.push('\n');
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// @ai:intent Check that a closed 1-indexed range lies within the file
    /// @ai:effects pure
    pub fn check_range(&self, start: usize, end: usize) -> Result<()> {
        if start == 0 || start > end || end > self.len() {
            return Err(Error::RangeInvalid {
                start,
                end,
                total: self.len(),
            });
        }
        Ok(())
    }

    /// @ai:intent Text of the closed 1-indexed range joined by '\n'
    /// @ai:pre check_range(start, end) is Ok
    pub fn snapshot(&self, start: usize, end: usize) -> Result<String> {
        self.check_range(start, end)?;
        Ok(self.lines[start - 1..end].join("\n"))
    }

    /// @ai:intent Physically remove a closed 1-indexed range of lines
    /// @ai:post len() shrinks by end - start + 1
    /// @ai:effects state:write
    pub fn delete_range(&mut self, start: usize, end: usize) -> Result<()> {
        self.check_range(start, end)?;
        self.lines.drain(start - 1..end);
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for SourceLines {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
            trailing_newline: false,
        }
    }
}
