//! Canonical identifier form.
//!
//! Every place that compares identifiers (dataset rows, directory listing,
//! destination filenames, metadata store keys) goes through [`Identifier::parse`]:
//! surrounding whitespace is trimmed, case is preserved, and anything that is not
//! safe as a single path component is rejected rather than rewritten.

use std::fmt;

/// Longest identifier accepted, in bytes. Leaves room for `.<ext>.part` under NAME_MAX (255).
pub const MAX_IDENTIFIER_LEN: usize = 200;

/// A trimmed, filesystem-safe dataset key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Normalizes `raw`. Returns `None` if the result would be empty, `.`/`..`, too long,
    /// or contains `/`, `\`, NUL or a control character.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
            return None;
        }
        if trimmed.len() > MAX_IDENTIFIER_LEN {
            return None;
        }
        if trimmed
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control())
        {
            return None;
        }
        Some(Identifier(trimmed.to_string()))
    }

    /// Recovers the identifier from a destination filename `<id>.<ext>`.
    /// The extension must match exactly and the stem must already be in canonical form,
    /// so `" A.pdf"` does not count as a download of `A`.
    pub fn from_file_name(name: &str, extension: &str) -> Option<Self> {
        let stem = name.strip_suffix(extension)?.strip_suffix('.')?;
        let id = Identifier::parse(stem)?;
        if id.0 != stem {
            return None;
        }
        Some(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Destination filename for this identifier: `<id>.<ext>`.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.0, extension)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
