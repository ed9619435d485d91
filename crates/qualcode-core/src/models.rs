//! Core data models.
//!
//! These types represent the documents that flow from ingestion into the
//! tagging engine, and the rows the engine hands back for display.

use serde::Serialize;

/// One unit of text under analysis: a CSV row or a line of a text file.
///
/// `index` is positional (1-based) and is assigned by
/// [`TaggingEngine::reset`](crate::TaggingEngine::reset); whatever value a
/// caller puts there before the reset is overwritten. `fields` holds the
/// original source columns in source order and is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRecord {
    pub index: usize,
    pub text: String,
    pub fields: Vec<(String, String)>,
}

impl DocumentRecord {
    /// A record with no source columns besides its text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            index: 0,
            text: text.into(),
            fields: Vec::new(),
        }
    }

    /// A record carrying the given source columns.
    pub fn with_fields(text: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            index: 0,
            text: text.into(),
            fields,
        }
    }

    /// Look up an original column value by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A row of the assignment table as shown to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub document_id: usize,
    pub text: String,
    pub labels: String,
}
