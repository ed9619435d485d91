//! The coding (tagging) engine.
//!
//! Owns the label vocabulary and the per-document assignment table and is
//! the only sanctioned mutation path for both. Every operation is a
//! synchronous function of (prior state, input); failures are detected
//! before anything is written, so a rejected call never leaves partial
//! changes behind.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`add_label`](TaggingEngine::add_label) | Add a label to the vocabulary (idempotent) |
//! | [`apply_label`](TaggingEngine::apply_label) | Apply a label to one document (idempotent) |
//! | [`serialize_assignments`](TaggingEngine::serialize_assignments) | Build the coded table for export |
//! | [`reset`](TaggingEngine::reset) | Replace the document set, keeping the vocabulary |
//!
//! Labels are never removed, and the vocabulary survives a reset.

use tracing::debug;

use crate::error::TagError;
use crate::models::{DisplayRow, DocumentRecord};
use crate::table::{CodedTable, LABELS_COLUMN, LABEL_DELIMITER};

/// Column used when no document carries source columns of its own.
const TEXT_COLUMN: &str = "text";

#[derive(Debug, Clone)]
pub struct TaggingEngine {
    labels: Vec<String>,
    documents: Vec<DocumentRecord>,
    // Parallel to `documents`: assignments[i] belongs to document i + 1.
    assignments: Vec<Vec<String>>,
    columns: Vec<String>,
}

impl Default for TaggingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TaggingEngine {
    /// An engine with no documents and an empty vocabulary.
    pub fn new() -> Self {
        Self {
            labels: Vec::new(),
            documents: Vec::new(),
            assignments: Vec::new(),
            columns: derive_columns(&[]),
        }
    }

    /// An engine loaded with `documents`.
    pub fn with_documents(documents: Vec<DocumentRecord>) -> Self {
        let mut engine = Self::new();
        engine.reset(documents);
        engine
    }

    /// Add `name` to the vocabulary unless it is already present
    /// (case-sensitive). Returns the vocabulary in insertion order.
    pub fn add_label(&mut self, name: &str) -> Result<&[String], TagError> {
        validate_label(name)?;
        if !self.has_label(name) {
            self.labels.push(name.to_string());
            debug!(label = name, total = self.labels.len(), "label added");
        }
        Ok(&self.labels)
    }

    /// Apply `label` to document `document_id` unless it is already applied.
    /// Returns the document's labels in the order they were applied.
    pub fn apply_label(&mut self, document_id: usize, label: &str) -> Result<&[String], TagError> {
        let slot = self.slot(document_id)?;
        if !self.has_label(label) {
            return Err(TagError::UnknownLabel {
                name: label.to_string(),
            });
        }
        let entry = &mut self.assignments[slot];
        if !entry.iter().any(|l| l == label) {
            entry.push(label.to_string());
            debug!(document_id, label, "label applied");
        }
        Ok(&self.assignments[slot])
    }

    /// Build the coded table: one row per document, the original columns
    /// followed by `labels` (joined with `,`, empty when none). Calling this
    /// twice without a mutation in between yields identical tables.
    pub fn serialize_assignments(&self) -> CodedTable {
        let mut columns = self.columns.clone();
        columns.push(LABELS_COLUMN.to_string());

        let rows = self
            .documents
            .iter()
            .zip(&self.assignments)
            .map(|(doc, labels)| {
                let mut row: Vec<String> = self
                    .columns
                    .iter()
                    .map(|col| column_value(doc, col).to_string())
                    .collect();
                row.push(labels.join(LABEL_DELIMITER));
                row
            })
            .collect();

        CodedTable { columns, rows }
    }

    /// Replace the document set. Documents are renumbered 1..=N in the
    /// order given, each starts with no labels, and the vocabulary is kept.
    pub fn reset(&mut self, documents: Vec<DocumentRecord>) {
        let mut documents = documents;
        for (i, doc) in documents.iter_mut().enumerate() {
            doc.index = i + 1;
        }
        self.columns = derive_columns(&documents);
        self.assignments = vec![Vec::new(); documents.len()];
        self.documents = documents;
        debug!(
            documents = self.documents.len(),
            columns = self.columns.len(),
            labels = self.labels.len(),
            "document set replaced"
        );
    }

    /// The label vocabulary in insertion order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Original columns of the current document set, in first-seen order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Labels currently applied to `document_id`.
    pub fn labels_for(&self, document_id: usize) -> Result<&[String], TagError> {
        let slot = self.slot(document_id)?;
        Ok(&self.assignments[slot])
    }

    /// Rows of `(document_id, text, labels_joined)` for tabular display.
    pub fn display_rows(&self) -> Vec<DisplayRow> {
        self.documents
            .iter()
            .zip(&self.assignments)
            .map(|(doc, labels)| DisplayRow {
                document_id: doc.index,
                text: doc.text.clone(),
                labels: labels.join(LABEL_DELIMITER),
            })
            .collect()
    }

    /// Number of documents carrying each label, in vocabulary order.
    pub fn label_counts(&self) -> Vec<(String, usize)> {
        self.labels
            .iter()
            .map(|label| {
                let n = self
                    .assignments
                    .iter()
                    .filter(|entry| entry.contains(label))
                    .count();
                (label.clone(), n)
            })
            .collect()
    }

    fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }

    fn slot(&self, document_id: usize) -> Result<usize, TagError> {
        if document_id == 0 || document_id > self.documents.len() {
            return Err(TagError::UnknownDocument {
                id: document_id,
                count: self.documents.len(),
            });
        }
        Ok(document_id - 1)
    }
}

fn validate_label(name: &str) -> Result<(), TagError> {
    if name.trim().is_empty() {
        return Err(TagError::EmptyLabel);
    }
    if name.contains(LABEL_DELIMITER) || name.contains(['\n', '\r']) {
        return Err(TagError::MalformedLabel {
            name: name.to_string(),
        });
    }
    Ok(())
}

fn derive_columns(documents: &[DocumentRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for doc in documents {
        for (name, _) in &doc.fields {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }
    if columns.is_empty() {
        columns.push(TEXT_COLUMN.to_string());
    }
    columns
}

fn column_value<'a>(doc: &'a DocumentRecord, column: &str) -> &'a str {
    match doc.field(column) {
        Some(v) => v,
        None if column == TEXT_COLUMN => &doc.text,
        None => "",
    }
}
