//! Export the coded table as CSV.
//!
//! Writes one row per document (original columns followed by `labels`) to
//! `coded_data_<YYYY-MM-DD>.csv`. The date is the day of the export, not the
//! day the documents were loaded.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use qualcode_core::TaggingEngine;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name for an export made on `date`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("coded_data_{}.csv", date.format("%Y-%m-%d"))
}

/// Today's date on the local clock.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Render the engine's coded table as CSV text.
pub fn render_csv(engine: &TaggingEngine) -> Result<String> {
    engine
        .serialize_assignments()
        .to_csv()
        .context("Failed to serialize coded table")
}

/// Write the coded table into `dir`, creating it if needed. Returns the path
/// of the written file.
pub fn write_export(engine: &TaggingEngine, dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    let csv = render_csv(engine)?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    let path = dir.join(export_filename(date));
    std::fs::write(&path, csv)
        .with_context(|| format!("Failed to write export: {}", path.display()))?;

    info!(
        path = %path.display(),
        documents = engine.document_count(),
        "exported coded data"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qualcode_core::DocumentRecord;

    #[test]
    fn test_export_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(export_filename(date), "coded_data_2024-03-07.csv");
    }

    #[test]
    fn test_write_export_creates_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested/out");

        let mut engine = TaggingEngine::with_documents(vec![
            DocumentRecord::from_text("one"),
            DocumentRecord::from_text("two"),
            DocumentRecord::from_text("three"),
        ]);
        engine.add_label("urgent").unwrap();
        engine.apply_label(2, "urgent").unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let path = write_export(&engine, &dir, date).unwrap();
        assert_eq!(path, dir.join("coded_data_2025-01-31.csv"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, ["text,labels", "one,", "two,urgent", "three,"]);
    }
}
