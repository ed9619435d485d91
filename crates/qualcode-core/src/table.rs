//! The coded table: original document columns plus a `labels` column.
//!
//! Produced by [`TaggingEngine::serialize_assignments`](crate::TaggingEngine::serialize_assignments)
//! and consumed by the CSV export and the display surfaces.

use serde::Serialize;

/// Name of the column appended to every exported row.
pub const LABELS_COLUMN: &str = "labels";

/// Delimiter used to join a document's labels into one field.
pub const LABEL_DELIMITER: &str = ",";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CodedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row` (0-based), if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        // Last match wins so that the appended labels column shadows an
        // original column of the same name.
        let col = self.columns.iter().rposition(|c| c == column)?;
        self.rows.get(row)?.get(col).map(|s| s.as_str())
    }

    /// Serialize as CSV with a header row. Fields are quoted only when they
    /// contain the delimiter, a quote, or a line break.
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        String::from_utf8(bytes).map_err(|e| {
            csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CodedTable {
        CodedTable {
            columns: vec!["id".into(), "text".into(), LABELS_COLUMN.into()],
            rows: vec![
                vec!["1".into(), "slow, but friendly".into(), "".into()],
                vec!["2".into(), "said \"wow\"".into(), "positive,urgent".into()],
            ],
        }
    }

    #[test]
    fn test_csv_header_and_quoting() {
        let csv = sample().to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "id,text,labels");
        assert_eq!(lines[1], "1,\"slow, but friendly\",");
        assert_eq!(lines[2], "2,\"said \"\"wow\"\"\",\"positive,urgent\"");
    }

    #[test]
    fn test_csv_deterministic() {
        let table = sample();
        assert_eq!(table.to_csv().unwrap(), table.to_csv().unwrap());
    }

    #[test]
    fn test_cell_lookup() {
        let table = sample();
        assert_eq!(table.cell(1, LABELS_COLUMN), Some("positive,urgent"));
        assert_eq!(table.cell(0, LABELS_COLUMN), Some(""));
        assert_eq!(table.cell(5, "id"), None);
        assert_eq!(table.cell(0, "nope"), None);
    }
}
