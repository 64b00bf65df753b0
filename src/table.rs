//! CSV table handling.
//!
//! The table owns every record for the whole run. Workers only ever receive
//! per-row copies and hand back plain values for the owner to merge, so the
//! rows are never shared across tasks. Columns other than `doi` and
//! `abstract` pass through untouched, in their original order.

use crate::error::Result;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Column holding the DOI to resolve
const DOI_COLUMN: &str = "doi";

/// Column receiving fetched abstracts
const ABSTRACT_COLUMN: &str = "abstract";

/// An in-memory CSV table with a guaranteed `abstract` column.
///
/// A CSV field has no null, so an empty field reads as "absent". The merge
/// methods keep the inverse invariant: an abstract is never written back as
/// an empty "present" value.
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    doi_col: Option<usize>,
    abstract_col: usize,
}

impl RecordTable {
    /// Load a CSV file. Appends an empty `abstract` column when the input
    /// has none.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        let doi_col = headers.iter().position(|h| h.as_str() == DOI_COLUMN);
        let abstract_col = match headers.iter().position(|h| h.as_str() == ABSTRACT_COLUMN) {
            Some(idx) => idx,
            None => {
                headers.push(ABSTRACT_COLUMN.to_string());
                for row in &mut rows {
                    row.push(String::new());
                }
                headers.len() - 1
            }
        };

        debug!(
            rows = rows.len(),
            columns = headers.len(),
            has_doi_column = doi_col.is_some(),
            "Loaded table"
        );

        Ok(Self {
            headers,
            rows,
            doi_col,
            abstract_col,
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in output order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// DOI for a row. Empty or whitespace-only counts as absent, as does a
    /// table with no `doi` column at all.
    pub fn doi(&self, row: usize) -> Option<&str> {
        let col = self.doi_col?;
        let value = self.rows[row][col].trim();
        (!value.is_empty()).then_some(value)
    }

    /// Abstract for a row, if present.
    pub fn abstract_text(&self, row: usize) -> Option<&str> {
        let value = self.rows[row][self.abstract_col].trim();
        (!value.is_empty()).then_some(value)
    }

    /// Whether a row already carries a non-empty abstract.
    pub fn has_abstract(&self, row: usize) -> bool {
        self.abstract_text(row).is_some()
    }

    /// Merge a fetched abstract into a row. Callers pass non-empty text only;
    /// an empty string would read back as absent.
    pub fn set_abstract(&mut self, row: usize, text: &str) {
        self.rows[row][self.abstract_col] = text.to_string();
    }

    /// Write the full table to `path`.
    ///
    /// The write lands in a temp sibling first and is renamed over the
    /// destination, so an interrupted run keeps the last complete checkpoint
    /// rather than a truncated file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("csv.tmp");

        let mut writer = csv::Writer::from_path(&tmp)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_input(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_adds_missing_abstract_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(&dir, "in.csv", "title,doi\nPaper A,10.1/a\n");

        let table = RecordTable::load(&path).unwrap();
        assert_eq!(table.headers(), &["title", "doi", "abstract"]);
        assert_eq!(table.len(), 1);
        assert!(!table.has_abstract(0));
    }

    #[test]
    fn test_load_keeps_existing_columns_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(
            &dir,
            "in.csv",
            "year,abstract,doi,title\n2021,Known,10.1/a,Paper A\n",
        );

        let table = RecordTable::load(&path).unwrap();
        assert_eq!(table.headers(), &["year", "abstract", "doi", "title"]);
        assert_eq!(table.abstract_text(0), Some("Known"));
        assert_eq!(table.doi(0), Some("10.1/a"));
    }

    #[test]
    fn test_blank_doi_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(&dir, "in.csv", "doi,title\n,Paper A\n  ,Paper B\n10.1/c,Paper C\n");

        let table = RecordTable::load(&path).unwrap();
        assert_eq!(table.doi(0), None);
        assert_eq!(table.doi(1), None);
        assert_eq!(table.doi(2), Some("10.1/c"));
    }

    #[test]
    fn test_no_doi_column_means_no_dois() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(&dir, "in.csv", "title\nPaper A\n");

        let table = RecordTable::load(&path).unwrap();
        assert_eq!(table.doi(0), None);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(&dir, "in.csv", "title,doi\nPaper A,10.1/a\nPaper B,\n");
        let out = dir.path().join("out.csv");

        let mut table = RecordTable::load(&path).unwrap();
        table.set_abstract(0, "Fetched text");
        table.save(&out).unwrap();

        let reloaded = RecordTable::load(&out).unwrap();
        assert_eq!(reloaded.headers(), &["title", "doi", "abstract"]);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.abstract_text(0), Some("Fetched text"));
        assert_eq!(reloaded.abstract_text(1), None);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_input(&dir, "in.csv", "doi\n10.1/a\n");
        let out = dir.path().join("out.csv");

        let table = RecordTable::load(&path).unwrap();
        table.save(&out).unwrap();
        table.save(&out).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n == "out.csv"));
        assert!(!names.iter().any(|n| n.ends_with(".tmp")));
    }
}
