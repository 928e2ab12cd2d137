// Raw delimited table as read from disk, before any renaming or parsing
use crate::error::{FlowmapError, Result};
use std::path::{Path, PathBuf};

/// Untyped rows of a delimited file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Where the table came from (used in error messages)
    pub source: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(source: impl Into<PathBuf>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    /// Read a delimited file with a header row
    ///
    /// Short rows are padded with empty cells so every row matches the header width.
    pub fn from_csv_path(path: &Path, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(|e| FlowmapError::Csv {
                source: e,
                context: format!("Failed to open log file: {}", path.display()),
            })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| FlowmapError::Csv {
                source: e,
                context: format!("Failed to read header row: {}", path.display()),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| FlowmapError::Csv {
                source: e,
                context: format!("Failed to read row {} of {}", i + 2, path.display()),
            })?;

            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        tracing::debug!(
            "Read {} rows x {} columns from {}",
            rows.len(),
            headers.len(),
            path.display()
        );

        Ok(Self::new(path, headers, rows))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
