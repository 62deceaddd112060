//! Tabular store adapter
//!
//! Loads and saves session spreadsheets as plain string tables. Every cell
//! stays a string end to end so identifiers like `00004521` keep their
//! leading zeros.

mod csv_table;
mod excel;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk format of a session or roster file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    #[default]
    Xlsx,
}

impl FileType {
    /// Resolve the format from a path's extension
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") => Ok(FileType::Csv),
            Some("xlsx") => Ok(FileType::Xlsx),
            _ => Err(StoreError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for FileType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            "xlsx" => Ok(FileType::Xlsx),
            other => Err(StoreError::UnknownFileType(other.to_string())),
        }
    }
}

/// Errors raised by the store layer that callers may want to match on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Extension is not one of csv / xlsx
    UnsupportedFormat { path: PathBuf },
    /// File type name is not one of csv / xlsx
    UnknownFileType(String),
    /// Workbook contains no worksheets
    NoSheets { path: PathBuf },
    /// Table is larger than the xlsx format allows
    TooLarge { rows: usize, columns: usize },
    /// More than one stored row carries the same card id
    AmbiguousCard { card_id: String, rows: Vec<usize> },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UnsupportedFormat { path } => write!(
                f,
                "unsupported file format for '{}' (expected .csv or .xlsx)",
                path.display()
            ),
            StoreError::UnknownFileType(name) => {
                write!(f, "unknown file type '{}' (expected csv or xlsx)", name)
            }
            StoreError::NoSheets { path } => {
                write!(f, "workbook '{}' has no sheets", path.display())
            }
            StoreError::TooLarge { rows, columns } => write!(
                f,
                "table of {} rows x {} columns does not fit in a worksheet",
                rows, columns
            ),
            StoreError::AmbiguousCard { card_id, rows } => write!(
                f,
                "card id '{}' appears in {} stored rows ({}); fix the file before saving",
                card_id,
                rows.len(),
                rows.iter()
                    .map(|r| (r + 2).to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// A header row plus string rows, each row exactly as wide as the header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given headers
    pub fn new(headers: Vec<String>) -> Self {
        Table {
            headers,
            rows: Vec::new(),
        }
    }

    /// Create a table, padding or truncating rows to the header width
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Table::new(headers);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with this header
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell value by row and header, `None` when the column is absent
    pub fn get(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.column_index(header)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Index of the column with this header, appending an empty column if needed
    pub fn ensure_column(&mut self, header: &str) -> usize {
        if let Some(col) = self.column_index(header) {
            return col;
        }
        self.headers.push(header.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Overwrite one cell; out-of-range coordinates are ignored
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value.into();
        }
    }

    /// Append a row, padding or truncating it to the header width
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Append a row with every column empty, returning its index
    pub fn push_empty_row(&mut self) -> usize {
        self.rows.push(vec![String::new(); self.headers.len()]);
        self.rows.len() - 1
    }
}

/// Trim a raw cell and treat a literal `nan` as empty
pub fn clean_value(value: &str) -> String {
    let text = value.trim();
    if text.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        text.to_string()
    }
}

/// Load a table from a csv or xlsx file
pub fn load(path: &Path) -> Result<Table> {
    let table = match FileType::from_path(path)? {
        FileType::Csv => csv_table::read_csv(path)?,
        FileType::Xlsx => excel::read_excel(path)?,
    };
    log::debug!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.headers().len(),
        path.display()
    );
    Ok(table)
}

/// Save a table to a csv or xlsx file
///
/// The table is written to a sibling file first and renamed over the
/// target, so a failed write leaves the previous file intact.
pub fn save(table: &Table, path: &Path) -> Result<()> {
    let file_type = FileType::from_path(path)?;
    let partial = partial_path(path);

    let written = match file_type {
        FileType::Csv => csv_table::write_csv(table, &partial),
        FileType::Xlsx => excel::write_excel(table, &partial),
    };
    if let Err(e) = written {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::rename(&partial, path)
        .with_context(|| format!("Failed to replace file: {}", path.display()))?;

    log::debug!("Saved {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Column headers of a file, trimmed, without blanks or repeats
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let table = load(path)?;
    let mut headers: Vec<String> = Vec::new();
    for header in table.headers() {
        let header = header.trim();
        if !header.is_empty() && !headers.iter().any(|h| h == header) {
            headers.push(header.to_string());
        }
    }
    Ok(headers)
}

fn partial_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", file_name))
}
