//! CSV reading and writing for string tables

use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer};

use super::Table;

/// Read a CSV file with a header row; short rows are padded
pub fn read_csv(path: &Path) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record = record.with_context(|| {
            format!("Failed to read CSV row {} of {}", idx + 2, path.display())
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::from_rows(headers, rows))
}

/// Write a table as CSV, header first
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut wtr = Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    if !table.headers().is_empty() {
        wtr.write_record(table.headers())
            .context("Failed to write CSV header")?;

        for (idx, row) in table.rows().iter().enumerate() {
            wtr.write_record(row)
                .with_context(|| format!("Failed to write CSV row {}", idx + 2))?;
        }
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}
