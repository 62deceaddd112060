//! Write a string table to the first worksheet of an xlsx file

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;

use crate::store::{StoreError, Table};

const SHEET_NAME: &str = "Sheet1";

// xlsx worksheet limits
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Write every cell as a string; empty cells are left blank
pub fn write_excel(table: &Table, path: &Path) -> Result<()> {
    let columns = table.headers().len();
    if columns > MAX_COLUMNS || table.len() + 1 > MAX_ROWS {
        return Err(StoreError::TooLarge {
            rows: table.len(),
            columns,
        }
        .into());
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in table.headers().iter().enumerate() {
        worksheet.write_string(0, col as u16, header)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row_num, col as u16, value)?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;

    Ok(())
}
