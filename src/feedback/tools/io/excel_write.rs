use std::path::Path;

use rust_xlsxwriter::{Table, TableColumn, Workbook, Worksheet};

use crate::feedback::tools::error::Result;
use crate::feedback::tools::flatten::RecordTable;

const MIN_COLUMN_WIDTH: usize = 8;
const MAX_COLUMN_WIDTH: usize = 60;

/// Writes the records to a workbook with one sheet named after the table.
///
/// The sheet holds an autofilter table with the header row frozen. Answers
/// that are plain numbers are stored as numbers so they sort and sum in
/// Excel; everything else, including values like `0150`, stays text.
pub fn write_workbook(path: &Path, table: &RecordTable) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.name)?;

    if !table.columns.is_empty() {
        write_responses(worksheet, table)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_responses(worksheet: &mut Worksheet, table: &RecordTable) -> Result<()> {
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            match numeric_cell(cell) {
                Some(number) => worksheet.write_number(row_num, col_idx as u16, number)?,
                None => worksheet.write_string(row_num, col_idx as u16, cell)?,
            };
        }
    }

    for (col_idx, header) in table.columns.iter().enumerate() {
        let widest = table
            .rows
            .iter()
            .filter_map(|row| row.get(col_idx))
            .map(|cell| cell.chars().count())
            .chain(std::iter::once(header.chars().count() + 2))
            .max()
            .unwrap_or(MIN_COLUMN_WIDTH);
        let width = widest.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        worksheet.set_column_width(col_idx as u16, width as f64)?;
    }

    let columns: Vec<TableColumn> = table
        .columns
        .iter()
        .map(|header| TableColumn::new().set_header(header))
        .collect();
    let mut responses = Table::new();
    responses.set_autofilter(true).set_columns(&columns);

    // A table needs at least one data row below its header.
    let last_row = table.rows.len().max(1) as u32;
    let last_col = (table.columns.len() - 1) as u16;
    worksheet.add_table(0, 0, last_row, last_col, &responses)?;
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Returns the numeric value of a cell whose text is exactly the canonical
/// form of a finite number, e.g. `4` or `2.5`. Leading zeros, exponents and
/// padding keep the cell as text.
pub fn numeric_cell(cell: &str) -> Option<f64> {
    let number: f64 = cell.parse().ok()?;
    (number.is_finite() && number.to_string() == cell).then_some(number)
}
