use std::path::Path;

use crate::feedback::tools::error::Result;
use crate::feedback::tools::flatten::RecordTable;

/// Writes the table as comma-separated values with a header row.
pub fn write_csv(path: &Path, table: &RecordTable) -> Result<()> {
    let mut writer = ::csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
