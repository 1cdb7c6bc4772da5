use std::path::Path;

use tracing::{info, instrument};

use crate::feedback::tools::client::{SurveyClient, SurveyDataQuery};
use crate::feedback::tools::error::Result;
use crate::feedback::tools::flatten::build_table;
use crate::feedback::tools::io::{csv, excel_write, json};
use crate::feedback::tools::model::Record;
use crate::feedback::tools::transport::Transport;

/// Sheet name used for workbook exports.
pub const RESPONSES_SHEET: &str = "Responses";

/// File formats records can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Excel,
    Json,
}

/// What an export produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The file was written with this many records.
    Written(usize),
    /// There was nothing to export and no file was written.
    NoData,
}

/// Writes records to `output`. CSV and workbook headers are the field names
/// of the first record.
#[instrument(level = "info", skip(records), fields(output = %output.display(), ?format))]
pub fn export_records(records: &[Record], output: &Path, format: ExportFormat) -> Result<ExportOutcome> {
    if records.is_empty() {
        info!("no records to export");
        return Ok(ExportOutcome::NoData);
    }

    match format {
        ExportFormat::Csv => csv::write_csv(output, &build_table(RESPONSES_SHEET, records))?,
        ExportFormat::Excel => {
            excel_write::write_workbook(output, &build_table(RESPONSES_SHEET, records))?
        }
        ExportFormat::Json => json::write_json(output, records)?,
    }

    info!(record_count = records.len(), "records exported");
    Ok(ExportOutcome::Written(records.len()))
}

/// Fetches every response matching the query and writes it to `output`.
/// Remote failures are returned as [`ToolError::Remote`](crate::ToolError::Remote).
#[instrument(
    level = "info",
    skip_all,
    fields(survey_id = %query.survey_id, output = %output.display(), ?format)
)]
pub fn export_survey_data<T: Transport>(
    client: &SurveyClient<T>,
    query: &SurveyDataQuery,
    output: &Path,
    format: ExportFormat,
) -> Result<ExportOutcome> {
    match client.get_complete_records(query).into_result()? {
        Some(records) => export_records(&records, output, format),
        None => Ok(ExportOutcome::NoData),
    }
}

impl<T: Transport> SurveyClient<T> {
    /// Writes every response matching the query to a CSV file.
    pub fn get_complete_csv(&self, query: &SurveyDataQuery, output: &Path) -> Result<ExportOutcome> {
        export_survey_data(self, query, output, ExportFormat::Csv)
    }
}
