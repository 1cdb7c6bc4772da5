mod common;

use std::fs;

use common::{ScriptedTransport, config, numbered_rows, result, table};
use feedback_tools::client::SurveyDataQuery;
use feedback_tools::export::{ExportFormat, ExportOutcome, export_records};
use feedback_tools::io::excel_write::numeric_cell;
use feedback_tools::model::Record;
use feedback_tools::transport::Operation;
use feedback_tools::{RemoteError, SurveyClient, ToolError};
use tempfile::tempdir;

fn records() -> Vec<Record> {
    vec![
        [("recordid", "1"), ("comment", "Great, thanks"), ("q1", "Yes")]
            .into_iter()
            .collect(),
        [("recordid", "2"), ("comment", "Said \"no\""), ("q1", "No")]
            .into_iter()
            .collect(),
    ]
}

#[test]
fn csv_export_quotes_fields() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("completes.csv");

    let outcome = export_records(&records(), &path, ExportFormat::Csv).expect("CSV written");

    assert_eq!(outcome, ExportOutcome::Written(2));
    let written = fs::read_to_string(&path).expect("CSV read");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines,
        vec![
            "recordid,comment,q1",
            "1,\"Great, thanks\",Yes",
            "2,\"Said \"\"no\"\"\",No",
        ]
    );
}

#[test]
fn json_export_keeps_field_order() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("completes.json");

    export_records(&records(), &path, ExportFormat::Json).expect("JSON written");

    let written = fs::read_to_string(&path).expect("JSON read");
    let parsed: serde_json::Value = serde_json::from_str(&written).expect("JSON parsed");
    assert_eq!(parsed[1]["comment"], "Said \"no\"");
    assert!(written.find("recordid") < written.find("comment"));
}

#[test]
fn workbook_export_writes_file() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("completes.xlsx");

    let outcome = export_records(&records(), &path, ExportFormat::Excel).expect("workbook written");

    assert_eq!(outcome, ExportOutcome::Written(2));
    assert!(fs::metadata(&path).expect("workbook exists").len() > 0);
}

#[test]
fn only_canonical_numbers_become_numeric_cells() {
    assert_eq!(numeric_cell("4"), Some(4.0));
    assert_eq!(numeric_cell("2.5"), Some(2.5));
    assert_eq!(numeric_cell("-3"), Some(-3.0));
    for text in ["0150", "1e3", " 4", "4 ", "NaN", "inf", "", "Yes", "4.50"] {
        assert_eq!(numeric_cell(text), None, "cell {text:?}");
    }
}

#[test]
fn nothing_is_written_without_records() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("empty.csv");

    let outcome = export_records(&[], &path, ExportFormat::Csv).expect("export finished");

    assert_eq!(outcome, ExportOutcome::NoData);
    assert!(!path.exists());
}

#[test]
fn complete_csv_fetches_and_writes() {
    let transport = ScriptedTransport::new();
    transport.push(Operation::GetResponseCount, result(Operation::GetResponseCount, "3"));
    transport.push(
        Operation::GetSurveyDataPaged,
        result(Operation::GetSurveyDataPaged, &table(&numbered_rows(1, 3))),
    );
    let client = SurveyClient::with_transport(&config(), &transport).expect("client built");
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("completes.csv");

    let outcome = client
        .get_complete_csv(&SurveyDataQuery::new("4711"), &path)
        .expect("CSV export");

    assert_eq!(outcome, ExportOutcome::Written(3));
    let written = fs::read_to_string(&path).expect("CSV read");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "recordid,q1");
    assert_eq!(lines[3], "3,answer 3");
}

#[test]
fn complete_csv_reports_remote_failure() {
    let transport = ScriptedTransport::new();
    transport.push(
        Operation::GetResponseCount,
        Err(RemoteError::Fault("Invalid project id".to_string())),
    );
    let client = SurveyClient::with_transport(&config(), &transport).expect("client built");
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("completes.csv");

    let error = client
        .get_complete_csv(&SurveyDataQuery::new("4711"), &path)
        .expect_err("remote failure");

    assert!(matches!(error, ToolError::Remote(RemoteError::Fault(_))));
    assert!(!path.exists());
}
