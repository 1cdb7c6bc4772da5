use serde::Serialize;

use crate::feedback::tools::model::{FieldValue, Record, ScalarValue};
use crate::feedback::tools::xml::XmlElement;

/// Element wrapping the tabular result set of survey data operations.
pub const DATASET_ELEMENT: &str = "NewDataSet";
/// Repeated row element inside [`DATASET_ELEMENT`].
pub const ROW_ELEMENT: &str = "Table1";
/// Separator between the segments of a nested field path.
pub const PATH_SEPARATOR: char = '/';
/// Field holding the paging cursor of every row.
pub const RECORD_ID_FIELD: &str = "recordid";

/// Flattens the child elements of `element` into a record.
///
/// Leaf children become scalar text fields. Repeated leaf siblings collapse
/// into a [`FieldValue::Repeated`] and nested elements contribute fields named
/// by their path, e.g. `address/city`.
pub fn flatten_element(element: &XmlElement) -> Record {
    let mut record = Record::new();
    flatten_into(&mut record, None, element);
    record
}

fn flatten_into(record: &mut Record, prefix: Option<&str>, element: &XmlElement) {
    for child in &element.children {
        let path = match prefix {
            Some(prefix) => format!("{prefix}{PATH_SEPARATOR}{}", child.local_name()),
            None => child.local_name().to_string(),
        };

        if !child.children.is_empty() {
            flatten_into(record, Some(&path), child);
            continue;
        }

        let value = ScalarValue::Text(child.text.clone());
        match record.get_mut(&path) {
            Some(existing) => existing.push(value),
            None => record.insert(path, FieldValue::Scalar(value)),
        }
    }
}

/// Converts the attributes of an element into a record of text fields.
pub fn attributes_to_record(element: &XmlElement) -> Record {
    let mut record = Record::new();
    for (key, value) in &element.attributes {
        let name = key.rsplit_once(':').map_or(key.as_str(), |(_, local)| local);
        record.insert(name, FieldValue::text(value.clone()));
    }
    record
}

/// Returns the row elements of a tabular payload, or `None` when the payload
/// carries no result set at all.
pub fn table_rows(payload: &XmlElement) -> Option<Vec<&XmlElement>> {
    let dataset = payload.find(DATASET_ELEMENT)?;
    Some(dataset.children_named(ROW_ELEMENT).collect())
}

/// Flattens every row of a tabular payload.
pub fn table_records(payload: &XmlElement) -> Option<Vec<Record>> {
    table_rows(payload).map(|rows| rows.into_iter().map(flatten_element).collect())
}

/// Selects which fields of each record a caller receives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    /// Whole records.
    #[default]
    All,
    /// The value of a single field.
    Field(String),
    /// A sub-record limited to the named fields, in the requested order.
    Fields(Vec<String>),
}

/// A record after projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Projected {
    Record(Record),
    Value(Option<FieldValue>),
}

/// Applies the projection to one record. Requested fields that the record
/// lacks are left out of sub-records and yield `Value(None)` for a single
/// field.
pub fn project(record: Record, projection: &Projection) -> Projected {
    match projection {
        Projection::All => Projected::Record(record),
        Projection::Field(name) => Projected::Value(record.get(name).cloned()),
        Projection::Fields(names) => {
            let mut subset = Record::new();
            for name in names {
                if let Some(value) = record.get(name) {
                    subset.insert(name.clone(), value.clone());
                }
            }
            Projected::Record(subset)
        }
    }
}

/// Records laid out as a header row plus cell rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Lays out records as a table whose header is the field list of the first
/// record. Cells of fields a record lacks are empty; fields not present in
/// the first record are dropped.
pub fn build_table(name: &str, records: &[Record]) -> RecordTable {
    let columns: Vec<String> = records
        .first()
        .map(|first| first.field_names().map(str::to_string).collect())
        .unwrap_or_default();

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| {
                    record
                        .get(column)
                        .map(FieldValue::to_cell)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    RecordTable {
        name: name.to_string(),
        columns,
        rows,
    }
}
