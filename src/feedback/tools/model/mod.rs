use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Opaque participant identifier assigned by the survey service. It doubles
/// as the paging cursor and is never reordered or compared numerically.
pub type RecordId = String;

/// Represents a scalar value sent to or received from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// Plain string value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Boolean value.
    Boolean(bool),
}

impl ScalarValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Text(value) => f.write_str(value),
            ScalarValue::Integer(value) => write!(f, "{value}"),
            ScalarValue::Boolean(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<u64> for ScalarValue {
    fn from(value: u64) -> Self {
        ScalarValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

/// Value stored under one field of a [`Record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single value.
    Scalar(ScalarValue),
    /// Values of repeated sibling elements sharing the same name.
    Repeated(Vec<ScalarValue>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Scalar(ScalarValue::Text(value.into()))
    }

    /// Renders the value as a single cell. Repeated values are joined with `;`.
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Scalar(value) => value.to_string(),
            FieldValue::Repeated(values) => values
                .iter()
                .map(ScalarValue::to_string)
                .collect::<Vec<_>>()
                .join(";"),
        }
    }

    /// Appends a sibling value, promoting a scalar to a repeated value.
    pub fn push(&mut self, value: ScalarValue) {
        match self {
            FieldValue::Scalar(existing) => {
                let first = existing.clone();
                *self = FieldValue::Repeated(vec![first, value]);
            }
            FieldValue::Repeated(values) => values.push(value),
        }
    }
}

/// One flattened unit of remote tabular data.
///
/// Fields keep the order in which the service returned them so exports can
/// reuse it for column headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns the text of a scalar field.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            FieldValue::Scalar(value) => Some(value.to_string()),
            FieldValue::Repeated(_) => None,
        }
    }

    /// Inserts or replaces a field, keeping the position of a replaced field.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        let name = name.into();
        match self.get_mut(&name) {
            Some(existing) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<ScalarValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, FieldValue::Scalar(value.into()));
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Ordered operation parameters. Inserting an existing name replaces the value
/// in place so the element order on the wire stays stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, ScalarValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ScalarValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ScalarValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A participant authorized for a survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub record_id: RecordId,
    pub key1: String,
    pub email: String,
    /// Invitation status code as reported by the service.
    pub status: i64,
    pub completed: bool,
    pub culture: String,
}

/// Progress details of a single participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParticipantInfo {
    pub started: String,
    pub completed: String,
    pub branched_out: String,
    pub email: String,
}

/// Preload data stored for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreloadRow {
    pub record_id: RecordId,
    pub values: Record,
}

/// Columns that every survey reports regardless of its questions.
pub const STANDARD_COLUMNS: [&str; 4] = ["started", "completed", "modified", "branched_out"];

/// Declared type of the standard columns.
pub const STANDARD_COLUMN_TYPE: &str = "Varchar";

/// Field name → declared type for a survey.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnDescriptor {
    columns: Vec<(String, String)>,
}

impl ColumnDescriptor {
    /// Builds a descriptor from server columns and appends the standard
    /// columns, which override server entries of the same name.
    pub fn from_columns<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut descriptor = ColumnDescriptor::default();
        for (name, type_name) in columns {
            descriptor.insert(name, type_name);
        }
        for name in STANDARD_COLUMNS {
            descriptor.insert(name.to_string(), STANDARD_COLUMN_TYPE.to_string());
        }
        descriptor
    }

    fn insert(&mut self, name: String, type_name: String) {
        match self.columns.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = type_name,
            None => self.columns.push((name, type_name)),
        }
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, type_name)| type_name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(|(name, type_name)| (name.as_str(), type_name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Delivery condition derived from a participant's campaign history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CampaignStatus {
    Normal,
    Undeliverable,
    Unsubscribed,
}

impl CampaignStatus {
    /// Numeric code used by downstream consumers.
    pub fn code(self) -> u32 {
        match self {
            CampaignStatus::Normal => 1,
            CampaignStatus::Undeliverable => 50,
            CampaignStatus::Unsubscribed => 51,
        }
    }
}
