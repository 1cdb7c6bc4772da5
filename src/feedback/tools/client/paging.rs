use tracing::{debug, info, warn};

use crate::feedback::tools::client::SurveyClient;
use crate::feedback::tools::flatten::{
    Projected, Projection, RECORD_ID_FIELD, attributes_to_record, project, table_records,
};
use crate::feedback::tools::model::{FieldValue, Params, Participant, PreloadRow, Record};
use crate::feedback::tools::result::RemoteResult;
use crate::feedback::tools::transport::{Operation, Transport};
use crate::feedback::tools::xml::XmlElement;

/// Cursor sent with the first page, meaning "from the beginning".
pub const INITIAL_CURSOR: &str = "0";

/// How rows are laid out in a page payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    /// `NewDataSet/Table1` rows whose child elements are the fields.
    Table,
    /// Children of the document root whose attributes are the fields.
    Attributed,
}

impl PageShape {
    /// Records of a page, or `None` when the payload holds no row set.
    fn records(self, payload: &XmlElement) -> Option<Vec<Record>> {
        match self {
            PageShape::Table => table_records(payload),
            PageShape::Attributed => payload
                .document()
                .map(|root| root.children.iter().map(attributes_to_record).collect()),
        }
    }
}

/// Describes a count operation and the paged operation it sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpec {
    pub count_operation: Operation,
    pub page_operation: Operation,
    pub page_size: u64,
    /// Parameter carrying the cursor in page requests.
    pub cursor_param: &'static str,
    pub shape: PageShape,
}

pub const SURVEY_DATA_PAGES: PageSpec = PageSpec {
    count_operation: Operation::GetResponseCount,
    page_operation: Operation::GetSurveyDataPaged,
    page_size: 500,
    cursor_param: "prevRecordId",
    shape: PageShape::Table,
};

pub const PARTICIPANT_PAGES: PageSpec = PageSpec {
    count_operation: Operation::GetAuthorizedParticipantCount,
    page_operation: Operation::GetParticipantDataPaged,
    page_size: 1000,
    cursor_param: "startRecordId",
    shape: PageShape::Attributed,
};

/// Sizes of the pages needed to read `total` records: `ceil(total / page_size)`
/// pages, all full except a last page holding the remainder.
///
/// Sizes are computed on demand, so a huge count announced by the service
/// costs nothing until pages are actually requested.
pub fn page_plan(total: u64, page_size: u64) -> PagePlan {
    PagePlan {
        remaining: total,
        page_size: page_size.max(1),
    }
}

/// Iterator over page sizes returned by [`page_plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    remaining: u64,
    page_size: u64,
}

impl PagePlan {
    /// Number of pages left to request.
    pub fn pages(&self) -> u64 {
        self.remaining.div_ceil(self.page_size)
    }
}

impl Iterator for PagePlan {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let size = self.remaining.min(self.page_size);
        self.remaining -= size;
        Some(size)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.pages()) {
            Ok(pages) => (pages, Some(pages)),
            Err(_) => (usize::MAX, None),
        }
    }
}

/// Parameters of a paged survey data export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyDataQuery {
    pub survey_id: String,
    /// `CriteriaCollection` document restricting the rows.
    pub filter_xml: Option<String>,
    /// Report data map turning raw values into report values.
    pub data_map_xml: Option<String>,
    pub completed_only: bool,
}

impl SurveyDataQuery {
    /// Query for the completed responses of a survey.
    pub fn new(survey_id: impl Into<String>) -> Self {
        Self {
            survey_id: survey_id.into(),
            filter_xml: None,
            data_map_xml: None,
            completed_only: true,
        }
    }

    pub fn with_filter(mut self, filter_xml: impl Into<String>) -> Self {
        self.filter_xml = Some(filter_xml.into());
        self
    }

    pub fn with_data_map(mut self, data_map_xml: impl Into<String>) -> Self {
        self.data_map_xml = Some(data_map_xml.into());
        self
    }

    pub fn completed_only(mut self, completed_only: bool) -> Self {
        self.completed_only = completed_only;
        self
    }

    fn page_params(&self, record_count: u64, cursor: &str) -> Params {
        let mut params = Params::new()
            .with("projectId", self.survey_id.as_str())
            .with("completedOnly", self.completed_only)
            .with("recordCount", record_count)
            .with(SURVEY_DATA_PAGES.cursor_param, cursor);
        if let Some(filter) = &self.filter_xml {
            params.insert("filterXml", filter.as_str());
        }
        if let Some(data_map) = &self.data_map_xml {
            params.insert("dataMapXml", data_map.as_str());
        }
        params
    }
}

impl<T: Transport> SurveyClient<T> {
    /// Reads every page announced by the count operation.
    ///
    /// `page_params` receives the size of the page and the cursor. The cursor
    /// advances to the `recordid` of the last record of each page. A page
    /// without rows, or one whose last row has no `recordid`, ends the run with
    /// the records gathered so far.
    pub fn fetch_all_pages<F>(
        &self,
        spec: &PageSpec,
        count_params: &Params,
        page_params: F,
    ) -> RemoteResult<Vec<Record>>
    where
        F: Fn(u64, &str) -> Params,
    {
        let total = match self.count(spec.count_operation, count_params) {
            RemoteResult::Success(total) => total,
            RemoteResult::Empty => 0,
            RemoteResult::Error(error) => return RemoteResult::Error(error),
        };

        let plan = page_plan(total, spec.page_size);
        info!(
            operation = %spec.page_operation,
            total,
            pages = plan.pages(),
            "fetching paged records"
        );

        let mut cursor = INITIAL_CURSOR.to_string();
        let mut records = Vec::new();
        for (index, record_count) in plan.into_iter().enumerate() {
            let params = page_params(record_count, &cursor);
            let payload = match self.invoke(spec.page_operation, &params) {
                RemoteResult::Success(payload) => payload,
                RemoteResult::Empty => {
                    debug!(page = index + 1, "page returned no data, stopping");
                    break;
                }
                RemoteResult::Error(error) => return RemoteResult::Error(error),
            };

            let page = match spec.shape.records(&payload) {
                Some(page) if !page.is_empty() => page,
                _ => {
                    debug!(page = index + 1, "page carries no rows, stopping");
                    break;
                }
            };

            let next_cursor = page.last().and_then(|record| record.text(RECORD_ID_FIELD));
            debug!(page = index + 1, rows = page.len(), "page fetched");
            records.extend(page);
            match next_cursor {
                Some(last) => cursor = last,
                None => {
                    warn!(
                        page = index + 1,
                        %cursor,
                        "last row has no record id, cannot advance cursor; stopping"
                    );
                    break;
                }
            }
        }

        RemoteResult::Success(records)
    }

    /// Every response matching the query, as flattened records.
    pub fn get_complete_records(&self, query: &SurveyDataQuery) -> RemoteResult<Vec<Record>> {
        let count_params = Params::new()
            .with("projectId", query.survey_id.as_str())
            .with("completedOnly", query.completed_only);
        self.fetch_all_pages(&SURVEY_DATA_PAGES, &count_params, |record_count, cursor| {
            query.page_params(record_count, cursor)
        })
    }

    /// Every response matching the query with the projection applied.
    pub fn get_complete_array(
        &self,
        query: &SurveyDataQuery,
        projection: &Projection,
    ) -> RemoteResult<Vec<Projected>> {
        self.get_complete_records(query).map(|records| {
            records
                .into_iter()
                .map(|record| project(record, projection))
                .collect()
        })
    }

    /// Participants authorized for a survey, optionally filtered by survey
    /// status, in the order the service lists them.
    pub fn get_participant_data(
        &self,
        survey_id: &str,
        status: Option<&str>,
    ) -> RemoteResult<Vec<Participant>> {
        let count_params = Params::new().with("projectId", survey_id);
        let survey_status = status.unwrap_or("Any");
        self.fetch_all_pages(&PARTICIPANT_PAGES, &count_params, |record_count, cursor| {
            Params::new()
                .with("projectId", survey_id)
                .with("recordCount", record_count)
                .with("surveyStatus", survey_status)
                .with(PARTICIPANT_PAGES.cursor_param, cursor)
        })
        .map(|records| records.iter().map(participant_from_record).collect())
    }

    /// Preload data of every participant of a survey.
    pub fn get_preload_data(
        &self,
        survey_id: &str,
        projection: &Projection,
    ) -> RemoteResult<Vec<PreloadRow>> {
        let participants = match self.get_participant_data(survey_id, None) {
            RemoteResult::Success(participants) => participants,
            RemoteResult::Empty => return RemoteResult::Success(Vec::new()),
            RemoteResult::Error(error) => return RemoteResult::Error(error),
        };

        let mut rows = Vec::with_capacity(participants.len());
        for participant in participants {
            let params = Params::new()
                .with("projectId", survey_id)
                .with("recordId", participant.record_id.as_str());
            let values = match self.invoke(Operation::GetPreloadData, &params) {
                RemoteResult::Success(payload) => preload_values(&payload),
                RemoteResult::Empty => Record::new(),
                RemoteResult::Error(error) => return RemoteResult::Error(error),
            };

            rows.push(PreloadRow {
                record_id: participant.record_id,
                values: project_values(values, projection),
            });
        }

        RemoteResult::Success(rows)
    }
}

fn participant_from_record(record: &Record) -> Participant {
    let text = |name: &str| record.text(name).unwrap_or_default();
    Participant {
        record_id: text(RECORD_ID_FIELD),
        key1: text("user_key1"),
        email: text("email"),
        status: text("invite_status").trim().parse().unwrap_or(0),
        completed: !text("completed").is_empty(),
        culture: text("culture"),
    }
}

/// Collects `<Field id="..">value</Field>` elements anywhere in the payload.
fn preload_values(payload: &XmlElement) -> Record {
    let mut values = Record::new();
    collect_fields(payload, &mut values);
    values
}

fn collect_fields(element: &XmlElement, values: &mut Record) {
    if element.local_name() == "Field" {
        if let Some(id) = element.attribute("id") {
            values.insert(id, FieldValue::text(element.text.clone()));
        }
        return;
    }
    for child in &element.children {
        collect_fields(child, values);
    }
}

fn project_values(values: Record, projection: &Projection) -> Record {
    match (project(values, projection), projection) {
        (Projected::Record(record), _) => record,
        (Projected::Value(Some(value)), Projection::Field(name)) => {
            let mut record = Record::new();
            record.insert(name.clone(), value);
            record
        }
        (Projected::Value(_), _) => Record::new(),
    }
}
