//! Typed façade over the survey service.
//!
//! Every operation goes through [`SurveyClient::invoke`], which logs in,
//! calls the transport and unwraps the `{Operation}Result` element. Remote
//! outcomes are reported as [`RemoteResult`] so callers always distinguish
//! errors from empty answers.

use std::cell::Cell;
use std::time::Duration;

use tracing::{debug, warn};

use crate::feedback::tools::config::{ClientConfig, SessionPolicy};
use crate::feedback::tools::error::{RemoteError, Result};
use crate::feedback::tools::flatten::table_records;
use crate::feedback::tools::model::{ColumnDescriptor, ParticipantInfo, Params, Record};
use crate::feedback::tools::result::RemoteResult;
use crate::feedback::tools::transport::{Connection, Operation, SoapTransport, Transport};
use crate::feedback::tools::xml::{self, XmlElement};

mod enrollment;
mod paging;
mod status;

pub use enrollment::{build_prepop_fragment, enrollment_params, normalize_attribute_name};
pub use paging::{
    INITIAL_CURSOR, PARTICIPANT_PAGES, PagePlan, PageShape, PageSpec, SURVEY_DATA_PAGES,
    SurveyDataQuery, page_plan,
};
pub use status::{UNDELIVERABLE_CODES, UNSUBSCRIBE_CODES, classify_statuses};

/// Client for the survey service.
///
/// The client is meant for one thread: calls block until the service answers
/// or the configured timeout elapses.
#[derive(Debug)]
pub struct SurveyClient<T = SoapTransport> {
    transport: T,
    connection: Connection,
    session: SessionPolicy,
    read_retries: u32,
    logged_in: Cell<bool>,
}

impl SurveyClient<SoapTransport> {
    /// Creates a client that talks SOAP over HTTP.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = SoapTransport::new(config.namespace.clone())?;
        Self::with_transport(config, transport)
    }
}

/// Parameters of a `GetSurveyDataEx` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyDataExQuery {
    pub survey_id: String,
    /// Export report values instead of raw values by sending the report data map.
    pub report_values: bool,
    /// Inclusive lower bound, formatted `YYYY-MM-DDTHH:MM:SS`.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub completed_only: bool,
}

impl SurveyDataExQuery {
    pub fn new(survey_id: impl Into<String>) -> Self {
        Self {
            survey_id: survey_id.into(),
            ..Self::default()
        }
    }
}

impl<T: Transport> SurveyClient<T> {
    /// Creates a client on top of any transport. The configuration is
    /// validated first.
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            connection: config.connection(),
            session: config.session,
            read_retries: config.read_retries,
            logged_in: Cell::new(false),
        })
    }

    /// The transport requests go through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn endpoint(&self) -> &str {
        &self.connection.endpoint
    }

    /// Points the client at another endpoint. The next call logs in again.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.connection.endpoint = endpoint.into();
        self.logged_in.set(false);
    }

    /// Changes the login name. The next call logs in again.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.connection.username = username.into();
        self.logged_in.set(false);
    }

    /// Changes the password. The next call logs in again.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.connection.password = password.into();
        self.logged_in.set(false);
    }

    /// Timeout for each HTTP exchange made from now on.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.connection.timeout = timeout;
    }

    /// Calls a remote operation and returns its result payload.
    ///
    /// Faults of read-only operations are retried up to the configured number
    /// of extra attempts. Write operations are sent exactly once.
    pub fn invoke(&self, operation: Operation, params: &Params) -> RemoteResult<XmlElement> {
        let attempts = if operation.is_read_only() {
            self.read_retries.saturating_add(1)
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            match self.invoke_once(operation, params) {
                RemoteResult::Error(RemoteError::Fault(reason)) if attempt < attempts => {
                    warn!(%operation, attempt, %reason, "remote fault, retrying");
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }

    fn invoke_once(&self, operation: Operation, params: &Params) -> RemoteResult<XmlElement> {
        if let Err(error) = self.ensure_session() {
            return RemoteResult::Error(error);
        }

        debug!(%operation, params = params.len(), "invoking remote operation");
        let response = match self.transport.call(&self.connection, operation, params) {
            Ok(Some(response)) => response,
            Ok(None) => return RemoteResult::Empty,
            Err(error) => return RemoteResult::Error(error),
        };

        match operation.result_element() {
            None => RemoteResult::Success(response),
            Some(name) => response
                .children
                .into_iter()
                .find(|child| child.local_name() == name)
                .map_or(RemoteResult::Empty, RemoteResult::Success),
        }
    }

    fn ensure_session(&self) -> std::result::Result<(), RemoteError> {
        if self.session == SessionPolicy::Once && self.logged_in.get() {
            return Ok(());
        }

        let credentials = Params::new()
            .with("userName", self.connection.username.as_str())
            .with("password", self.connection.password.as_str());
        self.transport
            .call(&self.connection, Operation::Login, &credentials)?;
        self.logged_in.set(true);
        Ok(())
    }

    fn count(&self, operation: Operation, params: &Params) -> RemoteResult<u64> {
        self.invoke(operation, params)
            .and_then(|payload| match payload.text.trim().parse::<u64>() {
                Ok(count) => RemoteResult::Success(count),
                Err(_) => RemoteResult::Error(RemoteError::Malformed {
                    operation: operation.to_string(),
                    reason: format!("expected a count, found '{}'", payload.text.trim()),
                }),
            })
    }

    /// Number of responses collected by a survey.
    pub fn get_response_count(&self, survey_id: &str, completed_only: bool) -> RemoteResult<u64> {
        let params = Params::new()
            .with("projectId", survey_id)
            .with("completedOnly", completed_only);
        self.count(Operation::GetResponseCount, &params)
    }

    /// Number of participants authorized for a survey.
    pub fn get_authorized_participant_count(&self, survey_id: &str) -> RemoteResult<u64> {
        let params = Params::new().with("projectId", survey_id);
        self.count(Operation::GetAuthorizedParticipantCount, &params)
    }

    /// Field names and declared types of a survey, including the standard
    /// columns every survey reports.
    pub fn get_column_list(&self, survey_id: &str) -> RemoteResult<ColumnDescriptor> {
        let params = Params::new().with("projectId", survey_id);
        self.invoke(Operation::GetColumnList, &params)
            .and_then(|payload| match payload.document() {
                Some(root) => RemoteResult::Success(ColumnDescriptor::from_columns(
                    root.children.iter().map(column_entry),
                )),
                None => RemoteResult::Empty,
            })
    }

    /// Progress details of one participant.
    pub fn get_single_participant(
        &self,
        survey_id: &str,
        record_id: &str,
    ) -> RemoteResult<ParticipantInfo> {
        let params = Params::new()
            .with("projectId", survey_id)
            .with("recordId", record_id);
        self.invoke(Operation::GetParticipantInformation, &params)
            .and_then(|payload| match payload.document() {
                Some(root) => {
                    let attribute = |name: &str| root.attribute(name).unwrap_or_default().to_string();
                    RemoteResult::Success(ParticipantInfo {
                        started: attribute("started"),
                        completed: attribute("completed"),
                        branched_out: attribute("branched_out"),
                        email: attribute("email"),
                    })
                }
                None => RemoteResult::Empty,
            })
    }

    /// Field to value mappings of a survey as an XML document, suitable for the
    /// `dataMapXml` parameter of data exports.
    pub fn get_report_data_map(&self, survey_id: &str) -> RemoteResult<String> {
        let params = Params::new().with("projectId", survey_id);
        self.invoke(Operation::GetReportDataMap, &params)
            .and_then(|payload| match payload.document() {
                Some(root) => match root.to_xml_string() {
                    Ok(document) => RemoteResult::Success(document),
                    Err(err) => RemoteResult::Error(RemoteError::Malformed {
                        operation: Operation::GetReportDataMap.to_string(),
                        reason: err.to_string(),
                    }),
                },
                None => RemoteResult::Empty,
            })
    }

    /// Every response of a survey in one unpaged request.
    pub fn get_survey_data_array(&self, query: &SurveyDataExQuery) -> RemoteResult<Vec<Record>> {
        let mut params = Params::new()
            .with("projectId", query.survey_id.as_str())
            .with("completedOnly", false);
        if query.report_values {
            match self.data_map_param(&query.survey_id) {
                Ok(Some(data_map)) => params.insert("dataMapXml", data_map),
                Ok(None) => {}
                Err(error) => return RemoteResult::Error(error),
            }
        }
        if let Some(start) = &query.start_time {
            params.insert("startTime", start.as_str());
        }
        if let Some(end) = &query.end_time {
            params.insert("endTime", end.as_str());
        }
        if query.completed_only {
            params.insert("completedOnly", true);
        }

        self.survey_data_ex(&params)
    }

    /// Responses whose `user_key1` equals `key1`.
    pub fn get_single_result_by_key1(
        &self,
        survey_id: &str,
        report_values: bool,
        key1: &str,
    ) -> RemoteResult<Vec<Record>> {
        let mut params = Params::new()
            .with("projectId", survey_id)
            .with("completedOnly", false);
        if report_values {
            match self.data_map_param(survey_id) {
                Ok(Some(data_map)) => params.insert("dataMapXml", data_map),
                Ok(None) => {}
                Err(error) => return RemoteResult::Error(error),
            }
        }
        params.insert("filterXml", key1_filter(key1));

        self.survey_data_ex(&params)
    }

    fn survey_data_ex(&self, params: &Params) -> RemoteResult<Vec<Record>> {
        self.invoke(Operation::GetSurveyDataEx, params)
            .map(|payload| table_records(&payload).unwrap_or_default())
    }

    fn data_map_param(&self, survey_id: &str) -> std::result::Result<Option<String>, RemoteError> {
        self.get_report_data_map(survey_id)
            .into_result()
            .map_err(|error| RemoteError::Dependency {
                operation: Operation::GetReportDataMap.to_string(),
                reason: error.to_string(),
            })
    }

    /// Triggers invitation delivery and returns the raw response element.
    pub fn send_invitations(&self, survey_id: &str, options: &Params) -> RemoteResult<XmlElement> {
        let mut params = Params::new().with("projectId", survey_id);
        for (name, value) in options.iter() {
            params.insert(name, value.clone());
        }
        self.invoke(Operation::SendInvitations, &params)
    }
}

/// Name and declared type of one column entry. Entries are either
/// `<Field id=".." type=".."/>` style elements or plain `<name>type</name>`.
fn column_entry(element: &XmlElement) -> (String, String) {
    let name = element
        .attribute("id")
        .or_else(|| element.attribute("name"))
        .unwrap_or_else(|| element.local_name())
        .to_string();
    let type_name = element
        .attribute("type")
        .map(str::to_string)
        .unwrap_or_else(|| element.text.trim().to_string());
    (name, type_name)
}

fn key1_filter(key1: &str) -> String {
    format!(
        r#"<CriteriaCollection><Criterion heading="user_key1" expression="=" value="{}" /></CriteriaCollection>"#,
        xml::escape(key1)
    )
}
