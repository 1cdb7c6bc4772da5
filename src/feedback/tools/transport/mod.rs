use std::fmt;
use std::time::Duration;

use crate::feedback::tools::error::RemoteError;
use crate::feedback::tools::model::Params;
use crate::feedback::tools::xml::XmlElement;

pub mod soap;

pub use soap::SoapTransport;

/// Remote operations exposed by the survey service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    GetResponseCount,
    GetSurveyDataPaged,
    GetSurveyDataEx,
    GetColumnList,
    AuthorizeParticipantForSurvey,
    SetPreloadData,
    GetAuthorizedParticipantCount,
    GetParticipantDataPaged,
    GetPreloadData,
    GetCampaignHistory,
    GetParticipantInformation,
    GetReportDataMap,
    SendInvitations,
}

impl Operation {
    /// Name of the operation on the wire.
    pub const fn name(self) -> &'static str {
        match self {
            Operation::Login => "Login",
            Operation::GetResponseCount => "GetResponseCount",
            Operation::GetSurveyDataPaged => "GetSurveyDataPaged",
            Operation::GetSurveyDataEx => "GetSurveyDataEx",
            Operation::GetColumnList => "GetColumnList",
            Operation::AuthorizeParticipantForSurvey => "AuthorizeParticipantForSurvey",
            Operation::SetPreloadData => "SetPreloadData",
            Operation::GetAuthorizedParticipantCount => "GetAuthorizedParticipantCount",
            Operation::GetParticipantDataPaged => "GetParticipantDataPaged",
            Operation::GetPreloadData => "GetPreloadData",
            Operation::GetCampaignHistory => "GetCampaignHistory",
            Operation::GetParticipantInformation => "GetParticipantInformation",
            Operation::GetReportDataMap => "GetReportDataMap",
            Operation::SendInvitations => "SendInvitations",
        }
    }

    /// Element of the response that carries the payload. `SendInvitations`
    /// has none and hands back the whole response.
    pub fn result_element(self) -> Option<String> {
        match self {
            Operation::SendInvitations => None,
            other => Some(format!("{}Result", other.name())),
        }
    }

    /// Operations without server-side effects, safe to repeat.
    pub const fn is_read_only(self) -> bool {
        !matches!(
            self,
            Operation::Login
                | Operation::AuthorizeParticipantForSurvey
                | Operation::SetPreloadData
                | Operation::SendInvitations
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where and as whom to call the service.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    /// Upper bound for each HTTP exchange.
    pub timeout: Duration,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sends one operation to the service.
///
/// Implementations return the response element found in the message body,
/// `None` when the body is empty, and [`RemoteError::Fault`] for anything
/// that prevented a regular answer.
pub trait Transport {
    fn call(
        &self,
        connection: &Connection,
        operation: Operation,
        params: &Params,
    ) -> Result<Option<XmlElement>, RemoteError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn call(
        &self,
        connection: &Connection,
        operation: Operation,
        params: &Params,
    ) -> Result<Option<XmlElement>, RemoteError> {
        (**self).call(connection, operation, params)
    }
}
