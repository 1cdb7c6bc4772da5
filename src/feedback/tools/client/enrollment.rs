use tracing::{info, warn};

use crate::feedback::tools::client::SurveyClient;
use crate::feedback::tools::error::RemoteError;
use crate::feedback::tools::model::{ColumnDescriptor, Params, RecordId};
use crate::feedback::tools::result::RemoteResult;
use crate::feedback::tools::transport::{Operation, Transport};
use crate::feedback::tools::xml::{self, XmlElement};

/// Maps common spellings of participant attributes to the names the service
/// expects. Matching ignores case, spaces, hyphens and underscores; unknown
/// names are returned unchanged.
pub fn normalize_attribute_name(name: &str) -> String {
    let compact: String = name
        .chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '-' && *ch != '_')
        .flat_map(char::to_lowercase)
        .collect();

    let canonical = match compact.as_str() {
        "key1" | "userkey1" => "userkey1",
        "key2" | "userkey2" => "userkey2",
        "key3" | "userkey3" => "userkey3",
        "email" => "email",
        "culture" => "culture",
        _ => return name.to_string(),
    };
    canonical.to_string()
}

/// Parameters of an `AuthorizeParticipantForSurvey` request.
pub fn enrollment_params(survey_id: &str, attributes: &Params) -> Params {
    let mut params = Params::new().with("projectId", survey_id);
    for (name, value) in attributes.iter() {
        params.insert(normalize_attribute_name(name), value.clone());
    }
    params
}

/// Builds the `SetPreloadData` document for one participant. Field types come
/// from the survey's column list.
pub fn build_prepop_fragment(
    record_id: &str,
    values: &Params,
    columns: &ColumnDescriptor,
) -> String {
    let mut fragment = format!(r#"<Rows><Row id="{}">"#, xml::escape(record_id));
    for (name, value) in values.iter() {
        let type_name = columns.type_of(name).unwrap_or_else(|| {
            warn!(field = name, "no declared type for preload field");
            ""
        });
        fragment.push_str(&format!(
            r#"<Field id="{}" type="{}">{}</Field>"#,
            xml::escape(name),
            xml::escape(type_name),
            xml::escape(&value.to_string())
        ));
    }
    fragment.push_str("</Row></Rows>");
    fragment
}

impl<T: Transport> SurveyClient<T> {
    /// Authorizes a participant for a survey and returns the new record id.
    ///
    /// When `prepop` holds values they are uploaded after enrollment. A failed
    /// upload fails the call, but the participant stays enrolled. Attribute
    /// names that cannot be sent as element names are rejected before any
    /// request is made.
    pub fn add_participant(
        &self,
        survey_id: &str,
        attributes: &Params,
        prepop: Option<&Params>,
    ) -> RemoteResult<RecordId> {
        let params = enrollment_params(survey_id, attributes);
        if let Some((name, _)) = params.iter().find(|(name, _)| !xml::is_element_name(name)) {
            return RemoteResult::Error(RemoteError::InvalidParameter(name.to_string()));
        }
        let record_id = match self.invoke(Operation::AuthorizeParticipantForSurvey, &params) {
            RemoteResult::Success(payload) => payload.text.trim().to_string(),
            RemoteResult::Empty => return RemoteResult::Empty,
            RemoteResult::Error(error) => return RemoteResult::Error(error),
        };
        if record_id.is_empty() {
            return RemoteResult::Empty;
        }
        info!(survey_id, %record_id, "participant enrolled");

        if let Some(prepop) = prepop.filter(|values| !values.is_empty()) {
            if let RemoteResult::Error(error) = self.add_prepop(survey_id, &record_id, prepop) {
                warn!(
                    survey_id,
                    %record_id,
                    %error,
                    "preload upload failed after enrollment; participant remains enrolled"
                );
                return RemoteResult::Error(error);
            }
        }

        RemoteResult::Success(record_id)
    }

    /// Uploads preload values for an enrolled participant.
    ///
    /// The service answers an accepted upload with an empty body; any content
    /// in the answer means the upload was rejected.
    pub fn add_prepop(&self, survey_id: &str, record_id: &str, values: &Params) -> RemoteResult<()> {
        let columns = match self.get_column_list(survey_id) {
            RemoteResult::Success(columns) => columns,
            RemoteResult::Empty => {
                return RemoteResult::Error(RemoteError::Dependency {
                    operation: Operation::GetColumnList.to_string(),
                    reason: "no column list returned".to_string(),
                });
            }
            RemoteResult::Error(error) => {
                return RemoteResult::Error(RemoteError::Dependency {
                    operation: Operation::GetColumnList.to_string(),
                    reason: error.to_string(),
                });
            }
        };

        let params = Params::new()
            .with("projectId", survey_id)
            .with("dataString", build_prepop_fragment(record_id, values, &columns));

        match self.invoke(Operation::SetPreloadData, &params) {
            RemoteResult::Success(payload) if payload.is_blank() => RemoteResult::Success(()),
            RemoteResult::Success(payload) => {
                RemoteResult::Error(RemoteError::Rejected(describe(&payload)))
            }
            RemoteResult::Empty => RemoteResult::Success(()),
            RemoteResult::Error(error) => RemoteResult::Error(error),
        }
    }
}

fn describe(payload: &XmlElement) -> String {
    if payload.children.is_empty() {
        return payload.text.trim().to_string();
    }
    payload
        .children
        .iter()
        .filter_map(|child| child.to_xml_string().ok())
        .collect::<Vec<_>>()
        .join("")
}
