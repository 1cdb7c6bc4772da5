use crate::feedback::tools::client::SurveyClient;
use crate::feedback::tools::model::{CampaignStatus, Params};
use crate::feedback::tools::result::RemoteResult;
use crate::feedback::tools::transport::{Operation, Transport};

/// Delivery status codes meaning the invitation could not be delivered.
pub const UNDELIVERABLE_CODES: [i64; 12] = [30, 31, 32, 33, 34, 40, 41, 42, 43, 44, 45, 46];
/// Delivery status codes meaning the participant unsubscribed.
pub const UNSUBSCRIBE_CODES: [i64; 1] = [90];

/// Classifies campaign history statuses in order. The first status that is
/// undeliverable or unsubscribed decides; undeliverable is checked first.
pub fn classify_statuses<I>(statuses: I) -> CampaignStatus
where
    I: IntoIterator<Item = i64>,
{
    for status in statuses {
        if UNDELIVERABLE_CODES.contains(&status) {
            return CampaignStatus::Undeliverable;
        }
        if UNSUBSCRIBE_CODES.contains(&status) {
            return CampaignStatus::Unsubscribed;
        }
    }
    CampaignStatus::Normal
}

impl<T: Transport> SurveyClient<T> {
    /// Delivery condition of a participant. A participant without campaign
    /// history is [`CampaignStatus::Normal`].
    pub fn get_campaign_status(&self, survey_id: &str, record_id: &str) -> RemoteResult<CampaignStatus> {
        let params = Params::new()
            .with("projectId", survey_id)
            .with("participantId", record_id);
        self.invoke(Operation::GetCampaignHistory, &params)
            .map(|payload| {
                let statuses = payload
                    .document()
                    .map(|root| {
                        root.children
                            .iter()
                            .filter_map(|entry| entry.attribute("status")?.trim().parse().ok())
                            .collect::<Vec<i64>>()
                    })
                    .unwrap_or_default();
                classify_statuses(statuses)
            })
            .or_empty(CampaignStatus::Normal)
    }
}
