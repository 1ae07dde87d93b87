//! Event-log record types.

use serde::{Deserialize, Serialize};

/// Discriminator value of the only event type that is ingested.
pub const SUBMIT_FUNCTION: &str = "submit";

/// Header names the event-log export must provide.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "functionName",
    "_id",
    "addedAtUtc",
    "environmentId",
    "eventName",
    "userId",
    "flowId",
    "flowOriginId",
    "companyId",
    "dianaResourceId",
    "stepId",
    "subscriptionEntities.entityId",
    "subscriptionEntities.entityCompanyId",
];

/// One row of the event-log export, as read from the source.
///
/// Empty cells are `None`. Columns not listed here are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "functionName")]
    pub function_name: Option<String>,
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "addedAtUtc")]
    pub added_at_utc: Option<String>,
    #[serde(rename = "environmentId")]
    pub environment_id: Option<String>,
    #[serde(rename = "eventName")]
    pub event_name: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "flowId")]
    pub flow_id: Option<String>,
    #[serde(rename = "flowOriginId")]
    pub flow_origin_id: Option<String>,
    #[serde(rename = "companyId")]
    pub company_id: Option<String>,
    #[serde(rename = "dianaResourceId")]
    pub resource_id: Option<String>,
    #[serde(rename = "stepId")]
    pub step_id: Option<String>,
    #[serde(rename = "subscriptionEntities.entityId")]
    pub invited_entity_id: Option<String>,
    #[serde(rename = "subscriptionEntities.entityCompanyId")]
    pub invited_entity_company_id: Option<String>,
}

impl RawRecord {
    /// Whether this row is a "submit" action.
    pub fn is_submit(&self) -> bool {
        self.function_name.as_deref() == Some(SUBMIT_FUNCTION)
    }
}

/// The canonical column set of a submit row, before completeness is checked.
///
/// Equality over this type is what duplicate removal compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ProjectedRow {
    pub event_id: Option<String>,
    pub date: Option<String>,
    pub environment_id: Option<String>,
    pub event_name: Option<String>,
    pub user_id: Option<String>,
    pub flow_id: Option<String>,
    pub flow_origin_id: Option<String>,
    pub company_id: Option<String>,
    pub resource_id: Option<String>,
    pub step_id: Option<String>,
    pub invited_user_id: Option<String>,
    pub invited_company_id: Option<String>,
}

impl From<RawRecord> for ProjectedRow {
    fn from(raw: RawRecord) -> Self {
        Self {
            event_id: raw.id,
            date: raw.added_at_utc,
            environment_id: raw.environment_id,
            event_name: raw.event_name,
            user_id: raw.user_id,
            flow_id: raw.flow_id,
            flow_origin_id: raw.flow_origin_id,
            company_id: raw.company_id,
            resource_id: raw.resource_id,
            step_id: raw.step_id,
            invited_user_id: raw.invited_entity_id,
            invited_company_id: raw.invited_entity_company_id,
        }
    }
}

impl ProjectedRow {
    /// Convert into a complete record, or `None` if any field is missing.
    pub fn into_complete(self) -> Option<SubmitRecord> {
        Some(SubmitRecord {
            event_id: self.event_id?,
            date: self.date?,
            environment_id: self.environment_id?,
            event_name: self.event_name?,
            user_id: self.user_id?,
            flow_id: self.flow_id?,
            flow_origin_id: self.flow_origin_id?,
            company_id: self.company_id?,
            resource_id: self.resource_id?,
            step_id: self.step_id?,
            invited_user_id: self.invited_user_id?,
            invited_company_id: self.invited_company_id?,
        })
    }
}

/// A normalized submit row: every field present, `date` canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRecord {
    pub event_id: String,
    pub date: String,
    pub environment_id: String,
    pub event_name: String,
    pub user_id: String,
    pub flow_id: String,
    pub flow_origin_id: String,
    pub company_id: String,
    pub resource_id: String,
    pub step_id: String,
    pub invited_user_id: String,
    pub invited_company_id: String,
}
