use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

use super::domain::{AlertLevel, AlertType, DocumentStatus, Frequency, Priority, TrackingStatus};
use super::service::ComplianceServiceError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTrackingItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub deadline_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// Partial update. Clearable fields distinguish an absent key (keep) from an
/// explicit `null` (clear).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackingItemUpdate {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "clearable")]
    pub deadline_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub status: Option<TrackingStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewDocument {
    pub name: String,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default = "default_true")]
    pub is_required: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentUpdate {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "clearable")]
    pub expiration_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default, deserialize_with = "clearable")]
    pub file_url: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewRecurring {
    pub title: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecurringUpdate {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default, deserialize_with = "clearable")]
    pub next_due_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Marks the current cycle done and advances `next_due_date`.
    #[serde(default)]
    pub complete_cycle: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewAlert {
    pub alert_type: AlertType,
    pub message: String,
    #[serde(default = "default_level")]
    pub level: AlertLevel,
    #[serde(default)]
    pub related_items: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AlertRef {
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct PreferencesUpdate {
    #[serde(default)]
    pub critical: Option<u32>,
    #[serde(default)]
    pub warning: Option<u32>,
    #[serde(default)]
    pub info: Option<u32>,
    #[serde(default)]
    pub email_notifications: Option<bool>,
}

fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_true() -> bool {
    true
}

fn default_level() -> AlertLevel {
    AlertLevel::Info
}

/// Mutations and checks accepted by `POST /api/compliance`.
#[derive(Debug, Clone, PartialEq)]
pub enum ComplianceAction {
    CreateTrackingItem(NewTrackingItem),
    UpdateTrackingItem(TrackingItemUpdate),
    CreateDocument(NewDocument),
    UpdateDocument(DocumentUpdate),
    CreateRecurring(NewRecurring),
    UpdateRecurring(RecurringUpdate),
    CreateAlert(NewAlert),
    MarkAlertRead(AlertRef),
    ResolveAlert(AlertRef),
    UpdatePreferences(PreferencesUpdate),
    RunComplianceCheck,
}

impl ComplianceAction {
    pub fn parse(action: &str, data: Option<Value>) -> Result<Self, ComplianceServiceError> {
        let action = match action {
            "create_tracking_item" => Self::CreateTrackingItem(payload(action, data)?),
            "update_tracking_item" => Self::UpdateTrackingItem(payload(action, data)?),
            "create_document" => Self::CreateDocument(payload(action, data)?),
            "update_document" => Self::UpdateDocument(payload(action, data)?),
            "create_recurring" => Self::CreateRecurring(payload(action, data)?),
            "update_recurring" => Self::UpdateRecurring(payload(action, data)?),
            "create_alert" => Self::CreateAlert(payload(action, data)?),
            "mark_alert_read" => Self::MarkAlertRead(payload(action, data)?),
            "resolve_alert" => Self::ResolveAlert(payload(action, data)?),
            "update_preferences" => {
                Self::UpdatePreferences(payload(action, data.or(Some(Value::Null)))?)
            }
            "run_compliance_check" => Self::RunComplianceCheck,
            other => return Err(ComplianceServiceError::UnknownAction(other.to_string())),
        };
        Ok(action)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateTrackingItem(_) => "create_tracking_item",
            Self::UpdateTrackingItem(_) => "update_tracking_item",
            Self::CreateDocument(_) => "create_document",
            Self::UpdateDocument(_) => "update_document",
            Self::CreateRecurring(_) => "create_recurring",
            Self::UpdateRecurring(_) => "update_recurring",
            Self::CreateAlert(_) => "create_alert",
            Self::MarkAlertRead(_) => "mark_alert_read",
            Self::ResolveAlert(_) => "resolve_alert",
            Self::UpdatePreferences(_) => "update_preferences",
            Self::RunComplianceCheck => "run_compliance_check",
        }
    }
}

fn payload<T: DeserializeOwned>(
    action: &str,
    data: Option<Value>,
) -> Result<T, ComplianceServiceError> {
    let data = match data {
        Some(Value::Null) => Value::Object(Default::default()),
        Some(value) => value,
        None => {
            return Err(ComplianceServiceError::InvalidRequest(format!(
                "{action} requires a data payload"
            )))
        }
    };
    serde_json::from_value(data).map_err(|err| {
        ComplianceServiceError::InvalidRequest(format!("invalid data for {action}: {err}"))
    })
}
