use std::fmt;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for the account owning compliance records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TrackingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub(crate) fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "pending" | "open" | "todo" => Some(Self::Pending),
            "in_progress" | "started" => Some(Self::InProgress),
            "completed" | "complete" | "done" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub(crate) fn parse_lenient(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "normal" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "urgent" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// A discrete compliance obligation with a deadline and completion status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingItem {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub deadline_date: Option<NaiveDate>,
    pub status: TrackingStatus,
    pub priority: Priority,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackingItem {
    pub fn is_completed(&self) -> bool {
        self.status == TrackingStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Missing,
    Uploaded,
    Verified,
}

/// Supporting record such as a registration certificate or audit letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceDocument {
    pub id: Uuid,
    pub user_id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub status: DocumentStatus,
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ComplianceDocument {
    /// Uploaded documents count toward the score even before verification.
    pub fn is_on_file(&self) -> bool {
        matches!(
            self.status,
            DocumentStatus::Uploaded | DocumentStatus::Verified
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    SemiAnnually,
    Annually,
}

impl Frequency {
    /// Shift `date` forward by one period, clamping to month ends.
    pub fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Weekly => date.checked_add_days(chrono::Days::new(7)),
            Self::Monthly => date.checked_add_months(Months::new(1)),
            Self::Quarterly => date.checked_add_months(Months::new(3)),
            Self::SemiAnnually => date.checked_add_months(Months::new(6)),
            Self::Annually => date.checked_add_months(Months::new(12)),
        }
    }
}

/// A periodic obligation with a rolling due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringObligation {
    pub id: Uuid,
    pub user_id: UserId,
    pub title: String,
    pub frequency: Frequency,
    pub next_due_date: Option<NaiveDate>,
    pub is_active: bool,
    pub last_completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringObligation {
    /// Record a completed cycle on `completed_on` and roll the due date forward.
    pub fn complete_cycle(&mut self, completed_on: NaiveDate) {
        self.last_completed_date = Some(completed_on);
        let anchor = self.next_due_date.unwrap_or(completed_on);
        self.next_due_date = self.frequency.advance(anchor).or(self.next_due_date);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Critical,
    Warning,
    Info,
}

/// Category of a detected condition. `Custom` covers user-created alerts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    OverdueItems,
    CriticalDeadlines,
    ExpiredDocuments,
    ExpiringDocuments,
    MissingDocuments,
    OverdueRecurring,
    UpcomingRecurring,
    #[serde(untagged)]
    Custom(String),
}

/// Structural identity used to match computed conditions with stored alerts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKey {
    pub alert_type: AlertType,
    pub message: String,
}

/// Persisted, deduplicated notification for one detected risk condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAlert {
    pub id: Uuid,
    pub user_id: UserId,
    pub alert_type: AlertType,
    pub message: String,
    pub level: AlertLevel,
    #[serde(default)]
    pub related_items: Vec<Uuid>,
    pub is_active: bool,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl StoredAlert {
    pub fn key(&self) -> AlertKey {
        AlertKey {
            alert_type: self.alert_type.clone(),
            message: self.message.clone(),
        }
    }

    pub fn resolve(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.resolved_at = Some(now);
    }
}

/// Day-count thresholds controlling deadline buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Deadlines within this many days are critical. Default 7.
    pub critical: u32,
    /// Upper bound of the warning window. Default 14.
    pub warning: u32,
    /// Horizon for upcoming recurring obligations. Default 30.
    pub info: u32,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            critical: 7,
            warning: 14,
            info: 30,
        }
    }
}

impl AlertThresholds {
    pub fn is_ordered(&self) -> bool {
        self.critical <= self.warning && self.warning <= self.info
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub user_id: UserId,
    pub thresholds: AlertThresholds,
    pub email_notifications: bool,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit row written for each mutating action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub user_id: UserId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRule {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Good,
    Warning,
    Critical,
}

impl OverallStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// Point-in-time record of a compliance check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub id: Uuid,
    pub user_id: UserId,
    pub compliance_score: u8,
    pub overall_status: OverallStatus,
    pub total_items: usize,
    pub compliant_items: usize,
    pub overdue_count: usize,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn monthly_advance_clamps_to_month_end() {
        assert_eq!(
            Frequency::Monthly.advance(date(2026, 1, 31)),
            Some(date(2026, 2, 28))
        );
        assert_eq!(
            Frequency::Quarterly.advance(date(2026, 3, 15)),
            Some(date(2026, 6, 15))
        );
        assert_eq!(
            Frequency::Weekly.advance(date(2026, 12, 29)),
            Some(date(2027, 1, 5))
        );
    }

    #[test]
    fn completing_a_cycle_rolls_due_date_from_previous_due_date() {
        let now = Utc::now();
        let mut obligation = RecurringObligation {
            id: Uuid::new_v4(),
            user_id: UserId(Uuid::new_v4()),
            title: "Quarterly financial report".to_string(),
            frequency: Frequency::Quarterly,
            next_due_date: Some(date(2026, 3, 31)),
            is_active: true,
            last_completed_date: None,
            created_at: now,
            updated_at: now,
        };

        obligation.complete_cycle(date(2026, 4, 2));

        assert_eq!(obligation.last_completed_date, Some(date(2026, 4, 2)));
        assert_eq!(obligation.next_due_date, Some(date(2026, 6, 30)));
    }

    #[test]
    fn alert_keys_compare_structurally() {
        let colon_in_type = AlertKey {
            alert_type: AlertType::Custom("audit:q1".to_string()),
            message: "report".to_string(),
        };
        let colon_in_message = AlertKey {
            alert_type: AlertType::Custom("audit".to_string()),
            message: "q1:report".to_string(),
        };
        assert_ne!(colon_in_type, colon_in_message);
    }

    #[test]
    fn alert_type_serializes_known_and_custom_variants() {
        assert_eq!(
            serde_json::to_value(AlertType::OverdueItems).expect("serializes"),
            serde_json::json!("overdue_items")
        );
        assert_eq!(
            serde_json::to_value(AlertType::Custom("board_review".to_string()))
                .expect("serializes"),
            serde_json::json!("board_review")
        );
        let parsed: AlertType =
            serde_json::from_value(serde_json::json!("expired_documents")).expect("parses");
        assert_eq!(parsed, AlertType::ExpiredDocuments);
        let custom: AlertType =
            serde_json::from_value(serde_json::json!("board_review")).expect("parses");
        assert_eq!(custom, AlertType::Custom("board_review".to_string()));
    }

    #[test]
    fn default_thresholds_are_ordered() {
        let thresholds = AlertThresholds::default();
        assert!(thresholds.is_ordered());
        assert!(!AlertThresholds {
            critical: 10,
            warning: 5,
            info: 30
        }
        .is_ordered());
    }
}
