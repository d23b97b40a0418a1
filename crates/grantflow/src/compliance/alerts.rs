use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::classifier::StatusBuckets;
use super::domain::{AlertKey, AlertLevel, AlertType, StoredAlert, UserId};

/// A risk condition detected by the current classification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertCondition {
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub message: String,
    pub level: AlertLevel,
    pub items: Vec<Uuid>,
}

impl AlertCondition {
    pub fn key(&self) -> AlertKey {
        AlertKey {
            alert_type: self.alert_type.clone(),
            message: self.message.clone(),
        }
    }

    pub fn into_stored(self, user_id: UserId, now: DateTime<Utc>) -> StoredAlert {
        StoredAlert {
            id: Uuid::new_v4(),
            user_id,
            alert_type: self.alert_type,
            message: self.message,
            level: self.level,
            related_items: self.items,
            is_active: true,
            is_read: false,
            created_at: now,
            resolved_at: None,
        }
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {singular}")
    } else {
        format!("{count} {plural}")
    }
}

fn condition(
    alert_type: AlertType,
    level: AlertLevel,
    message: String,
    items: Vec<Uuid>,
) -> Option<AlertCondition> {
    (!items.is_empty()).then_some(AlertCondition {
        alert_type,
        message,
        level,
        items,
    })
}

/// One condition per non-empty bucket, in severity order.
pub fn compute_conditions(buckets: &StatusBuckets) -> Vec<AlertCondition> {
    let overdue = buckets.overdue_items.len();
    let critical = buckets.critical_items.len();
    let expired = buckets.expired_documents.len();
    let expiring = buckets.expiring_documents.len();
    let missing = buckets.missing_documents.len();
    let recurring_overdue = buckets.overdue_recurring.len();
    let recurring_upcoming = buckets.upcoming_recurring.len();

    [
        condition(
            AlertType::OverdueItems,
            AlertLevel::Critical,
            format!(
                "{} overdue",
                plural(overdue, "compliance item is", "compliance items are")
            ),
            buckets.overdue_items.iter().map(|item| item.id).collect(),
        ),
        condition(
            AlertType::ExpiredDocuments,
            AlertLevel::Critical,
            format!("{} expired", plural(expired, "document has", "documents have")),
            buckets.expired_documents.iter().map(|doc| doc.id).collect(),
        ),
        condition(
            AlertType::OverdueRecurring,
            AlertLevel::Critical,
            format!(
                "{} past due",
                plural(
                    recurring_overdue,
                    "recurring obligation is",
                    "recurring obligations are"
                )
            ),
            buckets.overdue_recurring.iter().map(|ob| ob.id).collect(),
        ),
        condition(
            AlertType::CriticalDeadlines,
            AlertLevel::Warning,
            format!(
                "{} due within the critical window",
                plural(critical, "deadline is", "deadlines are")
            ),
            buckets.critical_items.iter().map(|item| item.id).collect(),
        ),
        condition(
            AlertType::ExpiringDocuments,
            AlertLevel::Warning,
            format!("{} expiring soon", plural(expiring, "document is", "documents are")),
            buckets.expiring_documents.iter().map(|doc| doc.id).collect(),
        ),
        condition(
            AlertType::MissingDocuments,
            AlertLevel::Warning,
            format!(
                "{} missing",
                plural(missing, "required document is", "required documents are")
            ),
            buckets.missing_documents.iter().map(|doc| doc.id).collect(),
        ),
        condition(
            AlertType::UpcomingRecurring,
            AlertLevel::Info,
            format!(
                "{} coming due",
                plural(
                    recurring_upcoming,
                    "recurring obligation is",
                    "recurring obligations are"
                )
            ),
            buckets.upcoming_recurring.iter().map(|ob| ob.id).collect(),
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Writes needed to make active stored alerts match the computed conditions.
///
/// Alerts whose key persists are left untouched; their content is not
/// refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub to_insert: Vec<AlertCondition>,
    pub to_resolve: Vec<Uuid>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_resolve.is_empty()
    }
}

pub fn plan_sync(conditions: &[AlertCondition], stored: &[StoredAlert]) -> SyncPlan {
    let active: Vec<&StoredAlert> = stored.iter().filter(|alert| alert.is_active).collect();
    let active_keys: HashSet<AlertKey> = active.iter().map(|alert| alert.key()).collect();
    let computed_keys: HashSet<AlertKey> = conditions.iter().map(AlertCondition::key).collect();

    let mut seen = HashSet::new();
    let to_insert = conditions
        .iter()
        .filter(|condition| {
            let key = condition.key();
            !active_keys.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect();

    let to_resolve = active
        .iter()
        .filter(|alert| !computed_keys.contains(&alert.key()))
        .map(|alert| alert.id)
        .collect();

    SyncPlan {
        to_insert,
        to_resolve,
    }
}

/// Outcome of applying a [`SyncPlan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub inserted: usize,
    pub resolved: usize,
    pub failed: usize,
    pub skipped: bool,
}

impl SyncReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}
