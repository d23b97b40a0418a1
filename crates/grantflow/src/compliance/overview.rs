use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::alerts::{compute_conditions, AlertCondition};
use super::classifier::{classify, StatusBuckets};
use super::domain::{
    AlertThresholds, AnalyticsSnapshot, ComplianceDocument, ComplianceRule, HistoryEntry,
    OverallStatus, RecurringObligation, StoredAlert, TrackingItem,
};
use super::fetch::ComplianceSnapshot;
use super::score::{compliance_score, overall_status};

const RECENT_ALERT_LIMIT: usize = 10;
const RESOLVED_ALERT_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct AlertViews {
    pub computed: Vec<AlertCondition>,
    pub active: Vec<StoredAlert>,
    pub recent: Vec<StoredAlert>,
    pub resolved: Vec<StoredAlert>,
}

impl AlertViews {
    pub(crate) fn from_stored(computed: Vec<AlertCondition>, stored: &[StoredAlert]) -> Self {
        let active = stored
            .iter()
            .filter(|alert| alert.is_active)
            .cloned()
            .collect();

        let mut recent: Vec<StoredAlert> = stored.to_vec();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(RECENT_ALERT_LIMIT);

        let mut resolved: Vec<StoredAlert> = stored
            .iter()
            .filter(|alert| !alert.is_active && alert.resolved_at.is_some())
            .cloned()
            .collect();
        resolved.sort_by(|a, b| b.resolved_at.cmp(&a.resolved_at));
        resolved.truncate(RESOLVED_ALERT_LIMIT);

        Self {
            computed,
            active,
            recent,
            resolved,
        }
    }
}

/// Everything the compliance dashboard renders for one user.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceOverview {
    pub overall_status: OverallStatus,
    pub compliance_score: u8,
    pub total_items: usize,
    pub compliant_items: usize,
    pub thresholds: AlertThresholds,
    pub evaluated_on: NaiveDate,
    pub tracking_items: Vec<TrackingItem>,
    pub documents: Vec<ComplianceDocument>,
    pub recurring: Vec<RecurringObligation>,
    pub overdue_items: Vec<TrackingItem>,
    pub critical_items: Vec<TrackingItem>,
    pub warning_items: Vec<TrackingItem>,
    pub expired_documents: Vec<ComplianceDocument>,
    pub expiring_documents: Vec<ComplianceDocument>,
    pub missing_documents: Vec<ComplianceDocument>,
    pub overdue_recurring: Vec<RecurringObligation>,
    pub upcoming_recurring: Vec<RecurringObligation>,
    pub alerts: AlertViews,
    pub history: Vec<HistoryEntry>,
    pub rules: Vec<ComplianceRule>,
    pub analytics: Vec<AnalyticsSnapshot>,
    pub generated_at: DateTime<Utc>,
}

impl ComplianceOverview {
    pub fn build(snapshot: ComplianceSnapshot, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let ComplianceSnapshot {
            tracking,
            documents,
            recurring,
            alerts,
            thresholds,
            history,
            rules,
            analytics,
            ..
        } = snapshot;

        let buckets = classify(today, &tracking, &documents, &recurring, &thresholds);
        let score = compliance_score(&tracking, &documents, &recurring);
        let status = overall_status(&buckets);
        let computed = compute_conditions(&buckets);

        let StatusBuckets {
            overdue_items,
            critical_items,
            warning_items,
            expired_documents,
            expiring_documents,
            missing_documents,
            overdue_recurring,
            upcoming_recurring,
        } = buckets;

        Self {
            overall_status: status,
            compliance_score: score.score,
            total_items: score.total_items,
            compliant_items: score.compliant_items,
            thresholds,
            evaluated_on: today,
            tracking_items: tracking,
            documents,
            recurring,
            overdue_items,
            critical_items,
            warning_items,
            expired_documents,
            expiring_documents,
            missing_documents,
            overdue_recurring,
            upcoming_recurring,
            alerts: AlertViews::from_stored(computed, &alerts),
            history,
            rules,
            analytics,
            generated_at: now,
        }
    }

    pub fn overdue_count(&self) -> usize {
        self.overdue_items.len() + self.expired_documents.len() + self.overdue_recurring.len()
    }
}
