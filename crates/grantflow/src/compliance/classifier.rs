use chrono::NaiveDate;

use super::domain::{
    AlertThresholds, ComplianceDocument, DocumentStatus, RecurringObligation, TrackingItem,
};

/// Signed whole days from `today` until `date`.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Deadline buckets for one user's compliance records.
///
/// Tracking items land in at most one of `overdue_items`, `critical_items`
/// and `warning_items`. Records without a date are never placed in a date
/// bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBuckets {
    pub overdue_items: Vec<TrackingItem>,
    pub critical_items: Vec<TrackingItem>,
    pub warning_items: Vec<TrackingItem>,
    pub expired_documents: Vec<ComplianceDocument>,
    pub expiring_documents: Vec<ComplianceDocument>,
    pub missing_documents: Vec<ComplianceDocument>,
    pub overdue_recurring: Vec<RecurringObligation>,
    pub upcoming_recurring: Vec<RecurringObligation>,
}

impl StatusBuckets {
    pub fn has_critical(&self) -> bool {
        !self.overdue_items.is_empty()
            || !self.expired_documents.is_empty()
            || !self.overdue_recurring.is_empty()
    }

    pub fn has_warning(&self) -> bool {
        !self.critical_items.is_empty()
            || !self.expiring_documents.is_empty()
            || !self.upcoming_recurring.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeadlineBucket {
    Overdue,
    Critical,
    Warning,
}

fn deadline_bucket(days: i64, thresholds: &AlertThresholds) -> Option<DeadlineBucket> {
    if days < 0 {
        Some(DeadlineBucket::Overdue)
    } else if days <= i64::from(thresholds.critical) {
        Some(DeadlineBucket::Critical)
    } else if days <= i64::from(thresholds.warning) {
        Some(DeadlineBucket::Warning)
    } else {
        None
    }
}

pub fn classify(
    today: NaiveDate,
    tracking: &[TrackingItem],
    documents: &[ComplianceDocument],
    recurring: &[RecurringObligation],
    thresholds: &AlertThresholds,
) -> StatusBuckets {
    let mut buckets = StatusBuckets::default();

    for item in tracking.iter().filter(|item| !item.is_completed()) {
        let Some(deadline) = item.deadline_date else {
            continue;
        };
        match deadline_bucket(days_until(deadline, today), thresholds) {
            Some(DeadlineBucket::Overdue) => buckets.overdue_items.push(item.clone()),
            Some(DeadlineBucket::Critical) => buckets.critical_items.push(item.clone()),
            Some(DeadlineBucket::Warning) => buckets.warning_items.push(item.clone()),
            None => {}
        }
    }

    for document in documents {
        if document.is_required && document.status == DocumentStatus::Missing {
            buckets.missing_documents.push(document.clone());
        }

        let Some(expiration) = document.expiration_date else {
            continue;
        };
        let days = days_until(expiration, today);
        if days < 0 {
            if document.status != DocumentStatus::Verified {
                buckets.expired_documents.push(document.clone());
            }
        } else if days <= i64::from(thresholds.warning) {
            buckets.expiring_documents.push(document.clone());
        }
    }

    for obligation in recurring.iter().filter(|obligation| obligation.is_active) {
        let Some(due) = obligation.next_due_date else {
            continue;
        };
        let days = days_until(due, today);
        if days < 0 {
            buckets.overdue_recurring.push(obligation.clone());
        } else if days <= i64::from(thresholds.info) {
            buckets.upcoming_recurring.push(obligation.clone());
        }
    }

    buckets
}
