use super::classifier::StatusBuckets;
use super::domain::{ComplianceDocument, OverallStatus, RecurringObligation, TrackingItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplianceScore {
    pub score: u8,
    pub total_items: usize,
    pub compliant_items: usize,
}

/// Percentage of tracked records currently in a compliant state.
///
/// Recurring obligations count as compliant once any cycle has been
/// completed, however long ago.
pub fn compliance_score(
    tracking: &[TrackingItem],
    documents: &[ComplianceDocument],
    recurring: &[RecurringObligation],
) -> ComplianceScore {
    let total_items = tracking.len() + documents.len() + recurring.len();
    let compliant_items = tracking.iter().filter(|item| item.is_completed()).count()
        + documents.iter().filter(|doc| doc.is_on_file()).count()
        + recurring
            .iter()
            .filter(|obligation| obligation.last_completed_date.is_some())
            .count();

    let score = if total_items == 0 {
        100
    } else {
        // round half up without floats: (200c + t) / 2t
        let numerator = 200 * compliant_items + total_items;
        (numerator / (2 * total_items)).min(100) as u8
    };

    ComplianceScore {
        score,
        total_items,
        compliant_items,
    }
}

pub fn overall_status(buckets: &StatusBuckets) -> OverallStatus {
    if buckets.has_critical() {
        OverallStatus::Critical
    } else if buckets.has_warning() {
        OverallStatus::Warning
    } else {
        OverallStatus::Good
    }
}
