use tracing::warn;

use super::domain::{
    AlertThresholds, AnalyticsSnapshot, ComplianceDocument, ComplianceRule, HistoryEntry,
    RecurringObligation, StoredAlert, TrackingItem, UserId,
};
use super::repository::{ComplianceStore, StoreError};

pub(crate) const HISTORY_LIMIT: usize = 20;
pub(crate) const ANALYTICS_LIMIT: usize = 10;

/// Rows read for one user in a single request.
#[derive(Debug, Clone, Default)]
pub struct ComplianceSnapshot {
    pub tracking: Vec<TrackingItem>,
    pub documents: Vec<ComplianceDocument>,
    pub recurring: Vec<RecurringObligation>,
    pub alerts: Vec<StoredAlert>,
    pub thresholds: AlertThresholds,
    pub history: Vec<HistoryEntry>,
    pub rules: Vec<ComplianceRule>,
    pub analytics: Vec<AnalyticsSnapshot>,
    /// False when the alert read failed; syncing against an empty list would
    /// duplicate every active alert.
    pub alerts_loaded: bool,
    /// False when tracking, document, recurring or preference rows failed to
    /// load; conditions computed from the fallbacks must not be written back.
    pub records_loaded: bool,
}

fn or_empty<T>(user: UserId, table: &'static str, result: Result<Vec<T>, StoreError>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(%user, table, error = %err, "compliance read failed, using empty result");
        Vec::new()
    })
}

/// Issue every read concurrently; a failed read degrades to an empty list.
pub async fn fetch_snapshot<S>(
    store: &S,
    user: UserId,
    default_thresholds: AlertThresholds,
) -> ComplianceSnapshot
where
    S: ComplianceStore + ?Sized,
{
    let (tracking, documents, recurring, alerts, preferences, history, rules, analytics) = tokio::join!(
        store.tracking_items(user),
        store.documents(user),
        store.recurring(user),
        store.alerts(user),
        store.preferences(user),
        store.history(user, HISTORY_LIMIT),
        store.rules(),
        store.analytics(user, ANALYTICS_LIMIT),
    );

    let alerts_loaded = alerts.is_ok();
    let records_loaded =
        tracking.is_ok() && documents.is_ok() && recurring.is_ok() && preferences.is_ok();
    let thresholds = match preferences {
        Ok(Some(preferences)) => preferences.thresholds,
        Ok(None) => default_thresholds,
        Err(err) => {
            warn!(%user, table = "compliance_preferences", error = %err, "compliance read failed, using default thresholds");
            default_thresholds
        }
    };

    ComplianceSnapshot {
        tracking: or_empty(user, "compliance_tracking", tracking),
        documents: or_empty(user, "compliance_documents", documents),
        recurring: or_empty(user, "compliance_recurring", recurring),
        alerts: or_empty(user, "compliance_alerts", alerts),
        thresholds,
        history: or_empty(user, "compliance_history", history),
        rules: or_empty(user, "compliance_rules", rules),
        analytics: or_empty(user, "compliance_analytics", analytics),
        alerts_loaded,
        records_loaded,
    }
}
