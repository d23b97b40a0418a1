use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::compliance::domain::{
    AlertThresholds, AnalyticsSnapshot, ComplianceDocument, ComplianceRule, DocumentStatus,
    Frequency, HistoryEntry, Preferences, Priority, RecurringObligation, StoredAlert,
    TrackingItem, TrackingStatus, UserId,
};
use crate::compliance::memory::InMemoryComplianceStore;
use crate::compliance::repository::{ComplianceStore, StoreError};
use crate::compliance::service::ComplianceService;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn today() -> NaiveDate {
    now().date_naive()
}

pub(super) fn days_from_today(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

pub(super) fn user() -> UserId {
    UserId(Uuid::parse_str("7d0c4c1e-5b7a-4d5e-9a43-2f4f8f4b7a11").expect("valid uuid"))
}

pub(super) fn tracking_item(
    title: &str,
    deadline: Option<NaiveDate>,
    status: TrackingStatus,
) -> TrackingItem {
    TrackingItem {
        id: Uuid::new_v4(),
        user_id: user(),
        title: title.to_string(),
        description: None,
        category: Some("Federal".to_string()),
        deadline_date: deadline,
        status,
        priority: Priority::High,
        completed_at: None,
        created_at: now(),
        updated_at: now(),
    }
}

pub(super) fn document(
    name: &str,
    expiration: Option<NaiveDate>,
    status: DocumentStatus,
) -> ComplianceDocument {
    ComplianceDocument {
        id: Uuid::new_v4(),
        user_id: user(),
        name: name.to_string(),
        document_type: Some("certificate".to_string()),
        expiration_date: expiration,
        status,
        is_required: true,
        file_url: None,
        created_at: now(),
        updated_at: now(),
    }
}

pub(super) fn recurring(
    title: &str,
    next_due: Option<NaiveDate>,
    last_completed: Option<NaiveDate>,
) -> RecurringObligation {
    RecurringObligation {
        id: Uuid::new_v4(),
        user_id: user(),
        title: title.to_string(),
        frequency: Frequency::Quarterly,
        next_due_date: next_due,
        is_active: true,
        last_completed_date: last_completed,
        created_at: now(),
        updated_at: now(),
    }
}

pub(super) fn thresholds() -> AlertThresholds {
    AlertThresholds::default()
}

pub(super) fn build_service() -> (
    ComplianceService<InMemoryComplianceStore>,
    Arc<InMemoryComplianceStore>,
) {
    let store = Arc::new(InMemoryComplianceStore::default());
    let service = ComplianceService::new(store.clone(), thresholds());
    (service, store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Wraps the in-memory store and fails selected operations on demand.
#[derive(Default)]
pub(super) struct FlakyStore {
    pub(super) inner: InMemoryComplianceStore,
    pub(super) fail_tracking_reads: AtomicBool,
    pub(super) fail_alert_reads: AtomicBool,
    pub(super) fail_preference_reads: AtomicBool,
    pub(super) fail_alert_writes: AtomicBool,
    pub(super) fail_history_writes: AtomicBool,
    pub(super) fail_analytics_writes: AtomicBool,
    pub(super) fail_record_writes: AtomicBool,
}

impl FlakyStore {
    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("database offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ComplianceStore for FlakyStore {
    async fn tracking_items(&self, user: UserId) -> Result<Vec<TrackingItem>, StoreError> {
        Self::check(&self.fail_tracking_reads)?;
        self.inner.tracking_items(user).await
    }

    async fn tracking_item(
        &self,
        user: UserId,
        id: Uuid,
    ) -> Result<Option<TrackingItem>, StoreError> {
        Self::check(&self.fail_tracking_reads)?;
        self.inner.tracking_item(user, id).await
    }

    async fn insert_tracking_item(&self, item: TrackingItem) -> Result<TrackingItem, StoreError> {
        Self::check(&self.fail_record_writes)?;
        self.inner.insert_tracking_item(item).await
    }

    async fn update_tracking_item(&self, item: TrackingItem) -> Result<TrackingItem, StoreError> {
        Self::check(&self.fail_record_writes)?;
        self.inner.update_tracking_item(item).await
    }

    async fn documents(&self, user: UserId) -> Result<Vec<ComplianceDocument>, StoreError> {
        self.inner.documents(user).await
    }

    async fn document(
        &self,
        user: UserId,
        id: Uuid,
    ) -> Result<Option<ComplianceDocument>, StoreError> {
        self.inner.document(user, id).await
    }

    async fn insert_document(
        &self,
        document: ComplianceDocument,
    ) -> Result<ComplianceDocument, StoreError> {
        Self::check(&self.fail_record_writes)?;
        self.inner.insert_document(document).await
    }

    async fn update_document(
        &self,
        document: ComplianceDocument,
    ) -> Result<ComplianceDocument, StoreError> {
        Self::check(&self.fail_record_writes)?;
        self.inner.update_document(document).await
    }

    async fn recurring(&self, user: UserId) -> Result<Vec<RecurringObligation>, StoreError> {
        self.inner.recurring(user).await
    }

    async fn recurring_obligation(
        &self,
        user: UserId,
        id: Uuid,
    ) -> Result<Option<RecurringObligation>, StoreError> {
        self.inner.recurring_obligation(user, id).await
    }

    async fn insert_recurring(
        &self,
        obligation: RecurringObligation,
    ) -> Result<RecurringObligation, StoreError> {
        Self::check(&self.fail_record_writes)?;
        self.inner.insert_recurring(obligation).await
    }

    async fn update_recurring(
        &self,
        obligation: RecurringObligation,
    ) -> Result<RecurringObligation, StoreError> {
        Self::check(&self.fail_record_writes)?;
        self.inner.update_recurring(obligation).await
    }

    async fn alerts(&self, user: UserId) -> Result<Vec<StoredAlert>, StoreError> {
        Self::check(&self.fail_alert_reads)?;
        self.inner.alerts(user).await
    }

    async fn alert(&self, user: UserId, id: Uuid) -> Result<Option<StoredAlert>, StoreError> {
        Self::check(&self.fail_alert_reads)?;
        self.inner.alert(user, id).await
    }

    async fn insert_alert(&self, alert: StoredAlert) -> Result<StoredAlert, StoreError> {
        Self::check(&self.fail_alert_writes)?;
        self.inner.insert_alert(alert).await
    }

    async fn update_alert(&self, alert: StoredAlert) -> Result<StoredAlert, StoreError> {
        Self::check(&self.fail_alert_writes)?;
        self.inner.update_alert(alert).await
    }

    async fn preferences(&self, user: UserId) -> Result<Option<Preferences>, StoreError> {
        Self::check(&self.fail_preference_reads)?;
        self.inner.preferences(user).await
    }

    async fn upsert_preferences(
        &self,
        preferences: Preferences,
    ) -> Result<Preferences, StoreError> {
        Self::check(&self.fail_record_writes)?;
        self.inner.upsert_preferences(preferences).await
    }

    async fn history(&self, user: UserId, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        self.inner.history(user, limit).await
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        Self::check(&self.fail_history_writes)?;
        self.inner.append_history(entry).await
    }

    async fn rules(&self) -> Result<Vec<ComplianceRule>, StoreError> {
        self.inner.rules().await
    }

    async fn analytics(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<AnalyticsSnapshot>, StoreError> {
        self.inner.analytics(user, limit).await
    }

    async fn record_analytics(&self, snapshot: AnalyticsSnapshot) -> Result<(), StoreError> {
        Self::check(&self.fail_analytics_writes)?;
        self.inner.record_analytics(snapshot).await
    }
}

pub(super) fn build_flaky_service() -> (ComplianceService<FlakyStore>, Arc<FlakyStore>) {
    let store = Arc::new(FlakyStore::default());
    let service = ComplianceService::new(store.clone(), thresholds());
    (service, store)
}

pub(super) fn fail(flag: &AtomicBool) {
    flag.store(true, Ordering::SeqCst);
}

pub(super) fn restore(flag: &AtomicBool) {
    flag.store(false, Ordering::SeqCst);
}
