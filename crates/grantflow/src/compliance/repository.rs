use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{
    AnalyticsSnapshot, ComplianceDocument, ComplianceRule, HistoryEntry, Preferences,
    RecurringObligation, StoredAlert, TrackingItem, UserId,
};

/// Storage abstraction over the compliance tables so the service can run
/// against a hosted database or the in-memory store.
///
/// Lookups by id are scoped to `user`; rows owned by another user behave as
/// missing.
#[async_trait]
pub trait ComplianceStore: Send + Sync {
    async fn tracking_items(&self, user: UserId) -> Result<Vec<TrackingItem>, StoreError>;
    async fn tracking_item(&self, user: UserId, id: Uuid)
        -> Result<Option<TrackingItem>, StoreError>;
    async fn insert_tracking_item(&self, item: TrackingItem) -> Result<TrackingItem, StoreError>;
    async fn update_tracking_item(&self, item: TrackingItem) -> Result<TrackingItem, StoreError>;

    async fn documents(&self, user: UserId) -> Result<Vec<ComplianceDocument>, StoreError>;
    async fn document(
        &self,
        user: UserId,
        id: Uuid,
    ) -> Result<Option<ComplianceDocument>, StoreError>;
    async fn insert_document(
        &self,
        document: ComplianceDocument,
    ) -> Result<ComplianceDocument, StoreError>;
    async fn update_document(
        &self,
        document: ComplianceDocument,
    ) -> Result<ComplianceDocument, StoreError>;

    async fn recurring(&self, user: UserId) -> Result<Vec<RecurringObligation>, StoreError>;
    async fn recurring_obligation(
        &self,
        user: UserId,
        id: Uuid,
    ) -> Result<Option<RecurringObligation>, StoreError>;
    async fn insert_recurring(
        &self,
        obligation: RecurringObligation,
    ) -> Result<RecurringObligation, StoreError>;
    async fn update_recurring(
        &self,
        obligation: RecurringObligation,
    ) -> Result<RecurringObligation, StoreError>;

    /// Every stored alert for the user, active and resolved.
    async fn alerts(&self, user: UserId) -> Result<Vec<StoredAlert>, StoreError>;
    async fn alert(&self, user: UserId, id: Uuid) -> Result<Option<StoredAlert>, StoreError>;
    async fn insert_alert(&self, alert: StoredAlert) -> Result<StoredAlert, StoreError>;
    async fn update_alert(&self, alert: StoredAlert) -> Result<StoredAlert, StoreError>;

    async fn preferences(&self, user: UserId) -> Result<Option<Preferences>, StoreError>;
    async fn upsert_preferences(&self, preferences: Preferences)
        -> Result<Preferences, StoreError>;

    /// Newest first.
    async fn history(&self, user: UserId, limit: usize) -> Result<Vec<HistoryEntry>, StoreError>;
    async fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError>;

    async fn rules(&self) -> Result<Vec<ComplianceRule>, StoreError>;

    /// Newest first.
    async fn analytics(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<AnalyticsSnapshot>, StoreError>;
    async fn record_analytics(&self, snapshot: AnalyticsSnapshot) -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
