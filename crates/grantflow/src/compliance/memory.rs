use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{
    AnalyticsSnapshot, ComplianceDocument, ComplianceRule, HistoryEntry, Preferences,
    RecurringObligation, StoredAlert, TrackingItem, UserId,
};
use super::repository::{ComplianceStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    tracking: HashMap<Uuid, TrackingItem>,
    documents: HashMap<Uuid, ComplianceDocument>,
    recurring: HashMap<Uuid, RecurringObligation>,
    alerts: HashMap<Uuid, StoredAlert>,
    preferences: HashMap<UserId, Preferences>,
    history: Vec<HistoryEntry>,
    rules: Vec<ComplianceRule>,
    analytics: Vec<AnalyticsSnapshot>,
}

/// Process-local store backing the server and the CLI report.
#[derive(Debug, Default, Clone)]
pub struct InMemoryComplianceStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryComplianceStore {
    pub fn with_rules(rules: Vec<ComplianceRule>) -> Self {
        let store = Self::default();
        if let Ok(mut tables) = store.tables.lock() {
            tables.rules = rules;
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }
}

fn owned_by<T: Clone>(
    rows: &HashMap<Uuid, T>,
    user: UserId,
    owner: impl Fn(&T) -> UserId,
) -> Vec<T> {
    rows.values()
        .filter(|row| owner(row) == user)
        .cloned()
        .collect()
}

fn find_owned<T: Clone>(
    rows: &HashMap<Uuid, T>,
    user: UserId,
    id: Uuid,
    owner: impl Fn(&T) -> UserId,
) -> Option<T> {
    rows.get(&id).filter(|row| owner(row) == user).cloned()
}

fn insert_row<T: Clone>(rows: &mut HashMap<Uuid, T>, id: Uuid, row: T) -> Result<T, StoreError> {
    if rows.contains_key(&id) {
        return Err(StoreError::Conflict);
    }
    rows.insert(id, row.clone());
    Ok(row)
}

fn replace_row<T: Clone>(rows: &mut HashMap<Uuid, T>, id: Uuid, row: T) -> Result<T, StoreError> {
    match rows.get_mut(&id) {
        Some(existing) => {
            *existing = row.clone();
            Ok(row)
        }
        None => Err(StoreError::NotFound),
    }
}

#[async_trait]
impl ComplianceStore for InMemoryComplianceStore {
    async fn tracking_items(&self, user: UserId) -> Result<Vec<TrackingItem>, StoreError> {
        let tables = self.lock()?;
        let mut items = owned_by(&tables.tracking, user, |item| item.user_id);
        items.sort_by(|a, b| {
            a.deadline_date
                .cmp(&b.deadline_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(items)
    }

    async fn tracking_item(
        &self,
        user: UserId,
        id: Uuid,
    ) -> Result<Option<TrackingItem>, StoreError> {
        let tables = self.lock()?;
        Ok(find_owned(&tables.tracking, user, id, |item| item.user_id))
    }

    async fn insert_tracking_item(&self, item: TrackingItem) -> Result<TrackingItem, StoreError> {
        let mut tables = self.lock()?;
        insert_row(&mut tables.tracking, item.id, item)
    }

    async fn update_tracking_item(&self, item: TrackingItem) -> Result<TrackingItem, StoreError> {
        let mut tables = self.lock()?;
        replace_row(&mut tables.tracking, item.id, item)
    }

    async fn documents(&self, user: UserId) -> Result<Vec<ComplianceDocument>, StoreError> {
        let tables = self.lock()?;
        let mut documents = owned_by(&tables.documents, user, |doc| doc.user_id);
        documents.sort_by(|a, b| {
            a.expiration_date
                .cmp(&b.expiration_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(documents)
    }

    async fn document(
        &self,
        user: UserId,
        id: Uuid,
    ) -> Result<Option<ComplianceDocument>, StoreError> {
        let tables = self.lock()?;
        Ok(find_owned(&tables.documents, user, id, |doc| doc.user_id))
    }

    async fn insert_document(
        &self,
        document: ComplianceDocument,
    ) -> Result<ComplianceDocument, StoreError> {
        let mut tables = self.lock()?;
        insert_row(&mut tables.documents, document.id, document)
    }

    async fn update_document(
        &self,
        document: ComplianceDocument,
    ) -> Result<ComplianceDocument, StoreError> {
        let mut tables = self.lock()?;
        replace_row(&mut tables.documents, document.id, document)
    }

    async fn recurring(&self, user: UserId) -> Result<Vec<RecurringObligation>, StoreError> {
        let tables = self.lock()?;
        let mut obligations = owned_by(&tables.recurring, user, |ob| ob.user_id);
        obligations.sort_by(|a, b| {
            a.next_due_date
                .cmp(&b.next_due_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(obligations)
    }

    async fn recurring_obligation(
        &self,
        user: UserId,
        id: Uuid,
    ) -> Result<Option<RecurringObligation>, StoreError> {
        let tables = self.lock()?;
        Ok(find_owned(&tables.recurring, user, id, |ob| ob.user_id))
    }

    async fn insert_recurring(
        &self,
        obligation: RecurringObligation,
    ) -> Result<RecurringObligation, StoreError> {
        let mut tables = self.lock()?;
        insert_row(&mut tables.recurring, obligation.id, obligation)
    }

    async fn update_recurring(
        &self,
        obligation: RecurringObligation,
    ) -> Result<RecurringObligation, StoreError> {
        let mut tables = self.lock()?;
        replace_row(&mut tables.recurring, obligation.id, obligation)
    }

    async fn alerts(&self, user: UserId) -> Result<Vec<StoredAlert>, StoreError> {
        let tables = self.lock()?;
        let mut alerts = owned_by(&tables.alerts, user, |alert| alert.user_id);
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    async fn alert(&self, user: UserId, id: Uuid) -> Result<Option<StoredAlert>, StoreError> {
        let tables = self.lock()?;
        Ok(find_owned(&tables.alerts, user, id, |alert| alert.user_id))
    }

    async fn insert_alert(&self, alert: StoredAlert) -> Result<StoredAlert, StoreError> {
        let mut tables = self.lock()?;
        insert_row(&mut tables.alerts, alert.id, alert)
    }

    async fn update_alert(&self, alert: StoredAlert) -> Result<StoredAlert, StoreError> {
        let mut tables = self.lock()?;
        replace_row(&mut tables.alerts, alert.id, alert)
    }

    async fn preferences(&self, user: UserId) -> Result<Option<Preferences>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.preferences.get(&user).cloned())
    }

    async fn upsert_preferences(
        &self,
        preferences: Preferences,
    ) -> Result<Preferences, StoreError> {
        let mut tables = self.lock()?;
        tables
            .preferences
            .insert(preferences.user_id, preferences.clone());
        Ok(preferences)
    }

    async fn history(&self, user: UserId, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .history
            .iter()
            .rev()
            .filter(|entry| entry.user_id == user)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn append_history(&self, entry: HistoryEntry) -> Result<(), StoreError> {
        self.lock()?.history.push(entry);
        Ok(())
    }

    async fn rules(&self) -> Result<Vec<ComplianceRule>, StoreError> {
        Ok(self.lock()?.rules.clone())
    }

    async fn analytics(
        &self,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<AnalyticsSnapshot>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .analytics
            .iter()
            .rev()
            .filter(|snapshot| snapshot.user_id == user)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn record_analytics(&self, snapshot: AnalyticsSnapshot) -> Result<(), StoreError> {
        self.lock()?.analytics.push(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::domain::{Priority, TrackingStatus};
    use chrono::Utc;

    fn item(user: UserId) -> TrackingItem {
        let now = Utc::now();
        TrackingItem {
            id: Uuid::new_v4(),
            user_id: user,
            title: "Submit annual report".to_string(),
            description: None,
            category: None,
            deadline_date: None,
            status: TrackingStatus::Pending,
            priority: Priority::High,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn lookups_are_scoped_to_owner() {
        let store = InMemoryComplianceStore::default();
        let owner = UserId(Uuid::new_v4());
        let stranger = UserId(Uuid::new_v4());
        let row = store
            .insert_tracking_item(item(owner))
            .await
            .expect("insert succeeds");

        assert!(store
            .tracking_item(stranger, row.id)
            .await
            .expect("lookup succeeds")
            .is_none());
        assert!(store
            .tracking_items(stranger)
            .await
            .expect("list succeeds")
            .is_empty());
        assert_eq!(
            store.tracking_items(owner).await.expect("list succeeds").len(),
            1
        );
    }

    #[tokio::test]
    async fn duplicate_insert_conflicts_and_missing_update_fails() {
        let store = InMemoryComplianceStore::default();
        let row = item(UserId(Uuid::new_v4()));
        store
            .insert_tracking_item(row.clone())
            .await
            .expect("first insert succeeds");

        assert!(matches!(
            store.insert_tracking_item(row).await,
            Err(StoreError::Conflict)
        ));
        assert!(matches!(
            store.update_tracking_item(item(UserId(Uuid::new_v4()))).await,
            Err(StoreError::NotFound)
        ));
    }
}
