use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::actions::{
    AlertRef, ComplianceAction, DocumentUpdate, NewAlert, NewDocument, NewRecurring,
    NewTrackingItem, PreferencesUpdate, RecurringUpdate, TrackingItemUpdate,
};
use super::alerts::{plan_sync, AlertCondition, SyncReport};
use super::domain::{
    AlertThresholds, AnalyticsSnapshot, ComplianceDocument, HistoryEntry, Preferences,
    RecurringObligation, StoredAlert, TrackingItem, TrackingStatus, UserId,
};
use super::fetch::fetch_snapshot;
use super::overview::{AlertViews, ComplianceOverview};
use super::repository::{ComplianceStore, StoreError};

/// Result of `run_compliance_check`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub overview: ComplianceOverview,
    pub sync: SyncReport,
}

/// Service composing the store, classifier, and alert synchronizer.
pub struct ComplianceService<S> {
    store: Arc<S>,
    default_thresholds: AlertThresholds,
}

impl<S> ComplianceService<S>
where
    S: ComplianceStore + 'static,
{
    pub fn new(store: Arc<S>, default_thresholds: AlertThresholds) -> Self {
        Self {
            store,
            default_thresholds,
        }
    }

    pub fn default_thresholds(&self) -> AlertThresholds {
        self.default_thresholds
    }

    /// Read-only dashboard view; failed reads degrade to empty sections.
    pub async fn overview(&self, user: UserId, now: DateTime<Utc>) -> ComplianceOverview {
        let snapshot = fetch_snapshot(self.store.as_ref(), user, self.default_thresholds).await;
        ComplianceOverview::build(snapshot, now)
    }

    /// Recompute the overview, reconcile stored alerts, and record analytics.
    ///
    /// Alert and analytics writes are best-effort: failures are logged and
    /// reported in [`SyncReport`] but never fail the check. Neither write
    /// happens when the records they are derived from failed to load.
    pub async fn run_check(&self, user: UserId, now: DateTime<Utc>) -> CheckOutcome {
        let snapshot = fetch_snapshot(self.store.as_ref(), user, self.default_thresholds).await;
        let alerts_loaded = snapshot.alerts_loaded;
        let records_loaded = snapshot.records_loaded;
        let stored = snapshot.alerts.clone();
        let mut overview = ComplianceOverview::build(snapshot, now);

        let sync = if !records_loaded {
            warn!(%user, "skipping alert synchronization, compliance records unavailable");
            SyncReport::skipped()
        } else if !alerts_loaded {
            warn!(%user, "skipping alert synchronization, stored alerts unavailable");
            SyncReport::skipped()
        } else {
            self.sync_alerts(user, &overview.alerts.computed, &stored, now)
                .await
        };

        if sync.inserted + sync.resolved > 0 {
            match self.store.alerts(user).await {
                Ok(fresh) => {
                    let computed = std::mem::take(&mut overview.alerts.computed);
                    overview.alerts = AlertViews::from_stored(computed, &fresh);
                }
                Err(err) => warn!(%user, error = %err, "could not refresh alerts after sync"),
            }
        }

        if records_loaded {
            let snapshot = AnalyticsSnapshot {
                id: Uuid::new_v4(),
                user_id: user,
                compliance_score: overview.compliance_score,
                overall_status: overview.overall_status,
                total_items: overview.total_items,
                compliant_items: overview.compliant_items,
                overdue_count: overview.overdue_count(),
                recorded_at: now,
            };
            if let Err(err) = self.store.record_analytics(snapshot).await {
                warn!(%user, error = %err, "failed to record compliance analytics");
            }
        } else {
            debug!(%user, "not recording analytics for a partial snapshot");
        }

        info!(
            %user,
            score = overview.compliance_score,
            status = overview.overall_status.label(),
            inserted = sync.inserted,
            resolved = sync.resolved,
            failed = sync.failed,
            "compliance check completed"
        );

        CheckOutcome { overview, sync }
    }

    async fn sync_alerts(
        &self,
        user: UserId,
        conditions: &[AlertCondition],
        stored: &[StoredAlert],
        now: DateTime<Utc>,
    ) -> SyncReport {
        let plan = plan_sync(conditions, stored);
        let mut report = SyncReport::default();
        if plan.is_empty() {
            debug!(%user, "stored alerts already match computed conditions");
            return report;
        }

        for condition in plan.to_insert {
            match self.store.insert_alert(condition.into_stored(user, now)).await {
                Ok(_) => report.inserted += 1,
                Err(err) => {
                    warn!(%user, error = %err, "failed to insert compliance alert");
                    report.failed += 1;
                }
            }
        }

        for id in plan.to_resolve {
            let Some(mut alert) = stored.iter().find(|alert| alert.id == id).cloned() else {
                continue;
            };
            alert.resolve(now);
            match self.store.update_alert(alert).await {
                Ok(_) => report.resolved += 1,
                Err(err) => {
                    warn!(%user, alert_id = %id, error = %err, "failed to resolve compliance alert");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Apply one `POST /api/compliance` action and return its JSON payload.
    pub async fn execute(
        &self,
        user: UserId,
        action: ComplianceAction,
        now: DateTime<Utc>,
    ) -> Result<Value, ComplianceServiceError> {
        let name = action.name();
        debug!(%user, action = name, "executing compliance action");

        let (entity_type, entity_id, payload) = match action {
            ComplianceAction::CreateTrackingItem(input) => {
                let item = self.create_tracking_item(user, input, now).await?;
                ("tracking_item", Some(item.id), serde_json::to_value(item)?)
            }
            ComplianceAction::UpdateTrackingItem(input) => {
                let item = self.update_tracking_item(user, input, now).await?;
                ("tracking_item", Some(item.id), serde_json::to_value(item)?)
            }
            ComplianceAction::CreateDocument(input) => {
                let document = self.create_document(user, input, now).await?;
                ("document", Some(document.id), serde_json::to_value(document)?)
            }
            ComplianceAction::UpdateDocument(input) => {
                let document = self.update_document(user, input, now).await?;
                ("document", Some(document.id), serde_json::to_value(document)?)
            }
            ComplianceAction::CreateRecurring(input) => {
                let obligation = self.create_recurring(user, input, now).await?;
                ("recurring", Some(obligation.id), serde_json::to_value(obligation)?)
            }
            ComplianceAction::UpdateRecurring(input) => {
                let obligation = self.update_recurring(user, input, now).await?;
                ("recurring", Some(obligation.id), serde_json::to_value(obligation)?)
            }
            ComplianceAction::CreateAlert(input) => {
                let alert = self.create_alert(user, input, now).await?;
                ("alert", Some(alert.id), serde_json::to_value(alert)?)
            }
            ComplianceAction::MarkAlertRead(input) => {
                let alert = self.mark_alert_read(user, input).await?;
                ("alert", Some(alert.id), serde_json::to_value(alert)?)
            }
            ComplianceAction::ResolveAlert(input) => {
                let alert = self.resolve_alert(user, input, now).await?;
                ("alert", Some(alert.id), serde_json::to_value(alert)?)
            }
            ComplianceAction::UpdatePreferences(input) => {
                let preferences = self.update_preferences(user, input, now).await?;
                ("preferences", None, serde_json::to_value(preferences)?)
            }
            ComplianceAction::RunComplianceCheck => {
                let outcome = self.run_check(user, now).await;
                return Ok(serde_json::to_value(outcome)?);
            }
        };

        self.record_history(user, name, entity_type, entity_id, &payload, now)
            .await;
        Ok(payload)
    }

    async fn record_history(
        &self,
        user: UserId,
        action: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        payload: &Value,
        now: DateTime<Utc>,
    ) {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            user_id: user,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            details: json!({ "record": payload }),
            created_at: now,
        };
        if let Err(err) = self.store.append_history(entry).await {
            warn!(%user, action, error = %err, "failed to append compliance history");
        }
    }

    pub async fn create_tracking_item(
        &self,
        user: UserId,
        input: NewTrackingItem,
        now: DateTime<Utc>,
    ) -> Result<TrackingItem, ComplianceServiceError> {
        let title = required_text("title", &input.title)?;
        let item = TrackingItem {
            id: Uuid::new_v4(),
            user_id: user,
            title,
            description: input.description,
            category: input.category,
            deadline_date: input.deadline_date,
            status: TrackingStatus::Pending,
            priority: input.priority.unwrap_or_default(),
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        Ok(self.store.insert_tracking_item(item).await?)
    }

    pub async fn update_tracking_item(
        &self,
        user: UserId,
        input: TrackingItemUpdate,
        now: DateTime<Utc>,
    ) -> Result<TrackingItem, ComplianceServiceError> {
        let mut item = self
            .store
            .tracking_item(user, input.id)
            .await?
            .ok_or(ComplianceServiceError::NotFound {
                entity: "tracking item",
                id: input.id,
            })?;

        if let Some(title) = input.title {
            item.title = required_text("title", &title)?;
        }
        if let Some(description) = input.description {
            item.description = description;
        }
        if let Some(deadline) = input.deadline_date {
            item.deadline_date = deadline;
        }
        if let Some(priority) = input.priority {
            item.priority = priority;
        }
        if let Some(status) = input.status {
            match (item.status, status) {
                (TrackingStatus::Completed, TrackingStatus::Completed) => {}
                (_, TrackingStatus::Completed) => item.completed_at = Some(now),
                _ => item.completed_at = None,
            }
            item.status = status;
        }
        item.updated_at = now;

        Ok(self.store.update_tracking_item(item).await?)
    }

    pub async fn create_document(
        &self,
        user: UserId,
        input: NewDocument,
        now: DateTime<Utc>,
    ) -> Result<ComplianceDocument, ComplianceServiceError> {
        let name = required_text("name", &input.name)?;
        let document = ComplianceDocument {
            id: Uuid::new_v4(),
            user_id: user,
            name,
            document_type: input.document_type,
            expiration_date: input.expiration_date,
            status: input.status.unwrap_or_default(),
            is_required: input.is_required,
            file_url: None,
            created_at: now,
            updated_at: now,
        };
        Ok(self.store.insert_document(document).await?)
    }

    pub async fn update_document(
        &self,
        user: UserId,
        input: DocumentUpdate,
        now: DateTime<Utc>,
    ) -> Result<ComplianceDocument, ComplianceServiceError> {
        let mut document = self.store.document(user, input.id).await?.ok_or(
            ComplianceServiceError::NotFound {
                entity: "document",
                id: input.id,
            },
        )?;

        if let Some(name) = input.name {
            document.name = required_text("name", &name)?;
        }
        if let Some(expiration) = input.expiration_date {
            document.expiration_date = expiration;
        }
        if let Some(status) = input.status {
            document.status = status;
        }
        if let Some(file_url) = input.file_url {
            document.file_url = file_url;
        }
        document.updated_at = now;

        Ok(self.store.update_document(document).await?)
    }

    pub async fn create_recurring(
        &self,
        user: UserId,
        input: NewRecurring,
        now: DateTime<Utc>,
    ) -> Result<RecurringObligation, ComplianceServiceError> {
        let title = required_text("title", &input.title)?;
        let obligation = RecurringObligation {
            id: Uuid::new_v4(),
            user_id: user,
            title,
            frequency: input.frequency,
            next_due_date: input.next_due_date,
            is_active: input.is_active,
            last_completed_date: None,
            created_at: now,
            updated_at: now,
        };
        Ok(self.store.insert_recurring(obligation).await?)
    }

    pub async fn update_recurring(
        &self,
        user: UserId,
        input: RecurringUpdate,
        now: DateTime<Utc>,
    ) -> Result<RecurringObligation, ComplianceServiceError> {
        let mut obligation = self
            .store
            .recurring_obligation(user, input.id)
            .await?
            .ok_or(ComplianceServiceError::NotFound {
                entity: "recurring obligation",
                id: input.id,
            })?;

        if let Some(title) = input.title {
            obligation.title = required_text("title", &title)?;
        }
        if let Some(frequency) = input.frequency {
            obligation.frequency = frequency;
        }
        if let Some(next_due) = input.next_due_date {
            obligation.next_due_date = next_due;
        }
        if let Some(active) = input.is_active {
            obligation.is_active = active;
        }
        if input.complete_cycle {
            obligation.complete_cycle(now.date_naive());
        }
        obligation.updated_at = now;

        Ok(self.store.update_recurring(obligation).await?)
    }

    pub async fn create_alert(
        &self,
        user: UserId,
        input: NewAlert,
        now: DateTime<Utc>,
    ) -> Result<StoredAlert, ComplianceServiceError> {
        let message = required_text("message", &input.message)?;
        let alert = StoredAlert {
            id: Uuid::new_v4(),
            user_id: user,
            alert_type: input.alert_type,
            message,
            level: input.level,
            related_items: input.related_items,
            is_active: true,
            is_read: false,
            created_at: now,
            resolved_at: None,
        };
        Ok(self.store.insert_alert(alert).await?)
    }

    async fn find_alert(
        &self,
        user: UserId,
        id: Uuid,
    ) -> Result<StoredAlert, ComplianceServiceError> {
        self.store
            .alert(user, id)
            .await?
            .ok_or(ComplianceServiceError::NotFound { entity: "alert", id })
    }

    pub async fn mark_alert_read(
        &self,
        user: UserId,
        input: AlertRef,
    ) -> Result<StoredAlert, ComplianceServiceError> {
        let mut alert = self.find_alert(user, input.id).await?;
        if alert.is_read {
            return Ok(alert);
        }
        alert.is_read = true;
        Ok(self.store.update_alert(alert).await?)
    }

    pub async fn resolve_alert(
        &self,
        user: UserId,
        input: AlertRef,
        now: DateTime<Utc>,
    ) -> Result<StoredAlert, ComplianceServiceError> {
        let mut alert = self.find_alert(user, input.id).await?;
        if !alert.is_active {
            return Ok(alert);
        }
        alert.resolve(now);
        Ok(self.store.update_alert(alert).await?)
    }

    pub async fn update_preferences(
        &self,
        user: UserId,
        input: PreferencesUpdate,
        now: DateTime<Utc>,
    ) -> Result<Preferences, ComplianceServiceError> {
        let current = self.store.preferences(user).await?;
        let (mut thresholds, mut email_notifications) = match current {
            Some(existing) => (existing.thresholds, existing.email_notifications),
            None => (self.default_thresholds, true),
        };

        if let Some(critical) = input.critical {
            thresholds.critical = critical;
        }
        if let Some(warning) = input.warning {
            thresholds.warning = warning;
        }
        if let Some(info) = input.info {
            thresholds.info = info;
        }
        if !thresholds.is_ordered() {
            return Err(ComplianceServiceError::InvalidRequest(
                "thresholds must satisfy critical <= warning <= info".to_string(),
            ));
        }
        if let Some(enabled) = input.email_notifications {
            email_notifications = enabled;
        }

        let preferences = Preferences {
            user_id: user,
            thresholds,
            email_notifications,
            updated_at: now,
        };
        Ok(self.store.upsert_preferences(preferences).await?)
    }
}

fn required_text(field: &str, value: &str) -> Result<String, ComplianceServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ComplianceServiceError::InvalidRequest(format!(
            "{field} is required"
        )));
    }
    Ok(trimmed.to_string())
}

/// Error raised by the compliance service.
#[derive(Debug, thiserror::Error)]
pub enum ComplianceServiceError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Invalid action")]
    UnknownAction(String),
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}
