//! Compliance tracking: deadline classification, scoring, and alert
//! synchronization over tracking items, documents, and recurring obligations.
//!
//! The pure pieces (`classifier`, `score`, `alerts`) take already-fetched rows
//! and a reference date. `service` wires them to a [`ComplianceStore`] and
//! `router` exposes the service as `GET`/`POST /api/compliance`.

pub mod actions;
pub mod alerts;
pub mod classifier;
pub mod domain;
pub mod fetch;
pub mod import;
pub mod memory;
pub mod overview;
pub mod repository;
pub mod router;
pub mod score;
pub mod service;

#[cfg(test)]
mod tests;

pub use actions::ComplianceAction;
pub use alerts::{compute_conditions, plan_sync, AlertCondition, SyncPlan, SyncReport};
pub use classifier::{classify, days_until, StatusBuckets};
pub use domain::{
    AlertKey, AlertLevel, AlertThresholds, AlertType, AnalyticsSnapshot, ComplianceDocument,
    ComplianceRule, DocumentStatus, Frequency, HistoryEntry, OverallStatus, Preferences, Priority,
    RecurringObligation, StoredAlert, TrackingItem, TrackingStatus, UserId,
};
pub use fetch::{fetch_snapshot, ComplianceSnapshot};
pub use import::{ImportError, TrackingCsvImporter};
pub use memory::InMemoryComplianceStore;
pub use overview::{AlertViews, ComplianceOverview};
pub use repository::{ComplianceStore, StoreError};
pub use router::compliance_router;
pub use score::{compliance_score, overall_status, ComplianceScore};
pub use service::{CheckOutcome, ComplianceService, ComplianceServiceError};
