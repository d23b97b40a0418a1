use crate::infra::evaluation_instant;
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use grantflow::compliance::actions::PreferencesUpdate;
use grantflow::compliance::{
    AlertLevel, AlertThresholds, ComplianceDocument, ComplianceOverview, ComplianceService,
    ComplianceStore, DocumentStatus, Frequency, InMemoryComplianceStore, Priority,
    RecurringObligation, TrackingCsvImporter, TrackingItem, TrackingStatus, UserId,
};
use grantflow::error::AppError;
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// JSON file with `tracking_items`, `documents`, `recurring`, and optional `thresholds`
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Optional spreadsheet export (Title, Deadline, Status, Priority, Category)
    #[arg(long)]
    pub(crate) tracking_csv: Option<PathBuf>,
    /// Evaluation date for the report (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the full overview as JSON instead of a text summary
    #[arg(long)]
    pub(crate) json: bool,
}

/// Records evaluated by the `report` command and the report endpoint.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SnapshotFile {
    #[serde(default)]
    pub(crate) user_id: Option<UserId>,
    #[serde(default)]
    pub(crate) thresholds: Option<AlertThresholds>,
    #[serde(default)]
    pub(crate) tracking_items: Vec<TrackingRow>,
    #[serde(default)]
    pub(crate) documents: Vec<DocumentRow>,
    #[serde(default)]
    pub(crate) recurring: Vec<RecurringRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackingRow {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    deadline_date: Option<NaiveDate>,
    #[serde(default)]
    status: TrackingStatus,
    #[serde(default)]
    priority: Priority,
}

impl TrackingRow {
    fn into_item(self, user: UserId, now: DateTime<Utc>) -> TrackingItem {
        TrackingItem {
            id: Uuid::new_v4(),
            user_id: user,
            title: self.title,
            description: self.description,
            category: self.category,
            deadline_date: self.deadline_date,
            status: self.status,
            priority: self.priority,
            completed_at: (self.status == TrackingStatus::Completed).then_some(now),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DocumentRow {
    name: String,
    #[serde(default)]
    document_type: Option<String>,
    #[serde(default)]
    expiration_date: Option<NaiveDate>,
    #[serde(default)]
    status: DocumentStatus,
    #[serde(default = "required_by_default")]
    is_required: bool,
    #[serde(default)]
    file_url: Option<String>,
}

impl DocumentRow {
    fn into_document(self, user: UserId, now: DateTime<Utc>) -> ComplianceDocument {
        ComplianceDocument {
            id: Uuid::new_v4(),
            user_id: user,
            name: self.name,
            document_type: self.document_type,
            expiration_date: self.expiration_date,
            status: self.status,
            is_required: self.is_required,
            file_url: self.file_url,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecurringRow {
    title: String,
    frequency: Frequency,
    #[serde(default)]
    next_due_date: Option<NaiveDate>,
    #[serde(default = "required_by_default")]
    is_active: bool,
    #[serde(default)]
    last_completed_date: Option<NaiveDate>,
}

impl RecurringRow {
    fn into_obligation(self, user: UserId, now: DateTime<Utc>) -> RecurringObligation {
        RecurringObligation {
            id: Uuid::new_v4(),
            user_id: user,
            title: self.title,
            frequency: self.frequency,
            next_due_date: self.next_due_date,
            is_active: self.is_active,
            last_completed_date: self.last_completed_date,
            created_at: now,
            updated_at: now,
        }
    }
}

fn required_by_default() -> bool {
    true
}

/// Loads the snapshot (and optional CSV rows) into a scratch store and runs
/// the engine over it.
pub(crate) async fn evaluate_snapshot<R: Read>(
    snapshot: SnapshotFile,
    tracking_csv: Option<R>,
    now: DateTime<Utc>,
) -> Result<ComplianceOverview, AppError> {
    let SnapshotFile {
        user_id,
        thresholds,
        tracking_items,
        documents,
        recurring,
    } = snapshot;
    let user = user_id.unwrap_or(UserId(Uuid::nil()));

    let store = Arc::new(InMemoryComplianceStore::default());
    let service = ComplianceService::new(store.clone(), AlertThresholds::default());

    if let Some(thresholds) = thresholds {
        service
            .update_preferences(
                user,
                PreferencesUpdate {
                    critical: Some(thresholds.critical),
                    warning: Some(thresholds.warning),
                    info: Some(thresholds.info),
                    email_notifications: None,
                },
                now,
            )
            .await?;
    }

    for row in tracking_items {
        store.insert_tracking_item(row.into_item(user, now)).await?;
    }
    if let Some(reader) = tracking_csv {
        for item in TrackingCsvImporter::from_reader(reader, user, now)? {
            store.insert_tracking_item(item).await?;
        }
    }
    for row in documents {
        store.insert_document(row.into_document(user, now)).await?;
    }
    for row in recurring {
        store.insert_recurring(row.into_obligation(user, now)).await?;
    }

    Ok(service.overview(user, now).await)
}

pub(crate) async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        snapshot,
        tracking_csv,
        today,
        json,
    } = args;

    let raw = std::fs::read_to_string(&snapshot)?;
    let snapshot: SnapshotFile = serde_json::from_str(&raw)?;
    let csv = tracking_csv.map(std::fs::File::open).transpose()?;

    let overview = evaluate_snapshot(snapshot, csv, evaluation_instant(today)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
    } else {
        println!("{}", render_text(&overview));
    }
    Ok(())
}

fn level_label(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::Critical => "critical",
        AlertLevel::Warning => "warning",
        AlertLevel::Info => "info",
    }
}

pub(crate) fn render_text(overview: &ComplianceOverview) -> String {
    let mut lines = vec![
        format!("Compliance report for {}", overview.evaluated_on),
        format!(
            "Overall status: {} | score {}% ({}/{} compliant)",
            overview.overall_status.label(),
            overview.compliance_score,
            overview.compliant_items,
            overview.total_items
        ),
        format!(
            "Thresholds: critical {}d | warning {}d | info {}d",
            overview.thresholds.critical, overview.thresholds.warning, overview.thresholds.info
        ),
        String::new(),
        "Status buckets".to_string(),
    ];

    let buckets = [
        ("overdue items", overview.overdue_items.len()),
        ("critical items", overview.critical_items.len()),
        ("warning items", overview.warning_items.len()),
        ("expired documents", overview.expired_documents.len()),
        ("expiring documents", overview.expiring_documents.len()),
        ("missing documents", overview.missing_documents.len()),
        ("overdue recurring", overview.overdue_recurring.len()),
        ("upcoming recurring", overview.upcoming_recurring.len()),
    ];
    for (label, count) in buckets {
        lines.push(format!("- {label}: {count}"));
    }

    lines.push(String::new());
    lines.push("Alerts".to_string());
    if overview.alerts.computed.is_empty() {
        lines.push("- none".to_string());
    }
    for alert in &overview.alerts.computed {
        lines.push(format!("- [{}] {}", level_label(alert.level), alert.message));
    }

    if !overview.overdue_items.is_empty() {
        lines.push(String::new());
        lines.push("Overdue items".to_string());
        for item in &overview.overdue_items {
            let due = item
                .deadline_date
                .map(|date| date.to_string())
                .unwrap_or_default();
            lines.push(format!("- {} (due {due}, {})", item.title, item.status.label()));
        }
    }

    lines.join("\n")
}
