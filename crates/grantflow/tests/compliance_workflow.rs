use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use grantflow::compliance::{
    AlertThresholds, AlertType, CheckOutcome, ComplianceAction, ComplianceService,
    ComplianceStore, InMemoryComplianceStore, OverallStatus, UserId,
};
use serde_json::{json, Value};
use uuid::Uuid;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 14, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn grantee() -> UserId {
    UserId(Uuid::from_u128(0x0a11_ce00_0000_4000_8000_0000_0000_0042))
}

async fn act(
    service: &ComplianceService<InMemoryComplianceStore>,
    action: &str,
    data: Option<Value>,
    now: DateTime<Utc>,
) -> Value {
    let action = ComplianceAction::parse(action, data).expect("action parses");
    service
        .execute(grantee(), action, now)
        .await
        .expect("action succeeds")
}

async fn check(
    service: &ComplianceService<InMemoryComplianceStore>,
    now: DateTime<Utc>,
) -> CheckOutcome {
    service.run_check(grantee(), now).await
}

#[tokio::test]
async fn grant_lifecycle_raises_and_clears_alerts() {
    let store = Arc::new(InMemoryComplianceStore::default());
    let service = ComplianceService::new(store.clone(), AlertThresholds::default());
    let now = start();

    let report = act(
        &service,
        "create_tracking_item",
        Some(json!({
            "title": "Submit SF-425",
            "deadline_date": "2026-10-20",
            "priority": "high",
        })),
        now,
    )
    .await;
    let report_id = report["id"].clone();

    let insurance = act(
        &service,
        "create_document",
        Some(json!({
            "name": "Certificate of insurance",
            "expiration_date": "2026-10-26",
            "status": "verified",
        })),
        now,
    )
    .await;

    act(
        &service,
        "create_recurring",
        Some(json!({
            "title": "Monthly drawdown request",
            "frequency": "monthly",
            "next_due_date": "2026-11-05",
        })),
        now,
    )
    .await;

    let first = check(&service, now).await;
    assert_eq!(first.overview.overall_status, OverallStatus::Warning);
    assert_eq!(first.sync.inserted, 3);
    let active_types: Vec<AlertType> = first
        .overview
        .alerts
        .active
        .iter()
        .map(|alert| alert.alert_type.clone())
        .collect();
    assert!(active_types.contains(&AlertType::CriticalDeadlines));
    assert!(active_types.contains(&AlertType::ExpiringDocuments));
    assert!(active_types.contains(&AlertType::UpcomingRecurring));

    // Five days later the report is overdue.
    let later = now + Duration::days(5);
    let overdue = check(&service, later).await;
    assert_eq!(overdue.overview.overall_status, OverallStatus::Critical);
    assert_eq!(overdue.sync.inserted, 1);
    assert_eq!(overdue.sync.resolved, 1);

    act(
        &service,
        "update_tracking_item",
        Some(json!({ "id": report_id, "status": "completed" })),
        later,
    )
    .await;
    act(
        &service,
        "update_document",
        Some(json!({ "id": insurance["id"], "expiration_date": "2027-10-26" })),
        later,
    )
    .await;

    let cleared = check(&service, later).await;
    // The drawdown is still inside the info horizon.
    assert_eq!(cleared.overview.overall_status, OverallStatus::Warning);
    assert_eq!(cleared.sync.resolved, 2);
    assert_eq!(cleared.overview.alerts.active.len(), 1);
    assert_eq!(
        cleared.overview.alerts.active[0].alert_type,
        AlertType::UpcomingRecurring
    );

    let history = store.history(grantee(), 20).await.expect("history loads");
    assert_eq!(history.len(), 5);
    assert_eq!(history[0].action, "update_document");

    let analytics = store.analytics(grantee(), 10).await.expect("analytics load");
    assert_eq!(analytics.len(), 3);
    assert_eq!(analytics[0].overall_status, OverallStatus::Warning);
    assert_eq!(analytics[1].overall_status, OverallStatus::Critical);
    assert_eq!(analytics[0].recorded_at, later);
}

#[tokio::test]
async fn alerts_can_be_acknowledged_between_checks() {
    let store = Arc::new(InMemoryComplianceStore::default());
    let service = ComplianceService::new(store.clone(), AlertThresholds::default());
    let now = start();

    act(
        &service,
        "create_document",
        Some(json!({ "name": "Indirect cost rate agreement" })),
        now,
    )
    .await;

    let outcome = check(&service, now).await;
    let alert = &outcome.overview.alerts.active[0];
    assert_eq!(alert.alert_type, AlertType::MissingDocuments);
    assert_eq!(alert.message, "1 required document is missing");

    let read = act(
        &service,
        "mark_alert_read",
        Some(json!({ "id": alert.id })),
        now,
    )
    .await;
    assert_eq!(read["is_read"], json!(true));
    assert_eq!(read["is_active"], json!(true));

    // Read alerts still count as present: no duplicate is inserted.
    let again = check(&service, now + Duration::hours(1)).await;
    assert_eq!(again.sync.inserted, 0);
    assert_eq!(again.overview.alerts.active.len(), 1);
}

#[tokio::test]
async fn preferences_update_reclassifies_on_next_check() {
    let store = Arc::new(InMemoryComplianceStore::default());
    let service = ComplianceService::new(store, AlertThresholds::default());
    let now = start();

    act(
        &service,
        "create_tracking_item",
        Some(json!({ "title": "Equipment inventory", "deadline_date": "2026-10-28" })),
        now,
    )
    .await;

    let before = check(&service, now).await;
    assert_eq!(before.overview.warning_items.len(), 1);

    let prefs = act(
        &service,
        "update_preferences",
        Some(json!({ "critical": 14, "warning": 21 })),
        now,
    )
    .await;
    assert_eq!(prefs["thresholds"]["critical"], json!(14));

    let after = check(&service, now).await;
    assert_eq!(after.overview.critical_items.len(), 1);
    assert!(after.overview.warning_items.is_empty());
    assert_eq!(after.sync.inserted, 1);
    assert_eq!(after.sync.resolved, 0);
}
