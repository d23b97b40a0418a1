use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use grantflow::compliance::ComplianceRule;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Reference rules returned with every overview until an admin-managed
/// rule table exists.
pub(crate) fn default_rules() -> Vec<ComplianceRule> {
    [
        (
            "Financial reporting",
            "Submit the SF-425 Federal Financial Report by each reporting deadline.",
            "Federal Reporting",
        ),
        (
            "Entity registration",
            "Keep the SAM.gov registration active for the full period of performance.",
            "Federal Registration",
        ),
        (
            "Single audit",
            "File the single audit package within nine months of fiscal year end when federal expenditures exceed the threshold.",
            "Audit",
        ),
        (
            "Document retention",
            "Retain financial records and supporting documents for three years after the final expenditure report.",
            "Records",
        ),
    ]
    .into_iter()
    .map(|(name, description, category)| ComplianceRule {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: description.to_string(),
        category: Some(category.to_string()),
        is_active: true,
    })
    .collect()
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

/// Evaluation instant for a report date: midday UTC, or the current time when
/// no date was supplied.
pub(crate) fn evaluation_instant(today: Option<NaiveDate>) -> DateTime<Utc> {
    today
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_else(Utc::now)
}
