use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::domain::{Priority, TrackingItem, TrackingStatus, UserId};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read tracking export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tracking CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unrecognized deadline '{value}'")]
    InvalidDate { row: usize, value: String },
}

/// Loads tracking items from a spreadsheet export with `Title`, `Deadline`,
/// `Status`, `Priority`, and `Category` columns.
pub struct TrackingCsvImporter;

impl TrackingCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrackingItem>, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, user, now)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        user: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<TrackingItem>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut items = Vec::new();

        for (index, record) in csv_reader.deserialize::<TrackingRow>().enumerate() {
            let row = record?;
            let Some(title) = row.title.filter(|title| !title.is_empty()) else {
                continue;
            };

            // header is line 1
            let line = index + 2;
            let deadline_date = match row.deadline {
                Some(raw) => Some(
                    parse_date(&raw).ok_or(ImportError::InvalidDate { row: line, value: raw })?,
                ),
                None => None,
            };

            let status = row
                .status
                .as_deref()
                .and_then(TrackingStatus::parse_lenient)
                .unwrap_or_default();
            let completed_at = (status == TrackingStatus::Completed).then_some(now);

            items.push(TrackingItem {
                id: Uuid::new_v4(),
                user_id: user,
                title,
                description: None,
                category: row.category,
                deadline_date,
                status,
                priority: row
                    .priority
                    .as_deref()
                    .and_then(Priority::parse_lenient)
                    .unwrap_or_default(),
                completed_at,
                created_at: now,
                updated_at: now,
            });
        }

        Ok(items)
    }
}

#[derive(Debug, Deserialize)]
struct TrackingRow {
    #[serde(rename = "Title", default, deserialize_with = "empty_string_as_none")]
    title: Option<String>,
    #[serde(rename = "Deadline", default, deserialize_with = "empty_string_as_none")]
    deadline: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(rename = "Priority", default, deserialize_with = "empty_string_as_none")]
    priority: Option<String>,
    #[serde(rename = "Category", default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.naive_utc().date())
}
