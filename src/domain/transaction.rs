use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A past sale as reported by the payment API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A malformed field falls back to its default so one bad row cannot sink the list.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

impl Transaction {
    pub fn status(&self) -> TransactionStatus {
        TransactionStatus::from_raw(self.status.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Success,
    Pending,
    Failed,
}

impl TransactionStatus {
    /// Anything the terminal does not recognise, including a missing status, counts as failed.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.unwrap_or_default().to_ascii_uppercase().as_str() {
            "SUCCESS" | "COMPLETED" => TransactionStatus::Success,
            "PENDING" => TransactionStatus::Pending,
            _ => TransactionStatus::Failed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TransactionStatus::Success => "Success",
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Renders `created_at` relative to `now`, in `now`'s time zone.
///
/// Same calendar day gives `Today, 09:15`; otherwise `Mar 4, 09:15`.
pub fn time_label<Tz: TimeZone>(created_at: Option<DateTime<Utc>>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    let Some(created_at) = created_at else {
        return "—".to_string();
    };
    let local = created_at.with_timezone(&now.timezone());
    if local.date_naive() == now.date_naive() {
        format!("Today, {}", local.format("%H:%M"))
    } else {
        local.format("%b %-d, %H:%M").to_string()
    }
}
