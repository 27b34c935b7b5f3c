use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::config::TerminalConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    Card,
    Qr,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Card => f.write_str("CARD"),
            PaymentMethod::Qr => f.write_str("QR"),
        }
    }
}

/// Everything a payment screen needs from the entry screen.
///
/// Carries one idempotency key, minted when the operator pressed checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub idempotency_key: String,
    pub payment_token: String,
}

impl CheckoutRequest {
    pub fn to_payment_request(&self, config: &TerminalConfig) -> PaymentRequest {
        PaymentRequest {
            machine_id: config.machine_id.clone(),
            amount: self.amount,
            currency: config.currency.clone(),
            idempotency_key: self.idempotency_key.clone(),
            payment_token: self.payment_token.clone(),
        }
    }
}

/// Body of both the card authorization and the QR intent requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub machine_id: String,
    /// Sent as a JSON number, never a string.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub idempotency_key: String,
    pub payment_token: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    #[serde(deserialize_with = "deserialize_id")]
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrIntent {
    #[serde(deserialize_with = "deserialize_id")]
    pub transaction_id: String,
    #[serde(default)]
    pub qr_data: Option<String>,
}

impl QrIntent {
    /// The string encoded into the QR image; the transaction id stands in
    /// when the server sends no explicit payload.
    pub fn payload(&self) -> String {
        match self.qr_data.as_deref() {
            Some(data) if !data.is_empty() => data.to_string(),
            _ => self.transaction_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct QrSimulation {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl QrSimulation {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some("COMPLETED")
    }
}

/// Error body the API sends with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Terminal state of a checkout attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    Approved {
        amount: Decimal,
        transaction_id: String,
    },
    Declined {
        message: Option<String>,
    },
}

impl PaymentOutcome {
    pub fn declined(message: impl Into<String>) -> Self {
        PaymentOutcome::Declined {
            message: Some(message.into()),
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, PaymentOutcome::Approved { .. })
    }
}

/// Transaction ids arrive as strings from some deployments and as numbers from others.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected transaction id, found {other}"
        ))),
    }
}
