use crate::domain::amount::format_money;
use crate::domain::navigation::Navigator;
use crate::domain::payment::PaymentOutcome;
use chrono::{DateTime, TimeZone};
use std::fmt;

pub const DEFAULT_DECLINE_MESSAGE: &str =
    "The customer's card was declined. Please ask for another payment method.";

const RECEIPT_ID_CHARS: usize = 18;

/// A rendered result screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultScreen {
    pub approved: bool,
    pub title: &'static str,
    pub lines: Vec<String>,
    pub action: &'static str,
}

impl ResultScreen {
    /// Either action starts over at the entry screen.
    pub fn dismiss(&self, navigator: &Navigator) {
        navigator.reset_to_entry();
    }
}

impl fmt::Display for ResultScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        write!(f, "[{}]", self.action)
    }
}

/// Renders `outcome`. The receipt time is the terminal's clock at render
/// time, not the server's timestamp.
pub fn render_result<Tz: TimeZone>(outcome: &PaymentOutcome, now: &DateTime<Tz>) -> ResultScreen
where
    Tz::Offset: fmt::Display,
{
    match outcome {
        PaymentOutcome::Approved {
            amount,
            transaction_id,
        } => ResultScreen {
            approved: true,
            title: "Payment Approved",
            lines: vec![
                format_money(*amount),
                "Status          Approved ✓".to_string(),
                format!("Transaction ID  {}", truncate_id(transaction_id)),
                format!("Time            {}", now.format("%H:%M")),
            ],
            action: "New Sale",
        },
        PaymentOutcome::Declined { message } => ResultScreen {
            approved: false,
            title: "Payment Failed",
            lines: vec![
                message
                    .as_deref()
                    .filter(|m| !m.is_empty())
                    .unwrap_or(DEFAULT_DECLINE_MESSAGE)
                    .to_string(),
            ],
            action: "Try Again",
        },
    }
}

fn truncate_id(id: &str) -> String {
    let head: String = id.chars().take(RECEIPT_ID_CHARS).collect();
    format!("{head}…")
}
