use crate::application::history::HistoryView;
use crate::domain::amount::format_money;
use crate::domain::transaction::{Transaction, time_label};
use chrono::{DateTime, TimeZone};
use std::fmt;

pub const EMPTY_MESSAGE: &str = "No sales yet";

/// One list row: `£12.50  Today, 09:15  Success`.
pub fn render_row<Tz: TimeZone>(tx: &Transaction, now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!(
        "{:>10}  {:<14}  {}",
        format_money(tx.amount),
        time_label(tx.created_at, now),
        tx.status().label()
    )
}

pub fn render_history<Tz: TimeZone>(view: &HistoryView, now: &DateTime<Tz>) -> Vec<String>
where
    Tz::Offset: fmt::Display,
{
    match view {
        HistoryView::Loading => vec!["Loading sales...".to_string()],
        HistoryView::Failed(message) => vec![message.to_string(), "[Retry]".to_string()],
        HistoryView::Empty => vec![EMPTY_MESSAGE.to_string()],
        HistoryView::Loaded(rows) => rows.iter().map(|tx| render_row(tx, now)).collect(),
    }
}
