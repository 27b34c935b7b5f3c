use crate::domain::transaction::Transaction;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct Row<'a> {
    id: &'a str,
    amount: String,
    status: &'static str,
    created_at: String,
}

/// Writes the sales list as CSV with an `id,amount,status,created_at` header.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// Writes every row in the given order and flushes. Status is the
    /// normalised label; timestamps are RFC 3339 or empty.
    pub fn write_transactions(&mut self, transactions: &[Transaction]) -> Result<()> {
        for tx in transactions {
            self.writer.serialize(Row {
                id: &tx.id,
                amount: format!("{:.2}", tx.amount.round_dp(2)),
                status: tx.status().label(),
                created_at: tx.created_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
