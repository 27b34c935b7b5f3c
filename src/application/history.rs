use crate::domain::ports::SharedGateway;
use crate::domain::transaction::Transaction;
use crate::error::Result;
use tracing::{debug, warn};

pub const HISTORY_ERROR_MESSAGE: &str = "Network error. Please check your connection.";

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryView {
    Loading,
    /// Shown with a retry affordance.
    Failed(&'static str),
    Empty,
    /// Rows in the order the backend returned them.
    Loaded(Vec<Transaction>),
}

/// Sales list for one terminal. Every visit (and every retry) refetches.
pub struct TransactionHistory {
    gateway: SharedGateway,
    machine_id: String,
    view: HistoryView,
}

impl TransactionHistory {
    pub fn new(gateway: SharedGateway, machine_id: impl Into<String>) -> Self {
        Self {
            gateway,
            machine_id: machine_id.into(),
            view: HistoryView::Loading,
        }
    }

    pub fn view(&self) -> &HistoryView {
        &self.view
    }

    pub async fn fetch_transactions(&self) -> Result<Vec<Transaction>> {
        self.gateway.transactions(&self.machine_id).await
    }

    /// Reloads the list; failures collapse into the static retry message.
    pub async fn refresh(&mut self) -> &HistoryView {
        self.view = HistoryView::Loading;
        let fetched = self.fetch_transactions().await;
        self.view = match fetched {
            Ok(transactions) if transactions.is_empty() => HistoryView::Empty,
            Ok(transactions) => {
                debug!(count = transactions.len(), "transactions loaded");
                HistoryView::Loaded(transactions)
            }
            Err(err) => {
                warn!(error = %err, "could not load transactions");
                HistoryView::Failed(HISTORY_ERROR_MESSAGE)
            }
        };
        &self.view
    }
}
