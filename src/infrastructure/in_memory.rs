use crate::domain::payment::{Authorization, PaymentRequest, QrIntent, QrSimulation};
use crate::domain::ports::PaymentGateway;
use crate::domain::simulation::SimulationMode;
use crate::domain::transaction::Transaction;
use crate::error::{PosError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub const CARD_DECLINED_MESSAGE: &str = "Card declined";
pub const QR_DECLINED_MESSAGE: &str = "QR payment declined";

#[derive(Debug, Clone)]
enum CardResult {
    Approved(String),
    Declined,
}

impl CardResult {
    fn replay(&self) -> Result<Authorization> {
        match self {
            CardResult::Approved(id) => Ok(Authorization {
                transaction_id: id.clone(),
            }),
            CardResult::Declined => Err(card_declined()),
        }
    }
}

fn card_declined() -> PosError {
    PosError::Api {
        status: 402,
        message: Some(CARD_DECLINED_MESSAGE.to_string()),
    }
}

#[derive(Default)]
struct Ledger {
    next_id: u64,
    /// Every transaction in creation order, as the history endpoint returns them.
    transactions: Vec<Transaction>,
    /// Idempotency key to the transaction it produced.
    by_key: HashMap<String, String>,
    /// First card authorization result per idempotency key.
    authorizations: HashMap<String, CardResult>,
    /// Open QR intents awaiting simulation, keyed by transaction id.
    pending_qr: HashMap<String, SimulationMode>,
    unreachable: bool,
}

impl Ledger {
    fn record(&mut self, request: &PaymentRequest, status: &str) -> String {
        self.next_id += 1;
        let id = format!("txn_{:06}", self.next_id);
        self.transactions.push(Transaction {
            id: id.clone(),
            amount: request.amount,
            status: Some(status.to_string()),
            created_at: Some(Utc::now()),
        });
        self.by_key.insert(request.idempotency_key.clone(), id.clone());
        id
    }

    fn set_status(&mut self, id: &str, status: &str) {
        if let Some(tx) = self.transactions.iter_mut().find(|tx| tx.id == id) {
            tx.status = Some(status.to_string());
        }
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable {
            Err(PosError::Transport("payment API unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// A local stand-in for the payment API that honours the simulation tokens.
///
/// `success_token` approves, `fail_token` declines, anything else is rejected
/// as a bad request. Repeating an idempotency key returns whatever the key
/// first produced, approval or decline, instead of charging again.
#[derive(Default, Clone)]
pub struct InMemoryGateway {
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryGateway {
    /// Creates a gateway with an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail as if the server could not be reached.
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.ledger.write().await.unreachable = unreachable;
    }

    pub async fn recorded(&self) -> Vec<Transaction> {
        self.ledger.read().await.transactions.clone()
    }
}

fn mode_for(token: &str) -> Result<SimulationMode> {
    [SimulationMode::Success, SimulationMode::Fail]
        .into_iter()
        .find(|mode| mode.token() == token)
        .ok_or_else(|| PosError::Api {
            status: 400,
            message: Some("Invalid payment token".to_string()),
        })
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn authorize(&self, request: &PaymentRequest) -> Result<Authorization> {
        let mut ledger = self.ledger.write().await;
        ledger.check_reachable()?;

        if let Some(first) = ledger.authorizations.get(&request.idempotency_key) {
            debug!(key = %request.idempotency_key, ?first, "replayed idempotency key");
            return first.replay();
        }

        let result = match mode_for(&request.payment_token)? {
            SimulationMode::Success => CardResult::Approved(ledger.record(request, "SUCCESS")),
            SimulationMode::Fail => {
                ledger.record(request, "FAILED");
                CardResult::Declined
            }
        };
        ledger
            .authorizations
            .insert(request.idempotency_key.clone(), result.clone());
        result.replay()
    }

    async fn create_qr_payment(&self, request: &PaymentRequest) -> Result<QrIntent> {
        let mut ledger = self.ledger.write().await;
        ledger.check_reachable()?;

        let mode = mode_for(&request.payment_token)?;
        let transaction_id = match ledger.by_key.get(&request.idempotency_key) {
            Some(id) => id.clone(),
            None => ledger.record(request, "PENDING"),
        };
        ledger.pending_qr.insert(transaction_id.clone(), mode);

        Ok(QrIntent {
            qr_data: Some(format!("pos-qr:{transaction_id}")),
            transaction_id,
        })
    }

    async fn simulate_qr_payment(&self, transaction_id: &str) -> Result<QrSimulation> {
        let mut ledger = self.ledger.write().await;
        ledger.check_reachable()?;

        let Some(mode) = ledger.pending_qr.remove(transaction_id) else {
            return Ok(QrSimulation {
                status: Some("NOT_FOUND".to_string()),
                message: Some("QR payment not found".to_string()),
            });
        };

        match mode {
            SimulationMode::Success => {
                ledger.set_status(transaction_id, "COMPLETED");
                Ok(QrSimulation {
                    status: Some("COMPLETED".to_string()),
                    message: None,
                })
            }
            SimulationMode::Fail => {
                ledger.set_status(transaction_id, "FAILED");
                Ok(QrSimulation {
                    status: Some("FAILED".to_string()),
                    message: Some(QR_DECLINED_MESSAGE.to_string()),
                })
            }
        }
    }

    async fn transactions(&self, _machine_id: &str) -> Result<Vec<Transaction>> {
        let ledger = self.ledger.read().await;
        ledger.check_reachable()?;
        Ok(ledger.transactions.clone())
    }
}
