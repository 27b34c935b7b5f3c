use super::payment::{Authorization, PaymentRequest, QrIntent, QrSimulation};
use super::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The remote payment API, seen from the terminal.
///
/// Each method issues at most one request. Non-2xx answers surface as
/// `PosError::Api`, unreachable servers and unreadable bodies as
/// `PosError::Transport`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// `POST /payments/`
    async fn authorize(&self, request: &PaymentRequest) -> Result<Authorization>;

    /// `POST /payments/createQrPayment`
    async fn create_qr_payment(&self, request: &PaymentRequest) -> Result<QrIntent>;

    /// `POST /payments/QrPayment/simulate/{transaction_id}`
    ///
    /// The answer is read regardless of HTTP status; only `status == "COMPLETED"`
    /// means the customer paid.
    async fn simulate_qr_payment(&self, transaction_id: &str) -> Result<QrSimulation>;

    /// `GET /transections/{machine_id}`, in backend order.
    async fn transactions(&self, machine_id: &str) -> Result<Vec<Transaction>>;
}

pub type SharedGateway = Arc<dyn PaymentGateway>;
