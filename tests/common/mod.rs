#![allow(dead_code)]

use axum::Router;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use till::config::TerminalConfig;
use till::domain::navigation::Navigator;
use till::domain::payment::{CheckoutRequest, PaymentMethod};
use till::domain::simulation::{self, SimulationMode};

/// Request bodies seen by a stub backend, in arrival order.
pub type Captured = Arc<Mutex<Vec<Value>>>;

/// Serves `router` on an ephemeral local port and returns the API base URL.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

pub fn config_for(api_url: &str) -> Arc<TerminalConfig> {
    Arc::new(
        TerminalConfig {
            api_url: api_url.to_string(),
            machine_id: "machine-1".to_string(),
            card_read_dwell_ms: 0,
            ..TerminalConfig::default()
        }
        .validate()
        .unwrap(),
    )
}

pub fn checkout(method: PaymentMethod, amount: Decimal, mode: SimulationMode) -> CheckoutRequest {
    CheckoutRequest {
        method,
        amount,
        idempotency_key: simulation::new_idempotency_key(),
        payment_token: simulation::resolve_token(mode).to_string(),
    }
}

pub fn navigator() -> (
    Navigator,
    tokio::sync::mpsc::UnboundedReceiver<till::domain::navigation::Navigation>,
) {
    Navigator::channel()
}
