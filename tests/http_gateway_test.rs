mod common;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{Captured, checkout, config_for, navigator, spawn_stub};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use till::application::card_flow::CardPaymentFlow;
use till::application::history::{HistoryView, TransactionHistory};
use till::application::qr_session::{QrPaymentSession, QrPhase};
use till::domain::amount::AmountEntry;
use till::domain::navigation::{Navigation, Screen};
use till::domain::payment::{PaymentMethod, PaymentOutcome};
use till::domain::simulation::SimulationMode;
use till::error::PosError;
use till::infrastructure::http::HttpGateway;

async fn approve(State(seen): State<Captured>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    seen.lock().unwrap().push(body);
    (StatusCode::OK, Json(json!({"transactionId": "tx_1"})))
}

async fn decline(Json(_body): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::PAYMENT_REQUIRED,
        Json(json!({"message": "Card declined"})),
    )
}

async fn create_qr(State(seen): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    seen.lock().unwrap().push(body);
    Json(json!({"transactionId": "qr_77"}))
}

async fn simulate(Path(id): Path<String>) -> Json<Value> {
    if id == "qr_77" {
        Json(json!({"status": "COMPLETED"}))
    } else {
        Json(json!({"status": "FAILED", "message": "Unknown QR payment"}))
    }
}

async fn sales(Path(machine_id): Path<String>) -> (StatusCode, Json<Value>) {
    if machine_id != "machine-1" {
        return (StatusCode::NOT_FOUND, Json(json!({"message": "unknown machine"})));
    }
    (
        StatusCode::OK,
        Json(json!([
            {"_id": "a", "amount": 1.5, "status": "PENDING", "createdAt": "2026-10-14T09:00:00.000Z"},
            {"_id": "b", "amount": 2, "status": "weird"},
            {"_id": "c", "amount": "3.25", "status": "COMPLETED"}
        ])),
    )
}

fn backend(seen: Captured) -> Router {
    Router::new()
        .route("/api/payments/", post(approve))
        .route("/api/payments/createQrPayment", post(create_qr))
        .route("/api/payments/QrPayment/simulate/:id", post(simulate))
        .route("/api/transections/:machine_id", get(sales))
        .with_state(seen)
}

#[tokio::test]
async fn test_card_flow_approved_over_http() {
    let seen = Captured::default();
    let base = spawn_stub(backend(seen.clone())).await;
    let config = config_for(&base);
    let gateway = Arc::new(HttpGateway::new(&config).unwrap());
    let (nav, mut events) = navigator();

    let mut flow = CardPaymentFlow::new(
        gateway,
        config,
        checkout(PaymentMethod::Card, dec!(9.99), SimulationMode::Success),
        nav,
    );
    let outcome = flow.run().await.unwrap();

    assert_eq!(
        outcome,
        PaymentOutcome::Approved {
            amount: dec!(9.99),
            transaction_id: "tx_1".to_string(),
        }
    );
    assert_eq!(
        events.try_recv().unwrap(),
        Navigation::Replace(Screen::Result(outcome))
    );

    let bodies = seen.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["machineId"], "machine-1");
    assert_eq!(bodies[0]["currency"], "GBP");
    assert_eq!(bodies[0]["paymentToken"], "success_token");
}

#[tokio::test]
async fn test_card_flow_declined_with_exact_message() {
    let base = spawn_stub(Router::new().route("/api/payments/", post(decline))).await;
    let config = config_for(&base);
    let gateway = Arc::new(HttpGateway::new(&config).unwrap());
    let (nav, _events) = navigator();

    let mut flow = CardPaymentFlow::new(
        gateway,
        config,
        checkout(PaymentMethod::Card, dec!(5), SimulationMode::Fail),
        nav,
    );

    assert_eq!(
        flow.run().await.unwrap(),
        PaymentOutcome::declined("Card declined")
    );
}

#[tokio::test]
async fn test_qr_amount_sent_as_number() {
    let seen = Captured::default();
    let base = spawn_stub(backend(seen.clone())).await;
    let config = config_for(&base);
    let gateway = Arc::new(HttpGateway::new(&config).unwrap());
    let (nav, _events) = navigator();

    let amount = AmountEntry::from_keys("12.5").unwrap().amount();
    let mut session = QrPaymentSession::new(
        gateway,
        config,
        checkout(PaymentMethod::Qr, amount, SimulationMode::Success),
        nav,
    );
    assert_eq!(session.start().await.unwrap(), None);

    let body = seen.lock().unwrap()[0].clone();
    assert_eq!(body["amount"], json!(12.5));
    assert!(body["amount"].is_f64());
}

#[tokio::test]
async fn test_qr_session_completes_over_http() {
    let base = spawn_stub(backend(Captured::default())).await;
    let config = config_for(&base);
    let gateway = Arc::new(HttpGateway::new(&config).unwrap());
    let (nav, mut events) = navigator();

    let mut session = QrPaymentSession::new(
        gateway,
        config,
        checkout(PaymentMethod::Qr, dec!(4), SimulationMode::Success),
        nav,
    );
    session.start().await.unwrap();
    // No qrData in the response, so the id becomes the payload.
    assert_eq!(session.qr_payload(), Some("qr_77"));

    let outcome = session.simulate().await.unwrap().unwrap();
    assert!(outcome.is_approved());
    assert_eq!(session.phase(), &QrPhase::Closed);
    assert_eq!(
        events.try_recv().unwrap(),
        Navigation::Replace(Screen::Result(outcome))
    );
}

#[tokio::test]
async fn test_qr_creation_rejected() {
    let base = spawn_stub(Router::new().route(
        "/api/payments/createQrPayment",
        post(|| async { (StatusCode::BAD_REQUEST, Json(json!({}))) }),
    ))
    .await;
    let config = config_for(&base);
    let gateway = Arc::new(HttpGateway::new(&config).unwrap());
    let (nav, _events) = navigator();

    let mut session = QrPaymentSession::new(
        gateway,
        config,
        checkout(PaymentMethod::Qr, dec!(4), SimulationMode::Success),
        nav,
    );
    assert_eq!(
        session.start().await.unwrap(),
        Some(PaymentOutcome::declined("Failed to create QR payment."))
    );
}

#[tokio::test]
async fn test_history_labels_in_backend_order() {
    let base = spawn_stub(backend(Captured::default())).await;
    let config = config_for(&base);
    let gateway = Arc::new(HttpGateway::new(&config).unwrap());

    let mut history = TransactionHistory::new(gateway, config.machine_id.clone());
    let HistoryView::Loaded(rows) = history.refresh().await else {
        panic!("expected loaded history");
    };

    let labels: Vec<&str> = rows.iter().map(|tx| tx.status().label()).collect();
    assert_eq!(labels, vec!["Pending", "Failed", "Success"]);
    assert_eq!(rows[2].amount, dec!(3.25));
}

#[tokio::test]
async fn test_history_unknown_machine_is_api_error() {
    let base = spawn_stub(backend(Captured::default())).await;
    let gateway = HttpGateway::new(&config_for(&base)).unwrap();

    use till::domain::ports::PaymentGateway;
    let err = gateway.transactions("nobody").await.unwrap_err();
    assert!(matches!(err, PosError::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_simulate_error_status_keeps_server_verdict() {
    let router = Router::new()
        .route("/api/payments/createQrPayment", post(create_qr))
        .route(
            "/api/payments/QrPayment/simulate/:id",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"status": "FAILED", "message": "Insufficient funds"})),
                )
            }),
        )
        .with_state(Captured::default());
    let base = spawn_stub(router).await;
    let config = config_for(&base);
    let gateway = Arc::new(HttpGateway::new(&config).unwrap());
    let (nav, _events) = navigator();

    let mut session = QrPaymentSession::new(
        gateway,
        config,
        checkout(PaymentMethod::Qr, dec!(4), SimulationMode::Fail),
        nav,
    );
    session.start().await.unwrap();

    assert_eq!(
        session.simulate().await.unwrap(),
        Some(PaymentOutcome::declined("Insufficient funds"))
    );
}

#[tokio::test]
async fn test_simulate_error_status_without_json_body() {
    let base = spawn_stub(Router::new().route(
        "/api/payments/QrPayment/simulate/:id",
        post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    ))
    .await;
    let config = config_for(&base);
    let gateway = HttpGateway::new(&config).unwrap();

    use till::domain::ports::PaymentGateway;
    let err = gateway.simulate_qr_payment("qr_77").await.unwrap_err();
    assert!(matches!(err, PosError::Api { status: 502, message: None }));
    assert_eq!(
        err.user_message(&till::application::qr_session::QR_SIMULATE_FAILURE),
        "The QR payment was declined."
    );
}
