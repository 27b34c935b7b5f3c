//! Application layer: the screen controllers.
//!
//! Each controller holds its own explicit state and talks to the payment API
//! through the `PaymentGateway` port. Screen changes are emitted as events on a
//! `tokio` channel (`Navigator`) rather than performed directly, so flows can
//! be driven headless and under virtual time.

pub mod card_flow;
pub mod checkout;
pub mod history;
pub mod qr_session;
