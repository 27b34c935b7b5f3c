//! QR checkout session.
//!
//! The session owns its expiry timer outright. Every exit path goes through
//! `teardown`, which first invalidates the session's generation and then
//! aborts the timer task; the task re-checks the generation with a
//! compare-and-swap before it navigates, so a timer that outlives its session
//! can never act.

use crate::config::TerminalConfig;
use crate::domain::navigation::Navigator;
use crate::domain::payment::{CheckoutRequest, PaymentOutcome};
use crate::domain::ports::SharedGateway;
use crate::error::{FailureText, PosError, QR_EXPIRED_MESSAGE, Result};
use reqwest::Url;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const QR_CREATE_FAILURE: FailureText = FailureText {
    declined: "Failed to create QR payment.",
    network: "Network Error. Could not generate QR payment.",
};

pub const QR_SIMULATE_FAILURE: FailureText = FailureText {
    declined: "The QR payment was declined.",
    network: "Network Error. Could not process QR payment.",
};

#[derive(Debug, Clone, PartialEq)]
pub enum QrPhase {
    /// Intent creation in flight.
    Loading,
    /// Code on screen, waiting for the customer.
    Ready {
        transaction_id: String,
        qr_payload: String,
        expires_at: Instant,
    },
    /// Completion requested; waiting for the backend verdict.
    Polling { transaction_id: String },
    /// Torn down: expired, finished, or left.
    Closed,
}

pub struct QrPaymentSession {
    gateway: SharedGateway,
    config: Arc<TerminalConfig>,
    request: CheckoutRequest,
    navigator: Navigator,
    phase: QrPhase,
    generation: Arc<AtomicU64>,
    /// Generation this session believes is current; stale once the shared counter moves past it.
    active_generation: u64,
    expiry_timer: Option<JoinHandle<()>>,
}

impl QrPaymentSession {
    pub fn new(
        gateway: SharedGateway,
        config: Arc<TerminalConfig>,
        request: CheckoutRequest,
        navigator: Navigator,
    ) -> Self {
        Self {
            gateway,
            config,
            request,
            navigator,
            phase: QrPhase::Loading,
            generation: Arc::new(AtomicU64::new(0)),
            active_generation: 0,
            expiry_timer: None,
        }
    }

    pub fn phase(&self) -> &QrPhase {
        &self.phase
    }

    pub fn request(&self) -> &CheckoutRequest {
        &self.request
    }

    /// False once the session has been torn down or the expiry timer has claimed it.
    pub fn is_live(&self) -> bool {
        self.phase != QrPhase::Closed
            && self.generation.load(Ordering::SeqCst) == self.active_generation
    }

    pub fn transaction_id(&self) -> Option<&str> {
        match &self.phase {
            QrPhase::Ready { transaction_id, .. } | QrPhase::Polling { transaction_id } => {
                Some(transaction_id)
            }
            _ => None,
        }
    }

    /// The code to show, while it can still be paid.
    pub fn qr_payload(&self) -> Option<&str> {
        match &self.phase {
            QrPhase::Ready { qr_payload, .. } if self.is_live() => Some(qr_payload),
            _ => None,
        }
    }

    pub fn expires_in(&self) -> Option<Duration> {
        match &self.phase {
            QrPhase::Ready { expires_at, .. } if self.is_live() => {
                Some(expires_at.saturating_duration_since(Instant::now()))
            }
            _ => None,
        }
    }

    /// URL of the external service that renders the payload as an image.
    pub fn qr_image_url(&self) -> Option<Url> {
        let payload = self.qr_payload()?;
        qr_image_url(&self.config, payload).ok()
    }

    /// Creates the QR intent and, on success, arms the expiry timer.
    ///
    /// Returns the terminal outcome when creation fails; `None` means the
    /// session is now `Ready`.
    pub async fn start(&mut self) -> Result<Option<PaymentOutcome>> {
        if self.phase != QrPhase::Loading {
            return Err(PosError::InvalidTransition("QR session already started"));
        }

        let body = self.request.to_payment_request(&self.config);
        let created = self.gateway.create_qr_payment(&body).await;
        match created {
            Ok(intent) => {
                let qr_payload = intent.payload();
                let expires_at = Instant::now() + self.config.qr_session_timeout();
                info!(transaction_id = %intent.transaction_id, "QR payment ready");
                self.phase = QrPhase::Ready {
                    transaction_id: intent.transaction_id,
                    qr_payload,
                    expires_at,
                };
                self.arm_expiry(expires_at);
                Ok(None)
            }
            Err(err) => {
                warn!(error = %err, "QR payment creation failed");
                Ok(Some(
                    self.finish(PaymentOutcome::declined(err.user_message(&QR_CREATE_FAILURE))),
                ))
            }
        }
    }

    /// Stands in for the customer scanning and paying.
    ///
    /// Only acts from `Ready`; anywhere else, including after the code has
    /// expired, it is a no-op returning `None`.
    pub async fn simulate(&mut self) -> Result<Option<PaymentOutcome>> {
        let transaction_id = match &self.phase {
            QrPhase::Ready { transaction_id, .. } => transaction_id.clone(),
            _ => return Ok(None),
        };

        // Claim the session before the timer can; losing means it already expired.
        if !self.invalidate() {
            debug!("simulate after expiry ignored");
            self.close();
            return Ok(None);
        }
        self.cancel_timers();
        self.phase = QrPhase::Polling {
            transaction_id: transaction_id.clone(),
        };

        let simulated = self.gateway.simulate_qr_payment(&transaction_id).await;
        let outcome = match simulated {
            Ok(simulation) if simulation.is_completed() => {
                info!(%transaction_id, "QR payment completed");
                PaymentOutcome::Approved {
                    amount: self.request.amount,
                    transaction_id,
                }
            }
            Ok(simulation) => {
                warn!(status = ?simulation.status, "QR payment not completed");
                PaymentOutcome::declined(
                    simulation
                        .message
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| QR_SIMULATE_FAILURE.declined.to_string()),
                )
            }
            Err(err) => {
                warn!(error = %err, "QR payment simulation failed");
                PaymentOutcome::declined(err.user_message(&QR_SIMULATE_FAILURE))
            }
        };

        Ok(Some(self.finish(outcome)))
    }

    pub fn can_go_back(&self) -> bool {
        !matches!(self.phase, QrPhase::Polling { .. })
    }

    /// Leaves the screen, cancelling the session. Refused while a completion
    /// request is in flight.
    pub fn back(&mut self) -> Result<()> {
        if !self.can_go_back() {
            return Err(PosError::InvalidTransition(
                "QR payment is being verified",
            ));
        }
        self.teardown();
        self.navigator.back();
        Ok(())
    }

    /// Cancels every timer and closes the session. Safe to call any number of times.
    pub fn teardown(&mut self) {
        self.invalidate();
        self.cancel_timers();
        self.close();
    }

    fn finish(&mut self, outcome: PaymentOutcome) -> PaymentOutcome {
        self.teardown();
        self.navigator.show_result(outcome.clone());
        outcome
    }

    /// Moves the shared generation past ours. True when we were still the
    /// active holder, false when someone (the expiry timer) got there first.
    fn invalidate(&self) -> bool {
        self.generation
            .compare_exchange(
                self.active_generation,
                self.active_generation + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    fn cancel_timers(&mut self) {
        if let Some(timer) = self.expiry_timer.take() {
            timer.abort();
        }
    }

    fn close(&mut self) {
        if !matches!(self.phase, QrPhase::Closed) {
            debug!("QR session closed");
        }
        self.phase = QrPhase::Closed;
    }

    fn arm_expiry(&mut self, expires_at: Instant) {
        self.cancel_timers();

        let generation = Arc::clone(&self.generation);
        let armed = self.active_generation;
        let navigator = self.navigator.clone();
        self.expiry_timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            if generation
                .compare_exchange(armed, armed + 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                warn!("QR session expired before the customer scanned");
                navigator.show_result(PaymentOutcome::declined(QR_EXPIRED_MESSAGE));
            }
        }));
    }
}

impl Drop for QrPaymentSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Builds the image URL for `payload`, e.g.
/// `https://api.qrserver.com/v1/create-qr-code/?size=280x280&data=...&margin=10`.
pub fn qr_image_url(config: &TerminalConfig, payload: &str) -> Result<Url> {
    let size = format!("{0}x{0}", config.qr_image_size);
    Url::parse_with_params(
        &config.qr_image_service,
        &[("size", size.as_str()), ("data", payload), ("margin", "10")],
    )
    .map_err(|e| PosError::Config(format!("invalid qr_image_service: {e}")))
}

/// QR side length for a screen `width` wide: width minus padding, capped at 280.
pub fn qr_size_for_width(width: u32) -> u32 {
    width.saturating_sub(96).min(280)
}
