use crate::config::TerminalConfig;
use crate::domain::navigation::Navigator;
use crate::domain::payment::{CheckoutRequest, PaymentOutcome};
use crate::domain::ports::SharedGateway;
use crate::error::{FailureText, PosError, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub const CARD_FAILURE: FailureText = FailureText {
    declined: "Card was declined.",
    network: "Network Error. Please try again.",
};

/// Progress shown on the card screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardStep {
    Ready,
    Reading,
    Processing,
}

impl CardStep {
    pub fn label(self) -> &'static str {
        match self {
            CardStep::Ready => "Ready",
            CardStep::Reading => "Reading Card...",
            CardStep::Processing => "Processing...",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            CardStep::Ready => "Tap, Insert or Swipe Card",
            CardStep::Reading => "Please hold card still",
            CardStep::Processing => "Do not remove card",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CardPhase {
    Idle,
    InFlight(CardStep),
    Done(PaymentOutcome),
}

/// Card-tap checkout: ready, reading, processing, then one authorization call.
///
/// A flow instance runs once. After `run` starts there is no way back: the
/// authorization may already be on the wire.
pub struct CardPaymentFlow {
    gateway: SharedGateway,
    config: Arc<TerminalConfig>,
    request: CheckoutRequest,
    navigator: Navigator,
    phase: CardPhase,
    progress: Option<mpsc::UnboundedSender<CardStep>>,
}

impl CardPaymentFlow {
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
            phase: CardPhase::Idle,
            progress: None,
        }
    }

    /// Receives every step change, in order, starting from the first move out of `Ready`.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<CardStep> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.progress = Some(tx);
        rx
    }

    pub fn request(&self) -> &CheckoutRequest {
        &self.request
    }

    /// The step on screen, or `None` once the flow has reached a result.
    pub fn step(&self) -> Option<CardStep> {
        match self.phase {
            CardPhase::Idle => Some(CardStep::Ready),
            CardPhase::InFlight(step) => Some(step),
            CardPhase::Done(_) => None,
        }
    }

    pub fn outcome(&self) -> Option<&PaymentOutcome> {
        match &self.phase {
            CardPhase::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.phase == CardPhase::Idle
    }

    pub fn back(&self) -> Result<()> {
        if !self.can_go_back() {
            return Err(PosError::InvalidTransition(
                "card payment already started",
            ));
        }
        self.navigator.back();
        Ok(())
    }

    /// Runs the card tap through to a result and replaces the screen with it.
    pub async fn run(&mut self) -> Result<PaymentOutcome> {
        if self.phase != CardPhase::Idle {
            self.progress = None;
            return Err(PosError::InvalidTransition("card payment already started"));
        }

        self.advance(CardStep::Reading);
        tokio::time::sleep(self.config.card_read_dwell()).await;
        self.advance(CardStep::Processing);

        let body = self.request.to_payment_request(&self.config);
        let outcome = match self.gateway.authorize(&body).await {
            Ok(auth) => {
                info!(transaction_id = %auth.transaction_id, "card payment approved");
                PaymentOutcome::Approved {
                    amount: self.request.amount,
                    transaction_id: auth.transaction_id,
                }
            }
            Err(err) => {
                warn!(error = %err, "card payment failed");
                PaymentOutcome::declined(err.user_message(&CARD_FAILURE))
            }
        };

        self.phase = CardPhase::Done(outcome.clone());
        self.progress = None;
        self.navigator.show_result(outcome.clone());
        Ok(outcome)
    }

    fn advance(&mut self, step: CardStep) {
        info!(step = step.label(), "card flow");
        self.phase = CardPhase::InFlight(step);
        if let Some(progress) = &self.progress {
            let _ = progress.send(step);
        }
    }
}
