use tokio::sync::mpsc;
use tracing::debug;

use super::payment::{CheckoutRequest, PaymentOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    CardPayment(CheckoutRequest),
    QrPayment(CheckoutRequest),
    Result(PaymentOutcome),
    Transactions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Push(Screen),
    /// Swap the current screen, so back navigation skips it.
    Replace(Screen),
    Back,
    /// Drop the whole stack and start a new sale.
    ResetToEntry,
}

/// Sending half of the navigation stream.
///
/// Flows emit navigation events instead of owning a screen stack; whoever
/// holds the receiver decides what to show. Events sent after the receiver
/// is gone are discarded.
#[derive(Debug, Clone)]
pub struct Navigator {
    tx: mpsc::UnboundedSender<Navigation>,
}

impl Navigator {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Navigation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn push(&self, screen: Screen) {
        self.send(Navigation::Push(screen));
    }

    pub fn replace(&self, screen: Screen) {
        self.send(Navigation::Replace(screen));
    }

    pub fn back(&self) {
        self.send(Navigation::Back);
    }

    pub fn reset_to_entry(&self) {
        self.send(Navigation::ResetToEntry);
    }

    /// Replaces the current screen with the result screen for `outcome`.
    pub fn show_result(&self, outcome: PaymentOutcome) {
        self.replace(Screen::Result(outcome));
    }

    fn send(&self, event: Navigation) {
        if self.tx.send(event).is_err() {
            debug!("navigation receiver dropped; event discarded");
        }
    }
}
