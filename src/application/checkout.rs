use crate::domain::amount::{AmountEntry, Key};
use crate::domain::navigation::{Navigator, Screen};
use crate::domain::payment::{CheckoutRequest, PaymentMethod};
use crate::domain::simulation::{self, SimulationMode};
use tracing::info;

/// Controller behind the entry screen: the keypad, the simulation toggle,
/// and the two checkout buttons.
pub struct Checkout {
    entry: AmountEntry,
    mode: SimulationMode,
    navigator: Navigator,
}

impl Checkout {
    pub fn new(navigator: Navigator) -> Self {
        Self {
            entry: AmountEntry::new(),
            mode: SimulationMode::default(),
            navigator,
        }
    }

    pub fn with_mode(mut self, mode: SimulationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn press(&mut self, key: Key) {
        self.entry.press(key);
    }

    pub fn entry(&self) -> &AmountEntry {
        &self.entry
    }

    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    pub fn toggle_mode(&mut self) -> SimulationMode {
        self.mode.toggle();
        self.mode
    }

    pub fn can_checkout(&self) -> bool {
        !self.entry.is_zero()
    }

    /// Starts a checkout with a freshly minted idempotency key and pushes the
    /// payment screen for `method`. Does nothing while the amount is zero.
    pub fn checkout(&mut self, method: PaymentMethod) -> Option<CheckoutRequest> {
        if !self.can_checkout() {
            return None;
        }

        let request = CheckoutRequest {
            method,
            amount: self.entry.amount(),
            idempotency_key: simulation::new_idempotency_key(),
            payment_token: simulation::resolve_token(self.mode).to_string(),
        };
        info!(
            %method,
            amount = %request.amount,
            idempotency_key = %request.idempotency_key,
            mode = %self.mode,
            "checkout started"
        );

        let screen = match method {
            PaymentMethod::Card => Screen::CardPayment(request.clone()),
            PaymentMethod::Qr => Screen::QrPayment(request.clone()),
        };
        self.navigator.push(screen);
        Some(request)
    }

    pub fn open_transactions(&self) {
        self.navigator.push(Screen::Transactions);
    }
}
