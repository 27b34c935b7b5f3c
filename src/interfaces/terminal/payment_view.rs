use crate::application::card_flow::CardStep;
use crate::application::qr_session::{QrPaymentSession, QrPhase};
use crate::domain::amount::format_money;
use crate::domain::simulation::SimulationMode;

pub fn render_card_step(step: CardStep) -> String {
    format!("{}  {}", step.label(), step.subtitle())
}

pub fn render_mode(mode: SimulationMode) -> String {
    format!("Simulation: {} ({})", mode.label(), mode.token())
}

/// Lines for the QR screen in its current phase.
pub fn render_qr(session: &QrPaymentSession) -> Vec<String> {
    let mut lines = vec![format!("QR Payment  {}", format_money(session.request().amount))];
    match session.phase() {
        QrPhase::Loading => {
            lines.push("Generating QR Code...".to_string());
            lines.push("Connecting to payment server".to_string());
        }
        QrPhase::Ready { .. } if !session.is_live() => {
            lines.push("QR code expired".to_string());
        }
        QrPhase::Ready { qr_payload, .. } => {
            lines.push("Ask the customer to scan".to_string());
            lines.push(format!("Payload: {qr_payload}"));
            if let Some(url) = session.qr_image_url() {
                lines.push(format!("Image:   {url}"));
            }
            if let Some(left) = session.expires_in() {
                lines.push(format!("Expires in {}s", left.as_secs()));
            }
        }
        QrPhase::Polling { .. } => {
            lines.push("Payment Received".to_string());
            lines.push("Verifying with bank - please wait".to_string());
        }
        QrPhase::Closed => lines.push("Session closed".to_string()),
    }
    lines
}
