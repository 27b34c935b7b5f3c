use thiserror::Error;

/// User-facing text a flow falls back to when an error carries no message of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureText {
    /// Shown when the server rejected the request without a message.
    pub declined: &'static str,
    /// Shown when the request never produced a usable response.
    pub network: &'static str,
}

pub const QR_EXPIRED_MESSAGE: &str = "QR code expired. The customer did not scan in time.";

#[derive(Error, Debug)]
pub enum PosError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("API error ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },
    #[error("QR session expired")]
    Expired,
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(&'static str),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<reqwest::Error> for PosError {
    fn from(err: reqwest::Error) -> Self {
        PosError::Transport(err.to_string())
    }
}

impl PosError {
    /// Maps the error onto the message shown on the failure screen.
    ///
    /// Server messages pass through verbatim; anything that never reached a
    /// well-formed response collapses into the flow's generic network text.
    pub fn user_message(&self, text: &FailureText) -> String {
        match self {
            PosError::Api {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            PosError::Api { .. } => text.declined.to_string(),
            PosError::Transport(_) | PosError::Json(_) | PosError::Io(_) => {
                text.network.to_string()
            }
            PosError::Expired => QR_EXPIRED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PosError::Transport(_) | PosError::Json(_) | PosError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PosError>;

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: FailureText = FailureText {
        declined: "Card was declined.",
        network: "Network Error. Please try again.",
    };

    #[test]
    fn test_api_message_passes_through() {
        let err = PosError::Api {
            status: 402,
            message: Some("Card declined".to_string()),
        };
        assert_eq!(err.user_message(&TEXT), "Card declined");
    }

    #[test]
    fn test_api_without_message_uses_fallback() {
        let err = PosError::Api {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(&TEXT), "Card was declined.");

        let empty = PosError::Api {
            status: 400,
            message: Some(String::new()),
        };
        assert_eq!(empty.user_message(&TEXT), "Card was declined.");
    }

    #[test]
    fn test_transport_maps_to_network_text() {
        let err = PosError::Transport("connection refused".to_string());
        assert!(err.is_transport());
        assert_eq!(err.user_message(&TEXT), "Network Error. Please try again.");
    }

    #[test]
    fn test_expired_message() {
        assert_eq!(PosError::Expired.user_message(&TEXT), QR_EXPIRED_MESSAGE);
    }
}
