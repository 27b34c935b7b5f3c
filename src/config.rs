//! Terminal configuration.
//!
//! A `TerminalConfig` is built once at startup (defaults, then an optional JSON
//! file, then command-line overrides) and handed to every component that needs
//! it. Nothing reads configuration from globals.

use crate::error::{PosError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MACHINE_ID: &str = "6999d50e627457ce359566dc";
pub const DEFAULT_API_URL: &str = "http://192.168.1.198:5000/api";
pub const DEFAULT_QR_IMAGE_SERVICE: &str = "https://api.qrserver.com/v1/create-qr-code/";
/// Upper bound for every duration setting: one day.
pub const MAX_DURATION_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Identifier of this terminal as known to the payment API.
    pub machine_id: String,
    /// Base URL of the payment API, without a trailing slash.
    pub api_url: String,
    pub currency: String,
    /// How long a generated QR code stays valid.
    pub qr_session_timeout_ms: u64,
    /// Carried for compatibility with existing config files; no polling loop reads it.
    pub poll_interval_ms: u64,
    /// Simulated card-read latency between "reading" and "processing".
    pub card_read_dwell_ms: u64,
    pub request_timeout_ms: u64,
    /// Requested pixel size of the rendered QR image.
    pub qr_image_size: u32,
    pub qr_image_service: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            machine_id: DEFAULT_MACHINE_ID.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            currency: "GBP".to_string(),
            qr_session_timeout_ms: 2 * 60 * 1000,
            poll_interval_ms: 3000,
            card_read_dwell_ms: 1200,
            request_timeout_ms: 10_000,
            qr_image_size: 280,
            qr_image_service: DEFAULT_QR_IMAGE_SERVICE.to_string(),
        }
    }
}

impl TerminalConfig {
    /// Loads a config file; fields missing from the file keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()
    }

    pub fn validate(mut self) -> Result<Self> {
        self.api_url = self.api_url.trim_end_matches('/').to_string();
        if self.api_url.is_empty() {
            return Err(PosError::Config("api_url must not be empty".to_string()));
        }
        if self.machine_id.is_empty() {
            return Err(PosError::Config("machine_id must not be empty".to_string()));
        }
        if self.qr_session_timeout_ms == 0 {
            return Err(PosError::Config(
                "qr_session_timeout_ms must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("qr_session_timeout_ms", self.qr_session_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
            ("card_read_dwell_ms", self.card_read_dwell_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value > MAX_DURATION_MS {
                return Err(PosError::Config(format!(
                    "{name} must be at most {MAX_DURATION_MS}"
                )));
            }
        }
        Ok(self)
    }

    pub fn qr_session_timeout(&self) -> Duration {
        Duration::from_millis(self.qr_session_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn card_read_dwell(&self) -> Duration {
        Duration::from_millis(self.card_read_dwell_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
