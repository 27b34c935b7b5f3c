use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PosError;

/// Operator toggle that asks the backend for a predetermined outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    #[default]
    Success,
    Fail,
}

impl SimulationMode {
    pub fn token(self) -> &'static str {
        match self {
            SimulationMode::Success => "success_token",
            SimulationMode::Fail => "fail_token",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SimulationMode::Success => "Valid",
            SimulationMode::Fail => "Invalid",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            SimulationMode::Success => "checkmark-circle",
            SimulationMode::Fail => "close-circle",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            SimulationMode::Success => "#10B981",
            SimulationMode::Fail => "#F43F5E",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SimulationMode::Success => SimulationMode::Fail,
            SimulationMode::Fail => SimulationMode::Success,
        }
    }

    pub fn toggle(&mut self) {
        *self = self.next();
    }
}

impl fmt::Display for SimulationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SimulationMode {
    type Err = PosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" | "valid" => Ok(SimulationMode::Success),
            "fail" | "invalid" => Ok(SimulationMode::Fail),
            other => Err(PosError::Config(format!("unknown simulation mode {other:?}"))),
        }
    }
}

/// Maps the simulation mode onto the sentinel token the backend understands.
pub fn resolve_token(mode: SimulationMode) -> &'static str {
    mode.token()
}

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a fresh idempotency key of the form `pos_<epoch millis>_<suffix>`.
///
/// Collisions are unlikely but not impossible; duplicate detection is the
/// backend's job.
pub fn new_idempotency_key() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("pos_{}_{}", Utc::now().timestamp_millis(), suffix)
}
