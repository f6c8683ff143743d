//! Defines the data model for tradable instruments.
//!
//! Instruments are keyed by name inside an account. Everything the engine needs
//! for P&L arithmetic and quote aggregation lives here.

use serde::{Deserialize, Serialize};

fn default_contract_size() -> f64 {
    1.0
}

fn default_leverage() -> f64 {
    1.0
}

/// A tradable instrument as known to an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Unique key within an account (e.g. "AAPL", "ESZ5").
    name: String,

    /// Multiplier applied to price differences when realizing P&L.
    #[serde(default = "default_contract_size")]
    contract_size: f64,

    /// Minimum price increment.
    #[serde(default)]
    step_size: f64,

    /// Monetary value of one `step_size` move.
    #[serde(default)]
    step_value: f64,

    /// Aggregation bucket for incoming points, in milliseconds. Zero keeps every tick.
    #[serde(default)]
    time_frame_ms: i64,

    #[serde(default = "default_leverage")]
    leverage: f64,
}

impl Instrument {
    /// Creates an instrument with a contract size of one and tick-level aggregation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contract_size: 1.0,
            step_size: 0.0,
            step_value: 0.0,
            time_frame_ms: 0,
            leverage: 1.0,
        }
    }

    pub fn with_contract_size(mut self, contract_size: f64) -> Self {
        self.contract_size = contract_size;
        self
    }

    pub fn with_step(mut self, step_size: f64, step_value: f64) -> Self {
        self.step_size = step_size;
        self.step_value = step_value;
        self
    }

    pub fn with_time_frame_ms(mut self, time_frame_ms: i64) -> Self {
        self.time_frame_ms = time_frame_ms;
        self
    }

    pub fn with_leverage(mut self, leverage: f64) -> Self {
        self.leverage = leverage;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contract_size(&self) -> f64 {
        self.contract_size
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn step_value(&self) -> f64 {
        self.step_value
    }

    pub fn time_frame_ms(&self) -> i64 {
        self.time_frame_ms
    }

    pub fn leverage(&self) -> f64 {
        self.leverage
    }
}
