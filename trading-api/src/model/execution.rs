use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an order as acknowledged by a broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Order has been accepted and is waiting for a quote or trigger.
    Pending,
    /// Order has been fully filled.
    Filled,
    /// Order has been cancelled.
    Cancelled,
    /// Order has been rejected by the broker or exchange.
    Rejected,
}

/// Acknowledgement of an order, normalized from whatever the broker sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// The ID of the order this report corresponds to.
    pub order_id: Uuid,
    pub instrument: String,
    /// The current status of the order.
    pub status: ExecutionStatus,
    /// The quantity filled in this report.
    pub filled_volume: f64,
    /// The price at which the fill occurred.
    pub filled_price: f64,
    pub time: Option<DateTime<Utc>>,
    /// Optional rejection reason or message.
    pub message: Option<String>,
}

impl ExecutionResult {
    pub fn new(order_id: Uuid, instrument: impl Into<String>, status: ExecutionStatus) -> Self {
        Self {
            order_id,
            instrument: instrument.into(),
            status,
            filled_volume: 0.0,
            filled_price: 0.0,
            time: None,
            message: None,
        }
    }

    pub fn with_fill(mut self, volume: f64, price: f64, time: Option<DateTime<Utc>>) -> Self {
        self.filled_volume = volume;
        self.filled_price = price;
        self.time = time;
        self
    }

    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }
}
