//! Position models.

use super::order::Side;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One execution contributing to a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: Uuid,
    pub volume: f64,
    pub price: f64,
    pub time: Option<DateTime<Utc>>,
}

/// An account's open exposure to one instrument.
///
/// `size` is always positive while the position is active; the direction lives in `side`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    id: Uuid,
    instrument: String,
    side: Side,
    size: f64,
    /// Volume-weighted entry price of the open portion.
    open_price: f64,
    open_time: Option<DateTime<Utc>>,
    fills: Vec<Fill>,
    close_price: Option<f64>,
    close_time: Option<DateTime<Utc>>,
    /// Realized gain once closed, mark-to-market gain while active.
    gain: f64,
    /// Gain realized by partial reductions so far.
    #[serde(default)]
    realized: f64,
    gain_points: f64,
    /// Bracket orders attached to this position.
    orders: Vec<Uuid>,
}

impl Position {
    pub fn open(instrument: impl Into<String>, side: Side, fill: Fill) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument: instrument.into(),
            side,
            size: fill.volume,
            open_price: fill.price,
            open_time: fill.time,
            fills: vec![fill],
            close_price: None,
            close_time: None,
            gain: 0.0,
            realized: 0.0,
            gain_points: 0.0,
            orders: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn open_price(&self) -> f64 {
        self.open_price
    }

    pub fn open_time(&self) -> Option<DateTime<Utc>> {
        self.open_time
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn close_price(&self) -> Option<f64> {
        self.close_price
    }

    pub fn close_time(&self) -> Option<DateTime<Utc>> {
        self.close_time
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn realized(&self) -> f64 {
        self.realized
    }

    pub fn gain_points(&self) -> f64 {
        self.gain_points
    }

    pub fn orders(&self) -> &[Uuid] {
        &self.orders
    }

    /// Signed exposure: positive when long, negative when short.
    pub fn signed_size(&self) -> f64 {
        self.size * self.side.direction()
    }

    /// Adds a same-side fill and re-weights the open price.
    pub fn increase(&mut self, fill: Fill) {
        let size = self.size + fill.volume;
        self.open_price = (self.size * self.open_price + fill.volume * fill.price) / size;
        self.size = size;
        self.fills.push(fill);
    }

    /// Removes volume from the open portion and books its realized `gain`.
    /// The open price is unchanged.
    pub fn reduce(&mut self, volume: f64, gain: f64) {
        self.size -= volume;
        self.realized += gain;
    }

    /// Marks the position closed at `price`. `gain` is the final slice; the
    /// stored gain also includes what earlier reductions realized.
    pub fn close(&mut self, price: f64, time: Option<DateTime<Utc>>, gain: f64) {
        self.gain_points = (price - self.open_price) * self.side.direction();
        self.realized += gain;
        self.gain = self.realized;
        self.close_price = Some(price);
        self.close_time = time;
    }

    /// Updates the unrealized gain against a closing price.
    pub fn mark(&mut self, price: f64, contract_size: f64) {
        self.gain_points = (price - self.open_price) * self.side.direction();
        self.gain = self.gain_points * self.size * contract_size;
    }

    pub fn attach(&mut self, order_id: Uuid) {
        if !self.orders.contains(&order_id) {
            self.orders.push(order_id);
        }
    }

    pub fn detach(&mut self, order_id: Uuid) {
        self.orders.retain(|id| *id != order_id);
    }

    /// Detaches every bracket order, returning their ids.
    pub fn take_orders(&mut self) -> Vec<Uuid> {
        std::mem::take(&mut self.orders)
    }
}
