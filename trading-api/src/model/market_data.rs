//! Market Data models.
//!
//! A `Point` is one timestamped top-of-book quote for an instrument, optionally
//! carrying the bar it was aggregated into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open/high/low/close aggregate of the points that fell into one time-frame bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// Starts a bar at a single price.
    pub fn new(price: f64) -> Self {
        Self {
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    /// Extends the bar with a later price.
    pub fn update(&mut self, price: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }
}

/// A single quote update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Name of the instrument this quote belongs to.
    pub instrument: String,
    pub time: DateTime<Utc>,
    /// The best bid price.
    pub bid: f64,
    /// The best ask price.
    pub ask: f64,
    #[serde(default)]
    pub bid_size: f64,
    #[serde(default)]
    pub ask_size: f64,
    /// The last traded price. Quote-only feeds use the mid.
    pub last: f64,
    #[serde(default)]
    pub bar: Option<Bar>,
}

impl Point {
    /// Creates a quote with `last` set to the mid price.
    pub fn new(instrument: impl Into<String>, time: DateTime<Utc>, bid: f64, ask: f64) -> Self {
        Self {
            instrument: instrument.into(),
            time,
            bid,
            ask,
            bid_size: 0.0,
            ask_size: 0.0,
            last: (bid + ask) / 2.0,
            bar: None,
        }
    }

    pub fn with_sizes(mut self, bid_size: f64, ask_size: f64) -> Self {
        self.bid_size = bid_size;
        self.ask_size = ask_size;
        self
    }

    pub fn with_last(mut self, last: f64) -> Self {
        self.last = last;
        self
    }

    pub fn mid(&self) -> f64 {
        (self.bid + self.ask) / 2.0
    }
}
