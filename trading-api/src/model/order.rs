//! Order models.
//!
//! An `Order` may carry nested legs in `orders`: a root order submitted with
//! legs is expanded by the engine's composer into primitive orders, each still
//! carrying its attached bracket children.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown side '{0}'")]
    Side(String),
    #[error("unknown order type '{0}'")]
    OrderType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for Buy, -1 for Sell. Used in every P&L formula.
    pub fn direction(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

impl FromStr for Side {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" | "long" => Ok(Side::Buy),
            "sell" | "short" => Ok(Side::Sell),
            _ => Err(ParseError::Side(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Stop,
    Limit,
    StopLimit,
}

impl FromStr for OrderType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-'], "").as_str() {
            "market" => Ok(OrderType::Market),
            "stop" => Ok(OrderType::Stop),
            "limit" => Ok(OrderType::Limit),
            "stoplimit" => Ok(OrderType::StopLimit),
            _ => Err(ParseError::OrderType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted but not yet live (unquoted market orders, brackets waiting on a parent).
    #[default]
    Pending,
    /// Resting and evaluated on every quote.
    Placed,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// Role of a leg inside a composite order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Primary leg, becomes an independent order.
    Side,
    /// Multi-leg group container.
    Group,
    /// Bracket child, live only while its parent's position is.
    Brace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good till cancelled.
    #[default]
    Gtc,
    /// Expires on the first quote dated after the order's creation day.
    Day,
    /// Immediate or cancel: evaluated once against the current quote.
    Ioc,
}

/// An instruction to buy or sell an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    instrument: String,
    side: Side,
    #[serde(rename = "type")]
    order_type: OrderType,
    volume: f64,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    activation_price: Option<f64>,
    #[serde(default)]
    time_in_force: TimeInForce,
    #[serde(default)]
    instruction: Option<Instruction>,
    #[serde(default)]
    status: OrderStatus,
    /// Time of the quote the order was accepted against.
    #[serde(default)]
    time: Option<DateTime<Utc>>,
    /// Nested legs or attached brackets.
    #[serde(default)]
    orders: Vec<Order>,
}

impl Order {
    pub fn new(instrument: impl Into<String>, side: Side, order_type: OrderType, volume: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument: instrument.into(),
            side,
            order_type,
            volume,
            price: None,
            activation_price: None,
            time_in_force: TimeInForce::Gtc,
            instruction: None,
            status: OrderStatus::Pending,
            time: None,
            orders: Vec::new(),
        }
    }

    pub fn market(instrument: impl Into<String>, side: Side, volume: f64) -> Self {
        Self::new(instrument, side, OrderType::Market, volume)
    }

    pub fn limit(instrument: impl Into<String>, side: Side, volume: f64, price: f64) -> Self {
        Self::new(instrument, side, OrderType::Limit, volume).with_price(price)
    }

    pub fn stop(instrument: impl Into<String>, side: Side, volume: f64, price: f64) -> Self {
        Self::new(instrument, side, OrderType::Stop, volume).with_price(price)
    }

    pub fn stop_limit(
        instrument: impl Into<String>,
        side: Side,
        volume: f64,
        activation_price: f64,
        price: f64,
    ) -> Self {
        Self::new(instrument, side, OrderType::StopLimit, volume)
            .with_activation_price(activation_price)
            .with_price(price)
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_activation_price(mut self, activation_price: f64) -> Self {
        self.activation_price = Some(activation_price);
        self
    }

    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    pub fn with_instruction(mut self, instruction: Instruction) -> Self {
        self.instruction = Some(instruction);
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
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

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn activation_price(&self) -> Option<f64> {
        self.activation_price
    }

    pub fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    pub fn instruction(&self) -> Option<Instruction> {
        self.instruction
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_brace(&self) -> bool {
        self.instruction == Some(Instruction::Brace)
    }

    /// Level at which a conditional order fires.
    ///
    /// Stop orders use their activation price when one is given and fall back to `price`.
    pub fn trigger_price(&self) -> Option<f64> {
        match self.order_type {
            OrderType::Market => None,
            OrderType::Stop => self.activation_price.or(self.price),
            OrderType::StopLimit => self.activation_price,
            OrderType::Limit => self.price,
        }
    }

    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.time = Some(time);
    }

    /// Converts a triggered StopLimit into a plain Limit at `price`.
    pub fn activate(&mut self) {
        if self.order_type == OrderType::StopLimit {
            self.order_type = OrderType::Limit;
        }
    }

    /// Detaches nested legs, leaving the order primitive.
    pub fn take_orders(&mut self) -> Vec<Order> {
        std::mem::take(&mut self.orders)
    }

    pub fn push_order(&mut self, order: Order) {
        self.orders.push(order);
    }
}
