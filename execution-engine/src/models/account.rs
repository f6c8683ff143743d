//! The account ledger.
//!
//! Every mutation goes through a method that returns the `LedgerChange` it
//! caused, so the owning worker can publish exactly what happened. Readers
//! outside the worker only ever see a `LedgerSnapshot`.

use super::config::AccountConfig;
use super::ledger::{Journal, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use trading::{Instrument, Order, OrderStatus, Point, Position, Side};
use uuid::Uuid;

/// Describes one mutation of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerChange {
    OrderAccepted(Order),
    /// Status or type changed while the order stays active.
    OrderUpdated(Order),
    OrderFilled { order: Order, price: f64 },
    OrderCancelled(Order),
    PositionOpened(Position),
    PositionUpdated(Position),
    PositionClosed(Position),
    BalanceChanged(Transaction),
}

/// Read-only copy of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub account: String,
    pub balance: f64,
    pub initial_balance: f64,
    /// Balance plus unrealized gain of the active positions.
    pub equity: f64,
    /// In submission order.
    pub active_orders: Vec<Order>,
    /// Sorted by instrument name.
    pub active_positions: Vec<Position>,
    pub order_history: Vec<Order>,
    pub position_history: Vec<Position>,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone)]
pub struct Account {
    name: String,
    balance: f64,
    initial_balance: f64,
    commission: f64,
    instruments: HashMap<String, Instrument>,
    active_orders: HashMap<Uuid, Order>,
    /// Ids of `active_orders` in acceptance order.
    sequence: Vec<Uuid>,
    active_positions: HashMap<String, Position>,
    order_history: Vec<Order>,
    position_history: Vec<Position>,
    journal: Journal,
}

impl Account {
    pub fn new(name: impl Into<String>, balance: f64) -> Self {
        Self {
            name: name.into(),
            balance,
            initial_balance: balance,
            commission: 0.0,
            instruments: HashMap::new(),
            active_orders: HashMap::new(),
            sequence: Vec::new(),
            active_positions: HashMap::new(),
            order_history: Vec::new(),
            position_history: Vec::new(),
            journal: Journal::default(),
        }
    }

    pub fn from_config(config: &AccountConfig, instruments: &[Instrument]) -> Self {
        let mut account =
            Self::new(config.name(), config.balance()).with_commission(config.commission());
        for instrument in instruments {
            account.add_instrument(instrument.clone());
        }
        account
    }

    pub fn with_commission(mut self, commission: f64) -> Self {
        self.commission = commission;
        self
    }

    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.add_instrument(instrument);
        self
    }

    pub fn add_instrument(&mut self, instrument: Instrument) {
        self.instruments
            .insert(instrument.name().to_string(), instrument);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn initial_balance(&self) -> f64 {
        self.initial_balance
    }

    pub fn commission(&self) -> f64 {
        self.commission
    }

    pub fn instruments(&self) -> &HashMap<String, Instrument> {
        &self.instruments
    }

    pub fn instrument(&self, name: &str) -> Option<&Instrument> {
        self.instruments.get(name)
    }

    pub fn order(&self, id: Uuid) -> Option<&Order> {
        self.active_orders.get(&id)
    }

    /// Active orders in acceptance order.
    pub fn active_orders(&self) -> impl Iterator<Item = &Order> {
        self.sequence
            .iter()
            .filter_map(|id| self.active_orders.get(id))
    }

    /// Ids of active orders on `instrument`, in acceptance order.
    pub fn order_ids(&self, instrument: &str) -> Vec<Uuid> {
        self.active_orders()
            .filter(|order| order.instrument() == instrument)
            .map(|order| order.id())
            .collect()
    }

    pub fn position(&self, instrument: &str) -> Option<&Position> {
        self.active_positions.get(instrument)
    }

    pub fn active_positions(&self) -> impl Iterator<Item = &Position> {
        self.active_positions.values()
    }

    pub fn order_history(&self) -> &[Order] {
        &self.order_history
    }

    pub fn position_history(&self) -> &[Position] {
        &self.position_history
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.journal.transactions()
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn unrealized(&self) -> f64 {
        self.active_positions.values().map(|p| p.gain()).sum()
    }

    pub fn equity(&self) -> f64 {
        self.balance + self.unrealized()
    }

    // --- Orders ---

    pub fn accept_order(&mut self, order: Order) -> LedgerChange {
        let id = order.id();
        if self.active_orders.insert(id, order.clone()).is_none() {
            self.sequence.push(id);
        }
        LedgerChange::OrderAccepted(order)
    }

    /// Applies `update` to an active order.
    pub fn update_order<F>(&mut self, id: Uuid, update: F) -> Option<LedgerChange>
    where
        F: FnOnce(&mut Order),
    {
        let order = self.active_orders.get_mut(&id)?;
        update(order);
        Some(LedgerChange::OrderUpdated(order.clone()))
    }

    fn remove_order(&mut self, id: Uuid) -> Option<Order> {
        let order = self.active_orders.remove(&id)?;
        self.sequence.retain(|other| *other != id);
        Some(order)
    }

    /// Moves an active order to history as filled.
    ///
    /// Returns the filled order, its detached bracket children and the change.
    pub fn fill_order(
        &mut self,
        id: Uuid,
        price: f64,
        time: DateTime<Utc>,
    ) -> Option<(Order, Vec<Order>, LedgerChange)> {
        let mut order = self.remove_order(id)?;
        for position in self.active_positions.values_mut() {
            position.detach(id);
        }
        let children = order.take_orders();
        order.set_status(OrderStatus::Filled);
        order.set_time(time);
        self.order_history.push(order.clone());

        let change = LedgerChange::OrderFilled {
            order: order.clone(),
            price,
        };
        Some((order, children, change))
    }

    /// Cancels an active order and every bracket child it still carries.
    ///
    /// Returns no changes when `id` is not active.
    pub fn cancel_order(&mut self, id: Uuid) -> Vec<LedgerChange> {
        let Some(order) = self.remove_order(id) else {
            return Vec::new();
        };
        for position in self.active_positions.values_mut() {
            position.detach(id);
        }

        let mut changes = Vec::new();
        self.archive_cancelled(order, &mut changes);
        changes
    }

    /// Archives `order` and its nested children as cancelled.
    pub fn archive_cancelled(&mut self, mut order: Order, changes: &mut Vec<LedgerChange>) {
        let children = order.take_orders();
        order.set_status(OrderStatus::Cancelled);
        self.order_history.push(order.clone());
        changes.push(LedgerChange::OrderCancelled(order));

        for child in children {
            self.archive_cancelled(child, changes);
        }
    }

    // --- Positions ---

    pub fn open_position(&mut self, position: Position) -> LedgerChange {
        self.active_positions
            .insert(position.instrument().to_string(), position.clone());
        LedgerChange::PositionOpened(position)
    }

    pub fn update_position<F>(&mut self, instrument: &str, update: F) -> Option<LedgerChange>
    where
        F: FnOnce(&mut Position),
    {
        let position = self.active_positions.get_mut(instrument)?;
        update(position);
        Some(LedgerChange::PositionUpdated(position.clone()))
    }

    /// Moves the active position on `instrument` to history.
    pub fn close_position(
        &mut self,
        instrument: &str,
        price: f64,
        time: DateTime<Utc>,
        gain: f64,
    ) -> Option<(Position, LedgerChange)> {
        let mut position = self.active_positions.remove(instrument)?;
        position.close(price, Some(time), gain);
        self.position_history.push(position.clone());
        let change = LedgerChange::PositionClosed(position.clone());
        Some((position, change))
    }

    /// Marks active positions on the point's instrument to market.
    ///
    /// Longs close at the bid, shorts at the ask.
    pub fn mark(&mut self, point: &Point) {
        let Some(contract_size) = self
            .instruments
            .get(&point.instrument)
            .map(|i| i.contract_size())
        else {
            return;
        };
        if let Some(position) = self.active_positions.get_mut(&point.instrument) {
            let price = match position.side() {
                Side::Buy => point.bid,
                Side::Sell => point.ask,
            };
            position.mark(price, contract_size);
        }
    }

    // --- Balance ---

    pub fn credit(
        &mut self,
        amount: f64,
        description: impl Into<String>,
        time: Option<DateTime<Utc>>,
    ) -> LedgerChange {
        self.balance += amount;
        let transaction = Transaction::new(description, amount, self.balance, time);
        self.journal.record(transaction.clone());
        LedgerChange::BalanceChanged(transaction)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut active_positions: Vec<Position> =
            self.active_positions.values().cloned().collect();
        active_positions.sort_by(|a, b| a.instrument().cmp(b.instrument()));

        LedgerSnapshot {
            account: self.name.clone(),
            balance: self.balance,
            initial_balance: self.initial_balance,
            equity: self.equity(),
            active_orders: self.active_orders().cloned().collect(),
            active_positions,
            order_history: self.order_history.clone(),
            position_history: self.position_history.clone(),
            transactions: self.journal.transactions().to_vec(),
        }
    }
}
