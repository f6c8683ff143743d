//! The matching engine.
//!
//! Owns one account and the latest market state for it. Orders enter through
//! `submit`, quotes through `on_point`; both return the ledger changes they
//! caused. The engine itself is synchronous and single-owner: the worker in
//! `crate::worker` serializes access to it.

pub mod transition;

use crate::composer;
use crate::models::{Account, EngineConfig, LedgerChange, LedgerSnapshot, Market};
use crate::validator::{Rejection, ValidationContext, Validator};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use trading::{Order, OrderStatus, OrderType, Point, Side, TimeInForce};
use uuid::Uuid;

/// What an accepted submission turned into.
#[derive(Debug, Clone)]
pub struct Submission {
    /// The primitive orders the submission expanded to, as composed.
    pub orders: Vec<Order>,
    pub changes: Vec<LedgerChange>,
}

impl Submission {
    /// Latest status of `id` according to the changes of this submission.
    pub fn status(&self, id: Uuid) -> OrderStatus {
        self.changes
            .iter()
            .filter_map(|change| match change {
                LedgerChange::OrderAccepted(order) | LedgerChange::OrderUpdated(order)
                    if order.id() == id =>
                {
                    Some(order.status())
                }
                LedgerChange::OrderFilled { order, .. } if order.id() == id => {
                    Some(OrderStatus::Filled)
                }
                LedgerChange::OrderCancelled(order) if order.id() == id => {
                    Some(OrderStatus::Cancelled)
                }
                _ => None,
            })
            .last()
            .unwrap_or(OrderStatus::Pending)
    }

    pub fn fill_price(&self, id: Uuid) -> Option<f64> {
        self.changes.iter().find_map(|change| match change {
            LedgerChange::OrderFilled { order, price } if order.id() == id => Some(*price),
            _ => None,
        })
    }
}

/// Buy stops fire on the ask, sell stops on the bid.
fn stop_fires(side: Side, level: f64, point: &Point) -> bool {
    match side {
        Side::Buy => point.ask >= level,
        Side::Sell => point.bid <= level,
    }
}

fn limit_fires(side: Side, price: f64, point: &Point) -> bool {
    match side {
        Side::Buy => point.bid <= price,
        Side::Sell => point.ask >= price,
    }
}

fn market_price(side: Side, point: &Point) -> f64 {
    match side {
        Side::Buy => point.ask,
        Side::Sell => point.bid,
    }
}

enum Decision {
    Hold,
    Activate,
    Fill(f64),
}

/// Stops fill at the quote that crossed them, so a gap past the level fills
/// at the worse price. Limits fill at their own price.
fn decide(order: &Order, point: &Point) -> Decision {
    let side = order.side();
    match order.order_type() {
        OrderType::Market => Decision::Fill(market_price(side, point)),
        OrderType::Stop => match order.trigger_price() {
            Some(level) if stop_fires(side, level, point) => {
                Decision::Fill(market_price(side, point))
            }
            _ => Decision::Hold,
        },
        OrderType::Limit => match order.price() {
            Some(price) if limit_fires(side, price, point) => Decision::Fill(price),
            _ => Decision::Hold,
        },
        OrderType::StopLimit => match order.activation_price() {
            Some(level) if stop_fires(side, level, point) => Decision::Activate,
            _ => Decision::Hold,
        },
    }
}

pub struct Engine {
    account: Account,
    market: Market,
    validator: Validator,
}

impl Engine {
    pub fn new(account: Account) -> Self {
        Self {
            account,
            market: Market::default(),
            validator: Validator::standard(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let account = Account::from_config(config.account(), config.instruments());
        Self::new(account).with_market(Market::new(config.series_capacity()))
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_market(mut self, market: Market) -> Self {
        self.market = market;
        self
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.account.snapshot()
    }

    /// Validates, composes and accepts an order tree.
    ///
    /// Nothing reaches the ledger unless the whole tree is valid. Market orders
    /// fill at once when their instrument has a quote; everything else rests.
    pub fn submit(&mut self, order: Order) -> Result<Submission, Rejection> {
        let ctx = ValidationContext {
            instruments: self.account.instruments(),
        };
        self.validator.validate(&order, &ctx)?;

        let orders = composer::compose(&order);
        let mut changes = Vec::new();
        for order in &orders {
            self.accept(order.clone(), &mut changes);
        }

        Ok(Submission { orders, changes })
    }

    fn accept(&mut self, mut order: Order, changes: &mut Vec<LedgerChange>) {
        let id = order.id();
        let quote = self.market.latest(order.instrument()).cloned();

        if let Some(point) = &quote {
            order.set_time(point.time);
        }
        let status = match (&quote, order.order_type()) {
            (None, OrderType::Market) => OrderStatus::Pending,
            _ => OrderStatus::Placed,
        };
        order.set_status(status);
        info!(
            "Accepted {:?} {} {} x{} ({})",
            order.order_type(),
            order.side(),
            order.instrument(),
            order.volume(),
            id
        );
        let immediate = order.order_type() == OrderType::Market
            || order.time_in_force() == TimeInForce::Ioc;
        let ioc = order.time_in_force() == TimeInForce::Ioc;
        changes.push(self.account.accept_order(order));

        match quote {
            Some(point) if immediate => self.evaluate(id, &point, changes),
            _ => {}
        }
        if ioc && self.account.order(id).is_some() {
            info!("Cancelling unfilled immediate-or-cancel order {}", id);
            changes.extend(self.account.cancel_order(id));
        }
    }

    /// Cancels an active order. Returns no changes for unknown ids.
    pub fn cancel(&mut self, id: Uuid) -> Vec<LedgerChange> {
        let changes = self.account.cancel_order(id);
        if changes.is_empty() {
            debug!("Cancel of unknown order {} ignored", id);
        } else {
            info!("Cancelled order {}", id);
        }
        changes
    }

    /// Admits one quote: expires day orders, evaluates every resting order on
    /// the instrument against it, then marks positions to market.
    pub fn on_point(&mut self, point: Point) -> Vec<LedgerChange> {
        let Some(instrument) = self.account.instrument(&point.instrument).cloned() else {
            warn!("Skipping point for unknown instrument '{}'", point.instrument);
            return Vec::new();
        };
        let point = self.market.update(&instrument, point).clone();

        let mut changes = Vec::new();
        self.expire(&point, &mut changes);

        // Orders accepted while evaluating this point wait for the next one.
        for id in self.account.order_ids(&point.instrument) {
            self.evaluate(id, &point, &mut changes);
        }

        self.account.mark(&point);
        changes
    }

    fn expire(&mut self, point: &Point, changes: &mut Vec<LedgerChange>) {
        let expired: Vec<Uuid> = self
            .account
            .active_orders()
            .filter(|order| order.instrument() == point.instrument)
            .filter(|order| order.time_in_force() == TimeInForce::Day)
            .filter(|order| {
                order
                    .time()
                    .map(|time| time.date_naive() < point.time.date_naive())
                    .unwrap_or(false)
            })
            .map(|order| order.id())
            .collect();

        for id in expired {
            info!("Day order {} expired", id);
            changes.extend(self.account.cancel_order(id));
        }

        // Day orders accepted before any quote start their day now.
        let undated: Vec<Uuid> = self
            .account
            .active_orders()
            .filter(|order| order.instrument() == point.instrument && order.time().is_none())
            .map(|order| order.id())
            .collect();
        for id in undated {
            let _ = self.account.update_order(id, |order| order.set_time(point.time));
        }
    }

    fn evaluate(&mut self, id: Uuid, point: &Point, changes: &mut Vec<LedgerChange>) {
        let Some(order) = self.account.order(id) else {
            return;
        };
        match decide(order, point) {
            Decision::Hold => {
                debug!("Order {} holds at bid {} ask {}", id, point.bid, point.ask);
            }
            Decision::Activate => {
                info!("Stop-limit order {} activated", id);
                if let Some(change) = self.account.update_order(id, |order| order.activate()) {
                    changes.push(change);
                }
            }
            Decision::Fill(price) => self.fill(id, price, point.time, changes),
        }
    }

    fn fill(&mut self, id: Uuid, price: f64, time: DateTime<Utc>, changes: &mut Vec<LedgerChange>) {
        let Some((order, children, change)) = self.account.fill_order(id, price, time) else {
            return;
        };
        info!(
            "Filled {} {} x{} @ {} ({})",
            order.side(),
            order.instrument(),
            order.volume(),
            price,
            id
        );
        changes.push(change);

        let outcome = transition::execute(&mut self.account, &order, price, time);
        changes.extend(outcome.changes);
        for released in outcome.released {
            changes.extend(self.account.cancel_order(released));
        }

        // Brackets follow the position the fill left on the order's side.
        let holder = self
            .account
            .position(order.instrument())
            .filter(|position| position.side() == order.side())
            .map(|position| position.id());

        for mut child in children {
            if holder.is_none() {
                self.account.archive_cancelled(child, changes);
                continue;
            }
            let child_id = child.id();
            child.set_status(OrderStatus::Placed);
            child.set_time(time);
            changes.push(self.account.accept_order(child));
            if let Some(change) = self
                .account
                .update_position(order.instrument(), |position| position.attach(child_id))
            {
                changes.push(change);
            }
        }
    }
}

#[cfg(test)]
mod tests;
