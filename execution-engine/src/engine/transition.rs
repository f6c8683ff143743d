//! Position transitions.
//!
//! Given a filled order and the account's current position on its instrument,
//! decides how the position changes and applies that change to the account.

use crate::models::{Account, LedgerChange};
use chrono::{DateTime, Utc};
use log::{info, warn};
use trading::{Fill, Order, Position, Side};
use uuid::Uuid;

/// Volumes closer than this are treated as equal.
pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// No position yet.
    Open,
    /// Same side as the current position.
    Increase,
    /// Opposite side, smaller than the current size.
    Decrease,
    /// Opposite side, exactly the current size.
    Close,
    /// Opposite side, larger than the current size.
    Reverse,
}

pub fn classify(current: Option<&Position>, side: Side, volume: f64) -> Transition {
    let Some(current) = current else {
        return Transition::Open;
    };
    if current.side() == side {
        return Transition::Increase;
    }
    let diff = volume - current.size();
    if diff.abs() <= EPSILON {
        Transition::Close
    } else if diff < 0.0 {
        Transition::Decrease
    } else {
        Transition::Reverse
    }
}

/// Result of applying one fill.
#[derive(Debug, Default)]
pub struct Outcome {
    pub transition: Option<Transition>,
    pub changes: Vec<LedgerChange>,
    /// Bracket orders that were attached to a position this fill closed.
    pub released: Vec<Uuid>,
}

/// Realized gain of closing `volume` of `position` at `price`, net of commission.
pub fn realized_gain(
    position: &Position,
    price: f64,
    volume: f64,
    contract_size: f64,
    commission: f64,
) -> f64 {
    (price - position.open_price()) * position.side().direction() * volume * contract_size
        - commission * volume
}

/// Classifies the fill against the current position and applies it.
pub fn execute(
    account: &mut Account,
    order: &Order,
    price: f64,
    time: DateTime<Utc>,
) -> Outcome {
    let transition = classify(
        account.position(order.instrument()),
        order.side(),
        order.volume(),
    );
    apply(account, transition, order, price, time)
}

/// Applies `transition` for a fill of `order` at `price`.
///
/// Transitions that need a current position do nothing when there is none,
/// and `Open` does nothing while one is active.
pub(crate) fn apply(
    account: &mut Account,
    transition: Transition,
    order: &Order,
    price: f64,
    time: DateTime<Utc>,
) -> Outcome {
    let instrument = order.instrument().to_string();
    let fill = Fill {
        order_id: order.id(),
        volume: order.volume(),
        price,
        time: Some(time),
    };
    let mut outcome = Outcome::default();

    if transition == Transition::Open {
        if account.position(&instrument).is_some() {
            warn!(
                "Ignoring Open of order {}: {} already has an active position",
                order.id(),
                instrument
            );
            return outcome;
        }
        info!(
            "Opening {} {} x{} @ {}",
            order.side(),
            instrument,
            order.volume(),
            price
        );
        let position = Position::open(instrument, order.side(), fill);
        outcome.changes.push(account.open_position(position));
        outcome.transition = Some(transition);
        return outcome;
    }

    let Some(current) = account.position(&instrument).cloned() else {
        warn!(
            "Ignoring {:?} of order {}: no active position on {}",
            transition,
            order.id(),
            instrument
        );
        return outcome;
    };
    let contract_size = account
        .instrument(&instrument)
        .map(|i| i.contract_size())
        .unwrap_or(1.0);
    let commission = account.commission();

    match transition {
        Transition::Open => {}
        Transition::Increase => {
            if let Some(change) = account.update_position(&instrument, |p| p.increase(fill)) {
                outcome.changes.push(change);
            }
        }
        Transition::Decrease => {
            let gain = realized_gain(&current, price, order.volume(), contract_size, commission);
            if let Some(change) =
                account.update_position(&instrument, |p| p.reduce(order.volume(), gain))
            {
                outcome.changes.push(change);
            }
            outcome.changes.push(account.credit(
                gain,
                format!("Decrease {} x{} @ {}", instrument, order.volume(), price),
                Some(time),
            ));
        }
        Transition::Close | Transition::Reverse => {
            let gain = realized_gain(&current, price, current.size(), contract_size, commission);
            if let Some((closed, change)) = account.close_position(&instrument, price, time, gain)
            {
                info!(
                    "Closed {} {} x{} @ {}: gain {:.2}",
                    closed.side(),
                    instrument,
                    closed.size(),
                    price,
                    gain
                );
                outcome.released = closed.orders().to_vec();
                outcome.changes.push(change);
            }
            outcome.changes.push(account.credit(
                gain,
                format!("Close {} x{} @ {}", instrument, current.size(), price),
                Some(time),
            ));

            if transition == Transition::Reverse {
                let remainder = order.volume() - current.size();
                info!(
                    "Reversing into {} {} x{} @ {}",
                    order.side(),
                    instrument,
                    remainder,
                    price
                );
                let position = Position::open(
                    instrument.as_str(),
                    order.side(),
                    Fill {
                        volume: remainder,
                        ..fill
                    },
                );
                outcome.changes.push(account.open_position(position));
            }
        }
    }

    outcome.transition = Some(transition);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use trading::Instrument;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_000).unwrap()
    }

    fn account() -> Account {
        Account::new("test", 25_000.0).with_instrument(Instrument::new("X"))
    }

    #[test]
    fn test_classify() {
        let position = Position::open(
            "X",
            Side::Buy,
            Fill {
                order_id: Uuid::new_v4(),
                volume: 2.0,
                price: 100.0,
                time: None,
            },
        );

        assert_eq!(classify(None, Side::Sell, 1.0), Transition::Open);
        assert_eq!(classify(Some(&position), Side::Buy, 1.0), Transition::Increase);
        assert_eq!(classify(Some(&position), Side::Sell, 1.0), Transition::Decrease);
        assert_eq!(classify(Some(&position), Side::Sell, 2.0), Transition::Close);
        assert_eq!(classify(Some(&position), Side::Sell, 3.0), Transition::Reverse);
    }

    #[test]
    fn test_decrease_keeps_open_price() {
        let mut account = account();
        execute(&mut account, &Order::market("X", Side::Sell, 3.0), 50.0, now());
        let outcome = execute(&mut account, &Order::market("X", Side::Buy, 1.0), 45.0, now());

        assert_eq!(outcome.transition, Some(Transition::Decrease));
        let position = account.position("X").unwrap();
        assert_eq!(position.size(), 2.0);
        assert_eq!(position.open_price(), 50.0);
        // Short gains when price falls.
        assert_eq!(account.balance(), 25_005.0);
        assert!(account.position_history().is_empty());
    }

    #[test]
    fn test_history_gain_matches_balance_after_reductions() {
        let mut account = account();
        execute(&mut account, &Order::market("X", Side::Buy, 2.0), 100.0, now());
        execute(&mut account, &Order::market("X", Side::Sell, 1.0), 110.0, now());
        execute(&mut account, &Order::market("X", Side::Sell, 1.0), 120.0, now());

        assert_eq!(account.balance(), 25_030.0);
        assert_eq!(account.position_history()[0].gain(), 30.0);
    }

    #[test]
    fn test_commission_per_closed_unit() {
        let mut account = account().with_commission(0.25);
        execute(&mut account, &Order::market("X", Side::Buy, 4.0), 10.0, now());
        execute(&mut account, &Order::market("X", Side::Sell, 4.0), 11.0, now());

        assert!((account.balance() - (25_000.0 + 4.0 - 1.0)).abs() < 1e-9);
        assert_eq!(account.position_history()[0].gain(), 3.0);
    }

    #[test]
    fn test_missing_position_is_a_no_op() {
        let mut account = account();
        let order = Order::market("X", Side::Sell, 1.0);

        for transition in [Transition::Decrease, Transition::Close, Transition::Reverse] {
            let outcome = apply(&mut account, transition, &order, 100.0, now());
            assert!(outcome.changes.is_empty());
            assert!(outcome.transition.is_none());
        }
        assert_eq!(account.balance(), 25_000.0);
        assert!(account.position("X").is_none());
    }

    #[test]
    fn test_open_never_replaces_active_position() {
        let mut account = account();
        execute(&mut account, &Order::market("X", Side::Buy, 2.0), 100.0, now());

        let order = Order::market("X", Side::Sell, 1.0);
        let outcome = apply(&mut account, Transition::Open, &order, 90.0, now());

        assert!(outcome.transition.is_none());
        assert!(outcome.changes.is_empty());
        let position = account.position("X").unwrap();
        assert_eq!(position.side(), Side::Buy);
        assert_eq!(position.size(), 2.0);
    }

    #[test]
    fn test_close_releases_brackets() {
        let mut account = account();
        execute(&mut account, &Order::market("X", Side::Buy, 1.0), 100.0, now());
        let bracket = Uuid::new_v4();
        account.update_position("X", |p| p.attach(bracket));

        let outcome = execute(&mut account, &Order::market("X", Side::Sell, 1.0), 101.0, now());

        assert_eq!(outcome.transition, Some(Transition::Close));
        assert_eq!(outcome.released, vec![bracket]);
    }
}
