use super::*;
use crate::validator::ViolationKind;
use chrono::{Duration, TimeZone};
use trading::{Instruction, Instrument};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap()
}

fn create_test_engine() -> Engine {
    let account = Account::new("test", 25_000.0).with_instrument(Instrument::new("X"));
    Engine::new(account)
}

fn quote(engine: &mut Engine, seconds: i64, bid: f64, ask: f64) -> Vec<LedgerChange> {
    let time = start() + Duration::seconds(seconds);
    engine.on_point(Point::new("X", time, bid, ask))
}

fn close_to(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

#[test]
fn test_signed_fills_match_position() {
    let mut engine = create_test_engine();
    quote(&mut engine, 0, 100.0, 101.0);

    let fills = [
        (Side::Buy, 2.0),
        (Side::Sell, 1.0),
        (Side::Sell, 3.0),
        (Side::Buy, 1.5),
        (Side::Sell, 0.25),
    ];
    let mut signed = 0.0;
    for (side, volume) in fills {
        engine.submit(Order::market("X", side, volume)).unwrap();
        signed += side.direction() * volume;

        let held = engine
            .account()
            .position("X")
            .map(|p| p.signed_size())
            .unwrap_or(0.0);
        assert!(close_to(held, signed), "Held {} but fills sum to {}", held, signed);
    }

    // Flatten completely.
    engine.submit(Order::market("X", Side::Buy, 0.75)).unwrap();
    assert!(engine.account().position("X").is_none());
}

#[test]
fn test_weighted_open_price() {
    let mut engine = create_test_engine();
    let legs = [(1.0, 100.0), (2.0, 102.0), (1.0, 110.0)];

    for (i, (volume, ask)) in legs.iter().enumerate() {
        quote(&mut engine, i as i64, ask - 1.0, *ask);
        engine.submit(Order::market("X", Side::Buy, *volume)).unwrap();
    }

    let expected = legs.iter().map(|(v, p)| v * p).sum::<f64>()
        / legs.iter().map(|(v, _)| v).sum::<f64>();
    let position = engine.account().position("X").unwrap();
    assert!(
        close_to(position.open_price(), expected),
        "Expected {}, got {}",
        expected,
        position.open_price()
    );
    assert_eq!(position.size(), 4.0);
    assert_eq!(position.fills().len(), 3);
}

#[test]
fn test_close_realizes_gain() {
    let account = Account::new("test", 25_000.0)
        .with_commission(0.5)
        .with_instrument(Instrument::new("X"));
    let mut engine = Engine::new(account);

    quote(&mut engine, 0, 99.0, 100.0);
    engine.submit(Order::market("X", Side::Buy, 2.0)).unwrap();
    quote(&mut engine, 1, 109.0, 110.0);
    engine.submit(Order::market("X", Side::Sell, 2.0)).unwrap();

    let realized = (109.0 - 100.0) * 1.0 * 2.0 - 0.5 * 2.0;
    assert!(close_to(engine.account().balance(), 25_000.0 + realized));
    assert!(engine.account().position("X").is_none());

    let closed = &engine.account().position_history()[0];
    assert_eq!(closed.close_price(), Some(109.0));
    assert_eq!(closed.gain(), realized);
    assert_eq!(engine.account().transactions().len(), 1);
}

#[test]
fn test_reversal_opens_remainder() {
    let mut engine = create_test_engine();
    quote(&mut engine, 0, 99.0, 100.0);
    engine.submit(Order::market("X", Side::Buy, 1.0)).unwrap();
    quote(&mut engine, 1, 95.0, 96.0);
    engine.submit(Order::market("X", Side::Sell, 3.0)).unwrap();

    let position = engine.account().position("X").unwrap();
    assert_eq!(position.side(), Side::Sell);
    assert_eq!(position.size(), 2.0);
    assert_eq!(position.open_price(), 95.0);

    let history = engine.account().position_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].side(), Side::Buy);
    assert_eq!(history[0].gain(), -5.0);
    assert_eq!(engine.account().balance(), 24_995.0);
}

#[test]
fn test_round_trip_scenario() {
    let mut engine = create_test_engine();

    quote(&mut engine, 0, 99.5, 100.0);
    let submission = engine.submit(Order::market("X", Side::Buy, 1.0)).unwrap();
    let id = submission.orders[0].id();
    assert_eq!(submission.status(id), OrderStatus::Filled);
    assert_eq!(submission.fill_price(id), Some(100.0));

    let position = engine.account().position("X").unwrap();
    assert_eq!(position.side(), Side::Buy);
    assert_eq!(position.size(), 1.0);
    assert_eq!(position.open_price(), 100.0);
    assert_eq!(engine.account().balance(), 25_000.0);

    quote(&mut engine, 1, 105.0, 105.5);
    engine.submit(Order::market("X", Side::Sell, 1.0)).unwrap();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.balance, 25_005.0);
    assert!(snapshot.active_positions.is_empty());
    assert_eq!(snapshot.position_history[0].gain(), 5.0);
    assert_eq!(snapshot.order_history.len(), 2);
}

#[test]
fn test_buy_stop_triggers_at_level() {
    let mut engine = create_test_engine();
    let stop = Order::stop("X", Side::Buy, 1.0, 110.0);
    let id = stop.id();
    engine.submit(stop).unwrap();

    quote(&mut engine, 0, 109.5, 109.99);
    assert!(engine.account().order(id).is_some(), "Stop fired below its level");
    assert!(engine.account().position("X").is_none());

    let changes = quote(&mut engine, 1, 109.5, 110.0);
    assert!(engine.account().order(id).is_none());
    assert!(changes
        .iter()
        .any(|c| matches!(c, LedgerChange::OrderFilled { order, price } if order.id() == id && *price == 110.0)));
    assert_eq!(engine.account().position("X").unwrap().open_price(), 110.0);
}

#[test]
fn test_stop_fills_at_gapped_quote() {
    let mut engine = create_test_engine();
    let stop = Order::stop("X", Side::Buy, 1.0, 110.0);
    let id = stop.id();
    engine.submit(stop).unwrap();

    quote(&mut engine, 0, 105.0, 106.0);
    let changes = quote(&mut engine, 1, 119.5, 120.0);

    assert!(changes
        .iter()
        .any(|c| matches!(c, LedgerChange::OrderFilled { order, price } if order.id() == id && *price == 120.0)));
    assert_eq!(engine.account().position("X").unwrap().open_price(), 120.0);
}

#[test]
fn test_invalid_submission_never_reaches_ledger() {
    let mut engine = create_test_engine();
    quote(&mut engine, 0, 99.0, 100.0);

    let root = Order::market("X", Side::Buy, 0.0)
        .with_instruction(Instruction::Group)
        .with_order(Order::market("X", Side::Buy, 0.0))
        .with_order(Order::new("X", Side::Sell, OrderType::Stop, 1.0));

    let rejection = engine.submit(root).unwrap_err();

    assert_eq!(rejection.len(), 2);
    let kinds: Vec<_> = rejection.violations().iter().map(|v| v.kind.clone()).collect();
    assert!(kinds.contains(&ViolationKind::NonPositiveVolume(0.0)));
    assert!(kinds.contains(&ViolationKind::MissingActivationPrice(OrderType::Stop)));

    let snapshot = engine.snapshot();
    assert!(snapshot.active_orders.is_empty());
    assert!(snapshot.order_history.is_empty());
    assert!(snapshot.active_positions.is_empty());
}

#[test]
fn test_unknown_instrument_rejected() {
    let mut engine = create_test_engine();
    let rejection = engine
        .submit(Order::market("NOPE", Side::Buy, 1.0))
        .unwrap_err();
    assert_eq!(
        rejection.violations()[0].kind,
        ViolationKind::UnknownInstrument("NOPE".into())
    );
}

#[test]
fn test_limit_orders_trigger() {
    let mut engine = create_test_engine();
    let buy = Order::limit("X", Side::Buy, 1.0, 95.0);
    let sell = Order::limit("X", Side::Sell, 1.0, 105.0);
    let (buy_id, sell_id) = (buy.id(), sell.id());
    engine.submit(buy).unwrap();
    engine.submit(sell).unwrap();

    quote(&mut engine, 0, 96.0, 97.0);
    assert!(engine.account().order(buy_id).is_some());

    quote(&mut engine, 1, 95.0, 96.0);
    assert!(engine.account().order(buy_id).is_none());
    assert_eq!(engine.account().position("X").unwrap().open_price(), 95.0);

    quote(&mut engine, 2, 104.0, 105.0);
    assert!(engine.account().order(sell_id).is_none());
    assert!(engine.account().position("X").is_none());
    assert_eq!(engine.account().balance(), 25_010.0);
}

#[test]
fn test_stop_limit_activates_then_fills() {
    let mut engine = create_test_engine();
    let order = Order::stop_limit("X", Side::Sell, 1.0, 95.0, 96.0);
    let id = order.id();
    engine.submit(order).unwrap();

    let changes = quote(&mut engine, 0, 95.0, 95.5);
    assert_eq!(engine.account().order(id).unwrap().order_type(), OrderType::Limit);
    assert!(changes
        .iter()
        .all(|c| !matches!(c, LedgerChange::OrderFilled { .. })));

    quote(&mut engine, 1, 95.5, 96.5);
    assert!(engine.account().order(id).is_none());
    let position = engine.account().position("X").unwrap();
    assert_eq!(position.side(), Side::Sell);
    assert_eq!(position.open_price(), 96.0);
}

#[test]
fn test_brackets_cancel_each_other() {
    let mut engine = create_test_engine();
    quote(&mut engine, 0, 99.0, 100.0);

    let stop = Order::stop("X", Side::Sell, 1.0, 95.0).with_instruction(Instruction::Brace);
    let take = Order::limit("X", Side::Sell, 1.0, 110.0).with_instruction(Instruction::Brace);
    let (stop_id, take_id) = (stop.id(), take.id());
    engine
        .submit(Order::market("X", Side::Buy, 1.0).with_order(stop).with_order(take))
        .unwrap();

    let position = engine.account().position("X").unwrap();
    assert_eq!(position.orders(), &[stop_id, take_id]);
    assert_eq!(engine.account().order(stop_id).unwrap().status(), OrderStatus::Placed);

    quote(&mut engine, 1, 111.0, 112.0);

    assert!(engine.account().position("X").is_none());
    assert_eq!(engine.account().active_orders().count(), 0);
    assert_eq!(engine.account().balance(), 25_010.0);
    let stop_status = engine
        .account()
        .order_history()
        .iter()
        .find(|o| o.id() == stop_id)
        .map(|o| o.status());
    assert_eq!(stop_status, Some(OrderStatus::Cancelled));
}

#[test]
fn test_brackets_wait_for_parent() {
    let mut engine = create_test_engine();
    let stop = Order::stop("X", Side::Sell, 1.0, 90.0).with_instruction(Instruction::Brace);
    let stop_id = stop.id();
    let parent = Order::limit("X", Side::Buy, 1.0, 95.0).with_order(stop);
    let parent_id = parent.id();
    engine.submit(parent).unwrap();

    // The bracket is not live while its parent rests.
    assert!(engine.account().order(stop_id).is_none());

    quote(&mut engine, 0, 89.0, 90.0);
    assert!(engine.account().order(parent_id).is_none());
    // Activated on this point but only evaluated from the next one.
    assert!(engine.account().order(stop_id).is_some());

    quote(&mut engine, 1, 89.0, 90.0);
    assert!(engine.account().order(stop_id).is_none());
    assert!(engine.account().position("X").is_none());
    // Filled at the bid that crossed the stop, not at the stop level.
    assert_eq!(engine.account().balance(), 25_000.0 - 6.0);
}

#[test]
fn test_cancel_cascades_and_ignores_unknown() {
    let mut engine = create_test_engine();
    let brace = Order::stop("X", Side::Sell, 1.0, 90.0).with_instruction(Instruction::Brace);
    let parent = Order::limit("X", Side::Buy, 1.0, 95.0).with_order(brace);
    let id = parent.id();
    engine.submit(parent).unwrap();

    let changes = engine.cancel(id);
    assert_eq!(changes.len(), 2);
    assert!(engine.cancel(id).is_empty());
    assert!(engine.cancel(Uuid::new_v4()).is_empty());
    assert_eq!(engine.account().order_history().len(), 2);
}

#[test]
fn test_market_without_quote_waits() {
    let mut engine = create_test_engine();
    let order = Order::market("X", Side::Buy, 1.0);
    let id = order.id();

    let submission = engine.submit(order).unwrap();
    assert_eq!(submission.status(id), OrderStatus::Pending);
    assert!(submission.fill_price(id).is_none());

    quote(&mut engine, 0, 99.0, 100.0);
    assert_eq!(engine.account().position("X").unwrap().open_price(), 100.0);
}

#[test]
fn test_immediate_or_cancel() {
    let mut engine = create_test_engine();
    quote(&mut engine, 0, 99.0, 100.0);

    let miss = Order::limit("X", Side::Buy, 1.0, 90.0).with_time_in_force(TimeInForce::Ioc);
    let hit = Order::limit("X", Side::Buy, 1.0, 99.0).with_time_in_force(TimeInForce::Ioc);
    let (miss_id, hit_id) = (miss.id(), hit.id());

    assert_eq!(engine.submit(miss).unwrap().status(miss_id), OrderStatus::Cancelled);
    assert_eq!(engine.submit(hit).unwrap().status(hit_id), OrderStatus::Filled);
    assert_eq!(engine.account().active_orders().count(), 0);
}

#[test]
fn test_day_orders_expire() {
    let mut engine = create_test_engine();
    quote(&mut engine, 0, 99.0, 100.0);

    let day = Order::limit("X", Side::Buy, 1.0, 50.0).with_time_in_force(TimeInForce::Day);
    let gtc = Order::limit("X", Side::Buy, 1.0, 50.0);
    let (day_id, gtc_id) = (day.id(), gtc.id());
    engine.submit(day).unwrap();
    engine.submit(gtc).unwrap();

    quote(&mut engine, 60, 99.0, 100.0);
    assert!(engine.account().order(day_id).is_some());

    quote(&mut engine, 24 * 3600, 99.0, 100.0);
    assert!(engine.account().order(day_id).is_none());
    assert!(engine.account().order(gtc_id).is_some());
}

#[test]
fn test_points_mark_positions() {
    let mut engine = create_test_engine();
    quote(&mut engine, 0, 99.0, 100.0);
    engine.submit(Order::market("X", Side::Sell, 2.0)).unwrap();

    quote(&mut engine, 1, 95.0, 96.0);

    // Shorts mark at the ask.
    assert_eq!(engine.account().position("X").unwrap().gain(), 6.0);
    assert_eq!(engine.snapshot().equity, 25_006.0);
}

#[test]
fn test_unknown_instrument_point_is_skipped() {
    let mut engine = create_test_engine();
    let changes = engine.on_point(Point::new("Y", start(), 1.0, 2.0));
    assert!(changes.is_empty());
    assert!(engine.market().latest("Y").is_none());
}
