use std::io::Write;
use std::path::Path;

use execution_engine::events::EngineEvent;
use execution_engine::feed::{spawn_feed, FeedSynchronizer};
use execution_engine::models::{AccountConfig, EngineConfig, FeedConfig};
use execution_engine::{worker, Engine, EngineError, EventBus};
use tempfile::TempDir;
use trading::{Instrument, Order, Side};

// --- Fixtures ---

fn write_feed(dir: &Path, name: &str, lines: &[&str]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "time,bid,bid_size,ask,ask_size").unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    path
}

fn config(dir: &TempDir) -> EngineConfig {
    let x = write_feed(
        dir.path(),
        "x.csv",
        &[
            "2024-01-02T14:30:01Z,99.5,10,100,10",
            "not,a,valid,line,at all",
            "2024-01-02T14:30:03Z,105,10,105.5,10",
        ],
    );
    let y = write_feed(
        dir.path(),
        "y.csv",
        &["2024-01-02T14:30:02Z,50,1,51,1", "2024-01-02T14:30:04Z,52,1,53,1"],
    );

    EngineConfig::default()
        .with_account(AccountConfig::new("replay", 25_000.0))
        .with_instrument(Instrument::new("X"))
        .with_instrument(Instrument::new("Y"))
        .with_feed(FeedConfig::new("X", x))
        .with_feed(FeedConfig::new("Y", y))
}

// --- Tests ---

#[test]
fn test_synchronizer_merges_csv_files() {
    let dir = TempDir::new().unwrap();
    let sync = FeedSynchronizer::from_config(&config(&dir)).unwrap();

    let merged: Vec<_> = sync.map(|p| (p.instrument, p.time.timestamp() % 60)).collect();

    assert_eq!(
        merged,
        vec![
            ("X".to_string(), 1),
            ("Y".to_string(), 2),
            ("X".to_string(), 3),
            ("Y".to_string(), 4),
        ]
    );
}

#[test]
fn test_feed_for_unknown_instrument_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir).with_feed(FeedConfig::new("Z", dir.path().join("x.csv")));

    assert!(matches!(
        FeedSynchronizer::from_config(&config),
        Err(EngineError::UnknownInstrument(name)) if name == "Z"
    ));
}

#[test]
fn test_missing_feed_file() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::default()
        .with_instrument(Instrument::new("X"))
        .with_feed(FeedConfig::new("X", dir.path().join("missing.csv")));

    assert!(matches!(
        FeedSynchronizer::from_config(&config),
        Err(EngineError::Feed { .. })
    ));
}

#[tokio::test]
async fn test_replay_round_trip() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = TempDir::new().unwrap();
    let config = config(&dir);

    let bus = EventBus::new(config.event_capacity());
    let mut events = bus.subscribe();
    let (handle, task) = worker::spawn(Engine::from_config(&config), bus);

    // No quote yet: the market order waits for the first X point.
    handle.submit(Order::market("X", Side::Buy, 1.0)).await.unwrap();
    handle
        .submit(Order::limit("X", Side::Sell, 1.0, 105.0))
        .await
        .unwrap();

    let sync = FeedSynchronizer::from_config(&config).unwrap();
    let (ticks, feed) = spawn_feed(sync, None, 16);
    handle.subscribe_feed(ticks).await.unwrap();

    let mut applied = Vec::new();
    loop {
        match events.recv().await.unwrap() {
            EngineEvent::Tick { point, .. } => applied.push(point.instrument),
            EngineEvent::EndOfStream { .. } => break,
            EngineEvent::Ledger { .. } => {}
        }
    }
    assert_eq!(applied, vec!["X", "Y", "X", "Y"]);
    assert_eq!(feed.await.unwrap(), 4);

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.balance, 25_005.0);
    assert!(snapshot.active_positions.is_empty());
    assert!(snapshot.active_orders.is_empty());
    assert_eq!(snapshot.position_history.len(), 1);
    assert_eq!(snapshot.position_history[0].open_price(), 100.0);
    assert_eq!(snapshot.transactions.len(), 1);

    // The snapshot is the read interface: it must serialize.
    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["account"], "replay");

    handle.shutdown().await.unwrap();
    task.await.unwrap();
}

#[tokio::test]
async fn test_unsubscribe_stops_ticks() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let (handle, task) = worker::spawn(Engine::from_config(&config), EventBus::default());

    let (tx, rx) = tokio::sync::mpsc::channel(8);
    handle.subscribe_feed(rx).await.unwrap();
    handle.unsubscribe().await.unwrap();
    // Commands are applied in order: once the snapshot answers, the feed is detached.
    handle.snapshot().await.unwrap();
    // The worker dropped its receiver, so sending fails.
    let point = trading::Point::new("X", chrono::Utc::now(), 1.0, 2.0);
    assert!(tx.send(point).await.is_err());

    handle.shutdown().await.unwrap();
    let engine = task.await.unwrap();
    assert!(engine.market().latest("X").is_none());
}
