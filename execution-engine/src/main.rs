use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use execution_engine::events::EngineEvent;
use execution_engine::feed::{spawn_feed, FeedSynchronizer};
use execution_engine::io::{load_orders, Args};
use execution_engine::models::EngineConfig;
use execution_engine::{worker, Engine, EngineError, EventBus};
use log::{info, warn};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = EngineConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(pace_ms) = args.pace_ms {
        config = config.with_pace_ms(pace_ms);
    }

    let sync = FeedSynchronizer::from_config(&config).context("opening feeds")?;
    info!(
        "Replaying {} feed(s) into account '{}'",
        sync.len(),
        config.account().name()
    );

    let bus = EventBus::new(config.event_capacity());
    let mut events = bus.subscribe();
    let (handle, task) = worker::spawn(Engine::from_config(&config), bus);

    if let Some(path) = &args.orders {
        let orders = load_orders(path).with_context(|| format!("reading {}", path.display()))?;
        for order in orders {
            match handle.submit(order).await {
                Ok(submission) => info!("Submitted {} order(s)", submission.orders.len()),
                Err(EngineError::Rejected(rejection)) => warn!("Order rejected: {}", rejection),
                Err(e) => return Err(e.into()),
            }
        }
    }

    if !sync.is_empty() {
        let pace = config.pace_ms().map(Duration::from_millis);
        let (ticks, _feed) = spawn_feed(sync, pace, config.event_capacity());
        handle.subscribe_feed(ticks).await?;

        loop {
            match events.recv().await {
                Ok(EngineEvent::EndOfStream { .. }) => break,
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    let snapshot = handle.snapshot().await?;
    handle.shutdown().await?;
    task.await.context("account worker panicked")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{}", json);

    Ok(())
}
