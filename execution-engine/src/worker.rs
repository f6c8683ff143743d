//! One sequential task per account.
//!
//! The worker owns the `Engine` and is the only code that mutates it. Orders,
//! cancels and snapshot requests arrive as commands; quotes arrive on an
//! attached feed channel. Each point is fully applied before the next one is
//! received, and commands take priority over ticks.

use crate::engine::{Engine, Submission};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventBus};
use crate::models::{LedgerChange, LedgerSnapshot};
use crate::validator::Rejection;
use log::{debug, info};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use trading::{Order, Point};
use uuid::Uuid;

pub enum Command {
    Submit {
        order: Order,
        reply: oneshot::Sender<std::result::Result<Submission, Rejection>>,
    },
    Cancel {
        order_id: Uuid,
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<LedgerSnapshot>,
    },
    /// Attaches a feed, replacing any previous one.
    Subscribe(mpsc::Receiver<Point>),
    /// Detaches the feed. Applied fills stay applied.
    Unsubscribe,
    Shutdown,
}

enum Step {
    Command(Option<Command>),
    Tick(Option<Point>),
}

/// Cloneable access to a running worker.
#[derive(Clone)]
pub struct WorkerHandle {
    account: String,
    commands: mpsc::Sender<Command>,
    bus: EventBus,
}

/// Starts the worker for `engine`'s account.
///
/// The join handle gives the engine back once the worker stops.
pub fn spawn(engine: Engine, bus: EventBus) -> (WorkerHandle, JoinHandle<Engine>) {
    let account = engine.account().name().to_string();
    let (tx, rx) = mpsc::channel(64);
    let handle = WorkerHandle {
        account: account.clone(),
        commands: tx,
        bus: bus.clone(),
    };
    let task = tokio::spawn(run(engine, rx, bus, account));
    (handle, task)
}

async fn recv_tick(ticks: &mut Option<mpsc::Receiver<Point>>) -> Option<Point> {
    match ticks {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn publish(bus: &EventBus, account: &str, changes: Vec<LedgerChange>) {
    for change in changes {
        bus.publish(EngineEvent::Ledger {
            account: account.to_string(),
            change,
        });
    }
}

async fn run(
    mut engine: Engine,
    mut commands: mpsc::Receiver<Command>,
    bus: EventBus,
    account: String,
) -> Engine {
    info!("Account worker '{}' started", account);
    let mut ticks: Option<mpsc::Receiver<Point>> = None;

    loop {
        let step = tokio::select! {
            biased;
            command = commands.recv() => Step::Command(command),
            point = recv_tick(&mut ticks) => Step::Tick(point),
        };

        match step {
            Step::Command(None) | Step::Command(Some(Command::Shutdown)) => break,
            Step::Command(Some(Command::Submit { order, reply })) => {
                let result = engine.submit(order);
                if let Ok(submission) = &result {
                    publish(&bus, &account, submission.changes.clone());
                }
                let _ = reply.send(result);
            }
            Step::Command(Some(Command::Cancel { order_id, reply })) => {
                let changes = engine.cancel(order_id);
                let found = !changes.is_empty();
                publish(&bus, &account, changes);
                let _ = reply.send(found);
            }
            Step::Command(Some(Command::Snapshot { reply })) => {
                let _ = reply.send(engine.snapshot());
            }
            Step::Command(Some(Command::Subscribe(rx))) => {
                info!("Account '{}' subscribed to a feed", account);
                ticks = Some(rx);
            }
            Step::Command(Some(Command::Unsubscribe)) => {
                info!("Account '{}' unsubscribed from its feed", account);
                ticks = None;
            }
            Step::Tick(Some(point)) => {
                debug!("Account '{}' applying {} @ {}", account, point.instrument, point.time);
                let changes = engine.on_point(point.clone());
                publish(&bus, &account, changes);
                bus.publish(EngineEvent::Tick {
                    account: account.clone(),
                    point,
                });
            }
            Step::Tick(None) => {
                info!("Account '{}' feed ended", account);
                ticks = None;
                bus.publish(EngineEvent::EndOfStream {
                    account: account.clone(),
                });
            }
        }
    }

    info!("Account worker '{}' stopped", account);
    engine
}

impl WorkerHandle {
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Subscribes to this worker's ledger notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.bus.subscribe()
    }

    fn gone(&self) -> EngineError {
        EngineError::WorkerGone(self.account.clone())
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).await.map_err(|_| self.gone())
    }

    pub async fn submit(&self, order: Order) -> Result<Submission> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Submit { order, reply }).await?;
        rx.await
            .map_err(|_| self.gone())?
            .map_err(EngineError::Rejected)
    }

    /// Returns `false` when the order was not active.
    pub async fn cancel(&self, order_id: Uuid) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Cancel { order_id, reply }).await?;
        rx.await.map_err(|_| self.gone())
    }

    pub async fn snapshot(&self) -> Result<LedgerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| self.gone())
    }

    pub async fn subscribe_feed(&self, ticks: mpsc::Receiver<Point>) -> Result<()> {
        self.send(Command::Subscribe(ticks)).await
    }

    pub async fn unsubscribe(&self) -> Result<()> {
        self.send(Command::Unsubscribe).await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}
