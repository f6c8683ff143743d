use crate::engine::Submission;
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::models::LedgerChange;
use crate::worker::WorkerHandle;
use anyhow::Context;
use async_trait::async_trait;
use log::warn;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use trading::{Broker, ExecutionResult, ExecutionStatus, Order, OrderStatus, Point};
use uuid::Uuid;

/// A `Broker` that simulates execution on a local account worker.
///
/// Collaborators written against `Broker` can run unchanged against
/// historical data.
#[derive(Clone)]
pub struct PaperBroker {
    worker: WorkerHandle,
}

impl PaperBroker {
    pub fn new(worker: WorkerHandle) -> Self {
        Self { worker }
    }

    pub fn worker(&self) -> &WorkerHandle {
        &self.worker
    }
}

fn acknowledge(submission: &Submission, order: &Order) -> ExecutionResult {
    let id = order.id();
    let status = match submission.status(id) {
        OrderStatus::Filled => ExecutionStatus::Filled,
        OrderStatus::Cancelled => ExecutionStatus::Cancelled,
        OrderStatus::Pending | OrderStatus::Placed => ExecutionStatus::Pending,
    };
    let ack = ExecutionResult::new(id, order.instrument(), status);

    let filled = submission.changes.iter().find_map(|change| match change {
        LedgerChange::OrderFilled { order, price } if order.id() == id => {
            Some((order.volume(), *price, order.time()))
        }
        _ => None,
    });
    match filled {
        Some((volume, price, time)) => ack.with_fill(volume, price, time),
        None => ack,
    }
}

#[async_trait]
impl Broker for PaperBroker {
    async fn submit_order(&self, order: Order) -> anyhow::Result<Vec<ExecutionResult>> {
        let id = order.id();
        let instrument = order.instrument().to_string();

        match self.worker.submit(order).await {
            Ok(submission) => Ok(submission
                .orders
                .iter()
                .map(|order| acknowledge(&submission, order))
                .collect()),
            Err(EngineError::Rejected(rejection)) => Ok(vec![ExecutionResult::new(
                id,
                instrument,
                ExecutionStatus::Rejected,
            )
            .with_message(rejection.to_string())]),
            Err(e) => Err(e).context("paper submission failed"),
        }
    }

    async fn cancel_order(&self, order_id: Uuid) -> anyhow::Result<ExecutionResult> {
        let cancelled = self
            .worker
            .cancel(order_id)
            .await
            .context("paper cancel failed")?;
        if !cancelled {
            return Ok(
                ExecutionResult::new(order_id, "", ExecutionStatus::Rejected)
                    .with_message("order is not active"),
            );
        }

        let snapshot = self.worker.snapshot().await?;
        let instrument = snapshot
            .order_history
            .iter()
            .rev()
            .find(|order| order.id() == order_id)
            .map(|order| order.instrument().to_string())
            .unwrap_or_default();
        Ok(ExecutionResult::new(
            order_id,
            instrument,
            ExecutionStatus::Cancelled,
        ))
    }

    /// Ticks applied by the worker from now on. Ends with the feed.
    async fn stream_ticks(&self) -> anyhow::Result<mpsc::Receiver<Point>> {
        let mut events = self.worker.subscribe();
        let account = self.worker.account().to_string();
        let (tx, rx) = mpsc::channel(256);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(EngineEvent::Tick { account: from, point }) if from == account => {
                        if tx.send(point).await.is_err() {
                            break;
                        }
                    }
                    Ok(EngineEvent::EndOfStream { account: from }) if from == account => break,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Tick stream for '{}' skipped {} events", account, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Ok(rx)
    }
}
