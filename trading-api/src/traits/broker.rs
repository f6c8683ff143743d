use crate::model::{execution::ExecutionResult, market_data::Point, order::Order};
use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

/// The capability interface every brokerage connector implements.
///
/// The engine and its collaborators only ever see this trait; wire formats,
/// authentication and reconnect policies stay inside the implementation.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Submits an order (possibly composite).
    ///
    /// # Returns
    ///
    /// * One `ExecutionResult` per primitive order the submission expanded to.
    async fn submit_order(&self, order: Order) -> anyhow::Result<Vec<ExecutionResult>>;

    /// Cancels an active order. Unknown ids are reported as `Rejected`.
    async fn cancel_order(&self, order_id: Uuid) -> anyhow::Result<ExecutionResult>;

    /// Opens a stream of normalized quotes. The stream ends when the feed does.
    async fn stream_ticks(&self) -> anyhow::Result<mpsc::Receiver<Point>>;
}
