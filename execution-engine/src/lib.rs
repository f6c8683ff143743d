//! # Execution Engine
//!
//! Order matching and position simulation for paper trading accounts.
//!
//! ## Modules
//! - `feed`: Merges per-instrument quote sources into one time-ordered stream.
//! - `validator` / `composer`: Check and expand submitted order trees.
//! - `engine`: Trigger evaluation, fills and position transitions.
//! - `models`: The account ledger, market series and configuration.
//! - `worker`: One sequential task per account, publishing on the `events` bus.
//! - `exchange`: `PaperBroker`, a `trading::Broker` backed by a worker.

pub mod composer;
pub mod engine;
pub mod error;
pub mod events;
pub mod exchange;
pub mod feed;
pub mod io;
pub mod models;
pub mod validator;
pub mod worker;

pub use engine::{Engine, Submission};
pub use error::{EngineError, Result};
pub use events::{EngineEvent, EventBus};
pub use worker::WorkerHandle;
