//! # Trading API
//!
//! Broker-neutral records and capability traits shared by the execution engine
//! and any collaborator (broker adapters, UIs, recorders).
//!
//! ## Modules
//! - `model`: Instruments, quotes, orders, positions and execution reports.
//! - `traits`: The `Broker` capability interface and the pull-based `DataFeed`.

pub mod model;
pub mod traits;

pub use model::execution::{ExecutionResult, ExecutionStatus};
pub use model::instrument::Instrument;
pub use model::market_data::{Bar, Point};
pub use model::order::{Instruction, Order, OrderStatus, OrderType, ParseError, Side, TimeInForce};
pub use model::position::{Fill, Position};
pub use traits::broker::Broker;
pub use traits::data_feed::{DataFeed, FeedRead};

pub mod prelude {
    pub use crate::model::instrument::Instrument;
    pub use crate::model::market_data::Point;
    pub use crate::model::order::{Order, OrderType, Side};
    pub use crate::traits::broker::Broker;
    pub use crate::traits::data_feed::{DataFeed, FeedRead};
}
