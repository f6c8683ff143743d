pub mod execution;
pub mod instrument;
pub mod market_data;
pub mod order;
pub mod position;
