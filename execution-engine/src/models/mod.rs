pub mod account;
pub mod config;
pub mod ledger;
pub mod market;
pub mod series;

pub use account::*;
pub use config::*;
pub use ledger::*;
pub use market::*;
pub use series::*;
