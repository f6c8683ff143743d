pub mod args;
pub mod orders;

pub use args::Args;
pub use orders::load_orders;
