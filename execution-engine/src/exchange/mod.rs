//! Broker implementations backed by the local engine.

pub mod paper;

pub use paper::PaperBroker;
