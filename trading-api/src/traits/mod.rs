pub mod broker;
pub mod data_feed;
