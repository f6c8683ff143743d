//! Defines the `DataFeed` trait for market data ingestion.
//!
//! A feed is a pull-based source of quotes for one instrument (a tick file, a
//! socket, a synthetic generator). It yields its next unread point only when
//! asked, which lets the engine merge several feeds into one time-ordered stream.

use crate::model::market_data::Point;

/// Outcome of a single pull from a feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedRead {
    /// The next point in the feed.
    Point(Point),
    /// A record was read but could not be used (malformed or sentinel time).
    /// The feed is still alive.
    Skipped,
    /// No more data will ever arrive.
    Exhausted,
}

/// A trait for components that produce market data.
///
/// # Examples
///
/// ```
/// use trading::traits::data_feed::{DataFeed, FeedRead};
///
/// struct EmptyFeed;
///
/// impl DataFeed for EmptyFeed {
///     fn name(&self) -> &str {
///         "empty"
///     }
///
///     fn next_point(&mut self) -> FeedRead {
///         FeedRead::Exhausted
///     }
/// }
/// ```
pub trait DataFeed: Send {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Pulls the next record from the feed.
    fn next_point(&mut self) -> FeedRead;
}

impl DataFeed for Box<dyn DataFeed> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn next_point(&mut self) -> FeedRead {
        (**self).next_point()
    }
}
