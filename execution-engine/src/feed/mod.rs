//! Market data feeds.
//!
//! `FeedSynchronizer` merges any number of pull-based `DataFeed`s into one
//! stream ordered by point time. Sources only advance when their buffered
//! point has been emitted. Malformed records are dropped while refilling, so
//! every live source holds a point before the earliest one is chosen.

pub mod csv;
pub mod pump;
pub mod replay;

use crate::error::{EngineError, Result};
use crate::models::EngineConfig;
use log::{debug, info};
use trading::{DataFeed, FeedRead, Point};

pub use self::csv::CsvFeed;
pub use self::pump::spawn_feed;
pub use self::replay::ReplayFeed;

struct Slot {
    feed: Box<dyn DataFeed>,
    pending: Option<Point>,
    done: bool,
}

/// Result of one synchronizer round.
#[derive(Debug, Clone, PartialEq)]
pub enum Round {
    Emitted(Point),
    /// Every source is exhausted and nothing is buffered.
    Finished,
}

pub struct FeedSynchronizer {
    slots: Vec<Slot>,
}

impl Default for FeedSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSynchronizer {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Opens one CSV feed per configured entry, in configuration order.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut sync = Self::new();
        for feed in config.feeds() {
            if !config
                .instruments()
                .iter()
                .any(|i| i.name() == feed.instrument())
            {
                return Err(EngineError::UnknownInstrument(feed.instrument().to_string()));
            }
            sync.add(CsvFeed::open(feed.path(), feed.instrument())?);
        }
        Ok(sync)
    }

    /// Adds a source. Earlier sources win ties on identical timestamps.
    pub fn add(&mut self, feed: impl DataFeed + 'static) {
        self.slots.push(Slot {
            feed: Box::new(feed),
            pending: None,
            done: false,
        });
    }

    pub fn with_feed(mut self, feed: impl DataFeed + 'static) -> Self {
        self.add(feed);
        self
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Runs one round: refills empty buffers, then emits the earliest point.
    pub fn step(&mut self) -> Round {
        for slot in self.slots.iter_mut().filter(|s| !s.done && s.pending.is_none()) {
            slot.refill();
        }

        let mut earliest: Option<usize> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(point) = &slot.pending else {
                continue;
            };
            let earlier = match earliest.and_then(|e| self.slots[e].pending.as_ref()) {
                Some(best) => point.time < best.time,
                None => true,
            };
            if earlier {
                earliest = Some(i);
            }
        }

        match earliest.and_then(|i| self.slots[i].pending.take()) {
            Some(point) => Round::Emitted(point),
            None => Round::Finished,
        }
    }
}

impl Slot {
    /// Pulls until the source yields a usable point or runs dry.
    fn refill(&mut self) {
        loop {
            match self.feed.next_point() {
                FeedRead::Point(point) if point.time.timestamp_millis() != 0 => {
                    self.pending = Some(point);
                    return;
                }
                FeedRead::Point(_) | FeedRead::Skipped => {
                    debug!("Feed {} dropped an unusable record", self.feed.name());
                }
                FeedRead::Exhausted => {
                    info!("Feed {} exhausted", self.feed.name());
                    self.done = true;
                    return;
                }
            }
        }
    }
}

impl Iterator for FeedSynchronizer {
    type Item = Point;

    /// Emitted points in time order.
    fn next(&mut self) -> Option<Point> {
        match self.step() {
            Round::Emitted(point) => Some(point),
            Round::Finished => None,
        }
    }
}
