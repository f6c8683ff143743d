use super::series::Series;
use std::collections::HashMap;
use trading::{Instrument, Point};

/// Latest quotes and recent history for every instrument an account trades.
#[derive(Debug, Clone)]
pub struct Market {
    capacity: usize,
    series: HashMap<String, Series>,
}

impl Market {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            series: HashMap::new(),
        }
    }

    /// Records a point for `instrument` and returns the stored version.
    pub fn update(&mut self, instrument: &Instrument, point: Point) -> &Point {
        let capacity = self.capacity;
        self.series
            .entry(instrument.name().to_string())
            .or_insert_with(|| Series::new(instrument.time_frame_ms(), capacity))
            .push(point)
    }

    pub fn latest(&self, instrument: &str) -> Option<&Point> {
        self.series.get(instrument).and_then(|s| s.last())
    }

    pub fn series(&self, instrument: &str) -> Option<&Series> {
        self.series.get(instrument)
    }
}

impl Default for Market {
    fn default() -> Self {
        Self::new(1024)
    }
}
