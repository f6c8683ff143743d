//! Bounded per-instrument point history.

use std::collections::VecDeque;
use trading::{Bar, Point};

/// Points for one instrument, oldest first.
///
/// With a non-zero time frame, points falling into the same bucket as the last
/// stored point replace it and extend its bar. With a zero time frame only an
/// identical timestamp replaces.
#[derive(Debug, Clone)]
pub struct Series {
    time_frame_ms: i64,
    capacity: usize,
    points: VecDeque<Point>,
}

impl Series {
    pub fn new(time_frame_ms: i64, capacity: usize) -> Self {
        Self {
            time_frame_ms,
            capacity: capacity.max(1),
            points: VecDeque::new(),
        }
    }

    fn bucket(&self, point: &Point) -> i64 {
        let ms = point.time.timestamp_millis();
        if self.time_frame_ms > 0 {
            ms.div_euclid(self.time_frame_ms)
        } else {
            ms
        }
    }

    /// Stores `point` and returns the stored (possibly aggregated) version.
    pub fn push(&mut self, mut point: Point) -> &Point {
        let bucket = self.bucket(&point);
        let same_bucket = self
            .points
            .back()
            .map(|last| self.bucket(last) == bucket)
            .unwrap_or(false);

        if same_bucket {
            if let Some(last) = self.points.pop_back() {
                let mut bar = last.bar.unwrap_or_else(|| Bar::new(last.last));
                bar.update(point.last);
                point.bar = Some(bar);
            }
        } else if self.time_frame_ms > 0 && point.bar.is_none() {
            point.bar = Some(Bar::new(point.last));
        }

        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }

        // Never empty after a push.
        &self.points[self.points.len() - 1]
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }
}
