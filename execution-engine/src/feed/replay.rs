use trading::{DataFeed, FeedRead, Point};

/// A feed that replays points held in memory.
pub struct ReplayFeed {
    name: String,
    points: std::vec::IntoIter<Point>,
}

impl ReplayFeed {
    pub fn new(name: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            points: points.into_iter(),
        }
    }
}

impl DataFeed for ReplayFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_point(&mut self) -> FeedRead {
        match self.points.next() {
            Some(point) => FeedRead::Point(point),
            None => FeedRead::Exhausted,
        }
    }
}
