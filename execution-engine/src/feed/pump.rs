//! Drives a synchronizer on a blocking thread and hands points to async code.

use super::FeedSynchronizer;
use log::{debug, info};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use trading::Point;

/// Spawns `sync` on the blocking pool.
///
/// Points arrive on the returned channel in time order, `pace` apart when
/// given. The channel closes when every source is exhausted or the receiver
/// is dropped. The handle resolves to the number of points sent.
pub fn spawn_feed(
    mut sync: FeedSynchronizer,
    pace: Option<Duration>,
    buffer: usize,
) -> (mpsc::Receiver<Point>, JoinHandle<usize>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));

    let handle = tokio::task::spawn_blocking(move || {
        let mut sent = 0;
        for point in sync.by_ref() {
            if tx.blocking_send(point).is_err() {
                debug!("Feed receiver dropped after {} points", sent);
                return sent;
            }
            sent += 1;
            if let Some(pace) = pace {
                std::thread::sleep(pace);
            }
        }
        info!("Feed finished after {} points", sent);
        sent
    });

    (rx, handle)
}
