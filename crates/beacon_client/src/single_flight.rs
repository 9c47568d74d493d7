use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tokio::sync::watch;

type FlightMap = Arc<Mutex<HashMap<u64, watch::Receiver<bool>>>>;

/// Collapses concurrent fetches for the same slot into a single outbound
/// request. The first caller becomes the leader and performs the fetch;
/// joiners wait for the leader's flight to settle and then read the cache.
#[derive(Default)]
pub struct SingleFlight {
    inflight: FlightMap,
}

pub enum Flight {
    Leader(FlightGuard),
    Follower(watch::Receiver<bool>),
}

/// Removes the in-flight marker and wakes followers when dropped, so the
/// marker is cleared on success, failure, and cancellation alike.
pub struct FlightGuard {
    slot: u64,
    inflight: FlightMap,
    sender: watch::Sender<bool>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, slot: u64) -> Flight {
        let mut inflight = self.inflight.lock();
        if let Some(receiver) = inflight.get(&slot) {
            return Flight::Follower(receiver.clone());
        }
        let (sender, receiver) = watch::channel(false);
        inflight.insert(slot, receiver);
        Flight::Leader(FlightGuard {
            slot,
            inflight: self.inflight.clone(),
            sender,
        })
    }

    pub fn in_flight(&self, slot: u64) -> bool {
        self.inflight.lock().contains_key(&slot)
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.inflight.lock().remove(&self.slot);
        let _ = self.sender.send(true);
    }
}

/// Wait until the observed flight has settled. A dropped sender counts as
/// settled; the caller decides what a missing cache entry means afterwards.
pub async fn wait_settled(mut receiver: watch::Receiver<bool>) {
    if *receiver.borrow() {
        return;
    }
    let _ = receiver.changed().await;
}
