//! `snapshot_updated` signal, modeled as a producer-consumer channel keyed
//! by URL.
//!
//! Explicit channels are preferred over callbacks so the version gate in
//! [`qml_coordinator`](../qml_coordinator/index.html) is a first-class
//! state rather than something hidden inside a closure.

use std::sync::mpsc::{channel, Receiver, Sender};

use parking_lot::Mutex;

/// A broadcaster of document URLs whose snapshot has just been published.
///
/// Multiple subscribers (e.g. one `RequestCoordinator` per analysis module)
/// can listen independently; a send to a dropped receiver is silently
/// discarded and the dead sender pruned on the next publish.
#[derive(Default)]
pub struct SnapshotBus {
    subscribers: Mutex<Vec<Sender<String>>>,
}

impl SnapshotBus {
    /// An empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber, returning the receiving end.
    pub fn subscribe(&self) -> Receiver<String> {
        let (tx, rx) = channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Notify every live subscriber that `url`'s snapshot changed.
    pub fn publish(&self, url: &str) {
        let mut subs = self.subscribers.lock();
        subs.retain(|tx| tx.send(url.to_string()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_published_urls() {
        let bus = SnapshotBus::new();
        let rx = bus.subscribe();
        bus.publish("file:///a.qml");
        assert_eq!(rx.recv().expect("message"), "file:///a.qml");
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let bus = SnapshotBus::new();
        {
            let _rx = bus.subscribe();
        }
        bus.publish("file:///a.qml");
        assert_eq!(bus.subscribers.lock().len(), 0);
    }
}
