//! Deferred one-shot tasks keyed by entity.
//!
//! At most one task is pending per key. Expiry is reported on a channel
//! rather than run in place, so the owner handles it under its own lock.
//! Cancelling aborts the sleeping task; a generation number guards against
//! an expiry that was already in flight when its key was cancelled.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A timer that ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<K> {
    pub key: K,
    generation: u64,
}

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct Scheduler<K> {
    pending: HashMap<K, Pending>,
    next_generation: u64,
    fired_tx: mpsc::UnboundedSender<Fired<K>>,
}

impl<K> Scheduler<K>
where
    K: Eq + Hash + Clone + Send + 'static,
{
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Fired<K>>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            pending: HashMap::new(),
            next_generation: 0,
            fired_tx,
        };
        (scheduler, fired_rx)
    }

    /// Start a timer for `key`. No-op returning false if one is already pending.
    pub fn schedule(&mut self, key: K, delay: Duration) -> bool {
        if self.pending.contains_key(&key) {
            return false;
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let tx = self.fired_tx.clone();
        let fired_key = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Fired {
                key: fired_key,
                generation,
            });
        });

        self.pending.insert(key, Pending { generation, handle });
        true
    }

    /// Cancel the pending timer for `key`, if any.
    pub fn cancel(&mut self, key: &K) -> bool {
        match self.pending.remove(key) {
            Some(pending) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Accept an expiry. Returns false for stale expiries whose timer was
    /// cancelled (or replaced) after it fired.
    pub fn complete(&mut self, fired: &Fired<K>) -> bool {
        match self.pending.get(&fired.key) {
            Some(pending) if pending.generation == fired.generation => {
                self.pending.remove(&fired.key);
                true
            }
            _ => false,
        }
    }
}

impl<K> Drop for Scheduler<K> {
    fn drop(&mut self) {
        for pending in self.pending.values() {
            pending.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (mut scheduler, mut fired_rx) = Scheduler::new();
        assert!(scheduler.schedule("room", Duration::from_secs(10)));
        assert!(scheduler.is_pending(&"room"));

        let fired = fired_rx.recv().await.unwrap();
        assert_eq!(fired.key, "room");
        assert!(scheduler.complete(&fired));
        assert!(!scheduler.is_pending(&"room"));
        assert!(!scheduler.complete(&fired), "an expiry is accepted once");
    }

    #[tokio::test(start_paused = true)]
    async fn second_schedule_is_ignored() {
        let (mut scheduler, mut fired_rx) = Scheduler::new();
        assert!(scheduler.schedule("room", Duration::from_secs(10)));
        assert!(!scheduler.schedule("room", Duration::from_secs(1)));
        assert_eq!(scheduler.len(), 1);

        let fired = fired_rx.recv().await.unwrap();
        assert!(scheduler.complete(&fired));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(fired_rx.try_recv().is_err(), "no second timer was started");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_timer() {
        let (mut scheduler, mut fired_rx) = Scheduler::new();
        scheduler.schedule("session", Duration::from_secs(5));
        assert!(scheduler.cancel(&"session"));
        assert!(!scheduler.cancel(&"session"));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(fired_rx.try_recv().is_err());
        assert!(scheduler.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_from_a_replaced_timer_is_stale() {
        let (mut scheduler, mut fired_rx) = Scheduler::new();
        scheduler.schedule("room", Duration::from_secs(5));
        let stale = fired_rx.recv().await.unwrap();

        // Cancelled after firing but before the owner handled it, then rescheduled.
        scheduler.cancel(&"room");
        scheduler.schedule("room", Duration::from_secs(5));

        assert!(!scheduler.complete(&stale));
        assert!(scheduler.is_pending(&"room"));
    }
}
