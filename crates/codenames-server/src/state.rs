use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::hub::Hub;
use crate::session::Connections;

/// Shared application state.
pub struct AppState {
    pub config: ServerConfig,
    /// Every game mutation happens under this lock.
    pub hub: Mutex<Hub>,
    /// Outbound queues, readable without taking the hub lock.
    pub connections: Arc<Connections>,
    /// Reserved WebSocket slots, bounded by `max_connections`.
    pub connection_count: AtomicU32,
}

impl AppState {
    /// Claim a connection slot, or `None` when the server is full. The
    /// check and the increment are one atomic step.
    pub fn try_reserve_slot(self: &Arc<Self>) -> Option<ConnectionSlot> {
        let max = self.config.max_connections;
        self.connection_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .ok()
            .map(|_| ConnectionSlot {
                state: self.clone(),
            })
    }
}

/// A reserved connection slot, given back on drop. Dropping covers upgrades
/// that never complete as well as sockets that close.
pub struct ConnectionSlot {
    state: Arc<AppState>,
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.state.connection_count.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slots_are_bounded_and_released() {
        let config = ServerConfig {
            max_connections: 2,
            ..ServerConfig::default()
        };
        let (_app, state) = crate::build_app(config);

        let first = state.try_reserve_slot().expect("first slot");
        let second = state.try_reserve_slot().expect("second slot");
        assert!(state.try_reserve_slot().is_none());
        assert_eq!(state.connection_count.load(Ordering::Acquire), 2);

        drop(first);
        let third = state.try_reserve_slot();
        assert!(third.is_some());
        assert!(state.try_reserve_slot().is_none());

        drop(second);
        drop(third);
        assert_eq!(state.connection_count.load(Ordering::Acquire), 0);
    }

    #[tokio::test]
    async fn concurrent_reservations_never_exceed_the_limit() {
        let config = ServerConfig {
            max_connections: 5,
            ..ServerConfig::default()
        };
        let (_app, state) = crate::build_app(config);

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let state = state.clone();
                std::thread::spawn(move || state.try_reserve_slot())
            })
            .collect();
        let slots: Vec<ConnectionSlot> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .collect();

        assert_eq!(slots.len(), 5);
        assert_eq!(state.connection_count.load(Ordering::Acquire), 5);
    }
}
