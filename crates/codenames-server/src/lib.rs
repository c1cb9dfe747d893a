pub mod broadcast;
pub mod clock;
pub mod config;
pub mod consensus;
pub mod hub;
pub mod players;
pub mod rooms;
pub mod routes;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod ws;

#[cfg(test)]
mod testkit;

use std::sync::atomic::AtomicU32;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior};
use tower_http::cors::CorsLayer;

use crate::config::ServerConfig;
use crate::hub::Hub;
use crate::session::Connections;
use crate::state::AppState;

/// Build a fully configured Router + shared state, and start the timer
/// dispatcher and the one-second clock.
pub fn build_app(config: ServerConfig) -> (Router, Arc<AppState>) {
    let connections = Arc::new(Connections::new());
    let (hub, mut fired_rx) = Hub::new(config.clone(), connections.clone());

    let state = Arc::new(AppState {
        config,
        hub: Mutex::new(hub),
        connections,
        connection_count: AtomicU32::new(0),
    });

    {
        let state = state.clone();
        tokio::spawn(async move {
            while let Some(fired) = fired_rx.recv().await {
                state.hub.lock().await.on_timer(fired);
            }
        });
    }

    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = clock_interval();
            loop {
                interval.tick().await;
                let now = chrono::Local::now().naive_local();
                state.hub.lock().await.tick(now);
            }
        });
    }

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/ping", get(routes::ping))
        .route("/stats", get(routes::stats))
        .route("/ws", get(routes::ws_upgrade))
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    (app, state)
}

/// One tick per second. A tick delayed by a busy hub is not made up with a
/// burst, so countdowns never drop several seconds at once.
fn clock_interval() -> Interval {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
