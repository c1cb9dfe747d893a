use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use tokio::sync::mpsc;
use tracing::debug;

use codenames_core::protocol::ServerMessage;

use crate::state::{AppState, ConnectionSlot};

/// Fixed one-second window frame counter.
struct RateLimiter {
    limit: u32,
    count: u32,
    window_start: Instant,
}

impl RateLimiter {
    fn new(limit: u32) -> Self {
        Self {
            limit,
            count: 0,
            window_start: Instant::now(),
        }
    }

    fn allow(&mut self, now: Instant) -> bool {
        if now.duration_since(self.window_start) > Duration::from_secs(1) {
            self.window_start = now;
            self.count = 0;
        }
        self.count += 1;
        self.count <= self.limit
    }
}

/// Top-level WebSocket handler -- spawned per connection. The slot is
/// released when the socket task ends.
pub async fn handle_socket(
    state: Arc<AppState>,
    _slot: ConnectionSlot,
    mut socket: WebSocket,
    supplied: Option<String>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let (session, connection_id) = state.hub.lock().await.connect(supplied.as_deref(), tx);
    let mut limiter = RateLimiter::new(state.config.rate_limit_per_sec);

    let reason = loop {
        tokio::select! {
            // Outbound: forward queued ServerMessage to the WebSocket.
            outbound = rx.recv() => {
                let Some(msg) = outbound else {
                    // Another connection registered for this session.
                    break "superseded";
                };
                if !send_json(&mut socket, &msg).await {
                    break "send failed";
                }
            }
            // Inbound: read from the WebSocket.
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if !limiter.allow(Instant::now()) {
                            let limited = ServerMessage::Error { message: "Rate limited".into() };
                            if !send_json(&mut socket, &limited).await {
                                break "send failed";
                            }
                            continue;
                        }

                        let handled = state.hub.lock().await.handle_frame(&session, &text);
                        if let Err(e) = handled {
                            debug!(session = %session, error = %e, "unparseable frame");
                            let invalid = ServerMessage::Error {
                                message: format!("Invalid message: {}", e),
                            };
                            if !send_json(&mut socket, &invalid).await {
                                break "send failed";
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break "transport close",
                    Some(Err(_)) => break "transport error",
                    _ => continue,
                }
            }
        }
    };

    state.hub.lock().await.disconnect(&session, connection_id, reason);
}

async fn send_json(socket: &mut WebSocket, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(_) => true,
    }
}
