//! Session registry: which live connection currently speaks for a session,
//! plus the connect/disconnect lifecycle with its reconnection grace period.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use rand::RngExt;
use tokio::sync::mpsc;
use tracing::{debug, info};

use codenames_core::protocol::ServerMessage;

use crate::hub::{Hub, TimerKey};

/// Opaque 128-bit hex token identifying a client across reconnects.
pub type SessionId = String;

/// Handle to push messages to a connected WebSocket client.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub connection_id: u64,
    pub tx: mpsc::UnboundedSender<ServerMessage>,
}

/// Live connections keyed by session. Registering a session again replaces
/// (and thereby closes) the previous connection's send queue.
#[derive(Debug, Default)]
pub struct Connections {
    handles: DashMap<SessionId, ConnectionHandle>,
    next_id: AtomicU64,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `tx` as the live connection for `session`, returning its connection id.
    pub fn register(&self, session: &str, tx: mpsc::UnboundedSender<ServerMessage>) -> u64 {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.handles.insert(
            session.to_string(),
            ConnectionHandle {
                connection_id,
                tx,
            },
        );
        connection_id
    }

    /// Remove the registration, but only if it still belongs to `connection_id`.
    pub fn unregister(&self, session: &str, connection_id: u64) -> bool {
        self.handles
            .remove_if(session, |_, handle| handle.connection_id == connection_id)
            .is_some()
    }

    pub fn is_connected(&self, session: &str) -> bool {
        self.handles.contains_key(session)
    }

    /// Queue a message for the session's live connection. False if none.
    pub fn send(&self, session: &str, msg: ServerMessage) -> bool {
        match self.handles.get(session) {
            Some(handle) => handle.tx.send(msg).is_ok(),
            None => false,
        }
    }

    pub fn send_all(&self, msg: &ServerMessage) {
        for handle in self.handles.iter() {
            let _ = handle.tx.send(msg.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

pub fn mint_session_id() -> SessionId {
    let mut rng = rand::rng();
    format!("{:032x}", rng.random::<u128>())
}

impl Hub {
    /// Attach a new connection. A supplied token that names a live player
    /// resumes that player's session; anything else gets a fresh token.
    pub fn connect(
        &mut self,
        supplied: Option<&str>,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) -> (SessionId, u64) {
        let resumed = supplied
            .filter(|token| *token != "null" && self.players.contains(token))
            .map(str::to_string);
        let is_existing_player = resumed.is_some();

        let session = match resumed {
            Some(session) => {
                if self.timers.cancel(&TimerKey::Disconnect(session.clone())) {
                    info!(
                        census = %self.census(),
                        session = %session,
                        "cancelled disconnect timer"
                    );
                }
                info!(census = %self.census(), session = %session, "renewed connection");
                session
            }
            None => {
                let session = mint_session_id();
                info!(census = %self.census(), session = %session, "new connection");
                session
            }
        };

        let connection_id = self.connections.register(&session, tx);

        let game_state = if is_existing_player {
            self.snapshot_for(&session).map(Box::new)
        } else {
            None
        };

        self.connections.send(
            &session,
            ServerMessage::ServerStats {
                players: self.players.len(),
                rooms: self.rooms.len(),
                session_id: session.clone(),
                is_existing_player,
                game_state,
            },
        );

        (session, connection_id)
    }

    /// A connection went away. Players keep their seat for the disconnect
    /// grace period; connections without a player are simply dropped.
    pub fn disconnect(&mut self, session: &str, connection_id: u64, reason: &str) {
        if !self.connections.unregister(session, connection_id) {
            debug!(session = %session, reason, "superseded connection closed");
            return;
        }

        let Some(player) = self.players.get(session) else {
            info!(census = %self.census(), session = %session, reason, "disconnected");
            return;
        };

        info!(
            census = %self.census(),
            session = %session,
            nickname = %player.nickname,
            reason,
            "disconnect received"
        );

        let key = TimerKey::Disconnect(session.to_string());
        if self.timers.schedule(key, self.config.disconnect_grace) {
            debug!(
                session = %session,
                grace = ?self.config.disconnect_grace,
                "disconnect timer started"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{self, ServerMessageExt};
    use codenames_core::protocol::{Role, Team};

    #[test]
    fn minted_tokens_are_128_bit_hex() {
        let token = mint_session_id();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, mint_session_id());
    }

    #[tokio::test]
    async fn later_registration_supersedes() {
        let connections = Connections::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let first = connections.register("s", tx1);
        let second = connections.register("s", tx2);
        assert_eq!(connections.len(), 1);

        // The first queue is closed once its sender is replaced.
        assert!(rx1.recv().await.is_none());

        assert!(!connections.unregister("s", first));
        assert!(connections.send("s", ServerMessage::AfkWarning));
        assert!(matches!(rx2.recv().await, Some(ServerMessage::AfkWarning)));
        assert!(connections.unregister("s", second));
        assert!(!connections.send("s", ServerMessage::AfkWarning));
    }

    #[tokio::test]
    async fn fresh_connect_mints_token_and_reports_stats() {
        let (mut hub, _timers) = testkit::hub();
        let mut client = testkit::connect(&mut hub, None);

        let msgs = client.drain();
        match &msgs[..] {
            [ServerMessage::ServerStats { session_id, is_existing_player, game_state, .. }] => {
                assert_eq!(session_id, &client.session);
                assert!(!is_existing_player);
                assert!(game_state.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_or_null_token_gets_a_fresh_session() {
        let (mut hub, _timers) = testkit::hub();
        let client = testkit::connect(&mut hub, Some("null"));
        assert_ne!(client.session, "null");

        let other = testkit::connect(&mut hub, Some("deadbeef"));
        assert_ne!(other.session, "deadbeef");
    }

    #[tokio::test]
    async fn lobby_connection_is_dropped_immediately() {
        let (mut hub, _timers) = testkit::hub();
        let client = testkit::connect(&mut hub, None);
        hub.disconnect(&client.session, client.connection_id, "transport close");

        assert!(!hub.connections.is_connected(&client.session));
        assert!(hub.timers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_within_grace_keeps_player_untouched() {
        let (mut hub, mut timers) = testkit::hub();
        let mut alice = testkit::connect(&mut hub, None);
        let mut bob = testkit::connect(&mut hub, None);
        testkit::create(&mut hub, &alice, "R", "p", "Alice");
        testkit::join(&mut hub, &bob, "R", "p", "Bob");

        hub.switch_role(&alice.session, Role::Spymaster);
        hub.switch_consensus(&bob.session, codenames_core::protocol::Consensus::Consensus);
        let word = hub.rooms.get("R").unwrap().game.board[0][0].word.clone();
        hub.players.get_mut(&bob.session).unwrap().guess_proposal = Some(word.clone());
        let before = hub.players.get(&alice.session).unwrap().clone();

        hub.disconnect(&alice.session, alice.connection_id, "ping timeout");
        assert!(hub.timers.is_pending(&TimerKey::Disconnect(alice.session.clone())));
        assert!(!hub.connections.is_connected(&alice.session));

        // Broadcasts during the grace window skip the absent player.
        alice.drain();
        hub.broadcast("R");
        assert!(alice.drain().is_empty());
        assert_eq!(bob.drain().iter().filter(|m| m.is_game_state()).count(), 1);

        let mut back = testkit::connect(&mut hub, Some(&alice.session));
        assert_eq!(back.session, alice.session);
        assert!(!hub.timers.is_pending(&TimerKey::Disconnect(alice.session.clone())));

        let after = hub.players.get(&alice.session).unwrap();
        assert_eq!(after.team, before.team);
        assert_eq!(after.role, Role::Spymaster);
        assert_eq!(after.room, "R");
        assert_eq!(
            hub.players.get(&bob.session).unwrap().guess_proposal.as_deref(),
            Some(word.as_str())
        );

        match back.drain().first() {
            Some(ServerMessage::ServerStats { is_existing_player, game_state, .. }) => {
                assert!(is_existing_player);
                let state = game_state.as_ref().expect("snapshot for returning player");
                assert_eq!(state.room, "R");
                assert_eq!(state.team, before.team);
                assert_ne!(state.team, Team::Undecided);
            }
            other => panic!("unexpected {:?}", other),
        }

        // The cancelled timer never delivers.
        tokio::time::sleep(hub.config.disconnect_grace * 2).await;
        assert!(timers.try_recv().is_err());
        assert!(hub.players.contains(&alice.session));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_disconnects_start_one_timer() {
        let (mut hub, _timers) = testkit::hub();
        let alice = testkit::connect(&mut hub, None);
        testkit::create(&mut hub, &alice, "R", "p", "Alice");

        hub.disconnect(&alice.session, alice.connection_id, "first");
        let again = testkit::connect(&mut hub, Some(&alice.session));
        // Reconnected and dropped again before anything else happened.
        hub.disconnect(&again.session, again.connection_id, "second");
        hub.disconnect(&again.session, again.connection_id, "duplicate");
        assert_eq!(hub.timers.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn grace_expiry_removes_player_and_schedules_room_deletion() {
        let (mut hub, mut timers) = testkit::hub();
        let alice = testkit::connect(&mut hub, None);
        testkit::create(&mut hub, &alice, "R", "p", "Alice");

        hub.disconnect(&alice.session, alice.connection_id, "gone");

        let fired = timers.recv().await.unwrap();
        assert_eq!(fired.key, TimerKey::Disconnect(alice.session.clone()));
        hub.on_timer(fired);

        assert!(!hub.players.contains(&alice.session));
        assert_eq!(hub.rooms.get("R").map(|r| r.members.len()), Some(0));
        assert!(hub.timers.is_pending(&TimerKey::RoomDeletion("R".into())));

        let fired = timers.recv().await.unwrap();
        assert_eq!(fired.key, TimerKey::RoomDeletion("R".into()));
        hub.on_timer(fired);
        assert!(hub.rooms.get("R").is_none());
        assert!(hub.timers.is_empty());
    }

    #[tokio::test]
    async fn superseded_connection_close_is_ignored() {
        let (mut hub, _timers) = testkit::hub();
        let first = testkit::connect(&mut hub, None);
        testkit::create(&mut hub, &first, "R", "p", "Alice");

        let second = testkit::connect(&mut hub, Some(&first.session));
        hub.disconnect(&first.session, first.connection_id, "old tab closed");

        assert!(hub.connections.is_connected(&second.session));
        assert!(hub.timers.is_empty());
    }
}
