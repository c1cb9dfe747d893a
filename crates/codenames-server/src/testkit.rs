//! Helpers for driving a [`Hub`] directly in unit tests.

use std::sync::Arc;

use tokio::sync::mpsc;

use codenames_core::protocol::{GameSnapshot, ServerMessage};

use crate::config::ServerConfig;
use crate::hub::{Hub, TimerKey};
use crate::scheduler::Fired;
use crate::session::{Connections, SessionId};

pub fn hub() -> (Hub, mpsc::UnboundedReceiver<Fired<TimerKey>>) {
    Hub::new(ServerConfig::default(), Arc::new(Connections::new()))
}

/// A connected client as the hub sees it.
pub struct Client {
    pub session: SessionId,
    pub connection_id: u64,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Client {
    /// Everything queued for this client so far.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut msgs = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    pub fn last_state(&mut self) -> Option<GameSnapshot> {
        last_state(&self.drain())
    }
}

pub fn connect(hub: &mut Hub, supplied: Option<&str>) -> Client {
    let (tx, rx) = mpsc::unbounded_channel();
    let (session, connection_id) = hub.connect(supplied, tx);
    Client {
        session,
        connection_id,
        rx,
    }
}

pub fn create(hub: &mut Hub, client: &Client, room: &str, password: &str, nickname: &str) {
    hub.create_room(&client.session, room, password, nickname);
}

pub fn join(hub: &mut Hub, client: &Client, room: &str, password: &str, nickname: &str) {
    hub.join_room(&client.session, room, password, nickname);
}

pub fn last_state(msgs: &[ServerMessage]) -> Option<GameSnapshot> {
    msgs.iter().rev().find_map(|m| match m {
        ServerMessage::GameState(state) => Some(state.as_ref().clone()),
        _ => None,
    })
}

pub trait ServerMessageExt {
    fn is_game_state(&self) -> bool;
}

impl ServerMessageExt for ServerMessage {
    fn is_game_state(&self) -> bool {
        matches!(self, ServerMessage::GameState(_))
    }
}
