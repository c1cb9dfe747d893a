//! The hub owns every player and room and applies client events to them.
//!
//! All mutation goes through `&mut Hub`, so a single lock in [`AppState`]
//! serialises events from sockets, timers and the clock.
//!
//! [`AppState`]: crate::state::AppState

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, info};

use codenames_core::ClientMessage;

use crate::config::ServerConfig;
use crate::players::PlayerDirectory;
use crate::rooms::RoomDirectory;
use crate::scheduler::{Fired, Scheduler};
use crate::session::{Connections, SessionId};

/// Deferred work the hub schedules for itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Remove a disconnected player once their grace period runs out.
    Disconnect(SessionId),
    /// Delete a room that has stayed empty.
    RoomDeletion(String),
}

/// Rooms, seated players and lobby connections, rendered `[R:1 P:2 L:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Census {
    pub rooms: usize,
    pub players: usize,
    pub lobby: usize,
}

impl fmt::Display for Census {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[R:{} P:{} L:{}]", self.rooms, self.players, self.lobby)
    }
}

pub struct Hub {
    pub(crate) config: ServerConfig,
    pub(crate) connections: Arc<Connections>,
    pub(crate) players: PlayerDirectory,
    pub(crate) rooms: RoomDirectory,
    pub(crate) timers: Scheduler<TimerKey>,
    pub(crate) last_restart_warning: Option<NaiveDate>,
}

impl Hub {
    pub fn new(
        config: ServerConfig,
        connections: Arc<Connections>,
    ) -> (Self, mpsc::UnboundedReceiver<Fired<TimerKey>>) {
        let (timers, fired_rx) = Scheduler::new();
        let hub = Self {
            config,
            connections,
            players: PlayerDirectory::new(),
            rooms: RoomDirectory::new(),
            timers,
            last_restart_warning: None,
        };
        (hub, fired_rx)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn census(&self) -> Census {
        let players = self.players.len();
        Census {
            rooms: self.rooms.len(),
            players,
            lobby: self.connections.len().saturating_sub(players),
        }
    }

    /// Activity from `session`: restart its AFK countdown.
    pub fn touch(&mut self, session: &str) {
        self.players.touch(session);
    }

    /// One inbound text frame. The frame counts as activity even when it
    /// does not parse; parse errors are returned for the caller to report.
    pub fn handle_frame(&mut self, session: &str, text: &str) -> Result<(), serde_json::Error> {
        self.touch(session);
        let msg: ClientMessage = serde_json::from_str(text)?;
        self.handle(session, msg);
        Ok(())
    }

    /// Route one parsed client event to its handler.
    pub fn handle(&mut self, session: &str, msg: ClientMessage) {
        match msg {
            ClientMessage::CreateRoom {
                room,
                password,
                nickname,
            } => self.create_room(session, &room, &password, &nickname),
            ClientMessage::JoinRoom {
                room,
                password,
                nickname,
            } => self.join_room(session, &room, &password, &nickname),
            ClientMessage::LeaveRoom => self.leave_room(session),
            ClientMessage::JoinTeam { team } => self.join_team(session, team),
            ClientMessage::RandomizeTeams => self.randomize_teams(session),
            ClientMessage::NewGame => self.new_game(session),
            ClientMessage::SwitchRole { role } => self.switch_role(session, role),
            ClientMessage::SwitchDifficulty { difficulty } => {
                self.switch_difficulty(session, difficulty)
            }
            ClientMessage::SwitchMode { mode } => self.switch_mode(session, mode),
            ClientMessage::SwitchConsensus { consensus } => {
                self.switch_consensus(session, consensus)
            }
            ClientMessage::EndTurn => self.end_turn(session),
            ClientMessage::ClickTile { i, j } => self.click_tile(session, i, j),
            ClientMessage::DeclareClue { clue } => self.declare_clue(session, clue),
            ClientMessage::ChangeCards { pack } => self.change_cards(session, pack),
            ClientMessage::TimerSlider { value } => self.timer_slider(session, value),
        }
    }

    /// Run a timer that expired. Stale expiries are dropped.
    pub fn on_timer(&mut self, fired: Fired<TimerKey>) {
        if !self.timers.complete(&fired) {
            debug!(key = ?fired.key, "stale timer ignored");
            return;
        }

        match fired.key {
            TimerKey::Disconnect(session) => {
                if let Some(player) = self.remove_player(&session) {
                    info!(
                        census = %self.census(),
                        session = %session,
                        nickname = %player.nickname,
                        "disconnect grace expired, player removed"
                    );
                }
            }
            TimerKey::RoomDeletion(room) => self.delete_room(&room),
        }
    }
}
