//! Room directory: named, password-protected rooms and their lifecycle.

use std::collections::HashMap;

use tracing::{debug, info};

use codenames_core::protocol::{Consensus, GameMode, Role, ServerMessage};
use codenames_core::{Clue, Difficulty, Game, Pack};

use crate::hub::{Hub, TimerKey};
use crate::session::SessionId;

/// A game room.
#[derive(Debug, Clone)]
pub struct Room {
    pub name: String,
    pub password: String,
    /// Seated sessions in join order.
    pub members: Vec<SessionId>,
    pub game: Game,
    pub difficulty: Difficulty,
    pub mode: GameMode,
    pub consensus: Consensus,
}

impl Room {
    pub fn new(name: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            password: password.to_string(),
            members: Vec::new(),
            game: Game::new(),
            difficulty: Difficulty::Normal,
            mode: GameMode::Casual,
            consensus: Consensus::Single,
        }
    }
}

/// Why a create or join request was refused. The display text is shown to
/// the player as-is.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room Already Exists")]
    RoomExists,
    #[error("Room Not Found")]
    RoomNotFound,
    #[error("Incorrect Password")]
    BadPassword,
    #[error("Enter A Valid Room Name")]
    InvalidRoomName,
    #[error("Enter A Valid Nickname")]
    InvalidNickname,
}

#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<String, Room>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Room> {
        self.rooms.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Room> {
        self.rooms.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rooms.contains_key(name)
    }

    pub fn insert(&mut self, room: Room) {
        self.rooms.insert(room.name.clone(), room);
    }

    pub fn remove(&mut self, name: &str) -> Option<Room> {
        self.rooms.remove(name)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// Validate trimmed create arguments.
    pub fn check_create(&self, name: &str, nickname: &str) -> Result<(), RoomError> {
        if self.rooms.contains_key(name) {
            return Err(RoomError::RoomExists);
        }
        if name.is_empty() {
            return Err(RoomError::InvalidRoomName);
        }
        if nickname.is_empty() {
            return Err(RoomError::InvalidNickname);
        }
        Ok(())
    }

    /// Validate trimmed join arguments.
    pub fn check_join(&self, name: &str, password: &str, nickname: &str) -> Result<(), RoomError> {
        let room = self.rooms.get(name).ok_or(RoomError::RoomNotFound)?;
        if room.password != password {
            return Err(RoomError::BadPassword);
        }
        if nickname.is_empty() {
            return Err(RoomError::InvalidNickname);
        }
        Ok(())
    }
}

impl Hub {
    pub fn create_room(&mut self, session: &str, room: &str, password: &str, nickname: &str) {
        let (name, password, nickname) = (room.trim(), password.trim(), nickname.trim());

        if let Err(err) = self.rooms.check_create(name, nickname) {
            self.connections.send(
                session,
                ServerMessage::CreateResponse {
                    success: false,
                    msg: err.to_string(),
                },
            );
            return;
        }

        self.remove_player(session);
        self.rooms.insert(Room::new(name, password));
        let Some(nickname) = self.create_player(session, nickname, name) else {
            return;
        };

        self.connections.send(
            session,
            ServerMessage::CreateResponse {
                success: true,
                msg: String::new(),
            },
        );
        self.broadcast(name);
        info!(
            census = %self.census(),
            session = %session,
            nickname = %nickname,
            room = %name,
            members = self.member_count(name),
            "created room"
        );
    }

    pub fn join_room(&mut self, session: &str, room: &str, password: &str, nickname: &str) {
        let (name, password, nickname) = (room.trim(), password.trim(), nickname.trim());

        if let Err(err) = self.rooms.check_join(name, password, nickname) {
            self.connections.send(
                session,
                ServerMessage::JoinResponse {
                    success: false,
                    msg: err.to_string(),
                },
            );
            return;
        }

        self.remove_player(session);
        if self.timers.cancel(&TimerKey::RoomDeletion(name.to_string())) {
            info!(
                room = %name,
                nickname = %nickname,
                "cancelled room deletion, player joined back"
            );
        }
        let Some(nickname) = self.create_player(session, nickname, name) else {
            return;
        };

        self.connections.send(
            session,
            ServerMessage::JoinResponse {
                success: true,
                msg: String::new(),
            },
        );
        self.broadcast(name);
        info!(
            census = %self.census(),
            session = %session,
            nickname = %nickname,
            room = %name,
            members = self.member_count(name),
            "joined room"
        );
    }

    pub fn leave_room(&mut self, session: &str) {
        if self.remove_player(session).is_some() {
            self.connections
                .send(session, ServerMessage::LeaveResponse { success: true });
        }
    }

    /// Queue an empty room for deletion after the room grace period. A
    /// second call while one is pending does nothing.
    pub fn schedule_room_deletion(&mut self, name: &str) -> bool {
        if !self.rooms.contains(name) {
            return false;
        }
        let scheduled = self.timers.schedule(
            TimerKey::RoomDeletion(name.to_string()),
            self.config.room_deletion_grace,
        );
        if scheduled {
            info!(
                room = %name,
                grace = ?self.config.room_deletion_grace,
                "all players left the room, deletion scheduled"
            );
        }
        scheduled
    }

    pub(crate) fn delete_room(&mut self, name: &str) {
        let empty = self.rooms.get(name).is_some_and(|r| r.members.is_empty());
        if !empty {
            debug!(room = %name, "room repopulated, keeping it");
            return;
        }
        self.rooms.remove(name);
        info!(census = %self.census(), room = %name, "deleted room");
    }

    pub fn new_game(&mut self, session: &str) {
        let Some(name) = self.room_of(session) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&name) else {
            return;
        };
        room.game.init();

        for member in &room.members {
            if let Some(player) = self.players.get_mut(member) {
                player.role = Role::Guesser;
                player.guess_proposal = None;
            }
            self.connections.send(
                member,
                ServerMessage::SwitchRoleResponse {
                    success: true,
                    role: Some(Role::Guesser),
                },
            );
            self.connections
                .send(member, ServerMessage::NewGameResponse { success: true });
        }
        self.broadcast(&name);
    }

    pub fn end_turn(&mut self, session: &str) {
        let Some(name) = self.room_of(session) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&name) else {
            return;
        };
        room.game.switch_turn(true);
        self.players.clear_proposals(&room.members);
        self.broadcast(&name);
    }

    pub fn declare_clue(&mut self, session: &str, clue: Clue) {
        let Some(player) = self.players.get(session) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&player.room) else {
            return;
        };
        if player.team != room.game.turn || room.game.over || player.role != Role::Spymaster {
            return;
        }
        if room.game.declare_clue(clue) {
            let name = room.name.clone();
            self.broadcast(&name);
        }
    }

    pub fn switch_difficulty(&mut self, session: &str, difficulty: Difficulty) {
        self.update_room(session, |room| room.difficulty = difficulty);
    }

    /// Changing mode restarts the turn countdown.
    pub fn switch_mode(&mut self, session: &str, mode: GameMode) {
        self.update_room(session, |room| {
            room.mode = mode;
            room.game.timer = room.game.timer_amount;
        });
    }

    /// Changing policy discards every outstanding vote.
    pub fn switch_consensus(&mut self, session: &str, consensus: Consensus) {
        let Some(name) = self.room_of(session) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&name) else {
            return;
        };
        self.players.clear_proposals(&room.members);
        room.consensus = consensus;
        self.broadcast(&name);
    }

    /// Toggle a word pack, keeping at least one enabled.
    pub fn change_cards(&mut self, session: &str, pack: Pack) {
        self.update_room(session, |room| {
            let game = &mut room.game;
            game.packs.toggle(pack);
            if !game.packs.any() {
                game.packs.base = true;
            }
            game.update_word_pool();
        });
    }

    /// Set the turn length from the slider, in minutes.
    pub fn timer_slider(&mut self, session: &str, minutes: u32) {
        let Some(name) = self.room_of(session) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&name) else {
            return;
        };
        let seconds =
            i32::try_from(minutes.saturating_mul(60).saturating_add(1)).unwrap_or(i32::MAX);
        if room.game.timer_amount != seconds {
            room.game.timer_amount = seconds;
            room.game.timer = seconds;
            self.broadcast(&name);
        }
    }

    pub(crate) fn room_of(&self, session: &str) -> Option<String> {
        self.players.get(session).map(|p| p.room.clone())
    }

    fn member_count(&self, name: &str) -> usize {
        self.rooms.get(name).map_or(0, |r| r.members.len())
    }

    fn update_room(&mut self, session: &str, apply: impl FnOnce(&mut Room)) {
        let Some(name) = self.room_of(session) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&name) else {
            return;
        };
        apply(room);
        self.broadcast(&name);
    }
}
