//! Player directory: one record per seated session.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::RngExt;
use tracing::info;

use codenames_core::protocol::{PlayerView, Role, ServerMessage, Team};

use crate::hub::{Hub, TimerKey};
use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub session: SessionId,
    pub nickname: String,
    pub room: String,
    pub team: Team,
    pub role: Role,
    /// Word this player votes to flip under the consensus policy.
    pub guess_proposal: Option<String>,
    /// Seconds left before an AFK kick.
    pub afk_timer: i64,
    /// Value `afk_timer` is reset to on activity.
    pub timeout: i64,
}

impl Player {
    pub fn new(session: &str, nickname: String, room: &str, timeout: i64) -> Self {
        Self {
            session: session.to_string(),
            nickname,
            room: room.to_string(),
            team: Team::Undecided,
            role: Role::Guesser,
            guess_proposal: None,
            afk_timer: timeout,
            timeout,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            nickname: self.nickname.clone(),
            team: self.team,
            role: self.role,
            guess_proposal: self.guess_proposal.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PlayerDirectory {
    players: HashMap<SessionId, Player>,
}

impl PlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, session: &str) -> Option<&Player> {
        self.players.get(session)
    }

    pub fn get_mut(&mut self, session: &str) -> Option<&mut Player> {
        self.players.get_mut(session)
    }

    pub fn contains(&self, session: &str) -> bool {
        self.players.contains_key(session)
    }

    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.session.clone(), player);
    }

    pub fn remove(&mut self, session: &str) -> Option<Player> {
        self.players.remove(session)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    /// Activity from the player: restart the AFK countdown.
    pub fn touch(&mut self, session: &str) {
        if let Some(player) = self.players.get_mut(session) {
            player.afk_timer = player.timeout;
        }
    }

    pub fn clear_proposals(&mut self, members: &[SessionId]) {
        for member in members {
            if let Some(player) = self.players.get_mut(member) {
                player.guess_proposal = None;
            }
        }
    }
}

/// First free nickname among `name`, `name(1)`, `name(2)`, ...
pub fn resolve_nickname(requested: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let mut candidate = requested.to_string();
    let mut counter = 0;
    while is_taken(&candidate) {
        counter += 1;
        candidate = format!("{}({})", requested, counter);
    }
    candidate
}

/// Parity balancing on the post-join member count: even goes blue, odd red.
pub fn initial_team(member_count: usize) -> Team {
    if member_count % 2 == 0 {
        Team::Blue
    } else {
        Team::Red
    }
}

impl Hub {
    /// Seat `session` in `room_name` with a collision-free nickname and an
    /// initial team. Returns the nickname actually used.
    pub(crate) fn create_player(
        &mut self,
        session: &str,
        nickname: &str,
        room_name: &str,
    ) -> Option<String> {
        let room = self.rooms.get_mut(room_name)?;
        let players = &self.players;
        let resolved = resolve_nickname(nickname, |candidate| {
            room.members
                .iter()
                .filter_map(|member| players.get(member))
                .any(|p| p.nickname == candidate)
        });

        let mut player = Player::new(
            session,
            resolved.clone(),
            room_name,
            self.config.afk_timeout_secs,
        );
        room.members.push(session.to_string());
        player.team = initial_team(room.members.len());
        self.players.insert(player);
        Some(resolved)
    }

    /// Delete the player, tell the room, and queue the room for deletion if
    /// it is now empty.
    pub fn remove_player(&mut self, session: &str) -> Option<Player> {
        let player = self.players.remove(session)?;
        self.timers.cancel(&TimerKey::Disconnect(session.to_string()));

        let remaining = match self.rooms.get_mut(&player.room) {
            Some(room) => {
                room.members.retain(|member| member != session);
                room.members.len()
            }
            None => 0,
        };

        self.broadcast(&player.room);
        info!(
            census = %self.census(),
            session = %session,
            nickname = %player.nickname,
            room = %player.room,
            members = remaining,
            "left room"
        );

        if remaining == 0 {
            self.schedule_room_deletion(&player.room);
        }
        Some(player)
    }

    pub fn join_team(&mut self, session: &str, team: Team) {
        let Some(player) = self.players.get_mut(session) else {
            return;
        };
        player.team = team;
        let room = player.room.clone();
        self.broadcast(&room);
    }

    /// Shuffle the room and deal players alternately onto red and blue,
    /// starting from a random colour.
    pub fn randomize_teams(&mut self, session: &str) {
        let Some(room_name) = self.room_of(session) else {
            return;
        };
        let Some(room) = self.rooms.get(&room_name) else {
            return;
        };

        let mut rng = rand::rng();
        let mut order = room.members.clone();
        order.shuffle(&mut rng);
        let mut team = if rng.random_bool(0.5) {
            Team::Red
        } else {
            Team::Blue
        };

        for member in &order {
            if let Some(player) = self.players.get_mut(member) {
                player.team = team;
                team = team.opponent();
            }
        }
        self.broadcast(&room_name);
    }

    /// Guessers on a team may become spymaster (or re-pick guesser). A
    /// spymaster has seen the key and stays one until the next game.
    pub fn switch_role(&mut self, session: &str, role: Role) {
        let Some(player) = self.players.get_mut(session) else {
            return;
        };

        if player.team == Team::Undecided || player.role == Role::Spymaster {
            self.connections.send(
                session,
                ServerMessage::SwitchRoleResponse {
                    success: false,
                    role: None,
                },
            );
            return;
        }

        player.role = role;
        let room = player.room.clone();
        self.connections.send(
            session,
            ServerMessage::SwitchRoleResponse {
                success: true,
                role: Some(role),
            },
        );
        self.broadcast(&room);
    }
}
