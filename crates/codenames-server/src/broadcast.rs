//! Room snapshots pushed to every member after a mutation.

use codenames_core::protocol::{GameSnapshot, ServerMessage, Team};

use crate::hub::Hub;
use crate::players::PlayerDirectory;
use crate::rooms::Room;

/// The shared view of a room. `team` is left undecided for the caller to
/// personalise.
pub fn snapshot(room: &Room, players: &PlayerDirectory) -> GameSnapshot {
    GameSnapshot {
        room: room.name.clone(),
        players: room
            .members
            .iter()
            .filter_map(|member| players.get(member))
            .map(|p| p.view())
            .collect(),
        game: room.game.clone(),
        difficulty: room.difficulty,
        mode: room.mode,
        consensus: room.consensus,
        team: Team::Undecided,
    }
}

impl Hub {
    /// Send the room's state to every member with a live connection, each
    /// copy stamped with the recipient's own team.
    pub fn broadcast(&self, room_name: &str) {
        let Some(room) = self.rooms.get(room_name) else {
            return;
        };
        let shared = snapshot(room, &self.players);

        for member in &room.members {
            let Some(player) = self.players.get(member) else {
                continue;
            };
            let mut personal = shared.clone();
            personal.team = player.team;
            self.connections
                .send(member, ServerMessage::GameState(Box::new(personal)));
        }
    }

    /// The room snapshot as `session` would receive it.
    pub fn snapshot_for(&self, session: &str) -> Option<GameSnapshot> {
        let player = self.players.get(session)?;
        let room = self.rooms.get(&player.room)?;
        let mut personal = snapshot(room, &self.players);
        personal.team = player.team;
        Some(personal)
    }
}
