//! Tile clicks, including the consensus vote that gates a flip.

use codenames_core::protocol::{Consensus, Role, Team};

use crate::hub::Hub;
use crate::players::Player;

/// Whether every guesser on `team` has proposed `word`.
pub fn team_agrees<'a>(
    members: impl IntoIterator<Item = &'a Player>,
    team: Team,
    word: &str,
) -> bool {
    members
        .into_iter()
        .filter(|p| p.team == team && p.role != Role::Spymaster)
        .all(|p| p.guess_proposal.as_deref() == Some(word))
}

impl Hub {
    /// A guesser clicked tile (i, j). Clicks out of turn, from a spymaster or
    /// after the game ended are dropped. Under the consensus policy the click
    /// is a vote (clicking your own vote again retracts it) and the tile only
    /// flips once the whole team agrees.
    pub fn click_tile(&mut self, session: &str, i: usize, j: usize) {
        let Some(player) = self.players.get(session) else {
            return;
        };
        let (team, role, current) = (player.team, player.role, player.guess_proposal.clone());
        let name = player.room.clone();
        let Some(room) = self.rooms.get_mut(&name) else {
            return;
        };

        if team != room.game.turn || room.game.over || role == Role::Spymaster {
            return;
        }

        match room.consensus {
            Consensus::Single => {
                room.game.flip_tile(i, j);
            }
            Consensus::Consensus => {
                let word = match room.game.tile(i, j) {
                    Some(tile) if !tile.flipped => tile.word.clone(),
                    _ => return,
                };

                let retract = current.as_deref() == Some(word.as_str());
                if let Some(player) = self.players.get_mut(session) {
                    player.guess_proposal = if retract { None } else { Some(word.clone()) };
                }

                let agreed = !retract
                    && team_agrees(
                        room.members.iter().filter_map(|m| self.players.get(m)),
                        team,
                        &word,
                    );
                if agreed {
                    room.game.flip_tile(i, j);
                    self.players.clear_proposals(&room.members);
                }
            }
        }

        self.broadcast(&name);
    }
}
