use serde::{Deserialize, Serialize};

use crate::protocol::Team;

pub const BOARD_SIZE: usize = 5;

/// Hidden identity of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Red,
    Blue,
    Neutral,
    Death,
}

impl CardKind {
    pub fn team(&self) -> Option<Team> {
        match self {
            CardKind::Red => Some(Team::Red),
            CardKind::Blue => Some(Team::Blue),
            CardKind::Neutral | CardKind::Death => None,
        }
    }

    pub fn of_team(team: Team) -> Option<CardKind> {
        match team {
            Team::Red => Some(CardKind::Red),
            Team::Blue => Some(CardKind::Blue),
            Team::Undecided => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub word: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub flipped: bool,
}

impl Tile {
    pub fn new(word: impl Into<String>, kind: CardKind) -> Self {
        Self {
            word: word.into(),
            kind,
            flipped: false,
        }
    }
}

/// Row-major grid, indexed `board[i][j]`.
pub type Board = Vec<Vec<Tile>>;
