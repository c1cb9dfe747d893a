use rand::seq::SliceRandom;
use rand::{rng, RngExt};
use serde::{Deserialize, Serialize};

use crate::board::{Board, CardKind, Tile, BOARD_SIZE};
use crate::protocol::Team;
use crate::words::{build_pool, Packs};

/// Cards owned by the team that moves first.
pub const STARTING_TEAM_CARDS: u8 = 9;
/// Cards owned by the team that moves second.
pub const SECOND_TEAM_CARDS: u8 = 8;
pub const NEUTRAL_CARDS: usize = 7;
/// One minute on the slider, plus the tick that displays the full minute.
pub const DEFAULT_TIMER_AMOUNT: i32 = 61;
pub const MAX_CLUE_COUNT: u8 = 9;

/// A spymaster's clue: one word and the number of related cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub word: String,
    pub count: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LogEntry {
    Flip {
        team: Team,
        word: String,
        #[serde(rename = "type")]
        kind: CardKind,
    },
    Clue {
        team: Team,
        word: String,
        count: u8,
    },
    TurnSwitch {
        from: Team,
        forced: bool,
    },
}

/// One board game: the grid, whose turn it is, the turn timer and the
/// word packs the next board is drawn from.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub board: Board,
    pub turn: Team,
    pub over: bool,
    pub winner: Option<Team>,
    /// Unrevealed red cards.
    pub red: u8,
    /// Unrevealed blue cards.
    pub blue: u8,
    pub clue: Option<Clue>,
    pub timer: i32,
    pub timer_amount: i32,
    #[serde(flatten)]
    pub packs: Packs,
    pub log: Vec<LogEntry>,
    #[serde(skip)]
    word_pool: Vec<String>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        let packs = Packs::default();
        let mut game = Self {
            board: Vec::new(),
            turn: Team::Red,
            over: false,
            winner: None,
            red: 0,
            blue: 0,
            clue: None,
            timer: DEFAULT_TIMER_AMOUNT,
            timer_amount: DEFAULT_TIMER_AMOUNT,
            packs,
            log: Vec::new(),
            word_pool: build_pool(&packs),
        };
        game.init();
        game
    }

    /// Deal a fresh board from the current word pool.
    pub fn init(&mut self) {
        let mut rng = rng();

        self.turn = if rng.random_bool(0.5) {
            Team::Red
        } else {
            Team::Blue
        };
        let second = self.turn.opponent();

        let mut kinds: Vec<CardKind> = Vec::with_capacity(BOARD_SIZE * BOARD_SIZE);
        kinds.extend(std::iter::repeat_n(card_of(self.turn), STARTING_TEAM_CARDS as usize));
        kinds.extend(std::iter::repeat_n(card_of(second), SECOND_TEAM_CARDS as usize));
        kinds.extend(std::iter::repeat_n(CardKind::Neutral, NEUTRAL_CARDS));
        kinds.push(CardKind::Death);
        kinds.shuffle(&mut rng);

        if self.word_pool.is_empty() {
            self.word_pool = build_pool(&Packs::default());
        }
        let mut words = self.word_pool.clone();
        words.shuffle(&mut rng);
        // Small pools repeat rather than leave holes in the grid.
        let mut words = words.into_iter().cycle();

        self.board = (0..BOARD_SIZE)
            .map(|i| {
                (0..BOARD_SIZE)
                    .map(|j| {
                        let word = words.next().unwrap_or_default();
                        Tile::new(word, kinds[i * BOARD_SIZE + j])
                    })
                    .collect()
            })
            .collect();

        let (red, blue) = match self.turn {
            Team::Blue => (SECOND_TEAM_CARDS, STARTING_TEAM_CARDS),
            _ => (STARTING_TEAM_CARDS, SECOND_TEAM_CARDS),
        };
        self.red = red;
        self.blue = blue;
        self.over = false;
        self.winner = None;
        self.clue = None;
        self.timer = self.timer_amount;
        self.log.clear();
    }

    /// Rebuild the word pool from the enabled packs. Takes effect on the next `init`.
    pub fn update_word_pool(&mut self) {
        self.word_pool = build_pool(&self.packs);
    }

    pub fn tile(&self, i: usize, j: usize) -> Option<&Tile> {
        self.board.get(i).and_then(|row| row.get(j))
    }

    /// Reveal a tile for the team whose turn it is. Returns false when
    /// nothing changed (game over, out of range or already revealed).
    pub fn flip_tile(&mut self, i: usize, j: usize) -> bool {
        if self.over {
            return false;
        }
        let team = self.turn;
        let (word, kind) = match self.board.get_mut(i).and_then(|row| row.get_mut(j)) {
            Some(tile) if !tile.flipped => {
                tile.flipped = true;
                (tile.word.clone(), tile.kind)
            }
            _ => return false,
        };

        self.log.push(LogEntry::Flip { team, word, kind });

        match kind {
            CardKind::Death => self.finish(team.opponent()),
            CardKind::Neutral => self.switch_turn(false),
            CardKind::Red | CardKind::Blue => {
                let owner = kind.team().unwrap_or(team);
                let remaining = match owner {
                    Team::Blue => &mut self.blue,
                    _ => &mut self.red,
                };
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    self.finish(owner);
                } else if owner != team {
                    self.switch_turn(false);
                }
            }
        }
        true
    }

    /// Hand the turn to the other team. `forced` marks switches imposed by
    /// the end-turn button or the turn timer rather than a wrong guess.
    pub fn switch_turn(&mut self, forced: bool) {
        if self.over {
            return;
        }
        self.log.push(LogEntry::TurnSwitch {
            from: self.turn,
            forced,
        });
        self.turn = self.turn.opponent();
        self.clue = None;
        self.timer = self.timer_amount;
    }

    /// Record the current team's clue. Returns whether it was accepted.
    pub fn declare_clue(&mut self, clue: Clue) -> bool {
        if self.over || self.clue.is_some() {
            return false;
        }
        let word = clue.word.trim();
        if word.is_empty() || word.contains(char::is_whitespace) || clue.count > MAX_CLUE_COUNT {
            return false;
        }
        let on_board = self
            .board
            .iter()
            .flatten()
            .any(|t| !t.flipped && t.word.eq_ignore_ascii_case(word));
        if on_board {
            return false;
        }

        let clue = Clue {
            word: word.to_string(),
            count: clue.count,
        };
        self.log.push(LogEntry::Clue {
            team: self.turn,
            word: clue.word.clone(),
            count: clue.count,
        });
        self.clue = Some(clue);
        true
    }

    fn finish(&mut self, winner: Team) {
        self.over = true;
        self.winner = Some(winner);
        self.clue = None;
    }
}

fn card_of(team: Team) -> CardKind {
    CardKind::of_team(team).unwrap_or(CardKind::Neutral)
}
