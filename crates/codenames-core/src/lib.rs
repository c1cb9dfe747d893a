pub mod board;
pub mod difficulty;
pub mod game;
pub mod protocol;
pub mod words;

pub use board::{Board, CardKind, Tile};
pub use difficulty::Difficulty;
pub use game::{Clue, Game};
pub use protocol::{ClientMessage, ServerMessage};
pub use words::{Pack, Packs};
