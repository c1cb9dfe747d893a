use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;
use crate::game::{Clue, Game};
use crate::words::Pack;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    #[default]
    Undecided,
    Red,
    Blue,
}

impl Team {
    /// The other playing team. Undecided has no opponent and maps to itself.
    pub fn opponent(&self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
            Team::Undecided => Team::Undecided,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Guesser,
    Spymaster,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Casual,
    Timed,
}

/// How a team's guess is committed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Consensus {
    /// Any guesser's click flips the tile.
    #[default]
    Single,
    /// Every guesser on the team must propose the same word first.
    Consensus,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        room: String,
        password: String,
        nickname: String,
    },
    JoinRoom {
        room: String,
        password: String,
        nickname: String,
    },
    LeaveRoom,
    JoinTeam {
        team: Team,
    },
    RandomizeTeams,
    NewGame,
    SwitchRole {
        role: Role,
    },
    SwitchDifficulty {
        difficulty: Difficulty,
    },
    SwitchMode {
        mode: GameMode,
    },
    SwitchConsensus {
        consensus: Consensus,
    },
    EndTurn,
    ClickTile {
        i: usize,
        j: usize,
    },
    DeclareClue {
        #[serde(flatten)]
        clue: Clue,
    },
    ChangeCards {
        pack: Pack,
    },
    /// Turn length in minutes.
    TimerSlider {
        value: u32,
    },
}

/// What room members can see about each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub nickname: String,
    pub team: Team,
    pub role: Role,
    pub guess_proposal: Option<String>,
}

/// Full room snapshot; `team` is the recipient's own team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub room: String,
    pub players: Vec<PlayerView>,
    pub game: Game,
    pub difficulty: Difficulty,
    pub mode: GameMode,
    pub consensus: Consensus,
    pub team: Team,
}

/// Body of `GET /stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub players: usize,
    pub rooms: usize,
    pub connections: usize,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    ServerStats {
        players: usize,
        rooms: usize,
        session_id: String,
        is_existing_player: bool,
        game_state: Option<Box<GameSnapshot>>,
    },
    CreateResponse {
        success: bool,
        msg: String,
    },
    JoinResponse {
        success: bool,
        msg: String,
    },
    LeaveResponse {
        success: bool,
    },
    SwitchRoleResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        role: Option<Role>,
    },
    NewGameResponse {
        success: bool,
    },
    GameState(Box<GameSnapshot>),
    TimerUpdate {
        timer: i32,
    },
    AfkWarning,
    AfkKicked,
    RestartWarning,
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_messages_use_event_names() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "createRoom", "room": "R", "password": "p", "nickname": "A"
        }))
        .unwrap();
        assert!(matches!(msg, ClientMessage::CreateRoom { ref room, .. } if room == "R"));

        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "switchConsensus", "consensus": "consensus"}))
                .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::SwitchConsensus { consensus: Consensus::Consensus }
        ));

        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "declareClue", "word": "ocean", "count": 2}))
                .unwrap();
        assert!(matches!(msg, ClientMessage::DeclareClue { ref clue } if clue.count == 2));

        let msg: ClientMessage = serde_json::from_value(json!({"type": "endTurn"})).unwrap();
        assert!(matches!(msg, ClientMessage::EndTurn));
    }

    #[test]
    fn unknown_team_is_rejected() {
        let res: Result<ClientMessage, _> =
            serde_json::from_value(json!({"type": "joinTeam", "team": "green"}));
        assert!(res.is_err());
    }

    #[test]
    fn server_messages_are_camel_case() {
        let stats = ServerMessage::ServerStats {
            players: 1,
            rooms: 2,
            session_id: "abc".into(),
            is_existing_player: false,
            game_state: None,
        };
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["type"], "serverStats");
        assert_eq!(value["sessionId"], "abc");
        assert_eq!(value["isExistingPlayer"], false);

        let value = serde_json::to_value(ServerMessage::SwitchRoleResponse {
            success: false,
            role: None,
        })
        .unwrap();
        assert_eq!(value, json!({"type": "switchRoleResponse", "success": false}));

        let value = serde_json::to_value(ServerMessage::AfkKicked).unwrap();
        assert_eq!(value, json!({"type": "afkKicked"}));
    }

    #[test]
    fn game_state_is_flattened_under_the_tag() {
        let snapshot = GameSnapshot {
            room: "R".into(),
            players: vec![PlayerView {
                nickname: "A".into(),
                team: Team::Red,
                role: Role::Guesser,
                guess_proposal: None,
            }],
            game: Game::new(),
            difficulty: Difficulty::Normal,
            mode: GameMode::Casual,
            consensus: Consensus::Single,
            team: Team::Red,
        };
        let value = serde_json::to_value(ServerMessage::GameState(Box::new(snapshot))).unwrap();
        assert_eq!(value["type"], "gameState");
        assert_eq!(value["room"], "R");
        assert_eq!(value["team"], "red");
        assert_eq!(value["players"][0]["guessProposal"], serde_json::Value::Null);
    }
}
