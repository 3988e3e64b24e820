//! Client-server messaging protocol. Every message is a JSON object tagged by `event`.

use serde::{Deserialize, Serialize};

use crate::game::{Board, Score, Symbol};

/// Error text sent to a client that tries to join a session with both seats taken.
pub const GAME_FULL: &str = "Game is full";

/// Messages that clients can send to the server
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientMsg {
    MakeMove { row: usize, col: usize },
    RematchRequest,
}

/// Messages that the server can send to clients
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Sent only to the joining client.
    PlayerAssignment { player: Symbol },
    StartGame {
        current_player: Symbol,
        score: Score,
    },
    Move {
        board: Board,
        current_player: Symbol,
    },
    Win {
        player: Symbol,
        board: Board,
        score: Score,
    },
    Draw { board: Board },
    NewGame {
        board: Board,
        current_player: Symbol,
        score: Score,
    },
    OpponentLeft,
    Error { error: String },
}

impl ServerMsg {
    pub fn game_full() -> Self {
        ServerMsg::Error {
            error: GAME_FULL.to_owned(),
        }
    }
}
