//! Types shared between the tic-tac-toe server and its clients.

pub mod game;
pub mod messages;

pub use game::{Board, Cell, Score, Symbol, BOARD_SIZE};
pub use messages::{ClientMsg, ServerMsg, GAME_FULL};
