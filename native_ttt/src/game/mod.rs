//! Tic-tac-toe rules and the per-session state machine.

pub mod rules;
pub mod session;

pub use rules::{evaluate_draw, evaluate_win};
pub use session::{MoveOutcome, RematchOutcome, Session, SessionSnapshot, MAX_SEATS};
