//! The per-session state machine: seats, turn order, score and rematch votes.
//!
//! `Session` is synchronous and owns no task of its own. The server wraps each
//! one in a dedicated task (see `server::session`) so that every mutation is
//! applied as a single step, in arrival order.

use std::collections::BTreeSet;

use ttt_shared::{Board, Score, ServerMsg, Symbol};

use super::rules::{evaluate_draw, evaluate_win};
use crate::error::JoinError;
use crate::transport::{self, ConnectionId, Outbox};

pub const MAX_SEATS: usize = 2;

#[derive(Debug)]
struct Seat {
    conn: ConnectionId,
    symbol: Symbol,
    outbox: Outbox,
}

/// What happened to an inbound move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Out of turn, occupied, off the board, round over or a seat missing.
    Ignored,
    /// Mark placed; the turn passed to the other symbol.
    Continued,
    Won(Symbol),
    Drawn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RematchOutcome {
    /// Vote recorded (or ignored); still waiting for the other seat.
    Waiting,
    /// Both voted; a new round started with the given symbol to move.
    Restarted(Symbol),
}

/// Read-only copy of a session's state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub board: Board,
    pub current_player: Symbol,
    pub score: Score,
    pub round_starter: Symbol,
    pub round_over: bool,
    pub seats: Vec<Symbol>,
    pub rematch_votes: Vec<Symbol>,
}

#[derive(Debug)]
pub struct Session {
    id: String,
    board: Board,
    seats: Vec<Seat>,
    current_player: Symbol,
    score: Score,
    rematch_votes: BTreeSet<Symbol>,
    round_starter: Symbol,
    round_over: bool,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            board: Board::new(),
            seats: Vec::with_capacity(MAX_SEATS),
            current_player: Symbol::X,
            score: Score::default(),
            rematch_votes: BTreeSet::new(),
            round_starter: Symbol::X,
            round_over: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Symbol {
        self.current_player
    }

    pub fn score(&self) -> Score {
        self.score
    }

    pub fn round_starter(&self) -> Symbol {
        self.round_starter
    }

    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Symbol held by `conn`, if it is still seated.
    pub fn symbol_of(&self, conn: ConnectionId) -> Option<Symbol> {
        self.seats.iter().find(|s| s.conn == conn).map(|s| s.symbol)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board,
            current_player: self.current_player,
            score: self.score,
            round_starter: self.round_starter,
            round_over: self.round_over,
            seats: self.seats.iter().map(|s| s.symbol).collect(),
            rematch_votes: self.rematch_votes.iter().copied().collect(),
        }
    }

    /// Seat a new connection. X goes to the first free seat, then O.
    ///
    /// The joiner alone receives `player_assignment`; filling the second seat
    /// broadcasts `start_game` to both.
    pub fn join(&mut self, conn: ConnectionId, outbox: Outbox) -> Result<Symbol, JoinError> {
        if self.seats.len() >= MAX_SEATS {
            return Err(JoinError::SessionFull);
        }
        let symbol = if self.symbol_taken(Symbol::X) {
            Symbol::O
        } else {
            Symbol::X
        };

        if let Err(e) = outbox.deliver(ServerMsg::PlayerAssignment { player: symbol }) {
            tracing::warn!(session_id = %self.id, %conn, error = %e, "could not send player assignment");
        }
        self.seats.push(Seat {
            conn,
            symbol,
            outbox,
        });
        tracing::info!(session_id = %self.id, %conn, player = %symbol, "player seated");

        if self.seats.len() == MAX_SEATS {
            self.broadcast(ServerMsg::StartGame {
                current_player: self.current_player,
                score: self.score,
            });
        }
        Ok(symbol)
    }

    /// Apply a move for `symbol`. Anything not playable right now is dropped
    /// without touching state or notifying anyone.
    pub fn apply_move(&mut self, symbol: Symbol, row: usize, col: usize) -> MoveOutcome {
        if self.seats.len() != MAX_SEATS
            || self.round_over
            || symbol != self.current_player
            || !self.board.is_empty_at(row, col)
        {
            tracing::debug!(session_id = %self.id, player = %symbol, row, col, "dropping move");
            return MoveOutcome::Ignored;
        }

        self.board.set(row, col, symbol);

        if evaluate_win(&self.board, symbol) {
            self.score.increment(symbol);
            self.round_over = true;
            tracing::info!(session_id = %self.id, winner = %symbol, x = self.score.x, o = self.score.o, "round won");
            self.broadcast(ServerMsg::Win {
                player: symbol,
                board: self.board,
                score: self.score,
            });
            MoveOutcome::Won(symbol)
        } else if evaluate_draw(&self.board) {
            self.round_over = true;
            tracing::info!(session_id = %self.id, "round drawn");
            self.broadcast(ServerMsg::Draw { board: self.board });
            MoveOutcome::Drawn
        } else {
            self.current_player = symbol.opposite();
            self.broadcast(ServerMsg::Move {
                board: self.board,
                current_player: self.current_player,
            });
            MoveOutcome::Continued
        }
    }

    /// Record a rematch vote. Once both seated symbols have voted the board is
    /// cleared and the round starter flips, whoever won the last round.
    pub fn request_rematch(&mut self, symbol: Symbol) -> RematchOutcome {
        if !self.symbol_taken(symbol) {
            return RematchOutcome::Waiting;
        }
        self.rematch_votes.insert(symbol);
        if !(self.rematch_votes.contains(&Symbol::X) && self.rematch_votes.contains(&Symbol::O)) {
            tracing::debug!(session_id = %self.id, player = %symbol, "rematch vote recorded");
            return RematchOutcome::Waiting;
        }

        let next_starter = self.round_starter.opposite();
        self.round_starter = next_starter;
        self.reset_round();
        tracing::info!(session_id = %self.id, starter = %next_starter, "new round");
        self.broadcast(ServerMsg::NewGame {
            board: self.board,
            current_player: self.current_player,
            score: self.score,
        });
        RematchOutcome::Restarted(next_starter)
    }

    /// Release the seat held by `conn` and return how many seats remain.
    ///
    /// An abandoned round is cleared so a later opponent starts on an empty
    /// board; the score is kept. Unknown connections are a no-op.
    pub fn leave(&mut self, conn: ConnectionId) -> usize {
        if self.remove_seat(conn).is_some() && !self.seats.is_empty() {
            self.broadcast(ServerMsg::OpponentLeft);
        }
        self.seats.len()
    }

    fn symbol_taken(&self, symbol: Symbol) -> bool {
        self.seats.iter().any(|s| s.symbol == symbol)
    }

    fn reset_round(&mut self) {
        self.board = Board::new();
        self.current_player = self.round_starter;
        self.rematch_votes.clear();
        self.round_over = false;
    }

    fn remove_seat(&mut self, conn: ConnectionId) -> Option<Symbol> {
        let idx = self.seats.iter().position(|s| s.conn == conn)?;
        let seat = self.seats.remove(idx);
        self.reset_round();
        tracing::info!(session_id = %self.id, %conn, player = %seat.symbol, remaining = self.seats.len(), "player left");
        Some(seat.symbol)
    }

    /// Send to every seat. A seat whose queue is full or closed is evicted as
    /// though it had disconnected, and whoever remains hears `opponent_left`.
    fn broadcast(&mut self, msg: ServerMsg) {
        let mut failed = transport::broadcast(self.seats.iter().map(|s| (s.conn, &s.outbox)), &msg);
        while let Some(conn) = failed.pop() {
            if self.remove_seat(conn).is_some() {
                tracing::warn!(session_id = %self.id, %conn, "evicted unreachable seat");
                failed.extend(transport::broadcast(
                    self.seats.iter().map(|s| (s.conn, &s.outbox)),
                    &ServerMsg::OpponentLeft,
                ));
            }
        }
    }
}
