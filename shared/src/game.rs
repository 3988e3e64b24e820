//! Board, seat symbol and score types for tic-tac-toe.

use serde::{Deserialize, Serialize};

/// Side length of the board.
pub const BOARD_SIZE: usize = 3;

/// The symbol a seat plays with. The first seat in a session is always `X`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    pub fn opposite(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::X => write!(f, "X"),
            Symbol::O => write!(f, "O"),
        }
    }
}

/// Contents of a single board cell. Empty cells travel as `""`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

impl From<Symbol> for Cell {
    fn from(s: Symbol) -> Self {
        match s {
            Symbol::X => Cell::X,
            Symbol::O => Cell::O,
        }
    }
}

/// A 3x3 grid, serialized row-major as a nested array.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Board(pub [[Cell; BOARD_SIZE]; BOARD_SIZE]);

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when `row` or `col` is off the board.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.0.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn is_empty_at(&self, row: usize, col: usize) -> bool {
        matches!(self.get(row, col), Some(Cell::Empty))
    }

    /// Writes `symbol` into the cell. Callers check bounds with [`Board::get`] first.
    pub fn set(&mut self, row: usize, col: usize, symbol: Symbol) {
        if let Some(cell) = self.0.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = symbol.into();
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.0.iter().flat_map(|r| r.iter().copied())
    }
}

/// Rounds won per symbol over the lifetime of a session.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    #[serde(rename = "X")]
    pub x: u32,
    #[serde(rename = "O")]
    pub o: u32,
}

impl Score {
    pub fn get(&self, symbol: Symbol) -> u32 {
        match symbol {
            Symbol::X => self.x,
            Symbol::O => self.o,
        }
    }

    pub fn increment(&mut self, symbol: Symbol) {
        match symbol {
            Symbol::X => self.x += 1,
            Symbol::O => self.o += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_serializes_empty_cells_as_empty_strings() {
        let mut board = Board::new();
        board.set(0, 0, Symbol::X);
        board.set(1, 1, Symbol::O);
        let json = serde_json::to_value(board).unwrap();
        assert_eq!(
            json,
            serde_json::json!([["X", "", ""], ["", "O", ""], ["", "", ""]])
        );
    }

    #[test]
    fn out_of_bounds_access_is_none() {
        let mut board = Board::new();
        assert_eq!(board.get(3, 0), None);
        assert_eq!(board.get(0, 3), None);
        assert!(!board.is_empty_at(5, 5));
        board.set(9, 9, Symbol::X);
        assert!(board.cells().all(Cell::is_empty));
    }

    #[test]
    fn score_keys_are_symbols() {
        let mut score = Score::default();
        score.increment(Symbol::O);
        assert_eq!(score.get(Symbol::O), 1);
        assert_eq!(score.get(Symbol::X), 0);
        let json = serde_json::to_value(score).unwrap();
        assert_eq!(json, serde_json::json!({"X": 0, "O": 1}));
    }
}
