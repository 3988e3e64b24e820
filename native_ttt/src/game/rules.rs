//! Win and draw evaluation over a 3x3 board.

use ttt_shared::{Board, Cell, Symbol};

/// Every row, column and diagonal as (row, col) triples.
const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// True iff `symbol` holds all three cells of some line.
pub fn evaluate_win(board: &Board, symbol: Symbol) -> bool {
    let target = Cell::from(symbol);
    LINES
        .iter()
        .any(|line| line.iter().all(|&(r, c)| board.0[r][c] == target))
}

/// True iff no cell is empty. Only meaningful once [`evaluate_win`] has been ruled out.
pub fn evaluate_draw(board: &Board) -> bool {
    board.cells().all(|cell| !cell.is_empty())
}
