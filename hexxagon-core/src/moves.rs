//! Move representation and legal-move generation

use crate::board::{Board, CellState, HexCoord, DIRECTIONS};
use serde::{Deserialize, Serialize};

/// The 6 clone offsets (hex distance 1).
pub const CLONE_DIRS: [HexCoord; 6] = DIRECTIONS;

/// The 12 jump offsets (hex distance 2).
pub const JUMP_DIRS: [HexCoord; 12] = [
    HexCoord::new(2, 0),
    HexCoord::new(2, -1),
    HexCoord::new(2, -2),
    HexCoord::new(1, -2),
    HexCoord::new(0, -2),
    HexCoord::new(-1, -1),
    HexCoord::new(-2, 0),
    HexCoord::new(-2, 1),
    HexCoord::new(-2, 2),
    HexCoord::new(-1, 2),
    HexCoord::new(0, 2),
    HexCoord::new(1, 1),
];

/// A move from one cell to another. Classification is purely geometric:
/// distance 1 is a clone, distance 2 a jump, anything else is illegal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: HexCoord,
    pub to: HexCoord,
}

impl Move {
    pub const fn new(from: HexCoord, to: HexCoord) -> Self {
        Self { from, to }
    }

    /// Clone: the destination is adjacent and the source is retained.
    pub fn is_clone(&self) -> bool {
        self.from.distance_to(self.to) == 1
    }

    /// Jump: the destination is two cells away and the source is vacated.
    pub fn is_jump(&self) -> bool {
        self.from.distance_to(self.to) == 2
    }
}

/// Enumerate every legal move for `side`: from each of its stones, every
/// empty cell at distance 1 or 2. The result order is deterministic
/// (canonical coordinate scan, clone offsets before jump offsets).
pub fn generate_moves(board: &Board, side: CellState) -> Vec<Move> {
    let mut moves = Vec::new();
    for &c in board.all_coords() {
        if board.get(c) != side {
            continue;
        }
        for d in &CLONE_DIRS {
            let to = HexCoord::new(c.q + d.q, c.r + d.r);
            if board.get(to) == CellState::Empty {
                moves.push(Move::new(c, to));
            }
        }
        for d in &JUMP_DIRS {
            let to = HexCoord::new(c.q + d.q, c.r + d.r);
            if board.get(to) == CellState::Empty {
                moves.push(Move::new(c, to));
            }
        }
    }
    moves
}

/// How many opposing stones a move to `to` by `side` would flip.
/// A pure count over the current board; nothing is mutated.
pub fn infection_preview(board: &Board, to: HexCoord, side: CellState) -> i32 {
    let opp = side.opponent();
    board.neighbors(to).filter(|&n| board.get(n) == opp).count() as i32
}
