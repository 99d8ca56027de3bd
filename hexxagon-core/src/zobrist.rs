//! Zobrist keys for incremental position hashing
//!
//! Keys are generated once per radius from a fixed seed, so hashes are
//! stable across runs and processes. Only player stones carry keys: the
//! Empty and Blocked slots are zero, which makes the incremental cell
//! updates in [`Board::set`](crate::Board::set) agree with the full
//! recompute in [`hash_board`].

use crate::board::{self, Board, CellState};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxHashMap;
use std::sync::{Mutex, OnceLock};

const ZOBRIST_SEED: u64 = 0x6865_7878_6167_6f6e;

/// Read-only key tables for one board radius.
pub struct Zobrist {
    cell: Vec<[u64; 4]>,
    side: [u64; 2],
}

impl Zobrist {
    fn generate(radius: i8) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(ZOBRIST_SEED ^ radius as u64);
        let cell = board::geometry(radius)
            .coords()
            .iter()
            .map(|_| {
                [
                    0, // Empty
                    0, // Blocked (never participates)
                    rng.gen::<u64>(), // PlayerA
                    rng.gen::<u64>(), // PlayerB
                ]
            })
            .collect();
        let side = [rng.gen::<u64>(), rng.gen::<u64>()];
        Self { cell, side }
    }

    /// Key for (cell index, state). Zero for Empty and Blocked.
    #[inline]
    pub(crate) fn cell_key(&self, idx: usize, state: CellState) -> u64 {
        self.cell[idx][state as usize]
    }

    /// Side-to-move key; XOR this into a board hash for turn-aware keys.
    #[inline]
    pub fn side_key(&self, side: CellState) -> u64 {
        match side {
            CellState::PlayerB => self.side[1],
            _ => self.side[0],
        }
    }
}

/// The process-wide table for a radius, generated on first use.
pub fn table(radius: i8) -> &'static Zobrist {
    static CACHE: OnceLock<Mutex<FxHashMap<i8, &'static Zobrist>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(FxHashMap::default()));
    let mut map = cache.lock().unwrap();
    if let Some(table) = map.get(&radius) {
        return table;
    }
    let table: &'static Zobrist = Box::leak(Box::new(Zobrist::generate(radius)));
    map.insert(radius, table);
    table
}

/// Recompute a board hash from scratch: the XOR of the key of every
/// non-Empty cell. Matches the board's incrementally maintained hash.
pub fn hash_board(board: &Board) -> u64 {
    let table = table(board.radius());
    let mut hash = 0u64;
    for (idx, &c) in board.all_coords().iter().enumerate() {
        let state = board.get(c);
        if state != CellState::Empty {
            hash ^= table.cell_key(idx, state);
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::HexCoord;

    #[test]
    fn test_tables_are_deterministic() {
        let a = Zobrist::generate(3);
        let b = Zobrist::generate(3);
        assert_eq!(a.cell, b.cell);
        assert_eq!(a.side, b.side);
    }

    #[test]
    fn test_side_keys_differ() {
        let table = table(3);
        assert_ne!(
            table.side_key(CellState::PlayerA),
            table.side_key(CellState::PlayerB)
        );
    }

    #[test]
    fn test_empty_and_blocked_keys_are_zero() {
        let table = table(3);
        assert_eq!(table.cell_key(0, CellState::Empty), 0);
        assert_eq!(table.cell_key(0, CellState::Blocked), 0);
        assert_ne!(table.cell_key(0, CellState::PlayerA), 0);
    }

    #[test]
    fn test_hash_board_matches_incremental() {
        let mut board = Board::new(2);
        board.set(HexCoord::new(0, 0), CellState::PlayerA).unwrap();
        board.set(HexCoord::new(1, -1), CellState::PlayerB).unwrap();
        board.set(HexCoord::new(0, 1), CellState::Blocked).unwrap();
        assert_eq!(hash_board(&board), board.hash());
    }

    #[test]
    fn test_hash_is_path_independent() {
        let mut a = Board::new(2);
        a.set(HexCoord::new(0, 0), CellState::PlayerA).unwrap();
        a.set(HexCoord::new(1, 0), CellState::PlayerB).unwrap();

        let mut b = Board::new(2);
        b.set(HexCoord::new(1, 0), CellState::PlayerB).unwrap();
        b.set(HexCoord::new(0, 0), CellState::PlayerA).unwrap();

        assert_eq!(a.hash(), b.hash());
    }
}
