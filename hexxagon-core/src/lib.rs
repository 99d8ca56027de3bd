//! Hexxagon Core - Game engine and AI
//!
//! This crate provides the core engine for Hexxagon, a two-player
//! infection game on a hexagonal board:
//! - Board geometry (hex grid with axial coordinates, dense cell store)
//! - Move generation and the clone/jump/infection rules
//! - Game state with end-of-game detection and enclosed-region scoring
//! - Incremental Zobrist hashing and a shared transposition table
//! - Phase-aware position evaluation
//! - Parallel alpha-beta search with iterative deepening

pub mod board;
pub mod error;
pub mod eval;
pub mod moves;
pub mod search;
pub mod state;
pub mod tt;
pub mod zobrist;

// Re-exports for convenient access
pub use board::{Board, CellState, HexCoord, UndoRecord, DIRECTIONS};
pub use error::GameError;
pub use eval::evaluate;
pub use moves::{generate_moves, infection_preview, Move};
pub use search::{find_best_move, iterative_deepening, Searcher};
pub use state::{GameState, MoveOutcome, WIN_SCORE};
pub use tt::{TranspositionTable, TtFlag};
pub use zobrist::hash_board;
