//! Engine error types

use crate::board::HexCoord;
use thiserror::Error;

/// Errors surfaced by the rules layer and board mutators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    /// A set/get targeted a coordinate outside the board radius.
    #[error("coordinate ({}, {}) is out of bounds", .0.q, .0.r)]
    OutOfBounds(HexCoord),

    /// Source not owned by the mover, destination not empty, or the
    /// hex distance is neither 1 (clone) nor 2 (jump).
    #[error("illegal move")]
    IllegalMove,

    /// A move was attempted after the game ended.
    #[error("game is already over")]
    GameOver,
}
