//! Static position evaluation
//!
//! The score is signed from `side`'s point of view and phase-aware: the
//! connected-block term only matters while the board is still mostly
//! open, and the weak-jump term punishes the last mover for jumping into
//! a cell with no support.

use crate::board::{Board, CellState, HexCoord};
use crate::moves::{infection_preview, CLONE_DIRS, JUMP_DIRS};

// ============================================================================
// WEIGHTS
// ============================================================================

const PIECE_WEIGHT: i32 = 5;
const RING_WEIGHT: i32 = 2;
const BLOCK_WEIGHT: i32 = 4;
const BLOCK_MIN_SIZE: usize = 3;
const BLOCK_PHASE_EMPTY_FRACTION: f64 = 0.6;
const WEAK_JUMP_PENALTY: i32 = 50;
const WEAK_JUMP_SUPPORT: i32 = 1;
const CLONE_INFECT_WEIGHT: i32 = 3;
const JUMP_INFECT_WEIGHT: i32 = 2;

// ============================================================================
// EVALUATION
// ============================================================================

/// Score the position from `side`'s perspective; positive is good for
/// `side`. Antisymmetric: `evaluate(b, s) == -evaluate(b, opponent(s))`.
pub fn evaluate(board: &Board, side: CellState) -> i32 {
    let opp = side.opponent();

    let mut my_pieces = 0i32;
    let mut opp_pieces = 0i32;
    let mut my_ring = 0i32;
    let mut opp_ring = 0i32;
    let mut empties = 0i32;
    let mut blocked = 0i32;

    for &c in board.all_coords() {
        let s = board.get(c);
        if s == side {
            my_pieces += 1;
            if board.on_outer_ring(c) {
                my_ring += 1;
            }
        } else if s == opp {
            opp_pieces += 1;
            if board.on_outer_ring(c) {
                opp_ring += 1;
            }
        } else if s == CellState::Empty {
            empties += 1;
        } else {
            blocked += 1;
        }
    }

    let mut score = (my_pieces - opp_pieces) * PIECE_WEIGHT + (my_ring - opp_ring) * RING_WEIGHT;

    let playable = board.all_coords().len() as i32 - blocked;
    let empty_fraction = empties as f64 / playable as f64;
    if empty_fraction > BLOCK_PHASE_EMPTY_FRACTION {
        score += (connected_blocks(board, side) - connected_blocks(board, opp)) * BLOCK_WEIGHT;
    }

    // A jump that lands with at most one friendly neighbor is exposed
    if let Some(last) = board.last_move() {
        if last.is_jump() {
            let mover = board.get(last.to);
            if (mover == side || mover == opp)
                && same_color_neighbors(board, last.to, mover) <= WEAK_JUMP_SUPPORT
            {
                score += if mover == side {
                    -WEAK_JUMP_PENALTY
                } else {
                    WEAK_JUMP_PENALTY
                };
            }
        }
    }

    let (my_clone, my_jump) = max_infection(board, side);
    let (opp_clone, opp_jump) = max_infection(board, opp);
    score += my_clone * CLONE_INFECT_WEIGHT + my_jump * JUMP_INFECT_WEIGHT
        - opp_clone * CLONE_INFECT_WEIGHT
        - opp_jump * JUMP_INFECT_WEIGHT;

    score
}

/// Largest infection any single clone / jump by `side` could achieve,
/// as a pure preview over the current board.
pub(crate) fn max_infection(board: &Board, side: CellState) -> (i32, i32) {
    let mut best_clone = 0;
    let mut best_jump = 0;
    for &c in board.all_coords() {
        if board.get(c) != side {
            continue;
        }
        for d in &CLONE_DIRS {
            let to = HexCoord::new(c.q + d.q, c.r + d.r);
            if board.get(to) == CellState::Empty {
                best_clone = best_clone.max(infection_preview(board, to, side));
            }
        }
        for d in &JUMP_DIRS {
            let to = HexCoord::new(c.q + d.q, c.r + d.r);
            if board.get(to) == CellState::Empty {
                best_jump = best_jump.max(infection_preview(board, to, side));
            }
        }
    }
    (best_clone, best_jump)
}

fn same_color_neighbors(board: &Board, c: HexCoord, color: CellState) -> i32 {
    board.neighbors(c).filter(|&n| board.get(n) == color).count() as i32
}

/// Number of connected same-color groups of at least `BLOCK_MIN_SIZE`.
fn connected_blocks(board: &Board, color: CellState) -> i32 {
    let coords = board.all_coords();
    let mut visited = vec![false; coords.len()];
    let mut blocks = 0;

    for (start_idx, &start) in coords.iter().enumerate() {
        if visited[start_idx] || board.get(start) != color {
            continue;
        }
        visited[start_idx] = true;
        let mut stack = vec![start];
        let mut size = 0usize;
        while let Some(cur) = stack.pop() {
            size += 1;
            for n in board.neighbors(cur) {
                if board.get(n) == color {
                    if let Some(idx) = board.index_of(n) {
                        if !visited[idx] {
                            visited[idx] = true;
                            stack.push(n);
                        }
                    }
                }
            }
        }
        if size >= BLOCK_MIN_SIZE {
            blocks += 1;
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::Move;
    use crate::state::GameState;

    #[test]
    fn test_symmetric_start_is_zero() {
        let gs = GameState::new(4, false);
        assert_eq!(evaluate(gs.board(), CellState::PlayerA), 0);
        assert_eq!(evaluate(gs.board(), CellState::PlayerB), 0);
    }

    #[test]
    fn test_antisymmetry() {
        let mut board = Board::new(3);
        board.set(HexCoord::new(0, 0), CellState::PlayerA).unwrap();
        board.set(HexCoord::new(1, 0), CellState::PlayerA).unwrap();
        board.set(HexCoord::new(3, 0), CellState::PlayerB).unwrap();
        board.set(HexCoord::new(-2, 1), CellState::Blocked).unwrap();

        let a = evaluate(&board, CellState::PlayerA);
        let b = evaluate(&board, CellState::PlayerB);
        assert_eq!(a, -b);
        assert!(a > 0, "two stones and a ring cell should favor A, got {a}");
    }

    #[test]
    fn test_antisymmetry_with_last_move() {
        let mut board = Board::new(3);
        board.set(HexCoord::new(0, 0), CellState::PlayerA).unwrap();
        board.set(HexCoord::new(-3, 0), CellState::PlayerB).unwrap();
        board.make_move(
            Move::new(HexCoord::new(0, 0), HexCoord::new(2, 0)),
            CellState::PlayerA,
        );

        let a = evaluate(&board, CellState::PlayerA);
        let b = evaluate(&board, CellState::PlayerB);
        assert_eq!(a, -b);
    }

    #[test]
    fn test_weak_jump_is_penalized() {
        let mut with_jump = Board::new(3);
        with_jump.set(HexCoord::new(-3, 0), CellState::PlayerA).unwrap();
        with_jump.set(HexCoord::new(0, 0), CellState::PlayerA).unwrap();
        with_jump.set(HexCoord::new(3, 0), CellState::PlayerB).unwrap();

        // Same stones, one reached by an unsupported jump, one placed cold
        let mut placed = with_jump.clone();
        with_jump.make_move(
            Move::new(HexCoord::new(0, 0), HexCoord::new(0, 2)),
            CellState::PlayerA,
        );
        placed.set(HexCoord::new(0, 0), CellState::Empty).unwrap();
        placed.set(HexCoord::new(0, 2), CellState::PlayerA).unwrap();

        let jumped_score = evaluate(&with_jump, CellState::PlayerA);
        let placed_score = evaluate(&placed, CellState::PlayerA);
        assert_eq!(jumped_score, placed_score - WEAK_JUMP_PENALTY);
    }

    #[test]
    fn test_block_bonus_in_opening_phase() {
        // Mostly-empty radius-3 board: the 3-stone group beats 3 scattered
        // stones on the block term, everything else held equal
        let mut grouped = Board::new(3);
        grouped.set(HexCoord::new(0, 0), CellState::PlayerA).unwrap();
        grouped.set(HexCoord::new(1, 0), CellState::PlayerA).unwrap();
        grouped.set(HexCoord::new(0, 1), CellState::PlayerA).unwrap();

        assert_eq!(connected_blocks(&grouped, CellState::PlayerA), 1);

        let mut scattered = Board::new(3);
        scattered.set(HexCoord::new(0, 0), CellState::PlayerA).unwrap();
        scattered.set(HexCoord::new(2, 0), CellState::PlayerA).unwrap();
        scattered.set(HexCoord::new(-2, 0), CellState::PlayerA).unwrap();

        assert_eq!(connected_blocks(&scattered, CellState::PlayerA), 0);
    }

    #[test]
    fn test_max_infection_preview() {
        let mut board = Board::new(2);
        board.set(HexCoord::new(0, 0), CellState::PlayerA).unwrap();
        board.set(HexCoord::new(1, 0), CellState::PlayerB).unwrap();
        board.set(HexCoord::new(1, -1), CellState::PlayerB).unwrap();

        // Clones reach cells touching one B stone; the jump to (2,-1)
        // touches both
        let (clone_max, jump_max) = max_infection(&board, CellState::PlayerA);
        assert_eq!(clone_max, 1);
        assert_eq!(jump_max, 2);
    }
}
