//! Alpha-beta search with a shared transposition table
//!
//! The root fans out over rayon, one task per ordered candidate move;
//! below the root each worker runs a fully sequential recursion on its
//! own board, backtracking with make/unmake instead of cloning. Iterative
//! deepening reuses the table across depths so the best-move hints from
//! one iteration order the next.

use crate::board::{Board, CellState};
use crate::eval::{evaluate, max_infection};
use crate::moves::{generate_moves, infection_preview, Move};
use crate::tt::{TranspositionTable, TtFlag};
use crate::zobrist;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::{Arc, Mutex, OnceLock};

// ============================================================================
// CONSTANTS
// ============================================================================

const INF: i32 = 1 << 30;

/// Bias subtracted from a MAX-side jump's score (added for MIN) so the
/// search prefers growing over roaming.
const JUMP_PENALTY: i32 = 25;

/// Above this empty fraction the root considers only outward clones.
const OPENING_EMPTY_FRACTION: f64 = 0.76;

/// Root candidates within this margin of the best score form a tie group.
const TIE_MARGIN: i32 = 3;

/// With this few empties left, the search depth is raised by the boost.
const ENDGAME_EMPTY_LIMIT: usize = 10;
const ENDGAME_DEPTH_BOOST: u32 = 2;

const DEFAULT_SEED: u64 = 42;

// ============================================================================
// SEARCHER
// ============================================================================

/// Search driver owning a (shareable) transposition table and the RNG
/// used to break root ties reproducibly.
pub struct Searcher {
    tt: Arc<TranspositionTable>,
    rng: ChaCha8Rng,
}

impl Searcher {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_table(Arc::new(TranspositionTable::default()), seed)
    }

    pub fn with_table(tt: Arc<TranspositionTable>, seed: u64) -> Self {
        Self {
            tt,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn table(&self) -> &Arc<TranspositionTable> {
        &self.tt
    }

    /// Best move for `side`, or `None` iff the side has no legal moves.
    ///
    /// The root first looks for an immediately winning or clearly safe
    /// clone, then filters and orders the candidates, searches them in
    /// parallel, and picks from the near-best tie group (clones first,
    /// then uniformly at random).
    pub fn find_best_move(&mut self, board: &Board, side: CellState, depth: u32) -> Option<Move> {
        let moves = generate_moves(board, side);
        if moves.is_empty() {
            return None;
        }

        if let Some(mv) = secure_clone(board, side, &moves) {
            return Some(mv);
        }

        let depth = if board.count_empty() <= ENDGAME_EMPTY_LIMIT {
            depth + ENDGAME_DEPTH_BOOST
        } else {
            depth
        };

        let candidates = filter_pointless_jumps(board, side, opening_filter(board, moves));
        let ordered = order_by_static_eval(board, side, candidates);

        let opp = side.opponent();
        let tt = &self.tt;
        let results: Vec<(Move, i32)> = ordered
            .par_iter()
            .map(|&mv| {
                let mut child = board.clone();
                child.make_move(mv, side);
                let score = alpha_beta(
                    &mut child,
                    tt,
                    opp,
                    side,
                    depth.saturating_sub(1),
                    -INF,
                    INF,
                );
                (mv, score)
            })
            .collect();

        let best_score = results.iter().map(|&(_, s)| s).max()?;
        let tie_group: Vec<Move> = results
            .iter()
            .filter(|&&(_, s)| best_score - s <= TIE_MARGIN)
            .map(|&(mv, _)| mv)
            .collect();
        let clones: Vec<Move> = tie_group.iter().copied().filter(|m| m.is_clone()).collect();
        let pool = if clones.is_empty() { tie_group } else { clones };
        Some(pool[self.rng.gen_range(0..pool.len())])
    }

    /// Deepen from 1 to `max_depth`, letting the transposition table seed
    /// move ordering between iterations. Returns the move from the
    /// deepest completed iteration, `None` iff there are no legal moves.
    pub fn iterative_deepening(
        &mut self,
        board: &Board,
        side: CellState,
        max_depth: u32,
    ) -> Option<Move> {
        let mut best = None;
        for depth in 1..=max_depth.max(1) {
            match self.find_best_move(board, side, depth) {
                Some(mv) => best = Some(mv),
                None => return None,
            }
        }
        best
    }

    /// Alpha-beta score of the position from `side`'s perspective, with
    /// `side` to move. Used for labeling in self-play.
    pub fn search_score(&self, board: &Board, side: CellState, depth: u32) -> i32 {
        let mut scratch = board.clone();
        alpha_beta(&mut scratch, &self.tt, side, side, depth, -INF, INF)
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ROOT HELPERS
// ============================================================================

/// A clone that wins on the spot (opponent left without moves or the
/// board fills) is played immediately; failing that, a clone that keeps
/// us ahead of the opponent's best single infection is remembered. Stops
/// the search from trading a won position for a flashy jump.
fn secure_clone(board: &Board, side: CellState, moves: &[Move]) -> Option<Move> {
    let opp = side.opponent();
    let mut scratch = board.clone();
    let mut safe = None;

    for &mv in moves.iter().filter(|m| m.is_clone()) {
        let (_, undo) = scratch.make_move(mv, side);
        if generate_moves(&scratch, opp).is_empty() || scratch.count_empty() == 0 {
            return Some(mv);
        }
        if safe.is_none() {
            let lead = scratch.count_pieces(side) as i32 - scratch.count_pieces(opp) as i32;
            let (opp_clone, opp_jump) = max_infection(&scratch, opp);
            if lead > opp_clone.max(opp_jump) {
                safe = Some(mv);
            }
        }
        scratch.unmake_move(undo);
    }
    safe
}

/// While the board is still mostly empty, restrict the root to clones
/// that expand toward the outer ring; fall back to any clone, then to
/// the unfiltered list.
fn opening_filter(board: &Board, moves: Vec<Move>) -> Vec<Move> {
    if board.empty_fraction() < OPENING_EMPTY_FRACTION {
        return moves;
    }
    let ring_clones: Vec<Move> = moves
        .iter()
        .copied()
        .filter(|m| m.is_clone() && board.on_outer_ring(m.to))
        .collect();
    if !ring_clones.is_empty() {
        return ring_clones;
    }
    let clones: Vec<Move> = moves.iter().copied().filter(|m| m.is_clone()).collect();
    if !clones.is_empty() {
        return clones;
    }
    moves
}

/// Drop jumps that would flip nothing. Falls back to the original list
/// when the filter would leave nothing to play.
fn filter_pointless_jumps(board: &Board, side: CellState, moves: Vec<Move>) -> Vec<Move> {
    let kept: Vec<Move> = moves
        .iter()
        .copied()
        .filter(|m| m.is_clone() || infection_preview(board, m.to, side) > 0)
        .collect();
    if kept.is_empty() {
        moves
    } else {
        kept
    }
}

/// Apply each candidate on a scratch board and sort by the static score,
/// best first; ties go to clones before jumps.
fn order_by_static_eval(board: &Board, side: CellState, moves: Vec<Move>) -> Vec<Move> {
    let mut scratch = board.clone();
    let mut scored: Vec<(Move, i32)> = moves
        .into_iter()
        .map(|mv| {
            let (_, undo) = scratch.make_move(mv, side);
            let score = evaluate(&scratch, side);
            scratch.unmake_move(undo);
            (mv, score)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| a.0.is_jump().cmp(&b.0.is_jump()))
    });
    scored.into_iter().map(|(mv, _)| mv).collect()
}

// ============================================================================
// ALPHA-BETA
// ============================================================================

/// MIN/MAX alpha-beta from `original`'s perspective with `current` to
/// move, backtracking in place through make/unmake. Transposition keys
/// are the board hash XOR the side-to-move key; stored scores are
/// normalized to the side to move so entries stay valid no matter which
/// player's search produced them.
fn alpha_beta(
    board: &mut Board,
    tt: &TranspositionTable,
    current: CellState,
    original: CellState,
    depth: u32,
    mut alpha: i32,
    mut beta: i32,
) -> i32 {
    let moves = generate_moves(board, current);
    let key = board.hash() ^ zobrist::table(board.radius()).side_key(current);

    if depth == 0 || moves.is_empty() {
        let score = evaluate(board, original);
        tt_store(tt, key, depth as i16, score, TtFlag::Exact, current, original);
        return score;
    }

    if let Some((score, flag)) = tt_probe(tt, key, depth as i16, current, original) {
        match flag {
            TtFlag::Exact => return score,
            TtFlag::LowerBound => alpha = alpha.max(score),
            TtFlag::UpperBound => beta = beta.min(score),
        }
        if alpha >= beta {
            return score;
        }
    }
    let alpha_orig = alpha;
    let beta_orig = beta;

    // The maximizing side never considers jumps that flip nothing
    let mut moves = if current == original {
        filter_pointless_jumps(board, current, moves)
    } else {
        moves
    };

    // Principal-variation move first
    let mut pv_idx = 0usize;
    if let Some(idx) = tt.probe_best_idx(key) {
        let idx = idx as usize;
        if idx != 0 && idx < moves.len() {
            moves.swap(0, idx);
            pv_idx = idx;
        }
    }
    // Iterated position -> index in the pre-swap canonical order
    let canonical = |i: usize| {
        if i == 0 {
            pv_idx
        } else if i == pv_idx {
            0
        } else {
            i
        }
    };

    let opp = current.opponent();
    let mut best_idx = 0usize;

    let best = if current == original {
        let mut best = -INF;
        for (i, &mv) in moves.iter().enumerate() {
            let bias = if mv.is_jump() { JUMP_PENALTY } else { 0 };
            let (_, undo) = board.make_move(mv, current);
            let score = alpha_beta(
                board,
                tt,
                opp,
                original,
                depth - 1,
                alpha + bias,
                beta + bias,
            ) - bias;
            board.unmake_move(undo);
            if score > best {
                best = score;
                best_idx = canonical(i);
            }
            alpha = alpha.max(best);
            if alpha >= beta {
                break;
            }
        }
        best
    } else {
        let mut best = INF;
        for (i, &mv) in moves.iter().enumerate() {
            let bias = if mv.is_jump() { JUMP_PENALTY } else { 0 };
            let (_, undo) = board.make_move(mv, current);
            let score = alpha_beta(
                board,
                tt,
                opp,
                original,
                depth - 1,
                alpha - bias,
                beta - bias,
            ) + bias;
            board.unmake_move(undo);
            if score < best {
                best = score;
                best_idx = canonical(i);
            }
            beta = beta.min(best);
            if beta <= alpha {
                break;
            }
        }
        best
    };

    let flag = if best <= alpha_orig {
        TtFlag::UpperBound
    } else if best >= beta_orig {
        TtFlag::LowerBound
    } else {
        TtFlag::Exact
    };
    tt_store(tt, key, depth as i16, best, flag, current, original);
    if best_idx <= u8::MAX as usize {
        tt.store_best_idx(key, best_idx as u8);
    }
    best
}

// Entries hold the side-to-move's view of the score; convert on the way
// in and out when the searching root is the other player.

fn tt_store(
    tt: &TranspositionTable,
    key: u64,
    depth: i16,
    score: i32,
    flag: TtFlag,
    current: CellState,
    original: CellState,
) {
    if current == original {
        tt.store(key, depth, score, flag);
    } else {
        tt.store(key, depth, -score, flip(flag));
    }
}

fn tt_probe(
    tt: &TranspositionTable,
    key: u64,
    depth: i16,
    current: CellState,
    original: CellState,
) -> Option<(i32, TtFlag)> {
    let (score, flag) = tt.probe(key, depth)?;
    if current == original {
        Some((score, flag))
    } else {
        Some((-score, flip(flag)))
    }
}

fn flip(flag: TtFlag) -> TtFlag {
    match flag {
        TtFlag::Exact => TtFlag::Exact,
        TtFlag::LowerBound => TtFlag::UpperBound,
        TtFlag::UpperBound => TtFlag::LowerBound,
    }
}

// ============================================================================
// CONVENIENCE ENTRY POINTS
// ============================================================================

fn default_searcher() -> &'static Mutex<Searcher> {
    static SEARCHER: OnceLock<Mutex<Searcher>> = OnceLock::new();
    SEARCHER.get_or_init(|| Mutex::new(Searcher::new()))
}

/// [`Searcher::find_best_move`] on a process-wide shared searcher.
pub fn find_best_move(board: &Board, side: CellState, depth: u32) -> Option<Move> {
    default_searcher()
        .lock()
        .unwrap()
        .find_best_move(board, side, depth)
}

/// [`Searcher::iterative_deepening`] on a process-wide shared searcher.
pub fn iterative_deepening(board: &Board, side: CellState, max_depth: u32) -> Option<Move> {
    default_searcher()
        .lock()
        .unwrap()
        .iterative_deepening(board, side, max_depth)
}
