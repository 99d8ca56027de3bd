//! Engine-level tests: rule scenarios, hash round-trips, and search
//! consistency against a plain minimax reference

use hexxagon_core::{
    evaluate, generate_moves, hash_board, infection_preview, Board, CellState, GameError,
    GameState, HexCoord, Move, Searcher, TranspositionTable,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::sync::Arc;

// ============================================================================
// FIXTURES
// ============================================================================

fn coord(q: i8, r: i8) -> HexCoord {
    HexCoord::new(q, r)
}

/// Play up to `plies` random legal moves, calling `visit` after each one.
fn random_play(
    board: &mut Board,
    plies: usize,
    rng: &mut ChaCha8Rng,
    mut visit: impl FnMut(&Board, CellState),
) {
    let mut side = CellState::PlayerA;
    for _ in 0..plies {
        let moves = generate_moves(board, side);
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.gen_range(0..moves.len())];
        board.make_move(mv, side);
        visit(board, side);
        side = side.opponent();
    }
}

// ============================================================================
// RULE SCENARIOS
// ============================================================================

#[test]
fn clone_infects_adjacent_stone() {
    let mut board = Board::new(2);
    board.set(coord(0, 0), CellState::PlayerA).unwrap();
    board.set(coord(1, 0), CellState::PlayerB).unwrap();
    let mut gs = GameState::from_board(board, CellState::PlayerA);

    let outcome = gs.make_move(Move::new(coord(0, 0), coord(0, 1))).unwrap();

    assert_eq!(outcome.infected, vec![coord(1, 0)]);
    assert_eq!(gs.board().get(coord(0, 0)), CellState::PlayerA);
    assert_eq!(gs.board().get(coord(0, 1)), CellState::PlayerA);
    assert_eq!(gs.board().get(coord(1, 0)), CellState::PlayerA);
    assert_eq!((gs.score_a, gs.score_b), (3, 0));
    assert!(gs.game_over);
    assert_eq!(gs.winner, CellState::PlayerA);
}

#[test]
fn jump_vacates_the_source() {
    let mut board = Board::new(2);
    board.set(coord(0, 0), CellState::PlayerA).unwrap();
    let mut gs = GameState::from_board(board, CellState::PlayerA);

    let outcome = gs.make_move(Move::new(coord(0, 0), coord(2, 0))).unwrap();

    assert!(outcome.infected.is_empty());
    assert_eq!(gs.board().get(coord(0, 0)), CellState::Empty);
    assert_eq!(gs.board().get(coord(2, 0)), CellState::PlayerA);
    assert_eq!((gs.score_a, gs.score_b), (1, 0));
    assert!(gs.game_over);
    assert_eq!(gs.winner, CellState::PlayerA);
}

#[test]
fn distance_three_is_illegal() {
    let mut board = Board::new(3);
    board.set(coord(0, 0), CellState::PlayerA).unwrap();
    let mut gs = GameState::from_board(board, CellState::PlayerA);

    let err = gs.make_move(Move::new(coord(0, 0), coord(3, 0)));
    assert_eq!(err, Err(GameError::IllegalMove));
}

#[test]
fn enclosed_region_is_filled() {
    // Everything is A except two empty cells; filling one of them leaves
    // the center as a one-cell region walled in by A
    let mut board = Board::new(3);
    for &c in Board::new(3).all_coords() {
        board.set(c, CellState::PlayerA).unwrap();
    }
    board.set(coord(0, 0), CellState::Empty).unwrap();
    board.set(coord(0, 1), CellState::Empty).unwrap();
    let mut gs = GameState::from_board(board, CellState::PlayerA);

    gs.make_move(Move::new(coord(0, 2), coord(0, 1))).unwrap();

    assert_eq!(gs.board().get(coord(0, 0)), CellState::PlayerA);
    assert_eq!(gs.board().count_empty(), 0);
    assert!(gs.game_over);
    assert_eq!(gs.winner, CellState::PlayerA);
}

#[test]
fn game_over_is_sticky() {
    let mut board = Board::new(2);
    board.set(coord(0, 0), CellState::PlayerA).unwrap();
    board.set(coord(1, 0), CellState::PlayerB).unwrap();
    let mut gs = GameState::from_board(board, CellState::PlayerA);

    gs.make_move(Move::new(coord(0, 0), coord(0, 1))).unwrap();
    assert!(gs.game_over);

    for _ in 0..3 {
        let err = gs.make_move(Move::new(coord(0, 1), coord(0, 2)));
        assert_eq!(err, Err(GameError::GameOver));
    }
}

// ============================================================================
// HASH AND UNDO PROPERTIES
// ============================================================================

#[test]
fn undo_restores_board_and_hash() {
    let gs = GameState::new(4, false);
    let initial = gs.board().clone();
    let mut board = gs.board().clone();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);

    let mut side = CellState::PlayerA;
    let mut undos = Vec::new();
    for _ in 0..20 {
        let moves = generate_moves(&board, side);
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.gen_range(0..moves.len())];
        let (_, undo) = board.make_move(mv, side);
        undos.push(undo);
        side = side.opponent();
    }
    assert!(!undos.is_empty());

    for undo in undos.into_iter().rev() {
        board.unmake_move(undo);
    }
    assert_eq!(board, initial);
    assert_eq!(board.hash(), initial.hash());
}

#[test]
fn incremental_hash_matches_recompute() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut checked = 0usize;
    for game in 0..60 {
        let with_blockers = game % 2 == 0;
        let mut board = GameState::new(3, with_blockers).board().clone();
        random_play(&mut board, 20, &mut rng, |b, _| {
            assert_eq!(b.hash(), hash_board(b));
        });
        checked += 1;
    }
    assert_eq!(checked, 60);
}

#[test]
fn generated_moves_are_well_formed() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut board = GameState::new(3, true).board().clone();
    random_play(&mut board, 30, &mut rng, |b, mover| {
        for side in [CellState::PlayerA, CellState::PlayerB] {
            let moves = generate_moves(b, side);
            let unique: HashSet<Move> = moves.iter().copied().collect();
            assert_eq!(unique.len(), moves.len(), "duplicate moves for {side:?}");
            for mv in &moves {
                let dist = mv.from.distance_to(mv.to);
                assert!((1..=2).contains(&dist));
                assert_eq!(b.get(mv.from), side);
                assert_eq!(b.get(mv.to), CellState::Empty);
            }
        }
        let _ = mover;
    });
}

#[test]
fn evaluation_is_antisymmetric() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut board = GameState::new(3, false).board().clone();
    random_play(&mut board, 40, &mut rng, |b, _| {
        assert_eq!(
            evaluate(b, CellState::PlayerA),
            -evaluate(b, CellState::PlayerB)
        );
    });
}

// ============================================================================
// SEARCH PROPERTIES
// ============================================================================

#[test]
fn best_move_exists_iff_moves_exist() {
    let gs = GameState::new(3, false);
    let mut searcher = Searcher::with_table(Arc::new(TranspositionTable::with_bits(14)), 8);
    assert!(searcher
        .find_best_move(gs.board(), CellState::PlayerA, 2)
        .is_some());

    let empty = Board::new(3);
    assert_eq!(searcher.find_best_move(&empty, CellState::PlayerA, 2), None);
    assert_eq!(
        searcher.iterative_deepening(&empty, CellState::PlayerA, 3),
        None
    );
}

#[test]
fn shared_entry_points_work() {
    let gs = GameState::new(2, false);
    assert!(hexxagon_core::find_best_move(gs.board(), CellState::PlayerA, 2).is_some());
    assert!(hexxagon_core::iterative_deepening(gs.board(), CellState::PlayerA, 2).is_some());
}

// Reference search: plain minimax over the same move filter and jump
// bias, no pruning and no table.
const JUMP_PENALTY: i32 = 25;

fn prune_jumps(board: &Board, side: CellState, moves: Vec<Move>) -> Vec<Move> {
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

fn minimax(board: &mut Board, current: CellState, original: CellState, depth: u32) -> i32 {
    let moves = generate_moves(board, current);
    if depth == 0 || moves.is_empty() {
        return evaluate(board, original);
    }
    let maximizing = current == original;
    let moves = if maximizing {
        prune_jumps(board, current, moves)
    } else {
        moves
    };
    let opp = current.opponent();
    let mut best = if maximizing { i32::MIN } else { i32::MAX };
    for &mv in &moves {
        let (_, undo) = board.make_move(mv, current);
        let mut score = minimax(board, opp, original, depth - 1);
        board.unmake_move(undo);
        if mv.is_jump() {
            score += if maximizing { -JUMP_PENALTY } else { JUMP_PENALTY };
        }
        best = if maximizing {
            best.max(score)
        } else {
            best.min(score)
        };
    }
    best
}

#[test]
fn alpha_beta_matches_minimax_on_small_boards() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let mut positions = vec![GameState::new(2, false).board().clone()];
    let mut board = GameState::new(2, false).board().clone();
    random_play(&mut board, 6, &mut rng, |b, _| {
        positions.push(b.clone());
    });

    for board in positions.iter().take(4) {
        for side in [CellState::PlayerA, CellState::PlayerB] {
            if generate_moves(board, side).is_empty() {
                continue;
            }
            for depth in [1, 2, 3] {
                // Fresh table per comparison so entries cannot leak between
                // searches rooted at different players
                let searcher =
                    Searcher::with_table(Arc::new(TranspositionTable::with_bits(14)), 1);
                let got = searcher.search_score(board, side, depth);
                let want = minimax(&mut board.clone(), side, side, depth);
                assert_eq!(got, want, "depth {depth} for {side:?}");
            }
        }
    }
}
