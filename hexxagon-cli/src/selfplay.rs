//! Self-play sample generation
//!
//! Plays the engine against itself with an epsilon-greedy policy (or a
//! shallow search) and writes one JSONL row per ply through a
//! mutex-guarded writer: the cell vector in canonical order, the side to
//! move, and a score label. Games outside the configured ply window are
//! regenerated a bounded number of times, then skipped.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Args;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;

use hexxagon_core::{
    evaluate, generate_moves, Board, CellState, GameState, Move, Searcher, TranspositionTable,
    WIN_SCORE,
};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct SelfPlayArgs {
    /// Number of games to generate
    #[arg(long, default_value = "1000")]
    pub games: usize,

    /// Search depth for move selection (0 = epsilon-greedy static policy)
    #[arg(long, default_value = "0")]
    pub depth: u32,

    /// Board radius
    #[arg(long, default_value = "3")]
    pub radius: i8,

    /// Output JSONL file
    #[arg(long, default_value = "selfplay.jsonl")]
    pub out: PathBuf,

    /// Discard games shorter than this many plies
    #[arg(long, default_value = "6")]
    pub min_plies: usize,

    /// Discard games still unfinished after this many plies
    #[arg(long, default_value = "400")]
    pub max_plies: usize,

    /// Random-move probability for the epsilon-greedy policy
    #[arg(long, default_value = "0.1")]
    pub epsilon: f64,

    /// Search depth for interior-ply labels (0 = static evaluation)
    #[arg(long, default_value = "0")]
    pub label_depth: u32,

    /// Place the three center blockers
    #[arg(long)]
    pub blockers: bool,

    /// Perturb the opening with two random extra stones per side
    #[arg(long)]
    pub random_opening: bool,
}

/// One training row: cells in canonical order (+1 = player A, -1 =
/// player B, 0 otherwise), side to move (+1 / -1), and a score label
/// from the mover's perspective.
#[derive(Serialize, Debug, PartialEq, Eq)]
struct SampleRow {
    cells: Vec<i8>,
    stm: i8,
    label: i32,
}

// Opening clone bonus for the greedy policy, interpolated by the empty
// fraction: strong guidance toward splitting early, fading to the value
// of a single stone late.
const CLONE_BONUS_MAX: f64 = 40.0;
const CLONE_BONUS_MIN: f64 = 14.0;

/// Regeneration attempts before a game slot is abandoned.
const MAX_ATTEMPTS: usize = 3;

// ============================================================================
// DRIVER
// ============================================================================

/// Run self-play generation
///
/// 1. Open the output sink
/// 2. Generate games on the rayon pool, each worker with its own RNG and
///    searcher over a shared transposition table
/// 3. Flush and report
pub fn run(args: SelfPlayArgs, seed: Option<u64>) -> Result<()> {
    let file = File::create(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    let sink = Mutex::new(BufWriter::new(file));
    let base_seed = seed.unwrap_or_else(rand::random);
    let tt = Arc::new(TranspositionTable::default());

    tracing::info!(
        "generating {} self-play games (radius {}, epsilon {}, seed {})",
        args.games,
        args.radius,
        args.epsilon,
        base_seed
    );

    let row_counts: Result<Vec<usize>> = (0..args.games)
        .into_par_iter()
        .map(|game_idx| -> Result<usize> {
            let game_seed = base_seed.wrapping_add(game_idx as u64);
            let mut rng = ChaCha8Rng::seed_from_u64(game_seed);
            let searcher = Searcher::with_table(Arc::clone(&tt), game_seed);

            match generate_accepted_game(&args, &searcher, &mut rng) {
                Some(rows) => {
                    write_rows(&sink, &rows)?;
                    if (game_idx + 1) % 1000 == 0 {
                        tracing::info!("finished game {} / {}", game_idx + 1, args.games);
                    }
                    Ok(rows.len())
                }
                None => Ok(0),
            }
        })
        .collect();

    let total: usize = row_counts?.iter().sum();
    sink.lock().unwrap().flush()?;

    tracing::info!("wrote {} rows to {}", total, args.out.display());
    Ok(())
}

fn write_rows(sink: &Mutex<BufWriter<File>>, rows: &[SampleRow]) -> Result<()> {
    let mut writer = sink.lock().unwrap();
    for row in rows {
        serde_json::to_writer(&mut *writer, row)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

// ============================================================================
// GAME GENERATION
// ============================================================================

/// Generate one game within the ply window, retrying a bounded number of
/// times before giving up on the slot.
fn generate_accepted_game(
    args: &SelfPlayArgs,
    searcher: &Searcher,
    rng: &mut ChaCha8Rng,
) -> Option<Vec<SampleRow>> {
    for attempt in 1..=MAX_ATTEMPTS {
        if let Some(rows) = play_one_game(args, searcher, rng) {
            return Some(rows);
        }
        tracing::warn!("game outside ply window (attempt {attempt}), regenerating");
    }
    tracing::warn!("skipping game slot after {MAX_ATTEMPTS} rejected attempts");
    None
}

/// Play a single game, returning its labeled rows, or `None` if the game
/// ended outside the [min_plies, max_plies] window.
fn play_one_game(
    args: &SelfPlayArgs,
    searcher: &Searcher,
    rng: &mut ChaCha8Rng,
) -> Option<Vec<SampleRow>> {
    let mut board = GameState::new(args.radius, args.blockers).board().clone();
    if args.random_opening {
        random_opening(&mut board, rng);
    }

    let mut side = CellState::PlayerA;
    let mut snaps: Vec<(Board, CellState)> = Vec::new();
    let mut finished = false;

    for _ in 0..args.max_plies {
        let moves = generate_moves(&board, side);
        if moves.is_empty() {
            finished = true;
            break;
        }
        snaps.push((board.clone(), side));

        let mv = pick_move(&board, side, &moves, args, searcher, rng);
        board.make_move(mv, side);

        if generate_moves(&board, side.opponent()).is_empty() {
            finished = true;
            break;
        }
        side = side.opponent();
    }

    if !finished || snaps.is_empty() || snaps.len() < args.min_plies {
        return None;
    }

    let winner = winner_by_pieces(&board);
    let last = snaps.len() - 1;
    let rows = snaps
        .iter()
        .enumerate()
        .map(|(i, (snap, stm))| {
            let label = if i == last {
                terminal_label(winner, *stm)
            } else if args.label_depth > 0 {
                searcher
                    .search_score(snap, *stm, args.label_depth)
                    .clamp(-WIN_SCORE, WIN_SCORE)
            } else {
                evaluate(snap, *stm)
            };
            SampleRow {
                cells: encode_board(snap),
                stm: side_to_feature(*stm),
                label,
            }
        })
        .collect();
    Some(rows)
}

/// Epsilon-greedy (or shallow-search) move choice.
fn pick_move(
    board: &Board,
    side: CellState,
    moves: &[Move],
    args: &SelfPlayArgs,
    searcher: &Searcher,
    rng: &mut ChaCha8Rng,
) -> Move {
    if rng.gen::<f64>() < args.epsilon {
        return moves[rng.gen_range(0..moves.len())];
    }
    if args.depth > 0 {
        let mut worker = Searcher::with_table(Arc::clone(searcher.table()), rng.gen());
        if let Some(mv) = worker.find_best_move(board, side, args.depth) {
            return mv;
        }
    }
    greedy_move(board, side, moves)
}

/// One-ply greedy choice by static evaluation, with the opening clone
/// bonus steering early play toward splitting.
fn greedy_move(board: &Board, side: CellState, moves: &[Move]) -> Move {
    let bonus = clone_bonus(board);
    let mut best = moves[0];
    let mut best_score = i32::MIN;
    let mut scratch = board.clone();

    for &mv in moves {
        let (_, undo) = scratch.make_move(mv, side);
        let mut score = evaluate(&scratch, side);
        scratch.unmake_move(undo);
        if mv.is_clone() {
            score += bonus;
        }
        if score > best_score {
            best_score = score;
            best = mv;
        }
    }
    best
}

fn clone_bonus(board: &Board) -> i32 {
    let r = board.empty_fraction();
    (r * CLONE_BONUS_MAX + (1.0 - r) * CLONE_BONUS_MIN).round() as i32
}

/// Scatter two extra stones per side on random empty cells.
fn random_opening(board: &mut Board, rng: &mut ChaCha8Rng) {
    for side in [CellState::PlayerA, CellState::PlayerB] {
        let mut placed = 0;
        while placed < 2 {
            let coords = board.all_coords();
            let c = coords[rng.gen_range(0..coords.len())];
            if board.get(c) == CellState::Empty && board.set(c, side).is_ok() {
                placed += 1;
            }
        }
    }
}

// ============================================================================
// ENCODING
// ============================================================================

fn encode_board(board: &Board) -> Vec<i8> {
    board
        .all_coords()
        .iter()
        .map(|&c| match board.get(c) {
            CellState::PlayerA => 1,
            CellState::PlayerB => -1,
            _ => 0,
        })
        .collect()
}

fn side_to_feature(side: CellState) -> i8 {
    if side == CellState::PlayerB {
        -1
    } else {
        1
    }
}

fn winner_by_pieces(board: &Board) -> CellState {
    let a = board.count_pieces(CellState::PlayerA);
    let b = board.count_pieces(CellState::PlayerB);
    match a.cmp(&b) {
        std::cmp::Ordering::Greater => CellState::PlayerA,
        std::cmp::Ordering::Less => CellState::PlayerB,
        std::cmp::Ordering::Equal => CellState::Empty,
    }
}

fn terminal_label(winner: CellState, stm: CellState) -> i32 {
    if winner == CellState::Empty {
        0
    } else if winner == stm {
        WIN_SCORE
    } else {
        -WIN_SCORE
    }
}

// ============================================================================
// TESTS
// ============================================================================
