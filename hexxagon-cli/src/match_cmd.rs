//! Match command - engine-vs-engine games at fixed depths
//!
//! Plays a series of games between two search depths, alternating which
//! depth drives player A for fairness, and reports aggregate results.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use hexxagon_core::{CellState, GameState, Searcher, TranspositionTable};

// ============================================================================
// COMMAND ARGUMENTS
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// Number of games to play (depths alternate sides)
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Search depth of the first engine
    #[arg(long, default_value = "4")]
    pub depth_a: u32,

    /// Search depth of the second engine
    #[arg(long, default_value = "4")]
    pub depth_b: u32,

    /// Board radius
    #[arg(long, default_value = "4")]
    pub radius: i8,

    /// Place the three center blockers
    #[arg(long)]
    pub blockers: bool,

    /// Abort a game after this many plies
    #[arg(long, default_value = "400")]
    pub max_plies: usize,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Result of a single game
#[derive(Clone, Debug)]
struct GameRecord {
    game_number: usize,
    winner: CellState,
    plies: usize,
    score_a: usize,
    score_b: usize,
    /// Whether the first engine (--depth-a) played player A this game
    first_played_a: bool,
}

/// Aggregated match results, counted per engine (not per color)
#[derive(Clone, Debug)]
struct MatchResults {
    games: Vec<GameRecord>,
    first_wins: usize,
    second_wins: usize,
    draws: usize,
    avg_plies: f32,
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

/// Run match command
///
/// 1. Play the games, alternating colors
/// 2. Aggregate per-engine statistics
/// 3. Report as text or JSON
pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    tracing::info!(
        "match: depth {} vs depth {} over {} games (radius {})",
        args.depth_a,
        args.depth_b,
        args.games,
        args.radius
    );

    let results = play_match(&args, seed)?;

    report_results(&results, &args);

    Ok(())
}

// ============================================================================
// MATCH PLAY
// ============================================================================

fn play_match(args: &MatchArgs, seed: Option<u64>) -> Result<MatchResults> {
    let tt = Arc::new(TranspositionTable::default());
    let base_seed = seed.unwrap_or_else(rand::random);
    let mut games = Vec::with_capacity(args.games);

    for game_num in 0..args.games {
        // Alternate which engine plays A for fairness
        let first_played_a = game_num % 2 == 0;
        let (depth_for_a, depth_for_b) = if first_played_a {
            (args.depth_a, args.depth_b)
        } else {
            (args.depth_b, args.depth_a)
        };

        let mut searcher =
            Searcher::with_table(Arc::clone(&tt), base_seed.wrapping_add(game_num as u64));
        let record = play_single_game(
            args,
            game_num + 1,
            depth_for_a,
            depth_for_b,
            first_played_a,
            &mut searcher,
        )?;

        tracing::info!(
            "game {}: {:?} in {} plies ({}-{})",
            record.game_number,
            record.winner,
            record.plies,
            record.score_a,
            record.score_b
        );

        games.push(record);
    }

    Ok(compute_match_statistics(games))
}

fn play_single_game(
    args: &MatchArgs,
    game_number: usize,
    depth_for_a: u32,
    depth_for_b: u32,
    first_played_a: bool,
    searcher: &mut Searcher,
) -> Result<GameRecord> {
    let mut gs = GameState::new(args.radius, args.blockers);
    let mut plies = 0;

    while !gs.game_over && plies < args.max_plies {
        let depth = if gs.current_player == CellState::PlayerA {
            depth_for_a
        } else {
            depth_for_b
        };
        let mv = match searcher.iterative_deepening(gs.board(), gs.current_player, depth) {
            Some(mv) => mv,
            None => break,
        };
        gs.make_move(mv)?;
        plies += 1;
    }

    Ok(GameRecord {
        game_number,
        winner: if gs.game_over { gs.winner } else { CellState::Empty },
        plies,
        score_a: gs.score_a,
        score_b: gs.score_b,
        first_played_a,
    })
}

/// Fold per-color outcomes into per-engine tallies: the "first" engine is
/// the one configured by `--depth-a`, whichever color it played.
fn compute_match_statistics(games: Vec<GameRecord>) -> MatchResults {
    let mut first_wins = 0;
    let mut second_wins = 0;
    let mut draws = 0;

    for game in &games {
        match game.winner {
            CellState::PlayerA => {
                if game.first_played_a {
                    first_wins += 1;
                } else {
                    second_wins += 1;
                }
            }
            CellState::PlayerB => {
                if game.first_played_a {
                    second_wins += 1;
                } else {
                    first_wins += 1;
                }
            }
            _ => draws += 1,
        }
    }

    let total_plies: usize = games.iter().map(|g| g.plies).sum();
    let avg_plies = if games.is_empty() {
        0.0
    } else {
        total_plies as f32 / games.len() as f32
    };

    MatchResults {
        games,
        first_wins,
        second_wins,
        draws,
        avg_plies,
    }
}

// ============================================================================
// REPORTING
// ============================================================================

fn report_results(results: &MatchResults, args: &MatchArgs) {
    if args.json {
        print_json_results(results, args);
    } else {
        print_text_results(results, args);
    }
}

fn print_json_results(results: &MatchResults, args: &MatchArgs) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        winner: String,
        plies: usize,
        score_a: usize,
        score_b: usize,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_games: usize,
        depth_first: u32,
        depth_second: u32,
        first_wins: usize,
        second_wins: usize,
        draws: usize,
        avg_plies: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        total_games: results.games.len(),
        depth_first: args.depth_a,
        depth_second: args.depth_b,
        first_wins: results.first_wins,
        second_wins: results.second_wins,
        draws: results.draws,
        avg_plies: results.avg_plies,
        games: results
            .games
            .iter()
            .map(|g| JsonGame {
                game_number: g.game_number,
                winner: format!("{:?}", g.winner),
                plies: g.plies,
                score_a: g.score_a,
                score_b: g.score_b,
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

fn print_text_results(results: &MatchResults, args: &MatchArgs) {
    let total = results.games.len();

    println!("\n=== Match Results ===");
    println!("Total games:      {}", total);
    println!("Depth {:<2} wins:    {}", args.depth_a, results.first_wins);
    println!("Depth {:<2} wins:    {}", args.depth_b, results.second_wins);
    println!("Draws:            {}", results.draws);
    println!("Avg plies:        {:.1}", results.avg_plies);

    println!("\nGame details:");
    for game in &results.games {
        println!(
            "  Game {}: {:?} in {} plies ({}-{})",
            game.game_number, game.winner, game.plies, game.score_a, game.score_b
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
