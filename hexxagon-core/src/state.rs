//! Game rules: initial layout, turn switching, and end-of-game handling

use crate::board::{Board, CellState, HexCoord};
use crate::error::GameError;
use crate::moves::{generate_moves, Move};
use std::collections::VecDeque;

/// Winning/losing/draw score written at the terminal ply of a game.
pub const WIN_SCORE: i32 = 32000;

/// What a successful move changed on the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Opposing stones flipped by the move, in canonical neighbor order.
    pub infected: Vec<HexCoord>,
}

/// A full game: board plus turn, scores, and termination state.
#[derive(Clone, Debug)]
pub struct GameState {
    board: Board,
    /// The player whose turn it is.
    pub current_player: CellState,
    pub score_a: usize,
    pub score_b: usize,
    pub game_over: bool,
    /// `PlayerA`, `PlayerB`, or `Empty` for a draw (or an unfinished game).
    pub winner: CellState,
}

impl GameState {
    /// Start a new game. Player A opens from three alternating corners,
    /// player B from the opposite three. When `with_blockers` is set the
    /// three cells ringing the center are blocked off.
    pub fn new(radius: i8, with_blockers: bool) -> Self {
        let mut board = Board::new(radius);
        let corners_a = [
            HexCoord::new(radius, 0),
            HexCoord::new(0, -radius),
            HexCoord::new(-radius, radius),
        ];
        let corners_b = [
            HexCoord::new(-radius, 0),
            HexCoord::new(0, radius),
            HexCoord::new(radius, -radius),
        ];
        for c in corners_a {
            board.set(c, CellState::PlayerA).expect("corner is in bounds");
        }
        for c in corners_b {
            board.set(c, CellState::PlayerB).expect("corner is in bounds");
        }
        if with_blockers {
            let blockers = [
                HexCoord::new(1, 0),
                HexCoord::new(-1, 1),
                HexCoord::new(0, -1),
            ];
            for c in blockers {
                board.set(c, CellState::Blocked).expect("blocker is in bounds");
            }
        }
        Self::from_board(board, CellState::PlayerA)
    }

    /// Wrap an arbitrary board position into a game state.
    pub fn from_board(board: Board, current_player: CellState) -> Self {
        let mut state = Self {
            board,
            current_player,
            score_a: 0,
            score_b: 0,
            game_over: false,
            winner: CellState::Empty,
        };
        state.update_scores();
        state
    }

    /// Read-only view of the position, sufficient for rendering,
    /// evaluation, and search.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Reset to the initial layout, keeping the radius. Blockers are
    /// restored if the current board has any.
    pub fn reset(&mut self) {
        let with_blockers = self
            .board
            .all_coords()
            .iter()
            .any(|&c| self.board.get(c) == CellState::Blocked);
        *self = Self::new(self.board.radius(), with_blockers);
    }

    /// Apply a move for the current player, then flip infected stones,
    /// refresh the scores, and resolve the turn: either the opponent is
    /// starved (all remaining empties go to the mover), the game ends on
    /// a terminal condition, or play passes to the opponent.
    pub fn make_move(&mut self, mv: Move) -> Result<MoveOutcome, GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        if !self.is_legal(mv) {
            return Err(GameError::IllegalMove);
        }

        let (infected, _undo) = self.board.make_move(mv, self.current_player);
        self.update_scores();

        let next = self.current_player.opponent();
        let empties = self.board.count_empty();
        let next_has_moves = !generate_moves(&self.board, next).is_empty();

        if self.score_a == 0 || self.score_b == 0 || empties == 0 {
            self.finish();
        } else if !next_has_moves {
            // Opponent is starved while empties remain: the mover claims them all
            self.claim_all_empty(self.current_player);
            self.update_scores();
            self.game_over = true;
            self.winner = winner_by_counts(self.score_a, self.score_b);
        } else {
            self.current_player = next;
        }

        Ok(MoveOutcome { infected })
    }

    /// A move is legal iff the source holds the mover's stone, the
    /// destination is empty, and the distance is 1 or 2.
    fn is_legal(&self, mv: Move) -> bool {
        (mv.is_clone() || mv.is_jump())
            && self.board.get(mv.from) == self.current_player
            && self.board.get(mv.to) == CellState::Empty
    }

    fn finish(&mut self) {
        self.fill_enclosed_regions();
        self.update_scores();
        self.game_over = true;
        self.winner = if self.score_a == 0 && self.score_b > 0 {
            CellState::PlayerB
        } else if self.score_b == 0 && self.score_a > 0 {
            CellState::PlayerA
        } else {
            winner_by_counts(self.score_a, self.score_b)
        };
    }

    fn update_scores(&mut self) {
        self.score_a = self.board.count_pieces(CellState::PlayerA);
        self.score_b = self.board.count_pieces(CellState::PlayerB);
    }

    fn claim_all_empty(&mut self, owner: CellState) {
        for (idx, &c) in self.board.all_coords().iter().enumerate() {
            if self.board.get(c) == CellState::Empty {
                self.board.write_cell(idx, owner);
            }
        }
    }

    /// Convert every enclosed empty region to its surrounding color.
    /// A region is enclosed iff it never touches the outermost ring and
    /// exactly one player's stones appear on its boundary; blocked cells
    /// neither connect regions nor count as boundary.
    fn fill_enclosed_regions(&mut self) {
        let coords = self.board.all_coords();
        let mut visited = vec![false; coords.len()];

        for (start_idx, &start) in coords.iter().enumerate() {
            if visited[start_idx] || self.board.get(start) != CellState::Empty {
                continue;
            }

            let mut queue = VecDeque::from([start]);
            let mut region = vec![start_idx];
            visited[start_idx] = true;

            let mut touches_border = false;
            let mut borders_a = false;
            let mut borders_b = false;

            while let Some(cur) = queue.pop_front() {
                if self.board.on_outer_ring(cur) {
                    touches_border = true;
                }
                for n in self.board.neighbors(cur) {
                    match self.board.get(n) {
                        CellState::Empty => {
                            if let Some(idx) = self.board.index_of(n) {
                                if !visited[idx] {
                                    visited[idx] = true;
                                    queue.push_back(n);
                                    region.push(idx);
                                }
                            }
                        }
                        CellState::PlayerA => borders_a = true,
                        CellState::PlayerB => borders_b = true,
                        CellState::Blocked => {}
                    }
                }
            }

            if !touches_border && (borders_a != borders_b) {
                let owner = if borders_a {
                    CellState::PlayerA
                } else {
                    CellState::PlayerB
                };
                for idx in region {
                    self.board.write_cell(idx, owner);
                }
            }
        }
    }
}

fn winner_by_counts(score_a: usize, score_b: usize) -> CellState {
    match score_a.cmp(&score_b) {
        std::cmp::Ordering::Greater => CellState::PlayerA,
        std::cmp::Ordering::Less => CellState::PlayerB,
        std::cmp::Ordering::Equal => CellState::Empty,
    }
}
