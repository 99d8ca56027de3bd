//! Hex board geometry with axial coordinates and a dense cell store
//!
//! Cells live in a flat array indexed through a per-radius geometry table,
//! so get/set are O(1) and cloning a board is a memcpy. The board keeps an
//! incrementally maintained Zobrist hash: every cell write XORs the old
//! key out and the new key in.

use crate::error::GameError;
use crate::moves::Move;
use crate::zobrist::{self, Zobrist};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, OnceLock};

/// Axial hex coordinates. The implied third coordinate is `s = -q - r`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i8,
    pub r: i8,
}

impl HexCoord {
    pub const fn new(q: i8, r: i8) -> Self {
        Self { q, r }
    }

    /// True if this coordinate lies on a board of the given radius.
    pub fn is_within(&self, radius: i8) -> bool {
        self.q.abs() <= radius && self.r.abs() <= radius && (self.q + self.r).abs() <= radius
    }

    /// Hex distance: max of the three axial deltas.
    pub fn distance_to(&self, other: HexCoord) -> i32 {
        let dq = (self.q as i32 - other.q as i32).abs();
        let dr = (self.r as i32 - other.r as i32).abs();
        let ds = ((self.q as i32 + self.r as i32) - (other.q as i32 + other.r as i32)).abs();
        dq.max(dr).max(ds)
    }
}

/// The 6 neighbor offsets in axial coordinates, in canonical order.
pub const DIRECTIONS: [HexCoord; 6] = [
    HexCoord::new(1, 0),
    HexCoord::new(1, -1),
    HexCoord::new(0, -1),
    HexCoord::new(-1, 0),
    HexCoord::new(-1, 1),
    HexCoord::new(0, 1),
];

/// State of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellState {
    Empty = 0,
    Blocked = 1,
    PlayerA = 2,
    PlayerB = 3,
}

impl CellState {
    /// The opposing player. Non-player states are returned unchanged.
    pub fn opponent(self) -> Self {
        match self {
            CellState::PlayerA => CellState::PlayerB,
            CellState::PlayerB => CellState::PlayerA,
            other => other,
        }
    }
}

// ============================================================================
// PER-RADIUS GEOMETRY
// ============================================================================

/// Canonical coordinate enumeration and dense index for one board radius.
pub(crate) struct Geometry {
    radius: i8,
    coords: Vec<HexCoord>,
    index: Vec<Option<u16>>,
    side: usize,
}

impl Geometry {
    fn build(radius: i8) -> Self {
        let side = (2 * radius as i32 + 1) as usize;
        let mut coords = Vec::new();
        let mut index = vec![None; side * side];
        for q in -radius..=radius {
            for r in -radius..=radius {
                let c = HexCoord::new(q, r);
                if c.is_within(radius) {
                    let offset = (r as i32 + radius as i32) as usize * side
                        + (q as i32 + radius as i32) as usize;
                    index[offset] = Some(coords.len() as u16);
                    coords.push(c);
                }
            }
        }
        Self { radius, coords, index, side }
    }

    #[inline]
    pub(crate) fn index_of(&self, c: HexCoord) -> Option<usize> {
        if !c.is_within(self.radius) {
            return None;
        }
        let offset = (c.r as i32 + self.radius as i32) as usize * self.side
            + (c.q as i32 + self.radius as i32) as usize;
        self.index[offset].map(|i| i as usize)
    }

    pub(crate) fn coords(&self) -> &[HexCoord] {
        &self.coords
    }
}

/// Per-radius geometry cache; callers iterate the coordinate list hot.
pub(crate) fn geometry(radius: i8) -> &'static Geometry {
    static CACHE: OnceLock<Mutex<FxHashMap<i8, &'static Geometry>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(FxHashMap::default()));
    let mut map = cache.lock().unwrap();
    if let Some(geom) = map.get(&radius) {
        return geom;
    }
    let geom: &'static Geometry = Box::leak(Box::new(Geometry::build(radius)));
    map.insert(radius, geom);
    geom
}

// ============================================================================
// UNDO RECORD
// ============================================================================

/// The minimal set of cell changes made by one move, replayed in reverse
/// to restore the board and its hash exactly. At most 8 cells change:
/// the source (jumps), the destination, and up to six infected neighbors.
#[derive(Debug)]
pub struct UndoRecord {
    changed: Vec<(HexCoord, CellState)>,
    prev_last_move: Option<Move>,
}

// ============================================================================
// BOARD
// ============================================================================

/// A hexagonal board of fixed radius.
#[derive(Clone)]
pub struct Board {
    geom: &'static Geometry,
    zobrist: &'static Zobrist,
    cells: Vec<CellState>,
    hash: u64,
    last_move: Option<Move>,
}

impl Board {
    /// Create an all-empty board. Radius must be at least 1.
    pub fn new(radius: i8) -> Self {
        assert!(radius >= 1, "board radius must be at least 1");
        let geom = geometry(radius);
        Self {
            geom,
            zobrist: zobrist::table(radius),
            cells: vec![CellState::Empty; geom.coords().len()],
            hash: 0,
            last_move: None,
        }
    }

    pub fn radius(&self) -> i8 {
        self.geom.radius
    }

    /// Every in-bounds coordinate in canonical order.
    pub fn all_coords(&self) -> &'static [HexCoord] {
        geometry(self.geom.radius).coords()
    }

    pub fn in_bounds(&self, c: HexCoord) -> bool {
        c.is_within(self.geom.radius)
    }

    /// True if the coordinate sits on the outermost ring.
    pub fn on_outer_ring(&self, c: HexCoord) -> bool {
        let radius = self.geom.radius;
        c.q.abs() == radius || c.r.abs() == radius || (c.q + c.r).abs() == radius
    }

    /// Cell state at `c`; out-of-bounds coordinates read as Blocked.
    #[inline]
    pub fn get(&self, c: HexCoord) -> CellState {
        match self.geom.index_of(c) {
            Some(idx) => self.cells[idx],
            None => CellState::Blocked,
        }
    }

    /// Write a cell, maintaining the incremental hash.
    pub fn set(&mut self, c: HexCoord, state: CellState) -> Result<(), GameError> {
        let idx = self.geom.index_of(c).ok_or(GameError::OutOfBounds(c))?;
        self.write_cell(idx, state);
        Ok(())
    }

    #[inline]
    pub(crate) fn write_cell(&mut self, idx: usize, state: CellState) {
        let prev = self.cells[idx];
        if prev == state {
            return;
        }
        self.hash ^= self.zobrist.cell_key(idx, prev);
        self.cells[idx] = state;
        self.hash ^= self.zobrist.cell_key(idx, state);
    }

    #[inline]
    pub(crate) fn index_of(&self, c: HexCoord) -> Option<usize> {
        self.geom.index_of(c)
    }

    /// In-bounds neighbors of `c` in canonical direction order.
    pub fn neighbors(&self, c: HexCoord) -> impl Iterator<Item = HexCoord> + '_ {
        DIRECTIONS
            .iter()
            .map(move |d| HexCoord::new(c.q + d.q, c.r + d.r))
            .filter(|n| self.in_bounds(*n))
    }

    /// Zobrist hash of the current position (side-to-move not included).
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The most recent move applied through `make_move`, if any.
    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn count_pieces(&self, side: CellState) -> usize {
        self.cells.iter().filter(|&&s| s == side).count()
    }

    pub fn count_empty(&self) -> usize {
        self.count_pieces(CellState::Empty)
    }

    /// Fraction of playable (non-Blocked) cells that are still empty.
    /// 1.0 on an open board, approaching 0.0 at the end of the game.
    pub fn empty_fraction(&self) -> f64 {
        let mut empty = 0usize;
        let mut blocked = 0usize;
        for &s in &self.cells {
            match s {
                CellState::Empty => empty += 1,
                CellState::Blocked => blocked += 1,
                _ => {}
            }
        }
        let playable = self.cells.len() - blocked;
        if playable == 0 {
            return 0.0;
        }
        empty as f64 / playable as f64
    }

    /// Apply a move for `side`: vacate the source on jumps, occupy the
    /// destination, flip every adjacent opposing stone. Returns the
    /// infected coordinates and an undo record.
    pub fn make_move(&mut self, mv: Move, side: CellState) -> (Vec<HexCoord>, UndoRecord) {
        let mut undo = UndoRecord {
            changed: Vec::with_capacity(8),
            prev_last_move: self.last_move,
        };
        let mut infected = Vec::with_capacity(6);
        let opp = side.opponent();

        if mv.is_jump() {
            self.record(mv.from, CellState::Empty, &mut undo);
        }
        self.record(mv.to, side, &mut undo);

        for d in &DIRECTIONS {
            let n = HexCoord::new(mv.to.q + d.q, mv.to.r + d.r);
            if self.get(n) == opp {
                self.record(n, side, &mut undo);
                infected.push(n);
            }
        }

        self.last_move = Some(mv);
        (infected, undo)
    }

    /// Replay an undo record in reverse, restoring cells, hash, and the
    /// previous last-move marker.
    pub fn unmake_move(&mut self, undo: UndoRecord) {
        for (c, prev) in undo.changed.into_iter().rev() {
            if let Some(idx) = self.geom.index_of(c) {
                self.write_cell(idx, prev);
            }
        }
        self.last_move = undo.prev_last_move;
    }

    fn record(&mut self, c: HexCoord, state: CellState, undo: &mut UndoRecord) {
        if let Some(idx) = self.geom.index_of(c) {
            let prev = self.cells[idx];
            if prev != state {
                undo.changed.push((c, prev));
                self.write_cell(idx, state);
            }
        }
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.geom.radius == other.geom.radius
            && self.cells == other.cells
            && self.hash == other.hash
            && self.last_move == other.last_move
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("radius", &self.geom.radius)
            .field("cells", &self.cells)
            .field("hash", &self.hash)
            .field("last_move", &self.last_move)
            .finish()
    }
}
