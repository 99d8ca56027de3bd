//! Transposition table shared by parallel search workers
//!
//! Fixed power-of-two capacity, direct mapped. Each slot is a pair of
//! atomic lanes: the data lane packs score/depth/flag/best-index, the key
//! lane stores `hash ^ data`. A probe re-derives the hash from both lanes,
//! so a torn read (two writers racing on one slot) can only ever look like
//! a miss, never a wrong hit. Replacement is depth-preferred: an entry is
//! overwritten only by one searched at least as deep.

use std::sync::atomic::{AtomicU64, Ordering};

/// Default table size: 2^23 entries (16 bytes each).
pub const DEFAULT_BITS: u32 = 23;

/// Bound type of a stored score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtFlag {
    Exact = 0,
    LowerBound = 1,
    UpperBound = 2,
}

impl TtFlag {
    fn from_bits(bits: u64) -> Self {
        match bits & 0x3 {
            0 => TtFlag::Exact,
            1 => TtFlag::LowerBound,
            _ => TtFlag::UpperBound,
        }
    }
}

struct Slot {
    key: AtomicU64,
    data: AtomicU64,
}

pub struct TranspositionTable {
    slots: Vec<Slot>,
    mask: usize,
    probes: AtomicU64,
    hits: AtomicU64,
}

// data lane layout: score:i32 << 32 | depth:i16 << 16 | best:u8 << 8 | flag:u8
#[inline]
fn pack(score: i32, depth: i16, flag: TtFlag, best_idx: u8) -> u64 {
    ((score as u32 as u64) << 32)
        | ((depth as u16 as u64) << 16)
        | ((best_idx as u64) << 8)
        | flag as u64
}

#[inline]
fn unpack_score(data: u64) -> i32 {
    (data >> 32) as u32 as i32
}

#[inline]
fn unpack_depth(data: u64) -> i16 {
    (data >> 16) as u16 as i16
}

#[inline]
fn unpack_best_idx(data: u64) -> u8 {
    (data >> 8) as u8
}

impl TranspositionTable {
    /// Table with `2^bits` entries.
    pub fn with_bits(bits: u32) -> Self {
        let len = 1usize << bits;
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || Slot {
            key: AtomicU64::new(0),
            data: AtomicU64::new(0),
        });
        Self {
            slots,
            mask: len - 1,
            probes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    fn slot(&self, hash: u64) -> &Slot {
        &self.slots[(hash as usize) & self.mask]
    }

    #[inline]
    fn load_valid(&self, hash: u64) -> Option<u64> {
        let slot = self.slot(hash);
        let data = slot.data.load(Ordering::Relaxed);
        let key = slot.key.load(Ordering::Relaxed);
        if key == 0 && data == 0 {
            return None;
        }
        if key ^ data != hash {
            return None;
        }
        Some(data)
    }

    /// Look up a score usable at `depth`: the slot must hold this exact
    /// hash and have been searched at least as deep.
    pub fn probe(&self, hash: u64, depth: i16) -> Option<(i32, TtFlag)> {
        self.probes.fetch_add(1, Ordering::Relaxed);
        let data = self.load_valid(hash)?;
        if unpack_depth(data) < depth {
            return None;
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some((unpack_score(data), TtFlag::from_bits(data)))
    }

    /// Store a score; the incumbent survives only if it is deeper.
    /// The best-move hint is carried over when the hash is unchanged.
    pub fn store(&self, hash: u64, depth: i16, score: i32, flag: TtFlag) {
        let slot = self.slot(hash);
        let old_data = slot.data.load(Ordering::Relaxed);
        let old_key = slot.key.load(Ordering::Relaxed);
        let occupied = old_key != 0 || old_data != 0;
        if occupied && unpack_depth(old_data) > depth {
            return;
        }
        let best_idx = if occupied && old_key ^ old_data == hash {
            unpack_best_idx(old_data)
        } else {
            0
        };
        let data = pack(score, depth, flag, best_idx);
        slot.key.store(hash ^ data, Ordering::Relaxed);
        slot.data.store(data, Ordering::Relaxed);
    }

    /// Remember the best child index for a position already in the table.
    pub fn store_best_idx(&self, hash: u64, idx: u8) {
        let slot = self.slot(hash);
        let data = slot.data.load(Ordering::Relaxed);
        let key = slot.key.load(Ordering::Relaxed);
        if (key == 0 && data == 0) || key ^ data != hash {
            return;
        }
        let new_data = (data & !0xFF00) | ((idx as u64) << 8);
        slot.key.store(hash ^ new_data, Ordering::Relaxed);
        slot.data.store(new_data, Ordering::Relaxed);
    }

    /// Best child index for a position, if the hash still matches.
    pub fn probe_best_idx(&self, hash: u64) -> Option<u8> {
        let data = self.load_valid(hash)?;
        Some(unpack_best_idx(data))
    }

    /// (probes, hits, hit rate in percent) since construction or `clear`.
    pub fn stats(&self) -> (u64, u64, f64) {
        let probes = self.probes.load(Ordering::Relaxed);
        let hits = self.hits.load(Ordering::Relaxed);
        let rate = if probes == 0 {
            0.0
        } else {
            hits as f64 / probes as f64 * 100.0
        };
        (probes, hits, rate)
    }

    pub fn clear(&self) {
        for slot in &self.slots {
            slot.key.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
        self.probes.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::with_bits(DEFAULT_BITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_round_trip() {
        let data = pack(-12345, 7, TtFlag::UpperBound, 42);
        assert_eq!(unpack_score(data), -12345);
        assert_eq!(unpack_depth(data), 7);
        assert_eq!(unpack_best_idx(data), 42);
        assert_eq!(TtFlag::from_bits(data), TtFlag::UpperBound);
    }

    #[test]
    fn test_store_and_probe() {
        let tt = TranspositionTable::with_bits(10);
        assert_eq!(tt.len(), 1024);
        assert!(!tt.is_empty());
        tt.store(0xDEAD_BEEF, 4, 123, TtFlag::Exact);

        assert_eq!(tt.probe(0xDEAD_BEEF, 4), Some((123, TtFlag::Exact)));
        assert_eq!(tt.probe(0xDEAD_BEEF, 3), Some((123, TtFlag::Exact)));
        // Not deep enough for a depth-5 request
        assert_eq!(tt.probe(0xDEAD_BEEF, 5), None);
    }

    #[test]
    fn test_probe_rejects_colliding_key() {
        let tt = TranspositionTable::with_bits(4);
        tt.store(0x10, 3, 1, TtFlag::Exact);
        // Same bucket (low bits), different hash
        assert_eq!(tt.probe(0x10 | (1 << 60), 0), None);
    }

    #[test]
    fn test_depth_preferred_replacement() {
        let tt = TranspositionTable::with_bits(4);
        let a = 0x21;
        let b = a | (1 << 40); // same bucket
        tt.store(a, 6, 100, TtFlag::Exact);
        // A shallower entry must not evict the deeper one
        tt.store(b, 2, 200, TtFlag::Exact);
        assert_eq!(tt.probe(a, 6), Some((100, TtFlag::Exact)));
        assert_eq!(tt.probe(b, 2), None);
        // A deeper entry replaces it
        tt.store(b, 8, 300, TtFlag::LowerBound);
        assert_eq!(tt.probe(b, 8), Some((300, TtFlag::LowerBound)));
        assert_eq!(tt.probe(a, 1), None);
    }

    #[test]
    fn test_best_idx_requires_matching_key() {
        let tt = TranspositionTable::with_bits(10);
        tt.store(0x77, 3, 5, TtFlag::Exact);
        tt.store_best_idx(0x77, 9);
        assert_eq!(tt.probe_best_idx(0x77), Some(9));

        // A mismatched hash neither reads nor writes the hint
        tt.store_best_idx(0x77 | (1 << 50), 3);
        assert_eq!(tt.probe_best_idx(0x77 | (1 << 50)), None);
        assert_eq!(tt.probe_best_idx(0x77), Some(9));

        // Score survives the hint update
        assert_eq!(tt.probe(0x77, 3), Some((5, TtFlag::Exact)));
    }

    #[test]
    fn test_best_idx_carried_through_store() {
        let tt = TranspositionTable::with_bits(10);
        tt.store(0x99, 2, 10, TtFlag::Exact);
        tt.store_best_idx(0x99, 4);
        tt.store(0x99, 5, 20, TtFlag::LowerBound);
        assert_eq!(tt.probe_best_idx(0x99), Some(4));
    }

    #[test]
    fn test_stats_and_clear() {
        let tt = TranspositionTable::with_bits(8);
        tt.store(1, 1, 1, TtFlag::Exact);
        let _ = tt.probe(1, 1);
        let _ = tt.probe(2, 1);
        let (probes, hits, rate) = tt.stats();
        assert_eq!(probes, 2);
        assert_eq!(hits, 1);
        assert!((rate - 50.0).abs() < f64::EPSILON);

        tt.clear();
        assert_eq!(tt.probe(1, 1), None);
        let (probes, hits, _) = tt.stats();
        assert_eq!((probes, hits), (1, 0));
    }
}
