//! Debug counters for the v3 mutation loop.
//!
//! Built only with the `op-stats` feature: per-opcode hit counts and a
//! histogram of loop lengths. Without the feature every recorder is an
//! empty inline function and [`snapshot`] returns `None`.

use std::collections::BTreeMap;

/// Counters collected since the last [`reset`].
#[derive(Debug, Clone, Default)]
pub struct OpStats {
    /// Hits per opcode, indexed by opcode
    pub ops: Vec<u64>,
    /// Loop length -> evaluations that ran that many tries
    pub tries: BTreeMap<u64, u64>,
}

impl OpStats {
    pub fn evaluations(&self) -> u64 {
        self.tries.values().sum()
    }
}

#[cfg(feature = "op-stats")]
mod enabled {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use super::OpStats;

    #[allow(clippy::declare_interior_mutable_const)]
    const ZERO: AtomicU64 = AtomicU64::new(0);
    static OPS: [AtomicU64; 256] = [ZERO; 256];
    static TRIES: Mutex<BTreeMap<u64, u64>> = Mutex::new(BTreeMap::new());

    pub fn record_op(op: u8) {
        OPS[op as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tries(tries: u64) {
        let mut histogram = TRIES.lock().unwrap_or_else(|e| e.into_inner());
        *histogram.entry(tries).or_insert(0) += 1;
    }

    pub fn snapshot() -> Option<OpStats> {
        let ops = OPS.iter().map(|c| c.load(Ordering::Relaxed)).collect();
        let tries = TRIES.lock().unwrap_or_else(|e| e.into_inner()).clone();
        Some(OpStats { ops, tries })
    }

    pub fn reset() {
        for counter in &OPS {
            counter.store(0, Ordering::Relaxed);
        }
        TRIES.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(feature = "op-stats")]
pub use enabled::{record_op, record_tries, reset, snapshot};

#[cfg(not(feature = "op-stats"))]
#[inline(always)]
pub fn record_op(_op: u8) {}

#[cfg(not(feature = "op-stats"))]
#[inline(always)]
pub fn record_tries(_tries: u64) {}

#[cfg(not(feature = "op-stats"))]
pub fn snapshot() -> Option<OpStats> {
    None
}

#[cfg(not(feature = "op-stats"))]
pub fn reset() {}
