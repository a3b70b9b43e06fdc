//! Per-worker buffer bundle.
//!
//! A `Scratch` owns every large buffer one PoW evaluation touches, sized at
//! construction, so evaluations never allocate. Miner workers own one
//! scratch each for their lifetime; one-off callers borrow from a shared
//! free-list with [`Scratch::acquire`] and hand it back with
//! [`Scratch::release`].

use std::sync::Mutex;

use sha2::{Digest, Sha256};
use sha3::Sha3_256;

use crate::core::params::{HISTORY_LENGTH, MAX_LENGTH, STAGE1_LENGTH, STAGE1_PADDING};
use crate::pow::sais::SaisWorkspace;
use crate::pow::sort_indices::{self, SortBuffers};

/// Scratches kept on the free-list; extras are dropped on release.
const MAX_POOLED: usize = 64;

static POOL: Mutex<Vec<Scratch>> = Mutex::new(Vec::new());

pub struct Scratch {
    /// Snapshot history fed to the v3 suffix array
    pub(crate) data: Box<[u8]>,
    pub(crate) sa: Box<[i32]>,
    pub(crate) sais: SaisWorkspace,
    pub(crate) sort: SortBuffers,
    /// Stage buffer of the pre-v3 variant, zero padded for the sort's reads
    pub(crate) stage1: Box<[u8]>,
    /// 16-bit view of the stage sort result
    pub(crate) stage1_result: Box<[u16]>,
    pub(crate) sha256: Sha256,
    pub(crate) sha3: Sha3_256,
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            data: vec![0u8; HISTORY_LENGTH].into_boxed_slice(),
            sa: vec![0i32; MAX_LENGTH].into_boxed_slice(),
            sais: SaisWorkspace::new(),
            sort: SortBuffers::new(MAX_LENGTH + 1),
            stage1: vec![0u8; STAGE1_LENGTH + STAGE1_PADDING].into_boxed_slice(),
            stage1_result: vec![0u16; STAGE1_LENGTH + 1].into_boxed_slice(),
            sha256: Sha256::new(),
            sha3: Sha3_256::new(),
        }
    }

    /// Take a scratch from the shared free-list, or build a new one.
    pub fn acquire() -> Self {
        let pooled = POOL.lock().unwrap_or_else(|e| e.into_inner()).pop();
        pooled.unwrap_or_else(Self::new)
    }

    /// Return this scratch to the free-list.
    ///
    /// Buffers are not cleared; every evaluation initializes what it reads.
    pub fn release(self) {
        let mut pool = POOL.lock().unwrap_or_else(|e| e.into_inner());
        if pool.len() < MAX_POOLED {
            pool.push(self);
        }
    }

    /// Number of scratches currently idle on the free-list
    pub fn pooled() -> usize {
        POOL.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Stage-variant sort of `v[..n]` into `output` using this scratch's
    /// sort arrays. `v` needs 8 readable bytes past `n`.
    pub fn sort_indices(&mut self, n: u32, v: &mut [u8], output: &mut [u16]) {
        sort_indices::sort_indices(n, v, output, &mut self.sort);
    }

    /// v3-variant of [`Scratch::sort_indices`].
    pub fn sort_indices_v3(&mut self, n: u32, v: &mut [u8], output: &mut [u16]) {
        sort_indices::sort_indices_v3(n, v, output, &mut self.sort);
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}
