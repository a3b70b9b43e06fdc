//! AstroBWT proof-of-work.
//!
//! Two variants share one [`Scratch`]:
//!   - [`astrobwt_v3`]: the current algorithm, a 256-byte mutation loop
//!     driven by a frozen opcode table whose snapshot history is suffix
//!     sorted and hashed with SHA-256.
//!   - [`pow_optimized`]: the pre-v3 variant, which sorts a 9973-byte
//!     Salsa20 stage and hashes the ordering with SHA3-256.
//!
//! Both are deterministic and never allocate once the scratch exists.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use tracing::warn;

use crate::core::types::Hash256;

pub mod astrobwtv3;
pub mod opcodes;
pub mod sais;
pub mod scratch;
pub mod sort_indices;
pub mod stage1;
pub mod stats;
pub mod vectors;

pub use astrobwtv3::astrobwt_v3;
pub use scratch::Scratch;
pub use sort_indices::{sort_indices, sort_indices_v3};
pub use stage1::{pow16, pow_optimized};

/// Which PoW a miner evaluates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    AstroBwtV3,
    Stage1,
}

impl Algorithm {
    pub fn hash(self, input: &[u8], scratch: &mut Scratch) -> Hash256 {
        match self {
            Algorithm::AstroBwtV3 => astrobwt_v3(input, scratch),
            Algorithm::Stage1 => pow_optimized(input, scratch),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::AstroBwtV3 => "astrobwt-v3",
            Algorithm::Stage1 => "stage1",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "astrobwt-v3" | "v3" => Ok(Algorithm::AstroBwtV3),
            "stage1" | "optimized" => Ok(Algorithm::Stage1),
            other => Err(format!(
                "unknown algorithm '{}' (expected astrobwt-v3 or stage1)",
                other
            )),
        }
    }
}

/// Run `evaluate`, replacing a panic with `fallback` of 16 random bytes.
///
/// The substitute digest is effectively random, so it never meets a share
/// target and the worker simply moves on.
pub(crate) fn guarded<F>(label: &str, fallback: fn(&[u8]) -> Hash256, evaluate: F) -> Hash256
where
    F: FnOnce() -> Hash256,
{
    match panic::catch_unwind(AssertUnwindSafe(evaluate)) {
        Ok(digest) => digest,
        Err(_) => {
            warn!("{} evaluation panicked, returning a random digest", label);
            let seed: [u8; 16] = rand::random();
            fallback(&seed)
        }
    }
}
