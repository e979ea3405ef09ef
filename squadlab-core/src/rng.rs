//! Deterministic RNG hierarchy.
//!
//! A master seed generates sub-seeds for each `(run_id, scope, iteration)`
//! tuple via BLAKE3, so noise runs in a sweep get the same projections no
//! matter how the thread pool schedules them.

use crate::domain::RunId;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Derive a sub-seed for `(run_id, scope, iteration)`. Order independent.
    pub fn sub_seed(&self, run_id: &RunId, scope: &str, iteration: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(run_id.0.as_bytes());
        hasher.update(scope.as_bytes());
        hasher.update(&iteration.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    pub fn rng_for(&self, run_id: &RunId, scope: &str, iteration: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(run_id, scope, iteration))
    }
}
