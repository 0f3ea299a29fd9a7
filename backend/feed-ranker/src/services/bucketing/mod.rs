// ============================================
// Canary Bucketing
// ============================================
//
// Deterministic user → bucket assignment for staged rollout of the
// bandit ranker.
//
//   bucket(user) = fnv1a32(user_id) mod 10000
//   in_canary    = bucket < round(pct * 10000)
//
// The hash covers the user id only. Two canaries keyed off the same
// percentage therefore select the same users; salting with a feature
// name would decorrelate them but changes every existing assignment.

use crate::config::AlgorithmPreference;
use crate::models::{Algorithm, BucketAssignment};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Number of buckets users are spread across (basis points).
pub const BUCKET_COUNT: u32 = 10_000;

/// 32-bit FNV-1a over the UTF-8 bytes of `user_id`. Not cryptographic.
pub fn hash(user_id: &str) -> u32 {
    user_id.bytes().fold(FNV_OFFSET_BASIS, |acc, byte| {
        (acc ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Whether `user_id` falls inside a canary covering fraction `pct` of users.
///
/// Monotonic in `pct`: raising it only ever adds users.
pub fn in_bucket(user_id: &str, pct: f64) -> bool {
    hash(user_id) % BUCKET_COUNT < threshold(pct)
}

/// Buckets covered by `pct`. Rounded, since `pct * 10000` lands just
/// under the integer for some inputs (0.57 → 5699.999...).
fn threshold(pct: f64) -> u32 {
    (pct.clamp(0.0, 1.0) * f64::from(BUCKET_COUNT)).round() as u32
}

/// Assigns users to the canary (bandit ranking) or the configured default.
#[derive(Debug, Clone)]
pub struct BucketAssigner {
    canary_percentage: f64,
    default_algorithm: Algorithm,
}

impl Default for BucketAssigner {
    fn default() -> Self {
        Self::new(0.05)
    }
}

impl BucketAssigner {
    pub fn new(canary_percentage: f64) -> Self {
        Self {
            canary_percentage,
            default_algorithm: Algorithm::Identity,
        }
    }

    /// Algorithm used for users outside the canary. `Server` has no client
    /// counterpart and maps to identity.
    pub fn with_default_algorithm(mut self, preference: AlgorithmPreference) -> Self {
        self.default_algorithm = match preference {
            AlgorithmPreference::Ucb1 => Algorithm::Ucb1,
            AlgorithmPreference::Identity | AlgorithmPreference::Server => Algorithm::Identity,
        };
        self
    }

    pub fn canary_percentage(&self) -> f64 {
        self.canary_percentage
    }

    pub fn assign_treatment(&self, user_id: &str) -> BucketAssignment {
        let in_canary = in_bucket(user_id, self.canary_percentage);
        let algorithm = if in_canary {
            Algorithm::Ucb1
        } else {
            self.default_algorithm
        };

        BucketAssignment {
            algorithm,
            in_canary,
        }
    }
}
