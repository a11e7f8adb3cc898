//! Per-season RNG streams derived from a single batch seed.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

const SEASON_DOMAIN_TAG: &[u8] = b"ranksim.season";

/// Derive an independent stream seed for season `index` of a batch.
///
/// The derivation depends only on the batch seed and the index, so a batch
/// produces the same seasons whether it runs sequentially or in parallel.
#[must_use]
pub fn derive_season_seed(batch_seed: u64, index: u32) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&batch_seed.to_le_bytes())
        .expect("hmac accepts keys of any length");
    mac.update(SEASON_DOMAIN_TAG);
    mac.update(&index.to_le_bytes());
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// RNG owned by a single season.
#[must_use]
pub fn season_rng(batch_seed: u64, index: u32) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(derive_season_seed(batch_seed, index))
}
