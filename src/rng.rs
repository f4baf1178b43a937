//! Randomness derivation for bet outcomes
//!
//! An outcome is `sha256(hidden ∥ public [∥ ':' ∥ nonce])` read as a big-endian
//! integer and reduced modulo the outcome space. Anyone holding both seeds can
//! reproduce every draw bit-for-bit.

use sha2::{Digest, Sha256};

/// Byte placed between the seed pair and an optional nonce
pub const NONCE_SEPARATOR: u8 = b':';

/// Nonce used for the jackpot draw
pub const JACKPOT_NONCE: &[u8] = b"jackpot";

/// Draw a value in `[0, modulus)` from a seed pair.
///
/// A zero modulus has no valid outcome and yields 0.
pub fn derive(hidden_seed: &[u8; 32], public_seed: &[u8; 32], modulus: u64) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(hidden_seed);
    hasher.update(public_seed);
    reduce(&hasher.finalize().into(), modulus)
}

/// Draw an independent value from the same seed pair, keyed by `nonce`
pub fn derive_with_nonce(
    hidden_seed: &[u8; 32],
    public_seed: &[u8; 32],
    modulus: u64,
    nonce: &[u8],
) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(hidden_seed);
    hasher.update(public_seed);
    hasher.update([NONCE_SEPARATOR]);
    hasher.update(nonce);
    reduce(&hasher.finalize().into(), modulus)
}

/// Exact big-endian `digest mod modulus`
fn reduce(digest: &[u8; 32], modulus: u64) -> u64 {
    if modulus == 0 {
        return 0;
    }
    let m = modulus as u128;
    digest
        .iter()
        .fold(0u128, |acc, &byte| ((acc << 8) | byte as u128) % m) as u64
}
