//! Signed seed commitments
//!
//! Before a bet can be placed the operator publishes `sha256(hidden_seed)`
//! together with an expiry position, signed with the game's authority key.
//! The hidden seed itself is revealed only when the bet is handled.

use crate::errors::CommitmentError;
use crate::games::types::{hex_bytes, seed_hash, SeedHash};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Operator-issued authorization for exactly one future bet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    #[serde(with = "hex_bytes")]
    pub seed_hash: SeedHash,
    pub expiry: u64,
    #[serde(with = "hex_bytes")]
    pub signature: [u8; 64],
}

/// Digest signed by the authority: `sha256(seed_hash ∥ expiry as 32-byte big-endian)`
pub fn commitment_message(seed_hash: &SeedHash, expiry: u64) -> [u8; 32] {
    let mut expiry_word = [0u8; 32];
    expiry_word[24..].copy_from_slice(&expiry.to_be_bytes());

    let mut hasher = Sha256::new();
    hasher.update(seed_hash);
    hasher.update(expiry_word);
    hasher.finalize().into()
}

/// Checks commitments against one authority key
pub trait CommitmentVerifier: Send + Sync {
    /// Public key bytes of the authority this verifier trusts
    fn authority_key(&self) -> [u8; 32];

    /// Verify that `signature` covers `(seed_hash, expiry)` under the authority key
    fn verify(
        &self,
        seed_hash: &SeedHash,
        expiry: u64,
        signature: &[u8; 64],
    ) -> Result<(), CommitmentError>;
}

/// Ed25519 verifier bound to a single authority key
#[derive(Debug, Clone)]
pub struct Ed25519Verifier {
    key: VerifyingKey,
}

impl Ed25519Verifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CommitmentError> {
        let key = VerifyingKey::from_bytes(bytes).map_err(|_| CommitmentError::MalformedKey)?;
        Ok(Self::new(key))
    }
}

impl CommitmentVerifier for Ed25519Verifier {
    fn authority_key(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    fn verify(
        &self,
        seed_hash: &SeedHash,
        expiry: u64,
        signature: &[u8; 64],
    ) -> Result<(), CommitmentError> {
        let message = commitment_message(seed_hash, expiry);
        let signature = Signature::from_bytes(signature);
        self.key
            .verify(&message, &signature)
            .map_err(|_| CommitmentError::InvalidSignature)
    }
}

/// Full check performed at placement: expiry first, then the signature
pub fn verify_commitment(
    verifier: &dyn CommitmentVerifier,
    commitment: &Commitment,
    current_position: u64,
) -> Result<(), CommitmentError> {
    if current_position > commitment.expiry {
        return Err(CommitmentError::CommitmentExpired {
            expiry: commitment.expiry,
            current: current_position,
        });
    }
    verifier.verify(&commitment.seed_hash, commitment.expiry, &commitment.signature)
}

/// Operator side: generates hidden seeds and signs their commitments
pub struct CommitmentSigner {
    key: SigningKey,
}

impl CommitmentSigner {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    /// Signer with a fresh random key
    pub fn generate() -> Self {
        Self::new(SigningKey::generate(&mut OsRng))
    }

    /// Signer with a fixed secret key, for reproducible setups
    pub fn from_secret(secret: &[u8; 32]) -> Self {
        Self::new(SigningKey::from_bytes(secret))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    pub fn verifier(&self) -> Ed25519Verifier {
        Ed25519Verifier::new(self.verifying_key())
    }

    /// Sign a commitment to `hidden_seed` valid through `expiry`
    pub fn commit(&self, hidden_seed: &[u8; 32], expiry: u64) -> Commitment {
        let seed_hash = seed_hash(hidden_seed);
        let signature = self.key.sign(&commitment_message(&seed_hash, expiry));
        Commitment {
            seed_hash,
            expiry,
            signature: signature.to_bytes(),
        }
    }

    /// Draw a fresh hidden seed and commit to it
    pub fn issue(&self, expiry: u64) -> ([u8; 32], Commitment) {
        let mut hidden_seed = [0u8; 32];
        OsRng.fill_bytes(&mut hidden_seed);
        let commitment = self.commit(&hidden_seed, expiry);
        (hidden_seed, commitment)
    }
}
