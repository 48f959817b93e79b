//! Test key generation
//!
//! Tests generate throwaway Ed25519 keys directly from the OS RNG.

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

/// Generate a fresh Ed25519 signing key for a test architect
pub fn generate_signing_key() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}
