//! # Key Derivation
//!
//! Turns a passphrase and a per-file salt into cipher key material.
//!
//! ```text
//! input  = passphrase || "::" || salt        (UTF-8 bytes)
//! round1 = SHA3-512(input)
//! round2 = BLAKE2b-512(round1)
//! key    = SHA-512(round2)                   (64 bytes)
//! ```
//!
//! The function is pure: the same `(passphrase, salt)` pair always yields the
//! same key, which is what lets decryption rebuild the key from the salt stored
//! in the artifact header.

use blake2::Blake2b512;
use sha2::{Digest, Sha512};
use sha3::Sha3_512;

pub const DERIVED_KEY_SIZE: usize = 64; // 512 bits

/// Key material produced by [`derive_key`]
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey {
    key: [u8; DERIVED_KEY_SIZE],
}

impl DerivedKey {
    /// Get the key as bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derive the cipher key for `passphrase` and `salt`
pub fn derive_key(passphrase: &str, salt: &str) -> DerivedKey {
    let combined = format!("{passphrase}::{salt}");

    let round1 = Sha3_512::digest(combined.as_bytes());
    let round2 = Blake2b512::digest(round1);
    let round3 = Sha512::digest(round2);

    let mut key = [0u8; DERIVED_KEY_SIZE];
    key.copy_from_slice(&round3);
    DerivedKey { key }
}
