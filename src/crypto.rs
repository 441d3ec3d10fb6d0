//! # Cipher Engine
//!
//! Layered XOR transform over a byte buffer and the on-disk package framing.
//!
//! ## Package Format
//!
//! ```text
//! MARKER :: v1.0 :: SALT_HEX(64 chars) :: CIPHERTEXT
//! ```
//!
//! Fields are joined with the two-byte ASCII separator `::`. The ciphertext is
//! raw bytes and may itself contain `::`, so parsing splits into at most four
//! fields and leaves the remainder untouched.
//!
//! ## Passes
//!
//! Encryption applies three length-preserving passes with the derived key `k`
//! over a buffer of length `N`:
//!
//! 1. forward XOR: `b[i] ^= k[i % len(k)]`, `i` ascending
//! 2. reverse XOR: `b[i] ^= k[(N - 1 - i) % len(k)]`, `i` descending
//! 3. position XOR: `b[i] ^= (i + 1) % 256`
//!
//! Decryption runs them in the opposite order. Each pass only XORs a value that
//! depends on `i`, `N` and the key, so every pass is its own inverse.
//!
//! ## Security Properties
//!
//! The construction is kept for compatibility with existing artifacts. It has
//! no integrity protection beyond the marker check: a wrong passphrase yields
//! garbage rather than an error, and tampered ciphertext is not detected.

use crate::kdf::{derive_key, DerivedKey};
use rand::rngs::OsRng;
use rand::RngCore;

pub const SALT_SIZE: usize = 32; // bytes before hex encoding
pub const FORMAT_VERSION: &str = "v1.0";
pub const SEPARATOR: &[u8] = b"::";
pub const DEFAULT_MARKER: &str = "ARTIFACT_SHIELD_ENCRYPTED";

// Number of top-level fields in a package
const PACKAGE_FIELDS: usize = 4;

#[derive(Debug, Clone)]
pub struct CipherEngine {
    marker: String,
}

impl Default for CipherEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl CipherEngine {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// The marker written at the start of every package
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Generate a fresh hex-encoded salt
    pub fn generate_salt() -> String {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        hex::encode(salt)
    }

    /// Encrypt data with a freshly generated salt
    pub fn encrypt(&self, plaintext: &[u8], passphrase: &str) -> Vec<u8> {
        self.encrypt_with_salt(plaintext, passphrase, &Self::generate_salt())
    }

    /// Encrypt data with a caller-provided salt
    pub fn encrypt_with_salt(&self, plaintext: &[u8], passphrase: &str, salt: &str) -> Vec<u8> {
        let key = derive_key(passphrase, salt);

        let mut buf = plaintext.to_vec();
        forward_xor(&mut buf, &key);
        reverse_xor(&mut buf, &key);
        position_xor(&mut buf);

        let mut package = Vec::with_capacity(
            self.marker.len() + FORMAT_VERSION.len() + salt.len() + buf.len() + 3 * SEPARATOR.len(),
        );
        package.extend_from_slice(self.marker.as_bytes());
        package.extend_from_slice(SEPARATOR);
        package.extend_from_slice(FORMAT_VERSION.as_bytes());
        package.extend_from_slice(SEPARATOR);
        package.extend_from_slice(salt.as_bytes());
        package.extend_from_slice(SEPARATOR);
        package.extend_from_slice(&buf);

        package
    }

    /// Decrypt a package. Returns `None` for anything that is not a well-formed
    /// package carrying this engine's marker.
    pub fn decrypt(&self, package: &[u8], passphrase: &str) -> Option<Vec<u8>> {
        let fields = split_fields(package, PACKAGE_FIELDS);
        let [marker, _version, salt, ciphertext] = fields.as_slice() else {
            return None;
        };

        if *marker != self.marker.as_bytes() {
            return None;
        }

        let salt = std::str::from_utf8(salt).ok()?;
        let key = derive_key(passphrase, salt);

        let mut buf = ciphertext.to_vec();
        position_xor(&mut buf);
        reverse_xor(&mut buf, &key);
        forward_xor(&mut buf, &key);

        Some(buf)
    }

    /// Check whether the marker occurs within `header`
    pub fn has_marker(&self, header: &[u8]) -> bool {
        let marker = self.marker.as_bytes();
        if marker.is_empty() {
            return false;
        }
        header.windows(marker.len()).any(|window| window == marker)
    }
}

/// Split on [`SEPARATOR`] into at most `limit` fields; the last field keeps any
/// remaining separators.
fn split_fields(data: &[u8], limit: usize) -> Vec<&[u8]> {
    let mut fields = Vec::with_capacity(limit);
    let mut rest = data;

    while fields.len() + 1 < limit {
        match rest.windows(SEPARATOR.len()).position(|w| w == SEPARATOR) {
            Some(pos) => {
                fields.push(&rest[..pos]);
                rest = &rest[pos + SEPARATOR.len()..];
            }
            None => break,
        }
    }
    fields.push(rest);

    fields
}

fn forward_xor(buf: &mut [u8], key: &DerivedKey) {
    let key = key.as_bytes();
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= key[i % key.len()];
    }
}

fn reverse_xor(buf: &mut [u8], key: &DerivedKey) {
    let key = key.as_bytes();
    let n = buf.len();
    for i in (0..n).rev() {
        buf[i] ^= key[(n - 1 - i) % key.len()];
    }
}

fn position_xor(buf: &mut [u8]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= ((i + 1) % 256) as u8;
    }
}
