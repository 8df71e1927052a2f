//! Nonce hashing for replay detection
//!
//! Received box nonces are remembered so a replayed envelope can be
//! recognized. Storing raw nonces would let anyone with the store link
//! messages across conversations, so nonces are stored as an HMAC keyed
//! by the local identity: the hash is useless without knowing whose
//! store it is, and two users never produce comparable hashes for the
//! same nonce.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Size of a hashed nonce in bytes (HMAC-SHA256 output).
pub const NONCE_HASH_SIZE: usize = 32;

/// An identity-keyed hash of a box nonce.
///
/// Equal hashes mean the same nonce was seen by the same identity.
/// Rendered as lowercase hex for logs and storage keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonceHash([u8; NONCE_HASH_SIZE]);

impl NonceHash {
    /// Construct from raw hash bytes (e.g. loaded from storage).
    #[must_use]
    pub const fn from_bytes(bytes: [u8; NONCE_HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; NONCE_HASH_SIZE] {
        &self.0
    }

    /// Owned hash bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; NONCE_HASH_SIZE] {
        self.0
    }
}

impl fmt::Display for NonceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for NonceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NonceHash({self})")
    }
}

/// Hash a nonce under the local identity.
///
/// Deterministic: the same (identity, nonce) pair always produces the
/// same hash, which is exactly what makes the hash usable as a replay
/// detection key.
///
/// Returns `None` for an empty identity. A client without a provisioned
/// identity has no dedup scope, and hashing under an empty key would
/// make every such client's hashes comparable.
#[must_use]
pub fn hashed_nonce(identity: &[u8], nonce: &[u8]) -> Option<NonceHash> {
    if identity.is_empty() {
        return None;
    }
    let Ok(mut mac) = HmacSha256::new_from_slice(identity) else {
        unreachable!("HMAC-SHA256 accepts keys of any length");
    };
    mac.update(nonce);
    Some(NonceHash(mac.finalize().into_bytes().into()))
}
