//! Saltwire Cryptographic Primitives
//!
//! Cryptographic building blocks for the saltwire messaging core. Pure
//! functions with deterministic outputs; callers provide random nonces,
//! which keeps every operation reproducible in tests.
//!
//! # Message Box
//!
//! End-to-end message encryption between two long-term identity keypairs:
//!
//! ```text
//! X25519(sender secret, recipient public)
//!        │
//!        ▼
//! HKDF-SHA256 → Box Key (bound to both public keys)
//!        │
//!        ▼
//! XChaCha20-Poly1305 → Box (ciphertext || tag)
//! ```
//!
//! Both directions of a conversation derive the same box key; the 24-byte
//! nonce carried next to each box keeps individual messages apart.
//!
//! # Nonce Hashing
//!
//! Replay detection stores HMAC-SHA256 hashes of received nonces, keyed
//! by the local identity. Raw nonces never hit storage, so a leaked
//! nonce store cannot be correlated across users.
//!
//! # Security
//!
//! - Authenticity: a failed Poly1305 tag check rejects the box with a
//!   single opaque error
//! - Key separation: the box key binds both public keys through the HKDF
//!   info parameter, so reflected or cross-pair ciphertexts never verify
//! - Hygiene: derived symmetric keys are zeroized after each operation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod message_box;
mod nonce_hash;

pub use error::{CryptoError, Result};
pub use message_box::{BOX_OVERHEAD, NONCE_SIZE, open_box, seal_box};
pub use nonce_hash::{NONCE_HASH_SIZE, NonceHash, hashed_nonce};

// Key types are part of the public API so callers manage identities
// without importing the dalek crate themselves.
pub use x25519_dalek::{PublicKey, StaticSecret};
