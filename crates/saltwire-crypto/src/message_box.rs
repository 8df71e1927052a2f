//! Asymmetric message box using X25519 and `XChaCha20-Poly1305`
//!
//! A box seals a plaintext from one long-term identity keypair to another.
//! Both directions of a conversation share one symmetric key, derived from
//! the X25519 shared secret and both public keys; nonces keep individual
//! boxes apart. All functions are pure, callers provide the nonce.
//!
//! # Security
//!
//! - Key agreement: X25519 between the sender's secret and the recipient's
//!   public key
//! - Key derivation: HKDF-SHA256 over the shared secret, bound to both
//!   public keys so the key cannot be confused across key pairs
//! - Encryption: XChaCha20-Poly1305 AEAD; a failed tag check rejects the
//!   box with no detail about what went wrong
//! - Derived keys are zeroized after each operation

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};

/// Box nonce size in bytes (`XChaCha20` extended nonce).
pub const NONCE_SIZE: usize = 24;

/// Poly1305 authentication tag size in bytes.
///
/// Every box is exactly this much longer than its plaintext.
pub const BOX_OVERHEAD: usize = 16;

/// Label for box key derivation.
const BOX_KEY_LABEL: &[u8] = b"saltwireBoxV1";

/// Seal a plaintext from the sender to the recipient.
///
/// Returns the ciphertext with the 16-byte authentication tag appended.
///
/// # Security
///
/// - The nonce MUST be unique per (sender, recipient) key pair; both
///   directions share the derived key, so reusing a nonce across
///   directions is also fatal
/// - Caller MUST provide cryptographically random nonces in production
#[must_use]
pub fn seal_box(
    plaintext: &[u8],
    nonce: &[u8; NONCE_SIZE],
    sender_secret: &StaticSecret,
    recipient_public: &PublicKey,
) -> Vec<u8> {
    let sender_public = PublicKey::from(sender_secret);
    let shared = sender_secret.diffie_hellman(recipient_public);
    let mut key = derive_box_key(shared.as_bytes(), &sender_public, recipient_public);

    let cipher = XChaCha20Poly1305::new((&key).into());
    let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(nonce), plaintext) else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };
    key.zeroize();

    ciphertext
}

/// Open a box from the sender addressed to the recipient.
///
/// Returns the plaintext if the authentication tag verifies.
///
/// # Errors
///
/// - `DecryptionFailed` if the keys, nonce or ciphertext do not match;
///   the error does not say which
pub fn open_box(
    ciphertext: &[u8],
    nonce: &[u8; NONCE_SIZE],
    recipient_secret: &StaticSecret,
    sender_public: &PublicKey,
) -> Result<Vec<u8>> {
    let recipient_public = PublicKey::from(recipient_secret);
    let shared = recipient_secret.diffie_hellman(sender_public);
    let mut key = derive_box_key(shared.as_bytes(), sender_public, &recipient_public);

    let cipher = XChaCha20Poly1305::new((&key).into());
    let result = cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed);
    key.zeroize();

    result
}

/// Derive the symmetric box key for a key pair.
///
/// The info parameter binds the key to the message sender's public key
/// first and the recipient's second, so both sides of a conversation
/// derive the same key for a given direction without ever comparing
/// public keys.
fn derive_box_key(
    shared_secret: &[u8; 32],
    sender_public: &PublicKey,
    recipient_public: &PublicKey,
) -> [u8; 32] {
    let hkdf = Hkdf::<Sha256>::new(None, shared_secret);

    // Capacity: 13 (label) + 32 + 32 (public keys) = 77
    let mut info = Vec::with_capacity(77);
    info.extend_from_slice(BOX_KEY_LABEL);
    info.extend_from_slice(sender_public.as_bytes());
    info.extend_from_slice(recipient_public.as_bytes());

    let mut key = [0u8; 32];
    let Ok(()) = hkdf.expand(&info, &mut key) else {
        unreachable!("32 bytes is a valid HKDF-SHA256 output length");
    };

    key
}
