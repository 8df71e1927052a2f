//! Crypto error types

use thiserror::Error;

/// Errors from box encryption operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// The box could not be opened with the given keys and nonce.
    ///
    /// Deliberately carries no detail: a wrong key, a flipped ciphertext
    /// bit and a wrong nonce are indistinguishable to the caller, so a
    /// failed open never leaks which part was bad.
    #[error("box decryption failed")]
    DecryptionFailed,
}

/// Result type alias for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
