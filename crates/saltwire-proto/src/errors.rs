//! Error types for wire-format parsing and serialization.
//!
//! All errors are structural: they describe exactly which invariant a byte
//! buffer violated, with the expected and observed values where that helps
//! diagnostics. Nothing in this crate retries or recovers; callers decide
//! what a rejected record means for the connection.

use thiserror::Error;

/// Errors that can occur during wire-format operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is shorter than the fixed envelope header.
    #[error("envelope too short: expected at least {expected} bytes, got {actual}")]
    EnvelopeTooShort {
        /// Minimum number of bytes required.
        expected: usize,
        /// Actual number of bytes available.
        actual: usize,
    },

    /// The header's metadata length does not fit the remaining tail.
    ///
    /// The tail must hold the metadata box plus the 24-byte nonce; a
    /// `metadata_len` that leaves no room for the nonce means the record
    /// was truncated or the length field is corrupt.
    #[error("metadata length {metadata_len} inconsistent with {tail_len}-byte tail")]
    MetadataLengthMismatch {
        /// Metadata length claimed by the header.
        metadata_len: usize,
        /// Bytes actually present after the fixed header.
        tail_len: usize,
    },

    /// Metadata box exceeds the 16-bit length field.
    #[error("metadata too large: {len} bytes exceeds maximum {max}")]
    MetadataTooLarge {
        /// Metadata length requested.
        len: usize,
        /// Largest representable metadata length.
        max: usize,
    },

    /// Packet exceeds the protocol-wide size ceiling.
    #[error("packet too large: {size} bytes exceeds maximum {max}")]
    PacketTooLarge {
        /// Observed packet size in bytes.
        size: usize,
        /// Maximum allowed packet size.
        max: usize,
    },

    /// A container payload body is shorter than its record requires.
    #[error("payload too short: expected at least {expected} bytes, got {actual}")]
    PayloadTooShort {
        /// Minimum number of bytes required.
        expected: usize,
        /// Actual number of bytes available.
        actual: usize,
    },

    /// Container payload tag is not part of the protocol.
    ///
    /// Unknown payload tags are rejected outright. The relay link is
    /// version-negotiated, so an unknown tag means a corrupt or hostile
    /// peer, unlike application message types which degrade gracefully.
    #[error("unknown payload tag: {0:#04x}")]
    UnknownPayloadKind(u8),

    /// Push token record carries an unrecognized token kind byte.
    #[error("unknown push token kind: {0:#04x}")]
    InvalidPushTokenKind(u8),
}

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
