//! Error types for the message decode pipeline.
//!
//! Three layers, matching the pipeline stages: [`DecodeError`] for anything
//! wrong with one message's plaintext, [`ProcessError`] for the full
//! envelope-to-typed-message pipeline, and [`OutboundError`] for the send
//! path. Every error is scoped to a single message; none of them poison the
//! pipeline for subsequent messages, and none are retried here.

use thiserror::Error;

use saltwire_crypto::CryptoError;
use saltwire_proto::{Identity, MessageId, MessageType, ProtocolError};

/// Errors decoding a decrypted plaintext into a typed message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Plaintext is empty after unpadding; there is no type tag to read.
    #[error("empty plaintext, no message type tag")]
    EmptyMessage,

    /// Body is shorter than the type's documented minimum.
    #[error("{msg_type:?} body too short: minimum {min} bytes, got {actual}")]
    BodyTooShort {
        /// Message type whose bounds were violated.
        msg_type: MessageType,
        /// Minimum body length for the type.
        min: usize,
        /// Actual body length.
        actual: usize,
    },

    /// Body is longer than the type's documented maximum.
    #[error("{msg_type:?} body too long: maximum {max} bytes, got {actual}")]
    BodyTooLong {
        /// Message type whose bounds were violated.
        msg_type: MessageType,
        /// Maximum body length for the type.
        max: usize,
        /// Actual body length.
        actual: usize,
    },

    /// Body length is in range but the content does not parse.
    #[error("{msg_type:?} body malformed: {reason}")]
    InvalidBody {
        /// Message type being decoded.
        msg_type: MessageType,
        /// What exactly failed to parse.
        reason: &'static str,
    },

    /// Padding count byte is zero or exceeds the plaintext length.
    #[error("invalid padding")]
    InvalidPadding,

    /// Box authentication failed during `decode_from_boxed`.
    ///
    /// Kept distinct from the malformed-body cases so callers can tell
    /// "tampered or wrong key" apart from "truncated or corrupt layout".
    #[error("box rejected: {0}")]
    Decryption(#[from] CryptoError),
}

/// Errors from the full inbound pipeline (envelope to typed message).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The client has no provisioned identity; nothing can be decrypted
    /// or dedup-checked without one.
    #[error("no local identity provisioned")]
    NoIdentity,

    /// Envelope is addressed to a different identity.
    #[error("envelope addressed to {to}, not this client")]
    WrongRecipient {
        /// Recipient identity named in the envelope.
        to: Identity,
    },

    /// No public key is known for the sending identity.
    #[error("no public key for sender {0}")]
    UnknownSender(Identity),

    /// This nonce was already seen for the local identity.
    ///
    /// Non-fatal: the message was processed once before, so the caller
    /// should acknowledge it to the relay but must not process it again.
    #[error("replayed envelope from {from} (message id {message_id})")]
    ReplayDetected {
        /// Sender of the replayed envelope.
        from: Identity,
        /// Message id of the replayed envelope.
        message_id: MessageId,
    },

    /// A group message arrived under a two-step ratchet.
    #[error("{0}")]
    Ratchet(#[from] FsModeError),

    /// The plaintext failed to decode.
    #[error("{0}")]
    Decode(#[from] DecodeError),
}

impl ProcessError {
    /// Whether the envelope should still be acknowledged to the relay.
    ///
    /// A replay was already processed once; acking it again stops the
    /// relay from redelivering. Every other failure drops the message
    /// without an ack so diagnostics can see it redelivered.
    #[must_use]
    pub fn should_acknowledge(&self) -> bool {
        matches!(self, Self::ReplayDetected { .. })
    }
}

/// Errors resolving a forward-security mode.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FsModeError {
    /// Group fan-out never negotiates a two-step ratchet, so a group
    /// message claiming one indicates a downgrade or a broken sender.
    #[error("group message under a two-step ratchet session")]
    TwoDhGroupMessage,
}

/// Errors assembling an outbound boxed message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OutboundError {
    /// The body violates its own type's bounds; refusing to send it.
    #[error("refusing to send malformed body: {0}")]
    Body(#[from] DecodeError),

    /// The sealed envelope could not be assembled.
    #[error("envelope assembly failed: {0}")]
    Envelope(#[from] ProtocolError),
}
