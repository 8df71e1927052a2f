//! Protocol length constants and size ceilings.
//!
//! These values define byte offsets inside packed records and the bounds
//! the decoder enforces, so they are wire-compatibility critical and must
//! never change for a given protocol version.

/// Client identity length in bytes (eight ASCII characters).
pub const IDENTITY_LEN: usize = 8;

/// Message id length in bytes (random, sender/receiver-scoped).
pub const MESSAGE_ID_LEN: usize = 8;

/// Box nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Push display-name field length in bytes (NUL-padded UTF-8).
pub const PUSH_FROM_NAME_LEN: usize = 32;

/// Login cookie length in bytes.
pub const COOKIE_LEN: usize = 16;

/// Blob id length in bytes.
pub const BLOB_ID_LEN: usize = 16;

/// Blob encryption key length in bytes.
pub const BLOB_KEY_LEN: usize = 32;

/// Group id length in bytes.
pub const GROUP_ID_LEN: usize = 8;

/// Group creator identity length in bytes.
pub const GROUP_CREATOR_LEN: usize = 8;

/// Combined group header length: creator identity followed by group id.
pub const GROUP_HEADER_LEN: usize = GROUP_CREATOR_LEN + GROUP_ID_LEN;

/// Ballot id length in bytes.
pub const BALLOT_ID_LEN: usize = 8;

/// Maximum text body length in bytes.
pub const MAX_TEXT_LEN: usize = 7000;

/// Maximum media caption length in bytes.
pub const MAX_CAPTION_LEN: usize = 1000;

/// Maximum group name length in bytes.
pub const MAX_GROUP_NAME_LEN: usize = 256;

/// Maximum whole-packet length in bytes, payload header included.
pub const MAX_PKT_LEN: usize = 8192;

/// Minimum padded plaintext length in bytes before sealing.
///
/// Short messages are padded up to this floor so ciphertext length leaks
/// as little as possible about very short plaintexts.
pub const MIN_PADDED_LEN: usize = 32;

/// Container payload header length: tag byte plus three reserved bytes.
pub const PAYLOAD_HEADER_LEN: usize = 4;
