//! Message record header with zero-copy parsing.
//!
//! The `EnvelopeHeader` is the fixed 64-byte prefix of every boxed message
//! record, serialized as raw binary (little-endian). Relay-side routing
//! only ever needs this prefix; the encrypted tail is never touched until
//! the recipient opens it.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::{ProtocolError, Result};
use crate::flags::MessageFlags;
use crate::ids::{Identity, MessageId};
use crate::limits::PUSH_FROM_NAME_LEN;

/// Fixed 64-byte message record header (little-endian byte order)
///
/// Multi-byte integers are little-endian, matching the packed-struct wire
/// format of the reference clients. Fields are stored as raw byte arrays
/// to avoid alignment issues; accessors decode on demand.
///
/// The header fits exactly one 64-byte CPU cache line, so relay-side
/// dispatch (identity routing, flag checks) touches a single line.
///
/// # Security
///
/// The `#[repr(C, packed)]` layout with zerocopy traits ensures this
/// struct can be cast from untrusted network bytes safely: all 64-byte
/// patterns are valid, so parsing cannot cause undefined behavior. The
/// header is NOT authenticated by itself; authenticity comes from opening
/// the box in the record tail. Nothing security-relevant may be decided
/// from header fields alone.
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct EnvelopeHeader {
    // Addressing (24 bytes: 0-23)
    from_identity: [u8; 8],
    to_identity: [u8; 8],
    message_id: [u8; 8],

    // Delivery metadata (8 bytes: 24-31)
    date: [u8; 4], // u32 Unix seconds
    flags: u8,     // MessageFlags bitfield
    reserved: u8,  // always written as zero, preserved on re-encode
    pub(crate) metadata_len: [u8; 2], // u16 length of the metadata box

    // Push preview (32 bytes: 32-63)
    push_from_name: [u8; 32], // NUL-padded UTF-8, best effort
}

impl EnvelopeHeader {
    /// Size of the serialized header (64 bytes)
    pub const SIZE: usize = 64;

    /// Create a new header for an outgoing message.
    ///
    /// Date, flags, and push name start zeroed; set them with the
    /// corresponding setters before encoding.
    #[must_use]
    pub fn new(from: Identity, to: Identity, message_id: MessageId) -> Self {
        Self {
            from_identity: from.to_bytes(),
            to_identity: to.to_bytes(),
            message_id: message_id.to_bytes(),
            date: [0; 4],
            flags: 0,
            reserved: 0,
            metadata_len: [0; 2],
            push_from_name: [0; PUSH_FROM_NAME_LEN],
        }
    }

    /// Parse a header from network bytes (zero-copy, safe).
    ///
    /// Casts the first 64 bytes to a header reference without copying.
    /// There is no magic or version field in this record; framing context
    /// comes from the container payload tag, so the only structural check
    /// here is length.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::EnvelopeTooShort` if fewer than 64 bytes remain
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        Ok(Self::ref_from_prefix(bytes)
            .map_err(|_| ProtocolError::EnvelopeTooShort {
                expected: Self::SIZE,
                actual: bytes.len(),
            })?
            .0)
    }

    /// Serialize the header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let bytes = IntoBytes::as_bytes(self);
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(bytes);
        arr
    }

    /// Sender identity.
    #[must_use]
    pub fn from_identity(&self) -> Identity {
        Identity::from_bytes(self.from_identity)
    }

    /// Recipient identity.
    #[must_use]
    pub fn to_identity(&self) -> Identity {
        Identity::from_bytes(self.to_identity)
    }

    /// Message id (random, sender/receiver-scoped).
    #[must_use]
    pub fn message_id(&self) -> MessageId {
        MessageId::from_bytes(self.message_id)
    }

    /// Submission time as Unix seconds.
    #[must_use]
    pub fn date(&self) -> u32 {
        u32::from_le_bytes(self.date)
    }

    /// Relay delivery flags.
    #[must_use]
    pub fn flags(&self) -> MessageFlags {
        MessageFlags::from_byte(self.flags)
    }

    /// Length of the metadata box in the record tail.
    #[must_use]
    pub fn metadata_len(&self) -> u16 {
        u16::from_le_bytes(self.metadata_len)
    }

    /// Raw push name field, NUL padding included.
    #[must_use]
    pub fn push_from_name_raw(&self) -> &[u8; PUSH_FROM_NAME_LEN] {
        &self.push_from_name
    }

    /// Sender display name for push previews.
    ///
    /// Best effort: the field is informational, so invalid UTF-8 decodes
    /// lossily rather than failing the record. `None` when empty.
    #[must_use]
    pub fn push_from_name(&self) -> Option<String> {
        let end = self.push_from_name.iter().position(|&b| b == 0).unwrap_or(PUSH_FROM_NAME_LEN);
        if end == 0 {
            return None;
        }
        Some(String::from_utf8_lossy(&self.push_from_name[..end]).into_owned())
    }

    /// Set the submission time.
    pub fn set_date(&mut self, unix_seconds: u32) {
        self.date = unix_seconds.to_le_bytes();
    }

    /// Set the relay delivery flags.
    pub fn set_flags(&mut self, flags: MessageFlags) {
        self.flags = flags.to_byte();
    }

    /// Set the push display name, truncating to 32 bytes on a char
    /// boundary and NUL-padding the rest.
    pub fn set_push_from_name(&mut self, name: &str) {
        let mut len = name.len().min(PUSH_FROM_NAME_LEN);
        while len > 0 && !name.is_char_boundary(len) {
            len -= 1;
        }
        let mut field = [0u8; PUSH_FROM_NAME_LEN];
        field[..len].copy_from_slice(&name.as_bytes()[..len]);
        self.push_from_name = field;
    }
}

// Manual Debug implementation (can't derive due to packed repr)
impl std::fmt::Debug for EnvelopeHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeHeader")
            .field("from_identity", &self.from_identity())
            .field("to_identity", &self.to_identity())
            .field("message_id", &self.message_id())
            .field("date", &self.date())
            .field("flags", &self.flags())
            .field("metadata_len", &self.metadata_len())
            .field("push_from_name", &self.push_from_name())
            .finish_non_exhaustive()
    }
}

// Manual PartialEq implementation (can't derive due to packed repr)
impl PartialEq for EnvelopeHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for EnvelopeHeader {}
