//! Boxed message envelope: header plus variable tail.
//!
//! A message record is the 64-byte [`EnvelopeHeader`] followed by a
//! variable tail of `metadata box || nonce || box`. The header's
//! `metadata_len` field is the single authority for splitting that tail;
//! there are no other delimiters on the wire.

use bytes::{BufMut, Bytes};

use crate::errors::{ProtocolError, Result};
use crate::header::EnvelopeHeader;
use crate::limits::{MAX_PKT_LEN, NONCE_LEN, PAYLOAD_HEADER_LEN};

/// A complete boxed message record.
///
/// The structure a relay queues and a client opens: addressing and
/// delivery metadata in the clear (header), an optional encrypted
/// metadata box, the 24-byte box nonce, and the ciphertext itself.
/// Everything end-to-end private lives inside `box_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEnvelope {
    /// Fixed 64-byte header.
    pub header: EnvelopeHeader,
    /// Encrypted metadata box; present iff the header's `metadata_len`
    /// is nonzero.
    pub metadata_box: Option<Bytes>,
    /// Box nonce, unique per (sender, recipient) key pair.
    pub nonce: [u8; NONCE_LEN],
    /// Authenticated ciphertext.
    pub box_data: Bytes,
}

impl MessageEnvelope {
    /// Maximum encoded record size: the packet ceiling minus the
    /// container payload header that carries the record.
    pub const MAX_SIZE: usize = MAX_PKT_LEN - PAYLOAD_HEADER_LEN;

    /// Create an envelope, syncing the header's `metadata_len` field.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::MetadataTooLarge` if the metadata box exceeds the
    ///   16-bit length field
    /// - `ProtocolError::PacketTooLarge` if the encoded record would
    ///   exceed [`Self::MAX_SIZE`]
    pub fn new(
        mut header: EnvelopeHeader,
        metadata_box: Option<Bytes>,
        nonce: [u8; NONCE_LEN],
        box_data: Bytes,
    ) -> Result<Self> {
        let metadata_len = metadata_box.as_ref().map_or(0, Bytes::len);
        let Ok(metadata_len_u16) = u16::try_from(metadata_len) else {
            return Err(ProtocolError::MetadataTooLarge {
                len: metadata_len,
                max: u16::MAX as usize,
            });
        };
        header.metadata_len = metadata_len_u16.to_le_bytes();

        let envelope = Self { header, metadata_box, nonce, box_data };
        let size = envelope.encoded_len();
        if size > Self::MAX_SIZE {
            return Err(ProtocolError::PacketTooLarge { size, max: Self::MAX_SIZE });
        }
        Ok(envelope)
    }

    /// Parse a record from network bytes.
    ///
    /// The tail after the fixed header must hold at least
    /// `metadata_len + 24` bytes (metadata box plus nonce); whatever
    /// remains after those is the ciphertext. An empty ciphertext is
    /// structurally valid here and will fail authentication at open time.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PacketTooLarge` if the buffer exceeds
    ///   [`Self::MAX_SIZE`]
    /// - `ProtocolError::EnvelopeTooShort` if the fixed header is
    ///   incomplete
    /// - `ProtocolError::MetadataLengthMismatch` if `metadata_len` leaves
    ///   no room for the nonce
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > Self::MAX_SIZE {
            return Err(ProtocolError::PacketTooLarge { size: bytes.len(), max: Self::MAX_SIZE });
        }

        let header = *EnvelopeHeader::from_bytes(bytes)?;
        let tail = &bytes[EnvelopeHeader::SIZE..];

        let metadata_len = header.metadata_len() as usize;
        if tail.len() < metadata_len + NONCE_LEN {
            return Err(ProtocolError::MetadataLengthMismatch { metadata_len, tail_len: tail.len() });
        }

        let metadata_box = if metadata_len > 0 {
            Some(Bytes::copy_from_slice(&tail[..metadata_len]))
        } else {
            None
        };

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&tail[metadata_len..metadata_len + NONCE_LEN]);

        let box_data = Bytes::copy_from_slice(&tail[metadata_len + NONCE_LEN..]);

        Ok(Self { header, metadata_box, nonce, box_data })
    }

    /// Serialize the record into a buffer.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PacketTooLarge` if the record exceeds
    ///   [`Self::MAX_SIZE`]
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        let size = self.encoded_len();
        if size > Self::MAX_SIZE {
            return Err(ProtocolError::PacketTooLarge { size, max: Self::MAX_SIZE });
        }
        debug_assert_eq!(
            self.header.metadata_len() as usize,
            self.metadata_box.as_ref().map_or(0, Bytes::len),
            "header metadata_len out of sync with metadata box"
        );

        buf.put_slice(&self.header.to_bytes());
        if let Some(metadata) = &self.metadata_box {
            buf.put_slice(metadata);
        }
        buf.put_slice(&self.nonce);
        buf.put_slice(&self.box_data);
        Ok(())
    }

    /// Serialize the record to a new byte vector.
    ///
    /// # Errors
    ///
    /// Same as [`Self::encode`].
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out)?;
        Ok(out)
    }

    /// Total encoded size in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        EnvelopeHeader::SIZE
            + self.metadata_box.as_ref().map_or(0, Bytes::len)
            + NONCE_LEN
            + self.box_data.len()
    }
}

#[cfg(test)]
mod tests {
    use crate::flags::MessageFlags;
    use crate::ids::{Identity, MessageId};

    use super::*;

    fn sample_header() -> EnvelopeHeader {
        let mut header = EnvelopeHeader::new(
            Identity::from_bytes(*b"AAAAAAAA"),
            Identity::from_bytes(*b"BBBBBBBB"),
            MessageId::from_bytes([0x42; 8]),
        );
        header.set_date(1_700_000_000);
        header.set_flags(MessageFlags::SEND_PUSH);
        header.set_push_from_name("alice");
        header
    }

    #[test]
    fn round_trip_without_metadata() {
        let envelope = MessageEnvelope::new(
            sample_header(),
            None,
            [0x07; NONCE_LEN],
            Bytes::from_static(&[0xAB; 48]),
        )
        .unwrap();

        let bytes = envelope.encode_to_vec().unwrap();
        assert_eq!(bytes.len(), 64 + 24 + 48);

        let parsed = MessageEnvelope::decode(&bytes).unwrap();
        assert_eq!(parsed, envelope);

        // Byte-identical re-serialization
        assert_eq!(parsed.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn round_trip_with_metadata() {
        let metadata = Bytes::from_static(&[0x55; 40]);
        let envelope = MessageEnvelope::new(
            sample_header(),
            Some(metadata.clone()),
            [0x07; NONCE_LEN],
            Bytes::from_static(&[0xCD; 100]),
        )
        .unwrap();
        assert_eq!(envelope.header.metadata_len(), 40);

        let bytes = envelope.encode_to_vec().unwrap();
        let parsed = MessageEnvelope::decode(&bytes).unwrap();
        assert_eq!(parsed.metadata_box, Some(metadata));
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn metadata_len_splits_tail() {
        // Same bytes after the header read differently depending on
        // metadata_len; verify the split point is honored exactly.
        let envelope = MessageEnvelope::new(
            sample_header(),
            Some(Bytes::from_static(&[0x01, 0x02, 0x03])),
            [0x99; NONCE_LEN],
            Bytes::from_static(&[0x0A, 0x0B]),
        )
        .unwrap();

        let bytes = envelope.encode_to_vec().unwrap();
        let parsed = MessageEnvelope::decode(&bytes).unwrap();
        assert_eq!(parsed.metadata_box.as_deref(), Some(&[0x01, 0x02, 0x03][..]));
        assert_eq!(parsed.nonce, [0x99; NONCE_LEN]);
        assert_eq!(parsed.box_data.as_ref(), &[0x0A, 0x0B]);
    }

    #[test]
    fn reject_tail_shorter_than_metadata_and_nonce() {
        let envelope =
            MessageEnvelope::new(sample_header(), None, [0; NONCE_LEN], Bytes::new()).unwrap();
        let mut bytes = envelope.encode_to_vec().unwrap();

        // Claim 200 bytes of metadata with only the nonce in the tail.
        bytes[30..32].copy_from_slice(&200u16.to_le_bytes());

        let result = MessageEnvelope::decode(&bytes);
        assert_eq!(
            result,
            Err(ProtocolError::MetadataLengthMismatch { metadata_len: 200, tail_len: 24 })
        );
    }

    #[test]
    fn reject_truncated_header() {
        let result = MessageEnvelope::decode(&[0u8; 32]);
        assert_eq!(result, Err(ProtocolError::EnvelopeTooShort { expected: 64, actual: 32 }));
    }

    #[test]
    fn reject_oversized_packet() {
        let result = MessageEnvelope::new(
            sample_header(),
            None,
            [0; NONCE_LEN],
            Bytes::from(vec![0u8; MessageEnvelope::MAX_SIZE]),
        );
        assert!(matches!(result, Err(ProtocolError::PacketTooLarge { .. })));

        let big = vec![0u8; MessageEnvelope::MAX_SIZE + 1];
        let result = MessageEnvelope::decode(&big);
        assert!(matches!(result, Err(ProtocolError::PacketTooLarge { .. })));
    }

    #[test]
    fn empty_box_is_structurally_valid() {
        let envelope =
            MessageEnvelope::new(sample_header(), None, [0x33; NONCE_LEN], Bytes::new()).unwrap();
        let bytes = envelope.encode_to_vec().unwrap();
        let parsed = MessageEnvelope::decode(&bytes).unwrap();
        assert!(parsed.box_data.is_empty());
    }
}
