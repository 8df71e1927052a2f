//! Media blob reference records.
//!
//! Media never travels inside a boxed message; the message carries a
//! reference to a blob uploaded separately. Two encryption shapes exist:
//! one-to-one images seal the blob with the conversation's box keys and
//! carry the blob nonce ([`BoxedBlob`]), while group media and profile
//! photos carry a random symmetric key next to the reference
//! ([`KeyedBlob`]) so every member can fetch and decrypt the same blob.

use saltwire_proto::limits::{BLOB_KEY_LEN, NONCE_LEN};
use saltwire_proto::BlobId;

use crate::error::DecodeError;
use crate::messages::BodyReader;

/// Blob reference sealed with the conversation box keys.
///
/// Layout: `blob_id (16) || size u32 LE || nonce (24)`, 44 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxedBlob {
    /// Blob id on the blob server.
    pub blob_id: BlobId,
    /// Encrypted blob size in bytes.
    pub size: u32,
    /// Nonce the blob was sealed with.
    pub nonce: [u8; NONCE_LEN],
}

impl BoxedBlob {
    pub(crate) fn read(r: &mut BodyReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self { blob_id: r.take_blob_id()?, size: r.take_u32_le()?, nonce: r.take_array()? })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.blob_id.as_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(&self.nonce);
    }
}

/// Blob reference with an embedded symmetric key.
///
/// Layout: `blob_id (16) || size u32 LE || key (32)`, 52 bytes. Used for
/// group media and profile photos, where per-recipient box encryption of
/// the blob itself would defeat sharing one upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyedBlob {
    /// Blob id on the blob server.
    pub blob_id: BlobId,
    /// Encrypted blob size in bytes.
    pub size: u32,
    /// Symmetric key the blob was encrypted with.
    pub key: [u8; BLOB_KEY_LEN],
}

impl KeyedBlob {
    pub(crate) fn read(r: &mut BodyReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self { blob_id: r.take_blob_id()?, size: r.take_u32_le()?, key: r.take_array()? })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.blob_id.as_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(&self.key);
    }
}

/// Video reference with its thumbnail.
///
/// Layout: `duration u16 LE || video blob_id (16) || video size u32 LE ||
/// thumbnail blob_id (16) || thumbnail size u32 LE || key (32)`, 74 bytes.
/// Video and thumbnail share the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMessage {
    /// Playback duration in seconds.
    pub duration_secs: u16,
    /// Video blob id.
    pub video_blob_id: BlobId,
    /// Encrypted video size in bytes.
    pub video_size: u32,
    /// Thumbnail blob id.
    pub thumbnail_blob_id: BlobId,
    /// Encrypted thumbnail size in bytes.
    pub thumbnail_size: u32,
    /// Symmetric key for both blobs.
    pub key: [u8; BLOB_KEY_LEN],
}

impl VideoMessage {
    pub(crate) fn read(r: &mut BodyReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            duration_secs: r.take_u16_le()?,
            video_blob_id: r.take_blob_id()?,
            video_size: r.take_u32_le()?,
            thumbnail_blob_id: r.take_blob_id()?,
            thumbnail_size: r.take_u32_le()?,
            key: r.take_array()?,
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.duration_secs.to_le_bytes());
        out.extend_from_slice(self.video_blob_id.as_bytes());
        out.extend_from_slice(&self.video_size.to_le_bytes());
        out.extend_from_slice(self.thumbnail_blob_id.as_bytes());
        out.extend_from_slice(&self.thumbnail_size.to_le_bytes());
        out.extend_from_slice(&self.key);
    }
}

/// Audio reference.
///
/// Layout: `duration u16 LE || blob_id (16) || size u32 LE || key (32)`,
/// 54 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioMessage {
    /// Playback duration in seconds.
    pub duration_secs: u16,
    /// Audio blob id.
    pub blob_id: BlobId,
    /// Encrypted blob size in bytes.
    pub size: u32,
    /// Symmetric key for the blob.
    pub key: [u8; BLOB_KEY_LEN],
}

impl AudioMessage {
    pub(crate) fn read(r: &mut BodyReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            duration_secs: r.take_u16_le()?,
            blob_id: r.take_blob_id()?,
            size: r.take_u32_le()?,
            key: r.take_array()?,
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.duration_secs.to_le_bytes());
        out.extend_from_slice(self.blob_id.as_bytes());
        out.extend_from_slice(&self.size.to_le_bytes());
        out.extend_from_slice(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use saltwire_proto::MessageType;

    use super::*;

    #[test]
    fn boxed_blob_layout() {
        let blob = BoxedBlob {
            blob_id: BlobId::from_bytes([0x11; 16]),
            size: 0x0403_0201,
            nonce: [0x22; 24],
        };
        let mut out = Vec::new();
        blob.write(&mut out);
        assert_eq!(out.len(), 44);
        assert_eq!(&out[..16], &[0x11; 16]);
        // Little-endian size
        assert_eq!(&out[16..20], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&out[20..], &[0x22; 24]);

        let mut r = BodyReader::new(MessageType::Image, &out);
        assert_eq!(BoxedBlob::read(&mut r).unwrap(), blob);
    }

    #[test]
    fn keyed_blob_layout() {
        let blob = KeyedBlob {
            blob_id: BlobId::from_bytes([0x33; 16]),
            size: 1024,
            key: [0x44; 32],
        };
        let mut out = Vec::new();
        blob.write(&mut out);
        assert_eq!(out.len(), 52);

        let mut r = BodyReader::new(MessageType::ContactSetPhoto, &out);
        assert_eq!(KeyedBlob::read(&mut r).unwrap(), blob);
    }

    #[test]
    fn video_layout() {
        let video = VideoMessage {
            duration_secs: 90,
            video_blob_id: BlobId::from_bytes([0x55; 16]),
            video_size: 2_000_000,
            thumbnail_blob_id: BlobId::from_bytes([0x66; 16]),
            thumbnail_size: 9000,
            key: [0x77; 32],
        };
        let mut out = Vec::new();
        video.write(&mut out);
        assert_eq!(out.len(), 74);
        assert_eq!(&out[..2], &90u16.to_le_bytes());

        let mut r = BodyReader::new(MessageType::Video, &out);
        assert_eq!(VideoMessage::read(&mut r).unwrap(), video);
    }

    #[test]
    fn audio_layout() {
        let audio = AudioMessage {
            duration_secs: 12,
            blob_id: BlobId::from_bytes([0x88; 16]),
            size: 48_000,
            key: [0x99; 32],
        };
        let mut out = Vec::new();
        audio.write(&mut out);
        assert_eq!(out.len(), 54);

        let mut r = BodyReader::new(MessageType::Audio, &out);
        assert_eq!(AudioMessage::read(&mut r).unwrap(), audio);
    }
}
