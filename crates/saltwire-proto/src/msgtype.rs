//! Message type tags.
//!
//! The first plaintext byte of every boxed message is a type tag that
//! selects the body layout. Tags are organized into ranges:
//!
//! - `0x01-0x1F`: one-to-one content and contact control
//! - `0x41-0x54`: group variants (all carry the 16-byte group header)
//! - `0x60-0x64`: voip call signaling
//! - `0x80-0x9F`: receipts, typing, edit/delete
//! - `0xA0`: forward-security envelope
//! - `0xFC-0xFF`: keepalive and authentication
//!
//! Every tag has fixed body bounds (`min_body_len`/`max_body_len`) that the
//! decoder enforces before any field is read. Unknown tags are NOT an
//! error at the decode layer; they degrade to an unsupported-type
//! placeholder so newer protocol extensions do not break older clients.

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::features::FeatureMask;
use crate::limits::{
    BALLOT_ID_LEN, BLOB_ID_LEN, BLOB_KEY_LEN, GROUP_HEADER_LEN, IDENTITY_LEN, MAX_GROUP_NAME_LEN,
    MAX_TEXT_LEN, MESSAGE_ID_LEN, NONCE_LEN,
};

/// Minimal JSON document (`{}` or `[]`) for JSON-carrying bodies.
const MIN_JSON_LEN: usize = 2;

/// Message type tag (first byte of the decrypted plaintext).
///
/// # Representation
///
/// Tags are a single byte on the wire; `#[repr(u8)]` pins the discriminants
/// to the protocol values.
///
/// # Security
///
/// `from_u8` is total and returns `None` for unknown values. Callers decode
/// unknown tags into a placeholder message instead of erroring, but they
/// must never guess at a body layout for a tag they do not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum MessageType {
    // One-to-one content (0x01-0x1F)
    /// UTF-8 text
    Text = 0x01,
    /// Image blob reference (box-encrypted blob)
    Image = 0x02,
    /// Geolocation with optional POI lines
    Location = 0x10,
    /// Video blob reference with thumbnail
    Video = 0x13,
    /// Audio blob reference
    Audio = 0x14,
    /// Ballot creation (id + JSON description)
    BallotCreate = 0x15,
    /// Ballot vote (creator + id + JSON choices)
    BallotVote = 0x16,
    /// File transfer (JSON descriptor)
    File = 0x17,
    /// Set own profile photo
    ContactSetPhoto = 0x18,
    /// Delete own profile photo
    ContactDeletePhoto = 0x19,
    /// Request the peer's profile photo
    ContactRequestPhoto = 0x1A,

    // Group variants (0x41-0x54)
    /// Group text
    GroupText = 0x41,
    /// Group location
    GroupLocation = 0x42,
    /// Group image (symmetric blob key)
    GroupImage = 0x43,
    /// Group video
    GroupVideo = 0x44,
    /// Group audio
    GroupAudio = 0x45,
    /// Group file
    GroupFile = 0x46,
    /// Create group / replace member list
    GroupCreate = 0x4A,
    /// Rename group
    GroupRename = 0x4B,
    /// Leave group
    GroupLeave = 0x4C,
    /// Group call start (opaque descriptor)
    GroupCallStart = 0x4F,
    /// Set group photo
    GroupSetPhoto = 0x50,
    /// Ask the creator for a group state sync
    GroupRequestSync = 0x51,
    /// Group ballot creation
    GroupBallotCreate = 0x52,
    /// Group ballot vote
    GroupBallotVote = 0x53,
    /// Delete group photo
    GroupDeletePhoto = 0x54,

    // Voip signaling (0x60-0x64)
    /// Call offer (JSON session description)
    VoipCallOffer = 0x60,
    /// Call answer
    VoipCallAnswer = 0x61,
    /// ICE candidates
    VoipIceCandidate = 0x62,
    /// Hang up
    VoipCallHangup = 0x63,
    /// Ringing notification
    VoipCallRinging = 0x64,

    // Receipts and message control (0x80-0x9F)
    /// Delivery receipt (status + message ids)
    DeliveryReceipt = 0x80,
    /// Group delivery receipt
    GroupDeliveryReceipt = 0x81,
    /// Typing on/off
    TypingIndicator = 0x90,
    /// Edit a previously sent message
    Edit = 0x91,
    /// Delete a previously sent message
    Delete = 0x92,
    /// Edit inside a group
    GroupEdit = 0x93,
    /// Delete inside a group
    GroupDelete = 0x94,

    // Forward secrecy (0xA0)
    /// Forward-security control/data envelope (opaque to this layer)
    ForwardSecurity = 0xA0,

    // Link maintenance (0xFC-0xFF)
    /// Empty keepalive message
    Empty = 0xFC,
    /// Authentication token
    AuthToken = 0xFF,
}

impl MessageType {
    /// Every defined tag, in ascending tag order.
    pub const ALL: [Self; 41] = [
        Self::Text,
        Self::Image,
        Self::Location,
        Self::Video,
        Self::Audio,
        Self::BallotCreate,
        Self::BallotVote,
        Self::File,
        Self::ContactSetPhoto,
        Self::ContactDeletePhoto,
        Self::ContactRequestPhoto,
        Self::GroupText,
        Self::GroupLocation,
        Self::GroupImage,
        Self::GroupVideo,
        Self::GroupAudio,
        Self::GroupFile,
        Self::GroupCreate,
        Self::GroupRename,
        Self::GroupLeave,
        Self::GroupCallStart,
        Self::GroupSetPhoto,
        Self::GroupRequestSync,
        Self::GroupBallotCreate,
        Self::GroupBallotVote,
        Self::GroupDeletePhoto,
        Self::VoipCallOffer,
        Self::VoipCallAnswer,
        Self::VoipIceCandidate,
        Self::VoipCallHangup,
        Self::VoipCallRinging,
        Self::DeliveryReceipt,
        Self::GroupDeliveryReceipt,
        Self::TypingIndicator,
        Self::Edit,
        Self::Delete,
        Self::GroupEdit,
        Self::GroupDelete,
        Self::ForwardSecurity,
        Self::Empty,
        Self::AuthToken,
    ];

    /// Convert to the raw tag byte.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Convert from the raw tag byte.
    ///
    /// Returns `None` for tags this protocol version does not define.
    /// Total over all 256 values; never panics.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Text),
            0x02 => Some(Self::Image),
            0x10 => Some(Self::Location),
            0x13 => Some(Self::Video),
            0x14 => Some(Self::Audio),
            0x15 => Some(Self::BallotCreate),
            0x16 => Some(Self::BallotVote),
            0x17 => Some(Self::File),
            0x18 => Some(Self::ContactSetPhoto),
            0x19 => Some(Self::ContactDeletePhoto),
            0x1A => Some(Self::ContactRequestPhoto),

            0x41 => Some(Self::GroupText),
            0x42 => Some(Self::GroupLocation),
            0x43 => Some(Self::GroupImage),
            0x44 => Some(Self::GroupVideo),
            0x45 => Some(Self::GroupAudio),
            0x46 => Some(Self::GroupFile),
            0x4A => Some(Self::GroupCreate),
            0x4B => Some(Self::GroupRename),
            0x4C => Some(Self::GroupLeave),
            0x4F => Some(Self::GroupCallStart),
            0x50 => Some(Self::GroupSetPhoto),
            0x51 => Some(Self::GroupRequestSync),
            0x52 => Some(Self::GroupBallotCreate),
            0x53 => Some(Self::GroupBallotVote),
            0x54 => Some(Self::GroupDeletePhoto),

            0x60 => Some(Self::VoipCallOffer),
            0x61 => Some(Self::VoipCallAnswer),
            0x62 => Some(Self::VoipIceCandidate),
            0x63 => Some(Self::VoipCallHangup),
            0x64 => Some(Self::VoipCallRinging),

            0x80 => Some(Self::DeliveryReceipt),
            0x81 => Some(Self::GroupDeliveryReceipt),
            0x90 => Some(Self::TypingIndicator),
            0x91 => Some(Self::Edit),
            0x92 => Some(Self::Delete),
            0x93 => Some(Self::GroupEdit),
            0x94 => Some(Self::GroupDelete),

            0xA0 => Some(Self::ForwardSecurity),
            0xFC => Some(Self::Empty),
            0xFF => Some(Self::AuthToken),

            _ => None,
        }
    }

    /// Whether this type carries the 16-byte group header.
    ///
    /// Covers the `0x41-0x54` range plus the group variants of receipts
    /// and edit/delete. The header (creator identity, then group id) is
    /// included in this type's body bounds and must parse before any
    /// type-specific field.
    #[must_use]
    pub const fn is_group(self) -> bool {
        matches!(
            self,
            Self::GroupText
                | Self::GroupLocation
                | Self::GroupImage
                | Self::GroupVideo
                | Self::GroupAudio
                | Self::GroupFile
                | Self::GroupCreate
                | Self::GroupRename
                | Self::GroupLeave
                | Self::GroupCallStart
                | Self::GroupSetPhoto
                | Self::GroupRequestSync
                | Self::GroupBallotCreate
                | Self::GroupBallotVote
                | Self::GroupDeletePhoto
                | Self::GroupDeliveryReceipt
                | Self::GroupEdit
                | Self::GroupDelete
        )
    }

    /// Minimum body length in bytes for this type.
    ///
    /// A body shorter than this is malformed, never a partial decode.
    /// Group types include the 16-byte group header.
    #[must_use]
    pub const fn min_body_len(self) -> usize {
        match self {
            Self::Text => 1,
            Self::Image => BLOB_ID_LEN + 4 + NONCE_LEN,
            Self::Location => 3,
            Self::Video => 2 + BLOB_ID_LEN + 4 + BLOB_ID_LEN + 4 + BLOB_KEY_LEN,
            Self::Audio => 2 + BLOB_ID_LEN + 4 + BLOB_KEY_LEN,
            Self::BallotCreate => BALLOT_ID_LEN + MIN_JSON_LEN,
            Self::BallotVote => IDENTITY_LEN + BALLOT_ID_LEN + MIN_JSON_LEN,
            Self::File => MIN_JSON_LEN,
            Self::ContactSetPhoto => BLOB_ID_LEN + 4 + BLOB_KEY_LEN,
            Self::ContactDeletePhoto | Self::ContactRequestPhoto => 0,

            Self::GroupText => GROUP_HEADER_LEN + 1,
            Self::GroupLocation => GROUP_HEADER_LEN + 3,
            Self::GroupImage | Self::GroupSetPhoto => {
                GROUP_HEADER_LEN + BLOB_ID_LEN + 4 + BLOB_KEY_LEN
            }
            Self::GroupVideo => {
                GROUP_HEADER_LEN + 2 + BLOB_ID_LEN + 4 + BLOB_ID_LEN + 4 + BLOB_KEY_LEN
            }
            Self::GroupAudio => GROUP_HEADER_LEN + 2 + BLOB_ID_LEN + 4 + BLOB_KEY_LEN,
            Self::GroupFile => GROUP_HEADER_LEN + MIN_JSON_LEN,
            Self::GroupCreate
            | Self::GroupRename
            | Self::GroupLeave
            | Self::GroupRequestSync
            | Self::GroupDeletePhoto => GROUP_HEADER_LEN,
            Self::GroupCallStart => GROUP_HEADER_LEN + 1,
            Self::GroupBallotCreate => GROUP_HEADER_LEN + BALLOT_ID_LEN + MIN_JSON_LEN,
            Self::GroupBallotVote => {
                GROUP_HEADER_LEN + IDENTITY_LEN + BALLOT_ID_LEN + MIN_JSON_LEN
            }

            Self::VoipCallOffer | Self::VoipCallAnswer | Self::VoipIceCandidate => MIN_JSON_LEN,
            Self::VoipCallHangup | Self::VoipCallRinging => 0,

            Self::DeliveryReceipt => 1 + MESSAGE_ID_LEN,
            Self::GroupDeliveryReceipt => GROUP_HEADER_LEN + 1 + MESSAGE_ID_LEN,
            Self::TypingIndicator => 1,
            Self::Edit => MESSAGE_ID_LEN + 1,
            Self::Delete => MESSAGE_ID_LEN,
            Self::GroupEdit => GROUP_HEADER_LEN + MESSAGE_ID_LEN + 1,
            Self::GroupDelete => GROUP_HEADER_LEN + MESSAGE_ID_LEN,

            Self::ForwardSecurity | Self::AuthToken => 1,
            Self::Empty => 0,
        }
    }

    /// Maximum body length in bytes, `None` if bounded only by the packet
    /// ceiling.
    ///
    /// Fixed-layout records have `min == max`; text-bearing records cap at
    /// the 7000-byte text ceiling plus their fixed prefix.
    #[must_use]
    pub const fn max_body_len(self) -> Option<usize> {
        match self {
            Self::Text => Some(MAX_TEXT_LEN),
            Self::GroupText => Some(GROUP_HEADER_LEN + MAX_TEXT_LEN),
            Self::Edit => Some(MESSAGE_ID_LEN + MAX_TEXT_LEN),
            Self::GroupEdit => Some(GROUP_HEADER_LEN + MESSAGE_ID_LEN + MAX_TEXT_LEN),
            Self::GroupRename => Some(GROUP_HEADER_LEN + MAX_GROUP_NAME_LEN),

            // Fixed-layout records: exactly the minimum.
            Self::Image
            | Self::Video
            | Self::Audio
            | Self::ContactSetPhoto
            | Self::ContactDeletePhoto
            | Self::ContactRequestPhoto
            | Self::GroupImage
            | Self::GroupVideo
            | Self::GroupAudio
            | Self::GroupLeave
            | Self::GroupSetPhoto
            | Self::GroupRequestSync
            | Self::GroupDeletePhoto
            | Self::TypingIndicator
            | Self::Delete
            | Self::GroupDelete
            | Self::Empty => Some(self.min_body_len()),

            Self::Location
            | Self::BallotCreate
            | Self::BallotVote
            | Self::File
            | Self::GroupLocation
            | Self::GroupFile
            | Self::GroupCreate
            | Self::GroupCallStart
            | Self::GroupBallotCreate
            | Self::GroupBallotVote
            | Self::VoipCallOffer
            | Self::VoipCallAnswer
            | Self::VoipIceCandidate
            | Self::VoipCallHangup
            | Self::VoipCallRinging
            | Self::DeliveryReceipt
            | Self::GroupDeliveryReceipt
            | Self::ForwardSecurity
            | Self::AuthToken => None,
        }
    }

    /// Feature-mask bits a recipient must advertise to receive this type.
    ///
    /// Senders consult the recipient's directory mask before using a
    /// capability-gated type; recipients decode regardless.
    #[must_use]
    pub const fn required_features(self) -> FeatureMask {
        match self {
            Self::Audio => FeatureMask::AUDIO_MESSAGE,
            Self::BallotCreate | Self::BallotVote => FeatureMask::BALLOT,
            Self::File => FeatureMask::FILE_TRANSFER,
            Self::VoipCallOffer
            | Self::VoipCallAnswer
            | Self::VoipIceCandidate
            | Self::VoipCallHangup
            | Self::VoipCallRinging => FeatureMask::VOIP,
            Self::Edit => FeatureMask::EDIT_MESSAGE,
            Self::Delete => FeatureMask::DELETE_MESSAGE,
            Self::ForwardSecurity => FeatureMask::FORWARD_SECURITY,

            Self::GroupAudio => FeatureMask::GROUP_CHAT.union(FeatureMask::AUDIO_MESSAGE),
            Self::GroupFile => FeatureMask::GROUP_CHAT.union(FeatureMask::FILE_TRANSFER),
            Self::GroupBallotCreate | Self::GroupBallotVote => {
                FeatureMask::GROUP_CHAT.union(FeatureMask::BALLOT)
            }
            Self::GroupCallStart => FeatureMask::GROUP_CHAT.union(FeatureMask::VOIP),
            Self::GroupEdit => FeatureMask::GROUP_CHAT.union(FeatureMask::EDIT_MESSAGE),
            Self::GroupDelete => FeatureMask::GROUP_CHAT.union(FeatureMask::DELETE_MESSAGE),
            Self::GroupText
            | Self::GroupLocation
            | Self::GroupImage
            | Self::GroupVideo
            | Self::GroupCreate
            | Self::GroupRename
            | Self::GroupLeave
            | Self::GroupSetPhoto
            | Self::GroupRequestSync
            | Self::GroupDeletePhoto
            | Self::GroupDeliveryReceipt => FeatureMask::GROUP_CHAT,

            Self::Text
            | Self::Image
            | Self::Location
            | Self::Video
            | Self::ContactSetPhoto
            | Self::ContactDeletePhoto
            | Self::ContactRequestPhoto
            | Self::DeliveryReceipt
            | Self::TypingIndicator
            | Self::Empty
            | Self::AuthToken => FeatureMask::empty(),
        }
    }
}
