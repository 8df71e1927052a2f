//! Typed message bodies.
//!
//! The decrypted plaintext of every boxed message is `type byte || body ||
//! padding`. After unpadding and bounds validation the body decodes into one
//! [`MessageBody`] variant; unknown type tags decode into
//! [`MessageBody::Unsupported`] so newer protocol extensions degrade into a
//! placeholder instead of failing the pipeline.
//!
//! Body layouts are hand-packed little-endian records with no alignment
//! padding between fields. Each layout is defined exactly once, read and
//! written by the same module, so decode and encode cannot drift apart.
//!
//! # Invariants
//!
//! - Tag Uniqueness: every supported variant maps to exactly one
//!   [`MessageType`]; `message_type()` and `tag()` agree for all of them.
//! - Bounds Before Construction: `read_body` is only called after the
//!   type's length bounds have been checked, so fixed-layout reads cannot
//!   run out of input. Variable-tail layouts still validate their own
//!   structure (list lengths, UTF-8, line formats).

pub mod ballot;
pub mod group;
pub mod location;
pub mod media;
pub mod receipt;

use bytes::Bytes;

use saltwire_proto::limits::IDENTITY_LEN;
use saltwire_proto::{BallotId, BlobId, GroupId, Identity, MessageFlags, MessageId, MessageType};

use crate::error::DecodeError;
use crate::fs_mode::ForwardSecurityMode;

use ballot::{BallotCreate, BallotVote};
use group::GroupHeader;
use location::LocationMessage;
use media::{AudioMessage, BoxedBlob, KeyedBlob, VideoMessage};
use receipt::Receipt;

/// Cursor over a message body with bounds-checked field reads.
///
/// Bounds against the type's minimum are validated before any field is
/// read, so the truncation error here only fires for layouts whose
/// variable part is internally inconsistent.
pub(crate) struct BodyReader<'a> {
    msg_type: MessageType,
    body: &'a [u8],
    pos: usize,
}

impl<'a> BodyReader<'a> {
    pub(crate) const fn new(msg_type: MessageType, body: &'a [u8]) -> Self {
        Self { msg_type, body, pos: 0 }
    }

    /// Build an `InvalidBody` error scoped to the type being decoded.
    pub(crate) fn invalid(&self, reason: &'static str) -> DecodeError {
        DecodeError::InvalidBody { msg_type: self.msg_type, reason }
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos + n;
        if end > self.body.len() {
            return Err(self.invalid("body ends mid-field"));
        }
        let slice = &self.body[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let slice = self.take(N)?;
        let Ok(array) = slice.try_into() else {
            unreachable!("take returned exactly {N} bytes");
        };
        Ok(array)
    }

    pub(crate) fn take_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub(crate) fn take_u16_le(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn take_u32_le(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn take_identity(&mut self) -> Result<Identity, DecodeError> {
        Ok(Identity::from_bytes(self.take_array()?))
    }

    pub(crate) fn take_message_id(&mut self) -> Result<MessageId, DecodeError> {
        Ok(MessageId::from_bytes(self.take_array()?))
    }

    pub(crate) fn take_group_id(&mut self) -> Result<GroupId, DecodeError> {
        Ok(GroupId::from_bytes(self.take_array()?))
    }

    pub(crate) fn take_ballot_id(&mut self) -> Result<BallotId, DecodeError> {
        Ok(BallotId::from_bytes(self.take_array()?))
    }

    pub(crate) fn take_blob_id(&mut self) -> Result<BlobId, DecodeError> {
        Ok(BlobId::from_bytes(self.take_array()?))
    }

    /// Everything not yet consumed, leaving the reader empty.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let slice = &self.body[self.pos..];
        self.pos = self.body.len();
        slice
    }

    /// The remaining bytes as strict UTF-8.
    pub(crate) fn rest_utf8(&mut self) -> Result<&'a str, DecodeError> {
        let invalid = self.invalid("invalid utf-8");
        std::str::from_utf8(self.rest()).map_err(|_| invalid)
    }
}

/// A decoded message body, one variant per supported type tag.
///
/// One-to-one content wraps the shared record structs from the submodules;
/// group variants additionally carry the [`GroupHeader`] parsed before the
/// type-specific fields. [`MessageBody::Unsupported`] preserves the raw tag
/// and body so a placeholder can be stored and the original bytes are not
/// lost.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageBody {
    // One-to-one content
    /// UTF-8 text
    Text {
        /// Message text, 1 to 7000 bytes.
        text: String,
    },
    /// Image blob reference (blob sealed with the conversation box keys)
    Image(media::BoxedBlob),
    /// Geolocation with optional point-of-interest lines
    Location(location::LocationMessage),
    /// Video blob reference with thumbnail
    Video(media::VideoMessage),
    /// Audio blob reference
    Audio(media::AudioMessage),
    /// Ballot creation
    BallotCreate(ballot::BallotCreate),
    /// Ballot vote
    BallotVote(ballot::BallotVote),
    /// File transfer descriptor
    File {
        /// JSON file descriptor, opaque at this layer.
        descriptor: String,
    },
    /// Set own profile photo
    ContactSetPhoto(media::KeyedBlob),
    /// Delete own profile photo
    ContactDeletePhoto,
    /// Request the peer's profile photo
    ContactRequestPhoto,

    // Group variants
    /// Group text
    GroupText {
        /// Group this message belongs to.
        group: GroupHeader,
        /// Message text, 1 to 7000 bytes.
        text: String,
    },
    /// Group location
    GroupLocation {
        /// Group this message belongs to.
        group: GroupHeader,
        /// Location fields.
        location: location::LocationMessage,
    },
    /// Group image (symmetric blob key)
    GroupImage {
        /// Group this message belongs to.
        group: GroupHeader,
        /// Blob reference with embedded key.
        image: media::KeyedBlob,
    },
    /// Group video
    GroupVideo {
        /// Group this message belongs to.
        group: GroupHeader,
        /// Video and thumbnail blob references.
        video: media::VideoMessage,
    },
    /// Group audio
    GroupAudio {
        /// Group this message belongs to.
        group: GroupHeader,
        /// Audio blob reference.
        audio: media::AudioMessage,
    },
    /// Group file
    GroupFile {
        /// Group this message belongs to.
        group: GroupHeader,
        /// JSON file descriptor, opaque at this layer.
        descriptor: String,
    },
    /// Create a group or replace its member list
    GroupCreate {
        /// Group being created or updated.
        group: GroupHeader,
        /// Full member list; an empty list dissolves the group for the
        /// receiver.
        members: Vec<Identity>,
    },
    /// Rename a group
    GroupRename {
        /// Group being renamed.
        group: GroupHeader,
        /// New name; empty clears it. At most 256 bytes.
        name: String,
    },
    /// Leave a group
    GroupLeave {
        /// Group being left.
        group: GroupHeader,
    },
    /// Group call start (opaque call descriptor)
    GroupCallStart {
        /// Group the call belongs to.
        group: GroupHeader,
        /// Call descriptor, opaque at this layer.
        descriptor: Bytes,
    },
    /// Set the group photo
    GroupSetPhoto {
        /// Group whose photo is set.
        group: GroupHeader,
        /// Blob reference with embedded key.
        photo: media::KeyedBlob,
    },
    /// Ask the creator for a group state sync
    GroupRequestSync {
        /// Group to sync.
        group: GroupHeader,
    },
    /// Group ballot creation
    GroupBallotCreate {
        /// Group this ballot belongs to.
        group: GroupHeader,
        /// Ballot id and description.
        ballot: ballot::BallotCreate,
    },
    /// Group ballot vote
    GroupBallotVote {
        /// Group this ballot belongs to.
        group: GroupHeader,
        /// Vote fields.
        vote: ballot::BallotVote,
    },
    /// Delete the group photo
    GroupDeletePhoto {
        /// Group whose photo is deleted.
        group: GroupHeader,
    },

    // Call signaling
    /// Call offer (JSON session description)
    VoipCallOffer {
        /// JSON call offer, opaque at this layer.
        payload: String,
    },
    /// Call answer
    VoipCallAnswer {
        /// JSON call answer, opaque at this layer.
        payload: String,
    },
    /// ICE candidates
    VoipIceCandidate {
        /// JSON candidate list, opaque at this layer.
        payload: String,
    },
    /// Hang up
    VoipCallHangup {
        /// Optional JSON payload; absent for bare hangups.
        payload: Option<String>,
    },
    /// Ringing notification
    VoipCallRinging {
        /// Optional JSON payload; absent for bare ringing.
        payload: Option<String>,
    },

    // Receipts and message control
    /// Delivery receipt for one or more messages
    DeliveryReceipt(receipt::Receipt),
    /// Delivery receipt inside a group
    GroupDeliveryReceipt {
        /// Group the acknowledged messages belong to.
        group: GroupHeader,
        /// Receipt status and message ids.
        receipt: receipt::Receipt,
    },
    /// Typing on/off
    TypingIndicator {
        /// True while the peer is typing.
        typing: bool,
    },
    /// Edit a previously sent message
    Edit {
        /// Message being edited.
        message_id: MessageId,
        /// Replacement text, 1 to 7000 bytes.
        text: String,
    },
    /// Delete a previously sent message
    Delete {
        /// Message being deleted.
        message_id: MessageId,
    },
    /// Edit inside a group
    GroupEdit {
        /// Group the edited message belongs to.
        group: GroupHeader,
        /// Message being edited.
        message_id: MessageId,
        /// Replacement text, 1 to 7000 bytes.
        text: String,
    },
    /// Delete inside a group
    GroupDelete {
        /// Group the deleted message belongs to.
        group: GroupHeader,
        /// Message being deleted.
        message_id: MessageId,
    },

    // Link maintenance and forward secrecy
    /// Forward-security control/data envelope, opaque to this layer
    ForwardSecurity {
        /// Raw forward-security envelope bytes.
        data: Bytes,
    },
    /// Empty keepalive message
    Empty,
    /// Authentication token
    AuthToken {
        /// Raw token bytes.
        token: Bytes,
    },

    /// Placeholder for a type tag this protocol version does not define.
    ///
    /// Kept intact so the message can be stored as an "unsupported
    /// message" system entry and re-encoded byte-identically.
    Unsupported {
        /// The unrecognized type tag.
        tag: u8,
        /// Raw body bytes following the tag.
        body: Bytes,
    },
}

impl MessageBody {
    /// The message type, `None` for the unsupported placeholder.
    #[must_use]
    pub const fn message_type(&self) -> Option<MessageType> {
        match self {
            Self::Text { .. } => Some(MessageType::Text),
            Self::Image(_) => Some(MessageType::Image),
            Self::Location(_) => Some(MessageType::Location),
            Self::Video(_) => Some(MessageType::Video),
            Self::Audio(_) => Some(MessageType::Audio),
            Self::BallotCreate(_) => Some(MessageType::BallotCreate),
            Self::BallotVote(_) => Some(MessageType::BallotVote),
            Self::File { .. } => Some(MessageType::File),
            Self::ContactSetPhoto(_) => Some(MessageType::ContactSetPhoto),
            Self::ContactDeletePhoto => Some(MessageType::ContactDeletePhoto),
            Self::ContactRequestPhoto => Some(MessageType::ContactRequestPhoto),
            Self::GroupText { .. } => Some(MessageType::GroupText),
            Self::GroupLocation { .. } => Some(MessageType::GroupLocation),
            Self::GroupImage { .. } => Some(MessageType::GroupImage),
            Self::GroupVideo { .. } => Some(MessageType::GroupVideo),
            Self::GroupAudio { .. } => Some(MessageType::GroupAudio),
            Self::GroupFile { .. } => Some(MessageType::GroupFile),
            Self::GroupCreate { .. } => Some(MessageType::GroupCreate),
            Self::GroupRename { .. } => Some(MessageType::GroupRename),
            Self::GroupLeave { .. } => Some(MessageType::GroupLeave),
            Self::GroupCallStart { .. } => Some(MessageType::GroupCallStart),
            Self::GroupSetPhoto { .. } => Some(MessageType::GroupSetPhoto),
            Self::GroupRequestSync { .. } => Some(MessageType::GroupRequestSync),
            Self::GroupBallotCreate { .. } => Some(MessageType::GroupBallotCreate),
            Self::GroupBallotVote { .. } => Some(MessageType::GroupBallotVote),
            Self::GroupDeletePhoto { .. } => Some(MessageType::GroupDeletePhoto),
            Self::VoipCallOffer { .. } => Some(MessageType::VoipCallOffer),
            Self::VoipCallAnswer { .. } => Some(MessageType::VoipCallAnswer),
            Self::VoipIceCandidate { .. } => Some(MessageType::VoipIceCandidate),
            Self::VoipCallHangup { .. } => Some(MessageType::VoipCallHangup),
            Self::VoipCallRinging { .. } => Some(MessageType::VoipCallRinging),
            Self::DeliveryReceipt(_) => Some(MessageType::DeliveryReceipt),
            Self::GroupDeliveryReceipt { .. } => Some(MessageType::GroupDeliveryReceipt),
            Self::TypingIndicator { .. } => Some(MessageType::TypingIndicator),
            Self::Edit { .. } => Some(MessageType::Edit),
            Self::Delete { .. } => Some(MessageType::Delete),
            Self::GroupEdit { .. } => Some(MessageType::GroupEdit),
            Self::GroupDelete { .. } => Some(MessageType::GroupDelete),
            Self::ForwardSecurity { .. } => Some(MessageType::ForwardSecurity),
            Self::Empty => Some(MessageType::Empty),
            Self::AuthToken { .. } => Some(MessageType::AuthToken),
            Self::Unsupported { .. } => None,
        }
    }

    /// The wire tag byte, including the raw tag of unsupported bodies.
    #[must_use]
    pub fn tag(&self) -> u8 {
        if let Self::Unsupported { tag, .. } = self {
            *tag
        } else {
            match self.message_type() {
                Some(msg_type) => msg_type.to_u8(),
                None => unreachable!("every supported variant maps to a type"),
            }
        }
    }

    /// The group header, for group variants only.
    #[must_use]
    pub const fn group_header(&self) -> Option<&GroupHeader> {
        match self {
            Self::GroupText { group, .. }
            | Self::GroupLocation { group, .. }
            | Self::GroupImage { group, .. }
            | Self::GroupVideo { group, .. }
            | Self::GroupAudio { group, .. }
            | Self::GroupFile { group, .. }
            | Self::GroupCreate { group, .. }
            | Self::GroupRename { group, .. }
            | Self::GroupLeave { group }
            | Self::GroupCallStart { group, .. }
            | Self::GroupSetPhoto { group, .. }
            | Self::GroupRequestSync { group }
            | Self::GroupBallotCreate { group, .. }
            | Self::GroupBallotVote { group, .. }
            | Self::GroupDeletePhoto { group }
            | Self::GroupDeliveryReceipt { group, .. }
            | Self::GroupEdit { group, .. }
            | Self::GroupDelete { group, .. } => Some(group),
            _ => None,
        }
    }

    /// Envelope flags a relay expects for this kind of message.
    ///
    /// User-visible content asks for a push, call signaling additionally
    /// for immediate delivery, typing and keepalives for neither queueing
    /// nor acknowledgement. Every group variant carries the group bit.
    #[must_use]
    pub fn default_flags(&self) -> MessageFlags {
        let base = match self {
            Self::Text { .. }
            | Self::Image(_)
            | Self::Location(_)
            | Self::Video(_)
            | Self::Audio(_)
            | Self::BallotCreate(_)
            | Self::BallotVote(_)
            | Self::File { .. }
            | Self::GroupText { .. }
            | Self::GroupLocation { .. }
            | Self::GroupImage { .. }
            | Self::GroupVideo { .. }
            | Self::GroupAudio { .. }
            | Self::GroupFile { .. }
            | Self::GroupCallStart { .. }
            | Self::GroupBallotCreate { .. }
            | Self::GroupBallotVote { .. }
            | Self::Edit { .. }
            | Self::Delete { .. }
            | Self::GroupEdit { .. }
            | Self::GroupDelete { .. } => MessageFlags::SEND_PUSH,

            Self::VoipCallOffer { .. }
            | Self::VoipCallAnswer { .. }
            | Self::VoipIceCandidate { .. }
            | Self::VoipCallHangup { .. }
            | Self::VoipCallRinging { .. } => {
                MessageFlags::SEND_PUSH | MessageFlags::IMMEDIATE_DELIVERY
            }

            Self::TypingIndicator { .. } | Self::Empty => {
                MessageFlags::DONT_QUEUE | MessageFlags::DONT_ACK
            }

            Self::ContactSetPhoto(_)
            | Self::ContactDeletePhoto
            | Self::ContactRequestPhoto
            | Self::GroupCreate { .. }
            | Self::GroupRename { .. }
            | Self::GroupLeave { .. }
            | Self::GroupSetPhoto { .. }
            | Self::GroupRequestSync { .. }
            | Self::GroupDeletePhoto { .. }
            | Self::DeliveryReceipt(_)
            | Self::GroupDeliveryReceipt { .. }
            | Self::ForwardSecurity { .. }
            | Self::AuthToken { .. }
            | Self::Unsupported { .. } => MessageFlags::empty(),
        };
        match self.message_type() {
            Some(msg_type) if msg_type.is_group() => base | MessageFlags::GROUP,
            _ => base,
        }
    }

    /// Serialize to the plaintext layout `type byte || body`.
    ///
    /// The result is what gets padded and sealed; it is also the exact
    /// input `decode_message` accepts back.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(self.tag());
        self.write_body(&mut out);
        out
    }

    /// Decode a body whose length bounds have already been validated.
    pub(crate) fn read_body(msg_type: MessageType, body: &[u8]) -> Result<Self, DecodeError> {
        let mut r = BodyReader::new(msg_type, body);
        let message = match msg_type {
            MessageType::Text => Self::Text { text: r.rest_utf8()?.to_owned() },
            MessageType::Image => Self::Image(BoxedBlob::read(&mut r)?),
            MessageType::Location => Self::Location(LocationMessage::read(&mut r)?),
            MessageType::Video => Self::Video(VideoMessage::read(&mut r)?),
            MessageType::Audio => Self::Audio(AudioMessage::read(&mut r)?),
            MessageType::BallotCreate => Self::BallotCreate(BallotCreate::read(&mut r)?),
            MessageType::BallotVote => Self::BallotVote(BallotVote::read(&mut r)?),
            MessageType::File => Self::File { descriptor: r.rest_utf8()?.to_owned() },
            MessageType::ContactSetPhoto => Self::ContactSetPhoto(KeyedBlob::read(&mut r)?),
            MessageType::ContactDeletePhoto => Self::ContactDeletePhoto,
            MessageType::ContactRequestPhoto => Self::ContactRequestPhoto,

            MessageType::GroupText => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupText { group, text: r.rest_utf8()?.to_owned() }
            }
            MessageType::GroupLocation => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupLocation { group, location: LocationMessage::read(&mut r)? }
            }
            MessageType::GroupImage => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupImage { group, image: KeyedBlob::read(&mut r)? }
            }
            MessageType::GroupVideo => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupVideo { group, video: VideoMessage::read(&mut r)? }
            }
            MessageType::GroupAudio => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupAudio { group, audio: AudioMessage::read(&mut r)? }
            }
            MessageType::GroupFile => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupFile { group, descriptor: r.rest_utf8()?.to_owned() }
            }
            MessageType::GroupCreate => {
                let group = GroupHeader::read(&mut r)?;
                let members = read_identity_list(&mut r)?;
                Self::GroupCreate { group, members }
            }
            MessageType::GroupRename => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupRename { group, name: r.rest_utf8()?.to_owned() }
            }
            MessageType::GroupLeave => Self::GroupLeave { group: GroupHeader::read(&mut r)? },
            MessageType::GroupCallStart => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupCallStart { group, descriptor: Bytes::copy_from_slice(r.rest()) }
            }
            MessageType::GroupSetPhoto => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupSetPhoto { group, photo: KeyedBlob::read(&mut r)? }
            }
            MessageType::GroupRequestSync => {
                Self::GroupRequestSync { group: GroupHeader::read(&mut r)? }
            }
            MessageType::GroupBallotCreate => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupBallotCreate { group, ballot: BallotCreate::read(&mut r)? }
            }
            MessageType::GroupBallotVote => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupBallotVote { group, vote: BallotVote::read(&mut r)? }
            }
            MessageType::GroupDeletePhoto => {
                Self::GroupDeletePhoto { group: GroupHeader::read(&mut r)? }
            }

            MessageType::VoipCallOffer => Self::VoipCallOffer { payload: r.rest_utf8()?.to_owned() },
            MessageType::VoipCallAnswer => {
                Self::VoipCallAnswer { payload: r.rest_utf8()?.to_owned() }
            }
            MessageType::VoipIceCandidate => {
                Self::VoipIceCandidate { payload: r.rest_utf8()?.to_owned() }
            }
            MessageType::VoipCallHangup => Self::VoipCallHangup { payload: optional_utf8(&mut r)? },
            MessageType::VoipCallRinging => {
                Self::VoipCallRinging { payload: optional_utf8(&mut r)? }
            }

            MessageType::DeliveryReceipt => Self::DeliveryReceipt(Receipt::read(&mut r)?),
            MessageType::GroupDeliveryReceipt => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupDeliveryReceipt { group, receipt: Receipt::read(&mut r)? }
            }
            MessageType::TypingIndicator => Self::TypingIndicator { typing: r.take_u8()? != 0 },
            MessageType::Edit => Self::Edit {
                message_id: r.take_message_id()?,
                text: r.rest_utf8()?.to_owned(),
            },
            MessageType::Delete => Self::Delete { message_id: r.take_message_id()? },
            MessageType::GroupEdit => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupEdit {
                    group,
                    message_id: r.take_message_id()?,
                    text: r.rest_utf8()?.to_owned(),
                }
            }
            MessageType::GroupDelete => {
                let group = GroupHeader::read(&mut r)?;
                Self::GroupDelete { group, message_id: r.take_message_id()? }
            }

            MessageType::ForwardSecurity => {
                Self::ForwardSecurity { data: Bytes::copy_from_slice(r.rest()) }
            }
            MessageType::Empty => Self::Empty,
            MessageType::AuthToken => Self::AuthToken { token: Bytes::copy_from_slice(r.rest()) },
        };
        Ok(message)
    }

    /// Write the body bytes (everything after the type tag).
    pub(crate) fn write_body(&self, out: &mut Vec<u8>) {
        match self {
            Self::Text { text } => out.extend_from_slice(text.as_bytes()),
            Self::Image(image) => image.write(out),
            Self::Location(location) => location.write(out),
            Self::Video(video) => video.write(out),
            Self::Audio(audio) => audio.write(out),
            Self::BallotCreate(ballot) => ballot.write(out),
            Self::BallotVote(vote) => vote.write(out),
            Self::File { descriptor } => out.extend_from_slice(descriptor.as_bytes()),
            Self::ContactSetPhoto(photo) => photo.write(out),
            Self::ContactDeletePhoto | Self::ContactRequestPhoto | Self::Empty => {}

            Self::GroupText { group, text } => {
                group.write(out);
                out.extend_from_slice(text.as_bytes());
            }
            Self::GroupLocation { group, location } => {
                group.write(out);
                location.write(out);
            }
            Self::GroupImage { group, image } => {
                group.write(out);
                image.write(out);
            }
            Self::GroupVideo { group, video } => {
                group.write(out);
                video.write(out);
            }
            Self::GroupAudio { group, audio } => {
                group.write(out);
                audio.write(out);
            }
            Self::GroupFile { group, descriptor } => {
                group.write(out);
                out.extend_from_slice(descriptor.as_bytes());
            }
            Self::GroupCreate { group, members } => {
                group.write(out);
                for member in members {
                    out.extend_from_slice(member.as_bytes());
                }
            }
            Self::GroupRename { group, name } => {
                group.write(out);
                out.extend_from_slice(name.as_bytes());
            }
            Self::GroupLeave { group } | Self::GroupRequestSync { group }
            | Self::GroupDeletePhoto { group } => group.write(out),
            Self::GroupCallStart { group, descriptor } => {
                group.write(out);
                out.extend_from_slice(descriptor);
            }
            Self::GroupSetPhoto { group, photo } => {
                group.write(out);
                photo.write(out);
            }
            Self::GroupBallotCreate { group, ballot } => {
                group.write(out);
                ballot.write(out);
            }
            Self::GroupBallotVote { group, vote } => {
                group.write(out);
                vote.write(out);
            }

            Self::VoipCallOffer { payload }
            | Self::VoipCallAnswer { payload }
            | Self::VoipIceCandidate { payload } => out.extend_from_slice(payload.as_bytes()),
            Self::VoipCallHangup { payload } | Self::VoipCallRinging { payload } => {
                if let Some(payload) = payload {
                    out.extend_from_slice(payload.as_bytes());
                }
            }

            Self::DeliveryReceipt(receipt) => receipt.write(out),
            Self::GroupDeliveryReceipt { group, receipt } => {
                group.write(out);
                receipt.write(out);
            }
            Self::TypingIndicator { typing } => out.push(u8::from(*typing)),
            Self::Edit { message_id, text } => {
                out.extend_from_slice(message_id.as_bytes());
                out.extend_from_slice(text.as_bytes());
            }
            Self::Delete { message_id } => out.extend_from_slice(message_id.as_bytes()),
            Self::GroupEdit { group, message_id, text } => {
                group.write(out);
                out.extend_from_slice(message_id.as_bytes());
                out.extend_from_slice(text.as_bytes());
            }
            Self::GroupDelete { group, message_id } => {
                group.write(out);
                out.extend_from_slice(message_id.as_bytes());
            }

            Self::ForwardSecurity { data } => out.extend_from_slice(data),
            Self::AuthToken { token } => out.extend_from_slice(token),
            Self::Unsupported { body, .. } => out.extend_from_slice(body),
        }
    }
}

/// A fully decoded, authenticated message.
///
/// Built only by the inbound pipeline from an opened, deduplicated,
/// dispatched envelope; treated as immutable from then on. Carries the
/// cleartext envelope metadata next to the typed body and the protection
/// mode the message was received under, which downstream storage keeps
/// for display and audit.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Sender identity from the envelope header.
    pub from: Identity,
    /// Recipient identity from the envelope header (the local client).
    pub to: Identity,
    /// Sender-scoped random message id.
    pub message_id: MessageId,
    /// Submission time as Unix seconds.
    pub date: u32,
    /// Relay delivery flags the envelope carried.
    pub flags: MessageFlags,
    /// Best-effort sender display name for push previews.
    pub push_from_name: Option<String>,
    /// Typed message content.
    pub body: MessageBody,
    /// Protection mode the message was received under.
    pub fs_mode: ForwardSecurityMode,
}

/// Empty body maps to `None`; anything else must be valid UTF-8.
fn optional_utf8(r: &mut BodyReader<'_>) -> Result<Option<String>, DecodeError> {
    let rest = r.rest_utf8()?;
    Ok(if rest.is_empty() { None } else { Some(rest.to_owned()) })
}

/// Read the remaining bytes as a list of 8-byte identities.
fn read_identity_list(r: &mut BodyReader<'_>) -> Result<Vec<Identity>, DecodeError> {
    let invalid = r.invalid("member list not a multiple of 8");
    let rest = r.rest();
    if rest.len() % IDENTITY_LEN != 0 {
        return Err(invalid);
    }
    Ok(rest
        .chunks_exact(IDENTITY_LEN)
        .map(|chunk| {
            let Ok(bytes) = chunk.try_into() else {
                unreachable!("chunks_exact yields 8-byte chunks");
            };
            Identity::from_bytes(bytes)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(s: &str) -> Identity {
        Identity::from_ascii(s).unwrap()
    }

    fn sample_group() -> GroupHeader {
        GroupHeader { creator: identity("CREATOR1"), group_id: GroupId::from_bytes([0x42; 8]) }
    }

    fn round_trip(body: &MessageBody) -> MessageBody {
        let encoded = body.encode();
        assert_eq!(encoded[0], body.tag());
        let msg_type = MessageType::from_u8(encoded[0]).unwrap();
        MessageBody::read_body(msg_type, &encoded[1..]).unwrap()
    }

    #[test]
    fn text_round_trip() {
        let body = MessageBody::Text { text: "hello there".to_owned() };
        assert_eq!(round_trip(&body), body);
    }

    #[test]
    fn group_text_round_trip() {
        let body = MessageBody::GroupText { group: sample_group(), text: "späti?".to_owned() };
        let encoded = body.encode();
        // Group header sits between the tag and the text.
        assert_eq!(&encoded[1..9], b"CREATOR1");
        assert_eq!(&encoded[9..17], &[0x42; 8]);
        assert_eq!(round_trip(&body), body);
    }

    #[test]
    fn group_create_round_trip() {
        let body = MessageBody::GroupCreate {
            group: sample_group(),
            members: vec![identity("MEMBER01"), identity("MEMBER02")],
        };
        assert_eq!(round_trip(&body), body);
    }

    #[test]
    fn group_create_rejects_ragged_member_list() {
        let mut body = sample_group_bytes();
        body.extend_from_slice(b"MEMB"); // 4 stray bytes
        let err = MessageBody::read_body(MessageType::GroupCreate, &body).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidBody {
                msg_type: MessageType::GroupCreate,
                reason: "member list not a multiple of 8",
            }
        );
    }

    fn sample_group_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        sample_group().write(&mut out);
        out
    }

    #[test]
    fn typing_indicator_round_trip() {
        for typing in [true, false] {
            let body = MessageBody::TypingIndicator { typing };
            assert_eq!(round_trip(&body), body);
        }
    }

    #[test]
    fn typing_indicator_any_nonzero_is_typing() {
        let body = MessageBody::read_body(MessageType::TypingIndicator, &[0x7F]).unwrap();
        assert_eq!(body, MessageBody::TypingIndicator { typing: true });
    }

    #[test]
    fn voip_hangup_with_and_without_payload() {
        let bare = MessageBody::VoipCallHangup { payload: None };
        assert_eq!(round_trip(&bare), bare);

        let with_payload = MessageBody::VoipCallHangup { payload: Some("{}".to_owned()) };
        assert_eq!(round_trip(&with_payload), with_payload);
    }

    #[test]
    fn edit_and_delete_round_trip() {
        let edit = MessageBody::Edit {
            message_id: MessageId::from_bytes([9; 8]),
            text: "fixed typo".to_owned(),
        };
        assert_eq!(round_trip(&edit), edit);

        let delete = MessageBody::GroupDelete {
            group: sample_group(),
            message_id: MessageId::from_bytes([9; 8]),
        };
        assert_eq!(round_trip(&delete), delete);
    }

    #[test]
    fn text_rejects_invalid_utf8() {
        let err = MessageBody::read_body(MessageType::Text, &[0xFF, 0xFE]).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidBody { msg_type: MessageType::Text, reason: "invalid utf-8" }
        );
    }

    #[test]
    fn unsupported_preserves_raw_bytes() {
        let body = MessageBody::Unsupported {
            tag: 0x99,
            body: Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF]),
        };
        assert_eq!(body.tag(), 0x99);
        assert_eq!(body.message_type(), None);
        assert_eq!(body.encode(), vec![0x99, 0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn group_header_accessor() {
        let group = sample_group();
        let grouped = MessageBody::GroupLeave { group };
        assert_eq!(grouped.group_header(), Some(&group));

        let direct = MessageBody::Text { text: "x".to_owned() };
        assert_eq!(direct.group_header(), None);
    }

    #[test]
    fn tag_matches_message_type_for_all_samples() {
        let samples = [
            MessageBody::Text { text: "a".to_owned() },
            MessageBody::Empty,
            MessageBody::ContactRequestPhoto,
            MessageBody::TypingIndicator { typing: true },
            MessageBody::GroupRequestSync { group: sample_group() },
            MessageBody::Delete { message_id: MessageId::from_bytes([1; 8]) },
        ];
        for body in samples {
            let msg_type = body.message_type().unwrap();
            assert_eq!(body.tag(), msg_type.to_u8());
        }
    }

    #[test]
    fn content_flags_ask_for_push() {
        let text = MessageBody::Text { text: "a".to_owned() };
        assert_eq!(text.default_flags(), MessageFlags::SEND_PUSH);

        let group_text = MessageBody::GroupText { group: sample_group(), text: "a".to_owned() };
        assert_eq!(group_text.default_flags(), MessageFlags::SEND_PUSH | MessageFlags::GROUP);
    }

    #[test]
    fn typing_flags_skip_queue_and_ack() {
        let typing = MessageBody::TypingIndicator { typing: true };
        assert_eq!(typing.default_flags(), MessageFlags::DONT_QUEUE | MessageFlags::DONT_ACK);
    }

    #[test]
    fn call_signaling_flags_ask_for_immediate_delivery() {
        let offer = MessageBody::VoipCallOffer { payload: "{}".to_owned() };
        assert!(offer.default_flags().contains(MessageFlags::IMMEDIATE_DELIVERY));
    }

    #[test]
    fn group_control_flags_carry_only_the_group_bit() {
        let leave = MessageBody::GroupLeave { group: sample_group() };
        assert_eq!(leave.default_flags(), MessageFlags::GROUP);
    }

    #[test]
    fn receipt_flags_are_empty() {
        let receipt = MessageBody::DeliveryReceipt(Receipt {
            status: receipt::ReceiptStatus::Read,
            message_ids: vec![MessageId::from_bytes([3; 8])],
        });
        assert_eq!(receipt.default_flags(), MessageFlags::empty());
    }
}
