//! Container payloads exchanged with the relay.
//!
//! After login, every packet on the link is one container payload: a
//! 4-byte header (tag byte plus three reserved bytes) followed by the
//! tag-specific body. Bodies are raw binary records with little-endian
//! integers, not a self-describing encoding; the tag alone selects the
//! layout.
//!
//! Unlike message type tags, unknown payload tags are hard errors. The
//! relay link is version-negotiated at connect time, so an unrecognized
//! tag means a corrupt stream or a hostile peer, not a newer client.
//!
//! # Invariants
//!
//! Each payload variant maps to exactly one tag (enforced by match
//! exhaustiveness in `kind()`, `encode()` and `decode()`). Encoding a
//! payload and decoding the bytes must produce an equal value.

use bytes::{BufMut, Bytes};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::envelope::MessageEnvelope;
use crate::errors::{ProtocolError, Result};
use crate::ids::{Identity, MessageId};
use crate::limits::{IDENTITY_LEN, MAX_PKT_LEN, MESSAGE_ID_LEN, PAYLOAD_HEADER_LEN};

/// Ack record body length: identity followed by message id.
const ACK_RECORD_LEN: usize = IDENTITY_LEN + MESSAGE_ID_LEN;

/// Container payload tag (first byte of the payload header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PayloadKind {
    /// Client-initiated keepalive probe.
    EchoRequest = 0x00,
    /// Boxed message submitted for delivery.
    OutgoingMessage = 0x01,
    /// Boxed message delivered from the queue.
    IncomingMessage = 0x02,
    /// Ask the relay to resume delivering queued messages.
    UnblockIncomingMessages = 0x03,
    /// Register a push notification token.
    PushNotificationToken = 0x20,
    /// Register a voip push notification token.
    VoipPushNotificationToken = 0x24,
    /// Configure the connection idle timeout.
    SetConnectionIdleTimeout = 0x30,
    /// Reply to an echo request.
    EchoResponse = 0x80,
    /// Relay accepted an outgoing message.
    OutgoingMessageAck = 0x81,
    /// Client confirms receipt of an incoming message.
    IncomingMessageAck = 0x82,
    /// Queue fully drained after login.
    QueueSendComplete = 0xD0,
    /// Another device replaced this device's cookie.
    DeviceCookieChangeIndication = 0xD2,
    /// Acknowledge and clear a device cookie change.
    ClearDeviceCookieChangeIndication = 0xD3,
    /// Fatal relay error, connection will close.
    Error = 0xE0,
    /// Informational relay text for the user.
    Alert = 0xE1,
}

impl PayloadKind {
    /// Convert to the raw tag byte.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Convert from the raw tag byte.
    ///
    /// Returns `None` for tags this protocol version does not define.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::EchoRequest),
            0x01 => Some(Self::OutgoingMessage),
            0x02 => Some(Self::IncomingMessage),
            0x03 => Some(Self::UnblockIncomingMessages),
            0x20 => Some(Self::PushNotificationToken),
            0x24 => Some(Self::VoipPushNotificationToken),
            0x30 => Some(Self::SetConnectionIdleTimeout),
            0x80 => Some(Self::EchoResponse),
            0x81 => Some(Self::OutgoingMessageAck),
            0x82 => Some(Self::IncomingMessageAck),
            0xD0 => Some(Self::QueueSendComplete),
            0xD2 => Some(Self::DeviceCookieChangeIndication),
            0xD3 => Some(Self::ClearDeviceCookieChangeIndication),
            0xE0 => Some(Self::Error),
            0xE1 => Some(Self::Alert),
            _ => None,
        }
    }
}

/// Push token kind byte carried in token registration payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum PushTokenKind {
    /// No token; clears any previous registration.
    None = 0x00,
    /// Apple production push service.
    Apple = 0x01,
    /// Apple sandbox push service.
    AppleSandbox = 0x02,
    /// Apple production, multicast variant.
    AppleMulticast = 0x05,
    /// Apple sandbox, multicast variant.
    AppleSandboxMulticast = 0x06,
}

impl PushTokenKind {
    /// Convert to the raw kind byte.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Convert from the raw kind byte.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::None),
            0x01 => Some(Self::Apple),
            0x02 => Some(Self::AppleSandbox),
            0x05 => Some(Self::AppleMulticast),
            0x06 => Some(Self::AppleSandboxMulticast),
            _ => None,
        }
    }
}

/// A decoded container payload.
///
/// Direction notes per variant refer to the post-login link: "client"
/// sends, "relay" answers, or vice versa. The codec itself is
/// direction-agnostic; both sides use the same records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Keepalive probe (client to relay); body is echoed verbatim.
    EchoRequest(Bytes),
    /// Keepalive reply (relay to client) carrying the probe body.
    EchoResponse(Bytes),
    /// Boxed message for delivery (client to relay).
    OutgoingMessage(MessageEnvelope),
    /// Boxed message from the queue (relay to client).
    IncomingMessage(MessageEnvelope),
    /// Relay accepted an outgoing message addressed to `to`.
    OutgoingMessageAck {
        /// Recipient of the acknowledged message.
        to: Identity,
        /// Id of the acknowledged message.
        message_id: MessageId,
    },
    /// Client confirms receipt of a message from `from`; the relay
    /// deletes it from the queue.
    IncomingMessageAck {
        /// Sender of the acknowledged message.
        from: Identity,
        /// Id of the acknowledged message.
        message_id: MessageId,
    },
    /// Resume delivery of queued messages (client to relay).
    UnblockIncomingMessages,
    /// Push token registration (client to relay).
    PushNotificationToken {
        /// Push service the token belongs to.
        kind: PushTokenKind,
        /// Opaque token bytes; may be empty when clearing.
        token: Bytes,
    },
    /// Voip push token registration (client to relay).
    VoipPushNotificationToken {
        /// Push service the token belongs to.
        kind: PushTokenKind,
        /// Opaque token bytes; may be empty when clearing.
        token: Bytes,
    },
    /// Configure the relay-side idle timeout (client to relay).
    SetConnectionIdleTimeout {
        /// Timeout in seconds; the relay accepts 30 through 600.
        seconds: u16,
    },
    /// All queued messages delivered (relay to client).
    QueueSendComplete,
    /// Another device overwrote this device's cookie (relay to client).
    DeviceCookieChangeIndication,
    /// Acknowledge a device cookie change (client to relay).
    ClearDeviceCookieChangeIndication,
    /// Fatal relay error; the connection closes after this payload.
    Error {
        /// Whether the client may reconnect automatically.
        reconnect_allowed: bool,
        /// Human-readable error text.
        message: String,
    },
    /// Informational relay text shown to the user.
    Alert {
        /// Human-readable alert text.
        message: String,
    },
}

impl Payload {
    /// Tag corresponding to this payload.
    #[must_use]
    pub const fn kind(&self) -> PayloadKind {
        match self {
            Self::EchoRequest(_) => PayloadKind::EchoRequest,
            Self::EchoResponse(_) => PayloadKind::EchoResponse,
            Self::OutgoingMessage(_) => PayloadKind::OutgoingMessage,
            Self::IncomingMessage(_) => PayloadKind::IncomingMessage,
            Self::OutgoingMessageAck { .. } => PayloadKind::OutgoingMessageAck,
            Self::IncomingMessageAck { .. } => PayloadKind::IncomingMessageAck,
            Self::UnblockIncomingMessages => PayloadKind::UnblockIncomingMessages,
            Self::PushNotificationToken { .. } => PayloadKind::PushNotificationToken,
            Self::VoipPushNotificationToken { .. } => PayloadKind::VoipPushNotificationToken,
            Self::SetConnectionIdleTimeout { .. } => PayloadKind::SetConnectionIdleTimeout,
            Self::QueueSendComplete => PayloadKind::QueueSendComplete,
            Self::DeviceCookieChangeIndication => PayloadKind::DeviceCookieChangeIndication,
            Self::ClearDeviceCookieChangeIndication => {
                PayloadKind::ClearDeviceCookieChangeIndication
            },
            Self::Error { .. } => PayloadKind::Error,
            Self::Alert { .. } => PayloadKind::Alert,
        }
    }

    /// Serialize the payload, header included, into a buffer.
    ///
    /// Reserved header bytes are written as zero.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PacketTooLarge` if the packet would exceed the
    ///   8192-byte ceiling
    /// - envelope errors from [`MessageEnvelope::encode`] for message
    ///   payloads
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let size = self.encoded_len();
        if size > MAX_PKT_LEN {
            return Err(ProtocolError::PacketTooLarge { size, max: MAX_PKT_LEN });
        }

        dst.put_u8(self.kind().to_u8());
        dst.put_bytes(0, PAYLOAD_HEADER_LEN - 1);

        match self {
            Self::EchoRequest(data) | Self::EchoResponse(data) => dst.put_slice(data),
            Self::OutgoingMessage(envelope) | Self::IncomingMessage(envelope) => {
                envelope.encode(dst)?;
            },
            Self::OutgoingMessageAck { to: identity, message_id }
            | Self::IncomingMessageAck { from: identity, message_id } => {
                dst.put_slice(identity.as_bytes());
                dst.put_slice(message_id.as_bytes());
            },
            Self::PushNotificationToken { kind, token }
            | Self::VoipPushNotificationToken { kind, token } => {
                dst.put_u8(kind.to_u8());
                dst.put_slice(token);
            },
            Self::SetConnectionIdleTimeout { seconds } => dst.put_u16_le(*seconds),
            Self::Error { reconnect_allowed, message } => {
                dst.put_u8(u8::from(*reconnect_allowed));
                dst.put_slice(message.as_bytes());
            },
            Self::Alert { message } => dst.put_slice(message.as_bytes()),
            Self::UnblockIncomingMessages
            | Self::QueueSendComplete
            | Self::DeviceCookieChangeIndication
            | Self::ClearDeviceCookieChangeIndication => {},
        }
        Ok(())
    }

    /// Serialize the payload to a new byte vector.
    ///
    /// # Errors
    ///
    /// Same as [`Self::encode`].
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode(&mut out)?;
        Ok(out)
    }

    /// Parse a payload from a complete packet (header plus body).
    ///
    /// Reserved header bytes are ignored. Fixed-size record bodies
    /// tolerate trailing bytes for forward compatibility; the known
    /// prefix is authoritative.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PacketTooLarge` if the packet exceeds the
    ///   8192-byte ceiling
    /// - `ProtocolError::PayloadTooShort` if the header or a record body
    ///   is incomplete
    /// - `ProtocolError::UnknownPayloadKind` for tags outside the
    ///   protocol
    /// - `ProtocolError::InvalidPushTokenKind` for unrecognized token
    ///   kind bytes
    /// - envelope errors from [`MessageEnvelope::decode`] for message
    ///   payloads
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_PKT_LEN {
            return Err(ProtocolError::PacketTooLarge { size: bytes.len(), max: MAX_PKT_LEN });
        }
        if bytes.len() < PAYLOAD_HEADER_LEN {
            return Err(ProtocolError::PayloadTooShort {
                expected: PAYLOAD_HEADER_LEN,
                actual: bytes.len(),
            });
        }

        let tag = bytes[0];
        let kind = PayloadKind::from_u8(tag).ok_or(ProtocolError::UnknownPayloadKind(tag))?;
        let body = &bytes[PAYLOAD_HEADER_LEN..];

        let payload = match kind {
            PayloadKind::EchoRequest => Self::EchoRequest(Bytes::copy_from_slice(body)),
            PayloadKind::EchoResponse => Self::EchoResponse(Bytes::copy_from_slice(body)),
            PayloadKind::OutgoingMessage => Self::OutgoingMessage(MessageEnvelope::decode(body)?),
            PayloadKind::IncomingMessage => Self::IncomingMessage(MessageEnvelope::decode(body)?),
            PayloadKind::OutgoingMessageAck => {
                let (to, message_id) = decode_ack_record(body)?;
                Self::OutgoingMessageAck { to, message_id }
            },
            PayloadKind::IncomingMessageAck => {
                let (from, message_id) = decode_ack_record(body)?;
                Self::IncomingMessageAck { from, message_id }
            },
            PayloadKind::UnblockIncomingMessages => Self::UnblockIncomingMessages,
            PayloadKind::PushNotificationToken => {
                let (kind, token) = decode_push_token(body)?;
                Self::PushNotificationToken { kind, token }
            },
            PayloadKind::VoipPushNotificationToken => {
                let (kind, token) = decode_push_token(body)?;
                Self::VoipPushNotificationToken { kind, token }
            },
            PayloadKind::SetConnectionIdleTimeout => {
                if body.len() < 2 {
                    return Err(ProtocolError::PayloadTooShort {
                        expected: 2,
                        actual: body.len(),
                    });
                }
                Self::SetConnectionIdleTimeout {
                    seconds: u16::from_le_bytes([body[0], body[1]]),
                }
            },
            PayloadKind::QueueSendComplete => Self::QueueSendComplete,
            PayloadKind::DeviceCookieChangeIndication => Self::DeviceCookieChangeIndication,
            PayloadKind::ClearDeviceCookieChangeIndication => {
                Self::ClearDeviceCookieChangeIndication
            },
            PayloadKind::Error => {
                if body.is_empty() {
                    return Err(ProtocolError::PayloadTooShort { expected: 1, actual: 0 });
                }
                Self::Error {
                    reconnect_allowed: body[0] != 0,
                    message: String::from_utf8_lossy(&body[1..]).into_owned(),
                }
            },
            PayloadKind::Alert => {
                Self::Alert { message: String::from_utf8_lossy(body).into_owned() }
            },
        };

        Ok(payload)
    }

    /// Total encoded size in bytes, header included.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let body = match self {
            Self::EchoRequest(data) | Self::EchoResponse(data) => data.len(),
            Self::OutgoingMessage(envelope) | Self::IncomingMessage(envelope) => {
                envelope.encoded_len()
            },
            Self::OutgoingMessageAck { .. } | Self::IncomingMessageAck { .. } => ACK_RECORD_LEN,
            Self::PushNotificationToken { token, .. }
            | Self::VoipPushNotificationToken { token, .. } => 1 + token.len(),
            Self::SetConnectionIdleTimeout { .. } => 2,
            Self::Error { message, .. } => 1 + message.len(),
            Self::Alert { message } => message.len(),
            Self::UnblockIncomingMessages
            | Self::QueueSendComplete
            | Self::DeviceCookieChangeIndication
            | Self::ClearDeviceCookieChangeIndication => 0,
        };
        PAYLOAD_HEADER_LEN + body
    }
}

fn decode_ack_record(body: &[u8]) -> Result<(Identity, MessageId)> {
    if body.len() < ACK_RECORD_LEN {
        return Err(ProtocolError::PayloadTooShort {
            expected: ACK_RECORD_LEN,
            actual: body.len(),
        });
    }
    let mut identity = [0u8; IDENTITY_LEN];
    identity.copy_from_slice(&body[..IDENTITY_LEN]);
    let mut message_id = [0u8; MESSAGE_ID_LEN];
    message_id.copy_from_slice(&body[IDENTITY_LEN..ACK_RECORD_LEN]);
    Ok((Identity::from_bytes(identity), MessageId::from_bytes(message_id)))
}

fn decode_push_token(body: &[u8]) -> Result<(PushTokenKind, Bytes)> {
    if body.is_empty() {
        return Err(ProtocolError::PayloadTooShort { expected: 1, actual: 0 });
    }
    let kind = PushTokenKind::from_u8(body[0])
        .ok_or(ProtocolError::InvalidPushTokenKind(body[0]))?;
    Ok((kind, Bytes::copy_from_slice(&body[1..])))
}
