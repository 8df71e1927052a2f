//! Message decoding.
//!
//! The decoder is a state-free dispatcher: the first plaintext byte selects
//! the body layout, the body length is validated against that type's fixed
//! bounds, and only then is the typed message constructed. A body outside
//! its bounds is always an error, never a partial decode, while an unknown
//! type tag degrades into [`MessageBody::Unsupported`] so newer protocol
//! extensions do not break older clients.

use bytes::Bytes;

use saltwire_crypto::{open_box, PublicKey, StaticSecret};
use saltwire_proto::{MessageEnvelope, MessageType};

use crate::error::DecodeError;
use crate::messages::MessageBody;
use crate::padding::unpad;

/// Decode an unpadded plaintext (`type byte || body`) into a typed message.
///
/// # Errors
///
/// - `DecodeError::EmptyMessage` if there is no type byte
/// - `DecodeError::BodyTooShort` / `BodyTooLong` if the body length is
///   outside the type's documented bounds
/// - `DecodeError::InvalidBody` if the length is in range but the content
///   does not parse
///
/// Unknown type tags are NOT an error; they yield the placeholder variant.
pub fn decode_message(plaintext: &[u8]) -> Result<MessageBody, DecodeError> {
    let Some((&tag, body)) = plaintext.split_first() else {
        return Err(DecodeError::EmptyMessage);
    };
    let Some(msg_type) = MessageType::from_u8(tag) else {
        return Ok(MessageBody::Unsupported { tag, body: Bytes::copy_from_slice(body) });
    };
    check_body_bounds(msg_type, body.len())?;
    MessageBody::read_body(msg_type, body)
}

/// Validate a body length against the type's bounds.
pub(crate) fn check_body_bounds(msg_type: MessageType, len: usize) -> Result<(), DecodeError> {
    let min = msg_type.min_body_len();
    if len < min {
        return Err(DecodeError::BodyTooShort { msg_type, min, actual: len });
    }
    if let Some(max) = msg_type.max_body_len() {
        if len > max {
            return Err(DecodeError::BodyTooLong { msg_type, max, actual: len });
        }
    }
    Ok(())
}

/// Open a boxed envelope and decode its plaintext in one step.
///
/// Composes box authentication, unpadding, and type dispatch. An
/// authentication failure is propagated untouched (as
/// `DecodeError::Decryption`) so callers can distinguish tampering from a
/// malformed layout.
///
/// # Errors
///
/// - `DecodeError::Decryption` if the box does not authenticate
/// - `DecodeError::InvalidPadding` if the plaintext padding is malformed
/// - any [`decode_message`] error for the unpadded plaintext
pub fn decode_from_boxed(
    envelope: &MessageEnvelope,
    recipient_secret: &StaticSecret,
    sender_public: &PublicKey,
) -> Result<MessageBody, DecodeError> {
    let plaintext = open_box(&envelope.box_data, &envelope.nonce, recipient_secret, sender_public)?;
    let unpadded = unpad(&plaintext)?;
    decode_message(unpadded)
}
