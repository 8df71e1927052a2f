//! Inbound message pipeline.
//!
//! Composes the whole receive path for one envelope: address check, sender
//! key lookup, box authentication, replay deduplication, unpadding, and
//! type dispatch, then attaches the forward-security mode. Each failure is
//! scoped to the one message being processed; a dropped message never
//! poisons the pipeline for the next one.
//!
//! Ordering inside the pipeline is load-bearing:
//!
//! - The sender key lookup happens before anything touches the dedup set,
//!   so a message from a not-yet-added contact can still decode when the
//!   relay redelivers it after the contact exists.
//! - The nonce is recorded only after the box authenticates. An attacker
//!   replaying garbage under a victim's nonce must not be able to burn
//!   that nonce for the real message.
//! - The dedup check precedes dispatch, so a replayed envelope is never
//!   decrypted into a typed message a second time.

use tracing::{debug, warn};

use saltwire_crypto::{hashed_nonce, open_box};
use saltwire_proto::{MessageEnvelope, MessageType};

use crate::decoder::decode_message;
use crate::error::ProcessError;
use crate::fs_mode::{ConversationScope, ForwardSecurityMode, RatchetStage};
use crate::messages::Message;
use crate::padding::unpad;
use crate::stores::{IdentityProvider, NonceRegistry};

/// Process one received envelope into a typed [`Message`].
///
/// `ratchet` is the current forward-secrecy stage of the session with the
/// sender, read from the session store by the caller; the pipeline only
/// uses it to resolve the message's protection mode.
///
/// # Errors
///
/// - `ProcessError::NoIdentity` if the client has no provisioned identity
/// - `ProcessError::WrongRecipient` if the envelope is addressed elsewhere
/// - `ProcessError::UnknownSender` if no public key is known for the sender
/// - `ProcessError::ReplayDetected` if this nonce was already processed;
///   the caller should still acknowledge the envelope
///   ([`ProcessError::should_acknowledge`])
/// - `ProcessError::Ratchet` if a group message claims a two-step ratchet
/// - `ProcessError::Decode` for authentication, padding, and body-layout
///   failures
pub fn process_incoming<I, N>(
    envelope: &MessageEnvelope,
    identity: &I,
    registry: &mut N,
    ratchet: RatchetStage,
) -> Result<Message, ProcessError>
where
    I: IdentityProvider,
    N: NonceRegistry,
{
    let Some(own) = identity.own_identity() else {
        return Err(ProcessError::NoIdentity);
    };

    let from = envelope.header.from_identity();
    let to = envelope.header.to_identity();
    let message_id = envelope.header.message_id();

    if to != own {
        warn!(%from, %to, %message_id, "envelope not addressed to this client, dropping");
        return Err(ProcessError::WrongRecipient { to });
    }

    let Some(sender_public) = identity.peer_public_key(from) else {
        warn!(%from, %message_id, "no public key for sender, dropping");
        return Err(ProcessError::UnknownSender(from));
    };

    let plaintext = open_box(
        &envelope.box_data,
        &envelope.nonce,
        identity.own_secret(),
        &sender_public,
    )
    .map_err(|e| {
        warn!(%from, %message_id, "box rejected, dropping");
        ProcessError::Decode(e.into())
    })?;

    let Some(nonce_hash) = hashed_nonce(own.as_bytes(), &envelope.nonce) else {
        // own_identity was checked above; an identity is never empty.
        return Err(ProcessError::NoIdentity);
    };
    if !registry.check_and_record(nonce_hash) {
        warn!(%from, %message_id, "replayed envelope, not processing again");
        return Err(ProcessError::ReplayDetected { from, message_id });
    }

    let body = decode_message(unpad(&plaintext)?)?;

    let scope = if body.message_type().is_some_and(MessageType::is_group) {
        ConversationScope::Group
    } else {
        ConversationScope::OneToOne
    };
    let fs_mode = ForwardSecurityMode::for_incoming(scope, ratchet)?;

    debug!(%from, %message_id, mode = fs_mode.to_u8(), "message accepted");

    Ok(Message {
        from,
        to,
        message_id,
        date: envelope.header.date(),
        flags: envelope.header.flags(),
        push_from_name: envelope.header.push_from_name(),
        body,
        fs_mode,
    })
}

#[cfg(test)]
mod tests {
    use saltwire_crypto::{NONCE_SIZE, PublicKey, StaticSecret, seal_box};
    use saltwire_proto::{EnvelopeHeader, Identity, MessageFlags, MessageId};

    use crate::error::{DecodeError, FsModeError};
    use crate::messages::MessageBody;
    use crate::padding::pad;
    use crate::stores::{MemoryNonceRegistry, StaticIdentityProvider};

    use super::*;

    const SENDER_SECRET: [u8; 32] = [0x11; 32];
    const RECEIVER_SECRET: [u8; 32] = [0x22; 32];

    fn receiver() -> StaticIdentityProvider {
        let mut provider = StaticIdentityProvider::new(
            Identity::from_ascii("RECEIVER").unwrap(),
            StaticSecret::from(RECEIVER_SECRET),
        );
        provider.add_peer(
            Identity::from_ascii("SENDER01").unwrap(),
            PublicKey::from(&StaticSecret::from(SENDER_SECRET)),
        );
        provider
    }

    fn boxed(body: &MessageBody, nonce: [u8; NONCE_SIZE]) -> MessageEnvelope {
        let mut plaintext = body.encode();
        pad(&mut plaintext);
        let sealed = seal_box(
            &plaintext,
            &nonce,
            &StaticSecret::from(SENDER_SECRET),
            &PublicKey::from(&StaticSecret::from(RECEIVER_SECRET)),
        );

        let mut header = EnvelopeHeader::new(
            Identity::from_ascii("SENDER01").unwrap(),
            Identity::from_ascii("RECEIVER").unwrap(),
            MessageId::from_bytes([0x0A; 8]),
        );
        header.set_date(1_700_000_000);
        header.set_flags(body.default_flags());
        header.set_push_from_name("sender");
        MessageEnvelope::new(header, None, nonce, sealed.into()).unwrap()
    }

    #[test]
    fn accepts_a_fresh_message() {
        let body = MessageBody::Text { text: "hi".to_owned() };
        let envelope = boxed(&body, [0x01; NONCE_SIZE]);
        let mut registry = MemoryNonceRegistry::new();

        let message =
            process_incoming(&envelope, &receiver(), &mut registry, RatchetStage::FourDh)
                .unwrap();
        assert_eq!(message.from, Identity::from_ascii("SENDER01").unwrap());
        assert_eq!(message.body, body);
        assert_eq!(message.fs_mode, ForwardSecurityMode::FourDh);
        assert_eq!(message.push_from_name.as_deref(), Some("sender"));
        assert_eq!(message.flags, MessageFlags::SEND_PUSH);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn second_delivery_of_the_same_nonce_is_a_replay() {
        let body = MessageBody::Text { text: "hi".to_owned() };
        let envelope = boxed(&body, [0x01; NONCE_SIZE]);
        let provider = receiver();
        let mut registry = MemoryNonceRegistry::new();

        process_incoming(&envelope, &provider, &mut registry, RatchetStage::None).unwrap();
        let err = process_incoming(&envelope, &provider, &mut registry, RatchetStage::None)
            .unwrap_err();
        assert_eq!(
            err,
            ProcessError::ReplayDetected {
                from: Identity::from_ascii("SENDER01").unwrap(),
                message_id: MessageId::from_bytes([0x0A; 8]),
            }
        );
        assert!(err.should_acknowledge());
    }

    #[test]
    fn no_identity_refuses_everything() {
        let envelope = boxed(&MessageBody::Empty, [0x02; NONCE_SIZE]);
        let provider = StaticIdentityProvider::unregistered(StaticSecret::from(RECEIVER_SECRET));
        let mut registry = MemoryNonceRegistry::new();

        let err = process_incoming(&envelope, &provider, &mut registry, RatchetStage::None)
            .unwrap_err();
        assert_eq!(err, ProcessError::NoIdentity);
        assert!(registry.is_empty());
    }

    #[test]
    fn wrong_recipient_is_dropped() {
        let envelope = boxed(&MessageBody::Empty, [0x03; NONCE_SIZE]);
        let provider = StaticIdentityProvider::new(
            Identity::from_ascii("SOMEONE1").unwrap(),
            StaticSecret::from(RECEIVER_SECRET),
        );
        let mut registry = MemoryNonceRegistry::new();

        let err = process_incoming(&envelope, &provider, &mut registry, RatchetStage::None)
            .unwrap_err();
        assert_eq!(
            err,
            ProcessError::WrongRecipient { to: Identity::from_ascii("RECEIVER").unwrap() }
        );
    }

    #[test]
    fn unknown_sender_does_not_record_the_nonce() {
        let envelope = boxed(&MessageBody::Empty, [0x04; NONCE_SIZE]);
        let provider = StaticIdentityProvider::new(
            Identity::from_ascii("RECEIVER").unwrap(),
            StaticSecret::from(RECEIVER_SECRET),
        );
        let mut registry = MemoryNonceRegistry::new();

        let err = process_incoming(&envelope, &provider, &mut registry, RatchetStage::None)
            .unwrap_err();
        assert_eq!(
            err,
            ProcessError::UnknownSender(Identity::from_ascii("SENDER01").unwrap())
        );
        // The same envelope must still decode after the contact is added.
        assert!(registry.is_empty());
        let message =
            process_incoming(&envelope, &receiver(), &mut registry, RatchetStage::None).unwrap();
        assert_eq!(message.body, MessageBody::Empty);
    }

    #[test]
    fn failed_authentication_does_not_record_the_nonce() {
        let envelope = boxed(&MessageBody::Empty, [0x05; NONCE_SIZE]);
        let mut tampered = envelope.box_data.to_vec();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        let tampered_envelope =
            MessageEnvelope::new(envelope.header, None, envelope.nonce, tampered.into()).unwrap();

        let provider = receiver();
        let mut registry = MemoryNonceRegistry::new();
        let err =
            process_incoming(&tampered_envelope, &provider, &mut registry, RatchetStage::None)
                .unwrap_err();
        assert!(matches!(err, ProcessError::Decode(DecodeError::Decryption(_))));
        assert!(registry.is_empty());

        // The genuine envelope still goes through under the same nonce.
        process_incoming(&envelope, &provider, &mut registry, RatchetStage::None).unwrap();
    }

    #[test]
    fn group_message_under_two_dh_is_rejected() {
        let body = MessageBody::GroupLeave {
            group: crate::messages::group::GroupHeader {
                creator: Identity::from_ascii("CREATOR1").unwrap(),
                group_id: saltwire_proto::GroupId::from_bytes([0x33; 8]),
            },
        };
        let envelope = boxed(&body, [0x06; NONCE_SIZE]);
        let mut registry = MemoryNonceRegistry::new();

        let err = process_incoming(&envelope, &receiver(), &mut registry, RatchetStage::TwoDh)
            .unwrap_err();
        assert_eq!(err, ProcessError::Ratchet(FsModeError::TwoDhGroupMessage));
    }

    #[test]
    fn incoming_group_message_carries_a_per_link_mode() {
        let body = MessageBody::GroupText {
            group: crate::messages::group::GroupHeader {
                creator: Identity::from_ascii("CREATOR1").unwrap(),
                group_id: saltwire_proto::GroupId::from_bytes([0x33; 8]),
            },
            text: "hello".to_owned(),
        };
        let envelope = boxed(&body, [0x07; NONCE_SIZE]);
        let mut registry = MemoryNonceRegistry::new();

        let message =
            process_incoming(&envelope, &receiver(), &mut registry, RatchetStage::FourDh)
                .unwrap();
        // Per sender link, never a group aggregate.
        assert_eq!(message.fs_mode, ForwardSecurityMode::FourDh);
    }

    #[test]
    fn unsupported_type_still_flows_through_the_pipeline() {
        let body = MessageBody::Unsupported {
            tag: 0x99,
            body: bytes::Bytes::from_static(&[0x01, 0x02]),
        };
        let envelope = boxed(&body, [0x08; NONCE_SIZE]);
        let mut registry = MemoryNonceRegistry::new();

        let message =
            process_incoming(&envelope, &receiver(), &mut registry, RatchetStage::None).unwrap();
        assert_eq!(message.body, body);
        assert_eq!(message.fs_mode, ForwardSecurityMode::None);
    }
}
