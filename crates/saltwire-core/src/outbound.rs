//! Outbound message assembly.
//!
//! The send path reverses the inbound pipeline: validate the typed body
//! against its own bounds, encode, pad, seal, and wrap the box in an
//! envelope carrying the type's default delivery flags. Group sends box
//! the same plaintext once per member; [`GroupFanout`] collects the
//! per-recipient results and reduces them to the aggregate
//! forward-security mode only after the whole fan-out is done.

use saltwire_crypto::{PublicKey, StaticSecret, seal_box};
use saltwire_proto::limits::NONCE_LEN;
use saltwire_proto::{EnvelopeHeader, Identity, MessageEnvelope, MessageId};

use crate::decoder::check_body_bounds;
use crate::error::OutboundError;
use crate::fs_mode::{ForwardSecurityMode, RecipientOutcome};
use crate::messages::MessageBody;
use crate::padding::pad;

/// Addressing and delivery metadata for one outgoing envelope.
///
/// The message id is random and the nonce unique per key pair; both come
/// from the caller so assembly stays deterministic and testable.
#[derive(Debug, Clone, Copy)]
pub struct SendContext<'a> {
    /// Local sender identity.
    pub from: Identity,
    /// Recipient identity.
    pub to: Identity,
    /// Random message id, sender/receiver-scoped.
    pub message_id: MessageId,
    /// Submission time as Unix seconds.
    pub date: u32,
    /// Sender display name for push previews, if any.
    pub push_from_name: Option<&'a str>,
}

/// Encode, pad, and seal a typed body into a boxed envelope.
///
/// The envelope carries the body's default delivery flags
/// ([`MessageBody::default_flags`]); callers can adjust them on the
/// returned header before serializing.
///
/// # Errors
///
/// - `OutboundError::Body` if the body violates its own type's bounds;
///   a malformed message is refused locally instead of being sent
/// - `OutboundError::Envelope` if the sealed record would exceed the
///   packet ceiling
pub fn encode_to_boxed(
    body: &MessageBody,
    ctx: &SendContext<'_>,
    nonce: [u8; NONCE_LEN],
    sender_secret: &StaticSecret,
    recipient_public: &PublicKey,
) -> Result<MessageEnvelope, OutboundError> {
    let mut plaintext = body.encode();
    if let Some(msg_type) = body.message_type() {
        check_body_bounds(msg_type, plaintext.len() - 1)?;
    }
    pad(&mut plaintext);
    let sealed = seal_box(&plaintext, &nonce, sender_secret, recipient_public);

    let mut header = EnvelopeHeader::new(ctx.from, ctx.to, ctx.message_id);
    header.set_date(ctx.date);
    header.set_flags(body.default_flags());
    if let Some(name) = ctx.push_from_name {
        header.set_push_from_name(name);
    }

    Ok(MessageEnvelope::new(header, None, nonce, sealed.into())?)
}

/// Everything a completed group fan-out produced.
#[derive(Debug)]
pub struct FanoutResult {
    /// Sealed envelopes per reached recipient, in fan-out order.
    pub envelopes: Vec<(Identity, MessageEnvelope)>,
    /// Recipients whose seal failed; they received nothing.
    pub failed: Vec<Identity>,
    /// Aggregate protection mode over the reached membership.
    pub mode: ForwardSecurityMode,
}

/// Collector for a group send's per-recipient encryption results.
///
/// The aggregate mode is computed only in the consuming [`finish`], after
/// every recipient has been attempted; nothing here can observe a stale
/// mid-fan-out value.
///
/// [`finish`]: GroupFanout::finish
#[derive(Debug, Default)]
pub struct GroupFanout {
    envelopes: Vec<(Identity, MessageEnvelope)>,
    failed: Vec<Identity>,
    outcomes: Vec<RecipientOutcome>,
}

impl GroupFanout {
    /// Empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully sealed envelope for one recipient.
    ///
    /// `forward_secure` states whether this recipient's envelope went out
    /// under an established four-step ratchet session.
    pub fn record_sealed(
        &mut self,
        recipient: Identity,
        envelope: MessageEnvelope,
        forward_secure: bool,
    ) {
        self.envelopes.push((recipient, envelope));
        self.outcomes.push(if forward_secure {
            RecipientOutcome::ForwardSecure
        } else {
            RecipientOutcome::Plain
        });
    }

    /// Record a recipient whose seal failed.
    pub fn record_failed(&mut self, recipient: Identity) {
        self.failed.push(recipient);
        self.outcomes.push(RecipientOutcome::Failed);
    }

    /// Number of recipients attempted so far.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Close the fan-out and compute the aggregate mode.
    pub fn finish(self) -> FanoutResult {
        let mode = ForwardSecurityMode::for_outgoing_group(&self.outcomes);
        FanoutResult { envelopes: self.envelopes, failed: self.failed, mode }
    }
}

#[cfg(test)]
mod tests {
    use saltwire_proto::limits::{MAX_TEXT_LEN, MIN_PADDED_LEN};
    use saltwire_proto::{MessageFlags, MessageType};

    use crate::decoder::decode_from_boxed;
    use crate::error::DecodeError;

    use super::*;

    fn ctx<'a>(to: Identity) -> SendContext<'a> {
        SendContext {
            from: Identity::from_ascii("SENDER01").unwrap(),
            to,
            message_id: MessageId::from_bytes([0x0B; 8]),
            date: 1_700_000_000,
            push_from_name: Some("sender"),
        }
    }

    fn recipient() -> (StaticSecret, PublicKey) {
        let secret = StaticSecret::from([0x22; 32]);
        let public = PublicKey::from(&secret);
        (secret, public)
    }

    #[test]
    fn sealed_envelope_opens_back_to_the_same_body() {
        let sender_secret = StaticSecret::from([0x11; 32]);
        let (recipient_secret, recipient_public) = recipient();
        let to = Identity::from_ascii("RECEIVER").unwrap();

        let body = MessageBody::Text { text: "round trip".to_owned() };
        let envelope =
            encode_to_boxed(&body, &ctx(to), [0x09; NONCE_LEN], &sender_secret, &recipient_public)
                .unwrap();

        assert_eq!(envelope.header.to_identity(), to);
        assert_eq!(envelope.header.flags(), MessageFlags::SEND_PUSH);
        assert_eq!(envelope.header.push_from_name().as_deref(), Some("sender"));

        let sender_public = PublicKey::from(&sender_secret);
        let decoded = decode_from_boxed(&envelope, &recipient_secret, &sender_public).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn short_plaintext_is_padded_to_the_floor() {
        let sender_secret = StaticSecret::from([0x11; 32]);
        let (_, recipient_public) = recipient();
        let to = Identity::from_ascii("RECEIVER").unwrap();

        let envelope = encode_to_boxed(
            &MessageBody::Empty,
            &ctx(to),
            [0x0A; NONCE_LEN],
            &sender_secret,
            &recipient_public,
        )
        .unwrap();
        // Padded plaintext floor plus the Poly1305 tag.
        assert_eq!(envelope.box_data.len(), MIN_PADDED_LEN + saltwire_crypto::BOX_OVERHEAD);
    }

    #[test]
    fn oversized_body_is_refused_locally() {
        let sender_secret = StaticSecret::from([0x11; 32]);
        let (_, recipient_public) = recipient();
        let to = Identity::from_ascii("RECEIVER").unwrap();

        let body = MessageBody::Text { text: "a".repeat(MAX_TEXT_LEN + 1) };
        let err = encode_to_boxed(
            &body,
            &ctx(to),
            [0x0B; NONCE_LEN],
            &sender_secret,
            &recipient_public,
        )
        .unwrap_err();
        assert_eq!(
            err,
            OutboundError::Body(DecodeError::BodyTooLong {
                msg_type: MessageType::Text,
                max: MAX_TEXT_LEN,
                actual: MAX_TEXT_LEN + 1,
            })
        );
    }

    fn member(n: u8) -> Identity {
        Identity::from_bytes([b'M', b'E', b'M', b'B', b'E', b'R', b'0', b'0' + n])
    }

    fn dummy_envelope(to: Identity) -> MessageEnvelope {
        let sender_secret = StaticSecret::from([0x11; 32]);
        let (_, recipient_public) = recipient();
        encode_to_boxed(
            &MessageBody::Empty,
            &ctx(to),
            [0x0C; NONCE_LEN],
            &sender_secret,
            &recipient_public,
        )
        .unwrap()
    }

    #[test]
    fn fan_out_one_of_three_is_partial() {
        let mut fanout = GroupFanout::new();
        fanout.record_sealed(member(1), dummy_envelope(member(1)), true);
        fanout.record_sealed(member(2), dummy_envelope(member(2)), false);
        fanout.record_sealed(member(3), dummy_envelope(member(3)), false);

        let result = fanout.finish();
        assert_eq!(result.mode, ForwardSecurityMode::OutgoingGroupPartial);
        assert_eq!(result.envelopes.len(), 3);
        assert!(result.failed.is_empty());
    }

    #[test]
    fn fan_out_zero_of_three_is_none_and_three_of_three_is_full() {
        let mut none = GroupFanout::new();
        let mut full = GroupFanout::new();
        for n in 1..=3 {
            none.record_sealed(member(n), dummy_envelope(member(n)), false);
            full.record_sealed(member(n), dummy_envelope(member(n)), true);
        }
        assert_eq!(none.finish().mode, ForwardSecurityMode::OutgoingGroupNone);
        assert_eq!(full.finish().mode, ForwardSecurityMode::OutgoingGroupFull);
    }

    #[test]
    fn fan_out_failures_are_reported_but_not_aggregated() {
        let mut fanout = GroupFanout::new();
        fanout.record_sealed(member(1), dummy_envelope(member(1)), true);
        fanout.record_failed(member(2));
        fanout.record_sealed(member(3), dummy_envelope(member(3)), true);
        assert_eq!(fanout.attempted(), 3);

        let result = fanout.finish();
        // Both reached recipients were forward-secure; the failure does
        // not drag the aggregate down to partial.
        assert_eq!(result.mode, ForwardSecurityMode::OutgoingGroupFull);
        assert_eq!(result.failed, vec![member(2)]);
        assert_eq!(result.envelopes.len(), 2);
    }

    #[test]
    fn empty_fan_out_claims_no_protection() {
        assert_eq!(GroupFanout::new().finish().mode, ForwardSecurityMode::OutgoingGroupNone);
    }
}
