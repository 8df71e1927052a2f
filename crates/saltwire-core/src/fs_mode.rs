//! Forward-security mode resolution.
//!
//! Every decoded or sent message carries one of six protection modes
//! describing which Diffie-Hellman ratchet guarded it. The resolver is a
//! pure function over context the caller supplies: it reads ratchet state
//! and fan-out outcomes, never advances a session, and the per-contact
//! ratchet state machine stays with the session-management collaborator.
//!
//! The six modes split into two families that never mix:
//!
//! - `None` / `TwoDh` / `FourDh` describe a single decrypted link. `TwoDh`
//!   exists only one-to-one; group fan-out never negotiates it, so a group
//!   message claiming a two-step ratchet is rejected as a downgrade.
//! - The `OutgoingGroup*` modes are aggregates over a whole outgoing group
//!   fan-out and are produced only by [`ForwardSecurityMode::for_outgoing_group`].
//!   An incoming group message is always evaluated per sender link and gets
//!   `None` or `FourDh`, never an aggregate.

use crate::error::FsModeError;

/// Ratchet stage of the session a message was decrypted under.
///
/// Read from the session store by the caller; this crate never mutates
/// ratchet state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatchetStage {
    /// No forward-secrecy envelope wrapped the plaintext.
    None,
    /// Initial two-step exchange; the responder has not ratcheted yet.
    TwoDh,
    /// Fully established four-step ratchet.
    FourDh,
}

/// Whether a message travels one-to-one or inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationScope {
    /// Direct message between two identities.
    OneToOne,
    /// Group message (individually boxed per recipient).
    Group,
}

/// Per-recipient result of one group fan-out encryption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientOutcome {
    /// Sealed under an established four-step ratchet session.
    ForwardSecure,
    /// Sealed without forward secrecy.
    Plain,
    /// Sealing failed; this recipient received nothing at either level.
    Failed,
}

/// The protection mode attached to a decoded or sent message.
///
/// Discriminants are the stable storage/audit numbering; they never
/// change for a given protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ForwardSecurityMode {
    /// No forward secrecy protected this message.
    None = 0,
    /// Protected by the initial two-step ratchet (one-to-one only).
    TwoDh = 1,
    /// Protected by the established four-step ratchet.
    FourDh = 2,
    /// Outgoing group send: no recipient had an established session.
    OutgoingGroupNone = 3,
    /// Outgoing group send: some but not all recipients had one.
    OutgoingGroupPartial = 4,
    /// Outgoing group send: every reached recipient had one.
    OutgoingGroupFull = 5,
}

impl ForwardSecurityMode {
    /// Resolve the mode for a received message.
    ///
    /// One-to-one messages map the ratchet stage directly. Incoming group
    /// messages are evaluated per sender link and only ever see `None` or
    /// `FourDh`.
    ///
    /// # Errors
    ///
    /// `FsModeError::TwoDhGroupMessage` for a group message under a
    /// two-step ratchet; accepting it would silently misattribute the
    /// protection level.
    pub const fn for_incoming(
        scope: ConversationScope,
        stage: RatchetStage,
    ) -> Result<Self, FsModeError> {
        match (scope, stage) {
            (_, RatchetStage::None) => Ok(Self::None),
            (ConversationScope::OneToOne, RatchetStage::TwoDh) => Ok(Self::TwoDh),
            (_, RatchetStage::FourDh) => Ok(Self::FourDh),
            (ConversationScope::Group, RatchetStage::TwoDh) => {
                Err(FsModeError::TwoDhGroupMessage)
            }
        }
    }

    /// Aggregate per-recipient outcomes of a completed group fan-out.
    ///
    /// Must be called only after every encryption attempt has finished;
    /// aggregating mid-fan-out can freeze a stale partial value (which is
    /// why [`crate::outbound::GroupFanout`] computes it in `finish`).
    /// Failed recipients received nothing and are excluded from the
    /// aggregate. A fan-out that reached nobody is `OutgoingGroupNone`;
    /// the mode never overstates protection.
    #[must_use]
    pub fn for_outgoing_group(outcomes: &[RecipientOutcome]) -> Self {
        let mut delivered = 0usize;
        let mut secure = 0usize;
        for outcome in outcomes {
            match outcome {
                RecipientOutcome::ForwardSecure => {
                    delivered += 1;
                    secure += 1;
                }
                RecipientOutcome::Plain => delivered += 1,
                RecipientOutcome::Failed => {}
            }
        }
        if secure == 0 {
            Self::OutgoingGroupNone
        } else if secure == delivered {
            Self::OutgoingGroupFull
        } else {
            Self::OutgoingGroupPartial
        }
    }

    /// Stable numeric value for storage and audit records.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Self::to_u8`].
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::TwoDh),
            2 => Some(Self::FourDh),
            3 => Some(Self::OutgoingGroupNone),
            4 => Some(Self::OutgoingGroupPartial),
            5 => Some(Self::OutgoingGroupFull),
            _ => None,
        }
    }

    /// Whether this is one of the outgoing-group aggregate modes.
    #[must_use]
    pub const fn is_group_aggregate(self) -> bool {
        matches!(
            self,
            Self::OutgoingGroupNone | Self::OutgoingGroupPartial | Self::OutgoingGroupFull
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_to_one_maps_stage_directly() {
        let scope = ConversationScope::OneToOne;
        assert_eq!(
            ForwardSecurityMode::for_incoming(scope, RatchetStage::None),
            Ok(ForwardSecurityMode::None)
        );
        assert_eq!(
            ForwardSecurityMode::for_incoming(scope, RatchetStage::TwoDh),
            Ok(ForwardSecurityMode::TwoDh)
        );
        assert_eq!(
            ForwardSecurityMode::for_incoming(scope, RatchetStage::FourDh),
            Ok(ForwardSecurityMode::FourDh)
        );
    }

    #[test]
    fn incoming_group_allows_none_and_four_dh_only() {
        let scope = ConversationScope::Group;
        assert_eq!(
            ForwardSecurityMode::for_incoming(scope, RatchetStage::None),
            Ok(ForwardSecurityMode::None)
        );
        assert_eq!(
            ForwardSecurityMode::for_incoming(scope, RatchetStage::FourDh),
            Ok(ForwardSecurityMode::FourDh)
        );
        assert_eq!(
            ForwardSecurityMode::for_incoming(scope, RatchetStage::TwoDh),
            Err(FsModeError::TwoDhGroupMessage)
        );
    }

    #[test]
    fn fan_out_aggregation_matches_membership_fractions() {
        use RecipientOutcome::{ForwardSecure, Plain};

        assert_eq!(
            ForwardSecurityMode::for_outgoing_group(&[Plain, Plain, Plain]),
            ForwardSecurityMode::OutgoingGroupNone
        );
        assert_eq!(
            ForwardSecurityMode::for_outgoing_group(&[ForwardSecure, Plain, Plain]),
            ForwardSecurityMode::OutgoingGroupPartial
        );
        assert_eq!(
            ForwardSecurityMode::for_outgoing_group(&[ForwardSecure; 3]),
            ForwardSecurityMode::OutgoingGroupFull
        );
    }

    #[test]
    fn failed_recipients_are_excluded_from_the_aggregate() {
        use RecipientOutcome::{Failed, ForwardSecure, Plain};

        // The failed recipient got nothing; the two reached ones were both
        // forward-secure, so the send is full, not partial.
        assert_eq!(
            ForwardSecurityMode::for_outgoing_group(&[ForwardSecure, Failed, ForwardSecure]),
            ForwardSecurityMode::OutgoingGroupFull
        );
        assert_eq!(
            ForwardSecurityMode::for_outgoing_group(&[Plain, Failed]),
            ForwardSecurityMode::OutgoingGroupNone
        );
    }

    #[test]
    fn empty_fan_out_never_claims_coverage() {
        assert_eq!(
            ForwardSecurityMode::for_outgoing_group(&[]),
            ForwardSecurityMode::OutgoingGroupNone
        );
        assert_eq!(
            ForwardSecurityMode::for_outgoing_group(&[RecipientOutcome::Failed]),
            ForwardSecurityMode::OutgoingGroupNone
        );
    }

    #[test]
    fn numbering_is_stable() {
        for (value, mode) in [
            (0, ForwardSecurityMode::None),
            (1, ForwardSecurityMode::TwoDh),
            (2, ForwardSecurityMode::FourDh),
            (3, ForwardSecurityMode::OutgoingGroupNone),
            (4, ForwardSecurityMode::OutgoingGroupPartial),
            (5, ForwardSecurityMode::OutgoingGroupFull),
        ] {
            assert_eq!(mode.to_u8(), value);
            assert_eq!(ForwardSecurityMode::from_u8(value), Some(mode));
        }
        assert_eq!(ForwardSecurityMode::from_u8(6), None);
    }

    #[test]
    fn aggregate_predicate() {
        assert!(ForwardSecurityMode::OutgoingGroupPartial.is_group_aggregate());
        assert!(!ForwardSecurityMode::FourDh.is_group_aggregate());
    }
}
