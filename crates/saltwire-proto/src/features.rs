//! Feature mask advertised by a contact's client.
//!
//! Peers publish a feature mask through the directory describing which
//! message types their client understands. Senders consult it before using
//! a capability-gated type (see
//! [`MessageType::required_features`](crate::MessageType::required_features));
//! recipients never reject on it.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Advertised client capabilities (64 bits)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FeatureMask: u64 {
        /// Can receive audio messages
        const AUDIO_MESSAGE = 0x01;

        /// Can participate in group chats
        const GROUP_CHAT = 0x02;

        /// Can receive ballots (polls)
        const BALLOT = 0x04;

        /// Can receive file messages
        const FILE_TRANSFER = 0x08;

        /// Can receive voip call signaling
        const VOIP = 0x10;

        /// Supports video calls
        const VOIP_VIDEO = 0x20;

        /// Supports forward-secrecy sessions
        const FORWARD_SECURITY = 0x40;

        /// Can apply message edits
        const EDIT_MESSAGE = 0x100;

        /// Can apply message deletions
        const DELETE_MESSAGE = 0x200;
    }
}

impl FeatureMask {
    /// Create a mask from the raw directory value, preserving unknown bits.
    #[must_use]
    pub const fn from_bits_raw(bits: u64) -> Self {
        Self::from_bits_retain(bits)
    }

    /// Raw directory value.
    #[must_use]
    pub const fn to_bits_raw(self) -> u64 {
        self.bits()
    }

    /// Whether this mask advertises every feature in `required`.
    #[must_use]
    pub const fn supports(self, required: Self) -> bool {
        self.contains(required)
    }
}

impl Default for FeatureMask {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_requires_all_bits() {
        let mask = FeatureMask::GROUP_CHAT | FeatureMask::BALLOT;
        assert!(mask.supports(FeatureMask::GROUP_CHAT));
        assert!(mask.supports(FeatureMask::GROUP_CHAT | FeatureMask::BALLOT));
        assert!(!mask.supports(FeatureMask::GROUP_CHAT | FeatureMask::VOIP));
    }

    #[test]
    fn empty_mask_supports_nothing_but_empty() {
        let mask = FeatureMask::empty();
        assert!(mask.supports(FeatureMask::empty()));
        assert!(!mask.supports(FeatureMask::AUDIO_MESSAGE));
    }

    #[test]
    fn unknown_bits_preserved() {
        let mask = FeatureMask::from_bits_raw(0x1_0000);
        assert_eq!(mask.to_bits_raw(), 0x1_0000);
    }
}
