//! Envelope flag bits.
//!
//! Flags ride in the single flags byte of the message record and tell the
//! relay how to queue, push, and acknowledge a message. They are advisory
//! for the relay; end-to-end content never depends on them.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Message record flags (8 bits)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MessageFlags: u8 {
        /// Relay should fire a push notification for this message
        const SEND_PUSH = 0x01;

        /// Do not queue for offline recipients; drop instead
        const DONT_QUEUE = 0x02;

        /// Relay must not wait for a client acknowledgement
        const DONT_ACK = 0x04;

        /// Message is part of a group fan-out
        const GROUP = 0x10;

        /// Deliver ahead of queued traffic (call signaling)
        const IMMEDIATE_DELIVERY = 0x20;

        /// Receiver must not send a delivery receipt (set by the server)
        const NO_DELIVERY_RECEIPT = 0x80;
    }
}

impl MessageFlags {
    /// Create flags from the raw wire byte.
    ///
    /// This function is **infallible**: all 256 byte values are valid.
    /// Unknown bits are preserved verbatim so re-serialization is
    /// byte-identical, but they are never checked, which lets future
    /// protocol versions define new bits without breaking old clients.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        Self::from_bits_retain(byte)
    }

    /// Convert to the raw wire byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.bits()
    }
}

impl Default for MessageFlags {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_basic() {
        let flags = MessageFlags::SEND_PUSH | MessageFlags::GROUP;
        assert!(flags.contains(MessageFlags::SEND_PUSH));
        assert!(flags.contains(MessageFlags::GROUP));
        assert!(!flags.contains(MessageFlags::DONT_ACK));
    }

    #[test]
    fn flags_round_trip() {
        let flags = MessageFlags::DONT_QUEUE | MessageFlags::DONT_ACK;
        assert_eq!(MessageFlags::from_byte(flags.to_byte()), flags);
    }

    #[test]
    fn unknown_bits_preserved() {
        // 0x48 sets one defined bit (0x08 is undefined, 0x40 is undefined)
        let flags = MessageFlags::from_byte(0x48);
        assert_eq!(flags.to_byte(), 0x48);
        assert!(!flags.contains(MessageFlags::GROUP));
    }

    #[test]
    fn flags_empty_default() {
        assert_eq!(MessageFlags::default().to_byte(), 0);
    }
}
