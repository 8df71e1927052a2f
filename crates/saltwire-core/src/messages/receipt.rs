//! Delivery receipts.

use saltwire_proto::limits::MESSAGE_ID_LEN;
use saltwire_proto::MessageId;

use crate::error::DecodeError;
use crate::messages::BodyReader;

/// What a receipt says about the referenced messages.
///
/// The same status values cover plain delivery acknowledgements and the
/// user-triggered reactions (acknowledge/decline map to thumbs up/down in
/// the reference clients).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReceiptStatus {
    /// Message reached the recipient's device.
    Received = 0x01,
    /// Message was displayed to the user.
    Read = 0x02,
    /// User agreed (thumbs up).
    Acknowledged = 0x03,
    /// User disagreed (thumbs down).
    Declined = 0x04,
    /// One-time media was consumed.
    Consumed = 0x05,
}

impl ReceiptStatus {
    /// Convert to the raw wire byte.
    #[must_use]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Convert from the raw wire byte, `None` for undefined values.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Received),
            0x02 => Some(Self::Read),
            0x03 => Some(Self::Acknowledged),
            0x04 => Some(Self::Declined),
            0x05 => Some(Self::Consumed),
            _ => None,
        }
    }
}

/// A receipt covering one or more messages.
///
/// Layout: `status (1) || message_id (8) * N` with `N >= 1`. Batching read
/// receipts into one message keeps catch-up after reconnect cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Receipt status applied to every listed message.
    pub status: ReceiptStatus,
    /// Messages the receipt refers to.
    pub message_ids: Vec<MessageId>,
}

impl Receipt {
    pub(crate) fn read(r: &mut BodyReader<'_>) -> Result<Self, DecodeError> {
        let status_byte = r.take_u8()?;
        let status = ReceiptStatus::from_u8(status_byte)
            .ok_or_else(|| r.invalid("unknown receipt status"))?;
        let invalid = r.invalid("message id list not a multiple of 8");
        let rest = r.rest();
        if rest.len() % MESSAGE_ID_LEN != 0 {
            return Err(invalid);
        }
        let message_ids = rest
            .chunks_exact(MESSAGE_ID_LEN)
            .map(|chunk| {
                let Ok(bytes) = chunk.try_into() else {
                    unreachable!("chunks_exact yields 8-byte chunks");
                };
                MessageId::from_bytes(bytes)
            })
            .collect();
        Ok(Self { status, message_ids })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.push(self.status.to_u8());
        for message_id in &self.message_ids {
            out.extend_from_slice(message_id.as_bytes());
        }
    }
}
