//! Group addressing header.

use saltwire_proto::{GroupId, Identity};

use crate::error::DecodeError;
use crate::messages::BodyReader;

/// The 16-byte prefix every group message body starts with.
///
/// Groups are scoped to their creator: `(creator, group_id)` together name
/// one group, and the same 8-byte id under two creators means two distinct
/// groups. The header must parse before any type-specific field of a group
/// body is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHeader {
    /// Identity that created the group.
    pub creator: Identity,
    /// Group id, unique per creator.
    pub group_id: GroupId,
}

impl GroupHeader {
    pub(crate) fn read(r: &mut BodyReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self { creator: r.take_identity()?, group_id: r.take_group_id()? })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.creator.as_bytes());
        out.extend_from_slice(self.group_id.as_bytes());
    }
}
