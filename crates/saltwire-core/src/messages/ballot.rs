//! Ballot (poll) message records.
//!
//! Ballot state itself is JSON and opaque at this layer; the wire records
//! only frame the id fields so a receiver can route the document to the
//! right ballot without parsing it.

use saltwire_proto::{BallotId, Identity};

use crate::error::DecodeError;
use crate::messages::BodyReader;

/// Ballot creation.
///
/// Layout: `ballot_id (8) || description`, where the description is a
/// JSON document (title, choices, display mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallotCreate {
    /// Ballot id, scoped to the sending identity.
    pub ballot_id: BallotId,
    /// JSON ballot description, opaque at this layer.
    pub description: String,
}

impl BallotCreate {
    pub(crate) fn read(r: &mut BodyReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self { ballot_id: r.take_ballot_id()?, description: r.rest_utf8()?.to_owned() })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.ballot_id.as_bytes());
        out.extend_from_slice(self.description.as_bytes());
    }
}

/// Ballot vote.
///
/// Layout: `creator (8) || ballot_id (8) || choices`, where choices is a
/// JSON array of choice-id/value pairs. The creator identity routes the
/// vote to the ballot's owner, which may differ from the message sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallotVote {
    /// Identity that created the ballot being voted on.
    pub creator: Identity,
    /// Ballot id, scoped to the creator.
    pub ballot_id: BallotId,
    /// JSON choice list, opaque at this layer.
    pub choices: String,
}

impl BallotVote {
    pub(crate) fn read(r: &mut BodyReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            creator: r.take_identity()?,
            ballot_id: r.take_ballot_id()?,
            choices: r.rest_utf8()?.to_owned(),
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.creator.as_bytes());
        out.extend_from_slice(self.ballot_id.as_bytes());
        out.extend_from_slice(self.choices.as_bytes());
    }
}
