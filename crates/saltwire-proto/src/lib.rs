//! Saltwire Wire Format
//!
//! Binary wire format for the saltwire messaging protocol: the container
//! payloads exchanged with the relay and the boxed message envelope they
//! carry. Pure data types and codecs; no IO, no crypto, no state.
//!
//! # Packet Layout
//!
//! Every post-login packet is one container payload, at most 8192 bytes:
//!
//! ```text
//! ┌ tag u8 ┬ reserved [u8; 3] ┬ body... ┐
//! └────────┴──────────────────┴─────────┘
//! ```
//!
//! For message payloads (tags `0x01`/`0x02`) the body is a boxed message
//! record:
//!
//! ```text
//! ┌ header [u8; 64] ┬ metadata box ┬ nonce [u8; 24] ┬ box... ┐
//! └─────────────────┴──────────────┴────────────────┴────────┘
//! ```
//!
//! The header's `metadata_len` field is the only delimiter inside the
//! tail. All multi-byte integers on the wire are little-endian.
//!
//! # Design
//!
//! - Fixed-size structures ([`EnvelopeHeader`]) are `zerocopy` packed
//!   structs parsed in place; variable structures are explicit codecs
//!   over [`bytes`] buffers.
//! - Known tag sets are closed enums ([`MessageType`], [`PayloadKind`])
//!   with total `from_u8` conversions. Unknown payload tags are errors;
//!   unknown message types are left to the content layer, which degrades
//!   them to a placeholder.
//! - Everything round-trips: `encode(decode(bytes)) == bytes` for every
//!   accepted packet.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
mod errors;
mod features;
mod flags;
mod header;
mod ids;
mod msgtype;
mod payload;

pub mod limits;

pub use envelope::MessageEnvelope;
pub use errors::{ProtocolError, Result};
pub use features::FeatureMask;
pub use flags::MessageFlags;
pub use header::EnvelopeHeader;
pub use ids::{BallotId, BlobId, GroupId, Identity, MessageId};
pub use msgtype::MessageType;
pub use payload::{Payload, PayloadKind, PushTokenKind};
