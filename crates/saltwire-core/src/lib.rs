//! Saltwire Messaging Core
//!
//! The decode pipeline and forward-secrecy model of the saltwire
//! messaging protocol, sitting between the wire format
//! ([`saltwire_proto`]) and the crypto primitives ([`saltwire_crypto`]):
//!
//! ```text
//! network bytes
//!     │  MessageEnvelope::decode        (saltwire-proto)
//!     ▼
//! boxed envelope
//!     │  open_box → dedup → unpad       (this crate: inbound)
//!     ▼
//! plaintext `type byte || body`
//!     │  decode_message                 (this crate: decoder)
//!     ▼
//! typed Message + ForwardSecurityMode
//! ```
//!
//! The send path runs the same stations in reverse ([`outbound`]), and a
//! group send fans the plaintext out per member, aggregating the
//! per-recipient protection into one outgoing-group mode.
//!
//! # Design
//!
//! - Every component is a pure function over its inputs; the two pieces of
//!   shared state (key material, seen-nonce set) are reached through the
//!   [`stores`] traits and owned by the caller.
//! - Errors are scoped to one message. A malformed, replayed, or tampered
//!   envelope is logged and dropped; it never poisons the pipeline for the
//!   next message, and nothing is retried here.
//! - Unknown message types decode into a placeholder instead of failing,
//!   so newer protocol extensions degrade gracefully on older clients.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod decoder;
pub mod error;
pub mod fs_mode;
pub mod inbound;
pub mod messages;
pub mod outbound;
pub mod padding;
pub mod stores;

pub use decoder::{decode_from_boxed, decode_message};
pub use error::{DecodeError, FsModeError, OutboundError, ProcessError};
pub use fs_mode::{ConversationScope, ForwardSecurityMode, RatchetStage, RecipientOutcome};
pub use inbound::process_incoming;
pub use messages::{Message, MessageBody};
pub use outbound::{FanoutResult, GroupFanout, SendContext, encode_to_boxed};
pub use stores::{
    IdentityProvider, MemoryNonceRegistry, NonceRegistry, StaticIdentityProvider,
};
