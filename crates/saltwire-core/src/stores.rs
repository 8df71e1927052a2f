//! Collaborator traits for identity keys and nonce deduplication.
//!
//! The pipeline itself is stateless; the two pieces of shared state it
//! touches (the local key material and the seen-nonce set) are owned by
//! external collaborators and reached through these traits. Bundled
//! in-memory implementations cover tests and single-process clients;
//! production clients back them with their persistence layer.

use std::collections::{HashMap, HashSet};

use saltwire_crypto::{NonceHash, PublicKey, StaticSecret};
use saltwire_proto::Identity;

/// Source of the local key material and peer public keys.
///
/// `own_identity` is `None` until the client has registered with the
/// directory; nothing can be decrypted or dedup-scoped before that.
pub trait IdentityProvider {
    /// The provisioned local identity, `None` before registration.
    fn own_identity(&self) -> Option<Identity>;

    /// The local long-term X25519 secret.
    fn own_secret(&self) -> &StaticSecret;

    /// Public key of a peer identity, `None` for unknown contacts.
    fn peer_public_key(&self, identity: Identity) -> Option<PublicKey>;
}

/// Replay-detection set of hashed nonces.
///
/// The single `check_and_record` operation is deliberate: exposing a
/// separate check and record would let two copies of a replayed message
/// both pass the check before either is written.
pub trait NonceRegistry {
    /// Record a nonce hash, returning `true` iff it was not seen before.
    fn check_and_record(&mut self, hash: NonceHash) -> bool;
}

/// Map-backed [`IdentityProvider`] with a fixed contact list.
///
/// No `Debug`: the secret key must not end up in debug output.
#[derive(Clone)]
pub struct StaticIdentityProvider {
    own_identity: Option<Identity>,
    own_secret: StaticSecret,
    peers: HashMap<Identity, PublicKey>,
}

impl StaticIdentityProvider {
    /// Provider for a registered client.
    #[must_use]
    pub fn new(own_identity: Identity, own_secret: StaticSecret) -> Self {
        Self { own_identity: Some(own_identity), own_secret, peers: HashMap::new() }
    }

    /// Provider for a client that has not registered yet.
    ///
    /// The secret exists (it is generated before registration) but there
    /// is no identity to scope anything to.
    #[must_use]
    pub fn unregistered(own_secret: StaticSecret) -> Self {
        Self { own_identity: None, own_secret, peers: HashMap::new() }
    }

    /// Add or replace a peer's public key.
    pub fn add_peer(&mut self, identity: Identity, public_key: PublicKey) {
        self.peers.insert(identity, public_key);
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn own_identity(&self) -> Option<Identity> {
        self.own_identity
    }

    fn own_secret(&self) -> &StaticSecret {
        &self.own_secret
    }

    fn peer_public_key(&self, identity: Identity) -> Option<PublicKey> {
        self.peers.get(&identity).copied()
    }
}

/// Set-backed [`NonceRegistry`] with no eviction.
#[derive(Debug, Default, Clone)]
pub struct MemoryNonceRegistry {
    seen: HashSet<NonceHash>,
}

impl MemoryNonceRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded nonce hashes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl NonceRegistry for MemoryNonceRegistry {
    fn check_and_record(&mut self, hash: NonceHash) -> bool {
        self.seen.insert(hash)
    }
}
