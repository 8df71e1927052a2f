//! Fuzz target for `MessageEnvelope::decode`
//!
//! Feeds arbitrary bytes to the envelope parser to find:
//! - Parser crashes or panics
//! - Integer overflows around `metadata_len` tail splitting
//! - Buffer over-reads past the fixed header
//!
//! The parser must NEVER panic; invalid records return an error. Accepted
//! records must re-encode to the exact input bytes.

#![no_main]

use libfuzzer_sys::fuzz_target;
use saltwire_proto::MessageEnvelope;

fuzz_target!(|data: &[u8]| {
    if let Ok(envelope) = MessageEnvelope::decode(data) {
        // Round-trip invariant: accepted input re-encodes byte-identically.
        let bytes = envelope.encode_to_vec().expect("decoded envelope must re-encode");
        assert_eq!(bytes, data);
    }
});
