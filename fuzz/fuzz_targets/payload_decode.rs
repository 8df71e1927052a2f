//! Fuzz target for `Payload::decode`
//!
//! Feeds arbitrary bytes to the container payload parser to find:
//! - Crashes on unknown or truncated payload tags
//! - Length confusion in the fixed-size record bodies
//! - UTF-8 handling bugs in error/alert text
//!
//! The parser must NEVER panic; invalid packets return an error. Decoding
//! is tolerant (reserved bytes ignored, trailing record bytes skipped,
//! lossy text), so accepted packets are checked for the canonical round
//! trip instead of byte identity.

#![no_main]

use libfuzzer_sys::fuzz_target;
use saltwire_proto::Payload;

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = Payload::decode(data) {
        let bytes = payload.encode_to_vec().expect("decoded payload must re-encode");
        let reparsed = Payload::decode(&bytes).expect("canonical form must decode");
        assert_eq!(reparsed, payload);
    }
});
