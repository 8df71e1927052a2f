//! Fuzz target for plaintext unpadding and message dispatch
//!
//! Runs the post-decryption half of the receive pipeline on arbitrary
//! bytes, both as raw plaintext and through the unpadding step, to find:
//! - Panics in the per-type body layouts (truncated fields, ragged lists)
//! - Pad-count handling bugs (zero, oversized, boundary counts)
//! - Asymmetry between a body's decode and its re-encode
//!
//! Decoding must NEVER panic: out-of-bounds bodies return an error and
//! unknown tags degrade to the placeholder variant.

#![no_main]

use libfuzzer_sys::fuzz_target;
use saltwire_core::{decode_message, padding};

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = decode_message(data) {
        // Decoding is canonicalizing (e.g. any nonzero typing byte reads
        // as true), so assert the semantic round trip: the re-encoded
        // form must decode back to the same body.
        let reencoded = body.encode();
        assert_eq!(decode_message(&reencoded).expect("canonical form must decode"), body);
    }

    // The padded path: strip a pad count first, then dispatch.
    if let Ok(plaintext) = padding::unpad(data) {
        let _ = decode_message(plaintext);
    }
});
