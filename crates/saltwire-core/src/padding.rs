//! Plaintext padding.
//!
//! Every plaintext (`type byte || body`) is padded before sealing so
//! ciphertext length leaks as little as possible about short messages:
//! `n` bytes of value `n` are appended, with `n` chosen so the padded
//! length is at least 32 bytes. Unpadding trusts the count byte only;
//! the padding byte values are not verified, matching the wire format.

use saltwire_proto::limits::MIN_PADDED_LEN;

use crate::error::DecodeError;

/// Append padding in place.
///
/// The amount is deterministic: enough to reach [`MIN_PADDED_LEN`], and
/// always at least one byte so unpadding is unambiguous.
pub fn pad(plaintext: &mut Vec<u8>) {
    let n = if plaintext.len() + 1 >= MIN_PADDED_LEN {
        1
    } else {
        MIN_PADDED_LEN - plaintext.len()
    };
    // n is in 1..=MIN_PADDED_LEN, which fits the count byte
    plaintext.resize(plaintext.len() + n, n as u8);
}

/// Strip padding, returning the plaintext prefix.
///
/// # Errors
///
/// `DecodeError::InvalidPadding` if the buffer is shorter than the
/// 32-byte padded minimum, the count byte is zero, or the count leaves
/// no room for the type byte.
pub fn unpad(padded: &[u8]) -> Result<&[u8], DecodeError> {
    if padded.len() < MIN_PADDED_LEN {
        return Err(DecodeError::InvalidPadding);
    }
    let Some(&count) = padded.last() else {
        return Err(DecodeError::InvalidPadding);
    };
    let count = count as usize;
    if count == 0 || count >= padded.len() {
        return Err(DecodeError::InvalidPadding);
    }
    Ok(&padded[..padded.len() - count])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_plaintext_pads_to_minimum() {
        let mut buf = vec![0x01];
        pad(&mut buf);
        assert_eq!(buf.len(), MIN_PADDED_LEN);
        assert_eq!(*buf.last().unwrap(), (MIN_PADDED_LEN - 1) as u8);
    }

    #[test]
    fn long_plaintext_gets_one_byte() {
        let mut buf = vec![0xAA; 100];
        pad(&mut buf);
        assert_eq!(buf.len(), 101);
        assert_eq!(*buf.last().unwrap(), 1);
    }

    #[test]
    fn boundary_length_gets_one_byte() {
        // 31 bytes + 1 padding byte lands exactly on the floor.
        let mut buf = vec![0xAA; MIN_PADDED_LEN - 1];
        pad(&mut buf);
        assert_eq!(buf.len(), MIN_PADDED_LEN);
        assert_eq!(*buf.last().unwrap(), 1);
    }

    #[test]
    fn pad_unpad_roundtrip() {
        for len in [1usize, 5, 31, 32, 33, 100, 7001] {
            let original: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let mut padded = original.clone();
            pad(&mut padded);
            assert!(padded.len() >= MIN_PADDED_LEN);
            assert_eq!(unpad(&padded).unwrap(), &original[..], "len {len}");
        }
    }

    #[test]
    fn unpad_rejects_zero_count() {
        let mut buf = vec![0xAA; MIN_PADDED_LEN];
        buf[MIN_PADDED_LEN - 1] = 0;
        assert_eq!(unpad(&buf), Err(DecodeError::InvalidPadding));
    }

    #[test]
    fn unpad_rejects_count_consuming_whole_buffer() {
        // Count equal to the length leaves nothing, not even a type byte.
        let buf = vec![MIN_PADDED_LEN as u8; MIN_PADDED_LEN];
        assert_eq!(unpad(&buf), Err(DecodeError::InvalidPadding));
    }

    #[test]
    fn unpad_rejects_count_beyond_buffer() {
        let mut buf = vec![0xAA; MIN_PADDED_LEN];
        buf[MIN_PADDED_LEN - 1] = 0xFF;
        assert_eq!(unpad(&buf), Err(DecodeError::InvalidPadding));
    }

    #[test]
    fn unpad_rejects_buffer_below_padded_minimum() {
        // Legitimate senders always pad up to 32 bytes; anything shorter
        // is malformed even if its count byte is internally consistent.
        assert_eq!(unpad(&[0x01, 0x02, 0x01]), Err(DecodeError::InvalidPadding));
        assert_eq!(unpad(&[]), Err(DecodeError::InvalidPadding));
    }

    #[test]
    fn unpad_does_not_verify_pad_byte_values() {
        // Count byte says 30; the 29 bytes before it are arbitrary.
        let mut buf = vec![0xAA, 0xBB];
        buf.extend(std::iter::repeat_n(0x99, 29));
        buf.push(30);
        assert_eq!(buf.len(), MIN_PADDED_LEN);
        assert_eq!(unpad(&buf).unwrap(), &[0xAA, 0xBB]);
    }
}
