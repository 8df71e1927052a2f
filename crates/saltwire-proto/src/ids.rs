//! Fixed-size identifier newtypes.
//!
//! Identities and the various 8/16-byte ids appear throughout the wire
//! format. Wrapping them keeps APIs honest about which array means what and
//! gives each a log-friendly `Display` (identities render as their ASCII
//! form when printable, everything else as lowercase hex).

use std::fmt;

use crate::limits::{BALLOT_ID_LEN, BLOB_ID_LEN, GROUP_ID_LEN, IDENTITY_LEN, MESSAGE_ID_LEN};

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(f, "{byte:02x}")?;
    }
    Ok(())
}

/// Eight-byte client identity.
///
/// Identities assigned by the directory are eight ASCII characters
/// (uppercase letters and digits, with a `*` prefix for gateway ids), but
/// the wire layer accepts any eight bytes; charset policy belongs to the
/// directory, not the codec.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    /// Construct from raw wire bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    /// Construct from an ASCII string of exactly eight characters.
    ///
    /// Returns `None` if the string is not eight bytes of ASCII.
    #[must_use]
    pub fn from_ascii(s: &str) -> Option<Self> {
        let bytes: [u8; IDENTITY_LEN] = s.as_bytes().try_into().ok()?;
        if !bytes.iter().all(u8::is_ascii) {
            return None;
        }
        Some(Self(bytes))
    }

    /// Raw wire bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; IDENTITY_LEN] {
        &self.0
    }

    /// Owned wire bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; IDENTITY_LEN] {
        self.0
    }

    /// The identity as a string, if it is printable ASCII.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if self.0.iter().all(|b| b.is_ascii_graphic()) {
            std::str::from_utf8(&self.0).ok()
        } else {
            None
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => write_hex(f, &self.0),
        }
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

macro_rules! hex_id {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Construct from raw wire bytes.
            #[must_use]
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Raw wire bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Owned wire bytes.
            #[must_use]
            pub const fn to_bytes(self) -> [u8; $len] {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_hex(f, &self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }
    };
}

hex_id! {
    /// Eight random bytes identifying a message.
    ///
    /// Unique per sender/receiver pair, not globally; always logged as hex.
    MessageId, MESSAGE_ID_LEN
}

hex_id! {
    /// Eight-byte group id, scoped to the creating identity.
    GroupId, GROUP_ID_LEN
}

hex_id! {
    /// Eight-byte ballot id, scoped to the creating identity.
    BallotId, BALLOT_ID_LEN
}

hex_id! {
    /// Sixteen-byte blob id referencing media on the blob server.
    BlobId, BLOB_ID_LEN
}
