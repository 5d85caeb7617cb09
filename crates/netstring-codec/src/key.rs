//! Keys for "keyed" netstrings.
//!
//! A keyed netstring carries a single ASCII letter as the first byte of its value. The
//! letter lets a receiver identify values by meaning rather than by position, so messages
//! can gain fields or reorder them without breaking older peers.

use std::fmt;

use crate::error::{Error, Result};

/// A one-byte netstring key.
///
/// [`Key::NONE`] selects a standard (unkeyed) netstring when encoding. Any ASCII letter
/// selects a keyed netstring. All other byte values are invalid.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(u8);

impl Key {
    /// The "no key" sentinel: encode a standard netstring.
    pub const NONE: Key = Key(0);

    /// Wrap a raw byte. The byte is not validated; see [`Key::assess`].
    pub const fn new(byte: u8) -> Self {
        Key(byte)
    }

    /// The raw key byte.
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Determine whether the key is valid and whether it implies a keyed netstring.
    ///
    /// `NONE` is valid and returns `Ok(false)`. `'a'..='z'` and `'A'..='Z'` return
    /// `Ok(true)`. Anything else returns [`Error::InvalidKey`].
    pub fn assess(self) -> Result<bool> {
        if self == Key::NONE {
            return Ok(false);
        }
        if self.0.is_ascii_alphabetic() {
            return Ok(true);
        }
        Err(Error::InvalidKey(self.0))
    }

    /// True for letter keys.
    pub fn is_keyed(self) -> bool {
        self.0.is_ascii_alphabetic()
    }
}

impl From<u8> for Key {
    fn from(byte: u8) -> Self {
        Key(byte)
    }
}

impl From<Key> for u8 {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_ascii_graphic() {
            write!(f, "{}", self.0 as char)
        } else {
            write!(f, "\\x{:02x}", self.0)
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({self})")
    }
}
