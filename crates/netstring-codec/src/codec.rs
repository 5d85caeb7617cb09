//! Netstring framing for async streams via `tokio-util`.
//!
//! [`NetstringCodec`] plugs into `FramedRead`, `FramedWrite` and `Framed`. It shares the
//! parser with the blocking [`Decoder`](crate::Decoder), so grammar errors, the length
//! limit and error stickiness behave the same way.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec;
use tracing::debug;

use crate::config::CodecConfig;
use crate::encoder::encode_netstring;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::parser::Parser;

/// A value tagged with a key, for encoding through [`NetstringCodec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyed<T> {
    pub key: Key,
    pub value: T,
}

impl<T> Keyed<T> {
    pub fn new(key: impl Into<Key>, value: T) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Frames a byte stream as netstrings.
///
/// Decoding yields each value as [`Bytes`]. Values with a key byte come through
/// unsplit; the key is simply the first byte.
#[derive(Debug)]
pub struct NetstringCodec {
    parser: Parser,
    poisoned: Option<Error>,
    max_length: usize,
}

impl NetstringCodec {
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    /// Create a codec from `config`. Only the length limit applies; the read buffer
    /// belongs to the framed stream.
    pub fn with_config(config: CodecConfig) -> Self {
        let max_length = config.effective_max_length();
        Self {
            parser: Parser::new(max_length),
            poisoned: None,
            max_length,
        }
    }

    /// Create a codec that rejects values longer than `max_length` in either direction.
    pub fn with_max_length(max_length: usize) -> Self {
        Self::with_config(CodecConfig {
            max_length,
            ..CodecConfig::default()
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// The error latched by the decoding side, if any.
    pub fn poisoned(&self) -> Option<&Error> {
        self.poisoned.as_ref()
    }

    fn poison(&mut self, err: Error) -> Error {
        debug!(error = %err, "netstring codec poisoned");
        self.poisoned = Some(err.clone());
        err
    }
}

impl Default for NetstringCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl codec::Decoder for NetstringCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }
        match self.parser.feed(src) {
            Ok((used, value)) => {
                src.advance(used);
                Ok(value)
            }
            Err(err) => Err(self.poison(err)),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        match self.decode(src)? {
            Some(value) => Ok(Some(value)),
            None if src.is_empty() && self.parser.is_idle() => Ok(None),
            None => Err(self.poison(Error::EndOfStream)),
        }
    }
}

impl<T: AsRef<[u8]>> codec::Encoder<T> for NetstringCodec {
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<()> {
        encode_netstring(Key::NONE, &[item.as_ref()], self.max_length, dst)
    }
}

impl<T: AsRef<[u8]>> codec::Encoder<Keyed<T>> for NetstringCodec {
    type Error = Error;

    fn encode(&mut self, item: Keyed<T>, dst: &mut BytesMut) -> Result<()> {
        encode_netstring(item.key, &[item.value.as_ref()], self.max_length, dst)
    }
}
