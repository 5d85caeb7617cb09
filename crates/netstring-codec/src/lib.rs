//! Strict, resumable netstring encoding and decoding.
//!
//! A netstring is `<length>:<value>,` where `<length>` is the decimal byte length of the
//! value. Netstrings are self-delimiting, so a receiver always knows how many bytes to
//! expect before reading them.
//!
//! On top of the plain format this crate supports *keyed* netstrings, whose first value
//! byte is an ASCII letter naming the value, and a mapping between simple structs and
//! sequences of keyed netstrings terminated by an end-of-message key.
//!
//! - [`Encoder`] writes netstrings to any `Write`.
//! - [`Decoder`] reads netstrings from any `Read`, across arbitrary partial reads, and
//!   poisons itself on the first malformed input.
//! - [`Encoder::marshal`] and [`Decoder::unmarshal`] map [`Record`]s.
//! - `NetstringCodec` (feature `async`) frames netstrings for `tokio-util`.
//!
//! ```
//! use netstring_codec::{Decoder, Encoder, Key};
//!
//! let mut enc = Encoder::new(Vec::new());
//! enc.encode_str(Key::NONE, "hello, world").unwrap();
//! enc.encode_int(b'a', 21).unwrap();
//! let wire = enc.into_inner();
//! assert_eq!(wire, b"12:hello, world,3:a21,");
//!
//! let mut dec = Decoder::new(wire.as_slice());
//! assert_eq!(dec.decode().unwrap().as_ref(), b"hello, world");
//! let (key, value) = dec.decode_keyed().unwrap();
//! assert_eq!((key, value.as_ref()), (Key::new(b'a'), &b"21"[..]));
//! assert!(dec.decode().unwrap_err().is_end_of_stream());
//! ```

#[cfg(feature = "async")]
pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod key;
mod parser;
pub mod record;
pub mod value;

pub use bytes::Bytes;
#[cfg(feature = "async")]
pub use codec::{Keyed, NetstringCodec};
pub use config::{CodecConfig, DEFAULT_READ_BUFFER_SIZE, MAXIMUM_LENGTH};
pub use decoder::Decoder;
pub use encoder::{encode_netstring, Encoder};
pub use error::{Error, Result, WritePhase};
pub use key::Key;
pub use record::{Field, FieldKind, FieldMut, FieldRef, Record};
pub use value::Value;
