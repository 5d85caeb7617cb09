//! Netstring encoding and decoding.
//!
//! This crate re-exports [`netstring_codec`] and hosts the `netstring` command-line tool
//! (feature `cli`). Enable `async` for the `tokio-util` codec.
//!
//! # Crate Structure
//!
//! - [`Encoder`] / [`Decoder`]: blocking netstring I/O over `Write` / `Read`
//! - [`Key`]: one-letter tags for keyed netstrings
//! - [`Record`] and [`record!`]: struct mapping via [`Encoder::marshal`] and
//!   [`Decoder::unmarshal`]
//! - `NetstringCodec`: framing for async streams (behind `async` feature)

pub use netstring_codec::*;
