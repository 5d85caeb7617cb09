use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::config::CodecConfig;
use crate::error::{Error, Result, WritePhase};
use crate::key::Key;
use crate::value::Value;

const INITIAL_SCRATCH_CAPACITY: usize = 64;

/// Writes netstrings to any `Write` stream.
///
/// Every `encode*` call writes exactly one netstring, typically with several `write`
/// calls, so wrapping an unbuffered sink in a `BufWriter` is worthwhile. If the sink
/// fails part-way the error names the [`WritePhase`] and the sink is left holding a
/// partial netstring. Interrupted and would-block writes and flushes are retried in
/// place; any other failure is final, and the partial netstring is not rolled back.
pub struct Encoder<W> {
    inner: W,
    length: BytesMut,
    scratch: BytesMut,
    config: CodecConfig,
}

impl<W: Write> Encoder<W> {
    /// Create a new encoder with default configuration.
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new encoder with explicit configuration.
    pub fn with_config(inner: W, config: CodecConfig) -> Self {
        Self {
            inner,
            length: BytesMut::with_capacity(20),
            scratch: BytesMut::with_capacity(INITIAL_SCRATCH_CAPACITY),
            config,
        }
    }

    /// Encode the concatenation of `parts` as a single netstring.
    ///
    /// With `Key::NONE` a standard netstring is written, with a letter key a keyed
    /// netstring. Calling this with a key and no parts writes an end-of-message sentinel:
    ///
    /// ```
    /// # use netstring_codec::Encoder;
    /// let mut enc = Encoder::new(Vec::new());
    /// enc.encode_bytes(b'z', &[]).unwrap();
    /// assert_eq!(enc.into_inner(), b"1:z,");
    /// ```
    pub fn encode_bytes(&mut self, key: impl Into<Key>, parts: &[&[u8]]) -> Result<()> {
        write_netstring(
            &mut self.inner,
            &mut self.length,
            self.config.effective_max_length(),
            key.into(),
            parts,
        )
    }

    /// Encode a string.
    pub fn encode_str(&mut self, key: impl Into<Key>, value: &str) -> Result<()> {
        self.encode_bytes(key, &[value.as_bytes()])
    }

    /// Encode a single raw byte.
    pub fn encode_byte(&mut self, key: impl Into<Key>, value: u8) -> Result<()> {
        self.encode_bytes(key, &[&[value]])
    }

    /// Encode a boolean as `T` or `f`.
    pub fn encode_bool(&mut self, key: impl Into<Key>, value: bool) -> Result<()> {
        self.encode(key, value)
    }

    /// Encode a signed integer in decimal.
    pub fn encode_int(&mut self, key: impl Into<Key>, value: i64) -> Result<()> {
        self.encode(key, value)
    }

    /// Encode an unsigned integer in decimal.
    pub fn encode_uint(&mut self, key: impl Into<Key>, value: u64) -> Result<()> {
        self.encode(key, Value::Uint(value))
    }

    /// Encode an `f32` in fixed-point notation with the fewest digits that round-trip.
    pub fn encode_f32(&mut self, key: impl Into<Key>, value: f32) -> Result<()> {
        self.encode(key, value)
    }

    /// Encode an `f64` in fixed-point notation with the fewest digits that round-trip.
    pub fn encode_f64(&mut self, key: impl Into<Key>, value: f64) -> Result<()> {
        self.encode(key, value)
    }

    /// Encode any supported [`Value`].
    ///
    /// ```
    /// # use netstring_codec::{Encoder, Key};
    /// let mut enc = Encoder::new(Vec::new());
    /// enc.encode(b'a', 21).unwrap();
    /// enc.encode(b'C', "Iceland").unwrap();
    /// enc.encode(Key::NONE, true).unwrap();
    /// assert_eq!(enc.into_inner(), b"3:a21,8:CIceland,1:T,");
    /// ```
    pub fn encode<'a>(&mut self, key: impl Into<Key>, value: impl Into<Value<'a>>) -> Result<()> {
        let key = key.into();
        let value: Value<'a> = value.into();
        match value {
            Value::Bytes(bytes) => self.encode_bytes(key, &[bytes]),
            Value::Str(text) => self.encode_bytes(key, &[text.as_bytes()]),
            formatted => {
                self.scratch.clear();
                formatted.write_to(&mut self.scratch);
                write_netstring(
                    &mut self.inner,
                    &mut self.length,
                    self.config.effective_max_length(),
                    key,
                    &[&self.scratch[..]],
                )
            }
        }
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the encoder and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Update the maximum value length for subsequent netstrings.
    pub fn set_max_length(&mut self, max_length: usize) {
        self.config.max_length = max_length;
    }

    /// Current encoder configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl<W> std::fmt::Debug for Encoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Validate `key` and `parts` and return the netstring value length.
fn value_length(key: Key, parts: &[&[u8]], max_length: usize) -> Result<(bool, usize)> {
    let keyed = key.assess()?;
    let length = u64::from(keyed)
        + parts.iter().map(|part| part.len() as u64).sum::<u64>();
    if length > max_length as u64 {
        return Err(Error::ValueTooLong {
            length,
            max: max_length,
        });
    }
    Ok((keyed, length as usize))
}

fn write_netstring<W: Write>(
    out: &mut W,
    digits: &mut BytesMut,
    max_length: usize,
    key: Key,
    parts: &[&[u8]],
) -> Result<()> {
    let (keyed, length) = value_length(key, parts, max_length)?;

    digits.clear();
    // fmt::Write for BytesMut never fails
    let _ = std::fmt::Write::write_fmt(digits, format_args!("{length}"));
    write_phase(out, WritePhase::Length, &digits[..])?;
    write_phase(out, WritePhase::LeadingDelimiter, b":")?;
    if keyed {
        write_phase(out, WritePhase::Key, &[key.as_byte()])?;
    }
    for part in parts.iter().filter(|part| !part.is_empty()) {
        write_phase(out, WritePhase::Value, part)?;
    }
    write_phase(out, WritePhase::TrailingDelimiter, b",")?;

    trace!(%key, length, "encoded netstring");
    Ok(())
}

fn write_phase<W: Write>(out: &mut W, phase: WritePhase, mut data: &[u8]) -> Result<()> {
    while !data.is_empty() {
        match out.write(data) {
            Ok(0) => return Err(Error::write(phase, ErrorKind::WriteZero.into())),
            Ok(n) => data = &data[n..],
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
            Err(err) => return Err(Error::write(phase, err)),
        }
    }
    Ok(())
}

/// Append one netstring to `dst`.
///
/// The buffer counterpart of [`Encoder::encode_bytes`]: the same key and length rules,
/// nothing appended on error.
pub fn encode_netstring(
    key: impl Into<Key>,
    parts: &[&[u8]],
    max_length: usize,
    dst: &mut BytesMut,
) -> Result<()> {
    let key = key.into();
    let (keyed, length) = value_length(key, parts, max_length)?;

    // Assume that 10 digits is long enough for the length
    dst.reserve(10 + 1 + length + 1);
    // fmt::Write for BytesMut never fails
    let _ = std::fmt::Write::write_fmt(dst, format_args!("{length}"));
    dst.put_u8(b':');
    if keyed {
        dst.put_u8(key.as_byte());
    }
    for part in parts {
        dst.put_slice(part);
    }
    dst.put_u8(b',');
    Ok(())
}
