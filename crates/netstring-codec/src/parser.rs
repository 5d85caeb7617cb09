//! The netstring parse state machine.
//!
//! The parser is fed whatever bytes happen to be available and picks up exactly where it
//! left off on the next call, so a netstring may be split across any number of reads. It
//! keeps no error state of its own: the driver ([`Decoder`](crate::Decoder) or the async
//! codec) latches the first error and never feeds the parser again.

use bytes::{Bytes, BytesMut};

use crate::error::{Error, Result};

/// Upper bound on the buffer reserved up front for a value. Larger values grow as their
/// bytes arrive, so a forged length prefix cannot force a huge allocation.
const PREALLOCATE_LIMIT: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    FirstLengthByte,
    LengthDigits,
    Colon,
    Value,
    Comma,
}

#[derive(Debug)]
pub(crate) struct Parser {
    state: ParseState,
    length: u64,
    max_length: u64,
    value: BytesMut,
}

impl Parser {
    pub(crate) fn new(max_length: usize) -> Self {
        Self {
            state: ParseState::FirstLengthByte,
            length: 0,
            max_length: max_length as u64,
            value: BytesMut::new(),
        }
    }

    pub(crate) fn set_max_length(&mut self, max_length: usize) {
        self.max_length = max_length as u64;
    }

    /// True when no part of a netstring has been consumed yet.
    pub(crate) fn is_idle(&self) -> bool {
        self.state == ParseState::FirstLengthByte
    }

    /// Advance over `input`.
    ///
    /// Returns the number of bytes consumed and, if one was completed, the value. Bytes
    /// after a completed netstring are left unconsumed. On error the parser must not be
    /// fed again.
    pub(crate) fn feed(&mut self, input: &[u8]) -> Result<(usize, Option<Bytes>)> {
        let mut at = 0;
        while at < input.len() {
            match self.state {
                ParseState::FirstLengthByte => {
                    let b = input[at];
                    at += 1;
                    if !b.is_ascii_digit() {
                        return Err(Error::LengthNotDigit);
                    }
                    self.length = u64::from(b - b'0');
                    self.check_length()?;
                    self.state = ParseState::LengthDigits;
                }

                ParseState::LengthDigits => {
                    let b = input[at];
                    if !b.is_ascii_digit() {
                        // Re-examine the same byte as the delimiter.
                        self.state = ParseState::Colon;
                        continue;
                    }
                    at += 1;
                    if self.length == 0 {
                        return Err(Error::LeadingZero);
                    }
                    self.length = self.length * 10 + u64::from(b - b'0');
                    self.check_length()?;
                }

                ParseState::Colon => {
                    let b = input[at];
                    at += 1;
                    if b != b':' {
                        return Err(Error::ColonExpected);
                    }
                    let length = self.length as usize;
                    self.value = BytesMut::with_capacity(length.min(PREALLOCATE_LIMIT));
                    self.state = if length == 0 {
                        ParseState::Comma
                    } else {
                        ParseState::Value
                    };
                }

                ParseState::Value => {
                    let want = self.length as usize - self.value.len();
                    let got = want.min(input.len() - at);
                    self.value.extend_from_slice(&input[at..at + got]);
                    at += got;
                    if got == want {
                        self.state = ParseState::Comma;
                    }
                }

                ParseState::Comma => {
                    let b = input[at];
                    at += 1;
                    if b != b',' {
                        return Err(Error::CommaExpected);
                    }
                    self.state = ParseState::FirstLengthByte;
                    self.length = 0;
                    let value = std::mem::take(&mut self.value).freeze();
                    return Ok((at, Some(value)));
                }
            }
        }
        Ok((at, None))
    }

    fn check_length(&self) -> Result<()> {
        if self.length > self.max_length {
            return Err(Error::LengthTooLong {
                max: self.max_length as usize,
            });
        }
        Ok(())
    }
}
