use std::fmt;
use std::io;
use std::sync::Arc;

use crate::key::Key;
use crate::record::FieldKind;

/// Errors that can occur while encoding, decoding or mapping netstrings.
///
/// Grammar violations, end of stream and source I/O failures are *sticky*: once a
/// [`Decoder`](crate::Decoder) has returned one of them it returns a clone of the same
/// error forever. Everything else is local to the failing call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The first byte of a netstring is not a decimal digit.
    #[error("netstring: length does not start with a digit")]
    LengthNotDigit,

    /// A length longer than one digit starts with `0`.
    #[error("netstring: non-zero length cannot have a leading zero")]
    LeadingZero,

    /// The length prefix exceeds the configured maximum.
    #[error("netstring: length exceeds maximum of {max} bytes")]
    LengthTooLong { max: usize },

    /// The length prefix is not followed by `:`.
    #[error("netstring: leading colon delimiter not found after length")]
    ColonExpected,

    /// The value is not followed by `,`.
    #[error("netstring: trailing comma delimiter not found after value")]
    CommaExpected,

    /// The byte source is exhausted and every buffered netstring has been returned.
    #[error("netstring: end of stream")]
    EndOfStream,

    /// The byte source failed.
    #[error("netstring: I/O error: {0}")]
    Io(Arc<io::Error>),

    /// The value (plus key byte) handed to the encoder is too long.
    #[error("netstring: value length {length} exceeds maximum of {max} bytes")]
    ValueTooLong { length: u64, max: usize },

    /// The byte sink failed part-way through a netstring.
    #[error("netstring: encoder write {phase} failed: {source}")]
    Write {
        phase: WritePhase,
        source: Arc<io::Error>,
    },

    /// A key byte is neither `NONE` nor an ASCII letter, or a keyed value was expected.
    #[error("netstring: key 0x{0:02X} is not in range 'a'-'z' or 'A'-'Z'")]
    InvalidKey(u8),

    /// A keyed netstring is empty and therefore has no key byte.
    #[error("netstring: keyed netstring is zero length (thus has no key)")]
    ZeroKey,

    /// The end-of-message key passed to marshal/unmarshal is `Key::NONE`.
    #[error("netstring: end-of-message key must be a letter")]
    BadEndOfMessage,

    /// A record field tag is not a single letter.
    #[error("netstring: field `{field}` tag {tag:?} is not a valid key")]
    BadTag {
        field: &'static str,
        tag: &'static str,
    },

    /// Two record fields share a tag.
    #[error("netstring: duplicate tag '{key}' for `{field}` and `{previous}`")]
    DuplicateTag {
        key: Key,
        field: &'static str,
        previous: &'static str,
    },

    /// A record field tag equals the end-of-message key.
    #[error("netstring: field `{field}` tag '{key}' is the end-of-message key")]
    TagIsEndOfMessage { key: Key, field: &'static str },

    /// The same field key appeared twice in one message.
    #[error("netstring: duplicate key '{key}' in decode stream for `{field}`")]
    DuplicateKey { key: Key, field: &'static str },

    /// A received value does not parse into (or overflows) its field.
    #[error("netstring: cannot convert {value:?} to {kind} for `{field}`")]
    FieldConversion {
        field: &'static str,
        kind: FieldKind,
        value: String,
    },
}

impl Error {
    /// True for errors that permanently poison a decoder.
    pub fn is_sticky(&self) -> bool {
        matches!(
            self,
            Error::LengthNotDigit
                | Error::LeadingZero
                | Error::LengthTooLong { .. }
                | Error::ColonExpected
                | Error::CommaExpected
                | Error::EndOfStream
                | Error::Io(_)
        )
    }

    /// True if this is the end-of-stream condition rather than a failure.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Error::EndOfStream)
    }

    pub(crate) fn write(phase: WritePhase, source: io::Error) -> Self {
        Error::Write {
            phase,
            source: Arc::new(source),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

/// The part of a netstring the encoder was writing when the sink failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePhase {
    Length,
    LeadingDelimiter,
    Key,
    Value,
    TrailingDelimiter,
}

impl fmt::Display for WritePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WritePhase::Length => "length",
            WritePhase::LeadingDelimiter => "leading delimiter",
            WritePhase::Key => "key",
            WritePhase::Value => "value",
            WritePhase::TrailingDelimiter => "trailing delimiter",
        };
        f.write_str(name)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
