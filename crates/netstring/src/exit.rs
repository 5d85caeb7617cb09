//! Exit codes, and how codec failures map onto them.
//!
//! Malformed input is always [`DATA_INVALID`], whichever side noticed it. A bad key is a
//! usage error when it came from the command line and invalid data when it came off the
//! wire, so decode failures go through [`decode_error`] rather than [`codec_error`].

use std::fmt::Display;
use std::io;

use netstring::Error;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
#[error("{context}: {detail}")]
pub struct CliError {
    pub code: i32,
    context: String,
    detail: String,
}

impl CliError {
    pub fn new(code: i32, context: impl Into<String>, detail: impl Display) -> Self {
        Self {
            code,
            context: context.into(),
            detail: detail.to_string(),
        }
    }
}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => FAILURE,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    }
}

/// The exit code for a codec error raised while encoding or handling local input.
pub fn codec_code(err: &Error) -> i32 {
    match err {
        Error::Io(source) | Error::Write { source, .. } => io_code(source),
        Error::EndOfStream => FAILURE,
        Error::InvalidKey(_) | Error::BadEndOfMessage => USAGE,
        Error::ZeroKey | Error::ValueTooLong { .. } => DATA_INVALID,
        err if err.is_sticky() => DATA_INVALID,
        _ => INTERNAL,
    }
}

pub fn io_error(context: impl Into<String>, err: &io::Error) -> CliError {
    CliError::new(io_code(err), context, err)
}

pub fn codec_error(context: impl Into<String>, err: Error) -> CliError {
    CliError::new(codec_code(&err), context, err)
}

/// Map a failure of the `index`th decode. `mid_netstring` says whether the stream ended
/// inside a netstring rather than between two.
pub fn decode_error(index: usize, err: Error, mid_netstring: bool) -> CliError {
    let context = format!("decode failed at netstring {index}");
    match err {
        Error::EndOfStream if mid_netstring => CliError::new(
            DATA_INVALID,
            "decode failed",
            format_args!("truncated netstring after {index} complete"),
        ),
        Error::ZeroKey | Error::InvalidKey(_) => CliError::new(DATA_INVALID, context, err),
        err => codec_error(context, err),
    }
}
