use std::fmt::{self, Write as _};

use bytes::{BufMut, BytesMut};

/// A value accepted by [`Encoder::encode`](crate::Encoder::encode).
///
/// Non-text values are converted to their canonical text form before encoding:
/// integers in decimal, floats in fixed-point notation with the shortest digits that
/// round-trip, booleans as `T` / `f`.
///
/// A `u8` converts to [`Value::Byte`] and is encoded as the raw byte, not as decimal
/// digits. Use [`Value::Uint`] (or `u16` and wider) for a numeric byte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Bytes(&'a [u8]),
    Str(&'a str),
    Byte(u8),
    Bool(bool),
    Char(char),
    Int(i64),
    Uint(u64),
    F32(f32),
    F64(f64),
}

impl Value<'_> {
    /// Append the encoded form of this value to `dst`.
    pub(crate) fn write_to(&self, dst: &mut BytesMut) {
        // fmt::Write for BytesMut never fails
        let _ = match *self {
            Value::Bytes(bytes) => {
                dst.put_slice(bytes);
                Ok(())
            }
            Value::Str(text) => {
                dst.put_slice(text.as_bytes());
                Ok(())
            }
            Value::Byte(byte) => {
                dst.put_u8(byte);
                Ok(())
            }
            Value::Bool(true) => {
                dst.put_u8(b'T');
                Ok(())
            }
            Value::Bool(false) => {
                dst.put_u8(b'f');
                Ok(())
            }
            Value::Char(c) => dst.write_char(c),
            Value::Int(v) => write!(dst, "{v}"),
            Value::Uint(v) => write!(dst, "{v}"),
            Value::F32(v) => write_float(dst, f64::from(v), format_args!("{v}")),
            Value::F64(v) => write_float(dst, v, format_args!("{v}")),
        };
    }
}

// Infinities carry an explicit sign so both directions read the same to a peer.
fn write_float(dst: &mut BytesMut, v: f64, finite: fmt::Arguments<'_>) -> fmt::Result {
    if v.is_infinite() {
        dst.put_slice(if v > 0.0 { b"+Inf" } else { b"-Inf" });
        return Ok(());
    }
    dst.write_fmt(finite)
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(v: &'a [u8]) -> Self {
        Value::Bytes(v)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Value<'a> {
    fn from(v: &'a [u8; N]) -> Self {
        Value::Bytes(v)
    }
}

impl<'a> From<&'a Vec<u8>> for Value<'a> {
    fn from(v: &'a Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(v: &'a str) -> Self {
        Value::Str(v)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(v: &'a String) -> Self {
        Value::Str(v)
    }
}

impl From<u8> for Value<'_> {
    fn from(v: u8) -> Self {
        Value::Byte(v)
    }
}

impl From<bool> for Value<'_> {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<char> for Value<'_> {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<f32> for Value<'_> {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value<'_> {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

macro_rules! value_from_int {
    ($variant:ident => $($ty:ty),+) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(v: $ty) -> Self {
                    Value::$variant(v as _)
                }
            }
        )+
    };
}

value_from_int!(Int => i8, i16, i32, i64, isize);
value_from_int!(Uint => u16, u32, u64, usize);
