//! Mapping between simple records and keyed netstrings.
//!
//! A record is a flat struct whose tagged fields are integers, floats, `String` or
//! `Vec<u8>`. [`Encoder::marshal`] writes each tagged field as a keyed netstring (the tag
//! is the key) followed by an end-of-message sentinel, and [`Decoder::unmarshal`] fills a
//! record back in from such a message, in whatever order the fields arrive.
//!
//! Implement [`Record`] with the [`record!`](crate::record!) macro:
//!
//! ```
//! use netstring_codec::{record, Decoder, Encoder};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Person {
//!     age: i32,
//!     country: String,
//!     name: String,
//!     height: u16, // not tagged, never encoded
//! }
//!
//! record!(Person {
//!     age => "a",
//!     country => "C",
//!     name => "n",
//! });
//!
//! let out = Person { age: 21, country: "Iceland".into(), name: "Bjorn".into(), height: 180 };
//! let mut enc = Encoder::new(Vec::new());
//! enc.marshal(b'z', &out).unwrap();
//! let wire = enc.into_inner();
//! assert_eq!(wire, b"3:a21,8:CIceland,6:nBjorn,1:z,");
//!
//! let mut dec = Decoder::new(wire.as_slice());
//! let mut back = Person::default();
//! let unknown = dec.unmarshal(b'z', &mut back).unwrap();
//! assert_eq!(unknown, None);
//! assert_eq!(back, Person { height: 0, ..out });
//! ```

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};

use bytes::Bytes;
use tracing::debug;

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::value::Value;

/// The kinds of field a [`Record`] may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Text,
    Bytes,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::I8 => "i8",
            FieldKind::I16 => "i16",
            FieldKind::I32 => "i32",
            FieldKind::I64 => "i64",
            FieldKind::Isize => "isize",
            FieldKind::U8 => "u8",
            FieldKind::U16 => "u16",
            FieldKind::U32 => "u32",
            FieldKind::U64 => "u64",
            FieldKind::Usize => "usize",
            FieldKind::F32 => "f32",
            FieldKind::F64 => "f64",
            FieldKind::Text => "string",
            FieldKind::Bytes => "bytes",
        };
        f.write_str(name)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A record field type.
///
/// Implemented for every integer and float width, `String` and `Vec<u8>`, and sealed:
/// other types cannot be record fields.
pub trait Field: sealed::Sealed {
    /// The kind of this field.
    fn kind(&self) -> FieldKind;

    /// The value to encode for this field.
    fn value(&self) -> Value<'_>;

    /// Replace this field with the parsed form of `raw`.
    ///
    /// Returns `false`, leaving the field untouched, if `raw` does not parse or does not
    /// fit the field's width.
    fn assign(&mut self, raw: &Bytes) -> bool;
}

fn parse_text<T: std::str::FromStr>(raw: &[u8]) -> Option<T> {
    std::str::from_utf8(raw).ok()?.parse().ok()
}

macro_rules! integer_field {
    ($variant:ident => $($ty:ty: $kind:ident),+) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Field for $ty {
                fn kind(&self) -> FieldKind {
                    FieldKind::$kind
                }

                fn value(&self) -> Value<'_> {
                    Value::$variant(*self as _)
                }

                fn assign(&mut self, raw: &Bytes) -> bool {
                    match parse_text::<$ty>(raw) {
                        Some(v) => {
                            *self = v;
                            true
                        }
                        None => false,
                    }
                }
            }
        )+
    };
}

integer_field!(Int => i8: I8, i16: I16, i32: I32, i64: I64, isize: Isize);
integer_field!(Uint => u8: U8, u16: U16, u32: U32, u64: U64, usize: Usize);

// Floats parse at their own width. Finite text too large for the width is rejected
// rather than rounded to infinity.
macro_rules! float_field {
    ($($ty:ty: $kind:ident),+) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Field for $ty {
                fn kind(&self) -> FieldKind {
                    FieldKind::$kind
                }

                fn value(&self) -> Value<'_> {
                    Value::$kind(*self)
                }

                fn assign(&mut self, raw: &Bytes) -> bool {
                    let Ok(text) = std::str::from_utf8(raw) else {
                        return false;
                    };
                    match text.parse::<$ty>() {
                        Ok(v) if v.is_infinite() && !text.to_ascii_lowercase().contains("inf") => {
                            false
                        }
                        Ok(v) => {
                            *self = v;
                            true
                        }
                        Err(_) => false,
                    }
                }
            }
        )+
    };
}

float_field!(f32: F32, f64: F64);

impl sealed::Sealed for String {}

impl Field for String {
    fn kind(&self) -> FieldKind {
        FieldKind::Text
    }

    fn value(&self) -> Value<'_> {
        Value::Str(self)
    }

    fn assign(&mut self, raw: &Bytes) -> bool {
        match std::str::from_utf8(raw) {
            Ok(text) => {
                text.clone_into(self);
                true
            }
            Err(_) => false,
        }
    }
}

impl sealed::Sealed for Vec<u8> {}

impl Field for Vec<u8> {
    fn kind(&self) -> FieldKind {
        FieldKind::Bytes
    }

    fn value(&self) -> Value<'_> {
        Value::Bytes(self)
    }

    fn assign(&mut self, raw: &Bytes) -> bool {
        self.clear();
        self.extend_from_slice(raw);
        true
    }
}

/// A tagged record field, borrowed for encoding.
pub struct FieldRef<'a> {
    name: &'static str,
    tag: &'static str,
    field: &'a dyn Field,
}

impl<'a> FieldRef<'a> {
    pub fn new(name: &'static str, tag: &'static str, field: &'a dyn Field) -> Self {
        Self { name, tag, field }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn kind(&self) -> FieldKind {
        self.field.kind()
    }
}

/// A tagged record field, borrowed for decoding.
pub struct FieldMut<'a> {
    name: &'static str,
    tag: &'static str,
    field: &'a mut dyn Field,
}

impl<'a> FieldMut<'a> {
    pub fn new(name: &'static str, tag: &'static str, field: &'a mut dyn Field) -> Self {
        Self { name, tag, field }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn kind(&self) -> FieldKind {
        self.field.kind()
    }
}

/// A flat struct that maps to a sequence of keyed netstrings.
///
/// Both methods must describe the same fields with the same tags in the same order.
/// Fields that are not listed are neither encoded nor decoded.
pub trait Record {
    /// The tagged fields, for encoding.
    fn fields(&self) -> Vec<FieldRef<'_>>;

    /// The tagged fields, for decoding.
    fn fields_mut(&mut self) -> Vec<FieldMut<'_>>;
}

/// Implement [`Record`] for a struct from a list of `field => "tag"` pairs.
///
/// Each tag must be a single ASCII letter, unique within the record. That is checked
/// when the record is marshalled or unmarshalled.
#[macro_export]
macro_rules! record {
    ($record:ty { $($field:ident => $tag:literal),* $(,)? }) => {
        impl $crate::Record for $record {
            fn fields(&self) -> ::std::vec::Vec<$crate::FieldRef<'_>> {
                ::std::vec![
                    $($crate::FieldRef::new(::std::stringify!($field), $tag, &self.$field)),*
                ]
            }

            fn fields_mut(&mut self) -> ::std::vec::Vec<$crate::FieldMut<'_>> {
                ::std::vec![
                    $($crate::FieldMut::new(::std::stringify!($field), $tag, &mut self.$field)),*
                ]
            }
        }
    };
}

fn end_of_message(eom: Key) -> Result<Key> {
    if eom.assess()? {
        Ok(eom)
    } else {
        Err(Error::BadEndOfMessage)
    }
}

fn tag_key(field: &'static str, tag: &'static str) -> Result<Key> {
    let bad_tag = || Error::BadTag { field, tag };
    let &[byte] = tag.as_bytes() else {
        return Err(bad_tag());
    };
    let key = Key::new(byte);
    match key.assess() {
        Ok(true) => Ok(key),
        _ => Err(bad_tag()),
    }
}

/// Resolve every field tag to its key, in field order.
fn field_keys<I>(eom: Key, fields: I) -> Result<Vec<Key>>
where
    I: IntoIterator<Item = (&'static str, &'static str)>,
{
    let mut owners: HashMap<Key, &'static str> = HashMap::new();
    let mut keys = Vec::new();
    for (field, tag) in fields {
        let key = tag_key(field, tag)?;
        if key == eom {
            return Err(Error::TagIsEndOfMessage { key, field });
        }
        if let Some(previous) = owners.insert(key, field) {
            return Err(Error::DuplicateTag {
                key,
                field,
                previous,
            });
        }
        keys.push(key);
    }
    Ok(keys)
}

impl<W: Write> Encoder<W> {
    /// Encode every tagged field of `record` as a keyed netstring, then an `eom` sentinel.
    ///
    /// `eom` must be a letter. Tags must be single letters, unique, and different from
    /// `eom`; all of that is checked before anything is written. Fields are written in
    /// declaration order, but receivers should not rely on it.
    pub fn marshal<R: Record + ?Sized>(&mut self, eom: impl Into<Key>, record: &R) -> Result<()> {
        let eom = end_of_message(eom.into())?;
        let fields = record.fields();
        let keys = field_keys(eom, fields.iter().map(|f| (f.name, f.tag)))?;

        for (key, field) in keys.into_iter().zip(&fields) {
            self.encode(key, field.field.value())?;
        }
        self.encode_bytes(eom, &[])
    }
}

impl<R: Read> Decoder<R> {
    /// Decode keyed netstrings into `record` until the `eom` sentinel arrives.
    ///
    /// Preconditions are the same as for [`Encoder::marshal`] and are checked before
    /// anything is read. Fields missing from the message keep their current values.
    ///
    /// A key with no matching field does not stop decoding; the most recent such key is
    /// returned so the caller can decide whether it matters. A field key seen twice, or
    /// a value that does not fit its field, is an error.
    pub fn unmarshal<T: Record + ?Sized>(
        &mut self,
        eom: impl Into<Key>,
        record: &mut T,
    ) -> Result<Option<Key>> {
        let eom = end_of_message(eom.into())?;
        let mut fields = record.fields_mut();
        let keys = field_keys(eom, fields.iter().map(|f| (f.name, f.tag)))?;
        let index: HashMap<Key, usize> = keys.into_iter().zip(0..).collect();
        let mut seen = vec![false; fields.len()];
        let mut unknown = None;

        loop {
            let (key, value) = self.decode_keyed()?;
            if key == eom {
                return Ok(unknown);
            }

            let Some(&ix) = index.get(&key) else {
                debug!(%key, "no record field for key");
                unknown = Some(key);
                continue;
            };

            let field = &mut fields[ix];
            if std::mem::replace(&mut seen[ix], true) {
                return Err(Error::DuplicateKey {
                    key,
                    field: field.name,
                });
            }
            if !field.field.assign(&value) {
                return Err(Error::FieldConversion {
                    field: field.name,
                    kind: field.kind(),
                    value: String::from_utf8_lossy(&value).into_owned(),
                });
            }
        }
    }
}
