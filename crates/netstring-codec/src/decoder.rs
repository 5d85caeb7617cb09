use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes};
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::parser::Parser;

/// Reads netstrings from any `Read` stream.
///
/// Handles partial reads internally: a netstring may arrive split across any number of
/// reads and callers always get complete values.
///
/// The first malformed netstring poisons the decoder. Once synchronization is lost the
/// start of the next netstring cannot be found reliably, so every later call returns the
/// same error. End of stream is latched the same way, but only after every buffered
/// netstring has been returned.
///
/// Wrapping the source in a `BufReader` is unnecessary; the decoder stages reads in its
/// own buffer (see [`CodecConfig::read_buffer_size`]).
pub struct Decoder<R> {
    inner: R,
    staging: Box<[u8]>,
    at: usize,
    end: usize,
    parser: Parser,
    poisoned: Option<Error>,
    config: CodecConfig,
}

impl<R: Read> Decoder<R> {
    /// Create a new decoder with default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new decoder with explicit configuration.
    pub fn with_config(inner: R, config: CodecConfig) -> Self {
        Self {
            inner,
            staging: vec![0u8; config.effective_read_buffer_size()].into_boxed_slice(),
            at: 0,
            end: 0,
            parser: Parser::new(config.effective_max_length()),
            poisoned: None,
            config,
        }
    }

    /// Return the next netstring value.
    ///
    /// Returns [`Error::EndOfStream`] once the source is exhausted.
    pub fn decode(&mut self) -> Result<Bytes> {
        if let Some(err) = &self.poisoned {
            return Err(err.clone());
        }

        loop {
            if self.at == self.end {
                self.fill()?;
            }

            match self.parser.feed(&self.staging[self.at..self.end]) {
                Ok((used, value)) => {
                    self.at += used;
                    if let Some(value) = value {
                        trace!(length = value.len(), "decoded netstring");
                        return Ok(value);
                    }
                }
                Err(err) => return Err(self.poison(err)),
            }
        }
    }

    /// Return the next keyed netstring as its key and the value following the key byte.
    ///
    /// An empty netstring fails with [`Error::ZeroKey`] and a netstring whose first byte
    /// is not a letter fails with [`Error::InvalidKey`]. Neither poisons the decoder: the
    /// offending netstring has been consumed and decoding can continue.
    pub fn decode_keyed(&mut self) -> Result<(Key, Bytes)> {
        let mut value = self.decode()?;
        let Some(&first) = value.first() else {
            return Err(Error::ZeroKey);
        };

        let key = Key::new(first);
        if !key.assess()? {
            return Err(Error::InvalidKey(first));
        }

        value.advance(1);
        Ok((key, value))
    }

    /// The error latched by this decoder, if any.
    pub fn poisoned(&self) -> Option<&Error> {
        self.poisoned.as_ref()
    }

    /// True if a netstring has been partially consumed from the source.
    pub fn is_mid_netstring(&self) -> bool {
        !self.parser.is_idle()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the decoder and return the inner stream.
    ///
    /// Bytes already staged but not yet decoded are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Update the maximum value length for netstrings not yet started.
    pub fn set_max_length(&mut self, max_length: usize) {
        self.config.max_length = max_length;
        self.parser.set_max_length(self.config.effective_max_length());
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Refill the staging buffer with at least one byte.
    fn fill(&mut self) -> Result<()> {
        loop {
            match self.inner.read(&mut self.staging) {
                Ok(0) => return Err(self.poison(Error::EndOfStream)),
                Ok(n) => {
                    self.at = 0;
                    self.end = n;
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(err.into());
                }
                Err(err) => return Err(self.poison(err.into())),
            }
        }
    }

    fn poison(&mut self, err: Error) -> Error {
        if err.is_end_of_stream() {
            trace!(mid_netstring = self.is_mid_netstring(), "netstring source exhausted");
        } else {
            debug!(error = %err, "netstring decoder poisoned");
        }
        self.poisoned = Some(err.clone());
        err
    }
}

impl<R> std::fmt::Debug for Decoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("buffered", &(self.end - self.at))
            .field("parser", &self.parser)
            .field("poisoned", &self.poisoned)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::Arc;

    use super::*;

    fn decoder(wire: &str) -> Decoder<Cursor<Vec<u8>>> {
        Decoder::new(Cursor::new(wire.as_bytes().to_vec()))
    }

    #[test]
    fn decode_simple() {
        let mut dec = decoder("3:abc,4:wxyz,");
        assert_eq!(dec.decode().unwrap().as_ref(), b"abc");
        assert_eq!(dec.decode().unwrap().as_ref(), b"wxyz");
        assert!(dec.decode().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn empty_source_is_end_of_stream() {
        let mut dec = decoder("");
        assert!(matches!(dec.decode(), Err(Error::EndOfStream)));
        assert!(matches!(dec.decode_keyed(), Err(Error::EndOfStream)));
    }

    #[test]
    fn zero_length_value() {
        let mut dec = decoder("0:,");
        assert!(dec.decode().unwrap().is_empty());
    }

    #[test]
    fn grammar_errors_are_sticky() {
        let cases: [(&str, fn(&Error) -> bool); 5] = [
            (":abc,1:A,", |e| matches!(e, Error::LengthNotDigit)),
            ("03:abc,1:A,", |e| matches!(e, Error::LeadingZero)),
            ("999999999999:abc,1:A,", |e| matches!(e, Error::LengthTooLong { .. })),
            ("3*abc,1:A,", |e| matches!(e, Error::ColonExpected)),
            ("3:abcZ1:A,", |e| matches!(e, Error::CommaExpected)),
        ];
        for (wire, check) in cases {
            let mut dec = decoder(wire);
            let first = dec.decode().unwrap_err();
            let second = dec.decode().unwrap_err();
            assert!(check(&first), "{wire}: {first:?}");
            assert!(check(&second), "{wire}: {second:?}");
            assert!(first.is_sticky());
            assert!(dec.poisoned().is_some());
        }
    }

    #[test]
    fn values_before_the_error_are_returned() {
        let mut dec = decoder("1:a,2:bb,03:ccc,");
        assert_eq!(dec.decode().unwrap().as_ref(), b"a");
        assert_eq!(dec.decode().unwrap().as_ref(), b"bb");
        assert!(matches!(dec.decode(), Err(Error::LeadingZero)));
        assert!(matches!(dec.decode(), Err(Error::LeadingZero)));
    }

    #[test]
    fn last_value_is_returned_before_end_of_stream() {
        let mut dec = decoder("5:hello,");
        assert_eq!(dec.decode().unwrap().as_ref(), b"hello");
        assert!(dec.poisoned().is_none());
        assert!(matches!(dec.decode(), Err(Error::EndOfStream)));
        assert!(matches!(dec.decode(), Err(Error::EndOfStream)));
    }

    #[test]
    fn truncated_netstring_reports_end_of_stream() {
        let mut dec = decoder("5:hel");
        assert!(matches!(dec.decode(), Err(Error::EndOfStream)));
        assert!(dec.is_mid_netstring());
    }

    #[test]
    fn decode_keyed_values() {
        let mut dec = decoder("3:a21,8:CIceland,6:nBjorn,1:z,");
        let expected: [(u8, &[u8]); 4] = [
            (b'a', b"21"),
            (b'C', b"Iceland"),
            (b'n', b"Bjorn"),
            (b'z', b""),
        ];
        for (key, value) in expected {
            let (k, v) = dec.decode_keyed().unwrap();
            assert_eq!(k, Key::new(key));
            assert_eq!(v.as_ref(), value);
        }
    }

    #[test]
    fn decode_keyed_errors_are_not_sticky() {
        let mut dec = decoder("0:,2:@1,2:\u{0}1,2:k1,");
        assert!(matches!(dec.decode_keyed(), Err(Error::ZeroKey)));
        assert!(matches!(dec.decode_keyed(), Err(Error::InvalidKey(b'@'))));
        assert!(matches!(dec.decode_keyed(), Err(Error::InvalidKey(0))));
        assert!(dec.poisoned().is_none());

        let (k, v) = dec.decode_keyed().unwrap();
        assert_eq!(k, Key::new(b'k'));
        assert_eq!(v.as_ref(), b"1");
    }

    #[test]
    fn decode_keyed_after_poison_returns_sticky_error() {
        let mut dec = decoder("aa1:a,");
        assert!(matches!(dec.decode_keyed(), Err(Error::LengthNotDigit)));
        assert!(matches!(dec.decode_keyed(), Err(Error::LengthNotDigit)));
    }

    #[test]
    fn configured_max_length_is_enforced() {
        let cfg = CodecConfig {
            max_length: 3,
            ..CodecConfig::default()
        };
        let mut dec = Decoder::with_config(Cursor::new(b"3:abc,4:abcd,".to_vec()), cfg);
        assert_eq!(dec.decode().unwrap().as_ref(), b"abc");
        assert!(matches!(dec.decode(), Err(Error::LengthTooLong { max: 3 })));
    }

    #[test]
    fn set_max_length_applies_to_next_netstring() {
        let mut dec = decoder("4:abcd,");
        dec.set_max_length(2);
        assert_eq!(dec.config().max_length, 2);
        assert!(matches!(dec.decode(), Err(Error::LengthTooLong { max: 2 })));
    }

    /// Hands out one queued chunk per read, then end of stream.
    struct ChunkReader {
        chunks: VecDeque<Vec<u8>>,
        current: Vec<u8>,
    }

    impl ChunkReader {
        fn new<I: IntoIterator<Item = Vec<u8>>>(chunks: I) -> Self {
            Self {
                chunks: chunks.into_iter().collect(),
                current: Vec::new(),
            }
        }
    }

    impl Read for ChunkReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.current.is_empty() {
                match self.chunks.pop_front() {
                    Some(chunk) => self.current = chunk,
                    None => return Ok(0),
                }
            }
            let n = self.current.len().min(buf.len());
            buf[..n].copy_from_slice(&self.current[..n]);
            self.current.drain(..n);
            Ok(n)
        }
    }

    #[test]
    fn partial_reads_across_chunks() {
        let chunks: Vec<(&str, Vec<(u8, &str)>)> = vec![
            ("13:Xzeroefghzero,", vec![(b'X', "zeroefghzero")]),
            ("13:Xonedefghione", vec![]),
            (",", vec![(b'X', "onedefghione")]),
            ("13:Xtwodefghi", vec![]),
            ("two,", vec![(b'X', "twodefghitwo")]),
            ("13:Xt", vec![]),
            ("hreefgthree,", vec![(b'X', "threefgthree")]),
            ("13:X", vec![]),
            ("fourefghfour,", vec![(b'X', "fourefghfour")]),
            ("13", vec![]),
            (":Xfiveefghfive,", vec![(b'X', "fiveefghfive")]),
            ("1", vec![]),
            ("3:Xsixdefghisix,", vec![(b'X', "sixdefghisix")]),
            (
                "2:w1,3:x22,4:y333,5:z4444",
                vec![(b'w', "1"), (b'x', "22"), (b'y', "333")],
            ),
            (",6:T55555,", vec![(b'z', "4444"), (b'T', "55555")]),
        ];

        let reader = ChunkReader::new(chunks.iter().map(|(c, _)| c.as_bytes().to_vec()));
        let mut dec = Decoder::new(reader);
        for (_, expected) in &chunks {
            for (key, value) in expected {
                let (k, v) = dec.decode_keyed().unwrap();
                assert_eq!(k, Key::new(*key));
                assert_eq!(v.as_ref(), value.as_bytes());
            }
        }
        assert!(matches!(dec.decode(), Err(Error::EndOfStream)));
    }

    #[test]
    fn tiny_staging_buffer() {
        let cfg = CodecConfig {
            read_buffer_size: 1,
            ..CodecConfig::default()
        };
        let mut dec = Decoder::with_config(Cursor::new(b"5:hello,0:,1:x,".to_vec()), cfg);
        assert_eq!(dec.decode().unwrap().as_ref(), b"hello");
        assert!(dec.decode().unwrap().is_empty());
        assert_eq!(dec.decode().unwrap().as_ref(), b"x");
        assert!(matches!(dec.decode(), Err(Error::EndOfStream)));
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.bytes.read(buf)
        }
    }

    #[test]
    fn interrupted_read_retries() {
        let mut dec = Decoder::new(InterruptedThenData {
            state: 0,
            bytes: Cursor::new(b"2:ok,".to_vec()),
        });
        assert_eq!(dec.decode().unwrap().as_ref(), b"ok");
    }

    /// Alternates between `WouldBlock` and a single byte of data.
    struct NonBlocking {
        bytes: Vec<u8>,
        pos: usize,
        ready: bool,
    }

    impl Read for NonBlocking {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.ready {
                self.ready = true;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            self.ready = false;
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn would_block_is_not_sticky() {
        let mut dec = Decoder::new(NonBlocking {
            bytes: b"3:abc,".to_vec(),
            pos: 0,
            ready: false,
        });

        let mut would_block = 0;
        let value = loop {
            match dec.decode() {
                Ok(value) => break value,
                Err(Error::Io(err)) if err.kind() == ErrorKind::WouldBlock => would_block += 1,
                Err(err) => panic!("unexpected error: {err}"),
            }
        };

        assert_eq!(value.as_ref(), b"abc");
        assert_eq!(would_block, 6);
        assert!(dec.poisoned().is_none());
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn io_error_is_sticky_and_identical() {
        let mut dec = Decoder::new(Broken);
        let first = dec.decode().unwrap_err();
        let second = dec.decode().unwrap_err();
        match (first, second) {
            (Error::Io(a), Error::Io(b)) => {
                assert!(Arc::ptr_eq(&a, &b));
                assert_eq!(a.kind(), ErrorKind::ConnectionReset);
            }
            other => panic!("unexpected errors: {other:?}"),
        }
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut dec = decoder("");
        let _ = dec.get_ref();
        let _ = dec.get_mut();
        let _ = format!("{dec:?}");
        let _inner = dec.into_inner();
    }
}
