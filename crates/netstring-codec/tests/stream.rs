use std::io::Read;

use netstring_codec::{CodecConfig, Decoder, Encoder, Error, Key};
use quickcheck::{quickcheck, TestResult};

/// Hands out its data in the given chunk sizes, cycling through them.
struct Chunked {
    data: Vec<u8>,
    at: usize,
    sizes: Vec<usize>,
    next: usize,
}

impl Chunked {
    fn new(data: Vec<u8>, sizes: Vec<u8>) -> Self {
        let mut sizes: Vec<usize> = sizes.into_iter().map(|s| usize::from(s % 17) + 1).collect();
        if sizes.is_empty() {
            sizes.push(1);
        }
        Self {
            data,
            at: 0,
            sizes,
            next: 0,
        }
    }
}

impl Read for Chunked {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let size = self.sizes[self.next % self.sizes.len()];
        self.next += 1;
        let n = size.min(buf.len()).min(self.data.len() - self.at);
        buf[..n].copy_from_slice(&self.data[self.at..self.at + n]);
        self.at += n;
        Ok(n)
    }
}

fn encode_all(values: &[Vec<u8>]) -> Vec<u8> {
    let mut enc = Encoder::new(Vec::new());
    for value in values {
        enc.encode_bytes(Key::NONE, &[value.as_slice()]).unwrap();
    }
    enc.into_inner()
}

quickcheck! {
    fn roundtrip_any_chunking(values: Vec<Vec<u8>>, sizes: Vec<u8>) -> bool {
        let wire = encode_all(&values);
        let mut dec = Decoder::new(Chunked::new(wire, sizes));
        let decoded: Vec<Vec<u8>> = values
            .iter()
            .map_while(|_| dec.decode().ok().map(|v| v.to_vec()))
            .collect();
        decoded == values && dec.decode().is_err_and(|e| e.is_end_of_stream())
    }

    fn roundtrip_small_read_buffer(values: Vec<Vec<u8>>, buffer: u8) -> bool {
        let wire = encode_all(&values);
        let config = CodecConfig {
            read_buffer_size: usize::from(buffer),
            ..CodecConfig::default()
        };
        let mut dec = Decoder::with_config(wire.as_slice(), config);
        values.iter().all(|v| dec.decode().is_ok_and(|got| got.as_ref() == v.as_slice()))
    }

    fn keyed_roundtrip(key: u8, value: Vec<u8>) -> TestResult {
        if !key.is_ascii_alphabetic() {
            return TestResult::discard();
        }
        let mut enc = Encoder::new(Vec::new());
        enc.encode_bytes(key, &[value.as_slice()]).unwrap();
        let wire = enc.into_inner();

        let (got_key, got) = Decoder::new(wire.as_slice()).decode_keyed().unwrap();
        TestResult::from_bool(got_key == Key::new(key) && got.as_ref() == value.as_slice())
    }

    fn truncation_is_end_of_stream(value: Vec<u8>, cut: usize) -> TestResult {
        let wire = encode_all(&[value]);
        let cut = cut % wire.len();
        let mut dec = Decoder::new(&wire[..cut]);
        TestResult::from_bool(matches!(dec.decode(), Err(Error::EndOfStream)))
    }

    fn corrupting_a_delimiter_poisons(value: Vec<u8>) -> bool {
        let mut wire = encode_all(&[value.clone(), value]);
        // both netstrings are identical, so the first comma ends the first half
        let first_len = wire.len() / 2;
        wire[first_len - 1] = b';';

        let mut dec = Decoder::new(wire.as_slice());
        let first = dec.decode();
        let second = dec.decode();
        matches!(first, Err(Error::CommaExpected)) && matches!(second, Err(Error::CommaExpected))
    }
}

#[test]
fn mixed_encodings_decode_in_order() {
    let mut enc = Encoder::new(Vec::new());
    enc.encode(Key::NONE, "text").unwrap();
    enc.encode(b'i', -42i32).unwrap();
    enc.encode(b'u', 42u64).unwrap();
    enc.encode(b'f', 2.5f64).unwrap();
    enc.encode(b'b', true).unwrap();
    enc.encode(b'r', b'\x00').unwrap();
    enc.encode(b'c', 'ß').unwrap();
    enc.encode_bytes(b'p', &[&b"two "[..], &b"parts"[..]]).unwrap();
    let wire = enc.into_inner();

    let mut dec = Decoder::new(wire.as_slice());
    assert_eq!(dec.decode().unwrap().as_ref(), b"text");
    let expect: [(u8, &[u8]); 7] = [
        (b'i', b"-42"),
        (b'u', b"42"),
        (b'f', b"2.5"),
        (b'b', b"T"),
        (b'r', b"\x00"),
        (b'c', "ß".as_bytes()),
        (b'p', b"two parts"),
    ];
    for (key, value) in expect {
        let (got_key, got) = dec.decode_keyed().unwrap();
        assert_eq!(got_key, Key::new(key));
        assert_eq!(got.as_ref(), value);
    }
    assert!(dec.decode_keyed().unwrap_err().is_end_of_stream());
}
