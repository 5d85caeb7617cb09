/// Largest value length a netstring may declare.
///
/// Slightly less than 2^30, so a length always fits a 32-bit counter. The djb netstring
/// description suggests the same bound.
pub const MAXIMUM_LENGTH: usize = 999_999_999;

/// Default size of the decoder's staging buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024;

/// Configuration shared by the encoder, decoder and codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Maximum value length in bytes, key byte included. Clamped to [`MAXIMUM_LENGTH`].
    pub max_length: usize,
    /// Bytes requested from the source per read. Zero is treated as one.
    pub read_buffer_size: usize,
}

impl CodecConfig {
    /// The length limit actually enforced.
    pub fn effective_max_length(&self) -> usize {
        self.max_length.min(MAXIMUM_LENGTH)
    }

    pub(crate) fn effective_read_buffer_size(&self) -> usize {
        self.read_buffer_size.max(1)
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_length: MAXIMUM_LENGTH,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}
