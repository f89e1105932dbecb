//! Configuration shared by the [`Reader`](crate::Reader) and [`Writer`](crate::Writer).

/// The largest encoded document, in bytes, accepted by default.
pub const MAX_DOCUMENT_SIZE: usize = 4 * 1024 * 1024;

/// The default size of the scratch buffer used for string encoding and decoding.
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// The smallest scratch buffer allowed; it must hold one full UTF-8 code point.
pub const MIN_BUFFER_SIZE: usize = 4;

/// Options controlling how documents are encoded and decoded.
///
/// ```
/// use bson_codec::CodecOptions;
///
/// let options = CodecOptions::builder()
///     .max_document_size(1024)
///     .buffer_size(64)
///     .build();
/// assert_eq!(options.max_document_size(), 1024);
/// assert_eq!(options.buffer_size(), 64);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct CodecOptions {
    max_document_size: usize,
    buffer_size: usize,
    local_time: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_document_size: MAX_DOCUMENT_SIZE,
            buffer_size: DEFAULT_BUFFER_SIZE,
            local_time: false,
        }
    }
}

impl CodecOptions {
    /// Create a builder used to construct a new [`CodecOptions`].
    pub fn builder() -> CodecOptionsBuilder {
        CodecOptionsBuilder {
            options: Default::default(),
        }
    }

    /// Documents whose encoded size is greater than or equal to this value are rejected.
    pub fn max_document_size(&self) -> usize {
        self.max_document_size
    }

    /// The size of the string scratch buffer, in bytes.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Whether decoded datetimes are handed to the builder as local time.
    pub fn local_time(&self) -> bool {
        self.local_time
    }

    /// The number of characters written per buffer fill. A UTF-8 character is at most four
    /// bytes, so a chunk of this many characters always fits in the buffer.
    pub(crate) fn chars_per_chunk(&self) -> usize {
        self.buffer_size / 4
    }
}

/// A builder used to construct new [`CodecOptions`] structs.
#[derive(Clone, Debug)]
pub struct CodecOptionsBuilder {
    options: CodecOptions,
}

impl CodecOptionsBuilder {
    /// Set the maximum encoded document size.
    pub fn max_document_size(mut self, value: usize) -> Self {
        self.options.max_document_size = value;
        self
    }

    /// Set the string scratch buffer size. Values below [`MIN_BUFFER_SIZE`] are raised to it.
    pub fn buffer_size(mut self, value: usize) -> Self {
        self.options.buffer_size = value.max(MIN_BUFFER_SIZE);
        self
    }

    /// Set whether decoded datetimes are handed to the builder as local time.
    pub fn local_time(mut self, value: bool) -> Self {
        self.options.local_time = value;
        self
    }

    /// Consume this builder and produce a [`CodecOptions`].
    pub fn build(self) -> CodecOptions {
        self.options
    }
}
