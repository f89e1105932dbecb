//! Contains the error-related types for the `bson-codec` crate.

mod datetime;
mod oid;
mod value_access;

use thiserror::Error;

pub use datetime::DateTimeErrorKind;
pub use oid::ObjectIdErrorKind;
pub use value_access::ValueAccessErrorKind;

/// The result type for all methods that can return an error in the `bson-codec` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `bson-codec` crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// The codec phase the error was raised in, if any.
    pub phase: Option<Phase>,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The absolute byte offset in the stream associated with the error, if any.
    pub offset: Option<u64>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(phase) = self.phase {
            write!(f, "{phase} failed")?;
            if let Some(key) = self.key.as_deref() {
                write!(f, " at key \"{key}\"")?;
            }
            if let Some(offset) = self.offset {
                write!(f, " (byte offset {offset})")?;
            }
            write!(f, ": ")?;
        } else if let Some(key) = self.key.as_deref() {
            write!(f, "Error at key \"{key}\": ")?;
        }

        write!(f, "{}", self.kind)
    }
}

/// The stage of the codec an error originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Phase {
    /// Computing the encoded length of a document before writing it.
    SizeCalculation,

    /// Writing encoded bytes to the output stream.
    Write,

    /// Parsing bytes from the input stream.
    Read,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::SizeCalculation => "size calculation",
            Phase::Write => "write",
            Phase::Read => "read",
        })
    }
}

/// The types of errors that can occur in the `bson-codec` crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A [`std::io::Error`] occurred.
    #[error("An IO error occurred: {0}")]
    Io(std::io::Error),

    /// The encoded document would exceed the configured maximum document size.
    #[error("document size {size} exceeds the maximum of {max} bytes")]
    #[non_exhaustive]
    DocumentTooLarge {
        /// The computed encoded size of the document.
        size: usize,

        /// The configured maximum.
        max: usize,
    },

    /// A key or regular expression field could not be written as a null-terminated string.
    #[error("Invalid cstring: {message}")]
    #[non_exhaustive]
    InvalidCString { message: String },

    /// Malformed BSON bytes were encountered.
    #[error("Malformed BSON: {message}")]
    #[non_exhaustive]
    MalformedValue { message: String },

    /// An element type tag with no mapping to a [`Bson`](crate::Bson) value was encountered.
    #[error("unrecognized element type {tag:#04x}")]
    #[non_exhaustive]
    UnrecognizedElementType { tag: u8 },

    /// Invalid UTF-8 bytes were encountered.
    #[error("Invalid UTF-8")]
    Utf8Encoding,

    /// An error related to the [`ObjectId`](crate::oid::ObjectId) type occurred.
    #[error("An ObjectId-related error occurred: {kind}")]
    #[non_exhaustive]
    ObjectId {
        /// The kind of error that occurred.
        kind: ObjectIdErrorKind,
    },

    /// An error related to the [`DateTime`](crate::DateTime) type occurred.
    #[error("A DateTime-related error occurred: {kind}")]
    #[non_exhaustive]
    DateTime {
        /// The kind of error that occurred.
        kind: DateTimeErrorKind,
    },

    /// An error occurred when attempting to access a value in a document.
    #[error("An error occurred when attempting to access a document value: {kind}")]
    #[non_exhaustive]
    ValueAccess {
        /// The kind of error that occurred.
        kind: ValueAccessErrorKind,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            phase: None,
            key: None,
            offset: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        ErrorKind::Io(value).into()
    }
}

impl Error {
    /// Whether this error means the input was not valid BSON, as opposed to a transport failure.
    ///
    /// Callers may retry on [`Error::is_io`] errors but should not retry parse failures.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::MalformedValue { .. }
                | ErrorKind::UnrecognizedElementType { .. }
                | ErrorKind::Utf8Encoding
        )
    }

    /// Whether this error wraps an IO error from the underlying stream.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io(_))
    }

    pub(crate) fn with_phase(mut self, phase: Phase) -> Self {
        self.phase.get_or_insert(phase);
        self
    }

    /// Attaches `key` unless a more specific (deeper) key was already recorded.
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        if self.key.is_none() {
            self.key = Some(key.into());
        }
        self
    }

    pub(crate) fn with_offset(mut self, offset: u64) -> Self {
        self.offset.get_or_insert(offset);
        self
    }

    pub(crate) fn malformed_value(message: impl ToString) -> Self {
        ErrorKind::MalformedValue {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn truncated() -> Self {
        Self::malformed_value("unexpected end of stream")
    }

    pub(crate) fn unrecognized_element_type(tag: u8) -> Self {
        ErrorKind::UnrecognizedElementType { tag }.into()
    }

    pub(crate) fn utf8_encoding() -> Self {
        ErrorKind::Utf8Encoding.into()
    }

    pub(crate) fn invalid_cstring(message: impl ToString) -> Self {
        ErrorKind::InvalidCString {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn document_too_large(size: usize, max: usize) -> Self {
        Error::from(ErrorKind::DocumentTooLarge { size, max }).with_phase(Phase::SizeCalculation)
    }

    #[cfg(test)]
    pub(crate) fn is_malformed_value(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedValue { .. })
    }
}
