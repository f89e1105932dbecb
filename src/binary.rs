use std::fmt::{self, Display};

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::spec::BinarySubtype;

/// Represents a BSON binary value.
///
/// Binary values of subtype [`BinarySubtype::General`] are written with a second length prefix
/// inside the payload, so they occupy `4 + 1 + 4 + bytes.len()` bytes on the wire instead of
/// `4 + 1 + bytes.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// The subtype of the bytes.
    pub subtype: BinarySubtype,

    /// The binary bytes.
    pub bytes: Vec<u8>,
}

impl Display for Binary {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Binary({:#x}, {})",
            u8::from(self.subtype),
            STANDARD.encode(&self.bytes)
        )
    }
}

impl Binary {
    /// Creates a [`Binary`] of subtype [`BinarySubtype::Generic`].
    pub fn generic(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype: BinarySubtype::Generic,
            bytes: bytes.into(),
        }
    }

    /// Length of the payload as it appears in the outer length prefix.
    pub(crate) fn wire_len(&self) -> usize {
        if self.subtype.has_inner_length() {
            self.bytes.len() + 4
        } else {
            self.bytes.len()
        }
    }

    /// Interprets the bytes as a UUID if this is a 16-byte [`BinarySubtype::Uuid`] value.
    pub fn to_uuid(&self) -> Option<uuid::Uuid> {
        if self.subtype != BinarySubtype::Uuid {
            return None;
        }
        uuid::Uuid::from_slice(&self.bytes).ok()
    }
}

impl From<uuid::Uuid> for Binary {
    fn from(uuid: uuid::Uuid) -> Self {
        Self {
            subtype: BinarySubtype::Uuid,
            bytes: uuid.as_bytes().to_vec(),
        }
    }
}
