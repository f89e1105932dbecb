use thiserror::Error as ThisError;

use crate::{
    error::{Error, ErrorKind},
    spec::ElementType,
};

/// Why a typed getter on a [`Document`](crate::Document) could not return a value.
#[derive(Clone, Debug, ThisError)]
#[non_exhaustive]
pub enum ValueAccessErrorKind {
    /// The document has no such key.
    #[error("the key was not present in the document")]
    NotPresent,

    /// The key holds a value of another type.
    #[error("expected type {expected:?}, got type {actual:?}")]
    #[non_exhaustive]
    UnexpectedType {
        /// The type stored under the key.
        actual: ElementType,

        /// The type the getter returns.
        expected: ElementType,
    },
}

impl From<ValueAccessErrorKind> for Error {
    fn from(kind: ValueAccessErrorKind) -> Self {
        ErrorKind::ValueAccess { kind }.into()
    }
}

impl Error {
    pub(crate) fn value_access_not_present() -> Self {
        ValueAccessErrorKind::NotPresent.into()
    }

    pub(crate) fn value_access_unexpected_type(actual: ElementType, expected: ElementType) -> Self {
        ValueAccessErrorKind::UnexpectedType { actual, expected }.into()
    }

    #[cfg(test)]
    fn value_access_kind(&self) -> Option<&ValueAccessErrorKind> {
        match &self.kind {
            ErrorKind::ValueAccess { kind } => Some(kind),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_value_access_not_present(&self) -> bool {
        matches!(self.value_access_kind(), Some(ValueAccessErrorKind::NotPresent))
    }

    #[cfg(test)]
    pub(crate) fn is_value_access_unexpected_type(&self) -> bool {
        matches!(
            self.value_access_kind(),
            Some(ValueAccessErrorKind::UnexpectedType { .. })
        )
    }
}
