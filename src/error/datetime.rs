use thiserror::Error as ThisError;

use crate::error::{Error, ErrorKind};

/// The kinds of errors that can occur when working with the [`DateTime`](crate::DateTime) type.
#[derive(Clone, Debug, ThisError)]
#[non_exhaustive]
pub enum DateTimeErrorKind {
    /// The `DateTime` could not be formatted.
    #[error("{message}")]
    #[non_exhaustive]
    CannotFormat {
        /// A message describing the error.
        message: String,
    },

    /// An invalid value was provided.
    #[error("{message}")]
    #[non_exhaustive]
    InvalidValue {
        /// A message describing the error.
        message: String,
    },

    /// The local UTC offset could not be determined.
    #[error("the local UTC offset could not be determined")]
    IndeterminateOffset,
}

impl Error {
    pub(crate) fn invalid_datetime_value(message: impl ToString) -> Self {
        ErrorKind::DateTime {
            kind: DateTimeErrorKind::InvalidValue {
                message: message.to_string(),
            },
        }
        .into()
    }

    pub(crate) fn cannot_format_datetime(message: impl ToString) -> Self {
        ErrorKind::DateTime {
            kind: DateTimeErrorKind::CannotFormat {
                message: message.to_string(),
            },
        }
        .into()
    }

    pub(crate) fn indeterminate_offset() -> Self {
        ErrorKind::DateTime {
            kind: DateTimeErrorKind::IndeterminateOffset,
        }
        .into()
    }
}
