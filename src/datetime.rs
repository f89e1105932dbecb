//! The BSON UTC datetime and its conversions to and from the `time`, `chrono` and `std`
//! representations of an instant.

use std::{
    fmt,
    time::{Duration, SystemTime},
};

#[cfg(feature = "chrono-0_4")]
use chrono::{LocalResult, TimeZone, Utc};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::well_known::Rfc3339};

use crate::error::{Error, Result};

const NANOS_PER_MILLI: i128 = 1_000_000;

/// A BSON UTC datetime: signed milliseconds since 1970-01-01T00:00:00Z.
///
/// Conversions from finer-grained instants floor toward negative infinity, so 1.5ms before the
/// epoch is `-2` rather than `-1`. Instants beyond the `i64` range saturate to [`DateTime::MIN`]
/// or [`DateTime::MAX`].
///
/// The value carries no zone. Use [`DateTime::to_local`] for the local wall-clock view.
///
/// ```
/// use bson_codec::DateTime;
///
/// let dt = DateTime::from_millis(1_234);
/// let text = dt.try_to_rfc3339_string().unwrap();
/// assert_eq!(text, "1970-01-01T00:00:01.234Z");
/// assert_eq!(DateTime::parse_rfc3339_str(text).unwrap(), dt);
/// ```
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct DateTime(i64);

impl DateTime {
    pub const MAX: Self = Self(i64::MAX);

    pub const MIN: Self = Self(i64::MIN);

    pub const UNIX_EPOCH: Self = Self(0);

    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// The milliseconds since the epoch, as stored on the wire.
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    fn from_nanos(nanos: i128) -> Self {
        let millis = nanos.div_euclid(NANOS_PER_MILLI);
        match i64::try_from(millis) {
            Ok(millis) => Self(millis),
            Err(_) if millis < 0 => Self::MIN,
            Err(_) => Self::MAX,
        }
    }

    pub fn from_system_time(st: SystemTime) -> Self {
        let nanos = match st.duration_since(SystemTime::UNIX_EPOCH) {
            Ok(after) => after.as_nanos() as i128,
            Err(before) => -(before.duration().as_nanos() as i128),
        };
        Self::from_nanos(nanos)
    }

    pub fn to_system_time(self) -> SystemTime {
        let distance = Duration::from_millis(self.0.unsigned_abs());
        if self.0 < 0 {
            SystemTime::UNIX_EPOCH - distance
        } else {
            SystemTime::UNIX_EPOCH + distance
        }
    }

    pub fn from_time_0_3(dt: OffsetDateTime) -> Self {
        Self::from_nanos(dt.unix_timestamp_nanos())
    }

    /// The instant in UTC, clamped to the range `time` can represent.
    pub fn to_time_0_3(self) -> OffsetDateTime {
        self.to_time_opt().unwrap_or_else(|| {
            let edge = if self.0 < 0 {
                PrimitiveDateTime::MIN
            } else {
                PrimitiveDateTime::MAX
            };
            edge.assume_utc()
        })
    }

    fn to_time_opt(self) -> Option<OffsetDateTime> {
        OffsetDateTime::UNIX_EPOCH.checked_add(time::Duration::milliseconds(self.0))
    }

    /// The same instant expressed in the local UTC offset.
    ///
    /// Fails with [`DateTimeErrorKind::IndeterminateOffset`](crate::error::DateTimeErrorKind)
    /// when `time` refuses to read the offset, which it does on some platforms once the process
    /// is multi-threaded.
    pub fn to_local(self) -> Result<OffsetDateTime> {
        let offset = UtcOffset::current_local_offset().map_err(|_| Error::indeterminate_offset())?;
        self.in_offset(offset)
    }

    pub(crate) fn in_offset(self, offset: UtcOffset) -> Result<OffsetDateTime> {
        self.to_time_0_3().checked_to_offset(offset).ok_or_else(|| {
            Error::invalid_datetime_value(format!("{self} is out of range at offset {offset}"))
        })
    }

    pub fn try_to_rfc3339_string(self) -> Result<String> {
        let dt = self
            .to_time_opt()
            .ok_or_else(|| Error::cannot_format_datetime(format!("{} is out of range", self.0)))?;
        dt.format(&Rfc3339).map_err(Error::cannot_format_datetime)
    }

    pub fn parse_rfc3339_str(s: impl AsRef<str>) -> Result<Self> {
        OffsetDateTime::parse(s.as_ref(), &Rfc3339)
            .map(Self::from_time_0_3)
            .map_err(Error::invalid_datetime_value)
    }

    #[cfg(feature = "chrono-0_4")]
    pub fn from_chrono<T: TimeZone>(dt: chrono::DateTime<T>) -> Self {
        Self(dt.timestamp_millis())
    }

    /// The instant as a `chrono` UTC datetime, clamped to the range `chrono` can represent.
    #[cfg(feature = "chrono-0_4")]
    pub fn to_chrono(self) -> chrono::DateTime<Utc> {
        match Utc.timestamp_millis_opt(self.0) {
            LocalResult::Single(dt) => dt,
            _ if self.0 < 0 => chrono::DateTime::<Utc>::MIN_UTC,
            _ => chrono::DateTime::<Utc>::MAX_UTC,
        }
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_time_opt() {
            Some(dt) => f.debug_tuple("DateTime").field(&dt).finish(),
            None => f.debug_tuple("DateTime").field(&self.0).finish(),
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_time_opt() {
            Some(dt) => fmt::Display::fmt(&dt, f),
            None => fmt::Display::fmt(&self.0, f),
        }
    }
}

impl From<SystemTime> for DateTime {
    fn from(st: SystemTime) -> Self {
        Self::from_system_time(st)
    }
}

impl From<DateTime> for SystemTime {
    fn from(dt: DateTime) -> Self {
        dt.to_system_time()
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(dt: OffsetDateTime) -> Self {
        Self::from_time_0_3(dt)
    }
}

impl From<DateTime> for OffsetDateTime {
    fn from(dt: DateTime) -> Self {
        dt.to_time_0_3()
    }
}

#[cfg(feature = "chrono-0_4")]
impl<T: TimeZone> From<chrono::DateTime<T>> for DateTime {
    fn from(dt: chrono::DateTime<T>) -> Self {
        Self::from_chrono(dt)
    }
}

#[cfg(feature = "chrono-0_4")]
impl From<DateTime> for chrono::DateTime<Utc> {
    fn from(dt: DateTime) -> Self {
        dt.to_chrono()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DateTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for DateTime {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self)
    }
}
