//! ObjectId

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
    sync::{
        LazyLock,
        atomic::{AtomicU32, Ordering},
    },
    time::SystemTime,
};

use crate::error::{Error, Result};

const TIMESTAMP_SIZE: usize = 4;
const MACHINE_ID_SIZE: usize = 3;
const PROCESS_ID_SIZE: usize = 2;
const PROCESS_UNIQUE_SIZE: usize = MACHINE_ID_SIZE + PROCESS_ID_SIZE;
const COUNTER_SIZE: usize = 3;

const TIMESTAMP_OFFSET: usize = 0;
const PROCESS_UNIQUE_OFFSET: usize = TIMESTAMP_OFFSET + TIMESTAMP_SIZE;
const COUNTER_OFFSET: usize = PROCESS_UNIQUE_OFFSET + PROCESS_UNIQUE_SIZE;

const MAX_U24: u32 = 0xFF_FFFF;

static DEFAULT_GENERATOR: LazyLock<ObjectIdGenerator> = LazyLock::new(ObjectIdGenerator::new);

/// A wrapper around a raw 12-byte ObjectId.
///
/// The layout is a 4-byte big-endian timestamp (seconds since the Unix epoch), a 5-byte
/// machine and process identifier, and a 3-byte big-endian counter. Equality and ordering
/// compare the 12 bytes lexicographically.
///
/// ```
/// use bson_codec::oid::ObjectId;
///
/// let oid = ObjectId::parse_str("4a7067c30a57000000008ecb")?;
/// assert_eq!(oid.to_hex(), "4a7067c30a57000000008ecb");
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ObjectId {
    id: [u8; 12],
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self { id: bytes }
    }
}

impl ObjectId {
    /// Generates a new [`ObjectId`] from the process-wide generator.
    /// See the [docs](http://www.mongodb.com/docs/manual/reference/object-id/)
    /// for more information.
    pub fn new() -> ObjectId {
        DEFAULT_GENERATOR.generate()
    }

    /// Constructs a new ObjectId wrapper around the raw byte representation.
    pub const fn from_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId { id: bytes }
    }

    /// Constructs an [`ObjectId`] from a raw buffer, which must be exactly 12 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<ObjectId> {
        let id: [u8; 12] = bytes
            .try_into()
            .map_err(|_| Error::oid_invalid_byte_length(bytes.len()))?;
        Ok(Self::from_bytes(id))
    }

    /// Construct an `ObjectId` from its parts.
    pub fn from_parts(seconds_since_epoch: u32, process_unique: [u8; 5], counter: [u8; 3]) -> Self {
        let mut bytes = [0; 12];

        bytes[TIMESTAMP_OFFSET..(TIMESTAMP_OFFSET + TIMESTAMP_SIZE)]
            .clone_from_slice(&u32::to_be_bytes(seconds_since_epoch));
        bytes[PROCESS_UNIQUE_OFFSET..(PROCESS_UNIQUE_OFFSET + PROCESS_UNIQUE_SIZE)]
            .clone_from_slice(&process_unique);
        bytes[COUNTER_OFFSET..(COUNTER_OFFSET + COUNTER_SIZE)].clone_from_slice(&counter);

        Self::from_bytes(bytes)
    }

    /// Creates an ObjectID using a 12-byte (24-char) hexadecimal string.
    pub fn parse_str(s: impl AsRef<str>) -> Result<ObjectId> {
        let s = s.as_ref();
        if s.len() != 24 {
            return Err(Error::oid_invalid_length(s.len()));
        }

        let mut buf = [0u8; 12];
        hex::decode_to_slice(s.as_bytes(), &mut buf)
            .map_err(|e| Error::from_hex_error(e, s.len()))?;
        Ok(ObjectId::from_bytes(buf))
    }

    /// Retrieves the instant the ObjectId was created at, to second precision.
    pub fn timestamp(&self) -> crate::DateTime {
        let mut buf = [0; 4];
        buf.copy_from_slice(&self.id[TIMESTAMP_OFFSET..(TIMESTAMP_OFFSET + TIMESTAMP_SIZE)]);
        let seconds_since_epoch = u32::from_be_bytes(buf);

        crate::DateTime::from_millis(i64::from(seconds_since_epoch) * 1000)
    }

    /// Retrieves the 5-byte machine and process identifier.
    pub fn process_unique(&self) -> [u8; 5] {
        let mut buf = [0; PROCESS_UNIQUE_SIZE];
        buf.copy_from_slice(
            &self.id[PROCESS_UNIQUE_OFFSET..(PROCESS_UNIQUE_OFFSET + PROCESS_UNIQUE_SIZE)],
        );
        buf
    }

    /// Retrieves the 24-bit counter.
    pub fn counter(&self) -> u32 {
        let mut buf = [0; 4];
        buf[1..].copy_from_slice(&self.id[COUNTER_OFFSET..(COUNTER_OFFSET + COUNTER_SIZE)]);
        u32::from_be_bytes(buf)
    }

    /// Returns the raw byte representation of an ObjectId.
    pub const fn bytes(&self) -> [u8; 12] {
        self.id
    }

    /// Convert this [`ObjectId`] to its hex string representation.
    pub fn to_hex(self) -> String {
        hex::encode(self.id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.to_hex()).finish()
    }
}

/// Produces [`ObjectId`]s sharing one machine and process identifier and one counter.
///
/// The counter starts at a random 24-bit value and every call to
/// [`ObjectIdGenerator::generate`] takes the next value atomically, wrapping back to zero
/// after `0xFFFFFF`. A generator can be shared between threads by reference.
#[derive(Debug)]
pub struct ObjectIdGenerator {
    process_unique: [u8; PROCESS_UNIQUE_SIZE],
    counter: AtomicU32,
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectIdGenerator {
    /// Creates a generator whose counter is seeded from a random starting point.
    pub fn new() -> Self {
        let start = rand::random::<u32>() & MAX_U24;
        tracing::debug!(counter_start = start, "seeded ObjectId generator");
        Self::with_counter(start)
    }

    /// Creates a generator whose next counter value is `start` (masked to 24 bits).
    pub fn with_counter(start: u32) -> Self {
        Self {
            process_unique: process_unique(),
            counter: AtomicU32::new(start & MAX_U24),
        }
    }

    /// The 5-byte machine and process identifier embedded in every generated id.
    pub fn process_unique(&self) -> [u8; 5] {
        self.process_unique
    }

    /// Generates the next [`ObjectId`] stamped with the current wall-clock second.
    pub fn generate(&self) -> ObjectId {
        let seconds = match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
            Ok(d) => d.as_secs() as u32,
            Err(_) => 0,
        };
        ObjectId::from_parts(seconds, self.process_unique, self.next_count())
    }

    // Gets an incremental 3-byte count.
    // Represented in Big Endian.
    fn next_count(&self) -> [u8; 3] {
        // u32 wraps at a multiple of 2^24, so masking keeps the sequence contiguous
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & MAX_U24;
        let bytes = count.to_be_bytes();
        [bytes[1], bytes[2], bytes[3]]
    }
}

// 3 bytes of a hash of the host name followed by the low 2 bytes of the process id, little
// endian. Falls back to random machine bytes when no host name is available.
fn process_unique() -> [u8; PROCESS_UNIQUE_SIZE] {
    let mut buf = [0; PROCESS_UNIQUE_SIZE];

    let machine = match hostname() {
        Some(name) => {
            let mut hasher = DefaultHasher::new();
            name.hash(&mut hasher);
            hasher.finish().to_be_bytes()
        }
        None => rand::random::<u64>().to_be_bytes(),
    };
    buf[..MACHINE_ID_SIZE].copy_from_slice(&machine[..MACHINE_ID_SIZE]);

    let pid = std::process::id() as u16;
    buf[MACHINE_ID_SIZE..].copy_from_slice(&pid.to_le_bytes());
    buf
}

fn hostname() -> Option<String> {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
}

#[cfg(feature = "serde")]
impl serde::Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ObjectId::parse_str(&s).map_err(serde::de::Error::custom)
    }
}
