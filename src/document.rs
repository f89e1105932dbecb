//! The ordered key-value container the codec reads into and writes from.

use std::{
    fmt::{self, Debug, Display, Formatter},
    io::{Read, Write},
};

use ahash::RandomState;
use indexmap::IndexMap;

use crate::{
    Binary,
    DateTime,
    bson::{Array, Bson, Timestamp},
    error::{Error, Result},
    oid::ObjectId,
    reader::Reader,
    spec::{BinarySubtype, ElementType},
    writer::Writer,
};

/// Borrowing iterator over the entries of a [`Document`] in insertion order.
pub type Iter<'a> = indexmap::map::Iter<'a, String, Bson>;

/// Owning iterator over the entries of a [`Document`] in insertion order.
pub type IntoIter = indexmap::map::IntoIter<String, Bson>;

/// Iterator over the keys of a [`Document`].
pub type Keys<'a> = indexmap::map::Keys<'a, String, Bson>;

/// Iterator over the values of a [`Document`].
pub type Values<'a> = indexmap::map::Values<'a, String, Bson>;

/// An ordered map from unique string keys to [`Bson`] values.
///
/// Iteration, encoding and [`Display`] all follow insertion order. Replacing the value of an
/// existing key leaves the key where it was; removing a key shifts the ones after it down.
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    inner: IndexMap<String, Bson, RandomState>,
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        if self.is_empty() {
            return fmt.write_str("{}");
        }

        fmt.write_str("{ ")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                fmt.write_str(", ")?;
            }
            write!(fmt, "\"{key}\": {value}")?;
        }
        fmt.write_str(" }")
    }
}

impl Debug for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.debug_tuple("Document").field(&self.inner).finish()
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = IntoIter;

    fn into_iter(self) -> IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Bson);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.inner.iter()
    }
}

impl FromIterator<(String, Bson)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Bson)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (key, value) in iter {
            doc.insert(key, value);
        }
        doc
    }
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        self.inner.iter()
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> Keys<'_> {
        self.inner.keys()
    }

    /// Iterates over the values in insertion order.
    pub fn values(&self) -> Values<'_> {
        self.inner.values()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&Bson> {
        self.inner.get(key.as_ref())
    }

    /// Sets `key` to `value`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Bson>) -> Option<Bson> {
        self.inner.insert(key.into(), value.into())
    }

    /// Removes `key`, keeping the relative order of the remaining entries.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Bson> {
        self.inner.shift_remove(key.as_ref())
    }

    /// Looks up `key` for in-place insertion.
    pub fn entry(&mut self, key: impl Into<String>) -> Entry<'_> {
        Entry {
            inner: self.inner.entry(key.into()),
        }
    }

    /// Looks up `key` and projects it with `f`, reporting a missing key or a value of any type
    /// other than `expected` as a value access error carrying the key.
    fn get_typed<'a, T>(
        &'a self,
        key: impl AsRef<str>,
        expected: ElementType,
        f: impl FnOnce(&'a Bson) -> Option<T>,
    ) -> Result<T> {
        let key = key.as_ref();
        let value = self
            .get(key)
            .ok_or_else(|| Error::value_access_not_present().with_key(key))?;
        f(value).ok_or_else(|| {
            Error::value_access_unexpected_type(value.element_type(), expected).with_key(key)
        })
    }

    pub fn get_f64(&self, key: impl AsRef<str>) -> Result<f64> {
        self.get_typed(key, ElementType::Double, Bson::as_f64)
    }

    pub fn get_str(&self, key: impl AsRef<str>) -> Result<&str> {
        self.get_typed(key, ElementType::String, Bson::as_str)
    }

    pub fn get_array(&self, key: impl AsRef<str>) -> Result<&Array> {
        self.get_typed(key, ElementType::Array, Bson::as_array)
    }

    pub fn get_document(&self, key: impl AsRef<str>) -> Result<&Document> {
        self.get_typed(key, ElementType::EmbeddedDocument, Bson::as_document)
    }

    pub fn get_bool(&self, key: impl AsRef<str>) -> Result<bool> {
        self.get_typed(key, ElementType::Boolean, Bson::as_bool)
    }

    pub fn get_i32(&self, key: impl AsRef<str>) -> Result<i32> {
        self.get_typed(key, ElementType::Int32, Bson::as_i32)
    }

    pub fn get_i64(&self, key: impl AsRef<str>) -> Result<i64> {
        self.get_typed(key, ElementType::Int64, Bson::as_i64)
    }

    pub fn get_timestamp(&self, key: impl AsRef<str>) -> Result<Timestamp> {
        self.get_typed(key, ElementType::Timestamp, Bson::as_timestamp)
    }

    /// Returns the bytes of a [`BinarySubtype::Generic`] value. Other subtypes are reported as
    /// an unexpected type.
    pub fn get_binary_generic(&self, key: impl AsRef<str>) -> Result<&Vec<u8>> {
        self.get_typed(key, ElementType::Binary, |value| match value {
            Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            }) => Some(bytes),
            _ => None,
        })
    }

    pub fn get_object_id(&self, key: impl AsRef<str>) -> Result<ObjectId> {
        self.get_typed(key, ElementType::ObjectId, Bson::as_object_id)
    }

    pub fn get_datetime(&self, key: impl AsRef<str>) -> Result<&DateTime> {
        self.get_typed(key, ElementType::DateTime, Bson::as_datetime)
    }

    /// Encodes this document to `writer` with the default [`CodecOptions`](crate::CodecOptions).
    ///
    /// ```
    /// # fn main() -> bson_codec::error::Result<()> {
    /// use bson_codec::{doc, Document};
    ///
    /// let mut bytes = Vec::new();
    /// doc! { "x": 1 }.to_writer(&mut bytes)?;
    /// assert_eq!(Document::from_reader(&bytes[..])?, doc! { "x": 1 });
    /// # Ok(())
    /// # }
    /// ```
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        Writer::new(writer).write_document(self)
    }

    /// Decodes one document from `reader` with the default
    /// [`CodecOptions`](crate::CodecOptions).
    pub fn from_reader<R: Read>(reader: R) -> Result<Document> {
        Reader::new(reader).read_document()
    }
}

/// A key of a [`Document`] that may or may not hold a value yet.
pub struct Entry<'a> {
    inner: indexmap::map::Entry<'a, String, Bson>,
}

impl<'a> Entry<'a> {
    pub fn key(&self) -> &str {
        self.inner.key()
    }

    /// Returns the existing value, inserting `default` at the end first if there is none.
    pub fn or_insert(self, default: impl Into<Bson>) -> &'a mut Bson {
        self.inner.or_insert(default.into())
    }

    /// Like [`or_insert`](Self::or_insert), but only builds the default when it is needed.
    pub fn or_insert_with<F: FnOnce() -> Bson>(self, default: F) -> &'a mut Bson {
        self.inner.or_insert_with(default)
    }
}
