//! The seam between the [`Reader`](crate::Reader) and whatever in-memory shape a caller decodes
//! into.

use crate::{
    DateTime,
    bson::{Bson, DbRef},
    document::Document,
    error::{Error, Result},
};

/// The fewest bytes an array element can occupy: a tag, a one digit key and its terminator.
const MIN_ELEMENT_SIZE: usize = 3;

/// The length prefix and terminator of an empty document.
const EMPTY_DOCUMENT_SIZE: usize = 5;

/// Receives the structure of a document from the [`Reader`](crate::Reader) as it is parsed.
///
/// For every embedded document or array the reader calls [`begin_object`](Self::begin_object)
/// or [`begin_array`](Self::begin_array), then `begin_property`/`end_property` once per element
/// in wire order, then the matching `end_` method, whose result becomes the value of the
/// enclosing property (or the result of the read, for the root document).
///
/// Scalar values reach the builder already decoded as [`Bson`] and converted into
/// [`ObjectBuilder::Value`].
pub trait ObjectBuilder {
    /// The in-progress representation of a document or array.
    type Object;

    /// The finished representation of any value.
    type Value: From<Bson>;

    /// Starts a new embedded document.
    fn begin_object(&mut self) -> Self::Object;

    /// Finishes an embedded document.
    fn end_object(&mut self, object: Self::Object) -> Result<Self::Value>;

    /// Starts a new array.
    fn begin_array(&mut self) -> Self::Object;

    /// Finishes an array. `encoded_len` is the array's length prefix as read from the wire.
    fn end_array(&mut self, array: Self::Object, encoded_len: usize) -> Result<Self::Value>;

    /// Called after a key has been read, before its value is.
    fn begin_property(&mut self, _object: &mut Self::Object, _name: &str) {}

    /// Adds a fully decoded value to `object` under `name`.
    fn end_property(
        &mut self,
        object: &mut Self::Object,
        name: &str,
        value: Self::Value,
    ) -> Result<()>;

    /// Converts a decoded datetime. `local` is set when the reader was configured with
    /// [`CodecOptions::local_time`](crate::CodecOptions::local_time).
    fn datetime(&mut self, dt: DateTime, _local: bool) -> Self::Value {
        Bson::DateTime(dt).into()
    }
}

/// The default [`ObjectBuilder`], which produces [`Document`]s and [`Bson`] arrays.
///
/// Documents consisting of exactly a string `$ref` followed by `$id` become [`Bson::DbRef`].
///
/// Arrays are rebuilt from their positional keys. A missing index is filled with
/// [`Bson::Null`], so the keys `"0"` and `"2"` produce a three element array whose middle
/// element is null. A key that is not a non-negative integer, or whose index could not fit
/// in an array of the encoded length, is a malformed value.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentBuilder;

impl DocumentBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self
    }
}

impl ObjectBuilder for DocumentBuilder {
    type Object = Document;
    type Value = Bson;

    fn begin_object(&mut self) -> Document {
        Document::new()
    }

    fn end_object(&mut self, object: Document) -> Result<Bson> {
        Ok(match DbRef::from_document(&object) {
            Some(dbref) => Bson::DbRef(dbref),
            None => Bson::Document(object),
        })
    }

    fn begin_array(&mut self) -> Document {
        Document::new()
    }

    fn end_array(&mut self, array: Document, encoded_len: usize) -> Result<Bson> {
        let capacity = encoded_len.saturating_sub(EMPTY_DOCUMENT_SIZE) / MIN_ELEMENT_SIZE;
        let mut values: Vec<Bson> = Vec::with_capacity(array.len());

        for (key, value) in array {
            let index: usize = match key.parse() {
                Ok(index) if index < capacity => index,
                _ => {
                    return Err(
                        Error::malformed_value(format!("invalid array index {key:?}")).with_key(key),
                    );
                }
            };

            if index != values.len() {
                tracing::debug!(key, expected = values.len(), "array keys are not contiguous");
            }
            if index >= values.len() {
                values.resize(index + 1, Bson::Null);
            }
            values[index] = value;
        }

        Ok(Bson::Array(values))
    }

    fn end_property(&mut self, object: &mut Document, name: &str, value: Bson) -> Result<()> {
        object.insert(name, value);
        Ok(())
    }
}
