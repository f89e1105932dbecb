//! The seam between the [`Writer`](crate::Writer) and whatever in-memory shape a caller encodes.
//!
//! The writer never inspects the object it is handed directly. It asks an [`ObjectDescriptor`]
//! whether the object is a document or an array and for its ordered list of properties, and
//! calls the descriptor's hooks around each object and property as it writes them. A mapping
//! layer can implement the trait for its own types to rename, skip or reorder fields.

use std::borrow::Cow;

use crate::{
    bson::{Bson, DbRef},
    document::Document,
};

/// Whether an object is written as an embedded document or as an array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    /// Written under [`ElementType::EmbeddedDocument`](crate::spec::ElementType::EmbeddedDocument).
    Object,

    /// Written under [`ElementType::Array`](crate::spec::ElementType::Array) with positional keys.
    Array,
}

/// A single named value reported by an [`ObjectDescriptor`].
#[derive(Clone, Debug, PartialEq)]
pub struct Property<'a> {
    /// The key the value is written under.
    pub name: Cow<'a, str>,

    /// The value.
    pub value: Cow<'a, Bson>,
}

impl<'a> Property<'a> {
    /// A property that borrows both its name and its value.
    pub fn borrowed(name: &'a str, value: &'a Bson) -> Self {
        Self {
            name: Cow::Borrowed(name),
            value: Cow::Borrowed(value),
        }
    }

    /// A property that owns both its name and its value.
    pub fn owned(name: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            value: Cow::Owned(value.into()),
        }
    }
}

/// Describes an object to the [`Writer`](crate::Writer) as an ordered list of properties.
///
/// The hooks default to doing nothing. They are called in the order
/// `begin_object`, then `begin_property`/`end_property` around each property, then `end_object`.
///
/// ```
/// use bson_codec::{ObjectDescriptor, Property, Writer, doc, encode_to_vec};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl ObjectDescriptor for Point {
///     fn properties(&self) -> Vec<Property<'_>> {
///         vec![Property::owned("x", self.x), Property::owned("y", self.y)]
///     }
/// }
///
/// let mut bytes = Vec::new();
/// Writer::new(&mut bytes).write_object(&Point { x: 1, y: 2 })?;
/// assert_eq!(bytes, encode_to_vec(&doc! { "x": 1, "y": 2 })?);
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
pub trait ObjectDescriptor {
    /// Whether this object is a document or an array.
    fn kind(&self) -> ObjectKind {
        ObjectKind::Object
    }

    /// The properties to write, in order.
    fn properties(&self) -> Vec<Property<'_>>;

    /// Called before the length prefix of this object is written.
    fn begin_object(&self) {}

    /// Called after the terminator of this object is written.
    fn end_object(&self) {}

    /// Called before the type tag of `property` is written.
    fn begin_property(&self, _property: &Property<'_>) {}

    /// Called after the value of `property` is written.
    fn end_property(&self, _property: &Property<'_>) {}
}

impl ObjectDescriptor for Document {
    fn properties(&self) -> Vec<Property<'_>> {
        self.iter()
            .map(|(key, value)| Property::borrowed(key, value))
            .collect()
    }
}

impl ObjectDescriptor for [Bson] {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Array
    }

    fn properties(&self) -> Vec<Property<'_>> {
        self.iter()
            .enumerate()
            .map(|(index, value)| Property {
                name: Cow::Owned(index.to_string()),
                value: Cow::Borrowed(value),
            })
            .collect()
    }
}

impl ObjectDescriptor for Vec<Bson> {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Array
    }

    fn properties(&self) -> Vec<Property<'_>> {
        self.as_slice().properties()
    }
}

impl ObjectDescriptor for DbRef {
    fn properties(&self) -> Vec<Property<'_>> {
        vec![
            Property {
                name: Cow::Borrowed(DbRef::REF_KEY),
                value: Cow::Owned(Bson::String(self.collection.clone())),
            },
            Property {
                name: Cow::Borrowed(DbRef::ID_KEY),
                value: Cow::Borrowed(self.id.as_ref()),
            },
        ]
    }
}
