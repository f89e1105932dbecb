//! Computes the exact number of bytes a value occupies once encoded.
//!
//! Every document, array and code-with-scope value is prefixed by its own length, so the
//! [`Writer`](crate::Writer) asks this module for that length before emitting the payload. The
//! functions here must agree byte for byte with what the writer produces.

use crate::{
    bson::{Bson, DbRef, JavaScriptCodeWithScope},
    descriptor::{ObjectDescriptor, Property},
    document::Document,
};

/// The `i32` length prefix of documents, arrays, strings and binary values.
const LENGTH_PREFIX: usize = 4;

/// The trailing `0x00` of documents, arrays and strings.
const TERMINATOR: usize = 1;

/// Size of a null-terminated string with no length prefix: its UTF-8 bytes plus the terminator.
pub fn cstring_size(s: &str) -> usize {
    s.len() + TERMINATOR
}

/// Size of a length-prefixed string: the prefix, its UTF-8 bytes and the terminator.
pub fn string_size(s: &str) -> usize {
    LENGTH_PREFIX + s.len() + TERMINATOR
}

/// Size of the value part of an element, excluding its type tag and key.
///
/// ```
/// use bson_codec::{calculate_size, doc, Bson};
///
/// assert_eq!(calculate_size(&Bson::Null), 0);
/// assert_eq!(calculate_size(&Bson::from("test")), 9);
/// assert_eq!(calculate_size(&Bson::from(doc! { "test": "test" })), 20);
/// ```
pub fn calculate_size(value: &Bson) -> usize {
    match value {
        Bson::Null | Bson::MinKey | Bson::MaxKey => 0,
        Bson::Boolean(_) => 1,
        Bson::Int32(_) => 4,
        Bson::Int64(_) | Bson::DateTime(_) | Bson::Timestamp(_) | Bson::Double(_) => 8,
        Bson::ObjectId(_) => 12,
        Bson::String(s) | Bson::JavaScriptCode(s) | Bson::Symbol(s) => string_size(s),
        Bson::Document(doc) => document_size(doc),
        Bson::DbRef(dbref) => db_ref_size(dbref),
        Bson::Array(values) => array_size(values),
        Bson::Binary(binary) => LENGTH_PREFIX + 1 + binary.wire_len(),
        Bson::RegularExpression(regex) => {
            cstring_size(&regex.pattern) + cstring_size(&regex.options)
        }
        Bson::JavaScriptCodeWithScope(code_w_scope) => code_with_scope_size(code_w_scope),
    }
}

/// Size of an encoded document, including its length prefix and terminator.
pub fn document_size(doc: &Document) -> usize {
    descriptor_size(doc)
}

/// Size of an encoded array, whose keys are the positional indices `"0"`, `"1"`, ...
pub fn array_size(values: &[Bson]) -> usize {
    descriptor_size(values)
}

fn db_ref_size(dbref: &DbRef) -> usize {
    descriptor_size(dbref)
}

fn code_with_scope_size(code_w_scope: &JavaScriptCodeWithScope) -> usize {
    LENGTH_PREFIX + string_size(&code_w_scope.code) + document_size(&code_w_scope.scope)
}

/// Size of the document an [`ObjectDescriptor`] would be written as.
pub fn descriptor_size<D: ObjectDescriptor + ?Sized>(object: &D) -> usize {
    properties_size(&object.properties())
}

pub(crate) fn properties_size(properties: &[Property<'_>]) -> usize {
    let elements: usize = properties
        .iter()
        .map(|property| 1 + cstring_size(&property.name) + calculate_size(&property.value))
        .sum();
    LENGTH_PREFIX + elements + TERMINATOR
}
