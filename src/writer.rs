// The MIT License (MIT)

// Copyright (c) 2015 Y. T. Chung <zonyitoo@gmail.com>

// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Encoder

use std::io::Write;

use crate::{
    Binary,
    bson::{Bson, JavaScriptCodeWithScope, Regex},
    descriptor::{ObjectDescriptor, Property},
    document::Document,
    error::{Error, Phase, Result},
    options::CodecOptions,
    size,
};

/// Writes BSON documents to a byte stream.
///
/// The size of every document is computed before any of its bytes are written. A document
/// whose size reaches [`CodecOptions::max_document_size`], or that holds a key or regular
/// expression containing a `\0`, is rejected without touching the stream.
///
/// ```
/// use bson_codec::{Writer, doc};
///
/// let mut bytes = Vec::new();
/// Writer::new(&mut bytes).write_document(&doc! { "test": "test" })?;
/// assert_eq!(
///     bytes,
///     b"\x14\x00\x00\x00\x02test\x00\x05\x00\x00\x00test\x00\x00"
/// );
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
pub struct Writer<W> {
    inner: W,
    options: CodecOptions,
    buf: Vec<u8>,
}

impl<W: Write> Writer<W> {
    /// Creates a writer with the default [`CodecOptions`].
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, CodecOptions::default())
    }

    /// Creates a writer with the given options.
    pub fn with_options(inner: W, options: CodecOptions) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(options.buffer_size()),
            options,
        }
    }

    /// Unwraps the underlying stream.
    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes `doc` as a root document.
    pub fn write_document(&mut self, doc: &Document) -> Result<()> {
        self.write_object(doc)
    }

    /// Writes `values` as a root array, keyed `"0"`, `"1"`, ...
    pub fn write_array(&mut self, values: &[Bson]) -> Result<()> {
        self.write_object(values)
    }

    /// Writes the object described by `object` as a root document.
    pub fn write_object<D: ObjectDescriptor + ?Sized>(&mut self, object: &D) -> Result<()> {
        let properties = object.properties();
        let size = size::properties_size(&properties);
        self.check_size(size)?;
        check_properties(&properties).map_err(|e| e.with_phase(Phase::Write))?;

        tracing::trace!(size, kind = ?object.kind(), "writing document");
        self.write_properties(object, &properties, size)
            .map_err(|e| e.with_phase(Phase::Write))
    }

    /// Writes any value. Documents, arrays and references are written as root documents;
    /// anything else is written as a bare value with no type tag or key.
    pub fn write(&mut self, value: &Bson) -> Result<()> {
        match value {
            Bson::Document(doc) => self.write_object(doc),
            Bson::Array(values) => self.write_object(values.as_slice()),
            Bson::DbRef(dbref) => self.write_object(dbref),
            other => {
                self.check_size(size::calculate_size(other))?;
                check_value(other).map_err(|e| e.with_phase(Phase::Write))?;
                self.write_value(other).map_err(|e| e.with_phase(Phase::Write))
            }
        }
    }

    fn check_size(&self, size: usize) -> Result<()> {
        let max = self.options.max_document_size().min(i32::MAX as usize);
        if size >= max {
            tracing::debug!(size, max, "document exceeds the maximum size");
            return Err(Error::document_too_large(size, max));
        }
        Ok(())
    }

    fn write_properties<D: ObjectDescriptor + ?Sized>(
        &mut self,
        object: &D,
        properties: &[Property<'_>],
        size: usize,
    ) -> Result<()> {
        object.begin_object();
        self.write_i32(size as i32)?;
        for property in properties {
            object.begin_property(property);
            self.write_element(&property.name, &property.value)
                .map_err(|e| e.with_key(property.name.as_ref()))?;
            object.end_property(property);
        }
        self.write_u8(0)?;
        object.end_object();
        Ok(())
    }

    fn write_embedded<D: ObjectDescriptor + ?Sized>(&mut self, object: &D) -> Result<()> {
        let properties = object.properties();
        let size = size::properties_size(&properties);
        self.write_properties(object, &properties, size)
    }

    fn write_element(&mut self, key: &str, value: &Bson) -> Result<()> {
        self.write_u8(value.element_type() as u8)?;
        self.write_cstring(key)?;
        self.write_value(value)
    }

    fn write_value(&mut self, value: &Bson) -> Result<()> {
        match value {
            Bson::Double(v) => self.write_all(&v.to_le_bytes()),
            Bson::String(v) | Bson::JavaScriptCode(v) | Bson::Symbol(v) => self.write_string(v),
            Bson::Array(v) => self.write_embedded(v.as_slice()),
            Bson::Document(v) => self.write_embedded(v),
            Bson::DbRef(v) => self.write_embedded(v),
            Bson::Boolean(v) => self.write_u8(u8::from(*v)),
            Bson::RegularExpression(Regex { pattern, options }) => {
                self.write_cstring(pattern)?;
                self.write_cstring(options)
            }
            Bson::JavaScriptCodeWithScope(code_w_scope) => {
                let JavaScriptCodeWithScope { code, scope } = code_w_scope;
                self.write_i32(size::calculate_size(value) as i32)?;
                self.write_string(code)?;
                self.write_embedded(scope)
            }
            Bson::Int32(v) => self.write_i32(*v),
            Bson::Int64(v) => self.write_all(&v.to_le_bytes()),
            Bson::Timestamp(ts) => self.write_all(&ts.to_le_bytes()),
            Bson::Binary(binary) => self.write_binary(binary),
            Bson::ObjectId(id) => self.write_all(&id.bytes()),
            Bson::DateTime(dt) => self.write_all(&dt.timestamp_millis().to_le_bytes()),
            Bson::Null | Bson::MinKey | Bson::MaxKey => Ok(()),
        }
    }

    fn write_binary(&mut self, binary: &Binary) -> Result<()> {
        let Binary { subtype, bytes } = binary;
        self.write_i32(binary.wire_len() as i32)?;
        self.write_u8(u8::from(*subtype))?;
        if subtype.has_inner_length() {
            self.write_i32(bytes.len() as i32)?;
        }
        self.write_all(bytes)
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        self.write_i32(s.len() as i32 + 1)?;
        self.write_chunked(s)?;
        self.write_u8(0)
    }

    fn write_cstring(&mut self, s: &str) -> Result<()> {
        self.write_chunked(s)?;
        self.write_u8(0)
    }

    /// Copies `s` through the scratch buffer a bounded number of characters at a time, so no
    /// chunk ends inside a multi-byte character or overflows the buffer.
    fn write_chunked(&mut self, s: &str) -> Result<()> {
        let chars_per_chunk = self.options.chars_per_chunk();
        let mut rest = s;
        while !rest.is_empty() {
            let end = rest
                .char_indices()
                .nth(chars_per_chunk)
                .map_or(rest.len(), |(index, _)| index);
            let (chunk, tail) = rest.split_at(end);

            self.buf.clear();
            self.buf.extend_from_slice(chunk.as_bytes());
            self.inner.write_all(&self.buf)?;
            rest = tail;
        }
        Ok(())
    }

    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.write_all(&v.to_le_bytes())
    }

    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_all(&[v])
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes).map_err(Error::from)
    }
}

fn check_properties(properties: &[Property<'_>]) -> Result<()> {
    for property in properties {
        check_cstring(&property.name)
            .and_then(|_| check_value(&property.value))
            .map_err(|e| e.with_key(property.name.as_ref()))?;
    }
    Ok(())
}

fn check_document(doc: &Document) -> Result<()> {
    for (key, value) in doc {
        check_cstring(key)
            .and_then(|_| check_value(value))
            .map_err(|e| e.with_key(key.as_str()))?;
    }
    Ok(())
}

fn check_value(value: &Bson) -> Result<()> {
    match value {
        Bson::Document(doc) => check_document(doc),
        Bson::Array(values) => values.iter().try_for_each(check_value),
        Bson::DbRef(dbref) => check_value(&dbref.id),
        Bson::RegularExpression(Regex { pattern, options }) => {
            check_cstring(pattern)?;
            check_cstring(options)
        }
        Bson::JavaScriptCodeWithScope(code_w_scope) => check_document(&code_w_scope.scope),
        _ => Ok(()),
    }
}

fn check_cstring(s: &str) -> Result<()> {
    if s.contains('\0') {
        return Err(Error::invalid_cstring(format!(
            "cstring with interior null: {s:?}"
        )));
    }
    Ok(())
}

/// Attempt to encode a [`Document`] into a byte stream.
pub fn encode_document<W: Write>(writer: W, doc: &Document) -> Result<()> {
    Writer::new(writer).write_document(doc)
}

/// Encode a [`Document`] into a freshly allocated buffer.
///
/// ```
/// use bson_codec::{doc, encode_to_vec};
///
/// let bytes = encode_to_vec(&doc! { "a": 1 })?;
/// assert_eq!(bytes.len(), 12);
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
pub fn encode_to_vec(doc: &Document) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    encode_document(&mut bytes, doc)?;
    Ok(bytes)
}
