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

//! Decoder

mod utf8;

use std::io::{self, ErrorKind as IoErrorKind, Read};

use crate::{
    Binary,
    DateTime,
    bson::{Bson, JavaScriptCodeWithScope, Regex, Timestamp},
    builder::{DocumentBuilder, ObjectBuilder},
    document::Document,
    error::{Error, Phase, Result},
    oid::ObjectId,
    options::CodecOptions,
    spec::{BinarySubtype, ElementType},
};

use self::utf8::Utf8Decoder;

/// 4 bytes for the length and one for the terminator.
const MIN_DOCUMENT_SIZE: i32 = 4 + 1;

/// Parses BSON documents from a byte stream and reports their structure to an
/// [`ObjectBuilder`].
///
/// Null-terminated strings are scanned one byte at a time, so wrap unbuffered sources such as
/// files or sockets in a [`std::io::BufReader`].
///
/// Any number of documents can be read in sequence from the same stream.
pub struct Reader<R> {
    inner: R,
    options: CodecOptions,
    buf: Vec<u8>,

    /// Bytes consumed from `inner` so far.
    position: u64,
}

impl<R: Read> Reader<R> {
    /// Creates a reader with the default [`CodecOptions`].
    pub fn new(inner: R) -> Self {
        Self::with_options(inner, CodecOptions::default())
    }

    /// Creates a reader with the given options.
    pub fn with_options(inner: R, options: CodecOptions) -> Self {
        Self {
            inner,
            buf: vec![0; options.buffer_size()],
            options,
            position: 0,
        }
    }

    /// The number of bytes consumed from the underlying stream.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Unwraps the underlying stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Reads one document into a [`Document`].
    ///
    /// A stream that ends before the first byte of the document is reported as an
    /// [`ErrorKind::Io`](crate::error::ErrorKind::Io) error with kind
    /// [`UnexpectedEof`](std::io::ErrorKind::UnexpectedEof). A stream that ends part way
    /// through is a malformed value.
    pub fn read_document(&mut self) -> Result<Document> {
        match self.read_object(&mut DocumentBuilder::new())? {
            Bson::Document(doc) => Ok(doc),
            Bson::DbRef(dbref) => Ok(dbref.to_document()),
            other => Err(Error::malformed_value(format!(
                "expected a document, got {:?}",
                other.element_type()
            ))
            .with_phase(Phase::Read)),
        }
    }

    /// Reads one document, reporting it to `builder`, and returns what the builder produced
    /// for the root object.
    pub fn read_object<B: ObjectBuilder>(&mut self, builder: &mut B) -> Result<B::Value> {
        let start = self.position;
        self.read_root(builder, start)
            .map_err(|e| e.with_offset(start).with_phase(Phase::Read))
    }

    fn read_root<B: ObjectBuilder>(&mut self, builder: &mut B, start: u64) -> Result<B::Value> {
        let mut first = [0u8; 1];
        loop {
            match self.inner.read(&mut first) {
                Ok(0) => {
                    return Err(Error::from(io::Error::from(IoErrorKind::UnexpectedEof))
                        .with_offset(start));
                }
                Ok(_) => break,
                Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::from(e).with_offset(start)),
            }
        }
        self.position += 1;

        let rest: [u8; 3] = self.read_bytes()?;
        let length = i32::from_le_bytes([first[0], rest[0], rest[1], rest[2]]);
        self.read_body(builder, start, length, false)
    }

    fn read_embedded<B: ObjectBuilder>(&mut self, builder: &mut B, array: bool) -> Result<B::Value> {
        let start = self.position;
        let length = self.read_i32()?;
        self.read_body(builder, start, length, array)
    }

    fn read_body<B: ObjectBuilder>(
        &mut self,
        builder: &mut B,
        start: u64,
        length: i32,
        array: bool,
    ) -> Result<B::Value> {
        if length < MIN_DOCUMENT_SIZE {
            return Err(
                Error::malformed_value(format!("document length {length} is too small"))
                    .with_offset(start),
            );
        }

        let mut object = if array {
            builder.begin_array()
        } else {
            builder.begin_object()
        };

        loop {
            let tag_offset = self.position;
            let [tag] = self.read_bytes::<1>()?;
            if tag == 0 {
                break;
            }

            let name = self.read_cstring()?;
            builder.begin_property(&mut object, &name);
            let value = self
                .read_value(builder, tag, tag_offset)
                .map_err(|e| e.with_key(name.as_str()))?;
            builder
                .end_property(&mut object, &name, value)
                .map_err(|e| e.with_key(name.as_str()).with_offset(tag_offset))?;
        }

        let consumed = self.position - start;
        if consumed != length as u64 {
            return Err(Error::malformed_value(format!(
                "document length {length} does not match the {consumed} bytes read"
            ))
            .with_offset(start));
        }

        tracing::trace!(offset = start, length, array, "read document");

        if array {
            builder.end_array(object, length as usize)
        } else {
            builder.end_object(object)
        }
        .map_err(|e| e.with_offset(start))
    }

    fn read_value<B: ObjectBuilder>(
        &mut self,
        builder: &mut B,
        tag: u8,
        offset: u64,
    ) -> Result<B::Value> {
        let Some(element_type) = ElementType::from(tag) else {
            tracing::debug!(tag, offset, "unrecognized element type");
            return Err(Error::unrecognized_element_type(tag).with_offset(offset));
        };

        let value = match element_type {
            ElementType::Double => Bson::Double(f64::from_le_bytes(self.read_bytes()?)),
            ElementType::String => Bson::String(self.read_string()?),
            ElementType::EmbeddedDocument => return self.read_embedded(builder, false),
            ElementType::Array => return self.read_embedded(builder, true),
            ElementType::Binary => Bson::Binary(self.read_binary()?),
            ElementType::ObjectId => Bson::ObjectId(ObjectId::from_bytes(self.read_bytes()?)),
            ElementType::Boolean => {
                let [byte] = self.read_bytes::<1>()?;
                match byte {
                    0 => Bson::Boolean(false),
                    1 => Bson::Boolean(true),
                    other => {
                        return Err(Error::malformed_value(format!(
                            "invalid boolean value {other:#04x}"
                        ))
                        .with_offset(self.position - 1));
                    }
                }
            }
            ElementType::DateTime => {
                let dt = DateTime::from_millis(i64::from_le_bytes(self.read_bytes()?));
                return Ok(builder.datetime(dt, self.options.local_time()));
            }
            ElementType::Null => Bson::Null,
            ElementType::RegularExpression => {
                let pattern = self.read_cstring()?;
                let options = self.read_cstring()?;
                Bson::RegularExpression(Regex { pattern, options })
            }
            ElementType::JavaScriptCode => Bson::JavaScriptCode(self.read_string()?),
            ElementType::Symbol => Bson::Symbol(self.read_string()?),
            ElementType::JavaScriptCodeWithScope => {
                Bson::JavaScriptCodeWithScope(self.read_code_with_scope()?)
            }
            ElementType::Int32 => Bson::Int32(self.read_i32()?),
            ElementType::Timestamp => Bson::Timestamp(Timestamp::from_le_bytes(self.read_bytes()?)),
            ElementType::Int64 => Bson::Int64(i64::from_le_bytes(self.read_bytes()?)),
            ElementType::MaxKey => Bson::MaxKey,
            ElementType::MinKey => Bson::MinKey,
        };

        Ok(value.into())
    }

    fn read_code_with_scope(&mut self) -> Result<JavaScriptCodeWithScope> {
        let start = self.position;
        let length = self.read_i32()?;
        let code = self.read_string()?;
        let scope = match self.read_embedded(&mut DocumentBuilder::new(), false)? {
            Bson::DbRef(dbref) => dbref.to_document(),
            Bson::Document(doc) => doc,
            other => {
                return Err(Error::malformed_value(format!(
                    "code with scope has a {:?} scope",
                    other.element_type()
                ))
                .with_offset(start));
            }
        };

        let consumed = self.position - start;
        if consumed != length as u64 {
            return Err(Error::malformed_value(format!(
                "code with scope length {length} does not match the {consumed} bytes read"
            ))
            .with_offset(start));
        }

        Ok(JavaScriptCodeWithScope { code, scope })
    }

    fn read_binary(&mut self) -> Result<Binary> {
        let start = self.position;
        let length = self.read_i32()?;
        if length < 0 {
            return Err(
                Error::malformed_value(format!("invalid binary length {length}")).with_offset(start),
            );
        }
        let [subtype] = self.read_bytes::<1>()?;
        let subtype = BinarySubtype::from(subtype);

        let length = if subtype.has_inner_length() {
            let inner = self.read_i32()?;
            if inner < 0 || inner != length - 4 {
                return Err(Error::malformed_value(format!(
                    "binary inner length {inner} does not match outer length {length}"
                ))
                .with_offset(start));
            }
            inner
        } else {
            length
        };

        let mut bytes = Vec::new();
        let read = (&mut self.inner)
            .take(length as u64)
            .read_to_end(&mut bytes)
            .map_err(Error::from)?;
        self.position += read as u64;
        if read != length as usize {
            return Err(Error::truncated().with_offset(self.position));
        }

        Ok(Binary { subtype, bytes })
    }

    /// Reads a length-prefixed string, decoding it one buffer fill at a time.
    fn read_string(&mut self) -> Result<String> {
        let start = self.position;
        let length = self.read_i32()?;
        if length < 1 {
            return Err(
                Error::malformed_value(format!("invalid string length {length}")).with_offset(start),
            );
        }

        let mut remaining = (length - 1) as usize;
        let mut out = String::with_capacity(remaining.min(self.options.max_document_size()));
        let mut decoder = Utf8Decoder::new();
        while remaining > 0 {
            let n = remaining.min(self.buf.len());
            fill(&mut self.inner, &mut self.position, &mut self.buf[..n])?;
            decoder
                .decode(&self.buf[..n], &mut out)
                .map_err(|e| e.with_offset(start))?;
            remaining -= n;
        }
        decoder.finish().map_err(|e| e.with_offset(start))?;

        let [terminator] = self.read_bytes::<1>()?;
        if terminator != 0 {
            return Err(Error::malformed_value("string is not null-terminated")
                .with_offset(self.position - 1));
        }

        Ok(out)
    }

    /// Reads a null-terminated string. There is no length to go by, so bytes are collected
    /// until the terminator and decoded whenever the buffer fills up.
    fn read_cstring(&mut self) -> Result<String> {
        let start = self.position;
        let mut out = String::new();
        let mut decoder = Utf8Decoder::new();
        let mut filled = 0;

        loop {
            let mut byte = [0u8; 1];
            fill(&mut self.inner, &mut self.position, &mut byte)?;
            if byte[0] == 0 {
                break;
            }

            self.buf[filled] = byte[0];
            filled += 1;
            if filled == self.buf.len() {
                decoder
                    .decode(&self.buf[..filled], &mut out)
                    .map_err(|e| e.with_offset(start))?;
                filled = 0;
            }
        }

        decoder
            .decode(&self.buf[..filled], &mut out)
            .map_err(|e| e.with_offset(start))?;
        decoder.finish().map_err(|e| e.with_offset(start))?;
        Ok(out)
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_bytes()?))
    }

    fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0; N];
        fill(&mut self.inner, &mut self.position, &mut buf)?;
        Ok(buf)
    }
}

/// Fills `buf` completely, reporting a stream that ends early as a truncated document.
fn fill<R: Read>(inner: &mut R, position: &mut u64, buf: &mut [u8]) -> Result<()> {
    let mut read = 0;
    while read < buf.len() {
        match inner.read(&mut buf[read..]) {
            Ok(0) => return Err(Error::truncated().with_offset(*position + read as u64)),
            Ok(n) => read += n,
            Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::from(e).with_offset(*position + read as u64)),
        }
    }
    *position += read as u64;
    Ok(())
}

/// Attempt to decode a [`Document`] from a byte stream.
///
/// ```
/// use bson_codec::{decode_document, doc, encode_to_vec};
///
/// let bytes = encode_to_vec(&doc! { "test": "test" })?;
/// let doc = decode_document(bytes.as_slice())?;
/// assert_eq!(doc.get_str("test")?, "test");
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
pub fn decode_document<R: Read>(reader: R) -> Result<Document> {
    Reader::new(reader).read_document()
}
