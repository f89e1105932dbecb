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

//! BSON is a binary format in which zero or more key/value pairs are stored as a single entity.
//! We call this entity a document.
//!
//! This library is a streaming codec for the [BSON standard](http://bsonspec.org/spec.html): a
//! [`Writer`] that encodes documents onto any [`std::io::Write`] and a [`Reader`] that decodes
//! them from any [`std::io::Read`]. Neither side knows the in-memory shape of the objects it
//! handles. The writer asks an [`ObjectDescriptor`] for an ordered list of properties, and the
//! reader reports what it parses to an [`ObjectBuilder`]. [`Document`] implements the former and
//! [`DocumentBuilder`] the latter.
//!
//! ## Basic usage
//!
//! ```rust
//! use bson_codec::{decode_document, doc, encode_document, Bson};
//! use std::io::Cursor;
//!
//! let doc = doc! { "foo": "bar", "n": [1, 2, 3] };
//!
//! let mut buf = Vec::new();
//! encode_document(&mut buf, &doc)?;
//!
//! let decoded = decode_document(&mut Cursor::new(&buf[..]))?;
//! assert_eq!(decoded.get("foo"), Some(&Bson::from("bar")));
//! assert_eq!(decoded, doc);
//! # Ok::<(), bson_codec::error::Error>(())
//! ```
//!
//! ## Limits
//!
//! Encoded documents must be smaller than [`options::MAX_DOCUMENT_SIZE`] (4 MiB) unless a
//! different limit is configured through [`CodecOptions`]. The check happens before anything is
//! written.

#![allow(clippy::cognitive_complexity, clippy::derive_partial_eq_without_eq)]
#![doc(html_root_url = "https://docs.rs/bson-codec/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use self::{
    binary::Binary,
    bson::{
        Array,
        Bson,
        DbRef,
        JavaScriptCodeWithScope,
        Regex,
        Timestamp,
        common_element_type,
    },
    builder::{DocumentBuilder, ObjectBuilder},
    datetime::DateTime,
    descriptor::{ObjectDescriptor, ObjectKind, Property},
    document::Document,
    options::{CodecOptions, CodecOptionsBuilder},
    reader::{Reader, decode_document},
    size::{array_size, calculate_size, document_size},
    writer::{Writer, encode_document, encode_to_vec},
};

#[macro_use]
mod macros;
mod binary;
mod bson;
mod builder;
mod datetime;
mod descriptor;
pub mod document;
pub mod error;
pub mod oid;
pub mod options;
mod reader;
pub mod size;
pub mod spec;
mod writer;
