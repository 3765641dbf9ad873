/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! This crate provides a forward-only, streaming view over XML documents for
//! reading and writing Exchange Web Services traffic.
//!
//! [`XmlReader`] is a cursor over the nodes of a document. It never builds an
//! in-memory tree: elements which a consumer is not interested in are
//! consumed with [`XmlReader::skip_current_element`], which keeps memory use
//! bounded by the size of a single node rather than the size of the document.
//!
//! [`XmlWriter`] is its dual. It tracks open elements so that callers only
//! need to name an element when starting it, and emits elements without
//! content as empty tags.
//!
//! Both types are built on `quick_xml`. Text content is converted to and from
//! Rust values via the [`FromXmlText`] and [`ToXmlText`] traits, which are
//! implemented for common standard library types.
//!
//! # Usage
//!
//! ```
//! use ews_xml::{Namespace, NodeKind, XmlReader, XmlWriter};
//!
//! const TYPES: Namespace = Namespace {
//!     prefix: "t",
//!     uri: "http://schemas.microsoft.com/exchange/services/2006/types",
//! };
//!
//! let mut writer = XmlWriter::new(Vec::new());
//! writer.write_start_element(TYPES, "Message").unwrap();
//! writer.write_namespace_declaration(TYPES).unwrap();
//! writer.write_element_value(TYPES, "Size", &42_u32).unwrap();
//! writer.write_end_element().unwrap();
//!
//! let document = writer.into_inner().unwrap();
//!
//! let mut reader = XmlReader::new(document.as_slice());
//! reader.read_start_element(Some(TYPES), "Message").unwrap();
//! reader.read_start_element(Some(TYPES), "Size").unwrap();
//! assert_eq!(reader.read_element_value::<u32>().unwrap(), 42);
//! assert_eq!(reader.read().unwrap(), NodeKind::EndElement);
//! ```

mod impls;
mod reader;
mod writer;

use thiserror::Error;

pub use reader::{NodeKind, XmlReader};
pub use writer::XmlWriter;

/// An XML namespace, as written to and matched against documents.
///
/// Elements are matched by namespace URI when reading. The prefix is only
/// used when writing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub prefix: &'static str,
    pub uri: &'static str,
}

/// A value which can be read from the text content of an XML element or from
/// an attribute value.
pub trait FromXmlText: Sized {
    /// Converts text content into a value.
    ///
    /// On failure, returns an [`InvalidValue`] describing the type which was
    /// expected. The reader adds the element name and offending text.
    fn from_xml_text(text: &str) -> Result<Self, InvalidValue>;
}

/// A value which can be written as the text content of an XML element or as
/// an attribute value.
pub trait ToXmlText {
    /// Converts the value into text content.
    fn to_xml_text(&self) -> std::borrow::Cow<'_, str>;
}

/// Text content could not be converted into the requested type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidValue {
    /// A short description of the expected type, e.g. "boolean".
    pub expected: &'static str,
}

/// An error generated while reading or writing an XML document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to process XML document")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed XML attribute")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("failed to write XML document")]
    Io(#[from] std::io::Error),

    #[error("unexpected end of XML document")]
    UnexpectedEof,

    #[error("expected {expected}, found {found}")]
    UnexpectedNode { expected: String, found: String },

    #[error("content of `{element}` is not a valid {expected}: `{value}`")]
    InvalidValue {
        element: String,
        value: String,
        expected: &'static str,
    },

    #[error("attributes can only be written directly after a start tag")]
    NoPendingStartTag,

    #[error("no open element to close")]
    NoOpenElement,

    #[error("element `{0}` was never closed")]
    UnclosedElement(String),
}
