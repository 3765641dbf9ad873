/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

use crate::{Error, Namespace, ToXmlText};

/// A forward-only writer for XML documents.
///
/// Start tags are held back until the first content is written so that
/// attributes can be added after [`XmlWriter::write_start_element`], and so
/// that elements without content are written as empty tags. Output is not
/// indented, which keeps it byte-for-byte deterministic.
pub struct XmlWriter<W>
where
    W: Write,
{
    inner: Writer<W>,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
}

impl<W> XmlWriter<W>
where
    W: Write,
{
    pub fn new(inner: W) -> Self {
        Self {
            inner: Writer::new(inner),
            pending: None,
            open: Vec::new(),
        }
    }

    /// Writes an XML 1.0 declaration with UTF-8 encoding.
    pub fn write_declaration(&mut self) -> Result<(), Error> {
        self.flush_pending()?;
        self.inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        Ok(())
    }

    /// Opens an element in the given namespace.
    pub fn write_start_element(&mut self, namespace: Namespace, name: &str) -> Result<(), Error> {
        self.flush_pending()?;

        let qualified = qualify(namespace, name);
        self.pending = Some(BytesStart::new(qualified.clone()));
        self.open.push(qualified);

        Ok(())
    }

    /// Adds an attribute to the element most recently opened.
    pub fn write_attribute_value<T>(&mut self, name: &str, value: &T) -> Result<(), Error>
    where
        T: ToXmlText + ?Sized,
    {
        let start = self.pending.as_mut().ok_or(Error::NoPendingStartTag)?;
        start.push_attribute((name, value.to_xml_text().as_ref()));

        Ok(())
    }

    /// Adds an attribute to the element most recently opened if a value is
    /// present.
    pub fn write_optional_attribute_value<T>(
        &mut self,
        name: &str,
        value: Option<&T>,
    ) -> Result<(), Error>
    where
        T: ToXmlText + ?Sized,
    {
        match value {
            Some(value) => self.write_attribute_value(name, value),
            None => Ok(()),
        }
    }

    /// Declares a namespace prefix on the element most recently opened.
    pub fn write_namespace_declaration(&mut self, namespace: Namespace) -> Result<(), Error> {
        let attr_name = format!("xmlns:{}", namespace.prefix);
        self.write_attribute_value(&attr_name, namespace.uri)
    }

    /// Writes text content inside the element most recently opened.
    pub fn write_value<T>(&mut self, value: &T) -> Result<(), Error>
    where
        T: ToXmlText + ?Sized,
    {
        let text = value.to_xml_text();
        if text.is_empty() {
            return Ok(());
        }

        self.flush_pending()?;
        self.inner.write_event(Event::Text(BytesText::new(&text)))?;

        Ok(())
    }

    /// Writes an element with the given text content.
    ///
    /// Nothing is written if the value converts to empty text. Use
    /// [`XmlWriter::write_empty_element`] where an explicit empty tag is
    /// required.
    pub fn write_element_value<T>(
        &mut self,
        namespace: Namespace,
        name: &str,
        value: &T,
    ) -> Result<(), Error>
    where
        T: ToXmlText + ?Sized,
    {
        let text = value.to_xml_text();
        if text.is_empty() {
            return Ok(());
        }

        self.write_start_element(namespace, name)?;
        self.write_value(text.as_ref())?;
        self.write_end_element()
    }

    /// Writes an element without content.
    pub fn write_empty_element(&mut self, namespace: Namespace, name: &str) -> Result<(), Error> {
        self.write_start_element(namespace, name)?;
        self.write_end_element()
    }

    /// Closes the element most recently opened.
    pub fn write_end_element(&mut self) -> Result<(), Error> {
        let name = self.open.pop().ok_or(Error::NoOpenElement)?;

        match self.pending.take() {
            Some(start) => self.inner.write_event(Event::Empty(start))?,
            None => self.inner.write_event(Event::End(BytesEnd::new(name)))?,
        }

        Ok(())
    }

    /// The number of elements currently open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Returns the underlying sink.
    ///
    /// Fails if any element is left open.
    pub fn into_inner(self) -> Result<W, Error> {
        if let Some(name) = self.open.last() {
            return Err(Error::UnclosedElement(name.clone()));
        }

        Ok(self.inner.into_inner())
    }

    fn flush_pending(&mut self) -> Result<(), Error> {
        if let Some(start) = self.pending.take() {
            self.inner.write_event(Event::Start(start))?;
        }

        Ok(())
    }
}

fn qualify(namespace: Namespace, name: &str) -> String {
    if namespace.prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{}:{name}", namespace.prefix)
    }
}
