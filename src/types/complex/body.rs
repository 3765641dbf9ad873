/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::{BufRead, Write};

use ews_xml::{XmlReader, XmlWriter};

use crate::{BodyType, ChangeTracking, ComplexProperty, Error, ServiceContext};

/// The body of an item.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/body>
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Body {
    body_type: BodyType,
    content: String,
    tracking: ChangeTracking,
}

impl Body {
    pub fn new(body_type: BodyType, content: impl Into<String>) -> Self {
        Self {
            body_type,
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(BodyType::Text, content)
    }

    pub fn html(content: impl Into<String>) -> Self {
        Self::new(BodyType::Html, content)
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, body_type: BodyType, content: impl Into<String>) {
        self.body_type = body_type;
        self.content = content.into();
        self.changed();
    }
}

impl ComplexProperty for Body {
    fn tracking(&self) -> &ChangeTracking {
        &self.tracking
    }

    fn read_attributes_from_xml<R: BufRead>(&mut self, reader: &XmlReader<R>) -> Result<(), Error> {
        self.body_type = reader
            .read_attribute::<BodyType>("BodyType")?
            .unwrap_or_default();

        Ok(())
    }

    fn try_read_element_from_xml<R: BufRead>(
        &mut self,
        _reader: &mut XmlReader<R>,
        _context: &ServiceContext,
    ) -> Result<bool, Error> {
        Ok(false)
    }

    fn write_attributes_to_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<(), Error> {
        writer.write_attribute_value("BodyType", &self.body_type)?;

        Ok(())
    }

    fn write_elements_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        _context: &ServiceContext,
    ) -> Result<(), Error> {
        writer.write_value(self.content.as_str())?;

        Ok(())
    }

    // The body is text content rather than child elements.
    fn load_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        _context: &ServiceContext,
    ) -> Result<(), Error> {
        self.read_attributes_from_xml(reader)?;
        self.content = reader.read_element_text()?;

        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
