/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::{BufRead, Write};

use ews_xml::{XmlReader, XmlWriter};

use crate::{ChangeTracking, ComplexProperty, Error, ServiceContext};

/// The identifier of an item or folder, along with the change key
/// identifying its current revision.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/itemid>
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceId {
    id: String,
    change_key: Option<String>,
    tracking: ChangeTracking,
}

impl ServiceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_change_key(mut self, change_key: impl Into<String>) -> Self {
        self.change_key = Some(change_key.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn change_key(&self) -> Option<&str> {
        self.change_key.as_deref()
    }

    pub fn set_change_key(&mut self, change_key: Option<String>) {
        self.change_key = change_key;
        self.changed();
    }

    /// Whether an identifier has been assigned.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }
}

impl ComplexProperty for ServiceId {
    fn tracking(&self) -> &ChangeTracking {
        &self.tracking
    }

    fn read_attributes_from_xml<R: BufRead>(&mut self, reader: &XmlReader<R>) -> Result<(), Error> {
        self.id = reader.read_attribute_value("Id").unwrap_or_default().to_owned();
        self.change_key = reader.read_attribute_value("ChangeKey").map(str::to_owned);

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
        writer.write_attribute_value("Id", self.id.as_str())?;
        writer.write_optional_attribute_value("ChangeKey", self.change_key.as_deref())?;

        Ok(())
    }

    fn write_elements_to_xml<W: Write>(
        &self,
        _writer: &mut XmlWriter<W>,
        _context: &ServiceContext,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn is_empty(&self) -> bool {
        !self.is_valid()
    }
}
