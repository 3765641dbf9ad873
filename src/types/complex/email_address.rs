/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::{BufRead, Write};

use ews_xml::{XmlReader, XmlWriter};

use crate::{
    types::complex::skip_unknown_element, ChangeTracking, CollectionItem, ComplexProperty, Error,
    MailboxType, ServiceContext, XmlNamespace,
};

/// A mailbox user.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/mailbox>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmailAddress {
    /// The name of the mailbox user.
    pub name: Option<String>,

    /// The e-mail address of the mailbox user.
    pub email_address: Option<String>,

    /// The protocol used in routing to the mailbox.
    pub routing_type: Option<String>,

    /// The type of the mailbox.
    pub mailbox_type: Option<MailboxType>,
}

impl EmailAddress {
    pub fn new(email_address: impl Into<String>) -> Self {
        Self {
            email_address: Some(email_address.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl CollectionItem for EmailAddress {
    const ELEMENT_NAME: &'static str = "Mailbox";

    fn read_from_xml<R: BufRead>(
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<Self, Error> {
        let mut address = EmailAddress::default();

        let depth = reader.depth();
        while reader.read_child_start(depth)? {
            match reader.local_name() {
                "Name" => address.name = Some(reader.read_element_text()?),
                "EmailAddress" => address.email_address = Some(reader.read_element_text()?),
                "RoutingType" => address.routing_type = Some(reader.read_element_text()?),
                "MailboxType" => address.mailbox_type = Some(reader.read_element_value()?),
                _ => skip_unknown_element(reader, context)?,
            }
        }

        Ok(address)
    }

    fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        let types = context.namespaces.get(XmlNamespace::Types);

        writer.write_start_element(types, Self::ELEMENT_NAME)?;
        if let Some(name) = &self.name {
            writer.write_element_value(types, "Name", name.as_str())?;
        }
        if let Some(email_address) = &self.email_address {
            writer.write_element_value(types, "EmailAddress", email_address.as_str())?;
        }
        if let Some(routing_type) = &self.routing_type {
            writer.write_element_value(types, "RoutingType", routing_type.as_str())?;
        }
        if let Some(mailbox_type) = &self.mailbox_type {
            writer.write_element_value(types, "MailboxType", mailbox_type)?;
        }
        writer.write_end_element()?;

        Ok(())
    }
}

/// A single mailbox held by a property, such as the sender of a message or
/// the organizer of a meeting.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/sender>
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Recipient {
    mailbox: EmailAddress,
    tracking: ChangeTracking,
}

impl Recipient {
    pub fn new(mailbox: EmailAddress) -> Self {
        Self {
            mailbox,
            ..Default::default()
        }
    }

    pub fn mailbox(&self) -> &EmailAddress {
        &self.mailbox
    }

    pub fn set_mailbox(&mut self, mailbox: EmailAddress) {
        self.mailbox = mailbox;
        self.changed();
    }
}

impl ComplexProperty for Recipient {
    fn tracking(&self) -> &ChangeTracking {
        &self.tracking
    }

    fn try_read_element_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<bool, Error> {
        if reader.local_name() != EmailAddress::ELEMENT_NAME {
            return Ok(false);
        }

        self.mailbox = EmailAddress::read_from_xml(reader, context)?;

        Ok(true)
    }

    fn write_elements_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        self.mailbox.write_to_xml(writer, context)
    }
}
