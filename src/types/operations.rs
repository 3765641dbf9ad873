/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::{BufRead, Write};

use ews_xml::{XmlReader, XmlWriter};

use crate::{Error, ServiceContext, ServiceId, XmlNamespace};

/// A request which can be sent to an EWS server as the body of a SOAP
/// envelope.
pub trait Operation {
    /// The structure returned by EWS in response to this request.
    type Response: OperationResponse;

    /// The local name of the element holding the request, in the messages
    /// namespace.
    const NAME: &'static str;

    /// Writes the content of the request element.
    ///
    /// The request element has just been opened, so attributes may still be
    /// written to it.
    fn write_body<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error>;
}

/// A response to an [`Operation`], read from the body of a SOAP envelope.
pub trait OperationResponse: Sized {
    /// The local name of the element holding the response, in the messages
    /// namespace.
    const NAME: &'static str;

    /// Reads the response from the element the reader is positioned on,
    /// leaving the reader on its end element.
    fn read_body<R: BufRead>(
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<Self, Error>;
}

/// The identifier of an item in a request.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/itemid>
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BaseItemId {
    /// An identifier for a standard Exchange item.
    ItemId {
        id: String,
        change_key: Option<String>,
    },
}

impl BaseItemId {
    pub(crate) fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        let types = context.namespaces.get(XmlNamespace::Types);

        match self {
            BaseItemId::ItemId { id, change_key } => {
                writer.write_start_element(types, "ItemId")?;
                writer.write_attribute_value("Id", id)?;
                writer.write_optional_attribute_value("ChangeKey", change_key.as_ref())?;
            }
        }
        writer.write_end_element()?;

        Ok(())
    }
}

impl From<&ServiceId> for BaseItemId {
    fn from(value: &ServiceId) -> Self {
        BaseItemId::ItemId {
            id: value.id().to_owned(),
            change_key: value.change_key().map(str::to_owned),
        }
    }
}

/// The identifier of a folder in a request.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/folderid>
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BaseFolderId {
    /// An identifier for an arbitrary folder.
    FolderId {
        id: String,
        change_key: Option<String>,
    },

    /// An identifier for referencing a folder by name, e.g. "inbox" or
    /// "junkemail".
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/distinguishedfolderid>
    DistinguishedFolderId { id: String },
}

impl BaseFolderId {
    pub fn distinguished(id: impl Into<String>) -> Self {
        BaseFolderId::DistinguishedFolderId { id: id.into() }
    }

    pub(crate) fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        let types = context.namespaces.get(XmlNamespace::Types);

        match self {
            BaseFolderId::FolderId { id, change_key } => {
                writer.write_start_element(types, "FolderId")?;
                writer.write_attribute_value("Id", id)?;
                writer.write_optional_attribute_value("ChangeKey", change_key.as_ref())?;
            }
            BaseFolderId::DistinguishedFolderId { id } => {
                writer.write_start_element(types, "DistinguishedFolderId")?;
                writer.write_attribute_value("Id", id)?;
            }
        }
        writer.write_end_element()?;

        Ok(())
    }
}

impl From<&ServiceId> for BaseFolderId {
    fn from(value: &ServiceId) -> Self {
        BaseFolderId::FolderId {
            id: value.id().to_owned(),
            change_key: value.change_key().map(str::to_owned),
        }
    }
}
