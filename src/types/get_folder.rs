/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use ews_xml::XmlWriter;

use crate::{
    response::operation_response, BaseFolderId, Error, Operation, PropertySet, ServiceContext,
    XmlNamespace,
};

/// A request to get information on one or more folders.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getfolder>
#[derive(Clone, Debug)]
pub struct GetFolder {
    /// A description of the information to be included in the response for each
    /// retrieved folder.
    pub folder_shape: PropertySet,

    /// A list of IDs for which to retrieve folder information.
    pub folder_ids: Vec<BaseFolderId>,
}

impl Operation for GetFolder {
    type Response = GetFolderResponse;
    const NAME: &'static str = "GetFolder";

    fn write_body<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        self.folder_shape.write_to_xml(writer, context, "FolderShape")?;

        writer.write_start_element(context.namespaces.get(XmlNamespace::Messages), "FolderIds")?;
        for id in &self.folder_ids {
            id.write_to_xml(writer, context)?;
        }
        writer.write_end_element()?;

        Ok(())
    }
}

operation_response!(
    /// A response to a [`GetFolder`] request.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getfolderresponse>
    GetFolderResponse,
    "GetFolderResponse",
    "GetFolderResponseMessage"
);
