/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use ews_xml::XmlWriter;

use crate::{
    response::operation_response, BaseFolderId, Error, MessageDisposition, Operation,
    ServiceContext, ServiceObject, XmlNamespace,
};

/// A request to create (and optionally send) one or more Exchange items.
///
/// Every assigned property of each item is written, in schema order.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/createitem>
#[derive(Debug)]
pub struct CreateItem<'a> {
    /// The action the Exchange server will take upon creating this item.
    ///
    /// This field is required for and only applicable to [`Message`] items.
    ///
    /// [`Message`]: crate::ServiceObjectKind::Message
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/createitem#messagedisposition-attribute>
    pub message_disposition: Option<MessageDisposition>,

    /// The folder in which to store an item once it has been created.
    ///
    /// This is ignored if `message_disposition` is [`SendOnly`].
    ///
    /// [`SendOnly`]: MessageDisposition::SendOnly
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/saveditemfolderid>
    pub saved_item_folder_id: Option<BaseFolderId>,

    /// The item or items to create.
    pub items: Vec<&'a ServiceObject>,
}

impl Operation for CreateItem<'_> {
    type Response = CreateItemResponse;
    const NAME: &'static str = "CreateItem";

    fn write_body<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        let messages = context.namespaces.get(XmlNamespace::Messages);

        writer.write_optional_attribute_value(
            "MessageDisposition",
            self.message_disposition.as_ref(),
        )?;

        if let Some(folder_id) = &self.saved_item_folder_id {
            writer.write_start_element(messages, "SavedItemFolderId")?;
            folder_id.write_to_xml(writer, context)?;
            writer.write_end_element()?;
        }

        writer.write_start_element(messages, "Items")?;
        for item in &self.items {
            if item.kind().is_folder() {
                return Err(Error::Schema(format!(
                    "`{}` is a folder and cannot be created as an item",
                    item.element_name()
                )));
            }

            item.write_to_xml(writer, context)?;
        }
        writer.write_end_element()?;

        Ok(())
    }
}

operation_response!(
    /// A response to a [`CreateItem`] request.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/createitemresponse>
    CreateItemResponse,
    "CreateItemResponse",
    "CreateItemResponseMessage"
);
