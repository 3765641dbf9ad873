/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use ews_xml::XmlWriter;

use crate::{
    response::operation_response, BaseItemId, Error, Operation, PropertySet, ServiceContext,
    XmlNamespace,
};

/// A request for the properties of one or more Exchange items, e.g. messages,
/// calendar events, or contacts.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getitem>
#[derive(Clone, Debug)]
pub struct GetItem {
    /// A description of the information to be included in the response for
    /// each item.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/itemshape>
    pub item_shape: PropertySet,

    /// The Exchange identifiers of the items which should be fetched.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/itemids>
    pub item_ids: Vec<BaseItemId>,
}

impl Operation for GetItem {
    type Response = GetItemResponse;
    const NAME: &'static str = "GetItem";

    fn write_body<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        self.item_shape.write_to_xml(writer, context, "ItemShape")?;

        writer.write_start_element(context.namespaces.get(XmlNamespace::Messages), "ItemIds")?;
        for id in &self.item_ids {
            id.write_to_xml(writer, context)?;
        }
        writer.write_end_element()?;

        Ok(())
    }
}

operation_response!(
    /// A response to a [`GetItem`] request.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/getitemresponse>
    GetItemResponse,
    "GetItemResponse",
    "GetItemResponseMessage"
);
