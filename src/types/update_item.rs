/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use ews_xml::XmlWriter;

use crate::{
    response::operation_response, ConflictResolution, Error, MessageDisposition, Operation,
    ServiceContext, ServiceObject, XmlNamespace,
};

/// A request to update properties of one or more Exchange items.
///
/// Only the properties changed since each item was loaded are sent. Items
/// without changes are left out of the request.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updateitem>
#[derive(Debug)]
pub struct UpdateItem<'a> {
    /// The action the Exchange server will take upon updating this item.
    ///
    /// This field is required for and only applicable to [`Message`] items.
    ///
    /// [`Message`]: crate::ServiceObjectKind::Message
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updateitem#messagedisposition-attribute>
    pub message_disposition: Option<MessageDisposition>,

    /// The method the Exchange server will use to resolve conflicts between
    /// updates.
    ///
    /// If omitted, the server will default to [`AutoResolve`].
    ///
    /// [`AutoResolve`]: `ConflictResolution::AutoResolve`
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updateitem#conflictresolution-attribute>
    pub conflict_resolution: Option<ConflictResolution>,

    /// The items to update.
    pub items: Vec<&'a ServiceObject>,
}

impl Operation for UpdateItem<'_> {
    type Response = UpdateItemResponse;
    const NAME: &'static str = "UpdateItem";

    fn write_body<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        writer.write_optional_attribute_value(
            "MessageDisposition",
            self.message_disposition.as_ref(),
        )?;
        writer.write_optional_attribute_value(
            "ConflictResolution",
            self.conflict_resolution.as_ref(),
        )?;

        writer.write_start_element(context.namespaces.get(XmlNamespace::Messages), "ItemChanges")?;
        for item in &self.items {
            if item.kind().is_folder() {
                return Err(Error::Schema(format!(
                    "`{}` is a folder and cannot be updated as an item",
                    item.element_name()
                )));
            }

            if !item.is_dirty() {
                log::debug!("skipping unchanged `{}`", item.element_name());
                continue;
            }

            item.write_update_to_xml(writer, context)?;
        }
        writer.write_end_element()?;

        Ok(())
    }
}

operation_response!(
    /// A response to an [`UpdateItem`] request.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updateitemresponse>
    UpdateItemResponse,
    "UpdateItemResponse",
    "UpdateItemResponseMessage"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schemas::{calendar_item, item, message},
        soap::Envelope,
        test_utils::*,
        ServiceObjectKind, StringList,
    };

    fn loaded_message(context: &ServiceContext) -> ServiceObject {
        load_object(
            ServiceObjectKind::Message,
            r#"<t:Message>
                <t:ItemId Id="AAMk" ChangeKey="CQAA"/>
                <t:Subject>Hello</t:Subject>
                <t:Categories><t:String>Work</t:String></t:Categories>
                <t:IsRead>true</t:IsRead>
            </t:Message>"#,
            context,
        )
        .expect("message should be read")
    }

    #[test]
    fn only_modified_properties_are_sent() {
        let context = ServiceContext::default();
        let mut received = loaded_message(&context);

        assert_eq!(received.bag().get_string(&item::SUBJECT).unwrap(), Some("Hello"));
        assert_eq!(received.bag().get_bool(&message::IS_READ).unwrap(), Some(true));

        received.set(&item::SUBJECT, "Bye").unwrap();

        let update_item = UpdateItem {
            message_disposition: Some(MessageDisposition::SaveOnly),
            conflict_resolution: Some(ConflictResolution::AlwaysOverwrite),
            items: vec![&received],
        };

        assert_serialized_request(
            &update_item,
            r#"<m:UpdateItem MessageDisposition="SaveOnly" ConflictResolution="AlwaysOverwrite"><m:ItemChanges><t:ItemChange><t:ItemId Id="AAMk" ChangeKey="CQAA"/><t:Updates><t:SetItemField><t:FieldURI FieldURI="item:Subject"/><t:Message><t:Subject>Bye</t:Subject></t:Message></t:SetItemField></t:Updates></t:ItemChange></m:ItemChanges></m:UpdateItem>"#,
        );
    }

    #[test]
    fn additions_are_appended_and_deletions_sent() {
        let context = ServiceContext::default();
        let mut received = loaded_message(&context);

        received
            .bag_mut()
            .complex_mut::<StringList>(&item::CATEGORIES)
            .unwrap()
            .expect("categories were loaded")
            .add("Urgent".to_string());
        received.delete(&item::SUBJECT).unwrap();

        let update_item = UpdateItem {
            message_disposition: None,
            conflict_resolution: None,
            items: vec![&received],
        };

        assert_serialized_request(
            &update_item,
            r#"<m:UpdateItem><m:ItemChanges><t:ItemChange><t:ItemId Id="AAMk" ChangeKey="CQAA"/><t:Updates><t:DeleteItemField><t:FieldURI FieldURI="item:Subject"/></t:DeleteItemField><t:AppendToItemField><t:FieldURI FieldURI="item:Categories"/><t:Message><t:Categories><t:String>Urgent</t:String></t:Categories></t:Message></t:AppendToItemField></t:Updates></t:ItemChange></m:ItemChanges></m:UpdateItem>"#,
        );
    }

    #[test]
    fn collapsed_changes_send_nothing() {
        let context = ServiceContext::default();
        let mut received = loaded_message(&context);

        let categories = received
            .bag_mut()
            .complex_mut::<StringList>(&item::CATEGORIES)
            .unwrap()
            .expect("categories were loaded");
        categories.add("Urgent".to_string());
        categories.remove(&"Urgent".to_string());
        categories.remove(&"Work".to_string());
        categories.add("Work".to_string());

        let update_item = UpdateItem {
            message_disposition: None,
            conflict_resolution: None,
            items: vec![&received],
        };

        assert_serialized_request(
            &update_item,
            "<m:UpdateItem><m:ItemChanges/></m:UpdateItem>",
        );
    }

    #[test]
    fn changes_to_newer_properties_send_nothing() {
        let context = ServiceContext::default();
        let mut meeting = load_object(
            ServiceObjectKind::CalendarItem,
            r#"<t:CalendarItem>
                <t:ItemId Id="AAMk" ChangeKey="CQAA"/>
                <t:Subject>Standup</t:Subject>
            </t:CalendarItem>"#,
            &context,
        )
        .expect("calendar item should be read");

        meeting
            .set(&calendar_item::START_TIME_ZONE_ID, "W. Europe Standard Time")
            .unwrap();
        assert!(meeting.is_dirty());

        let update_item = UpdateItem {
            message_disposition: None,
            conflict_resolution: None,
            items: vec![&meeting],
        };

        assert_serialized_request(&update_item, "<m:UpdateItem><m:ItemChanges/></m:UpdateItem>");
    }

    #[test]
    fn unchanged_items_are_skipped() {
        let context = ServiceContext::default();
        let received = loaded_message(&context);

        let update_item = UpdateItem {
            message_disposition: None,
            conflict_resolution: None,
            items: vec![&received],
        };

        assert_serialized_request(&update_item, "<m:UpdateItem><m:ItemChanges/></m:UpdateItem>");
    }

    #[test]
    fn folders_are_rejected() {
        let folder = ServiceObject::new(ServiceObjectKind::Folder);
        let update_item = UpdateItem {
            message_disposition: None,
            conflict_resolution: None,
            items: vec![&folder],
        };

        let context = ServiceContext::default();
        let err = Envelope::new(update_item, &context)
            .as_xml_document(&context)
            .expect_err("folders cannot be updated with UpdateItem");

        assert!(matches!(err, Error::Schema(_)), "unexpected error: {err:?}");
    }
}
