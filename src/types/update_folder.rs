/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use ews_xml::XmlWriter;

use crate::{
    response::operation_response, Error, Operation, ServiceContext, ServiceObject, XmlNamespace,
};

/// A request to update properties of one or more folders.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updatefolder>
#[derive(Debug)]
pub struct UpdateFolder<'a> {
    /// The folders to update. Folders without changes are left out of the
    /// request.
    pub folders: Vec<&'a ServiceObject>,
}

impl Operation for UpdateFolder<'_> {
    type Response = UpdateFolderResponse;
    const NAME: &'static str = "UpdateFolder";

    fn write_body<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        writer.write_start_element(
            context.namespaces.get(XmlNamespace::Messages),
            "FolderChanges",
        )?;
        for folder in &self.folders {
            if !folder.kind().is_folder() {
                return Err(Error::Schema(format!(
                    "`{}` is not a folder",
                    folder.element_name()
                )));
            }

            if !folder.is_dirty() {
                log::debug!("skipping unchanged `{}`", folder.element_name());
                continue;
            }

            folder.write_update_to_xml(writer, context)?;
        }
        writer.write_end_element()?;

        Ok(())
    }
}

operation_response!(
    /// A response to an [`UpdateFolder`] request.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/updatefolderresponse>
    UpdateFolderResponse,
    "UpdateFolderResponse",
    "UpdateFolderResponseMessage"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        response::ResponseClass, schemas::folder, soap::Envelope, test_utils::*,
        ServiceObjectKind,
    };

    #[test]
    fn serialize_update_folder() {
        let context = ServiceContext::default();
        let mut contacts = load_object(
            ServiceObjectKind::ContactsFolder,
            r#"<t:ContactsFolder>
                <t:FolderId Id="AQMk" ChangeKey="AQAA"/>
                <t:FolderClass>IPF.Contact</t:FolderClass>
                <t:DisplayName>Contacts</t:DisplayName>
                <t:TotalCount>12</t:TotalCount>
            </t:ContactsFolder>"#,
            &context,
        )
        .expect("folder should be read");

        contacts.set(&folder::DISPLAY_NAME, "People").unwrap();
        contacts.delete(&folder::FOLDER_CLASS).unwrap();

        let update_folder = UpdateFolder {
            folders: vec![&contacts],
        };

        assert_serialized_request(
            &update_folder,
            r#"<m:UpdateFolder><m:FolderChanges><t:FolderChange><t:FolderId Id="AQMk" ChangeKey="AQAA"/><t:Updates><t:DeleteFolderField><t:FieldURI FieldURI="folder:FolderClass"/></t:DeleteFolderField><t:SetFolderField><t:FieldURI FieldURI="folder:DisplayName"/><t:ContactsFolder><t:DisplayName>People</t:DisplayName></t:ContactsFolder></t:SetFolderField></t:Updates></t:FolderChange></m:FolderChanges></m:UpdateFolder>"#,
        );
    }

    #[test]
    fn read_only_properties_cannot_be_changed() {
        let context = ServiceContext::default();
        let mut inbox = load_object(
            ServiceObjectKind::Folder,
            r#"<t:Folder><t:FolderId Id="AQMk"/><t:TotalCount>3</t:TotalCount></t:Folder>"#,
            &context,
        )
        .unwrap();

        let err = inbox
            .set(&folder::TOTAL_COUNT, 4i64)
            .expect_err("total count is read-only");

        assert!(
            matches!(err, Error::ReadOnlyProperty { .. }),
            "unexpected error: {err:?}"
        );
        assert!(!inbox.is_dirty());
    }

    #[test]
    fn items_are_rejected() {
        let message = ServiceObject::new(ServiceObjectKind::Message);
        let update_folder = UpdateFolder {
            folders: vec![&message],
        };

        let err = write_to_string(&ServiceContext::default(), |writer, context| {
            update_folder.write_body(writer, context)
        })
        .expect_err("items cannot be updated with UpdateFolder");

        assert!(matches!(err, Error::Schema(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn deserialize_update_folder_response() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Header>
                    <h:ServerVersionInfo MajorVersion="15" MinorVersion="20" MajorBuildNumber="7452" MinorBuildNumber="28" Version="V2018_01_08" xmlns:h="http://schemas.microsoft.com/exchange/services/2006/types"/>
                </s:Header>
                <s:Body>
                    <m:UpdateFolderResponse xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages" xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types">
                        <m:ResponseMessages>
                            <m:UpdateFolderResponseMessage ResponseClass="Success">
                                <m:ResponseCode>NoError</m:ResponseCode>
                                <m:Folders>
                                    <t:ContactsFolder>
                                        <t:FolderId Id="AQMk" ChangeKey="AQAB"/>
                                    </t:ContactsFolder>
                                </m:Folders>
                            </m:UpdateFolderResponseMessage>
                        </m:ResponseMessages>
                    </m:UpdateFolderResponse>
                </s:Body>
            </s:Envelope>"#;

        let envelope = Envelope::<UpdateFolderResponse>::from_xml_document(
            xml.as_bytes(),
            &ServiceContext::default(),
        )
        .expect("response should be read");

        let message = &envelope.body.response_messages[0];
        assert_eq!(message.response_class, ResponseClass::Success);

        let id = message.objects[0]
            .id()
            .unwrap()
            .expect("updated folder should have an id");
        assert_eq!(id.change_key(), Some("AQAB"));
    }
}
