/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! The per-request status messages common to all EWS responses.

use std::{fmt, io::BufRead, str::FromStr};

use ews_xml::{FromXmlText, InvalidValue, XmlReader};
use strum::{EnumString, IntoStaticStr};

use crate::{
    soap::{read_message_xml, MessageXmlValue},
    types::complex::skip_unknown_element,
    Error, ServiceContext, ServiceObject, XmlNamespace,
};

/// The status of a request, i.e. whether it succeeded or resulted in an
/// error.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/responsemessage#attributes>
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, EnumString, IntoStaticStr)]
pub enum ResponseClass {
    Success,
    Warning,
    Error,
}

impl FromXmlText for ResponseClass {
    fn from_xml_text(text: &str) -> Result<Self, InvalidValue> {
        text.trim().parse().map_err(|_| InvalidValue {
            expected: "ResponseClass",
        })
    }
}

/// An error code describing the outcome of a request.
///
/// Codes not known to this crate are kept verbatim in
/// [`ResponseCode::Other`].
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/responsecode>
#[derive(Clone, Debug, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum ResponseCode {
    NoError,
    ErrorAccessDenied,
    ErrorChangeKeyRequiredForWriteOperations,
    ErrorExceededConnectionCount,
    ErrorFolderNotFound,
    ErrorInternalServerError,
    ErrorInvalidChangeKey,
    ErrorInvalidIdMalformed,
    ErrorInvalidPropertyRequest,
    ErrorInvalidPropertySet,
    ErrorInvalidRequest,
    ErrorIrresolvableConflict,
    ErrorItemNotFound,
    ErrorSchemaValidation,
    ErrorServerBusy,
    ErrorStaleObject,

    #[strum(default)]
    Other(String),
}

impl ResponseCode {
    /// Maps the text of a `ResponseCode` element onto a code.
    pub fn from_wire(code: &str) -> Self {
        match ResponseCode::from_str(code) {
            Ok(code) => code,
            Err(_) => ResponseCode::Other(code.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResponseCode::Other(code) => code,
            code => code.into(),
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status of one request within an operation, along with any items or
/// folders returned for it.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/responsemessage>
#[derive(Debug)]
pub struct ResponseMessage {
    pub response_class: ResponseClass,

    pub response_code: Option<ResponseCode>,

    /// A human-readable description of the status.
    pub message_text: Option<String>,

    pub descriptive_link_key: Option<i64>,

    /// Additional information about an error, e.g. throttling hints.
    pub message_xml: Vec<MessageXmlValue>,

    /// The items or folders returned, created from their element names with
    /// the context's registry.
    pub objects: Vec<ServiceObject>,
}

impl ResponseMessage {
    pub fn is_success(&self) -> bool {
        self.response_class == ResponseClass::Success
    }

    fn read_from_xml<R: BufRead>(
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<Self, Error> {
        let response_class = reader
            .read_attribute::<ResponseClass>("ResponseClass")?
            .ok_or_else(|| {
                Error::UnexpectedResponse(format!(
                    "`{}` has no ResponseClass attribute",
                    reader.local_name()
                ))
            })?;

        let mut message = ResponseMessage {
            response_class,
            response_code: None,
            message_text: None,
            descriptive_link_key: None,
            message_xml: Vec::new(),
            objects: Vec::new(),
        };

        let messages = context.namespaces.get(XmlNamespace::Messages);
        let depth = reader.depth();
        while reader.read_child_start(depth)? {
            if !reader.is_start_element(Some(messages), None) {
                skip_unknown_element(reader, context)?;
                continue;
            }

            let name = reader.local_name().to_owned();
            match name.as_str() {
                "MessageText" => message.message_text = Some(reader.read_element_text()?),
                "ResponseCode" => {
                    let code = reader.read_element_text()?;
                    message.response_code = Some(ResponseCode::from_wire(code.trim()));
                }
                "DescriptiveLinkKey" => {
                    message.descriptive_link_key = Some(reader.read_element_value()?)
                }
                "MessageXml" => message.message_xml = read_message_xml(reader)?,
                "Items" | "Folders" => read_objects(reader, context, &mut message.objects)?,
                _ => skip_unknown_element(reader, context)?,
            }
        }

        Ok(message)
    }
}

/// Reads each child of the current element as an entity, dispatching on its
/// element name.
fn read_objects<R: BufRead>(
    reader: &mut XmlReader<R>,
    context: &ServiceContext,
    objects: &mut Vec<ServiceObject>,
) -> Result<(), Error> {
    let depth = reader.depth();
    while reader.read_child_start(depth)? {
        let mut object = context.registry.create(reader.local_name())?;
        object.load_from_xml(reader, context)?;

        objects.push(object);
    }

    Ok(())
}

/// Reads the `ResponseMessages` of an operation response from the element the
/// reader is positioned on.
///
/// Every message is expected to be named `message_name`, e.g.
/// `GetItemResponseMessage`.
pub(crate) fn read_response_messages<R: BufRead>(
    reader: &mut XmlReader<R>,
    context: &ServiceContext,
    message_name: &str,
) -> Result<Vec<ResponseMessage>, Error> {
    let messages = context.namespaces.get(XmlNamespace::Messages);
    let mut response_messages = Vec::new();

    let depth = reader.depth();
    while reader.read_child_start(depth)? {
        if !reader.is_start_element(Some(messages), Some("ResponseMessages")) {
            skip_unknown_element(reader, context)?;
            continue;
        }

        let list_depth = reader.depth();
        while reader.read_child_start(list_depth)? {
            if !reader.is_start_element(Some(messages), Some(message_name)) {
                return Err(Error::UnexpectedResponse(format!(
                    "expected `{message_name}`, found `{}`",
                    reader.local_name()
                )));
            }

            response_messages.push(ResponseMessage::read_from_xml(reader, context)?);
        }
    }

    Ok(response_messages)
}

/// Declares the response structure of an operation, holding the response
/// messages named `$message`.
macro_rules! operation_response {
    ($(#[$attr:meta])* $name:ident, $element:literal, $message:literal) => {
        $(#[$attr])*
        #[derive(Debug)]
        pub struct $name {
            pub response_messages: Vec<$crate::response::ResponseMessage>,
        }

        impl $crate::OperationResponse for $name {
            const NAME: &'static str = $element;

            fn read_body<R: std::io::BufRead>(
                reader: &mut $crate::XmlReader<R>,
                context: &$crate::ServiceContext,
            ) -> Result<Self, $crate::Error> {
                Ok(Self {
                    response_messages: $crate::response::read_response_messages(
                        reader, context, $message,
                    )?,
                })
            }
        }
    };
}

pub(crate) use operation_response;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{schemas::item, test_utils::*, ParsingMode, ServiceObjectKind};

    fn read_messages(xml: &str, context: &ServiceContext) -> Result<Vec<ResponseMessage>, Error> {
        let mut reader = reader_at_root(&format!(
            r#"<m:GetItemResponse {MESSAGES_NS} {TYPES_NS}>{xml}</m:GetItemResponse>"#
        ));

        read_response_messages(&mut reader, context, "GetItemResponseMessage")
    }

    #[test]
    fn unknown_codes_are_kept() {
        assert_eq!(
            ResponseCode::from_wire("ErrorItemNotFound"),
            ResponseCode::ErrorItemNotFound
        );

        let code = ResponseCode::from_wire("ErrorQuotaExceeded");
        assert_eq!(code, ResponseCode::Other("ErrorQuotaExceeded".to_string()));
        assert_eq!(code.to_string(), "ErrorQuotaExceeded");
    }

    #[test]
    fn objects_are_created_from_element_names() {
        let messages = read_messages(
            r#"<m:ResponseMessages>
                <m:GetItemResponseMessage ResponseClass="Success">
                    <m:ResponseCode>NoError</m:ResponseCode>
                    <m:Items>
                        <t:MeetingRequest>
                            <t:ItemId Id="AAMk" ChangeKey="CQAA"/>
                            <t:Subject>Planning</t:Subject>
                        </t:MeetingRequest>
                        <t:CalendarItem>
                            <t:Subject>Planning</t:Subject>
                        </t:CalendarItem>
                    </m:Items>
                </m:GetItemResponseMessage>
            </m:ResponseMessages>"#,
            &ServiceContext::default(),
        )
        .expect("response should be read");

        let [message] = messages.as_slice() else {
            panic!("expected exactly one response message");
        };
        assert!(message.is_success());

        let kinds: Vec<_> = message
            .objects
            .iter()
            .map(|object| (object.kind(), object.element_name()))
            .collect();
        assert_eq!(
            kinds,
            [
                (ServiceObjectKind::Message, "MeetingRequest"),
                (ServiceObjectKind::CalendarItem, "CalendarItem"),
            ]
        );
        assert_eq!(
            message.objects[0].bag().get_string(&item::SUBJECT).unwrap(),
            Some("Planning")
        );
    }

    #[test]
    fn error_message_is_read() {
        let messages = read_messages(
            r#"<m:ResponseMessages>
                <m:GetItemResponseMessage ResponseClass="Error">
                    <m:MessageText>The specified object was not found in the store.</m:MessageText>
                    <m:ResponseCode>ErrorItemNotFound</m:ResponseCode>
                    <m:DescriptiveLinkKey>0</m:DescriptiveLinkKey>
                    <m:Items/>
                </m:GetItemResponseMessage>
            </m:ResponseMessages>"#,
            &ServiceContext::default().with_parsing_mode(ParsingMode::Strict),
        )
        .expect("response should be read");

        let message = &messages[0];
        assert_eq!(message.response_class, ResponseClass::Error);
        assert_eq!(message.response_code, Some(ResponseCode::ErrorItemNotFound));
        assert_eq!(
            message.message_text.as_deref(),
            Some("The specified object was not found in the store.")
        );
        assert_eq!(message.descriptive_link_key, Some(0));
        assert!(message.objects.is_empty());
    }

    #[test]
    fn unregistered_entity_fails() {
        let err = read_messages(
            r#"<m:ResponseMessages>
                <m:GetItemResponseMessage ResponseClass="Success">
                    <m:Items><t:Task/></m:Items>
                </m:GetItemResponseMessage>
            </m:ResponseMessages>"#,
            &ServiceContext::default(),
        )
        .expect_err("tasks are not registered");

        assert!(matches!(err, Error::Schema(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn missing_response_class_is_rejected() {
        let err = read_messages(
            r#"<m:ResponseMessages><m:GetItemResponseMessage/></m:ResponseMessages>"#,
            &ServiceContext::default(),
        )
        .expect_err("response class is required");

        assert!(
            matches!(err, Error::UnexpectedResponse(_)),
            "unexpected error: {err:?}"
        );
    }
}
