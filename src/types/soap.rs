/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{
    fmt,
    io::{BufRead, Write},
};

use ews_xml::{XmlReader, XmlWriter};

use crate::{
    response::ResponseCode, Error, ExchangeServerVersion, Operation, OperationResponse,
    ServerVersionInfo, ServiceContext, XmlNamespace,
};

/// An element that can be found in the `soap:Header` section of a request or
/// a response.
///
/// See <https://www.w3.org/TR/2000/NOTE-SOAP-20000508/#_Toc478383497>
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Header {
    /// The schema version targeted by the attached request.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/requestserverversion>
    RequestServerVersion { version: ExchangeServerVersion },

    /// The version information of the Exchange Server instance that generated
    /// the attached response.
    ///
    /// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/serverversioninfo>
    ServerVersionInfo(ServerVersionInfo),
}

impl Header {
    fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        let types = context.namespaces.get(XmlNamespace::Types);

        match self {
            Header::RequestServerVersion { version } => {
                writer.write_start_element(types, "RequestServerVersion")?;
                writer.write_attribute_value("Version", version.as_str())?;
            }
            Header::ServerVersionInfo(info) => {
                writer.write_start_element(types, "ServerVersionInfo")?;
                writer.write_optional_attribute_value("MajorVersion", info.major_version.as_ref())?;
                writer.write_optional_attribute_value("MinorVersion", info.minor_version.as_ref())?;
                writer.write_optional_attribute_value(
                    "MajorBuildNumber",
                    info.major_build_number.as_ref(),
                )?;
                writer.write_optional_attribute_value(
                    "MinorBuildNumber",
                    info.minor_build_number.as_ref(),
                )?;
                writer.write_optional_attribute_value("Version", info.version.as_ref())?;
            }
        }
        writer.write_end_element()?;

        Ok(())
    }
}

/// A SOAP envelope containing the body of an EWS operation or response.
///
/// See <https://www.w3.org/TR/2000/NOTE-SOAP-20000508/#_Toc478383494>
#[derive(Clone, Debug)]
pub struct Envelope<B> {
    pub headers: Vec<Header>,
    pub body: B,
}

impl<B> Envelope<B>
where
    B: Operation,
{
    /// Wraps a request, targeting the protocol version of the session.
    pub fn new(body: B, context: &ServiceContext) -> Self {
        Self {
            headers: vec![Header::RequestServerVersion {
                version: context.version,
            }],
            body,
        }
    }

    /// Serializes the SOAP envelope as a complete XML document.
    pub fn as_xml_document(&self, context: &ServiceContext) -> Result<Vec<u8>, Error> {
        let soap = context.namespaces.get(XmlNamespace::Soap);
        let types = context.namespaces.get(XmlNamespace::Types);
        let messages = context.namespaces.get(XmlNamespace::Messages);

        let mut writer = XmlWriter::new(Vec::new());

        // All EWS examples use XML 1.0 with UTF-8, so stick to that for now.
        writer.write_declaration()?;

        writer.write_start_element(soap, "Envelope")?;
        writer.write_namespace_declaration(soap)?;
        writer.write_namespace_declaration(types)?;
        writer.write_namespace_declaration(messages)?;

        if !self.headers.is_empty() {
            writer.write_start_element(soap, "Header")?;
            for header in &self.headers {
                header.write_to_xml(&mut writer, context)?;
            }
            writer.write_end_element()?;
        }

        writer.write_start_element(soap, "Body")?;
        writer.write_start_element(messages, B::NAME)?;
        self.body.write_body(&mut writer, context)?;
        writer.write_end_element()?;
        writer.write_end_element()?;

        writer.write_end_element()?;

        Ok(writer.into_inner()?)
    }
}

impl<B> Envelope<B>
where
    B: OperationResponse,
{
    /// Populates an [`Envelope`] from raw XML.
    ///
    /// A `soap:Fault` in place of the response body is returned as
    /// [`Error::RequestFault`].
    pub fn from_xml_document(document: &[u8], context: &ServiceContext) -> Result<Self, Error> {
        let soap = context.namespaces.get(XmlNamespace::Soap);

        let mut reader = XmlReader::new(document);
        reader.read_start_element(Some(soap), "Envelope")?;

        let mut headers = Vec::new();
        let mut body = None;

        let depth = reader.depth();
        while reader.read_child_start(depth)? {
            if reader.is_start_element(Some(soap), Some("Header")) {
                read_headers(&mut reader, context, &mut headers)?;
            } else if reader.is_start_element(Some(soap), Some("Body")) {
                body = Some(read_body::<_, B>(&mut reader, context)?);
            } else {
                reader.skip_current_element()?;
            }
        }

        let body = body.ok_or_else(|| {
            Error::UnexpectedResponse("SOAP envelope has no body".to_string())
        })?;

        Ok(Envelope { headers, body })
    }

    /// The version information reported by the server, if any.
    pub fn server_version_info(&self) -> Option<&ServerVersionInfo> {
        self.headers.iter().find_map(|header| match header {
            Header::ServerVersionInfo(info) => Some(info),
            _ => None,
        })
    }
}

fn read_headers<R: BufRead>(
    reader: &mut XmlReader<R>,
    context: &ServiceContext,
    headers: &mut Vec<Header>,
) -> Result<(), Error> {
    let types = context.namespaces.get(XmlNamespace::Types);

    let depth = reader.depth();
    while reader.read_child_start(depth)? {
        if reader.is_start_element(Some(types), Some("ServerVersionInfo")) {
            let info = ServerVersionInfo::read_attributes_from_xml(reader);
            headers.push(Header::ServerVersionInfo(info));
        } else {
            log::debug!("ignoring SOAP header `{}`", reader.local_name());
        }

        reader.skip_current_element()?;
    }

    Ok(())
}

fn read_body<R, B>(reader: &mut XmlReader<R>, context: &ServiceContext) -> Result<B, Error>
where
    R: BufRead,
    B: OperationResponse,
{
    let soap = context.namespaces.get(XmlNamespace::Soap);
    let messages = context.namespaces.get(XmlNamespace::Messages);

    let depth = reader.depth();
    if !reader.read_child_start(depth)? {
        return Err(Error::UnexpectedResponse("SOAP body is empty".to_string()));
    }

    if reader.is_start_element(Some(soap), Some("Fault")) {
        let fault = Fault::read_from_xml(reader)?;
        return Err(Error::RequestFault(Box::new(fault)));
    }

    if !reader.is_start_element(Some(messages), Some(B::NAME)) {
        return Err(Error::UnexpectedResponse(format!(
            "expected `{}` in SOAP body, found `{}`",
            B::NAME,
            reader.local_name()
        )));
    }

    let body = B::read_body(reader, context)?;

    while reader.read_child_start(depth)? {
        reader.skip_current_element()?;
    }

    Ok(body)
}

/// A structured representation of a SOAP fault, indicating an error in an EWS
/// request.
///
/// See <https://www.w3.org/TR/2000/NOTE-SOAP-20000508/#_Toc478383507>
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fault {
    /// An error code indicating the fault in the original request.
    pub faultcode: String,

    /// A human-readable description of the error.
    pub faultstring: String,

    /// A URI indicating the SOAP actor responsible for the error.
    // This may be unused for EWS.
    pub faultactor: Option<String>,

    /// Clarifying information about EWS-specific errors.
    pub detail: Option<FaultDetail>,
}

impl Fault {
    fn read_from_xml<R: BufRead>(reader: &mut XmlReader<R>) -> Result<Self, Error> {
        let mut fault = Fault::default();

        let depth = reader.depth();
        while reader.read_child_start(depth)? {
            let name = reader.local_name().to_owned();
            match name.as_str() {
                "faultcode" => fault.faultcode = reader.read_element_text()?,
                "faultstring" => fault.faultstring = reader.read_element_text()?,
                "faultactor" => fault.faultactor = Some(reader.read_element_text()?),
                "detail" => fault.detail = Some(FaultDetail::read_from_xml(reader)?),
                _ => reader.skip_current_element()?,
            }
        }

        Ok(fault)
    }

    /// The delay the server asked the client to wait before retrying, if the
    /// fault was caused by throttling.
    pub fn backoff_milliseconds(&self) -> Option<u64> {
        let detail = self.detail.as_ref()?;

        detail
            .message_xml
            .iter()
            .find(|value| value.name == "BackOffMilliseconds")
            .and_then(|value| value.value.trim().parse().ok())
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.faultcode, self.faultstring)
    }
}

/// EWS-specific details regarding a SOAP fault.
///
/// This element is not documented in the EWS reference.
#[derive(Clone, Debug, Default, PartialEq)]
#[non_exhaustive]
pub struct FaultDetail {
    /// An error code indicating the nature of the issue.
    pub response_code: Option<ResponseCode>,

    /// A human-readable description of the error.
    pub message: Option<String>,

    /// Error-specific information to aid in understanding or responding to
    /// the error, in document order.
    pub message_xml: Vec<MessageXmlValue>,
}

impl FaultDetail {
    fn read_from_xml<R: BufRead>(reader: &mut XmlReader<R>) -> Result<Self, Error> {
        let mut detail = FaultDetail::default();

        let depth = reader.depth();
        while reader.read_child_start(depth)? {
            let name = reader.local_name().to_owned();
            match name.as_str() {
                "ResponseCode" => {
                    let code = reader.read_element_text()?;
                    detail.response_code = Some(ResponseCode::from_wire(code.trim()));
                }
                "Message" => detail.message = Some(reader.read_element_text()?),
                "MessageXml" => detail.message_xml = read_message_xml(reader)?,
                _ => reader.skip_current_element()?,
            }
        }

        Ok(detail)
    }
}

/// A named value from the `MessageXml` element of an error.
///
/// Values are either written as `<t:Value Name="...">`, in which case the
/// name is taken from the attribute, or as bare elements, in which case it
/// is the element's local name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageXmlValue {
    pub name: String,
    pub value: String,
}

/// Reads the values of a `MessageXml` element, as found in faults and
/// response messages.
pub(crate) fn read_message_xml<R: BufRead>(
    reader: &mut XmlReader<R>,
) -> Result<Vec<MessageXmlValue>, Error> {
    let mut values = Vec::new();

    let depth = reader.depth();
    while reader.read_child_start(depth)? {
        let name = match reader.read_attribute_value("Name") {
            Some(name) if reader.local_name() == "Value" => name.to_owned(),
            _ => reader.local_name().to_owned(),
        };
        let value = reader.read_element_text()?;

        values.push(MessageXmlValue { name, value });
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        response::{operation_response, ResponseClass},
        test_utils::*,
    };

    /// A request without content.
    struct Ping;

    impl Operation for Ping {
        type Response = PingResponse;
        const NAME: &'static str = "Ping";

        fn write_body<W: Write>(
            &self,
            _writer: &mut XmlWriter<W>,
            _context: &ServiceContext,
        ) -> Result<(), Error> {
            Ok(())
        }
    }

    operation_response!(PingResponse, "PingResponse", "PingResponseMessage");

    #[test]
    fn serialize_envelope_with_version_header() {
        let context = ServiceContext::new(ExchangeServerVersion::Exchange2013);
        let envelope = Envelope::new(Ping, &context);

        let document = envelope
            .as_xml_document(&context)
            .expect("serialization should succeed");

        assert_eq!(
            std::str::from_utf8(&document).unwrap(),
            r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types" xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages"><soap:Header><t:RequestServerVersion Version="Exchange2013"/></soap:Header><soap:Body><m:Ping/></soap:Body></soap:Envelope>"#
        );
    }

    #[test]
    fn deserialize_envelope_with_version_header() {
        let xml = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Header>
                    <h:ServerVersionInfo MajorVersion="15" MinorVersion="20" MajorBuildNumber="7452" MinorBuildNumber="50" Version="V2018_01_08" xmlns:h="http://schemas.microsoft.com/exchange/services/2006/types"/>
                </s:Header>
                <s:Body>
                    <m:PingResponse {MESSAGES_NS} {TYPES_NS}>
                        <m:ResponseMessages>
                            <m:PingResponseMessage ResponseClass="Success">
                                <m:ResponseCode>NoError</m:ResponseCode>
                            </m:PingResponseMessage>
                        </m:ResponseMessages>
                    </m:PingResponse>
                </s:Body>
            </s:Envelope>"#
        );

        let envelope = Envelope::<PingResponse>::from_xml_document(
            xml.as_bytes(),
            &ServiceContext::default(),
        )
        .expect("deserialization should succeed");

        let info = envelope
            .server_version_info()
            .expect("version header should be read");
        assert_eq!(info.major_version.as_deref(), Some("15"));
        assert_eq!(info.version.as_deref(), Some("V2018_01_08"));
        assert_eq!(info.server_version(), None);

        let [message] = envelope.body.response_messages.as_slice() else {
            panic!("expected exactly one response message");
        };
        assert_eq!(message.response_class, ResponseClass::Success);
        assert_eq!(message.response_code, Some(ResponseCode::NoError));
    }

    #[test]
    fn deserialize_envelope_with_schema_fault() {
        // This XML is drawn from testing data for `evolution-ews`.
        let xml = r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode xmlns:a="http://schemas.microsoft.com/exchange/services/2006/types">a:ErrorSchemaValidation</faultcode><faultstring xml:lang="en-US">The request failed schema validation: The 'Id' attribute is invalid.</faultstring><detail><e:ResponseCode xmlns:e="http://schemas.microsoft.com/exchange/services/2006/errors">ErrorSchemaValidation</e:ResponseCode><e:Message xmlns:e="http://schemas.microsoft.com/exchange/services/2006/errors">The request failed schema validation.</e:Message><t:MessageXml xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"><t:LineNumber>2</t:LineNumber><t:LinePosition>630</t:LinePosition></t:MessageXml></detail></s:Fault></s:Body></s:Envelope>"#;

        let err = Envelope::<PingResponse>::from_xml_document(
            xml.as_bytes(),
            &ServiceContext::default(),
        )
        .expect_err("should return error when body contains fault");

        let Error::RequestFault(fault) = err else {
            panic!("error should be request fault, got: {err:?}");
        };

        assert_eq!(
            fault.faultcode, "a:ErrorSchemaValidation",
            "fault code should match original document"
        );
        assert!(fault.faultactor.is_none(), "fault actor should not be present");

        let detail = fault.detail.as_ref().expect("fault detail should be present");
        assert_eq!(detail.response_code, Some(ResponseCode::ErrorSchemaValidation));
        assert_eq!(
            detail.message.as_deref(),
            Some("The request failed schema validation.")
        );
        assert_eq!(
            detail.message_xml,
            [
                MessageXmlValue {
                    name: "LineNumber".to_string(),
                    value: "2".to_string(),
                },
                MessageXmlValue {
                    name: "LinePosition".to_string(),
                    value: "630".to_string(),
                },
            ],
            "message XML should list all tags in order"
        );
        assert_eq!(fault.backoff_milliseconds(), None);
    }

    #[test]
    fn deserialize_envelope_with_server_busy_fault() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode xmlns:a="http://schemas.microsoft.com/exchange/services/2006/types">a:ErrorServerBusy</faultcode><faultstring xml:lang="en-US">The server cannot service this request right now.</faultstring><detail><e:ResponseCode xmlns:e="http://schemas.microsoft.com/exchange/services/2006/errors">ErrorServerBusy</e:ResponseCode><t:MessageXml xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types"><t:Value Name="BackOffMilliseconds">25</t:Value></t:MessageXml></detail></s:Fault></s:Body></s:Envelope>"#;

        let err = Envelope::<PingResponse>::from_xml_document(
            xml.as_bytes(),
            &ServiceContext::default(),
        )
        .expect_err("should return error when body contains fault");

        let Error::RequestFault(fault) = err else {
            panic!("error should be request fault, got: {err:?}");
        };
        assert_eq!(fault.backoff_milliseconds(), Some(25));
        assert_eq!(
            fault.to_string(),
            "a:ErrorServerBusy: The server cannot service this request right now."
        );
    }

    #[test]
    fn unexpected_body_is_rejected() {
        let xml = format!(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><m:GetItemResponse {MESSAGES_NS}/></s:Body></s:Envelope>"#
        );

        let err = Envelope::<PingResponse>::from_xml_document(
            xml.as_bytes(),
            &ServiceContext::default(),
        )
        .expect_err("mismatched response should fail");

        assert!(
            matches!(err, Error::UnexpectedResponse(_)),
            "unexpected error: {err:?}"
        );
    }
}
