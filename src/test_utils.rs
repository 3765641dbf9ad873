/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Cursor;

use ews_xml::{NodeKind, XmlReader, XmlWriter};

use crate::{Error, Operation, ServiceContext, ServiceObject, ServiceObjectKind, XmlNamespace};

/// The declaration of the `t` prefix, for use in the root element of test
/// documents.
pub const TYPES_NS: &str = r#"xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types""#;

/// The declaration of the `m` prefix.
pub const MESSAGES_NS: &str =
    r#"xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages""#;

/// Runs `write` against a fresh writer and returns the produced document.
pub fn write_to_string<F>(context: &ServiceContext, write: F) -> Result<String, Error>
where
    F: FnOnce(&mut XmlWriter<Vec<u8>>, &ServiceContext) -> Result<(), Error>,
{
    let mut writer = XmlWriter::new(Vec::new());
    write(&mut writer, context)?;

    let buf = writer.into_inner()?;

    String::from_utf8(buf).map_err(|err| Error::UnexpectedResponse(err.to_string()))
}

/// Assert the expected result of XML serialization with a default context.
pub fn assert_serialized_content<F>(write: F, expected_xml_content: &str)
where
    F: FnOnce(&mut XmlWriter<Vec<u8>>, &ServiceContext) -> Result<(), Error>,
{
    let actual_xml_content =
        write_to_string(&ServiceContext::default(), write).expect("serialization should succeed");

    assert_eq!(actual_xml_content, expected_xml_content);
}

/// Assert the expected result of serializing a request element with a
/// default context.
pub fn assert_serialized_request<O: Operation>(operation: &O, expected_xml_content: &str) {
    assert_serialized_content(
        |writer, context| {
            writer.write_start_element(context.namespaces.get(XmlNamespace::Messages), O::NAME)?;
            operation.write_body(writer, context)?;
            writer.write_end_element()?;

            Ok(())
        },
        expected_xml_content,
    );
}

/// Creates a reader over a copy of `xml`, positioned on its root element.
pub fn reader_at_root(xml: &str) -> XmlReader<Cursor<Vec<u8>>> {
    let mut reader = XmlReader::new(Cursor::new(xml.as_bytes().to_vec()));

    loop {
        match reader.read().expect("test document should be well-formed") {
            NodeKind::StartElement => return reader,
            NodeKind::Eof => panic!("test document has no root element"),
            _ => continue,
        }
    }
}

/// Reads an object of the given kind from `xml`, whose root element uses the
/// `t` prefix without declaring it.
pub fn load_object(
    kind: ServiceObjectKind,
    xml: &str,
    context: &ServiceContext,
) -> Result<ServiceObject, Error> {
    let xml = xml.trim();
    let name_end = xml
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_whitespace() || *c == '>' || *c == '/')
        .map(|(index, _)| index)
        .expect("test document should have a root element");
    let declared = format!("{} {TYPES_NS}{}", &xml[..name_end], &xml[name_end..]);

    let mut reader = reader_at_root(&declared);
    let mut object = ServiceObject::new(kind);
    object.load_from_xml(&mut reader, context)?;

    Ok(object)
}
