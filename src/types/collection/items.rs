/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::{BufRead, Write};

use ews_xml::{XmlReader, XmlWriter};

use crate::{
    types::collection::write_text_element, CollectionItem, EmailAddressDictionary, EmailAddressKey,
    Error, ServiceContext, XmlNamespace,
};

impl CollectionItem for String {
    const ELEMENT_NAME: &'static str = "String";

    fn read_from_xml<R: BufRead>(
        reader: &mut XmlReader<R>,
        _context: &ServiceContext,
    ) -> Result<Self, Error> {
        Ok(reader.read_element_text()?)
    }

    fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        write_text_element(writer, context, Self::ELEMENT_NAME, self)
    }
}

/// A header of the MIME representation of a message.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/internetmessageheader>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternetMessageHeader {
    pub name: String,
    pub value: String,
}

impl CollectionItem for InternetMessageHeader {
    const ELEMENT_NAME: &'static str = "InternetMessageHeader";

    fn read_from_xml<R: BufRead>(
        reader: &mut XmlReader<R>,
        _context: &ServiceContext,
    ) -> Result<Self, Error> {
        let name = reader
            .read_attribute_value("HeaderName")
            .unwrap_or_default()
            .to_owned();
        let value = reader.read_element_text()?;

        Ok(Self { name, value })
    }

    fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        writer.write_start_element(
            context.namespaces.get(XmlNamespace::Types),
            Self::ELEMENT_NAME,
        )?;
        writer.write_attribute_value("HeaderName", self.name.as_str())?;
        writer.write_value(self.value.as_str())?;
        writer.write_end_element()?;

        Ok(())
    }
}

/// An entry of a contact's e-mail addresses.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/entry-emailaddress>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailAddressEntry {
    pub key: EmailAddressKey,
    pub address: String,
}

impl CollectionItem for EmailAddressEntry {
    const ELEMENT_NAME: &'static str = "Entry";

    fn read_from_xml<R: BufRead>(
        reader: &mut XmlReader<R>,
        _context: &ServiceContext,
    ) -> Result<Self, Error> {
        let key = reader
            .read_attribute::<EmailAddressKey>("Key")?
            .ok_or_else(|| Error::Parse {
                element: "Entry/@Key".to_string(),
                value: String::new(),
                expected: "EmailAddressKey",
            })?;
        let address = reader.read_element_text()?;

        Ok(Self { key, address })
    }

    fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        writer.write_start_element(
            context.namespaces.get(XmlNamespace::Types),
            Self::ELEMENT_NAME,
        )?;
        writer.write_attribute_value("Key", &self.key)?;
        writer.write_value(self.address.as_str())?;
        writer.write_end_element()?;

        Ok(())
    }

    fn index_key(&self) -> Option<&'static str> {
        Some(self.key.as_str())
    }
}

impl EmailAddressDictionary {
    /// The address stored under the given key.
    pub fn address(&self, key: EmailAddressKey) -> Option<&str> {
        self.iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.address.as_str())
    }

    /// Stores an address under the given key, replacing any present one.
    pub fn insert(&mut self, key: EmailAddressKey, address: impl Into<String>) {
        let address = address.into();

        let position = self.iter().position(|entry| entry.key == key);
        match position {
            Some(index) => {
                self.modify(index, |entry| entry.address = address);
            }
            None => self.add(EmailAddressEntry { key, address }),
        }
    }

    /// Removes the address stored under the given key. Returns `false` if
    /// there was none.
    pub fn remove_key(&mut self, key: EmailAddressKey) -> bool {
        let position = self.iter().position(|entry| entry.key == key);
        position.is_some_and(|index| self.remove_at(index).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::*, ComplexProperty, ItemState};

    #[test]
    fn dictionary_is_read_by_key() {
        let context = ServiceContext::default();
        let mut reader = reader_at_root(&format!(
            r#"<t:EmailAddresses {TYPES_NS}>
                <t:Entry Key="EmailAddress1">ada@example.com</t:Entry>
                <t:Entry Key="EmailAddress3">ada@example.org</t:Entry>
            </t:EmailAddresses>"#
        ));

        let mut addresses = EmailAddressDictionary::new();
        addresses
            .load_from_xml(&mut reader, &context)
            .expect("dictionary should be read");

        assert_eq!(
            addresses.address(EmailAddressKey::EmailAddress1),
            Some("ada@example.com")
        );
        assert_eq!(addresses.address(EmailAddressKey::EmailAddress2), None);
        assert_eq!(
            addresses.address(EmailAddressKey::EmailAddress3),
            Some("ada@example.org")
        );
    }

    #[test]
    fn entry_without_key_is_rejected() {
        let context = ServiceContext::default();
        let mut reader = reader_at_root(&format!(
            "<t:EmailAddresses {TYPES_NS}><t:Entry>ada@example.com</t:Entry></t:EmailAddresses>"
        ));

        let err = EmailAddressDictionary::new()
            .load_from_xml(&mut reader, &context)
            .expect_err("entry without key should be rejected");

        assert!(matches!(err, Error::Parse { .. }), "unexpected error: {err:?}");
    }

    #[test]
    fn replacing_removed_key_modifies_entry() {
        let mut addresses = EmailAddressDictionary::new();
        addresses.insert(EmailAddressKey::EmailAddress1, "old@example.com");
        addresses.clear_change_log();

        assert!(addresses.remove_key(EmailAddressKey::EmailAddress1));
        addresses.insert(EmailAddressKey::EmailAddress1, "new@example.com");

        assert_eq!(
            addresses.entries().collect::<Vec<_>>(),
            [(
                &EmailAddressEntry {
                    key: EmailAddressKey::EmailAddress1,
                    address: "new@example.com".to_string(),
                },
                ItemState::Modified
            )],
            "the key should be addressed once"
        );
    }

    #[test]
    fn header_is_written_with_name() {
        let header = InternetMessageHeader {
            name: "X-Mailer".to_string(),
            value: "Thunderbird".to_string(),
        };

        assert_serialized_content(
            |writer, context| header.write_to_xml(writer, context),
            r#"<t:InternetMessageHeader HeaderName="X-Mailer">Thunderbird</t:InternetMessageHeader>"#,
        );
    }
}
