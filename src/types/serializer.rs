/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Reading and writing property bags by walking their schema.

use std::io::{self, BufRead, Write};

use ews_xml::{XmlReader, XmlWriter};

use crate::{
    types::complex::skip_unknown_element, ComplexValue, Error, PropertyBag,
    PropertyDefinition, PropertyFlags, PropertyKind, PropertyValue, ServiceContext, XmlNamespace,
};

/// What a property bag is written for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Every assigned property which may be set, as the content of the
    /// entity element in a creation request.
    Create,

    /// The modified properties, as the field updates of an `ItemChange`.
    /// Updated values are wrapped in an element with the given name.
    ItemUpdate { element_name: &'static str },

    /// The modified properties, as the field updates of a `FolderChange`.
    /// Updated values are wrapped in an element with the given name.
    FolderUpdate { element_name: &'static str },
}

impl PropertyBag {
    /// Reads the properties of an entity from the children of the element
    /// the reader is positioned on, leaving the reader on its end element.
    ///
    /// Each child is resolved against the bag's schema by namespace and
    /// local name. Properties read replace any local value and are no longer
    /// considered modified. Unknown children are skipped, unless the context
    /// uses [`ParsingMode::Strict`](crate::ParsingMode::Strict).
    pub fn load_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        self.load_properties(reader, context, false)
    }

    /// Reads an entity returned by a listing such as `FindItem`, which only
    /// carries summary properties.
    ///
    /// Reading a property afterwards which was not returned and cannot be
    /// searched on reports that it must be loaded explicitly.
    pub fn load_summary_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        self.load_properties(reader, context, true)
    }

    fn load_properties<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
        summary_only: bool,
    ) -> Result<(), Error> {
        let schema = self.schema();

        let depth = reader.depth();
        while reader.read_child_start(depth)? {
            let index = context
                .namespaces
                .resolve(reader.namespace_uri())
                .and_then(|namespace| schema.resolve_index(namespace, reader.local_name()));

            let Some(index) = index else {
                skip_unknown_element(reader, context)?;
                continue;
            };

            let definition = schema.definition(index);
            let value = self.read_property(index, definition, reader, context)?;
            self.store_loaded(index, value);
        }

        self.finish_load(summary_only);

        Ok(())
    }

    fn read_property<R: BufRead>(
        &mut self,
        index: usize,
        definition: &'static PropertyDefinition,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<Option<PropertyValue>, Error> {
        match definition.kind {
            PropertyKind::Complex(new) | PropertyKind::Collection(new) => {
                let existing = if definition.has_flag(PropertyFlags::REUSE_INSTANCE) {
                    self.take_complex_at(index)
                } else {
                    None
                };
                let reused = existing.is_some();
                let mut value = existing.unwrap_or_else(new);

                if let Err(err) = value.load_from_xml(reader, context) {
                    if reused {
                        self.restore_complex_at(index, value);
                    }
                    return Err(err);
                }
                value.clear_change_log();

                Ok(Some(PropertyValue::Complex(value)))
            }
            kind => {
                let text = reader.read_element_text()?;
                if text.is_empty()
                    && definition.has_flag(PropertyFlags::IS_NULLABLE)
                    && !matches!(kind, PropertyKind::String)
                {
                    return Ok(None);
                }

                match PropertyValue::from_xml_text(&kind, &text) {
                    Some(Ok(value)) => Ok(Some(value)),
                    Some(Err(err)) => Err(Error::Parse {
                        element: definition.xml_element_name.to_string(),
                        value: text,
                        expected: err.expected,
                    }),
                    None => Ok(None),
                }
            }
        }
    }

    /// Writes the properties of the bag in schema order.
    ///
    /// Properties which require a newer protocol version than the context's
    /// are silently omitted.
    pub fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
        mode: WriteMode,
    ) -> Result<(), Error> {
        match mode {
            WriteMode::Create => self.write_properties(writer, context),
            WriteMode::ItemUpdate { element_name } => {
                self.write_updates(&mut UpdateWriter::new(writer, context, false, element_name))
            }
            WriteMode::FolderUpdate { element_name } => {
                self.write_updates(&mut UpdateWriter::new(writer, context, true, element_name))
            }
        }
    }

    /// The number of field updates the bag would produce when written in the
    /// given update mode. Always zero for [`WriteMode::Create`].
    pub fn pending_update_count(
        &self,
        context: &ServiceContext,
        mode: WriteMode,
    ) -> Result<usize, Error> {
        let mut writer = XmlWriter::new(io::sink());
        let mut update = match mode {
            WriteMode::Create => return Ok(0),
            WriteMode::ItemUpdate { element_name } => {
                UpdateWriter::new(&mut writer, context, false, element_name)
            }
            WriteMode::FolderUpdate { element_name } => {
                UpdateWriter::new(&mut writer, context, true, element_name)
            }
        };
        self.write_updates(&mut update)?;

        Ok(update.written)
    }

    fn write_properties<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        for (index, &definition) in self.schema().definitions().iter().enumerate() {
            if !definition.has_flag(PropertyFlags::CAN_SET)
                || !(self.is_loaded_at(index) || self.is_modified_at(index))
            {
                continue;
            }

            let Some(value) = self.value_at(index) else {
                continue;
            };

            if !context.supports(definition.version) {
                log::trace!(
                    "omitting `{}`, which requires {}",
                    definition.uri,
                    definition.version
                );
                continue;
            }

            write_property(writer, context, definition, value)?;
        }

        Ok(())
    }

    fn write_updates<W: Write>(&self, update: &mut UpdateWriter<'_, W>) -> Result<(), Error> {
        for (index, &definition) in self.schema().definitions().iter().enumerate() {
            if !self.is_modified_at(index) {
                continue;
            }

            if !update.context.supports(definition.version) {
                log::trace!(
                    "omitting update of `{}`, which requires {}",
                    definition.uri,
                    definition.version
                );
                continue;
            }

            match self.value_at(index) {
                None if definition.has_flag(PropertyFlags::CAN_DELETE) => {
                    update.delete_field(definition)?
                }
                None => log::debug!("`{}` has no value and cannot be deleted", definition.uri),
                Some(PropertyValue::Complex(value)) => value.write_update(definition, update)?,
                Some(value)
                    if value.is_empty() && definition.has_flag(PropertyFlags::CAN_DELETE) =>
                {
                    update.delete_field(definition)?
                }
                Some(value) => update.set_field(definition, |writer, context| {
                    write_scalar(writer, context, definition, value, true)
                })?,
            }
        }

        Ok(())
    }
}

impl ComplexValue {
    /// Writes the field updates describing the changes to this value.
    pub(crate) fn write_update<W: Write>(
        &self,
        definition: &'static PropertyDefinition,
        update: &mut UpdateWriter<'_, W>,
    ) -> Result<(), Error> {
        match self {
            ComplexValue::Strings(collection) => collection.write_update(definition, update),
            ComplexValue::EmailAddresses(collection) => collection.write_update(definition, update),
            ComplexValue::InternetMessageHeaders(collection) => {
                collection.write_update(definition, update)
            }
            ComplexValue::EmailAddressDictionary(collection) => {
                collection.write_update(definition, update)
            }
            value if value.is_empty() && definition.has_flag(PropertyFlags::CAN_DELETE) => {
                update.delete_field(definition)
            }
            value => update.set_field(definition, |writer, context| {
                value.write_to_xml(
                    writer,
                    definition.namespace,
                    definition.xml_element_name,
                    context,
                )
            }),
        }
    }
}

/// Writes the element of a property holding the given value.
fn write_property<W: Write>(
    writer: &mut XmlWriter<W>,
    context: &ServiceContext,
    definition: &PropertyDefinition,
    value: &PropertyValue,
) -> Result<(), Error> {
    let emit_empty = definition.has_flag(PropertyFlags::EMIT_EMPTY);

    match value {
        PropertyValue::Complex(value) => {
            if value.is_empty() && !emit_empty {
                return Ok(());
            }

            value.write_to_xml(
                writer,
                definition.namespace,
                definition.xml_element_name,
                context,
            )
        }
        value => write_scalar(writer, context, definition, value, emit_empty),
    }
}

fn write_scalar<W: Write>(
    writer: &mut XmlWriter<W>,
    context: &ServiceContext,
    definition: &PropertyDefinition,
    value: &PropertyValue,
    emit_empty: bool,
) -> Result<(), Error> {
    let Some(text) = value.to_xml_text()? else {
        return Ok(());
    };

    let namespace = context.namespaces.get(definition.namespace);
    if text.is_empty() {
        if emit_empty {
            writer.write_empty_element(namespace, definition.xml_element_name)?;
        }
        return Ok(());
    }

    writer.write_element_value(namespace, definition.xml_element_name, text.as_ref())?;

    Ok(())
}

/// Writes the set, append and delete field descriptions of an update
/// request.
pub(crate) struct UpdateWriter<'a, W: Write> {
    writer: &'a mut XmlWriter<W>,
    context: &'a ServiceContext,
    folder: bool,

    /// The name of the element wrapping updated values, e.g. `Message`.
    element_name: &'a str,

    /// The number of field updates written so far.
    written: usize,
}

#[derive(Clone, Copy)]
enum UpdateVerb {
    Set,
    Append,
    Delete,
}

impl<'a, W: Write> UpdateWriter<'a, W> {
    fn new(
        writer: &'a mut XmlWriter<W>,
        context: &'a ServiceContext,
        folder: bool,
        element_name: &'a str,
    ) -> Self {
        Self {
            writer,
            context,
            folder,
            element_name,
            written: 0,
        }
    }

    /// Replaces the value of a property with the element written by
    /// `write_value`.
    pub(crate) fn set_field<F>(
        &mut self,
        definition: &PropertyDefinition,
        write_value: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&mut XmlWriter<W>, &ServiceContext) -> Result<(), Error>,
    {
        self.write_change(UpdateVerb::Set, definition, None, write_value)
    }

    /// Adds the entries in the element written by `write_value` to a
    /// collection property.
    pub(crate) fn append_field<F>(
        &mut self,
        definition: &PropertyDefinition,
        write_value: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&mut XmlWriter<W>, &ServiceContext) -> Result<(), Error>,
    {
        self.write_change(UpdateVerb::Append, definition, None, write_value)
    }

    pub(crate) fn delete_field(&mut self, definition: &PropertyDefinition) -> Result<(), Error> {
        self.write_deletion(definition, None)
    }

    /// Replaces one entry of an indexed property.
    pub(crate) fn set_indexed_field<F>(
        &mut self,
        definition: &PropertyDefinition,
        key: &str,
        write_value: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&mut XmlWriter<W>, &ServiceContext) -> Result<(), Error>,
    {
        self.write_change(UpdateVerb::Set, definition, Some(key), write_value)
    }

    pub(crate) fn delete_indexed_field(
        &mut self,
        definition: &PropertyDefinition,
        key: &str,
    ) -> Result<(), Error> {
        self.write_deletion(definition, Some(key))
    }

    fn write_change<F>(
        &mut self,
        verb: UpdateVerb,
        definition: &PropertyDefinition,
        key: Option<&str>,
        write_value: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&mut XmlWriter<W>, &ServiceContext) -> Result<(), Error>,
    {
        let types = self.context.namespaces.get(XmlNamespace::Types);
        let verb = self.verb_name(verb);

        self.writer.write_start_element(types, verb)?;
        self.write_path(definition, key)?;
        self.writer.write_start_element(types, self.element_name)?;
        write_value(&mut *self.writer, self.context)?;
        self.writer.write_end_element()?;
        self.writer.write_end_element()?;
        self.written += 1;

        Ok(())
    }

    fn write_deletion(&mut self, definition: &PropertyDefinition, key: Option<&str>) -> Result<(), Error> {
        let types = self.context.namespaces.get(XmlNamespace::Types);
        let verb = self.verb_name(UpdateVerb::Delete);

        self.writer.write_start_element(types, verb)?;
        self.write_path(definition, key)?;
        self.writer.write_end_element()?;
        self.written += 1;

        Ok(())
    }

    /// Writes the path addressing a property, or one entry of an indexed
    /// property.
    fn write_path(&mut self, definition: &PropertyDefinition, key: Option<&str>) -> Result<(), Error> {
        let types = self.context.namespaces.get(XmlNamespace::Types);

        match key {
            None => {
                self.writer.write_start_element(types, "FieldURI")?;
                self.writer.write_attribute_value("FieldURI", definition.uri)?;
            }
            Some(key) => {
                self.writer.write_start_element(types, "IndexedFieldURI")?;
                self.writer.write_attribute_value("FieldURI", definition.uri)?;
                self.writer.write_attribute_value("FieldIndex", key)?;
            }
        }
        self.writer.write_end_element()?;

        Ok(())
    }

    fn verb_name(&self, verb: UpdateVerb) -> &'static str {
        match (verb, self.folder) {
            (UpdateVerb::Set, false) => "SetItemField",
            (UpdateVerb::Append, false) => "AppendToItemField",
            (UpdateVerb::Delete, false) => "DeleteItemField",
            (UpdateVerb::Set, true) => "SetFolderField",
            (UpdateVerb::Append, true) => "AppendToFolderField",
            (UpdateVerb::Delete, true) => "DeleteFolderField",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use time::macros::datetime;

    use super::*;
    use crate::{
        schemas::{calendar_item, contact, item, message},
        test_utils::*,
        DayOfWeek, EmailAddressCollection, EmailAddressDictionary, EmailAddressEntry, EmailAddressKey,
        Body, DateTime, EntitySchema, ExchangeServerVersion, Importance, ItemState, ParsingMode,
        Recurrence, ServiceObject, ServiceObjectKind, StringList,
    };

    fn write_update(object: &ServiceObject, context: &ServiceContext) -> String {
        write_to_string(context, |writer, context| {
            object.bag().write_to_xml(
                writer,
                context,
                WriteMode::ItemUpdate {
                    element_name: object.element_name(),
                },
            )
        })
        .expect("update should be written")
    }

    #[test]
    fn update_contains_only_changed_properties() {
        let context = ServiceContext::default();
        let mut received = load_object(
            ServiceObjectKind::Message,
            "<t:Message><t:Subject>Hello</t:Subject><t:IsRead>true</t:IsRead></t:Message>",
            &context,
        )
        .unwrap();

        assert_eq!(received.bag().get_string(&item::SUBJECT).unwrap(), Some("Hello"));
        assert_eq!(received.bag().get_bool(&message::IS_READ).unwrap(), Some(true));

        received.set(&item::SUBJECT, "Bye").unwrap();

        assert_eq!(
            write_update(&received, &context),
            r#"<t:SetItemField><t:FieldURI FieldURI="item:Subject"/><t:Message><t:Subject>Bye</t:Subject></t:Message></t:SetItemField>"#
        );
    }

    #[test]
    fn unknown_elements_are_skipped() {
        let received = load_object(
            ServiceObjectKind::Message,
            "<t:Message>\
                <t:Subject>1</t:Subject>\
                <t:Flag><t:FlagStatus>Flagged</t:FlagStatus></t:Flag>\
                <t:IsRead>1</t:IsRead>\
            </t:Message>",
            &ServiceContext::default(),
        )
        .expect("unknown element should be tolerated");

        assert_eq!(received.bag().get_string(&item::SUBJECT).unwrap(), Some("1"));
        assert_eq!(received.bag().get_bool(&message::IS_READ).unwrap(), Some(true));
    }

    #[test]
    fn summary_load_requires_explicit_load_of_other_properties() {
        let mut reader = reader_at_root(&format!(
            "<t:Message {TYPES_NS}><t:Subject>Hello</t:Subject></t:Message>"
        ));
        let mut received = ServiceObject::new(ServiceObjectKind::Message);
        received
            .bag_mut()
            .load_summary_from_xml(&mut reader, &ServiceContext::default())
            .unwrap();

        assert!(received.bag().only_summary_properties_loaded());
        assert_eq!(received.bag().get_string(&item::SUBJECT).unwrap(), Some("Hello"));

        let err = received.get(&item::BODY).expect_err("body was not loaded");
        assert!(
            matches!(err, Error::PropertyAccess { explicit_load: true, .. }),
            "unexpected error: {err:?}"
        );

        let err = received
            .get(&item::IMPORTANCE)
            .expect_err("importance was not loaded");
        assert!(
            matches!(err, Error::PropertyAccess { explicit_load: false, .. }),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn strict_mode_rejects_unknown_elements() {
        let context = ServiceContext::default().with_parsing_mode(ParsingMode::Strict);

        let err = load_object(
            ServiceObjectKind::Message,
            "<t:Message><t:Subject>1</t:Subject><t:Flag/></t:Message>",
            &context,
        )
        .expect_err("unknown element should be rejected");

        assert!(matches!(err, Error::Schema(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn invalid_value_names_its_element() {
        let err = load_object(
            ServiceObjectKind::Message,
            "<t:Message><t:IsRead>maybe</t:IsRead></t:Message>",
            &ServiceContext::default(),
        )
        .expect_err("invalid boolean should be rejected");

        match err {
            Error::Parse {
                element,
                value,
                expected,
            } => {
                assert_eq!(element, "IsRead");
                assert_eq!(value, "maybe");
                assert_eq!(expected, "boolean");
            }
            err => panic!("unexpected error: {err:?}"),
        }
    }

    #[test]
    fn newer_properties_are_read_but_not_written() {
        let context = ServiceContext::new(ExchangeServerVersion::Exchange2007_SP1);
        let mut received = load_object(
            ServiceObjectKind::CalendarItem,
            "<t:CalendarItem>\
                <t:Subject>Standup</t:Subject>\
                <t:StartTimeZoneId>W. Europe Standard Time</t:StartTimeZoneId>\
            </t:CalendarItem>",
            &context,
        )
        .unwrap();

        assert_eq!(
            received
                .bag()
                .get_string(&calendar_item::START_TIME_ZONE_ID)
                .unwrap(),
            Some("W. Europe Standard Time")
        );

        received
            .set(&calendar_item::START_TIME_ZONE_ID, "UTC")
            .unwrap();
        assert!(received.is_dirty());
        assert_eq!(write_update(&received, &context), "");

        let newer = ServiceContext::new(ExchangeServerVersion::Exchange2010);
        assert_eq!(
            write_update(&received, &newer),
            r#"<t:SetItemField><t:FieldURI FieldURI="calendar:StartTimeZoneId"/><t:CalendarItem><t:StartTimeZoneId>UTC</t:StartTimeZoneId></t:CalendarItem></t:SetItemField>"#
        );
    }

    #[test]
    fn removing_recipient_replaces_collection() {
        let context = ServiceContext::default();
        let mut received = load_object(
            ServiceObjectKind::Message,
            "<t:Message><t:ToRecipients>\
                <t:Mailbox><t:Name>Ada</t:Name><t:EmailAddress>ada@example.com</t:EmailAddress></t:Mailbox>\
                <t:Mailbox><t:Name>Grace</t:Name><t:EmailAddress>grace@example.com</t:EmailAddress></t:Mailbox>\
            </t:ToRecipients></t:Message>",
            &context,
        )
        .unwrap();

        let recipients = received
            .bag_mut()
            .complex_mut::<EmailAddressCollection>(&message::TO_RECIPIENTS)
            .unwrap()
            .expect("recipients were loaded");
        assert!(recipients.remove_at(0).is_some());

        assert_eq!(
            write_update(&received, &context),
            r#"<t:SetItemField><t:FieldURI FieldURI="message:ToRecipients"/><t:Message><t:ToRecipients><t:Mailbox><t:Name>Grace</t:Name><t:EmailAddress>grace@example.com</t:EmailAddress></t:Mailbox></t:ToRecipients></t:Message></t:SetItemField>"#
        );
    }

    #[test]
    fn indexed_entries_are_updated_by_key() {
        let context = ServiceContext::default();
        let mut received = load_object(
            ServiceObjectKind::Contact,
            r#"<t:Contact><t:EmailAddresses>
                <t:Entry Key="EmailAddress1">ada@example.com</t:Entry>
            </t:EmailAddresses></t:Contact>"#,
            &context,
        )
        .unwrap();

        let addresses = received
            .bag_mut()
            .complex_mut::<EmailAddressDictionary>(&contact::EMAIL_ADDRESSES)
            .unwrap()
            .expect("addresses were loaded");
        assert!(addresses.remove_key(EmailAddressKey::EmailAddress1));
        addresses.insert(EmailAddressKey::EmailAddress2, "ada@example.org");

        assert_eq!(
            write_update(&received, &context),
            r#"<t:DeleteItemField><t:IndexedFieldURI FieldURI="contacts:EmailAddress" FieldIndex="EmailAddress1"/></t:DeleteItemField><t:SetItemField><t:IndexedFieldURI FieldURI="contacts:EmailAddress" FieldIndex="EmailAddress2"/><t:Contact><t:EmailAddresses><t:Entry Key="EmailAddress2">ada@example.org</t:Entry></t:EmailAddresses></t:Contact></t:SetItemField>"#
        );
    }

    #[test]
    fn adding_present_key_replaces_its_entry() {
        let context = ServiceContext::default();
        let mut received = load_object(
            ServiceObjectKind::Contact,
            r#"<t:Contact><t:EmailAddresses>
                <t:Entry Key="EmailAddress1">ada@example.com</t:Entry>
            </t:EmailAddresses></t:Contact>"#,
            &context,
        )
        .unwrap();

        let addresses = received
            .bag_mut()
            .complex_mut::<EmailAddressDictionary>(&contact::EMAIL_ADDRESSES)
            .unwrap()
            .expect("addresses were loaded");
        addresses.add(EmailAddressEntry {
            key: EmailAddressKey::EmailAddress1,
            address: "ada@example.org".to_string(),
        });

        assert_eq!(addresses.len(), 1);
        assert_eq!(
            addresses.address(EmailAddressKey::EmailAddress1),
            Some("ada@example.org")
        );
        assert_eq!(
            write_update(&received, &context),
            r#"<t:SetItemField><t:IndexedFieldURI FieldURI="contacts:EmailAddress" FieldIndex="EmailAddress1"/><t:Contact><t:EmailAddresses><t:Entry Key="EmailAddress1">ada@example.org</t:Entry></t:EmailAddresses></t:Contact></t:SetItemField>"#
        );
    }

    #[test]
    fn reverted_collection_changes_are_not_written() {
        let context = ServiceContext::default();
        let mut received = load_object(
            ServiceObjectKind::Message,
            "<t:Message><t:Categories><t:String>Work</t:String></t:Categories></t:Message>",
            &context,
        )
        .unwrap();

        let categories = received
            .bag_mut()
            .complex_mut::<StringList>(&item::CATEGORIES)
            .unwrap()
            .expect("categories were loaded");
        categories.add("Urgent".to_string());
        categories.remove(&"Urgent".to_string());
        categories.remove(&"Work".to_string());
        categories.add("Work".to_string());

        assert_eq!(categories.state_of(&"Urgent".to_string()), None);
        assert_eq!(
            categories.state_of(&"Work".to_string()),
            Some(ItemState::Unchanged)
        );
        assert_eq!(write_update(&received, &context), "");
    }

    #[test]
    fn nested_change_rewrites_recurrence() {
        let context = ServiceContext::default();
        let mut received = load_object(
            ServiceObjectKind::CalendarItem,
            "<t:CalendarItem><t:Recurrence>\
                <t:WeeklyRecurrence><t:Interval>1</t:Interval><t:DaysOfWeek>Monday</t:DaysOfWeek></t:WeeklyRecurrence>\
                <t:NoEndRecurrence><t:StartDate>2024-01-01</t:StartDate></t:NoEndRecurrence>\
            </t:Recurrence></t:CalendarItem>",
            &context,
        )
        .unwrap();
        assert!(!received.is_dirty());

        received
            .bag_mut()
            .complex_mut::<Recurrence>(&calendar_item::RECURRENCE)
            .unwrap()
            .and_then(Recurrence::days_of_week_mut)
            .expect("weekly recurrence should have days")
            .add(DayOfWeek::Friday);

        assert!(received.bag().is_modified(&calendar_item::RECURRENCE));
        assert_eq!(
            write_update(&received, &context),
            "<t:SetItemField><t:FieldURI FieldURI=\"calendar:Recurrence\"/><t:CalendarItem><t:Recurrence>\
                <t:WeeklyRecurrence><t:Interval>1</t:Interval><t:DaysOfWeek>Monday Friday</t:DaysOfWeek></t:WeeklyRecurrence>\
                <t:NoEndRecurrence><t:StartDate>2024-01-01</t:StartDate></t:NoEndRecurrence>\
            </t:Recurrence></t:CalendarItem></t:SetItemField>"
        );
    }

    #[test]
    fn create_writes_assigned_properties_in_schema_order() {
        let mut draft = ServiceObject::new(ServiceObjectKind::Message);
        draft.set(&message::IS_READ, true).unwrap();
        draft.set(&item::SUBJECT, "").unwrap();
        draft.set(&item::IMPORTANCE, Importance::Low).unwrap();

        assert_serialized_content(
            |writer, context| draft.bag().write_to_xml(writer, context, WriteMode::Create),
            "<t:Importance>Low</t:Importance><t:IsRead>true</t:IsRead>",
        );
    }

    fn new_body() -> ComplexValue {
        Body::default().into()
    }

    fn new_string_list() -> ComplexValue {
        StringList::new().into()
    }

    static NOTES: PropertyDefinition =
        PropertyDefinition::new("Notes", "task:Notes", PropertyKind::String);
    static IS_FLAGGED: PropertyDefinition =
        PropertyDefinition::new("IsFlagged", "task:IsFlagged", PropertyKind::Boolean);
    static REMINDER_MINUTES: PropertyDefinition =
        PropertyDefinition::new("ReminderMinutes", "task:ReminderMinutes", PropertyKind::Integer);
    static DUE_DATE: PropertyDefinition =
        PropertyDefinition::new("DueDate", "task:DueDate", PropertyKind::DateTime);
    static THUMBNAIL: PropertyDefinition =
        PropertyDefinition::new("Thumbnail", "task:Thumbnail", PropertyKind::Base64Binary);
    static PRIORITY: PropertyDefinition =
        PropertyDefinition::new("Importance", "task:Importance", Importance::KIND);
    static DESCRIPTION: PropertyDefinition =
        PropertyDefinition::new("Body", "task:Body", PropertyKind::Complex(new_body));
    static LABELS: PropertyDefinition = PropertyDefinition::new(
        "Categories",
        "task:Categories",
        PropertyKind::Collection(new_string_list),
    );

    static TASK_SCHEMA: LazyLock<EntitySchema> = LazyLock::new(|| {
        EntitySchema::builder("Task")
            .properties([
                &NOTES,
                &IS_FLAGGED,
                &REMINDER_MINUTES,
                &DUE_DATE,
                &THUMBNAIL,
                &PRIORITY,
                &DESCRIPTION,
                &LABELS,
            ])
            .build()
            .expect("task schema should be valid")
    });

    #[test]
    fn written_properties_are_read_back_unchanged() {
        let context = ServiceContext::default();
        let due = DateTime(datetime!(2024-03-31 23:59:59.25 +2));

        let mut labels = StringList::new();
        labels.add("Home".to_string());
        labels.add("Garden & <Yard>".to_string());

        let mut task = PropertyBag::new(&TASK_SCHEMA);
        task.set(&NOTES, r#"Buy "seeds" & <soil>"#).unwrap();
        task.set(&IS_FLAGGED, true).unwrap();
        task.set(&REMINDER_MINUTES, -15_i64).unwrap();
        task.set(&DUE_DATE, due).unwrap();
        task.set(&THUMBNAIL, vec![0_u8, 159, 146, 150, 255]).unwrap();
        task.set(&PRIORITY, Importance::High).unwrap();
        task.set(&DESCRIPTION, Body::html("<b>soon</b>")).unwrap();
        task.set(&LABELS, labels).unwrap();

        let xml = write_to_string(&context, |writer, context| {
            writer.write_start_element(context.namespaces.get(XmlNamespace::Types), "Task")?;
            writer.write_namespace_declaration(context.namespaces.get(XmlNamespace::Types))?;
            task.write_to_xml(writer, context, WriteMode::Create)?;
            writer.write_end_element()?;

            Ok(())
        })
        .expect("task should be written");

        let mut reader = reader_at_root(&xml);
        let mut read = PropertyBag::new(&TASK_SCHEMA);
        read.load_from_xml(&mut reader, &context)
            .expect("written task should be read");

        assert!(!read.is_dirty());
        assert_eq!(
            read.get_string(&NOTES).unwrap(),
            Some(r#"Buy "seeds" & <soil>"#)
        );
        assert_eq!(read.get_bool(&IS_FLAGGED).unwrap(), Some(true));
        assert_eq!(read.get_integer(&REMINDER_MINUTES).unwrap(), Some(-15));
        assert_eq!(read.get_date_time(&DUE_DATE).unwrap(), Some(due));
        assert_eq!(
            read.get_bytes(&THUMBNAIL).unwrap(),
            Some([0_u8, 159, 146, 150, 255].as_slice())
        );
        assert_eq!(read.get_enum::<Importance>(&PRIORITY).unwrap(), Some(Importance::High));

        let description = read
            .get_complex::<Body>(&DESCRIPTION)
            .unwrap()
            .expect("body should be read");
        assert_eq!(description.body_type(), crate::BodyType::Html);
        assert_eq!(description.content(), "<b>soon</b>");

        let labels = read
            .get_complex::<StringList>(&LABELS)
            .unwrap()
            .expect("labels should be read");
        assert_eq!(
            labels.iter().map(String::as_str).collect::<Vec<_>>(),
            ["Home", "Garden & <Yard>"]
        );
    }

    #[test]
    fn failed_reload_keeps_reused_instance() {
        let mut received = load_object(
            ServiceObjectKind::Message,
            "<t:Message><t:Categories><t:String>Work</t:String></t:Categories></t:Message>",
            &ServiceContext::default(),
        )
        .unwrap();

        let strict = ServiceContext::default().with_parsing_mode(ParsingMode::Strict);
        let mut reader = reader_at_root(&format!(
            "<t:Message {TYPES_NS}><t:Categories><t:Keyword>Work</t:Keyword></t:Categories></t:Message>"
        ));
        let err = received
            .load_from_xml(&mut reader, &strict)
            .expect_err("unknown category element should be rejected");
        assert!(matches!(err, Error::Schema(_)), "unexpected error: {err:?}");

        assert!(
            received
                .bag()
                .get_complex::<StringList>(&item::CATEGORIES)
                .unwrap()
                .is_some(),
            "categories should still hold a value"
        );
    }

    #[test]
    fn clearing_body_deletes_it() {
        let context = ServiceContext::default();
        let mut received = load_object(
            ServiceObjectKind::Message,
            r#"<t:Message><t:Body BodyType="Text">Hello</t:Body></t:Message>"#,
            &context,
        )
        .unwrap();

        received.set(&item::BODY, Body::text("")).unwrap();

        assert_eq!(
            write_update(&received, &context),
            r#"<t:DeleteItemField><t:FieldURI FieldURI="item:Body"/></t:DeleteItemField>"#
        );
    }
}
