/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{
    fmt,
    io::{BufRead, Write},
};

use ews_xml::{XmlReader, XmlWriter};
use fxhash::FxHashMap;

use crate::{
    schemas::{self, CALENDAR_ITEM_SCHEMA, CONTACT_SCHEMA, FOLDER_SCHEMA, ITEM_SCHEMA, MESSAGE_SCHEMA},
    ComplexProperty, EntitySchema, Error, PropertyBag, PropertyDefinition, PropertyValue,
    ServiceContext, ServiceId, WriteMode, XmlNamespace,
};

/// The kinds of entity with a built-in schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceObjectKind {
    Item,
    Message,
    CalendarItem,
    Contact,
    Folder,
    CalendarFolder,
    ContactsFolder,
    SearchFolder,
    TasksFolder,
}

impl ServiceObjectKind {
    pub fn schema(self) -> &'static EntitySchema {
        match self {
            ServiceObjectKind::Item => &*ITEM_SCHEMA,
            ServiceObjectKind::Message => &*MESSAGE_SCHEMA,
            ServiceObjectKind::CalendarItem => &*CALENDAR_ITEM_SCHEMA,
            ServiceObjectKind::Contact => &*CONTACT_SCHEMA,
            ServiceObjectKind::Folder
            | ServiceObjectKind::CalendarFolder
            | ServiceObjectKind::ContactsFolder
            | ServiceObjectKind::SearchFolder
            | ServiceObjectKind::TasksFolder => &*FOLDER_SCHEMA,
        }
    }

    /// The name of the element representing entities of this kind.
    pub fn element_name(self) -> &'static str {
        match self {
            ServiceObjectKind::Item => "Item",
            ServiceObjectKind::Message => "Message",
            ServiceObjectKind::CalendarItem => "CalendarItem",
            ServiceObjectKind::Contact => "Contact",
            ServiceObjectKind::Folder => "Folder",
            ServiceObjectKind::CalendarFolder => "CalendarFolder",
            ServiceObjectKind::ContactsFolder => "ContactsFolder",
            ServiceObjectKind::SearchFolder => "SearchFolder",
            ServiceObjectKind::TasksFolder => "TasksFolder",
        }
    }

    pub fn is_folder(self) -> bool {
        matches!(
            self,
            ServiceObjectKind::Folder
                | ServiceObjectKind::CalendarFolder
                | ServiceObjectKind::ContactsFolder
                | ServiceObjectKind::SearchFolder
                | ServiceObjectKind::TasksFolder
        )
    }

    /// The property holding the identifier of entities of this kind.
    pub fn id_property(self) -> &'static PropertyDefinition {
        if self.is_folder() {
            &schemas::folder::FOLDER_ID
        } else {
            &schemas::item::ITEM_ID
        }
    }
}

/// An item or folder, held as a property bag bound to the schema of its
/// kind.
///
/// An object created with [`ServiceObject::new`] is new: any property which
/// may be set can be assigned, and all assigned properties are written when
/// creating it. Once loaded from a response or saved, only properties which
/// may be updated can be changed, and only changed properties are written to
/// update requests.
#[derive(Debug)]
pub struct ServiceObject {
    kind: ServiceObjectKind,

    /// The element the object was read from, which may be more specific
    /// than the kind's own, e.g. `MeetingRequest` for a message.
    element_name: &'static str,

    bag: PropertyBag,
}

impl ServiceObject {
    pub fn new(kind: ServiceObjectKind) -> Self {
        Self::with_element_name(kind, kind.element_name())
    }

    /// Creates an object of the given kind represented by another element.
    pub fn with_element_name(kind: ServiceObjectKind, element_name: &'static str) -> Self {
        Self {
            kind,
            element_name,
            bag: PropertyBag::new(kind.schema()),
        }
    }

    pub fn kind(&self) -> ServiceObjectKind {
        self.kind
    }

    pub fn element_name(&self) -> &'static str {
        self.element_name
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.bag.schema()
    }

    pub fn bag(&self) -> &PropertyBag {
        &self.bag
    }

    pub fn bag_mut(&mut self) -> &mut PropertyBag {
        &mut self.bag
    }

    pub fn is_new(&self) -> bool {
        self.bag.is_new()
    }

    /// Whether any property has changed since the object was loaded or
    /// saved.
    pub fn is_dirty(&self) -> bool {
        self.bag.is_dirty()
    }

    /// See [`PropertyBag::get`].
    pub fn get(&self, definition: &PropertyDefinition) -> Result<Option<&PropertyValue>, Error> {
        self.bag.get(definition)
    }

    /// See [`PropertyBag::set`].
    pub fn set(
        &mut self,
        definition: &PropertyDefinition,
        value: impl Into<PropertyValue>,
    ) -> Result<(), Error> {
        self.bag.set(definition, value)
    }

    /// See [`PropertyBag::delete`].
    pub fn delete(&mut self, definition: &PropertyDefinition) -> Result<(), Error> {
        self.bag.delete(definition)
    }

    /// The identifier of the object, once it exists on the server.
    pub fn id(&self) -> Result<Option<&ServiceId>, Error> {
        self.bag.get_complex(self.kind.id_property())
    }

    /// Reads the object from the element the reader is positioned on.
    pub fn load_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        self.bag.load_from_xml(reader, context)
    }

    /// Writes the object as it should be created on the server.
    pub fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        writer.write_start_element(context.namespaces.get(XmlNamespace::Types), self.element_name)?;
        self.bag.write_to_xml(writer, context, WriteMode::Create)?;
        writer.write_end_element()?;

        Ok(())
    }

    /// Writes an `ItemChange` or `FolderChange` describing the changes made
    /// to the object.
    ///
    /// Nothing is written if the changes produce no field update, e.g. when
    /// edits to a collection cancelled out or only properties newer than the
    /// session version were changed. Fails with [`Error::PropertyAccess`] if
    /// the object has no identifier.
    pub fn write_update_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        let id_property = self.kind.id_property();
        let id = self
            .id()?
            .filter(|id| id.is_valid())
            .ok_or(Error::PropertyAccess {
                property: id_property.uri,
                explicit_load: false,
            })?;

        let (change, mode) = if self.kind.is_folder() {
            (
                "FolderChange",
                WriteMode::FolderUpdate {
                    element_name: self.element_name,
                },
            )
        } else {
            (
                "ItemChange",
                WriteMode::ItemUpdate {
                    element_name: self.element_name,
                },
            )
        };

        if self.bag.pending_update_count(context, mode)? == 0 {
            log::debug!("`{}` has no field updates to send", self.element_name);
            return Ok(());
        }

        let types = context.namespaces.get(XmlNamespace::Types);
        writer.write_start_element(types, change)?;
        id.write_to_xml(
            writer,
            XmlNamespace::Types,
            id_property.xml_element_name,
            context,
        )?;
        writer.write_start_element(types, "Updates")?;
        self.bag.write_to_xml(writer, context, mode)?;
        writer.write_end_element()?;
        writer.write_end_element()?;

        Ok(())
    }

    /// Forgets pending changes after the object was saved.
    pub fn clear_change_log(&mut self) {
        self.bag.clear_change_log();
    }
}

/// Creates an empty object for the given element name.
pub type ServiceObjectFactory = fn(&'static str) -> ServiceObject;

/// The factories used to create objects from the elements of a response,
/// keyed by element name.
///
/// The default registry covers all built-in kinds, as well as the meeting
/// messages and post items which share the message schema.
#[derive(Clone)]
pub struct ServiceObjectRegistry {
    factories: FxHashMap<&'static str, ServiceObjectFactory>,
}

impl ServiceObjectRegistry {
    /// Creates a registry without any factories.
    pub fn empty() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// Registers a factory for an element name, replacing any previous one.
    pub fn register(&mut self, element_name: &'static str, factory: ServiceObjectFactory) {
        self.factories.insert(element_name, factory);
    }

    pub fn contains(&self, element_name: &str) -> bool {
        self.factories.contains_key(element_name)
    }

    /// Creates an empty object for an element read from a response.
    ///
    /// Fails with [`Error::Schema`] if no factory is registered for the
    /// element, regardless of the parsing mode.
    pub fn create(&self, element_name: &str) -> Result<ServiceObject, Error> {
        let (&element_name, factory) = self.factories.get_key_value(element_name).ok_or_else(|| {
            Error::Schema(format!(
                "no entity type is registered for element `{element_name}`"
            ))
        })?;

        Ok(factory(element_name))
    }
}

impl Default for ServiceObjectRegistry {
    fn default() -> Self {
        macro_rules! factory {
            ($kind:ident) => {
                |name| ServiceObject::with_element_name(ServiceObjectKind::$kind, name)
            };
        }

        let built_in: [(&'static str, ServiceObjectFactory); 14] = [
            ("Item", factory!(Item)),
            ("Message", factory!(Message)),
            ("MeetingMessage", factory!(Message)),
            ("MeetingRequest", factory!(Message)),
            ("MeetingResponse", factory!(Message)),
            ("MeetingCancellation", factory!(Message)),
            ("PostItem", factory!(Message)),
            ("CalendarItem", factory!(CalendarItem)),
            ("Contact", factory!(Contact)),
            ("Folder", factory!(Folder)),
            ("CalendarFolder", factory!(CalendarFolder)),
            ("ContactsFolder", factory!(ContactsFolder)),
            ("SearchFolder", factory!(SearchFolder)),
            ("TasksFolder", factory!(TasksFolder)),
        ];

        let mut registry = Self::empty();
        for (element_name, factory) in built_in {
            registry.register(element_name, factory);
        }

        registry
    }
}

impl fmt::Debug for ServiceObjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();

        f.debug_struct("ServiceObjectRegistry")
            .field("element_names", &names)
            .finish()
    }
}
