/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Collections of nested values with per-entry change tracking.

use std::{
    fmt,
    io::{BufRead, Write},
};

use ews_xml::{XmlReader, XmlWriter};

use crate::{
    types::{complex::read_child_elements, serializer::UpdateWriter},
    ChangeTracking, ComplexProperty, EmailAddress, Error, PropertyDefinition, PropertyFlags,
    ServiceContext, XmlNamespace,
};

mod items;

pub use items::*;

/// A collection of category names.
pub type StringList = ComplexPropertyCollection<String>;

/// A collection of mailboxes, such as the recipients of a message.
pub type EmailAddressCollection = ComplexPropertyCollection<EmailAddress>;

pub type InternetMessageHeaderCollection = ComplexPropertyCollection<InternetMessageHeader>;

/// The e-mail addresses of a contact, keyed by [`EmailAddressKey`](crate::EmailAddressKey).
pub type EmailAddressDictionary = ComplexPropertyCollection<EmailAddressEntry>;

/// An entry of a [`ComplexPropertyCollection`].
pub trait CollectionItem: Clone + PartialEq + fmt::Debug {
    /// The name of the element holding each entry.
    const ELEMENT_NAME: &'static str;

    /// Reads an entry from the element the reader is positioned on, leaving
    /// the reader on its end element.
    fn read_from_xml<R: BufRead>(
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<Self, Error>;

    /// Writes the entry as an element named [`CollectionItem::ELEMENT_NAME`].
    fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error>;

    /// The key addressing the entry in updates of an indexed property.
    fn index_key(&self) -> Option<&'static str> {
        None
    }
}

/// The state of an entry relative to the server's copy of the collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemState {
    /// Present on the server and not changed locally.
    Unchanged,

    /// Added locally.
    New,

    /// Present on the server and edited locally.
    Modified,

    /// Present on the server and removed locally.
    Removed,
}

#[derive(Clone, Debug)]
struct Entry<T> {
    item: T,
    state: ItemState,

    /// Whether a removed entry had been edited before its removal.
    modified_before_removal: bool,
}

impl<T> Entry<T> {
    fn new(item: T, state: ItemState) -> Self {
        Self {
            item,
            state,
            modified_before_removal: false,
        }
    }

    fn is_live(&self) -> bool {
        self.state != ItemState::Removed
    }
}

/// An ordered collection of nested values which records additions, edits
/// and removals since the collection was last loaded or saved.
///
/// Adding an entry and then removing it again before saving leaves no trace,
/// as does removing a loaded entry and adding it back. Removed entries are
/// retained until the change log is cleared so that updates can address
/// them.
#[derive(Clone, Debug)]
pub struct ComplexPropertyCollection<T> {
    entries: Vec<Entry<T>>,

    /// Set when the collection was assigned as a whole, in which case it is
    /// sent as a replacement rather than as incremental changes.
    replaced: bool,

    tracking: ChangeTracking,
}

impl<T> Default for ComplexPropertyCollection<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            replaced: false,
            tracking: ChangeTracking::default(),
        }
    }
}

impl<T> ComplexPropertyCollection<T>
where
    T: CollectionItem,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of entries, excluding removed ones.
    pub fn len(&self) -> usize {
        self.live().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the entries, excluding removed ones.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.live().map(|entry| &entry.item)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.iter().nth(index)
    }

    pub fn contains(&self, item: &T) -> bool {
        self.iter().any(|present| present == item)
    }

    /// Iterates over all entries along with their state, including removed
    /// ones.
    pub fn entries(&self) -> impl Iterator<Item = (&T, ItemState)> {
        self.entries.iter().map(|entry| (&entry.item, entry.state))
    }

    /// The state of the first entry equal to `item`, preferring entries which
    /// have not been removed.
    pub fn state_of(&self, item: &T) -> Option<ItemState> {
        self.entries
            .iter()
            .filter(|entry| entry.item == *item)
            .min_by_key(|entry| !entry.is_live())
            .map(|entry| entry.state)
    }

    /// Adds an entry.
    ///
    /// In a collection keyed by [`CollectionItem::index_key`], an entry with
    /// the key of a present one replaces it.
    pub fn add(&mut self, item: T) {
        let restored = self
            .entries
            .iter_mut()
            .find(|entry| entry.state == ItemState::Removed && entry.item == item);

        if let Some(entry) = restored {
            entry.state = if entry.modified_before_removal {
                ItemState::Modified
            } else {
                ItemState::Unchanged
            };
            entry.modified_before_removal = false;
        } else if let Some(entry) = self.live_with_key_of(&item) {
            if entry.item == item {
                return;
            }

            entry.item = item;
            if entry.state == ItemState::Unchanged {
                entry.state = ItemState::Modified;
            }
        } else if let Some(entry) = self.removed_with_key_of(&item) {
            // Re-adding a removed key with another value edits that key.
            entry.item = item;
            entry.state = ItemState::Modified;
            entry.modified_before_removal = false;
        } else {
            self.entries.push(Entry::new(item, ItemState::New));
        }

        self.changed();
    }

    /// Removes the first entry equal to `item`. Returns `false` if there was
    /// none.
    pub fn remove(&mut self, item: &T) -> bool {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.is_live() && entry.item == *item);

        match position {
            Some(position) => {
                self.remove_entry(position);
                self.changed();

                true
            }
            None => false,
        }
    }

    /// Removes the entry at the given position. Returns `None` if there is no
    /// such entry.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        let position = self.position_of_live(index)?;
        let item = self.entries[position].item.clone();
        self.remove_entry(position);
        self.changed();

        Some(item)
    }

    /// Edits the entry at the given position in place. Returns `false` if
    /// there is no such entry.
    pub fn modify<F>(&mut self, index: usize, edit: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let Some(position) = self.position_of_live(index) else {
            return false;
        };

        let entry = &mut self.entries[position];
        edit(&mut entry.item);
        if entry.state == ItemState::Unchanged {
            entry.state = ItemState::Modified;
        }
        self.changed();

        true
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        let had_entries = !self.is_empty();

        self.entries.retain(|entry| entry.state != ItemState::New);
        for entry in &mut self.entries {
            if entry.state == ItemState::Modified {
                entry.modified_before_removal = true;
            }
            entry.state = ItemState::Removed;
        }

        if had_entries {
            self.changed();
        }
    }

    /// Whether any entry differs from the server's copy.
    pub fn has_pending_changes(&self) -> bool {
        self.replaced
            || self
                .entries
                .iter()
                .any(|entry| entry.state != ItemState::Unchanged)
    }

    pub(crate) fn mark_replaced(&mut self) {
        self.replaced = true;
    }

    /// Writes the changes to this collection to an update request.
    ///
    /// Indexed properties address each changed entry by key. Otherwise the
    /// collection is either appended to, when entries were only added, or
    /// replaced as a whole.
    pub(crate) fn write_update<W: Write>(
        &self,
        definition: &'static PropertyDefinition,
        update: &mut UpdateWriter<'_, W>,
    ) -> Result<(), Error> {
        if definition.has_flag(PropertyFlags::INDEXED) {
            return self.write_indexed_update(definition, update);
        }

        if !self.has_pending_changes() {
            log::trace!("collection `{}` has no net changes", definition.uri);
            return Ok(());
        }

        if self.is_empty() && definition.has_flag(PropertyFlags::CAN_DELETE) {
            return update.delete_field(definition);
        }

        let only_additions = !self.replaced
            && self
                .entries
                .iter()
                .all(|entry| matches!(entry.state, ItemState::Unchanged | ItemState::New));

        if only_additions && definition.has_flag(PropertyFlags::CAN_APPEND) {
            update.append_field(definition, |writer, context| {
                self.write_matching(writer, definition, context, |state| state == ItemState::New)
            })
        } else {
            update.set_field(definition, |writer, context| {
                self.write_matching(writer, definition, context, |state| {
                    state != ItemState::Removed
                })
            })
        }
    }

    fn write_indexed_update<W: Write>(
        &self,
        definition: &'static PropertyDefinition,
        update: &mut UpdateWriter<'_, W>,
    ) -> Result<(), Error> {
        for entry in &self.entries {
            let Some(key) = entry.item.index_key() else {
                log::warn!(
                    "entry of indexed property `{}` has no key: {:?}",
                    definition.uri,
                    entry.item
                );
                continue;
            };

            match entry.state {
                ItemState::Unchanged => {}
                ItemState::New | ItemState::Modified => {
                    update.set_indexed_field(definition, key, |writer, context| {
                        let namespace = context.namespaces.get(definition.namespace);
                        writer.write_start_element(namespace, definition.xml_element_name)?;
                        entry.item.write_to_xml(writer, context)?;
                        writer.write_end_element()?;

                        Ok(())
                    })?;
                }
                ItemState::Removed => update.delete_indexed_field(definition, key)?,
            }
        }

        Ok(())
    }

    /// Writes the property element holding the entries in the given states.
    fn write_matching<W, F>(
        &self,
        writer: &mut XmlWriter<W>,
        definition: &PropertyDefinition,
        context: &ServiceContext,
        include: F,
    ) -> Result<(), Error>
    where
        W: Write,
        F: Fn(ItemState) -> bool,
    {
        let namespace = context.namespaces.get(definition.namespace);

        writer.write_start_element(namespace, definition.xml_element_name)?;
        for entry in self.entries.iter().filter(|entry| include(entry.state)) {
            entry.item.write_to_xml(writer, context)?;
        }
        writer.write_end_element()?;

        Ok(())
    }

    fn live(&self) -> impl Iterator<Item = &Entry<T>> {
        self.entries.iter().filter(|entry| entry.is_live())
    }

    fn position_of_live(&self, index: usize) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_live())
            .nth(index)
            .map(|(position, _)| position)
    }

    fn live_with_key_of(&mut self, item: &T) -> Option<&mut Entry<T>> {
        let key = item.index_key()?;
        self.entries
            .iter_mut()
            .find(|entry| entry.is_live() && entry.item.index_key() == Some(key))
    }

    fn removed_with_key_of(&mut self, item: &T) -> Option<&mut Entry<T>> {
        let key = item.index_key()?;
        self.entries
            .iter_mut()
            .find(|entry| entry.state == ItemState::Removed && entry.item.index_key() == Some(key))
    }

    fn remove_entry(&mut self, position: usize) {
        let entry = &mut self.entries[position];
        match entry.state {
            ItemState::New => {
                self.entries.remove(position);
            }
            ItemState::Unchanged => entry.state = ItemState::Removed,
            ItemState::Modified => {
                entry.state = ItemState::Removed;
                entry.modified_before_removal = true;
            }
            ItemState::Removed => {}
        }
    }
}

impl<T> FromIterator<T> for ComplexPropertyCollection<T>
where
    T: CollectionItem,
{
    /// Creates a collection whose entries are all new.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|item| Entry::new(item, ItemState::New))
                .collect(),
            ..Default::default()
        }
    }
}

impl<T> PartialEq for ComplexPropertyCollection<T>
where
    T: CollectionItem,
{
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T> ComplexProperty for ComplexPropertyCollection<T>
where
    T: CollectionItem,
{
    fn tracking(&self) -> &ChangeTracking {
        &self.tracking
    }

    fn try_read_element_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<bool, Error> {
        if reader.local_name() != T::ELEMENT_NAME {
            return Ok(false);
        }

        let item = T::read_from_xml(reader, context)?;
        self.entries.push(Entry::new(item, ItemState::Unchanged));

        Ok(true)
    }

    fn write_elements_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        for item in self.iter() {
            item.write_to_xml(writer, context)?;
        }

        Ok(())
    }

    /// Replaces the content of the collection with the entries read, which
    /// are considered unchanged.
    fn load_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        self.entries.clear();
        self.replaced = false;

        read_child_elements(self, reader, context)
    }

    fn clear_change_log(&mut self) {
        self.entries.retain(Entry::is_live);
        for entry in &mut self.entries {
            entry.state = ItemState::Unchanged;
            entry.modified_before_removal = false;
        }
        self.replaced = false;
        self.tracking.clear();
    }

    fn is_empty(&self) -> bool {
        ComplexPropertyCollection::is_empty(self)
    }
}

/// Writes a collection entry holding only text.
pub(crate) fn write_text_element<W: Write>(
    writer: &mut XmlWriter<W>,
    context: &ServiceContext,
    name: &str,
    text: &str,
) -> Result<(), Error> {
    writer.write_start_element(context.namespaces.get(XmlNamespace::Types), name)?;
    writer.write_value(text)?;
    writer.write_end_element()?;

    Ok(())
}
