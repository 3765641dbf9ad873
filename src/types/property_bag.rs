/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::{cell::RefCell, rc::Rc, str::FromStr};

use bit_vec::BitVec;

use crate::{
    ComplexValue, ComplexValueType, DateTime, EntitySchema, Error,
    PropertyDefinition, PropertyFlags, PropertyKind, PropertyValue, ReadOnlyReason,
};

/// The property values of one entity, indexed by the position of their
/// definition in the entity's schema.
///
/// The bag tracks which properties were loaded from the server and which
/// were modified since, either by assignment or by in-place mutation of a
/// complex value. A property which is neither loaded nor assigned cannot be
/// read, so that a value which was simply not requested is never mistaken
/// for an empty one.
#[derive(Debug)]
pub struct PropertyBag {
    schema: &'static EntitySchema,
    values: Vec<Option<PropertyValue>>,
    loaded: BitVec,

    /// Shared with the complex values held by the bag, which set their bit
    /// when mutated in place.
    modified: Rc<RefCell<BitVec>>,

    is_new: bool,

    /// Set when the entity was read from a listing, which only carries the
    /// properties that can be used in a search.
    only_summary_properties_loaded: bool,
}

impl PropertyBag {
    /// Creates an empty bag for an entity which does not exist on the server
    /// yet.
    pub fn new(schema: &'static EntitySchema) -> Self {
        let len = schema.len();

        Self {
            schema,
            values: vec![None; len],
            loaded: BitVec::from_elem(len, false),
            modified: Rc::new(RefCell::new(BitVec::from_elem(len, false))),
            is_new: true,
            only_summary_properties_loaded: false,
        }
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    /// Whether the entity has not been loaded from or saved to the server.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether the entity was last loaded with summary properties only.
    pub fn only_summary_properties_loaded(&self) -> bool {
        self.only_summary_properties_loaded
    }

    pub fn is_loaded(&self, definition: &PropertyDefinition) -> bool {
        self.schema
            .index_of(definition)
            .is_some_and(|index| self.loaded[index])
    }

    pub fn is_modified(&self, definition: &PropertyDefinition) -> bool {
        self.schema
            .index_of(definition)
            .is_some_and(|index| self.is_modified_at(index))
    }

    /// Whether any property has been modified since the last load or save.
    pub fn is_dirty(&self) -> bool {
        self.modified.borrow().any()
    }

    /// The definitions of all modified properties, in schema order.
    pub fn modified_properties(&self) -> Vec<&'static PropertyDefinition> {
        let modified = self.modified.borrow();

        self.schema
            .definitions()
            .iter()
            .zip(modified.iter())
            .filter(|(_, modified)| *modified)
            .map(|(definition, _)| *definition)
            .collect()
    }

    /// Returns the value of a property.
    ///
    /// `None` means that the property is known to have no value. Fails with
    /// [`Error::PropertyAccess`] if the property was neither loaded nor
    /// assigned.
    pub fn get(&self, definition: &PropertyDefinition) -> Result<Option<&PropertyValue>, Error> {
        let index = self.index_of(definition)?;
        self.check_readable(index)?;

        Ok(self.values[index].as_ref())
    }

    pub fn get_string(&self, definition: &PropertyDefinition) -> Result<Option<&str>, Error> {
        self.get_as(definition, PropertyValue::as_str)
    }

    pub fn get_integer(&self, definition: &PropertyDefinition) -> Result<Option<i64>, Error> {
        self.get_as(definition, PropertyValue::as_integer)
    }

    pub fn get_bool(&self, definition: &PropertyDefinition) -> Result<Option<bool>, Error> {
        self.get_as(definition, PropertyValue::as_bool)
    }

    pub fn get_bytes(&self, definition: &PropertyDefinition) -> Result<Option<&[u8]>, Error> {
        self.get_as(definition, PropertyValue::as_bytes)
    }

    pub fn get_date_time(&self, definition: &PropertyDefinition) -> Result<Option<DateTime>, Error> {
        self.get_as(definition, PropertyValue::as_date_time)
    }

    /// Returns the value of an enumerated property, such as
    /// [`Importance`](crate::Importance).
    pub fn get_enum<T>(&self, definition: &PropertyDefinition) -> Result<Option<T>, Error>
    where
        T: FromStr,
    {
        let Some(text) = self.get_string(definition)? else {
            return Ok(None);
        };

        text.parse()
            .map(Some)
            .map_err(|_| type_error(definition))
    }

    pub fn get_complex<T>(&self, definition: &PropertyDefinition) -> Result<Option<&T>, Error>
    where
        T: ComplexValueType,
    {
        self.get_as(definition, |value| value.as_complex().and_then(T::from_value))
    }

    /// Returns a complex value for editing in place.
    ///
    /// If the property has no value and its definition is flagged with
    /// [`PropertyFlags::AUTO_INSTANTIATE_ON_READ`], an empty value is created
    /// first. Changes made through the returned value mark the property as
    /// modified.
    pub fn complex_mut<T>(&mut self, definition: &PropertyDefinition) -> Result<Option<&mut T>, Error>
    where
        T: ComplexValueType,
    {
        let index = self.index_of(definition)?;
        let definition = self.schema.definition(index);
        self.check_readable(index)?;
        self.check_writable(definition, false)?;

        if self.values[index].is_none()
            && definition.has_flag(PropertyFlags::AUTO_INSTANTIATE_ON_READ)
        {
            if let PropertyKind::Complex(new) | PropertyKind::Collection(new) = definition.kind {
                let value = new();
                value.tracking().attach_to_bag(&self.modified, index);
                self.values[index] = Some(PropertyValue::Complex(value));
                self.loaded.set(index, true);
            }
        }

        match self.values[index].as_mut() {
            None => Ok(None),
            Some(PropertyValue::Complex(value)) => T::from_value_mut(value)
                .map(Some)
                .ok_or_else(|| type_error(definition)),
            Some(_) => Err(type_error(definition)),
        }
    }

    /// Assigns a value to a property.
    pub fn set(
        &mut self,
        definition: &PropertyDefinition,
        value: impl Into<PropertyValue>,
    ) -> Result<(), Error> {
        self.set_value(definition, Some(value.into()))
    }

    /// Removes the value of a property.
    pub fn delete(&mut self, definition: &PropertyDefinition) -> Result<(), Error> {
        self.set_value(definition, None)
    }

    /// Assigns or removes the value of a property.
    ///
    /// Fails with [`Error::ReadOnlyProperty`] if the property's flags do not
    /// allow the change in the entity's current state, and with
    /// [`Error::PropertyType`] if the value does not match the property's
    /// kind.
    pub fn set_value(
        &mut self,
        definition: &PropertyDefinition,
        value: Option<PropertyValue>,
    ) -> Result<(), Error> {
        let index = self.index_of(definition)?;
        let definition = self.schema.definition(index);
        self.check_writable(definition, value.is_none())?;

        let mut value = value;
        if let Some(value) = &mut value {
            if !value.matches_kind(&definition.kind) {
                return Err(type_error(definition));
            }

            if let PropertyValue::Complex(complex) = value {
                complex.tracking().attach_to_bag(&self.modified, index);
                if !self.is_new {
                    complex.mark_replaced();
                }
            }
        }

        if let Some(PropertyValue::Complex(previous)) = &self.values[index] {
            previous.tracking().detach();
        }

        self.values[index] = value;
        self.loaded.set(index, true);
        self.modified.borrow_mut().set(index, true);

        Ok(())
    }

    /// Forgets all pending changes after the entity was saved.
    pub fn clear_change_log(&mut self) {
        *self.modified.borrow_mut() = BitVec::from_elem(self.schema.len(), false);

        for value in self.values.iter_mut().flatten() {
            if let PropertyValue::Complex(value) = value {
                value.clear_change_log();
            }
        }

        self.is_new = false;
    }

    pub(crate) fn is_modified_at(&self, index: usize) -> bool {
        self.modified.borrow().get(index).unwrap_or(false)
    }

    pub(crate) fn is_loaded_at(&self, index: usize) -> bool {
        self.loaded.get(index).unwrap_or(false)
    }

    pub(crate) fn value_at(&self, index: usize) -> Option<&PropertyValue> {
        self.values[index].as_ref()
    }

    /// Removes a complex value so that it can be loaded again in place.
    pub(crate) fn take_complex_at(&mut self, index: usize) -> Option<ComplexValue> {
        match self.values[index].take() {
            Some(PropertyValue::Complex(value)) => Some(value),
            other => {
                self.values[index] = other;
                None
            }
        }
    }

    /// Puts back a value removed by [`PropertyBag::take_complex_at`] without
    /// changing the loaded or modified state of the property.
    pub(crate) fn restore_complex_at(&mut self, index: usize, value: ComplexValue) {
        self.values[index] = Some(PropertyValue::Complex(value));
    }

    /// Stores a value read from the server, replacing any local change.
    pub(crate) fn store_loaded(&mut self, index: usize, value: Option<PropertyValue>) {
        if let Some(PropertyValue::Complex(value)) = &value {
            value.tracking().attach_to_bag(&self.modified, index);
        }

        self.values[index] = value;
        self.loaded.set(index, true);
        self.modified.borrow_mut().set(index, false);
    }

    /// Marks the end of loading the entity from the server.
    pub(crate) fn finish_load(&mut self, summary_only: bool) {
        self.is_new = false;
        self.only_summary_properties_loaded = summary_only;
    }

    fn index_of(&self, definition: &PropertyDefinition) -> Result<usize, Error> {
        self.schema.index_of(definition).ok_or_else(|| {
            Error::Schema(format!(
                "property `{}` is not part of schema `{}`",
                definition.uri,
                self.schema.name()
            ))
        })
    }

    fn check_readable(&self, index: usize) -> Result<(), Error> {
        if self.loaded[index] || self.is_modified_at(index) {
            return Ok(());
        }

        let definition = self.schema.definition(index);
        if self.is_new && definition.has_flag(PropertyFlags::CAN_SET) {
            return Ok(());
        }

        let explicit_load = definition.has_flag(PropertyFlags::MUST_BE_EXPLICITLY_LOADED)
            || (self.only_summary_properties_loaded && !definition.has_flag(PropertyFlags::CAN_FIND));

        Err(Error::PropertyAccess {
            property: definition.uri,
            explicit_load,
        })
    }

    fn check_writable(&self, definition: &'static PropertyDefinition, deleting: bool) -> Result<(), Error> {
        let reason = if self.is_new {
            (!definition.has_flag(PropertyFlags::CAN_SET)).then_some(ReadOnlyReason::NotSettable)
        } else if !definition.has_flag(PropertyFlags::CAN_UPDATE) {
            Some(ReadOnlyReason::NotUpdatable)
        } else if deleting && !definition.has_flag(PropertyFlags::CAN_DELETE) {
            Some(ReadOnlyReason::NotDeletable)
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::ReadOnlyProperty {
                property: definition.uri,
                reason,
            }),
            None => Ok(()),
        }
    }

    fn get_as<'a, T, F>(&'a self, definition: &PropertyDefinition, convert: F) -> Result<Option<T>, Error>
    where
        F: FnOnce(&'a PropertyValue) -> Option<T>,
    {
        match self.get(definition)? {
            Some(value) => convert(value).map(Some).ok_or_else(|| type_error(definition)),
            None => Ok(None),
        }
    }
}

fn type_error(definition: &PropertyDefinition) -> Error {
    Error::PropertyType {
        property: definition.uri,
        expected: definition.kind.description(),
    }
}
