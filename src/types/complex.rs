/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Nested structured property values.
//!
//! A complex property is owned by the [`PropertyBag`](crate::PropertyBag) of
//! an entity, or by another complex property. Each one carries a
//! [`ChangeTracking`] handle which records whether it was mutated and, when
//! it was, forwards the notification to its owner through a non-owning back
//! reference. Mutating a deeply nested value thus marks the top-level
//! property of the entity as modified, without the caller having to assign
//! the value again.

use std::{
    cell::{Cell, RefCell},
    fmt,
    io::{BufRead, Write},
    rc::{Rc, Weak},
};

use bit_vec::BitVec;
use ews_xml::{XmlReader, XmlWriter};

use crate::{
    EmailAddressCollection, EmailAddressDictionary, Error, InternetMessageHeaderCollection,
    ParsingMode, ServiceContext, StringList, XmlNamespace,
};

mod body;
mod email_address;
mod recurrence;
mod service_id;

pub use body::*;
pub use email_address::*;
pub use recurrence::*;
pub use service_id::*;

/// The shared state behind a [`ChangeTracking`] handle.
#[derive(Debug, Default)]
struct TrackingState {
    dirty: Cell<bool>,
    owner: RefCell<OwnerLink>,
}

/// Where change notifications are forwarded to.
#[derive(Debug, Default)]
enum OwnerLink {
    #[default]
    Detached,

    /// The value is held directly by a property bag, at the given position
    /// of its schema.
    Bag {
        changes: Weak<RefCell<BitVec>>,
        index: usize,
    },

    /// The value is nested within another complex property.
    Parent(Weak<TrackingState>),
}

impl OwnerLink {
    fn notify(&self) {
        match self {
            OwnerLink::Detached => {}
            OwnerLink::Bag { changes, index } => {
                if let Some(changes) = changes.upgrade() {
                    changes.borrow_mut().set(*index, true);
                }
            }
            OwnerLink::Parent(parent) => {
                if let Some(parent) = parent.upgrade() {
                    parent.dirty.set(true);
                    parent.owner.borrow().notify();
                }
            }
        }
    }
}

/// Dirty flag and owner link of a complex property.
///
/// Cloning a handle yields a clean, detached handle: a copy of a value is not
/// owned by anything until it is assigned. Handles always compare equal so
/// that they do not take part in structural comparison of values.
pub struct ChangeTracking {
    state: Rc<TrackingState>,
}

impl ChangeTracking {
    pub fn new() -> Self {
        Self {
            state: Rc::default(),
        }
    }

    /// Marks the value as changed and notifies its owner.
    pub fn changed(&self) {
        self.state.dirty.set(true);
        self.state.owner.borrow().notify();
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty.get()
    }

    /// Resets the dirty flag.
    pub fn clear(&self) {
        self.state.dirty.set(false);
    }

    /// Forwards future notifications to the given parent value.
    pub fn attach_to_parent(&self, parent: &ChangeTracking) {
        if Rc::ptr_eq(&self.state, &parent.state) {
            return;
        }

        *self.state.owner.borrow_mut() = OwnerLink::Parent(Rc::downgrade(&parent.state));
    }

    pub(crate) fn attach_to_bag(&self, changes: &Rc<RefCell<BitVec>>, index: usize) {
        *self.state.owner.borrow_mut() = OwnerLink::Bag {
            changes: Rc::downgrade(changes),
            index,
        };
    }

    pub(crate) fn detach(&self) {
        *self.state.owner.borrow_mut() = OwnerLink::Detached;
    }

    /// Whether notifications currently reach an owner.
    pub fn is_attached(&self) -> bool {
        match &*self.state.owner.borrow() {
            OwnerLink::Detached => false,
            OwnerLink::Bag { changes, .. } => changes.strong_count() > 0,
            OwnerLink::Parent(parent) => parent.strong_count() > 0,
        }
    }
}

impl Default for ChangeTracking {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ChangeTracking {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl PartialEq for ChangeTracking {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Eq for ChangeTracking {}

impl fmt::Debug for ChangeTracking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeTracking")
            .field("dirty", &self.is_dirty())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// A nested structured value which reads and writes its own XML.
///
/// When loading, the reader is positioned on the start element of the value,
/// and is left positioned on its end element. The element itself is written
/// by [`ComplexProperty::write_to_xml`], since its name is determined by the
/// property holding the value.
pub trait ComplexProperty {
    fn tracking(&self) -> &ChangeTracking;

    /// Reads the attributes of the value's start element.
    fn read_attributes_from_xml<R: BufRead>(&mut self, reader: &XmlReader<R>) -> Result<(), Error> {
        let _ = reader;
        Ok(())
    }

    /// Attempts to consume the child element the reader is positioned on.
    ///
    /// Returns `false` if the element is not recognized, in which case the
    /// caller decides how to handle it and the reader must not have moved.
    fn try_read_element_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<bool, Error>;

    fn write_attributes_to_xml<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<(), Error> {
        let _ = writer;
        Ok(())
    }

    fn write_elements_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
    ) -> Result<(), Error>;

    /// Reads the value from the element the reader is positioned on.
    fn load_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        self.read_attributes_from_xml(reader)?;
        read_child_elements(self, reader, context)
    }

    /// Writes the value as an element with the given name.
    fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        namespace: XmlNamespace,
        element_name: &str,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        writer.write_start_element(context.namespaces.get(namespace), element_name)?;
        self.write_attributes_to_xml(writer)?;
        self.write_elements_to_xml(writer, context)?;
        writer.write_end_element()?;

        Ok(())
    }

    /// Records a mutation of the value. Implementations call this after every
    /// change to their content.
    fn changed(&self) {
        self.tracking().changed();
    }

    fn is_dirty(&self) -> bool {
        self.tracking().is_dirty()
    }

    /// Forgets pending changes after they were saved.
    fn clear_change_log(&mut self) {
        self.tracking().clear();
    }

    /// Whether the value has no content worth writing.
    fn is_empty(&self) -> bool {
        false
    }
}

/// Reads every child element of the current element through
/// [`ComplexProperty::try_read_element_from_xml`], handling unrecognized ones
/// according to the parsing mode.
pub(crate) fn read_child_elements<P, R>(
    property: &mut P,
    reader: &mut XmlReader<R>,
    context: &ServiceContext,
) -> Result<(), Error>
where
    P: ComplexProperty + ?Sized,
    R: BufRead,
{
    let depth = reader.depth();
    while reader.read_child_start(depth)? {
        if !property.try_read_element_from_xml(reader, context)? {
            skip_unknown_element(reader, context)?;
        }
    }

    Ok(())
}

/// Consumes an element which has no mapping, or fails in strict mode.
pub(crate) fn skip_unknown_element<R: BufRead>(
    reader: &mut XmlReader<R>,
    context: &ServiceContext,
) -> Result<(), Error> {
    match context.parsing {
        ParsingMode::Strict => Err(Error::Schema(format!(
            "unexpected element `{}`",
            reader.local_name()
        ))),
        ParsingMode::Tolerant => {
            log::debug!("skipping unknown element `{}`", reader.local_name());
            reader.skip_current_element()?;

            Ok(())
        }
    }
}

/// Any complex value which can be held by a property bag.
#[derive(Clone, Debug, PartialEq)]
pub enum ComplexValue {
    ServiceId(ServiceId),
    Body(Body),
    Recipient(Recipient),
    Recurrence(Recurrence),
    Strings(StringList),
    EmailAddresses(EmailAddressCollection),
    InternetMessageHeaders(InternetMessageHeaderCollection),
    EmailAddressDictionary(EmailAddressDictionary),
}

/// Applies an expression to the value held by any variant.
macro_rules! dispatch {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            ComplexValue::ServiceId($inner) => $body,
            ComplexValue::Body($inner) => $body,
            ComplexValue::Recipient($inner) => $body,
            ComplexValue::Recurrence($inner) => $body,
            ComplexValue::Strings($inner) => $body,
            ComplexValue::EmailAddresses($inner) => $body,
            ComplexValue::InternetMessageHeaders($inner) => $body,
            ComplexValue::EmailAddressDictionary($inner) => $body,
        }
    };
}

impl ComplexValue {
    pub fn tracking(&self) -> &ChangeTracking {
        dispatch!(self, inner => inner.tracking())
    }

    pub fn is_dirty(&self) -> bool {
        dispatch!(self, inner => inner.is_dirty())
    }

    pub fn is_empty(&self) -> bool {
        dispatch!(self, inner => inner.is_empty())
    }

    pub fn clear_change_log(&mut self) {
        dispatch!(self, inner => inner.clear_change_log())
    }

    pub fn load_from_xml<R: BufRead>(
        &mut self,
        reader: &mut XmlReader<R>,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        dispatch!(self, inner => inner.load_from_xml(reader, context))
    }

    pub fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        namespace: XmlNamespace,
        element_name: &str,
        context: &ServiceContext,
    ) -> Result<(), Error> {
        dispatch!(self, inner => inner.write_to_xml(writer, namespace, element_name, context))
    }

    /// Whether both values are of the same variant.
    pub fn is_same_kind(&self, other: &ComplexValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Records that the value replaced another one wholesale, rather than
    /// being edited in place.
    pub(crate) fn mark_replaced(&mut self) {
        match self {
            ComplexValue::Strings(collection) => collection.mark_replaced(),
            ComplexValue::EmailAddresses(collection) => collection.mark_replaced(),
            ComplexValue::InternetMessageHeaders(collection) => collection.mark_replaced(),
            ComplexValue::EmailAddressDictionary(collection) => collection.mark_replaced(),
            ComplexValue::ServiceId(_)
            | ComplexValue::Body(_)
            | ComplexValue::Recipient(_)
            | ComplexValue::Recurrence(_) => {}
        }
    }
}

/// A type held by one of the variants of [`ComplexValue`].
pub trait ComplexValueType: ComplexProperty + Into<ComplexValue> + Sized {
    /// The name of the type, used in error messages.
    const NAME: &'static str;

    fn from_value(value: &ComplexValue) -> Option<&Self>;

    fn from_value_mut(value: &mut ComplexValue) -> Option<&mut Self>;
}

macro_rules! complex_value_type {
    ($( $variant:ident($ty:ty) ),* $(,)?) => {
        $(
        impl From<$ty> for ComplexValue {
            fn from(value: $ty) -> Self {
                ComplexValue::$variant(value)
            }
        }

        impl From<$ty> for crate::PropertyValue {
            fn from(value: $ty) -> Self {
                crate::PropertyValue::Complex(ComplexValue::$variant(value))
            }
        }

        impl ComplexValueType for $ty {
            const NAME: &'static str = stringify!($variant);

            fn from_value(value: &ComplexValue) -> Option<&Self> {
                match value {
                    ComplexValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_value_mut(value: &mut ComplexValue) -> Option<&mut Self> {
                match value {
                    ComplexValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
        )*
    };
}

complex_value_type!(
    ServiceId(ServiceId),
    Body(Body),
    Recipient(Recipient),
    Recurrence(Recurrence),
    Strings(StringList),
    EmailAddresses(EmailAddressCollection),
    InternetMessageHeaders(InternetMessageHeaderCollection),
    EmailAddressDictionary(EmailAddressDictionary),
);
