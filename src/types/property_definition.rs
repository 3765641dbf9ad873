/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::hash::{Hash, Hasher};

use bitflags::bitflags;

use crate::{ComplexValue, ExchangeServerVersion, XmlNamespace};

bitflags! {
    /// Behaviors of a property with respect to reading, writing and updates.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u16 {
        /// The property may be assigned on an object which has not been
        /// saved yet, and is written when the object is created.
        const CAN_SET = 1 << 0;

        /// The property may be changed on an existing object.
        const CAN_UPDATE = 1 << 1;

        /// The property may be removed from an existing object.
        const CAN_DELETE = 1 << 2;

        /// The property may be used in search restrictions.
        const CAN_FIND = 1 << 3;

        /// The server may return the property without content.
        const IS_NULLABLE = 1 << 4;

        /// The property is not part of the default shape and has to be
        /// requested explicitly.
        const MUST_BE_EXPLICITLY_LOADED = 1 << 5;

        /// When read again from a response, an existing complex value is
        /// updated in place rather than replaced.
        const REUSE_INSTANCE = 1 << 6;

        /// A complex value is created on first mutable access if none is
        /// present.
        const AUTO_INSTANTIATE_ON_READ = 1 << 7;

        /// An empty value is written as an empty element rather than omitted.
        const EMIT_EMPTY = 1 << 8;

        /// New collection entries can be sent as an append rather than as a
        /// replacement of the whole collection.
        const CAN_APPEND = 1 << 9;

        /// Collection entries are addressed individually by key in updates.
        const INDEXED = 1 << 10;
    }
}

impl PropertyFlags {
    /// The flags of an ordinary property, which can be set, updated,
    /// deleted and searched.
    pub const DEFAULT: PropertyFlags = PropertyFlags::CAN_SET
        .union(PropertyFlags::CAN_UPDATE)
        .union(PropertyFlags::CAN_DELETE)
        .union(PropertyFlags::CAN_FIND);

    /// The flags of a property computed by the server.
    pub const READ_ONLY: PropertyFlags = PropertyFlags::CAN_FIND;
}

/// The type of value a property holds.
#[derive(Clone, Copy, Debug)]
pub enum PropertyKind {
    String,
    Integer,
    Boolean,

    /// One of a fixed set of wire strings.
    Enum {
        /// The name of the type, used in error messages.
        name: &'static str,
        variants: &'static [&'static str],
    },

    /// Binary data, base64-encoded on the wire.
    Base64Binary,

    /// A date and time with second precision, in ISO 8601 format on the wire.
    DateTime,

    /// A nested structured value, created by the given constructor when read.
    Complex(fn() -> ComplexValue),

    /// A collection of nested values, created by the given constructor when
    /// read.
    Collection(fn() -> ComplexValue),
}

impl PropertyKind {
    /// A short description of the type, used in error messages.
    pub fn description(&self) -> &'static str {
        match self {
            PropertyKind::String => "string",
            PropertyKind::Integer => "integer",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Enum { name, .. } => *name,
            PropertyKind::Base64Binary => "base64Binary",
            PropertyKind::DateTime => "dateTime",
            PropertyKind::Complex(_) => "complex value",
            PropertyKind::Collection(_) => "collection",
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, PropertyKind::Complex(_) | PropertyKind::Collection(_))
    }
}

/// Immutable metadata describing how one property of an entity maps onto the
/// wire.
///
/// Definitions are declared as statics and shared by every schema which
/// contains them:
///
/// ```
/// use ews::{ExchangeServerVersion, PropertyDefinition, PropertyFlags, PropertyKind};
///
/// static CULTURE: PropertyDefinition = PropertyDefinition::new("Culture", "item:Culture", PropertyKind::String)
///     .with_version(ExchangeServerVersion::Exchange2010);
///
/// assert_eq!(CULTURE.flags, PropertyFlags::DEFAULT);
/// ```
///
/// Two definitions are equal if they share a field URI.
#[derive(Debug)]
pub struct PropertyDefinition {
    /// The local name of the element holding the property.
    pub xml_element_name: &'static str,

    /// The path used to address the property in update requests and
    /// property sets, e.g. `item:Subject`.
    pub uri: &'static str,

    pub namespace: XmlNamespace,

    /// The oldest protocol version which supports the property.
    pub version: ExchangeServerVersion,

    pub flags: PropertyFlags,

    pub kind: PropertyKind,
}

impl PropertyDefinition {
    /// Creates a definition in the types namespace with
    /// [`PropertyFlags::DEFAULT`], available in all versions.
    pub const fn new(
        xml_element_name: &'static str,
        uri: &'static str,
        kind: PropertyKind,
    ) -> Self {
        Self {
            xml_element_name,
            uri,
            namespace: XmlNamespace::Types,
            version: ExchangeServerVersion::Exchange2007,
            flags: PropertyFlags::DEFAULT,
            kind,
        }
    }

    pub const fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags = flags;
        self
    }

    pub const fn with_version(mut self, version: ExchangeServerVersion) -> Self {
        self.version = version;
        self
    }

    pub const fn in_namespace(mut self, namespace: XmlNamespace) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn has_flag(&self, flag: PropertyFlags) -> bool {
        self.flags.contains(flag)
    }
}

impl PartialEq for PropertyDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for PropertyDefinition {}

impl Hash for PropertyDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}
