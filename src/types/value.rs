/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::borrow::Cow;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use ews_xml::{FromXmlText, InvalidValue, ToXmlText};
use time::format_description::well_known::{Iso8601, Rfc3339};

use crate::{ComplexValue, Error, PropertyKind};

/// A date and time, as exchanged in `xs:dateTime` content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(pub time::OffsetDateTime);

impl DateTime {
    /// Formats the date and time as an `xs:dateTime` string.
    ///
    /// Fractional seconds are only written when present, with trailing zeros
    /// trimmed. Fails for dates outside years 0 through 9999 and for offsets
    /// with a seconds component, which the wire format cannot represent.
    pub fn format(&self) -> Result<String, Error> {
        Ok(self.0.format(&Rfc3339)?)
    }
}

impl FromXmlText for DateTime {
    fn from_xml_text(text: &str) -> Result<Self, InvalidValue> {
        time::OffsetDateTime::parse(text.trim(), &Iso8601::DEFAULT)
            .map(DateTime)
            .map_err(|_| InvalidValue {
                expected: "dateTime",
            })
    }
}

impl From<time::OffsetDateTime> for DateTime {
    fn from(value: time::OffsetDateTime) -> Self {
        DateTime(value)
    }
}

/// The value of one property of an entity.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Boolean(bool),

    /// The wire string of an enumerated value.
    Enum(&'static str),

    Bytes(Vec<u8>),
    DateTime(DateTime),
    Complex(ComplexValue),
}

impl PropertyValue {
    /// Converts the text content of an element into a value of the given
    /// scalar kind.
    ///
    /// Returns `None` for complex kinds, which are not read from text.
    pub(crate) fn from_xml_text(
        kind: &PropertyKind,
        text: &str,
    ) -> Option<Result<PropertyValue, InvalidValue>> {
        let value = match kind {
            PropertyKind::String => Ok(PropertyValue::String(text.to_owned())),
            PropertyKind::Integer => i64::from_xml_text(text).map(PropertyValue::Integer),
            PropertyKind::Boolean => bool::from_xml_text(text).map(PropertyValue::Boolean),
            PropertyKind::Enum { name, variants } => {
                let text = text.trim();
                variants
                    .iter()
                    .find(|variant| **variant == text)
                    .map(|variant| PropertyValue::Enum(*variant))
                    .ok_or(InvalidValue { expected: *name })
            }
            PropertyKind::Base64Binary => BASE64_STANDARD
                .decode(text.trim())
                .map(PropertyValue::Bytes)
                .map_err(|_| InvalidValue {
                    expected: "base64Binary",
                }),
            PropertyKind::DateTime => DateTime::from_xml_text(text).map(PropertyValue::DateTime),
            PropertyKind::Complex(_) | PropertyKind::Collection(_) => return None,
        };

        Some(value)
    }

    /// Converts a scalar value into text content.
    ///
    /// Returns `None` for complex values, which write their own elements.
    pub(crate) fn to_xml_text(&self) -> Result<Option<Cow<'_, str>>, Error> {
        let text = match self {
            PropertyValue::String(value) => Cow::Borrowed(value.as_str()),
            PropertyValue::Integer(value) => value.to_xml_text(),
            PropertyValue::Boolean(value) => value.to_xml_text(),
            PropertyValue::Enum(value) => Cow::Borrowed(*value),
            PropertyValue::Bytes(value) => Cow::Owned(BASE64_STANDARD.encode(value)),
            PropertyValue::DateTime(value) => Cow::Owned(value.format()?),
            PropertyValue::Complex(_) => return Ok(None),
        };

        Ok(Some(text))
    }

    /// Whether this value may be held by a property of the given kind.
    pub(crate) fn matches_kind(&self, kind: &PropertyKind) -> bool {
        match (self, kind) {
            (PropertyValue::String(_), PropertyKind::String)
            | (PropertyValue::Integer(_), PropertyKind::Integer)
            | (PropertyValue::Boolean(_), PropertyKind::Boolean)
            | (PropertyValue::Bytes(_), PropertyKind::Base64Binary)
            | (PropertyValue::DateTime(_), PropertyKind::DateTime) => true,
            (PropertyValue::Enum(value), PropertyKind::Enum { variants, .. }) => {
                variants.contains(value)
            }
            (PropertyValue::Complex(value), PropertyKind::Complex(new))
            | (PropertyValue::Complex(value), PropertyKind::Collection(new)) => {
                value.is_same_kind(&new())
            }
            _ => false,
        }
    }

    /// Whether this value is written as an empty element.
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            PropertyValue::String(value) => value.is_empty(),
            PropertyValue::Bytes(value) => value.is_empty(),
            PropertyValue::Complex(value) => value.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) => Some(value.as_str()),
            PropertyValue::Enum(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PropertyValue::Bytes(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<DateTime> {
        match self {
            PropertyValue::DateTime(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexValue> {
        match self {
            PropertyValue::Complex(value) => Some(value),
            _ => None,
        }
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_owned())
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(value: Vec<u8>) -> Self {
        PropertyValue::Bytes(value)
    }
}

impl From<DateTime> for PropertyValue {
    fn from(value: DateTime) -> Self {
        PropertyValue::DateTime(value)
    }
}

impl From<ComplexValue> for PropertyValue {
    fn from(value: ComplexValue) -> Self {
        PropertyValue::Complex(value)
    }
}
