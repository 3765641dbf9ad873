/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! This module provides implementations of text conversion for common types
//! from the standard library.

use std::borrow::Cow;

use crate::{FromXmlText, InvalidValue, ToXmlText};

/// Reads text content verbatim.
impl FromXmlText for String {
    fn from_xml_text(text: &str) -> Result<Self, InvalidValue> {
        Ok(text.to_owned())
    }
}

/// Writes a string verbatim. Escaping is handled by the writer.
impl ToXmlText for String {
    fn to_xml_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

/// Writes a string verbatim. Escaping is handled by the writer.
impl ToXmlText for str {
    fn to_xml_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

/// Writes the referenced value.
impl<T> ToXmlText for &T
where
    T: ToXmlText + ?Sized,
{
    fn to_xml_text(&self) -> Cow<'_, str> {
        <T as ToXmlText>::to_xml_text(*self)
    }
}

/// Reads an `xs:boolean`, which allows both the literal and numeric forms.
impl FromXmlText for bool {
    fn from_xml_text(text: &str) -> Result<Self, InvalidValue> {
        match text.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(InvalidValue {
                expected: "boolean",
            }),
        }
    }
}

/// Writes a boolean in its canonical `xs:boolean` literal form.
impl ToXmlText for bool {
    fn to_xml_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(if *self { "true" } else { "false" })
    }
}

/// Implements text conversion for integer types.
///
/// This is done per-type rather than wholesale for `FromStr` and `ToString` in
/// order to give each type a readable description in conversion errors.
macro_rules! impl_xml_text_for_int {
    ($( $ty:ty ),*) => {
        $(
        /// Reads an integer, ignoring surrounding whitespace.
        impl FromXmlText for $ty {
            fn from_xml_text(text: &str) -> Result<Self, InvalidValue> {
                text.trim().parse::<$ty>().map_err(|_| InvalidValue {
                    expected: concat!("integer (", stringify!($ty), ")"),
                })
            }
        }

        /// Writes an integer in decimal notation.
        impl ToXmlText for $ty {
            fn to_xml_text(&self) -> Cow<'_, str> {
                Cow::Owned(self.to_string())
            }
        })*
    };
}

impl_xml_text_for_int!(i8, u8, i16, u16, i32, u32, i64, u64, usize);
