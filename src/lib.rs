/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! A schema-driven object model for Exchange Web Services (EWS).
//!
//! Entities such as messages, calendar items and folders are represented by a
//! [`ServiceObject`], which owns a [`PropertyBag`] bound to an immutable
//! [`EntitySchema`]. The schema is an ordered list of
//! [`PropertyDefinition`]s; the serializer walks that list against a
//! forward-only [`XmlReader`] or [`XmlWriter`] to consume or produce the wire
//! representation. Nested structured values implement [`ComplexProperty`] and
//! report in-place mutation back to their owning bag, so that an update
//! request only carries what actually changed.
//!
//! Transport is not handled here: requests are serialized into complete SOAP
//! documents with [`soap::Envelope::as_xml_document`], and responses are read
//! back from raw bytes with [`soap::Envelope::from_xml_document`].

use thiserror::Error;

mod types;

#[cfg(test)]
mod test_utils;

pub use ews_xml::{Namespace, XmlReader, XmlWriter};
pub use types::*;

/// An error generated while building schemas, manipulating entities, or
/// reading and writing EWS documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An element or schema could not be mapped onto the registered property
    /// definitions.
    #[error("schema error: {0}")]
    Schema(String),

    /// The text content of an element could not be converted to the type
    /// declared by its property definition.
    #[error("content of `{element}` is not a valid {expected}: `{value}`")]
    Parse {
        element: String,
        value: String,
        expected: &'static str,
    },

    /// A property was read before being loaded from the server or assigned.
    ///
    /// `explicit_load` is set when the property is never returned as part of
    /// a base shape and must be named in the request's property set.
    #[error("property `{property}` must be loaded or assigned before it can be read")]
    PropertyAccess {
        property: &'static str,
        explicit_load: bool,
    },

    /// A property was written in a way its definition does not allow.
    #[error("property `{property}` {reason}")]
    ReadOnlyProperty {
        property: &'static str,
        reason: ReadOnlyReason,
    },

    /// A value of the wrong type was assigned to a property.
    #[error("property `{property}` expects a value of type {expected}")]
    PropertyType {
        property: &'static str,
        expected: &'static str,
    },

    /// A property was explicitly requested which the active protocol version
    /// does not support.
    #[error("property `{property}` requires {required} but the session uses {active}")]
    VersionMismatch {
        property: &'static str,
        required: ExchangeServerVersion,
        active: ExchangeServerVersion,
    },

    #[error("error reading or writing XML")]
    Xml(#[source] ews_xml::Error),

    /// A date and time could not be written in `xs:dateTime` form.
    #[error("failed to format date and time")]
    DateTimeFormat(#[from] time::error::Format),

    #[error("request failed with a SOAP fault: {0}")]
    RequestFault(Box<soap::Fault>),

    #[error("unexpected response from server: {0}")]
    UnexpectedResponse(String),

    #[error("unknown Exchange server version `{0}`")]
    UnknownServerVersion(String),

    #[error("invalid service configuration")]
    Config(#[from] serde_path_to_error::Error<serde_json::Error>),
}

impl Error {
    /// Whether this error was caused by a response the server should not
    /// have sent, or which this library could not make sense of.
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            Error::Schema(_)
                | Error::Parse { .. }
                | Error::Xml(_)
                | Error::RequestFault(_)
                | Error::UnexpectedResponse(_)
                | Error::UnknownServerVersion(_)
        )
    }

    /// Whether this error was caused by misuse of the API by the caller.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::PropertyAccess { .. }
                | Error::ReadOnlyProperty { .. }
                | Error::PropertyType { .. }
                | Error::VersionMismatch { .. }
                | Error::DateTimeFormat(_)
        )
    }
}

// Conversion failures are reported by `ews_xml` alongside structural XML
// errors, but they describe bad values rather than a bad document.
impl From<ews_xml::Error> for Error {
    fn from(err: ews_xml::Error) -> Self {
        match err {
            ews_xml::Error::InvalidValue {
                element,
                value,
                expected,
            } => Error::Parse {
                element,
                value,
                expected,
            },
            err => Error::Xml(err),
        }
    }
}

/// The reason a property could not be written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum ReadOnlyReason {
    #[strum(to_string = "cannot be set")]
    NotSettable,

    #[strum(to_string = "cannot be updated on an existing object")]
    NotUpdatable,

    #[strum(to_string = "cannot be deleted")]
    NotDeletable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_becomes_parse_error() {
        let err: Error = ews_xml::Error::InvalidValue {
            element: "Size".to_string(),
            value: "large".to_string(),
            expected: "integer",
        }
        .into();

        assert!(
            matches!(err, Error::Parse { ref element, .. } if element == "Size"),
            "conversion failures should surface as parse errors, got {err:?}"
        );
        assert!(err.is_malformed_response());
        assert!(!err.is_usage_error());
    }

    #[test]
    fn structural_xml_error_is_kept() {
        let err: Error = ews_xml::Error::UnexpectedEof.into();

        assert!(matches!(err, Error::Xml(ews_xml::Error::UnexpectedEof)));
        assert!(err.is_malformed_response());
    }

    #[test]
    fn caller_errors_are_usage_errors() {
        let errors = [
            Error::PropertyAccess {
                property: "item:Subject",
                explicit_load: false,
            },
            Error::ReadOnlyProperty {
                property: "item:Size",
                reason: ReadOnlyReason::NotSettable,
            },
            Error::VersionMismatch {
                property: "item:Culture",
                required: ExchangeServerVersion::Exchange2010,
                active: ExchangeServerVersion::Exchange2007_SP1,
            },
        ];

        for err in errors {
            assert!(err.is_usage_error(), "{err:?} should be a usage error");
            assert!(
                !err.is_malformed_response(),
                "{err:?} should not be a response error"
            );
        }
    }

    #[test]
    fn read_only_message_names_reason() {
        let err = Error::ReadOnlyProperty {
            property: "item:Size",
            reason: ReadOnlyReason::NotSettable,
        };

        assert_eq!(err.to_string(), "property `item:Size` cannot be set");
    }
}
