/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use ews_xml::Namespace;

pub const SOAP_NS_URI: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const MESSAGES_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/messages";
pub const TYPES_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/types";
pub const ERRORS_NS_URI: &str = "http://schemas.microsoft.com/exchange/services/2006/errors";

/// The XML namespaces used by EWS documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum XmlNamespace {
    /// The SOAP envelope namespace.
    Soap,

    /// The namespace of operation requests and responses.
    Messages,

    /// The namespace of entities and their properties.
    Types,

    /// The namespace of fault details.
    Errors,
}

/// The prefix and URI used for each [`XmlNamespace`].
///
/// A table is created once per session as part of a
/// [`ServiceContext`](crate::ServiceContext) and passed to every read and
/// write. Documents are matched by URI, so prefixes only affect output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceTable {
    soap: Namespace,
    messages: Namespace,
    types: Namespace,
    errors: Namespace,
}

impl Default for NamespaceTable {
    fn default() -> Self {
        Self {
            soap: Namespace {
                prefix: "soap",
                uri: SOAP_NS_URI,
            },
            messages: Namespace {
                prefix: "m",
                uri: MESSAGES_NS_URI,
            },
            types: Namespace {
                prefix: "t",
                uri: TYPES_NS_URI,
            },
            errors: Namespace {
                prefix: "e",
                uri: ERRORS_NS_URI,
            },
        }
    }
}

impl NamespaceTable {
    /// Returns the prefix and URI written for the given namespace.
    pub fn get(&self, namespace: XmlNamespace) -> Namespace {
        match namespace {
            XmlNamespace::Soap => self.soap,
            XmlNamespace::Messages => self.messages,
            XmlNamespace::Types => self.types,
            XmlNamespace::Errors => self.errors,
        }
    }

    /// Replaces the prefix written for the given namespace.
    pub fn with_prefix(mut self, namespace: XmlNamespace, prefix: &'static str) -> Self {
        let entry = match namespace {
            XmlNamespace::Soap => &mut self.soap,
            XmlNamespace::Messages => &mut self.messages,
            XmlNamespace::Types => &mut self.types,
            XmlNamespace::Errors => &mut self.errors,
        };
        entry.prefix = prefix;

        self
    }

    /// Maps the namespace URI of an element read from a document onto a known
    /// namespace.
    ///
    /// Unqualified elements are treated as belonging to the types namespace,
    /// which holds every entity property.
    pub fn resolve(&self, uri: Option<&str>) -> Option<XmlNamespace> {
        let Some(uri) = uri else {
            return Some(XmlNamespace::Types);
        };

        [
            XmlNamespace::Types,
            XmlNamespace::Messages,
            XmlNamespace::Soap,
            XmlNamespace::Errors,
        ]
        .into_iter()
        .find(|namespace| self.get(*namespace).uri == uri)
    }
}
