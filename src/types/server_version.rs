/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::BufRead;

use ews_xml::XmlReader;
use strum::{Display, IntoStaticStr, VariantNames};

use crate::Error;

/// The Exchange Server version identifiers allowed in `RequestServerVersion`
/// headers.
///
/// Variants are declared oldest first, so versions can be compared to decide
/// whether a property is available in a session.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/requestserverversion#version-attribute-values>
#[allow(non_camel_case_types)]
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    IntoStaticStr,
    VariantNames,
)]
pub enum ExchangeServerVersion {
    Exchange2007,
    Exchange2007_SP1,
    Exchange2010,
    Exchange2010_SP1,
    Exchange2010_SP2,
    Exchange2013,
    Exchange2013_SP1,
    Exchange2016,
}

impl ExchangeServerVersion {
    /// The version assumed when none has been negotiated with the server.
    pub const DEFAULT: ExchangeServerVersion = ExchangeServerVersion::Exchange2007_SP1;

    /// The version string as written in `RequestServerVersion`.
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

impl Default for ExchangeServerVersion {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Parses the provided string into a known version identifier.
impl TryFrom<&str> for ExchangeServerVersion {
    /// If the provided string could not be turned into a known version
    /// identifier, [`Error::UnknownServerVersion`] is returned.
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Exchange2007" => Ok(ExchangeServerVersion::Exchange2007),
            "Exchange2007_SP1" => Ok(ExchangeServerVersion::Exchange2007_SP1),
            "Exchange2010" => Ok(ExchangeServerVersion::Exchange2010),
            "Exchange2010_SP1" => Ok(ExchangeServerVersion::Exchange2010_SP1),
            "Exchange2010_SP2" => Ok(ExchangeServerVersion::Exchange2010_SP2),
            "Exchange2013" => Ok(ExchangeServerVersion::Exchange2013),
            "Exchange2013_SP1" => Ok(ExchangeServerVersion::Exchange2013_SP1),
            "Exchange2016" => Ok(ExchangeServerVersion::Exchange2016),

            _ => Err(Error::UnknownServerVersion(value.to_owned())),
        }
    }
}

// Consumers can require this to persist the version associated with a given
// server.
impl From<ExchangeServerVersion> for String {
    fn from(value: ExchangeServerVersion) -> Self {
        value.as_str().into()
    }
}

/// The version information of the Exchange Server instance that generated
/// the attached response.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/serverversioninfo>
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerVersionInfo {
    pub major_version: Option<String>,
    pub minor_version: Option<String>,
    pub major_build_number: Option<String>,
    pub minor_build_number: Option<String>,
    pub version: Option<String>,
}

impl ServerVersionInfo {
    /// Reads the version information from the attributes of the current
    /// `ServerVersionInfo` start element.
    pub(crate) fn read_attributes_from_xml<R: BufRead>(reader: &XmlReader<R>) -> Self {
        let attribute = |name| reader.read_attribute_value(name).map(str::to_owned);

        Self {
            major_version: attribute("MajorVersion"),
            minor_version: attribute("MinorVersion"),
            major_build_number: attribute("MajorBuildNumber"),
            minor_build_number: attribute("MinorBuildNumber"),
            version: attribute("Version"),
        }
    }

    /// The protocol version reported by the server, if it is one we know of.
    ///
    /// Servers newer than the versions known to this crate report version
    /// strings such as `V2018_01_08`; these yield `None`.
    pub fn server_version(&self) -> Option<ExchangeServerVersion> {
        let version = self.version.as_deref()?;

        match ExchangeServerVersion::try_from(version) {
            Ok(version) => Some(version),
            Err(_) => {
                log::warn!("server reported unrecognized version `{version}`");
                None
            }
        }
    }
}
