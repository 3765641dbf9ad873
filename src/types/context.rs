/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use serde::Deserialize;

use crate::{
    Error, ExchangeServerVersion, NamespaceTable, ServerVersionInfo, ServiceObjectRegistry,
};

/// How the deserializer treats elements it has no mapping for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParsingMode {
    /// Unknown elements are skipped, so that responses from newer servers
    /// can still be read.
    #[default]
    Tolerant,

    /// Unknown elements fail with [`Error::Schema`].
    Strict,
}

/// Session-wide settings threaded through every read and write.
///
/// A context is created once when setting up a client, typically from the
/// version negotiated with the server, and shared by reference with all
/// serialization calls for that session.
#[derive(Clone, Debug, Default)]
pub struct ServiceContext {
    /// The protocol version requested from the server. Properties which
    /// require a newer version are omitted when writing.
    pub version: ExchangeServerVersion,

    pub parsing: ParsingMode,

    pub namespaces: NamespaceTable,

    /// Factories used to create entities from their wire tags.
    pub registry: ServiceObjectRegistry,
}

impl ServiceContext {
    pub fn new(version: ExchangeServerVersion) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    pub fn with_parsing_mode(mut self, parsing: ParsingMode) -> Self {
        self.parsing = parsing;
        self
    }

    /// Creates a context from a deserialized configuration.
    ///
    /// An absent or unrecognized version string falls back to
    /// [`ExchangeServerVersion::DEFAULT`].
    pub fn from_config(config: &ServiceConfig) -> Self {
        let version = match config.version.as_deref() {
            Some(version) => ExchangeServerVersion::try_from(version).unwrap_or_else(|_| {
                log::warn!(
                    "configured version `{version}` is not recognized, using {}",
                    ExchangeServerVersion::DEFAULT
                );
                ExchangeServerVersion::DEFAULT
            }),
            None => ExchangeServerVersion::DEFAULT,
        };

        let parsing = if config.strict_parsing {
            ParsingMode::Strict
        } else {
            ParsingMode::Tolerant
        };

        Self::new(version).with_parsing_mode(parsing)
    }

    /// Adopts the version reported by the server in a response header, if it
    /// is known and older than the one currently requested.
    pub fn negotiate(&mut self, info: &ServerVersionInfo) {
        if let Some(version) = info.server_version() {
            if version < self.version {
                log::debug!("server supports {version}, lowering requested version");
                self.version = version;
            }
        }
    }

    pub(crate) fn supports(&self, version: ExchangeServerVersion) -> bool {
        self.version >= version
    }
}

/// A serialized description of the settings of a [`ServiceContext`].
///
/// ```
/// use ews::{ExchangeServerVersion, ParsingMode, ServiceConfig, ServiceContext};
///
/// let config = ServiceConfig::from_json(r#"{ "version": "Exchange2013", "strict_parsing": true }"#).unwrap();
/// let context = ServiceContext::from_config(&config);
///
/// assert_eq!(context.version, ExchangeServerVersion::Exchange2013);
/// assert_eq!(context.parsing, ParsingMode::Strict);
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// The protocol version to request, e.g. `"Exchange2010_SP1"`.
    #[serde(default)]
    pub version: Option<String>,

    /// Whether unknown elements should fail deserialization.
    #[serde(default)]
    pub strict_parsing: bool,
}

impl ServiceConfig {
    /// Reads a configuration from JSON.
    ///
    /// On failure, the returned [`Error::Config`] names the path of the
    /// offending field.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let de = &mut serde_json::Deserializer::from_str(json);

        Ok(serde_path_to_error::deserialize(de)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ServiceConfig::from_json("{}").expect("empty object should be accepted");
        let context = ServiceContext::from_config(&config);

        assert_eq!(context.version, ExchangeServerVersion::Exchange2007_SP1);
        assert_eq!(context.parsing, ParsingMode::Tolerant);
    }

    #[test]
    fn unknown_version_falls_back_to_default() {
        let config = ServiceConfig::from_json(r#"{ "version": "Exchange1999" }"#).unwrap();
        let context = ServiceContext::from_config(&config);

        assert_eq!(context.version, ExchangeServerVersion::DEFAULT);
    }

    #[test]
    fn config_errors_name_the_field() {
        let err = ServiceConfig::from_json(r#"{ "strict_parsing": "yes" }"#)
            .expect_err("string should not be accepted for a boolean");

        match err {
            Error::Config(err) => assert_eq!(err.path().to_string(), "strict_parsing"),
            err => panic!("unexpected error: {err:?}"),
        }
    }

    #[test]
    fn negotiation_only_lowers_the_version() {
        let mut context = ServiceContext::new(ExchangeServerVersion::Exchange2013);

        context.negotiate(&ServerVersionInfo {
            version: Some("Exchange2010_SP1".to_string()),
            ..Default::default()
        });
        assert_eq!(context.version, ExchangeServerVersion::Exchange2010_SP1);

        context.negotiate(&ServerVersionInfo {
            version: Some("Exchange2016".to_string()),
            ..Default::default()
        });
        assert_eq!(
            context.version,
            ExchangeServerVersion::Exchange2010_SP1,
            "a newer server should not raise the requested version"
        );
    }
}
