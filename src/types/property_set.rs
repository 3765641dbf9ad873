/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::Write;

use ews_xml::XmlWriter;

use crate::{BaseShape, BodyType, Error, PropertyDefinition, ServiceContext, XmlNamespace};

/// The properties which should be included in a response for each item or
/// folder.
///
/// See <https://learn.microsoft.com/en-us/exchange/client-developer/web-service-reference/itemshape>
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertySet {
    /// The base set of properties to include, which may be extended by
    /// `additional_properties`.
    pub base_shape: BaseShape,

    /// The format in which item bodies should be returned.
    pub body_type: Option<BodyType>,

    additional_properties: Vec<&'static PropertyDefinition>,
}

impl PropertySet {
    pub fn new(base_shape: BaseShape) -> Self {
        Self {
            base_shape,
            ..Default::default()
        }
    }

    pub fn id_only() -> Self {
        Self::new(BaseShape::IdOnly)
    }

    /// Requests a property in addition to those of the base shape.
    ///
    /// Properties flagged as requiring an explicit load are only returned
    /// when requested this way.
    pub fn with_property(mut self, definition: &'static PropertyDefinition) -> Self {
        if !self.additional_properties.contains(&definition) {
            self.additional_properties.push(definition);
        }

        self
    }

    pub fn with_body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = Some(body_type);
        self
    }

    pub fn properties(&self) -> &[&'static PropertyDefinition] {
        &self.additional_properties
    }

    /// Checks that every requested property is available in the session's
    /// protocol version.
    pub fn validate(&self, context: &ServiceContext) -> Result<(), Error> {
        match self
            .additional_properties
            .iter()
            .find(|definition| !context.supports(definition.version))
        {
            Some(definition) => Err(Error::VersionMismatch {
                property: definition.uri,
                required: definition.version,
                active: context.version,
            }),
            None => Ok(()),
        }
    }

    /// Writes the property set as a shape element, e.g. `ItemShape`.
    pub(crate) fn write_to_xml<W: Write>(
        &self,
        writer: &mut XmlWriter<W>,
        context: &ServiceContext,
        element_name: &str,
    ) -> Result<(), Error> {
        self.validate(context)?;

        let types = context.namespaces.get(XmlNamespace::Types);

        writer.write_start_element(context.namespaces.get(XmlNamespace::Messages), element_name)?;
        writer.write_element_value(types, "BaseShape", &self.base_shape)?;
        if let Some(body_type) = &self.body_type {
            writer.write_element_value(types, "BodyType", body_type)?;
        }

        if !self.additional_properties.is_empty() {
            writer.write_start_element(types, "AdditionalProperties")?;
            for definition in &self.additional_properties {
                writer.write_start_element(types, "FieldURI")?;
                writer.write_attribute_value("FieldURI", definition.uri)?;
                writer.write_end_element()?;
            }
            writer.write_end_element()?;
        }

        writer.write_end_element()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schemas::{item, message},
        test_utils::*,
        ExchangeServerVersion,
    };

    #[test]
    fn shape_lists_additional_properties() {
        let shape = PropertySet::id_only()
            .with_property(&item::SUBJECT)
            .with_property(&message::IS_READ)
            .with_property(&item::SUBJECT)
            .with_body_type(BodyType::Html);

        assert_eq!(shape.properties().len(), 2, "duplicates should be ignored");
        assert_serialized_content(
            |writer, context| shape.write_to_xml(writer, context, "ItemShape"),
            r#"<m:ItemShape><t:BaseShape>IdOnly</t:BaseShape><t:BodyType>HTML</t:BodyType><t:AdditionalProperties><t:FieldURI FieldURI="item:Subject"/><t:FieldURI FieldURI="message:IsRead"/></t:AdditionalProperties></m:ItemShape>"#,
        );
    }

    #[test]
    fn base_shape_alone() {
        let shape = PropertySet::new(BaseShape::AllProperties);

        assert_serialized_content(
            |writer, context| shape.write_to_xml(writer, context, "FolderShape"),
            "<m:FolderShape><t:BaseShape>AllProperties</t:BaseShape></m:FolderShape>",
        );
    }

    #[test]
    fn newer_property_is_rejected_when_requested() {
        let shape = PropertySet::id_only().with_property(&item::CULTURE);

        let err = shape
            .validate(&ServiceContext::new(ExchangeServerVersion::Exchange2007_SP1))
            .expect_err("culture requires Exchange 2010");
        assert!(
            matches!(
                err,
                Error::VersionMismatch {
                    property: "item:Culture",
                    required: ExchangeServerVersion::Exchange2010,
                    active: ExchangeServerVersion::Exchange2007_SP1,
                }
            ),
            "unexpected error: {err:?}"
        );

        shape
            .validate(&ServiceContext::new(ExchangeServerVersion::Exchange2013))
            .expect("culture should be available in Exchange 2013");
    }
}
