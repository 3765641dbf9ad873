/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use fxhash::FxHashMap;

use crate::{Error, PropertyDefinition, XmlNamespace};

/// The ordered set of property definitions of one kind of entity.
///
/// Declaration order is significant: properties are always written in this
/// order, as the server validates element order. A schema built on top of a
/// base schema lists the base's definitions first.
///
/// Element lookups are hashed by qualified name, as every element read from a
/// document is resolved against the schema.
#[derive(Debug)]
pub struct EntitySchema {
    name: &'static str,
    definitions: Vec<&'static PropertyDefinition>,
    by_element: FxHashMap<&'static str, Vec<(XmlNamespace, usize)>>,
    by_uri: FxHashMap<&'static str, usize>,
}

impl EntitySchema {
    /// Starts building a schema with the given name.
    pub fn builder(name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            name,
            definitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The definitions of the schema, in declaration order.
    pub fn definitions(&self) -> &[&'static PropertyDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Finds the definition of the element with the given qualified name.
    pub fn resolve(
        &self,
        namespace: XmlNamespace,
        element_name: &str,
    ) -> Option<&'static PropertyDefinition> {
        self.resolve_index(namespace, element_name)
            .map(|index| self.definitions[index])
    }

    pub(crate) fn resolve_index(&self, namespace: XmlNamespace, element_name: &str) -> Option<usize> {
        self.by_element
            .get(element_name)?
            .iter()
            .find(|(candidate, _)| *candidate == namespace)
            .map(|(_, index)| *index)
    }

    /// The position of the given definition within the schema.
    pub fn index_of(&self, definition: &PropertyDefinition) -> Option<usize> {
        self.by_uri.get(definition.uri).copied()
    }

    pub fn contains(&self, definition: &PropertyDefinition) -> bool {
        self.index_of(definition).is_some()
    }

    pub(crate) fn definition(&self, index: usize) -> &'static PropertyDefinition {
        self.definitions[index]
    }
}

/// Accumulates the definitions of an [`EntitySchema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: &'static str,
    definitions: Vec<&'static PropertyDefinition>,
}

impl SchemaBuilder {
    /// Inherits all definitions of a base schema.
    ///
    /// Must be called before any definitions of this schema are added, so
    /// that inherited properties are written first.
    pub fn extends(mut self, base: &EntitySchema) -> Self {
        self.definitions.extend_from_slice(base.definitions());
        self
    }

    pub fn property(mut self, definition: &'static PropertyDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    pub fn properties<I>(mut self, definitions: I) -> Self
    where
        I: IntoIterator<Item = &'static PropertyDefinition>,
    {
        self.definitions.extend(definitions);
        self
    }

    /// Builds the schema.
    ///
    /// Fails with [`Error::Schema`] if two definitions share a qualified
    /// element name or a field URI.
    pub fn build(self) -> Result<EntitySchema, Error> {
        let mut by_element: FxHashMap<&'static str, Vec<(XmlNamespace, usize)>> =
            FxHashMap::default();
        let mut by_uri = FxHashMap::default();

        for (index, definition) in self.definitions.iter().enumerate() {
            let candidates = by_element.entry(definition.xml_element_name).or_default();
            if candidates
                .iter()
                .any(|(namespace, _)| *namespace == definition.namespace)
            {
                return Err(Error::Schema(format!(
                    "element `{}` is declared twice in schema `{}`",
                    definition.xml_element_name, self.name
                )));
            }
            candidates.push((definition.namespace, index));

            if by_uri.insert(definition.uri, index).is_some() {
                return Err(Error::Schema(format!(
                    "field `{}` is declared twice in schema `{}`",
                    definition.uri, self.name
                )));
            }
        }

        Ok(EntitySchema {
            name: self.name,
            definitions: self.definitions,
            by_element,
            by_uri,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertyKind;

    static A: PropertyDefinition = PropertyDefinition::new("A", "test:A", PropertyKind::Integer);
    static B: PropertyDefinition = PropertyDefinition::new("B", "test:B", PropertyKind::Integer);
    static C: PropertyDefinition = PropertyDefinition::new("C", "test:C", PropertyKind::String);
    static A_AGAIN: PropertyDefinition =
        PropertyDefinition::new("A", "test:OtherA", PropertyKind::String);
    static A_IN_MESSAGES: PropertyDefinition =
        PropertyDefinition::new("A", "test:MessagesA", PropertyKind::String)
            .in_namespace(XmlNamespace::Messages);

    #[test]
    fn derived_schema_lists_base_definitions_first() {
        let base = EntitySchema::builder("Base")
            .property(&A)
            .property(&B)
            .build()
            .expect("base schema should build");

        let derived = EntitySchema::builder("Derived")
            .extends(&base)
            .property(&C)
            .build()
            .expect("derived schema should build");

        let names: Vec<_> = derived
            .definitions()
            .iter()
            .map(|definition| definition.xml_element_name)
            .collect();
        assert_eq!(names, ["A", "B", "C"]);

        assert_eq!(derived.resolve(XmlNamespace::Types, "C"), Some(&C));
        assert_eq!(derived.index_of(&B), Some(1));
        assert!(!base.contains(&C), "base schema should be unaffected");
    }

    #[test]
    fn resolution_considers_namespace() {
        let schema = EntitySchema::builder("Test")
            .property(&A)
            .property(&A_IN_MESSAGES)
            .build()
            .expect("same name in distinct namespaces should be allowed");

        assert_eq!(schema.resolve(XmlNamespace::Types, "A"), Some(&A));
        assert_eq!(
            schema.resolve(XmlNamespace::Messages, "A"),
            Some(&A_IN_MESSAGES)
        );
        assert_eq!(schema.resolve(XmlNamespace::Types, "Z"), None);
    }

    #[test]
    fn duplicate_element_name_is_rejected() {
        let err = EntitySchema::builder("Test")
            .property(&A)
            .property(&A_AGAIN)
            .build()
            .expect_err("duplicate element name should be rejected");

        assert!(matches!(err, Error::Schema(_)), "unexpected error: {err:?}");
    }

    #[test]
    fn duplicate_inherited_definition_is_rejected() {
        let base = EntitySchema::builder("Base").property(&A).build().unwrap();

        let err = EntitySchema::builder("Derived")
            .extends(&base)
            .property(&A)
            .build()
            .expect_err("redeclaring an inherited property should be rejected");

        assert!(matches!(err, Error::Schema(_)), "unexpected error: {err:?}");
    }
}
