/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::io::BufRead;

use quick_xml::{events::Event, name::ResolveResult, NsReader};

use crate::{Error, FromXmlText, Namespace};

/// The kind of node the reader is currently positioned on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// No node has been read yet.
    None,
    StartElement,
    EndElement,
    Text,
    Eof,
}

/// A forward-only cursor over the nodes of an XML document.
///
/// Only the current node is held in memory. Empty elements (`<Foo/>`) are
/// reported as a start element immediately followed by an end element, so
/// consumers need not distinguish the two forms. Whitespace-only text between
/// elements is skipped by [`XmlReader::read`].
pub struct XmlReader<R> {
    inner: NsReader<R>,
    buf: Vec<u8>,

    kind: NodeKind,
    local_name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    text: String,

    /// The number of currently open elements, including the current one if
    /// it is a start element.
    depth: usize,
}

impl<R> XmlReader<R>
where
    R: BufRead,
{
    /// Creates a reader over the given source, positioned before the first
    /// node.
    pub fn new(source: R) -> Self {
        let mut inner = NsReader::from_reader(source);
        inner.config_mut().expand_empty_elements = true;

        Self {
            inner,
            buf: Vec::new(),
            kind: NodeKind::None,
            local_name: String::new(),
            namespace: None,
            attributes: Vec::new(),
            text: String::new(),
            depth: 0,
        }
    }

    /// Advances to the next significant node and returns its kind.
    ///
    /// XML declarations, comments, processing instructions and
    /// whitespace-only text nodes are skipped.
    pub fn read(&mut self) -> Result<NodeKind, Error> {
        loop {
            match self.advance()? {
                Some(NodeKind::Text) if self.text.trim().is_empty() => continue,
                Some(kind) => return Ok(kind),
                None => continue,
            }
        }
    }

    /// The kind of the current node.
    pub fn node_kind(&self) -> NodeKind {
        self.kind
    }

    /// The local (unprefixed) name of the current element.
    ///
    /// Empty unless the reader is positioned on a start or end element.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// The namespace URI of the current element, if it is bound to one.
    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The number of currently open elements.
    ///
    /// When positioned on a start element, this includes that element. When
    /// positioned on an end element, it does not.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the current node is a start element matching the given
    /// namespace and local name. Omitted criteria match any value.
    pub fn is_start_element(&self, namespace: Option<Namespace>, name: Option<&str>) -> bool {
        self.kind == NodeKind::StartElement && self.matches(namespace, name)
    }

    /// Whether the current node is an end element matching the given
    /// namespace and local name. Omitted criteria match any value.
    pub fn is_end_element(&self, namespace: Option<Namespace>, name: Option<&str>) -> bool {
        self.kind == NodeKind::EndElement && self.matches(namespace, name)
    }

    /// Returns an error unless the current node is a matching start element.
    pub fn ensure_start_element(
        &self,
        namespace: Option<Namespace>,
        name: Option<&str>,
    ) -> Result<(), Error> {
        if self.is_start_element(namespace, name) {
            Ok(())
        } else {
            Err(self.unexpected(format!("start of {}", describe(namespace, name))))
        }
    }

    /// Advances to the next node and checks that it is a matching start
    /// element.
    pub fn read_start_element(&mut self, namespace: Option<Namespace>, name: &str) -> Result<(), Error> {
        self.read()?;
        self.ensure_start_element(namespace, Some(name))
    }

    /// Advances to the next node and checks that it is a matching end
    /// element.
    pub fn read_end_element(&mut self, namespace: Option<Namespace>, name: &str) -> Result<(), Error> {
        self.read()?;
        if self.is_end_element(namespace, Some(name)) {
            Ok(())
        } else {
            Err(self.unexpected(format!("end of {}", describe(namespace, Some(name)))))
        }
    }

    /// Advances to the next child element of the element opened at
    /// `parent_depth`.
    ///
    /// Returns `true` when positioned on the start of a child element, and
    /// `false` once the parent's end tag has been consumed. Text directly
    /// inside the parent is ignored. Callers must consume each child in full
    /// (e.g. via [`XmlReader::read_element_value`] or
    /// [`XmlReader::skip_current_element`]) before calling this again.
    pub fn read_child_start(&mut self, parent_depth: usize) -> Result<bool, Error> {
        loop {
            match self.read()? {
                NodeKind::StartElement => return Ok(true),
                NodeKind::EndElement if self.depth < parent_depth => return Ok(false),
                NodeKind::EndElement | NodeKind::Text | NodeKind::None => continue,
                NodeKind::Eof => return Err(Error::UnexpectedEof),
            }
        }
    }

    /// Reads the text content of the current element and consumes its end
    /// tag.
    ///
    /// Whitespace is preserved. An empty element yields an empty string. Fails
    /// if the element contains child elements.
    pub fn read_element_text(&mut self) -> Result<String, Error> {
        self.ensure_start_element(None, None)?;

        let element = self.local_name.clone();
        let target = self.depth - 1;
        let mut content = String::new();

        loop {
            match self.advance()? {
                Some(NodeKind::Text) => content.push_str(&self.text),
                Some(NodeKind::EndElement) if self.depth == target => break,
                Some(NodeKind::Eof) => return Err(Error::UnexpectedEof),
                Some(_) => {
                    return Err(self.unexpected(format!("text content of `{element}`")));
                }
                None => continue,
            }
        }

        Ok(content)
    }

    /// Reads the text content of the current element, converts it to `T` and
    /// consumes the element's end tag.
    pub fn read_element_value<T>(&mut self) -> Result<T, Error>
    where
        T: FromXmlText,
    {
        let element = self.local_name.clone();
        let text = self.read_element_text()?;

        T::from_xml_text(&text).map_err(|err| Error::InvalidValue {
            element,
            value: text,
            expected: err.expected,
        })
    }

    /// Returns the value of the named attribute on the current start element.
    pub fn read_attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the value of the named attribute on the current start element,
    /// converted to `T`.
    pub fn read_attribute<T>(&self, name: &str) -> Result<Option<T>, Error>
    where
        T: FromXmlText,
    {
        self.read_attribute_value(name)
            .map(|value| {
                T::from_xml_text(value).map_err(|err| Error::InvalidValue {
                    element: format!("{}/@{name}", self.local_name),
                    value: value.to_owned(),
                    expected: err.expected,
                })
            })
            .transpose()
    }

    /// Whether the current start element carries any attributes other than
    /// namespace declarations.
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Consumes the current element, including all of its descendants, so
    /// that the reader is positioned on its end tag.
    ///
    /// Does nothing if the reader is not positioned on a start element.
    pub fn skip_current_element(&mut self) -> Result<(), Error> {
        if self.kind != NodeKind::StartElement {
            return Ok(());
        }

        log::trace!("skipping element `{}`", self.qualified_name());

        let target = self.depth - 1;
        loop {
            match self.advance()? {
                Some(NodeKind::EndElement) if self.depth == target => return Ok(()),
                Some(NodeKind::Eof) => return Err(Error::UnexpectedEof),
                _ => continue,
            }
        }
    }

    /// Reads the next raw event into the current node.
    ///
    /// Returns `None` for events which carry no meaning for consumers, in
    /// which case the current node is left untouched.
    fn advance(&mut self) -> Result<Option<NodeKind>, Error> {
        self.buf.clear();
        let (resolved, event) = self.inner.read_resolved_event_into(&mut self.buf)?;

        let kind = match event {
            Event::Start(start) => {
                self.namespace = resolved_uri(&resolved);
                self.local_name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                self.attributes.clear();
                for attr in start.attributes() {
                    let attr = attr?;
                    if attr.key.as_namespace_binding().is_some() {
                        continue;
                    }

                    let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
                    let value = attr.unescape_value()?.into_owned();
                    self.attributes.push((name, value));
                }
                self.text.clear();
                self.depth += 1;

                NodeKind::StartElement
            }
            Event::End(end) => {
                self.namespace = resolved_uri(&resolved);
                self.local_name = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                self.attributes.clear();
                self.text.clear();
                self.depth = self.depth.saturating_sub(1);

                NodeKind::EndElement
            }
            Event::Text(text) => {
                self.text = text.unescape()?.into_owned();

                NodeKind::Text
            }
            Event::CData(cdata) => {
                self.text = String::from_utf8_lossy(&cdata).into_owned();

                NodeKind::Text
            }
            Event::Eof => NodeKind::Eof,

            // Empty elements are expanded by the underlying reader, and the
            // remaining events carry no content.
            _ => return Ok(None),
        };

        self.kind = kind;

        Ok(Some(kind))
    }

    fn matches(&self, namespace: Option<Namespace>, name: Option<&str>) -> bool {
        let namespace_matches = match namespace {
            Some(namespace) => self.namespace.as_deref() == Some(namespace.uri),
            None => true,
        };

        namespace_matches && name.map_or(true, |name| self.local_name == name)
    }

    fn unexpected(&self, expected: String) -> Error {
        let found = match self.kind {
            NodeKind::None => "start of document".to_string(),
            NodeKind::StartElement => format!("start of `{}`", self.qualified_name()),
            NodeKind::EndElement => format!("end of `{}`", self.qualified_name()),
            NodeKind::Text => "text content".to_string(),
            NodeKind::Eof => "end of document".to_string(),
        };

        Error::UnexpectedNode { expected, found }
    }

    fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{{{namespace}}}{}", self.local_name),
            None => self.local_name.clone(),
        }
    }
}

fn resolved_uri(resolved: &ResolveResult) -> Option<String> {
    match resolved {
        ResolveResult::Bound(namespace) => {
            Some(String::from_utf8_lossy(namespace.as_ref()).into_owned())
        }
        _ => None,
    }
}

fn describe(namespace: Option<Namespace>, name: Option<&str>) -> String {
    match (namespace, name) {
        (Some(namespace), Some(name)) => format!("`{{{}}}{name}`", namespace.uri),
        (None, Some(name)) => format!("`{name}`"),
        (Some(namespace), None) => format!("an element in `{}`", namespace.uri),
        (None, None) => "an element".to_string(),
    }
}
