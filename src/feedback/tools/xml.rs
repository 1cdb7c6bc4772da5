//! Minimal XML tree used for service payloads.
//!
//! Responses are parsed into owned [`XmlElement`] trees so the flattening code
//! never touches the streaming parser. Element and attribute names keep their
//! namespace prefix; lookups compare local names.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::feedback::tools::error::{Result, ToolError};

/// An element with its attributes, text content and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Element name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| local_part(key) == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.local_name() == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children
            .iter()
            .filter(move |child| child.local_name() == name)
    }

    /// Depth-first search for the first element with the given local name,
    /// including `self`.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.local_name() == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// First child element. Result payloads of the service wrap a single
    /// embedded document, and this returns its root.
    pub fn document(&self) -> Option<&XmlElement> {
        self.children.first()
    }

    /// True when the element has no children and no text beyond whitespace.
    pub fn is_blank(&self) -> bool {
        self.children.is_empty() && self.text.trim().is_empty()
    }

    /// Serializes the element and its descendants.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner()).map_err(|err| ToolError::Xml(err.to_string()))
    }
}

/// Parses a complete document and returns its root element.
///
/// Text content is kept exactly as sent, including surrounding whitespace.
/// Whitespace-only text of elements that have children is dropped.
pub fn parse_document(source: &str) -> Result<XmlElement> {
    let mut reader = Reader::from_str(source);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader
            .read_event()
            .map_err(|err| ToolError::Xml(err.to_string()))?
        {
            Event::Start(start) => {
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| ToolError::Xml("unexpected closing tag".into()))?;
                // Indentation between child elements is not content.
                if !element.children.is_empty() && element.text.trim().is_empty() {
                    element.text.clear();
                }
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|err| ToolError::Xml(err.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ToolError::Xml(format!("unclosed element '{}'", open.name)));
    }
    root.ok_or_else(|| ToolError::Xml("document has no root element".into()))
}

/// Escapes `< > " ' &` in a single pass.
pub fn escape(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}

/// Whether `name` can be used as an unprefixed element name (an XML NCName).
pub fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| ToolError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).to_string();
        let value = attribute
            .unescape_value()
            .map_err(|err| ToolError::Xml(err.to_string()))?
            .to_string();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ToolError::Xml("multiple root elements".into())),
    }
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let start = BytesStart::new(element.name.as_str()).with_attributes(
        element
            .attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    );

    if element.children.is_empty() && element.text.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|err| ToolError::Xml(err.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|err| ToolError::Xml(err.to_string()))?;
    if !element.text.is_empty() {
        writer
            .write_event(Event::Text(BytesText::new(&element.text)))
            .map_err(|err| ToolError::Xml(err.to_string()))?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|err| ToolError::Xml(err.to_string()))
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}
