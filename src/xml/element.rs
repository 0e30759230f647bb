use super::{NAMESPACE, PREFIX};
use crate::error::XmlError;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    pub value: String,
}

/// A parsed XML element with namespaces resolved.
///
/// Text and CDATA directly inside the element are concatenated into `text`; whitespace
/// around text is trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub namespace: Option<String>,
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<Element>,
    pub text: String,
}

impl Element {
    /// An element in the process model namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: Some(NAMESPACE.to_string()),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(XmlAttribute {
            namespace: None,
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Whether this element is `name` in the process model namespace.
    pub fn is(&self, name: &str) -> bool {
        self.in_namespace() && self.name == name
    }

    pub fn in_namespace(&self) -> bool {
        self.namespace.as_deref() == Some(NAMESPACE)
    }

    /// Value of an unqualified attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.namespace.is_none() && attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    pub fn required_attribute(&self, name: &str) -> Result<&str, XmlError> {
        self.attribute(name).ok_or_else(|| XmlError::MissingAttribute {
            element: self.name.clone(),
            name: name.to_string(),
        })
    }

    pub fn parse(xml: &str) -> Result<Element, XmlError> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut open: Vec<Element> = Vec::new();

        loop {
            let (resolved, event) = reader.read_resolved_event().map_err(parse_error)?;
            let namespace = namespace_of(resolved);
            match event {
                Event::Start(start) => open.push(start_element(&reader, namespace, &start)?),
                Event::Empty(start) => {
                    let element = start_element(&reader, namespace, &start)?;
                    if let Some(root) = attach(&mut open, element) {
                        return Ok(root);
                    }
                }
                Event::End(_) => {
                    let element = open
                        .pop()
                        .ok_or_else(|| XmlError::Parse("unexpected closing tag".to_string()))?;
                    if let Some(root) = attach(&mut open, element) {
                        return Ok(root);
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = open.last_mut() {
                        current.text.push_str(&text.unescape().map_err(parse_error)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = open.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => return Err(XmlError::Parse("no root element".to_string())),
                _ => {}
            }
        }
    }

    /// Serializes the element as a document. Elements in the process model namespace are
    /// written with the `pe` prefix, declared on the root.
    pub fn write(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        self.write_to(&mut writer, true)?;
        String::from_utf8(writer.into_inner()).map_err(write_error)
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>, root: bool) -> Result<(), XmlError> {
        let name = self.qualified_name();
        let mut start = BytesStart::new(name.as_str());
        if root {
            start.push_attribute((format!("xmlns:{PREFIX}").as_str(), NAMESPACE));
        }
        for attribute in &self.attributes {
            start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
        }

        if self.children.is_empty() && self.text.is_empty() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }
        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if !self.text.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(&self.text)))
                .map_err(write_error)?;
        }
        for child in &self.children {
            child.write_to(writer, false)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(name.as_str())))
            .map_err(write_error)
    }

    fn qualified_name(&self) -> String {
        if self.in_namespace() {
            format!("{PREFIX}:{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{namespace}}}{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

fn start_element(
    reader: &NsReader<&[u8]>,
    namespace: Option<String>,
    start: &BytesStart<'_>,
) -> Result<Element, XmlError> {
    let mut element = Element {
        namespace,
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        ..Element::default()
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(parse_error)?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attribute.key);
        element.attributes.push(XmlAttribute {
            namespace: namespace_of(resolved),
            name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value: attribute.unescape_value().map_err(parse_error)?.into_owned(),
        });
    }
    Ok(element)
}

/// Adds a finished element to its parent, or hands it back when it is the root.
fn attach(open: &mut [Element], element: Element) -> Option<Element> {
    match open.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            None
        }
        None => Some(element),
    }
}

fn namespace_of(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(namespace) => {
            Some(String::from_utf8_lossy(namespace.as_ref()).into_owned())
        }
        _ => None,
    }
}

fn parse_error(error: impl fmt::Display) -> XmlError {
    XmlError::Parse(error.to_string())
}

fn write_error(error: impl fmt::Display) -> XmlError {
    XmlError::Write(error.to_string())
}
