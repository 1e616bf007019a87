use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

/// One parsed XML element: tag name (namespace prefix included), string
/// attributes, direct text content, and child elements in document order.
///
/// The parser is non-validating. Attribute values stay strings; numeric and
/// base64 conversion happens at the domain layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: HashMap<String, String>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(element_from_start(&start)?),
                Ok(Event::Empty(start)) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::Text(text)) => {
                    if let Some(open) = stack.last_mut() {
                        let unescaped = text.unescape().map_err(|e| Error::Xml(e.to_string()))?;
                        open.text.push_str(&unescaped);
                    }
                }
                Ok(Event::CData(cdata)) => {
                    if let Some(open) = stack.last_mut() {
                        open.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                    }
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::Xml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(Error::Xml(e.to_string())),
            }
        }

        if !stack.is_empty() {
            return Err(Error::Xml("unterminated element".to_string()));
        }
        root.ok_or_else(|| Error::Xml("document has no root element".to_string()))
    }

    /// Tag name with any namespace prefix stripped (`xdebug:message` →
    /// `message`).
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attr_u32(&self, name: &str) -> Option<u32> {
        self.attr(name)?.parse().ok()
    }

    pub fn attr_u64(&self, name: &str) -> Option<u64> {
        self.attr(name)?.parse().ok()
    }

    pub fn attr_i32(&self, name: &str) -> Option<i32> {
        self.attr(name)?.parse().ok()
    }

    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        match self.attr(name)? {
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            _ => None,
        }
    }

    /// First child whose local name matches.
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.local_name() == local)
    }

    /// Every child whose local name matches, in document order.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.local_name() == local)
    }

    /// Text content with the `encoding="base64"` convention honored: when
    /// the element declares base64, the payload is decoded before exposure.
    pub fn decoded_text(&self) -> Result<String> {
        if self.attr("encoding") != Some("base64") {
            return Ok(self.text.clone());
        }
        let packed: String = self.text.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(packed.as_bytes())
            .map_err(|e| Error::Protocol(format!("invalid base64 payload: {e}")))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn attach(stack: &mut Vec<Element>, root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        ..Default::default()
    };
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(e.to_string()))?
            .into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}
