//! Namespace-resolving tree builder over the quick-xml event reader.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smol_str::SmolStr;

use super::{Attribute, Element, XmlError};
use crate::base::LineIndex;

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Read a complete document into an element tree.
///
/// Every element records the line of its start tag. Text and CDATA content is
/// concatenated and trimmed. Prefixes are resolved against the declarations in
/// scope, innermost first; an undeclared prefix leaves the namespace unset.
pub fn parse_document(text: &str) -> Result<Element, XmlError> {
    let lines = LineIndex::new(text);
    let mut reader = Reader::from_reader(text.as_bytes());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut builder = TreeBuilder::default();

    loop {
        let offset = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let line = start_tag_line(text, &lines, offset);
                let element = builder.open(e, line)?;
                builder.stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                let line = start_tag_line(text, &lines, offset);
                let element = builder.open(e, line)?;
                builder.close(element);
            }
            Ok(Event::End(_)) => {
                if let Some(element) = builder.stack.pop() {
                    builder.close(element);
                }
            }
            Ok(Event::Text(ref e)) => {
                let content = e
                    .unescape()
                    .map_err(|e| XmlError::invalid_text(e.to_string()))?;
                builder.append_text(&content);
            }
            Ok(Event::CData(e)) => {
                let content = String::from_utf8_lossy(&e.into_inner()).into_owned();
                builder.append_text(&content);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(XmlError::syntax(
                    reader.error_position() as u64,
                    e.to_string(),
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = builder.stack.last() {
        return Err(XmlError::Unclosed(open.tag.to_string()));
    }
    builder.root.ok_or(XmlError::Empty)
}

/// The reader position before an event may still sit on whitespace or on the
/// end of the previous markup; the element itself starts at the next `<`.
fn start_tag_line(text: &str, lines: &LineIndex, offset: usize) -> u32 {
    let start = text
        .get(offset..)
        .and_then(|rest| rest.find('<'))
        .map_or(offset, |delta| offset + delta);
    lines.line(start)
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Element>,
    /// Namespace declarations per open element: `(prefix, uri)`, empty prefix
    /// for the default namespace.
    scopes: Vec<Vec<(SmolStr, SmolStr)>>,
    root: Option<Element>,
}

impl TreeBuilder {
    fn open(&mut self, e: &BytesStart<'_>, line: u32) -> Result<Element, XmlError> {
        let qualified = std::str::from_utf8(e.name().as_ref())
            .map_err(|e| XmlError::invalid_name(format!("Invalid tag name: {e}")))?
            .to_string();

        let mut raw = Vec::new();
        let mut declarations = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result
                .map_err(|e| XmlError::invalid_attribute(format!("Attribute error: {e}")))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| XmlError::invalid_attribute(format!("Attribute key error: {e}")))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| XmlError::invalid_attribute(format!("Attribute value error: {e}")))?
                .to_string();

            if key == "xmlns" {
                declarations.push((SmolStr::default(), SmolStr::new(&value)));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((SmolStr::new(prefix), SmolStr::new(&value)));
            }
            raw.push((key, value));
        }
        self.scopes.push(declarations);

        let (prefix, local) = split_qualified(&qualified);
        let namespace = self.resolve_prefix(prefix.unwrap_or(""));

        let attributes = raw
            .into_iter()
            .map(|(key, value)| {
                let (prefix, local) = split_qualified(&key);
                let namespace = match prefix {
                    Some("xmlns") => None,
                    Some(prefix) => self.resolve_prefix(prefix),
                    None => None,
                };
                Attribute {
                    name: SmolStr::new(local),
                    qualified_name: SmolStr::new(&key),
                    namespace,
                    value,
                }
            })
            .collect();

        Ok(Element {
            tag: SmolStr::new(local),
            namespace,
            attributes,
            children: Vec::new(),
            text: String::new(),
            line,
        })
    }

    fn close(&mut self, mut element: Element) {
        self.scopes.pop();
        let trimmed = element.text.trim();
        if trimmed.len() != element.text.len() {
            element.text = trimmed.to_string();
        }
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if self.root.is_none() {
                    self.root = Some(element);
                }
            }
        }
    }

    fn append_text(&mut self, content: &str) {
        if let Some(current) = self.stack.last_mut() {
            current.text.push_str(content);
        }
    }

    fn resolve_prefix(&self, prefix: &str) -> Option<SmolStr> {
        if prefix == "xml" {
            return Some(SmolStr::new_static(XML_NS));
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(declared, _)| declared == prefix)
            .map(|(_, uri)| uri.clone())
            .filter(|uri| !uri.is_empty())
    }
}

fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}
