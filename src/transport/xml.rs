//! `| xml` fallback for switches without native JSON output.
//!
//! Conversion follows the usual XML-to-dict conventions so the result has the
//! same shape as NX-OS JSON: repeated child tags become arrays, attributes
//! become `@name`, text next to child elements becomes `#text`, and empty
//! elements become `null`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

pub const READONLY_TAG: &str = "__readonly__";

/// Slice out `<__readonly__>...</__readonly__>` from a `| xml` rendering
pub fn extract_readonly(output: &str) -> Option<&str> {
    let start_tag = format!("<{}>", READONLY_TAG);
    let end_tag = format!("</{}>", READONLY_TAG);

    let start = output.find(&start_tag)?;
    let end = output[start..].find(&end_tag)? + start;
    Some(&output[start..end + end_tag.len()])
}

struct Element {
    name: String,
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| format!("Bad attribute on <{}>: {}", name, e))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| format!("Bad attribute value on <{}>: {}", name, e))?;
            attributes.insert(format!("@{}", key), Value::String(value.into_owned()));
        }
        Ok(Self {
            name,
            attributes,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        if self.attributes.is_empty() && self.children.is_empty() {
            let value = if self.text.is_empty() {
                Value::Null
            } else {
                Value::String(self.text)
            };
            return (self.name, value);
        }

        let mut map = self.attributes;
        map.extend(self.children);
        if !self.text.is_empty() {
            map.insert("#text".to_string(), Value::String(self.text));
        }
        (self.name, Value::Object(map))
    }
}

fn attach(parent: &mut Map<String, Value>, name: String, value: Value) {
    match parent.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.insert(name, value);
        }
    }
}

/// Convert an XML document into `{root_name: content}`
pub fn to_value(xml: &str) -> Result<Value, String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("XML error at position {}: {}", reader.buffer_position(), e))?;

        match event {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = Element::open(&start)?.close();
                match stack.last_mut() {
                    Some(parent) => attach(&mut parent.children, name, value),
                    None => root = Some((name, value)),
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| format!("Bad text: {}", e))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| "Unbalanced closing tag".to_string())?;
                let (name, value) = element.close();
                match stack.last_mut() {
                    Some(parent) => attach(&mut parent.children, name, value),
                    None => root = Some((name, value)),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("Unexpected end of XML document".to_string());
    }

    let (name, value) = root.ok_or_else(|| "Empty XML document".to_string())?;
    let mut doc = Map::new();
    doc.insert(name, value);
    Ok(Value::Object(doc))
}
