//! Namespace-stripped XML element tree for SOAP responses.
//!
//! Responses are small enough to hold in memory, so they are read once into a
//! tree and then walked by the per-operation parsers. Element and attribute
//! names keep only their local part (`soapenv:Body` becomes `Body`).
//!
//! Text is kept exactly as sent: leaf values round-trip through `update`
//! with their whitespace intact. Only the indentation between child elements
//! is dropped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::{Error, ErrorKind, Result};

/// One element of a parsed XML document.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| parse_error(format!("at byte {}: {}", reader.buffer_position(), e)))?;

            match event {
                Event::Start(start) => stack.push(Self::open(&start)?),
                Event::Empty(start) => {
                    let element = Self::open(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let mut element = stack
                        .pop()
                        .ok_or_else(|| parse_error("unbalanced closing tag".to_string()))?;
                    if !element.children.is_empty() && element.text.trim().is_empty() {
                        element.text.clear();
                    }
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| parse_error(e.to_string()))?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(parse_error("unexpected end of document".to_string()));
        }
        root.ok_or_else(|| parse_error("document has no root element".to_string()))
    }

    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| parse_error(e.to_string()))?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| parse_error(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            ..Default::default()
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// `xsi:nil="true"`
    pub fn is_nil(&self) -> bool {
        self.attribute("nil") == Some("true")
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a path of child names from this element.
    pub fn find(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |el, name| el.child(name))
    }

    /// Text of a child element; `None` when absent or nil.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name)
            .filter(|c| !c.is_nil())
            .map(|c| c.text.as_str())
    }

    pub fn child_string(&self, name: &str) -> Option<String> {
        self.child_text(name).map(str::to_string)
    }

    /// Boolean child; absent, nil or anything other than `true` is false.
    pub fn child_bool(&self, name: &str) -> bool {
        self.child_text(name) == Some("true")
    }

    pub fn child_parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.child_text(name).and_then(|t| t.trim().parse().ok())
    }

    /// Convert to JSON: leaves become strings, nil becomes null and repeated
    /// child names collapse into arrays in document order.
    pub fn to_json(&self) -> Value {
        if self.is_nil() {
            return Value::Null;
        }
        if self.children.is_empty() {
            return Value::String(self.text.clone());
        }

        let mut map = Map::new();
        for child in &self.children {
            let value = child.to_json();
            match map.get_mut(&child.name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(child.name.clone(), value);
                }
            }
        }
        Value::Object(map)
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(parse_error("multiple root elements".to_string())),
    }
    Ok(())
}

fn parse_error(message: String) -> Error {
    Error::new(ErrorKind::Parse(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const READ_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns="http://soap.sforce.com/2006/04/metadata" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <soapenv:Body>
    <readMetadataResponse>
      <result>
        <records xsi:type="CustomObject">
          <fullName>Account__c</fullName>
          <label>Tom &amp; Jerry</label>
          <fields><fullName>A__c</fullName></fields>
          <fields><fullName>B__c</fullName></fields>
          <description xsi:nil="true"/>
        </records>
      </result>
    </readMetadataResponse>
  </soapenv:Body>
</soapenv:Envelope>"#;

    #[test]
    fn test_parse_strips_prefixes_and_unescapes() {
        let root = XmlElement::parse(READ_RESPONSE).unwrap();
        assert_eq!(root.name, "Envelope");

        let records = root
            .find(&["Body", "readMetadataResponse", "result", "records"])
            .unwrap();
        assert_eq!(records.attribute("type"), Some("CustomObject"));
        assert_eq!(records.child_text("label"), Some("Tom & Jerry"));
        assert_eq!(records.children_named("fields").count(), 2);
        assert!(records.child("description").unwrap().is_nil());
        assert_eq!(records.child_text("description"), None);
    }

    #[test]
    fn test_to_json_arrays_and_nulls() {
        let root = XmlElement::parse(READ_RESPONSE).unwrap();
        let records = root
            .find(&["Body", "readMetadataResponse", "result", "records"])
            .unwrap();

        assert_eq!(
            records.to_json(),
            json!({
                "fullName": "Account__c",
                "label": "Tom & Jerry",
                "fields": [{"fullName": "A__c"}, {"fullName": "B__c"}],
                "description": null
            })
        );
    }

    #[test]
    fn test_child_helpers() {
        let root = XmlElement::parse(
            "<r><done>true</done><count> 7 </count><flag>false</flag></r>",
        )
        .unwrap();
        assert!(root.child_bool("done"));
        assert!(!root.child_bool("flag"));
        assert!(!root.child_bool("missing"));
        assert_eq!(root.child_parse::<u32>("count"), Some(7));
        assert_eq!(root.child_parse::<u32>("done"), None);
    }

    #[test]
    fn test_cdata_text() {
        let root = XmlElement::parse("<r><![CDATA[a < b]]></r>").unwrap();
        assert_eq!(root.text, "a < b");
    }

    #[test]
    fn test_leaf_text_is_not_trimmed() {
        let root = XmlElement::parse(
            "<records>\n  <description>  two leading spaces\n</description>\n  \
             <label>a <![CDATA[<b>]]> c</label>\n  <blank>   </blank>\n</records>",
        )
        .unwrap();

        assert_eq!(root.text, "");
        assert_eq!(
            root.to_json(),
            json!({
                "description": "  two leading spaces\n",
                "label": "a <b> c",
                "blank": "   "
            })
        );
    }

    #[test]
    fn test_malformed_document() {
        let err = XmlElement::parse("<a><b></a>").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Parse(_)));

        let err = XmlElement::parse("").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Parse(_)));
    }
}
