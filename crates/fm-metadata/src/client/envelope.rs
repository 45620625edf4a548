//! SOAP request envelopes.
//!
//! Every value placed in an envelope is escaped with [`xml::escape`]; record
//! field names become element names and are validated instead.

use forcemeta_client::security::xml;
use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};
use crate::record::MetadataRecord;

pub(crate) const METADATA_NS: &str = "http://soap.sforce.com/2006/04/metadata";

/// Wrap an operation body in a SOAP envelope with a session header.
pub(crate) fn build(session_id: &str, operation: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:met="{ns}" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <soapenv:Header>
    <met:SessionHeader>
      <met:sessionId>{session_id}</met:sessionId>
    </met:SessionHeader>
  </soapenv:Header>
  <soapenv:Body>
    <met:{operation}>
{body}
    </met:{operation}>
  </soapenv:Body>
</soapenv:Envelope>"#,
        ns = METADATA_NS,
        session_id = xml::escape(session_id),
    )
}

/// Simple text element: `<met:name>value</met:name>`.
pub(crate) fn text_element(name: &str, value: &str) -> String {
    format!("      <met:{name}>{}</met:{name}>", xml::escape(value))
}

/// Serialize one record as `<met:metadata xsi:type="met:{type}">`.
pub(crate) fn metadata_element(metadata_type: &str, record: &MetadataRecord) -> Result<String> {
    check_name(metadata_type)?;

    let mut element = format!(
        "      <met:metadata xsi:type=\"met:{}\">\n",
        metadata_type
    );
    for (name, value) in record.fields() {
        element.push_str(&build_xml_field(name, value, 8)?);
    }
    element.push_str("      </met:metadata>");
    Ok(element)
}

/// Serialize one field. Arrays repeat the element, objects nest and null
/// becomes `xsi:nil`.
pub(crate) fn build_xml_field(name: &str, value: &Value, indent: usize) -> Result<String> {
    check_name(name)?;
    let pad = " ".repeat(indent);

    let xml = match value {
        Value::Null => format!("{pad}<met:{name} xsi:nil=\"true\"/>\n"),
        Value::Bool(b) => format!("{pad}<met:{name}>{b}</met:{name}>\n"),
        Value::Number(n) => format!("{pad}<met:{name}>{n}</met:{name}>\n"),
        Value::String(s) => format!("{pad}<met:{name}>{}</met:{name}>\n", xml::escape(s)),
        Value::Array(items) => {
            let mut xml = String::new();
            for item in items {
                xml.push_str(&build_xml_field(name, item, indent)?);
            }
            xml
        }
        Value::Object(fields) => {
            let mut xml = format!("{pad}<met:{name}>\n");
            for (child, child_value) in fields {
                xml.push_str(&build_xml_field(child, child_value, indent + 2)?);
            }
            xml.push_str(&format!("{pad}</met:{name}>\n"));
            xml
        }
    };
    Ok(xml)
}

fn check_name(name: &str) -> Result<()> {
    if xml::is_valid_element_name(name) {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::InvalidRequest(format!(
            "'{}' is not a valid metadata field or type name",
            name
        ))))
    }
}
