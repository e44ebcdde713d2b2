//! XML-RPC wire codec.
//!
//! Pure functions translating between [`Value`] trees and request/response
//! bodies. No knowledge of torrents lives here.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, FixedOffset, NaiveDateTime};

use super::error::{DecodeError, DecodeResult, EncodingError, Fault, RpcError, RpcResult};
use super::value::{Record, Value};
use super::xml::{self, Element};

const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>";

/// Escape the five XML special characters and nothing else.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

fn is_xml_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r')
        || ('\u{20}'..='\u{D7FF}').contains(&ch)
        || ('\u{E000}'..='\u{FFFD}').contains(&ch)
        || ch >= '\u{10000}'
}

fn write_text(out: &mut String, text: &str) -> Result<(), EncodingError> {
    if let Some(ch) = text.chars().find(|&ch| !is_xml_char(ch)) {
        return Err(EncodingError::ForbiddenCharacter(ch));
    }
    out.push_str(&escape(text));
    Ok(())
}

fn validate_method_name(method: &str) -> Result<(), EncodingError> {
    let valid = !method.is_empty()
        && method
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | ':' | '/'));
    if valid {
        Ok(())
    } else {
        Err(EncodingError::InvalidMethodName(method.to_string()))
    }
}

/// Encode a `<methodCall>` request body.
pub fn encode_call(method: &str, params: &[Value]) -> Result<String, EncodingError> {
    validate_method_name(method)?;
    let mut out = String::from(XML_DECLARATION);
    out.push_str("<methodCall><methodName>");
    out.push_str(method);
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        write_value(&mut out, param)?;
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    Ok(out)
}

/// Encode a successful `<methodResponse>` carrying `value`.
pub fn encode_response(value: &Value) -> Result<String, EncodingError> {
    let mut out = String::from(XML_DECLARATION);
    out.push_str("<methodResponse><params><param>");
    write_value(&mut out, value)?;
    out.push_str("</param></params></methodResponse>");
    Ok(out)
}

/// Encode a fault `<methodResponse>`.
pub fn encode_fault(code: i64, message: &str) -> String {
    let mut out = String::from(XML_DECLARATION);
    out.push_str("<methodResponse><fault><value><struct>");
    out.push_str("<member><name>faultCode</name><value><int>");
    out.push_str(&code.to_string());
    out.push_str("</int></value></member>");
    out.push_str("<member><name>faultString</name><value><string>");
    out.push_str(&escape(message));
    out.push_str("</string></value></member>");
    out.push_str("</struct></value></fault></methodResponse>");
    out
}

/// Encode a single `<value>` node.
pub fn encode_value(value: &Value) -> Result<String, EncodingError> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) -> Result<(), EncodingError> {
    out.push_str("<value>");
    match value {
        Value::String(text) => {
            out.push_str("<string>");
            write_text(out, text)?;
            out.push_str("</string>");
        }
        Value::Boolean(flag) => {
            out.push_str(if *flag {
                "<boolean>1</boolean>"
            } else {
                "<boolean>0</boolean>"
            });
        }
        Value::Integer(num) => write_integer(out, *num),
        Value::Double(num) => {
            if !num.is_finite() {
                return Err(EncodingError::NonFiniteDouble(*num));
            }
            if num.fract() == 0.0 {
                // Whole values travel on the integer path.
                if *num < i64::MIN as f64 || *num >= i64::MAX as f64 {
                    return Err(EncodingError::IntegerOverflow(*num));
                }
                write_integer(out, *num as i64);
            } else {
                out.push_str("<double>");
                out.push_str(&num.to_string());
                out.push_str("</double>");
            }
        }
        Value::Timestamp(ts) => {
            out.push_str("<dateTime.iso8601>");
            out.push_str(&ts.to_rfc3339());
            out.push_str("</dateTime.iso8601>");
        }
        Value::Binary(bytes) => {
            out.push_str("<base64>");
            out.push_str(&BASE64.encode(bytes));
            out.push_str("</base64>");
        }
        Value::List(items) => {
            out.push_str("<array><data>");
            for item in items {
                write_value(out, item)?;
            }
            out.push_str("</data></array>");
        }
        Value::Record(record) => {
            out.push_str("<struct>");
            for (name, member) in record.iter() {
                out.push_str("<member><name>");
                write_text(out, name)?;
                out.push_str("</name>");
                write_value(out, member)?;
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
    Ok(())
}

fn write_integer(out: &mut String, num: i64) {
    if i32::try_from(num).is_ok() {
        out.push_str("<int>");
        out.push_str(&num.to_string());
        out.push_str("</int>");
    } else {
        out.push_str("<i8>");
        out.push_str(&num.to_string());
        out.push_str("</i8>");
    }
}

/// Decode a `<methodResponse>` body.
///
/// A fault envelope is reported as [`RpcError::Fault`] and never yields a
/// value.
pub fn decode_response(body: &str) -> RpcResult<Value> {
    let root = xml::parse_document(body)?;
    expect_name(&root, "methodResponse")?;

    if let Some(fault) = root.child("fault") {
        return Err(RpcError::Fault(decode_fault(fault)?));
    }

    let param = root.require("params")?.require("param")?;
    Ok(decode_element(param)?)
}

/// Decode a `<methodCall>` body into its method name and parameters.
pub fn decode_call(body: &str) -> DecodeResult<(String, Vec<Value>)> {
    let root = xml::parse_document(body)?;
    expect_name(&root, "methodCall")?;
    let method = root.require("methodName")?.text.trim().to_string();
    let params = match root.child("params") {
        Some(params) => params
            .children
            .iter()
            .map(decode_element)
            .collect::<DecodeResult<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok((method, params))
}

/// Decode a standalone `<value>` fragment.
pub fn decode_value(fragment: &str) -> DecodeResult<Value> {
    decode_element(&xml::parse_document(fragment)?)
}

/// Interpret a decoded fault struct.
pub fn fault_from_value(value: &Value) -> Option<Fault> {
    let record = value.as_record()?;
    let code = record.get("faultCode")?.as_i64()?;
    let message = record
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(Fault { code, message })
}

fn decode_fault(fault: &Element) -> DecodeResult<Fault> {
    let value = decode_element(fault)?;
    fault_from_value(&value).ok_or_else(|| {
        DecodeError::UnexpectedShape("fault without faultCode/faultString".to_string())
    })
}

fn expect_name(element: &Element, expected: &str) -> DecodeResult<()> {
    if element.name == expected {
        Ok(())
    } else {
        Err(DecodeError::UnexpectedElement {
            expected: expected.to_string(),
            found: element.name.clone(),
        })
    }
}

fn only_child<'e>(element: &'e Element) -> DecodeResult<&'e Element> {
    element
        .first_child()
        .ok_or_else(|| DecodeError::MissingElement {
            parent: element.name.clone(),
            child: "value".to_string(),
        })
}

fn invalid(element: &Element) -> DecodeError {
    DecodeError::InvalidScalar {
        kind: element.name.clone(),
        text: element.text.clone(),
    }
}

fn decode_element(element: &Element) -> DecodeResult<Value> {
    match element.name.as_str() {
        "string" => Ok(Value::String(element.text.clone())),
        "boolean" => match element.text.trim() {
            "1" | "true" => Ok(Value::Boolean(true)),
            "0" | "false" => Ok(Value::Boolean(false)),
            _ => Err(invalid(element)),
        },
        "int" | "i4" | "i8" => element
            .text
            .trim()
            .parse()
            .map(Value::Integer)
            .map_err(|_| invalid(element)),
        "double" => element
            .text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|_| invalid(element)),
        "dateTime.iso8601" => parse_timestamp(element.text.trim())
            .map(Value::Timestamp)
            .ok_or_else(|| invalid(element)),
        "base64" => {
            let compact: String = element
                .text
                .chars()
                .filter(|ch| !ch.is_ascii_whitespace())
                .collect();
            BASE64
                .decode(compact)
                .map(Value::Binary)
                .map_err(|_| invalid(element))
        }
        // An untyped value is a string.
        "value" if element.children.is_empty() => Ok(Value::String(element.text.clone())),
        "methodResponse" | "params" | "param" | "value" | "fault" | "array" => {
            decode_element(only_child(element)?)
        }
        "data" => element
            .children
            .iter()
            .map(decode_element)
            .collect::<DecodeResult<Vec<_>>>()
            .map(Value::List),
        "struct" => {
            let mut record = Record::new();
            for member in &element.children {
                let (name, value) = decode_member(member)?;
                if record.insert(name.clone(), value).is_some() {
                    tracing::warn!(member = %name, "duplicate struct member, keeping the last one");
                }
            }
            Ok(Value::Record(record))
        }
        "member" => {
            let (name, value) = decode_member(element)?;
            let mut record = Record::new();
            record.insert(name, value);
            Ok(Value::Record(record))
        }
        other => Err(DecodeError::UnsupportedElement(other.to_string())),
    }
}

fn decode_member(member: &Element) -> DecodeResult<(String, Value)> {
    expect_name(member, "member")?;
    let name = member.require("name")?.text.clone();
    let value = decode_element(member.require("value")?)?;
    Ok((name, value))
}

fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts);
    }
    // Compact XML-RPC form without an offset, read as UTC.
    ["%Y%m%dT%H:%M:%S", "%Y%m%dT%H%M%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}
