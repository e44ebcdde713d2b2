//! The universal value tree shared by the encoder and the decoder.

use chrono::{DateTime, FixedOffset};
use serde_json::json;

/// Dynamically typed XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 text (`<string>`).
    String(String),
    /// Boolean flag (`<boolean>`).
    Boolean(bool),
    /// Signed integer (`<int>`, `<i4>`, `<i8>`).
    Integer(i64),
    /// Floating-point number (`<double>`).
    Double(f64),
    /// ISO-8601 timestamp (`<dateTime.iso8601>`).
    Timestamp(DateTime<FixedOffset>),
    /// Raw bytes (`<base64>`).
    Binary(Vec<u8>),
    /// Ordered list (`<array>`).
    List(Vec<Value>),
    /// Named members (`<struct>`).
    Record(Record),
}

impl Value {
    /// Borrow the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    /// Integer view; booleans count as 0/1 the way rTorrent reports flags.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(num) => Some(*num),
            Value::Boolean(flag) => Some(i64::from(*flag)),
            _ => None,
        }
    }

    /// Numeric view over integers and doubles.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(num) => Some(*num as f64),
            Value::Double(num) => Some(*num),
            _ => None,
        }
    }

    /// Boolean view; integers are true when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(flag) => Some(*flag),
            Value::Integer(num) => Some(*num != 0),
            _ => None,
        }
    }

    /// Borrow the items of a list value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the members of a record value.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::Timestamp(_) => "timestamp",
            Value::Binary(_) => "binary",
            Value::List(_) => "list",
            Value::Record(_) => "record",
        }
    }

    /// Render the value as JSON for display.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(text) => json!(text),
            Value::Boolean(flag) => json!(flag),
            Value::Integer(num) => json!(num),
            Value::Double(num) => json!(num),
            Value::Timestamp(ts) => json!(ts.to_rfc3339()),
            Value::Binary(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => json!(text),
                Err(_) => json!(bytes),
            },
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Record(record) => record.to_json(),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Boolean(flag)
    }
}

impl From<i32> for Value {
    fn from(num: i32) -> Self {
        Value::Integer(i64::from(num))
    }
}

impl From<i64> for Value {
    fn from(num: i64) -> Self {
        Value::Integer(num)
    }
}

impl From<f64> for Value {
    fn from(num: f64) -> Self {
        Value::Double(num)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

/// Ordered mapping from member name to value with unique keys.
///
/// Iteration follows insertion order. Equality ignores order: two records
/// are equal when they hold the same names bound to equal values.
#[derive(Debug, Clone, Default)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member, replacing any earlier member with the same name.
    ///
    /// The replaced value is returned; the member keeps its first position.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Look up a member by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Whether a member with this name exists.
    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no members.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Member names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Render as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
