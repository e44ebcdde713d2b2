//! Convenience helpers for reading fields out of a [`ResultRecord`].

use chrono::{DateTime, Utc};

use crate::rpc::error::{DecodeError, DecodeResult};
use crate::rpc::{ResultRecord, Value};

/// Lightweight view over a result record.
pub struct RecordView<'a> {
    record: &'a ResultRecord,
}

impl<'a> RecordView<'a> {
    /// Wrap a record.
    pub fn new(record: &'a ResultRecord) -> Self {
        Self { record }
    }

    /// Return the number of fields in the record.
    pub fn len(&self) -> usize {
        self.record.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    /// Access a field by key.
    pub fn field(&self, key: &str) -> DecodeResult<&'a Value> {
        self.record
            .get(key)
            .ok_or_else(|| DecodeError::UnexpectedShape(format!("record has no field '{}'", key)))
    }

    fn mistyped(key: &str, expected: &str, value: &Value) -> DecodeError {
        DecodeError::UnexpectedShape(format!(
            "field '{}' is a {}, expected {}",
            key,
            value.kind(),
            expected
        ))
    }

    /// Interpret the field as an integer.
    pub fn field_i64(&self, key: &str) -> DecodeResult<i64> {
        let value = self.field(key)?;
        value
            .as_i64()
            .ok_or_else(|| Self::mistyped(key, "integer", value))
    }

    /// Interpret the field as a number.
    pub fn field_f64(&self, key: &str) -> DecodeResult<f64> {
        let value = self.field(key)?;
        value
            .as_f64()
            .ok_or_else(|| Self::mistyped(key, "number", value))
    }

    /// Interpret the field as text.
    pub fn field_str(&self, key: &str) -> DecodeResult<&'a str> {
        let value = self.field(key)?;
        value
            .as_str()
            .ok_or_else(|| Self::mistyped(key, "string", value))
    }

    /// Interpret the field as a Unix timestamp; zero means "never".
    pub fn field_epoch(&self, key: &str) -> DecodeResult<Option<DateTime<Utc>>> {
        let seconds = self.field_i64(key)?;
        if seconds == 0 {
            return Ok(None);
        }
        DateTime::from_timestamp(seconds, 0)
            .map(Some)
            .ok_or_else(|| DecodeError::InvalidScalar {
                kind: key.to_string(),
                text: seconds.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultRecord {
        [
            ("name", Value::from("debian.iso")),
            ("sizeBytes", Value::from(1024i64)),
            ("ratio", Value::from(1.5)),
            ("timestampStarted", Value::from(1_600_000_000i64)),
            ("timestampFinished", Value::from(0)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn typed_access() {
        let record = sample();
        let view = RecordView::new(&record);
        assert_eq!(view.len(), 5);
        assert_eq!(view.field_str("name").unwrap(), "debian.iso");
        assert_eq!(view.field_i64("sizeBytes").unwrap(), 1024);
        assert_eq!(view.field_f64("sizeBytes").unwrap(), 1024.0);
        assert_eq!(view.field_f64("ratio").unwrap(), 1.5);
    }

    #[test]
    fn epoch_zero_means_never() {
        let record = sample();
        let view = RecordView::new(&record);
        assert_eq!(view.field_epoch("timestampFinished").unwrap(), None);
        assert_eq!(
            view.field_epoch("timestampStarted").unwrap().unwrap().timestamp(),
            1_600_000_000
        );
    }

    #[test]
    fn missing_and_mistyped_fields_name_the_key() {
        let record = sample();
        let view = RecordView::new(&record);
        assert!(view.field("hash").unwrap_err().to_string().contains("hash"));
        let err = view.field_i64("name").unwrap_err().to_string();
        assert!(err.contains("name") && err.contains("string"));
    }
}
