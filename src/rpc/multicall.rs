//! Multicall engine: one filtered "iterate-and-call" request per poll.
//!
//! The server applies an ordered list of field commands to every entity
//! matching a filter and answers with one row per entity. Rows are zipped
//! against the field list to build named records. Row order is whatever
//! the server returned.

use super::batch::CallSpec;
use super::caller::Caller;
use super::command::{Command, to_key};
use super::error::{AlignmentError, DecodeError, RpcResult};
use super::transport::Transport;
use super::value::{Record, Value};

/// One record per matched entity, keyed by camel-cased field name.
pub type ResultRecord = Record;

/// Namespace of the root entity type (downloads).
pub const ROOT_PREFIX: &str = "d.";

/// Wire method for a multicall over entities of `prefix`.
pub fn multicall_method(prefix: &str) -> String {
    if prefix == ROOT_PREFIX {
        "d.multicall2".to_string()
    } else {
        format!("{}multicall", prefix)
    }
}

/// Build the request for a multicall without sending it.
pub fn multicall_request<S: AsRef<str>>(
    prefix: &str,
    subject: &str,
    filter: &str,
    fields: &[S],
) -> CallSpec {
    let mut params = Vec::with_capacity(fields.len() + 2);
    params.push(Value::from(subject));
    params.push(Value::from(filter));
    params.extend(
        fields
            .iter()
            .map(|field| Value::String(Command::new(prefix, field.as_ref()).full())),
    );
    CallSpec {
        method_name: multicall_method(prefix),
        params,
    }
}

/// Zip one decoded row against `keys`.
///
/// The row must carry exactly one value per key.
pub fn zip_row<S: AsRef<str>>(keys: &[S], row: &Value, context: &str) -> RpcResult<ResultRecord> {
    let values = row.as_list().ok_or_else(|| {
        DecodeError::UnexpectedShape(format!("{}: row is a {}, not a list", context, row.kind()))
    })?;
    if values.len() != keys.len() {
        return Err(AlignmentError::new(context, keys.len(), values.len()).into());
    }
    Ok(keys
        .iter()
        .zip(values)
        .map(|(key, value)| (key.as_ref().to_string(), value.clone()))
        .collect())
}

/// Reshape a multicall result (a list of rows) into records.
pub fn zip_rows<S: AsRef<str>>(fields: &[S], result: &Value) -> RpcResult<Vec<ResultRecord>> {
    let keys: Vec<String> = fields.iter().map(|field| to_key(field.as_ref())).collect();
    let rows = result.as_list().ok_or_else(|| {
        DecodeError::UnexpectedShape(format!(
            "multicall result is a {}, not a list of rows",
            result.kind()
        ))
    })?;
    rows.iter()
        .enumerate()
        .map(|(i, row)| zip_row(&keys, row, &format!("multicall row {}", i)))
        .collect()
}

impl<T: Transport> Caller<T> {
    /// Apply `fields` of `prefix` to every entity matching `subject`/`filter`.
    ///
    /// ```no_run
    /// # async fn demo() -> rtorrent_rpc::rpc::RpcResult<()> {
    /// use rtorrent_rpc::rpc::{Caller, ScgiTransport};
    /// let caller = Caller::new(ScgiTransport::tcp("127.0.0.1:5000"));
    /// let torrents = caller.multicall("d.", "", "default", &["hash", "name"]).await?;
    /// for torrent in &torrents {
    ///     println!("{:?} {:?}", torrent.get("hash"), torrent.get("name"));
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn multicall<S: AsRef<str>>(
        &self,
        prefix: &str,
        subject: &str,
        filter: &str,
        fields: &[S],
    ) -> RpcResult<Vec<ResultRecord>> {
        let spec = multicall_request(prefix, subject, filter, fields);
        let result = self.call(&spec.method_name, &spec.params).await?;
        let records = zip_rows(fields, &result)?;
        tracing::debug!(
            method = %spec.method_name,
            rows = records.len(),
            fields = fields.len(),
            "multicall decoded"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::error::RpcError;

    #[test]
    fn root_prefix_uses_multicall2() {
        assert_eq!(multicall_method("d."), "d.multicall2");
        assert_eq!(multicall_method("t."), "t.multicall");
        assert_eq!(multicall_method("p."), "p.multicall");
    }

    #[test]
    fn request_lists_subject_filter_and_commands() {
        let spec = multicall_request("t.", "HASH", "", &["url", "is_enabled", "custom=x"]);
        assert_eq!(spec.method_name, "t.multicall");
        assert_eq!(
            spec.params,
            vec![
                Value::from("HASH"),
                Value::from(""),
                Value::from("t.url="),
                Value::from("t.is_enabled="),
                Value::from("t.custom=x"),
            ]
        );
    }

    #[test]
    fn short_row_is_an_alignment_error() {
        let result = Value::List(vec![Value::List(vec![Value::from("a")])]);
        let err = zip_rows(&["hash", "name"], &result).unwrap_err();
        match err {
            RpcError::Alignment(err) => {
                assert_eq!(err.expected, 2);
                assert_eq!(err.actual, 1);
                assert_eq!(err.context, "multicall row 0");
            }
            other => panic!("expected alignment error, got {:?}", other),
        }
    }

    #[test]
    fn non_list_result_is_a_shape_error() {
        let err = zip_rows(&["hash"], &Value::from("oops")).unwrap_err();
        assert!(matches!(
            err,
            RpcError::Decode(DecodeError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn empty_result_yields_no_records() {
        assert!(zip_rows(&["hash"], &Value::List(vec![])).unwrap().is_empty());
    }
}
