//! General torrent details and the control actions of the detail view.

use crate::rpc::{BatchCommand, Caller, Command, ResultRecord, RpcResult, Transport, Value};
use crate::util::percent;

/// Command groups of the details view as `(method, argument after the hash)`.
const DETAIL_GROUPS: [&[(&str, Option<&str>)]; 7] = [
    &[("d.hash", None), ("d.name", None)],
    &[("d.custom", Some("url"))],
    &[("d.timestamp.started", None)],
    &[("d.timestamp.finished", None)],
    &[("d.message", None)],
    &[("d.custom1", None)],
    &[("d.custom", Some("comment"))],
];

/// Batch groups for the details of `hash`.
pub fn detail_groups(hash: &str) -> Vec<Vec<BatchCommand>> {
    DETAIL_GROUPS
        .iter()
        .map(|group| {
            group
                .iter()
                .map(|&(method, arg)| BatchCommand::targeted(method, hash, arg))
                .collect()
        })
        .collect()
}

/// Fetch the details of `hash`, one record per group.
///
/// Keys: `hash`/`name`, `customUrl`, `timestampStarted`,
/// `timestampFinished`, `message`, `custom1`, `customComment`.
pub async fn torrent_details<T: Transport>(
    caller: &Caller<T>,
    hash: &str,
) -> RpcResult<Vec<ResultRecord>> {
    caller.batchcall_groups(&detail_groups(hash)).await
}

/// Fetch only the display name of `hash`.
pub async fn torrent_name<T: Transport>(caller: &Caller<T>, hash: &str) -> RpcResult<String> {
    match caller.call("d.name", &[Value::from(hash)]).await? {
        Value::String(name) => Ok(name),
        other => Err(crate::rpc::DecodeError::UnexpectedShape(format!(
            "d.name returned a {}",
            other.kind()
        ))
        .into()),
    }
}

/// Ask every tracker of `hash` for a scrape and persist the resume data.
pub async fn scrape_trackers<T: Transport>(
    caller: &Caller<T>,
    hash: &str,
) -> RpcResult<ResultRecord> {
    caller
        .batchcall(&[
            BatchCommand::from(&Command::new("d.", "tracker.send_scrape").arg(hash).arg("0")),
            BatchCommand::from(&Command::new("d.", "save_resume").arg(hash)),
        ])
        .await
}

/// Replace the space-separated tag list stored in `custom1`.
pub async fn set_tags<T: Transport>(caller: &Caller<T>, hash: &str, tags: &str) -> RpcResult<Value> {
    caller
        .call("d.custom1.set", &[Value::from(hash), Value::from(tags)])
        .await
}

/// Replace the free-text comment; it is stored percent-encoded.
pub async fn set_comment<T: Transport>(
    caller: &Caller<T>,
    hash: &str,
    text: &str,
) -> RpcResult<Value> {
    caller
        .call(
            "d.custom.set",
            &[
                Value::from(hash),
                Value::from("comment"),
                Value::from(percent::encode_component(text)),
            ],
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_groups_key_like_the_view() {
        let groups = detail_groups("ABCD");
        let keys: Vec<Vec<&str>> = groups
            .iter()
            .map(|group| group.iter().map(BatchCommand::key).collect())
            .collect();
        assert_eq!(
            keys,
            vec![
                vec!["hash", "name"],
                vec!["customUrl"],
                vec!["timestampStarted"],
                vec!["timestampFinished"],
                vec!["message"],
                vec!["custom1"],
                vec!["customComment"],
            ]
        );
        assert!(
            groups
                .iter()
                .flatten()
                .all(|command| command.target() == Some("ABCD"))
        );
    }

    #[test]
    fn selector_is_passed_through_untouched() {
        let hash = "id,with=separators";
        let groups = detail_groups(hash);
        let comment = &groups[6][0];
        assert_eq!(comment.target(), Some(hash));
        assert_eq!(comment.key(), "customComment");
        assert_eq!(
            comment.call_spec().params,
            vec![Value::from(hash), Value::from("comment")]
        );
        assert_eq!(groups[0][1].call_spec().params, vec![Value::from(hash)]);
    }
}
