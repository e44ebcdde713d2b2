mod common;

use common::*;
use rtorrent_rpc::rpc::{RpcError, Value};

#[tokio::test]
async fn three_entities_four_fields_align_positionally() {
    let rows = list(vec![
        list(vec![s("AAA"), s("alpha"), i(1), i(100)]),
        list(vec![s("BBB"), s("beta"), i(0), i(200)]),
        list(vec![s("CCC"), s("gamma"), i(1), i(300)]),
    ]);
    let caller = caller(ScriptedTransport::new().reply(rows));

    let records = caller
        .multicall("d.", "", "default", &["hash", "name", "state", "down.rate"])
        .await
        .expect("multicall");

    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.len(), 4);
        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["hash", "name", "state", "downRate"]
        );
    }
    assert_eq!(records[1].get("hash"), Some(&s("BBB")));
    assert_eq!(records[1].get("name"), Some(&s("beta")));
    assert_eq!(records[2].get("downRate"), Some(&i(300)));
}

#[tokio::test]
async fn request_uses_multicall2_for_downloads() {
    let caller = caller(ScriptedTransport::new().reply(list(vec![])));
    let records = caller
        .multicall("d.", "", "default", &["hash", "custom=icon"])
        .await
        .unwrap();
    assert!(records.is_empty());

    let requests = caller.transport().requests();
    assert_eq!(requests.len(), 1);
    let (method, params) = &requests[0];
    assert_eq!(method, "d.multicall2");
    assert_eq!(
        params,
        &vec![s(""), s("default"), s("d.hash="), s("d.custom=icon")]
    );
}

#[tokio::test]
async fn tracker_multicall_is_scoped_by_prefix() {
    let rows = list(vec![list(vec![s("udp://tracker.example:80"), i(1)])]);
    let caller = caller(ScriptedTransport::new().reply(rows));
    let records = caller
        .multicall("t.", "HASH", "", &["url", "is_enabled"])
        .await
        .unwrap();
    assert_eq!(records[0].get("isEnabled"), Some(&i(1)));

    let (method, params) = &caller.transport().requests()[0];
    assert_eq!(method, "t.multicall");
    assert_eq!(params[0], s("HASH"));
    assert_eq!(params[2], s("t.url="));
}

#[tokio::test]
async fn short_row_is_alignment_error_not_missing_field() {
    let rows = list(vec![
        list(vec![s("AAA"), s("alpha"), i(1), i(100)]),
        list(vec![s("BBB"), s("beta"), i(0)]),
    ]);
    let caller = caller(ScriptedTransport::new().reply(rows));

    let err = caller
        .multicall("d.", "", "default", &["hash", "name", "state", "down.rate"])
        .await
        .unwrap_err();
    match err {
        RpcError::Alignment(err) => {
            assert_eq!(err.expected, 4);
            assert_eq!(err.actual, 3);
            assert!(err.context.contains("row 1"));
        }
        other => panic!("expected alignment error, got {:?}", other),
    }
}

#[tokio::test]
async fn long_row_is_also_rejected() {
    let rows = list(vec![list(vec![s("AAA"), s("extra")])]);
    let caller = caller(ScriptedTransport::new().reply(rows));
    let err = caller
        .multicall("d.", "", "default", &["hash"])
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Alignment(_)));
}

#[tokio::test]
async fn scalar_result_is_a_shape_error() {
    let caller = caller(ScriptedTransport::new().reply(Value::from(0)));
    let err = caller
        .multicall("d.", "", "default", &["hash"])
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Decode(_)));
}
