mod common;

use common::*;
use rtorrent_rpc::rpc::{BatchCommand, RpcError, Value};

#[tokio::test]
async fn flat_group_builds_one_record() {
    let caller = caller(
        ScriptedTransport::new().reply(list(vec![ok(s("H")), ok(s("torrent"))])),
    );
    let record = caller
        .batchcall(&BatchCommand::parse_all(["d.hash=H", "d.name=H"]))
        .await
        .expect("batchcall");

    assert_eq!(record, common::record(vec![("hash", s("H")), ("name", s("torrent"))]));
}

#[tokio::test]
async fn request_bundles_every_call_in_order() {
    let caller = caller(
        ScriptedTransport::new().reply(list(vec![ok(s("H")), ok(s("url"))])),
    );
    caller
        .batchcall(&BatchCommand::parse_all(["d.hash=H", "d.custom=H,url"]))
        .await
        .unwrap();

    let requests = caller.transport().requests();
    assert_eq!(requests.len(), 1);
    let (method, params) = &requests[0];
    assert_eq!(method, "system.multicall");
    assert_eq!(params.len(), 1);

    let calls = params[0].as_list().expect("list of calls");
    assert_eq!(calls.len(), 2);
    let second = calls[1].as_record().expect("call struct");
    assert_eq!(second.get("methodName"), Some(&s("d.custom")));
    assert_eq!(second.get("params"), Some(&list(vec![s("H"), s("url")])));
}

#[tokio::test]
async fn groups_are_consumed_in_submitted_order() {
    let caller = caller(ScriptedTransport::new().reply(list(vec![ok(s("A")), ok(s("B"))])));
    let groups = vec![
        BatchCommand::parse_all(["d.hash=A"]),
        BatchCommand::parse_all(["d.hash=B"]),
    ];
    let records = caller.batchcall_groups(&groups).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("hash"), Some(&s("A")));
    assert_eq!(records[1].get("hash"), Some(&s("B")));
}

#[tokio::test]
async fn uneven_groups_do_not_cross_assign() {
    let caller = caller(ScriptedTransport::new().reply(list(vec![
        ok(s("A")),
        ok(s("alpha")),
        ok(i(1)),
        ok(s("B")),
    ])));
    let groups = vec![
        BatchCommand::parse_all(["d.hash=A", "d.name=A", "d.state=A"]),
        BatchCommand::parse_all(["d.hash=B"]),
    ];
    let records = caller.batchcall_groups(&groups).await.unwrap();
    assert_eq!(records[0].len(), 3);
    assert_eq!(records[0].get("state"), Some(&i(1)));
    assert_eq!(records[1].len(), 1);
    assert_eq!(records[1].get("hash"), Some(&s("B")));
}

#[tokio::test]
async fn nested_multicall_is_unpacked_one_level() {
    let rows = list(vec![
        list(vec![s("url1"), i(1)]),
        list(vec![s("url2"), i(0)]),
    ]);
    let caller = caller(ScriptedTransport::new().reply(list(vec![ok(s("name")), ok(rows)])));
    let record = caller
        .batchcall(&BatchCommand::parse_all([
            "d.name=H",
            "t.multicall=H,,t.url=,t.is_enabled=",
        ]))
        .await
        .unwrap();

    assert_eq!(record.get("name"), Some(&s("name")));
    let trackers = record.get("multicall").and_then(Value::as_list).expect("nested rows");
    assert_eq!(trackers.len(), 2);
    assert_eq!(
        trackers[0],
        Value::Record(common::record(vec![("url", s("url1")), ("isEnabled", i(1))]))
    );
    assert_eq!(
        trackers[1],
        Value::Record(common::record(vec![("url", s("url2")), ("isEnabled", i(0))]))
    );
}

#[tokio::test]
async fn empty_input_makes_no_network_call() {
    let caller = caller(ScriptedTransport::new());

    let record = caller.batchcall(&[]).await.unwrap();
    assert!(record.is_empty());

    let groups: Vec<Vec<BatchCommand>> = Vec::new();
    assert!(caller.batchcall_groups(&groups).await.unwrap().is_empty());

    assert_eq!(caller.transport().request_count(), 0);
}

#[tokio::test]
async fn missing_results_fail_loudly() {
    let caller = caller(ScriptedTransport::new().reply(list(vec![ok(s("A"))])));
    let groups = vec![
        BatchCommand::parse_all(["d.hash=A"]),
        BatchCommand::parse_all(["d.hash=B"]),
    ];
    match caller.batchcall_groups(&groups).await {
        Err(RpcError::Alignment(err)) => {
            assert_eq!(err.expected, 2);
            assert_eq!(err.actual, 1);
        }
        other => panic!("expected alignment error, got {:?}", other),
    }
}

#[tokio::test]
async fn surplus_results_fail_loudly() {
    let caller = caller(ScriptedTransport::new().reply(list(vec![ok(s("A")), ok(s("B"))])));
    let err = caller
        .batchcall(&BatchCommand::parse_all(["d.hash=A"]))
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Alignment(_)));
}

#[tokio::test]
async fn faulted_entry_surfaces_as_call_fault() {
    let fault = Value::Record(common::record(vec![
        ("faultCode", i(-501)),
        ("faultString", s("Could not find info-hash.")),
    ]));
    let caller = caller(ScriptedTransport::new().reply(list(vec![ok(s("A")), fault])));
    let err = caller
        .batchcall(&BatchCommand::parse_all(["d.hash=A", "d.name=UNKNOWN"]))
        .await
        .unwrap_err();
    match err {
        RpcError::CallFault { index, method, fault } => {
            assert_eq!(index, 1);
            assert_eq!(method, "d.name");
            assert_eq!(fault.message, "Could not find info-hash.");
        }
        other => panic!("expected call fault, got {:?}", other),
    }
}

#[tokio::test]
async fn explicit_targets_are_not_pattern_matched() {
    let caller = caller(ScriptedTransport::new().reply(list(vec![ok(s("x"))])));
    let record = caller
        .batchcall(&[BatchCommand::targeted("d.custom", "short-id", ["comment"])])
        .await
        .unwrap();
    assert_eq!(record.get("customComment"), Some(&s("x")));

    let calls = caller.transport().requests()[0].1[0].clone();
    let call = calls.as_list().unwrap()[0].as_record().unwrap().clone();
    assert_eq!(call.get("params"), Some(&list(vec![s("short-id"), s("comment")])));
}
