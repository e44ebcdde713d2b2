mod common;

use common::*;
use rtorrent_rpc::rpc::{EncodingError, RpcError, TransportError, Value};
use std::time::Duration;

#[tokio::test]
async fn call_decodes_successful_response() {
    let caller = caller(ScriptedTransport::new().reply(s("0.9.8")));
    let version = caller.call("system.client_version", &[]).await.unwrap();
    assert_eq!(version, s("0.9.8"));

    let (method, params) = &caller.transport().requests()[0];
    assert_eq!(method, "system.client_version");
    assert!(params.is_empty());
}

#[tokio::test]
async fn fault_never_yields_data() {
    let caller = caller(ScriptedTransport::new().fault(-506, "Method 'd.nope' not defined"));
    match caller.call("d.nope", &[s("H")]).await {
        Err(RpcError::Fault(fault)) => {
            assert_eq!(fault.code, -506);
            assert_eq!(fault.message, "Method 'd.nope' not defined");
        }
        other => panic!("expected fault, got {:?}", other),
    }
}

#[tokio::test]
async fn fault_inside_multicall_is_not_decoded_as_rows() {
    let caller = caller(ScriptedTransport::new().fault(-501, "Unsupported target type found."));
    let err = caller
        .multicall("t.", "BAD", "", &["url"])
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Fault(ref fault) if fault.code == -501));
}

#[tokio::test]
async fn transport_failure_is_connectivity_error() {
    let caller = caller(ScriptedTransport::new().fail(TransportError::Timeout(Duration::from_secs(10))));
    let err = caller.call("system.client_version", &[]).await.unwrap_err();
    assert!(matches!(
        err,
        RpcError::Connectivity(TransportError::Timeout(_))
    ));
}

#[tokio::test]
async fn encoding_error_fails_before_sending() {
    let caller = caller(ScriptedTransport::new().reply(i(0)));
    let err = caller
        .call("d.custom.set", &[Value::Double(f64::NAN)])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RpcError::Encoding(EncodingError::NonFiniteDouble(_))
    ));
    assert_eq!(caller.transport().request_count(), 0);
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let caller = caller(ScriptedTransport::new().raw("<methodResponse><params>"));
    let err = caller.call("system.client_version", &[]).await.unwrap_err();
    assert!(matches!(err, RpcError::Decode(_)));
}

#[tokio::test]
async fn every_call_is_exactly_one_round_trip() {
    let caller = caller(
        ScriptedTransport::new()
            .reply(i(1))
            .reply(i(2))
            .reply(list(vec![ok(i(3))])),
    );
    caller.call("d.state", &[s("H")]).await.unwrap();
    caller.call("d.state", &[s("H")]).await.unwrap();
    caller
        .batchcall(&rtorrent_rpc::rpc::BatchCommand::parse_all(["d.state=H"]))
        .await
        .unwrap();
    assert_eq!(caller.transport().request_count(), 3);
}
