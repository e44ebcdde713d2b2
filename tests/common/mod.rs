#![allow(dead_code)]

use futures::future::{self, BoxFuture, FutureExt};
use rtorrent_rpc::rpc::codec;
use rtorrent_rpc::rpc::{Caller, Record, TransportError, Transport, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

/// In-memory transport replaying canned responses and recording requests.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<String, TransportError>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, value: Value) -> Self {
        let body = codec::encode_response(&value).expect("encodable reply");
        self.raw(body)
    }

    pub fn fault(self, code: i64, message: &str) -> Self {
        self.raw(codec::encode_fault(code, message))
    }

    pub fn raw(self, body: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(body.into()));
        self
    }

    pub fn fail(self, error: TransportError) -> Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Decoded `(method, params)` of every request sent so far.
    pub fn requests(&self) -> Vec<(String, Vec<Value>)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|body| codec::decode_call(body).expect("well-formed request"))
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, body: String) -> BoxFuture<'_, Result<String, TransportError>> {
        self.requests.lock().unwrap().push(body);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Malformed("no scripted reply".to_string())));
        future::ready(reply).boxed()
    }
}

pub fn caller(transport: ScriptedTransport) -> Caller<ScriptedTransport> {
    Caller::new(transport)
}

pub fn s(text: &str) -> Value {
    Value::from(text)
}

pub fn i(num: i64) -> Value {
    Value::Integer(num)
}

pub fn list(items: Vec<Value>) -> Value {
    Value::List(items)
}

/// Wrap a result the way `system.multicall` reports a successful call.
pub fn ok(value: Value) -> Value {
    Value::List(vec![value])
}

pub fn record(entries: Vec<(&str, Value)>) -> Record {
    entries.into_iter().collect()
}
