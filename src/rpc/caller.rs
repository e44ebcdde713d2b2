//! The single entry point used by applications: encode, send, decode.

use super::codec;
use super::error::{RpcError, RpcResult};
use super::transport::Transport;
use super::value::Value;

/// Issues XML-RPC calls over a [`Transport`].
///
/// Each invocation is exactly one round trip. The caller holds no state
/// between calls, so independent calls may run concurrently.
#[derive(Debug, Clone)]
pub struct Caller<T> {
    transport: T,
}

impl<T: Transport> Caller<T> {
    /// Wrap a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Invoke `method` with `params` and decode the result.
    ///
    /// A fault response yields [`RpcError::Fault`]; a missing response
    /// yields [`RpcError::Connectivity`].
    pub async fn call(&self, method: &str, params: &[Value]) -> RpcResult<Value> {
        let body = codec::encode_call(method, params)?;
        tracing::debug!(method, params = params.len(), bytes = body.len(), "rpc call");
        tracing::trace!(%body, "request body");

        let response = self.transport.send(body).await.map_err(|err| {
            tracing::debug!(method, error = %err, "transport failed");
            RpcError::Connectivity(err)
        })?;
        tracing::trace!(body = %response, "response body");

        match codec::decode_response(&response) {
            Ok(value) => Ok(value),
            Err(RpcError::Fault(fault)) => {
                tracing::warn!(method, code = fault.code, message = %fault.message, "rpc fault");
                Err(RpcError::Fault(fault))
            }
            Err(err) => Err(err),
        }
    }
}
