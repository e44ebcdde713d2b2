//! Transport contract and the SCGI transport spoken by rTorrent.
//!
//! A transport moves one request body to the daemon and returns one response
//! body. Timeouts belong here; the layers above have no timers and never
//! retry.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::config::{ClientConfig, Endpoint};
use super::error::TransportError;

/// One opaque request/response exchange.
pub trait Transport: Send + Sync {
    /// Send `body` and resolve to the raw response body.
    fn send(&self, body: String) -> BoxFuture<'_, Result<String, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, body: String) -> BoxFuture<'_, Result<String, TransportError>> {
        (**self).send(body)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, body: String) -> BoxFuture<'_, Result<String, TransportError>> {
        (**self).send(body)
    }
}

/// SCGI client for rTorrent's `network.scgi.open_port` / `open_local` socket.
#[derive(Debug, Clone)]
pub struct ScgiTransport {
    endpoint: Endpoint,
    timeout: Duration,
    request_uri: String,
}

impl ScgiTransport {
    /// Transport for a TCP `host:port` endpoint.
    pub fn tcp(addr: impl Into<String>) -> Self {
        Self::new(Endpoint::Tcp(addr.into()))
    }

    /// Transport for a Unix domain socket.
    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self::new(Endpoint::Unix(path.into()))
    }

    /// Transport for `endpoint` with default timeout and URI.
    pub fn new(endpoint: Endpoint) -> Self {
        let defaults = ClientConfig::default();
        Self {
            endpoint,
            timeout: defaults.timeout(),
            request_uri: defaults.rpc_uri,
        }
    }

    /// Transport configured from a [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: config.timeout(),
            request_uri: config.rpc_uri.clone(),
        }
    }

    /// Override the exchange timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint this transport connects to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn exchange(&self, body: String) -> Result<String, TransportError> {
        let request = frame_request(&self.request_uri, body.as_bytes());
        let raw = match &self.endpoint {
            Endpoint::Tcp(addr) => {
                let stream = tokio::net::TcpStream::connect(addr.as_str()).await?;
                round_trip(stream, &request).await?
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path).await?;
                round_trip(stream, &request).await?
            }
            #[cfg(not(unix))]
            Endpoint::Unix(path) => {
                return Err(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    format!("unix sockets are unavailable: {}", path.display()),
                )));
            }
        };
        parse_response(&raw)
    }
}

impl Transport for ScgiTransport {
    fn send(&self, body: String) -> BoxFuture<'_, Result<String, TransportError>> {
        async move {
            tracing::trace!(endpoint = %self.endpoint, bytes = body.len(), "scgi request");
            match tokio::time::timeout(self.timeout, self.exchange(body)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(self.timeout)),
            }
        }
        .boxed()
    }
}

async fn round_trip<S>(mut stream: S, request: &[u8]) -> Result<Vec<u8>, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(request).await?;
    stream.flush().await?;
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await?;
    Ok(raw)
}

/// Frame `body` as an SCGI request: a netstring of headers, then the body.
pub fn frame_request(request_uri: &str, body: &[u8]) -> Vec<u8> {
    let content_length = body.len().to_string();
    let headers: [(&str, &str); 4] = [
        ("CONTENT_LENGTH", &content_length),
        ("SCGI", "1"),
        ("REQUEST_METHOD", "POST"),
        ("REQUEST_URI", request_uri),
    ];

    let mut block = Vec::new();
    for (name, value) in headers {
        block.extend_from_slice(name.as_bytes());
        block.push(0);
        block.extend_from_slice(value.as_bytes());
        block.push(0);
    }

    let mut request = Vec::with_capacity(block.len() + body.len() + 16);
    request.extend_from_slice(block.len().to_string().as_bytes());
    request.push(b':');
    request.extend_from_slice(&block);
    request.push(b',');
    request.extend_from_slice(body);
    request
}

/// Strip the CGI-style header block from an SCGI reply.
pub fn parse_response(raw: &[u8]) -> Result<String, TransportError> {
    let text = std::str::from_utf8(raw)
        .map_err(|err| TransportError::Malformed(format!("reply is not UTF-8: {}", err)))?;
    if text.is_empty() {
        return Err(TransportError::Malformed("empty reply".to_string()));
    }

    // Replies without a header block are bare bodies.
    if text.trim_start().starts_with('<') {
        return Ok(text.to_string());
    }

    let (head, body) = text
        .split_once("\r\n\r\n")
        .or_else(|| text.split_once("\n\n"))
        .ok_or_else(|| TransportError::Malformed("missing header terminator".to_string()))?;

    for line in head.lines() {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("status") {
                let status = value.trim();
                if !status.starts_with("200") {
                    return Err(TransportError::Status(status.to_string()));
                }
            }
        }
    }
    Ok(body.to_string())
}
