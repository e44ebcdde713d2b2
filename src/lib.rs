//! rtorrent-rpc – XML-RPC translation layer for the rTorrent daemon
//!
//! This crate implements the client side of rTorrent's control interface:
//! - An XML-RPC codec mapping a closed [`rpc::Value`] tree to and from the wire
//! - An SCGI transport to the daemon's control socket
//! - A multicall engine turning one filtered request into one record per entity
//! - A batchcall engine folding many addressed calls into a single round trip
//! - Panel queries deriving torrent and tracker summaries from those records

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Wire codec, transports and call engines
pub mod rpc;

/// Typed queries and derived values for an administrative panel
pub mod panel;

/// Helpers for reading result records
pub mod util;

// Re-export key types for convenience
pub use rpc::{Caller, ClientConfig, RpcError, RpcResult, ScgiTransport, Value};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
