//! RPC translation layer for the rTorrent XML-RPC control interface
//!
//! Data flows leaf-first: [`command`] formats remote command names, the
//! [`multicall`] and [`batch`] engines assemble [`Caller`] invocations, the
//! caller runs them through [`codec`] and a [`Transport`], and the engines
//! reshape the decoded [`Value`] tree into named records.

pub mod batch;
pub mod caller;
pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod multicall;
pub mod transport;
pub mod value;
pub mod xml;

// Re-export commonly used types
pub use batch::{BatchCommand, CallSpec, ResultShape};
pub use caller::Caller;
pub use command::{Command, full_command, to_key};
pub use config::{ClientConfig, Endpoint};
pub use error::{AlignmentError, DecodeError, EncodingError, Fault, RpcError, RpcResult, TransportError};
pub use multicall::ResultRecord;
pub use transport::{ScgiTransport, Transport};
pub use value::{Record, Value};
