//! Error types for the RPC translation layer
//!
//! Every failure surfaces to callers of `call`, `multicall` and `batchcall`
//! as a distinct [`RpcError`] variant; nothing is swallowed or retried here.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Top-level error for a single call, multicall or batchcall.
#[derive(Debug, Error)]
pub enum RpcError {
    /// A request could not be encoded
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// The server answered with a fault envelope
    #[error("Fault: {0}")]
    Fault(Fault),

    /// One entry of a `system.multicall` batch faulted
    #[error("Call #{index} ({method}) faulted: {fault}")]
    CallFault {
        /// Position of the faulting call in the submitted batch
        index: usize,
        /// Method name of the faulting call
        method: String,
        /// Fault reported for that call
        fault: Fault,
    },

    /// No response could be obtained from the transport
    #[error("Connectivity error: {0}")]
    Connectivity(#[from] TransportError),

    /// Positional results do not line up with the submitted commands
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignmentError),

    /// The response body is not a well-formed XML-RPC document
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl From<Fault> for RpcError {
    fn from(fault: Fault) -> Self {
        RpcError::Fault(fault)
    }
}

/// Structured fault reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{code}] {message}")]
pub struct Fault {
    /// Server-defined fault code (`faultCode`)
    pub code: i64,
    /// Human-readable fault message (`faultString`)
    pub message: String,
}

/// Request encoding errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    /// Method names must be non-empty and limited to `[A-Za-z0-9_.:/]`
    #[error("Invalid method name '{0}'")]
    InvalidMethodName(String),

    /// NaN and infinities have no XML-RPC representation
    #[error("Non-finite double {0} cannot be encoded")]
    NonFiniteDouble(f64),

    /// Text carries a character XML 1.0 cannot represent
    #[error("Character {0:?} cannot appear in an XML document")]
    ForbiddenCharacter(char),

    /// A whole-valued double too large for the integer path
    #[error("Whole double {0} does not fit a 64-bit integer")]
    IntegerOverflow(f64),
}

/// Response decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The body is not well-formed XML
    #[error("Malformed XML at byte {offset}: {detail}")]
    Xml {
        /// Byte offset where parsing failed
        offset: usize,
        /// Description of the problem
        detail: String,
    },

    /// An element appeared where another was required
    #[error("Expected <{expected}>, found <{found}>")]
    UnexpectedElement {
        /// Element name that was required
        expected: String,
        /// Element name that was found
        found: String,
    },

    /// A required child element is missing
    #[error("<{parent}> is missing <{child}>")]
    MissingElement {
        /// Parent element name
        parent: String,
        /// Missing child element name
        child: String,
    },

    /// Scalar text does not parse as its declared kind
    #[error("Invalid <{kind}> content '{text}'")]
    InvalidScalar {
        /// Element name of the scalar
        kind: String,
        /// Offending text content
        text: String,
    },

    /// The element is not part of the XML-RPC vocabulary
    #[error("Unsupported element <{0}>")]
    UnsupportedElement(String),

    /// A decoded value does not have the shape an engine requires
    #[error("Unexpected result shape: {0}")]
    UnexpectedShape(String),
}

/// Transport-level failures: no response body was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Socket I/O failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The exchange did not complete in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The server replied with a non-success status header
    #[error("Server replied with status '{0}'")]
    Status(String),

    /// The reply could not be framed as a response body
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Result count mismatch between submitted commands and decoded values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{context}: expected {expected} values, got {actual}")]
pub struct AlignmentError {
    /// Which row or batch was being demultiplexed
    pub context: String,
    /// Number of commands submitted
    pub expected: usize,
    /// Number of values received
    pub actual: usize,
}

impl AlignmentError {
    /// Build an alignment error for `context`.
    pub fn new(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self {
            context: context.into(),
            expected,
            actual,
        }
    }
}

/// Convenience result alias for decoding operations
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Result type using RpcError
pub type RpcResult<T> = std::result::Result<T, RpcError>;
