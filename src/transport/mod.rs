//! Transport layer: the XML-RPC wire format and the HTTP round trip.

mod http;
mod xmlrpc;

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;

use crate::marshalling::Value;

pub use http::HttpTransport;
pub use xmlrpc::{MethodResponse, XmlRpcError, decode_response, encode_call};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A remote procedure call primitive: `method(params...) -> value`.
///
/// The client owns one transport for its whole lifetime. Implement this to
/// plug in a custom HTTP stack or a scripted fake.
pub trait RpcTransport: Send + Sync {
    fn call<'a>(
        &'a self,
        method: &'a str,
        params: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value, TransportError>>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP client failure (DNS, TLS, connect, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx HTTP status; the XML-RPC protocol-error case.
    #[error("unexpected HTTP status: {status}")]
    HttpStatus { status: u16, body: Option<String> },

    /// I/O failure raised by a custom transport.
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn StdError + Send + Sync>),

    /// XML-RPC `<fault>` response.
    #[error("XML-RPC fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("XML-RPC codec error: {0}")]
    Xml(#[from] XmlRpcError),
}

impl TransportError {
    /// Connection-level failures are worth another attempt; codec errors and faults are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::HttpStatus { .. } | Self::Connection(_)
        )
    }
}
