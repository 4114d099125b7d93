use tracing::trace;
use url::Url;

use crate::marshalling::Value;
use crate::transport::xmlrpc::{MethodResponse, decode_response, encode_call};
use crate::transport::{BoxFuture, RpcTransport, TransportError};

#[derive(Debug, Clone)]
/// XML-RPC over HTTP POST, backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    verbose: bool,
}

impl HttpTransport {
    /// `verbose` logs request and response bodies at `trace` level, except
    /// for `client.login`.
    pub fn new(client: reqwest::Client, endpoint: Url, verbose: bool) -> Self {
        Self {
            client,
            endpoint,
            verbose,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Methods whose bodies hold a password or a fresh session token.
const CREDENTIAL_METHODS: &[&str] = &["client.login"];

fn carries_credentials(method: &str) -> bool {
    CREDENTIAL_METHODS.contains(&method)
}

impl RpcTransport for HttpTransport {
    fn call<'a>(
        &'a self,
        method: &'a str,
        params: Vec<Value>,
    ) -> BoxFuture<'a, Result<Value, TransportError>> {
        Box::pin(async move {
            let body = encode_call(method, &params);
            let redacted = carries_credentials(method);
            if self.verbose {
                if redacted {
                    trace!(method, "xml-rpc request (body redacted)");
                } else {
                    trace!(method, body = %body, "xml-rpc request");
                }
            }

            let response = self
                .client
                .post(self.endpoint.clone())
                .header(reqwest::header::CONTENT_TYPE, "text/xml")
                .body(body)
                .send()
                .await?;
            let status = response.status().as_u16();
            let text = response.text().await?;
            if self.verbose {
                if redacted {
                    trace!(method, status, "xml-rpc response (body redacted)");
                } else {
                    trace!(method, status, body = %text, "xml-rpc response");
                }
            }

            if !(200..=299).contains(&status) {
                let body = if text.trim().is_empty() {
                    None
                } else {
                    Some(text)
                };
                return Err(TransportError::HttpStatus { status, body });
            }

            match decode_response(&text)? {
                MethodResponse::Success(value) => Ok(value),
                MethodResponse::Fault { code, message } => {
                    Err(TransportError::Fault { code, message })
                }
            }
        })
    }
}
