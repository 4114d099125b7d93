//! Client layer: session lifecycle, call-and-retry and status classification.
//!
//! Resource operations live in one file per namespace (`ads`, `campaigns`,
//! `groups`, `keywords`), all as inherent methods of [`SklikClient`].

mod ads;
mod campaigns;
mod config;
mod error;
mod groups;
mod keywords;
mod retry;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{
    ApiDialect, ApiResponse, ApiStatus, ApiVersion, Credentials, Diagnostic, KnownStatus, Limits,
    SessionToken, UserContext, UserId, ValidationError,
};
use crate::marshalling::{FromWire, MarshallError, Mapping, ToWire, Value};
use crate::transport::{HttpTransport, RpcTransport, TransportError};

pub use config::{ClientConfig, ConfigError};
pub use error::SklikError;
pub use retry::{
    DEFAULT_ERROR_RETRY_WAIT, DEFAULT_SESSION_WAIT, RetryAction, RetryPolicy, throttle_wait,
};

pub const DEFAULT_ENDPOINT: &str = "https://api.sklik.cz/cipisek/RPC2";

#[derive(Clone)]
/// Builder for [`SklikClient`].
pub struct SklikClientBuilder {
    endpoint: String,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    debug: bool,
    policy: RetryPolicy,
    transport: Option<Arc<dyn RpcTransport>>,
}

impl fmt::Debug for SklikClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SklikClientBuilder")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("debug", &self.debug)
            .field("policy", &self.policy)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

impl Default for SklikClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SklikClientBuilder {
    /// Defaults: production `cipisek` endpoint, no timeout, no retries.
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: None,
            user_agent: None,
            debug: false,
            policy: RetryPolicy::default(),
            transport: None,
        }
    }

    /// Override the XML-RPC endpoint, e.g. the sandbox URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set an HTTP client timeout applied to every call.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Log XML request and response bodies at `trace` level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Number of additional attempts for retryable failures.
    pub fn retries(mut self, retries: u32) -> Self {
        self.policy.retries = retries;
        self
    }

    pub fn session_wait(mut self, wait: Duration) -> Self {
        self.policy.session_wait = wait;
        self
    }

    pub fn error_retry_wait(mut self, wait: Duration) -> Self {
        self.policy.error_retry_wait = wait;
        self
    }

    pub fn max_throttle_waits(mut self, cap: u32) -> Self {
        self.policy.max_throttle_waits = Some(cap);
        self
    }

    /// Use a custom transport instead of the built-in HTTP one.
    ///
    /// Endpoint, timeout, user agent and debug settings are then ignored.
    pub fn transport(mut self, transport: impl RpcTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build an unauthenticated client.
    pub fn build(self) -> Result<SklikClient, SklikError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let endpoint = Url::parse(&self.endpoint).map_err(|_| {
                    ValidationError::InvalidEndpoint {
                        input: self.endpoint.clone(),
                    }
                })?;

                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                if let Some(user_agent) = self.user_agent {
                    builder = builder.user_agent(user_agent);
                }
                let client = builder.build().map_err(TransportError::from)?;

                Arc::new(HttpTransport::new(client, endpoint, self.debug))
            }
        };

        Ok(SklikClient {
            transport,
            policy: self.policy,
            credentials: None,
            state: SessionState::Unauthenticated,
            user_id: None,
            limits: None,
        })
    }

    /// Build, check the API dialect, log in and load limits.
    pub async fn connect(self, credentials: Credentials) -> Result<SklikClient, SklikError> {
        let mut client = self.build()?;

        let version = client.get_version().await?;
        debug!(name = %version.name, number = %version.number, "Sklik API version");
        if version.dialect() != ApiDialect::Current {
            return Err(SklikError::IncompatibleApiVersion {
                expected: ApiDialect::CURRENT_NAME,
                found: version.name,
            });
        }

        client.login(credentials).await?;
        client.get_limits().await?;
        Ok(client)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    Unauthenticated,
    Authenticated(SessionToken),
    Closed,
}

/// Sklik API client.
///
/// Holds the session token, the optional impersonated user and the limits
/// loaded at connect time. Methods that may touch the session take
/// `&mut self`; share a client between tasks only behind a lock.
///
/// Dropping a client that is still logged in spawns a best-effort logout on
/// the current tokio runtime. Prefer [`SklikClient::close`].
pub struct SklikClient {
    transport: Arc<dyn RpcTransport>,
    policy: RetryPolicy,
    credentials: Option<Credentials>,
    state: SessionState,
    user_id: Option<UserId>,
    limits: Option<Limits>,
}

impl fmt::Debug for SklikClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SklikClient")
            .field("policy", &self.policy)
            .field("state", &self.state)
            .field("user_id", &self.user_id)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl SklikClient {
    pub fn builder() -> SklikClientBuilder {
        SklikClientBuilder::new()
    }

    /// Connect to the production endpoint with default settings.
    pub async fn connect(credentials: Credentials) -> Result<Self, SklikError> {
        SklikClientBuilder::new().connect(credentials).await
    }

    /// Current session token, if logged in.
    pub fn session(&self) -> Option<&SessionToken> {
        match &self.state {
            SessionState::Authenticated(token) => Some(token),
            SessionState::Unauthenticated | SessionState::Closed => None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Act on behalf of a managed account in every following call.
    pub fn work_with_user(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
    }

    /// Limits cached by the last [`SklikClient::get_limits`].
    pub fn limits(&self) -> Option<&Limits> {
        self.limits.as_ref()
    }

    /// Max items per call for `resource.verb`, falling back to `global.verb`.
    pub fn get_batch_limit(&self, operation: &str) -> Option<u32> {
        self.limits.as_ref()?.batch_limit(operation)
    }

    /// Log in; the credentials are kept for re-login after session expiry.
    pub async fn login(&mut self, credentials: Credentials) -> Result<(), SklikError> {
        if self.state == SessionState::Closed {
            return Err(SklikError::no_session());
        }
        self.credentials = Some(credentials);
        self.relogin().await
    }

    async fn relogin(&mut self) -> Result<(), SklikError> {
        let Some(credentials) = &self.credentials else {
            return Err(SklikError::no_session());
        };
        let login = credentials.login().as_str().to_owned();
        let params = vec![
            login.to_wire(),
            credentials.password().as_str().to_wire(),
        ];

        let raw = self.transport.call("client.login", params).await?;
        let mut response = check_login_result(raw)?;
        let token: String = response.take(SessionToken::FIELD)?;
        self.state = SessionState::Authenticated(SessionToken::new(token)?);
        info!(login = %login, "logged in to Sklik");
        Ok(())
    }

    /// Invalidate the session. The client is closed afterwards, even on error.
    pub async fn logout(&mut self) -> Result<(), SklikError> {
        let state = std::mem::replace(&mut self.state, SessionState::Closed);
        let SessionState::Authenticated(session) = state else {
            return Ok(());
        };
        logout_session(self.transport.as_ref(), session).await?;
        info!("logged out of Sklik");
        Ok(())
    }

    /// Log out and release the client.
    pub async fn close(mut self) -> Result<(), SklikError> {
        let result = self.logout().await;
        if let Err(err) = &result {
            warn!(error = %err, "logout on close failed");
        }
        result
    }

    /// `api.version`: protocol generation and build number.
    pub async fn get_version(&mut self) -> Result<ApiVersion, SklikError> {
        let mut response = self.call_and_retry("api.version", &[], false).await?;
        let name: String = response.take("versionName")?;
        let number = match response.take::<Value>("versionNumber")? {
            Value::String(s) => s,
            Value::Int(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            other => return Err(MarshallError::mismatch("string", &other).into()),
        };
        Ok(ApiVersion { name, number })
    }

    /// `api.limits`: refresh and cache the throttling window and batch limits.
    pub async fn get_limits(&mut self) -> Result<Limits, SklikError> {
        let mut response = self.call("api.limits", Vec::new()).await?;
        let window: Mapping = response.take("limits")?;
        let batches: Vec<Mapping> = response.take_or_default("batchCallLimits")?;

        let batch_call_limits: BTreeMap<String, u32> = batches
            .into_iter()
            .map(|entry| -> Result<(String, u32), MarshallError> {
                let name = String::from_wire(member(&entry, "name")?)?;
                let limit = u32::from_wire(member(&entry, "limit")?)?;
                Ok((name, limit))
            })
            .collect::<Result<_, _>>()?;

        let limits = Limits {
            anti_dos_call_count: i64::from_wire(member(&window, "antiDosCallCount")?)?,
            anti_dos_time_interval: i64::from_wire(member(&window, "antiDosTimeInterval")?)?,
            batch_call_limits,
        };
        self.limits = Some(limits.clone());
        Ok(limits)
    }

    /// Authenticated call of any method. The user envelope is prepended to `args`.
    pub async fn call(
        &mut self,
        method: &str,
        args: Vec<Value>,
    ) -> Result<ApiResponse, SklikError> {
        self.call_and_retry(method, &args, true).await
    }

    async fn call_and_retry(
        &mut self,
        method: &str,
        args: &[Value],
        authenticated: bool,
    ) -> Result<ApiResponse, SklikError> {
        if authenticated {
            self.user_context()?;
        }

        let mut attempt = 0;
        let mut throttled = 0;
        loop {
            let err = match self.call_once(method, args, authenticated).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            match self.policy.decide(&err, attempt, throttled) {
                RetryAction::Fail => return Err(err),
                RetryAction::Retry { wait } => {
                    info!(method, attempt, ?wait, error = %err, "call failed, retrying");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                    throttled = 0;
                }
                RetryAction::Relogin { wait } => {
                    if self.credentials.is_none() {
                        return Err(err);
                    }
                    info!(method, attempt, ?wait, error = %err, "re-logging in and retrying");
                    tokio::time::sleep(wait).await;
                    self.relogin().await?;
                    attempt += 1;
                    throttled = 0;
                }
                RetryAction::Throttle { wait } => {
                    warn!(method, ?wait, "throttled by server, waiting");
                    tokio::time::sleep(wait).await;
                    throttled += 1;
                }
            }
        }
    }

    async fn call_once(
        &mut self,
        method: &str,
        args: &[Value],
        authenticated: bool,
    ) -> Result<ApiResponse, SklikError> {
        let mut params = Vec::with_capacity(args.len() + 1);
        if authenticated {
            params.push(self.user_context()?.to_wire());
        }
        params.extend_from_slice(args);

        let raw = self.transport.call(method, params).await?;
        let mut response = open_envelope(raw)?;

        if let Some(Value::String(token)) = response.payload.shift_remove(SessionToken::FIELD) {
            if let SessionState::Authenticated(current) = &mut self.state {
                if let Ok(token) = SessionToken::new(token) {
                    *current = token;
                }
            }
        }

        classify(method, response)
    }

    fn user_context(&self) -> Result<UserContext, SklikError> {
        match &self.state {
            SessionState::Authenticated(session) => Ok(UserContext {
                session: session.clone(),
                user_id: self.user_id,
            }),
            SessionState::Unauthenticated | SessionState::Closed => Err(SklikError::no_session()),
        }
    }
}

impl Drop for SklikClient {
    fn drop(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Closed);
        let SessionState::Authenticated(session) = state else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let transport = Arc::clone(&self.transport);
                handle.spawn(async move {
                    if let Err(err) = logout_session(transport.as_ref(), session).await {
                        warn!(error = %err, "logout on drop failed");
                    }
                });
            }
            Err(_) => warn!("Sklik client dropped outside a tokio runtime; session left open"),
        }
    }
}

async fn logout_session(
    transport: &dyn RpcTransport,
    session: SessionToken,
) -> Result<(), SklikError> {
    let envelope = Value::struct_from([(SessionToken::FIELD, Value::from(session.as_str()))]);
    let raw = transport.call("client.logout", vec![envelope]).await?;
    check_login_result(raw)?;
    Ok(())
}

fn member(map: &Mapping, key: &str) -> Result<Value, MarshallError> {
    map.get(key)
        .cloned()
        .ok_or_else(|| MarshallError::MissingMember {
            key: key.to_owned(),
        })
}

fn open_envelope(raw: Value) -> Result<ApiResponse, SklikError> {
    let mut payload = match raw {
        Value::Struct(payload) => payload,
        other => return Err(MarshallError::mismatch("struct", &other).into()),
    };
    let status = i32::from_wire(member(&payload, ApiStatus::FIELD)?)?;
    payload.shift_remove(ApiStatus::FIELD);
    let status_message = match payload.shift_remove("statusMessage") {
        Some(value) => Option::<String>::from_wire(value)?,
        None => None,
    };
    Ok(ApiResponse {
        status: ApiStatus::new(status),
        status_message,
        payload,
    })
}

fn take_diagnostics(payload: &mut Mapping, primary: &str, fallback: &str) -> Vec<Diagnostic> {
    let value = payload
        .shift_remove(primary)
        .or_else(|| payload.shift_remove(fallback));
    Diagnostic::list_from(value)
}

fn classify(method: &str, mut response: ApiResponse) -> Result<ApiResponse, SklikError> {
    let status = response.status;
    let message = response.status_message.clone().unwrap_or_default();

    match status.known() {
        Some(KnownStatus::Ok) => Ok(response),
        Some(KnownStatus::NoAction) => {
            warn!(method, message = %message, "no action taken");
            Ok(response)
        }
        Some(KnownStatus::BadArguments) => Err(SklikError::Argument {
            message,
            problems: take_diagnostics(&mut response.payload, "diagnostics", "problems"),
        }),
        Some(KnownStatus::SessionExpired | KnownStatus::Unauthorized) => {
            Err(SklikError::Session { message })
        }
        Some(KnownStatus::Forbidden) => Err(SklikError::Access { message }),
        Some(KnownStatus::NotFound) => Err(SklikError::NotFound { message }),
        Some(KnownStatus::PartiallyInvalid | KnownStatus::InvalidData) => {
            Err(SklikError::InvalidData {
                status,
                message,
                diagnostics: take_diagnostics(&mut response.payload, "diagnostics", "problems"),
            })
        }
        _ => Err(SklikError::Api {
            status: Some(status),
            message,
        }),
    }
}

/// `client.login` / `client.logout` use their own, smaller status table.
fn check_login_result(raw: Value) -> Result<ApiResponse, SklikError> {
    let mut response = open_envelope(raw)?;
    let message = response.status_message.clone().unwrap_or_default();
    match response.status.known() {
        Some(KnownStatus::Ok) => Ok(response),
        Some(KnownStatus::BadArguments) => Err(SklikError::Argument {
            message,
            problems: take_diagnostics(&mut response.payload, "problems", "diagnostics"),
        }),
        Some(KnownStatus::SessionExpired | KnownStatus::Unauthorized) => {
            Err(SklikError::Authentication { message })
        }
        _ => Err(SklikError::Api {
            status: Some(response.status),
            message,
        }),
    }
}
