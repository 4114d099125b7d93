use std::time::Duration;

use serde::Deserialize;

use crate::client::SklikClientBuilder;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("environment variable {var} has invalid value {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Serializable client settings. Durations are whole seconds.
///
/// ```
/// let config = sklik::ClientConfig::from_json(r#"{"retries": 2, "timeout_secs": 30}"#)?;
/// let builder = config.into_builder();
/// # let _ = builder;
/// # Ok::<(), sklik::ConfigError>(())
/// ```
pub struct ClientConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub debug: bool,
    pub retries: u32,
    pub session_wait_secs: Option<u64>,
    pub error_retry_wait_secs: Option<u64>,
    pub max_throttle_waits: Option<u32>,
}

impl ClientConfig {
    pub const ENDPOINT_ENV: &'static str = "SKLIK_ENDPOINT";
    pub const TIMEOUT_ENV: &'static str = "SKLIK_TIMEOUT_SECS";
    pub const USER_AGENT_ENV: &'static str = "SKLIK_USER_AGENT";
    pub const DEBUG_ENV: &'static str = "SKLIK_DEBUG";
    pub const RETRIES_ENV: &'static str = "SKLIK_RETRIES";
    pub const SESSION_WAIT_ENV: &'static str = "SKLIK_SESSION_WAIT_SECS";
    pub const ERROR_RETRY_WAIT_ENV: &'static str = "SKLIK_ERROR_RETRY_WAIT_SECS";
    pub const MAX_THROTTLE_WAITS_ENV: &'static str = "SKLIK_MAX_THROTTLE_WAITS";

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read `SKLIK_*` variables; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let number = |var: &'static str| -> Result<Option<u64>, ConfigError> {
            lookup(var)
                .map(|value| {
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::InvalidEnv { var, value })
                })
                .transpose()
        };
        let small = |var: &'static str| -> Result<Option<u32>, ConfigError> {
            number(var)?
                .map(|n| {
                    u32::try_from(n).map_err(|_| ConfigError::InvalidEnv {
                        var,
                        value: n.to_string(),
                    })
                })
                .transpose()
        };

        let debug = match lookup(Self::DEBUG_ENV) {
            None => false,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "no" | "off" => false,
                "1" | "true" | "yes" | "on" => true,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        var: Self::DEBUG_ENV,
                        value,
                    });
                }
            },
        };

        Ok(Self {
            endpoint: lookup(Self::ENDPOINT_ENV),
            timeout_secs: number(Self::TIMEOUT_ENV)?,
            user_agent: lookup(Self::USER_AGENT_ENV),
            debug,
            retries: small(Self::RETRIES_ENV)?.unwrap_or_default(),
            session_wait_secs: number(Self::SESSION_WAIT_ENV)?,
            error_retry_wait_secs: number(Self::ERROR_RETRY_WAIT_ENV)?,
            max_throttle_waits: small(Self::MAX_THROTTLE_WAITS_ENV)?,
        })
    }

    pub fn into_builder(self) -> SklikClientBuilder {
        let mut builder = SklikClientBuilder::new()
            .debug(self.debug)
            .retries(self.retries);
        if let Some(endpoint) = self.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(secs) = self.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }
        if let Some(secs) = self.session_wait_secs {
            builder = builder.session_wait(Duration::from_secs(secs));
        }
        if let Some(secs) = self.error_retry_wait_secs {
            builder = builder.error_retry_wait(Duration::from_secs(secs));
        }
        if let Some(cap) = self.max_throttle_waits {
            builder = builder.max_throttle_waits(cap);
        }
        builder
    }
}

impl From<ClientConfig> for SklikClientBuilder {
    fn from(config: ClientConfig) -> Self {
        config.into_builder()
    }
}
