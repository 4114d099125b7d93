//! Retry decisions for the call-and-retry loop.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::client::SklikError;

/// Wait before re-logging in after a session error.
pub const DEFAULT_SESSION_WAIT: Duration = Duration::from_secs(5);
/// Wait before retrying after a transport failure.
pub const DEFAULT_ERROR_RETRY_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub retries: u32,
    pub session_wait: Duration,
    pub error_retry_wait: Duration,
    /// Cap on consecutive throttling waits; `None` waits as long as the server asks.
    pub max_throttle_waits: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            session_wait: DEFAULT_SESSION_WAIT,
            error_retry_wait: DEFAULT_ERROR_RETRY_WAIT,
            max_throttle_waits: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    Fail,
    Retry { wait: Duration },
    /// Log in again, then retry.
    Relogin { wait: Duration },
    /// Server-requested pause; does not consume an attempt.
    Throttle { wait: Duration },
}

impl RetryPolicy {
    /// Decide what to do after `err` on attempt `attempt` (0-based), with
    /// `throttled` consecutive throttle waits already spent.
    pub fn decide(&self, err: &SklikError, attempt: u32, throttled: u32) -> RetryAction {
        let exhausted = attempt >= self.retries;
        match err {
            SklikError::Transport(transport) if transport.is_transient() => {
                if exhausted {
                    RetryAction::Fail
                } else {
                    RetryAction::Retry {
                        wait: self.error_retry_wait,
                    }
                }
            }
            SklikError::Session { .. } => {
                if exhausted {
                    RetryAction::Fail
                } else {
                    RetryAction::Relogin {
                        wait: self.session_wait,
                    }
                }
            }
            SklikError::Api { message, .. } => {
                if let Some(wait) = throttle_wait(message) {
                    if self.max_throttle_waits.is_some_and(|cap| throttled >= cap) {
                        return RetryAction::Fail;
                    }
                    return RetryAction::Throttle { wait };
                }
                if exhausted {
                    RetryAction::Fail
                } else {
                    RetryAction::Retry {
                        wait: Duration::ZERO,
                    }
                }
            }
            _ => RetryAction::Fail,
        }
    }
}

/// Parse "Too many requests. Has to wait N[s]." into a wait of N + 1 seconds.
pub fn throttle_wait(message: &str) -> Option<Duration> {
    static THROTTLE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = THROTTLE
        .get_or_init(|| Regex::new(r"(?i)too many requests\. has to wait ([0-9]+)\[s\]").ok())
        .as_ref()?;
    let seconds: u64 = re.captures(message)?.get(1)?.as_str().parse().ok()?;
    Some(Duration::from_secs(seconds.saturating_add(1)))
}
