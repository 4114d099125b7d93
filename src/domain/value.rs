use std::fmt;

use crate::domain::validation::ValidationError;
use crate::marshalling::{ToWire, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Sklik account login (usually an e-mail address).
///
/// Invariant: non-empty after trimming.
pub struct Login(String);

impl Login {
    /// Field name used in validation errors.
    pub const FIELD: &'static str = "username";

    /// Create a validated [`Login`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the validated login.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// Sklik account password.
///
/// Invariant: must not be empty (whitespace is preserved and allowed).
pub struct Password(String);

impl Password {
    /// Field name used in validation errors.
    pub const FIELD: &'static str = "password";

    /// Create a validated [`Password`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the password as provided.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Login + password pair used for `client.login` and for re-login after session expiry.
pub struct Credentials {
    login: Login,
    password: Password,
}

impl Credentials {
    pub const USERNAME_ENV: &'static str = "SKLIK_USERNAME";
    pub const PASSWORD_ENV: &'static str = "SKLIK_PASSWORD";

    /// Validate both parts; neither may be empty.
    pub fn new(
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            login: Login::new(login)?,
            password: Password::new(password)?,
        })
    }

    /// Read `SKLIK_USERNAME` / `SKLIK_PASSWORD`.
    pub fn from_env() -> Result<Self, ValidationError> {
        let login = std::env::var(Self::USERNAME_ENV).map_err(|_| ValidationError::MissingEnv {
            var: Self::USERNAME_ENV,
        })?;
        let password =
            std::env::var(Self::PASSWORD_ENV).map_err(|_| ValidationError::MissingEnv {
                var: Self::PASSWORD_ENV,
            })?;
        Self::new(login, password)
    }

    pub fn login(&self) -> &Login {
        &self.login
    }

    pub fn password(&self) -> &Password {
        &self.password
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
/// Opaque session token issued by `client.login`.
pub struct SessionToken(String);

impl SessionToken {
    pub const FIELD: &'static str = "session";

    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible = self.0.get(..6).unwrap_or("");
        write!(f, "SessionToken({visible}...)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Id of a managed account the session acts on behalf of (`userId`).
pub struct UserId(i64);

impl UserId {
    pub const FIELD: &'static str = "userId";

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// User-context envelope sent as the first argument of every authenticated call.
pub struct UserContext {
    pub session: SessionToken,
    pub user_id: Option<UserId>,
}

impl ToWire for UserContext {
    fn to_wire(&self) -> Value {
        let mut pairs = vec![(SessionToken::FIELD, Value::from(self.session.as_str()))];
        if let Some(user_id) = self.user_id {
            pairs.push((UserId::FIELD, Value::Int(user_id.value())));
        }
        Value::struct_from(pairs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Response `status` field.
///
/// This value is preserved as-is even when the code is unknown to this crate.
pub struct ApiStatus(i32);

impl ApiStatus {
    pub const FIELD: &'static str = "status";

    /// Construct a status from its integer representation.
    pub fn new(code: i32) -> Self {
        Self(code)
    }

    pub fn as_i32(self) -> i32 {
        self.0
    }

    /// Map this code to a known status, if one exists.
    pub fn known(self) -> Option<KnownStatus> {
        KnownStatus::from_code(self.0)
    }

    pub fn is_success(self) -> bool {
        self.known() == Some(KnownStatus::Ok)
    }

    /// `301` / `401`: the session is gone and a fresh login may help.
    pub fn is_session_error(self) -> bool {
        matches!(
            self.known(),
            Some(KnownStatus::SessionExpired | KnownStatus::Unauthorized)
        )
    }

    /// `206` / `406`: the request was understood but some items failed validation.
    pub fn is_invalid_data(self) -> bool {
        matches!(
            self.known(),
            Some(KnownStatus::PartiallyInvalid | KnownStatus::InvalidData)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
/// Status codes the client classifies.
pub enum KnownStatus {
    Ok,
    PartiallyInvalid,
    SessionExpired,
    BadArguments,
    Unauthorized,
    Forbidden,
    NotFound,
    InvalidData,
    NoAction,
    ServerError,
}

impl KnownStatus {
    /// Convert a raw integer status into a known variant.
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            200 => Self::Ok,
            206 => Self::PartiallyInvalid,
            301 => Self::SessionExpired,
            400 => Self::BadArguments,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            406 => Self::InvalidData,
            409 => Self::NoAction,
            500 => Self::ServerError,
            _ => return None,
        })
    }
}
