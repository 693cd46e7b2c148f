use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::identity::errors::UsernameError;

/// Identity record.
///
/// Created once at registration and read on every login and every token
/// validation. The password hash never leaves the store and hasher.
#[derive(Clone)]
pub struct Identity {
    pub id: IdentityId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Username,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Authorities granted to this identity. Every registered identity is a
    /// plain user.
    pub fn authorities(&self) -> Vec<Authority> {
        vec![Authority::User]
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Identity unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityId(pub Uuid);

impl IdentityId {
    /// Generate a new random identity ID (UUID v4).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IdentityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Ensures username is 3-32 characters and contains only ASCII alphanumerics,
/// underscore, and hyphen. Comparison is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 32 characters
    /// * `InvalidCharacters` - Contains characters other than ASCII alphanumerics, `_` and `-`
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = Self::with_valid_length(username)?;
        let username = Self::with_valid_chars(username)?;
        Ok(Self(username))
    }

    fn with_valid_length(username: String) -> Result<String, UsernameError> {
        let length = username.chars().count();
        if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(username)
        }
    }

    fn with_valid_chars(username: String) -> Result<String, UsernameError> {
        if username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            Ok(username)
        } else {
            Err(UsernameError::InvalidCharacters)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Role granted to a resolved caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Authority {
    User,
}

impl Authority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Authority::User => "USER",
        }
    }
}

/// Caller identity bound to a single inbound call by the request gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub username: Username,
    pub authorities: Vec<Authority>,
}

impl From<&Identity> for CallerIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            authorities: identity.authorities(),
        }
    }
}

/// Opaque bearer token handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Command to register a new identity
pub struct RegisterCommand {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Username,
    /// Plain text password (hashed by the service, then dropped)
    pub password: String,
}

impl RegisterCommand {
    pub fn new(
        first_name: Option<String>,
        last_name: Option<String>,
        username: Username,
        password: String,
    ) -> Self {
        Self {
            first_name,
            last_name,
            username,
            password,
        }
    }
}

/// Command to log in with username and password
pub struct AuthenticateCommand {
    pub username: Username,
    pub password: String,
}

impl AuthenticateCommand {
    pub fn new(username: Username, password: String) -> Self {
        Self { username, password }
    }
}
