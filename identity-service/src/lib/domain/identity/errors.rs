use auth::JwtError;
use auth::PasswordError;
use thiserror::Error;

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error reported by a credential store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    #[error("Credential store unavailable: {0}")]
    Unavailable(String),
}

/// Top-level error for registration, login and token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("User not found with username: {0}")]
    UserNotFound(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Malformed, badly signed or expired token.
    #[error("Token rejected: {0}")]
    Token(#[from] JwtError),

    #[error("Credential store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername(username) => AuthError::UsernameTaken(username),
            StoreError::Unavailable(reason) => AuthError::StoreUnavailable(reason),
        }
    }
}
