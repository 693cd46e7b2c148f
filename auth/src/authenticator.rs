use chrono::Duration;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::TokenCodec;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and token issuance.
///
/// Holds the process-wide hashing policy, signing key and token lifetime.
/// Everything here is read-only after construction.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    token_codec: TokenCodec,
    token_ttl: Option<Duration>,
    decoy_hash: String,
}

/// Result of successful authentication.
pub struct AuthenticationResult {
    /// Signed access token
    pub access_token: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `password_hasher` - Hashing policy for stored passwords
    /// * `token_codec` - Codec holding the signing secret
    /// * `token_ttl` - Lifetime of issued tokens, `None` for non-expiring tokens
    ///
    /// # Errors
    /// * `PasswordError` - The decoy hash used for unknown users could not be computed
    pub fn new(
        password_hasher: PasswordHasher,
        token_codec: TokenCodec,
        token_ttl: Option<Duration>,
    ) -> Result<Self, PasswordError> {
        let decoy_hash = password_hasher.hash("decoy-password-for-unknown-users")?;

        Ok(Self {
            password_hasher,
            token_codec,
            token_ttl,
            decoy_hash,
        })
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a plaintext password against a stored hash.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Spend the same work as a real verification when no stored hash exists.
    ///
    /// Keeps the response time for an unknown username in line with a wrong
    /// password for a known one.
    pub fn verify_against_decoy(&self, password: &str) {
        let _ = self.password_hasher.verify(password, &self.decoy_hash);
    }

    /// Verify credentials and issue a token for `subject`.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let access_token = self.issue_token(subject)?;

        Ok(AuthenticationResult { access_token })
    }

    /// Issue a token without password verification.
    ///
    /// Used right after registration, when the caller has just set the
    /// password.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token generation failed
    pub fn issue_token(&self, subject: &str) -> Result<String, JwtError> {
        self.token_codec.issue(subject, Claims::new(), self.token_ttl)
    }

    /// Validate a token and return its claims.
    ///
    /// # Errors
    /// * `Malformed`, `InvalidSignature`, `Expired` - see [`TokenCodec::parse`]
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.token_codec.parse(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(ttl: Option<Duration>) -> Authenticator {
        Authenticator::new(
            PasswordHasher::with_params(64, 1, 1).unwrap(),
            TokenCodec::new(b"test_secret_key_at_least_32_bytes!").unwrap(),
            ttl,
        )
        .expect("Failed to build authenticator")
    }

    #[test]
    fn test_authenticate_success() {
        let authenticator = authenticator(Some(Duration::minutes(5)));

        let password = "my_password";
        let hash = authenticator
            .hash_password(password)
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate(password, &hash, "ann")
            .expect("Authentication failed");
        assert!(!result.access_token.is_empty());

        let claims = authenticator
            .validate_token(&result.access_token)
            .expect("Token validation failed");
        assert_eq!(claims.subject(), Some("ann"));

        let lifetime = claims.exp.unwrap() - claims.iat.unwrap();
        assert_eq!(lifetime, 5 * 60);
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = authenticator(None);

        let hash = authenticator.hash_password("my_password").unwrap();

        let result = authenticator.authenticate("wrong_password", &hash, "ann");
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_authenticate_corrupt_hash_is_invalid_credentials() {
        let authenticator = authenticator(None);

        let result = authenticator.authenticate("my_password", "not-a-phc-string", "ann");
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_issue_token_without_ttl_never_expires() {
        let authenticator = authenticator(None);

        let token = authenticator.issue_token("ann").unwrap();
        let claims = authenticator.validate_token(&token).unwrap();

        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_validate_invalid_token() {
        let authenticator = authenticator(None);

        let result = authenticator.validate_token("invalid.token.here");
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }
}
