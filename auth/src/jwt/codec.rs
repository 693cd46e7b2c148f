use std::fmt;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;

/// Signs and parses compact JWTs (`header.payload.signature`, each part
/// base64url encoded).
///
/// Uses HS256 (HMAC with SHA-256) with a server-held secret. The codec is
/// immutable after construction and safe to share across tasks.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl TokenCodec {
    /// Minimum secret length for HS256 (256 bits).
    pub const MIN_SECRET_LENGTH: usize = 32;

    /// Create a new token codec with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    ///
    /// # Errors
    /// * `WeakSecret` - Secret is shorter than 32 bytes
    ///
    /// # Security Notes
    /// - Store secrets in environment variables or secure vaults, never in code
    /// - The secret is never logged; `Debug` output redacts it
    pub fn new(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.len() < Self::MIN_SECRET_LENGTH {
            return Err(JwtError::WeakSecret {
                min: Self::MIN_SECRET_LENGTH,
                actual: secret.len(),
            });
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        })
    }

    /// Issue a signed token for `subject`.
    ///
    /// # Arguments
    /// * `subject` - Username the token authenticates
    /// * `claims` - Additional claims; `sub`, `iat` and `exp` are overwritten
    /// * `ttl` - Lifetime of the token, `None` for a token without `exp`
    ///
    /// # Errors
    /// * `EncodingFailed` - Serialization or signing failed
    pub fn issue(
        &self,
        subject: &str,
        claims: Claims,
        ttl: Option<Duration>,
    ) -> Result<String, JwtError> {
        self.issue_at(subject, claims, ttl, Utc::now())
    }

    /// Same as [`TokenCodec::issue`] with an explicit issue time.
    pub fn issue_at(
        &self,
        subject: &str,
        claims: Claims,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> Result<String, JwtError> {
        let claims = claims.stamped(subject, now, ttl);
        let header = Header::new(self.algorithm);

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// The signature is checked before the payload is deserialized, and
    /// expiry is checked against the current time with no leeway.
    ///
    /// # Errors
    /// * `Malformed` - Token structure, encoding, algorithm or `sub` is invalid
    /// * `InvalidSignature` - Signature does not match header and payload
    /// * `Expired` - `exp` is present and in the past
    pub fn parse(&self, token: &str) -> Result<Claims, JwtError> {
        self.parse_at(token, Utc::now().timestamp())
    }

    /// Same as [`TokenCodec::parse`] with an explicit current Unix timestamp.
    pub fn parse_at(&self, token: &str, now: i64) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against `now` so callers control the clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        // `aud` may ride along in `extra`; no audience is enforced.
        validation.validate_aud = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Malformed(e.to_string()),
            })?;

        if claims.subject().map_or(true, str::is_empty) {
            return Err(JwtError::Malformed("missing 'sub' claim".to_string()));
        }

        if claims.is_expired(now) {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
