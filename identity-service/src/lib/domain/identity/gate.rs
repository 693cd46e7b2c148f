use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::JwtError;

use crate::identity::errors::AuthError;
use crate::identity::models::CallerIdentity;
use crate::identity::models::Username;
use crate::identity::ports::IdentityResolver;
use crate::identity::service::within_timeout;

/// Result of running the gate over one inbound call.
#[derive(Debug)]
pub enum GateOutcome {
    /// No bearer token: the call continues without an identity.
    Anonymous,
    /// Token verified and its subject still exists.
    Authenticated(CallerIdentity),
    /// Token present but unusable. The call must not reach a handler.
    Rejected(AuthError),
}

/// Per-call token validation.
///
/// Turns the value of a call's `Authorization` header into a
/// [`GateOutcome`]. Holds no mutable state; one instance serves every call.
pub struct RequestGate<R>
where
    R: IdentityResolver,
{
    resolver: Arc<R>,
    authenticator: Arc<Authenticator>,
    store_timeout: Duration,
}

impl<R> RequestGate<R>
where
    R: IdentityResolver,
{
    pub const BEARER_PREFIX: &'static str = "Bearer ";

    pub fn new(resolver: Arc<R>, authenticator: Arc<Authenticator>, store_timeout: Duration) -> Self {
        Self {
            resolver,
            authenticator,
            store_timeout,
        }
    }

    /// Validate the credential carried by a call.
    ///
    /// # Arguments
    /// * `authorization` - Raw `Authorization` header value, if any
    ///
    /// # Returns
    /// * `Anonymous` - Header missing or not using the bearer scheme
    /// * `Authenticated` - Signature, expiry and subject all check out
    /// * `Rejected` - Any token or lookup failure
    pub async fn intercept(&self, authorization: Option<&str>) -> GateOutcome {
        let Some(token) = authorization.and_then(|value| value.strip_prefix(Self::BEARER_PREFIX))
        else {
            return GateOutcome::Anonymous;
        };

        match self.resolve(token.trim()).await {
            Ok(caller) => GateOutcome::Authenticated(caller),
            Err(e) => GateOutcome::Rejected(e),
        }
    }

    async fn resolve(&self, token: &str) -> Result<CallerIdentity, AuthError> {
        let claims = self.authenticator.validate_token(token)?;

        let subject = claims
            .subject()
            .ok_or_else(|| JwtError::Malformed("missing 'sub' claim".to_string()))?;

        // A correctly signed subject that is no longer a valid username cannot
        // belong to any stored identity.
        let username = Username::new(subject.to_string())
            .map_err(|_| AuthError::UserNotFound(subject.to_string()))?;

        let identity =
            within_timeout(self.store_timeout, self.resolver.find_by_username(&username))
                .await?
                .ok_or_else(|| AuthError::UserNotFound(username.to_string()))?;

        Ok(CallerIdentity::from(&identity))
    }
}
