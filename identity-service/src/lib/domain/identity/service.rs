use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Utc;

use crate::identity::errors::AuthError;
use crate::identity::errors::StoreError;
use crate::identity::models::AuthToken;
use crate::identity::models::AuthenticateCommand;
use crate::identity::models::Identity;
use crate::identity::models::IdentityId;
use crate::identity::models::RegisterCommand;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;

/// Domain service for registration and login.
///
/// Coordinates the credential store with the password hasher and token
/// codec held by the [`Authenticator`].
pub struct IdentityService<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    authenticator: Arc<Authenticator>,
    store_timeout: Duration,
}

impl<S> IdentityService<S>
where
    S: CredentialStore,
{
    /// Create a new identity service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential store implementation
    /// * `authenticator` - Hashing policy and token codec
    /// * `store_timeout` - Upper bound for every store call
    pub fn new(store: Arc<S>, authenticator: Arc<Authenticator>, store_timeout: Duration) -> Self {
        Self {
            store,
            authenticator,
            store_timeout,
        }
    }
}

/// Run a store operation, turning an elapsed `timeout` into `StoreUnavailable`.
pub(crate) async fn within_timeout<T>(
    timeout: Duration,
    operation: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, AuthError> {
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result.map_err(AuthError::from),
        Err(_) => {
            tracing::error!(timeout_ms = timeout.as_millis() as u64, "Credential store call timed out");
            Err(AuthError::StoreUnavailable(
                "credential store call timed out".to_string(),
            ))
        }
    }
}

#[async_trait]
impl<S> AuthServicePort for IdentityService<S>
where
    S: CredentialStore,
{
    async fn register(&self, command: RegisterCommand) -> Result<AuthToken, AuthError> {
        let RegisterCommand {
            first_name,
            last_name,
            username,
            password,
        } = command;

        if within_timeout(self.store_timeout, self.store.find_by_username(&username))
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }

        let password_hash = self.authenticator.hash_password(&password)?;
        drop(password);

        let identity = Identity {
            id: IdentityId::new(),
            first_name,
            last_name,
            username,
            password_hash,
            created_at: Utc::now(),
        };

        // Signed before saving: a signing failure must not leave a stored record behind.
        let token = self.authenticator.issue_token(identity.username.as_str())?;

        let saved = within_timeout(self.store_timeout, self.store.save(identity)).await?;

        tracing::info!(
            identity_id = %saved.id,
            username = %saved.username,
            "Identity registered"
        );

        Ok(AuthToken::new(token))
    }

    async fn authenticate(&self, command: AuthenticateCommand) -> Result<AuthToken, AuthError> {
        let identity =
            within_timeout(self.store_timeout, self.store.find_by_username(&command.username))
                .await?;

        let Some(identity) = identity else {
            self.authenticator.verify_against_decoy(&command.password);
            return Err(AuthError::UserNotFound(command.username.to_string()));
        };

        let result = self
            .authenticator
            .authenticate(
                &command.password,
                &identity.password_hash,
                identity.username.as_str(),
            )
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => AuthError::InvalidCredentials,
                AuthenticationError::JwtError(err) => AuthError::Token(err),
            })?;

        tracing::debug!(username = %identity.username, "Identity authenticated");

        Ok(AuthToken::new(result.access_token))
    }
}

#[cfg(test)]
mod tests {
    use auth::PasswordHasher;
    use auth::TokenCodec;
    use mockall::mock;

    use super::*;
    use crate::identity::models::Username;
    use crate::identity::ports::IdentityResolver;

    mock! {
        pub TestCredentialStore {}

        #[async_trait]
        impl IdentityResolver for TestCredentialStore {
            async fn find_by_username(&self, username: &Username) -> Result<Option<Identity>, StoreError>;
        }

        #[async_trait]
        impl CredentialStore for TestCredentialStore {
            async fn save(&self, identity: Identity) -> Result<Identity, StoreError>;
        }
    }

    /// Store that never answers within any reasonable timeout.
    struct StalledStore;

    #[async_trait]
    impl IdentityResolver for StalledStore {
        async fn find_by_username(
            &self,
            _username: &Username,
        ) -> Result<Option<Identity>, StoreError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(None)
        }
    }

    #[async_trait]
    impl CredentialStore for StalledStore {
        async fn save(&self, identity: Identity) -> Result<Identity, StoreError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(identity)
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        Arc::new(
            Authenticator::new(
                PasswordHasher::with_params(64, 1, 1).unwrap(),
                TokenCodec::new(b"test_secret_key_at_least_32_bytes!").unwrap(),
                Some(chrono::Duration::hours(1)),
            )
            .unwrap(),
        )
    }

    fn service<S: CredentialStore>(store: S, authenticator: Arc<Authenticator>) -> IdentityService<S> {
        IdentityService::new(Arc::new(store), authenticator, Duration::from_secs(5))
    }

    fn stored_identity(authenticator: &Authenticator, username: &str, password: &str) -> Identity {
        Identity {
            id: IdentityId::new(),
            first_name: Some("Ann".to_string()),
            last_name: Some("Lee".to_string()),
            username: Username::new(username.to_string()).unwrap(),
            password_hash: authenticator.hash_password(password).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn register_command(username: &str, password: &str) -> RegisterCommand {
        RegisterCommand::new(
            Some("Ann".to_string()),
            Some("Lee".to_string()),
            Username::new(username.to_string()).unwrap(),
            password.to_string(),
        )
    }

    fn authenticate_command(username: &str, password: &str) -> AuthenticateCommand {
        AuthenticateCommand::new(
            Username::new(username.to_string()).unwrap(),
            password.to_string(),
        )
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut store = MockTestCredentialStore::new();
        let authenticator = authenticator();

        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));
        store
            .expect_save()
            .withf(|identity| {
                identity.username.as_str() == "ann"
                    && identity.first_name.as_deref() == Some("Ann")
                    && identity.last_name.as_deref() == Some("Lee")
                    && identity.password_hash.starts_with("$argon2id")
                    && !identity.password_hash.contains("pw123")
            })
            .times(1)
            .returning(|identity| Ok(identity));

        let service = service(store, Arc::clone(&authenticator));

        let token = service
            .register(register_command("ann", "pw123"))
            .await
            .expect("Registration failed");

        let claims = authenticator.validate_token(token.as_str()).unwrap();
        assert_eq!(claims.subject(), Some("ann"));
    }

    #[tokio::test]
    async fn test_register_username_taken() {
        let mut store = MockTestCredentialStore::new();
        let authenticator = authenticator();
        let existing = stored_identity(&authenticator, "ann", "pw123");

        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        store.expect_save().times(0);

        let service = service(store, authenticator);

        let result = service.register(register_command("ann", "other")).await;
        assert!(matches!(result, Err(AuthError::UsernameTaken(u)) if u == "ann"));
    }

    #[tokio::test]
    async fn test_register_duplicate_detected_by_store() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));
        store.expect_save().times(1).returning(|identity| {
            Err(StoreError::DuplicateUsername(
                identity.username.as_str().to_string(),
            ))
        });

        let service = service(store, authenticator());

        let result = service.register(register_command("ann", "pw123")).await;
        assert!(matches!(result, Err(AuthError::UsernameTaken(_))));
    }

    #[tokio::test]
    async fn test_register_store_unavailable() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("connection refused".to_string())));
        store.expect_save().times(0);

        let service = service(store, authenticator());

        let result = service.register(register_command("ann", "pw123")).await;
        assert!(matches!(result, Err(AuthError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let mut store = MockTestCredentialStore::new();
        let authenticator = authenticator();
        let existing = stored_identity(&authenticator, "ann", "pw123");

        store
            .expect_find_by_username()
            .withf(|username| username.as_str() == "ann")
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));

        let service = service(store, Arc::clone(&authenticator));

        let token = service
            .authenticate(authenticate_command("ann", "pw123"))
            .await
            .expect("Authentication failed");

        let claims = authenticator.validate_token(token.as_str()).unwrap();
        assert_eq!(claims.subject(), Some("ann"));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let mut store = MockTestCredentialStore::new();
        let authenticator = authenticator();
        let existing = stored_identity(&authenticator, "ann", "pw123");

        store
            .expect_find_by_username()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));

        let service = service(store, authenticator);

        let result = service
            .authenticate(authenticate_command("ann", "wrong"))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let mut store = MockTestCredentialStore::new();

        store
            .expect_find_by_username()
            .times(1)
            .returning(|_| Ok(None));

        let service = service(store, authenticator());

        let result = service
            .authenticate(authenticate_command("nobody", "pw123"))
            .await;
        assert!(matches!(result, Err(AuthError::UserNotFound(u)) if u == "nobody"));
    }

    #[tokio::test]
    async fn test_store_timeout_is_store_unavailable() {
        let service = IdentityService::new(
            Arc::new(StalledStore),
            authenticator(),
            Duration::from_millis(20),
        );

        let result = service
            .authenticate(authenticate_command("ann", "pw123"))
            .await;
        assert!(matches!(result, Err(AuthError::StoreUnavailable(_))));

        let result = service.register(register_command("ann", "pw123")).await;
        assert!(matches!(result, Err(AuthError::StoreUnavailable(_))));
    }
}
