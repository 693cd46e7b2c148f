use async_trait::async_trait;

use crate::identity::errors::AuthError;
use crate::identity::errors::StoreError;
use crate::identity::models::AuthToken;
use crate::identity::models::AuthenticateCommand;
use crate::identity::models::Identity;
use crate::identity::models::RegisterCommand;
use crate::identity::models::Username;

/// Port for registration and login.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new identity and issue its first token.
    ///
    /// # Arguments
    /// * `command` - Validated username, optional names and plaintext password
    ///
    /// # Returns
    /// Signed bearer token for the new identity
    ///
    /// # Errors
    /// * `UsernameTaken` - Username is already registered
    /// * `StoreUnavailable` - Credential store failed or timed out
    async fn register(&self, command: RegisterCommand) -> Result<AuthToken, AuthError>;

    /// Verify username and password and issue a token.
    ///
    /// # Arguments
    /// * `command` - Username and plaintext password
    ///
    /// # Returns
    /// Signed bearer token
    ///
    /// # Errors
    /// * `UserNotFound` - No identity with this username
    /// * `InvalidCredentials` - Password does not match
    /// * `StoreUnavailable` - Credential store failed or timed out
    async fn authenticate(&self, command: AuthenticateCommand) -> Result<AuthToken, AuthError>;
}

/// Read access to identities by username.
///
/// This is all the request gate needs to re-resolve a token's subject.
#[async_trait]
pub trait IdentityResolver: Send + Sync + 'static {
    /// Retrieve identity by username.
    ///
    /// # Returns
    /// Optional identity (None if not found)
    ///
    /// # Errors
    /// * `Unavailable` - Storage operation failed
    async fn find_by_username(&self, username: &Username) -> Result<Option<Identity>, StoreError>;
}

/// Persistence for identity records.
///
/// Implementations are the source of truth for username uniqueness: of two
/// concurrent saves with the same username exactly one succeeds.
#[async_trait]
pub trait CredentialStore: IdentityResolver {
    /// Persist a new identity.
    ///
    /// # Returns
    /// Stored identity
    ///
    /// # Errors
    /// * `DuplicateUsername` - Username is already taken
    /// * `Unavailable` - Storage operation failed
    async fn save(&self, identity: Identity) -> Result<Identity, StoreError>;
}
