use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::identity::errors::StoreError;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::Username;
use crate::domain::identity::ports::CredentialStore;
use crate::domain::identity::ports::IdentityResolver;

/// Credential store kept in process memory.
///
/// Used when no database is configured and by the integration tests.
/// Contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    /// Map of username -> Identity
    identities: Arc<RwLock<HashMap<Username, Identity>>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.identities.read().await.is_empty()
    }
}

#[async_trait]
impl IdentityResolver for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &Username) -> Result<Option<Identity>, StoreError> {
        Ok(self.identities.read().await.get(username).cloned())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn save(&self, identity: Identity) -> Result<Identity, StoreError> {
        // Check and insert under one write lock so concurrent saves of the
        // same username cannot both succeed.
        match self.identities.write().await.entry(identity.username.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateUsername(
                identity.username.as_str().to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(identity.clone());
                tracing::debug!(username = %identity.username, "Identity stored in memory");
                Ok(identity)
            }
        }
    }
}
