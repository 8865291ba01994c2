use std::sync::Arc;

use prep_core::model::{CredentialsDraft, UserIdentity};
use storage::repository::BlobRepository;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::remote::RemoteAuthGateway;

/// Blob key holding the signed-in identity.
pub const IDENTITY_KEY: &str = "prep-meter-user";

/// Signs the learner in against the remote backend, or locally when none is configured.
#[derive(Clone)]
pub struct AuthService {
    blobs: Arc<dyn BlobRepository>,
    remote: Option<Arc<dyn RemoteAuthGateway>>,
}

impl AuthService {
    #[must_use]
    pub fn new(
        blobs: Arc<dyn BlobRepository>,
        remote: Option<Arc<dyn RemoteAuthGateway>>,
    ) -> Self {
        Self { blobs, remote }
    }

    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Validate credentials, authenticate, and remember the identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Credentials` before any I/O when input is incomplete,
    /// `AuthError::Remote` when the backend rejects the request, and
    /// `AuthError::Storage` if the identity cannot be persisted.
    pub async fn sign_in(&self, draft: CredentialsDraft) -> Result<UserIdentity, AuthError> {
        let credentials = draft.validate_sign_in()?;
        let identity = match self.remote.as_ref() {
            Some(remote) => remote.sign_in(&credentials).await?,
            None => UserIdentity::local(&credentials),
        };
        self.remember(&identity).await?;
        info!(user = %identity.id, local = identity.is_local(), "signed in");
        Ok(identity)
    }

    /// Validate sign-up input, create the account, and remember the identity.
    ///
    /// # Errors
    ///
    /// Same as [`Self::sign_in`]; sign-up additionally requires a name and a
    /// password of at least six characters.
    pub async fn sign_up(&self, draft: CredentialsDraft) -> Result<UserIdentity, AuthError> {
        let credentials = draft.validate_sign_up()?;
        let identity = match self.remote.as_ref() {
            Some(remote) => remote.sign_up(&credentials).await?,
            None => UserIdentity::local(&credentials),
        };
        self.remember(&identity).await?;
        info!(user = %identity.id, local = identity.is_local(), "signed up");
        Ok(identity)
    }

    /// Forget the stored identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the blob cannot be removed.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.blobs.delete_blob(IDENTITY_KEY).await?;
        Ok(())
    }

    /// The remembered identity, if any. A malformed record reads as signed out.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the blob store cannot be read.
    pub async fn current_user(&self) -> Result<Option<UserIdentity>, AuthError> {
        let Some(blob) = self.blobs.get_blob(IDENTITY_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&blob) {
            Ok(identity) => Ok(Some(identity)),
            Err(err) => {
                warn!(error = %err, "stored identity is malformed, treating as signed out");
                Ok(None)
            }
        }
    }

    async fn remember(&self, identity: &UserIdentity) -> Result<(), AuthError> {
        let blob = serde_json::to_string(identity).map_err(|err| {
            storage::repository::StorageError::Serialization(err.to_string())
        })?;
        self.blobs.put_blob(IDENTITY_KEY, &blob).await?;
        Ok(())
    }
}
