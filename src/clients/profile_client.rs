use tracing::{debug, instrument};

use crate::domain::{ProfileCreate, ProfilePatch, UserProfile};
use crate::error::ProfileError;
use crate::store::StoreClient;

/// Client for the user-profile collection.
///
/// No delete method on purpose: the system never deletes profiles.
#[derive(Clone)]
pub struct ProfileClient {
    inner: StoreClient<UserProfile>,
}

impl ProfileClient {
    pub fn new(inner: StoreClient<UserProfile>) -> Self {
        Self { inner }
    }

    /// First-login bootstrap. The document id is the identity
    /// provider's uid carried in the payload.
    #[instrument(skip(self, payload))]
    pub async fn create_profile(&self, payload: ProfileCreate) -> Result<UserProfile, ProfileError> {
        debug!("Sending request");
        self.inner.create(payload).await.map_err(ProfileError::from)
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, id: String) -> Result<Option<UserProfile>, ProfileError> {
        debug!("Sending request");
        self.inner.get(id).await.map_err(ProfileError::from)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_profile(
        &self,
        id: String,
        patch: ProfilePatch,
    ) -> Result<UserProfile, ProfileError> {
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(ProfileError::from)
    }
}
