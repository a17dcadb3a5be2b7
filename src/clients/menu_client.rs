use tracing::{debug, instrument};

use crate::domain::{CategoryCreate, CategoryPatch, MenuCategory};
use crate::error::MenuError;
use crate::store::StoreClient;

/// Client for the menu collection. Plain CRUD; categories come back in
/// display-position order.
#[derive(Clone)]
pub struct MenuClient {
    inner: StoreClient<MenuCategory>,
}

impl MenuClient {
    pub fn new(inner: StoreClient<MenuCategory>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self, payload))]
    pub async fn create_category(&self, payload: CategoryCreate) -> Result<MenuCategory, MenuError> {
        debug!("Sending request");
        self.inner.create(payload).await.map_err(MenuError::from)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_category(
        &self,
        id: String,
        patch: CategoryPatch,
    ) -> Result<MenuCategory, MenuError> {
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(MenuError::from)
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<MenuCategory>, MenuError> {
        debug!("Sending request");
        self.inner.query(()).await.map_err(MenuError::from)
    }
}

crate::impl_client_methods!(MenuClient, MenuCategory, MenuError, category);
