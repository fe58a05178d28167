//! Command handlers. Each returns `AppError` and leaves printing to
//! [`crate::render`].

pub mod account;
pub mod cart;
pub mod catalog;

use cardhub_storefront::api::CardhubClient;
use cardhub_storefront::cart::Cart;
use cardhub_storefront::config::StorefrontConfig;
use cardhub_storefront::error::AppError;
use cardhub_storefront::session::AuthSession;
use cardhub_storefront::storage::FileStorage;

/// What every command needs: the API client and the state directory.
#[derive(Debug, Clone)]
pub struct Context {
    pub client: CardhubClient,
    pub storage: FileStorage,
}

impl Context {
    pub fn new(config: &StorefrontConfig) -> Result<Self, AppError> {
        let client = CardhubClient::new(&config.api)?;
        let storage = FileStorage::open(&config.state_dir)?;
        tracing::debug!(
            base_url = %client.base_url(),
            state_dir = %storage.dir().display(),
            "Context ready"
        );
        Ok(Self { client, storage })
    }

    pub fn cart(&self) -> Result<Cart<&FileStorage>, AppError> {
        Ok(Cart::load(&self.storage)?)
    }

    pub fn session(&self) -> AuthSession<&FileStorage> {
        AuthSession::new(self.client.clone(), &self.storage)
    }
}
