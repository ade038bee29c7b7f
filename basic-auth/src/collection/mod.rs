//! Credential collections.
//!
//! A [`CredentialCollection`] maps user keys to Basic-Auth tokens and keeps the
//! usernames embedded in those tokens unique. Two backends implement it:
//!
//! - [`MemoryCredentialsCollection`]: a process-local map behind one lock
//! - [`DbCredentialsCollection`]: SQLite, one transaction per operation
//!
//! Both report the same errors for the same inputs, so callers can swap them
//! without noticing.

mod database;
mod memory;
mod types;

pub use database::DbCredentialsCollection;
pub use memory::MemoryCredentialsCollection;
pub use types::{CredentialDetails, CredentialRecord, CredentialSummary, DateRange};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::Result;
use crate::config::{BackendKind, StoreConfig};

/// Keyed collection of Basic-Auth credentials.
#[async_trait]
pub trait CredentialCollection: Send + Sync {
    /// Store credentials for a new user.
    ///
    /// The token's password component is hashed before storage; without a token,
    /// random credentials are generated. Fails with `AlreadyExists` for a known
    /// user and `InvalidDetails` for a malformed token or a username owned by
    /// another user.
    async fn create(&self, details: CredentialDetails) -> Result<CredentialRecord>;

    /// Fetch the stored token of a user, or `NotFound`.
    async fn get(&self, user: &str) -> Result<CredentialRecord>;

    /// List users and usernames whose last update falls within `range`.
    async fn get_all(&self, range: DateRange) -> Result<Vec<CredentialSummary>>;

    /// Replace the credentials of a known user, with the same token rules as `create`.
    async fn update(&self, user: &str, token: Option<&str>) -> Result<CredentialRecord>;

    /// Remove the credentials of a user, or `NotFound`.
    async fn delete(&self, user: &str) -> Result<()>;

    /// Whether some stored credential has this username and password.
    async fn credentials_match(&self, username: &str, password: &str) -> Result<bool>;

    /// Whether the pair matches the configured API credentials.
    async fn api_credentials_match(&self, username: &str, password: &str) -> Result<bool>;
}

/// Build the collection selected by the configuration.
pub async fn open_collection(config: &StoreConfig) -> Result<Arc<dyn CredentialCollection>> {
    match config.backend {
        BackendKind::Memory => {
            info!("Using in-memory credentials collection");
            Ok(Arc::new(MemoryCredentialsCollection::new(
                config.api_credentials.clone(),
            )))
        }
        BackendKind::Sqlite => {
            let pool =
                crate::database::init_pool_with_size(&config.database_url, config.max_connections)
                    .await?;
            crate::database::run_migrations(&pool).await?;

            let collection = DbCredentialsCollection::new(pool);
            collection
                .sync_api_credentials(config.api_credentials.as_ref())
                .await?;
            info!("Using database credentials collection");
            Ok(Arc::new(collection))
        }
    }
}
