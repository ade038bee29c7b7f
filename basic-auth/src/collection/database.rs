//! SQLite-backed credential collection.

use async_trait::async_trait;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use super::{
    CredentialCollection, CredentialDetails, CredentialRecord, CredentialSummary, DateRange,
};
use crate::config::ApiCredentials;
use crate::credentials::{Credentials, resolve_credentials};
use crate::database::repositories::CredentialTxOps;
use crate::database::{DbPool, begin_immediate};
use crate::{Error, Result};

/// Credentials persisted in SQLite.
///
/// Each operation runs in its own transaction. Writes use `BEGIN IMMEDIATE`,
/// so the username check and the write that follows it hold the database
/// write lock together; the `UNIQUE(username)` constraint backs this up.
pub struct DbCredentialsCollection {
    pool: DbPool,
}

impl DbCredentialsCollection {
    /// Create a new collection over a migrated pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Replace the stored API credentials with the configured pair.
    ///
    /// `None` removes any previously stored pair.
    pub async fn sync_api_credentials(&self, api: Option<&ApiCredentials>) -> Result<()> {
        let credentials = api.map(|api| Credentials::new(api.username.clone(), &api.password));
        let mut tx = begin_immediate(&self.pool).await?;
        let result = CredentialTxOps::replace_api_credentials(&mut tx, credentials.as_ref()).await;
        tx.finish(result).await?;
        info!(
            "API credentials {}",
            if api.is_some() { "configured" } else { "cleared" }
        );
        Ok(())
    }

    async fn create_in_tx(
        tx: &mut SqliteConnection,
        details: &CredentialDetails,
    ) -> Result<CredentialRecord> {
        if details.user.is_empty() {
            return Err(Error::invalid_details("User must not be empty"));
        }
        if CredentialTxOps::is_known_user(tx, &details.user).await? {
            return Err(Error::already_exists(&details.user));
        }

        let credentials = resolve_credentials(details.token.as_deref())?;
        check_duplicated_username(tx, &details.user, &credentials.username).await?;
        let model = CredentialTxOps::add_credentials(tx, &details.user, &credentials).await?;
        Ok(model.to_record())
    }

    async fn update_in_tx(
        tx: &mut SqliteConnection,
        user: &str,
        token: Option<&str>,
    ) -> Result<CredentialRecord> {
        if !CredentialTxOps::is_known_user(tx, user).await? {
            return Err(Error::not_found(user));
        }

        let credentials = resolve_credentials(token)?;
        check_duplicated_username(tx, user, &credentials.username).await?;
        CredentialTxOps::update_credentials(tx, user, &credentials).await?;
        Ok(CredentialRecord {
            user: user.to_string(),
            token: credentials.token(),
        })
    }

    async fn delete_in_tx(tx: &mut SqliteConnection, user: &str) -> Result<()> {
        if !CredentialTxOps::remove_credentials(tx, user).await? {
            return Err(Error::not_found(user));
        }
        Ok(())
    }
}

/// Fail if a user other than `user` already owns `username`.
async fn check_duplicated_username(
    tx: &mut SqliteConnection,
    user: &str,
    username: &str,
) -> Result<()> {
    match CredentialTxOps::get_credentials_by_username(tx, username).await? {
        Some(existing) if existing.user_id != user => {
            Err(Error::invalid_details("Token username already in use"))
        }
        _ => Ok(()),
    }
}

#[async_trait]
impl CredentialCollection for DbCredentialsCollection {
    async fn create(&self, details: CredentialDetails) -> Result<CredentialRecord> {
        let mut tx = begin_immediate(&self.pool).await?;
        let result = Self::create_in_tx(&mut tx, &details).await;
        let record = tx.finish(result).await?;
        info!("credentials added: {}", record.user);
        Ok(record)
    }

    async fn get(&self, user: &str) -> Result<CredentialRecord> {
        let mut tx = self.pool.begin().await?;
        let credentials = CredentialTxOps::get_credentials_by_user(&mut tx, user).await?;
        tx.commit().await?;

        let credentials = credentials.ok_or_else(|| Error::not_found(user))?;
        debug!("credentials retrieved: {}", user);
        Ok(credentials.to_record())
    }

    async fn get_all(&self, range: DateRange) -> Result<Vec<CredentialSummary>> {
        let mut tx = self.pool.begin().await?;
        let credentials = CredentialTxOps::get_all_credentials(&mut tx, &range).await?;
        tx.commit().await?;

        info!("credentials listed");
        Ok(credentials.iter().map(|c| c.to_summary()).collect())
    }

    async fn update(&self, user: &str, token: Option<&str>) -> Result<CredentialRecord> {
        let mut tx = begin_immediate(&self.pool).await?;
        let result = Self::update_in_tx(&mut tx, user, token).await;
        let record = tx.finish(result).await?;
        info!("credentials updated: {}", user);
        Ok(record)
    }

    async fn delete(&self, user: &str) -> Result<()> {
        let mut tx = begin_immediate(&self.pool).await?;
        let result = Self::delete_in_tx(&mut tx, user).await;
        tx.finish(result).await?;
        info!("credentials deleted: {}", user);
        Ok(())
    }

    async fn credentials_match(&self, username: &str, password: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let credentials = CredentialTxOps::get_credentials_by_username(&mut tx, username).await?;
        tx.commit().await?;

        let Some(credentials) = credentials else {
            return Ok(false);
        };
        info!("credentials login attempt: {}", credentials.user_id);
        Ok(credentials.password_match(password))
    }

    async fn api_credentials_match(&self, username: &str, password: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let credentials = CredentialTxOps::get_api_credentials(&mut tx, username).await?;
        tx.commit().await?;

        Ok(credentials.is_some_and(|c| c.password_match(password)))
    }
}
