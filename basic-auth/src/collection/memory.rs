//! In-memory credential collection.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{
    CredentialCollection, CredentialDetails, CredentialRecord, CredentialSummary, DateRange,
};
use crate::config::ApiCredentials;
use crate::credentials::{Credentials, hash_password, resolve_credentials};
use crate::database::time::now_ms;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct StoredCredential {
    credentials: Credentials,
    created_at: i64,
    updated_at: i64,
}

impl StoredCredential {
    fn to_record(&self, user: &str) -> CredentialRecord {
        CredentialRecord {
            user: user.to_string(),
            token: self.credentials.token(),
        }
    }
}

/// Credentials held in a process-local ordered map.
///
/// Every operation holds the single lock for its whole body, so operations run
/// one at a time and the username check cannot race with the write after it.
pub struct MemoryCredentialsCollection {
    items: Mutex<BTreeMap<String, StoredCredential>>,
    api_credentials: Option<ApiCredentials>,
}

impl MemoryCredentialsCollection {
    pub fn new(api_credentials: Option<ApiCredentials>) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            api_credentials,
        }
    }
}

impl Default for MemoryCredentialsCollection {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Fail if a user other than `user` already owns `username`.
fn check_duplicated_username(
    items: &BTreeMap<String, StoredCredential>,
    user: &str,
    username: &str,
) -> Result<()> {
    let taken = items
        .iter()
        .any(|(other_user, stored)| stored.credentials.username == username && other_user != user);
    if taken {
        return Err(Error::invalid_details("Token username already in use"));
    }
    Ok(())
}

#[async_trait]
impl CredentialCollection for MemoryCredentialsCollection {
    async fn create(&self, details: CredentialDetails) -> Result<CredentialRecord> {
        let mut items = self.items.lock().await;

        if details.user.is_empty() {
            return Err(Error::invalid_details("User must not be empty"));
        }
        if items.contains_key(&details.user) {
            return Err(Error::already_exists(details.user));
        }

        let credentials = resolve_credentials(details.token.as_deref())?;
        check_duplicated_username(&items, &details.user, &credentials.username)?;

        let now = now_ms();
        let stored = StoredCredential {
            credentials,
            created_at: now,
            updated_at: now,
        };
        let record = stored.to_record(&details.user);
        items.insert(details.user, stored);

        info!("credentials added: {}", record.user);
        Ok(record)
    }

    async fn get(&self, user: &str) -> Result<CredentialRecord> {
        let items = self.items.lock().await;
        let stored = items.get(user).ok_or_else(|| Error::not_found(user))?;
        debug!("credentials retrieved: {}", user);
        Ok(stored.to_record(user))
    }

    async fn get_all(&self, range: DateRange) -> Result<Vec<CredentialSummary>> {
        let items = self.items.lock().await;
        info!("credentials listed");
        Ok(items
            .iter()
            .filter(|(_, stored)| range.contains_ms(stored.updated_at))
            .map(|(user, stored)| CredentialSummary {
                user: user.clone(),
                username: stored.credentials.username.clone(),
            })
            .collect())
    }

    async fn update(&self, user: &str, token: Option<&str>) -> Result<CredentialRecord> {
        let mut items = self.items.lock().await;

        if !items.contains_key(user) {
            return Err(Error::not_found(user));
        }

        let credentials = resolve_credentials(token)?;
        check_duplicated_username(&items, user, &credentials.username)?;

        let stored = items.get_mut(user).ok_or_else(|| Error::not_found(user))?;
        stored.credentials = credentials;
        stored.updated_at = now_ms();

        info!("credentials updated: {}", user);
        Ok(stored.to_record(user))
    }

    async fn delete(&self, user: &str) -> Result<()> {
        let mut items = self.items.lock().await;
        items.remove(user).ok_or_else(|| Error::not_found(user))?;
        info!("credentials deleted: {}", user);
        Ok(())
    }

    async fn credentials_match(&self, username: &str, password: &str) -> Result<bool> {
        let items = self.items.lock().await;
        let candidate = Credentials {
            username: username.to_string(),
            password_hash: hash_password(password),
        };
        Ok(items.values().any(|stored| stored.credentials == candidate))
    }

    async fn api_credentials_match(&self, username: &str, password: &str) -> Result<bool> {
        Ok(self
            .api_credentials
            .as_ref()
            .is_some_and(|api| api.matches(username, password)))
    }
}
