//! Transactional operations for credentials.
//!
//! These methods operate within an existing transaction and do NOT commit.
//! The caller is responsible for committing or rolling back the transaction.

use sqlx::SqliteConnection;

use crate::collection::DateRange;
use crate::credentials::Credentials;
use crate::database::models::{ApiCredentialDbModel, CredentialDbModel};
use crate::database::time::now_ms;
use crate::{Error, Result};

/// Transactional operations for credentials.
pub struct CredentialTxOps;

impl CredentialTxOps {
    /// Whether a credential row exists for the user.
    pub async fn is_known_user(tx: &mut SqliteConnection, user: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM credentials WHERE user_id = ?")
            .bind(user)
            .fetch_optional(tx)
            .await?;
        Ok(row.is_some())
    }

    pub async fn get_credentials_by_user(
        tx: &mut SqliteConnection,
        user: &str,
    ) -> Result<Option<CredentialDbModel>> {
        let credentials =
            sqlx::query_as::<_, CredentialDbModel>("SELECT * FROM credentials WHERE user_id = ?")
                .bind(user)
                .fetch_optional(tx)
                .await?;
        Ok(credentials)
    }

    pub async fn get_credentials_by_username(
        tx: &mut SqliteConnection,
        username: &str,
    ) -> Result<Option<CredentialDbModel>> {
        let credentials =
            sqlx::query_as::<_, CredentialDbModel>("SELECT * FROM credentials WHERE username = ?")
                .bind(username)
                .fetch_optional(tx)
                .await?;
        Ok(credentials)
    }

    pub async fn get_api_credentials(
        tx: &mut SqliteConnection,
        username: &str,
    ) -> Result<Option<ApiCredentialDbModel>> {
        let credentials = sqlx::query_as::<_, ApiCredentialDbModel>(
            "SELECT * FROM api_credentials WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(tx)
        .await?;
        Ok(credentials)
    }

    /// Insert credentials for a new user.
    pub async fn add_credentials(
        tx: &mut SqliteConnection,
        user: &str,
        credentials: &Credentials,
    ) -> Result<CredentialDbModel> {
        let model = CredentialDbModel::new(user, credentials, now_ms());
        sqlx::query(
            r#"
            INSERT INTO credentials (user_id, username, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&model.user_id)
        .bind(&model.username)
        .bind(&model.password_hash)
        .bind(model.created_at)
        .bind(model.updated_at)
        .execute(tx)
        .await
        .map_err(map_unique_violation)?;
        Ok(model)
    }

    /// Replace the credentials of an existing user.
    ///
    /// Returns the number of rows affected.
    pub async fn update_credentials(
        tx: &mut SqliteConnection,
        user: &str,
        credentials: &Credentials,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE credentials SET username = ?, password_hash = ?, updated_at = ? WHERE user_id = ?",
        )
        .bind(&credentials.username)
        .bind(&credentials.password_hash)
        .bind(now_ms())
        .bind(user)
        .execute(tx)
        .await
        .map_err(map_unique_violation)?;
        Ok(result.rows_affected())
    }

    /// Delete the credentials of a user. Returns whether a row was removed.
    pub async fn remove_credentials(tx: &mut SqliteConnection, user: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM credentials WHERE user_id = ?")
            .bind(user)
            .execute(tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List credentials whose last update falls within the range, ordered by user.
    pub async fn get_all_credentials(
        tx: &mut SqliteConnection,
        range: &DateRange,
    ) -> Result<Vec<CredentialDbModel>> {
        let start = range.start_ms();
        let end = range.end_ms();
        let credentials = sqlx::query_as::<_, CredentialDbModel>(
            r#"
            SELECT * FROM credentials
            WHERE (? IS NULL OR updated_at >= ?)
              AND (? IS NULL OR updated_at <= ?)
            ORDER BY user_id
            "#,
        )
        .bind(start)
        .bind(start)
        .bind(end)
        .bind(end)
        .fetch_all(tx)
        .await?;
        Ok(credentials)
    }

    /// Replace the stored API credentials with the given pair, or clear them.
    pub async fn replace_api_credentials(
        tx: &mut SqliteConnection,
        credentials: Option<&Credentials>,
    ) -> Result<()> {
        sqlx::query("DELETE FROM api_credentials")
            .execute(&mut *tx)
            .await?;

        if let Some(credentials) = credentials {
            sqlx::query(
                "INSERT INTO api_credentials (username, password_hash, created_at) VALUES (?, ?, ?)",
            )
            .bind(&credentials.username)
            .bind(&credentials.password_hash)
            .bind(now_ms())
            .execute(&mut *tx)
            .await?;
        }

        Ok(())
    }
}

/// Report a violated `UNIQUE(username)` constraint as a caller error.
fn map_unique_violation(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Error::invalid_details("Token username already in use")
        }
        _ => Error::DatabaseSqlx(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{DbPool, init_pool, run_migrations};
    use chrono::{Duration, Utc};

    async fn setup_test_db() -> DbPool {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_add_and_get_credentials() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();

        let creds = Credentials::new("alice_login", "secret");
        CredentialTxOps::add_credentials(&mut tx, "alice", &creds)
            .await
            .unwrap();

        assert!(CredentialTxOps::is_known_user(&mut tx, "alice").await.unwrap());
        assert!(!CredentialTxOps::is_known_user(&mut tx, "bob").await.unwrap());

        let by_user = CredentialTxOps::get_credentials_by_user(&mut tx, "alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_user.credentials(), creds);

        let by_username = CredentialTxOps::get_credentials_by_username(&mut tx, "alice_login")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_username.user_id, "alice");
        assert!(by_username.password_match("secret"));

        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_unique_username_constraint() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();

        let creds = Credentials::new("shared", "secret");
        CredentialTxOps::add_credentials(&mut tx, "alice", &creds)
            .await
            .unwrap();
        let err = CredentialTxOps::add_credentials(&mut tx, "bob", &creds)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidDetails(_)));
    }

    #[tokio::test]
    async fn test_update_and_remove_credentials() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();

        CredentialTxOps::add_credentials(&mut tx, "alice", &Credentials::new("a", "one"))
            .await
            .unwrap();

        let affected =
            CredentialTxOps::update_credentials(&mut tx, "alice", &Credentials::new("b", "two"))
                .await
                .unwrap();
        assert_eq!(affected, 1);

        let updated = CredentialTxOps::get_credentials_by_user(&mut tx, "alice")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "b");
        assert!(updated.password_match("two"));

        let missing =
            CredentialTxOps::update_credentials(&mut tx, "nobody", &Credentials::new("c", "x"))
                .await
                .unwrap();
        assert_eq!(missing, 0);

        assert!(CredentialTxOps::remove_credentials(&mut tx, "alice").await.unwrap());
        assert!(!CredentialTxOps::remove_credentials(&mut tx, "alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_all_credentials_date_range() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();

        for (user, username) in [("b", "b_login"), ("a", "a_login")] {
            CredentialTxOps::add_credentials(&mut tx, user, &Credentials::new(username, "pw"))
                .await
                .unwrap();
        }

        let all = CredentialTxOps::get_all_credentials(&mut tx, &DateRange::default())
            .await
            .unwrap();
        let users: Vec<&str> = all.iter().map(|c| c.user_id.as_str()).collect();
        assert_eq!(users, vec!["a", "b"]);

        let future = DateRange::new(Some(Utc::now() + Duration::hours(1)), None);
        assert!(
            CredentialTxOps::get_all_credentials(&mut tx, &future)
                .await
                .unwrap()
                .is_empty()
        );

        let past = DateRange::new(None, Some(Utc::now() - Duration::hours(1)));
        assert!(
            CredentialTxOps::get_all_credentials(&mut tx, &past)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_replace_api_credentials() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();

        let svc = Credentials::new("svc", "token");
        CredentialTxOps::replace_api_credentials(&mut tx, Some(&svc))
            .await
            .unwrap();
        let stored = CredentialTxOps::get_api_credentials(&mut tx, "svc")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.password_match("token"));

        CredentialTxOps::replace_api_credentials(&mut tx, None)
            .await
            .unwrap();
        assert!(
            CredentialTxOps::get_api_credentials(&mut tx, "svc")
                .await
                .unwrap()
                .is_none()
        );
    }
}
