//! Credential store abstraction

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pressroom_db::{Database, DbError, NewUser, User};

/// Persistence the authentication flows depend on
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, DbError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, DbError>;

    /// Store a new account; the returned user carries the generated id
    async fn insert(&self, user: NewUser) -> Result<User, DbError>;

    /// Persist the mutable fields of an existing account
    async fn save(&self, user: &User) -> Result<User, DbError>;

    /// Stamp the last successful login
    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), DbError>;

    /// Replace a stored password hash
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), DbError>;

    async fn list(&self) -> Result<Vec<User>, DbError>;

    async fn has_users(&self) -> Result<bool, DbError>;
}

#[async_trait]
impl CredentialStore for Database {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        self.get_user_by_email(email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        self.get_user_by_username(username).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        self.get_user_by_id(id).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DbError> {
        self.user_exists_by_email(email).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, DbError> {
        self.user_exists_by_username(username).await
    }

    async fn insert(&self, user: NewUser) -> Result<User, DbError> {
        self.insert_user(user).await
    }

    async fn save(&self, user: &User) -> Result<User, DbError> {
        self.save_user(user).await
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), DbError> {
        if self.update_last_login(id, at).await? {
            Ok(())
        } else {
            Err(DbError::NotFound(format!("User: {}", id)))
        }
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), DbError> {
        if self.update_user_password(id, password_hash).await? {
            Ok(())
        } else {
            Err(DbError::NotFound(format!("User: {}", id)))
        }
    }

    async fn list(&self) -> Result<Vec<User>, DbError> {
        self.list_users().await
    }

    async fn has_users(&self) -> Result<bool, DbError> {
        Database::has_users(self).await
    }
}
