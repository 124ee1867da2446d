//! User operations

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, User};
use crate::repository::Database;

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
     avatar_url, role, active, last_login, created_at, updated_at";

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user, returning it with the generated ID
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        if self.user_exists_by_email(&user.email).await? {
            return Err(DbError::Duplicate(format!("Email '{}' already exists", user.email)));
        }
        if self.user_exists_by_username(&user.username).await? {
            return Err(DbError::Duplicate(format!(
                "Username '{}' already exists",
                user.username
            )));
        }

        // A concurrent insert can still win between the checks and here; the
        // unique indexes turn that into a Duplicate as well.
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name, role, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.active)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, format!("User '{}' already exists", user.username)))?;

        let id: i64 = result.get("id");

        Ok(User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar_url: None,
            role: user.role,
            active: user.active,
            last_login: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by email (case-insensitive)
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let result = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by username (case-insensitive)
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS);
        let result = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let result = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Check whether an email is already registered
    pub async fn user_exists_by_email(&self, email: &str) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?) AS found")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        let found: i64 = result.get("found");
        Ok(found != 0)
    }

    /// Check whether a username is already taken
    pub async fn user_exists_by_username(&self, username: &str) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?) AS found")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        let found: i64 = result.get("found");
        Ok(found != 0)
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Persist the mutable fields of an existing user
    pub async fn save_user(&self, user: &User) -> Result<User, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET username = ?, email = ?, password_hash = ?, first_name = ?, last_name = ?,
                avatar_url = ?, role = ?, active = ?, last_login = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.avatar_url)
        .bind(user.role.as_str())
        .bind(user.active)
        .bind(user.last_login.map(|t| t.to_rfc3339()))
        .bind(now.to_rfc3339())
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, format!("User '{}' already exists", user.username)))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User: {}", user.id)));
        }

        Ok(User {
            updated_at: now,
            ..user.clone()
        })
    }

    /// Record a successful login
    pub async fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET last_login = ?
            WHERE id = ?
            "#,
        )
        .bind(at.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update user password hash
    pub async fn update_user_password(&self, id: i64, password_hash: &str) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}
