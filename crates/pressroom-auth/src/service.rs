//! Authentication flows
//!
//! Login, registration, refresh, logout and token validation on top of a
//! [`CredentialStore`], the [`TokenCodec`] and the [`PasswordHasher`].
//!
//! Login moves through lookup, account check and credential check before a
//! session is established; any failed step ends the attempt. Unknown emails
//! and wrong passwords fail identically.

use chrono::Utc;
use pressroom_db::{DbError, NewUser, User, UserRole};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::jwt::{IssuedToken, TokenCodec, TokenKind};
use crate::password::PasswordHasher;
use crate::store::CredentialStore;

/// Tokens and account view handed back after login, registration or refresh
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
    pub user: User,
}

/// Self-service registration input
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codec: Arc<TokenCodec>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            store,
            codec,
            hasher,
        }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Authenticate with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email);
        debug!("Login attempt for {}", email);

        let Some(user) = self.store.find_by_email(&email).await? else {
            // Same hashing work as a wrong password
            self.hasher.verify_blocking(password, None).await?;
            record_login_outcome("invalid_credentials");
            return Err(AuthError::InvalidCredentials);
        };

        if !user.active {
            warn!("Login attempt for disabled account: {}", user.username);
            record_login_outcome("disabled");
            return Err(AuthError::AccountDisabled);
        }

        if !self
            .hasher
            .verify_blocking(password, Some(&user.password_hash))
            .await?
        {
            record_login_outcome("invalid_credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.upgrade_hash(user, password).await;
        let session = self.establish_session(user).await?;

        record_login_outcome("success");
        info!("User logged in: {}", session.user.username);
        Ok(session)
    }

    /// Create a READER account and log it in
    pub async fn register(&self, registration: Registration) -> Result<AuthSession, AuthError> {
        let email = normalize_email(&registration.email);
        let username = registration.username.trim().to_string();

        if self.store.exists_by_email(&email).await? {
            return Err(AuthError::Conflict("email already registered".into()));
        }
        if self.store.exists_by_username(&username).await? {
            return Err(AuthError::Conflict("username already taken".into()));
        }

        let password_hash = self.hasher.hash_blocking(registration.password).await?;

        let user = self
            .store
            .insert(NewUser {
                username,
                email,
                password_hash,
                first_name: registration.first_name.trim().to_string(),
                last_name: registration.last_name.trim().to_string(),
                role: UserRole::Reader,
                active: true,
            })
            .await
            .map_err(|e| match e {
                // Lost a race with a concurrent registration
                DbError::Duplicate(_) => {
                    AuthError::Conflict("email or username already registered".into())
                }
                other => AuthError::Store(other),
            })?;

        metrics::counter!("pressroom_auth_registrations_total").increment(1);
        info!("Registered user: {} ({})", user.username, user.id);

        self.establish_session(user).await
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// Does not touch the last-login timestamp.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let claims = match self.codec.parse(refresh_token, TokenKind::Refresh) {
            Ok(claims) => claims,
            Err(e) => {
                record_refresh_outcome("invalid_token");
                return Err(e);
            }
        };

        let Some(user) = self.store.find_by_email(&claims.sub).await? else {
            record_refresh_outcome("unknown_user");
            return Err(AuthError::UserNotFound);
        };
        if !user.active {
            record_refresh_outcome("disabled");
            return Err(AuthError::AccountDisabled);
        }

        let access = self.codec.issue(&user, TokenKind::Session)?;
        let refresh = self.codec.issue(&user, TokenKind::Refresh)?;

        record_refresh_outcome("success");
        debug!("Rotated tokens for user: {}", user.username);
        Ok(AuthSession {
            access,
            refresh,
            user,
        })
    }

    /// End a session
    ///
    /// Tokens are not revoked; they stay valid until they expire. Returns
    /// whether a valid session token was presented.
    pub async fn logout(&self, token: &str) -> bool {
        let valid = self.is_valid(token);
        if valid {
            debug!("Logout with a valid session token");
        }
        valid
    }

    /// Whether `token` is a valid, unexpired session token
    pub fn is_valid(&self, token: &str) -> bool {
        self.codec.parse(token, TokenKind::Session).is_ok()
    }

    /// Issue a token pair and stamp the login time
    pub async fn establish_session(&self, mut user: User) -> Result<AuthSession, AuthError> {
        let access = self.codec.issue(&user, TokenKind::Session)?;
        let refresh = self.codec.issue(&user, TokenKind::Refresh)?;

        let now = Utc::now();
        self.store.record_login(user.id, now).await?;
        user.last_login = Some(now);

        Ok(AuthSession {
            access,
            refresh,
            user,
        })
    }

    /// Re-hash with the current settings after a successful verification
    ///
    /// Failure only costs the upgrade, never the login.
    async fn upgrade_hash(&self, mut user: User, password: &str) -> User {
        if !self.hasher.needs_rehash(&user.password_hash) {
            return user;
        }

        let upgraded = match self.hasher.hash_blocking(password.to_string()).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!("Could not re-hash password for {}: {}", user.username, e);
                return user;
            }
        };

        match self.store.update_password(user.id, &upgraded).await {
            Ok(()) => {
                info!("Upgraded password hash for user: {}", user.username);
                user.password_hash = upgraded;
            }
            Err(e) => warn!("Could not store upgraded hash for {}: {}", user.username, e),
        }
        user
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn record_login_outcome(outcome: &'static str) {
    metrics::counter!("pressroom_auth_logins_total", "outcome" => outcome).increment(1);
}

fn record_refresh_outcome(outcome: &'static str) {
    metrics::counter!("pressroom_auth_refreshes_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::tests::{test_config, test_user};
    use crate::password::tests::fast_config;
    use pressroom_db::Database;

    async fn service(session_ttl_secs: i64) -> (AuthService, Arc<Database>) {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let codec = Arc::new(TokenCodec::new(&test_config(session_ttl_secs)));
        let hasher = PasswordHasher::new(&fast_config()).unwrap();
        (AuthService::new(db.clone(), codec, hasher), db)
    }

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    async fn seed(db: &Database, email: &str, password_hash: String, active: bool) -> User {
        db.insert_user(NewUser {
            username: email.split('@').next().unwrap_or("user").to_string(),
            email: email.to_string(),
            password_hash,
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            role: UserRole::Author,
            active,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_success() {
        let (auth, db) = service(900).await;
        let hash = auth.hasher().hash("secret1").unwrap();
        seed(&db, "a@b.com", hash, true).await;

        let session = auth.login("  A@B.com ", "secret1").await.unwrap();
        assert!(!session.access.token.is_empty());
        assert!(session.access.expires_at > Utc::now());
        assert!(session.user.last_login.is_some());

        let claims = auth
            .codec()
            .parse(&session.access.token, TokenKind::Session)
            .unwrap();
        assert_eq!(claims.sub, "a@b.com");
        assert_eq!(claims.role, UserRole::Author);

        let stored = db.get_user_by_email("a@b.com").await.unwrap().unwrap();
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let (auth, db) = service(900).await;
        let hash = auth.hasher().hash("secret1").unwrap();
        seed(&db, "a@b.com", hash, true).await;

        let wrong = auth.login("a@b.com", "wrong").await.unwrap_err();
        let unknown = auth.login("nobody@b.com", "secret1").await.unwrap_err();

        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert_eq!(wrong.to_string(), "invalid credentials");
    }

    #[tokio::test]
    async fn test_disabled_account_rejected() {
        let (auth, db) = service(900).await;
        let hash = auth.hasher().hash("secret1").unwrap();
        seed(&db, "a@b.com", hash, false).await;

        let err = auth.login("a@b.com", "secret1").await.unwrap_err();
        assert!(matches!(err, AuthError::AccountDisabled));
    }

    #[tokio::test]
    async fn test_register_creates_reader_and_logs_in() {
        let (auth, db) = service(900).await;
        let session = auth
            .register(registration("ada", "Ada@Example.com"))
            .await
            .unwrap();

        assert_eq!(session.user.role, UserRole::Reader);
        assert!(session.user.active);
        assert_eq!(session.user.email, "ada@example.com");
        assert!(auth.is_valid(&session.access.token));

        let stored = db.get_user_by_username("ada").await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("$argon2id$"));
        assert!(stored.last_login.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts_regardless_of_username() {
        let (auth, _db) = service(900).await;
        auth.register(registration("ada", "ada@example.com"))
            .await
            .unwrap();

        let err = auth
            .register(registration("someone-else", "ADA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));

        let err = auth
            .register(registration("ada", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
    }

    /// Store whose existence checks always miss, so the insert is what
    /// meets the competing row
    struct StaleChecks(Database);

    #[async_trait::async_trait]
    impl CredentialStore for StaleChecks {
        async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
            self.0.find_by_email(email).await
        }
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
            self.0.find_by_username(username).await
        }
        async fn find_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
            self.0.find_by_id(id).await
        }
        async fn exists_by_email(&self, _email: &str) -> Result<bool, DbError> {
            Ok(false)
        }
        async fn exists_by_username(&self, _username: &str) -> Result<bool, DbError> {
            Ok(false)
        }
        async fn insert(&self, user: NewUser) -> Result<User, DbError> {
            self.0.insert(user).await
        }
        async fn save(&self, user: &User) -> Result<User, DbError> {
            self.0.save(user).await
        }
        async fn record_login(&self, id: i64, at: chrono::DateTime<Utc>) -> Result<(), DbError> {
            self.0.record_login(id, at).await
        }
        async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), DbError> {
            self.0.update_password(id, password_hash).await
        }
        async fn list(&self) -> Result<Vec<User>, DbError> {
            self.0.list().await
        }
        async fn has_users(&self) -> Result<bool, DbError> {
            self.0.has_users().await
        }
    }

    #[tokio::test]
    async fn test_registration_losing_insert_race_conflicts() {
        let store = Arc::new(StaleChecks(Database::in_memory().await.unwrap()));
        let codec = Arc::new(TokenCodec::new(&test_config(900)));
        let auth = AuthService::new(
            store.clone(),
            codec,
            PasswordHasher::new(&fast_config()).unwrap(),
        );

        auth.register(registration("ada", "ada@example.com"))
            .await
            .unwrap();

        let err = auth
            .register(registration("other", "ADA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));

        let err = auth
            .register(registration("Ada", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_rotates_without_touching_last_login() {
        let (auth, db) = service(900).await;
        let session = auth
            .register(registration("ada", "ada@example.com"))
            .await
            .unwrap();
        let before = db.get_user_by_id(session.user.id).await.unwrap().unwrap();

        let rotated = auth.refresh(&session.refresh.token).await.unwrap();
        assert_ne!(rotated.refresh.token, session.refresh.token);
        assert!(auth.is_valid(&rotated.access.token));

        let after = db.get_user_by_id(session.user.id).await.unwrap().unwrap();
        assert_eq!(before.last_login, after.last_login);
    }

    #[tokio::test]
    async fn test_refresh_rejects_tampered_and_session_tokens() {
        let (auth, _db) = service(900).await;
        let session = auth
            .register(registration("ada", "ada@example.com"))
            .await
            .unwrap();

        let token = &session.refresh.token;
        let sig_start = token.rfind('.').unwrap() + 1;
        let mut tampered = token.clone();
        let replacement = if token[sig_start..].starts_with('A') { "B" } else { "A" };
        tampered.replace_range(sig_start..sig_start + 1, replacement);

        assert!(matches!(
            auth.refresh(&tampered).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            auth.refresh(&session.access.token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_refresh_for_missing_subject() {
        let (auth, _db) = service(900).await;
        let ghost = auth
            .codec()
            .issue(&test_user(UserRole::Reader), TokenKind::Refresh)
            .unwrap();

        assert!(matches!(
            auth.refresh(&ghost.token).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_refresh_for_disabled_account() {
        let (auth, db) = service(900).await;
        let session = auth
            .register(registration("ada", "ada@example.com"))
            .await
            .unwrap();

        let mut user = session.user.clone();
        user.active = false;
        db.save_user(&user).await.unwrap();

        assert!(matches!(
            auth.refresh(&session.refresh.token).await,
            Err(AuthError::AccountDisabled)
        ));
    }

    #[tokio::test]
    async fn test_zero_ttl_session_is_never_valid() {
        let (auth, db) = service(0).await;
        let hash = auth.hasher().hash("secret1").unwrap();
        seed(&db, "a@b.com", hash, true).await;

        let session = auth.login("a@b.com", "secret1").await.unwrap();
        assert!(!auth.is_valid(&session.access.token));
        assert!(!auth.logout(&session.access.token).await);
    }

    #[tokio::test]
    async fn test_logout_reports_validity_only() {
        let (auth, _db) = service(900).await;
        let session = auth
            .register(registration("ada", "ada@example.com"))
            .await
            .unwrap();

        assert!(auth.logout(&session.access.token).await);
        // No revocation
        assert!(auth.is_valid(&session.access.token));
        assert!(!auth.logout(&session.refresh.token).await);
        assert!(!auth.logout("garbage").await);
    }

    #[tokio::test]
    async fn test_legacy_hash_upgraded_on_login() {
        let (auth, db) = service(900).await;
        let legacy = bcrypt::hash("secret1", 4).unwrap();
        let user = seed(&db, "a@b.com", legacy, true).await;

        auth.login("a@b.com", "secret1").await.unwrap();

        let stored = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert!(stored.password_hash.starts_with("$argon2id$"));
        assert!(auth.login("a@b.com", "secret1").await.is_ok());
        assert!(auth.login("a@b.com", "wrong").await.is_err());
    }
}
