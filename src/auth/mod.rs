//! Accounts, password verification and bearer sessions.

mod credentials;
mod password;
mod sessions;
mod sweeper;

pub use credentials::CredentialStore;
pub use password::PasswordKdf;
pub use sessions::{IssuedSession, SessionStore};
pub use sweeper::spawn_sweeper;

use crate::config::AuthConfig;
use crate::db::DbActorHandle;
use crate::error::GantryError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// Database id of an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountId(pub i64);

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Register / login / logout / authorize over the credential and session stores.
#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    sessions: SessionStore,
}

impl AuthService {
    pub async fn new(db: DbActorHandle, cfg: &AuthConfig) -> Result<Self, GantryError> {
        let credentials = CredentialStore::new(db.clone(), cfg.password_rounds).await?;
        let sessions = SessionStore::new(db, cfg.token_ttl(), cfg.max_sessions)?;
        sessions.restore().await?;
        Ok(Self {
            credentials,
            sessions,
        })
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<AccountId, GantryError> {
        self.credentials.register(username, password).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, GantryError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(GantryError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let account_id = match self.credentials.verify(username, password).await {
            Ok(id) => id,
            Err(e) => {
                warn!(username, "Login failed");
                return Err(e);
            }
        };

        let issued = self.sessions.issue(account_id).await?;
        info!(%account_id, username, expires_at = %issued.expires_at, "Login successful");
        Ok(issued)
    }

    pub async fn logout(&self, token: &str) -> Result<(), GantryError> {
        self.sessions.revoke(token).await
    }

    /// Resolve a bearer token to its account.
    pub async fn authorize(&self, token: &str) -> Result<AccountId, GantryError> {
        self.sessions.authorize(token).await
    }

    pub async fn authorize_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AccountId, GantryError> {
        self.sessions.authorize_at(token, now).await
    }
}
