use super::AccountId;
use super::password::PasswordKdf;
use crate::db::{AccountCreate, DbActorHandle};
use crate::error::GantryError;
use std::sync::Arc;
use tracing::{debug, info};

/// Durable (username, salted password hash) table.
#[derive(Clone)]
pub struct CredentialStore {
    db: DbActorHandle,
    kdf: PasswordKdf,
    /// Verified against when the username is unknown, so both failure paths cost one hash.
    dummy_hash: Arc<str>,
}

impl CredentialStore {
    pub async fn new(db: DbActorHandle, password_rounds: u32) -> Result<Self, GantryError> {
        let kdf = PasswordKdf::new(password_rounds);
        let dummy_hash = kdf.hash_blocking("gantry-dummy-password".to_string()).await?;
        Ok(Self {
            db,
            kdf,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<AccountId, GantryError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(GantryError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let password_hash = self.kdf.hash_blocking(password.to_string()).await?;
        let id = self
            .db
            .create_account(AccountCreate {
                username: username.to_string(),
                password_hash,
            })
            .await?;

        info!(account_id = id, username, "Account registered");
        Ok(AccountId(id))
    }

    /// Unknown usernames and wrong passwords are indistinguishable to the caller.
    pub async fn verify(&self, username: &str, password: &str) -> Result<AccountId, GantryError> {
        let account = self.db.get_account_by_username(username).await?;

        let (phc, id) = match account {
            Some(account) => (account.password_hash, Some(account.id)),
            None => (self.dummy_hash.to_string(), None),
        };

        let matches = self
            .kdf
            .verify_blocking(password.to_string(), phc)
            .await?;

        match id {
            Some(id) if matches => Ok(AccountId(id)),
            _ => {
                debug!(username, known = id.is_some(), "Credential verification failed");
                Err(GantryError::Authentication)
            }
        }
    }
}
