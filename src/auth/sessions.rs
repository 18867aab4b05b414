use super::AccountId;
use crate::db::{DbActorHandle, DbSession};
use crate::error::{AuthorizationFailure, GantryError};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use moka::sync::Cache;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

const TOKEN_BYTES: usize = 32;

type TokenDigest = [u8; 32];

#[derive(Debug, Clone)]
struct Session {
    digest: TokenDigest,
    account_id: AccountId,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

/// A freshly issued bearer token. The plaintext exists only here.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub account_id: AccountId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Token table: in-memory for reads, written through to SQLite.
///
/// Entries are keyed by the SHA-256 digest of the token; the plaintext token
/// is never stored. The database row is authoritative; the cache only bounds
/// how often authorization has to read it.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<TokenDigest, Arc<Session>>,
    db: DbActorHandle,
    ttl: chrono::Duration,
}

impl SessionStore {
    pub fn new(db: DbActorHandle, ttl: Duration, max_sessions: u64) -> Result<Self, GantryError> {
        let chrono_ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| GantryError::Config(format!("auth.token_ttl_secs out of range: {e}")))?;
        let cache = Cache::builder()
            .max_capacity(max_sessions)
            .time_to_live(ttl)
            .build();
        Ok(Self {
            cache,
            db,
            ttl: chrono_ttl,
        })
    }

    pub async fn issue(&self, account_id: AccountId) -> Result<IssuedSession, GantryError> {
        let token = generate_token();
        let digest = token_digest(&token);
        let issued_at = Utc::now();
        let expires_at = issued_at + self.ttl;

        self.db
            .insert_session(DbSession {
                token_digest: encode_digest(&digest),
                account_id: account_id.0,
                issued_at,
                expires_at,
                revoked: false,
            })
            .await?;

        self.cache.insert(
            digest,
            Arc::new(Session {
                digest,
                account_id,
                expires_at,
                revoked: false,
            }),
        );

        Ok(IssuedSession {
            token,
            account_id,
            issued_at,
            expires_at,
        })
    }

    pub async fn authorize(&self, token: &str) -> Result<AccountId, GantryError> {
        self.authorize_at(token, Utc::now()).await
    }

    /// Resolve `token` as of `now`. A session is expired once `now >= expires_at`.
    ///
    /// A cache miss falls back to the database row, so capacity eviction never
    /// turns a live token into an unknown one.
    pub async fn authorize_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AccountId, GantryError> {
        let digest = token_digest(token);
        let session = match self.cache.get(&digest) {
            Some(session) => session,
            None => self
                .load(&digest)
                .await?
                .ok_or(GantryError::Authorization(AuthorizationFailure::UnknownToken))?,
        };

        check(&session, &digest, now).map_err(GantryError::Authorization)
    }

    async fn load(&self, digest: &TokenDigest) -> Result<Option<Arc<Session>>, GantryError> {
        let Some(row) = self.db.get_session(&encode_digest(digest)).await? else {
            return Ok(None);
        };
        let Some(session) = session_from_row(&row) else {
            warn!(digest = %row.token_digest, "Session row with malformed digest");
            return Ok(None);
        };
        debug!(account_id = %session.account_id, "Session reloaded from database");
        // A concurrent revoke may have cached the revoked row first; keep it.
        let entry = self.cache.entry(*digest).or_insert(Arc::new(session));
        Ok(Some(entry.into_value()))
    }

    /// Revoke `token`. Unknown and already-revoked tokens are a no-op.
    pub async fn revoke(&self, token: &str) -> Result<(), GantryError> {
        let digest = token_digest(token);
        let digest_text = encode_digest(&digest);
        let touched = self.db.revoke_session(&digest_text).await?;

        if let Some(session) = self.cache.get(&digest) {
            if !session.revoked {
                let mut revoked = (*session).clone();
                revoked.revoked = true;
                self.cache.insert(digest, Arc::new(revoked));
            }
        } else if touched
            && let Some(row) = self.db.get_session(&digest_text).await?
            && let Some(session) = session_from_row(&row)
        {
            self.cache.insert(digest, Arc::new(session));
        }

        if touched {
            debug!("Session revoked");
        }
        Ok(())
    }

    /// Load live sessions from the database. Returns how many were restored.
    pub async fn restore(&self) -> Result<usize, GantryError> {
        let rows = self.db.list_live_sessions(Utc::now()).await?;
        let mut restored = 0usize;
        for row in rows {
            let Some(session) = session_from_row(&row) else {
                warn!(digest = %row.token_digest, "Skipping session row with malformed digest");
                continue;
            };
            self.cache.insert(session.digest, Arc::new(session));
            restored += 1;
        }
        info!(restored, "Sessions restored from database");
        Ok(restored)
    }

    /// Delete expired rows and flush expired cache entries.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, GantryError> {
        let purged = self.db.purge_expired_sessions(now).await?;
        self.cache.run_pending_tasks();
        Ok(purged)
    }
}

fn check(
    session: &Session,
    digest: &TokenDigest,
    now: DateTime<Utc>,
) -> Result<AccountId, AuthorizationFailure> {
    if !bool::from(session.digest[..].ct_eq(&digest[..])) {
        return Err(AuthorizationFailure::UnknownToken);
    }
    if session.revoked {
        return Err(AuthorizationFailure::Revoked);
    }
    if now >= session.expires_at {
        return Err(AuthorizationFailure::Expired);
    }
    Ok(session.account_id)
}

fn session_from_row(row: &DbSession) -> Option<Session> {
    decode_digest(&row.token_digest).map(|digest| Session {
        digest,
        account_id: AccountId(row.account_id),
        expires_at: row.expires_at,
        revoked: row.revoked,
    })
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn token_digest(token: &str) -> TokenDigest {
    Sha256::digest(token.as_bytes()).into()
}

fn encode_digest(digest: &TokenDigest) -> String {
    URL_SAFE_NO_PAD.encode(digest)
}

fn decode_digest(text: &str) -> Option<TokenDigest> {
    URL_SAFE_NO_PAD
        .decode(text)
        .ok()
        .and_then(|bytes| TokenDigest::try_from(bytes.as_slice()).ok())
}
