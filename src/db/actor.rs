use crate::db::models::{AccountCreate, DbAccount, DbSession};
use crate::db::schema::SQLITE_INIT;
use crate::error::GantryError;
use chrono::{DateTime, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub enum DbActorMessage {
    /// Insert a new account and return its id. Duplicate usernames yield `Conflict`.
    CreateAccount(AccountCreate, RpcReplyPort<Result<i64, GantryError>>),

    /// Look up an account by exact (case-sensitive) username.
    GetAccountByUsername(String, RpcReplyPort<Result<Option<DbAccount>, GantryError>>),

    /// Persist a freshly issued session.
    InsertSession(DbSession, RpcReplyPort<Result<(), GantryError>>),

    /// Look up one session by token digest, whatever its state.
    GetSession(String, RpcReplyPort<Result<Option<DbSession>, GantryError>>),

    /// Mark a session revoked by token digest. Replies whether a row was touched.
    RevokeSession(String, RpcReplyPort<Result<bool, GantryError>>),

    /// List sessions that are neither revoked nor expired at the given instant.
    ListLiveSessions(DateTime<Utc>, RpcReplyPort<Result<Vec<DbSession>, GantryError>>),

    /// Delete sessions expired at the given instant. Replies with the number of rows removed.
    PurgeExpiredSessions(DateTime<Utc>, RpcReplyPort<Result<u64, GantryError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn create_account(&self, create: AccountCreate) -> Result<i64, GantryError> {
        ractor::call!(self.actor, DbActorMessage::CreateAccount, create).map_err(|e| {
            GantryError::RactorError(format!("DbActor CreateAccount RPC failed: {e}"))
        })?
    }

    pub async fn get_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<DbAccount>, GantryError> {
        ractor::call!(
            self.actor,
            DbActorMessage::GetAccountByUsername,
            username.to_string()
        )
        .map_err(|e| {
            GantryError::RactorError(format!("DbActor GetAccountByUsername RPC failed: {e}"))
        })?
    }

    pub async fn insert_session(&self, session: DbSession) -> Result<(), GantryError> {
        ractor::call!(self.actor, DbActorMessage::InsertSession, session).map_err(|e| {
            GantryError::RactorError(format!("DbActor InsertSession RPC failed: {e}"))
        })?
    }

    pub async fn get_session(&self, token_digest: &str) -> Result<Option<DbSession>, GantryError> {
        ractor::call!(
            self.actor,
            DbActorMessage::GetSession,
            token_digest.to_string()
        )
        .map_err(|e| GantryError::RactorError(format!("DbActor GetSession RPC failed: {e}")))?
    }

    pub async fn revoke_session(&self, token_digest: &str) -> Result<bool, GantryError> {
        ractor::call!(
            self.actor,
            DbActorMessage::RevokeSession,
            token_digest.to_string()
        )
        .map_err(|e| GantryError::RactorError(format!("DbActor RevokeSession RPC failed: {e}")))?
    }

    pub async fn list_live_sessions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<DbSession>, GantryError> {
        ractor::call!(self.actor, DbActorMessage::ListLiveSessions, now).map_err(|e| {
            GantryError::RactorError(format!("DbActor ListLiveSessions RPC failed: {e}"))
        })?
    }

    pub async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, GantryError> {
        ractor::call!(self.actor, DbActorMessage::PurgeExpiredSessions, now).map_err(|e| {
            GantryError::RactorError(format!("DbActor PurgeExpiredSessions RPC failed: {e}"))
        })?
    }

    /// Stop the actor after its queued messages and close the pool.
    pub async fn shutdown(&self) {
        if let Err(e) = self
            .actor
            .stop_and_wait(None, Some(Duration::from_secs(5)))
            .await
        {
            warn!(error = %e, "DbActor did not stop cleanly");
        }
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.pool.close().await;
        info!("DbActor stopped, pool closed");
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::CreateAccount(create, reply) => {
                let res = self.create_account(&state.pool, create).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetAccountByUsername(username, reply) => {
                let res = self.get_account_by_username(&state.pool, &username).await;
                let _ = reply.send(res);
            }
            DbActorMessage::InsertSession(session, reply) => {
                let res = self.insert_session(&state.pool, session).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetSession(digest, reply) => {
                let res = self.get_session(&state.pool, &digest).await;
                let _ = reply.send(res);
            }
            DbActorMessage::RevokeSession(digest, reply) => {
                let res = self.revoke_session(&state.pool, &digest).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ListLiveSessions(now, reply) => {
                let res = self.list_live_sessions(&state.pool, now).await;
                let _ = reply.send(res);
            }
            DbActorMessage::PurgeExpiredSessions(now, reply) => {
                let res = self.purge_expired_sessions(&state.pool, now).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn create_account(
        &self,
        pool: &SqlitePool,
        create: AccountCreate,
    ) -> Result<i64, GantryError> {
        let now = Utc::now();
        let res: Result<i64, sqlx::Error> = sqlx::query_scalar(
            r#"
        INSERT INTO accounts (username, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
        )
        .bind(&create.username)
        .bind(&create.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await;

        match res {
            Ok(id) => Ok(id),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                GantryError::Conflict(format!("User {} already exists", create.username)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_account_by_username(
        &self,
        pool: &SqlitePool,
        username: &str,
    ) -> Result<Option<DbAccount>, GantryError> {
        let row = sqlx::query_as::<_, DbAccount>(
            r#"
        SELECT id, username, password_hash, created_at, updated_at
        FROM accounts
        WHERE username = ?
        "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    async fn insert_session(&self, pool: &SqlitePool, s: DbSession) -> Result<(), GantryError> {
        sqlx::query(
            r#"
        INSERT INTO sessions (token_digest, account_id, issued_at, expires_at, revoked)
        VALUES (?, ?, ?, ?, ?)
        "#,
        )
        .bind(s.token_digest)
        .bind(s.account_id)
        .bind(s.issued_at)
        .bind(s.expires_at)
        .bind(s.revoked)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn get_session(
        &self,
        pool: &SqlitePool,
        digest: &str,
    ) -> Result<Option<DbSession>, GantryError> {
        let row = sqlx::query_as::<_, DbSession>(
            r#"
        SELECT token_digest, account_id, issued_at, expires_at, revoked
        FROM sessions
        WHERE token_digest = ?
        "#,
        )
        .bind(digest)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    async fn revoke_session(&self, pool: &SqlitePool, digest: &str) -> Result<bool, GantryError> {
        let res = sqlx::query(
            r#"
        UPDATE sessions SET revoked = 1
        WHERE token_digest = ? AND revoked = 0
        "#,
        )
        .bind(digest)
        .execute(pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn list_live_sessions(
        &self,
        pool: &SqlitePool,
        now: DateTime<Utc>,
    ) -> Result<Vec<DbSession>, GantryError> {
        let rows = sqlx::query_as::<_, DbSession>(
            r#"
        SELECT token_digest, account_id, issued_at, expires_at, revoked
        FROM sessions
        WHERE revoked = 0 AND expires_at > ?
        ORDER BY issued_at
        "#,
        )
        .bind(now)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    async fn purge_expired_sessions(
        &self,
        pool: &SqlitePool,
        now: DateTime<Utc>,
    ) -> Result<u64, GantryError> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(pool)
            .await?;

        Ok(res.rows_affected())
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, GantryError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .map_err(|e| GantryError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), GantryError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
