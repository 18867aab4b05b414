use crate::auth::{AuthService, spawn_sweeper};
use crate::config::Config;
use crate::db::{self, DbActorHandle};
use crate::error::GantryError;
use crate::lifecycle::{CallPolicy, LifecycleController};
use crate::runtime::{self, RuntimeAdapter};
use crate::server::GantryState;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

const ACTOR_STOP_WAIT: Duration = Duration::from_secs(5);

/// Everything the server shares between requests, built once at startup.
pub struct AppContext {
    pub cfg: Arc<Config>,
    pub db: DbActorHandle,
    pub auth: AuthService,
    pub lifecycle: LifecycleController,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl AppContext {
    /// Build with the runtime selected by `runtime.backend`.
    pub async fn from_config(cfg: Config) -> Result<Self, GantryError> {
        let runtime = runtime::from_config(&cfg.runtime);
        Self::build(cfg, runtime).await
    }

    /// Build around an explicit runtime adapter.
    pub async fn build(cfg: Config, runtime: Arc<dyn RuntimeAdapter>) -> Result<Self, GantryError> {
        cfg.validate()?;

        let db = db::spawn(&cfg.basic.database_url).await?;
        let auth = AuthService::new(db.clone(), &cfg.auth).await?;
        let lifecycle = LifecycleController::new(runtime, CallPolicy::from_config(&cfg.runtime));

        let sweeper = cfg
            .auth
            .sweep_interval()
            .map(|every| spawn_sweeper(auth.sessions().clone(), every));

        info!(
            backend = lifecycle.backend(),
            resource = %cfg.runtime.resource_name,
            "Application context ready"
        );

        Ok(Self {
            cfg: Arc::new(cfg),
            db,
            auth,
            lifecycle,
            sweeper: Mutex::new(sweeper),
        })
    }

    pub fn state(&self) -> GantryState {
        GantryState::new(
            self.auth.clone(),
            self.lifecycle.clone(),
            &self.cfg.runtime.resource_name,
        )
    }

    /// Stop resource actors, the session sweep and the database actor, in that order.
    pub async fn shutdown(&self) {
        self.lifecycle.shutdown(ACTOR_STOP_WAIT).await;

        let sweeper = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = sweeper {
            handle.abort();
        }

        self.db.shutdown().await;
        info!("Application context shut down");
    }
}
