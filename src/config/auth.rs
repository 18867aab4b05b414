use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session and credential settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Lifetime of an issued session token, in seconds.
    /// TOML: `auth.token_ttl_secs`. Default: `3600`.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// PBKDF2-HMAC-SHA256 rounds for newly hashed passwords. Existing hashes keep
    /// the rounds recorded in their PHC string.
    /// TOML: `auth.password_rounds`. Default: `600000`.
    #[serde(default = "default_password_rounds")]
    pub password_rounds: u32,

    /// Upper bound of sessions kept in memory.
    /// TOML: `auth.max_sessions`. Default: `100000`.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,

    /// Interval of the expired-session sweep over the database; `0` disables it.
    /// TOML: `auth.sweep_interval_secs`. Default: `300`.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
            password_rounds: default_password_rounds(),
            max_sessions: default_max_sessions(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

fn default_token_ttl_secs() -> u64 {
    60 * 60
}

fn default_password_rounds() -> u32 {
    600_000
}

fn default_max_sessions() -> u64 {
    100_000
}

fn default_sweep_interval_secs() -> u64 {
    5 * 60
}
