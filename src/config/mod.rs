mod auth;
mod basic;
mod runtime;

pub use auth::AuthConfig;
pub use basic::BasicConfig;
pub use runtime::{RuntimeBackend, RuntimeConfig};

use crate::error::GantryError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Session and password settings (see `auth` table in config.toml).
    #[serde(default)]
    pub auth: AuthConfig,

    /// Managed resource and runtime backend (see `runtime` table in config.toml).
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "GANTRY_";
/// Session cache entries cannot live longer than 1000 years.
const MAX_TOKEN_TTL_SECS: u64 = 1000 * 365 * 24 * 60 * 60;

impl Config {
    /// Builds a Figment that merges defaults, an optional TOML file and
    /// `GANTRY_`-prefixed environment variables (`GANTRY_AUTH__TOKEN_TTL_SECS=60`).
    pub fn figment(path: &Path) -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if path.is_file() {
            figment.merge(Toml::file(path))
        } else {
            figment
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads `config.toml` (if present) plus environment overrides and validates the result.
    pub fn load() -> Result<Self, GantryError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, GantryError> {
        let cfg: Self = Self::figment(path).extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), GantryError> {
        if self.runtime.resource_name.trim().is_empty() {
            return Err(GantryError::Config(
                "runtime.resource_name must be set and non-empty".to_string(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(GantryError::Config(
                "auth.token_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(GantryError::Config(format!(
                "auth.token_ttl_secs must be at most {MAX_TOKEN_TTL_SECS}"
            )));
        }
        if self.auth.password_rounds == 0 {
            return Err(GantryError::Config(
                "auth.password_rounds must be greater than zero".to_string(),
            ));
        }
        if self.runtime.call_timeout_ms == 0 {
            return Err(GantryError::Config(
                "runtime.call_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().expect("defaults validate");
        assert_eq!(cfg.basic.listen_port, 5000);
        assert_eq!(cfg.runtime.resource_name, "data_generator");
        assert_eq!(cfg.runtime.backend, RuntimeBackend::Docker);
        assert_eq!(cfg.auth.token_ttl_secs, 3600);
    }

    #[test]
    fn toml_and_env_override_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "gantry.toml",
                r#"
                [basic]
                listen_port = 8080

                [runtime]
                backend = "memory"
                resource_name = "worker"
                "#,
            )?;
            jail.set_env("GANTRY_AUTH__TOKEN_TTL_SECS", "60");

            let cfg: Config = Config::figment(Path::new("gantry.toml")).extract()?;
            assert_eq!(cfg.basic.listen_port, 8080);
            assert_eq!(cfg.runtime.backend, RuntimeBackend::Memory);
            assert_eq!(cfg.runtime.resource_name, "worker");
            assert_eq!(cfg.auth.token_ttl_secs, 60);
            // Untouched fields keep their defaults.
            assert_eq!(cfg.runtime.retry_max_times, 3);
            Ok(())
        });
    }

    #[test]
    fn token_ttl_must_be_bounded() {
        let mut cfg = Config::default();
        cfg.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        cfg.validate().expect("longest ttl is accepted");

        cfg.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS + 1;
        assert!(matches!(cfg.validate(), Err(GantryError::Config(_))));

        cfg.auth.token_ttl_secs = u64::MAX;
        assert!(matches!(cfg.validate(), Err(GantryError::Config(_))));
    }

    #[test]
    fn empty_resource_name_is_rejected() {
        let mut cfg = Config::default();
        cfg.runtime.resource_name = "  ".to_string();
        assert!(matches!(cfg.validate(), Err(GantryError::Config(_))));
    }
}
