//! Configuration from the environment.

use crate::error::{Error, Result};
use deadpool_postgres::{Pool, Runtime};
use tokio_postgres::NoTls;
use tracing::{error, info};

/// Roles every managed view is granted to.
pub const DEFAULT_BASELINE_ROLES: &[&str] = &["web_anon", "authenticated", "service_role"];

/// Table that mirrors managed schemas, as `schema.table`.
pub const DEFAULT_SCHEMA_REGISTRY: &str = "postgrest.schema_config";

/// Knobs for reconciliation that vary per deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Roles granted `SELECT` on every created or replaced view.
    pub baseline_roles: Vec<String>,
    /// Schemas hidden from `list_schemas`, in addition to the system ones.
    pub excluded_schemas: Vec<String>,
    /// `schema.table` of the schema registry, or `None` to skip registry upkeep.
    pub schema_registry: Option<String>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            baseline_roles: DEFAULT_BASELINE_ROLES.iter().map(|s| s.to_string()).collect(),
            excluded_schemas: Vec::new(),
            schema_registry: Some(DEFAULT_SCHEMA_REGISTRY.to_string()),
        }
    }
}

/// Connection and reconciliation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Full connection string; takes precedence over the discrete settings.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub options: ReconcileOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            host: "localhost".to_string(),
            port: 5432,
            dbname: "postgres".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            options: ReconcileOptions::default(),
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Unset or empty keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.database_url = get("DATABASE_URL");
        if let Some(host) = get("DB_HOST") {
            config.host = host;
        }
        if let Some(port) = get("DB_PORT") {
            config.port = port.trim().parse().map_err(|_| {
                Error::Config(format!("DB_PORT must be a port number, got {port:?}"))
            })?;
        }
        if let Some(dbname) = get("DB_NAME") {
            config.dbname = dbname;
        }
        if let Some(user) = get("DB_USER") {
            config.user = user;
        }
        if let Some(password) = get("DB_PASSWORD") {
            config.password = password;
        }

        if let Some(roles) = get("TABLEWRIGHT_BASELINE_ROLES") {
            config.options.baseline_roles = split_list(&roles);
        }
        if let Some(schemas) = get("TABLEWRIGHT_EXCLUDED_SCHEMAS") {
            config.options.excluded_schemas = split_list(&schemas);
        }
        if let Some(registry) = lookup("TABLEWRIGHT_SCHEMA_REGISTRY") {
            let registry = registry.trim();
            config.options.schema_registry = (!registry.is_empty()).then(|| registry.to_string());
        }

        Ok(config)
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        self.options.clone()
    }

    fn pool_config(&self) -> deadpool_postgres::Config {
        let mut cfg = deadpool_postgres::Config::new();
        match &self.database_url {
            Some(url) => cfg.url = Some(url.clone()),
            None => {
                cfg.host = Some(self.host.clone());
                cfg.port = Some(self.port);
                cfg.dbname = Some(self.dbname.clone());
                cfg.user = Some(self.user.clone());
                cfg.password = Some(self.password.clone());
            }
        }
        cfg
    }

    /// Build a connection pool. Connections are opened lazily.
    pub fn create_pool(&self) -> Result<Pool> {
        self.pool_config()
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| Error::Config(format!("could not create pool: {e}")))
    }

    /// Open a single connection and drive it on a background task.
    pub async fn connect(&self) -> Result<tokio_postgres::Client> {
        let pg = self
            .pool_config()
            .get_pg_config()
            .map_err(|e| Error::Config(e.to_string()))?;
        let (client, connection) = pg
            .connect(NoTls)
            .await
            .map_err(|e| Error::Pool(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "database connection error");
            }
        });

        info!(host = %self.host, dbname = %self.dbname, "connected");
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(
            config.options.baseline_roles,
            vec!["web_anon", "authenticated", "service_role"]
        );
        assert_eq!(
            config.options.schema_registry.as_deref(),
            Some("postgrest.schema_config")
        );
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("TABLEWRIGHT_BASELINE_ROLES", "anon, ,reader"),
            ("TABLEWRIGHT_EXCLUDED_SCHEMAS", "postgrest,auth"),
            ("TABLEWRIGHT_SCHEMA_REGISTRY", ""),
        ]))
        .unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 6543);
        assert_eq!(config.options.baseline_roles, vec!["anon", "reader"]);
        assert_eq!(config.options.excluded_schemas, vec!["postgrest", "auth"]);
        assert_eq!(config.options.schema_registry, None);
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("DB_PORT", "lots")])).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn database_url_wins() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://u:p@h:1/d"),
            ("DB_HOST", "ignored"),
        ]))
        .unwrap();
        let pool = config.pool_config();
        assert_eq!(pool.url.as_deref(), Some("postgres://u:p@h:1/d"));
        assert_eq!(pool.host, None);
    }
}
