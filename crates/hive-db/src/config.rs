use std::env;
use std::time::Duration;

/// Connection settings for the hive database.
///
/// `HIVE_DATABASE_URL` selects the server and database;
/// `HIVE_DB_MAX_CONNECTIONS` and `HIVE_DB_ACQUIRE_TIMEOUT_SECS` tune the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// Connection URL used when nothing else is configured.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/hive";
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

    /// Build a config from the environment, falling back to the defaults for
    /// anything unset or unparseable.
    pub fn from_env() -> Self {
        let database_url =
            env::var("HIVE_DATABASE_URL").unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        let mut config = Self::new(database_url);

        if let Some(n) = env_parse::<u32>("HIVE_DB_MAX_CONNECTIONS").filter(|n| *n > 0) {
            config.max_connections = n;
        }
        if let Some(secs) = env_parse::<u64>("HIVE_DB_ACQUIRE_TIMEOUT_SECS") {
            config.acquire_timeout = Duration::from_secs(secs);
        }
        config
    }

    /// Build a config from an explicit URL with default pool settings.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// The database name: the last path segment of the URL, without any
    /// query string.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self
            .database_url
            .split_once('?')
            .map_or(self.database_url.as_str(), |(head, _)| head);
        let (prefix, name) = without_query.rsplit_once('/')?;
        // "postgresql://host" has no database segment at all.
        if prefix.ends_with('/') || name.is_empty() {
            return None;
        }
        Some(name)
    }

    /// URL of the `postgres` maintenance database on the same server, used to
    /// issue `CREATE DATABASE`.
    pub fn maintenance_url(&self) -> String {
        self.with_database("postgres")
    }

    /// Same server, different database.
    pub fn with_database(&self, name: &str) -> String {
        match self.database_url.rfind('/') {
            Some(pos) if !self.database_url[..pos].ends_with('/') => {
                format!("{}/{name}", &self.database_url[..pos])
            }
            _ => format!("{}/{name}", self.database_url.trim_end_matches('/')),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_pool_settings() {
        let cfg = DbConfig::new(DbConfig::DEFAULT_URL);
        assert_eq!(cfg.database_url, "postgresql://localhost:5432/hive");
        assert_eq!(cfg.max_connections, 5);
        assert_eq!(cfg.acquire_timeout, Duration::from_secs(10));
    }

    #[test]
    fn database_name_extraction() {
        let cfg = DbConfig::new("postgresql://localhost:5432/agency");
        assert_eq!(cfg.database_name(), Some("agency"));

        let with_query = DbConfig::new("postgresql://localhost:5432/agency?sslmode=require");
        assert_eq!(with_query.database_name(), Some("agency"));
    }

    #[test]
    fn database_name_missing() {
        let cfg = DbConfig::new("postgresql://localhost:5432");
        assert_eq!(cfg.database_name(), None);
    }

    #[test]
    fn maintenance_url_replaces_db() {
        let cfg = DbConfig::new("postgresql://localhost:5432/hive");
        assert_eq!(cfg.maintenance_url(), "postgresql://localhost:5432/postgres");
    }

    #[test]
    fn with_database_appends_when_url_has_no_db() {
        let cfg = DbConfig::new("postgresql://user:pw@db:5432");
        assert_eq!(cfg.with_database("hive_test"), "postgresql://user:pw@db:5432/hive_test");
    }
}
