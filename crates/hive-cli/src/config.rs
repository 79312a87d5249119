//! Configuration file management for hive.
//!
//! Provides a TOML config file at `~/.config/hive/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use hive_db::config::DbConfig;

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_owned()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/hive` or `~/.config/hive`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("hive");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("hive")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// The file holds a database URL (possibly with a password), so it is
/// written 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct HiveConfig {
    pub db_config: DbConfig,
    pub server: ServerSection,
}

impl HiveConfig {
    /// Resolve configuration.
    ///
    /// DB URL: `cli_db_url` > `HIVE_DATABASE_URL` env > `database.url` in the
    /// config file > `DbConfig::DEFAULT_URL`. A missing config file is not an
    /// error; a malformed one is.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = if config_path().exists() {
            Some(load_config()?)
        } else {
            None
        };

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("HIVE_DATABASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let mut db_config = DbConfig::from_env();
        db_config.database_url = db_url;

        Ok(Self {
            db_config,
            server: file_config.map(|cfg| cfg.server).unwrap_or_default(),
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point `XDG_CONFIG_HOME` at a fresh temp dir for the guard's lifetime.
    struct TempConfigHome {
        _dir: tempfile::TempDir,
        orig: Option<String>,
    }

    impl TempConfigHome {
        fn new() -> Self {
            let dir = tempfile::TempDir::new().unwrap();
            let orig = std::env::var("XDG_CONFIG_HOME").ok();
            unsafe { std::env::set_var("XDG_CONFIG_HOME", dir.path()) };
            Self { _dir: dir, orig }
        }
    }

    impl Drop for TempConfigHome {
        fn drop(&mut self) {
            match &self.orig {
                Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
                None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
            }
        }
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let _home = TempConfigHome::new();

        let original = ConfigFile {
            database: DatabaseSection {
                url: "postgresql://testhost:5432/testdb".to_string(),
            },
            server: ServerSection {
                bind: "0.0.0.0".into(),
                port: 8080,
            },
        };
        save_config(&original).unwrap();

        let loaded = load_config().unwrap();
        assert_eq!(loaded.database.url, original.database.url);
        assert_eq!(loaded.server, original.server);
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let _home = TempConfigHome::new();

        save_config(&ConfigFile {
            database: DatabaseSection {
                url: DbConfig::DEFAULT_URL.into(),
            },
            server: ServerSection::default(),
        })
        .unwrap();

        let meta = std::fs::metadata(config_path()).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn server_section_is_optional() {
        let cfg: ConfigFile = toml::from_str("[database]\nurl = \"postgresql://h/db\"\n").unwrap();
        assert_eq!(cfg.server, ServerSection::default());

        let cfg: ConfigFile =
            toml::from_str("[database]\nurl = \"postgresql://h/db\"\n[server]\nport = 9000\n")
                .unwrap();
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
        assert_eq!(cfg.server.port, 9000);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_all() {
        let _lock = lock_env();
        let _home = TempConfigHome::new();

        unsafe { std::env::set_var("HIVE_DATABASE_URL", "postgresql://env:5432/envdb") };
        let config = HiveConfig::resolve(Some("postgresql://cli:5432/clidb")).unwrap();
        unsafe { std::env::remove_var("HIVE_DATABASE_URL") };

        assert_eq!(config.db_config.database_url, "postgresql://cli:5432/clidb");
    }

    #[test]
    fn resolve_with_env_var_overrides_config_file() {
        let _lock = lock_env();
        let _home = TempConfigHome::new();
        save_config(&ConfigFile {
            database: DatabaseSection {
                url: "postgresql://file:5432/filedb".into(),
            },
            server: ServerSection::default(),
        })
        .unwrap();

        unsafe { std::env::set_var("HIVE_DATABASE_URL", "postgresql://env:5432/envdb") };
        let config = HiveConfig::resolve(None).unwrap();
        unsafe { std::env::remove_var("HIVE_DATABASE_URL") };
        assert_eq!(config.db_config.database_url, "postgresql://env:5432/envdb");

        let config = HiveConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, "postgresql://file:5432/filedb");
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();
        let _home = TempConfigHome::new();
        unsafe { std::env::remove_var("HIVE_DATABASE_URL") };

        let config = HiveConfig::resolve(None).unwrap();
        assert_eq!(config.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(config.server, ServerSection::default());
    }

    #[test]
    fn resolve_rejects_malformed_config_file() {
        let _lock = lock_env();
        let _home = TempConfigHome::new();
        std::fs::create_dir_all(config_dir()).unwrap();
        std::fs::write(config_path(), "not = [valid").unwrap();

        let err = HiveConfig::resolve(None).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("hive/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
