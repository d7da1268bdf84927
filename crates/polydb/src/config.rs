//! Connection configuration.
//!
//! ```toml
//! driver = "pdo_mysql"
//! hostname = "localhost"
//! port = 3306
//! username = "root"
//! password = ""
//! database = "app"
//! charset = "utf8mb4"
//! ```
//!
//! Oracle connections use `driver = "oci8"` together with `connection` (the
//! TNS name) and `character_set`.

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Database connection configuration.
///
/// Only `driver` is interpreted by polydb (it selects the [`Dialect`]); the
/// remaining fields are carried for the driver that builds the connection.
#[derive(Clone, Deserialize)]
pub struct DbConfig {
    pub driver: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    /// Oracle connect identifier (TNS name or easy-connect string).
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(default)]
    pub character_set: Option<String>,
    /// Render statements instead of executing them.
    #[serde(default)]
    pub debug: bool,
    /// Truncate logged SQL to this many bytes; `0` logs it whole.
    #[serde(default = "default_log_sql_max_length")]
    pub log_sql_max_length: usize,
    /// Driver-specific options.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

fn default_log_sql_max_length() -> usize {
    200
}

impl DbConfig {
    /// A configuration with only the driver tag set.
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            hostname: None,
            port: None,
            username: None,
            password: None,
            database: None,
            charset: None,
            connection: None,
            character_set: None,
            debug: false,
            log_sql_max_length: default_log_sql_max_length(),
            options: BTreeMap::new(),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> DbResult<Self> {
        let config: DbConfig = toml::from_str(raw)
            .map_err(|e| DbError::Config(format!("failed to parse config: {e}")))?;
        config.dialect()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DbError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// The dialect named by `driver`.
    pub fn dialect(&self) -> DbResult<Dialect> {
        Dialect::from_driver(&self.driver)
    }

    /// Enable or disable debug (render-only) mode.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Look up a configuration value by key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "driver" => Some(self.driver.clone()),
            "hostname" => self.hostname.clone(),
            "port" => self.port.map(|p| p.to_string()),
            "username" => self.username.clone(),
            "password" => self.password.clone(),
            "database" => self.database.clone(),
            "charset" => self.charset.clone(),
            "connection" => self.connection.clone(),
            "character_set" => self.character_set.clone(),
            other => self.options.get(other).cloned(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("driver", &self.driver)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("charset", &self.charset)
            .field("connection", &self.connection)
            .field("character_set", &self.character_set)
            .field("debug", &self.debug)
            .field("log_sql_max_length", &self.log_sql_max_length)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mysql_config() {
        let config = DbConfig::from_toml_str(
            r#"
            driver = "pdo_mysql"
            hostname = "localhost"
            port = 3306
            username = "root"
            password = "secret"
            database = "app"
            charset = "utf8mb4"

            [options]
            sql_mode = "STRICT_ALL_TABLES"
            "#,
        )
        .unwrap();

        assert_eq!(config.dialect().unwrap(), Dialect::MySql);
        assert_eq!(config.get("port").as_deref(), Some("3306"));
        assert_eq!(config.get("sql_mode").as_deref(), Some("STRICT_ALL_TABLES"));
        assert_eq!(config.log_sql_max_length, 200);
        assert!(!config.debug);
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn parses_oracle_config() {
        let config = DbConfig::from_toml_str(
            r#"
            driver = "oci8"
            connection = "ERPDEVDB"
            username = "SCHEMA"
            character_set = "AL32UTF8"
            debug = true
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect().unwrap(), Dialect::Oracle);
        assert_eq!(config.get("connection").as_deref(), Some("ERPDEVDB"));
        assert!(config.debug);
    }

    #[test]
    fn rejects_unknown_driver_and_bad_toml() {
        assert!(matches!(
            DbConfig::from_toml_str(r#"driver = "sqlite""#),
            Err(DbError::UnknownDialect(_))
        ));
        assert!(matches!(
            DbConfig::from_toml_str("driver = "),
            Err(DbError::Config(_))
        ));
        assert!(matches!(
            DbConfig::load("/nonexistent/polydb.toml"),
            Err(DbError::Config(_))
        ));
    }
}
