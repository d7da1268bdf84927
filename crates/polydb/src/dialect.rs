//! Supported SQL dialect families.

use crate::error::{DbError, DbResult};
use std::fmt;
use std::str::FromStr;

/// The backend SQL family a [`Db`](crate::Db) talks to.
///
/// Chosen once from configuration; every dialect-specific piece of SQL is an
/// exhaustive `match` on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// MySQL and MariaDB.
    MySql,
    /// Oracle Database.
    Oracle,
}

impl Dialect {
    /// Resolve a driver tag (`pdo_mysql`, `mysql`, `mariadb`, `oci8`, `oracle`).
    pub fn from_driver(driver: &str) -> DbResult<Self> {
        match driver.trim().to_ascii_lowercase().as_str() {
            "pdo_mysql" | "mysql" | "mariadb" => Ok(Dialect::MySql),
            "oci8" | "oracle" => Ok(Dialect::Oracle),
            _ => Err(DbError::UnknownDialect(driver.to_string())),
        }
    }

    /// Character used to quote identifiers.
    pub fn identifier_quote(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Oracle => '"',
        }
    }

    /// Lower-case platform tag.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::MySql => "mysql",
            Dialect::Oracle => "oracle",
        }
    }
}

impl FromStr for Dialect {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_driver(s)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_tags_resolve() {
        assert_eq!(Dialect::from_driver("pdo_mysql").unwrap(), Dialect::MySql);
        assert_eq!(Dialect::from_driver(" OCI8 ").unwrap(), Dialect::Oracle);
        assert_eq!("oracle".parse::<Dialect>().unwrap(), Dialect::Oracle);
        assert!(matches!(
            Dialect::from_driver("pdo_pgsql"),
            Err(DbError::UnknownDialect(tag)) if tag == "pdo_pgsql"
        ));
    }
}
