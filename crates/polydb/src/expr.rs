//! Dialect-aware SQL expressions for UUID, datetime and `IN (...)` handling.
//!
//! `get_*` functions return SQL text for `SELECT` lists; `set_*` functions
//! return a [`Fragment`] binding the value under a fresh key, for use in
//! `INSERT`/`UPDATE` statements or `WHERE` clauses.
//!
//! # Example
//!
//! ```ignore
//! let exp = db.expr();
//! let mut q = stmt(format!(
//!     "SELECT {} user_id, {} created_at FROM users WHERE user_id = ",
//!     exp.get_uuid("user_id")?,
//!     exp.get_date("created_at", true)?,
//! ));
//! q.push_fragment(&exp.set_uuid("0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0"))?;
//! let row = db.fetch_row(&q).await?;
//! ```

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::fragment::Fragment;
use crate::params::unique_key;
use crate::value::{Bindings, DATE_FORMAT, DATETIME_FORMAT, Value};
use chrono::{NaiveDate, NaiveDateTime};


/// Collection of commonly used SQL expressions for one dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expression {
    dialect: Dialect,
    quote: char,
}

impl Expression {
    /// Expressions for `dialect` using its standard identifier quote.
    pub fn new(dialect: Dialect) -> Self {
        Self::with_quote(dialect, dialect.identifier_quote())
    }

    /// Expressions for `dialect` with an explicit identifier quote character.
    pub fn with_quote(dialect: Dialect, quote: char) -> Self {
        Self { dialect, quote }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Validate and quote a column reference like `column` or `table.column`.
    ///
    /// Every dotted segment is quoted; `*` is left bare.
    pub fn format_column_name(&self, column: &str) -> DbResult<String> {
        validate_column(column, self.quote)?;

        let q = self.quote;
        let quoted: Vec<String> = column
            .split('.')
            .map(|seg| {
                if seg == "*" {
                    seg.to_string()
                } else {
                    format!("{q}{seg}{q}")
                }
            })
            .collect();
        Ok(quoted.join("."))
    }

    /// SQL that renders a stored datetime as `YYYY-MM-DD HH:MM:SS`, or as
    /// `YYYY-MM-DD` when `with_time` is false.
    pub fn get_date(&self, column: &str, with_time: bool) -> DbResult<String> {
        let column = self.format_column_name(column)?;
        let format = self.date_pattern(with_time);
        Ok(match self.dialect {
            Dialect::MySql => format!(" DATE_FORMAT({column}, '{format}') "),
            Dialect::Oracle => format!(" TO_CHAR({column}, '{format}') "),
        })
    }

    /// Bind a `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD` literal as a datetime.
    ///
    /// An empty input yields the `''` literal with no bound value.
    pub fn set_date(&self, value: &str) -> DbResult<Fragment> {
        if value.is_empty() {
            return Ok(empty_literal());
        }

        let with_time = value.contains(' ');
        check_date_literal(value, with_time)?;

        let key = unique_key(value);
        let format = self.date_pattern(with_time);
        let text = match self.dialect {
            Dialect::MySql => format!(" STR_TO_DATE({key}, '{format}') "),
            Dialect::Oracle => format!(" TO_DATE({key}, '{format}') "),
        };
        Ok(Fragment::single(text, key, value))
    }

    /// SQL that renders a stored binary UUID as 32 lowercase hex characters.
    pub fn get_uuid(&self, column: &str) -> DbResult<String> {
        let column = self.format_column_name(column)?;
        Ok(match self.dialect {
            Dialect::MySql => format!(" LOWER(HEX({column})) "),
            Dialect::Oracle => format!(" LOWER(RAWTOHEX({column})) "),
        })
    }

    /// Bind a UUID (hyphenated or not, any case) for storage as raw bytes.
    ///
    /// An empty input yields the `''` literal with no bound value.
    pub fn set_uuid(&self, value: &str) -> Fragment {
        if value.is_empty() {
            return empty_literal();
        }

        let hex = value.replace('-', "").to_lowercase();
        let key = unique_key(&hex);
        let text = match self.dialect {
            Dialect::MySql => format!(" UNHEX({key}) "),
            Dialect::Oracle => format!(" HEXTORAW({key}) "),
        };
        Fragment::single(text, key, hex)
    }

    /// ` IN (:k1, :k2, ...) ` with one fresh key per value.
    ///
    /// Returns an empty fragment for an empty input; check for it before
    /// appending a `WHERE ... IN` clause since `IN ()` is not valid SQL.
    pub fn in_list<I, V>(&self, values: I) -> Fragment
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut keys = Vec::new();
        let mut bound = Bindings::new();
        for (i, value) in values.into_iter().enumerate() {
            let key = unique_key(&i.to_string());
            keys.push(key.clone());
            bound.insert(key, value.into());
        }

        if keys.is_empty() {
            return Fragment::empty();
        }
        Fragment::new(format!(" IN ({}) ", keys.join(", ")), bound)
    }

    fn date_pattern(&self, with_time: bool) -> &'static str {
        match (self.dialect, with_time) {
            (Dialect::MySql, true) => "%Y-%m-%d %H:%i:%s",
            (Dialect::MySql, false) => "%Y-%m-%d",
            (Dialect::Oracle, true) => "YYYY-MM-DD HH24:MI:SS",
            (Dialect::Oracle, false) => "YYYY-MM-DD",
        }
    }
}

/// The `''` literal used for empty UUID/date input.
fn empty_literal() -> Fragment {
    Fragment::new("''", Bindings::new())
}

/// Reject empty names, whitespace, the quote character and empty segments.
pub(crate) fn validate_column(column: &str, quote: char) -> DbResult<()> {
    if column.is_empty() {
        return Err(DbError::InvalidColumn("column name cannot be empty".into()));
    }
    if column.contains(quote) {
        return Err(DbError::InvalidColumn(format!(
            "symbol {quote} not allowed in column name `{column}`"
        )));
    }
    if column.chars().any(char::is_whitespace) {
        return Err(DbError::InvalidColumn(format!(
            "whitespace not allowed in column name `{column}`"
        )));
    }
    if column.split('.').any(str::is_empty) {
        return Err(DbError::InvalidColumn(format!(
            "empty segment in column name `{column}`"
        )));
    }
    Ok(())
}

/// The literal must parse and format back to exactly the same text.
fn check_date_literal(value: &str, with_time: bool) -> DbResult<()> {
    let canonical = if with_time {
        NaiveDateTime::parse_from_str(value, DATETIME_FORMAT)
            .map(|dt| dt.format(DATETIME_FORMAT).to_string())
    } else {
        NaiveDate::parse_from_str(value, DATE_FORMAT).map(|d| d.format(DATE_FORMAT).to_string())
    };

    match canonical {
        Ok(c) if c == value => Ok(()),
        _ => Err(DbError::InvalidDateFormat(value.to_string())),
    }
}
