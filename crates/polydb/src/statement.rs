//! Statement text plus named bindings, classification and preview rendering.

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::fragment::Fragment;
use crate::params::{ensure_bound, substitute, validate_bindings};
use crate::value::{Bindings, Value};
use serde::Serialize;
use std::fmt;

/// Kind of statement, taken from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// Anything else: DDL, stored procedure calls, PL/SQL blocks, `WITH ...`.
    Other,
}

impl StatementKind {
    /// Classify SQL by its first keyword, case-insensitively.
    ///
    /// Leading whitespace, comments and opening parentheses are skipped, so
    /// `(SELECT ...) UNION (SELECT ...)` is a `Select`.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        if starts_with_keyword(trimmed, "SELECT") {
            StatementKind::Select
        } else if starts_with_keyword(trimmed, "INSERT") {
            StatementKind::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            StatementKind::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            StatementKind::Delete
        } else {
            StatementKind::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Other => "OTHER",
        }
    }

    /// Which method a statement of this kind must go through.
    pub(crate) fn dedicated_method(self) -> &'static str {
        match self {
            StatementKind::Select => "for SELECT statements use fetch_row(), fetch_rows(), fetch_column(), fetch_key() or fetch_chunk()",
            StatementKind::Insert => "for INSERT statements use insert()",
            StatementKind::Update => "for UPDATE statements use update()",
            StatementKind::Delete => "for DELETE statements use delete()",
            StatementKind::Other => "for other statements use query()",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strip leading whitespace, SQL comments (`--` and `/* */`), and parentheses
/// from a SQL string to find the first meaningful keyword.
pub(crate) fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            if let Some(pos) = s.find('\n') {
                s = &s[pos + 1..];
                continue;
            }
            return "";
        }
        if s.starts_with("/*") {
            if let Some(pos) = s.find("*/") {
                s = &s[pos + 2..];
                continue;
            }
            return "";
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            break;
        }
    }
    s
}

pub(crate) fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    match s.get(0..keyword.len()) {
        Some(prefix) => prefix.eq_ignore_ascii_case(keyword),
        None => false,
    }
}

/// SQL text with `:name` placeholders and the values they bind.
///
/// ```ignore
/// use polydb::stmt;
///
/// let mut q = stmt("SELECT * FROM users WHERE user_email = :email").bind(":email", email);
/// if !ids.is_empty() {
///     q.push(" AND user_id").push_fragment(&exp.in_list(ids))?;
/// }
/// let rows = db.fetch_rows(&q).await?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Statement {
    sql: String,
    values: Bindings,
}

/// Start building a statement.
pub fn stmt(sql: impl Into<String>) -> Statement {
    Statement::new(sql)
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            values: Bindings::new(),
        }
    }

    pub fn with_values(sql: impl Into<String>, values: Bindings) -> Self {
        Self {
            sql: sql.into(),
            values,
        }
    }

    /// Bind `value` to `key`. The key is checked when the statement runs.
    pub fn bind(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// In-place form of [`Statement::bind`].
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Append raw SQL.
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Append a fragment's text and merge its values. Keys must not already
    /// be bound.
    pub fn push_fragment(&mut self, fragment: &Fragment) -> DbResult<&mut Self> {
        if let Some(dup) = fragment.values().keys().find(|k| self.values.contains_key(*k)) {
            return Err(DbError::DuplicateBindingKey(dup.clone()));
        }
        self.sql.push_str(fragment.text());
        self.values
            .extend(fragment.values().iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(self)
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &Bindings {
        &self.values
    }

    pub fn kind(&self) -> StatementKind {
        StatementKind::from_sql(&self.sql)
    }

    /// Key shape of every binding, then that every placeholder is bound.
    /// Literals are scanned with `dialect`'s escape rules.
    pub fn validate(&self, dialect: Dialect) -> DbResult<()> {
        validate_bindings(&self.values)?;
        ensure_bound(dialect, &self.sql, &self.values)
    }

    pub fn into_parts(self) -> (String, Bindings) {
        (self.sql, self.values)
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::new(sql)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::new(sql)
    }
}

impl From<Fragment> for Statement {
    fn from(fragment: Fragment) -> Self {
        let (sql, values) = fragment.into_parts();
        Statement::with_values(sql, values)
    }
}

/// A statement rendered for inspection. Never meant to be executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    /// Statement text with placeholders.
    pub query: String,
    /// Bound values.
    pub values: Bindings,
    /// Statement text with every bound placeholder replaced by its literal.
    pub prepared_query: String,
}

impl Preview {
    /// Pretty-printed JSON with `query`, `values` and `prepared_query`.
    pub fn to_json(&self) -> DbResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| DbError::Serialization(e.to_string()))
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.prepared_query)
    }
}

/// Render `statement` with its values substituted.
///
/// Integers and NULL are written bare; every other value goes through `quote`.
pub fn preview(statement: &Statement, quote: impl Fn(&Value) -> String) -> Preview {
    let values = statement.values();
    let prepared_query = if values.is_empty() {
        statement.sql().to_string()
    } else {
        substitute(statement.sql(), |key| {
            values.get(key).map(|v| match v {
                Value::Null | Value::Int(_) => v.to_string(),
                other => quote(other),
            })
        })
    };

    Preview {
        query: statement.sql().to_string(),
        values: values.clone(),
        prepared_query,
    }
}

/// Standard SQL literal quoting: single quotes, embedded quotes doubled.
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Int(v) => v.to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}
