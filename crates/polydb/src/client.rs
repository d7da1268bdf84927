//! The driver-facing connection capability.

use crate::error::DbResult;
use crate::statement::quote_literal;
use crate::value::{Bindings, Row, Value};

/// Outcome of executing one statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Rows returned by a read, in driver order.
    pub rows: Vec<Row>,
    /// Rows changed by a write.
    pub affected_rows: u64,
    /// First value generated by an auto-increment column, `0` when none.
    pub generated_value: i64,
}

impl ExecResult {
    /// A read result.
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// A write result.
    pub fn affected(affected_rows: u64) -> Self {
        Self {
            affected_rows,
            ..Self::default()
        }
    }

    /// Set the generated value.
    pub fn with_generated_value(mut self, value: i64) -> Self {
        self.generated_value = value;
        self
    }
}

/// A database connection as seen by polydb.
///
/// Implement this for a concrete MySQL or Oracle driver. Statements arrive
/// with `:name` placeholders and a map of bound values; the driver is
/// responsible for binding them (natively or by rewriting to positional
/// placeholders).
///
/// `connect` and `disconnect` must be idempotent: polydb connects before each
/// session and disconnects when the session ends.
pub trait Connection: Send {
    /// Open the underlying connection if it is not open yet.
    fn connect(&mut self) -> impl std::future::Future<Output = DbResult<()>> + Send;

    /// Close the underlying connection if it is open.
    fn disconnect(&mut self) -> impl std::future::Future<Output = DbResult<()>> + Send;

    /// Execute one statement with its bound values.
    fn execute(
        &mut self,
        sql: &str,
        values: &Bindings,
    ) -> impl std::future::Future<Output = DbResult<ExecResult>> + Send;

    /// Identifier quote character of the platform.
    fn identifier_quote_char(&self) -> char;

    /// Platform name, e.g. `MySQL` or `Oracle`.
    fn platform_name(&self) -> String;

    /// Quote a value as a SQL literal. Used for previews only.
    ///
    /// The default doubles embedded single quotes.
    fn quote_literal(&self, value: &Value) -> String {
        quote_literal(value)
    }

    /// Quote an identifier. Used for previews only.
    fn quote_identifier(&self, ident: &str) -> String {
        let q = self.identifier_quote_char();
        let escaped = ident.replace(q, &format!("{q}{q}"));
        format!("{q}{escaped}{q}")
    }
}
