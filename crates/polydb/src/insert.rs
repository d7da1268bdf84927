//! Multi-row INSERT statement assembly.
//!
//! Every row binds its own keys: plain values become `:<column>_<row>` and
//! fragment keys get a `_<row>` suffix, so reusing one fragment across rows
//! never collides.

use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::expr::validate_column;
use crate::fragment::Fragment;
use crate::statement::Statement;
use crate::value::{Bindings, Value};
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;


/// The value of one column in an insert row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    /// Bound as a plain parameter.
    Value(Value),
    /// Spliced in as SQL, with its own bindings.
    Fragment(Fragment),
}

impl From<Value> for ColumnValue {
    fn from(v: Value) -> Self {
        ColumnValue::Value(v)
    }
}

impl From<Fragment> for ColumnValue {
    fn from(f: Fragment) -> Self {
        ColumnValue::Fragment(f)
    }
}

macro_rules! impl_from_for_column_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ColumnValue {
                fn from(v: $ty) -> Self {
                    ColumnValue::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_from_for_column_value!(
    i64,
    i32,
    i16,
    u32,
    u16,
    bool,
    String,
    &str,
    &String,
    Uuid,
    NaiveDate,
    NaiveDateTime,
    Option<i64>,
    Option<String>,
    Option<&str>,
);

/// One row to insert: columns in order, each with a value or a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, ColumnValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column, replacing an earlier value for the same name.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<ColumnValue>) -> Self {
        self.put(column, value);
        self
    }

    /// In-place form of [`Record::set`].
    pub fn put(&mut self, column: impl Into<String>, value: impl Into<ColumnValue>) -> &mut Self {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
        self
    }

    /// Set a column matched case-insensitively, renaming it to `column`.
    pub(crate) fn put_ignore_case(&mut self, column: &str, value: impl Into<ColumnValue>) {
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|(c, _)| c.trim().eq_ignore_ascii_case(column))
        {
            Some(slot) => *slot = (column.to_string(), value),
            None => self.fields.push((column.to_string(), value)),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.fields.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnValue)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<ColumnValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.put(k, v);
        }
        record
    }
}

/// Where rows go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableTarget {
    /// Plain table; MySQL reports auto-increment ids.
    Table(String),
    /// Oracle table whose id column is filled from a sequence.
    Sequenced {
        table: String,
        sequence: String,
        column: String,
    },
}

impl TableTarget {
    pub fn sequenced(
        table: impl Into<String>,
        sequence: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        TableTarget::Sequenced {
            table: table.into(),
            sequence: sequence.into(),
            column: column.into(),
        }
    }

    pub fn table(&self) -> &str {
        match self {
            TableTarget::Table(t) => t,
            TableTarget::Sequenced { table, .. } => table,
        }
    }

    /// Sequence name and column, checked for completeness.
    pub(crate) fn sequence(&self) -> DbResult<Option<(&str, &str)>> {
        match self {
            TableTarget::Table(_) => Ok(None),
            TableTarget::Sequenced {
                table,
                sequence,
                column,
            } => {
                if table.trim().is_empty() {
                    return Err(DbError::MissingSequenceSpec("table"));
                }
                if sequence.trim().is_empty() {
                    return Err(DbError::MissingSequenceSpec("sequence"));
                }
                if column.trim().is_empty() {
                    return Err(DbError::MissingSequenceSpec("column"));
                }
                Ok(Some((sequence.trim(), column.trim())))
            }
        }
    }
}

impl From<&str> for TableTarget {
    fn from(table: &str) -> Self {
        TableTarget::Table(table.to_string())
    }
}

impl From<String> for TableTarget {
    fn from(table: String) -> Self {
        TableTarget::Table(table)
    }
}

/// `SELECT <sequence>.NEXTVAL FROM DUAL`.
pub(crate) fn next_value_sql(sequence: &str) -> String {
    format!("SELECT {}.NEXTVAL FROM DUAL", sequence.to_uppercase())
}

/// Build the INSERT statement for `rows`.
///
/// Sequence values are not fetched here; for a sequenced Oracle target the
/// caller injects them into the rows first.
pub fn build_insert(dialect: Dialect, target: &TableTarget, rows: &[Record]) -> DbResult<Statement> {
    let first = rows.first().ok_or(DbError::EmptyInsertValues)?;
    if first.is_empty() {
        return Err(DbError::validation("insert row has no columns"));
    }
    target.sequence()?;

    let table = target.table().trim();
    if table.is_empty() || table.chars().any(char::is_whitespace) {
        return Err(DbError::validation(format!("invalid table name `{table}`")));
    }

    match dialect {
        Dialect::MySql => {
            if matches!(target, TableTarget::Sequenced { .. }) {
                return Err(DbError::validation(
                    "MySQL inserts take a plain table name; ids come from AUTO_INCREMENT",
                ));
            }
            build_mysql(table, first, rows)
        }
        Dialect::Oracle => build_oracle(table, rows),
    }
}

/// One column list for all rows, taken from the first. Every row must carry
/// exactly those columns; its values are emitted in the first row's order.
fn build_mysql(table: &str, first: &Record, rows: &[Record]) -> DbResult<Statement> {
    let columns = quoted_columns(first, Dialect::MySql)?;
    let order: Vec<&str> = first.iter().map(|(c, _)| c).collect();
    let mut values = Bindings::new();
    let mut tuples = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        if row.len() != order.len() {
            return Err(DbError::validation(format!(
                "insert row {i} has {} columns, the first row has {}",
                row.len(),
                order.len()
            )));
        }
        let fields = order
            .iter()
            .map(|&column| {
                row.get(column).map(|v| (column, v)).ok_or_else(|| {
                    DbError::validation(format!("insert row {i} has no column `{column}`"))
                })
            })
            .collect::<DbResult<Vec<_>>>()?;
        tuples.push(format!("({})", row_exprs(fields, i, &mut values)?.join(", ")));
    }

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES {}",
        columns.join(", "),
        tuples.join(", ")
    );
    Ok(Statement::with_values(sql, values))
}

fn build_oracle(table: &str, rows: &[Record]) -> DbResult<Statement> {
    let table = table.to_uppercase();
    let mut values = Bindings::new();
    let mut sql = String::from("INSERT ALL");
    for (i, row) in rows.iter().enumerate() {
        let columns = quoted_columns(row, Dialect::Oracle)?;
        let exprs = row_exprs(row.iter(), i, &mut values)?;
        sql.push_str(&format!(
            " INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            exprs.join(", ")
        ));
    }
    sql.push_str(" SELECT 1 FROM DUAL");
    Ok(Statement::with_values(sql, values))
}

/// Column list: MySQL lower-cases, Oracle upper-cases; both quote.
fn quoted_columns(row: &Record, dialect: Dialect) -> DbResult<Vec<String>> {
    let q = dialect.identifier_quote();
    row.iter()
        .map(|(column, _)| {
            let column = column.trim();
            validate_column(column, q)?;
            let column = match dialect {
                Dialect::MySql => column.to_lowercase(),
                Dialect::Oracle => column.to_uppercase(),
            };
            Ok(format!("{q}{column}{q}"))
        })
        .collect()
}

/// Value expressions of row `index`, collecting bindings into `values`.
fn row_exprs<'r>(
    fields: impl IntoIterator<Item = (&'r str, &'r ColumnValue)>,
    index: usize,
    values: &mut Bindings,
) -> DbResult<Vec<String>> {
    let mut exprs = Vec::new();
    for (column, value) in fields {
        match value {
            ColumnValue::Value(v) => {
                let key = format!(":{}_{index}", key_name(column));
                bind_unique(values, key.clone(), v.clone())?;
                exprs.push(key);
            }
            ColumnValue::Fragment(f) => {
                let (text, bound) = f.with_key_suffix(index).into_parts();
                for (key, v) in bound {
                    bind_unique(values, key, v)?;
                }
                exprs.push(text);
            }
        }
    }
    Ok(exprs)
}

/// Column name reduced to placeholder-safe characters.
fn key_name(column: &str) -> String {
    column
        .trim()
        .chars()
        .map(|c| if c == '_' || c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn bind_unique(values: &mut Bindings, key: String, value: Value) -> DbResult<()> {
    if values.contains_key(&key) {
        return Err(DbError::DuplicateBindingKey(key));
    }
    values.insert(key, value);
    Ok(())
}
