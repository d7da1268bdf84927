//! Scalar values, binding maps and result rows.

use crate::error::{DbError, DbResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Canonical `YYYY-MM-DD` format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Canonical `YYYY-MM-DD HH:MM:SS` format.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parameter key → value map passed alongside statement text.
pub type Bindings = BTreeMap<String, Value>;

/// A scalar value bound to a placeholder or read back from a row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Text(String),
    /// 16-byte identifier, rendered as 32 lowercase hex characters.
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the text payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Read the value as an integer. Text holding an integer is accepted since
    /// several drivers hand numeric columns back as strings.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Like [`Value::as_i64`] but reports which column failed.
    pub fn try_i64(&self, column: &str) -> DbResult<i64> {
        self.as_i64()
            .ok_or_else(|| DbError::decode(column, format!("expected an integer, got {self:?}")))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Uuid(u) => write!(f, "{}", u.simple()),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Text(s) => serializer.serialize_str(s),
            other => serializer.collect_str(other),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    i64 => Int,
    i32 => Int,
    i16 => Int,
    u32 => Int,
    u16 => Int,
    String => Text,
    &str => Text,
    &String => Text,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Int(i64::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A result row: column names paired with values, in driver order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. Lookups by name return the first match.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.columns.push(column.into());
        self.values.push(value.into());
        self
    }

    /// Chainable form of [`Row::push`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// The first value of the row.
    pub fn first(&self) -> Option<&Value> {
        self.values.first()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Trim and lower-case every column name.
    pub fn normalize(self) -> Self {
        Self {
            columns: self
                .columns
                .into_iter()
                .map(|c| c.trim().to_lowercase())
                .collect(),
            values: self.values,
        }
    }

    /// Remove a column, returning its value.
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let i = self.columns.iter().position(|c| c == column)?;
        self.columns.remove(i);
        Some(self.values.remove(i))
    }

    /// Remove the last column named `column`, returning its value.
    pub(crate) fn remove_last(&mut self, column: &str) -> Option<Value> {
        let i = self.columns.iter().rposition(|c| c == column)?;
        self.columns.remove(i);
        Some(self.values.remove(i))
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.push(k, v);
        }
        row
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
