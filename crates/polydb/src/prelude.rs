//! Convenient imports for typical `polydb` usage.
//!
//! ```ignore
//! use polydb::prelude::*;
//! ```

pub use crate::{
    Connection, Db, DbConfig, DbError, DbResult, Dialect, Expression, Fragment, PageWindow,
    Record, Row, Session, Statement, TableTarget, Value, stmt,
};
