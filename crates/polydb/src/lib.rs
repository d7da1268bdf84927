//! # polydb
//!
//! Dialect-aware statement building and execution for MySQL and Oracle.
//!
//! ## Features
//!
//! - **One statement, two dialects**: UUID, date and `IN (...)` expressions
//!   render correctly for the configured backend
//! - **Named bindings**: `:name` placeholders, checked before anything is sent
//! - **Method/kind matching**: `update()` only runs `UPDATE`, `fetch_*()` only
//!   runs `SELECT`, and so on
//! - **Multi-row inserts**: reusable fragments get per-row keys; Oracle ids
//!   come from a sequence
//! - **Pagination**: `LIMIT/OFFSET` on MySQL, `ROWNUM` windows on Oracle
//! - **Debug previews**: render a statement with its values instead of running it
//!
//! The database driver itself is not part of this crate; implement
//! [`Connection`] for it.
//!
//! ```ignore
//! use polydb::prelude::*;
//!
//! let mut db = Db::from_config(DbConfig::load("db.toml")?, driver)?;
//! let exp = db.expr();
//!
//! let id = db
//!     .insert(
//!         TableTarget::sequenced("users", "users_seq", "user_id"),
//!         &[Record::new()
//!             .set("user_guid", exp.set_uuid(&db.create_uuid()))
//!             .set("created_at", exp.set_date("2024-01-31 08:00:00")?)
//!             .set("name", "ann")],
//!     )
//!     .await?;
//!
//! let updated = db
//!     .update(&stmt("UPDATE users SET name = :name WHERE user_id = :id")
//!         .bind(":name", "anne")
//!         .bind(":id", id))
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod fragment;
pub mod insert;
pub mod pagination;
pub mod params;
pub mod prelude;
pub mod session;
pub mod statement;
pub mod value;

pub use client::{Connection, ExecResult};
pub use config::DbConfig;
pub use db::Db;
pub use dialect::Dialect;
pub use error::{DbError, DbResult};
pub use expr::Expression;
pub use fragment::Fragment;
pub use insert::{ColumnValue, Record, TableTarget, build_insert};
pub use pagination::{Bounds, PageWindow, paginate};
pub use session::Session;
pub use statement::{Preview, Statement, StatementKind, preview, quote_literal, stmt};
pub use value::{Bindings, Row, Value};
