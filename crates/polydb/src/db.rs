//! The statement executor.
//!
//! Every method on [`Db`] is a one-statement [`Session`]: it checks the
//! statement, connects, runs, and disconnects again whether or not the
//! statement succeeded. A statement that fails its checks never connects.
//! Chain several statements on one connection with [`Db::session`] or
//! [`session!`](crate::session!).
//!
//! # Example
//!
//! ```ignore
//! use polydb::{Db, DbConfig, PageWindow, stmt};
//!
//! # async fn demo(conn: MyDriver) -> polydb::DbResult<()> {
//! let mut db = Db::open(DbConfig::load("db.toml")?, conn).await?;
//! let exp = db.expr();
//!
//! let mut q = stmt(format!(
//!     "SELECT {} AS id, {} AS created FROM users WHERE user_id",
//!     exp.get_uuid("user_id")?,
//!     exp.get_date("created_at", true)?,
//! ));
//! q.push_fragment(&exp.in_list(["a1", "b2"]))?;
//! let page = db.fetch_chunk(&q, PageWindow::new(2, 25)).await?;
//! # Ok(()) }
//! ```

use crate::client::{Connection, ExecResult};
use crate::config::DbConfig;
use crate::dialect::Dialect;
use crate::error::DbResult;
use crate::expr::Expression;
use crate::insert::{Record, TableTarget, build_insert};
use crate::pagination::PageWindow;
use crate::session::{Accept, Session, prepare};
use crate::statement::{Preview, Statement, StatementKind, preview};
use crate::value::{Row, Value};
use uuid::Uuid;

/// Runs the given block on one open [`Session`].
///
/// - Connects via `$db.session().await`.
/// - Disconnects after the block, on `Ok(_)` and on `Err(_)`.
///
/// The block must evaluate to `polydb::DbResult<T>`.
///
/// # Example
///
/// ```ignore
/// let user = polydb::session!(&mut db, s, {
///     let id = s.insert("users", &[Record::new().set("name", "ann")]).await?;
///     s.fetch_row(&stmt("SELECT * FROM users WHERE id = :id").bind(":id", id)).await
/// })?;
/// ```
#[macro_export]
macro_rules! session {
    ($db:expr, $s:ident, $body:block) => {{
        let mut $s = ($db).session().await?;
        let __polydb_session_result = async { $body }.await;
        $s.finish(__polydb_session_result).await
    }};
}

/// A dialect-aware executor over one connection.
pub struct Db<C: Connection> {
    pub(crate) conn: C,
    pub(crate) dialect: Dialect,
    pub(crate) config: DbConfig,
    pub(crate) debug: bool,
    pub(crate) log_sql_max_length: usize,
}

impl<C: Connection> Db<C> {
    /// Executor for `dialect` with default settings.
    pub fn new(dialect: Dialect, conn: C) -> Self {
        let config = DbConfig::new(dialect.name());
        Self {
            conn,
            dialect,
            debug: config.debug,
            log_sql_max_length: config.log_sql_max_length,
            config,
        }
    }

    /// Executor configured from `config`. Does not connect.
    pub fn from_config(config: DbConfig, conn: C) -> DbResult<Self> {
        let dialect = config.dialect()?;
        Ok(Self {
            conn,
            dialect,
            debug: config.debug,
            log_sql_max_length: config.log_sql_max_length,
            config,
        })
    }

    /// Like [`Db::from_config`], then connects and disconnects once so a bad
    /// configuration fails here rather than on the first statement.
    pub async fn open(config: DbConfig, conn: C) -> DbResult<Self> {
        let mut db = Self::from_config(config, conn)?;
        db.conn.connect().await?;
        db.conn.disconnect().await?;
        tracing::debug!(target: "polydb.session", dialect = %db.dialect, "connection verified");
        Ok(db)
    }

    /// Turn debug mode on or off. In debug mode statements are rendered and
    /// returned as [`DbError::Preview`](crate::DbError::Preview) instead of
    /// being executed.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Expression engine for this dialect, quoting with the connection's
    /// identifier quote.
    pub fn expr(&self) -> Expression {
        Expression::with_quote(self.dialect, self.conn.identifier_quote_char())
    }

    /// Lower-cased platform name reported by the connection.
    pub fn platform_name(&self) -> String {
        self.conn.platform_name().to_lowercase()
    }

    /// A random identifier: 32 lowercase hex characters.
    pub fn create_uuid(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Render `statement` with its values quoted by the connection.
    pub fn preview(&self, statement: &Statement) -> Preview {
        preview(statement, |v| self.conn.quote_literal(v))
    }

    /// Open a session on this connection.
    pub async fn session(&mut self) -> DbResult<Session<'_, C>> {
        Session::open(self).await
    }

    /// Close the connection.
    pub async fn disconnect(&mut self) -> DbResult<()> {
        self.conn.disconnect().await?;
        tracing::trace!(target: "polydb.session", dialect = %self.dialect, "disconnected");
        Ok(())
    }

    pub async fn fetch_rows(&mut self, statement: &Statement) -> DbResult<Vec<Row>> {
        prepare(self.dialect, "fetch_rows", Accept::Only(StatementKind::Select), statement)?;
        let mut session = self.session().await?;
        let result = session.fetch_rows(statement).await;
        session.finish(result).await
    }

    pub async fn fetch_row(&mut self, statement: &Statement) -> DbResult<Option<Row>> {
        prepare(self.dialect, "fetch_row", Accept::Only(StatementKind::Select), statement)?;
        let mut session = self.session().await?;
        let result = session.fetch_row(statement).await;
        session.finish(result).await
    }

    pub async fn fetch_column(&mut self, statement: &Statement) -> DbResult<Vec<Value>> {
        prepare(self.dialect, "fetch_column", Accept::Only(StatementKind::Select), statement)?;
        let mut session = self.session().await?;
        let result = session.fetch_column(statement).await;
        session.finish(result).await
    }

    /// See [`Session::fetch_key`].
    pub async fn fetch_key(&mut self, key: &str, statement: &Statement) -> DbResult<Value> {
        prepare(self.dialect, "fetch_key", Accept::Only(StatementKind::Select), statement)?;
        let mut session = self.session().await?;
        let result = session.fetch_key(key, statement).await;
        session.finish(result).await
    }

    /// One page of a `SELECT`. An unresolvable window returns no rows without
    /// connecting.
    pub async fn fetch_chunk(
        &mut self,
        statement: &Statement,
        window: PageWindow,
    ) -> DbResult<Vec<Row>> {
        prepare(self.dialect, "fetch_chunk", Accept::Only(StatementKind::Select), statement)?;
        if window.bounds().is_none() {
            return Ok(Vec::new());
        }
        let mut session = self.session().await?;
        let result = session.fetch_chunk(statement, window).await;
        session.finish(result).await
    }

    pub async fn update(&mut self, statement: &Statement) -> DbResult<u64> {
        prepare(self.dialect, "update", Accept::Only(StatementKind::Update), statement)?;
        let mut session = self.session().await?;
        let result = session.update(statement).await;
        session.finish(result).await
    }

    pub async fn delete(&mut self, statement: &Statement) -> DbResult<u64> {
        prepare(self.dialect, "delete", Accept::Only(StatementKind::Delete), statement)?;
        let mut session = self.session().await?;
        let result = session.delete(statement).await;
        session.finish(result).await
    }

    /// See [`Session::query`].
    pub async fn query(&mut self, statement: &Statement) -> DbResult<ExecResult> {
        prepare(self.dialect, "query", Accept::Other, statement)?;
        let mut session = self.session().await?;
        let result = session.query(statement).await;
        session.finish(result).await
    }

    /// See [`Session::insert`].
    pub async fn insert(
        &mut self,
        target: impl Into<TableTarget>,
        rows: &[Record],
    ) -> DbResult<Option<i64>> {
        let target = target.into();
        build_insert(self.dialect, &target, rows)?;
        let mut session = self.session().await?;
        let result = session.insert(target, rows).await;
        session.finish(result).await
    }

    /// See [`Session::import_sql`].
    pub async fn import_sql(&mut self, script: &str) -> DbResult<()> {
        let mut session = self.session().await?;
        let result = session.import_sql(script).await;
        session.finish(result).await
    }
}
