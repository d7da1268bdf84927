//! Scoped use of an open connection.
//!
//! A [`Session`] is what every [`Db`] method runs through: connect, run one or
//! more statements, disconnect. Open one explicitly with [`Db::session`] (or
//! the [`session!`](crate::session!) macro) to run several statements on the
//! same connection.
//!
//! ```ignore
//! let mut s = db.session().await?;
//! let id = s.insert("users", &[Record::new().set("name", "ann")]).await;
//! let rows = match id {
//!     Ok(_) => s.fetch_rows(&stmt("SELECT * FROM users")).await,
//!     Err(e) => Err(e),
//! };
//! let rows = s.finish(rows).await?;
//! ```

use crate::client::{Connection, ExecResult};
use crate::db::Db;
use crate::dialect::Dialect;
use crate::error::{DbError, DbResult};
use crate::expr::Expression;
use crate::insert::{Record, TableTarget, build_insert, next_value_sql};
use crate::pagination::{ORACLE_ROWNUM_COLUMN, PageWindow, paginate};
use crate::statement::{Preview, Statement, StatementKind};
use crate::value::{Row, Value};

/// Statement kinds a method accepts.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Accept {
    Only(StatementKind),
    /// `query()`: anything that is not one of the four DML kinds.
    Other,
}

/// Kind check and binding validation, done before any connection is touched.
pub(crate) fn prepare(
    dialect: Dialect,
    method: &'static str,
    accept: Accept,
    statement: &Statement,
) -> DbResult<StatementKind> {
    let kind = statement.kind();
    let ok = match accept {
        Accept::Only(expected) => kind == expected,
        Accept::Other => kind == StatementKind::Other,
    };
    if !ok {
        return Err(DbError::WrongStatementKind {
            method,
            found: kind,
            hint: kind.dedicated_method(),
        });
    }
    statement.validate(dialect)?;
    Ok(kind)
}

/// Longest prefix of `sql` that fits in `max_bytes` and ends on a char
/// boundary. `0` means no limit.
fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if max_bytes == 0 || sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// An open connection borrowed from a [`Db`].
///
/// Dropping a session without [`close`](Session::close) or
/// [`finish`](Session::finish) leaves the connection open.
pub struct Session<'a, C: Connection> {
    db: &'a mut Db<C>,
    connected: bool,
}

impl<'a, C: Connection> Session<'a, C> {
    /// Open a session. In debug mode nothing is dispatched, so the connection
    /// is left alone.
    pub(crate) async fn open(db: &'a mut Db<C>) -> DbResult<Self> {
        let connected = if db.debug {
            false
        } else {
            db.conn.connect().await?;
            tracing::trace!(target: "polydb.session", dialect = %db.dialect, "connected");
            true
        };
        Ok(Self { db, connected })
    }

    pub fn dialect(&self) -> Dialect {
        self.db.dialect
    }

    /// Expression engine using the connection's identifier quote.
    pub fn expr(&self) -> Expression {
        self.db.expr()
    }

    /// Render a statement the way debug mode would.
    pub fn preview(&self, statement: &Statement) -> Preview {
        self.db.preview(statement)
    }

    /// Disconnect and end the session.
    pub async fn close(self) -> DbResult<()> {
        if !self.connected {
            return Ok(());
        }
        self.db.conn.disconnect().await?;
        tracing::trace!(target: "polydb.session", dialect = %self.db.dialect, "disconnected");
        Ok(())
    }

    /// Close the session and hand back `result`.
    ///
    /// The statement error wins over a disconnect error; the latter is logged.
    pub async fn finish<T>(self, result: DbResult<T>) -> DbResult<T> {
        match (result, self.close().await) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_err)) => Err(close_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(close_err)) => {
                tracing::warn!(
                    target: "polydb.session",
                    error = %close_err,
                    "disconnect failed after statement error"
                );
                Err(err)
            }
        }
    }

    /// All rows of a `SELECT`.
    pub async fn fetch_rows(&mut self, statement: &Statement) -> DbResult<Vec<Row>> {
        let result = self
            .dispatch("fetch_rows", Accept::Only(StatementKind::Select), statement)
            .await?;
        Ok(result.rows)
    }

    /// First row of a `SELECT`, if any.
    pub async fn fetch_row(&mut self, statement: &Statement) -> DbResult<Option<Row>> {
        self.fetch_row_as("fetch_row", statement).await
    }

    /// First value of every row.
    pub async fn fetch_column(&mut self, statement: &Statement) -> DbResult<Vec<Value>> {
        let result = self
            .dispatch("fetch_column", Accept::Only(StatementKind::Select), statement)
            .await?;
        Ok(result
            .rows
            .into_iter()
            .filter_map(|row| row.into_values().into_iter().next())
            .collect())
    }

    /// Value of column `key` in the first row.
    ///
    /// Returns an empty text value when there is no row or no such column.
    /// The key is matched after trimming and lower-casing, like row columns.
    pub async fn fetch_key(&mut self, key: &str, statement: &Statement) -> DbResult<Value> {
        let key = key.trim().to_lowercase();
        let row = self.fetch_row_as("fetch_key", statement).await?;
        Ok(row
            .and_then(|row| row.get(&key).cloned())
            .unwrap_or_else(|| Value::Text(String::new())))
    }

    async fn fetch_row_as(
        &mut self,
        method: &'static str,
        statement: &Statement,
    ) -> DbResult<Option<Row>> {
        let result = self
            .dispatch(method, Accept::Only(StatementKind::Select), statement)
            .await?;
        Ok(result.rows.into_iter().next())
    }

    /// One page of a `SELECT`.
    ///
    /// A window that does not resolve returns no rows without dispatching.
    pub async fn fetch_chunk(
        &mut self,
        statement: &Statement,
        window: PageWindow,
    ) -> DbResult<Vec<Row>> {
        let kind = prepare(
            self.db.dialect,
            "fetch_chunk",
            Accept::Only(StatementKind::Select),
            statement,
        )?;
        let Some(bounds) = window.bounds() else {
            return Ok(Vec::new());
        };
        let dialect = self.db.dialect;
        let paged = Statement::with_values(
            paginate(dialect, statement.sql(), bounds),
            statement.values().clone(),
        );
        let rows = self.run("fetch_chunk", kind, &paged).await?.rows;
        Ok(match dialect {
            Dialect::MySql => rows,
            Dialect::Oracle => rows
                .into_iter()
                .map(|mut row| {
                    // The wrap appends the row number after the query's own columns.
                    row.remove_last(ORACLE_ROWNUM_COLUMN);
                    row
                })
                .collect(),
        })
    }

    /// Run an `UPDATE`, returning the affected row count.
    pub async fn update(&mut self, statement: &Statement) -> DbResult<u64> {
        let result = self
            .dispatch("update", Accept::Only(StatementKind::Update), statement)
            .await?;
        Ok(result.affected_rows)
    }

    /// Run a `DELETE`, returning the affected row count.
    pub async fn delete(&mut self, statement: &Statement) -> DbResult<u64> {
        let result = self
            .dispatch("delete", Accept::Only(StatementKind::Delete), statement)
            .await?;
        Ok(result.affected_rows)
    }

    /// Run any statement that is not a `SELECT`, `INSERT`, `UPDATE` or
    /// `DELETE`: DDL, procedure calls, PL/SQL blocks.
    pub async fn query(&mut self, statement: &Statement) -> DbResult<ExecResult> {
        self.dispatch("query", Accept::Other, statement).await
    }

    /// Insert `rows` into `target`.
    ///
    /// MySQL returns the id of the last inserted row, computed as the first
    /// generated id plus `rows - 1`. This holds for a contiguous
    /// auto-increment block (step 1, no interleaved writers). Returns `None`
    /// when the table has no auto-increment column.
    ///
    /// Oracle with a [`TableTarget::Sequenced`] target reads one sequence value
    /// per row, stores it in the sequence column and returns the last one.
    /// A bare Oracle table returns `None`.
    pub async fn insert(
        &mut self,
        target: impl Into<TableTarget>,
        rows: &[Record],
    ) -> DbResult<Option<i64>> {
        let target = target.into();
        let dialect = self.db.dialect;
        // Build once up front so bad input fails before a sequence is consumed.
        let statement = build_insert(dialect, &target, rows)?;

        match (dialect, target.sequence()?) {
            (Dialect::MySql, _) => {
                let result = self.run_insert(&statement).await?;
                let first = result.generated_value;
                if first == 0 {
                    return Ok(None);
                }
                let last = i64::try_from(rows.len() - 1)
                    .ok()
                    .and_then(|extra| first.checked_add(extra))
                    .ok_or_else(|| {
                        DbError::decode("generated_value", "last insert id does not fit in i64")
                    })?;
                Ok(Some(last))
            }
            (Dialect::Oracle, None) => {
                self.run_insert(&statement).await?;
                Ok(None)
            }
            (Dialect::Oracle, Some((sequence, column))) => {
                let column = column.to_uppercase();
                let next = Statement::new(next_value_sql(sequence));
                let mut seeded = rows.to_vec();
                let mut last = None;
                for row in &mut seeded {
                    let id = self.fetch_key("nextval", &next).await?.try_i64("nextval")?;
                    row.put_ignore_case(&column, id);
                    last = Some(id);
                }
                let statement = build_insert(dialect, &target, &seeded)?;
                self.run_insert(&statement).await?;
                Ok(last)
            }
        }
    }

    async fn run_insert(&mut self, statement: &Statement) -> DbResult<ExecResult> {
        self.dispatch("insert", Accept::Only(StatementKind::Insert), statement)
            .await
    }

    /// Run a SQL script.
    ///
    /// MySQL receives the whole script at once. Oracle gets one statement per
    /// `;`-separated piece, in order. Scripts are not checked for kind or
    /// placeholders and bind nothing.
    pub async fn import_sql(&mut self, script: &str) -> DbResult<()> {
        match self.db.dialect {
            Dialect::MySql => {
                if script.trim().is_empty() {
                    return Ok(());
                }
                let statement = Statement::new(script);
                self.run("import_sql", statement.kind(), &statement).await?;
            }
            Dialect::Oracle => {
                for piece in script.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                    let statement = Statement::new(piece);
                    self.run("import_sql", statement.kind(), &statement).await?;
                }
            }
        }
        Ok(())
    }

    async fn dispatch(
        &mut self,
        method: &'static str,
        accept: Accept,
        statement: &Statement,
    ) -> DbResult<ExecResult> {
        let kind = prepare(self.db.dialect, method, accept, statement)?;
        self.run(method, kind, statement).await
    }

    /// Execute (or in debug mode, preview) an already checked statement.
    async fn run(
        &mut self,
        method: &'static str,
        kind: StatementKind,
        statement: &Statement,
    ) -> DbResult<ExecResult> {
        if self.db.debug {
            let rendered = self.db.preview(statement);
            tracing::info!(
                target: "polydb.sql",
                method,
                kind = %kind,
                sql = %rendered.prepared_query,
                "debug preview, not executed"
            );
            return Err(DbError::Preview(Box::new(rendered)));
        }

        tracing::debug!(
            target: "polydb.sql",
            method,
            kind = %kind,
            params = statement.values().len(),
            sql = %truncate_sql_bytes(statement.sql(), self.db.log_sql_max_length),
            "dispatch"
        );

        let mut result = self
            .db
            .conn
            .execute(statement.sql(), statement.values())
            .await?;
        result.rows = result.rows.into_iter().map(Row::normalize).collect();
        Ok(result)
    }
}
