mod support;

use polydb::{Db, DbError, DbResult, Dialect, PageWindow, Record, Row, Value, stmt};
use support::{Event, RecordingConnection, row};

#[tokio::test]
async fn session_keeps_one_connection_open() {
    let conn = RecordingConnection::mysql()
        .respond(polydb::ExecResult::affected(1).with_generated_value(9))
        .respond_rows(vec![row(&[("ID", Value::Int(9)), ("NAME", Value::from("ann"))])]);
    let mut db = Db::new(Dialect::MySql, conn);

    let mut s = db.session().await.unwrap();
    let id = s
        .insert("users", &[Record::new().set("name", "ann")])
        .await
        .unwrap()
        .unwrap();
    let found = s
        .fetch_row(&stmt("SELECT id, name FROM users WHERE id = :id").bind(":id", id))
        .await
        .unwrap()
        .unwrap();
    s.close().await.unwrap();

    assert_eq!(found.get("name"), Some(&Value::from("ann")));
    let conn = db.connection();
    assert_eq!(conn.connects(), 1);
    assert_eq!(conn.disconnects(), 1);
    assert_eq!(conn.executed().len(), 2);
}

async fn rename_and_count(db: &mut Db<RecordingConnection>) -> DbResult<Value> {
    polydb::session!(db, s, {
        s.update(&stmt("UPDATE users SET name = :n").bind(":n", "x")).await?;
        s.fetch_key("total", &stmt("SELECT COUNT(*) AS total FROM users")).await
    })
}

#[tokio::test]
async fn session_macro_closes_on_success() {
    let conn = RecordingConnection::mysql()
        .respond(polydb::ExecResult::affected(2))
        .respond_rows(vec![row(&[("TOTAL", Value::Int(2))])]);
    let mut db = Db::new(Dialect::MySql, conn);

    assert_eq!(rename_and_count(&mut db).await.unwrap(), Value::Int(2));
    assert_eq!(
        db.connection().events.first(),
        Some(&Event::Connect)
    );
    assert_eq!(db.connection().events.last(), Some(&Event::Disconnect));
}

#[tokio::test]
async fn session_macro_closes_on_error() {
    let conn = RecordingConnection::mysql().respond_err(DbError::connection("lost"));
    let mut db = Db::new(Dialect::MySql, conn);

    let err = rename_and_count(&mut db).await.unwrap_err();
    assert!(matches!(err, DbError::Connection(m) if m == "lost"));
    // The failing update stopped the block before the count ran.
    assert_eq!(db.connection().executed().len(), 1);
    assert_eq!(db.connection().disconnects(), 1);
}

#[tokio::test]
async fn mysql_chunk_appends_limit() {
    let conn = RecordingConnection::mysql().respond_rows(vec![row(&[("id", Value::Int(6))])]);
    let mut db = Db::new(Dialect::MySql, conn);

    let q = stmt("SELECT id FROM t WHERE a = :a ORDER BY id").bind(":a", 1);
    let rows = db.fetch_chunk(&q, PageWindow::new(2, 5)).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(
        db.connection().executed(),
        vec!["SELECT id FROM t WHERE a = :a ORDER BY id LIMIT 5 OFFSET 5"]
    );
    assert_eq!(db.connection().values(0), q.values());
}

#[tokio::test]
async fn oracle_chunk_wraps_and_strips_rownum() {
    let conn = RecordingConnection::oracle().respond_rows(vec![
        row(&[("ID", Value::Int(11)), ("CHUNK_RN", Value::Int(11))]),
        row(&[("ID", Value::Int(12)), ("CHUNK_RN", Value::Int(12))]),
    ]);
    let mut db = Db::new(Dialect::Oracle, conn);

    let rows = db
        .fetch_chunk(&stmt("SELECT ID FROM T ORDER BY ID"), PageWindow::new(1, 25).start(10))
        .await
        .unwrap();

    let expected: Vec<Row> = vec![row(&[("id", Value::Int(11))]), row(&[("id", Value::Int(12))])];
    assert_eq!(rows, expected);
    assert_eq!(
        db.connection().executed(),
        vec![
            "SELECT * FROM ( SELECT chunk_t.*, ROWNUM chunk_rn FROM ( SELECT ID FROM T ORDER BY ID ) chunk_t \
             WHERE ROWNUM <= 35 ) WHERE chunk_rn >= 11"
        ]
    );
}

#[tokio::test]
async fn oracle_chunk_keeps_a_user_chunk_rn_column() {
    let conn = RecordingConnection::oracle().respond_rows(vec![row(&[
        ("ID", Value::Int(1)),
        ("CHUNK_RN", Value::from("user data")),
        ("CHUNK_RN", Value::Int(1)),
    ])]);
    let mut db = Db::new(Dialect::Oracle, conn);

    let rows = db
        .fetch_chunk(&stmt("SELECT id, note chunk_rn FROM t"), PageWindow::new(1, 10))
        .await
        .unwrap();

    let expected = row(&[("id", Value::Int(1)), ("chunk_rn", Value::from("user data"))]);
    assert_eq!(rows, vec![expected]);
}

#[tokio::test]
async fn window_past_the_row_range_dispatches_nothing() {
    let mut db = Db::new(Dialect::Oracle, RecordingConnection::oracle());
    let window = PageWindow::new(4, 6_148_914_691_236_517_205);

    let rows = db.fetch_chunk(&stmt("SELECT * FROM t"), window).await.unwrap();
    assert!(rows.is_empty());
    assert!(db.connection().events.is_empty());
}

#[tokio::test]
async fn empty_window_dispatches_nothing() {
    let mut db = Db::new(Dialect::MySql, RecordingConnection::mysql());
    let q = stmt("SELECT * FROM t");

    assert!(db.fetch_chunk(&q, PageWindow::new(0, 10)).await.unwrap().is_empty());
    assert!(db.fetch_chunk(&q, PageWindow::new(1, 0)).await.unwrap().is_empty());
    assert!(
        db.fetch_chunk(&q, PageWindow::parse("abc", "10", "0"))
            .await
            .unwrap()
            .is_empty()
    );
    assert!(db.connection().events.is_empty());

    // Inside a session the window is checked before dispatch as well.
    let mut s = db.session().await.unwrap();
    assert!(s.fetch_chunk(&q, PageWindow::new(0, 10)).await.unwrap().is_empty());
    s.close().await.unwrap();
    assert!(db.connection().executed().is_empty());
}

#[tokio::test]
async fn chunk_rejects_non_select() {
    let mut db = Db::new(Dialect::MySql, RecordingConnection::mysql());
    let err = db
        .fetch_chunk(&stmt("DELETE FROM t"), PageWindow::default())
        .await
        .unwrap_err();
    assert!(err.is_wrong_statement_kind());
}

#[tokio::test]
async fn debug_session_does_not_connect() {
    let mut db = Db::new(Dialect::Oracle, RecordingConnection::oracle()).with_debug(true);
    let mut s = db.session().await.unwrap();
    let err = s
        .fetch_chunk(&stmt("SELECT * FROM T WHERE ID = :id").bind(":id", 3), PageWindow::new(2, 10))
        .await
        .unwrap_err();
    let preview = err.preview().unwrap();
    assert!(preview.prepared_query.contains("WHERE ID = 3 ) chunk_t"));
    assert!(preview.prepared_query.ends_with("chunk_rn >= 11"));
    s.close().await.unwrap();
    assert!(db.connection().events.is_empty());
}

#[tokio::test]
async fn session_exposes_dialect_and_expr() {
    let mut db = Db::new(Dialect::Oracle, RecordingConnection::oracle());
    let s = db.session().await.unwrap();
    assert_eq!(s.dialect(), Dialect::Oracle);
    let f = s.expr().set_uuid("AB-CD");
    assert_eq!(s.preview(&f.into()).prepared_query, " HEXTORAW('abcd') ");
    s.close().await.unwrap();
}
