#![allow(dead_code)]

use polydb::{Bindings, Connection, DbError, DbResult, ExecResult, Row};
use std::collections::VecDeque;

/// What the connection saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connect,
    Disconnect,
    Execute { sql: String, values: Bindings },
}

/// A scripted connection that records every call.
///
/// `execute` answers with the queued responses in order, then with an empty
/// result once the queue runs dry.
pub struct RecordingConnection {
    pub events: Vec<Event>,
    responses: VecDeque<DbResult<ExecResult>>,
    platform: &'static str,
    quote: char,
    fail_connect: bool,
    fail_disconnect: bool,
}

impl RecordingConnection {
    pub fn mysql() -> Self {
        Self::new("MySQL", '`')
    }

    pub fn oracle() -> Self {
        Self::new("Oracle", '"')
    }

    fn new(platform: &'static str, quote: char) -> Self {
        Self {
            events: Vec::new(),
            responses: VecDeque::new(),
            platform,
            quote,
            fail_connect: false,
            fail_disconnect: false,
        }
    }

    pub fn respond(mut self, result: ExecResult) -> Self {
        self.responses.push_back(Ok(result));
        self
    }

    pub fn respond_rows(self, rows: Vec<Row>) -> Self {
        self.respond(ExecResult::rows(rows))
    }

    pub fn respond_err(mut self, err: DbError) -> Self {
        self.responses.push_back(Err(err));
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    /// SQL of every executed statement.
    pub fn executed(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Execute { sql, .. } => Some(sql.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Bindings of the `n`th executed statement.
    pub fn values(&self, n: usize) -> &Bindings {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Execute { values, .. } => Some(values),
                _ => None,
            })
            .nth(n)
            .expect("statement was not executed")
    }

    pub fn connects(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Connect).count()
    }

    pub fn disconnects(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Disconnect).count()
    }
}

impl Connection for RecordingConnection {
    async fn connect(&mut self) -> DbResult<()> {
        if self.fail_connect {
            return Err(DbError::connection("connection refused"));
        }
        self.events.push(Event::Connect);
        Ok(())
    }

    async fn disconnect(&mut self) -> DbResult<()> {
        if self.fail_disconnect {
            return Err(DbError::connection("disconnect failed"));
        }
        self.events.push(Event::Disconnect);
        Ok(())
    }

    async fn execute(&mut self, sql: &str, values: &Bindings) -> DbResult<ExecResult> {
        self.events.push(Event::Execute {
            sql: sql.to_string(),
            values: values.clone(),
        });
        self.responses.pop_front().unwrap_or_else(|| Ok(ExecResult::default()))
    }

    fn identifier_quote_char(&self) -> char {
        self.quote
    }

    fn platform_name(&self) -> String {
        self.platform.to_string()
    }
}

pub fn row(pairs: &[(&str, polydb::Value)]) -> Row {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}
