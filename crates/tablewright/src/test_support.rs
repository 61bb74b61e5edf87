//! A scripted in-memory gateway for unit tests.

use crate::gateway::{BoxFuture, Params, SqlError, SqlGateway, TextRow};
use std::sync::Mutex;

#[derive(Clone)]
enum Reply {
    Rows(Vec<TextRow>),
    Fail(SqlError),
}

struct Rule {
    needle: String,
    reply: Reply,
    once: bool,
}

/// Records every call and answers from canned rules.
///
/// A rule matches when its needle is a substring of the SQL text; rules are
/// tried in the order they were added. Unmatched statements succeed with zero
/// rows affected and unmatched queries return no rows.
#[derive(Default)]
pub(crate) struct MockGateway {
    calls: Mutex<Vec<String>>,
    executed: Mutex<Vec<String>>,
    rules: Mutex<Vec<Rule>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn rule(self, needle: &str, reply: Reply, once: bool) -> Self {
        self.rules.lock().unwrap().push(Rule {
            needle: needle.to_string(),
            reply,
            once,
        });
        self
    }

    pub fn rows(self, needle: &str, rows: Vec<TextRow>) -> Self {
        self.rule(needle, Reply::Rows(rows), false)
    }

    pub fn fail(self, needle: &str, err: SqlError) -> Self {
        self.rule(needle, Reply::Fail(err), false)
    }

    pub fn fail_once(self, needle: &str, err: SqlError) -> Self {
        self.rule(needle, Reply::Fail(err), true)
    }

    /// Every execute and query call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Every statement passed to `execute`, including failed ones.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    fn answer(&self, sql: &str) -> Option<Reply> {
        self.calls.lock().unwrap().push(sql.to_string());
        let mut rules = self.rules.lock().unwrap();
        let idx = rules.iter().position(|r| sql.contains(&r.needle))?;
        if rules[idx].once {
            Some(rules.remove(idx).reply)
        } else {
            Some(rules[idx].reply.clone())
        }
    }
}

impl SqlGateway for MockGateway {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        _params: Params<'a>,
    ) -> BoxFuture<'a, Result<u64, SqlError>> {
        self.executed.lock().unwrap().push(sql.to_string());
        let reply = self.answer(sql);
        Box::pin(async move {
            match reply {
                Some(Reply::Fail(e)) => Err(e),
                Some(Reply::Rows(rows)) => Ok(rows.len() as u64),
                None => Ok(0),
            }
        })
    }

    fn query<'a>(
        &'a self,
        sql: &'a str,
        _params: Params<'a>,
    ) -> BoxFuture<'a, Result<Vec<TextRow>, SqlError>> {
        let reply = self.answer(sql);
        Box::pin(async move {
            match reply {
                Some(Reply::Fail(e)) => Err(e),
                Some(Reply::Rows(rows)) => Ok(rows),
                None => Ok(Vec::new()),
            }
        })
    }
}

/// A single-column boolean row, as the existence queries return.
pub fn exists(value: bool) -> Vec<TextRow> {
    vec![TextRow::from([if value { "true" } else { "false" }])]
}

/// A row in the shape of the columns query.
pub fn column_row(
    name: &str,
    data_type: &str,
    nullable: bool,
    primary_key: bool,
    position: i32,
) -> TextRow {
    TextRow::new([
        Some(name.to_string()),
        Some(data_type.to_string()),
        Some(nullable.to_string()),
        None,
        None,
        Some(primary_key.to_string()),
        Some("false".to_string()),
        Some(position.to_string()),
        None,
        None,
        None,
    ])
}

/// Single-column rows, one per value.
pub fn names(values: &[&str]) -> Vec<TextRow> {
    values.iter().map(|v| TextRow::from([*v])).collect()
}
