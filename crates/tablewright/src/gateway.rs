//! The SQL gateway the engine talks through.
//!
//! The engine needs two primitives: run a statement and get the affected row
//! count, or run a query and get rows back. Catalog queries cast every
//! selected column to `text`, so a row is just a list of optional strings,
//! which keeps the gateway trivial to fake in tests.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A boxed, sendable future, as returned by [`SqlGateway`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Positional statement parameters.
pub type Params<'a> = &'a [&'a (dyn ToSql + Sync)];

/// SQLSTATE for "undefined object" (e.g. granting to a missing role).
pub const UNDEFINED_OBJECT: &str = "42704";

/// An error reported by the database or the connection layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SqlError {
    /// SQLSTATE code, when the server produced one.
    pub code: Option<String>,
    /// Server message text.
    pub message: String,
}

impl SqlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Whether the statement referenced a role (or other object) that does not exist.
    pub fn is_undefined_object(&self) -> bool {
        self.code.as_deref() == Some(UNDEFINED_OBJECT) || self.message.contains("does not exist")
    }
}

impl From<tokio_postgres::Error> for SqlError {
    fn from(e: tokio_postgres::Error) -> Self {
        match e.as_db_error() {
            Some(db) => Self::with_code(db.code().code(), db.message()),
            None => Self::new(e.to_string()),
        }
    }
}

impl From<deadpool_postgres::PoolError> for SqlError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        match e {
            deadpool_postgres::PoolError::Backend(e) => e.into(),
            other => Self::new(format!("pool: {other}")),
        }
    }
}

/// One result row, every column rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRow(pub Vec<Option<String>>);

impl TextRow {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self(values.into_iter().map(|v| v.map(Into::into)).collect())
    }

    fn from_pg(row: &Row) -> Result<Self, SqlError> {
        (0..row.len())
            .map(|i| row.try_get::<_, Option<String>>(i).map_err(SqlError::from))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Column `idx`, or `None` if it is NULL or out of range.
    pub fn get(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).and_then(|v| v.as_deref())
    }

    /// Column `idx` as text, with NULL read as the empty string.
    pub fn text(&self, idx: usize) -> String {
        self.get(idx).unwrap_or_default().to_string()
    }

    /// Column `idx` as optional owned text; empty strings count as absent.
    pub fn opt(&self, idx: usize) -> Option<String> {
        self.get(idx).filter(|s| !s.is_empty()).map(str::to_string)
    }

    /// Column `idx` as a boolean (`true`/`t`/`yes`).
    pub fn flag(&self, idx: usize) -> bool {
        matches!(
            self.get(idx).map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "t" | "yes")
        )
    }

    pub fn int(&self, idx: usize) -> Option<i64> {
        self.get(idx).and_then(|s| s.trim().parse().ok())
    }

    /// Column `idx` holding a JSON array of strings (from `to_json(ARRAY[...])`).
    pub fn json_list(&self, idx: usize) -> Vec<String> {
        self.get(idx)
            .and_then(|s| serde_json::from_str::<Vec<Option<String>>>(s).ok())
            .map(|items| items.into_iter().flatten().collect())
            .unwrap_or_default()
    }
}

impl<const N: usize> From<[&str; N]> for TextRow {
    fn from(values: [&str; N]) -> Self {
        Self(values.iter().map(|v| Some(v.to_string())).collect())
    }
}

/// Something that can run SQL against a Postgres-family database.
///
/// Implemented for `tokio_postgres::Client`, `deadpool_postgres::Object` and
/// `deadpool_postgres::Pool`.
pub trait SqlGateway: Send + Sync {
    /// Execute a statement, returning the number of rows affected.
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<u64, SqlError>>;

    /// Execute a query, returning all rows as text.
    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<Vec<TextRow>, SqlError>>;
}

impl<G: SqlGateway + ?Sized> SqlGateway for &G {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<u64, SqlError>> {
        (**self).execute(sql, params)
    }

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<Vec<TextRow>, SqlError>> {
        (**self).query(sql, params)
    }
}

async fn client_query(
    client: &tokio_postgres::Client,
    sql: &str,
    params: Params<'_>,
) -> Result<Vec<TextRow>, SqlError> {
    let rows = client.query(sql, params).await?;
    rows.iter().map(TextRow::from_pg).collect()
}

impl SqlGateway for tokio_postgres::Client {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<u64, SqlError>> {
        Box::pin(async move { Ok(tokio_postgres::Client::execute(self, sql, params).await?) })
    }

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<Vec<TextRow>, SqlError>> {
        Box::pin(client_query(self, sql, params))
    }
}

impl SqlGateway for deadpool_postgres::Object {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<u64, SqlError>> {
        // Deref to the underlying Client to avoid recursion
        use std::ops::Deref;
        let client: &tokio_postgres::Client = self.deref();
        Box::pin(async move { Ok(client.execute(sql, params).await?) })
    }

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<Vec<TextRow>, SqlError>> {
        use std::ops::Deref;
        let client: &tokio_postgres::Client = self.deref();
        Box::pin(client_query(client, sql, params))
    }
}

impl SqlGateway for deadpool_postgres::Pool {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<u64, SqlError>> {
        Box::pin(async move {
            let conn = self.get().await?;
            let client: &tokio_postgres::Client = &conn;
            Ok(client.execute(sql, params).await?)
        })
    }

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<Vec<TextRow>, SqlError>> {
        Box::pin(async move {
            let conn = self.get().await?;
            let client: &tokio_postgres::Client = &conn;
            client_query(client, sql, params).await
        })
    }
}
