//! Traced gateway wrapper.
//!
//! Wraps any [`SqlGateway`] and logs every statement and query via tracing.

use crate::gateway::{BoxFuture, Params, SqlError, SqlGateway, TextRow};
use tracing::Instrument;

/// A gateway that logs all statements via tracing.
///
/// This is a thin wrapper that delegates to the underlying gateway but adds
/// `tracing::debug_span!` around each execute/query call.
///
/// # Example
///
/// ```ignore
/// use tablewright::Traced;
///
/// let traced = Traced::new(pool);
///
/// // All statements are now logged at debug level
/// traced.execute("DROP VIEW IF EXISTS \"s\".\"v\" CASCADE", &[]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Traced<G> {
    inner: G,
}

impl<G: SqlGateway> Traced<G> {
    /// Create a new traced gateway wrapper.
    pub fn new(inner: G) -> Self {
        Self { inner }
    }

    /// Get the wrapped gateway.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn into_inner(self) -> G {
        self.inner
    }
}

impl<G: SqlGateway> SqlGateway for Traced<G> {
    fn execute<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<u64, SqlError>> {
        let span = tracing::debug_span!(
            "db.execute",
            sql = %sql,
            params = params.len(),
            affected = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        Box::pin(async move {
            match self.inner.execute(sql, params).instrument(span.clone()).await {
                Ok(affected) => {
                    span.record("affected", affected);
                    Ok(affected)
                }
                Err(e) => {
                    span.record("error", tracing::field::display(&e));
                    Err(e)
                }
            }
        })
    }

    fn query<'a>(
        &'a self,
        sql: &'a str,
        params: Params<'a>,
    ) -> BoxFuture<'a, Result<Vec<TextRow>, SqlError>> {
        let span = tracing::debug_span!(
            "db.query",
            sql = %sql,
            params = params.len(),
            rows = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        Box::pin(async move {
            match self.inner.query(sql, params).instrument(span.clone()).await {
                Ok(rows) => {
                    span.record("rows", rows.len());
                    Ok(rows)
                }
                Err(e) => {
                    span.record("error", tracing::field::display(&e));
                    Err(e)
                }
            }
        })
    }
}
