use crate::SqlError;
use tablewright_sql::{NameError, ViewSqlError};
use thiserror::Error;

/// Everything a reconciliation call can fail with.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid name {name:?}: {reason}")]
    InvalidName {
        name: String,
        #[source]
        reason: NameError,
    },

    #[error("field {0:?} is declared more than once")]
    DuplicateField(String),

    #[error("invalid view SQL: {0}")]
    InvalidViewSql(#[from] ViewSqlError),

    #[error("unsupported {kind} operation {operation:?}")]
    UnsupportedOperation {
        kind: &'static str,
        operation: String,
    },

    #[error("invalid table reference {0:?}, expected schema.table")]
    InvalidTableRef(String),

    #[error("unsupported index method {0:?}")]
    InvalidIndexMethod(String),

    #[error("an index needs at least one column")]
    EmptyIndexColumns,

    #[error("catalog lookup of {lookup} failed: {source}")]
    Catalog {
        lookup: &'static str,
        #[source]
        source: SqlError,
    },

    #[error("table {schema}.{table} does not exist")]
    TableNotFound { schema: String, table: String },

    #[error("statement failed: {source}\n  sql: {sql}")]
    Ddl {
        sql: String,
        #[source]
        source: SqlError,
    },

    #[error("could not get a connection: {0}")]
    Pool(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Rejected before any catalog access; nothing was changed.
    Validation,
    /// An introspection query failed; no DDL was attempted.
    Catalog,
    /// A DDL statement failed; earlier statements of the same call may have been applied.
    Ddl,
    Connection,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidName { .. }
            | Error::DuplicateField(_)
            | Error::InvalidViewSql(_)
            | Error::UnsupportedOperation { .. }
            | Error::InvalidTableRef(_)
            | Error::InvalidIndexMethod(_)
            | Error::EmptyIndexColumns => ErrorKind::Validation,
            Error::Catalog { .. } | Error::TableNotFound { .. } => ErrorKind::Catalog,
            Error::Ddl { .. } => ErrorKind::Ddl,
            Error::Pool(_) => ErrorKind::Connection,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn catalog(lookup: &'static str) -> impl FnOnce(SqlError) -> Error {
        move |source| Error::Catalog { lookup, source }
    }

    pub(crate) fn ddl(sql: &str, source: SqlError) -> Error {
        Error::Ddl {
            sql: sql.to_string(),
            source,
        }
    }
}

/// Check a schema, table, column or index name.
pub fn check_name(name: &str) -> Result<(), Error> {
    tablewright_sql::validate_name(name).map_err(|reason| Error::InvalidName {
        name: name.to_string(),
        reason,
    })
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(check_name("1table").unwrap_err().kind(), ErrorKind::Validation);
        let err = Error::catalog("columns")(SqlError::new("connection reset"));
        assert_eq!(err.kind(), ErrorKind::Catalog);
        insta::assert_snapshot!(err, @"catalog lookup of columns failed: connection reset");
    }

    #[test]
    fn ddl_error_shows_statement() {
        let err = Error::ddl(
            "ALTER TABLE \"s\".\"t\" ALTER COLUMN \"id\" SET NOT NULL",
            SqlError::with_code("23502", "column \"id\" contains null values"),
        );
        assert_eq!(err.kind(), ErrorKind::Ddl);
        insta::assert_snapshot!(err, @r#"
        statement failed: column "id" contains null values
          sql: ALTER TABLE "s"."t" ALTER COLUMN "id" SET NOT NULL
        "#);
    }
}
