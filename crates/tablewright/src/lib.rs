//! Reconcile declared tables and views against a live Postgres catalog.
//!
//! Given the columns a table should have, tablewright reads the table's live
//! shape from the catalog and issues the DDL that closes the gap: create the
//! table, add, drop or modify columns, replace the primary key. Views are
//! created or replaced from their query text, recreated when Postgres refuses
//! an in-place replace, and re-granted afterwards.
//!
//! ```ignore
//! use tablewright::{Config, DesiredField, SchemaManager};
//!
//! let config = Config::from_env()?;
//! let manager = SchemaManager::with_options(config.create_pool()?, config.reconcile_options());
//!
//! let fields = vec![
//!     DesiredField::new("id", "integer").primary_key().order(1),
//!     DesiredField::new("name", "string").not_null().order(2),
//! ];
//! let applied = manager
//!     .manage_table_schema("orders-api", "create_table", "s1", "t1", &fields)
//!     .await?;
//! for warning in &applied.warnings {
//!     tracing::warn!(%warning, "degraded");
//! }
//! ```
//!
//! # Partial application
//!
//! Statements run one at a time with no surrounding transaction. When a
//! required statement fails the call returns [`Error::Ddl`] and whatever ran
//! before it stays applied. Best-effort steps (comments, grants, the
//! pre-emptive `SET NOT NULL` before a primary key) never fail the call;
//! they show up in [`Applied::warnings`].

mod catalog;
mod config;
mod data;
mod ddl;
mod diff;
mod error;
mod gateway;
mod index;
mod manager;
mod report;
mod schemas;
mod traced;
mod view;

#[cfg(test)]
mod test_support;

pub use catalog::{Catalog, TableSnapshot};
pub use config::{Config, DEFAULT_BASELINE_ROLES, DEFAULT_SCHEMA_REGISTRY, ReconcileOptions};
pub use data::TablePage;
pub use ddl::{ColumnSpec, Step};
pub use diff::{Change, TableDiff, diff_table};
pub use error::{Error, ErrorKind, Result, check_name};
pub use gateway::{BoxFuture, Params, SqlError, SqlGateway, TextRow};
pub use manager::{SchemaManager, TableOperation, ViewOperation};
pub use report::{Applied, Warning, WarningStep};
pub use traced::Traced;
pub use view::{INCOMPATIBLE_VIEW_PATTERNS, is_incompatible_view_change};

pub use tablewright_schema::{
    Constraint, ConstraintKind, DesiredField, Index, IndexMethod, LiveColumn, PgType,
    SemanticType, TableDefinition,
};
