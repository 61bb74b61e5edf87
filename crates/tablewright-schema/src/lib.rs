//! Schema model types for tablewright.
//!
//! This crate holds the types shared by the catalog inspector, the diff
//! engine and the DDL executor:
//! - [`SemanticType`] and [`PgType`]: the closed vocabulary of field types and
//!   the native Postgres types they map to
//! - [`format_default`]: validation and formatting of default values
//! - [`DesiredField`]: one declared column
//! - [`LiveColumn`], [`Constraint`], [`Index`], [`TableDefinition`]: what the
//!   catalog reports

mod catalog;
mod default_value;
mod field;
mod types;

pub use catalog::{
    Constraint, ConstraintKind, Index, IndexMethod, LiveColumn, TableDefinition,
    UnknownIndexMethod,
};
pub use default_value::{DATE_FORMAT, DATETIME_FORMAT, TIME_FORMAT, format_default};
pub use field::{DesiredField, creation_order, primary_key_columns};
pub use types::{PgType, SemanticType, VARCHAR_LEN};
