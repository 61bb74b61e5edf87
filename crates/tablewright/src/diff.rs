//! Table diffing: compare desired columns against a live table.
//!
//! [`diff_table`] produces an ordered list of [`Change`]s; [`Change::steps`]
//! renders each one into the statements that carry it out.
//!
//! ## Ordering
//!
//! 1. added columns, in creation order
//! 2. dropped columns, in live order
//! 3. the old primary key, when the key changes
//! 4. per-column type, nullability, default and comment changes, in creation order
//! 5. the new primary key
//!
//! Dropping the old key before touching nullability lets a column that leaves
//! the key become nullable in the same pass.
//!
//! ## Defaults
//!
//! There is no "unchanged" check for defaults: whenever a field carries a
//! default that formats, every pass re-asserts it with `SET DEFAULT`.
//! Comments are re-attached the same way.

use crate::catalog::TableSnapshot;
use crate::ddl::{ColumnSpec, Step, column_list, comment_column_sql};
use crate::report::WarningStep;
use indexmap::IndexMap;
use tablewright_schema::{LiveColumn, PgType};
use tablewright_sql::{Ident, qualified};

/// Changes for a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDiff {
    pub schema: String,
    pub table: String,
    pub changes: Vec<Change>,
}

impl TableDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// All statements for this diff, in execution order.
    pub fn steps(&self) -> Vec<Step> {
        self.changes
            .iter()
            .flat_map(|c| c.steps(&self.schema, &self.table))
            .collect()
    }
}

/// A single table change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Add a new column.
    AddColumn(ColumnSpec),
    /// Drop an existing column.
    DropColumn(String),
    /// Drop the existing primary-key constraint.
    DropPrimaryKey { constraint: String },
    /// Change a column's type. `from` is the catalog's spelling.
    AlterColumnType {
        name: String,
        from: String,
        to: PgType,
    },
    /// Change a column's nullability. `true` means nullable.
    AlterColumnNullable { name: String, from: bool, to: bool },
    /// (Re)assert a column default.
    SetColumnDefault { name: String, value: String },
    /// (Re)attach a column comment.
    CommentColumn { name: String, comment: String },
    /// Add a primary key over `columns`.
    ///
    /// Each column in `ensure_not_null` first gets a best-effort `SET NOT NULL`;
    /// columns whose nullability is already being changed are left out.
    AddPrimaryKey {
        columns: Vec<String>,
        ensure_not_null: Vec<String>,
    },
}

impl Change {
    /// Statements that carry out this change on `schema.table`.
    pub fn steps(&self, schema: &str, table: &str) -> Vec<Step> {
        let t = qualified(schema, table);
        match self {
            Change::AddColumn(col) => {
                let mut steps = vec![Step::required(format!(
                    "ALTER TABLE {t} ADD COLUMN {}",
                    col.clause()
                ))];
                if let Some(comment) = &col.comment {
                    steps.push(Step::best_effort(
                        WarningStep::ColumnComment,
                        comment_column_sql(schema, table, &col.name, comment),
                    ));
                }
                steps
            }
            Change::DropColumn(name) => {
                vec![Step::required(format!("ALTER TABLE {t} DROP COLUMN {}", Ident(name)))]
            }
            Change::DropPrimaryKey { constraint } => vec![Step::required(format!(
                "ALTER TABLE {t} DROP CONSTRAINT IF EXISTS {}",
                Ident(constraint)
            ))],
            Change::AlterColumnType { name, to, .. } => vec![Step::required(format!(
                "ALTER TABLE {t} ALTER COLUMN {} TYPE {to}",
                Ident(name)
            ))],
            Change::AlterColumnNullable { name, to, .. } => {
                let action = if *to { "DROP NOT NULL" } else { "SET NOT NULL" };
                vec![Step::required(format!(
                    "ALTER TABLE {t} ALTER COLUMN {} {action}",
                    Ident(name)
                ))]
            }
            Change::SetColumnDefault { name, value } => vec![Step::required(format!(
                "ALTER TABLE {t} ALTER COLUMN {} SET DEFAULT {value}",
                Ident(name)
            ))],
            Change::CommentColumn { name, comment } => vec![Step::best_effort(
                WarningStep::ColumnComment,
                comment_column_sql(schema, table, name, comment),
            )],
            Change::AddPrimaryKey {
                columns,
                ensure_not_null,
            } => {
                let mut steps: Vec<Step> = ensure_not_null
                    .iter()
                    .map(|c| {
                        Step::best_effort(
                            WarningStep::PrimaryKeyNotNull,
                            format!("ALTER TABLE {t} ALTER COLUMN {} SET NOT NULL", Ident(c)),
                        )
                    })
                    .collect();
                steps.push(Step::required(format!(
                    "ALTER TABLE {t} ADD PRIMARY KEY ({})",
                    column_list(columns)
                )));
                steps
            }
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::AddColumn(col) => {
                let nullable = if col.nullable { " (nullable)" } else { "" };
                write!(f, "+ {}: {}{}", col.name, col.pg_type, nullable)
            }
            Change::DropColumn(name) => write!(f, "- {}", name),
            Change::DropPrimaryKey { constraint } => write!(f, "- PRIMARY KEY {}", constraint),
            Change::AlterColumnType { name, from, to } => {
                write!(f, "~ {}: {} -> {}", name, from, to)
            }
            Change::AlterColumnNullable { name, from, to } => {
                let from_str = if *from { "nullable" } else { "not null" };
                let to_str = if *to { "nullable" } else { "not null" };
                write!(f, "~ {}: {} -> {}", name, from_str, to_str)
            }
            Change::SetColumnDefault { name, value } => write!(f, "~ {} default: {}", name, value),
            Change::CommentColumn { name, .. } => write!(f, "~ {} comment", name),
            Change::AddPrimaryKey { columns, .. } => {
                write!(f, "+ PRIMARY KEY ({})", columns.join(", "))
            }
        }
    }
}

/// Compare desired columns (already in creation order) against a live table.
pub fn diff_table(
    schema: &str,
    table: &str,
    desired: &[ColumnSpec],
    live: &TableSnapshot,
) -> TableDiff {
    let desired_by_name: IndexMap<&str, &ColumnSpec> =
        desired.iter().map(|c| (c.name.as_str(), c)).collect();
    let live_by_name: IndexMap<&str, &LiveColumn> =
        live.columns.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut changes = Vec::new();

    for col in desired {
        if !live_by_name.contains_key(col.name.as_str()) {
            changes.push(Change::AddColumn(col.clone()));
        }
    }

    for col in &live.columns {
        if !desired_by_name.contains_key(col.name.as_str()) {
            changes.push(Change::DropColumn(col.name.clone()));
        }
    }

    let desired_pk: Vec<String> = desired
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.clone())
        .collect();
    let pk_changed = desired_pk != live.primary_key;
    if pk_changed && let Some(constraint) = &live.primary_key_constraint {
        changes.push(Change::DropPrimaryKey {
            constraint: constraint.clone(),
        });
    }

    for col in desired {
        let Some(live_col) = live_by_name.get(col.name.as_str()) else {
            continue;
        };
        changes.extend(modify_column(col, live_col));
    }

    if pk_changed && !desired_pk.is_empty() {
        let already_set = |name: &String| {
            changes.iter().any(|c| {
                matches!(c, Change::AlterColumnNullable { name: n, to: false, .. } if n == name)
            })
        };
        let ensure_not_null = desired_pk
            .iter()
            .filter(|name| !already_set(name))
            .cloned()
            .collect();
        changes.push(Change::AddPrimaryKey {
            columns: desired_pk,
            ensure_not_null,
        });
    }

    TableDiff {
        schema: schema.to_string(),
        table: table.to_string(),
        changes,
    }
}

fn modify_column(desired: &ColumnSpec, live: &LiveColumn) -> Vec<Change> {
    let mut changes = Vec::new();

    if !desired.pg_type.matches_catalog(&live.data_type) {
        changes.push(Change::AlterColumnType {
            name: desired.name.clone(),
            from: live.data_type.clone(),
            to: desired.pg_type,
        });
    }

    if desired.nullable != live.nullable {
        changes.push(Change::AlterColumnNullable {
            name: desired.name.clone(),
            from: live.nullable,
            to: desired.nullable,
        });
    }

    if let Some(value) = &desired.default {
        changes.push(Change::SetColumnDefault {
            name: desired.name.clone(),
            value: value.clone(),
        });
    }

    if let Some(comment) = &desired.comment {
        changes.push(Change::CommentColumn {
            name: desired.name.clone(),
            comment: comment.clone(),
        });
    }

    changes
}
