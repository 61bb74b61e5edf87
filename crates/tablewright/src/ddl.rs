//! DDL text generation.
//!
//! Everything here is pure: it turns desired fields into column clauses and
//! whole statements. Running them is the executor's job.

use crate::report::{Applied, WarningStep};
use tablewright_schema::{DesiredField, PgType, creation_order, format_default};
use tablewright_sql::{Ident, Lit, qualified, quote_ident};

/// A desired column, resolved to its native type and formatted default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub pg_type: PgType,
    pub nullable: bool,
    /// Formatted default expression, ready to go after `DEFAULT`.
    pub default: Option<String>,
    pub primary_key: bool,
    pub unique: bool,
    pub check: Option<String>,
    pub comment: Option<String>,
}

impl ColumnSpec {
    /// Resolve a field. Unrecognized types and defaults that do not validate
    /// for the column type are recorded as warnings on `report`.
    pub fn from_field(field: &DesiredField, report: &mut Applied) -> Self {
        let semantic = field.semantic_type();
        if !semantic.is_recognized() {
            report.warn(
                WarningStep::UnrecognizedType,
                None,
                format!(
                    "field {:?} has unrecognized type {:?}, stored as {}",
                    field.name,
                    field.data_type,
                    semantic.pg_type()
                ),
            );
        }
        let pg_type = semantic.pg_type();

        let default = field.default.as_deref().and_then(|raw| {
            let formatted = format_default(raw, pg_type);
            if formatted.is_none() && !raw.trim().is_empty() {
                report.warn(
                    WarningStep::DroppedDefault,
                    None,
                    format!("default {raw:?} is not valid for {} column {:?}", pg_type, field.name),
                );
            }
            formatted
        });

        Self {
            name: field.name.clone(),
            pg_type,
            nullable: field.allows_null(),
            default,
            primary_key: field.primary_key,
            unique: field.unique,
            check: field.check.clone().filter(|c| !c.trim().is_empty()),
            comment: field.comment(),
        }
    }

    /// Resolve a field list, in creation order.
    pub fn from_fields(fields: &[DesiredField], report: &mut Applied) -> Vec<Self> {
        creation_order(fields)
            .into_iter()
            .map(|f| Self::from_field(f, report))
            .collect()
    }

    /// The column definition used by both `CREATE TABLE` and `ADD COLUMN`.
    ///
    /// The primary key is never declared inline; it is added as a table
    /// constraint so composite keys work the same way as single ones.
    pub fn clause(&self) -> String {
        let mut sql = format!("{} {}", Ident(&self.name), self.pg_type);
        if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        if self.unique && !self.primary_key {
            sql.push_str(" UNIQUE");
        }
        if let Some(check) = &self.check {
            sql.push_str(&format!(" CHECK ({check})"));
        }
        sql
    }
}

/// One statement, and what to do if it fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub sql: String,
    /// `None` aborts the operation on failure; `Some` records a warning and carries on.
    pub best_effort: Option<WarningStep>,
}

impl Step {
    pub fn required(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            best_effort: None,
        }
    }

    pub fn best_effort(step: WarningStep, sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            best_effort: Some(step),
        }
    }
}

/// Text of the comment attached to every created table.
pub fn table_comment_text(table: &str) -> String {
    format!("data interface table: {table}")
}

pub fn comment_table_sql(schema: &str, table: &str, comment: &str) -> String {
    format!("COMMENT ON TABLE {} IS {}", qualified(schema, table), Lit(comment))
}

pub fn comment_column_sql(schema: &str, table: &str, column: &str, comment: &str) -> String {
    format!(
        "COMMENT ON COLUMN {}.{} IS {}",
        qualified(schema, table),
        Ident(column),
        Lit(comment)
    )
}

/// `"a", "b"` for a column list.
pub fn column_list<S: AsRef<str>>(columns: &[S]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `CREATE TABLE` followed by the table and column comments.
///
/// `columns` must already be in creation order.
pub fn create_table_steps(schema: &str, table: &str, columns: &[ColumnSpec]) -> Vec<Step> {
    let mut defs: Vec<String> = columns.iter().map(ColumnSpec::clause).collect();
    let pk: Vec<&str> = columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();
    if !pk.is_empty() {
        defs.push(format!("PRIMARY KEY ({})", column_list(&pk)));
    }

    let mut steps = vec![Step::required(format!(
        "CREATE TABLE {} (\n    {}\n)",
        qualified(schema, table),
        defs.join(",\n    ")
    ))];
    steps.push(Step::best_effort(
        WarningStep::TableComment,
        comment_table_sql(schema, table, &table_comment_text(table)),
    ));
    for column in columns {
        if let Some(comment) = &column.comment {
            steps.push(Step::best_effort(
                WarningStep::ColumnComment,
                comment_column_sql(schema, table, &column.name, comment),
            ));
        }
    }
    steps
}

pub fn drop_table_sql(schema: &str, table: &str) -> String {
    format!("DROP TABLE IF EXISTS {} CASCADE", qualified(schema, table))
}
