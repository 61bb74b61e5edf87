//! The reconciliation entry points.

use crate::catalog::Catalog;
use crate::config::ReconcileOptions;
use crate::ddl::{ColumnSpec, Step, create_table_steps, drop_table_sql};
use crate::diff::diff_table;
use crate::error::{Error, Result, check_name};
use crate::gateway::SqlGateway;
use crate::report::Applied;
use crate::traced::Traced;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tablewright_schema::DesiredField;
use tracing::{Instrument, debug, info, info_span};

/// Operations accepted by [`SchemaManager::manage_table_schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOperation {
    Create,
    Alter,
    Drop,
}

impl FromStr for TableOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create_table" => Ok(Self::Create),
            "alter_table" => Ok(Self::Alter),
            "drop_table" => Ok(Self::Drop),
            _ => Err(Error::UnsupportedOperation {
                kind: "table",
                operation: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TableOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create_table",
            Self::Alter => "alter_table",
            Self::Drop => "drop_table",
        })
    }
}

/// Operations accepted by [`SchemaManager::manage_view_schema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewOperation {
    Create,
    /// Same as `Create`.
    Update,
    Drop,
}

impl FromStr for ViewOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create_view" => Ok(Self::Create),
            "update_view" => Ok(Self::Update),
            "drop_view" => Ok(Self::Drop),
            _ => Err(Error::UnsupportedOperation {
                kind: "view",
                operation: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ViewOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create_view",
            Self::Update => "update_view",
            Self::Drop => "drop_view",
        })
    }
}

/// Reconciles declared tables and views against a live database.
///
/// Every call reads the catalog fresh and issues its statements one at a
/// time, without a surrounding transaction: when a required statement fails,
/// the ones before it stay applied. Concurrent calls against the same table
/// or view are not coordinated; callers that race on one object need their
/// own lock.
pub struct SchemaManager<G> {
    gateway: Traced<G>,
    options: ReconcileOptions,
}

impl<G: SqlGateway> SchemaManager<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_options(gateway, ReconcileOptions::default())
    }

    pub fn with_options(gateway: G, options: ReconcileOptions) -> Self {
        Self {
            gateway: Traced::new(gateway),
            options,
        }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    pub fn gateway(&self) -> &Traced<G> {
        &self.gateway
    }

    /// Read-only catalog access through this manager's gateway.
    pub fn catalog(&self) -> Catalog<'_, Traced<G>> {
        Catalog::new(&self.gateway).excluding(&self.options.excluded_schemas)
    }

    /// Create, alter or drop a table.
    ///
    /// `operation` is one of `create_table`, `alter_table`, `drop_table`;
    /// `fields` is ignored for drops.
    pub async fn manage_table_schema(
        &self,
        interface_id: &str,
        operation: &str,
        schema: &str,
        table: &str,
        fields: &[DesiredField],
    ) -> Result<Applied> {
        let span = info_span!("manage_table_schema", interface_id, operation, schema, table);
        async {
            let op: TableOperation = operation.parse()?;
            let applied = match op {
                TableOperation::Create => self.create_table(schema, table, fields).await?,
                TableOperation::Alter => self.alter_table(schema, table, fields).await?,
                TableOperation::Drop => self.drop_table(schema, table).await?,
            };
            info!(
                statements = applied.statements.len(),
                warnings = applied.warnings.len(),
                "{op} done"
            );
            Ok::<_, Error>(applied)
        }
        .instrument(span)
        .await
    }

    /// Create, update or drop a view.
    ///
    /// `operation` is one of `create_view`, `update_view`, `drop_view`;
    /// `sql` is ignored for drops.
    pub async fn manage_view_schema(
        &self,
        interface_id: &str,
        operation: &str,
        schema: &str,
        view: &str,
        sql: &str,
    ) -> Result<Applied> {
        let span = info_span!("manage_view_schema", interface_id, operation, schema, view);
        async {
            let op: ViewOperation = operation.parse()?;
            let applied = match op {
                ViewOperation::Create => self.create_view(schema, view, sql).await?,
                ViewOperation::Update => self.update_view(schema, view, sql).await?,
                ViewOperation::Drop => self.drop_view(schema, view).await?,
            };
            info!(
                statements = applied.statements.len(),
                warnings = applied.warnings.len(),
                "{op} done"
            );
            Ok::<_, Error>(applied)
        }
        .instrument(span)
        .await
    }

    /// Create `schema.table` from `fields`.
    pub async fn create_table(
        &self,
        schema: &str,
        table: &str,
        fields: &[DesiredField],
    ) -> Result<Applied> {
        check_table_input(schema, table, fields)?;
        let mut applied = Applied::default();
        let columns = ColumnSpec::from_fields(fields, &mut applied);
        let steps = create_table_steps(schema, table, &columns);
        self.run(&steps, &mut applied).await?;
        Ok(applied)
    }

    /// Bring `schema.table` in line with `fields`.
    ///
    /// Fails with [`Error::TableNotFound`] if the table does not exist.
    pub async fn alter_table(
        &self,
        schema: &str,
        table: &str,
        fields: &[DesiredField],
    ) -> Result<Applied> {
        check_table_input(schema, table, fields)?;
        let catalog = self.catalog();
        if !catalog.table_exists(schema, table).await? {
            return Err(Error::TableNotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            });
        }
        let live = catalog.snapshot(schema, table).await?;

        let mut applied = Applied::default();
        let columns = ColumnSpec::from_fields(fields, &mut applied);
        let diff = diff_table(schema, table, &columns, &live);
        for change in &diff.changes {
            debug!(%change, "planned");
        }
        self.run(&diff.steps(), &mut applied).await?;
        Ok(applied)
    }

    /// Drop `schema.table` and everything that depends on it. Absence is not an error.
    pub async fn drop_table(&self, schema: &str, table: &str) -> Result<Applied> {
        check_name(schema)?;
        check_name(table)?;
        let mut applied = Applied::default();
        self.run(&[Step::required(drop_table_sql(schema, table))], &mut applied)
            .await?;
        Ok(applied)
    }

    /// Execute steps in order. A failed required step stops the run; a
    /// failed best-effort step becomes a warning.
    pub(crate) async fn run(&self, steps: &[Step], applied: &mut Applied) -> Result<()> {
        for step in steps {
            match self.gateway.execute(&step.sql, &[]).await {
                Ok(_) => applied.applied(&step.sql),
                Err(e) => match step.best_effort {
                    Some(kind) => applied.warn(kind, Some(&step.sql), e.message),
                    None => return Err(Error::ddl(&step.sql, e)),
                },
            }
        }
        Ok(())
    }
}

/// Names and field list must be valid before anything is sent.
fn check_table_input(schema: &str, table: &str, fields: &[DesiredField]) -> Result<()> {
    check_name(schema)?;
    check_name(table)?;
    let mut seen = HashSet::new();
    for field in fields {
        check_name(&field.name)?;
        if !seen.insert(field.name.as_str()) {
            return Err(Error::DuplicateField(field.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{COLUMNS_SQL, PRIMARY_KEY_NAME_SQL, PRIMARY_KEYS_SQL, TABLE_EXISTS_SQL};
    use crate::test_support::{MockGateway, column_row, exists, names};
    use crate::{ErrorKind, SqlError, WarningStep};

    fn users() -> Vec<DesiredField> {
        vec![
            DesiredField::new("id", "integer").primary_key().order(1),
            DesiredField::new("name", "string").not_null().order(2),
        ]
    }

    #[tokio::test]
    async fn rejects_unknown_operations_before_touching_the_database() {
        let manager = SchemaManager::new(MockGateway::new());
        let err = manager
            .manage_table_schema("iface", "truncate_table", "s1", "t1", &users())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        insta::assert_snapshot!(err, @r#"unsupported table operation "truncate_table""#);

        let err = manager
            .manage_view_schema("iface", "create_table", "s1", "v1", "SELECT 1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { kind: "view", .. }));
        assert!(manager.gateway().inner().calls().is_empty());
    }

    #[tokio::test]
    async fn rejects_bad_names_and_duplicates() {
        let manager = SchemaManager::new(MockGateway::new());
        let err = manager.create_table("s1", "table name", &users()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidName { .. }));

        let mut fields = users();
        fields.push(DesiredField::new("id", "text"));
        let err = manager.create_table("s1", "t1", &fields).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateField(name) if name == "id"));

        let err = manager
            .create_table("s1", "t1", &[DesiredField::new("bad-col", "text")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName { name, .. } if name == "bad-col"));
        assert!(manager.gateway().inner().calls().is_empty());
    }

    #[tokio::test]
    async fn create_table_warns_on_comment_failure() {
        let gw =
            MockGateway::new().fail("COMMENT ON", SqlError::new("must be owner of relation t1"));
        let manager = SchemaManager::new(gw);
        let fields = vec![
            DesiredField::new("id", "integer").primary_key(),
            DesiredField::new("name", "string").describe("Name", "display name"),
        ];
        let applied = manager
            .manage_table_schema("iface", "create_table", "s1", "t1", &fields)
            .await
            .unwrap();

        assert_eq!(applied.statements.len(), 1);
        assert!(applied.statements[0].starts_with("CREATE TABLE \"s1\".\"t1\""));
        assert_eq!(applied.warnings_for(WarningStep::TableComment).count(), 1);
        assert_eq!(applied.warnings_for(WarningStep::ColumnComment).count(), 1);
    }

    #[tokio::test]
    async fn create_table_failure_is_a_ddl_error() {
        let gw = MockGateway::new().fail(
            "CREATE TABLE",
            SqlError::with_code("42P07", "relation \"t1\" already exists"),
        );
        let manager = SchemaManager::new(gw);
        let err = manager.create_table("s1", "t1", &users()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ddl);
        // Nothing after the failed statement is attempted.
        assert_eq!(manager.gateway().inner().executed().len(), 1);
    }

    #[tokio::test]
    async fn alter_missing_table() {
        let gw = MockGateway::new().rows(TABLE_EXISTS_SQL, exists(false));
        let manager = SchemaManager::new(gw);
        let err = manager.alter_table("s1", "t1", &users()).await.unwrap_err();
        assert!(matches!(err, Error::TableNotFound { .. }));
        assert!(manager.gateway().inner().executed().is_empty());
    }

    #[tokio::test]
    async fn catalog_failure_aborts_before_any_ddl() {
        let gw = MockGateway::new()
            .rows(TABLE_EXISTS_SQL, exists(true))
            .fail(COLUMNS_SQL, SqlError::new("connection reset by peer"));
        let manager = SchemaManager::new(gw);
        let err = manager.alter_table("s1", "t1", &users()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Catalog);
        assert!(manager.gateway().inner().executed().is_empty());
    }

    fn live_users() -> MockGateway {
        MockGateway::new()
            .rows(TABLE_EXISTS_SQL, exists(true))
            .rows(
                COLUMNS_SQL,
                vec![
                    column_row("id", "integer", false, true, 1),
                    column_row("name", "character varying(255)", false, false, 2),
                ],
            )
            .rows(PRIMARY_KEYS_SQL, names(&["id"]))
            .rows(PRIMARY_KEY_NAME_SQL, names(&["t1_pkey"]))
    }

    #[tokio::test]
    async fn alter_applies_the_diff() {
        let manager = SchemaManager::new(live_users());
        let fields = vec![
            DesiredField::new("id", "integer").primary_key().order(1),
            DesiredField::new("name", "text").order(2),
            DesiredField::new("note", "text").order(3),
        ];
        let applied = manager
            .manage_table_schema("iface", "alter_table", "s1", "t1", &fields)
            .await
            .unwrap();
        insta::assert_snapshot!(applied.statements.join(";\n"), @r#"
        ALTER TABLE "s1"."t1" ADD COLUMN "note" TEXT;
        ALTER TABLE "s1"."t1" ALTER COLUMN "name" TYPE TEXT;
        ALTER TABLE "s1"."t1" ALTER COLUMN "name" DROP NOT NULL
        "#);
    }

    #[tokio::test]
    async fn alter_with_unchanged_fields_issues_no_ddl() {
        let manager = SchemaManager::new(live_users());
        for _ in 0..2 {
            let applied = manager.alter_table("s1", "t1", &users()).await.unwrap();
            assert!(applied.statements.is_empty());
        }
        assert!(manager.gateway().inner().executed().is_empty());
    }

    #[tokio::test]
    async fn primary_key_not_null_failure_is_a_warning() {
        let gw = live_users().fail(
            "ALTER COLUMN \"name\" SET NOT NULL",
            SqlError::new("column \"name\" contains null values"),
        );
        let manager = SchemaManager::new(gw);
        let fields = vec![
            DesiredField::new("id", "integer").not_null().order(1),
            DesiredField::new("name", "string").primary_key().order(2),
        ];
        let applied = manager.alter_table("s1", "t1", &fields).await.unwrap();

        assert_eq!(applied.warnings_for(WarningStep::PrimaryKeyNotNull).count(), 1);
        assert_eq!(
            applied.statements.last().map(String::as_str),
            Some("ALTER TABLE \"s1\".\"t1\" ADD PRIMARY KEY (\"name\")")
        );
    }

    #[tokio::test]
    async fn drop_table_is_a_single_idempotent_statement() {
        let manager = SchemaManager::new(MockGateway::new());
        let applied = manager
            .manage_table_schema("iface", "drop_table", "s1", "t1", &[])
            .await
            .unwrap();
        assert_eq!(applied.statements, vec!["DROP TABLE IF EXISTS \"s1\".\"t1\" CASCADE"]);
    }
}
