//! Schema creation and removal, mirrored into the schema registry table.

use crate::ddl::Step;
use crate::error::{Result, check_name};
use crate::gateway::SqlGateway;
use crate::manager::SchemaManager;
use crate::report::{Applied, WarningStep};
use tablewright_sql::{Ident, quote_ident};

/// Quote a registry reference: `schema.table` or a bare table name.
fn registry_table(registry: &str) -> String {
    match registry.split_once('.') {
        Some((schema, table)) => format!("{}.{}", Ident(schema), Ident(table)),
        None => quote_ident(registry),
    }
}

impl<G: SqlGateway> SchemaManager<G> {
    /// Create `name` if it does not exist and record it in the schema registry.
    pub async fn create_schema(&self, name: &str) -> Result<Applied> {
        check_name(name)?;
        let mut applied = Applied::default();
        self.run(
            &[Step::required(format!("CREATE SCHEMA IF NOT EXISTS {}", Ident(name)))],
            &mut applied,
        )
        .await?;

        if let Some(registry) = &self.options().schema_registry {
            let sql = format!(
                "INSERT INTO {} (schema_name, db_schemas) VALUES ($1, $1) \
                 ON CONFLICT (schema_name) DO NOTHING",
                registry_table(registry)
            );
            match self.gateway().execute(&sql, &[&name]).await {
                Ok(_) => applied.applied(sql),
                Err(e) => applied.warn(WarningStep::SchemaRegistry, Some(&sql), e.message),
            }
        }
        Ok(applied)
    }

    /// Remove `name` from the schema registry, then drop it with everything in it.
    pub async fn drop_schema(&self, name: &str) -> Result<Applied> {
        check_name(name)?;
        let mut applied = Applied::default();

        if let Some(registry) = &self.options().schema_registry {
            let sql = format!("DELETE FROM {} WHERE schema_name = $1", registry_table(registry));
            match self.gateway().execute(&sql, &[&name]).await {
                Ok(_) => applied.applied(sql),
                Err(e) => applied.warn(WarningStep::SchemaRegistry, Some(&sql), e.message),
            }
        }

        self.run(
            &[Step::required(format!("DROP SCHEMA IF EXISTS {} CASCADE", Ident(name)))],
            &mut applied,
        )
        .await?;
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqlError;
    use crate::config::ReconcileOptions;
    use crate::test_support::MockGateway;

    #[tokio::test]
    async fn create_and_drop_with_registry() {
        let manager = SchemaManager::new(MockGateway::new());
        manager.create_schema("sales").await.unwrap();
        manager.drop_schema("sales").await.unwrap();
        insta::assert_snapshot!(manager.gateway().inner().executed().join("\n"), @r#"
        CREATE SCHEMA IF NOT EXISTS "sales"
        INSERT INTO "postgrest"."schema_config" (schema_name, db_schemas) VALUES ($1, $1) ON CONFLICT (schema_name) DO NOTHING
        DELETE FROM "postgrest"."schema_config" WHERE schema_name = $1
        DROP SCHEMA IF EXISTS "sales" CASCADE
        "#);
    }

    #[tokio::test]
    async fn registry_failures_are_warnings() {
        let gw = MockGateway::new().fail(
            "schema_config",
            SqlError::new("relation \"postgrest.schema_config\" does not exist"),
        );
        let manager = SchemaManager::new(gw);
        let created = manager.create_schema("sales").await.unwrap();
        assert_eq!(created.statements.len(), 1);
        assert_eq!(created.warnings_for(WarningStep::SchemaRegistry).count(), 1);

        let dropped = manager.drop_schema("sales").await.unwrap();
        assert_eq!(dropped.statements, vec!["DROP SCHEMA IF EXISTS \"sales\" CASCADE"]);
    }

    #[tokio::test]
    async fn registry_can_be_disabled() {
        let options = ReconcileOptions {
            schema_registry: None,
            ..ReconcileOptions::default()
        };
        let manager = SchemaManager::with_options(MockGateway::new(), options);
        manager.create_schema("sales").await.unwrap();
        assert_eq!(manager.gateway().inner().executed().len(), 1);
    }
}
