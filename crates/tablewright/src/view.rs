//! View reconciliation.
//!
//! A view is never diffed. Create and update both try `CREATE OR REPLACE
//! VIEW`; if Postgres refuses because the new column list is incompatible,
//! the view is dropped (with dependents) and created again. Grants do not
//! survive that, so the view's own readers are read before the drop, and
//! every successful (re)create ends by granting `SELECT` to the baseline
//! roles, to those earlier readers and to every role that already reads the
//! schema.

use crate::error::{Error, Result, check_name};
use crate::gateway::{SqlError, SqlGateway};
use crate::manager::SchemaManager;
use crate::report::{Applied, WarningStep};
use indexmap::IndexSet;
use tablewright_sql::{Ident, check_view_sql, qualified, view_body};
use tracing::{debug, info};

/// Message fragments that mark a `CREATE OR REPLACE VIEW` failure as
/// recoverable by drop-and-recreate.
pub const INCOMPATIBLE_VIEW_PATTERNS: &[&str] =
    &["cannot change", "cannot drop", "cannot be replaced"];

/// Whether a failed `CREATE OR REPLACE VIEW` can be retried as drop + create.
pub fn is_incompatible_view_change(err: &SqlError) -> bool {
    let message = err.message.to_ascii_lowercase();
    INCOMPATIBLE_VIEW_PATTERNS.iter().any(|p| message.contains(p))
}

pub(crate) const SCHEMA_GRANTEES_SQL: &str = r#"
SELECT DISTINCT grantee::text
FROM information_schema.role_table_grants
WHERE table_schema = $1::text AND privilege_type = 'SELECT'
ORDER BY 1
"#;

pub(crate) const VIEW_GRANTEES_SQL: &str = r#"
SELECT DISTINCT grantee::text
FROM information_schema.role_table_grants
WHERE table_schema = $1::text AND table_name = $2::text AND privilege_type = 'SELECT'
ORDER BY 1
"#;

/// Roles never granted to explicitly: the public pseudo-role, built-in
/// `pg_*` roles and the bootstrap superuser.
fn is_system_role(role: &str) -> bool {
    role.eq_ignore_ascii_case("public") || role.starts_with("pg_") || role == "postgres"
}

impl<G: SqlGateway> SchemaManager<G> {
    /// Create or replace `schema.view` from `sql`.
    ///
    /// `sql` is either a bare `SELECT` or a full `CREATE [OR REPLACE] VIEW ...
    /// AS SELECT`; only the query part is used. It is checked before anything
    /// is sent to the database.
    pub async fn create_view(&self, schema: &str, view: &str, sql: &str) -> Result<Applied> {
        check_name(schema)?;
        check_name(view)?;
        check_view_sql(sql)?;
        let body = view_body(sql);
        let target = qualified(schema, view);

        let mut applied = Applied::default();
        let mut earlier_readers = Vec::new();
        let replace = format!("CREATE OR REPLACE VIEW {target} AS {body}");
        match self.gateway().execute(&replace, &[]).await {
            Ok(_) => applied.applied(replace),
            Err(e) if is_incompatible_view_change(&e) => {
                info!(view = %target, reason = %e, "view is not replaceable in place, recreating");
                earlier_readers = self.view_readers(schema, view, &mut applied).await;
                let drop = format!("DROP VIEW IF EXISTS {target} CASCADE");
                let create = format!("CREATE VIEW {target} AS {body}");
                for sql in [drop, create] {
                    self.gateway()
                        .execute(&sql, &[])
                        .await
                        .map_err(|e| Error::ddl(&sql, e))?;
                    applied.applied(sql);
                }
            }
            Err(e) => return Err(Error::ddl(&replace, e)),
        }

        self.grant_baseline(&target, &mut applied).await?;
        self.grant_existing_readers(schema, &target, earlier_readers, &mut applied)
            .await;
        Ok(applied)
    }

    /// Same as [`SchemaManager::create_view`].
    pub async fn update_view(&self, schema: &str, view: &str, sql: &str) -> Result<Applied> {
        self.create_view(schema, view, sql).await
    }

    /// Drop `schema.view` and its dependents. Absence is not an error.
    pub async fn drop_view(&self, schema: &str, view: &str) -> Result<Applied> {
        check_name(schema)?;
        check_name(view)?;
        let sql = format!("DROP VIEW IF EXISTS {} CASCADE", qualified(schema, view));
        self.gateway()
            .execute(&sql, &[])
            .await
            .map_err(|e| Error::ddl(&sql, e))?;
        Ok(Applied {
            statements: vec![sql],
            warnings: Vec::new(),
        })
    }

    /// Grant the view to each baseline role. A missing role is skipped with a
    /// warning; any other failure aborts.
    async fn grant_baseline(&self, target: &str, applied: &mut Applied) -> Result<()> {
        for role in &self.options().baseline_roles {
            let sql = format!("GRANT SELECT ON {target} TO {}", Ident(role));
            match self.gateway().execute(&sql, &[]).await {
                Ok(_) => applied.applied(sql),
                Err(e) if e.is_undefined_object() => {
                    applied.warn(WarningStep::BaselineGrant, Some(&sql), e.message);
                }
                Err(e) => return Err(Error::ddl(&sql, e)),
            }
        }
        Ok(())
    }

    /// Roles holding `SELECT` on the view itself. Read before a drop, since
    /// the drop takes these grants with it.
    async fn view_readers(&self, schema: &str, view: &str, applied: &mut Applied) -> Vec<String> {
        match self.gateway().query(VIEW_GRANTEES_SQL, &[&schema, &view]).await {
            Ok(rows) => rows.iter().map(|r| r.text(0)).collect(),
            Err(e) => {
                applied.warn(WarningStep::ExtraGrantDiscovery, None, e.message);
                Vec::new()
            }
        }
    }

    /// Grant the view to `earlier_readers` and to every other role that
    /// already holds `SELECT` on a table in `schema`. Failures are warnings
    /// only.
    async fn grant_existing_readers(
        &self,
        schema: &str,
        target: &str,
        earlier_readers: Vec<String>,
        applied: &mut Applied,
    ) {
        let mut roles: IndexSet<String> = earlier_readers.into_iter().collect();
        match self.gateway().query(SCHEMA_GRANTEES_SQL, &[&schema]).await {
            Ok(rows) => roles.extend(rows.iter().map(|r| r.text(0))),
            Err(e) => applied.warn(WarningStep::ExtraGrantDiscovery, None, e.message),
        }

        let baseline = &self.options().baseline_roles;
        let readers = roles
            .into_iter()
            .filter(|role| !role.is_empty() && !is_system_role(role) && !baseline.contains(role));
        for role in readers {
            let sql = format!("GRANT SELECT ON {target} TO {}", Ident(&role));
            match self.gateway().execute(&sql, &[]).await {
                Ok(_) => {
                    debug!(role = %role, "re-granted view to existing reader");
                    applied.applied(sql);
                }
                Err(e) => applied.warn(WarningStep::ExtraGrant, Some(&sql), e.message),
            }
        }
    }
}
