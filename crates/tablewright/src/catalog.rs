//! Read-only catalog queries.
//!
//! Every query casts its columns to `text`, so results come back as
//! [`TextRow`]s. Column lists are aggregated into JSON arrays on the server.
//! Nothing read here is cached: each call goes to the catalog.

use crate::error::{Error, Result};
use crate::gateway::{SqlGateway, TextRow};
use tablewright_schema::{Constraint, ConstraintKind, Index, LiveColumn, TableDefinition};
use tokio_postgres::types::ToSql;

pub(crate) const COLUMNS_SQL: &str = r#"
SELECT
    c.column_name::text,
    format_type(a.atttypid, a.atttypmod)::text,
    (c.is_nullable = 'YES')::text,
    c.column_default::text,
    col_description(cls.oid, a.attnum)::text,
    EXISTS (
        SELECT 1
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON kcu.constraint_schema = tc.constraint_schema
            AND kcu.constraint_name = tc.constraint_name
            AND kcu.table_name = tc.table_name
        WHERE tc.table_schema = c.table_schema
            AND tc.table_name = c.table_name
            AND tc.constraint_type = 'PRIMARY KEY'
            AND kcu.column_name = c.column_name
    )::text,
    EXISTS (
        SELECT 1
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON kcu.constraint_schema = tc.constraint_schema
            AND kcu.constraint_name = tc.constraint_name
            AND kcu.table_name = tc.table_name
        WHERE tc.table_schema = c.table_schema
            AND tc.table_name = c.table_name
            AND tc.constraint_type = 'UNIQUE'
            AND kcu.column_name = c.column_name
    )::text,
    c.ordinal_position::text,
    c.character_maximum_length::text,
    c.numeric_precision::text,
    c.numeric_scale::text
FROM information_schema.columns c
JOIN pg_catalog.pg_namespace ns ON ns.nspname = c.table_schema
JOIN pg_catalog.pg_class cls ON cls.relnamespace = ns.oid AND cls.relname = c.table_name
JOIN pg_catalog.pg_attribute a ON a.attrelid = cls.oid AND a.attname = c.column_name
WHERE c.table_schema = $1::text AND c.table_name = $2::text
ORDER BY c.ordinal_position
"#;

pub(crate) const PRIMARY_KEYS_SQL: &str = r#"
SELECT kcu.column_name::text
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
    ON kcu.constraint_schema = tc.constraint_schema
    AND kcu.constraint_name = tc.constraint_name
    AND kcu.table_name = tc.table_name
WHERE tc.table_schema = $1::text
    AND tc.table_name = $2::text
    AND tc.constraint_type = 'PRIMARY KEY'
ORDER BY kcu.ordinal_position
"#;

pub(crate) const PRIMARY_KEY_NAME_SQL: &str = r#"
SELECT constraint_name::text
FROM information_schema.table_constraints
WHERE table_schema = $1::text
    AND table_name = $2::text
    AND constraint_type = 'PRIMARY KEY'
"#;

pub(crate) const INDEXES_SQL: &str = r#"
SELECT
    ic.relname::text,
    to_json(ARRAY(
        SELECT a.attname::text
        FROM unnest(ix.indkey) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum
        ORDER BY k.ord
    ))::text,
    ix.indisunique::text,
    ix.indisprimary::text,
    am.amname::text,
    pi.indexdef::text
FROM pg_catalog.pg_index ix
JOIN pg_catalog.pg_class t ON t.oid = ix.indrelid
JOIN pg_catalog.pg_class ic ON ic.oid = ix.indexrelid
JOIN pg_catalog.pg_namespace ns ON ns.oid = t.relnamespace
JOIN pg_catalog.pg_am am ON am.oid = ic.relam
JOIN pg_catalog.pg_indexes pi ON pi.schemaname = ns.nspname AND pi.indexname = ic.relname
WHERE ns.nspname = $1::text AND t.relname = $2::text
ORDER BY ic.relname
"#;

pub(crate) const CONSTRAINTS_SQL: &str = r#"
SELECT
    con.conname::text,
    con.contype::text,
    to_json(ARRAY(
        SELECT a.attname::text
        FROM unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
        JOIN pg_catalog.pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
        ORDER BY k.ord
    ))::text,
    pg_get_constraintdef(con.oid)::text
FROM pg_catalog.pg_constraint con
JOIN pg_catalog.pg_class t ON t.oid = con.conrelid
JOIN pg_catalog.pg_namespace ns ON ns.oid = t.relnamespace
WHERE ns.nspname = $1::text AND t.relname = $2::text
ORDER BY con.conname
"#;

pub(crate) const TABLE_EXISTS_SQL: &str = r#"
SELECT EXISTS (
    SELECT 1 FROM information_schema.tables
    WHERE table_schema = $1::text AND table_name = $2::text AND table_type = 'BASE TABLE'
)::text
"#;

pub(crate) const VIEW_EXISTS_SQL: &str = r#"
SELECT EXISTS (
    SELECT 1 FROM information_schema.views
    WHERE table_schema = $1::text AND table_name = $2::text
)::text
"#;

pub(crate) const SCHEMA_EXISTS_SQL: &str = r#"
SELECT EXISTS (
    SELECT 1 FROM pg_catalog.pg_namespace WHERE nspname = $1::text
)::text
"#;

pub(crate) const LIST_TABLES_SQL: &str = r#"
SELECT table_name::text
FROM information_schema.tables
WHERE table_schema = $1::text AND table_type = 'BASE TABLE'
ORDER BY table_name
"#;

pub(crate) const LIST_SCHEMAS_SQL: &str = r#"
SELECT schema_name::text
FROM information_schema.schemata
WHERE schema_name <> 'information_schema' AND schema_name NOT LIKE 'pg\_%'
ORDER BY schema_name
"#;

pub(crate) const TABLE_COMMENT_SQL: &str = r#"
SELECT obj_description(c.oid, 'pg_class')::text
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace ns ON ns.oid = c.relnamespace
WHERE ns.nspname = $1::text AND c.relname = $2::text
"#;

/// The live shape of one table, as the diff engine needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSnapshot {
    pub columns: Vec<LiveColumn>,
    /// Primary-key columns, in constraint order.
    pub primary_key: Vec<String>,
    /// Name of the primary-key constraint, if there is one.
    pub primary_key_constraint: Option<String>,
}

/// Read-only access to the catalog.
pub struct Catalog<'g, G: ?Sized> {
    gateway: &'g G,
    excluded_schemas: &'g [String],
}

impl<'g, G: SqlGateway + ?Sized> Catalog<'g, G> {
    pub fn new(gateway: &'g G) -> Self {
        Self {
            gateway,
            excluded_schemas: &[],
        }
    }

    /// Hide these schemas from [`Catalog::list_schemas`], on top of the system ones.
    pub fn excluding(mut self, schemas: &'g [String]) -> Self {
        self.excluded_schemas = schemas;
        self
    }

    async fn rows(
        &self,
        lookup: &'static str,
        sql: &str,
        schema: &str,
        name: &str,
    ) -> Result<Vec<TextRow>> {
        self.gateway
            .query(sql, &[&schema, &name])
            .await
            .map_err(Error::catalog(lookup))
    }

    async fn flag(&self, lookup: &'static str, sql: &str, params: &[&str]) -> Result<bool> {
        let params: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = self
            .gateway
            .query(sql, &params)
            .await
            .map_err(Error::catalog(lookup))?;
        Ok(rows.first().is_some_and(|r| r.flag(0)))
    }

    /// Columns of `schema.table`, by ascending ordinal position.
    pub async fn columns_of(&self, schema: &str, table: &str) -> Result<Vec<LiveColumn>> {
        let rows = self.rows("columns", COLUMNS_SQL, schema, table).await?;
        Ok(rows
            .iter()
            .map(|r| LiveColumn {
                name: r.text(0),
                data_type: r.text(1),
                nullable: r.flag(2),
                default: r.opt(3),
                comment: r.opt(4),
                primary_key: r.flag(5),
                unique: r.flag(6),
                position: r.int(7).and_then(|v| i32::try_from(v).ok()).unwrap_or_default(),
                max_length: r.int(8).and_then(|v| i32::try_from(v).ok()),
                precision: r.int(9).and_then(|v| i32::try_from(v).ok()),
                scale: r.int(10).and_then(|v| i32::try_from(v).ok()),
            })
            .collect())
    }

    /// Primary-key columns of `schema.table`, in constraint order.
    pub async fn primary_keys_of(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        let rows = self.rows("primary keys", PRIMARY_KEYS_SQL, schema, table).await?;
        Ok(rows.iter().map(|r| r.text(0)).collect())
    }

    /// Name of the primary-key constraint; `None` when the table has none.
    pub async fn primary_key_constraint_name(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Option<String>> {
        let rows = self
            .rows("primary key constraint", PRIMARY_KEY_NAME_SQL, schema, table)
            .await?;
        Ok(rows.first().and_then(|r| r.opt(0)))
    }

    pub async fn indexes_of(&self, schema: &str, table: &str) -> Result<Vec<Index>> {
        let rows = self.rows("indexes", INDEXES_SQL, schema, table).await?;
        Ok(rows
            .iter()
            .map(|r| Index {
                name: r.text(0),
                columns: r.json_list(1),
                unique: r.flag(2),
                primary: r.flag(3),
                method: r.text(4),
                definition: r.text(5),
            })
            .collect())
    }

    /// Constraints of `schema.table`. Rows with an unknown `contype` are skipped.
    pub async fn constraints_of(&self, schema: &str, table: &str) -> Result<Vec<Constraint>> {
        let rows = self.rows("constraints", CONSTRAINTS_SQL, schema, table).await?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                let kind = ConstraintKind::from_contype(r.get(1)?)?;
                let definition = r.text(3);
                let check = (kind == ConstraintKind::Check)
                    .then(|| definition.strip_prefix("CHECK ").unwrap_or(&definition).to_string());
                Some(Constraint {
                    name: r.text(0),
                    kind,
                    columns: r.json_list(2),
                    definition,
                    check,
                })
            })
            .collect())
    }

    pub async fn table_exists(&self, schema: &str, table: &str) -> Result<bool> {
        self.flag("table existence", TABLE_EXISTS_SQL, &[schema, table]).await
    }

    pub async fn view_exists(&self, schema: &str, view: &str) -> Result<bool> {
        self.flag("view existence", VIEW_EXISTS_SQL, &[schema, view]).await
    }

    pub async fn schema_exists(&self, schema: &str) -> Result<bool> {
        self.flag("schema existence", SCHEMA_EXISTS_SQL, &[schema]).await
    }

    /// Base tables in `schema`, by name.
    pub async fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        let rows = self
            .gateway
            .query(LIST_TABLES_SQL, &[&schema])
            .await
            .map_err(Error::catalog("tables"))?;
        Ok(rows.iter().map(|r| r.text(0)).collect())
    }

    /// User schemas, without `information_schema`, `pg_*` and the excluded ones.
    pub async fn list_schemas(&self) -> Result<Vec<String>> {
        let rows = self
            .gateway
            .query(LIST_SCHEMAS_SQL, &[])
            .await
            .map_err(Error::catalog("schemas"))?;
        Ok(rows
            .iter()
            .map(|r| r.text(0))
            .filter(|s| !self.excluded_schemas.contains(s))
            .collect())
    }

    pub async fn table_comment(&self, schema: &str, table: &str) -> Result<Option<String>> {
        let rows = self.rows("table comment", TABLE_COMMENT_SQL, schema, table).await?;
        Ok(rows.first().and_then(|r| r.opt(0)))
    }

    /// Columns, primary key and primary-key constraint name, for diffing.
    pub async fn snapshot(&self, schema: &str, table: &str) -> Result<TableSnapshot> {
        Ok(TableSnapshot {
            columns: self.columns_of(schema, table).await?,
            primary_key: self.primary_keys_of(schema, table).await?,
            primary_key_constraint: self.primary_key_constraint_name(schema, table).await?,
        })
    }

    /// Everything known about `schema.table`.
    pub async fn table_info(&self, schema: &str, table: &str) -> Result<TableDefinition> {
        if !self.table_exists(schema, table).await? {
            return Err(Error::TableNotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            });
        }
        Ok(TableDefinition {
            schema: schema.to_string(),
            name: table.to_string(),
            comment: self.table_comment(schema, table).await?,
            columns: self.columns_of(schema, table).await?,
            constraints: self.constraints_of(schema, table).await?,
            indexes: self.indexes_of(schema, table).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqlError;
    use crate::test_support::{MockGateway, column_row, exists, names};

    #[tokio::test]
    async fn reads_columns_in_order() {
        let mut name = column_row("name", "character varying(255)", false, false, 2);
        name.0[4] = Some("Name - the user's name".to_string());
        let gw = MockGateway::new().rows(
            COLUMNS_SQL,
            vec![column_row("id", "integer", false, true, 1), name],
        );
        let columns = Catalog::new(&gw).columns_of("s1", "t1").await.unwrap();

        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "id");
        assert!(columns[0].primary_key);
        assert!(!columns[0].nullable);
        assert_eq!(columns[1].position, 2);
        assert_eq!(columns[1].comment.as_deref(), Some("Name - the user's name"));
        assert_eq!(columns[1].default, None);
    }

    #[tokio::test]
    async fn lookup_failure_is_a_catalog_error() {
        let gw = MockGateway::new().fail(COLUMNS_SQL, SqlError::new("permission denied"));
        let err = Catalog::new(&gw).columns_of("s1", "t1").await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Catalog);
    }

    #[tokio::test]
    async fn primary_key_lookups() {
        let gw = MockGateway::new()
            .rows(PRIMARY_KEYS_SQL, names(&["tenant", "id"]))
            .rows(PRIMARY_KEY_NAME_SQL, names(&["t1_pkey"]));
        let catalog = Catalog::new(&gw);
        assert_eq!(catalog.primary_keys_of("s", "t1").await.unwrap(), vec!["tenant", "id"]);
        assert_eq!(
            catalog.primary_key_constraint_name("s", "t1").await.unwrap().as_deref(),
            Some("t1_pkey")
        );

        let empty = MockGateway::new();
        assert_eq!(
            Catalog::new(&empty).primary_key_constraint_name("s", "t1").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn reads_indexes_and_constraints() {
        let gw = MockGateway::new()
            .rows(
                INDEXES_SQL,
                vec![TextRow::from([
                    "t1_name_idx",
                    r#"["name","id"]"#,
                    "false",
                    "false",
                    "btree",
                    "CREATE INDEX t1_name_idx ON s.t1 USING btree (name, id)",
                ])],
            )
            .rows(
                CONSTRAINTS_SQL,
                vec![
                    TextRow::from(["t1_pkey", "p", r#"["id"]"#, "PRIMARY KEY (id)"]),
                    TextRow::from(["t1_price_check", "c", r#"["price"]"#, "CHECK ((price > 0))"]),
                    TextRow::from(["weird", "?", "[]", ""]),
                ],
            );
        let catalog = Catalog::new(&gw);

        let indexes = catalog.indexes_of("s", "t1").await.unwrap();
        assert_eq!(indexes[0].columns, vec!["name", "id"]);
        assert_eq!(indexes[0].method, "btree");

        let constraints = catalog.constraints_of("s", "t1").await.unwrap();
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].kind, ConstraintKind::PrimaryKey);
        assert_eq!(constraints[0].check, None);
        assert_eq!(constraints[1].check.as_deref(), Some("((price > 0))"));
    }

    #[tokio::test]
    async fn existence_and_listing() {
        let excluded = vec!["postgrest".to_string()];
        let gw = MockGateway::new()
            .rows(TABLE_EXISTS_SQL, exists(true))
            .rows(VIEW_EXISTS_SQL, exists(false))
            .rows(LIST_SCHEMAS_SQL, names(&["postgrest", "public", "s1"]))
            .rows(LIST_TABLES_SQL, names(&["a", "b"]));
        let catalog = Catalog::new(&gw).excluding(&excluded);

        assert!(catalog.table_exists("s1", "t1").await.unwrap());
        assert!(!catalog.view_exists("s1", "v1").await.unwrap());
        assert!(!catalog.schema_exists("nope").await.unwrap());
        assert_eq!(catalog.list_schemas().await.unwrap(), vec!["public", "s1"]);
        assert_eq!(catalog.list_tables("s1").await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn table_info_requires_the_table() {
        let gw = MockGateway::new().rows(TABLE_EXISTS_SQL, exists(false));
        let err = Catalog::new(&gw).table_info("s1", "missing").await.unwrap_err();
        assert!(matches!(err, Error::TableNotFound { .. }));
    }
}
