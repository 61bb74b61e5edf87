use crate::ddl::{Step, column_list};
use crate::error::{Error, Result, check_name};
use crate::gateway::SqlGateway;
use crate::manager::SchemaManager;
use crate::report::Applied;
use tablewright_schema::IndexMethod;
use tablewright_sql::{Ident, qualified};

impl<G: SqlGateway> SchemaManager<G> {
    /// Create an index on `schema.table`.
    ///
    /// `method` is an access method name (`btree`, `hash`, `gist`, `gin`,
    /// `brin`, `spgist`); empty means `btree`.
    pub async fn create_index<S: AsRef<str>>(
        &self,
        schema: &str,
        table: &str,
        name: &str,
        columns: &[S],
        unique: bool,
        method: &str,
    ) -> Result<Applied> {
        check_name(schema)?;
        check_name(table)?;
        check_name(name)?;
        if columns.is_empty() {
            return Err(Error::EmptyIndexColumns);
        }
        for column in columns {
            check_name(column.as_ref())?;
        }
        let method: IndexMethod = method
            .parse()
            .map_err(|_| Error::InvalidIndexMethod(method.to_string()))?;

        let sql = format!(
            "CREATE {}INDEX {} ON {} USING {method} ({})",
            if unique { "UNIQUE " } else { "" },
            Ident(name),
            qualified(schema, table),
            column_list(columns)
        );
        let mut applied = Applied::default();
        self.run(&[Step::required(sql)], &mut applied).await?;
        Ok(applied)
    }

    /// Drop `schema.name`. Absence is not an error.
    pub async fn drop_index(&self, schema: &str, name: &str) -> Result<Applied> {
        check_name(schema)?;
        check_name(name)?;
        let sql = format!("DROP INDEX IF EXISTS {}", qualified(schema, name));
        let mut applied = Applied::default();
        self.run(&[Step::required(sql)], &mut applied).await?;
        Ok(applied)
    }

    /// Rename index `schema.from` to `to`, in the same schema.
    pub async fn rename_index(&self, schema: &str, from: &str, to: &str) -> Result<Applied> {
        check_name(schema)?;
        check_name(from)?;
        check_name(to)?;
        let sql = format!("ALTER INDEX {} RENAME TO {}", qualified(schema, from), Ident(to));
        let mut applied = Applied::default();
        self.run(&[Step::required(sql)], &mut applied).await?;
        Ok(applied)
    }
}
