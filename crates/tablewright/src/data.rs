//! Ad-hoc paging through table rows.

use crate::error::{Error, Result, check_name};
use crate::gateway::{SqlError, SqlGateway};
use crate::manager::SchemaManager;
use serde_json::{Map, Value};
use tablewright_sql::qualified;

/// One page of rows from a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TablePage {
    /// Rows as JSON objects keyed by column name.
    pub rows: Vec<Map<String, Value>>,
    /// Total rows in the table, regardless of paging.
    pub total: i64,
}

/// Split `schema.table`, rejecting anything else.
fn split_table_ref(reference: &str) -> Result<(&str, &str)> {
    let invalid = || Error::InvalidTableRef(reference.to_string());
    let (schema, table) = reference.split_once('.').ok_or_else(invalid)?;
    if table.contains('.') {
        return Err(invalid());
    }
    check_name(schema)?;
    check_name(table)?;
    Ok((schema, table))
}

impl<G: SqlGateway> SchemaManager<G> {
    /// Read `limit` rows of `reference` (`schema.table`) starting at
    /// `offset`, ordered by the first column.
    pub async fn table_data(&self, reference: &str, limit: i64, offset: i64) -> Result<TablePage> {
        let (schema, table) = split_table_ref(reference)?;
        if !self.catalog().table_exists(schema, table).await? {
            return Err(Error::TableNotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            });
        }
        let target = qualified(schema, table);

        let count_sql = format!("SELECT COUNT(*)::text FROM {target}");
        let total = self
            .gateway()
            .query(&count_sql, &[])
            .await
            .map_err(Error::catalog("row count"))?
            .first()
            .and_then(|r| r.int(0))
            .unwrap_or_default();

        let rows_sql = format!(
            "SELECT row_to_json(page)::text \
             FROM (SELECT * FROM {target} ORDER BY 1 LIMIT $1 OFFSET $2) AS page"
        );
        let limit = limit.max(0);
        let offset = offset.max(0);
        let rows = self
            .gateway()
            .query(&rows_sql, &[&limit, &offset])
            .await
            .map_err(Error::catalog("table rows"))?;

        let rows = rows
            .iter()
            .filter_map(|r| r.get(0))
            .map(|json| {
                serde_json::from_str::<Map<String, Value>>(json).map_err(|e| Error::Catalog {
                    lookup: "table rows",
                    source: SqlError::new(format!("row is not a JSON object: {e}")),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TablePage { rows, total })
    }
}
