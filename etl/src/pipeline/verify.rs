use crate::sql::TableSpec;
use crate::sql::schema::{ALL_TABLES, DIMENSION_TABLES};
use crate::warehouse::Warehouse;
use common::{Error, Result};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCount {
    pub table: &'static str,
    pub rows: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub counts: Vec<TableCount>,
}

impl VerificationReport {
    pub fn rows(&self, table: &str) -> Option<i64> {
        self.counts.iter().find(|c| c.table == table).map(|c| c.rows)
    }
}

/// Number of natural-key values that appear on more than one row of a dimension.
pub fn duplicate_keys_sql(table: &TableSpec, key: &str) -> String {
    format!(
        "SELECT COUNT(*) FROM (SELECT {key} FROM {table} GROUP BY {key} HAVING COUNT(*) > 1) duplicated_keys",
        key = key,
        table = table.quoted_name()
    )
}

pub fn row_count_sql(table: &TableSpec) -> String {
    format!("SELECT COUNT(*) FROM {}", table.quoted_name())
}

/// Row counts of every table.
pub async fn table_counts(warehouse: &dyn Warehouse) -> Result<Vec<TableCount>> {
    let mut counts = Vec::with_capacity(ALL_TABLES.len());
    for table in ALL_TABLES {
        let rows = warehouse.query_scalar(&row_count_sql(table)).await?;
        counts.push(TableCount {
            table: table.name,
            rows,
        });
    }
    Ok(counts)
}

/// Fails on the first dimension holding a natural key more than once, then counts every table.
pub async fn verify_tables(warehouse: &dyn Warehouse) -> Result<VerificationReport> {
    for table in DIMENSION_TABLES {
        let Some(key) = table.natural_key() else {
            continue;
        };

        let duplicates = warehouse
            .query_scalar(&duplicate_keys_sql(table, key.name))
            .await
            .map_err(|e| e.in_statement(format!("verify {}", table.name)))?;

        if duplicates > 0 {
            warn!("{} holds {} duplicated {} values", table.name, duplicates, key.name);
            return Err(Error::DuplicateKey {
                table: table.name.to_string(),
                column: key.name.to_string(),
                duplicates,
            });
        }
    }

    let counts = table_counts(warehouse)
        .await
        .map_err(|e| e.in_statement("count rows"))?;
    for count in &counts {
        info!("{}: {} rows", count.table, count.rows);
    }

    Ok(VerificationReport { counts })
}
