use super::Warehouse;
use crate::loader::BulkLoader;
use crate::sql::{CopyCommand, Dialect};
use crate::utils::arrow::{affected_rows, batches_to_json, scalar_i64};
use async_trait::async_trait;
use common::{Error, Result};
use datafusion::execution::context::SessionContext;
use serde_json::Value;

/// Embedded DataFusion engine holding every table in memory for the life of the process.
pub struct LocalWarehouse {
    ctx: SessionContext,
}

impl LocalWarehouse {
    pub fn new() -> Self {
        Self {
            ctx: SessionContext::new(),
        }
    }

    /// Runs a query and returns its rows as JSON objects keyed by column name.
    pub async fn query_json(&self, sql: &str) -> Result<Vec<Value>> {
        let batches = self.ctx.sql(sql).await?.collect().await?;
        batches_to_json(&batches)
    }
}

impl Default for LocalWarehouse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Warehouse for LocalWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::DataFusion
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let batches = self.ctx.sql(sql).await?.collect().await?;
        Ok(affected_rows(&batches))
    }

    async fn copy_into(&self, command: &CopyCommand) -> Result<u64> {
        BulkLoader::new(&self.ctx).load(command).await
    }

    async fn query_scalar(&self, sql: &str) -> Result<i64> {
        let batches = self.ctx.sql(sql).await?.collect().await?;
        scalar_i64(&batches)?.ok_or_else(|| Error::Other(format!("Query returned no value: {}", sql)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::Statement;
    use crate::sql::schema::USERS;
    use serde_json::json;

    #[tokio::test]
    async fn test_execute_reports_inserted_rows() {
        let warehouse = LocalWarehouse::new();
        warehouse
            .execute(&USERS.create_sql(Dialect::DataFusion))
            .await
            .unwrap();

        let inserted = warehouse
            .execute("INSERT INTO \"users\" VALUES (8, 'Kaylee', 'Summers', 'F', 'free'), (10, 'Sylvie', 'Cruz', 'F', 'free');")
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        assert_eq!(
            warehouse.query_scalar("SELECT COUNT(*) FROM \"users\"").await.unwrap(),
            2
        );
        assert_eq!(
            warehouse
                .query_json("SELECT user_id, level FROM \"users\" WHERE user_id = 8")
                .await
                .unwrap(),
            vec![json!({"user_id": 8, "level": "free"})]
        );
    }

    #[tokio::test]
    async fn test_run_labels_failures() {
        let warehouse = LocalWarehouse::new();
        let statement = Statement::sql(
            "insert users",
            &USERS,
            "INSERT INTO \"users\" SELECT * FROM \"staging_events\";".to_string(),
        );

        let err = warehouse.run(&statement).await.unwrap_err();
        assert!(matches!(err, Error::Statement { ref label, .. } if label == "insert users"));
        assert!(err.to_string().starts_with("insert users failed: "));
    }
}
