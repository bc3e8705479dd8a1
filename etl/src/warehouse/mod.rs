pub mod local;
pub mod redshift;

pub use local::LocalWarehouse;
pub use redshift::RedshiftWarehouse;

use crate::sql::{CopyCommand, Dialect, Statement, StatementBody};
use async_trait::async_trait;
use common::Result;
use common::config::{EngineKind, Settings};
use tracing::debug;

/// A SQL engine the pipeline runs its statements against, one statement at a time.
#[async_trait]
pub trait Warehouse: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Executes one statement, returning the rows it affected.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Bulk-loads a staging table, returning the rows loaded.
    async fn copy_into(&self, command: &CopyCommand) -> Result<u64>;

    /// First column of the first row of a query returning an integer.
    async fn query_scalar(&self, sql: &str) -> Result<i64>;

    /// Runs a catalog statement; errors carry the statement's label.
    async fn run(&self, statement: &Statement) -> Result<u64> {
        debug!("{}:\n{}", statement.label, statement.render(self.dialect()));

        let result = match &statement.body {
            StatementBody::Sql(sql) => self.execute(sql).await,
            StatementBody::Copy(command) => self.copy_into(command).await,
        };
        result.map_err(|e| e.in_statement(statement.label.clone()))
    }
}

/// Opens the engine selected in the settings.
pub async fn connect(settings: &Settings) -> Result<Box<dyn Warehouse>> {
    match settings.warehouse.engine {
        EngineKind::Redshift => Ok(Box::new(RedshiftWarehouse::connect(settings).await?)),
        EngineKind::Local => Ok(Box::new(LocalWarehouse::new())),
    }
}
