use super::Warehouse;
use crate::sql::{CopyCommand, Dialect};
use async_trait::async_trait;
use common::Result;
use common::config::Settings;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// Amazon Redshift, reached over its Postgres-compatible protocol.
///
/// The pool holds a single connection so that statements run in one session, in order.
pub struct RedshiftWarehouse {
    pool: PgPool,
}

impl RedshiftWarehouse {
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&settings.connection_url())
            .await?;

        info!(
            "Connected to {}:{}/{}",
            settings.cluster.host, settings.cluster.port, settings.cluster.db_name
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl Warehouse for RedshiftWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Redshift
    }

    async fn execute(&self, sql: &str) -> Result<u64> {
        let result = sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    // The cluster reads the source files itself under the delegated role.
    async fn copy_into(&self, command: &CopyCommand) -> Result<u64> {
        self.execute(&command.to_sql()).await
    }

    async fn query_scalar(&self, sql: &str) -> Result<i64> {
        let value = sqlx::query_scalar::<_, i64>(sql).fetch_one(&self.pool).await?;
        Ok(value)
    }
}
