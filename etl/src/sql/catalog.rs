use super::copy::{CopyCommand, JsonFormat};
use super::insert::transform_statements;
use super::schema::{ALL_TABLES, STAGING_EVENTS, STAGING_SONGS};
use super::{Dialect, Statement};
use common::config::Settings;

/// Every statement of a run, grouped by phase and kept in execution order.
#[derive(Debug, Clone)]
pub struct StatementCatalog {
    pub dialect: Dialect,
    pub drop_tables: Vec<Statement>,
    pub create_tables: Vec<Statement>,
    pub copy_tables: Vec<Statement>,
    pub insert_tables: Vec<Statement>,
}

impl StatementCatalog {
    pub fn new(settings: &Settings, dialect: Dialect) -> Self {
        let drop_tables = ALL_TABLES
            .iter()
            .map(|&table| Statement::sql(format!("drop {}", table.name), table, table.drop_sql()))
            .collect();

        let create_tables = ALL_TABLES
            .iter()
            .map(|&table| {
                Statement::sql(
                    format!("create {}", table.name),
                    table,
                    table.create_sql(dialect),
                )
            })
            .collect();

        let copy_tables = vec![
            Statement::copy(
                format!("copy {}", STAGING_EVENTS.name),
                CopyCommand::new(
                    &STAGING_EVENTS,
                    &settings.s3.log_data,
                    &settings.iam_role.arn,
                    JsonFormat::JsonPaths(settings.s3.log_jsonpath.clone()),
                    &settings.s3.region,
                ),
            ),
            Statement::copy(
                format!("copy {}", STAGING_SONGS.name),
                CopyCommand::new(
                    &STAGING_SONGS,
                    &settings.s3.song_data,
                    &settings.iam_role.arn,
                    JsonFormat::Auto,
                    &settings.s3.region,
                ),
            ),
        ];

        let insert_tables = transform_statements(dialect)
            .into_iter()
            .map(|insert| {
                Statement::sql(
                    format!("insert {}", insert.target.name),
                    insert.target,
                    insert.to_sql(),
                )
            })
            .collect();

        Self {
            dialect,
            drop_tables,
            create_tables,
            copy_tables,
            insert_tables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::{ClusterConfig, IamRoleConfig, SourceConfig, WarehouseConfig};

    fn settings() -> Settings {
        Settings {
            cluster: ClusterConfig::default(),
            iam_role: IamRoleConfig {
                arn: "arn:aws:iam::123456789012:role/dwhRole".to_string(),
            },
            s3: SourceConfig {
                log_data: "s3://udacity-dend/log_data".to_string(),
                log_jsonpath: "s3://udacity-dend/log_json_path.json".to_string(),
                song_data: "s3://udacity-dend/song_data".to_string(),
                region: "us-west-2".to_string(),
            },
            warehouse: WarehouseConfig::default(),
        }
    }

    fn labels(statements: &[Statement]) -> Vec<&str> {
        statements.iter().map(|s| s.label.as_str()).collect()
    }

    #[test]
    fn test_catalog_orders() {
        let catalog = StatementCatalog::new(&settings(), Dialect::Redshift);

        assert_eq!(
            labels(&catalog.drop_tables),
            vec![
                "drop staging_events",
                "drop staging_songs",
                "drop songplays",
                "drop users",
                "drop songs",
                "drop artists",
                "drop time"
            ]
        );
        assert_eq!(catalog.create_tables.len(), 7);
        assert_eq!(
            labels(&catalog.copy_tables),
            vec!["copy staging_events", "copy staging_songs"]
        );
        assert_eq!(
            labels(&catalog.insert_tables),
            vec![
                "insert songplays",
                "insert users",
                "insert songs",
                "insert artists",
                "insert time"
            ]
        );
    }

    #[test]
    fn test_copy_statements_take_settings() {
        let catalog = StatementCatalog::new(&settings(), Dialect::Redshift);
        let events = catalog.copy_tables[0].render(Dialect::Redshift);

        assert!(events.contains("FROM 's3://udacity-dend/log_data'"));
        assert!(events.contains("IAM_ROLE 'arn:aws:iam::123456789012:role/dwhRole'"));
        assert!(events.contains("FORMAT AS JSON 's3://udacity-dend/log_json_path.json'"));
        assert!(events.contains("REGION 'us-west-2'"));
    }
}
