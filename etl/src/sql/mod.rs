pub mod catalog;
pub mod copy;
pub mod dedup;
pub mod insert;
pub mod schema;

pub use catalog::StatementCatalog;
pub use copy::{CopyCommand, JsonFormat};
pub use dedup::{DistinctTimestamps, LatestRecordFilter};
pub use schema::{Column, ColumnType, DistStyle, TableKind, TableSpec};

use common::config::EngineKind;

/// SQL flavour a statement is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Amazon Redshift, the production warehouse.
    Redshift,
    /// Embedded DataFusion engine used for local runs.
    DataFusion,
}

impl Dialect {
    pub fn for_engine(engine: EngineKind) -> Self {
        match engine {
            EngineKind::Redshift => Dialect::Redshift,
            EngineKind::Local => Dialect::DataFusion,
        }
    }

    /// Converts an epoch-millisecond column to a timestamp truncated to whole seconds.
    pub fn epoch_millis_to_timestamp(&self, column: &str) -> String {
        match self {
            Dialect::Redshift => format!("TIMESTAMP 'epoch' + {}/1000 * INTERVAL '1 second'", column),
            Dialect::DataFusion => format!("to_timestamp({} / 1000)", column),
        }
    }

    /// Extracts one calendar field of a timestamp as an integer.
    pub fn extract(&self, part: DatePart, column: &str) -> String {
        match self {
            Dialect::Redshift => format!("EXTRACT({} FROM {})", part.redshift_name(), column),
            Dialect::DataFusion => format!(
                "CAST(date_part('{}', {}) AS INT)",
                part.datafusion_name(),
                column
            ),
        }
    }

    /// Expression that fills an identity column the engine cannot fill itself.
    ///
    /// Redshift assigns `IDENTITY(1,1)` values on insert, so nothing is needed there.
    pub fn surrogate_key(&self, order_by: &str) -> Option<String> {
        match self {
            Dialect::Redshift => None,
            Dialect::DataFusion => Some(format!(
                "CAST(ROW_NUMBER() OVER (ORDER BY {}) AS BIGINT)",
                order_by
            )),
        }
    }

    /// Whether distribution and sort hints are part of the DDL.
    pub fn supports_physical_hints(&self) -> bool {
        matches!(self, Dialect::Redshift)
    }
}

/// Calendar fields of the time dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Hour,
    Day,
    Week,
    Month,
    Year,
    Weekday,
}

impl DatePart {
    /// Column order of the time dimension.
    pub const ALL: [DatePart; 6] = [
        DatePart::Hour,
        DatePart::Day,
        DatePart::Week,
        DatePart::Month,
        DatePart::Year,
        DatePart::Weekday,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            DatePart::Hour => "hour",
            DatePart::Day => "day",
            DatePart::Week => "week",
            DatePart::Month => "month",
            DatePart::Year => "year",
            DatePart::Weekday => "weekday",
        }
    }

    fn redshift_name(&self) -> &'static str {
        match self {
            DatePart::Hour => "HOUR",
            DatePart::Day => "DAY",
            DatePart::Week => "WEEK",
            DatePart::Month => "MONTH",
            DatePart::Year => "YEAR",
            DatePart::Weekday => "WEEKDAY",
        }
    }

    // Both engines number Sunday as 0.
    fn datafusion_name(&self) -> &'static str {
        match self {
            DatePart::Hour => "hour",
            DatePart::Day => "day",
            DatePart::Week => "week",
            DatePart::Month => "month",
            DatePart::Year => "year",
            DatePart::Weekday => "dow",
        }
    }
}

/// One executable unit of the pipeline.
#[derive(Debug, Clone)]
pub struct Statement {
    pub label: String,
    pub target: &'static TableSpec,
    pub body: StatementBody,
}

#[derive(Debug, Clone)]
pub enum StatementBody {
    Sql(String),
    Copy(CopyCommand),
}

impl Statement {
    pub fn sql(label: impl Into<String>, target: &'static TableSpec, sql: String) -> Self {
        Self {
            label: label.into(),
            target,
            body: StatementBody::Sql(sql),
        }
    }

    pub fn copy(label: impl Into<String>, command: CopyCommand) -> Self {
        Self {
            label: label.into(),
            target: command.table,
            body: StatementBody::Copy(command),
        }
    }

    /// Text of the statement as it would be sent to the warehouse.
    pub fn render(&self, dialect: Dialect) -> String {
        match &self.body {
            StatementBody::Sql(sql) => sql.clone(),
            StatementBody::Copy(command) => match dialect {
                Dialect::Redshift => command.to_sql(),
                Dialect::DataFusion => command.describe_local(),
            },
        }
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
