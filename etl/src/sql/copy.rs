use super::quote_literal;
use super::schema::TableSpec;

/// How the fields of a JSON source record map onto table columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// A JSONPaths file lists one path per loaded column, in column order.
    JsonPaths(String),
    /// Top-level keys match column names, ignoring case.
    Auto,
}

/// Bulk load of every object under a source prefix into a staging table.
#[derive(Debug, Clone)]
pub struct CopyCommand {
    pub table: &'static TableSpec,
    pub source: String,
    pub iam_role: String,
    pub format: JsonFormat,
    pub region: String,
}

impl CopyCommand {
    pub fn new(
        table: &'static TableSpec,
        source: &str,
        iam_role: &str,
        format: JsonFormat,
        region: &str,
    ) -> Self {
        Self {
            table,
            source: source.to_string(),
            iam_role: iam_role.to_string(),
            format,
            region: region.to_string(),
        }
    }

    /// Redshift `COPY` statement; the cluster reads the files itself under the delegated role.
    pub fn to_sql(&self) -> String {
        let format = match &self.format {
            JsonFormat::JsonPaths(location) => format!("FORMAT AS JSON {}", quote_literal(location)),
            JsonFormat::Auto => "FORMAT AS JSON 'auto'".to_string(),
        };

        format!(
            "COPY {} FROM {}\nIAM_ROLE {}\n{}\nREGION {};",
            self.table.quoted_name(),
            quote_literal(&self.source),
            quote_literal(&self.iam_role),
            format,
            quote_literal(&self.region)
        )
    }

    /// Human-readable form of a load performed by the embedded engine.
    pub fn describe_local(&self) -> String {
        let format = match &self.format {
            JsonFormat::JsonPaths(location) => format!("jsonpaths {}", location),
            JsonFormat::Auto => "json auto".to_string(),
        };
        format!(
            "-- bulk load {} from {} ({})",
            self.table.name, self.source, format
        )
    }
}
