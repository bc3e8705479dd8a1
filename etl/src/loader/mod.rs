//! Bulk loads JSON sources into staging tables of the embedded engine.
//!
//! Loads follow the warehouse `COPY ... FORMAT AS JSON` rules: fields are mapped onto the
//! table's non-identity columns either by a JSONPaths file or by matching top-level keys to
//! column names exactly (case-sensitive, as `'auto'` does), identity columns continue from the table's current maximum, and the first
//! malformed record aborts the whole load.

pub mod coerce;
pub mod jsonpaths;
pub mod source;

pub use jsonpaths::{JsonPath, JsonPaths};
pub use source::SourceLocation;

use crate::sql::{Column, CopyCommand, JsonFormat, TableSpec};
use crate::utils::arrow::scalar_i64;
use arrow::datatypes::{DataType, SchemaRef};
use arrow::json::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use coerce::coerce_value;
use common::{Error, Result};
use datafusion::dataframe::DataFrameWriteOptions;
use datafusion::execution::context::SessionContext;
use serde_json::{Map, Value};
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info};

const BATCH_SIZE: usize = 8192;

enum FieldMapping {
    Paths(JsonPaths),
    Auto,
}

impl FieldMapping {
    fn extract<'a>(&self, record: &'a Value, position: usize, column: &Column) -> Option<&'a Value> {
        match self {
            FieldMapping::Paths(paths) => paths.get(position)?.extract(record),
            FieldMapping::Auto => record.as_object()?.get(column.name),
        }
    }
}

pub struct BulkLoader<'a> {
    ctx: &'a SessionContext,
}

impl<'a> BulkLoader<'a> {
    pub fn new(ctx: &'a SessionContext) -> Self {
        Self { ctx }
    }

    /// Appends every record under the command's source to its staging table.
    ///
    /// Returns the number of rows loaded. Nothing is written unless every record loads.
    pub async fn load(&self, command: &CopyCommand) -> Result<u64> {
        let table = command.table;
        let columns: Vec<&Column> = table.load_columns().collect();

        let mapping = match &command.format {
            JsonFormat::JsonPaths(location) => {
                let content = SourceLocation::resolve(location, &command.region)?
                    .read_object()
                    .await
                    .map_err(|e| Error::load(table.name, format!("reading {}: {}", location, e)))?;
                let paths = JsonPaths::from_slice(&content)
                    .map_err(|e| Error::load(table.name, format!("{}: {}", location, e)))?;

                if paths.len() != columns.len() {
                    return Err(Error::load(
                        table.name,
                        format!(
                            "{} lists {} paths but the table loads {} columns",
                            location,
                            paths.len(),
                            columns.len()
                        ),
                    ));
                }
                FieldMapping::Paths(paths)
            }
            JsonFormat::Auto => FieldMapping::Auto,
        };

        let schema: SchemaRef = Arc::new(self.ctx.table(table.name).await?.schema().as_arrow().clone());
        let types = columns
            .iter()
            .map(|column| column_type(&schema, table, column))
            .collect::<Result<Vec<_>>>()?;
        let mut next_id = self.next_identity(table).await?;

        let source = SourceLocation::resolve(&command.source, &command.region)?;
        let files = source.list_files().await?;
        if files.is_empty() {
            return Err(Error::load(
                table.name,
                format!("no JSON files found under {}", source.display()),
            ));
        }

        let mut rows = Vec::new();
        for meta in &files {
            let content = source.read(meta).await?;
            let records = serde_json::Deserializer::from_slice(&content).into_iter::<Value>();

            for (line, record) in records.enumerate() {
                let fail = |message: String| {
                    Error::load(
                        table.name,
                        format!("{} record {}: {}", meta.location, line + 1, message),
                    )
                };

                let record = record.map_err(|e| fail(e.to_string()))?;
                if !record.is_object() {
                    return Err(fail("not a JSON object".to_string()));
                }

                let mut row = Map::new();
                if let (Some(identity), Some(id)) = (table.identity_column(), next_id.as_mut()) {
                    *id += 1;
                    row.insert(identity.name.to_string(), Value::from(*id));
                }

                for (position, (column, data_type)) in columns.iter().zip(&types).enumerate() {
                    let value = mapping.extract(&record, position, column);
                    let value = coerce_value(value, column, data_type).map_err(fail)?;
                    row.insert(column.name.to_string(), value);
                }

                rows.push(serde_json::to_string(&Value::Object(row))?);
            }
            debug!("Parsed {} for {}", meta.location, table.name);
        }

        let loaded = rows.len() as u64;
        let batches = json_strings_to_batches(&rows, schema)?;
        if !batches.is_empty() {
            self.ctx
                .read_batches(batches)?
                .write_table(table.name, DataFrameWriteOptions::new())
                .await?;
        }

        info!(
            "Loaded {} rows into {} from {} files under {}",
            loaded,
            table.name,
            files.len(),
            source.display()
        );
        Ok(loaded)
    }

    // Last assigned identity value, or `None` for tables without an identity column.
    async fn next_identity(&self, table: &TableSpec) -> Result<Option<i64>> {
        let Some(identity) = table.identity_column() else {
            return Ok(None);
        };

        let batches = self
            .ctx
            .sql(&format!(
                "SELECT MAX({}) FROM {}",
                identity.name,
                table.quoted_name()
            ))
            .await?
            .collect()
            .await?;

        Ok(Some(scalar_i64(&batches)?.unwrap_or(0)))
    }
}

fn column_type(schema: &SchemaRef, table: &TableSpec, column: &Column) -> Result<DataType> {
    schema
        .field_with_name(column.name)
        .map(|field| field.data_type().clone())
        .map_err(|_| Error::load(table.name, format!("table has no column {}", column.name)))
}

fn json_strings_to_batches(rows: &[String], schema: SchemaRef) -> Result<Vec<RecordBatch>> {
    if rows.is_empty() {
        return Ok(vec![]);
    }

    let cursor = Cursor::new(rows.join("\n"));
    let reader = ReaderBuilder::new(schema)
        .with_batch_size(BATCH_SIZE)
        .build(cursor)?;

    let mut batches = Vec::new();
    for batch in reader {
        let batch = batch?;
        if batch.num_rows() > 0 {
            batches.push(batch);
        }
    }

    Ok(batches)
}
