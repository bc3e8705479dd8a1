pub mod loader;
pub mod pipeline;
pub mod sql;
pub mod storage;
pub mod utils;
pub mod warehouse;

use common::Result;
use common::config::Settings;
use pipeline::{Phase, Pipeline, PipelineReport, TableCount};
use sql::{Dialect, StatementCatalog};
use storage::{PrefixSummary, SourceInspector};
use tracing::info;

/// Runs the given phases against the configured warehouse.
///
/// Settings are validated before any statement is issued. The verify phase is skipped when
/// `warehouse.verify` is off.
pub async fn run_etl_pipeline(settings: &Settings, phases: &[Phase]) -> Result<PipelineReport> {
    settings.validate()?;

    if settings.warehouse.preflight && phases.contains(&Phase::Copy) {
        inspect_sources(settings).await?;
    }

    let phases: Vec<Phase> = phases
        .iter()
        .copied()
        .filter(|phase| *phase != Phase::Verify || settings.warehouse.verify)
        .collect();

    let warehouse = warehouse::connect(settings).await?;
    let catalog = StatementCatalog::new(settings, warehouse.dialect());

    info!(
        "Running {} phases on the {} engine",
        phases.len(),
        settings.warehouse.engine
    );
    Pipeline::new(warehouse.as_ref(), &catalog).run(&phases).await
}

/// Row counts of every table, without changing anything.
pub async fn report_tables(settings: &Settings) -> Result<Vec<TableCount>> {
    settings.validate()?;
    let warehouse = warehouse::connect(settings).await?;
    pipeline::verify::table_counts(warehouse.as_ref()).await
}

/// Lists the S3 sources of a run.
pub async fn inspect_sources(settings: &Settings) -> Result<Vec<PrefixSummary>> {
    SourceInspector::new(&settings.s3.region)
        .await
        .inspect(&settings.s3)
        .await
}

/// Statements a phase would issue, rendered for the configured engine.
pub fn render_phase(settings: &Settings, phase: Phase) -> Vec<String> {
    let dialect = Dialect::for_engine(settings.warehouse.engine);
    let catalog = StatementCatalog::new(settings, dialect);

    let statements = match phase {
        Phase::Drop => &catalog.drop_tables,
        Phase::Create => &catalog.create_tables,
        Phase::Copy => &catalog.copy_tables,
        Phase::Insert => &catalog.insert_tables,
        Phase::Verify => {
            return sql::schema::DIMENSION_TABLES
                .iter()
                .filter_map(|table| {
                    table
                        .natural_key()
                        .map(|key| pipeline::verify::duplicate_keys_sql(table, key.name))
                })
                .collect();
        }
    };

    statements.iter().map(|s| s.render(dialect)).collect()
}
