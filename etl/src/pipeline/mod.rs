pub mod verify;

pub use verify::{TableCount, VerificationReport, verify_tables};

use crate::sql::{Statement, StatementCatalog};
use crate::warehouse::Warehouse;
use chrono::Utc;
use common::{Error, Result};
use std::fmt;
use std::str::FromStr;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Drop,
    Create,
    Copy,
    Insert,
    Verify,
}

impl Phase {
    /// Drop and recreate every table.
    pub const CREATE_TABLES: [Phase; 2] = [Phase::Drop, Phase::Create];

    /// Load the staging tables and build the star schema from them.
    pub const ETL: [Phase; 2] = [Phase::Copy, Phase::Insert];

    pub const ALL: [Phase; 5] = [
        Phase::Drop,
        Phase::Create,
        Phase::Copy,
        Phase::Insert,
        Phase::Verify,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Drop => "drop",
            Phase::Create => "create",
            Phase::Copy => "copy",
            Phase::Insert => "insert",
            Phase::Verify => "verify",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Phase {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "unknown phase '{}', expected one of drop, create, copy, insert, verify",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementOutcome {
    pub label: String,
    pub table: &'static str,
    pub rows: u64,
    pub elapsed_ms: i64,
}

#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub phase: Phase,
    pub statements: Vec<StatementOutcome>,
    pub elapsed_ms: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub phases: Vec<PhaseReport>,
    pub verification: Option<VerificationReport>,
}

impl PipelineReport {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Rows affected by the statement with the given label.
    pub fn rows(&self, label: &str) -> Option<u64> {
        self.phases
            .iter()
            .flat_map(|p| &p.statements)
            .find(|s| s.label == label)
            .map(|s| s.rows)
    }
}

/// Runs catalog phases against one warehouse, strictly in sequence.
///
/// The first failing statement stops the run; nothing after it is issued.
pub struct Pipeline<'a> {
    warehouse: &'a dyn Warehouse,
    catalog: &'a StatementCatalog,
}

impl<'a> Pipeline<'a> {
    pub fn new(warehouse: &'a dyn Warehouse, catalog: &'a StatementCatalog) -> Self {
        Self { warehouse, catalog }
    }

    pub async fn run(&self, phases: &[Phase]) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();

        for &phase in phases {
            let started = Utc::now();
            info!("Starting {} phase", phase);

            let statements = match phase {
                Phase::Drop => self.run_statements(&self.catalog.drop_tables).await?,
                Phase::Create => self.run_statements(&self.catalog.create_tables).await?,
                Phase::Copy => self.run_statements(&self.catalog.copy_tables).await?,
                Phase::Insert => self.run_statements(&self.catalog.insert_tables).await?,
                Phase::Verify => {
                    let verification = verify_tables(self.warehouse).await.inspect_err(|e| {
                        error!("Verification failed: {}", e);
                    })?;
                    report.verification = Some(verification);
                    Vec::new()
                }
            };

            let elapsed_ms = (Utc::now() - started).num_milliseconds();
            info!("Finished {} phase in {} ms", phase, elapsed_ms);
            report.phases.push(PhaseReport {
                phase,
                statements,
                elapsed_ms,
            });
        }

        Ok(report)
    }

    async fn run_statements(&self, statements: &[Statement]) -> Result<Vec<StatementOutcome>> {
        let mut outcomes = Vec::with_capacity(statements.len());

        for statement in statements {
            let started = Utc::now();
            info!("Running {} on {}", statement.label, statement.target.name);

            let rows = self.warehouse.run(statement).await.inspect_err(|e| {
                error!("{}", e);
            })?;

            let elapsed_ms = (Utc::now() - started).num_milliseconds();
            info!("{}: {} rows in {} ms", statement.label, rows, elapsed_ms);
            outcomes.push(StatementOutcome {
                label: statement.label.clone(),
                table: statement.target.name,
                rows,
                elapsed_ms,
            });
        }

        Ok(outcomes)
    }
}
