use clap::{Arg, ArgAction, ArgMatches, Command};
use common::config::{EngineKind, Settings};
use etl::pipeline::{Phase, PipelineReport};
use std::process;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("Song-play warehouse ETL")
        .version("1.0")
        .about("Loads song-play logs and song metadata into a star-schema warehouse")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .default_value("config/dwh.toml")
                .global(true)
                .help("Sets a custom config file"),
        )
        .arg(
            Arg::new("engine")
                .long("engine")
                .value_name("ENGINE")
                .value_parser(["redshift", "local"])
                .global(true)
                .help("Overrides warehouse.engine from the config file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Emits logs as JSON lines"),
        )
        .subcommand(Command::new("run").about("Drop, create, load, transform and verify"))
        .subcommand(Command::new("create-tables").about("Drop and recreate every table"))
        .subcommand(Command::new("etl").about("Load the staging tables and build the star schema"))
        .subcommand(Command::new("verify").about("Check dimension keys are unique and count rows"))
        .subcommand(Command::new("report").about("Print row counts of every table"))
        .subcommand(
            Command::new("sql")
                .about("Print the statements of a phase without running them")
                .arg(
                    Arg::new("phase")
                        .required(true)
                        .value_parser(["drop", "create", "copy", "insert", "verify"]),
                ),
        )
        .subcommand(Command::new("sources").about("List the S3 source prefixes"))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn load_settings(matches: &ArgMatches) -> common::Result<Settings> {
    let config_path = matches
        .get_one::<String>("config")
        .map(|s| s.as_str())
        .unwrap_or("config/dwh.toml");
    let settings = Settings::new(config_path)?;

    match matches.get_one::<String>("engine") {
        Some(engine) => Ok(settings.with_engine(engine.parse::<EngineKind>()?)),
        None => Ok(settings),
    }
}

fn print_report(report: &PipelineReport) {
    for phase in &report.phases {
        println!("{} ({} ms)", phase.phase, phase.elapsed_ms);
        for statement in &phase.statements {
            println!(
                "  {:<24} {:>10} rows {:>8} ms",
                statement.label, statement.rows, statement.elapsed_ms
            );
        }
    }

    if let Some(verification) = &report.verification {
        println!("row counts");
        for count in &verification.counts {
            println!("  {:<24} {:>10}", count.table, count.rows);
        }
    }
}

async fn dispatch(matches: &ArgMatches) -> common::Result<()> {
    let (name, sub_matches) = matches
        .subcommand()
        .ok_or_else(|| common::Error::InvalidInput("Please specify a subcommand".to_string()))?;
    let settings = load_settings(sub_matches)?;

    let phases: &[Phase] = match name {
        "run" => &Phase::ALL,
        "create-tables" => &Phase::CREATE_TABLES,
        "etl" => &Phase::ETL,
        "verify" => &[Phase::Verify],
        "report" => {
            for count in etl::report_tables(&settings).await? {
                println!("{:<24} {:>10}", count.table, count.rows);
            }
            return Ok(());
        }
        "sql" => {
            let phase = sub_matches
                .get_one::<String>("phase")
                .map(|s| s.as_str())
                .unwrap_or_default()
                .parse::<Phase>()?;
            for statement in etl::render_phase(&settings, phase) {
                println!("{}\n", statement);
            }
            return Ok(());
        }
        "sources" => {
            settings.validate()?;
            for summary in etl::inspect_sources(&settings).await? {
                println!(
                    "{:<48} {:>8} objects {:>14} bytes",
                    summary.location, summary.objects, summary.bytes
                );
            }
            return Ok(());
        }
        other => {
            return Err(common::Error::InvalidInput(format!(
                "Unknown subcommand: {}",
                other
            )));
        }
    };

    let report = etl::run_etl_pipeline(&settings, phases).await?;
    print_report(&report);
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    let log_json = matches.get_flag("log-json")
        || matches
            .subcommand()
            .is_some_and(|(_, sub)| sub.get_flag("log-json"));
    init_tracing(log_json);

    if let Err(e) = dispatch(&matches).await {
        eprintln!("ETL pipeline error: {}", e);
        process::exit(1);
    }
}
