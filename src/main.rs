//! SalesIQ CLI - AI-powered marketing data anomaly investigator.

use clap::Parser;
use salesiq::cli::{Cli, OutputFormat, parse_context};
use salesiq::config::{Settings, resolve_settings};
use salesiq::crew::SequentialCrew;
use salesiq::db::Database;
use salesiq::gemini::GeminiClient;
use salesiq::investigation::run_investigation;
use salesiq::models::Details;
use salesiq::{Error, Result};
use std::path::Path;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = match resolve_settings() {
        Ok(settings) => settings,
        Err(Error::Configuration(missing)) => {
            eprintln!("ERROR: Missing required environment variables:");
            for setting in &missing {
                eprintln!("  - {}", setting);
            }
            eprintln!("\nPlease set these variables in your environment.");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    tracing::debug!(
        database = %settings.database.value.display(),
        database_source = %settings.database.source,
        model = %settings.model.value,
        model_source = %settings.model.source,
        "settings resolved"
    );

    if cli.test_connection {
        println!("Testing database connection...");
        let connected = Database::open(&settings.database.value)
            .map(|db| db.test_connection())
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "database connection failed");
                false
            });
        if connected {
            println!("Success! Connected to the database.");
            process::exit(0);
        }
        eprintln!("Failed to connect to the database. Check your connection settings.");
        process::exit(1);
    }

    let Some(query) = cli.query.as_deref() else {
        eprintln!("ERROR: Please provide an investigation query.");
        eprintln!("Example: salesiq \"Investigate CTR drop for Campaign 5\"");
        process::exit(1);
    };

    let context = cli.context.as_deref().map(parse_context).unwrap_or_default();

    if let Err(e) = run(&settings, query, &context, cli.verbose, cli.output.as_deref()) {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    }
}

fn run(
    settings: &Settings,
    query: &str,
    context: &Details,
    verbose: bool,
    output: Option<&Path>,
) -> Result<()> {
    let db = Database::open(&settings.database.value)?;
    let generator = GeminiClient::new(settings);
    tracing::info!(model = %generator.model(), "starting investigation");
    let mut crew = SequentialCrew::new(&db, &generator, query, context.clone())
        .with_max_queries(settings.max_queries.value);

    let rule = "=".repeat(60);
    println!("\n{}\nINVESTIGATING: {}\n{}\n", rule, query, rule);

    let investigation = run_investigation(&mut crew, query, context, verbose)?;

    investigation.scratchpad.print_report();
    println!("\n## DETAILED RESULTS\n");
    println!("{}", investigation.result);

    if let Some(path) = output {
        println!("\nSaving results to {}...", path.display());
        match OutputFormat::from_path(path) {
            OutputFormat::Json => investigation.scratchpad.save_to_file(path)?,
            OutputFormat::Text => {
                investigation
                    .scratchpad
                    .save_text_report(path, query, &investigation.result)?
            }
        }
        println!("Results saved to {}", path.display());
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins; otherwise `warn`, or `info` with `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
