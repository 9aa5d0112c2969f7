use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use supplier_rank::config::Config;
use supplier_rank::error::{IngestError, StoreError};
use supplier_rank::ingest::Pipeline;
use supplier_rank::rankings::{CertificationFilter, RankingFilter, ScoreRange};
use supplier_rank::supplier::ScoredSupplier;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 1;
const EXIT_STORAGE: i32 = 2;
const EXIT_NO_DATA: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Case-insensitive match on name, sector or country
    #[arg(short, long)]
    search: Option<String>,

    /// Exact sector
    #[arg(long)]
    sector: Option<String>,

    /// Exact country
    #[arg(long)]
    country: Option<String>,

    /// Score filter: "<50", ">=80", "60-80" or "75"
    #[arg(long)]
    score: Option<String>,

    /// Only ISO 14001 certified suppliers (combines with other certifications as OR)
    #[arg(long)]
    iso14001: bool,

    /// Only B-Corp certified suppliers
    #[arg(long)]
    bcorp: bool,

    /// Only Fair Trade certified suppliers
    #[arg(long)]
    fairtrade: bool,
}

impl FilterArgs {
    fn to_filter(&self) -> anyhow::Result<RankingFilter> {
        let score = self.score.as_deref().map(ScoreRange::parse).transpose()?;
        Ok(RankingFilter {
            search: self.search.clone(),
            sector: self.sector.clone(),
            country: self.country.clone(),
            score,
            certifications: CertificationFilter {
                iso14001: self.iso14001,
                bcorp: self.bcorp,
                fairtrade: self.fairtrade,
            },
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload and score CSV files (accepts glob patterns)
    Ingest {
        /// Files or patterns such as "data/*.csv"
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Show the latest batch ranked by score (default if no subcommand)
    Rankings {
        #[command(flatten)]
        filter: FilterArgs,

        /// Tab-separated output for scripting
        #[arg(long)]
        tsv: bool,
    },
    /// Show one supplier and how its score was computed
    Show {
        /// Rank as shown in the rankings list
        rank: usize,
    },
    /// Dashboard metrics for the latest batch
    Stats,
    /// Export the latest batch as CSV
    Export {
        /// Output file
        #[arg(short, long, default_value = supplier_rank::output::DEFAULT_EXPORT_FILE)]
        output: PathBuf,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Re-score the latest batch with the configured weights
    Rescore,
    /// Remove a supplier from the latest batch and re-rank the rest
    Remove {
        supplier_id: String,
    },
    /// List uploaded batches, newest first
    History {
        /// Only batches uploaded within this window (e.g. "7d", "12h")
        #[arg(long)]
        since: Option<String>,
    },
    /// Show the effective weights and check them
    Weights,
    /// Create a config file interactively
    Init,
}

#[derive(Parser, Debug)]
#[command(name = "supplier-rank")]
#[command(about = "Score and rank suppliers by sustainability", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/supplier-rank/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Rankings {
        filter: FilterArgs::default(),
        tsv: false,
    });

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config_path = cli.config.map(PathBuf::from);

    if matches!(command, Commands::Init) {
        if let Err(e) = supplier_rank::config::init::run_init_wizard(config_path) {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
        std::process::exit(EXIT_SUCCESS);
    }

    let config = match supplier_rank::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if matches!(command, Commands::Weights) {
        std::process::exit(show_weights(&config));
    }

    // Validate config at startup
    if let Err(errors) = config.validate() {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let storage = config.storage();
    tracing::debug!(backend = ?storage.backend(), root = %storage.root().display(), "opening store");
    let pipeline = Pipeline::new(
        supplier_rank::storage::open_store(&storage),
        config.scoring_settings(),
    );

    let start_time = Instant::now();
    let result = run(command, &pipeline);
    tracing::debug!(elapsed = ?start_time.elapsed(), "done");

    match result {
        Ok(()) => std::process::exit(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(exit_code(&e));
        }
    }
}

/// Map an error to the exit code of its kind.
fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(e) = error.downcast_ref::<IngestError>() {
        return match e {
            IngestError::NoBatches | IngestError::EmptyBatch(_) => EXIT_NO_DATA,
            _ => EXIT_INPUT,
        };
    }
    if error.downcast_ref::<StoreError>().is_some() {
        return EXIT_STORAGE;
    }
    EXIT_INPUT
}

fn show_weights(config: &Config) -> i32 {
    let weights = config.weights();
    println!("Weights:");
    println!("{}", supplier_rank::output::format_weights(&weights));
    println!(
        "Intensity ceiling: {} tCO2e/$M",
        config.normalization().ceiling()
    );

    match config.validate() {
        Ok(()) => {
            println!("Configuration is valid.");
            EXIT_SUCCESS
        }
        Err(errors) => {
            eprintln!("Config errors:");
            for error in errors {
                eprintln!("  - {}", error);
            }
            EXIT_CONFIG
        }
    }
}

/// Suppliers of the latest processed batch, or `NoBatches`.
fn latest(pipeline: &Pipeline) -> anyhow::Result<Vec<ScoredSupplier>> {
    let (_, suppliers) = pipeline.latest_batch()?.ok_or(IngestError::NoBatches)?;
    Ok(suppliers)
}

fn run(command: Commands, pipeline: &Pipeline) -> anyhow::Result<()> {
    let use_colors = supplier_rank::output::should_use_colors();

    match command {
        Commands::Ingest { patterns } => {
            let paths = supplier_rank::ingest::resolve_inputs(&patterns)?;
            let mut first_error = None;

            for path in &paths {
                match pipeline.ingest(path) {
                    Ok(batch) => {
                        println!(
                            "{}: {} suppliers scored, {} rows skipped (batch {})",
                            path.display(),
                            batch.suppliers.len(),
                            batch.rejected.len(),
                            batch.record.id
                        );
                        tracing::debug!(url = %batch.processed_url, "stored processed batch");
                    }
                    Err(e) => {
                        // Keep going with the remaining files
                        eprintln!("{}: {:#}", path.display(), e);
                        first_error.get_or_insert(e);
                    }
                }
            }

            match first_error {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }
        Commands::Rankings { filter, tsv } => {
            let filter = filter.to_filter()?;
            let suppliers = latest(pipeline)?;
            let shown = filter.apply(&suppliers);

            if tsv {
                let output = supplier_rank::output::format_tsv(&shown);
                if !output.is_empty() {
                    println!("{}", output);
                }
            } else {
                println!(
                    "{}",
                    supplier_rank::output::format_ranking_table(&shown, use_colors)
                );
            }
            Ok(())
        }
        Commands::Show { rank } => {
            let (scored, breakdown) = pipeline.explain(rank)?;
            println!(
                "{}",
                supplier_rank::output::format_supplier_detail(&scored, &breakdown, use_colors)
            );
            Ok(())
        }
        Commands::Stats => {
            let suppliers = latest(pipeline)?;
            let stats = supplier_rank::rankings::dashboard_stats(&suppliers);
            let distribution = supplier_rank::rankings::score_distribution(&suppliers);
            let sectors = supplier_rank::rankings::sector_breakdown(&suppliers);
            let top = supplier_rank::rankings::top_performers(
                &suppliers,
                supplier_rank::rankings::DEFAULT_TOP_PERFORMERS,
            );
            println!(
                "{}",
                supplier_rank::output::format_stats(&stats, &distribution, &sectors, &top, use_colors)
            );
            Ok(())
        }
        Commands::Export { output, filter } => {
            let filter = filter.to_filter()?;
            let suppliers = latest(pipeline)?;
            let selected = filter.apply(&suppliers);
            supplier_rank::output::export_csv(&selected, &output)?;
            println!("Exported {} suppliers to {}", selected.len(), output.display());
            Ok(())
        }
        Commands::Rescore => {
            let batch = pipeline.rescore()?;
            println!(
                "Re-scored {} suppliers in batch {}",
                batch.suppliers.len(),
                batch.record.id
            );
            Ok(())
        }
        Commands::Remove { supplier_id } => {
            let remaining = pipeline.remove_supplier(&supplier_id)?;
            println!(
                "Removed {}; {} suppliers remain",
                supplier_id,
                remaining.len()
            );
            Ok(())
        }
        Commands::History { since } => {
            let now = chrono::Utc::now();
            let batches = match since.as_deref() {
                Some(window) => pipeline.history_since(window, now)?,
                None => pipeline.history()?,
            };
            println!(
                "{}",
                supplier_rank::output::format_history(&batches, now, use_colors)
            );
            Ok(())
        }
        // Handled before the store is opened
        Commands::Weights | Commands::Init => Ok(()),
    }
}
