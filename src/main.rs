use anyhow::Context;
use tracing_subscriber::util::SubscriberInitExt;

pub(crate) mod authors;
pub(crate) mod cleanup;
pub(crate) mod config;
pub(crate) mod db;
pub(crate) mod duplicates;
pub(crate) mod ingest;
pub(crate) mod quote;
pub(crate) mod report;
pub(crate) mod similarity;

pub(crate) const LOG_LEVEL: tracing::level_filters::LevelFilter =
    tracing::level_filters::LevelFilter::INFO;

#[derive(Debug, Clone, clap::Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    #[arg(short, long, default_value = "false", global = true)]
    #[arg(help = "Log to console")]
    log_to_console: bool,

    #[arg(long, global = true)]
    #[arg(help = "Path to the quotes database, overrides QUOTES_DB_PATH")]
    db: Option<std::path::PathBuf>,

    #[arg(short, long, global = true)]
    #[arg(help = "Similarity threshold in (0, 1], overrides SIMILARITY_THRESHOLD")]
    threshold: Option<f64>,
}

#[derive(Debug, Clone, clap::Subcommand)]
enum Command {
    /// Report duplicates, similar quotes and authors, then offer to clean up
    Analyze {
        #[arg(short, long, default_value = "false")]
        #[arg(help = "Export the deletion plan to json in the export directory")]
        export: bool,
    },
    /// Plan the cleanup without the full report; deletes only with --confirm
    Clean {
        #[arg(long, default_value = "false")]
        #[arg(help = "Actually delete, otherwise this is a dry run")]
        confirm: bool,
    },
    /// Import quotes from a json dump or from one-quote-per-line text
    Import {
        #[arg(long, conflicts_with = "lines", required_unless_present = "lines")]
        json: Option<std::path::PathBuf>,

        #[arg(long)]
        lines: Option<std::path::PathBuf>,

        #[arg(long)]
        #[arg(help = "Language tag stored with the quotes, overrides DEFAULT_LANG")]
        lang: Option<String>,
    },
    /// Print one of the least viewed quotes and count the view
    Random,
}

fn confirm_deletion() -> anyhow::Result<bool> {
    use std::io::Write;

    print!("\nDo you want to delete duplicates and similar quotes? (yes/no): ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;

    Ok(answer.trim().eq_ignore_ascii_case("yes"))
}

fn analyze(config: &config::Config, export: bool) -> anyhow::Result<()> {
    let db = db::open_db(&config.db_path)?;
    tracing::info!(path =? config.db_path, "Database opened");

    let quotes = db::get_all_quotes(&db)?;
    tracing::info!(num_quotes = quotes.len(), "Loaded quotes");

    let plan = cleanup::plan_deletions(&quotes, config.similarity_threshold);
    let authors = authors::count_by_author(&quotes);

    println!(
        "{}",
        report::analysis_report(
            quotes.len(),
            &plan,
            &authors,
            &report::ReportLimits {
                groups: config.report_group_limit,
                authors: config.report_author_limit,
            },
        )
    );

    if export {
        let json = serde_json::to_string_pretty(&plan)?;
        std::fs::create_dir_all("export")?;
        std::fs::write("export/deletion_plan.json", json)?;
        tracing::info!("Exported deletion plan to export/deletion_plan.json");
    }

    let outcome = if plan.is_empty() {
        None
    } else if confirm_deletion()? {
        Some(cleanup::apply(&db, &plan))
    } else {
        println!("\nRunning in DRY RUN mode (no changes will be made)...");
        None
    };

    let run = cleanup::CleanupRun { plan, outcome };
    println!("{}", report::cleanup_summary(&run));

    if run.outcome.is_some() {
        println!(
            "Database now has {} quotes (was {})",
            db::count_quotes(&db)?,
            quotes.len()
        );
    }

    Ok(())
}

fn clean(config: &config::Config, confirm: bool) -> anyhow::Result<()> {
    let db = db::open_db(&config.db_path)?;
    let mode = if confirm {
        cleanup::CleanupMode::Delete
    } else {
        cleanup::CleanupMode::DryRun
    };

    let run = cleanup::run_cleanup(&db, config.similarity_threshold, mode)?;
    println!("{}", report::cleanup_summary(&run));

    Ok(())
}

fn import(
    config: &config::Config,
    json: Option<std::path::PathBuf>,
    lines: Option<std::path::PathBuf>,
    lang: Option<String>,
) -> anyhow::Result<()> {
    let quotes = match (json, lines) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            ingest::parse_quotes_json(&content)?
        }
        (None, Some(path)) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            ingest::parse_raw_lines(&content)
        }
        (None, None) => anyhow::bail!("Nothing to import, pass --json or --lines"),
    };

    let lang = lang.unwrap_or_else(|| config.default_lang.clone());
    let mut db = db::open_db(&config.db_path)?;
    let inserted = db::insert_quotes(&mut db, &quotes, &lang)?;

    tracing::info!(num_parsed = quotes.len(), inserted, lang, "Imported quotes");
    println!("Inserted {inserted} quotes into the database");

    Ok(())
}

fn random(config: &config::Config) -> anyhow::Result<()> {
    let mut db = db::open_db(&config.db_path)?;

    match db::get_random_quote(&mut db)? {
        Some(quote) => {
            tracing::info!(id = quote.id, views = quote.view_count, "Served quote");
            println!("{}", report::random_quote_line(&quote));
        }
        None => println!("No quotes found in the database."),
    }

    Ok(())
}

fn run(args: Args, config: config::Config) -> anyhow::Result<()> {
    match args.command.unwrap_or(Command::Analyze { export: false }) {
        Command::Analyze { export } => analyze(&config, export),
        Command::Clean { confirm } => clean(&config, confirm),
        Command::Import { json, lines, lang } => import(&config, json, lines, lang),
        Command::Random => random(&config),
    }
}

fn main() -> std::process::ExitCode {
    use tracing_subscriber::layer::Layer;
    use tracing_subscriber::layer::SubscriberExt;

    use clap::Parser;
    let args = Args::parse();

    let mut config = match config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e:#}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let file_appender = tracing_appender::rolling::daily("./log", "quote_cleanup.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer();
    let file_layer = file_layer
        .with_writer(non_blocking)
        .json()
        .with_filter(LOG_LEVEL)
        .boxed();

    let pretty_layer = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_filter(LOG_LEVEL)
        .boxed();

    let registry = tracing_subscriber::registry().with(file_layer);

    if config.log_to_console || args.log_to_console {
        registry.with(pretty_layer).init();
    } else {
        registry.init();
    };

    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    if let Some(threshold) = args.threshold {
        match similarity::validate_threshold(threshold) {
            Ok(threshold) => config.similarity_threshold = threshold,
            Err(e) => {
                tracing::error!(error =? e, "Invalid threshold");
                eprintln!("{e}");
                return std::process::ExitCode::FAILURE;
            }
        }
    }

    tracing::info!(config =? config, args =? args, "Starting quote cleanup");

    match run(args, config) {
        Ok(()) => {
            tracing::info!("Quote cleanup finished");
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error =? e, "Quote cleanup failed");
            eprintln!("Error: {e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}
