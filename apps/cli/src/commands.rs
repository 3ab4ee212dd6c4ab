//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use rolodex_core::pipeline::{
    AccountOutcome, AccountStatus, BatchOptions, BatchReport, Enricher, ProgressReporter, run_batch,
};
use rolodex_core::scarce::Scorer;
use rolodex_shared::{AppConfig, expand_home, init_config, load_config, load_source_credentials};
use rolodex_source::SourceClient;
use rolodex_storage::{SeedFile, Storage};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Rolodex — enrich CRM accounts with ranked contacts from a data provider.
#[derive(Parser)]
#[command(
    name = "rolodex",
    version,
    about = "Enrich CRM accounts with new contacts and company facts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich every account flagged for enrichment.
    Run {
        /// Plan and print results without writing anything back.
        #[arg(long)]
        dry_run: bool,

        /// Accounts processed at the same time (overrides `[run] concurrency`).
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Records database (overrides `[record] database_path`).
        #[arg(long, env = "ROLODEX_DB")]
        db: Option<PathBuf>,
    },

    /// List accounts with their enrichment state.
    Accounts {
        /// Records database (overrides `[record] database_path`).
        #[arg(long, env = "ROLODEX_DB")]
        db: Option<PathBuf>,
    },

    /// Import accounts and existing contacts from a JSON seed file.
    Import {
        /// Path to the seed file.
        file: PathBuf,

        /// Records database (overrides `[record] database_path`).
        #[arg(long, env = "ROLODEX_DB")]
        db: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "rolodex=info",
        1 => "rolodex=debug",
        _ => "rolodex=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            dry_run,
            concurrency,
            db,
        } => cmd_run(dry_run, concurrency, db.as_deref()).await,
        Command::Accounts { db } => cmd_accounts(db.as_deref()).await,
        Command::Import { file, db } => cmd_import(&file, db.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// `--db` wins over the configured path.
fn resolve_db_path(config: &AppConfig, flag: Option<&Path>) -> Result<PathBuf> {
    match flag {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(expand_home(&config.record.database_path)?),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(dry_run: bool, concurrency: Option<usize>, db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let concurrency = concurrency.unwrap_or(config.run.concurrency);
    if concurrency == 0 {
        return Err(eyre!("--concurrency must be at least 1"));
    }

    // Everything that can fail at startup fails here, before any account.
    let tables = config.bias.tables()?;
    let credentials = load_source_credentials(&config.source)?;
    let source = SourceClient::new(&config.source, credentials)?;
    let db_path = resolve_db_path(&config, db)?;
    let storage = Storage::open(&db_path)
        .await
        .wrap_err_with(|| format!("cannot open records database at {}", db_path.display()))?;

    let scorer = Scorer::new(Arc::new(tables), config.selection);
    let enricher = Enricher::new(scorer, config.record.default_owner.clone());

    info!(
        db = %db_path.display(),
        concurrency,
        dry_run,
        "starting enrichment run"
    );

    let reporter = CliProgress::new();
    let report = run_batch(
        Arc::new(enricher),
        Arc::new(storage),
        Arc::new(source),
        BatchOptions {
            concurrency,
            dry_run,
        },
        &reporter,
    )
    .await?;

    print_report(&report, dry_run);
    Ok(())
}

fn print_report(report: &BatchReport, dry_run: bool) {
    println!();
    if report.outcomes.is_empty() {
        println!("  No accounts pending enrichment.");
        println!();
        return;
    }

    for outcome in &report.outcomes {
        let status = match &outcome.status {
            AccountStatus::Enriched { contacts_added } => {
                format!("enriched, {contacts_added} contact(s) added")
            }
            AccountStatus::Planned {
                contacts_selected, ..
            } => format!("planned, {contacts_selected} contact(s) selected"),
            AccountStatus::Skipped { stage, reason } => format!("skipped at {stage}: {reason}"),
            AccountStatus::Failed { reason } => format!("failed: {reason}"),
        };
        println!("  {:<12} {:<28} {status}", outcome.record_id, outcome.name);
    }

    println!();
    if dry_run {
        println!("  Dry run: nothing was written.");
    } else {
        println!("  Enrichment complete!");
        println!("  Enriched: {}", report.enriched());
        println!("  Added:    {}", report.contacts_added());
    }
    println!("  Skipped:  {}", report.skipped());
    println!("  Failed:   {}", report.failed());
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

async fn cmd_accounts(db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let db_path = resolve_db_path(&config, db)?;
    let storage = Storage::open_readonly(&db_path).await?;

    info!(db = %db_path.display(), "listing accounts");
    let records = storage.list_accounts().await?;
    if records.is_empty() {
        println!("No accounts in {}", db_path.display());
        return Ok(());
    }

    println!(
        "{:<12} {:<28} {:<24} {:>8}  STATE",
        "ID", "NAME", "DOMAIN", "CONTACTS"
    );
    for record in &records {
        let state = match (record.enrichment_requested, record.enrichment_complete) {
            (_, true) => "complete",
            (true, false) => "pending",
            (false, false) => "-",
        };
        println!(
            "{:<12} {:<28} {:<24} {:>8}  {state}",
            record.account.record_id,
            record.account.name,
            record.account.domain,
            record.contact_count,
        );
    }
    Ok(())
}

async fn cmd_import(file: &Path, db: Option<&Path>) -> Result<()> {
    let config = load_config()?;
    let db_path = resolve_db_path(&config, db)?;
    let seed = SeedFile::load(file)?;
    let storage = Storage::open(&db_path).await?;

    let summary = storage.import_seed(&seed).await?;
    println!(
        "Imported {} account(s) and {} contact(s) into {}",
        summary.accounts,
        summary.contacts,
        db_path.display()
    );
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn account_finished(&self, outcome: &AccountOutcome, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Enriching [{current}/{total}] {}", outcome.name));
    }

    fn done(&self, _report: &BatchReport) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "rolodex", "-vv", "run", "--dry-run", "--concurrency", "8", "--db", "/tmp/r.db",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Run {
                dry_run,
                concurrency,
                db,
            } => {
                assert!(dry_run);
                assert_eq!(concurrency, Some(8));
                assert_eq!(db.as_deref(), Some(Path::new("/tmp/r.db")));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parses_import() {
        let cli = Cli::try_parse_from(["rolodex", "--log-format", "json", "import", "seed.json"])
            .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(cli.command, Command::Import { ref file, .. } if file == Path::new("seed.json")));
    }

    #[test]
    fn db_flag_overrides_config() {
        let config = AppConfig::default();
        let path = resolve_db_path(&config, Some(Path::new("/data/x.db"))).unwrap();
        assert_eq!(path, PathBuf::from("/data/x.db"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
