//! Site-Audit main entry point
//!
//! This is the command-line interface for the Site-Audit crawler and
//! content analyzer.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use site_audit::config::{is_known_setting, load_config_with_hash, Config, ScanSettings};
use site_audit::output::{
    export_csv, export_json, format_markdown_report, load_scan_report, write_markdown_report,
};
use site_audit::storage::{open_storage, with_storage, SharedStorage, Storage};
use site_audit::{Pipeline, ScanStatus};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How often `scan` re-reads the scan status while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Site-Audit: crawl a site and report on its SEO and content quality
#[derive(Parser, Debug)]
#[command(name = "site-audit")]
#[command(version = "1.0.0")]
#[command(about = "Crawl a website and audit its SEO and content", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site and wait for the scan to finish
    Scan {
        /// Start URL, or a sitemap URL ending in .xml
        url: String,

        /// Stop after crawling; run `analyze` later
        #[arg(long)]
        no_analyze: bool,
    },

    /// Run (or re-run) content analysis on a crawled scan
    Analyze { scan_id: i64 },

    /// Show the status of a scan
    Status { scan_id: i64 },

    /// Print or write the markdown issue report
    Report {
        scan_id: i64,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export page rows
    Export {
        scan_id: i64,

        #[arg(short, long, value_enum)]
        format: ExportFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List past scans, newest first
    History {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },

    /// Inspect or edit scan settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    /// Print every setting
    List,

    /// Change one setting
    Set { key: String, value: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ExportFormat {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let storage = open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open database {}", config.output.database_path))?;

    match cli.command {
        Command::Scan { url, no_analyze } => handle_scan(config, storage, &url, no_analyze).await,
        Command::Analyze { scan_id } => handle_analyze(config, storage, scan_id),
        Command::Status { scan_id } => handle_status(&storage, scan_id),
        Command::Report { scan_id, output } => handle_report(&storage, scan_id, output.as_deref()),
        Command::Export {
            scan_id,
            format,
            output,
        } => handle_export(&storage, scan_id, format, output.as_deref()),
        Command::History { page, per_page } => handle_history(&storage, page, per_page),
        Command::Settings { action } => handle_settings(&storage, action),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_audit=info,warn"),
            1 => EnvFilter::new("site_audit=debug,info"),
            2 => EnvFilter::new("site_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Starts a scan and polls until it stops making progress on its own
async fn handle_scan(
    mut config: Config,
    storage: SharedStorage,
    url: &str,
    no_analyze: bool,
) -> anyhow::Result<()> {
    if no_analyze {
        config.crawler.auto_analyze = false;
    }

    let pipeline = Pipeline::new(storage, config).context("failed to build HTTP client")?;
    let scan_id = pipeline
        .start_scan(url)
        .with_context(|| format!("could not start scan of {}", url))?;
    println!("Started scan {} of {}", scan_id, url);

    let status = loop {
        tokio::time::sleep(POLL_INTERVAL).await;
        let status = pipeline.scan_status(scan_id)?;
        if !status.is_active() {
            break status;
        }
    };

    let scan = with_storage(pipeline.storage(), |s| s.get_scan(scan_id))?;
    println!("\n=== Scan {} {} ===", scan_id, status);
    println!(
        "Pages: {} new, {} updated, {} unchanged",
        scan.new_pages, scan.updated_pages, scan.unchanged_pages
    );

    match status {
        ScanStatus::Completed => println!("Issues: {}", scan.total_issues),
        ScanStatus::Crawled => println!("Run `analyze {}` to build the report", scan_id),
        ScanStatus::Failed => bail!("scan {} failed; see the log for the cause", scan_id),
        _ => {}
    }

    Ok(())
}

fn handle_analyze(config: Config, storage: SharedStorage, scan_id: i64) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(storage, config).context("failed to build HTTP client")?;
    let report = pipeline
        .trigger_analysis(scan_id)
        .with_context(|| format!("analysis of scan {} failed", scan_id))?;

    println!(
        "Scan {} analyzed: {} issues across {} pages",
        scan_id,
        report.total_issues(),
        report.total_pages
    );
    Ok(())
}

fn handle_status(storage: &SharedStorage, scan_id: i64) -> anyhow::Result<()> {
    let scan = with_storage(storage, |s| s.get_scan(scan_id))
        .with_context(|| format!("could not load scan {}", scan_id))?;

    println!("Scan {}: {}", scan.id, scan.status);
    println!("  Start URL: {}", scan.start_url);
    println!("  Created:   {}", scan.created_at);
    if let Some(finished) = &scan.finished_at {
        println!("  Finished:  {}", finished);
    }
    println!(
        "  Pages:     {} new, {} updated, {} unchanged",
        scan.new_pages, scan.updated_pages, scan.unchanged_pages
    );
    if scan.status == ScanStatus::Completed {
        println!("  Issues:    {}", scan.total_issues);
    }
    Ok(())
}

fn handle_report(
    storage: &SharedStorage,
    scan_id: i64,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let (scan, report) = load_scan_report(storage, scan_id)
        .with_context(|| format!("could not build report for scan {}", scan_id))?;

    match output {
        Some(path) => {
            write_markdown_report(&scan, &report, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("✓ Report written to: {}", path.display());
        }
        None => print!("{}", format_markdown_report(&scan, &report)),
    }
    Ok(())
}

fn handle_export(
    storage: &SharedStorage,
    scan_id: i64,
    format: ExportFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    // Unknown scans are an error rather than an empty export
    with_storage(storage, |s| s.get_scan(scan_id))
        .with_context(|| format!("could not load scan {}", scan_id))?;
    let pages = with_storage(storage, |s| s.get_pages(scan_id))?;

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };

    match format {
        ExportFormat::Csv => export_csv(&pages, writer)?,
        ExportFormat::Json => export_json(&pages, writer)?,
    }

    if let Some(path) = output {
        eprintln!("✓ Exported {} pages to: {}", pages.len(), path.display());
    }
    Ok(())
}

fn handle_history(storage: &SharedStorage, page: u32, per_page: u32) -> anyhow::Result<()> {
    if page == 0 || per_page == 0 {
        bail!("--page and --per-page must be at least 1");
    }

    let (scans, total) =
        with_storage(storage, |s| Ok((s.list_scans(page, per_page)?, s.count_scans()?)))?;

    let pages = total.div_ceil(u64::from(per_page)).max(1);
    println!("Scans (page {} of {}, {} total)\n", page, pages, total);
    println!(
        "{:>5}  {:<10}  {:>6}  {:<20}  URL",
        "ID", "STATUS", "ISSUES", "CREATED"
    );

    for scan in scans {
        println!(
            "{:>5}  {:<10}  {:>6}  {:<20}  {}",
            scan.id,
            scan.status.to_string(),
            scan.total_issues,
            scan.created_at,
            scan.start_url
        );
    }
    Ok(())
}

fn handle_settings(storage: &SharedStorage, action: SettingsAction) -> anyhow::Result<()> {
    match action {
        SettingsAction::List => {
            let settings: BTreeMap<String, String> =
                with_storage(storage, |s| s.load_settings())?.into_iter().collect();
            for (key, value) in settings {
                println!("{} = {}", key, value);
            }
        }
        SettingsAction::Set { key, value } => {
            if !is_known_setting(&key) {
                bail!("unknown setting '{}'", key);
            }

            // Reject values the next scan would fail on
            let mut settings = with_storage(storage, |s| s.load_settings())?;
            settings.insert(key.clone(), value.clone());
            ScanSettings::from_map(&settings)
                .with_context(|| format!("invalid value for {}", key))?;

            with_storage(storage, |s| s.set_setting(&key, &value))?;
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}
