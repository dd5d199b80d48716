//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use ecfr_core::ProgressReporter;
use ecfr_core::pipeline::{self, CombineResult, DownloadConfig, SummarizeResult};
use ecfr_fetch::{DocumentKind, FetchOptions};
use ecfr_shared::{AppConfig, init_config, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ecfr — flatten eCFR title structures into word-counted summaries.
#[derive(Parser)]
#[command(
    name = "ecfr",
    version,
    about = "Download, combine, and summarize eCFR title structure documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.ecfr/ecfr.toml.
    #[arg(long, env = "ECFR_CONFIG", global = true)]
    pub config: Option<PathBuf>,

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
    /// Download title documents from the eCFR versioner API.
    Download {
        /// Download full-text XML snapshots instead of structure JSON.
        #[arg(long)]
        xml: bool,

        /// Snapshot date for --xml (YYYY-MM-DD).
        #[arg(long)]
        date: Option<NaiveDate>,

        /// First title to download.
        #[arg(long)]
        from: Option<u32>,

        /// Last title to download.
        #[arg(long)]
        to: Option<u32>,

        /// Output folder.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Pause between requests in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Combine a folder of title documents into one corpus file.
    Combine {
        /// Folder containing title-N.json files.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Corpus file to write.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Flatten a corpus file into the summary file.
    Summarize {
        /// Corpus file to read.
        #[arg(short, long)]
        corpus: Option<PathBuf>,

        /// Summary file to write.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Combine, then summarize.
    Run {
        /// Folder containing title-N.json files.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Corpus file to write.
        #[arg(short, long)]
        corpus: Option<PathBuf>,

        /// Summary file to write.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print per-title word, section, and part counts from a summary file.
    Stats {
        /// Summary file to read.
        #[arg(short, long)]
        summary: Option<PathBuf>,

        /// Print the rollup as JSON.
        #[arg(long)]
        json: bool,
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
        0 => "ecfr=info",
        1 => "ecfr=debug",
        _ => "ecfr=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

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
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Download {
            xml,
            date,
            from,
            to,
            out,
            delay_ms,
        } => {
            let args = DownloadArgs {
                xml,
                date,
                from,
                to,
                out,
                delay_ms,
            };
            cmd_download(&config, args).await
        }
        Command::Combine { input, out } => {
            let input = input.unwrap_or_else(|| config.paths.input_dir.clone());
            let out = out.unwrap_or_else(|| config.paths.corpus_file.clone());
            cmd_combine(&input, &out).map(|_| ())
        }
        Command::Summarize { corpus, out } => {
            let corpus = corpus.unwrap_or_else(|| config.paths.corpus_file.clone());
            let out = out.unwrap_or_else(|| config.paths.summary_file.clone());
            cmd_summarize(&corpus, &out).map(|_| ())
        }
        Command::Run { input, corpus, out } => {
            let input = input.unwrap_or_else(|| config.paths.input_dir.clone());
            let corpus = corpus.unwrap_or_else(|| config.paths.corpus_file.clone());
            let out = out.unwrap_or_else(|| config.paths.summary_file.clone());
            cmd_combine(&input, &corpus)?;
            cmd_summarize(&corpus, &out)?;
            Ok(())
        }
        Command::Stats { summary, json } => {
            let summary = summary.unwrap_or_else(|| config.paths.summary_file.clone());
            cmd_stats(&summary, json)
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Flag overrides for `download`.
struct DownloadArgs {
    xml: bool,
    date: Option<NaiveDate>,
    from: Option<u32>,
    to: Option<u32>,
    out: Option<PathBuf>,
    delay_ms: Option<u64>,
}

/// Merge `download` flags over the loaded config.
fn download_config(config: &AppConfig, args: DownloadArgs) -> Result<DownloadConfig> {
    let first = args.from.unwrap_or(config.fetch.first_title);
    let last = args.to.unwrap_or(config.fetch.last_title);
    if first == 0 || first > last {
        return Err(eyre!("invalid title range {first}..={last}"));
    }

    let (kind, default_dir) = if args.xml {
        let date = args.date.unwrap_or(config.fetch.snapshot_date);
        (DocumentKind::Full(date), &config.paths.xml_dir)
    } else {
        (DocumentKind::Structure, &config.paths.input_dir)
    };

    Ok(DownloadConfig {
        fetch: FetchOptions::try_from(&config.fetch)?,
        kind,
        titles: first..=last,
        out_dir: args.out.unwrap_or_else(|| default_dir.clone()),
        delay: Duration::from_millis(args.delay_ms.unwrap_or(config.fetch.delay_ms)),
    })
}

async fn cmd_download(config: &AppConfig, args: DownloadArgs) -> Result<()> {
    let download = download_config(config, args)?;

    info!(
        kind = ?download.kind,
        first = download.titles.start(),
        last = download.titles.end(),
        out = %download.out_dir.display(),
        "downloading titles"
    );

    let reporter = CliProgress::new();
    let report = pipeline::download(&download, &reporter).await?;

    println!();
    println!("  Download finished.");
    println!("  Saved:  {}", report.saved.len());
    println!("  Failed: {}", report.failed.len());
    for (title, reason) in &report.failed {
        println!("    title {title}: {reason}");
    }
    println!("  Folder: {}", download.out_dir.display());
    println!();

    Ok(())
}

fn cmd_combine(input: &Path, out: &Path) -> Result<CombineResult> {
    info!(input = %input.display(), out = %out.display(), "combining titles");

    let reporter = CliProgress::new();
    let result = pipeline::combine(input, out, &reporter)?;

    println!();
    println!("  Combined {} titles into {}", result.loaded, result.corpus.path.display());
    if !result.failures.is_empty() {
        println!("  Skipped {} file(s):", result.failures.len());
        for failure in &result.failures {
            println!("    {}: {}", failure.file, failure.error);
        }
    }
    println!("  SHA-256: {}", result.corpus.sha256);
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(result)
}

fn cmd_summarize(corpus: &Path, out: &Path) -> Result<SummarizeResult> {
    info!(corpus = %corpus.display(), out = %out.display(), "summarizing corpus");

    let reporter = CliProgress::new();
    let result = pipeline::summarize(corpus, out, &reporter)?;

    println!();
    println!(
        "  Summarized {} nodes from {} titles into {}",
        result.summary.count,
        result.titles,
        result.summary.path.display()
    );
    println!("  SHA-256: {}", result.summary.sha256);
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(result)
}

fn cmd_stats(summary: &Path, json: bool) -> Result<()> {
    let entries = ecfr_core::loader::read_summary(summary)?;
    let report = ecfr_core::stats::title_stats(&entries);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{:<10} {:<24} {:>12} {:>10} {:>8} {:>10} {:>14}",
        "title", "name", "words", "sections", "parts", "entries", "words/section"
    );
    for row in &report.titles {
        println!(
            "{:<10} {:<24} {:>12} {:>10} {:>8} {:>10} {:>14.1}",
            row.title_number,
            row.title_name,
            row.word_count,
            row.section_count,
            row.part_count,
            row.entry_count,
            row.avg_words_per_section
        );
    }
    println!();
    println!("  Total words:      {}", report.total_words());
    println!("  Untitled entries: {}", report.untitled_entries);

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
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
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item(&self, name: &str, current: usize, total: usize) {
        self.spinner.set_message(format!("[{current}/{total}] {name}"));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}
