//! CLI commands implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use console::style;
use tokio::sync::mpsc;

use reviewacquire::config::{load_settings, Config, MissingNextPage, Settings};
use reviewacquire::models::IdentifierTarget;
use reviewacquire::scrape::{
    BatchEvent, BatchRunner, BatchSummary, IdentifierPipeline, ScrapeSettings,
};
use reviewacquire::session::SessionFactory;
use reviewacquire::storage::{OutputFormat, ReviewSink};

use super::progress::ScrapeProgress;

#[derive(Parser)]
#[command(name = "reviews")]
#[command(about = "Collect product reviews from a storefront through a real browser")]
#[command(version)]
pub struct Cli {
    /// Config file (default: discovered reviewacquire.toml/.yaml/.json)
    #[arg(short, long, global = true, env = "REVIEWS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape reviews for the given identifiers (or the configured targets)
    Scrape {
        /// Product identifiers (ASINs); replaces the configured targets
        ids: Vec<String>,
        /// Listing pages to walk per identifier
        #[arg(short, long)]
        pages: Option<u32>,
        /// Concurrent identifiers (0 = all at once)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Directory receiving one file per identifier
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        /// Show the browser window instead of running headless
        #[arg(long)]
        show_browser: bool,
        /// Finish an identifier early when a listing page has no next page
        #[arg(long)]
        stop_on_missing_next: bool,
    },

    /// Show configured targets and effective settings
    Targets,

    /// Check which browser would be used
    Check,
}

/// Command-line overrides for `scrape`.
struct ScrapeArgs {
    ids: Vec<String>,
    pages: Option<u32>,
    workers: Option<usize>,
    output_dir: Option<PathBuf>,
    format: Option<OutputFormat>,
    show_browser: bool,
    stop_on_missing_next: bool,
}

impl ScrapeArgs {
    fn apply(&self, settings: &mut Settings, config: &mut Config) {
        if let Some(pages) = self.pages {
            settings.pages = pages;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(ref dir) = self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(format) = self.format {
            settings.output_format = format;
        }
        if self.show_browser {
            config.browser.headless = false;
        }
        if self.stop_on_missing_next {
            config.reviews.on_missing_next_page = MissingNextPage::Stop;
        }
    }

    fn targets(&self, config: &Config) -> Vec<IdentifierTarget> {
        if self.ids.is_empty() {
            config.targets.clone()
        } else {
            self.ids.iter().map(IdentifierTarget::new).collect()
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut settings, mut config) = load_settings(cli.config.as_deref())
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if let Some(ref path) = config.source_path {
        tracing::info!("Using config {}", path.display());
    }

    match cli.command {
        Commands::Scrape {
            ids,
            pages,
            workers,
            output_dir,
            format,
            show_browser,
            stop_on_missing_next,
        } => {
            let args = ScrapeArgs {
                ids,
                pages,
                workers,
                output_dir,
                format,
                show_browser,
                stop_on_missing_next,
            };
            args.apply(&mut settings, &mut config);
            let targets = args.targets(&config);
            cmd_scrape(settings, config, targets).await
        }
        Commands::Targets => {
            cmd_targets(&settings, &config);
            Ok(())
        }
        Commands::Check => cmd_check(&config).await,
    }
}

async fn cmd_scrape(
    settings: Settings,
    config: Config,
    targets: Vec<IdentifierTarget>,
) -> anyhow::Result<()> {
    if targets.is_empty() {
        anyhow::bail!("No targets: pass identifiers or add [[targets]] to the config");
    }

    let sink = ReviewSink::new(&settings.output_dir, settings.output_format);
    sink.ensure_dir()?;

    println!(
        "{} Scraping {} identifiers, {} page(s) each, into {}",
        style("→").cyan(),
        targets.len(),
        settings.pages,
        settings.output_dir.display()
    );

    let scrape_settings = ScrapeSettings::from_config(&config, &settings);
    let summary =
        scrape_with_chrome(&config, scrape_settings, sink, settings.workers, targets).await?;
    print_summary(&summary);
    Ok(())
}

#[cfg(feature = "browser")]
async fn scrape_with_chrome(
    config: &Config,
    scrape_settings: ScrapeSettings,
    sink: ReviewSink,
    workers: usize,
    targets: Vec<IdentifierTarget>,
) -> anyhow::Result<BatchSummary> {
    use reviewacquire::browser::ChromeSessions;

    let factory = ChromeSessions::launch(config.browser.clone()).await?;
    Ok(run_batch(factory, scrape_settings, sink, workers, targets).await)
}

#[cfg(not(feature = "browser"))]
async fn scrape_with_chrome(
    _config: &Config,
    _scrape_settings: ScrapeSettings,
    _sink: ReviewSink,
    _workers: usize,
    _targets: Vec<IdentifierTarget>,
) -> anyhow::Result<BatchSummary> {
    anyhow::bail!("Browser support is not compiled in; rebuild with --features browser")
}

/// Run the batch while rendering its events.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
async fn run_batch<F: SessionFactory>(
    factory: F,
    scrape_settings: ScrapeSettings,
    sink: ReviewSink,
    workers: usize,
    targets: Vec<IdentifierTarget>,
) -> BatchSummary {
    let pipeline = IdentifierPipeline::new(Arc::new(factory), Arc::new(scrape_settings));
    let runner = BatchRunner::new(pipeline, sink, workers);

    let (event_tx, mut event_rx) = mpsc::channel::<BatchEvent>(100);
    let progress = ScrapeProgress::new(targets.len());

    let event_handler = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            progress.handle(event);
        }
        progress.finish();
    });

    let summary = runner.run(targets, event_tx).await;

    // Wait for event handler to finish
    let _ = event_handler.await;
    summary
}

fn print_summary(summary: &BatchSummary) {
    if summary.failures.is_empty() {
        println!(
            "{} Done: {} identifiers, {} reviews",
            style("✓").green(),
            summary.completed,
            summary.records
        );
        return;
    }

    println!(
        "{} Done: {} succeeded, {} failed, {} reviews",
        style("!").yellow(),
        summary.completed,
        summary.failed(),
        summary.records
    );
    for failure in &summary.failures {
        let kind = failure
            .kind
            .map(|k| k.to_string())
            .unwrap_or_else(|| "write failed".to_string());
        println!("  {} {} ({})", style("✗").red(), failure.id, kind);
    }
}

fn cmd_targets(settings: &Settings, config: &Config) {
    println!("{}", style("Settings").bold());
    match config.source_path {
        Some(ref path) => println!("  config:      {}", path.display()),
        None => println!("  config:      {}", style("(defaults)").dim()),
    }
    println!("  output:      {}", settings.output_dir.display());
    println!("  format:      {:?}", settings.output_format);
    println!("  workers:     {}", settings.workers);
    println!("  pages:       {}", settings.pages);
    println!("  next page:   {}", config.reviews.on_missing_next_page);
    println!("  retries:     {}", config.retry.retries);

    println!();
    if config.targets.is_empty() {
        println!("{} No configured targets", style("→").dim());
        return;
    }

    println!("{} ({})", style("Targets").bold(), config.targets.len());
    for target in &config.targets {
        println!(
            "  {:<14} {} page(s)  {}",
            style(&target.id).cyan(),
            target.pages_or(settings.pages),
            style(config.reviews.listing_url_for(&target.id)).dim()
        );
    }
}

#[cfg(feature = "browser")]
async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    use reviewacquire::browser::{find_chrome, remote_websocket_url};

    if let Some(ref remote) = config.browser.remote_url {
        match remote_websocket_url(remote).await {
            Ok(ws) => println!("{} Remote browser: {}", style("✓").green(), ws),
            Err(e) => {
                println!("{} Remote browser {}: {}", style("✗").red(), remote, e);
                anyhow::bail!("Remote browser is not reachable");
            }
        }
        return Ok(());
    }

    match find_chrome(&config.browser) {
        Ok(path) => {
            println!("{} Chrome: {}", style("✓").green(), path.display());
            println!(
                "  headless: {}, timeout: {}s, navigation timeout: {}s",
                config.browser.headless, config.browser.timeout, config.browser.navigation_timeout
            );
            if let Some(ref proxy) = config.browser.proxy {
                println!("  proxy: {}", proxy);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} {}", style("✗").red(), e);
            anyhow::bail!("No usable browser")
        }
    }
}

#[cfg(not(feature = "browser"))]
async fn cmd_check(_config: &Config) -> anyhow::Result<()> {
    println!(
        "{} Browser support is not compiled in; rebuild with --features browser",
        style("✗").red()
    );
    Ok(())
}
