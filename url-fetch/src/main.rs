//! url-fetch CLI Application
//!
//! Fetches the content of a list of URLs, either one at a time or with a
//! concurrency throttle, prints it in input order, and can hash resources
//! or compare the two strategies' timings.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use serde::Serialize;
use std::process;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use url_fetch_lib::{
    load_env_config, parse_timeout_string, read_url_list, ConfigManager, FetchConfig,
    FetchStrategy, UrlFetcher,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// CLI arguments for url-fetch
#[derive(Parser, Debug)]
#[command(name = "url-fetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch URL content with a concurrency throttle, in input order")]
#[command(
    long_about = "Fetch the content of many URLs with at most N requests in flight.\n\nResults are printed in the order the URLs were given, regardless of which finished first. Supports http, https, ftp and file URLs."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// URLs to fetch (http, https, ftp or file)
    #[arg(value_name = "URLS", help_heading = "Input")]
    pub urls: Vec<String>,

    /// File with URLs (one per line, '#' starts a comment)
    #[arg(short = 'f', long = "file", value_name = "FILE", help_heading = "Input")]
    pub file: Option<String>,

    /// Max concurrent requests (default: 8)
    #[arg(short = 'c', long = "concurrency", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// Fetch one URL at a time instead of concurrently
    #[arg(long = "sequential", help_heading = "Performance")]
    pub sequential: bool,

    /// Fetch with both strategies and report elapsed times
    #[arg(long = "compare", help_heading = "Performance")]
    pub compare: bool,

    /// Per-request timeout, e.g. "5s", "2m" (default: 30s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Print the MD5 of each resource instead of its content
    #[arg(long = "md5", help_heading = "Output Format")]
    pub md5: bool,

    /// Output results as a JSON array
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logging
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// One entry of `--json` output.
#[derive(Debug, Serialize)]
struct FetchedResource<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    md5: Option<&'a str>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(&args);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Log level picked by the flags: `-d` debug, `-v` info, otherwise warn.
fn log_level(args: &Args) -> &'static str {
    if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    }
}

/// Set up the tracing subscriber on stderr. `RUST_LOG` wins over flags.
fn init_logging(args: &Args) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(args)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.urls.is_empty() && args.file.is_none() && std::env::var("URL_FETCH_FILE").is_err() {
        return Err("You must specify URLs or a file with --file".to_string());
    }

    if args.concurrency == Some(0) {
        return Err("Concurrency must be at least 1".to_string());
    }

    if args.compare && (args.sequential || args.md5) {
        return Err("Cannot combine --compare with --sequential or --md5".to_string());
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    Ok(())
}

/// Main fetch logic
async fn run(args: Args) -> CliResult<()> {
    let config = build_config(&args)?;
    let urls = get_urls_to_fetch(&args).await?;

    if urls.is_empty() {
        return Err("No URLs to fetch".into());
    }

    let fetcher = UrlFetcher::with_config(config)?;
    let max_concurrency = fetcher.config().max_concurrency;

    if args.compare {
        return run_comparison(&fetcher, &urls, &args).await;
    }

    let strategy = if args.sequential {
        FetchStrategy::Sequential
    } else {
        FetchStrategy::Throttled(max_concurrency)
    };

    if args.verbose {
        ui::print_header(urls.len(), strategy);
    }

    let spinner = if args.verbose || args.debug {
        None
    } else {
        ui::Spinner::start(urls.len(), strategy)
    };

    let start = Instant::now();
    let outcome = if args.md5 {
        fetch_digests(&fetcher, &urls, strategy).await
    } else {
        fetch_contents(&fetcher, &urls, strategy).await
    };
    let elapsed = start.elapsed();

    if let Some(s) = spinner {
        s.stop().await;
    }

    let results = outcome?;

    if args.md5 {
        display_digests(&urls, &results, &args)?;
    } else {
        display_contents(&urls, &results, &args)?;
        if args.verbose {
            let total_bytes = results.iter().map(String::len).sum();
            ui::print_summary(urls.len(), total_bytes, elapsed);
        }
    }

    Ok(())
}

async fn fetch_contents(
    fetcher: &UrlFetcher,
    urls: &[String],
    strategy: FetchStrategy,
) -> url_fetch_lib::Result<Vec<String>> {
    match strategy {
        FetchStrategy::Sequential => fetcher.fetch_sequential(urls).await,
        FetchStrategy::Throttled(limit) => fetcher.fetch_throttled(urls, limit).await,
    }
}

async fn fetch_digests(
    fetcher: &UrlFetcher,
    urls: &[String],
    strategy: FetchStrategy,
) -> url_fetch_lib::Result<Vec<String>> {
    match strategy {
        FetchStrategy::Sequential => fetcher.hash_throttled(urls, 1).await,
        FetchStrategy::Throttled(limit) => fetcher.hash_throttled(urls, limit).await,
    }
}

/// Fetch with both strategies, check they agree, report timings.
async fn run_comparison(fetcher: &UrlFetcher, urls: &[String], args: &Args) -> CliResult<()> {
    let throttled_strategy = FetchStrategy::Throttled(fetcher.config().max_concurrency);
    let mut timings: Vec<(FetchStrategy, Duration)> = Vec::with_capacity(2);
    let mut outputs = Vec::with_capacity(2);

    for strategy in [FetchStrategy::Sequential, throttled_strategy] {
        if args.verbose {
            ui::print_header(urls.len(), strategy);
        }
        let start = Instant::now();
        let contents = fetch_contents(fetcher, urls, strategy).await?;
        timings.push((strategy, start.elapsed()));
        outputs.push(contents);
    }

    if outputs[0] != outputs[1] {
        tracing::warn!("sequential and throttled fetches returned different content");
    }

    if args.json {
        let report: Vec<serde_json::Value> = timings
            .iter()
            .map(|(strategy, elapsed)| {
                serde_json::json!({
                    "strategy": strategy,
                    "elapsed_ms": elapsed.as_millis() as u64,
                    "urls": urls.len(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ui::print_comparison(urls.len(), &timings);
    }

    Ok(())
}

fn display_contents(urls: &[String], contents: &[String], args: &Args) -> CliResult<()> {
    if args.json {
        let entries: Vec<FetchedResource> = urls
            .iter()
            .zip(contents)
            .map(|(url, content)| FetchedResource {
                url,
                length: Some(content.len()),
                content: Some(content.as_str()),
                md5: None,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        let show_banner = urls.len() > 1;
        for (url, content) in urls.iter().zip(contents) {
            ui::print_content(url, content, show_banner);
        }
    }
    Ok(())
}

fn display_digests(urls: &[String], digests: &[String], args: &Args) -> CliResult<()> {
    if args.json {
        let entries: Vec<FetchedResource> = urls
            .iter()
            .zip(digests)
            .map(|(url, digest)| FetchedResource {
                url,
                length: None,
                content: None,
                md5: Some(digest.as_str()),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for (url, digest) in urls.iter().zip(digests) {
            ui::print_digest(url, digest);
        }
    }
    Ok(())
}

/// Build FetchConfig from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (URL_FETCH_*)
/// 3. Config file (--config, URL_FETCH_CONFIG, or discovered files)
/// 4. Built-in defaults
fn build_config(args: &Args) -> CliResult<FetchConfig> {
    let mut config = FetchConfig::default();
    let config_manager = ConfigManager::new();
    let env_config = load_env_config();

    let explicit_path = args.config.clone().or_else(|| env_config.config.clone());
    let file_config = match explicit_path {
        Some(path) => {
            tracing::info!("using config file {}", path);
            config_manager
                .load_file(&path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
        }
        None => config_manager.discover_and_load()?,
    };

    config = file_config.apply_to(config);
    config = env_config.apply_to(config);
    config = apply_cli_args_to_config(config, args);

    Ok(config)
}

/// Apply CLI arguments to config (highest precedence).
fn apply_cli_args_to_config(mut config: FetchConfig, args: &Args) -> FetchConfig {
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(secs) = args.timeout.as_deref().and_then(parse_timeout_string) {
        config.timeout = Duration::from_secs(secs);
    }
    config
}

/// Collect URLs from arguments and the URL list file, in that order.
async fn get_urls_to_fetch(args: &Args) -> CliResult<Vec<String>> {
    let mut urls = args.urls.clone();

    let file = args
        .file
        .clone()
        .or_else(|| std::env::var("URL_FETCH_FILE").ok());

    if let Some(path) = file {
        tracing::info!("reading URLs from {}", path);
        urls.extend(read_url_list(&path).await?);
    }

    Ok(urls)
}
