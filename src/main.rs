//! igdb-scrape main entry point
//!
//! This is the command-line interface for the IGDB playlist scraper.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use igdb_scrape::auth::{resolve_credentials, ClientCredentials};
use igdb_scrape::client::CatalogClient;
use igdb_scrape::config::{load_config_with_hash, Config};
use igdb_scrape::scrape::{scrape, select_playlists, MULTIQUERY_ENDPOINT};
use igdb_scrape::{load_catalog, ScrapeError};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// igdb-scrape: IGDB playlist scraper
///
/// Fetches game metadata from the IGDB API for a catalog of platform and
/// engine playlists and writes one name-sorted JSON file per playlist.
#[derive(Parser, Debug)]
#[command(name = "igdb-scrape")]
#[command(version)]
#[command(about = "Scrape IGDB game metadata into playlists", long_about = None)]
struct Cli {
    /// Twitch application client ID [env: TWITCH_CLIENT_ID]
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// Twitch application client secret [env: TWITCH_CLIENT_SECRET]
    #[arg(long, global = true)]
    client_secret: Option<String>,

    /// Path to TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one raw query and print the JSON response
    Query {
        /// API endpoint, e.g. `games` or `multiquery`
        endpoint: String,

        /// Apicalypse query; for `multiquery` a file path or `-` for stdin
        query: String,
    },

    /// Scrape playlists into one JSON file each
    Scrape {
        /// Playlists to scrape, repeated or comma-separated (default: all)
        #[arg(long, value_name = "NAME", value_delimiter = ',')]
        playlists: Vec<String>,

        /// Directory to write playlist files into
        outdir: PathBuf,
    },

    /// List the catalog's playlists and their filters
    Playlists,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout carries only query output.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("igdb_scrape=info,warn"),
            1 => EnvFilter::new("igdb_scrape=debug,info"),
            2 => EnvFilter::new("igdb_scrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = load_configuration(cli.config.as_deref())?;

    match cli.command {
        Command::Playlists => handle_playlists(),
        Command::Query { endpoint, query } => {
            let credentials = credentials(cli.client_id, cli.client_secret)?;
            handle_query(&config, &credentials, &endpoint, &query).await
        }
        Command::Scrape { playlists, outdir } => {
            let credentials = credentials(cli.client_id, cli.client_secret)?;
            handle_scrape(&config, &credentials, &playlists, outdir).await
        }
    }
}

/// Loads the config file if one was given, otherwise the defaults
fn load_configuration(path: Option<&std::path::Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

fn credentials(
    client_id: Option<String>,
    client_secret: Option<String>,
) -> anyhow::Result<ClientCredentials> {
    Ok(resolve_credentials(client_id, client_secret, |var| {
        std::env::var(var).ok()
    })?)
}

/// Handles `playlists`: prints every catalog title and its filter
fn handle_playlists() -> anyhow::Result<ExitCode> {
    let catalog = load_catalog().context("embedded playlist catalog is invalid")?;

    for playlist in catalog.playlists() {
        println!(
            "{}\t{}",
            playlist.title,
            playlist.query.where_clause().unwrap_or("")
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Handles `query`: sends one request and pretty-prints the JSON answer
///
/// The request is sent once, without the scrape retry policy.
async fn handle_query(
    config: &Config,
    credentials: &ClientCredentials,
    endpoint: &str,
    query: &str,
) -> anyhow::Result<ExitCode> {
    let body = if endpoint == MULTIQUERY_ENDPOINT {
        read_query_source(query)?
    } else {
        query.to_string()
    };

    let client = CatalogClient::connect(&config.api, credentials).await?;

    let response = match client.post(endpoint, &body).await {
        Ok(response) => response,
        Err(
            ScrapeError::RequestFailed { status, body }
            | ScrapeError::RetryableStatus { status, body },
        ) => {
            eprintln!("HTTP {}", status);
            eprintln!("{}", body);
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };

    if !response.is_json() {
        eprintln!(
            "Expected JSON, got {}",
            response.content_type.as_deref().unwrap_or("no content type")
        );
        eprintln!("{}", response.text());
        return Ok(ExitCode::FAILURE);
    }

    let value = match response.json() {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Malformed JSON response: {}", e);
            eprintln!("{}", response.text());
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(ExitCode::SUCCESS)
}

/// Reads a multiquery body from a file, or from stdin for `-`
fn read_query_source(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("failed to read query from stdin")?;
        return Ok(body);
    }

    std::fs::read_to_string(source).with_context(|| format!("failed to read query file {}", source))
}

/// Handles `scrape`: runs every selected playlist and reports outcomes
async fn handle_scrape(
    config: &Config,
    credentials: &ClientCredentials,
    names: &[String],
    outdir: PathBuf,
) -> anyhow::Result<ExitCode> {
    let catalog = load_catalog().context("embedded playlist catalog is invalid")?;
    let playlists = select_playlists(&catalog, names)?;

    tracing::info!(
        "Scraping {} of {} playlists (max {} active queries, {} queries/s)",
        playlists.len(),
        catalog.len(),
        config.limits.max_active_queries,
        config.limits.max_query_rate
    );

    let client = CatalogClient::connect(&config.api, credentials).await?;
    let report = scrape(config, client, playlists, outdir).await?;
    report.print_summary();

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        bail!("{} playlists failed", report.failed().count())
    }
}
