//! The `qbt` command: flag parsing, connection resolution and output.

use crate::api::{QbitClient, TorrentFilter, TorrentQuery};
use crate::config::{CliArgs, Config, DEFAULT_URL};
use crate::credentials::{ConnectionParams, CredentialStore, Credentials};
use crate::error::QbtError;
use crate::torrent::Torrent;
use anyhow::{Context, Result};
use clap::builder::{PossibleValue, PossibleValuesParser, TypedValueParser};
use clap::{ArgAction, Parser};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use strum::IntoEnumIterator;
use tracing::{debug, warn};

/// `--filter` accepts exactly the status names `torrents/info` knows
fn filter_parser() -> impl TypedValueParser<Value = TorrentFilter> {
    PossibleValuesParser::new(
        TorrentFilter::iter().map(|filter| PossibleValue::new(<&'static str>::from(filter))),
    )
    .try_map(|value| value.parse::<TorrentFilter>())
}

#[derive(Parser, Debug, Clone)]
#[command(name = "qbt", version)]
#[command(about = "List torrents from a qBittorrent Web UI")]
pub struct Cli {
    /// qBittorrent Web UI URL [default: http://localhost:8080]
    #[arg(long)]
    pub url: Option<String>,

    /// Web UI username
    #[arg(long)]
    pub username: Option<String>,

    /// Web UI password (prompted for when not available)
    #[arg(long)]
    pub password: Option<String>,

    /// Config file (TOML, or JSON with a .json extension)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Filter torrents by status
    #[arg(long, default_value = "all", value_parser = filter_parser())]
    pub filter: TorrentFilter,

    /// Filter by category
    #[arg(long)]
    pub category: Option<String>,

    /// Filter by tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Sort torrents by field (e.g. name, size, added_on)
    #[arg(long)]
    pub sort: Option<String>,

    /// Reverse sort order
    #[arg(long)]
    pub reverse: bool,

    /// Limit number of torrents to show
    #[arg(long)]
    pub limit: Option<u32>,

    /// Show detailed information for each torrent
    #[arg(long)]
    pub detailed: bool,

    /// Show the properties of one torrent instead of the list
    #[arg(long, value_name = "HASH")]
    pub properties: Option<String>,

    /// Cache credentials for future use after a successful login
    #[arg(long)]
    pub cache_credentials: bool,

    /// Require cached credentials instead of prompting
    #[arg(long, conflicts_with = "clear_cached_credentials")]
    pub use_cached_credentials: bool,

    /// Clear cached credentials and exit
    #[arg(long)]
    pub clear_cached_credentials: bool,

    /// Location of the credential cache
    #[arg(long, value_name = "FILE")]
    pub credentials_file: Option<PathBuf>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Values that override configuration files and the environment.
    pub fn overrides(&self) -> CliArgs {
        CliArgs {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            config_file: self.config.clone(),
            credentials_file: self.credentials_file.clone(),
        }
    }

    pub fn query(&self) -> TorrentQuery {
        let mut query = TorrentQuery::new(self.filter);
        query.category = self.category.clone();
        query.tag = self.tag.clone();
        query.sort = self.sort.clone();
        query.reverse = self.reverse;
        query.limit = self.limit;
        query
    }
}

pub fn setup_logging(level: &str, verbose: u8, quiet: bool) -> Result<()> {
    use tracing_subscriber::fmt;

    let level = if quiet {
        tracing::Level::ERROR
    } else {
        match verbose {
            0 => level.parse().unwrap_or(tracing::Level::INFO),
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    };

    let subscriber = fmt()
        .with_max_level(level)
        .with_target(verbose > 0)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Merge explicit settings with the credential cache.
///
/// Flags, environment and config file win; the cache fills the gaps. A URL
/// left at the built-in default does not count as explicit, so a cached URL
/// is used instead. With `require_cache` a missing cache is an error.
pub fn resolve_connection(
    config: &Config,
    store: &CredentialStore,
    url_flag: Option<&str>,
    require_cache: bool,
) -> Result<ConnectionParams> {
    if require_cache && store.load().is_none() {
        anyhow::bail!(
            "No cached credentials found at {}",
            store.path().display()
        );
    }

    let explicit_url = url_flag.or_else(|| {
        let url = config.api.url.as_str();
        (url != DEFAULT_URL).then_some(url)
    });

    let params = store.resolve(
        explicit_url,
        config.api.username.as_deref(),
        config.api.password.as_deref(),
    );
    debug!(params = ?params, "Resolved connection parameters");
    Ok(params)
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read username")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn state_marker(torrent: &Torrent) -> &'static str {
    if torrent.is_downloading() {
        "⬇"
    } else if torrent.is_uploading() {
        "⬆"
    } else if torrent.is_paused() {
        "⏸"
    } else {
        "⏳"
    }
}

fn format_timestamp(time: chrono::DateTime<chrono::Utc>) -> String {
    time.with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

pub fn write_torrent(out: &mut impl Write, torrent: &Torrent, detailed: bool) -> std::io::Result<()> {
    writeln!(
        out,
        "{} {} [{:.1}%]",
        state_marker(torrent),
        torrent.name(),
        torrent.progress_percent()
    )?;

    if !detailed {
        return Ok(());
    }

    writeln!(out, "  Hash: {}", torrent.hash())?;
    writeln!(out, "  Size: {}", torrent.size_formatted())?;
    writeln!(out, "  State: {}", torrent.state())?;
    writeln!(out, "  Download speed: {}", torrent.download_speed_formatted())?;
    writeln!(out, "  Upload speed: {}", torrent.upload_speed_formatted())?;
    writeln!(out, "  ETA: {}", torrent.eta_formatted())?;
    writeln!(out, "  Seeds: {}", torrent.num_seeds())?;
    writeln!(out, "  Peers: {}", torrent.num_leechs())?;
    if !torrent.category().is_empty() {
        writeln!(out, "  Category: {}", torrent.category())?;
    }
    if !torrent.tags().is_empty() {
        writeln!(out, "  Tags: {}", torrent.tags())?;
    }
    if let Some(added) = torrent.added_on() {
        writeln!(out, "  Added on: {}", format_timestamp(added))?;
    }
    if let Some(completed) = torrent.completion_on() {
        writeln!(out, "  Completed on: {}", format_timestamp(completed))?;
    }
    Ok(())
}

pub fn write_torrent_list(
    out: &mut impl Write,
    torrents: &[Torrent],
    detailed: bool,
) -> std::io::Result<()> {
    if torrents.is_empty() {
        return writeln!(out, "No torrents found.");
    }

    writeln!(out, "Found {} torrents:", torrents.len())?;
    writeln!(out, "{}", "-".repeat(60))?;
    for torrent in torrents {
        write_torrent(out, torrent, detailed)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Suggestion printed after a failed run, picked from the first library
/// error found in the chain.
pub fn error_hint(err: &anyhow::Error) -> Option<&'static str> {
    let qbt = err.chain().find_map(|cause| cause.downcast_ref::<QbtError>())?;
    if qbt.is_auth_error() {
        Some(
            "Check the username and password, or run with --clear-cached-credentials \
             to discard stale cached credentials.",
        )
    } else if qbt.is_server_unavailable() {
        Some("Could not reach qBittorrent. Check --url and that the Web UI is enabled.")
    } else {
        None
    }
}

/// Clear the cache and report what happened. Never fails.
fn clear_cached_credentials(store: &CredentialStore) {
    match store.clear() {
        Ok(true) => println!("Cached credentials cleared successfully."),
        Ok(false) => println!("No cached credentials found."),
        Err(e) => {
            warn!(error = %e, "Failed to clear cached credentials");
            println!("Failed to clear cached credentials: {}", e);
        }
    }
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let store = config.credentials.store();

    if cli.clear_cached_credentials {
        clear_cached_credentials(&store);
        return Ok(());
    }

    let params = resolve_connection(
        &config,
        &store,
        cli.url.as_deref(),
        cli.use_cached_credentials,
    )?;

    let username = match params.username {
        Some(username) => username,
        None => prompt_username()?,
    };
    let password = match params.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let mut api = config.api.clone();
    api.url = params.url.clone();
    let client = QbitClient::with_config(&api).context("Failed to create API client")?;

    client
        .login(&username, &password)
        .await
        .with_context(|| format!("Login to {} failed", params.url))?;

    if cli.cache_credentials {
        match store.save(&Credentials::new(params.url.clone(), username, password)) {
            Ok(()) => println!("Credentials cached successfully."),
            Err(e) => warn!(error = %e, "Failed to cache credentials"),
        }
    }

    let result = show(&client, &cli).await;

    if let Err(e) = client.logout().await {
        warn!(error = %e, "Logout failed");
    }

    result
}

async fn show(client: &QbitClient, cli: &Cli) -> Result<()> {
    let api_version = client.get_api_version().await?;
    let app_version = client.get_app_version().await?;
    println!("Connected to qBittorrent {} (API v{})", app_version, api_version);

    if let Some(hash) = &cli.properties {
        let properties = client.get_torrent_properties(hash).await?;
        println!("{}", serde_json::to_string_pretty(&properties)?);
        return Ok(());
    }

    let torrents: Vec<Torrent> = client
        .get_torrents(&cli.query())
        .await?
        .into_iter()
        .map(Torrent::new)
        .collect();

    write_torrent_list(&mut std::io::stdout().lock(), &torrents, cli.detailed)?;
    Ok(())
}
