//! playlist-cache - keeps cache playlists of the tracks you actually play.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use core_runtime::config::{CoreConfig, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use core_runtime::events::{CoreEvent, EventSeverity, EventStream, RecvError};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_service::{CacheUpdate, CoreError, CoreService};
use core_sync::{CacheConfigRepository, CacheState, JsonCacheConfigRepository};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "playlist-cache")]
#[command(about = "Maintain cache playlists of the parent tracks you have been listening to")]
#[command(version)]
struct Cli {
    /// Cache config document
    #[arg(long, global = true, env = ENV_CONFIG_PATH, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[arg(long, global = true, env = "PLAYLIST_CACHE_LOG_LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// pretty, json or compact
    #[arg(long, global = true, env = "PLAYLIST_CACHE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Authorize this tool with your streaming account
    Login,
    /// Sign out and delete stored tokens
    Logout,
    /// List your playlists
    Playlists,
    /// Create or update the cache record for a parent playlist
    Add {
        parent_id: String,
        /// Use an existing playlist as the cache
        #[arg(long)]
        cache_id: Option<String>,
        /// Include long-term top tracks (true or false)
        #[arg(long, value_name = "BOOL")]
        long_term: Option<bool>,
        /// Never evict below this many tracks
        #[arg(long)]
        min_size: Option<usize>,
        /// Seconds between cycles
        #[arg(long)]
        interval: Option<u64>,
    },
    /// List configured caches
    Ls,
    /// Run cache tasks until stopped; all active caches when no id is given
    Start { parent_id: Option<String> },
    /// Deactivate a cache; a running task stops at its next cycle
    Stop { parent_id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut logging = LoggingConfig::default().with_level(cli.log_level);
    if let Some(format) = cli.log_format {
        logging = logging.with_format(format);
    }
    if let Err(e) = init_logging(logging.clone()) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli, logging).await {
        Ok(code) => code,
        Err(e) => {
            let needs_login = e
                .downcast_ref::<CoreError>()
                .is_some_and(CoreError::requires_login);
            error!(error = %format!("{:#}", e), "Command failed");
            eprintln!("Error: {:#}", e);
            if needs_login {
                eprintln!("Run `playlist-cache login` to authorize.");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, logging: LoggingConfig) -> Result<ExitCode> {
    let config_path = cli.config;
    let build_service = || -> Result<CoreService> {
        let config = CoreConfig::builder_from_env()
            .config_path(&config_path)
            .logging(logging.clone())
            .build()
            .context("Invalid configuration")?;
        Ok(CoreService::new(config)?)
    };

    match cli.command {
        // Listing only needs the config file
        Command::Ls => list_caches(&JsonCacheConfigRepository::new(&config_path)).await,
        Command::Login => login(&build_service()?).await,
        Command::Logout => {
            build_service()?.logout().await?;
            println!("Signed out");
            Ok(ExitCode::SUCCESS)
        }
        Command::Playlists => {
            for playlist in build_service()?.list_playlists().await? {
                println!("{}\t{}", playlist.id, playlist.name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Add {
            parent_id,
            cache_id,
            long_term,
            min_size,
            interval,
        } => {
            let update = CacheUpdate {
                cache_id,
                use_long_term_window: long_term,
                minimum_retained_size: min_size,
                poll_interval_seconds: interval,
            };
            let record = build_service()?.add_cache(&parent_id, update).await?;
            println!("Saved cache for {} ({})", record.parent_name, record.parent_id);
            Ok(ExitCode::SUCCESS)
        }
        Command::Start { parent_id } => start(&build_service()?, parent_id).await,
        Command::Stop { parent_id } => {
            build_service()?.set_active(&parent_id, false).await?;
            println!("Deactivated {}", parent_id);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn list_caches(repository: &JsonCacheConfigRepository) -> Result<ExitCode> {
    let caches = repository
        .list_configs()
        .await
        .with_context(|| format!("Failed to read {}", repository.path().display()))?;

    println!("Found {} caches", caches.len());
    for cache in caches {
        println!(
            "{}\t{}\tcache={}\tmin={}\tinterval={}s\t{}",
            cache.parent_id,
            cache.parent_name,
            cache.cache_id.as_deref().unwrap_or("-"),
            cache.minimum_retained_size,
            cache.poll_interval_seconds,
            if cache.active { "active" } else { "inactive" },
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn login(service: &CoreService) -> Result<ExitCode> {
    let url = service.begin_login().await?;
    println!("Open this URL in your browser and approve access:\n\n{}\n", url);
    println!("Then paste the full URL you were redirected to:");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read redirect URL")?;

    let user_id = service.complete_login(line.trim()).await?;
    println!("Signed in as {}", user_id);
    Ok(ExitCode::SUCCESS)
}

async fn start(service: &CoreService, parent_id: Option<String>) -> Result<ExitCode> {
    let user_id = service.verify_session().await?;
    info!(user_id = %user_id, "Session verified");

    let reporter = tokio::spawn(report_events(
        EventStream::new(service.event_bus().subscribe())
            .filter(|event| event.severity() >= EventSeverity::Info),
    ));

    let handles: Vec<(String, JoinHandle<CacheState>)> = match parent_id {
        Some(id) => vec![(id.clone(), service.start_cache(&id).await?)],
        None => service.start_all().await?,
    };

    if handles.is_empty() {
        reporter.abort();
        warn!("No active caches to run");
        return Ok(ExitCode::SUCCESS);
    }

    let wait_all = async {
        let mut failed = false;
        for (id, handle) in handles {
            match handle.await {
                Ok(CacheState::Fatal) => {
                    error!(parent_id = %id, "Cache task ended in FATAL");
                    failed = true;
                }
                Ok(state) => info!(parent_id = %id, state = %state, "Cache task ended"),
                Err(e) => {
                    error!(parent_id = %id, error = %e, "Cache task panicked");
                    failed = true;
                }
            }
        }
        failed
    };
    tokio::pin!(wait_all);

    let failed = tokio::select! {
        failed = &mut wait_all => failed,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping cache tasks");
            service.shutdown().await;
            wait_all.await
        }
    };
    reporter.abort();

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Log task events until the bus closes.
async fn report_events(mut events: EventStream) {
    loop {
        match events.recv().await {
            Ok(event) => log_event(&event),
            Err(RecvError::Lagged(missed)) => warn!(missed, "Event reporter fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}

fn log_event(event: &CoreEvent) {
    let message = event.description();
    match event.severity() {
        EventSeverity::Error => error!(event = ?event, "{}", message),
        EventSeverity::Warning => warn!(event = ?event, "{}", message),
        EventSeverity::Info => info!(event = ?event, "{}", message),
        EventSeverity::Debug => tracing::debug!(event = ?event, "{}", message),
    }
}
