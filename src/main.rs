//! Waypost command line.
//!
//! - `check` validates a configuration file
//! - `test` resolves one URL against the configured routes
//! - `watch` keeps a runtime alive, reloading the file on change

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use waypost::config::{load_config, ConfigWatcher, ObservabilityConfig};
use waypost::lifecycle::{shutdown_on_ctrl_c, Shutdown};
use waypost::observability::init_logging;
use waypost::{Location, RouteManager, RouteOutcome, RouteSource, Runtime};

#[derive(Parser)]
#[command(name = "waypost")]
#[command(about = "Route matching and event dispatch toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Check {
        /// Path to the TOML configuration
        config: PathBuf,
    },
    /// Resolve a URL against every configured route
    Test {
        /// Path to the TOML configuration
        config: PathBuf,
        /// URL or path to resolve
        url: String,
        /// Route on the hash fragment instead of the configured source
        #[arg(long)]
        hash: bool,
    },
    /// Run a runtime and reload it whenever the file changes
    Watch {
        /// Path to the TOML configuration
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            init_logging(&ObservabilityConfig::default())?;
            let loaded = load_config(&config)?;
            println!(
                "{}: ok ({} routes, {} scopes)",
                config.display(),
                loaded.routes.len(),
                loaded.scopes.owners.len()
            );
        }
        Commands::Test { config, url, hash } => {
            let loaded = load_config(&config)?;
            let source = if hash {
                RouteSource::Hash
            } else {
                loaded.routing.source
            };
            let location = Location::parse(&url)?;
            let manager = RouteManager::from_config(&loaded.routes)?;
            let outcomes = manager.resolve(location.target(source));
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
        }
        Commands::Watch { config } => {
            let loaded = load_config(&config)?;
            init_logging(&loaded.observability)?;
            watch(config, &loaded).await?;
        }
    }

    Ok(())
}

async fn watch(
    path: PathBuf,
    config: &waypost::WaypostConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = Runtime::new(config)?;
    runtime.dispatcher().on::<RouteOutcome, _>(|outcome| {
        if outcome.result.matched {
            tracing::info!(
                route = outcome.name.as_deref().unwrap_or("-"),
                pattern = %outcome.pattern,
                params = ?outcome.result.params,
                remainder = %outcome.result.remainder,
                "Route matched"
            );
        }
    });

    let (watcher, updates) = ConfigWatcher::new(&path);
    // Dropping the handle stops the watcher.
    let _handle = watcher.run()?;

    let shutdown = Shutdown::new();
    let follower = runtime.follow(updates, shutdown.subscribe());
    tokio::join!(follower, shutdown_on_ctrl_c(shutdown.clone()));

    tracing::info!("Shutdown complete");
    Ok(())
}
