use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::net::SocketAddr;
use std::sync::Arc;

use marquee_server::config::Config;
use marquee_server::logging;
use marquee_server::rest::{self, AppState};

#[derive(Parser)]
#[command(
    name = "marquee",
    about = "Resolve IMDb watchlists, lists, searches and charts into title records",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG overrides.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a list URL and print its titles
    Resolve {
        /// Watchlist, list, search or chart URL
        url: String,
        /// Ignore any cached copy
        #[arg(long)]
        force: bool,
        /// Maximum number of titles (capped at 1000)
        #[arg(long)]
        max: Option<usize>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the REST endpoint and SMS webhook
    Serve {
        /// Listen port [env: MARQUEE_PORT, default 3001]
        #[arg(long)]
        port: Option<u16>,
        /// Bind address [env: MARQUEE_HOST, default 127.0.0.1]
        #[arg(long)]
        host: Option<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "marquee", &mut std::io::stdout());
        return Ok(());
    }

    // Load environment variables from a local .env, if present
    dotenvy::dotenv().ok();

    logging::init(&cli.log_level, cli.log_json);
    let mut config = Config::from_env();

    match cli.command {
        Commands::Resolve {
            url,
            force,
            max,
            json,
        } => resolve(&config, &url, force, max, json).await,
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            serve(&config).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}

async fn resolve(
    config: &Config,
    url: &str,
    force: bool,
    max: Option<usize>,
    json: bool,
) -> Result<()> {
    let resolver = config.build_resolver();
    let records = resolver.resolve(url, force, max).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        eprintln!("No titles resolved from {url}");
        return Ok(());
    }
    for (i, r) in records.iter().enumerate() {
        println!("{:>4}. {} ({})  {}  {}", i + 1, r.name, r.year, r.rating, r.link);
    }
    Ok(())
}

async fn serve(config: &Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    let state = Arc::new(AppState::new(config.build_resolver(), config.site_url.clone()));
    rest::start(addr, state).await
}
