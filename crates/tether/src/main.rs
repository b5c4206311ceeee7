//! tether - gateway bot client
//!
//! Connects to the gateway, keeps the session alive and answers slash
//! commands until interrupted.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use tether::commands::define_commands;
use tether::{BotConfig, Credentials, RestClient};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tether")]
#[command(about = "Gateway bot client")]
#[command(version)]
struct Cli {
    /// Also write logs to log-<unix-millis>.txt in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and answer commands until Ctrl-C
    Run {
        /// Path to config file
        #[arg(short, long, default_value = "tether.toml")]
        config: PathBuf,

        /// Register these commands before connecting
        #[arg(long, value_delimiter = ',')]
        define_commands: Vec<String>,
    },

    /// Register command definitions with the API
    DefineCommands {
        /// Path to config file
        #[arg(short, long, default_value = "tether.toml")]
        config: PathBuf,

        /// Command names
        #[arg(required = true, value_delimiter = ',')]
        names: Vec<String>,
    },

    /// Generate a default config file
    InitConfig {
        /// Path to write config
        #[arg(short, long, default_value = "tether.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_layer = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let millis = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
            let file = File::create(dir.join(format!("log-{millis}.txt")))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(EnvFilter::from_default_env().add_directive("tether=info".parse()?))
        .init();

    match cli.command {
        Commands::Run {
            config,
            define_commands,
        } => {
            run_bot(&config, &define_commands).await?;
        }

        Commands::DefineCommands { config, names } => {
            let config = load_config(&config)?;
            let credentials = Credentials::load(&config)?;
            register(&config, &credentials, &names).await?;
        }

        Commands::InitConfig { output } => {
            BotConfig::default().save(&output)?;
            println!("Config written to {}", output.display());
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<BotConfig> {
    if path.exists() {
        let config = BotConfig::from_file(path)?;
        info!(config = %path.display(), "loaded config");
        Ok(config)
    } else {
        warn!(config = %path.display(), "config file not found, using defaults");
        Ok(BotConfig::default())
    }
}

async fn register(
    config: &BotConfig,
    credentials: &Credentials,
    names: &[String],
) -> anyhow::Result<()> {
    let rest = RestClient::new(&config.api_base, &credentials.token)?;
    let count = define_commands(
        &rest,
        credentials.application_id,
        &config.commands_dir,
        names,
    )
    .await?;
    info!(count, "commands registered");
    Ok(())
}

async fn run_bot(config_path: &Path, define: &[String]) -> anyhow::Result<()> {
    info!(config = %config_path.display(), "starting tether");

    let config = load_config(config_path)?;
    let credentials = Credentials::load(&config)?;
    info!(application_id = credentials.application_id, "loaded credentials");

    if !define.is_empty() {
        register(&config, &credentials, define).await?;
    }

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, shutting down");
                signal.cancel();
            }
            Err(e) => error!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    tether::bot::run(&config, &credentials, shutdown).await?;
    info!("tether stopped");
    Ok(())
}
