//! Box Office Predictor CLI
//!
//! A command-line tool for predicting a movie's final box office, either
//! from local artifacts or through a running prediction server.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{predict::PredictArgs, Backend};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Box Office Predictor CLI
#[derive(Parser)]
#[command(name = "boxoffice")]
#[command(author, version, about = "Predict a movie's final box office revenue", long_about = None)]
pub struct Cli {
    /// Directory holding the trained artifacts (local mode)
    #[arg(long, env = "BOXOFFICE_ARTIFACT_DIR")]
    pub artifacts: Option<PathBuf>,

    /// Prediction server URL (remote mode)
    #[arg(long, env = "BOXOFFICE_API_URL")]
    pub api_url: Option<String>,

    /// Model artifact name inside the artifact directory
    #[arg(long, env = "BOXOFFICE_MODEL_NAME")]
    pub model: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict from movie attributes given as flags or answered interactively
    Predict(PredictArgs),

    /// Predict from a stored JSON movie record (or an array of records)
    Record {
        /// Path to the record file
        path: PathBuf,
    },

    /// List the feature columns and input scheme in force
    Features,

    /// Show or update the CLI configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current configuration
    Show,

    /// Store default settings
    Set {
        #[arg(long)]
        api_url: Option<String>,

        #[arg(long)]
        artifacts: Option<PathBuf>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        default_format: Option<output::OutputFormat>,
    },
}

/// Flags win over the configuration file and local artifacts win over a
/// server URL; with nothing set, artifacts are read from the current directory
fn resolve_backend(cli: &Cli, config: &config::Config) -> Result<Backend> {
    let model = cli.model.as_deref().or(config.model_name.as_deref());

    if let Some(dir) = &cli.artifacts {
        return Backend::local(dir, model);
    }
    if let Some(url) = &cli.api_url {
        return Backend::remote(url);
    }
    if let Some(dir) = &config.artifact_dir {
        return Backend::local(dir, model);
    }
    if let Some(url) = &config.api_url {
        return Backend::remote(url);
    }
    Backend::local(&PathBuf::from("."), model)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load()?;
    let format = cli.format.or(config.default_format).unwrap_or_default();

    // Execute command
    match &cli.command {
        Commands::Predict(args) => {
            let backend = resolve_backend(&cli, &config)?;
            commands::predict::run(&backend, args.clone(), format).await?;
        }
        Commands::Record { path } => {
            let backend = resolve_backend(&cli, &config)?;
            commands::record::run(&backend, path, format).await?;
        }
        Commands::Features => {
            let backend = resolve_backend(&cli, &config)?;
            commands::features::run(&backend, format).await?;
        }
        Commands::Config(ConfigCommands::Show) => {
            commands::config::show(format)?;
        }
        Commands::Config(ConfigCommands::Set {
            api_url,
            artifacts,
            model,
            default_format,
        }) => {
            commands::config::set(commands::config::ConfigUpdate {
                api_url: api_url.clone(),
                artifact_dir: artifacts.clone(),
                model_name: model.clone(),
                default_format: *default_format,
            })?;
        }
    }

    Ok(())
}
