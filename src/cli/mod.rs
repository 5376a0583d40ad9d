pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "rigup")]
#[command(version)]
#[command(about = "First-time dev machine setup for macOS")]
#[command(
    long_about = "Install and configure your development tools on a fresh Mac.\n\nEach subcommand provisions one tool; failures roll back what was changed."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize rigup configuration
    Init,

    /// Install and configure Python via pyenv
    Python {
        /// Target interpreter version, like 3.11.0
        #[arg(long)]
        version: Option<String>,
    },

    /// Install Docker Desktop
    Docker,

    /// Run every setup in order (Python first, then Docker)
    All,

    /// Show the resolved configuration and environment diagnostics
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Init => commands::init::execute().await,
            Commands::Python { version } => {
                let mut config = AppConfig::load()?;
                if let Some(version) = version {
                    config.python_version = version;
                }
                config.validate()?;
                commands::python::execute(&config).await
            }
            Commands::Docker => {
                let config = AppConfig::load()?;
                commands::docker::execute(&config).await
            }
            Commands::All => {
                let config = AppConfig::load()?;
                config.validate()?;
                commands::all::execute(&config).await
            }
            Commands::Check { json } => commands::check::execute(json).await,
        }
    }
}
