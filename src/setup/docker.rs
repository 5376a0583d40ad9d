//! Docker Desktop installation via Homebrew cask.
//!
//! The installer only places the application bundle; the Docker engine
//! itself starts when the user opens the app, so configure prints guidance
//! instead of mutating anything.

use std::path::PathBuf;

use async_trait::async_trait;
use console::style;

use crate::config::AppConfig;
use crate::error::{Result, RigupError};
use crate::runner::StepRunner;
use crate::setup::Setup;

pub struct DockerSetup {
    app_path: PathBuf,
}

impl DockerSetup {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            app_path: PathBuf::from(&config.docker_app),
        }
    }

    fn installed(&self) -> bool {
        self.app_path.exists()
    }
}

#[async_trait]
impl Setup for DockerSetup {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn check_platform(&mut self, runner: &mut StepRunner) -> Result<()> {
        if runner.check_platform() {
            Ok(())
        } else {
            Err(RigupError::UnsupportedPlatform(runner.os().to_string()))
        }
    }

    async fn check_prerequisites(&mut self, runner: &mut StepRunner) -> Result<()> {
        if !runner.command_available("brew") {
            return Err(RigupError::MissingPrerequisite("brew".to_string()));
        }
        Ok(())
    }

    async fn install(&mut self, runner: &mut StepRunner) -> Result<()> {
        if self.installed() {
            tracing::info!("Docker Desktop is already installed");
            return Ok(());
        }

        tracing::info!("installing Docker Desktop");
        if !runner
            .run_command(&["brew", "install", "--cask", "docker"], None)
            .await
        {
            return Err(RigupError::Command(
                "brew install --cask docker".to_string(),
            ));
        }
        Ok(())
    }

    async fn configure(&mut self, _runner: &mut StepRunner) -> Result<()> {
        // First launch has to be interactive: the app asks for privileged
        // helper installation.
        println!(
            "\n{} Start Docker Desktop from your Applications folder.",
            style("→").cyan()
        );
        println!(
            "{} After starting, wait for the Docker engine to be running.",
            style("→").cyan()
        );
        println!(
            "{} Check the status with: {}\n",
            style("→").cyan(),
            style("docker info").white()
        );
        Ok(())
    }

    async fn verify(&mut self, _runner: &mut StepRunner) -> Result<()> {
        if self.installed() {
            Ok(())
        } else {
            Err(RigupError::Verification(format!(
                "{} not found after installation",
                self.app_path.display()
            )))
        }
    }
}
