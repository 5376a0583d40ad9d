use crate::config::AppConfig;
use crate::error::Result;
use crate::runner::StepRunner;
use crate::setup::docker::DockerSetup;
use crate::setup::run_setup;

pub async fn execute(config: &AppConfig) -> Result<()> {
    let mut setup = DockerSetup::new(config);
    let mut runner = StepRunner::new();
    run_setup(&mut setup, &mut runner).await
}
