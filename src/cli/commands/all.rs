use crate::config::AppConfig;
use crate::error::Result;

use super::{docker, python};

/// Run every setup, one at a time. The first failing tool stops the run;
/// its own rollback and summary have already happened by then.
pub async fn execute(config: &AppConfig) -> Result<()> {
    python::execute(config).await?;
    docker::execute(config).await?;
    Ok(())
}
