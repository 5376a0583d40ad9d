use thiserror::Error;

#[derive(Error, Debug)]
pub enum RigupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Unsupported shell: {0}")]
    UnsupportedShell(String),

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RigupError>;
