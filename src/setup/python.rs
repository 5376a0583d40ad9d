//! Python toolchain setup via pyenv.
//!
//! Installs pyenv through Homebrew when absent, wires its init snippet into
//! the user's shell profile, installs the target interpreter version, makes
//! it the global version, and verifies what actually resolves afterwards.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::{Result, RigupError};
use crate::profile::{pyenv_init_snippet, ShellProfile};
use crate::runner::StepRunner;
use crate::setup::Setup;

/// Delay after switching the global version so shims settle before the
/// verification query.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

pub struct PythonSetup {
    version: String,
    pyenv_root: PathBuf,
    profile: ShellProfile,
    settle_delay: Duration,
}

impl PythonSetup {
    /// Shell detection happens here, before any stage runs. An unrecognized
    /// `$SHELL` is the one failure that propagates instead of becoming a
    /// stage outcome.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| RigupError::Config("could not resolve home directory".to_string()))?;
        let profile = ShellProfile::detect(&home)?;

        Ok(Self {
            version: config.python_version.clone(),
            pyenv_root: config.pyenv_root(),
            profile,
            settle_delay: SETTLE_DELAY,
        })
    }

    #[cfg(test)]
    fn for_test(version: &str, profile: ShellProfile) -> Self {
        Self {
            version: version.to_string(),
            pyenv_root: PathBuf::from("/tmp/.pyenv"),
            profile,
            settle_delay: Duration::ZERO,
        }
    }

    /// Whether `pyenv versions` already lists the target version.
    async fn version_installed(&self, runner: &mut StepRunner) -> bool {
        match runner.command_output(&["pyenv", "versions"]).await {
            Ok(output) => output.contains(&self.version),
            Err(_) => false,
        }
    }

    fn check_expected(&self, raw: &str) -> VersionCheck {
        check_version_output(raw, &self.version)
    }
}

#[async_trait]
impl Setup for PythonSetup {
    fn name(&self) -> &'static str {
        "python"
    }

    async fn check_platform(&mut self, runner: &mut StepRunner) -> Result<()> {
        if runner.check_platform() {
            Ok(())
        } else {
            Err(RigupError::UnsupportedPlatform(runner.os().to_string()))
        }
    }

    async fn check_prerequisites(&mut self, runner: &mut StepRunner) -> Result<()> {
        for tool in ["brew", "curl"] {
            if !runner.command_available(tool) {
                return Err(RigupError::MissingPrerequisite(tool.to_string()));
            }
        }
        Ok(())
    }

    async fn install(&mut self, runner: &mut StepRunner) -> Result<()> {
        if !runner.command_available("pyenv") {
            tracing::info!("installing pyenv");
            if !runner.run_command(&["brew", "install", "pyenv"], None).await {
                return Err(RigupError::Command("brew install pyenv".to_string()));
            }

            if !runner.backup_file(&self.profile.path) {
                return Err(anyhow::anyhow!(
                    "could not back up {}",
                    self.profile.path.display()
                )
                .into());
            }

            let snippet = pyenv_init_snippet(&self.pyenv_root);
            if !runner.append_to_file(&self.profile.path, &snippet) {
                return Err(anyhow::anyhow!(
                    "could not update {}",
                    self.profile.path.display()
                )
                .into());
            }
            tracing::info!("added pyenv configuration to {}", self.profile.path.display());
        }

        if !self.version_installed(runner).await {
            tracing::info!("installing Python {}", self.version);
            if !runner
                .run_command(&["pyenv", "install", &self.version], None)
                .await
            {
                return Err(RigupError::Command(format!(
                    "pyenv install {}",
                    self.version
                )));
            }
        }

        Ok(())
    }

    async fn configure(&mut self, runner: &mut StepRunner) -> Result<()> {
        if !runner
            .run_command(&["pyenv", "global", &self.version], None)
            .await
        {
            return Err(RigupError::Command(format!(
                "pyenv global {}",
                self.version
            )));
        }
        tracing::info!("set Python {} as global version", self.version);

        tokio::time::sleep(self.settle_delay).await;
        Ok(())
    }

    async fn verify(&mut self, runner: &mut StepRunner) -> Result<()> {
        // Ask the version manager first; its answer is authoritative when
        // it parses.
        if let Ok(output) = runner.command_output(&["pyenv", "version"]).await {
            match self.check_expected(&output) {
                VersionCheck::Match(found) => {
                    tracing::info!("Python {} verified", found);
                    return Ok(());
                }
                VersionCheck::Mismatch(found) => {
                    return Err(RigupError::Verification(format!(
                        "expected Python {}, got {}",
                        self.version, found
                    )));
                }
                VersionCheck::Unparseable => {}
            }
        }

        // Fall back to asking the interpreter directly.
        if let Ok(output) = runner.command_output(&["python", "--version"]).await {
            match self.check_expected(&output) {
                VersionCheck::Match(found) => {
                    tracing::info!("Python {} verified", found);
                    return Ok(());
                }
                VersionCheck::Mismatch(found) => {
                    return Err(RigupError::Verification(format!(
                        "expected Python {}, got {}",
                        self.version, found
                    )));
                }
                VersionCheck::Unparseable => {}
            }
        }

        Err(RigupError::Verification(
            "could not determine Python version".to_string(),
        ))
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum VersionCheck {
    Match(String),
    Mismatch(String),
    Unparseable,
}

/// Pull the first `major.minor.patch` out of raw tool output.
pub(crate) fn extract_version(raw: &str) -> Option<String> {
    let re = regex_lite::Regex::new(r"(\d+\.\d+\.\d+)").unwrap();
    re.captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub(crate) fn check_version_output(raw: &str, expected: &str) -> VersionCheck {
    match extract_version(raw) {
        Some(found) if found == expected => VersionCheck::Match(found),
        Some(found) => VersionCheck::Mismatch(found),
        None => VersionCheck::Unparseable,
    }
}

/// True when the string is a bare `major.minor.patch` version.
pub(crate) fn looks_like_version(value: &str) -> bool {
    let re = regex_lite::Regex::new(r"^\d+\.\d+\.\d+$").unwrap();
    re.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ShellKind;
    use std::path::Path;

    fn test_profile() -> ShellProfile {
        ShellProfile {
            kind: ShellKind::Zsh,
            path: Path::new("/tmp/.zshrc").to_path_buf(),
        }
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(
            extract_version("3.11.0 (set by /Users/dev/.pyenv/version)"),
            Some("3.11.0".to_string())
        );
        assert_eq!(extract_version("Python 3.11.0"), Some("3.11.0".to_string()));
        assert_eq!(extract_version("system"), None);
        assert_eq!(extract_version(""), None);
    }

    #[test]
    fn test_manager_output_matches_expected() {
        assert_eq!(
            check_version_output("3.11.0 (set by /Users/dev/.pyenv/version)", "3.11.0"),
            VersionCheck::Match("3.11.0".to_string())
        );
    }

    #[test]
    fn test_manager_output_mismatch() {
        assert_eq!(
            check_version_output("3.10.2", "3.11.0"),
            VersionCheck::Mismatch("3.10.2".to_string())
        );
    }

    #[test]
    fn test_interpreter_fallback_output_matches() {
        // The shape returned by `python --version` when the manager query
        // failed entirely.
        assert_eq!(
            check_version_output("Python 3.11.0", "3.11.0"),
            VersionCheck::Match("3.11.0".to_string())
        );
    }

    #[test]
    fn test_unparseable_output() {
        assert_eq!(
            check_version_output("pyenv: no versions installed", "3.11.0"),
            VersionCheck::Unparseable
        );
    }

    #[test]
    fn test_looks_like_version() {
        assert!(looks_like_version("3.11.0"));
        assert!(looks_like_version("10.0.12"));
        assert!(!looks_like_version("3.11"));
        assert!(!looks_like_version("v3.11.0"));
        assert!(!looks_like_version("3.11.0 extra"));
    }

    #[tokio::test]
    async fn test_platform_stage_rejects_other_os() {
        let mut setup = PythonSetup::for_test("3.11.0", test_profile());
        let mut runner = StepRunner::with_os("linux");

        let result = setup.check_platform(&mut runner).await;
        assert!(matches!(result, Err(RigupError::UnsupportedPlatform(_))));
    }

    #[tokio::test]
    async fn test_platform_stage_accepts_macos() {
        let mut setup = PythonSetup::for_test("3.11.0", test_profile());
        let mut runner = StepRunner::with_os("macos");

        assert!(setup.check_platform(&mut runner).await.is_ok());
    }
}
