//! Setup components and the stage driver.
//!
//! Each target tool implements [`Setup`]: five ordered stages, each gating
//! the next. The driver owns the sequencing so components stay flat; there
//! is no base-class hierarchy, only this trait and a shared [`StepRunner`].

pub mod docker;
pub mod python;

use async_trait::async_trait;
use console::style;

use crate::error::Result;
use crate::runner::StepRunner;
use crate::tracker::StepStatus;
use crate::utils::format_duration;

/// One tool's setup, split into the fixed stage sequence.
///
/// Stages return a typed error on failure; the driver stops at the first
/// failing stage, rolls back any registered mutations, and reports.
#[async_trait]
pub trait Setup {
    fn name(&self) -> &'static str;

    async fn check_platform(&mut self, runner: &mut StepRunner) -> Result<()>;
    async fn check_prerequisites(&mut self, runner: &mut StepRunner) -> Result<()>;
    async fn install(&mut self, runner: &mut StepRunner) -> Result<()>;
    async fn configure(&mut self, runner: &mut StepRunner) -> Result<()>;
    async fn verify(&mut self, runner: &mut StepRunner) -> Result<()>;
}

/// Run the five stages in order, short-circuiting on the first failure.
///
/// A failure after mutations were registered triggers a best-effort
/// rollback. The step summary is printed in every case, and the stage
/// error propagates to the caller so the process exit reflects it.
pub async fn run_setup(setup: &mut dyn Setup, runner: &mut StepRunner) -> Result<()> {
    println!(
        "{}",
        style(format!("Setting up {}", setup.name())).bold().cyan()
    );

    let outcome = run_stages(setup, runner).await;

    if let Err(ref e) = outcome {
        tracing::error!("{} setup failed: {}", setup.name(), e);
        if runner.has_rollback_steps() {
            println!("{}", style("Rolling back changes...").yellow());
            let report = runner.rollback();
            if report.is_clean() {
                println!("  undid {} change(s)", report.attempted);
            } else {
                for (label, reason) in &report.failures {
                    eprintln!(
                        "  {} could not undo '{}': {}",
                        style("!").yellow(),
                        label,
                        reason
                    );
                }
            }
        }
    }

    print_summary(setup.name(), runner);

    match outcome {
        Ok(()) => {
            println!(
                "{}",
                style(format!("✓ {} setup completed", setup.name()))
                    .green()
                    .bold()
            );
            Ok(())
        }
        Err(e) => {
            println!(
                "{} {}",
                style(format!("✗ {} setup failed:", setup.name())).red().bold(),
                e
            );
            Err(e)
        }
    }
}

async fn run_stages(setup: &mut dyn Setup, runner: &mut StepRunner) -> Result<()> {
    setup.check_platform(runner).await?;
    setup.check_prerequisites(runner).await?;
    setup.install(runner).await?;
    setup.configure(runner).await?;
    setup.verify(runner).await?;
    Ok(())
}

fn print_summary(name: &str, runner: &StepRunner) {
    let summary = runner.summary();
    if summary.total == 0 {
        return;
    }

    println!(
        "\n{} ({} steps, {} succeeded, {} failed)",
        style(format!("{} run summary", name)).bold(),
        summary.total,
        summary.succeeded,
        summary.failed
    );

    for record in &summary.records {
        let mark = match record.status {
            StepStatus::Succeeded => style("✓").green(),
            StepStatus::Failed => style("✗").red(),
            StepStatus::Running => style("…").dim(),
        };
        let elapsed = record
            .elapsed_secs()
            .map(|s| format!(" ({})", format_duration(s)))
            .unwrap_or_default();
        match &record.error {
            Some(error) => println!("  {} {}{} : {}", mark, record.name, elapsed, error),
            None => println!("  {} {}{}", mark, record.name, elapsed),
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RigupError;
    use crate::runner::RollbackAction;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Records which stages ran and fails at a chosen stage.
    struct ScriptedSetup {
        fail_at: Option<&'static str>,
        ran: Vec<&'static str>,
        register_rollback: bool,
    }

    impl ScriptedSetup {
        fn new(fail_at: Option<&'static str>) -> Self {
            Self {
                fail_at,
                ran: Vec::new(),
                register_rollback: false,
            }
        }

        fn stage(&mut self, name: &'static str) -> Result<()> {
            self.ran.push(name);
            if self.fail_at == Some(name) {
                return Err(RigupError::Command(format!("{name} broke")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Setup for ScriptedSetup {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn check_platform(&mut self, _runner: &mut StepRunner) -> Result<()> {
            self.stage("platform")
        }

        async fn check_prerequisites(&mut self, _runner: &mut StepRunner) -> Result<()> {
            self.stage("prerequisites")
        }

        async fn install(&mut self, runner: &mut StepRunner) -> Result<()> {
            if self.register_rollback {
                runner.add_rollback(RollbackAction::new("undo install", || Ok(())));
            }
            self.stage("install")
        }

        async fn configure(&mut self, _runner: &mut StepRunner) -> Result<()> {
            self.stage("configure")
        }

        async fn verify(&mut self, _runner: &mut StepRunner) -> Result<()> {
            self.stage("verify")
        }
    }

    #[tokio::test]
    async fn test_all_stages_run_in_order() {
        let mut setup = ScriptedSetup::new(None);
        let mut runner = StepRunner::with_os("macos");

        run_setup(&mut setup, &mut runner).await.unwrap();
        assert_eq!(
            setup.ran,
            vec!["platform", "prerequisites", "install", "configure", "verify"]
        );
    }

    #[tokio::test]
    async fn test_failure_halts_later_stages() {
        let mut setup = ScriptedSetup::new(Some("prerequisites"));
        let mut runner = StepRunner::with_os("macos");

        let result = run_setup(&mut setup, &mut runner).await;
        assert!(result.is_err());
        assert_eq!(setup.ran, vec!["platform", "prerequisites"]);
    }

    #[tokio::test]
    async fn test_failure_after_mutation_rolls_back() {
        let mut setup = ScriptedSetup::new(Some("configure"));
        let mut runner = StepRunner::with_os("macos");

        let rolled_back = Arc::new(AtomicBool::new(false));
        let flag = rolled_back.clone();
        runner.add_rollback(RollbackAction::new("undo install", move || {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        }));

        let result = run_setup(&mut setup, &mut runner).await;
        assert!(result.is_err());
        assert!(rolled_back.load(Ordering::SeqCst));
        assert!(!runner.has_rollback_steps());
    }

    #[tokio::test]
    async fn test_success_leaves_rollback_unconsumed() {
        let mut setup = ScriptedSetup::new(None);
        setup.register_rollback = true;
        let mut runner = StepRunner::with_os("macos");

        run_setup(&mut setup, &mut runner).await.unwrap();
        assert!(runner.has_rollback_steps());
    }
}
