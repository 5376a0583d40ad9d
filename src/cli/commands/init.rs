use console::style;
use dialoguer::Input;

use crate::config::AppConfig;
use crate::error::Result;
use crate::setup::python::looks_like_version;

pub async fn execute() -> Result<()> {
    println!("{}", style("🔧 Welcome to rigup!").bold().cyan());
    println!("Let's configure your machine setup.\n");

    let python_version: String = Input::new()
        .with_prompt("Python version to install")
        .default("3.11.0".to_string())
        .validate_with(|value: &String| {
            if looks_like_version(value) {
                Ok(())
            } else {
                Err("use the full version, like 3.11.0")
            }
        })
        .interact_text()?;

    let pyenv_root: String = Input::new()
        .with_prompt("pyenv root (optional)")
        .allow_empty(true)
        .interact_text()?;

    let config = AppConfig {
        python_version,
        pyenv_root: if pyenv_root.is_empty() {
            None
        } else {
            Some(pyenv_root)
        },
        ..Default::default()
    };

    config.save()?;

    println!("\n{}", style("✓ Configuration saved!").green().bold());
    println!(
        "Config file: {}",
        style(AppConfig::config_path()?.display()).dim()
    );
    println!(
        "\nRun {} to provision everything, or {} first.",
        style("rigup all").cyan(),
        style("rigup check").cyan()
    );

    Ok(())
}
