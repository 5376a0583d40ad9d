use console::style;

use crate::config::AppConfig;
use crate::error::Result;
use crate::profile::ShellProfile;

const ENV_KEYS: [&str; 3] = ["SHELL", "HOME", "RIGUP_PYTHON_VERSION"];
const TOOLS: [&str; 5] = ["brew", "curl", "pyenv", "python", "docker"];

/// Print the resolved configuration and the state of everything the setups
/// depend on, without changing anything.
pub async fn execute(json: bool) -> Result<()> {
    let path = AppConfig::config_path()?;
    let config = AppConfig::load()?;

    if json {
        return print_json(&config, path.exists());
    }

    println!("{}", style("Configuration").bold());
    println!(
        "  file: {} ({})",
        path.display(),
        if path.exists() {
            style("present").green()
        } else {
            style("missing, using defaults").yellow()
        }
    );
    println!("  python_version: {}", config.python_version);
    println!("  pyenv_root: {}", config.pyenv_root().display());
    println!("  docker_app: {}", config.docker_app);

    println!("\n{}", style("Environment").bold());
    for key in ENV_KEYS {
        match std::env::var(key) {
            Ok(value) if !value.is_empty() => println!("  {}: {}", key, value),
            _ => println!("  {}: {}", key, style("unset").dim()),
        }
    }
    match dirs::home_dir().map(|home| ShellProfile::detect(&home)) {
        Some(Ok(profile)) => println!(
            "  shell profile: {} ({})",
            profile.path.display(),
            profile.kind
        ),
        Some(Err(e)) => println!("  shell profile: {}", style(e).red()),
        None => println!("  shell profile: {}", style("no home directory").red()),
    }

    println!("\n{}", style("Tools on PATH").bold());
    for tool in TOOLS {
        let mark = if which::which(tool).is_ok() {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {} {}", mark, tool);
    }

    Ok(())
}

fn print_json(config: &AppConfig, config_file_present: bool) -> Result<()> {
    let environment: serde_json::Map<String, serde_json::Value> = ENV_KEYS
        .iter()
        .map(|key| {
            let value = std::env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .map_or(serde_json::Value::Null, serde_json::Value::from);
            (key.to_string(), value)
        })
        .collect();

    let tools: serde_json::Map<String, serde_json::Value> = TOOLS
        .iter()
        .map(|tool| (tool.to_string(), which::which(tool).is_ok().into()))
        .collect();

    let report = serde_json::json!({
        "config": config,
        "config_file_present": config_file_present,
        "environment": environment,
        "tools": tools,
    });

    println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    Ok(())
}
