//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::ProxyResult;
use console::style;

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
) -> ProxyResult<()> {
    match args.action {
        None => show_config(config, false)?,
        Some(ConfigAction::Show { json }) => show_config(config, json)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
    }

    Ok(())
}

fn show_config(config: &Config, json: bool) -> ProxyResult<()> {
    let rendered = if json {
        serde_json::to_string_pretty(config)?
    } else {
        toml::to_string_pretty(config)?
    };
    println!("{}", rendered);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> ProxyResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        println!(
            "{} Config already exists at {}",
            style("[WARN]").yellow(),
            path.display()
        );
        println!("  {}", style("Use --force to overwrite").dim());
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized: {}",
        style("[OK]").green(),
        path.display()
    );

    Ok(())
}
