//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager, EvictionPolicy};
use crate::error::{RescacheError, RescacheResult};
use crate::ui::{self, UiContext};

const VALID_KEYS: &[&str] = &["general.log_format", "cache.eviction"];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
) -> RescacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            let ctx = UiContext::detect();
            let updated = apply_value(config, &key, &value)?;
            manager.save(&updated).await?;
            ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> RescacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> RescacheResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;

    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

/// Return a copy of `config` with one dot-separated key set
fn apply_value(config: &Config, key: &str, value: &str) -> RescacheResult<Config> {
    let mut config = config.clone();
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = parse_log_format(value)?,
        ["cache", "eviction"] => config.cache.eviction = parse_eviction(value)?,
        _ => {
            return Err(RescacheError::User(format!(
                "Unknown config key: {} (valid keys: {})",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(config)
}

fn parse_log_format(value: &str) -> RescacheResult<String> {
    match value.to_lowercase().as_str() {
        format @ ("text" | "json") => Ok(format.to_string()),
        _ => Err(RescacheError::User(format!(
            "Invalid log format: {}. Use text/json",
            value
        ))),
    }
}

fn parse_eviction(value: &str) -> RescacheResult<EvictionPolicy> {
    match value.to_lowercase().as_str() {
        "context" => Ok(EvictionPolicy::Context),
        "unreferenced" => Ok(EvictionPolicy::Unreferenced),
        _ => Err(RescacheError::User(format!(
            "Invalid eviction policy: {}. Use context/unreferenced",
            value
        ))),
    }
}
