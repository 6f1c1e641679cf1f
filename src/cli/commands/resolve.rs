//! Resolve command - build stores in a workspace and report hits and misses

use crate::cache::{CacheStats, Lookup, SlotInfo};
use crate::cli::args::{OutputFormat, ResolveArgs};
use crate::config::{Config, WorkspaceConfig};
use crate::context::Workspace;
use crate::error::{RescacheError, RescacheResult};
use crate::stores::{Resolution, StoreKind};
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Serialize)]
struct Pass {
    label: &'static str,
    resolutions: Vec<Resolution>,
}

#[derive(Debug, Serialize)]
struct Report {
    workspace: String,
    passes: Vec<Pass>,
    stats: CacheStats,
    evicted: Vec<String>,
    slots: Vec<SlotInfo>,
}

/// Execute the resolve command
pub fn execute(args: ResolveArgs, config: &Config) -> RescacheResult<()> {
    let workspace_config = select_workspace(config, args.workspace.as_deref())?;
    let mut workspace = Workspace::from_config(workspace_config, &config.cache)?;
    let stores = requested_stores(&workspace, &args.stores)?;

    let report = run(&mut workspace, &stores, args.swap_client)?;
    let dropped = workspace.teardown();
    debug!("Dropped {} store(s) at teardown", dropped);

    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => print_plain(&report),
    }

    Ok(())
}

fn select_workspace<'a>(
    config: &'a Config,
    name: Option<&str>,
) -> RescacheResult<&'a WorkspaceConfig> {
    match name {
        Some(name) => config
            .workspace(name)
            .ok_or_else(|| RescacheError::WorkspaceNotFound(name.to_string())),
        None => config
            .default_workspace()
            .ok_or_else(|| RescacheError::WorkspaceNotFound("(none configured)".to_string())),
    }
}

/// Requested namespaces, or every built-in kind when none were given
fn requested_stores(workspace: &Workspace, stores: &[String]) -> RescacheResult<Vec<String>> {
    if stores.is_empty() {
        return Ok(StoreKind::ALL
            .iter()
            .map(|k| k.namespace().to_string())
            .collect());
    }

    for store in stores {
        if !workspace.registry().contains(store) {
            return Err(RescacheError::User(format!(
                "Unknown store: {} (known: {})",
                store,
                workspace.registry().namespaces().join(", ")
            )));
        }
    }

    Ok(stores.to_vec())
}

fn run(workspace: &mut Workspace, stores: &[String], swap_client: bool) -> RescacheResult<Report> {
    let mut passes = vec![resolve_pass(workspace, "initial", stores)?];

    if swap_client {
        let client = Arc::new(workspace.context().client.reconnect());
        workspace.set_client(client);
        passes.push(resolve_pass(workspace, "client swapped", stores)?);
    }

    let evicted = workspace.collect();

    Ok(Report {
        workspace: workspace.name().to_string(),
        passes,
        stats: workspace.stats(),
        evicted,
        slots: workspace.entries(),
    })
}

fn resolve_pass(
    workspace: &mut Workspace,
    label: &'static str,
    stores: &[String],
) -> RescacheResult<Pass> {
    let mut resolutions = Vec::new();
    for store in stores {
        resolutions.extend(workspace.resolve_traced(store)?);
    }
    Ok(Pass { label, resolutions })
}

fn print_table(report: &Report) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, &format!("Resolving stores in {}", report.workspace));

    for pass in &report.passes {
        ui::section(&ctx, pass.label);
        println!(
            "{:<36} {:<8} {:<14}",
            style("NAMESPACE").bold(),
            style("LOOKUP").bold(),
            style("DIGEST").bold()
        );
        println!("{}", "-".repeat(60));

        for resolution in &pass.resolutions {
            let lookup = match resolution.lookup {
                Lookup::Hit => style("hit").green(),
                Lookup::Miss => style("miss").yellow(),
            };
            let namespace = format!(
                "{}{}",
                "  ".repeat(resolution.depth),
                resolution.namespace
            );
            println!("{:<36} {:<8} {:<14}", namespace, lookup, resolution.digest);
        }
        println!();
    }

    let stats = &report.stats;
    ui::key_value(&ctx, "Hits", &stats.hits.to_string());
    ui::key_value(&ctx, "Misses", &stats.misses.to_string());
    ui::key_value(&ctx, "Superseded", &stats.supersessions.to_string());
    if !report.evicted.is_empty() {
        ui::key_value(&ctx, "Evicted", &report.evicted.join(", "));
    }
    ui::key_value(&ctx, "Live slots", &report.slots.len().to_string());
}

fn print_plain(report: &Report) {
    for pass in &report.passes {
        for resolution in &pass.resolutions {
            let lookup = match resolution.lookup {
                Lookup::Hit => "hit",
                Lookup::Miss => "miss",
            };
            println!("{} {} {}", resolution.namespace, lookup, resolution.digest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Workspace {
        Workspace::from_config(&WorkspaceConfig::default(), &Default::default()).unwrap()
    }

    #[test]
    fn select_default_and_named_workspace() {
        let config = Config::default();
        assert_eq!(select_workspace(&config, None).unwrap().name, "default");
        assert_eq!(
            select_workspace(&config, Some("default")).unwrap().name,
            "default"
        );
        assert!(matches!(
            select_workspace(&config, Some("staging")),
            Err(RescacheError::WorkspaceNotFound(_))
        ));
    }

    #[test]
    fn empty_request_means_every_store() {
        let ws = workspace();
        assert_eq!(requested_stores(&ws, &[]).unwrap().len(), 9);
        assert!(requested_stores(&ws, &["bogusStore".to_string()]).is_err());
    }

    #[test]
    fn swap_pass_misses_client_keyed_stores() {
        let mut ws = workspace();
        let stores = vec!["historyStore".to_string(), "settingsStore".to_string()];
        let report = run(&mut ws, &stores, true).unwrap();

        assert_eq!(report.passes.len(), 2);
        let second = &report.passes[1].resolutions;
        let history = second.iter().find(|r| r.namespace == "historyStore").unwrap();
        let settings = second.iter().find(|r| r.namespace == "settingsStore").unwrap();
        assert_eq!(history.lookup, Lookup::Miss);
        assert_eq!(settings.lookup, Lookup::Hit);
        assert_eq!(report.stats.supersessions, 1);
        assert_eq!(report.slots.len(), 2);
    }
}
