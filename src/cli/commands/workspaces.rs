//! Workspaces command - list configured workspaces

use crate::cli::args::{OutputFormat, WorkspacesArgs};
use crate::config::{Config, WorkspaceConfig};
use crate::error::RescacheResult;
use crate::ui::{self, UiContext};
use console::style;

/// Execute the workspaces command
pub fn execute(args: WorkspacesArgs, config: &Config) -> RescacheResult<()> {
    let workspaces = &config.workspaces;

    if workspaces.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No workspaces configured");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(workspaces),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(workspaces)?),
        OutputFormat::Plain => {
            for workspace in workspaces {
                println!("{}", workspace.name);
            }
        }
    }

    Ok(())
}

fn print_table(workspaces: &[WorkspaceConfig]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Workspaces");

    println!(
        "{:<16} {:<20} {:<16} {:<14} {:<12}",
        style("NAME").bold(),
        style("TITLE").bold(),
        style("PROJECT").bold(),
        style("DATASET").bold(),
        style("BASE PATH").bold()
    );
    println!("{}", "-".repeat(82));

    for (i, workspace) in workspaces.iter().enumerate() {
        let name = if i == 0 {
            style(format!("{}*", workspace.name)).cyan()
        } else {
            style(workspace.name.clone())
        };

        println!(
            "{:<16} {:<20} {:<16} {:<14} {:<12}",
            name, workspace.title, workspace.project_id, workspace.dataset, workspace.base_path
        );
    }

    println!();
    println!("{} workspace(s), * marks the default", workspaces.len());
}
