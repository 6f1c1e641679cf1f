//! Graph command - show store bindings in resolution order

use crate::cli::args::{GraphArgs, OutputFormat};
use crate::error::RescacheResult;
use crate::stores::BindingRegistry;
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct GraphRow {
    namespace: String,
    requires: Vec<String>,
    store_type: String,
}

#[derive(Debug, Serialize)]
struct GraphReport {
    bindings: Vec<GraphRow>,
    edges: usize,
    /// Bindings nothing else requires
    roots: Vec<String>,
}

/// Execute the graph command
pub fn execute(args: GraphArgs) -> RescacheResult<()> {
    let registry = BindingRegistry::with_defaults();
    let report = report(&registry)?;

    match args.format {
        OutputFormat::Table => print_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => {
            for row in &report.bindings {
                println!("{}", row.namespace);
            }
        }
    }

    Ok(())
}

fn report(registry: &BindingRegistry) -> RescacheResult<GraphReport> {
    let graph = registry.graph()?;
    let order = graph.resolution_order()?;

    let bindings = order
        .into_iter()
        .filter_map(|namespace| {
            let binding = registry.get(&namespace)?;
            Some(GraphRow {
                requires: binding.requires().to_vec(),
                store_type: short_type(binding.type_name()).to_string(),
                namespace,
            })
        })
        .collect();

    Ok(GraphReport {
        bindings,
        edges: graph.edge_count(),
        roots: graph.roots().into_iter().map(str::to_string).collect(),
    })
}

fn short_type(name: &str) -> &str {
    name.rsplit("::").next().unwrap_or(name)
}

fn print_table(report: &GraphReport) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, "Store bindings");

    println!(
        "{:<24} {:<24} {:<40}",
        style("NAMESPACE").bold(),
        style("TYPE").bold(),
        style("REQUIRES").bold()
    );
    println!("{}", "-".repeat(88));

    for row in &report.bindings {
        let requires = if row.requires.is_empty() {
            "-".to_string()
        } else {
            row.requires.join(", ")
        };
        println!("{:<24} {:<24} {:<40}", row.namespace, row.store_type, requires);
    }

    println!();
    println!(
        "{} binding(s), {} edge(s), resolution order top to bottom",
        report.bindings.len(),
        report.edges
    );
    ui::key_value(&ctx, "Roots", &report.roots.join(", "));
}
