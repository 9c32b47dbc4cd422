//! `dxt list` command - list remembered designs

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_timestamp, short_key, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::context::{ContextStore, DesignContext};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct ListArgs {}

#[derive(Serialize)]
struct Row<'a> {
    key: &'a str,
    #[serde(flatten)]
    context: &'a DesignContext,
}

pub fn run(_args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let store = ContextStore::open(config.store_path()).map_err(|e| miette::miette!("{}", e))?;
    if global.verbose {
        eprintln!("context store: {}", store.path().display());
    }

    if store.is_empty() {
        match global.format {
            OutputFormat::Json => println!("[]"),
            _ => {
                println!("No designs remembered yet.");
                println!();
                println!(
                    "Set one up with: {}",
                    style("dxt export <design>").yellow()
                );
            }
        }
        return Ok(());
    }

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Table,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let rows: Vec<Row> = store
                .iter()
                .map(|(key, context)| Row { key, context })
                .collect();
            let json = serde_json::to_string_pretty(&rows).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Tsv => {
            for (key, context) in store.iter() {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    key,
                    context.project_name,
                    context.root.display(),
                    context
                        .last_version
                        .map(|n| format!("v{:02}", n))
                        .unwrap_or_default(),
                    context
                        .last_export
                        .map(|ts| format_timestamp(&ts))
                        .unwrap_or_default()
                );
            }
        }
        _ => {
            let mut builder = Builder::default();
            builder.push_record(["Key", "Project", "Root", "Version", "Last export"]);
            for (key, context) in store.iter() {
                builder.push_record([
                    short_key(key),
                    truncate_str(&context.project_name, 24),
                    truncate_str(&context.root.display().to_string(), 40),
                    context
                        .last_version
                        .map(|n| format!("v{:02}", n))
                        .unwrap_or_else(|| "-".to_string()),
                    context
                        .last_export
                        .map(|ts| format_timestamp(&ts))
                        .unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            println!();
            println!(
                "{} design(s) remembered",
                style(store.len()).cyan()
            );
        }
    }

    Ok(())
}
