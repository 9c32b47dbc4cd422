//! `dxt status` command - show what the next export would do

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{format_timestamp, short_key};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::context::{ContextStore, DesignContext};
use crate::core::fingerprint::Fingerprint;
use crate::core::version::{next_version, versioned_name};
use crate::core::Config;
use crate::export::CAD_DIR;
use crate::host::{identify, DesignDocument, DesignHost};

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Design document to inspect (.dsn.json)
    pub design: PathBuf,
}

pub fn run(args: StatusArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let document = DesignDocument::load(&args.design).map_err(|e| miette::miette!("{}", e))?;
    let store = ContextStore::open(config.store_path()).map_err(|e| miette::miette!("{}", e))?;
    if global.verbose {
        eprintln!("context store: {}", store.path().display());
    }

    let identity = identify(&document);
    let fingerprint = Fingerprint::from(document.counters());
    let remembered = store.lookup(&identity);

    if matches!(global.format, OutputFormat::Json) {
        print_json(&identity.to_string(), fingerprint, remembered);
        return Ok(());
    }

    println!("{} {}", style("Design:").bold(), identity);
    println!("{} {}", style("Fingerprint:").bold(), fingerprint);

    match remembered {
        None => {
            println!("{} not remembered", style("Context:").bold());
            println!(
                "  {} will prompt for an export location",
                style("dxt export").cyan()
            );
        }
        Some((key, context)) => print_context(&key, context, fingerprint),
    }
    Ok(())
}

fn print_context(key: &str, context: &DesignContext, fingerprint: Fingerprint) {
    println!(
        "{} {} ({})",
        style("Project:").bold(),
        context.project_name,
        short_key(key)
    );
    println!("{} {}", style("Root:").bold(), context.root.display());
    if let Some(ts) = context.last_export {
        match context.last_version {
            Some(n) => println!(
                "{} {} (v{:02})",
                style("Last export:").bold(),
                format_timestamp(&ts),
                n
            ),
            None => println!("{} {}", style("Last export:").bold(), format_timestamp(&ts)),
        }
    }

    if !context.root.exists() {
        println!(
            "{} export root is missing; {} will ask for a new location",
            style("!").yellow(),
            style("dxt export").cyan()
        );
        return;
    }

    if changed_since(context, fingerprint) {
        println!("{} changed since last export", style("✓").green());
        if let Ok(label) = next_version(&context.root.join(CAD_DIR)) {
            println!(
                "{} {} -> {}",
                style("Next:").bold(),
                label,
                versioned_name(&context.project_name, label)
            );
        }
    } else {
        println!(
            "{} unchanged; {} will skip (use {})",
            style("✓").green(),
            style("dxt export").cyan(),
            style("--force").yellow()
        );
    }
}

fn changed_since(context: &DesignContext, fingerprint: Fingerprint) -> bool {
    match context.fingerprint.as_deref() {
        Some(stored) => !fingerprint.matches(stored),
        None => true,
    }
}

fn print_json(
    design: &str,
    fingerprint: Fingerprint,
    remembered: Option<(String, &DesignContext)>,
) {
    let context = remembered.map(|(key, ctx)| {
        serde_json::json!({
            "key": key,
            "project": ctx.project_name,
            "root": ctx.root,
            "root_exists": ctx.root.exists(),
            "fingerprint": ctx.fingerprint,
            "last_version": ctx.last_version,
            "last_export": ctx.last_export,
            "changed": changed_since(ctx, fingerprint),
        })
    });
    let payload = serde_json::json!({
        "design": design,
        "fingerprint": fingerprint.to_string(),
        "context": context,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).unwrap_or_default()
    );
}
