//! `dxt export` command - run the save-intercept sequence for a design

use chrono::Utc;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::context::{ContextStore, DesignContext};
use crate::core::fingerprint::Fingerprint;
use crate::core::identity::sanitize_file_name;
use crate::core::Config;
use crate::export::{run_export, ExportOptions, ExportReport};
use crate::host::{identify, DesignDocument, DesignHost};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Design document to export (.dsn.json)
    pub design: PathBuf,

    /// Set up the export location afresh, ignoring any remembered one
    #[arg(long)]
    pub reinit: bool,

    /// Export even when the design is unchanged
    #[arg(long)]
    pub force: bool,

    /// Base directory for a new project (skips the prompt)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Project name for a new project (skips the prompt)
    #[arg(long)]
    pub name: Option<String>,

    /// Assume yes for confirmation prompts
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Open the project folder afterwards
    #[arg(long)]
    pub open: bool,
}

pub fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let document = DesignDocument::load(&args.design)
        .map_err(|e| miette::miette!("{}", e))?
        .with_refinement(config.mesh_refinement());

    let mut store =
        ContextStore::open(config.store_path()).map_err(|e| miette::miette!("{}", e))?;
    if global.verbose {
        eprintln!("context store: {}", store.path().display());
    }

    let identity = identify(&document);
    let fingerprint = Fingerprint::from(document.counters());

    // A remembered context only counts while its root still exists;
    // otherwise the design goes back through setup.
    let remembered = if args.reinit {
        None
    } else {
        store
            .lookup(&identity)
            .filter(|(_, ctx)| ctx.root.exists())
            .map(|(key, ctx)| (key, ctx.clone()))
    };

    match remembered {
        Some((found_key, context)) => run_update(
            &args,
            global,
            &config,
            &mut store,
            &document,
            found_key,
            context,
            fingerprint,
        ),
        None => run_init(&args, global, &config, &mut store, &document, fingerprint),
    }
}

fn run_update(
    args: &ExportArgs,
    global: &GlobalOpts,
    config: &Config,
    store: &mut ContextStore,
    document: &DesignDocument,
    found_key: String,
    context: DesignContext,
    fingerprint: Fingerprint,
) -> Result<()> {
    if !args.force {
        if let Some(stored) = context.fingerprint.as_deref() {
            if fingerprint.matches(stored) {
                if matches!(global.format, OutputFormat::Json) {
                    println!(
                        "{}",
                        serde_json::json!({ "skipped": true, "fingerprint": fingerprint.to_string() })
                    );
                } else if !global.quiet {
                    println!(
                        "{} No changes since last export (fingerprint {})",
                        style("✓").green(),
                        fingerprint
                    );
                    println!(
                        "  Use {} to export anyway",
                        style("dxt export --force").yellow()
                    );
                }
                return Ok(());
            }
        }
    }

    let root = context.root.clone();
    let report = execute(document, &root, &context.project_name, config, global)?;

    let identity = identify(document);
    let key = identity.primary_key();
    if found_key != key {
        // found via the name fallback; migrate the record to the id key
        store.forget(&found_key);
    }
    store.upsert(&key, advanced(context, &report, fingerprint));
    store.save().map_err(|e| miette::miette!("{}", e))?;

    summarize(&report, global);
    maybe_open(&root, args.open, config);
    Ok(())
}

fn run_init(
    args: &ExportArgs,
    global: &GlobalOpts,
    config: &Config,
    store: &mut ContextStore,
    document: &DesignDocument,
    fingerprint: Fingerprint,
) -> Result<()> {
    let identity = identify(document);
    let default_name = sanitize_file_name(identity.base_name());

    let base = resolve_base(args.root.clone(), config)?;
    let project_name = resolve_name(args.name.clone(), &default_name)?;
    let root = base.join(&project_name);

    if root.exists() && !args.yes {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "{} already exists. Export into it anyway?",
                root.display()
            ))
            .default(true)
            .interact()
            .into_diagnostic()?;
        if !proceed {
            println!("{} Export cancelled", style("!").yellow());
            return Ok(());
        }
    }

    let report = execute(document, &root, &project_name, config, global)?;

    let context = DesignContext {
        project_name: project_name.clone(),
        root: root.clone(),
        fingerprint: None,
        last_version: None,
        last_export: None,
    };
    // An earlier no-id session may have parked the record under the
    // name key; migrate it here too, not just on the update path.
    let key = identity.primary_key();
    let stale = store
        .lookup(&identity)
        .map(|(found_key, _)| found_key)
        .filter(|found| *found != key);
    if let Some(found) = stale {
        store.forget(&found);
    }
    store.upsert(&key, advanced(context, &report, fingerprint));
    store.save().map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet && !matches!(global.format, OutputFormat::Json) {
        println!(
            "{} Project set up at {}",
            style("✓").green(),
            style(root.display()).cyan()
        );
    }
    summarize(&report, global);
    maybe_open(&root, args.open, config);
    Ok(())
}

/// Fold an export report into the stored context
///
/// The fingerprint and version advance only on a complete snapshot, so
/// a half-written version folder is retried on the next save.
fn advanced(
    mut context: DesignContext,
    report: &ExportReport,
    fingerprint: Fingerprint,
) -> DesignContext {
    context.last_export = Some(Utc::now());
    if report.snapshot_complete() {
        context.fingerprint = Some(fingerprint.to_string());
        context.last_version = Some(report.version.number());
    }
    context
}

fn execute(
    document: &DesignDocument,
    root: &Path,
    project: &str,
    config: &Config,
    global: &GlobalOpts,
) -> Result<ExportReport> {
    let options = ExportOptions {
        preview_size: config.preview_size(),
    };
    let silent = global.quiet || matches!(global.format, OutputFormat::Json);
    let mut progress = |line: &str| {
        if !silent {
            println!("  {}", style(line).dim());
        }
    };
    run_export(document, root, project, &options, &mut progress)
        .map_err(|e| miette::miette!("{}", e))
}

fn summarize(report: &ExportReport, global: &GlobalOpts) {
    if matches!(global.format, OutputFormat::Json) {
        println!(
            "{}",
            serde_json::to_string_pretty(report).unwrap_or_default()
        );
        return;
    }

    if report.snapshot_complete() {
        if !global.quiet {
            println!(
                "{} Exported {} ({} meshes, {} ms)",
                style("✓").green(),
                style(&report.versioned_name).cyan(),
                report.meshes_exported,
                report.duration_ms
            );
        }
    } else {
        println!(
            "{} Export of {} is incomplete:",
            style("!").yellow(),
            report.versioned_name
        );
        for failure in report.failures() {
            println!(
                "  {} {}: {}",
                style("✗").red(),
                failure.kind.as_str(),
                failure.error.as_deref().unwrap_or("unknown error")
            );
        }
        println!("  The change fingerprint was kept, so the next export runs again.");
    }

    if report.meshes_failed > 0 {
        println!(
            "{} {} mesh file(s) failed:",
            style("!").yellow(),
            report.meshes_failed
        );
        for line in &report.mesh_errors {
            println!("  {}", line);
        }
    }
}

fn resolve_base(arg: Option<PathBuf>, config: &Config) -> Result<PathBuf> {
    if let Some(root) = arg {
        return Ok(root);
    }
    let theme = ColorfulTheme::default();
    let value: String = match config.default_root.as_ref() {
        Some(default) => Input::with_theme(&theme)
            .with_prompt("Base directory for the project")
            .default(default.display().to_string())
            .interact_text()
            .into_diagnostic()?,
        None => Input::with_theme(&theme)
            .with_prompt("Base directory for the project")
            .interact_text()
            .into_diagnostic()?,
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(miette::miette!("a base directory is required"));
    }
    Ok(PathBuf::from(trimmed))
}

fn resolve_name(arg: Option<String>, default_name: &str) -> Result<String> {
    let raw = match arg {
        Some(name) => name,
        None => Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Project name")
            .default(default_name.to_string())
            .interact_text()
            .into_diagnostic()?,
    };
    let name = sanitize_file_name(raw.trim());
    if name.is_empty() {
        return Err(miette::miette!("project name is empty after sanitizing"));
    }
    Ok(name)
}

fn maybe_open(root: &Path, requested: bool, config: &Config) {
    if requested || config.auto_open() {
        if let Err(e) = open::that(root) {
            println!(
                "{} Could not open {}: {}",
                style("!").yellow(),
                root.display(),
                e
            );
        }
    }
}
