//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, export::ExportArgs, forget::ForgetArgs,
    list::ListArgs, status::StatusArgs,
};

#[derive(Parser)]
#[command(name = "dxt")]
#[command(author, version, about = "Drydock Export Toolkit")]
#[command(long_about = "Versioned local backup for CAD designs: archive, interchange and mesh \
exports plus a preview image, with the export location remembered per design across sessions.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export a design to its remembered project folder
    Export(ExportArgs),

    /// Show what the next export of a design would do
    Status(StatusArgs),

    /// List remembered designs
    List(ListArgs),

    /// Forget a remembered design (by key or project name)
    Forget(ForgetArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table on a terminal, plain lines when piped
    #[default]
    Auto,
    /// Bordered table
    Table,
    /// JSON (for programming)
    Json,
    /// Tab-separated values (for piping)
    Tsv,
}
