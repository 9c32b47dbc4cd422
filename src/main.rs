use clap::Parser;
use dxt::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    // This is standard practice for CLI tools that output to stdout.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Export(args) => dxt::cli::commands::export::run(args, &global),
        Commands::Status(args) => dxt::cli::commands::status::run(args, &global),
        Commands::List(args) => dxt::cli::commands::list::run(args, &global),
        Commands::Forget(args) => dxt::cli::commands::forget::run(args, &global),
        Commands::Config(cmd) => dxt::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => dxt::cli::commands::completions::run(args),
    }
}
