//! `dxt forget` command - drop a remembered design context

use console::style;
use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::context::ContextStore;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct ForgetArgs {
    /// Design key or project name
    pub key: String,
}

pub fn run(args: ForgetArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let mut store =
        ContextStore::open(config.store_path()).map_err(|e| miette::miette!("{}", e))?;

    match store.forget(&args.key) {
        Some(context) => {
            store.save().map_err(|e| miette::miette!("{}", e))?;
            if !global.quiet {
                println!(
                    "{} Forgot {} ({})",
                    style("✓").green(),
                    style(&context.project_name).cyan(),
                    context.root.display()
                );
                println!("  The next export of this design prompts for a location again.");
            }
            Ok(())
        }
        None => Err(miette::miette!(
            "no remembered design matches '{}'",
            args.key
        )),
    }
}
