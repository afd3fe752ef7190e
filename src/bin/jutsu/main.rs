//! Jutsu CLI - a package manager for smart-contract components

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use jutsu::core::JutsuError;
use jutsu::flatten::FlattenError;
use jutsu::util::config::Config;
use jutsu::util::diagnostic;
use jutsu::util::{GlobalContext, Shell};

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Arc<Shell>,

    /// Command-line and environment overrides of the config files
    pub overrides: Config,
}

impl GlobalOptions {
    /// Context for the current directory with overrides applied.
    pub fn context(&self) -> Result<GlobalContext> {
        Ok(GlobalContext::new()?.with_overrides(self.overrides.clone()))
    }
}

fn main() {
    let cli = Cli::parse();
    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, cli.color));

    if let Err(e) = run(cli, Arc::clone(&shell)) {
        report(e, &shell);
        std::process::exit(1);
    }
}

fn report(e: anyhow::Error, shell: &Shell) {
    // Source-located flattener errors render with their snippet.
    let e = match e.downcast::<FlattenError>() {
        Ok(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            return;
        }
        Err(e) => e,
    };

    match e.downcast_ref::<JutsuError>() {
        Some(err) if e.chain().count() == 1 => {
            diagnostic::emit(&err.to_diagnostic(), shell.use_color())
        }
        _ => eprintln!("error: {:#}", e),
    }
}

fn run(cli: Cli, shell: Arc<Shell>) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("jutsu=debug")
    } else if cli.quiet {
        EnvFilter::new("jutsu=error")
    } else {
        EnvFilter::new("jutsu=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let global_opts = GlobalOptions {
        shell,
        overrides: cli.overrides.to_config(),
    };

    match cli.command {
        Commands::New(args) => commands::new::execute(args, &global_opts),
        Commands::Add(args) => commands::add::execute(args, &global_opts),
        Commands::Publish(args) => commands::publish::execute(args, &global_opts),
        Commands::Deploy(args) => commands::deploy::execute(args, &global_opts),
        Commands::Flatten(args) => commands::flatten::execute(args, &global_opts),
        Commands::Build(args) => commands::build::execute(args, &global_opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
