mod cli;
mod commands;
mod config;
mod progress;
mod report;
mod resource;
mod stack;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };

    match cli.command {
        Command::Deploy(args) => commands::deploy::run(&ctx, args),
        Command::Plan(args) => commands::plan::run(&ctx, args),
        Command::Policy(args) => commands::policy::run(&ctx, args),
        Command::Outputs(args) => commands::outputs::run(&ctx, args),
        Command::Config => {
            let (config, path) = commands::load_config(&ctx)?;
            if let Some(path) = path {
                ui::dim(&format!("# from {}", path.display()));
            }
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "voicestack", &mut io::stdout());
            Ok(())
        }
    }
}
