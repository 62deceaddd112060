mod cli;
mod config;
mod services;
mod session;
mod store;

use std::process::ExitCode;

use clap::Parser;
use colored::*;

use cli::Cli;
use config::{App, Paths};

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Cli::parse();
    init_logging(args.verbose);

    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = run(args) {
        log::error!("{:#}", err);
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn run(args: Cli) -> anyhow::Result<()> {
    let paths = Paths::resolve(args.data_dir)?;
    let mut app = App::load(paths)?;
    cli::run(args.command, &mut app)
}

/// Log to stderr; `RUST_LOG` wins over the default level
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
