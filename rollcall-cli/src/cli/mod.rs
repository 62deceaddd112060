pub mod commands;
pub mod prompt;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::App;
use commands::mapping::{MappingCommands, handle_mapping_command};
use commands::session::{SessionCommands, handle_session_command};
use commands::settings::{SettingsCommands, handle_settings_command};

#[derive(Debug, Parser)]
#[command(name = "rollcall", version)]
#[command(about = "Attendance sessions driven by RFID card scans", long_about = None)]
pub struct Cli {
    /// Data directory (defaults to $ROLLCALL_HOME, then the platform data dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show or change application settings
    #[command(subcommand)]
    Settings(SettingsCommands),
    /// Show or change the spreadsheet column map
    #[command(subcommand)]
    Mapping(MappingCommands),
    /// Start, open, list or clear attendance sessions
    #[command(subcommand)]
    Session(SessionCommands),
}

/// Dispatch a parsed command
pub fn run(command: Commands, app: &mut App) -> Result<()> {
    match command {
        Commands::Settings(args) => handle_settings_command(args, app),
        Commands::Mapping(args) => handle_mapping_command(args, app),
        Commands::Session(args) => handle_session_command(args, app),
    }
}
