pub mod handler;

use clap::{Subcommand, ValueEnum};

use crate::store::FileType;

pub use handler::handle_settings_command;

#[derive(Debug, Subcommand)]
pub enum SettingsCommands {
    /// Print the current settings
    Show,
    /// Set the file format used for new sessions (csv or xlsx)
    FileType { file_type: FileType },
    /// Turn the exam and homework entry requirements on or off
    Restrict {
        #[arg(long)]
        exam: Option<Toggle>,
        #[arg(long)]
        homework: Option<Toggle>,
    },
    /// Manage the stage labels offered when starting a session
    #[command(subcommand)]
    Stage(OptionCommands),
    /// Manage the center labels offered when starting a session
    #[command(subcommand)]
    Center(OptionCommands),
}

#[derive(Debug, Subcommand)]
pub enum OptionCommands {
    /// Append a label
    Add { label: String },
    /// Remove a label
    Remove { label: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn enabled(self) -> bool {
        self == Toggle::On
    }
}
