pub mod handler;
pub mod scan_loop;

use std::path::PathBuf;

use clap::Subcommand;

pub use handler::handle_session_command;

#[derive(Debug, Subcommand)]
pub enum SessionCommands {
    /// Import a roster and start scanning cards
    ///
    /// Missing stage, center or number are asked for interactively. Starting
    /// a session that already exists resumes it.
    Start {
        /// Roster file (.csv or .xlsx)
        #[arg(long)]
        roster: PathBuf,
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        center: Option<String>,
        /// Session number
        #[arg(long)]
        number: Option<String>,
        /// Print the closing summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Open a past session by name
    Open {
        name: String,
        /// View and search only
        #[arg(long)]
        read_only: bool,
        /// Print the closing summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved sessions, newest first
    List {
        /// Only the most recent sessions
        #[arg(long)]
        recent: bool,
    },
    /// Delete every saved session file
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}
