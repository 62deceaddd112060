pub mod handler;

use std::path::PathBuf;

use clap::Subcommand;

pub use handler::handle_mapping_command;

#[derive(Debug, Subcommand)]
pub enum MappingCommands {
    /// Print the column map
    Show,
    /// List the column headers of a sample roster or session file
    Columns { file: PathBuf },
    /// Map logical fields to headers, e.g. card_id=RFID attendance=Present
    ///
    /// The resulting map must cover all nine fields, each with its own header.
    Set {
        #[arg(required = true, value_name = "FIELD=HEADER")]
        assignments: Vec<String>,
    },
}
