//! Column map command handler

use anyhow::{Context, Result};
use colored::*;

use super::MappingCommands;
use crate::config::{App, LogicalField};
use crate::store;

pub fn handle_mapping_command(args: MappingCommands, app: &mut App) -> Result<()> {
    match args {
        MappingCommands::Show => {
            if !app.column_map.is_configured() {
                println!("{}", "No column map configured yet.".yellow());
                println!("Use 'rollcall mapping columns <file>' to see a file's headers, then 'rollcall mapping set'.");
            }
            for field in LogicalField::ALL {
                let header = app
                    .column_map
                    .get(field)
                    .map(|h| h.cyan().to_string())
                    .unwrap_or_else(|| format!("{} (default)", field.key()).dimmed().to_string());
                println!("  {:<12} {}", field.label(), header);
            }
        }
        MappingCommands::Columns { file } => {
            let headers = store::read_headers(&file)
                .with_context(|| format!("Failed to read headers from {}", file.display()))?;
            if headers.is_empty() {
                println!("{}", "The file has no column headers.".yellow());
            }
            for header in headers {
                let mapped: Vec<&str> = app
                    .column_map
                    .entries()
                    .filter(|(_, h)| *h == header)
                    .map(|(f, _)| f.key())
                    .collect();
                if mapped.is_empty() {
                    println!("  {}", header);
                } else {
                    println!("  {} {}", header, format!("<- {}", mapped.join(", ")).dimmed());
                }
            }
        }
        MappingCommands::Set { assignments } => {
            let mut map = app.column_map.clone();
            for raw in &assignments {
                map.assign(raw)?;
            }
            map.validate_complete()?;

            app.column_map = map;
            app.save_column_map()?;
            println!("{}", "Column map saved.".green());
        }
    }
    Ok(())
}
