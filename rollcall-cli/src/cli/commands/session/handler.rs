//! Session command handler

use std::path::Path;

use anyhow::Result;
use colored::*;

use super::SessionCommands;
use super::scan_loop;
use crate::cli::prompt::{self, Outcome};
use crate::config::App;
use crate::config::repository::sessions::{
    self, SessionEntry, clear_sessions, find_session, format_size,
};
use crate::services::attendance::AttendanceRun;
use crate::session::{SessionName, SessionStore, create_or_open, import_roster};

pub fn handle_session_command(args: SessionCommands, app: &mut App) -> Result<()> {
    match args {
        SessionCommands::Start {
            roster,
            stage,
            center,
            number,
            json,
        } => start_session(app, &roster, stage, center, number, json),
        SessionCommands::Open {
            name,
            read_only,
            json,
        } => open_session(app, &name, read_only, json),
        SessionCommands::List { recent } => list_sessions(app, recent),
        SessionCommands::Clear { yes } => clear_all(app, yes),
    }
}

fn start_session(
    app: &App,
    roster: &Path,
    stage: Option<String>,
    center: Option<String>,
    number: Option<String>,
    json: bool,
) -> Result<()> {
    let table = import_roster(roster, &app.column_map)?;
    println!(
        "Imported {} records from {}",
        table.len().to_string().bold(),
        roster.display()
    );

    let Some(stage) = pick_label("stage", stage, &app.settings.stage_options)? else {
        println!("Session setup canceled.");
        return Ok(());
    };
    let Some(center) = pick_label("center", center, &app.settings.center_options)? else {
        println!("Session setup canceled.");
        return Ok(());
    };
    let number = match number {
        Some(number) => number,
        None => match prompt::text("Session number")? {
            Outcome::Confirmed(number) => number,
            Outcome::Cancelled => {
                println!("Session setup canceled.");
                return Ok(());
            }
        },
    };

    let name = SessionName::new(&stage, &center, &number)?;
    let (store, created) = create_or_open(app, &name, &table)?;
    if created {
        println!("Created session {}", name.to_string().green().bold());
    } else {
        println!(
            "Session {} already exists; resuming it with its saved attendance",
            name.to_string().yellow().bold()
        );
    }

    let run = AttendanceRun::open(store, false)?;
    scan_loop::run(run, json)
}

/// Validate a label given on the command line, or ask for one
fn pick_label(kind: &str, given: Option<String>, options: &[String]) -> Result<Option<String>> {
    match given {
        Some(label) => {
            let label = label.trim();
            if !options.iter().any(|o| o == label) {
                anyhow::bail!(
                    "Unknown {} '{}'. Configured: {} (add one with 'rollcall settings {} add')",
                    kind,
                    label,
                    options.join(", "),
                    kind
                );
            }
            Ok(Some(label.to_string()))
        }
        None => {
            if options.is_empty() {
                anyhow::bail!(
                    "No {} labels configured; add one with 'rollcall settings {} add'",
                    kind,
                    kind
                );
            }
            Ok(prompt::choose(&format!("Select {}", kind), options)?.confirmed())
        }
    }
}

fn open_session(app: &App, name: &str, read_only: bool, json: bool) -> Result<()> {
    let entry = find_session(&app.paths.sessions_dir(), name)?.ok_or_else(|| {
        anyhow::anyhow!(
            "No session named '{}'. Use 'rollcall session list' to see saved sessions.",
            name
        )
    })?;

    let store = SessionStore::new(
        entry.name,
        entry.path,
        app.column_map.clone(),
        app.settings.restrictions,
    );
    let run = AttendanceRun::open(store, read_only)?;
    scan_loop::run(run, json)
}

fn list_sessions(app: &App, recent: bool) -> Result<()> {
    let dir = app.paths.sessions_dir();
    let entries = if recent {
        sessions::recent_sessions(&dir)?
    } else {
        sessions::list_sessions(&dir)?
    };

    if entries.is_empty() {
        println!("{}", "No saved sessions.".dimmed());
        return Ok(());
    }
    print_entries(&entries);
    Ok(())
}

fn print_entries(entries: &[SessionEntry]) {
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    println!(
        "{}",
        format!("{:<width$}  {:<17}  {:>9}", "Name", "Modified", "Size", width = width).bold()
    );
    for entry in entries {
        println!(
            "{:<width$}  {:<17}  {:>9}",
            entry.name,
            entry.modified_label(),
            format_size(entry.size),
            width = width
        );
    }
}

fn clear_all(app: &App, yes: bool) -> Result<()> {
    let dir = app.paths.sessions_dir();
    let entries = sessions::list_sessions(&dir)?;
    if entries.is_empty() {
        println!("{}", "No saved sessions.".dimmed());
        return Ok(());
    }

    if !yes {
        let question = format!(
            "Delete all {} session files? This cannot be undone",
            entries.len()
        );
        if !prompt::confirm(&question, false)?.is_confirmed() {
            println!("Nothing deleted.");
            return Ok(());
        }
    }

    let (deleted, failures) = clear_sessions(&dir)?;
    println!("Deleted {} session files", deleted.to_string().bold());
    for failure in &failures {
        eprintln!(
            "{} {}: {}",
            "Could not delete".red(),
            failure.path.display(),
            failure.error
        );
    }
    if !failures.is_empty() {
        anyhow::bail!("{} session files could not be deleted", failures.len());
    }
    Ok(())
}
