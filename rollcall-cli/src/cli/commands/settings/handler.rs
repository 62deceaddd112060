//! Settings command handler

use anyhow::Result;
use colored::*;

use super::{OptionCommands, SettingsCommands};
use crate::config::{App, AppSettings};

pub fn handle_settings_command(args: SettingsCommands, app: &mut App) -> Result<()> {
    match args {
        SettingsCommands::Show => {
            print_settings(app);
            return Ok(());
        }
        SettingsCommands::FileType { file_type } => {
            app.settings.file_type = file_type;
            println!("New sessions will be saved as {}", file_type.to_string().cyan());
        }
        SettingsCommands::Restrict { exam, homework } => {
            if exam.is_none() && homework.is_none() {
                anyhow::bail!("Nothing to change; pass --exam and/or --homework with on or off");
            }
            if let Some(toggle) = exam {
                app.settings.restrictions.exam = toggle.enabled();
            }
            if let Some(toggle) = homework {
                app.settings.restrictions.homework = toggle.enabled();
            }
            println!(
                "Requirements: exam {}, homework {}",
                on_off(app.settings.restrictions.exam),
                on_off(app.settings.restrictions.homework)
            );
        }
        SettingsCommands::Stage(cmd) => edit_options("stage", &mut app.settings.stage_options, cmd)?,
        SettingsCommands::Center(cmd) => {
            edit_options("center", &mut app.settings.center_options, cmd)?
        }
    }

    app.save_settings()
}

fn edit_options(kind: &str, options: &mut Vec<String>, cmd: OptionCommands) -> Result<()> {
    match cmd {
        OptionCommands::Add { label } => {
            if !AppSettings::add_option(options, &label) {
                anyhow::bail!("{} '{}' is blank or already listed", kind, label.trim());
            }
            println!("Added {} {}", kind, label.trim().green());
        }
        OptionCommands::Remove { label } => {
            if !AppSettings::remove_option(options, &label) {
                anyhow::bail!("No {} named '{}'", kind, label.trim());
            }
            println!("Removed {} {}", kind, label.trim().yellow());
        }
    }
    Ok(())
}

fn print_settings(app: &App) {
    let settings = &app.settings;
    println!("{}", "Settings".bold());
    println!("  Data directory: {}", app.paths.base().display());
    println!("  File type:      {}", settings.file_type.to_string().cyan());
    println!(
        "  Requirements:   exam {}, homework {}",
        on_off(settings.restrictions.exam),
        on_off(settings.restrictions.homework)
    );
    println!("  Stages:         {}", settings.stage_options.join(", "));
    println!("  Centers:        {}", settings.center_options.join(", "));
}

fn on_off(enabled: bool) -> ColoredString {
    if enabled { "on".green() } else { "off".dimmed() }
}
