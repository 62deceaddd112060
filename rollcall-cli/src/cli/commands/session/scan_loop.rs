//! Interactive scan loop
//!
//! Reads one card token per line. Lines starting with `:` are commands:
//! `:find <terms>`, `:add`, `:help` and `:q`.

use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::Local;
use colored::*;

use crate::cli::prompt::{self, Outcome};
use crate::services::attendance::{AttendanceError, AttendanceRun, ScanReport};
use crate::services::scan::ScanStatus;
use crate::session::StudentRecord;

/// Run the loop until `:q` or end of input, then print the summary
pub fn run(mut run: AttendanceRun, json: bool) -> Result<()> {
    print_banner(&run);

    let stdin = io::stdin();
    loop {
        print!("{} ", "scan>".bold());
        io::stdout().flush().context("Failed to write prompt")?;

        let mut line = String::new();
        if stdin.read_line(&mut line).context("Failed to read input")? == 0 {
            break;
        }
        let line = line.trim();

        let result = match line {
            "" => continue,
            ":q" | ":quit" => break,
            ":help" => {
                print_help();
                Ok(())
            }
            ":add" => add_student(&mut run, None),
            _ => match line.strip_prefix(":find") {
                Some(terms) => find(&mut run, terms.trim()),
                None if line.starts_with(':') => {
                    println!("Unknown command {}; type :help", line.yellow());
                    Ok(())
                }
                None => scan(&mut run, line),
            },
        };

        if let Err(err) = result {
            report_error(&err);
        }
    }

    finish(&run, json)
}

fn print_banner(run: &AttendanceRun) {
    println!();
    println!(
        "{} {} ({} students)",
        "Session".bold(),
        run.name().cyan().bold(),
        run.records().len()
    );
    println!("{}", run.store().path().display().to_string().dimmed());
    if run.is_read_only() {
        println!("{}", "Read-only: scanning is disabled, use :find to search".yellow());
    } else {
        println!("Scan a card, or type :help");
    }
    for dup in run.duplicates() {
        let rows: Vec<String> = dup.rows.iter().map(|r| (r + 2).to_string()).collect();
        println!(
            "{} card {} appears on rows {}",
            "Warning:".yellow().bold(),
            dup.card_id,
            rows.join(", ")
        );
    }
}

fn print_help() {
    println!("  <card>          scan a card id");
    println!("  :find <terms>   search students by any value");
    println!("  :add            add a student without a card");
    println!("  :q              end the session");
}

fn scan(run: &mut AttendanceRun, token: &str) -> Result<()> {
    let now = Local::now().naive_local();
    let Some(report) = run.scan(token, "", now)? else {
        return Ok(());
    };
    let card_id = report.resolution.card_id.clone();

    match report.resolution.status {
        ScanStatus::NotFound => {
            println!("{} card {} is not linked to a student", "?".yellow().bold(), card_id);
            if prompt::confirm("Add a student for this card?", false)?.is_confirmed() {
                add_student(run, Some(&card_id))?;
            }
            Ok(())
        }
        ScanStatus::Duplicate => {
            println!(
                "{} multiple records found for card {}",
                "!".red().bold(),
                card_id
            );
            pick_and_open(run, &report.resolution.matches)
        }
        _ => show_outcome(run, &report),
    }
}

fn find(run: &mut AttendanceRun, terms: &str) -> Result<()> {
    let matches = run.search(terms);
    if matches.is_empty() {
        println!("{}", "No matching students.".dimmed());
        return Ok(());
    }

    if run.is_read_only() {
        for &index in &matches {
            if let Some(record) = run.record(index) {
                print_record(record);
            }
        }
        println!("{} matches", matches.len());
        return Ok(());
    }
    pick_and_open(run, &matches)
}

/// Let the operator choose one of several records, then act on it
fn pick_and_open(run: &mut AttendanceRun, candidates: &[usize]) -> Result<()> {
    let labels: Vec<String> = candidates
        .iter()
        .filter_map(|&i| run.record(i))
        .map(summary_line)
        .collect();

    let Outcome::Confirmed(pos) = prompt::select("Select student (Esc to skip)", &labels)? else {
        return Ok(());
    };
    let index = candidates[pos];
    let report = run.open_record(index, "", Local::now().naive_local())?;
    show_outcome(run, &report)
}

/// Print what happened to a single record and offer its actions
fn show_outcome(run: &mut AttendanceRun, report: &ScanReport) -> Result<()> {
    let Some(index) = report.resolution.record_index() else {
        return Ok(());
    };
    let Some(record) = run.record(index) else {
        return Ok(());
    };

    if report.auto_attended {
        println!("{} {} attended", "✓".green().bold(), record.display_name().bold());
        return Ok(());
    }

    print_record(record);
    let actions = report.resolution.actions();
    if actions.is_empty() {
        return Ok(());
    }

    let Outcome::Confirmed(action) = prompt::choose("Action (Esc to skip)", &actions)? else {
        return Ok(());
    };
    let note = prompt::optional_text("Note (optional)")?;
    let record = run.apply(index, action, &note, Local::now().naive_local())?;
    println!(
        "{} {}: {}",
        "✓".green().bold(),
        record.display_name().bold(),
        action.label()
    );
    Ok(())
}

fn add_student(run: &mut AttendanceRun, card_id: Option<&str>) -> Result<()> {
    let Outcome::Confirmed((student, notes)) = prompt::new_student(card_id)? else {
        println!("Add student canceled.");
        return Ok(());
    };
    let index = run.add_student(card_id, &student, Some(&notes), Local::now().naive_local())?;
    if let Some(record) = run.record(index) {
        println!(
            "{} added {} with card {}",
            "✓".green().bold(),
            record.display_name().bold(),
            record.card_id
        );
    }
    Ok(())
}

fn summary_line(record: &StudentRecord) -> String {
    let state = if record.is_attended() { "attended" } else { "absent" };
    format!(
        "{} | {} | card {} | {}",
        record.display_name(),
        record.student_id,
        record.card_id,
        state
    )
}

fn grade_label(grade: &str) -> String {
    match grade {
        "" => "Not Submitted".to_string(),
        "0" => "0 (Fail)".to_string(),
        other => other.to_string(),
    }
}

fn print_record(record: &StudentRecord) {
    let status = if record.is_attended() {
        "attended".green()
    } else {
        "not attended".dimmed()
    };
    println!("  {} ({})", record.display_name().bold(), status);
    println!(
        "    ID {}  Card {}  Phone {}",
        record.student_id, record.card_id, record.phone
    );
    if let Some(exam) = &record.exam {
        println!("    Exam: {}", grade_label(exam));
    }
    if let Some(homework) = &record.homework {
        println!("    Homework: {}", grade_label(homework));
    }
    if let Some(last) = record.notes.lines().last() {
        println!("    Last note: {}", last.dimmed());
    }
}

fn report_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);
    if let Some(AttendanceError::CommitFailed { record, .. }) = err.downcast_ref::<AttendanceError>() {
        eprintln!(
            "  Not saved for card {}: attendance '{}', notes:\n{}",
            record.card_id, record.attendance, record.notes
        );
    }
}

fn finish(run: &AttendanceRun, json: bool) -> Result<()> {
    let summary = run.summary();
    if json {
        let text = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", text);
    } else {
        println!();
        println!("{}", "Summary".bold());
        for (label, value) in summary.rows() {
            println!("  {:<17} {}", label, value);
        }
    }

    if run.is_read_only() {
        println!("Session '{}' closed (view-only).", run.name());
    } else {
        println!("Session '{}' saved and closed.", run.name());
    }
    Ok(())
}
