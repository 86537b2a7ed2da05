// Binary entry point for the command-line logger.
use anyhow::Result;
use chrono::Local;
use classlog::cli::{self, Command};
use classlog::config::Config;
use classlog::context::{AppContext, StandardContext};
use classlog::controller::{Outcome, QuickLogSession};
use classlog::model::{AppEvent, EventSource, Role, Student, StudentDisplay};
use classlog::storage::LocalStorage;
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::env;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let parsed = match cli::parse_args(&args) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            eprintln!("Run 'classlog --help' for usage.");
            std::process::exit(2);
        }
    };

    if parsed.command == Command::Help {
        cli::print_help("classlog");
        return Ok(());
    }

    let level = if parsed.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    let ctx = StandardContext::new(parsed.root.clone());
    let config = Config::load_or_default(&ctx)?;
    let snapshot = LocalStorage::load_snapshot(&ctx)?;
    let synonyms = config.synonyms();

    let class = parsed
        .class
        .clone()
        .unwrap_or_else(|| config.starting_class());
    let today = Local::now().date_naive();
    let mut session = match (config.role, &config.homeroom_class) {
        (Role::HomeroomTeacher, Some(home)) if parsed.class.is_none() => {
            QuickLogSession::homeroom(home, today)
        }
        (role, _) => QuickLogSession::new(role, &class, today),
    };
    session.strict_dob_hint = config.strict_dob_hint;
    if parsed.class.is_none() {
        session.refresh_slot(&snapshot.timetable, Local::now().time());
    }

    match parsed.command {
        Command::Parse(text) => {
            let result = session.parse(&text, &snapshot, &synonyms, today);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Log(text) => {
            let now = Local::now();
            let outcome =
                session.submit(&text, EventSource::Text, &snapshot, &synonyms, now.naive_local());
            report(&ctx, &config, &snapshot.roster, outcome)?;
        }
        Command::Classes => {
            for class in snapshot.classes() {
                println!("{}", class);
            }
        }
        Command::Undo => {
            let removed = LocalStorage::undo_last_batch(&ctx)?;
            if removed.is_empty() {
                println!("Nothing to undo.");
            } else {
                println!("Removed {} event(s):", removed.len());
                for id in &removed {
                    println!("  {}", id);
                }
            }
        }
        Command::Help => cli::print_help("classlog"),
    }

    Ok(())
}

fn report(
    ctx: &dyn AppContext,
    config: &Config,
    roster: &[Student],
    outcome: Outcome,
) -> Result<()> {
    match outcome {
        Outcome::Saved(drafts) => {
            let profile = config.profile();
            let now = Local::now();
            let events: Vec<AppEvent> = drafts
                .into_iter()
                .map(|d| AppEvent::from_draft(d, &profile, now))
                .collect();
            LocalStorage::record_batch(ctx, &events)?;
            for e in &events {
                println!(
                    "Saved [{}]: {} | {} | {} ({})",
                    e.event_id,
                    e.date,
                    e.student_name_snapshot.as_deref().unwrap_or("-"),
                    e.tags,
                    e.class_code
                );
            }
            println!("Run 'classlog undo' to remove this batch.");
        }
        Outcome::Selected(ids) => {
            println!("Recognized {} student(s) but no tag:", ids.len());
            for s in roster.iter().filter(|s| ids.contains(&s.student_id)) {
                println!("  {}", s.unique_name(roster));
            }
        }
        Outcome::NeedsConfirmation { candidates, tag } => {
            println!("Several students match, add the birthday (DD/MM) to pick one:");
            for s in &candidates {
                println!("  [{}] {}", s.student_id, s.unique_name(roster));
            }
            if let Some(tag) = tag {
                println!("Tag: {}", tag.label);
            }
        }
        Outcome::ContextChanged(ctx_override) => {
            if let Some(class) = &ctx_override.class_code {
                println!("Class: {}", class);
            }
            if let Some(date) = ctx_override.date {
                println!("Date: {}", date);
            }
        }
        Outcome::NotUnderstood => {
            println!("Not understood. Try '<name> <tag>', e.g. 'Kiên nói leo'.");
        }
    }
    Ok(())
}
