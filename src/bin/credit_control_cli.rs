use std::{env, path::Path, process};

use chrono::NaiveDate;
use colored::Colorize;
use dialoguer::Select;
use uuid::Uuid;

use credit_control::{
    config::ConfigManager,
    control::{ControlBook, LineState},
    dispatch::{OutboxMailer, TextRenderer},
    errors::ControlError,
    init,
    services::{EmailerService, MarkerService, PrinterService, RunService},
    storage::{JsonStorage, StorageBackend},
};

const MANAGER_ENV: &str = "CREDIT_CONTROL_MANAGER";

fn main() {
    init();

    if let Err(err) = run() {
        eprintln!("{} {err}", "Error:".red().bold());
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let command = args.next().unwrap_or_else(|| {
        print_usage();
        process::exit(1);
    });
    let storage = JsonStorage::new_default()?;

    match command.as_str() {
        "new" => {
            let name = next_arg(&mut args, "book name");
            let book = ControlBook::new(&name);
            storage.save(&book, &name)?;
            record_last_book(&storage, &name)?;
            println!(
                "{} control book `{}` at {}",
                "Created".green().bold(),
                name,
                storage.book_path(&name).display()
            );
        }
        "show" => {
            let name = book_arg(&mut args, &storage)?;
            let book = storage.load(&name)?;
            record_last_book(&storage, &name)?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }
        "export" => {
            let name = book_arg(&mut args, &storage)?;
            let path = next_arg(&mut args, "output path");
            let book = storage.load(&name)?;
            storage.save_to_path(&book, Path::new(&path))?;
            record_last_book(&storage, &name)?;
            println!("{} `{}` to {}", "Exported".green().bold(), name, path);
        }
        "import" => {
            let path = next_arg(&mut args, "input path");
            let name = next_arg(&mut args, "book name");
            let book = storage.load_from_path(Path::new(&path))?;
            storage.save(&book, &name)?;
            record_last_book(&storage, &name)?;
            println!("{} {path} as `{}`", "Imported".green().bold(), name);
        }
        "run" => {
            ensure_manager(&storage)?;
            let name = next_arg(&mut args, "book name");
            let date: NaiveDate = next_arg(&mut args, "run date (YYYY-MM-DD)").parse()?;
            let mut book = storage.load(&name)?;
            record_last_book(&storage, &name)?;
            let policy_ids: Vec<Uuid> = {
                let selected: Vec<Uuid> = args
                    .map(|policy_name| {
                        book.policy_by_name(&policy_name)
                            .map(|policy| policy.id)
                            .ok_or_else(|| {
                                ControlError::InvalidRef(format!(
                                    "unknown policy `{policy_name}`"
                                ))
                            })
                    })
                    .collect::<Result<_, _>>()?;
                if selected.is_empty() {
                    book.policies.iter().map(|policy| policy.id).collect()
                } else {
                    selected
                }
            };
            let run_id = RunService::create_run(&mut book, date, policy_ids)?;
            let line_ids = RunService::generate_credit_lines(&mut book, run_id)?;
            storage.save(&book, &name)?;
            println!(
                "{} {} credit control lines",
                "Generated".green().bold(),
                line_ids.len()
            );
            if let Some(run) = book.run(run_id) {
                print!("{}", run.report);
            }
        }
        "mark" => {
            let name = book_arg(&mut args, &storage)?;
            let mut book = storage.load(&name)?;
            record_last_book(&storage, &name)?;
            let target = match args.next() {
                Some(state) => LineState::from_name(&state).ok_or_else(|| {
                    ControlError::InvalidRef(format!("unknown line state `{state}`"))
                })?,
                None => prompt_state()?,
            };
            let ids = selected_or_default(&mut args, &book, |line| {
                line.state == LineState::Draft
            })?;
            let changed = MarkerService::mark_lines(&mut book, target, &ids)?;
            storage.save(&book, &name)?;
            println!(
                "{} {changed} of {} lines as {}",
                "Marked".green().bold(),
                ids.len(),
                target.name()
            );
        }
        "email" => {
            let name = book_arg(&mut args, &storage)?;
            let mut book = storage.load(&name)?;
            record_last_book(&storage, &name)?;
            let ids = selected_or_default(&mut args, &book, |line| {
                line.state == LineState::ToBeSent
            })?;
            let config = ConfigManager::with_base_dir(storage.base_dir())?.load()?;
            let mailer = OutboxMailer::new();
            let report = EmailerService::email_lines(&mut book, &ids, &mailer)?;
            storage.save(&book, &name)?;
            for message in mailer.messages() {
                println!("{} {}", "From:".bold(), config.sender_email);
                println!("{} {} - {}", "To:".bold(), message.recipient, message.subject);
                println!("{}", message.body);
            }
            println!(
                "{} {} lines sent, {} failed",
                "Emailer:".green().bold(),
                report.sent,
                report.failed
            );
        }
        "print" => {
            let name = book_arg(&mut args, &storage)?;
            let book = storage.load(&name)?;
            record_last_book(&storage, &name)?;
            let ids = selected_or_default(&mut args, &book, |_| true)?;
            let documents = PrinterService::print_lines(&book, &ids, &TextRenderer::new())?;
            for document in documents {
                println!("{document}");
            }
        }
        _ => {
            print_usage();
            process::exit(1);
        }
    }

    Ok(())
}

/// Run creation is gated the way the host platform gates it behind the
/// credit control manager group: a config flag, or the env override.
fn ensure_manager(storage: &JsonStorage) -> Result<(), Box<dyn std::error::Error>> {
    if env::var(MANAGER_ENV).map(|v| v == "1").unwrap_or(false) {
        return Ok(());
    }
    let config = ConfigManager::with_base_dir(storage.base_dir())?.load()?;
    if config.manager {
        return Ok(());
    }
    Err(Box::new(ControlError::InvalidRef(
        "credit control manager permission required to generate runs".into(),
    )))
}

/// The book named on the command line, or the last book the operator
/// worked on when none was given.
fn book_arg(
    args: &mut impl Iterator<Item = String>,
    storage: &JsonStorage,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(name) = args.next() {
        return Ok(name);
    }
    let config = ConfigManager::with_base_dir(storage.base_dir())?.load()?;
    config.last_opened_book.ok_or_else(|| {
        Box::new(ControlError::InvalidRef(
            "no book named and none opened before".into(),
        )) as Box<dyn std::error::Error>
    })
}

fn record_last_book(
    storage: &JsonStorage,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let manager = ConfigManager::with_base_dir(storage.base_dir())?;
    let mut config = manager.load()?;
    if config.last_opened_book.as_deref() != Some(name) {
        config.last_opened_book = Some(name.to_string());
        manager.save(&config)?;
    }
    Ok(())
}

/// Explicit line ids from the arguments, or every line matching
/// `default_filter` when none were given.
fn selected_or_default(
    args: &mut impl Iterator<Item = String>,
    book: &ControlBook,
    default_filter: impl Fn(&credit_control::control::ControlLine) -> bool,
) -> Result<Vec<Uuid>, Box<dyn std::error::Error>> {
    let explicit: Vec<Uuid> = args
        .map(|raw| Uuid::parse_str(&raw))
        .collect::<Result<_, _>>()?;
    if !explicit.is_empty() {
        return Ok(explicit);
    }
    Ok(book
        .lines
        .iter()
        .filter(|line| default_filter(line))
        .map(|line| line.id)
        .collect())
}

fn prompt_state() -> Result<LineState, Box<dyn std::error::Error>> {
    let states = [
        LineState::Draft,
        LineState::ToBeSent,
        LineState::Sent,
        LineState::Ignored,
    ];
    let names: Vec<&str> = states.iter().map(|state| state.name()).collect();
    let choice = Select::new()
        .with_prompt("Target line state")
        .items(&names)
        .default(1)
        .interact()?;
    Ok(states[choice])
}

fn next_arg(args: &mut impl Iterator<Item = String>, what: &str) -> String {
    args.next().unwrap_or_else(|| {
        eprintln!("missing argument: {what}");
        print_usage();
        process::exit(1);
    })
}

fn print_usage() {
    eprintln!(
        "Usage: credit_control_cli <command>\n\
         \n\
         Commands:\n\
         \x20 new    <book>                         create an empty control book\n\
         \x20 show   [book]                         dump a book as JSON\n\
         \x20 run    <book> <date> [policy...]      generate credit lines (manager only)\n\
         \x20 mark   [book] [state] [line-id...]    move lines to a state\n\
         \x20 email  [book] [line-id...]            email to_be_sent lines\n\
         \x20 print  [book] [line-id...]            render dunning documents\n\
         \x20 export [book] <path>                  write a book to an arbitrary file\n\
         \x20 import <path> <name>                  load a book file into the store\n\
         \n\
         Commands taking [book] fall back to the last opened book."
    );
}
