//! Command-line entry point for ledger resume submissions.
//!
//! # Responsibility
//! - Wire config, logging, storage and the mail notifier together.
//! - Map submission outcomes to process exit codes and JSON error bodies.

use clap::{Parser, Subcommand};
use log::info;
use resume_core::db::open_db;
use resume_core::repo::ledger_repo::upsert_user;
use resume_core::{
    init_logging, parse_rows, read_rows, render, submit, AppConfig, ErrorKind, MailNotifier,
    Resume, ResumeService, SpoolTransport, SqliteLedgerStore, User, UserId,
};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_CALLER_FAULT: u8 = 2;
const EXIT_SYSTEM_FAULT: u8 = 3;

#[derive(Debug, Parser)]
#[command(name = "txn-resume", version, about = "Persist a CSV ledger and mail its resume")]
struct Cli {
    /// JSON config file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit a `amount,timestamp` CSV ledger for a user.
    Submit {
        #[arg(long)]
        user: String,
        csv: PathBuf,
    },
    /// Create or update a user row in the local database.
    AddUser {
        #[arg(long)]
        id: UserId,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Render the resume of a CSV ledger without storing or sending it.
    Preview {
        csv: PathBuf,
        #[arg(long, default_value = "there")]
        name: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("txn-resume: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let config = load_config(cli.config.as_deref())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    match cli.command {
        Command::Submit { user, csv } => run_submit(&config, &user, &csv),
        Command::AddUser { id, name, email } => {
            let conn = open_db(&config.database_path)?;
            upsert_user(&conn, &User::new(id, name, email))?;
            info!("event=user_upsert module=cli status=ok user_id={id}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Preview { csv, name } => {
            let rows = read_rows(BufReader::new(File::open(&csv)?))?;
            let batch = parse_rows(&rows, 0)?;
            let resume = Resume::of(User::new(0, name, ""), &batch)?;
            println!("{}", render(&resume, &config.template)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_submit(config: &AppConfig, user: &str, csv: &Path) -> Result<ExitCode, Box<dyn Error>> {
    let payload = BufReader::new(File::open(csv)?);
    let conn = open_db(&config.database_path)?;
    let notifier = MailNotifier::new(
        config.mail.sender.as_str(),
        config.mail.subject.as_str(),
        SpoolTransport::new(&config.mail.spool_dir),
    );
    let service = ResumeService::new(
        SqliteLedgerStore::new(&conn),
        notifier,
        config.template.clone(),
    );

    match submit(&service, &config.request_context(), user, payload) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            println!("{}", serde_json::to_string(&err.to_response())?);
            Ok(ExitCode::from(match err.kind() {
                ErrorKind::CallerFault => EXIT_CALLER_FAULT,
                ErrorKind::SystemFault => EXIT_SYSTEM_FAULT,
            }))
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn Error>> {
    match path {
        Some(path) => Ok(AppConfig::load(path)?),
        None => Ok(AppConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn submit_parses_user_and_file() {
        let cli = Cli::try_parse_from(["txn-resume", "submit", "--user", "5", "ledger.csv"]).unwrap();
        match cli.command {
            Command::Submit { user, csv } => {
                assert_eq!(user, "5");
                assert_eq!(csv.to_str(), Some("ledger.csv"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from([
            "txn-resume",
            "preview",
            "ledger.csv",
            "--config",
            "resume.json",
        ])
        .unwrap();
        assert_eq!(cli.config.unwrap().to_str(), Some("resume.json"));
    }
}
