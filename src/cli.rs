use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use crate::commands::{self, CommandReport};
use crate::logging::{self, Narration};

#[derive(Debug, Parser)]
#[command(
    name = "event-digest",
    version,
    about = "Digest hourly gzip event archives into a summary and a known-users list"
)]
struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Digest every archive in the events directory (default).
    Run,
    /// Show resolved paths, configuration and cache state without writing anything.
    Status,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(if cli.json {
        Narration::Stderr
    } else {
        Narration::Stdout
    });

    let report = match cli.command.unwrap_or(Command::Run) {
        Command::Run => commands::digest_run::run()?,
        Command::Status => commands::status::run()?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        bail!("{} reported {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}
