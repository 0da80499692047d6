pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "relay",
    about = "Relay operator CLI",
    long_about = "Inspect relay configuration, readiness, registered tools, and the sqlite thread log.",
    after_help = "Examples:\n  relay doctor --json\n  relay config\n  relay tools --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Validate config, thread log, assistant, and tool readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "List the tools the assistant can call")]
    Tools {
        #[arg(long, help = "Emit the tool definitions as sent to the assistant API")]
        json: bool,
    },
    #[command(about = "Apply pending migrations to the sqlite thread log")]
    Migrate,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Doctor { json } => commands::CommandResult::text(commands::doctor::run(json)),
        Command::Config => commands::CommandResult::text(commands::config::run()),
        Command::Tools { json } => commands::tools::run(json),
        Command::Migrate => commands::migrate::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
