use std::process::ExitCode;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
    error::ErrorKind,
};
use clap_complete::{Shell, generate};

use planets::{
    cli, config, error,
    logger::{self, Logger},
    warning,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about="A cli to manage CMS data",
  long_about="This cli creates, updates, deletes and prints CMS instance data.",
  styles=styles(),
  arg_required_else_help = true,
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create planet CMS instances based on sample data.
    Create,

    /// Update planet CMS instances.
    Update,

    /// Delete planet CMS instances.
    Delete,

    /// Print planet CMS instance info.
    Info,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

// Help and version output are not failures; every other usage error
// exits with 1 like a failed command.
fn usage_exit_status(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        | ErrorKind::MissingSubcommand => 0,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // The log level may come from the .env file, so load it first.
    let env_result = config::load_env();
    logger::init(Logger::from_env());
    if let Err(e) = env_result {
        warning!("Cannot load environment file. Err: {}", e);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(usage_exit_status(e.kind()));
        }
    };

    let result = match cli.command {
        Command::Create => cli::create().await,
        Command::Update => cli::update().await,
        Command::Delete => cli::delete().await,
        Command::Info => cli::info().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(1)
        }
    }
}
