use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use rql_cli::{run, Command, Context};
use rql_configuration::environment::ProcessEnvironment;

/// Translate and run RQL expressions against an SQLite database.
#[derive(Parser)]
#[command(name = "rql", version, about)]
struct Cli {
    /// The directory holding the configuration.
    #[arg(long = "context-path", env = "RQL_CONTEXT_PATH", global = true)]
    context_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
pub async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let context_path = match cli.context_path {
        Some(path) => path,
        None => match std::env::current_dir() {
            Ok(path) => path,
            Err(error) => {
                eprintln!("cannot read the current directory: {error}");
                return ExitCode::FAILURE;
            }
        },
    };
    let context = Context {
        context_path,
        environment: ProcessEnvironment,
    };

    match run(cli.command, context, &mut std::io::stdout()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
