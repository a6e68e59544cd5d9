//! startsync CLI entry point.

use clap::Parser;
use startsync::cli::commands;
use startsync::cli::{Cli, Commands};
use startsync::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    // Piped output is for scripts: default to JSON there.
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("startsync=info,warn"),
            2 => EnvFilter::new("debug,rusqlite=info,hyper=info,reqwest=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    let db = cli.db.as_ref();
    match &cli.command {
        Commands::Init { force } => commands::init::execute(db, *force, json),
        Commands::Version => commands::version::execute(json),
        Commands::Status { remote } => commands::status::execute(db, *remote, json),
        Commands::Sync => commands::sync::execute(db, json),
        Commands::History { command } => commands::history::execute(command, db, json),
        Commands::Favorites { command } => commands::favorites::execute(command, db, json),
        Commands::Queue { command } => commands::queue::execute(command, db, json),
        Commands::Auth { command } => commands::auth::execute(command, db, json),
        Commands::Daemon { interval } => commands::daemon::execute(db, *interval, json),
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
