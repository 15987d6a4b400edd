mod cli;
mod converter;
mod dates;
mod detect;
mod error;
mod fmt;
mod models;
mod settings;
mod sources;
mod tokenizer;
mod transform;
#[cfg(feature = "upload")]
mod upload;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use sources::SourceRegistry;

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("csv2ynab=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Some(Commands::Sources {
            ignore_custom_sources,
        }) => cli::sources::run(&SourceRegistry::load(!ignore_custom_sources)),
        Some(Commands::Completions { shell }) => {
            cli::completions::run(shell);
            Ok(())
        }
        None => {
            let registry = SourceRegistry::load(!cli.convert.ignore_custom_sources);
            match cli::convert::run(&cli.convert, &registry) {
                Ok(summary) if summary.success() => Ok(()),
                Ok(_) => std::process::exit(1),
                Err(e) => Err(e),
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
