use clap::{Parser, Subcommand, ValueEnum};

mod chain;

/// Build and run chains of deferred values.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose a chain of links onto a starting value and read the result
    Chain(chain::Command),
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Commands::Chain(args) => args.exec(),
    }
}
