mod cache;
mod command;
mod config;
mod context;
mod entity;
mod progress;

use clap::{Parser, Subcommand};
use command::Command as _;
use config::Config;
use context::Context;

#[derive(Parser, Debug)]
#[command(name = "rapid-index", version, about = "Maintain and query a script repository index")]
struct Cli {
    #[command(flatten)]
    config: Config,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a fresh index file.
    Init(command::InitArgs),
    /// Insert or update one entry in a local index file.
    Add(command::AddArgs),
    /// Delete an entry from a local index file.
    Remove(command::RemoveArgs),
    /// Fetch the published index, optionally verifying source urls.
    Update(command::UpdateArgs),
    /// Fuzzy-search packages by name and description.
    Search(command::SearchArgs),
    /// Print one package's full record.
    Show(command::ShowArgs),
    /// Validate an index and report every problem.
    Check(command::CheckArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config);
    let mut context = Context::new(config);

    match cli.command {
        Commands::Init(args) => args.run(&mut context).await,
        Commands::Add(args) => args.run(&mut context).await,
        Commands::Remove(args) => args.run(&mut context).await,
        Commands::Update(args) => args.run(&mut context).await,
        Commands::Search(args) => args.run(&mut context).await,
        Commands::Show(args) => args.run(&mut context).await,
        Commands::Check(args) => args.run(&mut context).await,
    }
}
