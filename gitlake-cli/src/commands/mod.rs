pub mod acquire;
pub mod status;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a repository locator and record run provenance
    Acquire(acquire::AcquireArgs),
    /// Show row counts for every record kind in the store
    Status(status::StatusArgs),
}

pub async fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Acquire(args) => acquire::run(args).await,
        Command::Status(args) => status::run(args).await,
    }
}
