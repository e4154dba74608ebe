use clap::Parser;
use storyboard_cache::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::AnalyzeClusters => cli::analyze::run_clusters().await,
        Command::AnalyzeUsers => cli::analyze::run_users().await,
    }
}
