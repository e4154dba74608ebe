//! CLI module for the storyboard image cache
//!
//! Provides subcommands:
//! - `serve`: HTTP API server
//! - `analyze-clusters`: one-shot cluster analysis printed as JSON
//! - `analyze-users`: one-shot user analytics printed as JSON

pub mod analyze;
pub mod serve;

use clap::{Parser, Subcommand};

/// Storyboard image cache - tiered prompt-to-image delivery
#[derive(Parser)]
#[command(name = "storyboard-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Analyze image clusters and duplicate concepts, then exit
    AnalyzeClusters,

    /// Analyze session behaviour and suggest a prediction threshold, then exit
    AnalyzeUsers,
}
