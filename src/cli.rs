use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "magpie")]
#[command(about = "Collect social-media posts into labeled CSV datasets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run search queries and write one CSV batch per term
    Collect(CollectArgs),
    /// Combine a directory of batches into one labeled table
    Merge(MergeArgs),
}

#[derive(Debug, clap::Args)]
pub struct CollectArgs {
    /// Search terms, one batch each; quote multi-word terms
    #[arg(required = true)]
    pub terms: Vec<String>,

    /// Most posts to collect per term
    #[arg(long, default_value_t = 500)]
    pub limit: usize,

    /// Only match posts from January 1 of this year onward
    #[arg(long)]
    pub since_year: Option<i32>,

    /// Language filter applied to every query
    #[arg(long, default_value = "en")]
    pub lang: String,

    /// Directory the batch files are written to
    #[arg(long, default_value = "data")]
    pub out_dir: PathBuf,

    /// Collect and report, but write nothing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, clap::Args)]
pub struct MergeArgs {
    /// Directory holding the batch files
    #[arg(long, default_value = "data")]
    pub dir: PathBuf,

    /// Where the merged table goes; keep it outside the batch directory
    #[arg(long, default_value = "merged.csv")]
    pub out: PathBuf,
}
