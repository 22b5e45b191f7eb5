mod api;
mod cli;
mod collect;
mod dataset;
mod driver;
mod query;

pub const USER_AGENT: &str = concat!("magpie/", env!("CARGO_PKG_VERSION"));

use std::collections::BTreeSet;
use std::time::Duration;

use clap::Parser;
use reqwest::Client;

use api::HttpSearchClient;
use cli::{Cli, Command};
use dataset::{export_table, merge_dir};
use driver::CollectOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("magpie=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Collect(args) => run_collect(args).await,
        Command::Merge(args) => run_merge(args),
    }
}

async fn run_collect(args: cli::CollectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let source = HttpSearchClient::from_env(http)
        .inspect_err(|e| tracing::error!("search client unavailable: {e}"))?;

    let options = CollectOptions {
        terms: args.terms,
        limit: args.limit,
        lang: args.lang,
        since_year: args.since_year,
        out_dir: args.out_dir,
        save: !args.dry_run,
    };
    let report = driver::run_collection(&source, &options).await;

    for outcome in &report.outcomes {
        match &outcome.file {
            Some(path) => println!(
                "{}: {} posts -> {}",
                outcome.term,
                outcome.collected,
                path.display()
            ),
            None => println!("{}: {} posts (not saved)", outcome.term, outcome.collected),
        }
    }
    for failure in &report.failures {
        println!("{}: failed ({})", failure.term, failure.reason);
    }
    println!(
        "{} posts across {} terms, {} failed",
        report.total_collected(),
        report.outcomes.len(),
        report.failures.len()
    );
    Ok(())
}

fn run_merge(args: cli::MergeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rows = merge_dir(&args.dir).inspect_err(|e| tracing::error!("merge failed: {e}"))?;
    export_table(&rows, &args.out).inspect_err(|e| tracing::error!("export failed: {e}"))?;

    let categories: BTreeSet<&str> = rows.iter().map(|r| r.category.as_str()).collect();
    println!(
        "{} rows across {} categories -> {}",
        rows.len(),
        categories.len(),
        args.out.display()
    );
    Ok(())
}
