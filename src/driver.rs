use std::path::PathBuf;

use tracing::{info, warn};

use crate::api::SearchSource;
use crate::collect::collect_posts;
use crate::dataset::write_batch;
use crate::query::SearchQuery;

/// Run parameters for one collection sweep.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub terms: Vec<String>,
    pub limit: usize,
    pub lang: String,
    pub since_year: Option<i32>,
    pub out_dir: PathBuf,
    pub save: bool,
}

/// A term that produced a batch.
#[derive(Debug)]
pub struct TermOutcome {
    pub term: String,
    pub collected: usize,
    pub file: Option<PathBuf>,
}

/// A term that produced no batch, and why.
#[derive(Debug)]
pub struct TermFailure {
    pub term: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<TermOutcome>,
    pub failures: Vec<TermFailure>,
}

impl RunReport {
    pub fn total_collected(&self) -> usize {
        self.outcomes.iter().map(|o| o.collected).sum()
    }
}

/// Collect every term in order, fully sequentially: build the query, pull
/// posts up to the cap, and (unless this is a dry run) write the batch.
///
/// One term's failure is logged and recorded, and the sweep moves on;
/// sibling queries are never blocked. A term that legitimately matches
/// nothing still produces an (empty) batch.
pub async fn run_collection(source: &impl SearchSource, options: &CollectOptions) -> RunReport {
    let mut report = RunReport::default();

    for term in &options.terms {
        info!(term = %term, limit = options.limit, "collecting");

        let query = SearchQuery::new(term.clone(), options.lang.clone(), options.since_year);
        let expr = match query.build() {
            Ok(expr) => expr,
            Err(e) => {
                warn!(term = %term, error = %e, "query rejected, skipping term");
                report.failures.push(TermFailure {
                    term: term.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let posts = match collect_posts(source, &expr, options.limit).await {
            Ok(posts) => posts,
            Err(e) => {
                warn!(term = %term, error = %e, "collection failed, moving to next term");
                report.failures.push(TermFailure {
                    term: term.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if posts.is_empty() {
            warn!(term = %term, "term yielded no posts");
        } else if posts.len() < options.limit {
            info!(
                term = %term,
                collected = posts.len(),
                requested = options.limit,
                "sequence ended before the cap"
            );
        }

        let file = if options.save {
            match write_batch(&options.out_dir, term, options.since_year, &posts) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(term = %term, error = %e, "write failed, moving to next term");
                    report.failures.push(TermFailure {
                        term: term.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            }
        } else {
            None
        };

        info!(term = %term, collected = posts.len(), "term done");
        report.outcomes.push(TermOutcome {
            term: term.clone(),
            collected: posts.len(),
            file,
        });
    }

    report
}
