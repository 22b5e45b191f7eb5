//! Batches on disk: one CSV file per query, and the merge that turns those
//! files into a single labeled dataset.

pub mod merge;
pub mod writer;

pub use merge::{export_table, merge_dir};
pub use writer::write_batch;

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Extension shared by every batch file.
pub const TABLE_SUFFIX: &str = ".csv";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("could not scan {}: {}", .dir.display(), .source)]
    Scan { dir: PathBuf, source: io::Error },

    #[error("could not create {}: {}", .path.display(), .source)]
    Create { path: PathBuf, source: io::Error },

    #[error("could not write {}: {}", .path.display(), .source)]
    Write { path: PathBuf, source: csv::Error },

    #[error("could not read {}: {}", .path.display(), .source)]
    Read { path: PathBuf, source: csv::Error },
}

/// Row shape of a per-query file. The date stays an opaque string here:
/// relabeling rows must never reinterpret their content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: i64,
    pub date: String,
    pub content: String,
}

/// A stored row plus the labels derived from its source file name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledPost {
    pub id: i64,
    pub date: String,
    pub content: String,
    pub query_term: String,
    pub category: String,
}

impl LabeledPost {
    fn from_stored(row: StoredPost, labels: &FileLabels) -> Self {
        Self {
            id: row.id,
            date: row.date,
            content: row.content,
            query_term: labels.term.clone(),
            category: labels.category.clone(),
        }
    }
}

/// File name for one query's batch: the term, plus the year when present.
pub fn batch_filename(term: &str, year: Option<i32>) -> String {
    match year {
        Some(year) => format!("{term} {year}{TABLE_SUFFIX}"),
        None => format!("{term}{TABLE_SUFFIX}"),
    }
}

/// Labels encoded in a batch file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLabels {
    pub term: String,
    pub category: String,
    pub year: Option<i32>,
}

/// Recover `(term, category, year)` from a batch file name.
///
/// The stem is whitespace-tokenized. A trailing four-digit token is the
/// year suffix. One remaining token is a bare term; with two, the second is
/// the category. Other shapes return `None` and the caller decides whether
/// that is a skip or an error; rows must never be mislabeled silently.
pub fn parse_filename(name: &str) -> Option<FileLabels> {
    let stem = name.strip_suffix(TABLE_SUFFIX)?;
    let mut tokens: Vec<&str> = stem.split_whitespace().collect();

    let mut year = None;
    if let Some(last) = tokens.last()
        && last.len() == 4
        && last.bytes().all(|b| b.is_ascii_digit())
        && let Ok(y) = last.parse()
    {
        year = Some(y);
        tokens.pop();
    }

    match tokens[..] {
        [term] => Some(FileLabels {
            term: term.to_string(),
            category: String::new(),
            year,
        }),
        [term, category] => Some(FileLabels {
            term: term.to_string(),
            category: category.to_string(),
            year,
        }),
        _ => None,
    }
}
