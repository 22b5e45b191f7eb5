use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{DatasetError, batch_filename};
use crate::api::Post;

/// Header of a per-query file.
pub const BATCH_HEADER: [&str; 3] = ["id", "date", "content"];

/// Write one query's batch as `<term>[ <year>].csv` under `dir`,
/// overwriting any previous file of the same name.
///
/// The header row is always written, so an empty batch still produces a
/// well-formed file the merge step can read back.
pub fn write_batch(
    dir: &Path,
    term: &str,
    year: Option<i32>,
    posts: &[Post],
) -> Result<PathBuf, DatasetError> {
    fs::create_dir_all(dir).map_err(|source| DatasetError::Create {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(batch_filename(term, year));
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&path)
        .map_err(|source| DatasetError::Write {
            path: path.clone(),
            source,
        })?;

    write_rows(&mut writer, posts).map_err(|source| DatasetError::Write {
        path: path.clone(),
        source,
    })?;

    debug!(path = %path.display(), rows = posts.len(), "batch written");
    Ok(path)
}

fn write_rows(writer: &mut csv::Writer<fs::File>, posts: &[Post]) -> Result<(), csv::Error> {
    writer.write_record(BATCH_HEADER)?;
    for post in posts {
        writer.serialize(post)?;
    }
    writer.flush()?;
    Ok(())
}
