use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::{DatasetError, FileLabels, LabeledPost, StoredPost, TABLE_SUFFIX, parse_filename};

/// Header of the merged dataset.
pub const EXPORT_HEADER: [&str; 5] = ["id", "date", "content", "query_term", "category"];

/// Merge every batch file directly under `dir` into one labeled table.
///
/// Rows are labeled from their file name, same-category files are grouped
/// together, and the groups are concatenated in the order their category
/// was first encountered. Files are visited in file-name order, so that
/// order does not depend on the platform's directory enumeration. A file
/// name that does not parse is skipped with a warning; a file that cannot
/// be read aborts the merge and names the file.
pub fn merge_dir(dir: &Path) -> Result<Vec<LabeledPost>, DatasetError> {
    let mut names = batch_file_names(dir)?;
    names.sort();

    let mut groups: Vec<(String, Vec<LabeledPost>)> = Vec::new();
    for name in &names {
        let Some(labels) = parse_filename(name) else {
            warn!(file = %name, "file name is not `term[ category][ year].csv`, skipping");
            continue;
        };
        let rows = load_labeled(&dir.join(name), &labels)?;
        debug!(file = %name, rows = rows.len(), category = %labels.category, "batch loaded");
        group_for(&mut groups, &labels.category).extend(rows);
    }

    Ok(groups.into_iter().flat_map(|(_, rows)| rows).collect())
}

/// Write the merged table to `path`, overwriting whatever is there. The
/// header row is always written, also for an empty table.
pub fn export_table(rows: &[LabeledPost], path: &Path) -> Result<(), DatasetError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|source| DatasetError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    write_export(&mut writer, rows).map_err(|source| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), rows = rows.len(), "merged table exported");
    Ok(())
}

fn batch_file_names(dir: &Path) -> Result<Vec<String>, DatasetError> {
    let scan_err = |source| DatasetError::Scan {
        dir: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(scan_err)? {
        let name = entry.map_err(scan_err)?.file_name();
        let Some(name) = name.to_str() else {
            warn!(file = ?name, "non-UTF-8 file name, skipping");
            continue;
        };
        if name.ends_with(TABLE_SUFFIX) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

fn load_labeled(path: &Path, labels: &FileLabels) -> Result<Vec<LabeledPost>, DatasetError> {
    let read_err = |source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(read_err)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<StoredPost>() {
        rows.push(LabeledPost::from_stored(record.map_err(read_err)?, labels));
    }
    Ok(rows)
}

fn group_for<'a>(
    groups: &'a mut Vec<(String, Vec<LabeledPost>)>,
    category: &str,
) -> &'a mut Vec<LabeledPost> {
    let idx = match groups.iter().position(|(c, _)| c == category) {
        Some(idx) => idx,
        None => {
            groups.push((category.to_string(), Vec::new()));
            groups.len() - 1
        }
    };
    &mut groups[idx].1
}

fn write_export(writer: &mut csv::Writer<fs::File>, rows: &[LabeledPost]) -> Result<(), csv::Error> {
    writer.write_record(EXPORT_HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
