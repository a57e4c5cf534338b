//! Recursive search for mod archives.

use crate::error::{LoadReport, ModLoadIssue};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Returns true for file names of the form `<stem>.<suffix>` with a
/// non-empty stem and one of `suffixes`, compared case-sensitively.
pub fn is_archive_name(file_name: &str, suffixes: &[String]) -> bool {
    match file_name.rsplit_once('.') {
        Some((stem, suffix)) => !stem.is_empty() && suffixes.iter().any(|s| s == suffix),
        None => false,
    }
}

/// Walks `root` depth-first and returns every regular file whose name
/// matches [`is_archive_name`], sorted by path.
///
/// Symbolic links are followed. Entries that cannot be read and link
/// cycles are recorded in `report` as discovery issues and skipped.
pub fn discover_archives(
    root: &Path,
    suffixes: &[String],
    report: &mut LoadReport,
) -> Vec<PathBuf> {
    if !root.is_dir() {
        warn!(target: "mod_loader", "Mods directory does not exist: {}", root.display());
        return Vec::new();
    }

    let mut archives = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                report.record(ModLoadIssue::Discovery {
                    path,
                    details: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| is_archive_name(name, suffixes));
        if matches {
            debug!(target: "mod_loader", "Found mod archive {}", entry.path().display());
            archives.push(entry.into_path());
        }
    }

    archives.sort();
    archives
}
