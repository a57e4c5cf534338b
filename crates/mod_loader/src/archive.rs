//! Reading code units out of mod archives.

use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io failed at `{path}`: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid zip archive: {0}")]
    Invalid(String),
    #[error("unsupported compression method {method} for `{entry}`")]
    UnsupportedCompression { entry: String, method: String },
    #[error("failed to decompress `{entry}`: {source}")]
    Decompress {
        entry: String,
        #[source]
        source: std::io::Error,
    },
}

/// An archive entry a code-loading context may be able to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeUnit {
    /// Normalized path of the entry inside the archive
    pub entry_name: String,
    /// `entry_name` with the unit suffix stripped and `/` replaced by `::`
    pub type_name: String,
    /// Suffix of the entry as written in the archive
    pub suffix: String,
    /// Uncompressed contents
    pub data: Vec<u8>,
}

/// Strips a unit suffix (compared ignoring ASCII case) from `entry_name`
/// and returns the qualified type name and the suffix as written.
pub fn qualified_type_name(entry_name: &str, unit_suffixes: &[&str]) -> Option<(String, String)> {
    let (stem, suffix) = entry_name.rsplit_once('.')?;
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }
    if !unit_suffixes.iter().any(|s| s.eq_ignore_ascii_case(suffix)) {
        return None;
    }
    Some((stem.replace('/', "::"), suffix.to_string()))
}

/// Reads the zip archive at `path` and returns every non-directory entry
/// that carries one of `unit_suffixes`, in archive order.
///
/// Entries are decompressed only when they are code units. Any malformed
/// entry fails the whole archive.
pub fn read_code_units(path: &Path, unit_suffixes: &[&str]) -> Result<Vec<CodeUnit>, ArchiveError> {
    let buf = std::fs::read(path).map_err(|source| ArchiveError::IoAt {
        path: path.to_path_buf(),
        source,
    })?;
    let archive = rawzip::ZipArchive::from_slice(&buf)
        .map_err(|e| ArchiveError::Invalid(format!("{:?}", e)))?;

    let mut units = Vec::new();
    for entry in archive.entries() {
        let entry = entry.map_err(|e| ArchiveError::Invalid(format!("zip entry error: {:?}", e)))?;
        if entry.is_dir() {
            continue;
        }
        let entry_name = entry
            .file_path()
            .try_normalize()
            .map_err(|e| ArchiveError::Invalid(format!("failed to normalize zip path: {:?}", e)))?
            .as_ref()
            .to_string();

        let Some((type_name, suffix)) = qualified_type_name(&entry_name, unit_suffixes) else {
            continue;
        };

        let wayfinder = entry.wayfinder();
        let slice_entry = archive
            .get_entry(wayfinder)
            .map_err(|e| ArchiveError::Invalid(format!("failed to get entry data: {:?}", e)))?;
        let data = slice_entry.data();

        let mut contents = Vec::new();
        match entry.compression_method() {
            rawzip::CompressionMethod::Store => contents.extend_from_slice(data),
            rawzip::CompressionMethod::Deflate => {
                let mut decoder = flate2::read::DeflateDecoder::new(data);
                decoder
                    .read_to_end(&mut contents)
                    .map_err(|source| ArchiveError::Decompress {
                        entry: entry_name.clone(),
                        source,
                    })?;
            }
            method => {
                return Err(ArchiveError::UnsupportedCompression {
                    entry: entry_name,
                    method: format!("{:?}", method),
                })
            }
        }

        units.push(CodeUnit {
            entry_name,
            type_name,
            suffix,
            data: contents,
        });
    }
    Ok(units)
}
