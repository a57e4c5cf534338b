//! Helpers for tests that need mod archives on disk.

use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::{self, Write};
use std::path::Path;

enum FixtureEntry {
    Dir(String),
    File {
        name: String,
        data: Vec<u8>,
        method: rawzip::CompressionMethod,
    },
}

/// Builds a small zip archive entry by entry.
#[derive(Default)]
pub struct ZipFixture {
    entries: Vec<FixtureEntry>,
}

impl ZipFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_string(),
            data: data.to_vec(),
            method: rawzip::CompressionMethod::Store,
        });
        self
    }

    pub fn deflated(mut self, name: &str, data: &[u8]) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_string(),
            data: data.to_vec(),
            method: rawzip::CompressionMethod::Deflate,
        });
        self
    }

    /// Adds a directory entry. `name` must end with `/`.
    pub fn dir(mut self, name: &str) -> Self {
        self.entries.push(FixtureEntry::Dir(name.to_string()));
        self
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, rawzip::Error> {
        let mut archive = rawzip::ZipArchiveWriter::new(Vec::new());
        for entry in &self.entries {
            match entry {
                FixtureEntry::Dir(name) => archive.new_dir(name).create()?,
                FixtureEntry::File { name, data, method } => {
                    let (mut file, config) = archive
                        .new_file(name)
                        .compression_method(*method)
                        .start()?;
                    let descriptor = match method {
                        rawzip::CompressionMethod::Deflate => {
                            let encoder = DeflateEncoder::new(&mut file, Compression::default());
                            let mut writer = config.wrap(encoder);
                            writer.write_all(data)?;
                            let (encoder, descriptor) = writer.finish()?;
                            encoder.finish()?;
                            descriptor
                        }
                        _ => {
                            let mut writer = config.wrap(&mut file);
                            writer.write_all(data)?;
                            let (_, descriptor) = writer.finish()?;
                            descriptor
                        }
                    };
                    file.finish(descriptor)?;
                }
            }
        }
        archive.finish()
    }

    /// Writes the archive to `path`, creating missing parent directories.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = self.to_bytes().map_err(io::Error::other)?;
        std::fs::write(path, bytes)
    }
}
