#![allow(dead_code)]

pub use mod_loader::testing::ZipFixture;

use mod_api::EventBus;
use mod_loader::{LoaderConfig, ModLoader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const HOST_VERSION: [u64; 2] = [0, 3];

/// Writes `<dir>/<file_name>` holding one marker entry per type name.
pub fn write_mod_archive(dir: &Path, file_name: &str, type_names: &[&str]) -> PathBuf {
    let path = dir.join(file_name);
    let fixture = type_names.iter().fold(ZipFixture::new(), |fixture, type_name| {
        fixture.stored(&format!("{}.unit", type_name.replace("::", "/")), b"")
    });
    fixture.write_to(&path).unwrap();
    path
}

pub fn new_loader() -> ModLoader {
    ModLoader::new(LoaderConfig::new(HOST_VERSION), Arc::new(EventBus::new()))
}
