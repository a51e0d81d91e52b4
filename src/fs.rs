//! Filesystem access used by the static loaders.

use std::fmt::Debug;
use std::io;
use std::path::Path;

/// Read-only view of the files backing the website.
pub trait FileSystem: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;

    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn read_text(&self, path: &Path) -> io::Result<String>;
}

/// The local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_bytes(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn read_text(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}
