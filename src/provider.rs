//! Read stylesheet sources.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use crate::util::url_path::UrlPath;

/// Provides the bytes of stylesheets.
///
/// Paths are relative to a root directory chosen by the implementation.
pub trait SourceProvider {
    /// Read the content of a stylesheet.
    fn read(&self, path: &UrlPath) -> std::io::Result<Vec<u8>>;
}

impl<T> SourceProvider for &T
where
    T: SourceProvider + ?Sized,
{
    fn read(&self, path: &UrlPath) -> std::io::Result<Vec<u8>> {
        (**self).read(path)
    }
}

/// A [`SourceProvider`] that reads files from a directory.
#[derive(Clone, Debug)]
pub struct FileProvider {
    root_dir: PathBuf,
}

impl FileProvider {
    /// Create a provider reading files under `root_dir`.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Return the root directory.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }
}

impl SourceProvider for FileProvider {
    fn read(&self, path: &UrlPath) -> std::io::Result<Vec<u8>> {
        let file = self.root_dir.join(path.to_std_path_buf());
        tracing::trace!("Reading {:?}", file);
        std::fs::read(file)
    }
}

/// A [`SourceProvider`] that serves sources stored in memory.
///
/// This allows to optimize stylesheets that have been generated in memory
/// but not written on the disk.
#[derive(Debug, Default)]
pub struct MemoryProvider(RwLock<HashMap<UrlPath, Vec<u8>>>);

impl MemoryProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a source for given path.
    pub fn insert(&self, path: impl Into<UrlPath>, source: impl Into<Vec<u8>>) {
        let path = path.into().root_relative();
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, source.into());
    }
}

impl SourceProvider for MemoryProvider {
    fn read(&self, path: &UrlPath) -> std::io::Result<Vec<u8>> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&path.root_relative())
            .cloned()
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, format!("no source for {path}"))
            })
    }
}
