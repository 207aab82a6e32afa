//! Persistence for segments and playlists
//!
//! The muxer only sees `SegmentStore`; recordings normally land in a
//! directory, tests and embedders can keep them in memory instead.

use crate::error::Result;
use bytes::Bytes;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flat name -> bytes storage for one recorded asset.
pub trait SegmentStore: Send + Sync {
    /// Store a segment payload under `name`, replacing any previous one.
    fn write(&self, name: &str, data: Bytes) -> Result<()>;

    /// Store a playlist document. Readers must never observe a partial one.
    fn write_playlist(&self, name: &str, document: &str) -> Result<()> {
        self.write(name, Bytes::copy_from_slice(document.as_bytes()))
    }

    /// `None` when nothing was stored under `name`.
    fn read(&self, name: &str) -> Result<Option<Bytes>>;

    /// All stored names, sorted.
    fn list(&self) -> Result<Vec<String>>;
}

/// Stores files directly under one output directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open (and create if needed) the output directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl SegmentStore for DirectoryStore {
    fn write(&self, name: &str, data: Bytes) -> Result<()> {
        std::fs::write(self.path(name), &data)?;
        debug!("Wrote {} ({} bytes)", name, data.len());
        Ok(())
    }

    fn write_playlist(&self, name: &str, document: &str) -> Result<()> {
        let tmp = self.path(&format!(".{}.tmp", name));
        std::fs::write(&tmp, document)?;
        std::fs::rename(&tmp, self.path(name))?;
        debug!("Wrote playlist {}", name);
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Option<Bytes>> {
        match std::fs::read(self.path(name)) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-memory store backed by a `DashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: DashMap<String, Bytes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Stored document as UTF-8, for playlist assertions.
    pub fn read_string(&self, name: &str) -> Option<String> {
        self.files
            .get(name)
            .map(|data| String::from_utf8_lossy(&data).into_owned())
    }
}

impl SegmentStore for MemoryStore {
    fn write(&self, name: &str, data: Bytes) -> Result<()> {
        self.files.insert(name.to_string(), data);
        Ok(())
    }

    fn read(&self, name: &str) -> Result<Option<Bytes>> {
        Ok(self.files.get(name).map(|data| data.clone()))
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }
}
