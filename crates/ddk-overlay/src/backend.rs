//! Storage seam for the overlay document.
//!
//! The overlay never cares where the document lives; production uses a
//! plain file, tests use the in-memory double. Implementations move whole
//! documents — the merge semantics live entirely in the overlay.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Raw document load/store.
pub trait OverlayBackend {
    /// `Ok(None)` when no document exists yet.
    fn load(&self) -> Result<Option<String>>;
    fn store(&mut self, document: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileBackend
// ---------------------------------------------------------------------------

/// One JSON file on disk.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OverlayBackend for FileBackend {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("read overlay file failed: {}", self.path.display()))
            }
        }
    }

    fn store(&mut self, document: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("create overlay dir failed: {}", parent.display())
                })?;
            }
        }
        std::fs::write(&self.path, document)
            .with_context(|| format!("write overlay file failed: {}", self.path.display()))
    }
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

/// In-memory double for tests and throwaway sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    doc: Option<String>,
}

impl MemoryBackend {
    /// Start from a pre-seeded document (possibly damaged, for recovery
    /// tests).
    pub fn with_document(document: &str) -> Self {
        Self {
            doc: Some(document.to_string()),
        }
    }

    /// The currently stored document, if any.
    pub fn document(&self) -> Option<String> {
        self.doc.clone()
    }
}

impl OverlayBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.doc.clone())
    }

    fn store(&mut self, document: &str) -> Result<()> {
        self.doc = Some(document.to_string());
        Ok(())
    }
}
