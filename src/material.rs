//! Per-event material storage (slides, handouts, uploaded files).
//!
//! Thin wrapper around a collection-scoped directory tree: every event owns
//! one directory under the store root, created on first write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::DocumentError;
use crate::model::EventRef;

/// File store rooted at a single materials directory.
#[derive(Clone, Debug)]
pub struct MaterialStore {
    root: PathBuf,
}

impl MaterialStore {
    /// Creates a store rooted at `root`.  The directory itself is created
    /// lazily on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory holding the event's material files.
    pub fn event_dir(&self, event: &EventRef) -> PathBuf {
        self.root.join(format!("{}_{}", event.id, event.slug()))
    }

    /// Writes `bytes` under the event's directory and returns the full path.
    ///
    /// The file name is reduced to its final path component, so callers can
    /// pass untrusted upload names without escaping the event directory.
    pub fn save(
        &self,
        event: &EventRef,
        name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, DocumentError> {
        let directory = self.event_dir(event);
        fs::create_dir_all(&directory)?;

        let target = directory.join(file_component(name)?);
        fs::write(&target, bytes)?;
        Ok(target)
    }

    /// Lists the material file names stored for the event, sorted.  An event
    /// without a directory simply has no materials.
    pub fn list(&self, event: &EventRef) -> Result<Vec<String>, DocumentError> {
        let directory = self.event_dir(event);
        if !directory.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&directory)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Reads a stored material file, or `None` when it does not exist.
    pub fn read(&self, event: &EventRef, name: &str) -> Result<Option<Vec<u8>>, DocumentError> {
        let target = self.event_dir(event).join(file_component(name)?);
        if !target.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&target)?))
    }
}

fn file_component(name: &str) -> Result<&str, DocumentError> {
    let component = Path::new(name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if component.is_empty() || component == ".." {
        return Err(DocumentError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid material file name: {name:?}"),
        )));
    }
    Ok(component)
}
