//! Synthesized audio artifacts, one file per session.
//!
//! `<outputs_dir>/<session_id>.wav`. A zero-length file records that the
//! session produced no audio.

use crate::error::{Result, VoxbridgeError};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn path_for(&self, session_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.wav", session_id))
    }

    /// Write `bytes` atomically: readers never see a partial artifact.
    pub fn write(&self, session_id: Uuid, bytes: &[u8]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.path_for(session_id);
        let mut scratch = tempfile::NamedTempFile::new_in(&self.dir)?;
        scratch.write_all(bytes)?;
        scratch.flush()?;
        scratch.persist(&path).map_err(|e| VoxbridgeError::Io(e.error))?;
        Ok(path)
    }

    /// Record that `session_id` produced no audio.
    pub fn write_empty(&self, session_id: Uuid) -> Result<PathBuf> {
        self.write(session_id, &[])
    }

    /// Find the artifact for a caller-supplied session ID.
    ///
    /// # Errors
    /// `VoxbridgeError::InvalidInput` if `session_id` is not a UUID, so no
    /// path outside the store can be named; `Io` (not found) if no such
    /// session exists.
    pub fn lookup(&self, session_id: &str) -> Result<PathBuf> {
        let id = Uuid::parse_str(session_id.trim()).map_err(|_| {
            VoxbridgeError::invalid_input(format!("Invalid session ID '{}'", session_id))
        })?;
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(VoxbridgeError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No output for session {}", id),
            )));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_creates_directory_and_file() {
        let temp = TempDir::new().unwrap();
        let store = OutputStore::new(temp.path().join("nested/outputs"));
        let id = Uuid::new_v4();

        let path = store.write(id, b"RIFFdata").unwrap();

        assert_eq!(path, store.path_for(id));
        assert_eq!(std::fs::read(&path).unwrap(), b"RIFFdata");
        assert!(path.to_string_lossy().ends_with(&format!("{}.wav", id)));
    }

    #[test]
    fn write_empty_leaves_zero_length_file() {
        let temp = TempDir::new().unwrap();
        let store = OutputStore::new(temp.path());
        let path = store.write_empty(Uuid::new_v4()).unwrap();
        assert_eq!(std::fs::metadata(path).unwrap().len(), 0);
    }

    #[test]
    fn lookup_finds_written_artifact() {
        let temp = TempDir::new().unwrap();
        let store = OutputStore::new(temp.path());
        let id = Uuid::new_v4();
        store.write(id, b"x").unwrap();

        assert_eq!(store.lookup(&id.to_string()).unwrap(), store.path_for(id));
    }

    #[test]
    fn lookup_rejects_non_uuid() {
        let temp = TempDir::new().unwrap();
        let store = OutputStore::new(temp.path());

        let err = store.lookup("../../etc/passwd").unwrap_err();
        assert!(matches!(err, VoxbridgeError::InvalidInput { .. }));
    }

    #[test]
    fn lookup_missing_session_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = OutputStore::new(temp.path());

        match store.lookup(&Uuid::new_v4().to_string()) {
            Err(VoxbridgeError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }
}
