use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use intake_core::draft::DraftStore;
use intake_core::error::PersistenceError;

/// Stores each draft as `<dir>/<encoded key>.json`.
///
/// Writes go to a uniquely named `.tmp` sibling first and are renamed into
/// place, so readers never observe a half-written draft and concurrent saves
/// of the same key resolve as last-writer-wins.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

impl FileDraftStore {
    /// Open (and create if needed) the draft directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "Draft directory ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        if key.is_empty() {
            return Err(PersistenceError::Unavailable("empty draft key".to_string()));
        }
        Ok(self.dir.join(format!("{}.json", encode_key(key))))
    }
}

/// Keep ASCII alphanumerics and `-`; hex-escape everything else as `_XX`.
/// `_` itself is escaped, so distinct keys never share a file.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("_{byte:02X}"));
        }
    }
    out
}

impl DraftStore for FileDraftStore {
    fn load(&self, key: &str) -> Result<Option<serde_json::Value>, PersistenceError> {
        let path = self.path_for(key)?;
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, key: &str, draft: &serde_json::Value) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        let json = serde_json::to_vec(draft)?;

        let tmp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        if let Err(e) = std::fs::write(&tmp_path, json) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
