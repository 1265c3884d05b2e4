use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// The artifact kinds cached per video id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Video,
    Audio,
    Subtitle,
}

impl ArtifactKind {
    fn dir(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "video",
            ArtifactKind::Audio => "audio",
            ArtifactKind::Subtitle => "subtitle",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "mp4",
            ArtifactKind::Audio => "wav",
            ArtifactKind::Subtitle => "txt",
        }
    }
}

/// On-disk artifact cache rooted at the configured data directory:
/// `tmp/`, `video/`, `audio/`, `subtitle/`, each file keyed by video id.
///
/// Producers write to a temp file under `tmp/` and promote it by rename, so
/// a canonical path either does not exist or holds a complete artifact.
/// A per-(id, kind) async lock serializes producers; a second request for
/// the same artifact waits and then sees the cache hit.
pub struct ArtifactStore {
    root: PathBuf,
    locks: Mutex<HashMap<(String, ArtifactKind), Arc<Mutex<()>>>>,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in ["tmp", "video", "audio", "subtitle"] {
            std::fs::create_dir_all(root.join(dir))?;
        }
        Ok(Self {
            root,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path for an artifact, whether or not it exists yet.
    pub fn path(&self, id: &str, kind: ArtifactKind) -> PathBuf {
        self.root
            .join(kind.dir())
            .join(format!("{id}.{}", kind.extension()))
    }

    /// Path of a previously completed artifact, if any.
    pub fn cached(&self, id: &str, kind: ArtifactKind) -> Option<PathBuf> {
        let path = self.path(id, kind);
        if path.is_file() {
            debug!("cache hit for {id} ({})", kind.dir());
            Some(path)
        } else {
            None
        }
    }

    /// Acquire the producer lock for one (id, kind) pair. Hold the guard
    /// across the whole check-produce-promote sequence.
    pub async fn lock(&self, id: &str, kind: ArtifactKind) -> OwnedMutexGuard<()> {
        let cell = {
            let mut locks = self.locks.lock().await;
            locks
                .entry((id.to_string(), kind))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        cell.lock_owned().await
    }

    /// Open a temp file in the store's tmp directory. Dropping it without
    /// promoting deletes the partial artifact.
    pub fn temp_file(&self, suffix: &str) -> Result<NamedTempFile> {
        let file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile_in(self.root.join("tmp"))?;
        Ok(file)
    }

    /// Move a completed temp file onto the canonical path. The tmp dir
    /// lives on the same filesystem, so this is a rename.
    pub fn promote(&self, temp: NamedTempFile, id: &str, kind: ArtifactKind) -> Result<PathBuf> {
        let dest = self.path(id, kind);
        temp.persist(&dest).map_err(|e| e.error)?;
        debug!("promoted {} artifact for {id}", kind.dir());
        Ok(dest)
    }

    /// Write a subtitle track's flat rendering atomically.
    pub fn write_subtitle(&self, id: &str, content: &str) -> Result<PathBuf> {
        use std::io::Write;
        let mut temp = self.temp_file(".txt")?;
        temp.write_all(content.as_bytes())?;
        temp.flush()?;
        self.promote(temp, id, ArtifactKind::Subtitle)
    }

    pub fn read_subtitle(&self, id: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path(id, ArtifactKind::Subtitle))?)
    }

    /// Delete an artifact that turned out to be useless (e.g. audio whose
    /// transcription produced nothing).
    pub fn remove(&self, id: &str, kind: ArtifactKind) -> Result<()> {
        let path = self.path(id, kind);
        if path.exists() {
            std::fs::remove_file(&path)?;
            debug!("removed {} artifact for {id}", kind.dir());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_creates_layout() {
        let (dir, _store) = store();
        for sub in ["tmp", "video", "audio", "subtitle"] {
            assert!(dir.path().join(sub).is_dir());
        }
    }

    #[test]
    fn test_canonical_paths() {
        let (_dir, store) = store();
        assert!(store
            .path("abc", ArtifactKind::Video)
            .ends_with("video/abc.mp4"));
        assert!(store
            .path("abc", ArtifactKind::Audio)
            .ends_with("audio/abc.wav"));
        assert!(store
            .path("abc", ArtifactKind::Subtitle)
            .ends_with("subtitle/abc.txt"));
    }

    #[test]
    fn test_promote_makes_artifact_visible() {
        let (_dir, store) = store();
        assert!(store.cached("abc", ArtifactKind::Video).is_none());

        let mut temp = store.temp_file(".mp4").unwrap();
        temp.write_all(b"data").unwrap();
        let path = store.promote(temp, "abc", ArtifactKind::Video).unwrap();

        assert_eq!(store.cached("abc", ArtifactKind::Video), Some(path.clone()));
        assert_eq!(std::fs::read(path).unwrap(), b"data");
    }

    #[test]
    fn test_dropped_temp_leaves_no_artifact() {
        let (dir, store) = store();
        {
            let mut temp = store.temp_file(".wav").unwrap();
            temp.write_all(b"partial").unwrap();
        }
        assert!(store.cached("abc", ArtifactKind::Audio).is_none());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("tmp"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_subtitle_roundtrip() {
        let (_dir, store) = store();
        store.write_subtitle("abc", "0.00 -> 1.00: hi\n").unwrap();
        assert_eq!(store.read_subtitle("abc").unwrap(), "0.00 -> 1.00: hi\n");
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let (_dir, store) = store();
        assert!(store.remove("abc", ArtifactKind::Audio).is_ok());
    }

    #[tokio::test]
    async fn test_lock_serializes_same_key() {
        let (_dir, store) = store();
        let guard = store.lock("abc", ArtifactKind::Video).await;

        // A different key is not blocked.
        let other = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            store.lock("abc", ArtifactKind::Audio),
        )
        .await;
        assert!(other.is_ok());

        // The same key is blocked until the guard drops.
        let same = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            store.lock("abc", ArtifactKind::Video),
        )
        .await;
        assert!(same.is_err());

        drop(guard);
        let same = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            store.lock("abc", ArtifactKind::Video),
        )
        .await;
        assert!(same.is_ok());
    }
}
