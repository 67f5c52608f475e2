//! Key-value port for persisted wizard drafts.

use dashmap::DashMap;
use promo_core::{PromoError, PromoResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Where in-progress wizard drafts are kept between requests.
pub trait DraftStorage: Send + Sync {
    fn get(&self, key: &str) -> PromoResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PromoResult<()>;
    /// Removing a missing key is not an error.
    fn clear(&self, key: &str) -> PromoResult<()>;
}

/// Thread-safe in-memory draft storage.
#[derive(Default)]
pub struct MemoryDraftStorage {
    entries: DashMap<String, String>,
}

impl MemoryDraftStorage {
    pub fn new() -> Self {
        info!("Draft storage initialized (in-memory, development mode)");
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DraftStorage for MemoryDraftStorage {
    fn get(&self, key: &str) -> PromoResult<Option<String>> {
        Ok(self.entries.get(key).map(|r| r.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> PromoResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> PromoResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory.
pub struct FileDraftStorage {
    dir: PathBuf,
}

impl FileDraftStorage {
    pub fn new(dir: impl AsRef<Path>) -> PromoResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        info!(dir = %dir.display(), "Draft storage initialized (file)");
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PromoResult<PathBuf> {
        if key.is_empty() {
            return Err(PromoError::Storage("draft key must not be empty".to_string()));
        }
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        Ok(self.dir.join(format!("{name}.json")))
    }
}

impl DraftStorage for FileDraftStorage {
    fn get(&self, key: &str) -> PromoResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> PromoResult<()> {
        let path = self.path_for(key)?;
        std::fs::write(&path, value)?;
        debug!(path = %path.display(), bytes = value.len(), "Draft written");
        Ok(())
    }

    fn clear(&self, key: &str) -> PromoResult<()> {
        match std::fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
