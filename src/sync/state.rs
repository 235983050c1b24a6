//! Persisted sync state (last seen eTag per family)

use super::client::DriveItemMeta;
use crate::error::SyncResult;
use crate::types::FileFamily;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFileMeta {
    pub etag: String,
    pub last_modified: String,
}

impl From<&DriveItemMeta> for StoredFileMeta {
    fn from(meta: &DriveItemMeta) -> Self {
        Self {
            etag: meta.e_tag.clone(),
            last_modified: meta.last_modified_date_time.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    #[serde(default)]
    pub files: BTreeMap<FileFamily, StoredFileMeta>,
    /// Sanitized links (`share:<id>`), never raw URLs
    #[serde(default)]
    pub links: BTreeMap<FileFamily, String>,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

impl SyncState {
    /// Load state from disk. A missing or unreadable file is a fresh state.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "discarding corrupt sync state");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> SyncResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn etag(&self, family: FileFamily) -> Option<&str> {
        self.files.get(&family).map(|m| m.etag.as_str())
    }

    pub fn record(&mut self, family: FileFamily, meta: &DriveItemMeta) {
        self.files.insert(family, StoredFileMeta::from(meta));
    }

    /// Forget a family (its link changed or was removed)
    pub fn forget(&mut self, family: FileFamily) {
        self.files.remove(&family);
    }
}
