// Copyright 2025 Chapterdiff (https://github.com/chapterdiff)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Filesystem-backed chapter store.
//!
//! One JSON file per chapter entry, named
//! `<pair-hash>-<chapter-hash>.json` so that clearing a document pair is
//! a prefix scan of the cache directory. Unreadable or corrupt entries
//! are deleted and reported as absent; the caller recomputes.

use crate::error::{CacheError, CacheResult};
use crate::store::{CacheKey, ChapterStore};
use crate::validate::entry_is_valid;
use async_trait::async_trait;
use chapterdiff_core::CachedChapterData;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct FsChapterStore {
    root: PathBuf,
}

impl FsChapterStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let pair = CacheKey::pair_hash(&key.original_path, &key.cleaned_path);
        self.root.join(format!("{}-{}.json", pair, key.chapter_hash()))
    }

    async fn discard(path: &Path, reason: &str) {
        warn!(path = %path.display(), reason, "discarding unusable cache entry");
        if let Err(error) = tokio::fs::remove_file(path).await {
            if error.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), %error, "failed to remove cache entry");
            }
        }
    }
}

#[async_trait]
impl ChapterStore for FsChapterStore {
    async fn load(&self, key: &CacheKey) -> CacheResult<Option<CachedChapterData>> {
        let path = self.entry_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        let entry: CachedChapterData = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(_) => {
                Self::discard(&path, "undecodable").await;
                return Ok(None);
            }
        };

        if !entry_is_valid(&entry) {
            Self::discard(&path, "empty tokens with nonzero total").await;
            return Ok(None);
        }

        debug!(chapter_id = %key.chapter_id, "chapter cache hit");
        Ok(Some(entry))
    }

    async fn save(&self, key: &CacheKey, data: &CachedChapterData) -> CacheResult<()> {
        if !entry_is_valid(data) {
            warn!(chapter_id = %key.chapter_id, "refusing to persist corrupt diff state");
            return Err(CacheError::CorruptEntry { chapter_id: key.chapter_id.clone() });
        }

        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.entry_path(key);
        let bytes = serde_json::to_vec(data)?;
        tokio::fs::write(&path, bytes).await?;
        debug!(chapter_id = %key.chapter_id, "chapter cached");
        Ok(())
    }

    async fn clear(&self, original_path: &str, cleaned_path: &str) -> CacheResult<()> {
        let prefix = format!("{}-", CacheKey::pair_hash(original_path, cleaned_path));
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(error.into()),
        };

        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        debug!(removed, "cleared chapter cache for document pair");
        Ok(())
    }
}
