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

//! In-memory chapter store (for testing and development).
//!
//! Enforces the same corruption guards as the filesystem store so tests
//! exercise identical semantics.

use crate::error::{CacheError, CacheResult};
use crate::store::{CacheKey, ChapterStore};
use crate::validate::entry_is_valid;
use async_trait::async_trait;
use chapterdiff_core::CachedChapterData;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::warn;

#[derive(Default)]
pub struct MemoryChapterStore {
    entries: RwLock<HashMap<CacheKey, CachedChapterData>>,
}

impl MemoryChapterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Insert an entry bypassing the write guard. Test hook for staging
    /// corrupt state that could only come from an external writer.
    pub fn insert_raw(&self, key: CacheKey, data: CachedChapterData) {
        self.entries.write().insert(key, data);
    }
}

#[async_trait]
impl ChapterStore for MemoryChapterStore {
    async fn load(&self, key: &CacheKey) -> CacheResult<Option<CachedChapterData>> {
        let entry = self.entries.read().get(key).cloned();
        match entry {
            Some(entry) if !entry_is_valid(&entry) => {
                warn!(chapter_id = %key.chapter_id, "discarding corrupt in-memory cache entry");
                self.entries.write().remove(key);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn save(&self, key: &CacheKey, data: &CachedChapterData) -> CacheResult<()> {
        if !entry_is_valid(data) {
            warn!(chapter_id = %key.chapter_id, "refusing to persist corrupt diff state");
            return Err(CacheError::CorruptEntry { chapter_id: key.chapter_id.clone() });
        }
        self.entries.write().insert(key.clone(), data.clone());
        Ok(())
    }

    async fn clear(&self, original_path: &str, cleaned_path: &str) -> CacheResult<()> {
        self.entries.write().retain(|key, _| {
            key.original_path != original_path || key.cleaned_path != cleaned_path
        });
        Ok(())
    }
}
