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

//! Persistent chapter store interface.

use crate::error::CacheResult;
use async_trait::async_trait;
use chapterdiff_core::CachedChapterData;

/// Key identifying one chapter's cached diff state for one document pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub original_path: String,
    pub cleaned_path: String,
    pub chapter_id: String,
}

impl CacheKey {
    pub fn new(
        original_path: impl Into<String>,
        cleaned_path: impl Into<String>,
        chapter_id: impl Into<String>,
    ) -> Self {
        Self {
            original_path: original_path.into(),
            cleaned_path: cleaned_path.into(),
            chapter_id: chapter_id.into(),
        }
    }

    /// Stable hash of the document pair, shared by all chapters of the
    /// pair. Lets `clear` find every entry without parsing file contents.
    pub fn pair_hash(original_path: &str, cleaned_path: &str) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(original_path.as_bytes());
        hasher.update(&[0]);
        hasher.update(cleaned_path.as_bytes());
        hex::encode(&hasher.finalize().as_bytes()[..8])
    }

    /// Stable hash of the chapter id within its pair.
    pub fn chapter_hash(&self) -> String {
        let digest = blake3::hash(self.chapter_id.as_bytes());
        hex::encode(&digest.as_bytes()[..8])
    }
}

/// Persistent tier of the chapter cache.
///
/// Implementations must enforce the corruption guard on both sides: a
/// load never returns an entry that fails [`crate::entry_is_valid`], and
/// a save of such an entry is refused with
/// [`crate::CacheError::CorruptEntry`].
#[async_trait]
pub trait ChapterStore: Send + Sync {
    /// Load a chapter entry, or `None` when absent or unusable.
    async fn load(&self, key: &CacheKey) -> CacheResult<Option<CachedChapterData>>;

    /// Persist a chapter entry.
    async fn save(&self, key: &CacheKey, data: &CachedChapterData) -> CacheResult<()>;

    /// Drop every entry for a document pair. Used whenever diff semantics
    /// change, e.g. the whitespace-sensitivity toggle.
    async fn clear(&self, original_path: &str, cleaned_path: &str) -> CacheResult<()>;
}
